use palette::Srgb;

use crate::color::Color;
use crate::error::PosterizeError;
use crate::raster::Image;

/// A 3x3 linear filter.
///
/// `weights[a][b]` is applied to the source pixel at `(x - 1 + a, y - 1 + b)`,
/// so the first index is the horizontal offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernel {
    pub weights: [[f32; 3]; 3],
}

impl Kernel {
    pub const fn new(weights: [[f32; 3]; 3]) -> Self {
        Self { weights }
    }

    /// Build a kernel from three rows as they appear on screen (top to bottom,
    /// left to right).
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        let mut weights = [[0.0; 3]; 3];
        let mut a = 0;
        while a < 3 {
            let mut b = 0;
            while b < 3 {
                weights[a][b] = rows[b][a];
                b += 1;
            }
            a += 1;
        }
        Self { weights }
    }

    /// Build a kernel from 9 weights in row-major screen order.
    pub fn from_slice(values: &[f32]) -> Result<Self, PosterizeError> {
        if values.len() != 9 {
            return Err(PosterizeError::InvalidKernel(values.len()));
        }
        let mut rows = [[0.0; 3]; 3];
        for (i, &v) in values.iter().enumerate() {
            rows[i / 3][i % 3] = v;
        }
        Ok(Self::from_rows(rows))
    }

    /// Leaves the image unchanged.
    pub const fn identity() -> Self {
        Self::from_rows([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]])
    }

    /// Uniform 3x3 average.
    pub const fn box_blur() -> Self {
        const W: f32 = 1.0 / 9.0;
        Self::new([[W; 3]; 3])
    }

    pub const fn sharpen() -> Self {
        Self::from_rows([[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]])
    }

    /// 8-neighbour Laplacian.
    pub const fn edge_detect() -> Self {
        Self::from_rows([[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]])
    }

    pub const fn emboss() -> Self {
        Self::from_rows([[-2.0, -1.0, 0.0], [-1.0, 1.0, 1.0], [0.0, 1.0, 2.0]])
    }
}

#[inline(always)]
fn to_channel(v: f64) -> u8 {
    // truncate toward zero, then clamp into range
    (v.trunc() as i64).clamp(0, 255) as u8
}

/// Weighted sum of the 3x3 neighbourhood around the interior pixel `(x, y)`.
fn convolve_pixel<I: Image>(image: &I, kernel: &Kernel, x: usize, y: usize) -> Color {
    let (mut r, mut g, mut b) = (0f64, 0f64, 0f64);
    for (a, column) in kernel.weights.iter().enumerate() {
        for (bi, &w) in column.iter().enumerate() {
            let p = image.pixel_at(x + a - 1, y + bi - 1);
            let w = w as f64;
            r += w * p.red as f64;
            g += w * p.green as f64;
            b += w * p.blue as f64;
        }
    }
    Srgb::new(to_channel(r), to_channel(g), to_channel(b))
}

/// Apply `kernel` to every interior pixel of `image`.
///
/// Border pixels are copied from the source unchanged. Each channel is
/// truncated to an integer and clamped to `0..=255`. Images narrower or
/// shorter than 3 pixels have no interior and come back as a copy.
pub fn convolve<I: Image>(image: &I, kernel: &Kernel) -> I {
    let mut convolved = image.clone();
    let (width, height) = (image.width(), image.height());
    if width < 3 || height < 3 {
        return convolved;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            convolved.set_pixel_at(x, y, convolve_pixel(image, kernel, x, y));
        }
    }
    convolved
}
