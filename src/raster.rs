use std::fmt;

use image::{Rgb, RgbImage};
use palette::Srgb;

use crate::color::Color;
use crate::error::PosterizeError;

/// A 2D grid of RGB pixels with the origin at the top-left corner.
///
/// This is the whole capability set the palette reducer and the convolution
/// filter need. Outputs are produced by cloning the input and overwriting
/// pixels, so the input is never mutated.
pub trait Image: Clone {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Color at `(x, y)`. Panics when out of bounds.
    fn pixel_at(&self, x: usize, y: usize) -> Color;

    /// Overwrite the color at `(x, y)`. Panics when out of bounds.
    fn set_pixel_at(&mut self, x: usize, y: usize, color: Color);

    /// Number of pixels in the image.
    fn num_pixels(&self) -> usize {
        self.width() * self.height()
    }

    /// Every pixel color in row-major order.
    fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        let width = self.width();
        (0..self.num_pixels()).map(move |i| self.pixel_at(i % width, i / width))
    }
}

/// Dense, row-major RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbBuffer {
    width: usize,
    height: usize,
    data: Vec<Color>,
}

/// `width * height`, or `None` on overflow.
fn checked_pixel_count(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)
}

fn pixel_count_or_panic(width: usize, height: usize) -> usize {
    checked_pixel_count(width, height)
        .unwrap_or_else(|| panic!("image size {width}x{height} overflows usize"))
}

impl RgbBuffer {
    /// Create an image where every pixel has the same color.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; pixel_count_or_panic(width, height)],
        }
    }

    /// Create an image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Color) -> Self {
        let mut data = Vec::with_capacity(pixel_count_or_panic(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap interleaved `RGBRGB...` bytes.
    pub fn from_raw(width: usize, height: usize, raw: &[u8]) -> Result<Self, PosterizeError> {
        let expected = checked_pixel_count(width, height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(PosterizeError::ImageTooLarge { width, height })?;
        if raw.len() != expected {
            return Err(PosterizeError::BufferSizeMismatch {
                expected,
                actual: raw.len(),
            });
        }
        let data = raw
            .chunks_exact(3)
            .map(|c| Srgb::new(c[0], c[1], c[2]))
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Interleaved `RGBRGB...` bytes.
    pub fn into_raw(self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.data.len() * 3);
        for c in self.data {
            raw.extend_from_slice(&[c.red, c.green, c.blue]);
        }
        raw
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.data
    }
}

impl Image for RgbBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel_at(&self, x: usize, y: usize) -> Color {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[y * self.width + x]
    }

    fn set_pixel_at(&mut self, x: usize, y: usize, color: Color) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[y * self.width + x] = color;
    }

    fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.data.iter().copied()
    }
}

impl fmt::Display for RgbBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgbBuffer {}x{}", self.width, self.height)
    }
}

impl From<&RgbImage> for RgbBuffer {
    fn from(img: &RgbImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img
                .pixels()
                .map(|p| Srgb::new(p[0], p[1], p[2]))
                .collect(),
        }
    }
}

impl TryFrom<RgbBuffer> for RgbImage {
    type Error = PosterizeError;

    /// Fails when either dimension does not fit in `u32`.
    fn try_from(buf: RgbBuffer) -> Result<Self, Self::Error> {
        let too_large = PosterizeError::ImageTooLarge {
            width: buf.width,
            height: buf.height,
        };
        let w = u32::try_from(buf.width).map_err(|_| too_large.clone())?;
        let h = u32::try_from(buf.height).map_err(|_| too_large)?;
        Ok(RgbImage::from_fn(w, h, |x, y| {
            let c = buf.data[y as usize * buf.width + x as usize];
            Rgb([c.red, c.green, c.blue])
        }))
    }
}

impl Image for RgbImage {
    fn width(&self) -> usize {
        self.dimensions().0 as usize
    }

    fn height(&self) -> usize {
        self.dimensions().1 as usize
    }

    fn pixel_at(&self, x: usize, y: usize) -> Color {
        let p = self.get_pixel(x as u32, y as u32);
        Srgb::new(p[0], p[1], p[2])
    }

    fn set_pixel_at(&mut self, x: usize, y: usize, color: Color) {
        self.put_pixel(x as u32, y as u32, Rgb([color.red, color.green, color.blue]));
    }

    fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.as_raw()
            .chunks_exact(3)
            .map(|c| Srgb::new(c[0], c[1], c[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_and_layout() -> Result<(), PosterizeError> {
        let raw = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let img = RgbBuffer::from_raw(2, 2, &raw)?;
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.pixel_at(1, 0), Srgb::new(4, 5, 6));
        assert_eq!(img.pixel_at(0, 1), Srgb::new(7, 8, 9));
        assert_eq!(img.clone().into_raw(), raw);
        assert_eq!(img.to_string(), "RgbBuffer 2x2");
        Ok(())
    }

    #[test]
    fn test_from_raw_size_mismatch() {
        let res = RgbBuffer::from_raw(2, 2, &[0; 11]);
        assert_eq!(
            res,
            Err(PosterizeError::BufferSizeMismatch {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn test_set_pixel_does_not_touch_clone() {
        let src = RgbBuffer::filled(3, 2, Srgb::new(0, 0, 0));
        let mut dst = src.clone();
        dst.set_pixel_at(2, 1, Srgb::new(9, 9, 9));
        assert_eq!(dst.pixel_at(2, 1), Srgb::new(9, 9, 9));
        assert_eq!(src.pixel_at(2, 1), Srgb::new(0, 0, 0));
    }

    #[test]
    fn test_pixels_row_major() {
        let img = RgbBuffer::from_fn(3, 2, |x, y| Srgb::new(x as u8, y as u8, 0));
        let order: Vec<(u8, u8)> = img.pixels().map(|c| (c.red, c.green)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_from_raw_dimension_overflow() {
        let big = u32::MAX as usize;
        assert_eq!(
            RgbBuffer::from_raw(big, big, &[]),
            Err(PosterizeError::ImageTooLarge {
                width: big,
                height: big
            })
        );
        assert_eq!(
            RgbBuffer::from_raw(usize::MAX, 1, &[]),
            Err(PosterizeError::ImageTooLarge {
                width: usize::MAX,
                height: 1
            })
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rgb_image_rejects_wide_buffer() {
        // zero rows, so no pixel storage is needed
        let wide = RgbBuffer::filled(u32::MAX as usize + 1, 0, Srgb::new(0, 0, 0));
        assert_eq!(
            RgbImage::try_from(wide),
            Err(PosterizeError::ImageTooLarge {
                width: u32::MAX as usize + 1,
                height: 0
            })
        );
    }

    #[test]
    fn test_rgb_image_interop() -> Result<(), PosterizeError> {
        let buf = RgbBuffer::from_fn(4, 3, |x, y| Srgb::new(x as u8 * 10, y as u8 * 20, 7));
        let img = RgbImage::try_from(buf.clone())?;
        assert_eq!(Image::width(&img), 4);
        assert_eq!(Image::height(&img), 3);
        assert_eq!(Image::pixel_at(&img, 3, 2), Srgb::new(30, 40, 7));
        assert!(Image::pixels(&img).eq(buf.pixels()));
        assert_eq!(RgbBuffer::from(&img), buf);
        Ok(())
    }
}
