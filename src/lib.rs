use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect, Uint8Array};
use rand::SeedableRng;
use rand::rngs::StdRng;
#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use image::{ImageFormat, RgbImage};

pub mod color;
pub mod convolve;
pub mod error;
pub mod kmeans;
pub mod raster;

pub use color::{Color, closest_color, closest_color_index, parse_hex, relative_distance, to_hex};
pub use convolve::{Kernel, convolve};
pub use error::PosterizeError;
pub use kmeans::{
    ClusterOutcome, DEFAULT_MAX_ITERATIONS, InitPolicy, ReduceOptions, compute_palette, reduce_palette,
    reduce_palette_with, remap,
};
pub use raster::{Image, RgbBuffer};

/// Seeded generator when a seed is given, OS entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn parse_palette<'a>(hex: impl IntoIterator<Item = &'a str>) -> Result<Vec<Color>, PosterizeError> {
    let colors = hex
        .into_iter()
        .map(parse_hex)
        .collect::<Result<Vec<_>, _>>()?;
    if colors.is_empty() {
        return Err(PosterizeError::EmptyPalette);
    }
    Ok(colors)
}

// ------------------------------------------------------------
// JavaScript surface
// ------------------------------------------------------------

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Reduce a raw `RGBRGB...` buffer to at most `n_colors` colors.
///
/// When `palette` (an array of `RRGGBB` strings) is given, k-means is skipped
/// and every pixel is mapped to its closest entry instead.
///
/// Returns `{ image: Uint8Array, palette: string[], iterations: number,
/// converged: boolean }`, where `image` has the same layout as the input.
#[wasm_bindgen]
pub fn reduce_colors(
    rgb: Vec<u8>,
    width: u32,
    height: u32,
    n_colors: usize,
    uniform_init: bool,
    max_iterations: Option<u32>,
    seed: Option<u64>,
    palette: Option<Array>,
) -> Result<Object, JsValue> {
    let img = RgbBuffer::from_raw(width as usize, height as usize, &rgb).map_err(js_err)?;

    let (reduced, outcome) = if let Some(js_palette) = palette {
        let mut hex = Vec::new();
        for val in js_palette.iter() {
            hex.push(
                val.as_string()
                    .ok_or_else(|| JsValue::from_str("Palette values must be strings"))?,
            );
        }
        let colors = parse_palette(hex.iter().map(String::as_str)).map_err(js_err)?;
        let reduced = remap(&img, &colors).map_err(js_err)?;
        let outcome = ClusterOutcome {
            palette: colors,
            iterations: 0,
            converged: true,
        };
        (reduced, outcome)
    } else {
        let init = if uniform_init {
            InitPolicy::UniformRandom
        } else {
            InitPolicy::PixelSampled
        };
        let options = ReduceOptions::default()
            .with_init(init)
            .with_max_iterations(max_iterations.map_or(DEFAULT_MAX_ITERATIONS, |m| m as usize));
        let mut rng = make_rng(seed);
        reduce_palette_with(&img, n_colors, &options, &mut rng).map_err(js_err)?
    };

    let img_js = Uint8Array::from(reduced.into_raw().as_slice());
    let palette_js = Array::new();
    for c in &outcome.palette {
        palette_js.push(&JsValue::from_str(&to_hex(*c)));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &img_js)?;
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(
        &result,
        &JsValue::from_str("iterations"),
        &JsValue::from_f64(outcome.iterations as f64),
    )?;
    Reflect::set(
        &result,
        &JsValue::from_str("converged"),
        &JsValue::from_bool(outcome.converged),
    )?;

    Ok(result)
}

/// Convolve a raw `RGBRGB...` buffer with a 3x3 kernel given as 9 weights in
/// row-major order.
#[wasm_bindgen]
pub fn convolve_rgb(
    rgb: Vec<u8>,
    width: u32,
    height: u32,
    kernel: Vec<f32>,
) -> Result<Uint8Array, JsValue> {
    let img = RgbBuffer::from_raw(width as usize, height as usize, &rgb).map_err(js_err)?;
    let kernel = Kernel::from_slice(&kernel).map_err(js_err)?;
    let convolved = convolve(&img, &kernel);
    Ok(Uint8Array::from(convolved.into_raw().as_slice()))
}

// ------------------------------------------------------------
// Native, encoded-image helpers
// ------------------------------------------------------------

#[cfg(not(target_arch = "wasm32"))]
fn decode_rgb(input: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(input).context("Unable to decode image")?;
    Ok(img.to_rgb8())
}

#[cfg(not(target_arch = "wasm32"))]
fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .context("PNG encode error")?;
    Ok(buf)
}

/// Posterize an encoded image.
///
/// The optional `kernel` is applied first. Then the image is reduced to at
/// most `n_colors` colors found by k-means, or mapped onto `palette_hex` when
/// one is given. Returns the PNG-encoded result and the palette as `RRGGBB`
/// strings.
#[cfg(not(target_arch = "wasm32"))]
pub fn posterize_bytes(
    input: &[u8],
    n_colors: usize,
    options: &ReduceOptions,
    seed: Option<u64>,
    palette_hex: Option<&[String]>,
    kernel: Option<&Kernel>,
) -> Result<(Vec<u8>, Vec<String>)> {
    let mut img = decode_rgb(input)?;
    if let Some(kernel) = kernel {
        img = convolve(&img, kernel);
    }

    let (reduced, palette) = if let Some(palette_list) = palette_hex {
        let colors = parse_palette(palette_list.iter().map(String::as_str))?;
        (remap(&img, &colors)?, colors)
    } else {
        let mut rng = make_rng(seed);
        let (reduced, outcome) = reduce_palette_with(&img, n_colors, options, &mut rng)?;
        (reduced, outcome.palette)
    };

    let png = encode_png(&reduced)?;
    Ok((png, palette.into_iter().map(to_hex).collect()))
}

/// Convolve an encoded image and return it PNG-encoded.
#[cfg(not(target_arch = "wasm32"))]
pub fn convolve_bytes(input: &[u8], kernel: &Kernel) -> Result<Vec<u8>> {
    let img = decode_rgb(input)?;
    encode_png(&convolve(&img, kernel))
}

/// Run k-means on an encoded image and return only the palette.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(
    input: &[u8],
    n_colors: usize,
    options: &ReduceOptions,
    seed: Option<u64>,
) -> Result<Vec<String>> {
    let img = decode_rgb(input)?;
    let mut rng = make_rng(seed);
    let outcome = compute_palette(&img, n_colors, options, &mut rng)?;
    Ok(outcome.palette.into_iter().map(to_hex).collect())
}
