/// Errors raised by the posterize and convolution entry points.
///
/// Every variant is reported before any clustering or filtering work starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PosterizeError {
    /// The requested palette size is zero or exceeds the number of pixels.
    #[error("Cannot reduce {pixels} pixels to {requested} colors")]
    InvalidColorCount { requested: usize, pixels: usize },

    /// A palette with no colors was supplied for remapping.
    #[error("Palette is empty")]
    EmptyPalette,

    /// The image has no pixels.
    #[error("Image has no pixels")]
    EmptyImage,

    /// The dimensions overflow the addressable pixel count or the `u32`
    /// range of `image::RgbImage`.
    #[error("Image dimensions {width}x{height} are too large")]
    ImageTooLarge { width: usize, height: usize },

    /// A raw RGB buffer does not match `width * height * 3`.
    #[error("Buffer length ({actual}) does not match the image size ({expected})")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A kernel was built from a slice that does not hold exactly 9 weights.
    #[error("Kernel needs 9 weights, got {0}")]
    InvalidKernel(usize),

    /// A palette entry is not a 6 digit hex color.
    #[error("Invalid hex color: {0}")]
    InvalidHexColor(String),
}
