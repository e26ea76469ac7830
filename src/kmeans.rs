use std::collections::HashSet;

use log::{debug, info, warn};
use palette::Srgb;
use rand::Rng;

use crate::color::{Color, average_clusters, closest_color, closest_color_index};
use crate::error::PosterizeError;
use crate::raster::Image;

/// Iteration cap applied by [`ReduceOptions::default`].
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Where the starting palette of the clustering loop comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitPolicy {
    /// Distinct colors drawn from randomly chosen pixels of the image.
    #[default]
    PixelSampled,
    /// Colors with every channel drawn uniformly from `0..=255`.
    UniformRandom,
}

/// Knobs of the palette reducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReduceOptions {
    pub init: InitPolicy,
    /// Upper bound on assignment/update rounds. `0` runs until the palette
    /// stops changing.
    pub max_iterations: usize,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            init: InitPolicy::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ReduceOptions {
    pub fn with_init(mut self, init: InitPolicy) -> Self {
        self.init = init;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of running the clustering loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterOutcome {
    /// Final palette, at most `k` colors.
    pub palette: Vec<Color>,
    /// Number of assignment/update rounds that ran.
    pub iterations: usize,
    /// `false` when the iteration cap stopped the loop first.
    pub converged: bool,
}

#[inline(always)]
fn key(c: Color) -> [u8; 3] {
    [c.red, c.green, c.blue]
}

/// Draw up to `k` distinct colors from randomly picked pixels.
///
/// Colors are drawn by pixel, so frequent colors are more likely to be picked.
/// `k` is capped to the number of distinct colors in the image. If `64 * k`
/// draws hit an already chosen color, the remaining slots are filled with
/// unused colors in the order they first appear in the image.
pub fn pixel_sampled_palette<I: Image, R: Rng + ?Sized>(
    image: &I,
    k: usize,
    rng: &mut R,
) -> Vec<Color> {
    let pixels: Vec<Color> = image.pixels().collect();
    if pixels.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let distinct: Vec<Color> = pixels.iter().copied().filter(|&c| seen.insert(key(c))).collect();

    let k = if k > distinct.len() {
        debug!(
            "Image has {} distinct colors, capping palette size {} to it",
            distinct.len(),
            k
        );
        distinct.len()
    } else {
        k
    };

    let mut palette = Vec::with_capacity(k);
    let mut chosen = HashSet::with_capacity(k);
    let max_rejections = 64 * k;
    let mut rejections = 0;

    while palette.len() < k && rejections < max_rejections {
        let c = pixels[rng.random_range(0..pixels.len())];
        if chosen.insert(key(c)) {
            palette.push(c);
        } else {
            rejections += 1;
        }
    }

    if palette.len() < k {
        debug!(
            "Gave up resampling after {} repeated draws, filling {} remaining colors in scan order",
            rejections,
            k - palette.len()
        );
        for c in distinct {
            if palette.len() == k {
                break;
            }
            if chosen.insert(key(c)) {
                palette.push(c);
            }
        }
    }

    palette
}

/// Draw `k` colors with every channel uniform in `0..=255`. Duplicates are
/// allowed and the image content is ignored.
pub fn uniform_random_palette<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Vec<Color> {
    (0..k)
        .map(|_| Srgb::new(rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()))
        .collect()
}

/// Group every pixel color under the index of its closest palette entry.
///
/// The result has one (possibly empty) group per palette entry.
pub fn assign_clusters<I: Image>(image: &I, palette: &[Color]) -> Vec<Vec<Color>> {
    let mut clusters = vec![Vec::new(); palette.len()];
    for pixel in image.pixels() {
        clusters[closest_color_index(pixel, palette)].push(pixel);
    }
    clusters
}

fn validate<I: Image>(image: &I, k: usize) -> Result<(), PosterizeError> {
    let pixels = image.num_pixels();
    if pixels == 0 {
        return Err(PosterizeError::EmptyImage);
    }
    if k == 0 || k > pixels {
        return Err(PosterizeError::InvalidColorCount {
            requested: k,
            pixels,
        });
    }
    Ok(())
}

/// Run k-means over the pixel colors of `image` and return the palette.
///
/// Each round assigns every pixel to its closest palette entry and replaces
/// the palette with the centroids of the non-empty clusters, so the palette
/// can shrink. The loop stops once a round reproduces the previous palette
/// exactly (same colors, same order), or when `options.max_iterations`
/// rounds have run.
pub fn compute_palette<I: Image, R: Rng + ?Sized>(
    image: &I,
    k: usize,
    options: &ReduceOptions,
    rng: &mut R,
) -> Result<ClusterOutcome, PosterizeError> {
    validate(image, k)?;

    let mut palette = match options.init {
        InitPolicy::PixelSampled => pixel_sampled_palette(image, k, rng),
        InitPolicy::UniformRandom => uniform_random_palette(k, rng),
    };

    let mut iterations = 0;
    loop {
        if options.max_iterations != 0 && iterations >= options.max_iterations {
            warn!(
                "k-means stopped after {} iterations without converging ({} colors)",
                iterations,
                palette.len()
            );
            return Ok(ClusterOutcome {
                palette,
                iterations,
                converged: false,
            });
        }
        iterations += 1;

        let clusters = assign_clusters(image, &palette);
        let next = average_clusters(&clusters);
        debug!("k-means iteration {}: {} -> {} colors", iterations, palette.len(), next.len());

        if next == palette {
            info!("k-means converged after {} iterations with {} colors", iterations, next.len());
            return Ok(ClusterOutcome {
                palette: next,
                iterations,
                converged: true,
            });
        }
        palette = next;
    }
}

/// Replace every pixel with its closest palette entry.
///
/// The input is left untouched; the output has the same dimensions.
pub fn remap<I: Image>(image: &I, palette: &[Color]) -> Result<I, PosterizeError> {
    if palette.is_empty() {
        return Err(PosterizeError::EmptyPalette);
    }

    let mut mapped = image.clone();
    for y in 0..image.height() {
        for x in 0..image.width() {
            mapped.set_pixel_at(x, y, closest_color(image.pixel_at(x, y), palette));
        }
    }
    Ok(mapped)
}

/// Reduce `image` to at most `k` colors, also returning the clustering outcome.
pub fn reduce_palette_with<I: Image, R: Rng + ?Sized>(
    image: &I,
    k: usize,
    options: &ReduceOptions,
    rng: &mut R,
) -> Result<(I, ClusterOutcome), PosterizeError> {
    let outcome = compute_palette(image, k, options, rng)?;
    let reduced = remap(image, &outcome.palette)?;
    Ok((reduced, outcome))
}

/// Reduce `image` to at most `k` colors picked by k-means.
///
/// Fewer than `k` colors remain when clusters empty out during the loop or
/// the image has fewer than `k` distinct colors.
pub fn reduce_palette<I: Image, R: Rng + ?Sized>(
    image: &I,
    k: usize,
    options: &ReduceOptions,
    rng: &mut R,
) -> Result<I, PosterizeError> {
    reduce_palette_with(image, k, options, rng).map(|(reduced, _)| reduced)
}
