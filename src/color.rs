use palette::Srgb;

use crate::error::PosterizeError;

/// An 8-bit RGB color. Equality is exact per channel.
pub type Color = Srgb<u8>;

/// Squared euclidean distance between two colors in RGB space.
///
/// Only meaningful for comparing distances against each other; no square root
/// is taken.
#[inline(always)]
pub fn relative_distance(a: Color, b: Color) -> u32 {
    let dr = a.red as i32 - b.red as i32;
    let dg = a.green as i32 - b.green as i32;
    let db = a.blue as i32 - b.blue as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the palette entry closest to `color`.
///
/// Ties resolve to the lowest index.
///
/// # Panics
///
/// Panics if `palette` is empty.
pub fn closest_color_index(color: Color, palette: &[Color]) -> usize {
    assert!(!palette.is_empty(), "closest_color_index called with an empty palette");

    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (idx, &candidate) in palette.iter().enumerate() {
        let dist = relative_distance(color, candidate);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

/// Palette entry closest to `color`, see [`closest_color_index`].
///
/// # Panics
///
/// Panics if `palette` is empty.
pub fn closest_color(color: Color, palette: &[Color]) -> Color {
    palette[closest_color_index(color, palette)]
}

/// Component-wise mean of `colors`, rounded half-up per channel.
///
/// Returns `None` for an empty slice.
pub fn average_colors(colors: &[Color]) -> Option<Color> {
    if colors.is_empty() {
        return None;
    }

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for c in colors {
        r += c.red as u64;
        g += c.green as u64;
        b += c.blue as u64;
    }

    // (2 * sum + n) / (2 * n) == floor(sum / n + 0.5) without going through floats
    let n = colors.len() as u64;
    let round = |sum: u64| ((2 * sum + n) / (2 * n)) as u8;
    Some(Srgb::new(round(r), round(g), round(b)))
}

/// Centroid of every non-empty cluster, keeping the relative order of the
/// clusters. Empty clusters are dropped, so the result may be shorter than
/// `clusters`.
pub fn average_clusters(clusters: &[Vec<Color>]) -> Vec<Color> {
    clusters
        .iter()
        .filter_map(|cluster| average_colors(cluster))
        .collect()
}

/// Format a color as an uppercase `RRGGBB` string.
pub fn to_hex(c: Color) -> String {
    format!("{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
}

/// Parse a `RRGGBB` string, with or without a leading `#`.
pub fn parse_hex(s: &str) -> Result<Color, PosterizeError> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(PosterizeError::InvalidHexColor(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| PosterizeError::InvalidHexColor(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
