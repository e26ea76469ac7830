use std::collections::HashSet;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use image_posterize_wasm::{
    Color, Image, InitPolicy, Kernel, ReduceOptions, RgbBuffer, compute_palette, convolve,
    convolve_bytes, extract_palette_bytes, posterize_bytes, reduce_palette_with, remap,
};
use palette::Srgb;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn photo_like(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x * y) % 256) as u8;
        Rgb([r, g, b])
    })
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn distinct(img: &impl Image) -> HashSet<[u8; 3]> {
    img.pixels().map(|c| [c.red, c.green, c.blue]).collect()
}

#[test]
fn reduce_rgb_image_in_place_type() {
    let img = photo_like(40, 30);
    let mut rng = StdRng::seed_from_u64(1234);
    for init in [InitPolicy::PixelSampled, InitPolicy::UniformRandom] {
        let options = ReduceOptions::default().with_init(init);
        let (reduced, outcome) = reduce_palette_with(&img, 6, &options, &mut rng).unwrap();
        assert_eq!(reduced.dimensions(), img.dimensions());
        assert!(outcome.palette.len() <= 6);
        assert!(distinct(&reduced).len() <= 6);

        // remapping through the same palette is a fixed point
        assert_eq!(remap(&reduced, &outcome.palette).unwrap(), reduced);
    }
}

#[test]
fn input_image_is_not_mutated() {
    let img = photo_like(12, 12);
    let before = img.clone();
    let mut rng = StdRng::seed_from_u64(8);
    let _ = reduce_palette_with(&img, 3, &ReduceOptions::default(), &mut rng).unwrap();
    let _ = convolve(&img, &Kernel::sharpen());
    assert_eq!(img, before);
}

#[test]
fn k_up_to_distinct_count_terminates() {
    let colors: [Color; 5] = [
        Srgb::new(255, 0, 0),
        Srgb::new(0, 255, 0),
        Srgb::new(0, 0, 255),
        Srgb::new(250, 250, 250),
        Srgb::new(10, 10, 10),
    ];
    let img = RgbBuffer::from_fn(10, 10, |x, y| colors[(x + 3 * y) % 5]);
    for k in 1..=5 {
        let options = ReduceOptions::default().with_max_iterations(0);
        let outcome = compute_palette(&img, k, &options, &mut StdRng::seed_from_u64(k as u64))
            .unwrap();
        assert!(outcome.converged);
        assert!(outcome.palette.len() <= k);
    }

    // pixel sampling with k == distinct count recovers every color
    let outcome =
        compute_palette(&img, 5, &ReduceOptions::default(), &mut StdRng::seed_from_u64(0)).unwrap();
    let mut got: Vec<[u8; 3]> = outcome.palette.iter().map(|c| [c.red, c.green, c.blue]).collect();
    let mut want: Vec<[u8; 3]> = colors.iter().map(|c| [c.red, c.green, c.blue]).collect();
    got.sort();
    want.sort();
    assert_eq!(got, want);
}

#[test]
fn posterize_bytes_roundtrip() {
    let png = png_bytes(&photo_like(32, 24));
    let (out, palette) =
        posterize_bytes(&png, 4, &ReduceOptions::default(), Some(7), None, None).unwrap();
    assert!(!palette.is_empty() && palette.len() <= 4);

    let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (32, 24));
    let allowed: HashSet<String> = palette.into_iter().collect();
    for p in decoded.pixels() {
        assert!(allowed.contains(&format!("{:02X}{:02X}{:02X}", p[0], p[1], p[2])));
    }
}

#[test]
fn posterize_bytes_is_reproducible_with_seed() {
    let png = png_bytes(&photo_like(20, 20));
    let options = ReduceOptions::default();
    let first = posterize_bytes(&png, 5, &options, Some(99), None, None).unwrap();
    let second = posterize_bytes(&png, 5, &options, Some(99), None, None).unwrap();
    assert_eq!(first, second);

    let palette = extract_palette_bytes(&png, 5, &options, Some(99)).unwrap();
    assert_eq!(palette, first.1);
}

#[test]
fn posterize_bytes_with_fixed_palette() {
    let png = png_bytes(&photo_like(16, 16));
    let fixed = vec!["#000000".to_string(), "FFFFFF".to_string()];
    let (out, palette) =
        posterize_bytes(&png, 8, &ReduceOptions::default(), None, Some(&fixed), None).unwrap();
    assert_eq!(palette, vec!["000000", "FFFFFF"]);

    let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
    for p in decoded.pixels() {
        assert!(p.0 == [0, 0, 0] || p.0 == [255, 255, 255]);
    }

    let empty: Vec<String> = Vec::new();
    assert!(posterize_bytes(&png, 8, &ReduceOptions::default(), None, Some(&empty), None).is_err());
}

#[test]
fn posterize_bytes_rejects_bad_requests() {
    let png = png_bytes(&photo_like(4, 4));
    let options = ReduceOptions::default();
    assert!(posterize_bytes(&png, 0, &options, Some(1), None, None).is_err());
    assert!(posterize_bytes(&png, 17, &options, Some(1), None, None).is_err());
    assert!(posterize_bytes(b"not an image", 2, &options, Some(1), None, None).is_err());
}

#[test]
fn convolve_bytes_keeps_border() {
    let img = photo_like(10, 8);
    let out = convolve_bytes(&png_bytes(&img), &Kernel::edge_detect()).unwrap();
    let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
    for (x, y, p) in decoded.enumerate_pixels() {
        if x == 0 || y == 0 || x == 9 || y == 7 {
            assert_eq!(p, img.get_pixel(x, y));
        }
    }
}

#[test]
fn blur_then_reduce_keeps_color_bound() {
    let png = png_bytes(&photo_like(24, 24));
    let blur = Kernel::box_blur();
    let (out, palette) =
        posterize_bytes(&png, 3, &ReduceOptions::default(), Some(5), None, Some(&blur)).unwrap();
    let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
    assert!(distinct(&decoded).len() <= palette.len());
}
