use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use image_posterize_wasm::{InitPolicy, Kernel, ReduceOptions, RgbBuffer, compute_palette, convolve};
use palette::Srgb;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn test_image(width: usize, height: usize) -> RgbBuffer {
    RgbBuffer::from_fn(width, height, |x, y| {
        Srgb::new((x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8)
    })
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("KMeans");
    group.sample_size(10);

    for (width, height) in [(64, 64), (256, 224)] {
        let img = test_image(width, height);
        for k in [4, 8, 16] {
            group.throughput(criterion::Throughput::Elements((width * height) as u64));
            let parameter_string = format!("{}x{}x{}", width, height, k);

            for (name, init) in [
                ("pixel_sampled", InitPolicy::PixelSampled),
                ("uniform_random", InitPolicy::UniformRandom),
            ] {
                let options = ReduceOptions::default().with_init(init);
                group.bench_with_input(BenchmarkId::new(name, &parameter_string), &img, |b, img| {
                    b.iter(|| {
                        let mut rng = StdRng::seed_from_u64(0);
                        black_box(compute_palette(img, k, &options, &mut rng))
                    })
                });
            }
        }
    }
    group.finish();
}

fn bench_convolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("Convolve3x3");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)] {
        let img = test_image(width, height);
        group.throughput(criterion::Throughput::Elements((width * height) as u64));
        let parameter_string = format!("{}x{}", width, height);

        for (name, kernel) in [("box_blur", Kernel::box_blur()), ("sharpen", Kernel::sharpen())] {
            group.bench_with_input(BenchmarkId::new(name, &parameter_string), &img, |b, img| {
                b.iter(|| black_box(convolve(img, &kernel)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_kmeans, bench_convolve);
criterion_main!(benches);
