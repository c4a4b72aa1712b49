use std::time::Duration;

use calframe::{
    compose, kmeans, FrameOptions, KmeansOptions, PaletteExtractor, PaletteSize, UniqueColorCounts,
    WeightedPoint,
};
use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// A smooth two axis gradient with some noise, similar in color count to a photo.
fn synthetic_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    #[allow(clippy::cast_possible_truncation)]
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        let b = ((x + y) * 255 / (width + height)) as u8;
        Rgb([r, g, b].map(|c| c.saturating_add(rng.gen_range(0..24))))
    })
}

fn images() -> Vec<(String, RgbImage)> {
    [(640, 480), (1920, 1080), (800, 1200)]
        .into_iter()
        .zip(0..)
        .map(|((w, h), seed)| (format!("{w}x{h}"), synthetic_image(w, h, seed)))
        .collect()
}

fn thumbnail_points(images: &[(String, RgbImage)]) -> Vec<(String, Vec<WeightedPoint<3>>)> {
    let extractor = PaletteExtractor::new();
    images
        .iter()
        .map(|(name, image)| {
            let thumbnail = extractor.thumbnail(image);
            let counts = UniqueColorCounts::try_from_rgbimage(&thumbnail).unwrap();
            (name.clone(), counts.points())
        })
        .collect()
}

fn bench<T>(
    c: &mut Criterion,
    group: &str,
    inputs: &[(String, T)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &T)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2));

    for k in [2u8, 3, 8].map(PaletteSize::from) {
        for (name, input) in inputs {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, input), &mut f);
        }
    }
}

fn options() -> KmeansOptions {
    KmeansOptions::new().seed(0).max_iterations(1000)
}

fn kmeans_single(c: &mut Criterion) {
    let points = thumbnail_points(&images());
    bench(c, "kmeans_single", &points, |b, &(k, points)| {
        b.iter(|| kmeans::palette(points, k.into(), &options()));
    });
}

fn kmeans_par(c: &mut Criterion) {
    let points = thumbnail_points(&images());
    bench(c, "kmeans_par", &points, |b, &(k, points)| {
        b.iter(|| kmeans::palette_par(points, k.into(), &options()));
    });
}

fn palette_extraction(c: &mut Criterion) {
    bench(c, "palette_extraction", &images(), |b, &(k, image)| {
        let extractor = PaletteExtractor::new().palette_size(k).kmeans(options());
        b.iter(|| extractor.palette(image));
    });
}

fn composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.sample_size(30).warm_up_time(Duration::from_millis(500));

    let frame = FrameOptions::new().resolution(2560, 1440).crop(100);
    for (name, image) in images() {
        let palette = PaletteExtractor::new()
            .palette_size(PaletteSize::FRAME)
            .kmeans(options())
            .palette(&image)
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(name), &image, |b, image| {
            b.iter(|| compose(image, &palette, &frame));
        });
    }
}

criterion_group!(benches, kmeans_single, kmeans_par, palette_extraction, composition);
criterion_main!(benches);
