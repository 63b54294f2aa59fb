use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array, IxDyn};
use vision::config::Thresholds;
use vision::decoder::{DenseDecoder, GridDecoder, OutputDecoder};
use vision::nms::{NmsMode, nms_indices};

const CLASS_COUNT: usize = 80;

/// Dense-layout tensor [1, rows, 85] with the given number of rows passing
/// the thresholds, clustered so NMS has real suppression work to do.
fn mock_dense_output(rows: usize, hot: usize) -> Array<f32, IxDyn> {
    let attributes = CLASS_COUNT + 5;
    let mut data = vec![0.0f32; rows * attributes];

    for i in 0..hot.min(rows) {
        let base = i * attributes;
        let jitter = (i % 8) as f32;
        data[base] = 160.0 + jitter; // cx
        data[base + 1] = 160.0 + jitter; // cy
        data[base + 2] = 80.0; // w
        data[base + 3] = 80.0; // h
        data[base + 4] = 0.9; // objectness
        data[base + 5 + (i % CLASS_COUNT)] = 0.9;
    }

    Array::from_shape_vec(IxDyn(&[1, rows, attributes]), data).unwrap()
}

/// Grid-layout tensor [1, 84, L] for a 640x640 input (L = 8400).
fn mock_grid_output(hot: usize) -> (Array<f32, IxDyn>, usize) {
    let locations = 80 * 80 + 40 * 40 + 20 * 20;
    let channels = CLASS_COUNT + 4;
    let mut data = vec![0.0f32; channels * locations];

    for i in 0..hot.min(locations) {
        let jitter = (i % 8) as f32;
        data[i] = 160.0 + jitter;
        data[locations + i] = 160.0 + jitter;
        data[2 * locations + i] = 80.0;
        data[3 * locations + i] = 80.0;
        data[(4 + i % CLASS_COUNT) * locations + i] = 0.9;
    }

    (
        Array::from_shape_vec(IxDyn(&[1, channels, locations]), data).unwrap(),
        locations,
    )
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let thresholds = Thresholds::default();

    for rows in [8400usize, 25200] {
        let tensor = mock_dense_output(rows, 64);
        let decoder = DenseDecoder::new(CLASS_COUNT);
        group.bench_with_input(BenchmarkId::new("dense", rows), &tensor, |b, tensor| {
            b.iter(|| decoder.decode(black_box(&tensor.view()), black_box(&thresholds)))
        });
    }

    let (tensor, locations) = mock_grid_output(64);
    let decoder = GridDecoder::new(CLASS_COUNT, 640, 640);
    group.bench_with_input(BenchmarkId::new("grid", locations), &tensor, |b, tensor| {
        b.iter(|| decoder.decode(black_box(&tensor.view()), black_box(&thresholds)))
    });

    group.finish();
}

fn benchmark_nms(c: &mut Criterion) {
    let mut group = c.benchmark_group("nms");
    let thresholds = Thresholds::default();
    let decoder = DenseDecoder::new(CLASS_COUNT);

    for candidates in [64usize, 256, 1024] {
        let tensor = mock_dense_output(25200, candidates);
        let detections = decoder.decode(&tensor.view(), &thresholds);

        group.bench_with_input(
            BenchmarkId::new("agnostic", candidates),
            &detections,
            |b, detections| {
                b.iter(|| nms_indices(black_box(detections), 0.45, NmsMode::Agnostic))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("class_aware", candidates),
            &detections,
            |b, detections| {
                b.iter(|| nms_indices(black_box(detections), 0.45, NmsMode::ClassAware))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_decode, benchmark_nms);
criterion_main!(benches);
