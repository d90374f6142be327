// ========================================================================================
//
//                 SPHERE-BASELINE LABEL AGGREGATION BENCHMARK
//
// ========================================================================================
//
// Measures per-window and per-sample label aggregation on a synthetic recording shaped
// like the public training data: about half an hour of unit windows, two annotators,
// and accelerometer samples at 20 Hz.
//
// ========================================================================================

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::Array1;
use sphere_baseline::aggregate::{Interval, IntervalTrack, aggregate_windows, label_samples};

// --- Benchmark Tuning Parameters ---

/// Number of activity labels in the public vocabulary.
const NUM_LABELS: usize = 20;
/// Accelerometer sampling rate in samples per time unit.
const SAMPLE_RATE: usize = 20;
/// Recording durations, in windows, to benchmark.
const DURATIONS: [usize; 3] = [600, 1800, 3600];

/// Deterministic annotator: back-to-back intervals of 1 to 7 units cycling through labels.
fn synthetic_annotator(duration: usize, phase: usize) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut start = 0.0;
    let mut step = phase;
    while start < duration as f64 {
        let length = (step % 7 + 1) as f64 + 0.25;
        intervals.push(Interval {
            start,
            end: start + length,
            label: step % NUM_LABELS,
        });
        start += length;
        step += 3;
    }
    intervals
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_aggregation");
    for &duration in DURATIONS.iter() {
        let track = IntervalTrack::merge([
            synthetic_annotator(duration, 0),
            synthetic_annotator(duration, 5),
        ]);
        let times = Array1::from_iter(
            (0..duration * SAMPLE_RATE).map(|i| i as f64 / SAMPLE_RATE as f64),
        );

        group.throughput(Throughput::Elements(duration as u64));
        group.bench_with_input(BenchmarkId::new("windows", duration), &track, |b, track| {
            b.iter(|| {
                let counts = aggregate_windows(black_box(duration), black_box(track), NUM_LABELS);
                black_box(counts)
            });
        });

        group.throughput(Throughput::Elements(times.len() as u64));
        group.bench_with_input(BenchmarkId::new("samples", duration), &track, |b, track| {
            b.iter(|| {
                let counts = label_samples(black_box(times.view()), black_box(track), NUM_LABELS);
                black_box(counts)
            });
        });
    }
    group.finish();
}

criterion_group!(window_aggregation, benchmark_aggregation);
criterion_main!(window_aggregation);
