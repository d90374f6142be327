// ========================================================================================
//
//                       WINDOW AND SAMPLE LABEL AGGREGATION
//
// ========================================================================================
//
// Annotators describe a recording as a sparse list of labelled intervals. Predictions and
// scores are made per unit window, so this module turns interval lists into dense count
// matrices.
//
// ### Boundary convention ###
//
// An interval `[start, end]` covers a point `x` when `start <= x <= end`, inclusive on
// both ends. A window `[s, s + 1)` is represented by its start `s`, so an interval
// `(0, 2)` covers windows 0, 1 and 2. Sample labelling uses the same test with the
// sample timestamp in place of the window start.
//
// Cells are counts, not indicators: two annotators agreeing on a label put a 2 in the
// cell, and overlapping intervals from one annotator stack the same way.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("Interval [{start}, {end}] has label index {label}, but only {num_labels} labels exist.")]
    LabelOutOfRange {
        start: f64,
        end: f64,
        label: usize,
        num_labels: usize,
    },
    #[error("Interval [{start}, {end}] has a non-finite bound.")]
    NonFiniteBound { start: f64, end: f64 },
}

/// A labelled time span `[start, end]` from one annotator file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub label: usize,
}

impl Interval {
    #[inline]
    pub fn covers(&self, point: f64) -> bool {
        self.start <= point && point <= self.end
    }
}

/// All intervals of one kind (activities or rooms) for a recording, merged across
/// annotator files and sorted by `(start, end)` ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalTrack {
    intervals: Vec<Interval>,
}

impl IntervalTrack {
    /// Concatenates annotator files in the order given, then sorts. The sort is stable, so
    /// ties keep file order; nothing is dropped or deduplicated.
    pub fn merge<I>(files: I) -> Self
    where
        I: IntoIterator<Item = Vec<Interval>>,
    {
        let mut intervals: Vec<Interval> = files.into_iter().flatten().collect();
        intervals.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then_with(|| a.end.total_cmp(&b.end))
        });
        Self { intervals }
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn validate(&self, num_labels: usize) -> Result<(), AggregateError> {
        for interval in &self.intervals {
            if !interval.start.is_finite() || !interval.end.is_finite() {
                return Err(AggregateError::NonFiniteBound {
                    start: interval.start,
                    end: interval.end,
                });
            }
            if interval.label >= num_labels {
                return Err(AggregateError::LabelOutOfRange {
                    start: interval.start,
                    end: interval.end,
                    label: interval.label,
                    num_labels,
                });
            }
        }
        Ok(())
    }
}

/// Counts, for each unit window `0..window_count` and each label, how many intervals of
/// that label cover the window start.
///
/// Returns a `[window_count, num_labels]` matrix. Windows no interval touches stay zero.
pub fn aggregate_windows(
    window_count: usize,
    track: &IntervalTrack,
    num_labels: usize,
) -> Result<Array2<u32>, AggregateError> {
    track.validate(num_labels)?;
    let mut counts = Array2::<u32>::zeros((window_count, num_labels));
    if window_count == 0 {
        return Ok(counts);
    }

    let last_window = (window_count - 1) as f64;
    for interval in track.as_slice() {
        // Integer window starts inside [start, end], clipped to the recording.
        let first = interval.start.ceil().max(0.0);
        let last = interval.end.floor().min(last_window);
        if first > last {
            continue;
        }
        for window in first as usize..=last as usize {
            counts[[window, interval.label]] += 1;
        }
    }

    Ok(counts)
}

/// Counts, for each sample timestamp and each label, how many intervals of that label
/// cover the timestamp.
///
/// Returns a `[times.len(), num_labels]` matrix aligned with the sample order.
pub fn label_samples(
    times: ArrayView1<f64>,
    track: &IntervalTrack,
    num_labels: usize,
) -> Result<Array2<u32>, AggregateError> {
    track.validate(num_labels)?;
    let intervals = track.as_slice();
    let mut counts = Array2::<u32>::zeros((times.len(), num_labels));

    for (mut row, &t) in counts.axis_iter_mut(Axis(0)).zip(times.iter()) {
        // Sorted by start: only the prefix with start <= t can cover t.
        let candidates = intervals.partition_point(|interval| interval.start <= t);
        for interval in &intervals[..candidates] {
            if interval.covers(t) {
                row[interval.label] += 1;
            }
        }
    }

    Ok(counts)
}

/// Number of rows with at least one non-zero count.
pub fn active_rows(counts: ArrayView2<u32>) -> usize {
    counts
        .axis_iter(Axis(0))
        .filter(|row| row.iter().any(|&c| c > 0))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn interval(start: f64, end: f64, label: usize) -> Interval {
        Interval { start, end, label }
    }

    #[test]
    fn inclusive_boundaries_cover_both_edge_windows() {
        let track = IntervalTrack::merge([vec![interval(0.0, 2.0, 0)]]);
        let counts = aggregate_windows(3, &track, 1).unwrap();
        assert_eq!(counts, array![[1], [1], [1]]);
    }

    #[test]
    fn fractional_bounds_only_cover_contained_window_starts() {
        let track = IntervalTrack::merge([vec![interval(0.5, 2.5, 1)]]);
        let counts = aggregate_windows(4, &track, 2).unwrap();
        assert_eq!(counts.column(1).to_vec(), vec![0, 1, 1, 0]);
        assert_eq!(counts.column(0).to_vec(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn overlapping_intervals_accumulate_counts() {
        let track = IntervalTrack::merge([
            vec![interval(0.0, 1.0, 0)],
            vec![interval(1.0, 3.0, 0), interval(0.0, 0.5, 1)],
        ]);
        let counts = aggregate_windows(4, &track, 2).unwrap();
        assert_eq!(counts, array![[1, 1], [2, 0], [1, 0], [1, 0]]);
    }

    #[test]
    fn intervals_outside_the_recording_are_clipped() {
        let track = IntervalTrack::merge([vec![
            interval(-3.0, 0.0, 0),
            interval(2.0, 50.0, 0),
            interval(10.0, 12.0, 0),
        ]]);
        let counts = aggregate_windows(3, &track, 1).unwrap();
        assert_eq!(counts.column(0).to_vec(), vec![1, 0, 1]);
    }

    #[test]
    fn unannotated_windows_stay_zero() {
        let counts = aggregate_windows(5, &IntervalTrack::default(), 3).unwrap();
        assert_eq!(counts.shape(), &[5, 3]);
        assert!(counts.iter().all(|&c| c == 0));
        assert_eq!(active_rows(counts.view()), 0);
    }

    #[test]
    fn zero_windows_gives_empty_matrix() {
        let track = IntervalTrack::merge([vec![interval(0.0, 2.0, 0)]]);
        let counts = aggregate_windows(0, &track, 2).unwrap();
        assert_eq!(counts.shape(), &[0, 2]);
    }

    #[test]
    fn label_outside_vocabulary_is_rejected() {
        let track = IntervalTrack::merge([vec![interval(0.0, 1.0, 5)]]);
        let err = aggregate_windows(2, &track, 3).unwrap_err();
        assert_eq!(
            err,
            AggregateError::LabelOutOfRange {
                start: 0.0,
                end: 1.0,
                label: 5,
                num_labels: 3,
            }
        );
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let track = IntervalTrack::merge([vec![interval(0.0, f64::NAN, 0)]]);
        assert!(matches!(
            aggregate_windows(2, &track, 1),
            Err(AggregateError::NonFiniteBound { .. })
        ));
    }

    #[test]
    fn merge_sorts_by_start_then_end_and_keeps_every_row() {
        let first = vec![interval(2.0, 3.0, 0), interval(0.0, 5.0, 1)];
        let second = vec![interval(0.0, 1.0, 2), interval(2.0, 3.0, 3)];
        let track = IntervalTrack::merge([first, second]);

        let keys: Vec<(f64, f64, usize)> = track
            .as_slice()
            .iter()
            .map(|i| (i.start, i.end, i.label))
            .collect();
        // Duplicate (2, 3) spans survive and keep file order.
        assert_eq!(
            keys,
            vec![
                (0.0, 1.0, 2),
                (0.0, 5.0, 1),
                (2.0, 3.0, 0),
                (2.0, 3.0, 3),
            ]
        );
    }

    #[test]
    fn merge_of_zero_or_one_file() {
        assert!(IntervalTrack::merge(Vec::<Vec<Interval>>::new()).is_empty());

        let single = IntervalTrack::merge([vec![interval(4.0, 5.0, 0), interval(1.0, 2.0, 0)]]);
        assert_eq!(single.len(), 2);
        assert_eq!(single.as_slice()[0].start, 1.0);
    }

    #[test]
    fn samples_are_labelled_by_covering_intervals() {
        let track = IntervalTrack::merge([
            vec![interval(0.0, 1.0, 0), interval(0.5, 2.0, 1)],
            vec![interval(0.9, 1.2, 0)],
        ]);
        let times = array![0.0, 0.7, 1.0, 1.5, 2.5];
        let counts = label_samples(times.view(), &track, 2).unwrap();
        assert_eq!(
            counts,
            array![[1, 0], [1, 1], [2, 1], [0, 1], [0, 0]]
        );
        assert_eq!(active_rows(counts.view()), 4);
    }
}
