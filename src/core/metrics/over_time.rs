use crate::core::engine::RunTable;
use crate::core::errors::QcError;
use crate::core::model::{Level, SummaryField, ValueField, WindowStats, quantile_sorted};
use crate::core::summary::{COL_DURATION, COL_NUM_EVENTS, Record};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThroughputRow {
    pub window_start: f64,
    pub value: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeStatsRow {
    pub window_start: f64,
    pub stats: Option<WindowStats>,
}

/// Per-window output over the experiment: record count at `Reads`
/// level, summed bases or events otherwise. Windows are half-open
/// `[t, t + w)` starting at 0; a record whose end time equals the last
/// window multiple still lands in a window, so every record is counted
/// exactly once.
pub fn throughput_over_time(
    table: &RunTable,
    level: Level,
    window_hours: f64,
) -> Result<Vec<ThroughputRow>, QcError> {
    check_window(window_hours)?;
    if level == Level::Events && !table.supports(SummaryField::NumEvents) {
        return Err(QcError::MissingField(COL_NUM_EVENTS));
    }
    let ends = end_times(table)?;
    let Some(windows) = window_count(&ends, window_hours) else {
        return Ok(Vec::new());
    };

    let mut values = vec![0u64; windows];
    for (record, &end) in table.records().iter().zip(&ends) {
        let idx = window_index(end, window_hours, windows);
        values[idx] += match level {
            Level::Reads => 1,
            Level::Bases => record.length,
            Level::Events => record.num_events.unwrap_or(0),
        };
    }

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| ThroughputRow {
            window_start: i as f64 * window_hours,
            value,
        })
        .collect())
}

/// Per-window mean, min, max and quartiles of a record field. Empty
/// windows carry no statistics rather than zeros.
pub fn windowed_stats(
    table: &RunTable,
    field: ValueField,
    window_hours: f64,
) -> Result<Vec<TimeStatsRow>, QcError> {
    check_window(window_hours)?;
    let ends = end_times(table)?;
    let Some(windows) = window_count(&ends, window_hours) else {
        return Ok(Vec::new());
    };

    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); windows];
    for (record, &end) in table.records().iter().zip(&ends) {
        let idx = window_index(end, window_hours, windows);
        buckets[idx].push(field.value(record));
    }

    Ok(buckets
        .into_iter()
        .enumerate()
        .map(|(i, mut bucket)| {
            let stats = if bucket.is_empty() {
                None
            } else {
                bucket.sort_by(|a, b| a.total_cmp(b));
                Some(stats_of(&bucket))
            };
            TimeStatsRow {
                window_start: i as f64 * window_hours,
                stats,
            }
        })
        .collect())
}

fn check_window(window_hours: f64) -> Result<(), QcError> {
    if !window_hours.is_finite() || window_hours <= 0.0 {
        return Err(QcError::InvalidRange(format!(
            "window size must be positive, got {window_hours}"
        )));
    }
    Ok(())
}

fn end_times(table: &RunTable) -> Result<Vec<f64>, QcError> {
    if !table.supports(SummaryField::Duration) {
        return Err(QcError::MissingField(COL_DURATION));
    }
    table
        .records()
        .iter()
        .map(end_hours)
        .collect()
}

fn end_hours(record: &Record) -> Result<f64, QcError> {
    record
        .end_time_hours()
        .ok_or(QcError::MissingField(COL_DURATION))
}

fn window_count(ends: &[f64], window_hours: f64) -> Option<usize> {
    let max_end = ends.iter().cloned().reduce(f64::max)?;
    Some((max_end / window_hours).floor() as usize + 1)
}

fn window_index(end: f64, window_hours: f64, windows: usize) -> usize {
    let idx = (end / window_hours).floor() as usize;
    idx.min(windows - 1)
}

fn stats_of(sorted: &[f64]) -> WindowStats {
    let sum: f64 = sorted.iter().sum();
    WindowStats {
        mean: sum / sorted.len() as f64,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q1: quantile_sorted(sorted, 0.25),
        q3: quantile_sorted(sorted, 0.75),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::{aggregator, aggregator_without_optional, record};

    fn read_at(read_id: &str, end_hours: f64) -> Record {
        let mut r = record(read_id, "a", 1);
        r.start_time = end_hours * 3600.0;
        r.duration = Some(0.0);
        r
    }

    #[test]
    fn windows_partition_all_records() {
        let agg = aggregator(vec![
            read_at("r1", 0.1),
            read_at("r2", 0.25),
            read_at("r3", 0.3),
            read_at("r4", 0.5),
        ]);
        let rows = throughput_over_time(agg.table(), Level::Reads, 0.25).expect("aggregate");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].window_start, 0.0);
        assert_eq!(rows[1].window_start, 0.25);
        assert_eq!(rows[2].window_start, 0.5);
        assert_eq!(rows[0].value, 1);
        assert_eq!(rows[1].value, 2);
        // end time equal to the max window multiple is still counted
        assert_eq!(rows[2].value, 1);
        let total: u64 = rows.iter().map(|r| r.value).sum();
        assert_eq!(total, agg.total_reads());
    }

    #[test]
    fn empty_windows_count_zero() {
        let agg = aggregator(vec![read_at("r1", 0.1), read_at("r2", 0.9)]);
        let rows = throughput_over_time(agg.table(), Level::Reads, 0.25).expect("aggregate");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].value, 0);
        assert_eq!(rows[2].value, 0);
        assert_eq!(rows[3].value, 1);
    }

    #[test]
    fn bases_level_sums_lengths_per_window() {
        let mut r1 = read_at("r1", 0.1);
        r1.length = 300;
        let mut r2 = read_at("r2", 0.2);
        r2.length = 700;
        let agg = aggregator(vec![r1, r2]);
        let rows = throughput_over_time(agg.table(), Level::Bases, 0.25).expect("aggregate");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 1000);
    }

    #[test]
    fn stats_windows_hold_quartiles() {
        let mut records = Vec::new();
        for (i, q) in [8.0, 9.0, 10.0, 11.0].iter().enumerate() {
            let mut r = read_at(&format!("r{i}"), 0.1);
            r.mean_qscore = *q;
            records.push(r);
        }
        records.push(read_at("late", 0.6));
        let agg = aggregator(records);
        let rows = windowed_stats(agg.table(), ValueField::MeanQscore, 0.25).expect("aggregate");
        assert_eq!(rows.len(), 3);
        let stats = rows[0].stats.expect("first window has records");
        assert_eq!(stats.mean, 9.5);
        assert_eq!(stats.min, 8.0);
        assert_eq!(stats.max, 11.0);
        assert_eq!(stats.q1, 8.75);
        assert_eq!(stats.q3, 10.25);
        assert_eq!(rows[1].stats, None);
        assert!(rows[2].stats.is_some());
    }

    #[test]
    fn record_ending_at_zero_occupies_first_window() {
        let agg = aggregator(vec![read_at("r1", 0.0)]);
        let rows = throughput_over_time(agg.table(), Level::Reads, 0.25).expect("aggregate");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].window_start, 0.0);
        assert_eq!(rows[0].value, 1);
    }

    #[test]
    fn non_positive_window_is_invalid() {
        let agg = aggregator(vec![read_at("r1", 0.1)]);
        assert!(matches!(
            throughput_over_time(agg.table(), Level::Reads, 0.0),
            Err(QcError::InvalidRange(_))
        ));
        assert!(matches!(
            windowed_stats(agg.table(), ValueField::ReadLength, -1.0),
            Err(QcError::InvalidRange(_))
        ));
    }

    #[test]
    fn missing_duration_fails_at_query_time() {
        let agg = aggregator_without_optional(vec![record("r1", "a", 1)]);
        assert!(matches!(
            throughput_over_time(agg.table(), Level::Reads, 0.25),
            Err(QcError::MissingField("duration"))
        ));
        assert!(matches!(
            windowed_stats(agg.table(), ValueField::MeanQscore, 0.25),
            Err(QcError::MissingField("duration"))
        ));
    }

    #[test]
    fn identical_queries_are_identical() {
        let agg = aggregator(vec![read_at("r1", 0.1), read_at("r2", 0.4)]);
        let a = windowed_stats(agg.table(), ValueField::MeanQscore, 0.25).expect("aggregate");
        let b = windowed_stats(agg.table(), ValueField::MeanQscore, 0.25).expect("aggregate");
        assert_eq!(a, b);
    }
}
