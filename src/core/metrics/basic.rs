use super::channels::CHANNEL_COUNT;
use crate::core::engine::RunTable;
use crate::core::model::{SummaryField, quantile_sorted};

#[derive(Clone, Debug, PartialEq)]
pub struct Overview {
    pub total_reads: u64,
    pub total_bases: u64,
    pub mean_length: f64,
    pub median_length: f64,
    pub n50: u64,
    pub mean_qscore: f64,
    pub median_qscore: f64,
    pub active_channels: usize,
    pub run_hours: Option<f64>,
}

pub fn overview(table: &RunTable) -> Overview {
    let total_reads = table.len() as u64;
    let mut lengths: Vec<f64> = Vec::with_capacity(table.len());
    let mut qscores: Vec<f64> = Vec::with_capacity(table.len());
    let mut total_bases = 0u64;
    let mut seen = [false; CHANNEL_COUNT];
    for record in table.records() {
        total_bases += record.length;
        lengths.push(record.length as f64);
        qscores.push(record.mean_qscore);
        seen[(record.channel - 1) as usize] = true;
    }
    lengths.sort_by(|a, b| a.total_cmp(b));
    qscores.sort_by(|a, b| a.total_cmp(b));

    let run_hours = if table.supports(SummaryField::Duration) {
        table
            .records()
            .iter()
            .filter_map(|r| r.end_time_hours())
            .reduce(f64::max)
    } else {
        None
    };

    Overview {
        total_reads,
        total_bases,
        mean_length: mean(&lengths),
        median_length: median(&lengths),
        n50: n50(table, total_bases),
        mean_qscore: mean(&qscores),
        median_qscore: median(&qscores),
        active_channels: seen.iter().filter(|&&s| s).count(),
        run_hours,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    quantile_sorted(sorted, 0.5)
}

// Smallest length such that reads at least that long cover half the
// total bases.
fn n50(table: &RunTable, total_bases: u64) -> u64 {
    if total_bases == 0 {
        return 0;
    }
    let mut lengths: Vec<u64> = table.records().iter().map(|r| r.length).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let mut acc = 0u64;
    for len in lengths {
        acc += len;
        if acc * 2 >= total_bases {
            return len;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::{aggregator, aggregator_without_optional, record};

    #[test]
    fn overview_of_small_run() {
        let mut records = Vec::new();
        for (i, (len, q)) in [(1000u64, 8.0), (2000, 9.0), (7000, 10.0)].iter().enumerate() {
            let mut r = record(&format!("r{i}"), "a", (i + 1) as u16);
            r.length = *len;
            r.mean_qscore = *q;
            r.start_time = 3600.0 * i as f64;
            r.duration = Some(1800.0);
            records.push(r);
        }
        let agg = aggregator(records);
        let ov = overview(agg.table());
        assert_eq!(ov.total_reads, 3);
        assert_eq!(ov.total_bases, 10_000);
        assert_eq!(ov.mean_length, 10_000.0 / 3.0);
        assert_eq!(ov.median_length, 2000.0);
        assert_eq!(ov.n50, 7000);
        assert_eq!(ov.mean_qscore, 9.0);
        assert_eq!(ov.median_qscore, 9.0);
        assert_eq!(ov.active_channels, 3);
        assert_eq!(ov.run_hours, Some(2.5));
    }

    #[test]
    fn run_hours_absent_without_duration() {
        let agg = aggregator_without_optional(vec![record("r1", "a", 1)]);
        let ov = overview(agg.table());
        assert_eq!(ov.run_hours, None);
        assert_eq!(ov.active_channels, 1);
    }
}
