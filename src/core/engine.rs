use crate::core::errors::QcError;
use crate::core::io::InputBytes;
use crate::core::metrics::{
    self, ChannelActivityRow, Distribution, Overview, RangeConfig, ThroughputRow, TimeStatsRow,
};
use crate::core::model::{Level, SummaryField, ValueField};
use crate::core::summary::{self, Record, RecordTable};
use std::collections::HashMap;
use std::path::Path;

const PREVIEW_ROWS: usize = 5;

/// The records of one selected run, in original file order, indexed by
/// `read_id`. Immutable for the aggregator's lifetime.
#[derive(Debug)]
pub struct RunTable {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    has_duration: bool,
    has_num_events: bool,
}

impl RunTable {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, read_id: &str) -> Option<&Record> {
        self.index.get(read_id).map(|&i| &self.records[i])
    }

    /// Capability query: whether the loaded summary carries this field.
    /// Callers probe before invoking an aggregation that needs an
    /// optional column.
    pub fn supports(&self, field: SummaryField) -> bool {
        match field {
            SummaryField::Duration => self.has_duration,
            SummaryField::NumEvents => self.has_num_events,
            _ => true,
        }
    }
}

#[derive(Debug)]
pub struct RunAggregator {
    table: RunTable,
    run_id: String,
    total_reads: u64,
}

impl RunAggregator {
    /// Load a sequencing summary (plain or gzipped) and select one run.
    /// With no explicit `run_id` the run with the most records wins,
    /// ties broken by first appearance in the file.
    pub fn from_file(path: &Path, run_id: Option<&str>, verbose: bool) -> Result<Self, QcError> {
        let input = InputBytes::open(path)?;
        let parsed = summary::parse_summary(input.bytes())?;
        if verbose && parsed.dropped_rows > 0 {
            eprintln!("Dropped {} incomplete rows", parsed.dropped_rows);
        }
        Self::from_records(parsed, run_id, verbose)
    }

    pub fn from_records(
        parsed: RecordTable,
        run_id: Option<&str>,
        verbose: bool,
    ) -> Result<Self, QcError> {
        let (order, counts) = run_counts(&parsed.records);
        if order.is_empty() {
            return Err(QcError::Parse("no usable records in summary".to_string()));
        }

        let selected = match run_id {
            Some(id) => {
                if !counts.contains_key(id) {
                    return Err(QcError::UnknownRunId(id.to_string()));
                }
                id.to_string()
            }
            None => {
                let mut best = order[0].as_str();
                for id in &order[1..] {
                    if counts[id.as_str()] > counts[best] {
                        best = id;
                    }
                }
                best.to_string()
            }
        };
        let total_reads = counts[selected.as_str()];

        if verbose {
            print_run_distribution(&order, &counts, &selected);
        }

        let records: Vec<Record> = parsed
            .records
            .into_iter()
            .filter(|r| r.run_id == selected)
            .collect();

        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.read_id.clone(), i).is_some() {
                return Err(QcError::DuplicateKey(record.read_id.clone()));
            }
        }

        if verbose {
            print_preview(&records);
        }

        Ok(Self {
            table: RunTable {
                records,
                index,
                has_duration: parsed.has_duration,
                has_num_events: parsed.has_num_events,
            },
            run_id: selected,
            total_reads,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn table(&self) -> &RunTable {
        &self.table
    }

    pub fn overview(&self) -> Overview {
        metrics::overview(&self.table)
    }

    pub fn channel_activity(&self, level: Level) -> Result<Vec<ChannelActivityRow>, QcError> {
        metrics::channel_activity(&self.table, level)
    }

    pub fn throughput_over_time(
        &self,
        level: Level,
        window_hours: f64,
    ) -> Result<Vec<ThroughputRow>, QcError> {
        metrics::throughput_over_time(&self.table, level, window_hours)
    }

    pub fn windowed_stats(
        &self,
        field: ValueField,
        window_hours: f64,
    ) -> Result<Vec<TimeStatsRow>, QcError> {
        metrics::windowed_stats(&self.table, field, window_hours)
    }

    pub fn value_distribution(
        &self,
        field: ValueField,
        cfg: &RangeConfig,
    ) -> Result<Distribution, QcError> {
        metrics::value_distribution(&self.table, field, cfg)
    }
}

fn run_counts(records: &[Record]) -> (Vec<String>, HashMap<String, u64>) {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        match counts.get_mut(record.run_id.as_str()) {
            Some(count) => *count += 1,
            None => {
                order.push(record.run_id.clone());
                counts.insert(record.run_id.clone(), 1);
            }
        }
    }
    (order, counts)
}

fn print_run_distribution(order: &[String], counts: &HashMap<String, u64>, selected: &str) {
    let mut by_count: Vec<&String> = order.iter().collect();
    by_count.sort_by(|a, b| counts[b.as_str()].cmp(&counts[a.as_str()]));
    eprintln!("Run ids found in summary:");
    for id in by_count {
        eprintln!("  {}\t{}", id, counts[id.as_str()]);
    }
    eprintln!("Selected run id {}", selected);
}

fn print_preview(records: &[Record]) {
    eprintln!("read_id\tchannel\tstart_time\tlength\tmean_qscore");
    for record in records.iter().take(PREVIEW_ROWS) {
        eprintln!(
            "{}\t{}\t{}\t{}\t{}",
            record.read_id, record.channel, record.start_time, record.length, record.mean_qscore
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::{record, table_of};

    fn numbered(run_id: &str, n: usize, offset: usize) -> Vec<Record> {
        (0..n)
            .map(|i| record(&format!("{run_id}-{}", i + offset), run_id, 1))
            .collect()
    }

    #[test]
    fn selects_largest_run_by_default() {
        let mut records = numbered("a", 10, 0);
        records.extend(numbered("b", 30, 0));
        let agg = RunAggregator::from_records(table_of(records), None, false).expect("build");
        assert_eq!(agg.run_id(), "b");
        assert_eq!(agg.total_reads(), 30);
        assert_eq!(agg.table().len(), 30);
    }

    #[test]
    fn tie_breaks_to_first_seen() {
        let mut records = numbered("mux", 5, 0);
        records.extend(numbered("seq", 5, 0));
        let agg = RunAggregator::from_records(table_of(records), None, false).expect("build");
        assert_eq!(agg.run_id(), "mux");
    }

    #[test]
    fn filtered_table_holds_exactly_the_selected_run() {
        let mut records = numbered("a", 3, 0);
        records.extend(numbered("b", 2, 0));
        records.extend(numbered("a", 2, 3));
        let agg =
            RunAggregator::from_records(table_of(records), Some("a"), false).expect("build");
        assert_eq!(agg.total_reads(), 5);
        assert!(agg.table().records().iter().all(|r| r.run_id == "a"));
        let ids: Vec<&str> = agg.table().records().iter().map(|r| r.read_id.as_str()).collect();
        assert_eq!(ids, ["a-0", "a-1", "a-2", "a-3", "a-4"]);
    }

    #[test]
    fn explicit_unknown_run_id_fails() {
        let err = RunAggregator::from_records(table_of(numbered("a", 3, 0)), Some("zzz"), false)
            .unwrap_err();
        match err {
            QcError::UnknownRunId(id) => assert_eq!(id, "zzz"),
            other => panic!("expected UnknownRunId, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_read_id_fails() {
        let records = vec![record("r1", "a", 1), record("r1", "a", 2)];
        let err = RunAggregator::from_records(table_of(records), None, false).unwrap_err();
        match err {
            QcError::DuplicateKey(id) => assert_eq!(id, "r1"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_read_id_in_other_run_is_fine() {
        let records = vec![
            record("r1", "a", 1),
            record("r1", "b", 2),
            record("r2", "b", 3),
        ];
        let agg = RunAggregator::from_records(table_of(records), Some("b"), false).expect("build");
        assert_eq!(agg.total_reads(), 2);
        assert_eq!(agg.table().get("r1").map(|r| r.channel), Some(2));
        assert!(agg.table().get("missing").is_none());
    }

    #[test]
    fn empty_table_fails() {
        let err = RunAggregator::from_records(table_of(Vec::new()), None, false).unwrap_err();
        assert!(matches!(err, QcError::Parse(_)));
    }

    #[test]
    fn capability_query_reflects_columns() {
        let mut parsed = table_of(numbered("a", 1, 0));
        parsed.has_duration = false;
        for r in &mut parsed.records {
            r.duration = None;
        }
        let agg = RunAggregator::from_records(parsed, None, false).expect("build");
        assert!(!agg.table().is_empty());
        assert!(!agg.table().supports(SummaryField::Duration));
        assert!(agg.table().supports(SummaryField::NumEvents));
        for field in [
            SummaryField::ReadId,
            SummaryField::RunId,
            SummaryField::Channel,
            SummaryField::StartTime,
            SummaryField::SequenceLength,
            SummaryField::MeanQscore,
        ] {
            assert!(agg.table().supports(field));
        }
    }
}
