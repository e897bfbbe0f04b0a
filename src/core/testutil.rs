use crate::core::engine::RunAggregator;
use crate::core::summary::{Record, RecordTable};

pub(crate) fn record(read_id: &str, run_id: &str, channel: u16) -> Record {
    Record {
        read_id: read_id.to_string(),
        run_id: run_id.to_string(),
        channel,
        start_time: 0.0,
        duration: Some(60.0),
        length: 1000,
        mean_qscore: 9.0,
        num_events: Some(500),
    }
}

pub(crate) fn table_of(records: Vec<Record>) -> RecordTable {
    RecordTable {
        records,
        has_duration: true,
        has_num_events: true,
        dropped_rows: 0,
    }
}

pub(crate) fn aggregator(records: Vec<Record>) -> RunAggregator {
    RunAggregator::from_records(table_of(records), None, false).expect("build aggregator")
}

/// Same as `aggregator`, but with the optional columns flagged absent
/// and cleared from every record.
pub(crate) fn aggregator_without_optional(records: Vec<Record>) -> RunAggregator {
    let mut parsed = table_of(records);
    parsed.has_duration = false;
    parsed.has_num_events = false;
    for r in &mut parsed.records {
        r.duration = None;
        r.num_events = None;
    }
    RunAggregator::from_records(parsed, None, false).expect("build aggregator")
}
