use crate::core::engine::RunTable;
use crate::core::errors::QcError;
use crate::core::model::{Level, SummaryField};
use crate::core::summary::COL_NUM_EVENTS;

pub const CHANNEL_COUNT: usize = 512;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelActivityRow {
    pub channel: u16,
    pub value: u64,
}

/// Aggregate per-channel output at read, base or event level. Always
/// 512 rows keyed 1..=512 ascending, zero-filled for channels with no
/// records, so consumers can reshape row-major into the 16x32 flowcell
/// grid.
pub fn channel_activity(table: &RunTable, level: Level) -> Result<Vec<ChannelActivityRow>, QcError> {
    if level == Level::Events && !table.supports(SummaryField::NumEvents) {
        return Err(QcError::MissingField(COL_NUM_EVENTS));
    }

    let mut values = [0u64; CHANNEL_COUNT];
    for record in table.records() {
        let slot = &mut values[(record.channel - 1) as usize];
        match level {
            Level::Reads => *slot += 1,
            Level::Bases => *slot += record.length,
            Level::Events => *slot += record.num_events.unwrap_or(0),
        }
    }

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &value)| ChannelActivityRow {
            channel: (i + 1) as u16,
            value,
        })
        .collect())
}
