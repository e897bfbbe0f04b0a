use crate::core::errors::QcError;
use memchr::memchr;

pub const COL_READ_ID: &str = "read_id";
pub const COL_RUN_ID: &str = "run_id";
pub const COL_CHANNEL: &str = "channel";
pub const COL_START_TIME: &str = "start_time";
pub const COL_DURATION: &str = "duration";
pub const COL_LENGTH: &str = "sequence_length_template";
pub const COL_MEAN_QSCORE: &str = "mean_qscore_template";
pub const COL_NUM_EVENTS: &str = "num_events";

pub const MIN_CHANNEL: u16 = 1;
pub const MAX_CHANNEL: u16 = 512;

/// One basecalled read from the sequencing summary.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub read_id: String,
    pub run_id: String,
    pub channel: u16,
    pub start_time: f64,
    pub duration: Option<f64>,
    pub length: u64,
    pub mean_qscore: f64,
    pub num_events: Option<u64>,
}

impl Record {
    pub fn end_time_hours(&self) -> Option<f64> {
        self.duration.map(|d| (self.start_time + d) / 3600.0)
    }
}

/// All usable records from one summary file, before run selection.
#[derive(Clone, Debug)]
pub struct RecordTable {
    pub records: Vec<Record>,
    pub has_duration: bool,
    pub has_num_events: bool,
    pub dropped_rows: usize,
}

#[derive(Clone, Copy, Debug)]
struct ColumnMap {
    read_id: usize,
    run_id: usize,
    channel: usize,
    start_time: usize,
    length: usize,
    mean_qscore: usize,
    duration: Option<usize>,
    num_events: Option<usize>,
    width: usize,
}

impl ColumnMap {
    fn resolve(header: &[u8]) -> Result<Self, QcError> {
        let header = std::str::from_utf8(header)
            .map_err(|_| QcError::Parse("summary header is not valid UTF-8".to_string()))?;
        let names: Vec<&str> = header.split('\t').collect();
        let find = |name: &str| names.iter().position(|n| *n == name);

        let mut missing = Vec::new();
        let mut require = |name: &'static str| match find(name) {
            Some(i) => i,
            None => {
                missing.push(name);
                0
            }
        };

        let map = ColumnMap {
            read_id: require(COL_READ_ID),
            run_id: require(COL_RUN_ID),
            channel: require(COL_CHANNEL),
            start_time: require(COL_START_TIME),
            length: require(COL_LENGTH),
            mean_qscore: require(COL_MEAN_QSCORE),
            duration: find(COL_DURATION),
            num_events: find(COL_NUM_EVENTS),
            width: names.len(),
        };
        if !missing.is_empty() {
            return Err(QcError::Parse(format!(
                "summary header is missing required columns: {}",
                missing.join(", ")
            )));
        }
        Ok(map)
    }
}

/// Parse a whole summary file. Rows with a null, unparseable, or
/// out-of-range value in any present column are dropped, never
/// partially used.
pub fn parse_summary(bytes: &[u8]) -> Result<RecordTable, QcError> {
    let mut lines = Lines::new(bytes);
    let header = loop {
        match lines.next() {
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
            None => return Err(QcError::Parse("summary file is empty".to_string())),
        }
    };
    let map = ColumnMap::resolve(header)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    let mut fields: Vec<&[u8]> = Vec::with_capacity(map.width);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        split_fields(line, &mut fields);
        match parse_row(&fields, &map) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    Ok(RecordTable {
        records,
        has_duration: map.duration.is_some(),
        has_num_events: map.num_events.is_some(),
        dropped_rows: dropped,
    })
}

fn parse_row(fields: &[&[u8]], map: &ColumnMap) -> Option<Record> {
    if fields.len() != map.width {
        return None;
    }
    let channel = parse_int(fields[map.channel])?;
    if !(MIN_CHANNEL as u64..=MAX_CHANNEL as u64).contains(&channel) {
        return None;
    }
    let channel = channel as u16;
    let duration = match map.duration {
        Some(i) => Some(parse_float(fields[i])?),
        None => None,
    };
    let num_events = match map.num_events {
        Some(i) => Some(parse_int(fields[i])?),
        None => None,
    };
    Some(Record {
        read_id: parse_str(fields[map.read_id])?,
        run_id: parse_str(fields[map.run_id])?,
        channel,
        start_time: parse_float(fields[map.start_time])?,
        duration,
        length: parse_int(fields[map.length])?,
        mean_qscore: parse_float(fields[map.mean_qscore])?,
        num_events,
    })
}

fn parse_str(field: &[u8]) -> Option<String> {
    if field.is_empty() {
        return None;
    }
    std::str::from_utf8(field).ok().map(str::to_string)
}

fn parse_int(field: &[u8]) -> Option<u64> {
    let s = std::str::from_utf8(field).ok()?;
    if s.is_empty() {
        return None;
    }
    s.parse::<u64>().ok()
}

// A field that parses to a non-finite float (NaN, inf, empty) counts
// as null and drops the row.
fn parse_float(field: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(field).ok()?;
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn split_fields<'a>(line: &'a [u8], fields: &mut Vec<&'a [u8]>) {
    fields.clear();
    let mut rest = line;
    while let Some(i) = memchr(b'\t', rest) {
        fields.push(&rest[..i]);
        rest = &rest[i + 1..];
    }
    fields.push(rest);
}

struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let line = match memchr(b'\n', rest) {
            Some(i) => {
                self.pos += i + 1;
                &rest[..i]
            }
            None => {
                self.pos = self.bytes.len();
                rest
            }
        };
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}
