use crate::core::engine::RunAggregator;
use crate::core::metrics::{Distribution, RangeConfig};
use crate::core::model::{BinMode, Level, SummaryField, ValueField};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct ReportConfig {
    pub time_window_hours: f64,
    pub length_bin: f64,
    pub qscore_bin: f64,
    pub length_log: bool,
    pub normalized: bool,
}

pub fn write(path: &Path, agg: &RunAggregator, cfg: &ReportConfig) -> Result<()> {
    let mut w = BufWriter::new(File::create(path).with_context(|| "create qc_data.txt failed")?);

    write_channel_activity(&mut w, agg)?;
    if agg.table().supports(SummaryField::Duration) {
        write_output_over_time(&mut w, agg, cfg)?;
        write_quality_over_time(&mut w, agg, cfg)?;
    }
    write_length_distribution(&mut w, agg, cfg)?;
    write_qscore_distribution(&mut w, agg, cfg)?;

    Ok(())
}

fn write_channel_activity(w: &mut dyn Write, agg: &RunAggregator) -> Result<()> {
    let with_events = agg.table().supports(SummaryField::NumEvents);
    let reads = agg.channel_activity(Level::Reads)?;
    let bases = agg.channel_activity(Level::Bases)?;
    let events = if with_events {
        Some(agg.channel_activity(Level::Events)?)
    } else {
        None
    };

    writeln!(w, ">>Channel activity")?;
    if with_events {
        writeln!(w, "#Channel\tReads\tBases\tEvents")?;
    } else {
        writeln!(w, "#Channel\tReads\tBases")?;
    }
    for (i, row) in reads.iter().enumerate() {
        match &events {
            Some(events) => writeln!(
                w,
                "{}\t{}\t{}\t{}",
                row.channel, row.value, bases[i].value, events[i].value
            )?,
            None => writeln!(w, "{}\t{}\t{}", row.channel, row.value, bases[i].value)?,
        }
    }
    writeln!(w, ">>END_MODULE")?;
    Ok(())
}

fn write_output_over_time(
    w: &mut dyn Write,
    agg: &RunAggregator,
    cfg: &ReportConfig,
) -> Result<()> {
    let with_events = agg.table().supports(SummaryField::NumEvents);
    let reads = agg.throughput_over_time(Level::Reads, cfg.time_window_hours)?;
    let bases = agg.throughput_over_time(Level::Bases, cfg.time_window_hours)?;
    let events = if with_events {
        Some(agg.throughput_over_time(Level::Events, cfg.time_window_hours)?)
    } else {
        None
    };

    writeln!(w, ">>Output over time")?;
    if with_events {
        writeln!(w, "#Window start (h)\tReads\tBases\tEvents")?;
    } else {
        writeln!(w, "#Window start (h)\tReads\tBases")?;
    }
    for (i, row) in reads.iter().enumerate() {
        match &events {
            Some(events) => writeln!(
                w,
                "{}\t{}\t{}\t{}",
                row.window_start, row.value, bases[i].value, events[i].value
            )?,
            None => writeln!(
                w,
                "{}\t{}\t{}",
                row.window_start, row.value, bases[i].value
            )?,
        }
    }
    writeln!(w, ">>END_MODULE")?;
    Ok(())
}

fn write_quality_over_time(
    w: &mut dyn Write,
    agg: &RunAggregator,
    cfg: &ReportConfig,
) -> Result<()> {
    let rows = agg.windowed_stats(ValueField::MeanQscore, cfg.time_window_hours)?;

    writeln!(w, ">>Read quality over time")?;
    writeln!(w, "#Window start (h)\tMean\tMin\tMax\tQ1\tQ3")?;
    for row in rows {
        match row.stats {
            Some(stats) => writeln!(
                w,
                "{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
                row.window_start, stats.mean, stats.min, stats.max, stats.q1, stats.q3
            )?,
            None => writeln!(
                w,
                "{}\tNA\tNA\tNA\tNA\tNA",
                row.window_start
            )?,
        }
    }
    writeln!(w, ">>END_MODULE")?;
    Ok(())
}

fn write_length_distribution(
    w: &mut dyn Write,
    agg: &RunAggregator,
    cfg: &ReportConfig,
) -> Result<()> {
    let mut range = RangeConfig::new(cfg.length_bin);
    range.normalized = cfg.normalized;
    if cfg.length_log {
        range.mode = BinMode::Log10;
        range.min = Some(1.0);
    }
    let dist = agg.value_distribution(ValueField::ReadLength, &range)?;
    write_distribution(w, ">>Read length distribution", &dist)
}

fn write_qscore_distribution(
    w: &mut dyn Write,
    agg: &RunAggregator,
    cfg: &ReportConfig,
) -> Result<()> {
    let mut range = RangeConfig::new(cfg.qscore_bin);
    range.normalized = cfg.normalized;
    let dist = agg.value_distribution(ValueField::MeanQscore, &range)?;
    write_distribution(w, ">>Mean qscore distribution", &dist)
}

fn write_distribution(w: &mut dyn Write, title: &str, dist: &Distribution) -> Result<()> {
    writeln!(w, "{}", title)?;
    match &dist.frequencies {
        Some(_) => writeln!(w, "#Bin start\tBin end\tCount\tFrequency")?,
        None => writeln!(w, "#Bin start\tBin end\tCount")?,
    }
    for (i, &count) in dist.counts.iter().enumerate() {
        match &dist.frequencies {
            Some(freqs) => writeln!(
                w,
                "{}\t{}\t{}\t{:.6}",
                dist.edges[i],
                dist.edges[i + 1],
                count,
                freqs[i]
            )?,
            None => writeln!(w, "{}\t{}\t{}", dist.edges[i], dist.edges[i + 1], count)?,
        }
    }
    writeln!(w, ">>END_MODULE")?;
    Ok(())
}
