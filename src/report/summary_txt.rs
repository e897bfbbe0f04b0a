use crate::core::engine::RunAggregator;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write(path: &Path, agg: &RunAggregator) -> Result<()> {
    let ov = agg.overview();
    let mut w = BufWriter::new(File::create(path).with_context(|| "create summary.txt failed")?);

    writeln!(w, "Run id\t{}", agg.run_id())?;
    writeln!(w, "Total reads\t{}", ov.total_reads)?;
    writeln!(w, "Total bases\t{}", ov.total_bases)?;
    writeln!(w, "Mean read length\t{:.1}", ov.mean_length)?;
    writeln!(w, "Median read length\t{:.1}", ov.median_length)?;
    writeln!(w, "Read length N50\t{}", ov.n50)?;
    writeln!(w, "Mean qscore\t{:.2}", ov.mean_qscore)?;
    writeln!(w, "Median qscore\t{:.2}", ov.median_qscore)?;
    writeln!(w, "Active channels\t{}", ov.active_channels)?;
    if let Some(hours) = ov.run_hours {
        writeln!(w, "Run duration (h)\t{:.2}", hours)?;
    }

    Ok(())
}
