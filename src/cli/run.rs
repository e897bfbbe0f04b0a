use crate::cli::args::{Cli, Commands, RunArgs};
use crate::core::engine::RunAggregator;
use crate::report;
use crate::report::data_txt::ReportConfig;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::fs;
use std::time::{Duration, Instant};

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    stage(stats, "preflight", || {
        if args.summary.as_os_str() == "-" {
            bail!("stdin is not supported; provide a summary file path");
        }
        if !args.summary.is_file() {
            bail!("input file not found: {}", args.summary.display());
        }
        Ok(())
    })?;

    let input_size = fs::metadata(&args.summary).map(|m| m.len()).unwrap_or(0);

    let sample_name = match args.sample_name {
        Some(s) => s,
        None => args
            .summary
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(".txt").to_string())
            .context("failed to determine sample name from input file")?,
    };

    let t_out = Instant::now();
    let out_dir = args.out.join(format!("{}_poreqc", sample_name));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;
    stage_done(stats, "mkdir", t_out);

    let t_engine = Instant::now();
    let agg = RunAggregator::from_file(&args.summary, args.run_id.as_deref(), args.verbose)
        .with_context(|| format!("failed to load {}", args.summary.display()))?;
    stage_done(stats, "engine", t_engine);
    if stats {
        eprintln!(
            "POREQC_STATS input={} bytes={} run_id={} reads={}",
            args.summary.display(),
            input_size,
            agg.run_id(),
            agg.total_reads()
        );
    }

    let report_cfg = ReportConfig {
        time_window_hours: args.time_window,
        length_bin: args.length_bin,
        qscore_bin: args.qscore_bin,
        length_log: args.length_log,
        normalized: args.normalized,
    };

    let summary_path = out_dir.join("summary.txt");
    let data_path = out_dir.join("qc_data.txt");

    let t_summary = Instant::now();
    report::summary_txt::write(&summary_path, &agg)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    stage_done(stats, "summary", t_summary);

    let t_data = Instant::now();
    report::data_txt::write(&data_path, &agg, &report_cfg)
        .with_context(|| format!("failed to write {}", data_path.display()))?;
    stage_done(stats, "qc_data", t_data);
    if stats {
        let data_size = fs::metadata(&data_path).map(|m| m.len()).unwrap_or(0);
        eprintln!(
            "POREQC_STATS output qc_data={} bytes={}",
            data_path.display(),
            data_size
        );
    }

    if stats {
        eprintln!("POREQC_STATS output_dir={}", out_dir.display());
        eprintln!("POREQC_STATS total={}", fmt_dur(t0.elapsed()));
    }

    Ok(())
}

fn stats_enabled() -> bool {
    matches!(env::var("POREQC_STATS").as_deref(), Ok("1"))
}

fn stage<F>(stats: bool, name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    if stats {
        eprintln!("POREQC_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
    res
}

fn stage_done(stats: bool, name: &str, t: Instant) {
    if stats {
        eprintln!("POREQC_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
