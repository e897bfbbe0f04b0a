use crate::core::engine::RunTable;
use crate::core::errors::QcError;
use crate::core::model::{BinMode, ValueField};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeConfig {
    pub bin_width: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mode: BinMode,
    pub normalized: bool,
}

impl RangeConfig {
    pub fn new(bin_width: f64) -> Self {
        Self {
            bin_width,
            min: None,
            max: None,
            mode: BinMode::Linear,
            normalized: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    /// Ordered bin edges; bin `i` covers `[edges[i], edges[i + 1])`.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub frequencies: Option<Vec<f64>>,
}

impl Distribution {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Histogram of a record field. Bounds default to 0 and the data
/// maximum; values outside `[min, max)` are excluded entirely, never
/// clipped into the boundary bins.
pub fn value_distribution(
    table: &RunTable,
    field: ValueField,
    cfg: &RangeConfig,
) -> Result<Distribution, QcError> {
    if !cfg.bin_width.is_finite() || cfg.bin_width <= 0.0 {
        return Err(QcError::InvalidRange(format!(
            "bin width must be positive, got {}",
            cfg.bin_width
        )));
    }

    let values: Vec<f64> = table.records().iter().map(|r| field.value(r)).collect();
    let min = cfg.min.unwrap_or(0.0);
    let max = match cfg.max {
        Some(max) => max,
        None => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    };
    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(QcError::InvalidRange(format!(
            "empty bin range [{min}, {max}) for {}",
            field.column()
        )));
    }

    let edges = match cfg.mode {
        BinMode::Linear => linear_edges(min, max, cfg.bin_width),
        BinMode::Log10 => log_edges(min, max, cfg.bin_width)?,
    };
    let bins = edges.len() - 1;

    let mut counts = vec![0u64; bins];
    let mut total = 0u64;
    for &v in &values {
        if v < min || v >= max {
            continue;
        }
        let idx = match cfg.mode {
            BinMode::Linear => {
                let i = ((v - min) / cfg.bin_width).floor() as usize;
                i.min(bins - 1)
            }
            BinMode::Log10 => {
                let i = edges.partition_point(|&e| e <= v);
                i.saturating_sub(1).min(bins - 1)
            }
        };
        counts[idx] += 1;
        total += 1;
    }

    let frequencies = if cfg.normalized {
        if total == 0 {
            Some(vec![0.0; bins])
        } else {
            Some(counts.iter().map(|&c| c as f64 / total as f64).collect())
        }
    } else {
        None
    };

    Ok(Distribution {
        edges,
        counts,
        frequencies,
    })
}

fn linear_edges(min: f64, max: f64, width: f64) -> Vec<f64> {
    let bins = ((max - min) / width).ceil() as usize;
    let bins = bins.max(1);
    (0..=bins).map(|i| min + i as f64 * width).collect()
}

// Log-spaced edges spanning whole decades, edge count driven by
// max/width.
fn log_edges(min: f64, max: f64, width: f64) -> Result<Vec<f64>, QcError> {
    if min <= 0.0 {
        return Err(QcError::InvalidRange(format!(
            "logarithmic bins require a positive minimum, got {min}"
        )));
    }
    let lo = min.log10().floor();
    let hi = max.log10().floor() + 1.0;
    let num = ((max / width) as usize).max(2);
    let step = (hi - lo) / (num - 1) as f64;
    Ok((0..num).map(|j| 10f64.powf(lo + j as f64 * step)).collect())
}
