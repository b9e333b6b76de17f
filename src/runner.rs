//! Headless simulation runs.

use crate::rules::{DemoRules, RuleParams};
use anyhow::{ensure, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use synaptome_core::{
    compute_out_degrees_with, fill_delimiters, seed_tissue, territorial_statistics, DynamicState,
    FillPolicy, StaticConfig, TissueConfig, TransitionEngine, WorkerPool,
};
use synaptome_data::{OutDegreeHistogram, TerritorialState, NUM_TERRITORIAL_STATES};

/// What to run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// TOML tissue description; the built-in default when absent.
    pub config: Option<PathBuf>,
    pub rounds: u64,
    pub threads: usize,
    pub seed: u64,
    pub rules: RuleParams,
    /// Kind whose out-degrees are analysed after the last round.
    pub histogram_kind: Option<u32>,
    pub histogram_rows: u32,
    pub histogram_cols: u32,
    pub filter: TerritorialState,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: None,
            rounds: 10,
            threads: 1,
            seed: 42,
            rules: RuleParams::default(),
            histogram_kind: None,
            histogram_rows: 4,
            histogram_cols: 4,
            filter: TerritorialState::SignalDelivery,
        }
    }
}

/// List totals of one tissue kind.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct KindStatistics {
    pub kind: u32,
    pub lists: [u64; NUM_TERRITORIAL_STATES],
}

/// Outcome of a run, printed as JSON by the binary.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub config_fingerprint: String,
    pub seed: u64,
    pub rounds: u64,
    pub threads: usize,
    pub fingerprint: String,
    pub mean_round_us: u64,
    pub statistics: Vec<KindStatistics>,
    pub histogram: Option<OutDegreeHistogram>,
}

pub fn load_config(path: Option<&PathBuf>) -> Result<TissueConfig> {
    match path {
        Some(path) => TissueConfig::load(path),
        None => Ok(TissueConfig::default()),
    }
}

/// Seeds a tissue, runs the rounds and optionally analyses one kind.
pub fn run(options: &RunOptions) -> Result<RunReport> {
    ensure!(options.threads > 0, "at least one worker thread is required");
    ensure!(
        options.histogram_rows > 0 && options.histogram_cols > 0,
        "histogram needs at least one row and one column, got {}x{}",
        options.histogram_rows,
        options.histogram_cols
    );
    let tissue = load_config(options.config.as_ref())?;
    let config_fingerprint = tissue.fingerprint();
    let config = Arc::new(StaticConfig::new(tissue).context("building tissue layout")?);
    if let Some(kind) = options.histogram_kind {
        ensure!(
            config.is_tissue_kind(kind),
            "histogram kind {kind} is not one of the {} tissue kinds",
            config.num_tissue_kinds()
        );
    }

    let mut state = DynamicState::new(Arc::clone(&config));
    seed_tissue(&mut state, options.seed);

    let pool = WorkerPool::new(options.threads).context("starting worker pool")?;
    let rules = DemoRules::new(&config, options.rules).context("configuring rules")?;
    let mut engine = TransitionEngine::with_pool(rules, pool);

    let started = Instant::now();
    engine.run_rounds(&mut state, options.rounds);
    tracing::info!(
        rounds = options.rounds,
        threads = options.threads,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rounds finished"
    );
    for (phase, total) in engine.metrics().phase_breakdown() {
        tracing::debug!(%phase, total_us = total.as_micros() as u64, "Phase time");
    }

    let statistics = (0..config.num_tissue_kinds())
        .map(|kind| KindStatistics {
            kind,
            lists: territorial_statistics(&state, kind),
        })
        .collect();

    let histogram = options.histogram_kind.map(|kind| {
        let histogram = compute_out_degrees_with(
            engine.pool(),
            &mut state,
            kind,
            options.filter,
            options.histogram_rows,
            options.histogram_cols,
        );
        fill_delimiters(&mut state, kind, FillPolicy::FromTerritorialStates);
        histogram
    });

    let fingerprint = state.fingerprint();
    tracing::info!(%fingerprint, "Final tissue fingerprint");

    Ok(RunReport {
        config_fingerprint,
        seed: options.seed,
        rounds: options.rounds,
        threads: options.threads,
        fingerprint,
        mean_round_us: engine.metrics().mean_round().as_micros() as u64,
        statistics,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> RunOptions {
        RunOptions {
            rounds: 3,
            threads: 2,
            histogram_kind: Some(1),
            histogram_rows: 2,
            histogram_cols: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_reports_histogram() {
        let report = run(&small()).unwrap();
        let histogram = report.histogram.unwrap();
        assert_eq!(histogram.total_cells(), 16 * 16 * 2);
        assert_eq!(report.statistics.len(), 2);
        let slots: u64 = report.statistics[0].lists.iter().sum();
        assert_eq!(slots, 16 * 16 * 4 * 16);
    }

    #[test]
    fn test_thread_count_does_not_change_result() {
        let one = run(&RunOptions {
            threads: 1,
            ..small()
        })
        .unwrap();
        let four = run(&RunOptions {
            threads: 4,
            ..small()
        })
        .unwrap();
        assert_eq!(one.fingerprint, four.fingerprint);
        assert_eq!(one.histogram, four.histogram);
    }

    #[test]
    fn test_unknown_histogram_kind_rejected() {
        let err = run(&RunOptions {
            histogram_kind: Some(9),
            ..small()
        })
        .unwrap_err();
        assert!(err.to_string().contains("histogram kind 9"));
    }

    #[test]
    fn test_empty_histogram_grid_rejected() {
        for (rows, cols) in [(0, 2), (2, 0)] {
            let err = run(&RunOptions {
                histogram_rows: rows,
                histogram_cols: cols,
                ..small()
            })
            .unwrap_err();
            assert!(err.to_string().contains("at least one row and one column"));
        }
    }

    #[test]
    fn test_bad_rule_params_rejected() {
        let never = RunOptions {
            rules: RuleParams {
                migration_period: 0,
                ..Default::default()
            },
            ..small()
        };
        let err = run(&never).unwrap_err();
        assert!(format!("{err:#}").contains("migration period must be positive"));

        let wiped = RunOptions {
            rules: RuleParams {
                decay_shift: 64,
                ..Default::default()
            },
            ..small()
        };
        let err = run(&wiped).unwrap_err();
        assert!(format!("{err:#}").contains("decay shift 64"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = run(&RunOptions {
            threads: 0,
            ..small()
        })
        .unwrap_err();
        assert!(err.to_string().contains("worker thread"));
    }

    #[test]
    fn test_config_loaded_from_file() {
        let name = format!("synaptome-runner-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(
            &path,
            r#"
                size_x = 5
                size_y = 3

                [[cell_kinds]]
                cells_per_column = 2
                territory_capacity = 6
            "#,
        )
        .unwrap();
        let report = run(&RunOptions {
            config: Some(path.clone()),
            histogram_kind: Some(0),
            ..small()
        })
        .unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(report.histogram.unwrap().total_cells(), 5 * 3 * 2);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let options = RunOptions {
            config: Some(PathBuf::from("/nonexistent/tissue.toml")),
            ..small()
        };
        assert!(run(&options).is_err());
    }
}
