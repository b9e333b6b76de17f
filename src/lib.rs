//! # Synaptome
//!
//! Headless driver for the tissue engine in `synaptome_core`: demonstration
//! transition rules and a seeded run loop that reports fingerprints, list
//! statistics and out-degree histograms.

/// Demonstration transition rules
pub mod rules;
/// Seeded headless runs
pub mod runner;

pub use rules::{DemoRules, RuleParams};
pub use runner::{run, KindStatistics, RunOptions, RunReport};
pub use synaptome_core::{
    compute_out_degrees, fill_delimiters, seed_tissue, territorial_statistics, DynamicState,
    FillPolicy, StaticConfig, TissueConfig, TransitionEngine, TransitionFunctions,
};
pub use synaptome_data::{OutDegreeHistogram, TerritorialState, TissueCoordinates};
