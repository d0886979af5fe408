//! Per-user emotional baselines.
//!
//! Builds a statistical baseline from historical emotion-analysis samples,
//! folds new samples into it with recency weighting, and normalizes fresh
//! analysis results relative to the user's own typical expression.

pub mod config;
pub mod error;
pub mod estimator;
pub mod factors;
pub mod import;
pub mod models;
pub mod report;
pub mod sentiment;
pub mod store;

pub use config::{AppConfig, EstimatorConfig};
pub use error::{BaselineError, Result};
pub use estimator::BaselineEstimator;
pub use models::{
    AdjustmentFactors, BaselinePersonalizationParams, EmotionAnalysis, EmotionBaselineEntry,
    EmotionScore, EmotionalBaseline, EnvironmentalContext, TypicalEmotionalState,
};
pub use store::BaselineStore;
