//! `labtrack-ai`
//!
//! **Responsibility:** expiry prediction boundary.
//!
//! This crate is intentionally **not** part of the inventory model:
//! - It must not depend on inventory rows; callers hand it a `PredictionInput`.
//! - It performs no IO. The generative-API transport lives in infra; this crate
//!   only renders the prompt and scrapes the reply.
//! - Predictions are produced on demand and never stored.

pub mod error;
pub mod heuristic;
pub mod prediction;
pub mod prompt;

pub use error::AiError;
pub use heuristic::{HeuristicBreakdown, predict_expiry, risk_score};
pub use prediction::{EnvironmentalFactors, ItemPrediction, PredictionInput, RiskLevel};
pub use prompt::{candidate_text, parse_prediction_reply, render_prompt};
