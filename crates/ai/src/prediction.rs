use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use labtrack_core::PredictionId;

use crate::error::AiError;

/// Optional environmental readings that raise the heuristic risk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalFactors {
    /// Degrees Celsius.
    pub temperature_exposure: Option<f64>,
    /// Relative humidity, percent.
    pub humidity_exposure: Option<f64>,
    /// Light exposure index, 0-100.
    pub light_exposure: Option<f64>,
    pub container_type: Option<String>,
    pub initial_quality: Option<f64>,
}

/// Fields of one item that feed a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cas_number: Option<String>,
    #[serde(default)]
    pub manufacture_date: Option<NaiveDate>,
    #[serde(default)]
    pub original_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub storage_conditions: Option<String>,
    #[serde(default)]
    pub quantity_original: f64,
    #[serde(default)]
    pub quantity_current: f64,
    #[serde(default)]
    pub factors: EnvironmentalFactors,
}

impl PredictionInput {
    /// A prediction needs at least a name and the labelled expiry date.
    pub fn validate(&self) -> Result<(), AiError> {
        if self.name.trim().is_empty() || self.original_expiry_date.is_none() {
            return Err(AiError::InvalidInput(
                "Missing required fields for prediction".to_string(),
            ));
        }
        Ok(())
    }

    /// Fraction of the original quantity already consumed, clamped to [0, 1].
    ///
    /// 0 when the original quantity is not a positive number.
    pub fn usage_ratio(&self) -> f64 {
        let (original, current) = (self.quantity_original, self.quantity_current);
        if !(original.is_finite() && original > 0.0) || !current.is_finite() {
            return 0.0;
        }
        ((original - current) / original).clamp(0.0, 1.0)
    }

    pub(crate) fn storage_lower(&self) -> String {
        self.storage_conditions
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a score in [0, 1]: below 0.3 low, below 0.7 medium, else high.
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            RiskLevel::Low
        } else if score < 0.7 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(AiError::invalid_response(format!(
                "risk_level must be low, medium or high (got '{other}')"
            ))),
        }
    }
}

/// Revised expiry estimate for one item. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPrediction {
    pub id: PredictionId,
    pub name: String,
    pub predicted_expiry: Option<NaiveDate>,
    /// In [0, 1].
    pub confidence_score: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_deserializes_with_missing_optionals() {
        let input: PredictionInput = serde_json::from_str(
            r#"{"name":"Acetone","original_expiry_date":"2027-01-31","quantity_original":5,"quantity_current":2}"#,
        )
        .unwrap();
        assert_eq!(input.original_expiry_date, NaiveDate::from_ymd_opt(2027, 1, 31));
        assert_eq!(input.factors, EnvironmentalFactors::default());
        assert!(input.validate().is_ok());
        assert!((input.usage_ratio() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn validate_requires_name_and_expiry() {
        let input: PredictionInput =
            serde_json::from_str(r#"{"name":"Acetone","original_expiry_date":null}"#).unwrap();
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields for prediction");
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::High);
        assert_eq!(" High ".parse::<RiskLevel>().unwrap(), RiskLevel::High);
    }
}
