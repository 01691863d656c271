//! Rule-based expiry risk.
//!
//! Deterministic and offline: used when no generative backend is configured,
//! and as the reference the external backend is compared against in tests.

use chrono::Duration;
use labtrack_core::PredictionId;

use crate::error::AiError;
use crate::prediction::{ItemPrediction, PredictionInput, RiskLevel};

const REFRIGERATE_WEIGHT: f64 = 0.3;
const SENSITIVE_WEIGHT: f64 = 0.2;
const USAGE_WEIGHT: f64 = 0.2;
const TEMPERATURE_WEIGHT: f64 = 0.15;
const HUMIDITY_WEIGHT: f64 = 0.15;
const LIGHT_WEIGHT: f64 = 0.1;

const TEMPERATURE_LIMIT_C: f64 = 25.0;
const HUMIDITY_LIMIT_PCT: f64 = 60.0;
const LIGHT_LIMIT: f64 = 70.0;

/// Largest shift applied to the labelled expiry date, in days.
const MAX_SHIFT_DAYS: f64 = 30.0;

/// Floor of the reported confidence.
const MIN_CONFIDENCE: f64 = 0.5;

/// Score plus the reasons that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicBreakdown {
    /// In [0, 1].
    pub score: f64,
    pub factors: Vec<String>,
}

/// Additive risk score, clamped to [0, 1].
pub fn risk_score(input: &PredictionInput) -> HeuristicBreakdown {
    let mut score = 0.0;
    let mut factors = Vec::new();

    let storage = input.storage_lower();
    if storage.contains("refrigerate") {
        score += REFRIGERATE_WEIGHT;
        factors.push("Temperature-sensitive storage required".to_string());
    }
    if storage.contains("sensitive") {
        score += SENSITIVE_WEIGHT;
        factors.push("Sensitive to storage environment".to_string());
    }

    let usage = input.usage_ratio();
    if usage > 0.0 {
        score += usage * USAGE_WEIGHT;
        factors.push(format!("Container {:.0}% used", usage * 100.0));
    }

    let env = &input.factors;
    if above(env.temperature_exposure, TEMPERATURE_LIMIT_C) {
        score += TEMPERATURE_WEIGHT;
        factors.push("High temperature exposure".to_string());
    }
    if above(env.humidity_exposure, HUMIDITY_LIMIT_PCT) {
        score += HUMIDITY_WEIGHT;
        factors.push("High humidity exposure".to_string());
    }
    if above(env.light_exposure, LIGHT_LIMIT) {
        score += LIGHT_WEIGHT;
        factors.push("High light exposure".to_string());
    }

    HeuristicBreakdown {
        score: score.clamp(0.0, 1.0),
        factors,
    }
}

fn above(reading: Option<f64>, limit: f64) -> bool {
    matches!(reading, Some(v) if v > limit)
}

/// Heuristic prediction for `input`.
///
/// The predicted date moves earlier by up to 30 days as the score rises.
/// Without a labelled expiry date there is nothing to shift and
/// `predicted_expiry` stays empty. A shift past the earliest representable
/// date is an input error.
pub fn predict_expiry(input: &PredictionInput) -> Result<ItemPrediction, AiError> {
    let HeuristicBreakdown { score, factors } = risk_score(input);
    let shift = Duration::days((score * MAX_SHIFT_DAYS).floor() as i64);

    let predicted_expiry = match input.original_expiry_date {
        Some(date) => Some(date.checked_sub_signed(shift).ok_or_else(|| {
            AiError::InvalidInput("original_expiry_date out of range".to_string())
        })?),
        None => None,
    };

    Ok(ItemPrediction {
        id: PredictionId::new(),
        name: input.name.clone(),
        predicted_expiry,
        confidence_score: (1.0 - score).max(MIN_CONFIDENCE),
        risk_level: RiskLevel::from_score(score),
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use proptest::prelude::*;

    use crate::prediction::EnvironmentalFactors;

    fn input() -> PredictionInput {
        PredictionInput {
            name: "Trypsin".to_string(),
            cas_number: Some("9002-07-7".to_string()),
            manufacture_date: None,
            original_expiry_date: NaiveDate::from_ymd_opt(2027, 3, 31),
            storage_conditions: Some("Refrigerate at 4C".to_string()),
            quantity_original: 100.0,
            quantity_current: 40.0,
            factors: EnvironmentalFactors::default(),
        }
    }

    #[test]
    fn refrigerated_and_partly_used_is_medium_risk() {
        let prediction = predict_expiry(&input()).unwrap();

        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert!((prediction.confidence_score - 0.58).abs() < 1e-9);
        // floor(30 * 0.42) = 12 days earlier
        assert_eq!(prediction.predicted_expiry, NaiveDate::from_ymd_opt(2027, 3, 19));
        assert_eq!(prediction.name, "Trypsin");
        assert!(
            prediction
                .factors
                .contains(&"Temperature-sensitive storage required".to_string())
        );
    }

    #[test]
    fn untouched_room_temperature_stock_is_low_risk() {
        let mut i = input();
        i.storage_conditions = Some("Store at room temperature".to_string());
        i.quantity_current = i.quantity_original;

        let prediction = predict_expiry(&i).unwrap();
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.confidence_score, 1.0);
        assert_eq!(prediction.predicted_expiry, i.original_expiry_date);
        assert!(prediction.factors.is_empty());
    }

    #[test]
    fn every_contributor_is_reported_and_score_caps_at_one() {
        let mut i = input();
        i.storage_conditions = Some("Refrigerate; light sensitive".to_string());
        i.quantity_current = 0.0;
        i.factors = EnvironmentalFactors {
            temperature_exposure: Some(30.0),
            humidity_exposure: Some(80.0),
            light_exposure: Some(90.0),
            ..EnvironmentalFactors::default()
        };

        let breakdown = risk_score(&i);
        assert_eq!(breakdown.score, 1.0);
        assert_eq!(breakdown.factors.len(), 6);
        assert!(breakdown.factors.contains(&"High humidity exposure".to_string()));
        assert!(breakdown.factors.contains(&"High light exposure".to_string()));

        let prediction = predict_expiry(&i).unwrap();
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert_eq!(prediction.confidence_score, MIN_CONFIDENCE);
        assert_eq!(prediction.predicted_expiry, NaiveDate::from_ymd_opt(2027, 3, 1));
    }

    #[test]
    fn thresholds_are_strict() {
        let mut i = input();
        i.storage_conditions = None;
        i.quantity_current = i.quantity_original;
        i.factors.temperature_exposure = Some(25.0);
        i.factors.humidity_exposure = Some(60.0);
        i.factors.light_exposure = Some(70.0);
        assert_eq!(risk_score(&i).score, 0.0);
    }

    #[test]
    fn zero_original_quantity_contributes_nothing() {
        let mut i = input();
        i.storage_conditions = None;
        i.quantity_original = 0.0;
        i.quantity_current = 5.0;
        assert_eq!(risk_score(&i).score, 0.0);
    }

    #[test]
    fn missing_expiry_leaves_prediction_empty() {
        let mut i = input();
        i.original_expiry_date = None;
        assert_eq!(predict_expiry(&i).unwrap().predicted_expiry, None);
    }

    #[test]
    fn shifting_before_the_earliest_date_is_rejected() {
        let mut i = input();
        i.original_expiry_date = Some(NaiveDate::MIN);

        let err = predict_expiry(&i).unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(ref msg) if msg == "original_expiry_date out of range"));

        // No shift, no overflow.
        i.storage_conditions = None;
        i.quantity_current = i.quantity_original;
        assert_eq!(predict_expiry(&i).unwrap().predicted_expiry, Some(NaiveDate::MIN));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: score, confidence and date shift stay in range for any input.
        #[test]
        fn outputs_stay_in_range(
            original in -50.0f64..500.0,
            current in -50.0f64..500.0,
            temp in prop::option::of(-20.0f64..60.0),
            humidity in prop::option::of(0.0f64..100.0),
            light in prop::option::of(0.0f64..100.0),
            refrigerate in any::<bool>(),
            sensitive in any::<bool>(),
        ) {
            let mut storage = String::new();
            if refrigerate { storage.push_str("refrigerate "); }
            if sensitive { storage.push_str("air sensitive"); }

            let i = PredictionInput {
                storage_conditions: Some(storage),
                quantity_original: original,
                quantity_current: current,
                factors: EnvironmentalFactors {
                    temperature_exposure: temp,
                    humidity_exposure: humidity,
                    light_exposure: light,
                    ..EnvironmentalFactors::default()
                },
                ..input()
            };

            let p = predict_expiry(&i).unwrap();
            let score = risk_score(&i).score;
            prop_assert!((0.0..=1.0).contains(&score));
            prop_assert!((MIN_CONFIDENCE..=1.0).contains(&p.confidence_score));
            prop_assert_eq!(p.risk_level, RiskLevel::from_score(score));

            let original_date = i.original_expiry_date.unwrap();
            let predicted = p.predicted_expiry.unwrap();
            let shift = (original_date - predicted).num_days();
            prop_assert!((0..=30).contains(&shift));
        }

        /// Property: consuming more stock never lowers the score.
        #[test]
        fn more_usage_never_lowers_risk(
            original in 1.0f64..1000.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let (less, more) = if a <= b { (a, b) } else { (b, a) };
            let at = |used: f64| {
                risk_score(&PredictionInput {
                    quantity_original: original,
                    quantity_current: original * (1.0 - used),
                    ..input()
                })
                .score
            };
            prop_assert!(at(less) <= at(more) + 1e-12);
        }

        /// Property: a higher temperature, humidity or light reading never lowers the score.
        #[test]
        fn harsher_environment_never_lowers_risk(
            which in 0usize..3,
            low in prop::option::of(0.0f64..100.0),
            raise in 0.0f64..100.0,
            temp in prop::option::of(0.0f64..100.0),
            humidity in prop::option::of(0.0f64..100.0),
            light in prop::option::of(0.0f64..100.0),
        ) {
            let high = low.unwrap_or(0.0) + raise;
            let at = |reading: Option<f64>| {
                let mut factors = EnvironmentalFactors {
                    temperature_exposure: temp,
                    humidity_exposure: humidity,
                    light_exposure: light,
                    ..EnvironmentalFactors::default()
                };
                match which {
                    0 => factors.temperature_exposure = reading,
                    1 => factors.humidity_exposure = reading,
                    _ => factors.light_exposure = reading,
                }
                risk_score(&PredictionInput { factors, ..input() }).score
            };
            prop_assert!(at(low) <= at(Some(high)) + 1e-12);
        }
    }
}
