//! Prompt rendering and reply scraping for the generative backend.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use labtrack_core::PredictionId;

use crate::error::AiError;
use crate::prediction::{ItemPrediction, PredictionInput, RiskLevel};

const NOT_AVAILABLE: &str = "N/A";

/// Natural-language prompt describing one item.
pub fn render_prompt(input: &PredictionInput) -> String {
    let original_expiry = input
        .original_expiry_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "Analyze the following chemical inventory item and predict its realistic expiry risk.\n\
         Consider the provided data points and general chemical stability knowledge.\n\
         \n\
         Item Name: {name}\n\
         CAS Number: {cas}\n\
         Original Expiry Date: {original_expiry}\n\
         Storage Conditions: {storage}\n\
         Original Quantity: {original}\n\
         Current Quantity: {current}\n\
         \n\
         Based on this, provide:\n\
         1. A predicted_expiry date in YYYY-MM-DD format (can be the same as original if no factors suggest otherwise).\n\
         2. A risk_level ('low', 'medium', 'high') based on proximity to expiry and potential degradation.\n\
         3. A confidence_score (0.0 to 1.0) reflecting the certainty of the prediction.\n\
         4. A list of contributing factors (strings) that influenced the prediction (e.g., 'approaching expiry', 'sensitive storage').\n",
        name = input.name,
        cas = or_na(input.cas_number.as_deref()),
        storage = or_na(input.storage_conditions.as_deref()),
        original = input.quantity_original,
        current = input.quantity_current,
    )
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// `candidates[0].content.parts[0].text` of a generateContent response.
pub fn candidate_text(response: &Value) -> Result<&str, AiError> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AiError::invalid_response("no candidate text in response"))
}

/// Turn the model's text reply into a prediction for `input`.
///
/// The reply may be bare JSON, JSON inside a fenced code block, or JSON
/// surrounded by prose. A top-level array contributes its first element.
pub fn parse_prediction_reply(
    reply: &str,
    input: &PredictionInput,
) -> Result<ItemPrediction, AiError> {
    let value = scrape_json(reply)
        .ok_or_else(|| AiError::invalid_response("reply does not contain JSON"))?;

    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => map,
            _ => return Err(AiError::invalid_response("reply array holds no object")),
        },
        _ => return Err(AiError::invalid_response("reply is not an object or array")),
    };

    Ok(ItemPrediction {
        id: PredictionId::new(),
        name: input.name.clone(),
        predicted_expiry: Some(predicted_expiry(&object)?),
        confidence_score: confidence_score(&object)?,
        risk_level: risk_level(&object)?,
        factors: factors(&object)?,
    })
}

fn scrape_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    if let Some(inner) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(inner) {
            return Some(value);
        }
    }
    let start = trimmed.find(['{', '['])?;
    let end = trimmed.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Body of the first ``` fence, with an optional language tag stripped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &rest[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn predicted_expiry(object: &Map<String, Value>) -> Result<NaiveDate, AiError> {
    let raw = object
        .get("predicted_expiry")
        .and_then(Value::as_str)
        .ok_or_else(|| AiError::invalid_response("missing predicted_expiry"))?;
    // Some replies carry a full timestamp; the date part is what matters.
    let date_part = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| AiError::invalid_response(format!("predicted_expiry is not a date: '{raw}'")))
}

fn risk_level(object: &Map<String, Value>) -> Result<RiskLevel, AiError> {
    object
        .get("risk_level")
        .and_then(Value::as_str)
        .ok_or_else(|| AiError::invalid_response("missing risk_level"))?
        .parse()
}

fn confidence_score(object: &Map<String, Value>) -> Result<f64, AiError> {
    let score = match object.get("confidence_score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .ok_or_else(|| AiError::invalid_response("missing confidence_score"))?;
    Ok(score.clamp(0.0, 1.0))
}

fn factors(object: &Map<String, Value>) -> Result<Vec<String>, AiError> {
    let list = object
        .get("factors")
        .filter(|v| !v.is_null())
        .or_else(|| object.get("contributing_factors"))
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::invalid_response("missing factors list"))?;

    list.iter()
        .map(|f| {
            f.as_str()
                .map(str::to_string)
                .ok_or_else(|| AiError::invalid_response("factors must be strings"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::prediction::EnvironmentalFactors;
    use serde_json::json;

    fn input() -> PredictionInput {
        PredictionInput {
            name: "Sodium azide".to_string(),
            cas_number: None,
            manufacture_date: None,
            original_expiry_date: NaiveDate::from_ymd_opt(2027, 5, 1),
            storage_conditions: Some("Cool, dry place".to_string()),
            quantity_original: 500.0,
            quantity_current: 120.0,
            factors: EnvironmentalFactors::default(),
        }
    }

    #[test]
    fn prompt_lists_item_fields_and_fills_gaps() {
        let prompt = render_prompt(&input());
        assert!(prompt.contains("Item Name: Sodium azide"));
        assert!(prompt.contains("CAS Number: N/A"));
        assert!(prompt.contains("Original Expiry Date: 2027-05-01"));
        assert!(prompt.contains("Storage Conditions: Cool, dry place"));
        assert!(prompt.contains("Original Quantity: 500"));
        assert!(prompt.contains("Current Quantity: 120"));
        assert!(prompt.contains("confidence_score"));
    }

    #[test]
    fn parses_bare_object() {
        let reply = r#"{"predicted_expiry":"2027-04-01","risk_level":"medium","confidence_score":0.7,"factors":["partially used"]}"#;
        let p = parse_prediction_reply(reply, &input()).unwrap();
        assert_eq!(p.name, "Sodium azide");
        assert_eq!(p.predicted_expiry, NaiveDate::from_ymd_opt(2027, 4, 1));
        assert_eq!(p.risk_level, RiskLevel::Medium);
        assert_eq!(p.confidence_score, 0.7);
        assert_eq!(p.factors, vec!["partially used".to_string()]);
    }

    #[test]
    fn takes_first_array_element_and_contributing_factors() {
        let reply = json!([
            {"predicted_expiry":"2027-03-15","risk_level":"HIGH","confidence_score":1.4,"contributing_factors":["toxic","opened"]},
            {"predicted_expiry":"2020-01-01","risk_level":"low","confidence_score":0.1,"factors":[]}
        ])
        .to_string();
        let p = parse_prediction_reply(&reply, &input()).unwrap();
        assert_eq!(p.risk_level, RiskLevel::High);
        assert_eq!(p.confidence_score, 1.0);
        assert_eq!(p.factors.len(), 2);
    }

    #[test]
    fn null_factors_fall_back_to_contributing_factors() {
        let reply = json!({
            "predicted_expiry": "2027-01-10",
            "risk_level": "medium",
            "confidence_score": 0.6,
            "factors": null,
            "contributing_factors": ["hygroscopic"]
        })
        .to_string();
        let p = parse_prediction_reply(&reply, &input()).unwrap();
        assert_eq!(p.factors, vec!["hygroscopic".to_string()]);
    }

    #[test]
    fn scrapes_fenced_and_embedded_json() {
        let fenced = "Here you go:\n```json\n{\"predicted_expiry\":\"2027-04-20\",\"risk_level\":\"low\",\"confidence_score\":0.9,\"factors\":[]}\n```\n";
        let p = parse_prediction_reply(fenced, &input()).unwrap();
        assert_eq!(p.predicted_expiry, NaiveDate::from_ymd_opt(2027, 4, 20));

        let embedded = "Prediction: {\"predicted_expiry\":\"2027-04-21\",\"risk_level\":\"low\",\"confidence_score\":\"0.8\",\"factors\":[\"stable\"]} Thanks.";
        let p = parse_prediction_reply(embedded, &input()).unwrap();
        assert_eq!(p.confidence_score, 0.8);
        assert_eq!(p.factors, vec!["stable".to_string()]);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let cases = [
            r#"{"risk_level":"low","confidence_score":0.9,"factors":[]}"#,
            r#"{"predicted_expiry":"2027-04-01","confidence_score":0.9,"factors":[]}"#,
            r#"{"predicted_expiry":"2027-04-01","risk_level":"low","factors":[]}"#,
            r#"{"predicted_expiry":"2027-04-01","risk_level":"low","confidence_score":0.9}"#,
            r#"{"predicted_expiry":"2027-04-01","risk_level":"severe","confidence_score":0.9,"factors":[]}"#,
            r#"{"predicted_expiry":"soon","risk_level":"low","confidence_score":0.9,"factors":[]}"#,
            "no json here",
            "[]",
        ];
        for reply in cases {
            let err = parse_prediction_reply(reply, &input()).unwrap_err();
            assert!(matches!(err, AiError::InvalidResponse(_)), "{reply}: {err}");
        }
    }

    #[test]
    fn candidate_text_follows_the_response_shape() {
        let response = json!({"candidates":[{"content":{"parts":[{"text":"{}"}]}}]});
        assert_eq!(candidate_text(&response).unwrap(), "{}");
        assert!(candidate_text(&json!({"candidates":[]})).is_err());
    }
}
