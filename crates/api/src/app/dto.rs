use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use labtrack_ai::{EnvironmentalFactors, ItemPrediction, PredictionInput};
use labtrack_inventory::{
    ExpiryBadge, ExpiryFilter, InventoryItem, ItemFilter, ItemSort, SortKey, SortOrder,
    days_until_expiry,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Query string shared by the listing view, `GET /api/items` and exports.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub expiry: Option<String>,
    pub location: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    pub fn parse(&self) -> Result<(ItemFilter, ItemSort), axum::response::Response> {
        let expiry = self
            .expiry
            .as_deref()
            .unwrap_or_default()
            .parse::<ExpiryFilter>()
            .map_err(errors::domain_error_to_response)?;
        let key = self
            .sort
            .as_deref()
            .unwrap_or_default()
            .parse::<SortKey>()
            .map_err(errors::domain_error_to_response)?;
        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<SortOrder>()
                    .map_err(errors::domain_error_to_response)?,
            ),
        };

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != "all")
            .map(str::to_string);

        let filter = ItemFilter {
            search: self.search.as_deref().unwrap_or_default().trim().to_string(),
            expiry,
            location,
        };
        Ok((filter, ItemSort::new(key, order)))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub access_token: Option<String>,
    pub next: Option<String>,
}

/// Unwrap a JSON body, answering malformed input in the API's error shape.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    body.map(|Json(value)| value)
        .map_err(|rejection| errors::json_error(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text()))
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &InventoryItem, now: DateTime<Utc>) -> serde_json::Value {
    let badge = ExpiryBadge::classify(item.expiry_date, now);
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "cas_number": item.cas_number,
        "lot_number": item.lot_number,
        "expiry_date": item.expiry_date,
        "location_description": item.location_description,
        "quantity_original": item.quantity_original,
        "quantity_current": item.quantity_current,
        "quantity_unit": item.quantity_unit,
        "price": item.price,
        "supplier": item.supplier,
        "catalog_number": item.catalog_number,
        "storage_conditions": item.storage_conditions,
        "safety_data": item.safety_data,
        "notes": item.notes,
        "created_at": item.created_at.to_rfc3339(),
        "updated_at": item.updated_at.to_rfc3339(),
        "expiry_badge": {
            "status": badge,
            "color": badge.color(),
        },
        "days_until_expiry": item.expiry_date.map(|d| days_until_expiry(d, now)),
    })
}

pub fn items_to_json(items: &[InventoryItem], now: DateTime<Utc>) -> Vec<serde_json::Value> {
    items.iter().map(|item| item_to_json(item, now)).collect()
}

pub fn prediction_to_json(prediction: &ItemPrediction) -> serde_json::Value {
    serde_json::json!({
        "id": prediction.id.to_string(),
        "name": prediction.name,
        "predicted_expiry": prediction.predicted_expiry,
        "confidence_score": prediction.confidence_score,
        "risk_level": prediction.risk_level.as_str(),
        "factors": prediction.factors,
    })
}

/// Prediction request prefilled from a stored row (used by the detail view).
pub fn prediction_input(item: &InventoryItem) -> PredictionInput {
    PredictionInput {
        name: item.name.clone(),
        cas_number: item.cas_number.clone(),
        manufacture_date: None,
        original_expiry_date: item.expiry_date,
        storage_conditions: item.storage_conditions.clone(),
        quantity_original: item.quantity_original,
        quantity_current: item.quantity_current,
        factors: EnvironmentalFactors::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_the_default_view() {
        let (filter, sort) = ListQuery::default().parse().unwrap();
        assert_eq!(filter, ItemFilter::default());
        assert_eq!(sort, ItemSort::default());
    }

    #[test]
    fn location_all_means_no_location_filter() {
        let query = ListQuery {
            location: Some("all".to_string()),
            expiry: Some("expiring-soon".to_string()),
            sort: Some("name".to_string()),
            ..ListQuery::default()
        };
        let (filter, sort) = query.parse().unwrap();
        assert_eq!(filter.location, None);
        assert_eq!(filter.expiry, ExpiryFilter::ExpiringSoon);
        assert_eq!(sort, ItemSort::new(SortKey::Name, Some(SortOrder::Asc)));
    }

    #[test]
    fn unknown_filters_are_rejected() {
        let query = ListQuery {
            expiry: Some("soonish".to_string()),
            ..ListQuery::default()
        };
        let response = query.parse().unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
