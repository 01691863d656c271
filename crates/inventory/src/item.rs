use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use labtrack_core::{DomainError, DomainResult, ItemId};

const MISSING_REQUIRED: &str = "Missing required fields (Name, Quantity, Unit).";

/// One stock row, as held by the backing store.
///
/// The store owns identity and timestamps; everything else is written by the
/// create/update forms. `quantity_current <= quantity_original` is expected
/// but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub cas_number: Option<String>,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub location_description: Option<String>,
    pub quantity_original: f64,
    pub quantity_current: f64,
    pub quantity_unit: String,
    pub price: Option<f64>,
    pub supplier: Option<String>,
    pub catalog_number: Option<String>,
    pub storage_conditions: Option<String>,
    pub safety_data: Option<JsonValue>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Build a freshly inserted row from a validated draft.
    ///
    /// The original quantity starts equal to the current quantity.
    pub fn from_draft(id: ItemId, draft: ItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            cas_number: draft.cas_number,
            lot_number: draft.lot_number,
            expiry_date: draft.expiry_date,
            location_description: draft.location_description,
            quantity_original: draft.quantity_current,
            quantity_current: draft.quantity_current,
            quantity_unit: draft.quantity_unit,
            price: draft.price,
            supplier: draft.supplier,
            catalog_number: draft.catalog_number,
            storage_conditions: draft.storage_conditions,
            safety_data: None,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields with `draft`.
    ///
    /// `quantity_original`, `price`, `safety_data` and `created_at` are not
    /// editable through the update form and stay as they are.
    pub fn apply_update(&mut self, draft: ItemDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.quantity_current = draft.quantity_current;
        self.quantity_unit = draft.quantity_unit;
        self.location_description = draft.location_description;
        self.expiry_date = draft.expiry_date;
        self.cas_number = draft.cas_number;
        self.lot_number = draft.lot_number;
        self.supplier = draft.supplier;
        self.catalog_number = draft.catalog_number;
        self.storage_conditions = draft.storage_conditions;
        self.notes = draft.notes;
        self.updated_at = now;
    }
}

/// Create/edit form payload, as submitted by a client.
///
/// Everything is optional at this layer so that missing fields surface as a
/// validation message instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemForm {
    pub name: Option<String>,
    pub quantity_current: Option<f64>,
    pub quantity_unit: Option<String>,
    pub location_description: Option<String>,
    /// `YYYY-MM-DD`; empty means "no expiry date".
    pub expiry_date: Option<String>,
    pub cas_number: Option<String>,
    pub lot_number: Option<String>,
    pub supplier: Option<String>,
    pub catalog_number: Option<String>,
    pub storage_conditions: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}

/// A validated form: required fields present, optionals normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity_current: f64,
    pub quantity_unit: String,
    pub location_description: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub cas_number: Option<String>,
    pub lot_number: Option<String>,
    pub supplier: Option<String>,
    pub catalog_number: Option<String>,
    pub storage_conditions: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}

impl ItemForm {
    /// Check required fields and normalise optional ones.
    ///
    /// Blank optional strings become `None`, mirroring how the forms submit
    /// untouched inputs.
    pub fn validate(self) -> DomainResult<ItemDraft> {
        let name = optional_text(self.name);
        let unit = optional_text(self.quantity_unit);
        let (Some(name), Some(quantity_current), Some(quantity_unit)) =
            (name, self.quantity_current, unit)
        else {
            return Err(DomainError::validation(MISSING_REQUIRED));
        };

        if !quantity_current.is_finite() {
            return Err(DomainError::validation("Quantity must be a number"));
        }
        if quantity_current < 0.0 {
            return Err(DomainError::validation("Quantity cannot be negative"));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(DomainError::validation("Price cannot be negative"));
            }
        }

        let expiry_date = match optional_text(self.expiry_date) {
            None => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| DomainError::validation("Expiry date must be YYYY-MM-DD"))?,
            ),
        };

        Ok(ItemDraft {
            name,
            quantity_current,
            quantity_unit,
            location_description: optional_text(self.location_description),
            expiry_date,
            cas_number: optional_text(self.cas_number),
            lot_number: optional_text(self.lot_number),
            supplier: optional_text(self.supplier),
            catalog_number: optional_text(self.catalog_number),
            storage_conditions: optional_text(self.storage_conditions),
            notes: optional_text(self.notes),
            price: self.price,
        })
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ItemForm {
        ItemForm {
            name: Some("Acetone".to_string()),
            quantity_current: Some(2.5),
            quantity_unit: Some("L".to_string()),
            location_description: Some("  Flammables cabinet ".to_string()),
            expiry_date: Some("2027-03-01".to_string()),
            cas_number: Some("67-64-1".to_string()),
            lot_number: Some(String::new()),
            ..ItemForm::default()
        }
    }

    #[test]
    fn validate_normalises_optional_fields() {
        let draft = form().validate().unwrap();
        assert_eq!(draft.name, "Acetone");
        assert_eq!(draft.location_description.as_deref(), Some("Flammables cabinet"));
        assert_eq!(draft.lot_number, None);
        assert_eq!(draft.expiry_date, NaiveDate::from_ymd_opt(2027, 3, 1));
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        for broken in [
            ItemForm { name: Some("   ".into()), ..form() },
            ItemForm { quantity_current: None, ..form() },
            ItemForm { quantity_unit: None, ..form() },
        ] {
            let err = broken.validate().unwrap_err();
            assert_eq!(err, DomainError::validation(MISSING_REQUIRED));
        }
    }

    #[test]
    fn validate_rejects_negative_quantity_and_bad_dates() {
        let err = ItemForm { quantity_current: Some(-1.0), ..form() }
            .validate()
            .unwrap_err();
        assert_eq!(err, DomainError::validation("Quantity cannot be negative"));

        let err = ItemForm { expiry_date: Some("01/03/2027".into()), ..form() }
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_quantity_is_allowed() {
        let draft = ItemForm { quantity_current: Some(0.0), ..form() }
            .validate()
            .unwrap();
        assert_eq!(draft.quantity_current, 0.0);
    }

    #[test]
    fn update_keeps_original_quantity_and_price() {
        let now = Utc::now();
        let mut draft = form().validate().unwrap();
        draft.price = Some(12.0);
        let mut item = InventoryItem::from_draft(ItemId::new(), draft, now);
        assert_eq!(item.quantity_original, 2.5);

        let mut edit = form().validate().unwrap();
        edit.quantity_current = 1.0;
        edit.price = Some(99.0);
        edit.notes = Some("half used".into());
        let later = now + chrono::Duration::minutes(5);
        item.apply_update(edit, later);

        assert_eq!(item.quantity_original, 2.5);
        assert_eq!(item.quantity_current, 1.0);
        assert_eq!(item.price, Some(12.0));
        assert_eq!(item.notes.as_deref(), Some("half used"));
        assert_eq!(item.created_at, now);
        assert_eq!(item.updated_at, later);
    }
}
