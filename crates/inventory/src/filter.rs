//! In-memory derivation of the listing view.
//!
//! Nothing here is indexed or persisted: the listing recomputes the visible
//! subset from the full row set on every request.

use core::cmp::Ordering;
use core::str::FromStr;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use labtrack_core::DomainError;

use crate::expiry::ExpiryFilter;
use crate::item::InventoryItem;

/// Search + expiry + location filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Case-insensitive substring of name, CAS number or lot number.
    pub search: String,
    pub expiry: ExpiryFilter,
    /// Exact location match when set.
    pub location: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, item: &InventoryItem, now: DateTime<Utc>) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let hit = contains_ci(Some(&item.name), &needle)
                || contains_ci(item.cas_number.as_ref(), &needle)
                || contains_ci(item.lot_number.as_ref(), &needle);
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if item.location_description.as_ref() != Some(location) {
                return false;
            }
        }

        self.expiry.matches(item.expiry_date, now)
    }

    /// Rows passing the filter, in input order.
    pub fn apply(&self, items: &[InventoryItem], now: DateTime<Utc>) -> Vec<InventoryItem> {
        items
            .iter()
            .filter(|item| self.matches(item, now))
            .cloned()
            .collect()
    }
}

fn contains_ci(haystack: Option<&String>, needle_lower: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

/// Sortable columns.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Name,
    ExpiryDate,
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "created_at" => Ok(SortKey::CreatedAt),
            "name" => Ok(SortKey::Name),
            "expiry_date" | "expiry" => Ok(SortKey::ExpiryDate),
            other => Err(DomainError::validation(format!(
                "sort must be one of: created_at, name, expiry_date (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DomainError::validation(format!(
                "order must be asc or desc (got '{other}')"
            ))),
        }
    }
}

/// Ordering of the listing. Defaults to newest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ItemSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for ItemSort {
    fn default() -> Self {
        Self::new(SortKey::CreatedAt, None)
    }
}

impl ItemSort {
    /// Timestamps default to descending, text and dates to ascending.
    pub fn new(key: SortKey, order: Option<SortOrder>) -> Self {
        let order = order.unwrap_or(match key {
            SortKey::CreatedAt => SortOrder::Desc,
            SortKey::Name | SortKey::ExpiryDate => SortOrder::Asc,
        });
        Self { key, order }
    }

    /// Stable sort; rows without an expiry date always go last.
    pub fn sort(&self, items: &mut [InventoryItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &InventoryItem, b: &InventoryItem) -> Ordering {
        let directed = |ord: Ordering| match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };

        match self.key {
            SortKey::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
            SortKey::Name => directed(a.name.to_lowercase().cmp(&b.name.to_lowercase())),
            SortKey::ExpiryDate => match (a.expiry_date, b.expiry_date) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Distinct, sorted locations (the option list of the location filter).
pub fn locations(items: &[InventoryItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.location_description.clone())
        .filter(|loc| !loc.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, NaiveDate};
    use labtrack_core::ItemId;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn item(name: &str, expiry_offset_days: Option<i64>) -> InventoryItem {
        let today = now().date_naive();
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            cas_number: None,
            lot_number: None,
            expiry_date: expiry_offset_days.map(|d| today + Duration::days(d)),
            location_description: None,
            quantity_original: 1.0,
            quantity_current: 1.0,
            quantity_unit: "g".to_string(),
            price: None,
            supplier: None,
            catalog_number: None,
            storage_conditions: None,
            safety_data: None,
            notes: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn search_matches_name_cas_and_lot_case_insensitively() {
        let mut a = item("Sodium Chloride", None);
        a.cas_number = Some("7647-14-5".into());
        let mut b = item("Ethanol", None);
        b.lot_number = Some("LOT-AB12".into());
        let c = item("Glycerol", None);
        let rows = vec![a, b, c];

        let by_name = ItemFilter { search: "sodium".into(), ..ItemFilter::default() };
        assert_eq!(by_name.apply(&rows, now()).len(), 1);

        let by_cas = ItemFilter { search: "7647".into(), ..ItemFilter::default() };
        assert_eq!(by_cas.apply(&rows, now())[0].name, "Sodium Chloride");

        let by_lot = ItemFilter { search: "ab12".into(), ..ItemFilter::default() };
        assert_eq!(by_lot.apply(&rows, now())[0].name, "Ethanol");
    }

    #[test]
    fn location_is_an_exact_match() {
        let mut a = item("A", None);
        a.location_description = Some("Fridge 1".into());
        let mut b = item("B", None);
        b.location_description = Some("Fridge 10".into());
        let rows = vec![a, b];

        let f = ItemFilter { location: Some("Fridge 1".into()), ..ItemFilter::default() };
        let hits = f.apply(&rows, now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "A");
        assert_eq!(locations(&rows), vec!["Fridge 1".to_string(), "Fridge 10".to_string()]);
    }

    #[test]
    fn expiry_sort_puts_missing_dates_last() {
        let mut rows = vec![item("none", None), item("late", Some(40)), item("early", Some(2))];
        ItemSort::new(SortKey::ExpiryDate, Some(SortOrder::Desc)).sort(&mut rows);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["late", "early", "none"]);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let mut old = item("old", None);
        old.created_at = now() - Duration::days(3);
        let mut rows = vec![old, item("new", None)];
        ItemSort::default().sort(&mut rows);
        assert_eq!(rows[0].name, "new");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: "expired" keeps exactly the rows dated before now.
        /// With now at noon, an item dated today (offset 0) began expiring at midnight.
        #[test]
        fn expired_filter_keeps_exactly_past_dates(
            offsets in prop::collection::vec(prop::option::of(-400i64..400i64), 0..40)
        ) {
            let rows: Vec<_> = offsets.iter().map(|o| item("x", *o)).collect();
            let f = ItemFilter { expiry: ExpiryFilter::Expired, ..ItemFilter::default() };
            let hits = f.apply(&rows, now());

            let expected = offsets.iter().filter(|o| matches!(o, Some(d) if *d <= 0)).count();
            prop_assert_eq!(hits.len(), expected);
            for h in &hits {
                prop_assert!(crate::expiry::expiry_instant(h.expiry_date.unwrap()) < now());
            }
        }

        /// Property: "expiring-soon" keeps rows whose expiry falls in [now, now + 30 days).
        #[test]
        fn expiring_soon_filter_keeps_the_next_thirty_days(
            offsets in prop::collection::vec(prop::option::of(-400i64..400i64), 0..40)
        ) {
            let rows: Vec<_> = offsets.iter().map(|o| item("x", *o)).collect();
            let f = ItemFilter { expiry: ExpiryFilter::ExpiringSoon, ..ItemFilter::default() };
            let hits = f.apply(&rows, now());

            let expected = offsets
                .iter()
                .filter(|o| matches!(o, Some(d) if (1..=30).contains(d)))
                .count();
            prop_assert_eq!(hits.len(), expected);
        }

        /// Property: expired and valid partition every dated row.
        #[test]
        fn expired_and_valid_partition_dated_rows(
            offsets in prop::collection::vec(-400i64..400i64, 0..40)
        ) {
            let rows: Vec<_> = offsets.iter().map(|o| item("x", Some(*o))).collect();
            let expired = ItemFilter { expiry: ExpiryFilter::Expired, ..ItemFilter::default() };
            let valid = ItemFilter { expiry: ExpiryFilter::Valid, ..ItemFilter::default() };
            prop_assert_eq!(
                expired.apply(&rows, now()).len() + valid.apply(&rows, now()).len(),
                rows.len()
            );
        }
    }
}
