//! File exports of the (filtered) listing: CSV, XLSX and JSON.
//!
//! All three share one fixed column set and value formatting; see
//! [`ExportRow`].

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use labtrack_inventory::InventoryItem;

pub const COLUMNS: [&str; 14] = [
    "Name",
    "CAS Number",
    "Lot Number",
    "Expiry Date",
    "Location",
    "Original Quantity",
    "Current Quantity",
    "Price",
    "Supplier",
    "Catalog Number",
    "Storage Conditions",
    "Notes",
    "Created At",
    "Updated At",
];

const SHEET_NAME: &str = "Inventory";
const COLUMN_WIDTH: f64 = 15.0;
const NOT_AVAILABLE: &str = "N/A";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx encoding failed: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Json => "application/json",
        }
    }

    /// `inventory-export-{YYYY-MM-DD-HHmm}.{ext}`
    pub fn filename(&self, now: DateTime<Utc>) -> String {
        format!(
            "inventory-export-{}.{}",
            now.format("%Y-%m-%d-%H%M"),
            self.extension()
        )
    }

    pub fn encode(&self, items: &[InventoryItem]) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Csv => Ok(to_csv(items).into_bytes()),
            ExportFormat::Xlsx => to_xlsx(items),
            ExportFormat::Json => Ok(to_json(items)?.into_bytes()),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unsupported export format '{other}' (csv, xlsx, json)")),
        }
    }
}

/// One exported line, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CAS Number")]
    pub cas_number: String,
    #[serde(rename = "Lot Number")]
    pub lot_number: String,
    #[serde(rename = "Expiry Date")]
    pub expiry_date: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Original Quantity")]
    pub original_quantity: String,
    #[serde(rename = "Current Quantity")]
    pub current_quantity: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "Catalog Number")]
    pub catalog_number: String,
    #[serde(rename = "Storage Conditions")]
    pub storage_conditions: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Updated At")]
    pub updated_at: String,
}

impl ExportRow {
    pub fn from_item(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            cas_number: or_na(item.cas_number.as_deref()),
            lot_number: or_na(item.lot_number.as_deref()),
            expiry_date: item
                .expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            location: or_na(item.location_description.as_deref()),
            original_quantity: format!("{} {}", item.quantity_original, item.quantity_unit),
            current_quantity: format!("{} {}", item.quantity_current, item.quantity_unit),
            price: item
                .price
                .map(|p| format!("${p:.2}"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            supplier: or_na(item.supplier.as_deref()),
            catalog_number: or_na(item.catalog_number.as_deref()),
            storage_conditions: or_na(item.storage_conditions.as_deref()),
            notes: or_na(item.notes.as_deref()),
            created_at: item.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: item.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Values in [`COLUMNS`] order.
    pub fn values(&self) -> [&str; 14] {
        [
            self.name.as_str(),
            self.cas_number.as_str(),
            self.lot_number.as_str(),
            self.expiry_date.as_str(),
            self.location.as_str(),
            self.original_quantity.as_str(),
            self.current_quantity.as_str(),
            self.price.as_str(),
            self.supplier.as_str(),
            self.catalog_number.as_str(),
            self.storage_conditions.as_str(),
            self.notes.as_str(),
            self.created_at.as_str(),
            self.updated_at.as_str(),
        ]
    }
}

fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn to_csv(items: &[InventoryItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(COLUMNS.join(","));
    for item in items {
        let row = ExportRow::from_item(item);
        let cells: Vec<String> = row.values().iter().map(|v| csv_cell(v)).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_xlsx(items: &[InventoryItem]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *header, &bold)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (idx, item) in items.iter().enumerate() {
        let row = ExportRow::from_item(item);
        let r = idx as u32 + 1;
        for (col, value) in row.values().iter().enumerate() {
            worksheet.write_string(r, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn to_json(items: &[InventoryItem]) -> Result<String, ExportError> {
    let rows: Vec<ExportRow> = items.iter().map(ExportRow::from_item).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
