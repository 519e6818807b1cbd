//! # Catalog Import / Export
//!
//! Reads and writes the product catalog as JSON or CSV.
//!
//! ## Import Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   file text ──► parse (JSON array | CSV rows) ──► validate every record  │
//! │                                                    │                    │
//! │                        first failure ◄─────────────┤                    │
//! │                        aborts, nothing             │ all good           │
//! │                        is written                  ▼                    │
//! │                                          apply_import(merge | replace)  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## CSV Shape
//! A header row is required and must contain `name` and `price` (matched
//! case-insensitively). Known optional columns are `id`, `description`,
//! `category`, `image`, `qrCode`, `sku` and `stock`; anything else is
//! ignored. Fields may be double-quoted, with `""` for a literal quote.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::catalog::generate_qr_code;
use crate::error::ImportError;
use crate::money::Money;
use crate::types::Product;

/// Column order used by CSV export.
pub const CSV_HEADERS: [&str; 9] = [
    "id",
    "name",
    "description",
    "price",
    "category",
    "image",
    "qrCode",
    "sku",
    "stock",
];

// =============================================================================
// Modes and Formats
// =============================================================================

/// How imported products combine with the existing catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Upsert by id; unknown ids are appended in file order.
    #[default]
    Merge,
    /// Discard the existing catalog.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// `.csv` files are CSV, everything else is read as JSON.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_lowercase().ends_with(".csv") {
            ImportFormat::Csv
        } else {
            ImportFormat::Json
        }
    }
}

/// Parses and validates a catalog file.
pub fn parse_products(
    content: &str,
    format: ImportFormat,
    now: DateTime<Utc>,
) -> Result<Vec<Product>, ImportError> {
    match format {
        ImportFormat::Json => parse_json_products(content, now),
        ImportFormat::Csv => parse_csv_products(content, now),
    }
}

fn import_id(now: DateTime<Utc>, index: usize) -> String {
    format!("import-{}-{}", now.timestamp_millis(), index)
}

fn fill_qr_code(product: &mut Product, now: DateTime<Utc>) {
    if product.qr_code.is_empty() {
        product.qr_code = generate_qr_code(product.sku.as_deref(), &product.name, now);
    }
}

// =============================================================================
// JSON
// =============================================================================

/// Parses a JSON array of product records.
///
/// Every record needs a string `name` that is non-empty once trimmed and a numeric `price >= 0`.
/// Records without an `id` get a generated one.
pub fn parse_json_products(content: &str, now: DateTime<Utc>) -> Result<Vec<Product>, ImportError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ImportError::Malformed(e.to_string()))?;
    let records = value.as_array().ok_or(ImportError::NotAnArray)?;

    let mut products = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ImportError::MissingName { index })?;

        let price_ok = record
            .get("price")
            .and_then(Value::as_f64)
            .is_some_and(|p| p >= 0.0);
        if !price_ok {
            return Err(ImportError::InvalidPrice {
                name: name.to_string(),
            });
        }

        let name = name.to_string();
        let mut record = record.clone();
        if let Some(fields) = record.as_object_mut() {
            fields.insert("name".to_string(), Value::String(name));
            let has_id = fields
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.is_empty());
            if !has_id {
                fields.insert("id".to_string(), Value::String(import_id(now, index)));
            }
        }

        let mut product: Product =
            serde_json::from_value(record).map_err(|e| ImportError::Malformed(e.to_string()))?;
        fill_qr_code(&mut product, now);
        products.push(product);
    }

    Ok(products)
}

// =============================================================================
// CSV
// =============================================================================

/// Splits CSV text into rows of fields, honouring double quotes.
///
/// Quoted fields may contain commas, newlines and `""` escapes. Blank lines
/// are skipped and fields are trimmed.
fn read_csv_rows(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut field).trim().to_string()),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut field).trim().to_string());
                if row.iter().any(|f| !f.is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(c),
        }
    }

    row.push(field.trim().to_string());
    if row.iter().any(|f| !f.is_empty()) {
        rows.push(row);
    }
    rows
}

/// Known columns, matched case-insensitively against the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Description,
    Price,
    Category,
    Image,
    QrCode,
    Sku,
    Stock,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "id" => Some(Column::Id),
            "name" => Some(Column::Name),
            "description" => Some(Column::Description),
            "price" => Some(Column::Price),
            "category" => Some(Column::Category),
            "image" => Some(Column::Image),
            "qrcode" => Some(Column::QrCode),
            "sku" => Some(Column::Sku),
            "stock" => Some(Column::Stock),
            _ => None,
        }
    }
}

/// Lenient number parse: anything unreadable is zero.
fn parse_or_zero(value: &str) -> Money {
    value.parse::<Money>().unwrap_or_default()
}

fn parse_stock(value: &str) -> u32 {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses CSV catalog text.
///
/// `price` and `stock` that fail to parse become 0. A row without an id
/// gets `import-<millis>-<row>`.
pub fn parse_csv_products(content: &str, now: DateTime<Utc>) -> Result<Vec<Product>, ImportError> {
    let rows = read_csv_rows(content.trim());
    if rows.len() < 2 {
        return Err(ImportError::MissingRows);
    }

    let columns: Vec<Option<Column>> = rows[0].iter().map(|h| Column::from_header(h)).collect();
    for (required, label) in [(Column::Name, "name"), (Column::Price, "price")] {
        if !columns.contains(&Some(required)) {
            return Err(ImportError::MissingColumn(label.to_string()));
        }
    }

    let mut products = Vec::with_capacity(rows.len() - 1);
    for (index, row) in rows[1..].iter().enumerate() {
        let mut product = Product {
            id: String::new(),
            name: String::new(),
            description: None,
            price: Money::zero(),
            category: String::new(),
            image: String::new(),
            qr_code: String::new(),
            sku: None,
            stock: None,
            created_at: None,
            updated_at: None,
        };

        for (column, value) in columns.iter().zip(row.iter().map(String::as_str).chain(std::iter::repeat(""))) {
            let Some(column) = column else { continue };
            let value = value.to_string();
            match column {
                Column::Id => product.id = value,
                Column::Name => product.name = value,
                Column::Description => product.description = non_empty(value),
                Column::Price => product.price = parse_or_zero(&value),
                Column::Category => product.category = value,
                Column::Image => product.image = value,
                Column::QrCode => product.qr_code = value,
                Column::Sku => product.sku = non_empty(value),
                Column::Stock if value.is_empty() => product.stock = None,
                Column::Stock => product.stock = Some(parse_stock(&value)),
            }
        }

        if product.name.is_empty() {
            return Err(ImportError::MissingName { index });
        }
        if product.price.is_negative() {
            return Err(ImportError::InvalidPrice { name: product.name });
        }
        if product.id.is_empty() {
            product.id = import_id(now, index);
        }
        fill_qr_code(&mut product, now);
        products.push(product);
    }

    Ok(products)
}

// =============================================================================
// Applying an Import
// =============================================================================

/// Combines an already-validated import with the current catalog.
pub fn apply_import(existing: Vec<Product>, incoming: Vec<Product>, mode: ImportMode) -> Vec<Product> {
    match mode {
        ImportMode::Replace => incoming,
        ImportMode::Merge => {
            let mut merged = existing;
            for product in incoming {
                match merged.iter_mut().find(|p| p.id == product.id) {
                    Some(slot) => *slot = product,
                    None => merged.push(product),
                }
            }
            merged
        }
    }
}

// =============================================================================
// Export
// =============================================================================

/// Pretty-printed JSON array.
pub fn export_json(products: &[Product]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(products)
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV with a header row in [`CSV_HEADERS`] order.
pub fn export_csv(products: &[Product]) -> String {
    let mut lines = Vec::with_capacity(products.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for p in products {
        let fields = [
            csv_escape(&p.id),
            csv_escape(&p.name),
            csv_escape(p.description.as_deref().unwrap_or_default()),
            p.price.amount().normalize().to_string(),
            csv_escape(&p.category),
            csv_escape(&p.image),
            csv_escape(&p.qr_code),
            csv_escape(p.sku.as_deref().unwrap_or_default()),
            p.stock.map(|s| s.to_string()).unwrap_or_default(),
        ];
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

// =============================================================================
// Unit Tests
// =============================================================================
