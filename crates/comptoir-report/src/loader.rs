//! # Data Loading
//!
//! Reads the JSON exports of the backend into a [`Dataset`].
//!
//! Each file holds either a bare array of records or the REST envelope the
//! backend answers with:
//!
//! ```json
//! { "success": true, "data": [ { "id": "...", "date": "..." } ] }
//! ```
//!
//! The sales file is required. Expenses and products are optional: a
//! missing file yields an empty list and a warning, so a report on sales
//! alone still works.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use comptoir_core::types::{Dataset, ExpenseRecord, ProductSnapshot, SaleRecord};
use comptoir_core::validation::AuditIssue;

use crate::config::DataSettings;
use crate::error::{ReportError, ReportResult};

/// Reads one JSON export into records.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> ReportResult<Vec<T>> {
    let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let json_error = |source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    };

    let items = match serde_json::from_str::<Value>(&contents).map_err(json_error)? {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ReportError::UnexpectedShape {
                    path: path.to_path_buf(),
                    reason: format!("\"data\" is {}, expected an array", kind_of(&other)),
                })
            }
            None => {
                return Err(ReportError::UnexpectedShape {
                    path: path.to_path_buf(),
                    reason: "object without a \"data\" array".to_string(),
                })
            }
        },
        other => {
            return Err(ReportError::UnexpectedShape {
                path: path.to_path_buf(),
                reason: format!("top-level {}, expected an array", kind_of(&other)),
            })
        }
    };

    let records: Vec<T> = serde_json::from_value(Value::Array(items)).map_err(json_error)?;
    debug!(?path, count = records.len(), "Records read");
    Ok(records)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads an optional export; a missing file is an empty list.
fn read_optional<T: DeserializeOwned>(path: Option<&Path>, what: &str) -> ReportResult<Vec<T>> {
    match path {
        Some(path) if path.exists() => read_records(path),
        Some(path) => {
            warn!(?path, "{} file not found, continuing without it", what);
            Ok(Vec::new())
        }
        None => {
            debug!("No {} file configured", what);
            Ok(Vec::new())
        }
    }
}

/// Loads every configured export.
pub fn load_dataset(settings: &DataSettings) -> ReportResult<Dataset> {
    if !settings.sales_path.exists() {
        return Err(ReportError::MissingData(settings.sales_path.clone()));
    }

    let sales: Vec<SaleRecord> = read_records(&settings.sales_path)?;
    let expenses: Vec<ExpenseRecord> = read_optional(settings.expenses_path.as_deref(), "expenses")?;
    let products: Vec<ProductSnapshot> =
        read_optional(settings.products_path.as_deref(), "products")?;

    info!(
        sales = sales.len(),
        expenses = expenses.len(),
        products = products.len(),
        "Dataset loaded"
    );

    Ok(Dataset::new(sales, expenses, products))
}

/// Logs each audit finding. The records are still aggregated as they are.
pub fn log_audit(issues: &[AuditIssue]) {
    for issue in issues {
        warn!(record = %issue.record, id = %issue.record_id, "{}", issue.message);
    }
    if !issues.is_empty() {
        info!(count = issues.len(), "Audit found suspicious records");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptoir_core::types::ExpenseType;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const SALES: &str = r#"[
        {"_id": "s1", "date": "2024-06-04T10:00:00.000Z",
         "products": [{"productId": "p1", "sellingPrice": 10, "purchasePrice": 4,
                       "quantitySold": 2, "profit": 12}]},
        {"id": "s2", "date": "2024-06-20", "productId": "p2",
         "sellingPrice": 50, "purchasePrice": 20, "quantitySold": 1, "profit": 30}
    ]"#;

    #[test]
    fn test_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "sales.json", SALES);

        let sales: Vec<SaleRecord> = read_records(&path).unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].id, "s1");
        assert_eq!(sales[1].values().revenue.cents(), 5000);
    }

    #[test]
    fn test_rest_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "achats.json",
            r#"{"success": true, "data": [
                {"_id": "e1", "date": "2024-06-01", "type": "achat_produit", "totalCost": 20.5},
                {"_id": "e2", "date": "2024-06-03", "type": "loyer", "totalCost": 300}
            ]}"#,
        );

        let expenses: Vec<ExpenseRecord> = read_records(&path).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].total_cost.cents(), 2050);
        assert_eq!(expenses[1].kind, ExpenseType::AutreDepense);
    }

    #[test]
    fn test_unexpected_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let path = write(dir.path(), "a.json", r#"{"success": false, "message": "boom"}"#);
        let err = read_records::<SaleRecord>(&path).unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedShape { .. }));

        let path = write(dir.path(), "b.json", "42");
        let err = read_records::<SaleRecord>(&path).unwrap_err();
        assert!(err.to_string().contains("top-level a number"));

        let path = write(dir.path(), "c.json", "[{");
        let err = read_records::<SaleRecord>(&path).unwrap_err();
        assert!(matches!(err, ReportError::Json { .. }));

        let path = write(dir.path(), "d.json", r#"[{"id": "s1", "date": "someday"}]"#);
        let err = read_records::<SaleRecord>(&path).unwrap_err();
        assert!(matches!(err, ReportError::Json { .. }));
        assert!(err.is_data_error());
    }

    #[test]
    fn test_load_dataset_optional_files() {
        let dir = tempfile::tempdir().unwrap();
        let sales_path = write(dir.path(), "sales.json", SALES);
        let products_path = write(
            dir.path(),
            "products.json",
            r#"[{"_id": "p1", "description": "Bougie", "quantity": 8, "purchasePrice": 4}]"#,
        );

        let settings = DataSettings {
            sales_path,
            expenses_path: Some(dir.path().join("missing.json")),
            products_path: Some(products_path),
        };

        let dataset = load_dataset(&settings).unwrap();
        assert_eq!(dataset.sales.len(), 2);
        assert!(dataset.expenses.is_empty());
        assert_eq!(
            dataset.products,
            vec![ProductSnapshot {
                id: "p1".to_string(),
                description: "Bougie".to_string(),
                quantity: 8,
                purchase_price: comptoir_core::Money::from_cents(400),
            }]
        );
    }

    #[test]
    fn test_missing_sales_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DataSettings {
            sales_path: dir.path().join("sales.json"),
            ..DataSettings::default()
        };

        let err = load_dataset(&settings).unwrap_err();
        assert!(matches!(err, ReportError::MissingData(_)));
        assert_eq!(err.exit_code(), 3);
    }
}
