//! # Record Audit
//!
//! Checks on the raw records. Findings are reported, never fixed: the
//! aggregation functions keep reading flagged records exactly as they are.
//!
//! ## Audit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dataset                                                                │
//! │    ├── sales     ──► validate_sale + profit_discrepancy ──┐             │
//! │    ├── expenses  ──► validate_expense ────────────────────┼──► Vec<AuditIssue>
//! │    └── products  ──► validate_product ────────────────────┘             │
//! │                                                                         │
//! │  The report crate logs each issue at warn level and moves on.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comptoir_core::types::Dataset;
//! use comptoir_core::validation::audit;
//!
//! assert!(audit(&Dataset::default()).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Dataset, ExpenseRecord, ProductSnapshot, SaleItems, SaleRecord};
use crate::{MAX_ID_LENGTH, MAX_TEXT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Checks
// =============================================================================

fn check_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }
    if id.chars().count() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LENGTH,
        });
    }
    Ok(())
}

fn check_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        _ => Ok(()),
    }
}

fn check_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value: amount.cents(),
        });
    }
    Ok(())
}

fn check_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value: quantity,
        });
    }
    Ok(())
}

/// Runs every check, keeping all failures.
fn collect(checks: Vec<ValidationResult<()>>) -> Vec<ValidationError> {
    checks.into_iter().filter_map(Result::err).collect()
}

// =============================================================================
// Record Validators
// =============================================================================

/// Every finding on one sale, profit discrepancy excluded.
pub fn sale_findings(sale: &SaleRecord) -> Vec<ValidationError> {
    let mut checks = vec![
        check_id(&sale.id),
        check_text("clientName", sale.client_name.as_deref()),
    ];

    match &sale.items {
        SaleItems::MultiProduct(multi) => {
            for (i, line) in multi.products.iter().enumerate() {
                if line.product_id.trim().is_empty() {
                    checks.push(Err(ValidationError::Required {
                        field: format!("products[{}].productId", i),
                    }));
                }
                checks.push(check_amount(&format!("products[{}].sellingPrice", i), line.selling_price));
                checks.push(check_amount(&format!("products[{}].purchasePrice", i), line.purchase_price));
                checks.push(check_quantity(&format!("products[{}].quantitySold", i), line.quantity_sold));
            }
            if let Some(total) = multi.total_selling_price {
                checks.push(check_amount("totalSellingPrice", total));
            }
            if let Some(total) = multi.total_purchase_price {
                checks.push(check_amount("totalPurchasePrice", total));
            }
        }
        SaleItems::Legacy(legacy) => {
            checks.push(check_amount("sellingPrice", legacy.selling_price));
            checks.push(check_amount("purchasePrice", legacy.purchase_price));
            checks.push(check_quantity("quantitySold", legacy.quantity_sold));
            checks.push(check_text("description", legacy.description.as_deref()));
        }
        SaleItems::Unpriced => checks.push(Err(ValidationError::Required {
            field: "products".to_string(),
        })),
    }

    collect(checks)
}

/// Validates a sale, stopping at the first finding.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use comptoir_core::money::Money;
/// use comptoir_core::types::{LegacySale, SaleRecord};
/// use comptoir_core::validation::validate_sale;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let ok = SaleRecord::legacy("s1", date, LegacySale {
///     selling_price: Money::from_cents(500),
///     quantity_sold: 1,
///     ..LegacySale::default()
/// });
/// assert!(validate_sale(&ok).is_ok());
///
/// let negative = SaleRecord::legacy("s2", date, LegacySale {
///     quantity_sold: -1,
///     ..LegacySale::default()
/// });
/// assert!(validate_sale(&negative).is_err());
/// ```
pub fn validate_sale(sale: &SaleRecord) -> ValidationResult<()> {
    match sale_findings(sale).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every finding on one expense.
pub fn expense_findings(expense: &ExpenseRecord) -> Vec<ValidationError> {
    let mut checks = vec![
        check_id(&expense.id),
        check_amount("totalCost", expense.total_cost),
        check_text("description", expense.description.as_deref()),
        check_text("productDescription", expense.product_description.as_deref()),
        check_text("fournisseur", expense.fournisseur.as_deref()),
    ];
    if let Some(quantity) = expense.quantity {
        if quantity <= 0 {
            checks.push(Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }));
        }
    }
    collect(checks)
}

/// Validates an expense, stopping at the first finding.
pub fn validate_expense(expense: &ExpenseRecord) -> ValidationResult<()> {
    match expense_findings(expense).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every finding on one product snapshot.
pub fn product_findings(product: &ProductSnapshot) -> Vec<ValidationError> {
    collect(vec![
        check_id(&product.id),
        check_quantity("quantity", product.quantity),
        check_amount("purchasePrice", product.purchase_price),
    ])
}

/// Flags a legacy sale whose recorded profit differs from revenue - cost.
///
/// The recorded value stays authoritative for aggregation.
pub fn profit_discrepancy(sale: &SaleRecord) -> Option<ValidationError> {
    let SaleItems::Legacy(legacy) = &sale.items else {
        return None;
    };
    let recorded = legacy.profit?;
    let computed = legacy.selling_price.multiply_quantity(legacy.quantity_sold)
        - legacy.purchase_price.multiply_quantity(legacy.quantity_sold);

    (recorded != computed).then_some(ValidationError::ProfitMismatch { recorded, computed })
}

// =============================================================================
// Audit
// =============================================================================

/// Which list a flagged record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RecordKind {
    Sale,
    Expense,
    Product,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Sale => write!(f, "sale"),
            RecordKind::Expense => write!(f, "expense"),
            RecordKind::Product => write!(f, "product"),
        }
    }
}

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditIssue {
    pub record: RecordKind,
    pub record_id: String,
    pub message: String,
}

impl AuditIssue {
    fn new(record: RecordKind, record_id: &str, error: &ValidationError) -> Self {
        AuditIssue {
            record,
            record_id: record_id.to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.record, self.record_id, self.message)
    }
}

/// Audits every record of the dataset: sales, then expenses, then products.
pub fn audit(dataset: &Dataset) -> Vec<AuditIssue> {
    let mut issues = Vec::new();

    for sale in &dataset.sales {
        let findings = sale_findings(sale).into_iter().chain(profit_discrepancy(sale));
        issues.extend(findings.map(|err| AuditIssue::new(RecordKind::Sale, &sale.id, &err)));
    }
    for expense in &dataset.expenses {
        issues.extend(
            expense_findings(expense)
                .iter()
                .map(|err| AuditIssue::new(RecordKind::Expense, &expense.id, err)),
        );
    }
    for product in &dataset.products {
        issues.extend(
            product_findings(product)
                .iter()
                .map(|err| AuditIssue::new(RecordKind::Product, &product.id, err)),
        );
    }

    issues
}

// =============================================================================
// Unit Tests
// =============================================================================
