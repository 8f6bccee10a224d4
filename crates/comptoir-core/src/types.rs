//! # Domain Types
//!
//! The raw records the aggregation core reads. They mirror what the sales,
//! purchases and products endpoints return, and are never mutated here.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │
//! │  │     SaleRecord       │   │  ExpenseRecord  │   │ ProductSnapshot │  │
//! │  │  ──────────────────  │   │  ─────────────  │   │  ─────────────  │  │
//! │  │  id, date            │   │  id, date       │   │  id             │  │
//! │  │  client_name         │   │  kind           │   │  description    │  │
//! │  │  items: SaleItems ─┐ │   │  total_cost     │   │  quantity       │  │
//! │  └────────────────────┼─┘   └─────────────────┘   │  purchase_price │  │
//! │                       │                           └─────────────────┘  │
//! │       ┌───────────────┼──────────────────┐                             │
//! │       ▼               ▼                  ▼                             │
//! │  MultiProduct      Legacy             Unpriced                         │
//! │  products[]        one product        (no price data)                  │
//! │  total overrides   scalar fields                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Sale Shapes
//! Older sales were recorded one product per sale (`sellingPrice`,
//! `quantitySold`, ... directly on the record). Newer ones carry a
//! `products` array. On the wire both are one flat JSON object; decoding
//! turns it into the tagged [`SaleItems`] so nothing downstream has to inspect
//! optional fields again.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product Line
// =============================================================================

/// One product inside a multi-product sale.
///
/// Missing numbers decode as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductLine {
    #[serde(default)]
    pub product_id: String,

    #[serde(default)]
    pub description: String,

    /// Unit selling price.
    #[serde(default, with = "crate::money::euros")]
    #[ts(type = "number")]
    pub selling_price: Money,

    /// Unit purchase price.
    #[serde(default, with = "crate::money::euros")]
    #[ts(type = "number")]
    pub purchase_price: Money,

    #[serde(default, with = "crate::numeric::quantity")]
    #[ts(type = "number")]
    pub quantity_sold: i64,

    /// Line profit as recorded at checkout.
    #[serde(default, with = "crate::money::euros")]
    #[ts(type = "number")]
    pub profit: Money,
}

// =============================================================================
// Sale Shapes
// =============================================================================

/// Multi-product sale body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiProductSale {
    pub products: Vec<ProductLine>,
    /// When present, wins over the sum of lines.
    pub total_selling_price: Option<Money>,
    pub total_purchase_price: Option<Money>,
    pub total_profit: Option<Money>,
}

/// Legacy single-product sale body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacySale {
    pub product_id: Option<String>,
    pub description: Option<String>,
    /// Unit selling price.
    pub selling_price: Money,
    /// Unit purchase price.
    pub purchase_price: Money,
    pub quantity_sold: i64,
    /// Recorded profit; `None` falls back to revenue - cost.
    pub profit: Option<Money>,
}

/// What a sale contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleItems {
    MultiProduct(MultiProductSale),
    Legacy(LegacySale),
    /// Neither shape present; contributes zero everywhere.
    Unpriced,
}

// =============================================================================
// Sale Record
// =============================================================================

/// One completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SaleWire", into = "SaleWire")]
pub struct SaleRecord {
    pub id: String,
    pub date: NaiveDateTime,
    pub client_name: Option<String>,
    pub items: SaleItems,
}

impl SaleRecord {
    /// Creates a legacy single-product sale.
    pub fn legacy(id: impl Into<String>, date: NaiveDateTime, sale: LegacySale) -> Self {
        SaleRecord {
            id: id.into(),
            date,
            client_name: None,
            items: SaleItems::Legacy(sale),
        }
    }

    /// Creates a multi-product sale.
    pub fn multi(id: impl Into<String>, date: NaiveDateTime, sale: MultiProductSale) -> Self {
        SaleRecord {
            id: id.into(),
            date,
            client_name: None,
            items: SaleItems::MultiProduct(sale),
        }
    }
}

/// The flat JSON shape of a sale, exactly as the backend sends it.
///
/// Exported to TypeScript as `SaleRecord`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, rename = "SaleRecord")]
pub struct SaleWire {
    #[serde(default, alias = "_id")]
    pub id: String,

    #[serde(with = "crate::timestamp")]
    #[ts(type = "string")]
    pub date: NaiveDateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    // --- legacy shape ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub selling_price: Option<Money>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub purchase_price: Option<Money>,

    #[serde(
        default,
        with = "crate::numeric::quantity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub quantity_sold: Option<i64>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub profit: Option<Money>,

    // --- multi-product shape ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductLine>>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub total_selling_price: Option<Money>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub total_purchase_price: Option<Money>,

    #[serde(default, with = "crate::money::euros_opt", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub total_profit: Option<Money>,
}

impl SaleWire {
    fn has_legacy_fields(&self) -> bool {
        self.selling_price.is_some()
            || self.purchase_price.is_some()
            || self.quantity_sold.is_some()
            || self.profit.is_some()
    }

    fn has_totals(&self) -> bool {
        self.total_selling_price.is_some()
            || self.total_purchase_price.is_some()
            || self.total_profit.is_some()
    }
}

/// Shape detection happens here and only here.
///
/// - a non-empty `products` array → `MultiProduct`
/// - an empty `products` array with any `total*` field → `MultiProduct`
/// - any legacy price/quantity/profit field → `Legacy`
/// - an empty `products` array and nothing else → `MultiProduct` (zero)
/// - nothing → `Unpriced`
impl From<SaleWire> for SaleRecord {
    fn from(wire: SaleWire) -> Self {
        let has_legacy = wire.has_legacy_fields();
        let has_totals = wire.has_totals();
        let items = match wire.products {
            Some(products) if !products.is_empty() || has_totals || !has_legacy => {
                SaleItems::MultiProduct(MultiProductSale {
                    products,
                    total_selling_price: wire.total_selling_price,
                    total_purchase_price: wire.total_purchase_price,
                    total_profit: wire.total_profit,
                })
            }
            _ if has_legacy => SaleItems::Legacy(LegacySale {
                product_id: wire.product_id,
                description: wire.description,
                selling_price: wire.selling_price.unwrap_or_default(),
                purchase_price: wire.purchase_price.unwrap_or_default(),
                quantity_sold: wire.quantity_sold.unwrap_or_default(),
                profit: wire.profit,
            }),
            _ => SaleItems::Unpriced,
        };

        SaleRecord {
            id: wire.id,
            date: wire.date,
            client_name: wire.client_name,
            items,
        }
    }
}

impl From<SaleRecord> for SaleWire {
    fn from(record: SaleRecord) -> Self {
        let mut wire = SaleWire {
            id: record.id,
            date: record.date,
            client_name: record.client_name,
            ..SaleWire::default()
        };

        match record.items {
            SaleItems::MultiProduct(sale) => {
                wire.products = Some(sale.products);
                wire.total_selling_price = sale.total_selling_price;
                wire.total_purchase_price = sale.total_purchase_price;
                wire.total_profit = sale.total_profit;
            }
            SaleItems::Legacy(sale) => {
                wire.product_id = sale.product_id;
                wire.description = sale.description;
                wire.selling_price = Some(sale.selling_price);
                wire.purchase_price = Some(sale.purchase_price);
                wire.quantity_sold = Some(sale.quantity_sold);
                wire.profit = sale.profit;
            }
            SaleItems::Unpriced => {}
        }

        wire
    }
}

// =============================================================================
// Expense Record
// =============================================================================

/// Kind of purchase or expense.
///
/// `AchatProduit` is inventory restocking; everything else is an operating
/// expense. Unknown or missing kinds decode as `AutreDepense`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ExpenseType {
    AchatProduit,
    Taxes,
    Carburant,
    #[default]
    #[serde(other)]
    AutreDepense,
}

impl ExpenseType {
    /// All kinds, in statement order.
    pub const ALL: [ExpenseType; 4] = [
        ExpenseType::AchatProduit,
        ExpenseType::Taxes,
        ExpenseType::Carburant,
        ExpenseType::AutreDepense,
    ];

    /// True for stock purchases ("achats"), false for operating expenses
    /// ("dépenses").
    #[inline]
    pub fn is_restock(&self) -> bool {
        matches!(self, ExpenseType::AchatProduit)
    }

    /// French label used on statements.
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseType::AchatProduit => "Achat produit",
            ExpenseType::Taxes => "Taxes",
            ExpenseType::Carburant => "Carburant",
            ExpenseType::AutreDepense => "Autre dépense",
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A purchase ("achat") or miscellaneous expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseRecord {
    #[serde(default, alias = "_id")]
    pub id: String,

    #[serde(with = "crate::timestamp")]
    #[ts(type = "string")]
    pub date: NaiveDateTime,

    /// Missing kind decodes as `AutreDepense`.
    #[serde(rename = "type", default)]
    pub kind: ExpenseType,

    #[serde(default, with = "crate::money::euros")]
    #[ts(type = "number")]
    pub total_cost: Money,

    #[serde(
        default,
        with = "crate::numeric::quantity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub quantity: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fournisseur: Option<String>,
}

impl ExpenseRecord {
    /// Creates an expense with only the fields aggregation needs.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDateTime,
        kind: ExpenseType,
        total_cost: Money,
    ) -> Self {
        ExpenseRecord {
            id: id.into(),
            date,
            kind,
            total_cost,
            quantity: None,
            product_description: None,
            description: None,
            fournisseur: None,
        }
    }

    /// The label shown in tables: product description for purchases,
    /// free-text description otherwise.
    pub fn label(&self) -> Option<&str> {
        self.product_description
            .as_deref()
            .or(self.description.as_deref())
    }
}

// =============================================================================
// Product Snapshot
// =============================================================================

/// Current inventory state of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSnapshot {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Units currently in stock.
    #[serde(default, with = "crate::numeric::quantity")]
    #[ts(type = "number")]
    pub quantity: i64,

    /// Unit purchase price.
    #[serde(default, with = "crate::money::euros")]
    #[ts(type = "number")]
    pub purchase_price: Money,
}

// =============================================================================
// Dataset
// =============================================================================

/// Everything one report is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub products: Vec<ProductSnapshot>,
}

impl Dataset {
    pub fn new(
        sales: Vec<SaleRecord>,
        expenses: Vec<ExpenseRecord>,
        products: Vec<ProductSnapshot>,
    ) -> Self {
        Dataset {
            sales,
            expenses,
            products,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_multi_product_sale() {
        let sale: SaleRecord = serde_json::from_value(json!({
            "id": "s1",
            "date": "2024-03-15T10:00:00.000Z",
            "clientName": "Mme Durand",
            "products": [
                {"productId": "p1", "description": "Savon", "sellingPrice": 10,
                 "purchasePrice": 4, "quantitySold": 2, "profit": 12}
            ],
            "totalSellingPrice": 20
        }))
        .unwrap();

        assert_eq!(sale.client_name.as_deref(), Some("Mme Durand"));
        match sale.items {
            SaleItems::MultiProduct(multi) => {
                assert_eq!(multi.products.len(), 1);
                assert_eq!(multi.products[0].selling_price, Money::from_cents(1000));
                assert_eq!(multi.total_selling_price, Some(Money::from_cents(2000)));
                assert_eq!(multi.total_profit, None);
            }
            other => panic!("expected multi-product sale, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_legacy_sale_with_mongo_id() {
        let sale: SaleRecord = serde_json::from_value(json!({
            "_id": "65f0",
            "date": "2023-12-31",
            "productId": "p9",
            "sellingPrice": 50,
            "purchasePrice": 20,
            "quantitySold": 1,
            "profit": 30
        }))
        .unwrap();

        assert_eq!(sale.id, "65f0");
        assert_eq!(
            sale.items,
            SaleItems::Legacy(LegacySale {
                product_id: Some("p9".to_string()),
                description: None,
                selling_price: Money::from_cents(5000),
                purchase_price: Money::from_cents(2000),
                quantity_sold: 1,
                profit: Some(Money::from_cents(3000)),
            })
        );
    }

    #[test]
    fn test_empty_products_array_is_multi_product() {
        let sale: SaleRecord = serde_json::from_value(json!({
            "id": "s2",
            "date": "2024-01-01",
            "products": [],
            "totalSellingPrice": 15
        }))
        .unwrap();
        assert!(matches!(sale.items, SaleItems::MultiProduct(_)));
        assert_eq!(sale.values().revenue, Money::from_cents(1500));

        let bare: SaleRecord = serde_json::from_value(json!({
            "id": "s2b",
            "date": "2024-01-01",
            "products": []
        }))
        .unwrap();
        assert!(matches!(bare.items, SaleItems::MultiProduct(_)));
    }

    #[test]
    fn test_empty_products_array_falls_back_to_legacy_fields() {
        let sale: SaleRecord = serde_json::from_value(json!({
            "id": "s4",
            "date": "2024-01-01",
            "products": [],
            "sellingPrice": 50,
            "purchasePrice": 20,
            "quantitySold": 1,
            "profit": 30
        }))
        .unwrap();

        assert!(matches!(sale.items, SaleItems::Legacy(_)));
        let values = sale.values();
        assert_eq!(values.revenue, Money::from_cents(5000));
        assert_eq!(values.profit, Money::from_cents(3000));
        assert_eq!(values.quantity, 1);
    }

    #[test]
    fn test_loose_numbers_count_instead_of_failing() {
        let sales: Vec<SaleRecord> = serde_json::from_value(json!([
            {"id": "a", "date": "2024-01-01", "sellingPrice": "50", "purchasePrice": "20",
             "quantitySold": "2"},
            {"id": "b", "date": "2024-01-02",
             "products": [{"productId": "p1", "sellingPrice": 10, "quantitySold": 1.5}]},
            {"id": "c", "date": "2024-01-03", "sellingPrice": "sur devis", "quantitySold": 1}
        ]))
        .unwrap();

        assert_eq!(sales[0].values().revenue, Money::from_cents(10000));
        assert_eq!(sales[0].values().cost, Money::from_cents(4000));
        assert_eq!(sales[1].values().quantity, 2);
        assert_eq!(sales[1].values().revenue, Money::from_cents(2000));
        assert!(sales[2].values().revenue.is_zero());
    }

    #[test]
    fn test_record_without_prices_is_unpriced() {
        let sale: SaleRecord = serde_json::from_value(json!({
            "id": "s3",
            "date": "2024-01-01",
            "description": "note only"
        }))
        .unwrap();
        assert_eq!(sale.items, SaleItems::Unpriced);
    }

    #[test]
    fn test_sale_encodes_back_to_flat_shape() {
        let json = json!({
            "id": "s1",
            "date": "2024-03-15T10:00:00",
            "productId": "p1",
            "sellingPrice": 12.5,
            "purchasePrice": 5.0,
            "quantitySold": 2
        });
        let sale: SaleRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&sale).unwrap(), json);
    }

    #[test]
    fn test_decode_expense_types() {
        let expenses: Vec<ExpenseRecord> = serde_json::from_value(json!([
            {"id": "e1", "date": "2024-03-01", "type": "achat_produit", "totalCost": 120.5,
             "quantity": 10, "productDescription": "Savon", "fournisseur": "Grossiste"},
            {"id": "e2", "date": "2024-03-02", "type": "carburant", "totalCost": 60},
            {"id": "e3", "date": "2024-03-03", "type": "loyer", "totalCost": 500,
             "description": "Loyer mars"}
        ]))
        .unwrap();

        assert_eq!(expenses[0].kind, ExpenseType::AchatProduit);
        assert!(expenses[0].kind.is_restock());
        assert_eq!(expenses[0].total_cost, Money::from_cents(12050));
        assert_eq!(expenses[0].label(), Some("Savon"));
        assert_eq!(expenses[1].kind, ExpenseType::Carburant);
        assert_eq!(expenses[2].kind, ExpenseType::AutreDepense);
        assert_eq!(expenses[2].label(), Some("Loyer mars"));
    }

    #[test]
    fn test_expense_without_type_is_operating_expense() {
        let expense: ExpenseRecord = serde_json::from_value(json!({
            "id": "e4", "date": "2024-03-04", "totalCost": "15.5", "quantity": 2.0
        }))
        .unwrap();
        assert_eq!(expense.kind, ExpenseType::AutreDepense);
        assert_eq!(expense.total_cost, Money::from_cents(1550));
        assert_eq!(expense.quantity, Some(2));
    }

    #[test]
    fn test_expense_type_labels() {
        assert_eq!(ExpenseType::AutreDepense.to_string(), "Autre dépense");
        assert!(!ExpenseType::Taxes.is_restock());
    }

    #[test]
    fn test_decode_product_snapshot_defaults() {
        let product: ProductSnapshot =
            serde_json::from_value(json!({"id": "p1", "purchasePrice": 2.5})).unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.purchase_price, Money::from_cents(250));

        let product: ProductSnapshot =
            serde_json::from_value(json!({"id": "p2", "quantity": "12", "purchasePrice": "3"}))
                .unwrap();
        assert_eq!(product.quantity, 12);
        assert_eq!(product.purchase_price, Money::from_cents(300));
    }
}
