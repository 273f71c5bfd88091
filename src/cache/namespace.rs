//! Dataset namespaces used for key prefixing and bulk invalidation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cached dataset kind. Each variant owns a disjoint slice of the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    SummaryMetrics,
    StockLevels,
    StockVisualization,
    CategoryBreakdown,
    LowStockAlerts,
    InventoryValue,
    ProductList,
}

impl Namespace {
    /// Every known namespace.
    pub const ALL: [Namespace; 7] = [
        Namespace::SummaryMetrics,
        Namespace::StockLevels,
        Namespace::StockVisualization,
        Namespace::CategoryBreakdown,
        Namespace::LowStockAlerts,
        Namespace::InventoryValue,
        Namespace::ProductList,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Namespace::SummaryMetrics => "summary_metrics",
            Namespace::StockLevels => "stock_levels",
            Namespace::StockVisualization => "stock_visualization",
            Namespace::CategoryBreakdown => "category_breakdown",
            Namespace::LowStockAlerts => "low_stock_alerts",
            Namespace::InventoryValue => "inventory_value",
            Namespace::ProductList => "product_list",
        }
    }

    /// Looks a namespace up by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == name)
    }

    /// Namespaces whose aggregates go stale when a product is created,
    /// updated or deleted.
    pub fn affected_by_product_change() -> &'static [Namespace] {
        &Self::ALL
    }

    /// Namespaces whose aggregates go stale after a stock movement.
    pub fn affected_by_stock_change() -> &'static [Namespace] {
        &[
            Namespace::SummaryMetrics,
            Namespace::StockLevels,
            Namespace::StockVisualization,
            Namespace::LowStockAlerts,
            Namespace::InventoryValue,
        ]
    }
}

/// An inventory mutation that makes cached aggregates stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataChange {
    /// A product was created, updated or deleted
    Product,
    /// Stock moved in or out
    Stock,
}

impl DataChange {
    /// Namespaces to invalidate after this change.
    pub fn affected_namespaces(self) -> &'static [Namespace] {
        match self {
            DataChange::Product => Namespace::affected_by_product_change(),
            DataChange::Stock => Namespace::affected_by_stock_change(),
        }
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
