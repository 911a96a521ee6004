use serde::{Deserialize, Serialize};

/// A repair price for one item type in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTariff {
    pub region: String,
    /// Lower-cased item name, matched against checklist items.
    pub item_type: String,
    pub repair_type: String,
    /// Unit of measure, e.g. `unit` or `m2`.
    pub unit: String,
    pub cost_per_unit: f64,
    pub description: Option<String>,
}
