//! Cost rollup over an inspection's checklist, plus read-only quotes.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{round_cents, ProcessingContext, ReportStatus};
use crate::db::{checklist_repo, inspection_repo, tariff_repo, Database, DatabaseError};
use crate::model::{ChecklistEntry, ConditionStatus, CostTariff};

/// One priced checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub room: String,
    pub item: String,
    pub status: ConditionStatus,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CostLine {
    fn new(entry: &ChecklistEntry, cost: f64, tariff: Option<CostTariff>) -> Self {
        let (repair_type, unit, description) = match tariff {
            Some(t) => (Some(t.repair_type), Some(t.unit), t.description),
            None => (None, None, None),
        };
        Self {
            room: entry.room.clone(),
            item: entry.item.clone(),
            status: entry.status,
            cost,
            repair_type,
            unit,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub inspection_id: i64,
    pub region: String,
    pub currency: String,
    pub total_cost: f64,
    pub detailed_costs: Vec<CostLine>,
    /// Number of entries that needed repair.
    pub items_processed: usize,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CostReport {
    fn failed(inspection_id: i64, region: String, currency: String, error: String) -> Self {
        Self {
            inspection_id,
            region,
            currency,
            total_cost: 0.0,
            detailed_costs: Vec::new(),
            items_processed: 0,
            status: ReportStatus::Failed,
            error: Some(error),
        }
    }
}

/// Recomputes every entry's repair estimate and the inspection total.
///
/// Damaged and missing entries take the tariff for (region, item) or the
/// fallback cost; all other entries are reset to 0. Runs in one
/// transaction, so a failure leaves every estimate untouched. `region`
/// defaults to the inspection's own region.
pub fn recalculate_costs(
    ctx: &ProcessingContext,
    inspection_id: i64,
    region: Option<&str>,
) -> CostReport {
    let settings = &ctx.settings;
    let currency = settings.currency.clone();

    let outcome = ctx.db.with_transaction(|tx| {
        let Some(inspection) = inspection_repo::find_by_id_in(tx, inspection_id)? else {
            return Ok(None);
        };
        let region = region
            .map(str::to_string)
            .unwrap_or(inspection.region);

        let mut total = 0.0;
        let mut lines = Vec::new();
        for entry in checklist_repo::list_for_inspection_in(tx, inspection_id)? {
            if !entry.status.needs_repair() {
                checklist_repo::set_repair_cost_in(tx, entry.id, 0.0)?;
                continue;
            }

            let tariff = tariff_repo::find_in(tx, &region, &entry.item)?;
            let cost = round_cents(
                tariff
                    .as_ref()
                    .map(|t| t.cost_per_unit)
                    .unwrap_or(settings.fallback_item_cost),
            );
            checklist_repo::set_repair_cost_in(tx, entry.id, cost)?;
            total += cost;
            lines.push(CostLine::new(&entry, cost, tariff));
        }

        let total = round_cents(total);
        inspection_repo::set_total_cost_in(tx, inspection_id, total)?;
        Ok(Some((region, total, lines)))
    });

    let fallback_region = || {
        region
            .map(str::to_string)
            .unwrap_or_else(|| settings.default_region.clone())
    };
    match outcome {
        Ok(Some((region, total_cost, detailed_costs))) => {
            info!(
                "Inspection {} repair estimate: {:.2} {} over {} items",
                inspection_id,
                total_cost,
                currency,
                detailed_costs.len()
            );
            CostReport {
                inspection_id,
                region,
                currency,
                total_cost,
                items_processed: detailed_costs.len(),
                detailed_costs,
                status: ReportStatus::Success,
                error: None,
            }
        }
        Ok(None) => CostReport::failed(
            inspection_id,
            fallback_region(),
            currency,
            crate::error::DomainError::InspectionNotFound(inspection_id).to_string(),
        ),
        Err(e) => {
            warn!("Cost rollup for inspection {} rolled back: {}", inspection_id, e);
            CostReport::failed(inspection_id, fallback_region(), currency, e.to_string())
        }
    }
}

/// An item to quote, independent of any stored inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub room: String,
    pub item: String,
    pub status: ConditionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total_cost: f64,
    pub detailed_costs: Vec<CostLine>,
    pub currency: String,
    pub region: String,
}

/// Read-only quote. Only damaged or missing items with a tariff are priced;
/// nothing is written.
pub fn estimate_costs(
    db: &Database,
    items: &[QuoteItem],
    region: &str,
    currency: &str,
) -> Result<CostEstimate, DatabaseError> {
    db.with_conn(|conn| {
        let mut total = 0.0;
        let mut detailed_costs = Vec::new();
        for quote in items.iter().filter(|q| q.status.needs_repair()) {
            let Some(tariff) = tariff_repo::find_in(conn, region, &quote.item)? else {
                continue;
            };
            let cost = round_cents(tariff.cost_per_unit);
            total += cost;
            detailed_costs.push(CostLine {
                room: quote.room.clone(),
                item: quote.item.clone(),
                status: quote.status,
                cost,
                repair_type: Some(tariff.repair_type),
                unit: Some(tariff.unit),
                description: tariff.description,
            });
        }

        Ok(CostEstimate {
            total_cost: round_cents(total),
            detailed_costs,
            currency: currency.to_string(),
            region: region.to_string(),
        })
    })
}

pub fn tariffs_for_region(db: &Database, region: &str) -> Result<Vec<CostTariff>, DatabaseError> {
    tariff_repo::list_for_region(db, region)
}
