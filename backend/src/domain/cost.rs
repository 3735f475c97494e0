//! Costs incurred on a bike between acquisition and sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::apply_fields;
use super::wire_enum::wire_enum;
use crate::domain::ports::Collection;
use crate::domain::repository::Entity;

wire_enum! {
    /// Accounting category of a cost.
    pub enum CostCategory ("cost category") {
        Repair => "repair",
        Parts => "parts",
        Transport => "transport",
        Registration => "registration",
        Cleaning => "cleaning",
        Other => "other",
    }
}

/// Stored cost line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: Uuid,
    pub bike_id: Uuid,
    pub category: CostCategory,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    pub incurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Cost {
    const COLLECTION: Collection = Collection::new("costs", &[]);
    const LABEL: &'static str = "Cost";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for recording a cost.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCost {
    pub bike_id: Uuid,
    pub category: CostCategory,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub partner_id: Option<Uuid>,
    pub incurred_at: Option<DateTime<Utc>>,
}

/// Partial update of a cost. The owning bike cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPatch {
    pub category: Option<CostCategory>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub partner_id: Option<Uuid>,
    pub incurred_at: Option<DateTime<Utc>>,
}

impl CostPatch {
    pub fn apply(self, cost: &mut Cost) {
        apply_fields!(cost, self; category, amount, description, incurred_at; partner_id);
    }
}
