//! Business partners: dealers, suppliers, mechanics and transporters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::apply_fields;
use super::wire_enum::wire_enum;
use crate::domain::ports::Collection;
use crate::domain::repository::Entity;

wire_enum! {
    /// What a partner does for the business.
    pub enum PartnerKind ("partner kind") {
        Dealer => "dealer",
        Supplier => "supplier",
        Mechanic => "mechanic",
        Transport => "transport",
        Other => "other",
    }
}

/// Stored partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub kind: PartnerKind,
    /// Unique when present.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Partner {
    const COLLECTION: Collection = Collection::new("partners", &["email"]);
    const LABEL: &'static str = "Partner";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for creating a partner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPartner {
    pub name: String,
    pub kind: PartnerKind,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial update of a partner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPatch {
    pub name: Option<String>,
    pub kind: Option<PartnerKind>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

impl PartnerPatch {
    pub fn apply(self, partner: &mut Partner) {
        apply_fields!(partner, self; name, kind, is_active; email, phone, notes);
    }
}
