//! Customer reviews. Submitted publicly, published after approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::Collection;
use crate::domain::repository::Entity;

/// Stored review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub name: String,
    pub rating: u8,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_id: Option<Uuid>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Review {
    const COLLECTION: Collection = Collection::new("reviews", &[]);
    const LABEL: &'static str = "Review";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input accepted from the storefront.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub name: String,
    pub rating: u8,
    pub description: String,
    pub image: Option<String>,
    pub bike_id: Option<Uuid>,
}

/// Moderation update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    pub approved: Option<bool>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ReviewPatch {
    pub fn apply(self, review: &mut Review) {
        if let Some(approved) = self.approved {
            review.approved = approved;
        }
        if let Some(name) = self.name {
            review.name = name;
        }
        if let Some(description) = self.description {
            review.description = description;
        }
    }
}
