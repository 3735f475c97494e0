//! Motorcycle inventory records and their public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::apply_fields;
use super::wire_enum::wire_enum;
use crate::domain::ports::Collection;
use crate::domain::repository::Entity;

wire_enum! {
    /// Physical condition of a bike.
    pub enum BikeCondition ("condition") {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Project => "project",
    }
}

wire_enum! {
    /// Sales status of a bike.
    pub enum BikeStatus ("status") {
        Available => "available",
        Reserved => "reserved",
        Sold => "sold",
    }
}

impl BikeStatus {
    /// Statuses anonymous visitors may see.
    pub const PUBLIC: &'static [Self] = &[Self::Available, Self::Reserved];
}

/// Stored bike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    /// Unique when present.
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub engine_cc: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    pub condition: BikeCondition,
    pub purchase_price: f64,
    pub asking_price: f64,
    pub status: BikeStatus,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    pub acquired_at: DateTime<Utc>,
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Bike {
    const COLLECTION: Collection = Collection::new("bikes", &["vin"]);
    const LABEL: &'static str = "Bike";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Bike {
    /// Mark the bike sold.
    pub fn mark_sold(&mut self, sold_at: DateTime<Utc>, sale_price: f64) {
        self.status = BikeStatus::Sold;
        self.sold_at = Some(sold_at);
        self.sale_price = Some(sale_price);
    }
}

/// Storefront projection: no acquisition or sale financials.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBike {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_cc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub condition: BikeCondition,
    pub asking_price: f64,
    pub status: BikeStatus,
    pub description: String,
    pub images: Vec<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Bike> for PublicBike {
    fn from(bike: Bike) -> Self {
        Self {
            id: bike.id,
            make: bike.make,
            model: bike.model,
            year: bike.year,
            mileage: bike.mileage,
            engine_cc: bike.engine_cc,
            color: bike.color,
            condition: bike.condition,
            asking_price: bike.asking_price,
            status: bike.status,
            description: bike.description,
            images: bike.images,
            featured: bike.featured,
            created_at: bike.created_at,
        }
    }
}

/// Input for adding a bike to inventory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBike {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    pub vin: Option<String>,
    pub engine_cc: Option<u32>,
    pub color: Option<String>,
    pub condition: BikeCondition,
    pub purchase_price: f64,
    pub asking_price: f64,
    pub status: Option<BikeStatus>,
    pub partner_id: Option<Uuid>,
    pub acquired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update of a bike. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikePatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<u32>,
    pub vin: Option<String>,
    pub engine_cc: Option<u32>,
    pub color: Option<String>,
    pub condition: Option<BikeCondition>,
    pub purchase_price: Option<f64>,
    pub asking_price: Option<f64>,
    pub status: Option<BikeStatus>,
    pub partner_id: Option<Uuid>,
    pub acquired_at: Option<DateTime<Utc>>,
    pub sold_at: Option<DateTime<Utc>>,
    pub sale_price: Option<f64>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl BikePatch {
    /// Apply the patch to `bike`.
    pub fn apply(self, bike: &mut Bike) {
        apply_fields!(bike, self;
            make, model, year, mileage, condition, purchase_price, asking_price, status,
            acquired_at, description, images, featured;
            vin, engine_cc, color, partner_id, sold_at, sale_price);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn bike() -> Bike {
        let at = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .expect("fixture timestamp")
            .with_timezone(&Utc);
        Bike {
            id: Uuid::nil(),
            make: "Triumph".into(),
            model: "Bonneville".into(),
            year: 2016,
            mileage: 12_000,
            vin: Some("SMTD10GN3GT123456".into()),
            engine_cc: Some(1200),
            color: None,
            condition: BikeCondition::Good,
            purchase_price: 6_000.0,
            asking_price: 7_500.0,
            status: BikeStatus::Available,
            partner_id: None,
            acquired_at: at,
            sold_at: None,
            sale_price: None,
            description: String::new(),
            images: vec![],
            featured: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    fn public_projection_hides_purchase_price(bike: Bike) {
        let value = serde_json::to_value(PublicBike::from(bike)).expect("serialise");
        assert!(value.get("purchasePrice").is_none());
        assert!(value.get("salePrice").is_none());
        assert!(value.get("vin").is_none());
        assert_eq!(value["askingPrice"], serde_json::json!(7_500.0));
    }

    #[rstest]
    fn patch_only_touches_present_fields(mut bike: Bike) {
        let patch = BikePatch {
            asking_price: Some(7_000.0),
            color: Some("green".into()),
            ..BikePatch::default()
        };
        patch.apply(&mut bike);
        assert_eq!(bike.asking_price, 7_000.0);
        assert_eq!(bike.color.as_deref(), Some("green"));
        assert_eq!(bike.make, "Triumph");
        assert_eq!(bike.vin.as_deref(), Some("SMTD10GN3GT123456"));
    }

    #[rstest]
    fn mark_sold_sets_sale_fields(mut bike: Bike) {
        let at = bike.acquired_at;
        bike.mark_sold(at, 8_000.0);
        assert_eq!(bike.status, BikeStatus::Sold);
        assert_eq!(bike.sold_at, Some(at));
        assert_eq!(bike.sale_price, Some(8_000.0));
    }
}
