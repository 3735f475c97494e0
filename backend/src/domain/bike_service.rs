//! Inventory use-cases: storefront browsing and back-office bike management.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageLimits, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, SortDirection, find_page};
use super::wire_enum::wire_enum;
use crate::domain::analytics::BikeFinancials;
use crate::domain::ports::{Condition, DocumentStore, Filter, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{
    Bike, BikeCondition, BikePatch, BikeStatus, Cost, Error, Identity, NewBike, Partner,
    PublicBike,
};

/// Storefront page sizes.
pub const STOREFRONT_PAGE_LIMITS: PageLimits = PageLimits::new(12, 100);

wire_enum! {
    /// Sortable bike fields.
    pub enum BikeSort ("bike sort") {
        CreatedAt => "createdAt",
        AskingPrice => "askingPrice",
        Year => "year",
        Mileage => "mileage",
    }
}

/// Listing filters shared by the storefront and the back office.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub sort: Option<BikeSort>,
    pub order: Option<SortDirection>,
    pub make: Option<String>,
    pub condition: Option<BikeCondition>,
    pub status: Option<BikeStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl BikeQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(make) = self.make.as_deref().filter(|make| !make.trim().is_empty()) {
            filter = filter.with("make", Condition::ContainsText(make.trim().to_owned()));
        }
        if let Some(condition) = self.condition {
            filter = filter.with("condition", Condition::Equals(json!(condition)));
        }
        if let Some(status) = self.status {
            filter = filter.with("status", Condition::Equals(json!(status)));
        }
        if let Some(min) = self.min_price {
            filter = filter.with("askingPrice", Condition::AtLeast(json!(min)));
        }
        if let Some(max) = self.max_price {
            filter = filter.with("askingPrice", Condition::AtMost(json!(max)));
        }
        if let Some(min) = self.min_year {
            filter = filter.with("year", Condition::AtLeast(json!(min)));
        }
        if let Some(max) = self.max_year {
            filter = filter.with("year", Condition::AtMost(json!(max)));
        }
        if let Some(featured) = self.featured {
            filter = filter.with("featured", Condition::Equals(Value::Bool(featured)));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.with_any(
                ["make", "model", "description"]
                    .map(|field| (field, Condition::ContainsText(search.to_owned()))),
            );
        }
        filter
    }

    fn sort(&self) -> (&'static str, SortOrder) {
        let field = self.sort.unwrap_or(BikeSort::CreatedAt).as_str();
        let order = self.order.unwrap_or(SortDirection::Desc).into();
        (field, order)
    }
}

/// Back-office bike detail: the record, its financials and its costs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeDetail {
    #[serde(flatten)]
    pub bike: Bike,
    pub financials: BikeFinancials,
    pub costs: Vec<Cost>,
}

/// Inventory service.
#[derive(Clone)]
pub struct BikeService {
    bikes: Repository<Bike>,
    costs: Repository<Cost>,
    partners: Repository<Partner>,
    clock: Arc<dyn Clock>,
}

impl BikeService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bikes: Repository::new(Arc::clone(&store)),
            costs: Repository::new(Arc::clone(&store)),
            partners: Repository::new(store),
            clock,
        }
    }

    /// Storefront listing. Anonymous callers only see public statuses and
    /// cannot filter by status.
    pub async fn list_public(
        &self,
        mut query: BikeQuery,
        viewer: Option<&Identity>,
    ) -> Result<Paginated<PublicBike>, Error> {
        let request = query.page.request(STOREFRONT_PAGE_LIMITS)?;
        if viewer.is_none() {
            query.status = None;
        }
        let mut filter = query.filter();
        if viewer.is_none() {
            let visible = BikeStatus::PUBLIC.iter().map(|status| json!(status)).collect();
            filter = filter.with("status", Condition::OneOf(visible));
        }
        let page = find_page(&self.bikes, &filter, query.sort(), request).await?;
        Ok(page.map(PublicBike::from))
    }

    /// Storefront detail. Sold bikes are hidden from anonymous callers.
    pub async fn get_public(&self, id: Uuid, viewer: Option<&Identity>) -> Result<PublicBike, Error> {
        let bike = self.bikes.require(id).await?;
        if viewer.is_none() && !BikeStatus::PUBLIC.contains(&bike.status) {
            return Err(Error::not_found("Bike not found"));
        }
        Ok(bike.into())
    }

    /// Back-office listing with every field.
    pub async fn list(&self, query: BikeQuery) -> Result<Paginated<Bike>, Error> {
        let request = query.page.request(ADMIN_PAGE_LIMITS)?;
        find_page(&self.bikes, &query.filter(), query.sort(), request).await
    }

    /// Back-office detail including financials.
    pub async fn detail(&self, id: Uuid) -> Result<BikeDetail, Error> {
        let bike = self.bikes.require(id).await?;
        let costs = self.costs.all(&Filter::eq("bikeId", id.to_string())).await?;
        let financials = BikeFinancials::compute(&bike, &costs, self.clock.utc());
        Ok(BikeDetail {
            bike,
            financials,
            costs,
        })
    }

    pub async fn create(&self, input: NewBike) -> Result<Bike, Error> {
        if let Some(partner_id) = input.partner_id {
            self.partners.require(partner_id).await?;
        }
        let now = self.clock.utc();
        let bike = Bike {
            id: Uuid::new_v4(),
            make: input.make,
            model: input.model,
            year: input.year,
            mileage: input.mileage,
            vin: input.vin.map(|vin| vin.to_uppercase()),
            engine_cc: input.engine_cc,
            color: input.color,
            condition: input.condition,
            purchase_price: input.purchase_price,
            asking_price: input.asking_price,
            status: input.status.unwrap_or(BikeStatus::Available),
            partner_id: input.partner_id,
            acquired_at: input.acquired_at.unwrap_or(now),
            sold_at: None,
            sale_price: None,
            description: input.description,
            images: input.images,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        };
        self.bikes.insert(&bike).await?;
        info!(bike_id = %bike.id, "bike added to inventory");
        Ok(bike)
    }

    pub async fn update(&self, id: Uuid, mut patch: BikePatch) -> Result<Bike, Error> {
        let mut bike = self.bikes.require(id).await?;
        if let Some(partner_id) = patch.partner_id {
            self.partners.require(partner_id).await?;
        }
        patch.vin = patch.vin.map(|vin| vin.to_uppercase());
        patch.apply(&mut bike);
        bike.updated_at = self.clock.utc();
        self.bikes.replace(&bike).await?;
        Ok(bike)
    }

    /// Remove a bike and every cost recorded against it.
    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        self.bikes.require(id).await?;
        let removed_costs = self
            .costs
            .delete_where(&Filter::eq("bikeId", id.to_string()))
            .await?;
        self.bikes.delete(id).await?;
        info!(bike_id = %id, removed_costs, "bike removed from inventory");
        Ok(())
    }
}
