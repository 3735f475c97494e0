//! Cost bookkeeping against inventory bikes.

use std::sync::Arc;

use mockable::Clock;
use pagination::Paginated;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, find_page};
use crate::domain::ports::{Condition, DocumentStore, Filter, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{Bike, Cost, CostCategory, CostPatch, Error, NewCost, Partner};

/// Cost listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub bike_id: Option<Uuid>,
    pub category: Option<CostCategory>,
}

impl CostQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(bike_id) = self.bike_id {
            filter = filter.with("bikeId", Condition::Equals(json!(bike_id)));
        }
        if let Some(category) = self.category {
            filter = filter.with("category", Condition::Equals(json!(category)));
        }
        filter
    }
}

#[derive(Clone)]
pub struct CostService {
    costs: Repository<Cost>,
    bikes: Repository<Bike>,
    partners: Repository<Partner>,
    clock: Arc<dyn Clock>,
}

impl CostService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            costs: Repository::new(Arc::clone(&store)),
            bikes: Repository::new(Arc::clone(&store)),
            partners: Repository::new(store),
            clock,
        }
    }

    /// Costs, most recent first.
    pub async fn list(&self, query: CostQuery) -> Result<Paginated<Cost>, Error> {
        let request = query.page.request(ADMIN_PAGE_LIMITS)?;
        find_page(&self.costs, &query.filter(), ("incurredAt", SortOrder::Desc), request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Cost, Error> {
        self.costs.require(id).await
    }

    /// Record a cost. The bike, and the partner when given, must exist.
    pub async fn create(&self, input: NewCost) -> Result<Cost, Error> {
        self.bikes.require(input.bike_id).await?;
        if let Some(partner_id) = input.partner_id {
            self.partners.require(partner_id).await?;
        }
        let now = self.clock.utc();
        let cost = Cost {
            id: Uuid::new_v4(),
            bike_id: input.bike_id,
            category: input.category,
            amount: input.amount,
            description: input.description,
            partner_id: input.partner_id,
            incurred_at: input.incurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        self.costs.insert(&cost).await?;
        Ok(cost)
    }

    pub async fn update(&self, id: Uuid, patch: CostPatch) -> Result<Cost, Error> {
        let mut cost = self.costs.require(id).await?;
        if let Some(partner_id) = patch.partner_id {
            self.partners.require(partner_id).await?;
        }
        patch.apply(&mut cost);
        cost.updated_at = self.clock.utc();
        self.costs.replace(&cost).await?;
        Ok(cost)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        self.costs.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{BikeService, ErrorKind};
    use crate::outbound::persistence::MemoryDocumentStore;
    use crate::test_support::{MutableClock, new_bike};
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    struct Books {
        costs: CostService,
        bikes: BikeService,
        clock: Arc<MutableClock>,
    }

    #[fixture]
    fn books() -> Books {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(MutableClock::at_test_epoch());
        Books {
            costs: CostService::new(Arc::clone(&store), clock.clone()),
            bikes: BikeService::new(store, clock.clone()),
            clock,
        }
    }

    async fn stock(books: &Books, model: &str) -> Uuid {
        books.bikes.create(new_bike(model)).await.expect("stock bike").id
    }

    fn new_cost(bike_id: Uuid, category: CostCategory, amount: f64) -> NewCost {
        NewCost {
            bike_id,
            category,
            amount,
            description: String::new(),
            partner_id: None,
            incurred_at: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn cost_for_a_missing_bike_is_not_found(books: Books) {
        let err = books
            .costs
            .create(new_cost(Uuid::new_v4(), CostCategory::Repair, 120.0))
            .await
            .expect_err("bike does not exist");

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Bike not found");
        let listed = books.costs.list(CostQuery::default()).await.expect("list");
        assert!(listed.items.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn cost_with_a_missing_partner_is_not_found(books: Books) {
        let bike_id = stock(&books, "CB650R").await;
        let mut input = new_cost(bike_id, CostCategory::Parts, 80.0);
        input.partner_id = Some(Uuid::new_v4());

        let err = books.costs.create(input).await.expect_err("partner does not exist");

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn list_filters_by_bike_and_category_newest_first(books: Books) {
        let first = stock(&books, "CB650R").await;
        let second = stock(&books, "Africa Twin").await;
        for (bike_id, category, amount) in [
            (first, CostCategory::Repair, 100.0),
            (first, CostCategory::Parts, 40.0),
            (first, CostCategory::Repair, 60.0),
            (second, CostCategory::Repair, 500.0),
        ] {
            books
                .costs
                .create(new_cost(bike_id, category, amount))
                .await
                .expect("record cost");
            books.clock.advance(TimeDelta::hours(1));
        }

        let page = books
            .costs
            .list(CostQuery {
                bike_id: Some(first),
                category: Some(CostCategory::Repair),
                ..CostQuery::default()
            })
            .await
            .expect("list costs");

        let amounts: Vec<f64> = page.items.iter().map(|cost| cost.amount).collect();
        assert_eq!(amounts, [60.0, 100.0]);
    }
}
