//! Review submission, publication and moderation.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageLimits, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, find_page};
use crate::domain::analytics::average_rating;
use crate::domain::ports::{Condition, DocumentStore, Filter, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{Bike, Error, NewReview, Review, ReviewPatch};

/// Page sizes for the public review wall.
pub const REVIEW_PAGE_LIMITS: PageLimits = PageLimits::new(10, 50);

/// Moderation listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub approved: Option<bool>,
}

/// Published reviews with summary figures over every approved review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedReviews {
    #[serde(flatten)]
    pub page: Paginated<Review>,
    pub average_rating: Option<f64>,
    pub count: u64,
}

fn approved() -> Filter {
    Filter::new().with("approved", Condition::Equals(Value::Bool(true)))
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Repository<Review>,
    bikes: Repository<Bike>,
    clock: Arc<dyn Clock>,
    page_limits: PageLimits,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reviews: Repository::new(Arc::clone(&store)),
            bikes: Repository::new(store),
            clock,
            page_limits: REVIEW_PAGE_LIMITS,
        }
    }

    /// Override the default public page size.
    #[must_use]
    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page_limits = limits;
        self
    }

    /// Approved reviews, newest first.
    pub async fn published(&self, page: PageQuery) -> Result<PublishedReviews, Error> {
        let request = page.request(self.page_limits)?;
        let filter = approved();
        let page = find_page(&self.reviews, &filter, ("createdAt", SortOrder::Desc), request).await?;
        let all = self.reviews.all(&filter).await?;
        Ok(PublishedReviews {
            average_rating: average_rating(&all),
            count: page.pagination.total,
            page,
        })
    }

    /// Store a storefront submission awaiting moderation.
    pub async fn submit(&self, input: NewReview) -> Result<Review, Error> {
        if let Some(bike_id) = input.bike_id {
            self.bikes.require(bike_id).await?;
        }
        let now = self.clock.utc();
        let review = Review {
            id: Uuid::new_v4(),
            name: input.name,
            rating: input.rating,
            description: input.description,
            image: input.image,
            bike_id: input.bike_id,
            approved: false,
            created_at: now,
            updated_at: now,
        };
        self.reviews.insert(&review).await?;
        info!(review_id = %review.id, rating = review.rating, "review submitted");
        Ok(review)
    }

    pub async fn list(&self, query: ReviewQuery) -> Result<Paginated<Review>, Error> {
        let request = query.page.request(ADMIN_PAGE_LIMITS)?;
        let filter = match query.approved {
            Some(flag) => Filter::new().with("approved", Condition::Equals(Value::Bool(flag))),
            None => Filter::new(),
        };
        find_page(&self.reviews, &filter, ("createdAt", SortOrder::Desc), request).await
    }

    pub async fn update(&self, id: Uuid, patch: ReviewPatch) -> Result<Review, Error> {
        let mut review = self.reviews.require(id).await?;
        patch.apply(&mut review);
        review.updated_at = self.clock.utc();
        self.reviews.replace(&review).await?;
        Ok(review)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        self.reviews.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorKind;
    use crate::outbound::persistence::MemoryDocumentStore;
    use crate::test_support::MutableClock;
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    struct Wall {
        reviews: ReviewService,
        clock: Arc<MutableClock>,
    }

    #[fixture]
    fn wall() -> Wall {
        let clock = Arc::new(MutableClock::at_test_epoch());
        Wall {
            reviews: ReviewService::new(Arc::new(MemoryDocumentStore::new()), clock.clone())
                .with_page_limits(PageLimits::new(2, 50)),
            clock,
        }
    }

    fn new_review(name: &str, rating: u8) -> NewReview {
        NewReview {
            name: name.to_owned(),
            rating,
            description: "Bought a bike, all good.".to_owned(),
            image: None,
            bike_id: None,
        }
    }

    async fn post(wall: &Wall, name: &str, rating: u8, approve: bool) -> Review {
        let review = wall.reviews.submit(new_review(name, rating)).await.expect("submit");
        wall.clock.advance(TimeDelta::minutes(5));
        if !approve {
            return review;
        }
        wall.reviews
            .update(
                review.id,
                ReviewPatch {
                    approved: Some(true),
                    ..ReviewPatch::default()
                },
            )
            .await
            .expect("approve")
    }

    #[rstest]
    #[tokio::test]
    async fn submissions_await_moderation(wall: Wall) {
        let review = wall.reviews.submit(new_review("Sam", 5)).await.expect("submit");

        assert!(!review.approved);
        let published = wall.reviews.published(PageQuery::default()).await.expect("published");
        assert_eq!(published.count, 0);
        assert_eq!(published.average_rating, None);
    }

    #[rstest]
    #[tokio::test]
    async fn review_for_an_unknown_bike_is_not_found(wall: Wall) {
        let mut input = new_review("Sam", 4);
        input.bike_id = Some(Uuid::new_v4());

        let err = wall.reviews.submit(input).await.expect_err("unknown bike");

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn average_covers_every_approved_review_not_just_the_page(wall: Wall) {
        post(&wall, "Ana", 5, true).await;
        post(&wall, "Ben", 4, true).await;
        post(&wall, "Cy", 2, true).await;
        post(&wall, "Dee", 1, false).await;

        let published = wall.reviews.published(PageQuery::default()).await.expect("published");

        let names: Vec<&str> = published.page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Cy", "Ben"]);
        assert_eq!(published.count, 3);
        assert_eq!(published.average_rating, Some(3.67));
    }

    #[rstest]
    #[case(Some(true), 2)]
    #[case(Some(false), 1)]
    #[case(None, 3)]
    #[tokio::test]
    async fn moderation_list_filters_by_approval(
        wall: Wall,
        #[case] approved: Option<bool>,
        #[case] expected: u64,
    ) {
        post(&wall, "Ana", 5, true).await;
        post(&wall, "Ben", 4, true).await;
        post(&wall, "Cy", 3, false).await;

        let page = wall
            .reviews
            .list(ReviewQuery {
                approved,
                ..ReviewQuery::default()
            })
            .await
            .expect("moderation list");

        assert_eq!(page.pagination.total, expected);
    }
}
