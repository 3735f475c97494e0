//! Derived financial figures for bikes and reviews.
//!
//! - `totalCosts = Σ cost.amount`
//! - `profit = salePrice − purchasePrice − totalCosts`, sold bikes only
//! - `roi = profit / (purchasePrice + totalCosts) × 100`, two decimals,
//!   `None` when unsold or the denominator is zero
//! - `daysInInventory = floor((soldAt or now) − acquiredAt)`, never negative
//! - `averageRating` over approved reviews, two decimals

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Bike, BikeStatus, Cost, Review};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole days from `from` to `to`, clamped at zero.
pub fn whole_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(0)
}

/// Financial summary of one bike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeFinancials {
    pub total_costs: f64,
    pub profit: Option<f64>,
    pub roi: Option<f64>,
    pub days_in_inventory: i64,
}

impl BikeFinancials {
    /// Compute figures for `bike` from the costs recorded against it.
    ///
    /// Costs for other bikes are ignored.
    ///
    /// # Examples
    /// ```
    /// # use marketplace::domain::analytics::BikeFinancials;
    /// # use marketplace::domain::{Bike, BikeCondition, BikeStatus};
    /// # use chrono::{TimeZone, Utc};
    /// # use uuid::Uuid;
    /// # let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// # let mut bike = Bike {
    /// #     id: Uuid::nil(), make: "Honda".into(), model: "CB500".into(), year: 2019,
    /// #     mileage: 1, vin: None, engine_cc: None, color: None,
    /// #     condition: BikeCondition::Good, purchase_price: 1000.0, asking_price: 1500.0,
    /// #     status: BikeStatus::Available, partner_id: None, acquired_at: at, sold_at: None,
    /// #     sale_price: None, description: String::new(), images: vec![], featured: false,
    /// #     created_at: at, updated_at: at,
    /// # };
    /// bike.mark_sold(at + chrono::Duration::days(10), 1500.0);
    /// let figures = BikeFinancials::compute(&bike, &[], at);
    /// assert_eq!(figures.profit, Some(500.0));
    /// assert_eq!(figures.roi, Some(50.0));
    /// assert_eq!(figures.days_in_inventory, 10);
    /// ```
    pub fn compute(bike: &Bike, costs: &[Cost], now: DateTime<Utc>) -> Self {
        let total_costs: f64 = costs
            .iter()
            .filter(|cost| cost.bike_id == bike.id)
            .map(|cost| cost.amount)
            .sum();
        let total_costs = round2(total_costs);

        let profit = match (bike.status, bike.sale_price) {
            (BikeStatus::Sold, Some(sale_price)) => {
                Some(round2(sale_price - bike.purchase_price - total_costs))
            }
            _ => None,
        };
        let invested = bike.purchase_price + total_costs;
        let roi = profit
            .filter(|_| invested != 0.0)
            .map(|profit| round2(profit / invested * 100.0));

        let end = bike.sold_at.unwrap_or(now);
        Self {
            total_costs,
            profit,
            roi,
            days_in_inventory: whole_days(bike.acquired_at, end),
        }
    }
}

/// One row of the inventory report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub bike_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: BikeStatus,
    pub purchase_price: f64,
    pub asking_price: f64,
    pub sale_price: Option<f64>,
    #[serde(flatten)]
    pub financials: BikeFinancials,
}

impl InventoryRow {
    pub fn new(bike: &Bike, financials: BikeFinancials) -> Self {
        Self {
            bike_id: bike.id,
            make: bike.make.clone(),
            model: bike.model.clone(),
            year: bike.year,
            status: bike.status,
            purchase_price: bike.purchase_price,
            asking_price: bike.asking_price,
            sale_price: bike.sale_price,
            financials,
        }
    }
}

/// Mean rating across approved reviews, two decimals.
pub fn average_rating<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Option<f64> {
    let (sum, count) = reviews
        .into_iter()
        .filter(|review| review.approved)
        .fold((0_u64, 0_u64), |(sum, count), review| {
            (sum + u64::from(review.rating), count + 1)
        });
    #[expect(clippy::cast_precision_loss, reason = "review counts are small")]
    let mean = (count > 0).then(|| sum as f64 / count as f64);
    mean.map(round2)
}

/// Mean of `values`, two decimals; `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
    let count = values.len() as f64;
    Some(round2(values.iter().sum::<f64>() / count))
}
