//! Back-office dashboard: inventory, sales and review aggregates.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::listing::SortDirection;
use super::wire_enum::wire_enum;
use crate::domain::analytics::{BikeFinancials, InventoryRow, average_rating, mean, round2};
use crate::domain::ports::{Condition, DocumentStore, Filter};
use crate::domain::repository::Repository;
use crate::domain::{Bike, BikeStatus, Cost, Error, Partner, Review};

/// Months covered by the sales trend, current month included.
pub const TREND_MONTHS: usize = 12;

/// Bike counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub available: u64,
    pub reserved: u64,
    pub sold: u64,
    pub total: u64,
}

/// Approved and pending review counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewCounts {
    pub approved: u64,
    pub pending: u64,
}

/// Sales booked in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    /// `YYYY-MM`.
    pub month: String,
    pub count: u64,
    pub revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub inventory: StatusCounts,
    pub inventory_value: f64,
    pub total_revenue: f64,
    pub total_costs: f64,
    pub total_profit: f64,
    pub average_roi: Option<f64>,
    pub average_days_in_inventory: Option<f64>,
    pub average_rating: Option<f64>,
    pub reviews: ReviewCounts,
    pub partner_count: u64,
    pub monthly_sales: Vec<MonthlySales>,
}

wire_enum! {
    /// Sortable inventory report columns.
    pub enum InventorySort ("inventory sort") {
        Profit => "profit",
        Roi => "roi",
        DaysInInventory => "daysInInventory",
    }
}

/// Inventory report options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub sort: Option<InventorySort>,
    pub order: Option<SortDirection>,
    pub status: Option<BikeStatus>,
}

fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Keys for the last `TREND_MONTHS` months, oldest first.
fn trailing_months(now: DateTime<Utc>) -> Vec<String> {
    let (mut year, mut month) = (now.year(), now.month());
    let mut keys = Vec::with_capacity(TREND_MONTHS);
    for _ in 0..TREND_MONTHS {
        keys.push(format!("{year:04}-{month:02}"));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    keys.reverse();
    keys
}

/// Orders present values by `direction`; missing values always sort last.
fn compare_optional(left: Option<f64>, right: Option<f64>, direction: SortDirection) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    bikes: Repository<Bike>,
    costs: Repository<Cost>,
    reviews: Repository<Review>,
    partners: Repository<Partner>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bikes: Repository::new(Arc::clone(&store)),
            costs: Repository::new(Arc::clone(&store)),
            reviews: Repository::new(Arc::clone(&store)),
            partners: Repository::new(store),
            clock,
        }
    }

    async fn financials(
        &self,
        filter: &Filter,
    ) -> Result<(Vec<(Bike, BikeFinancials)>, Vec<Cost>), Error> {
        let bikes = self.bikes.all(filter).await?;
        let costs = self.costs.all(&Filter::new()).await?;
        let now = self.clock.utc();
        let rows = bikes
            .into_iter()
            .map(|bike| {
                let financials = BikeFinancials::compute(&bike, &costs, now);
                (bike, financials)
            })
            .collect();
        Ok((rows, costs))
    }

    pub async fn summary(&self) -> Result<DashboardSummary, Error> {
        let now = self.clock.utc();
        let (rows, costs) = self.financials(&Filter::new()).await?;
        let total_costs = round2(costs.iter().map(|cost| cost.amount).sum());
        let reviews = self.reviews.all(&Filter::new()).await?;
        let partner_count = self.partners.count(&Filter::new()).await?;

        let mut inventory = StatusCounts::default();
        let mut inventory_value = 0.0;
        let mut total_revenue = 0.0;
        let mut total_profit = 0.0;
        let mut rois = Vec::new();
        let mut days = Vec::new();
        let mut months: BTreeMap<String, MonthlySales> = trailing_months(now)
            .into_iter()
            .map(|month| {
                let entry = MonthlySales {
                    month: month.clone(),
                    count: 0,
                    revenue: 0.0,
                    profit: 0.0,
                };
                (month, entry)
            })
            .collect();

        for (bike, financials) in &rows {
            inventory.total += 1;
            match bike.status {
                BikeStatus::Available => inventory.available += 1,
                BikeStatus::Reserved => inventory.reserved += 1,
                BikeStatus::Sold => inventory.sold += 1,
            }
            if bike.status != BikeStatus::Sold {
                inventory_value += bike.asking_price;
                continue;
            }
            let revenue = bike.sale_price.unwrap_or_default();
            let profit = financials.profit.unwrap_or_default();
            total_revenue += revenue;
            total_profit += profit;
            rois.extend(financials.roi);
            #[expect(clippy::cast_precision_loss, reason = "day counts are small")]
            days.push(financials.days_in_inventory as f64);
            if let Some(entry) = bike.sold_at.and_then(|at| months.get_mut(&month_key(at))) {
                entry.count += 1;
                entry.revenue = round2(entry.revenue + revenue);
                entry.profit = round2(entry.profit + profit);
            }
        }

        let approved = reviews.iter().filter(|review| review.approved).count() as u64;
        Ok(DashboardSummary {
            inventory,
            inventory_value: round2(inventory_value),
            total_revenue: round2(total_revenue),
            total_costs,
            total_profit: round2(total_profit),
            average_roi: mean(&rois),
            average_days_in_inventory: mean(&days),
            average_rating: average_rating(&reviews),
            reviews: ReviewCounts {
                approved,
                pending: reviews.len() as u64 - approved,
            },
            partner_count,
            monthly_sales: months.into_values().collect(),
        })
    }

    /// Per-bike financial rows. Unsorted unless `sort` is given; bikes
    /// without a value for the sort column come last.
    pub async fn inventory(&self, query: InventoryQuery) -> Result<Vec<InventoryRow>, Error> {
        let filter = match query.status {
            Some(status) => Filter::new().with("status", Condition::Equals(json!(status))),
            None => Filter::new(),
        };
        let (financials, _) = self.financials(&filter).await?;
        let mut rows: Vec<InventoryRow> = financials
            .iter()
            .map(|(bike, financials)| InventoryRow::new(bike, *financials))
            .collect();
        if let Some(sort) = query.sort {
            let direction = query.order.unwrap_or(SortDirection::Desc);
            #[expect(clippy::cast_precision_loss, reason = "day counts are small")]
            let key = move |row: &InventoryRow| match sort {
                InventorySort::Profit => row.financials.profit,
                InventorySort::Roi => row.financials.roi,
                InventorySort::DaysInInventory => Some(row.financials.days_in_inventory as f64),
            };
            rows.sort_by(|left, right| compare_optional(key(left), key(right), direction));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn trailing_months_wrap_the_year() {
        let now = Utc
            .with_ymd_and_hms(2024, 3, 15, 0, 0, 0)
            .single()
            .expect("fixture timestamp");
        let months = trailing_months(now);
        assert_eq!(months.len(), TREND_MONTHS);
        assert_eq!(months.first().map(String::as_str), Some("2023-04"));
        assert_eq!(months.last().map(String::as_str), Some("2024-03"));
    }

    #[rstest]
    #[case(Some(1.0), Some(2.0), SortDirection::Desc, Ordering::Greater)]
    #[case(Some(1.0), Some(2.0), SortDirection::Asc, Ordering::Less)]
    #[case(None, Some(2.0), SortDirection::Asc, Ordering::Greater)]
    #[case(None, Some(2.0), SortDirection::Desc, Ordering::Greater)]
    fn missing_values_sort_last(
        #[case] left: Option<f64>,
        #[case] right: Option<f64>,
        #[case] direction: SortDirection,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_optional(left, right, direction), expected);
    }
}
