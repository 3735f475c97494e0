//! Purchase and sale bookkeeping. A completed sale marks its bike sold.

use std::sync::Arc;

use mockable::Clock;
use pagination::Paginated;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, find_page};
use crate::domain::ports::{Condition, DocumentStore, Filter, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{
    Bike, Error, NewTransaction, Partner, Transaction, TransactionKind, TransactionPatch,
    TransactionStatus,
};

/// Transaction listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub bike_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
}

impl TransactionQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(bike_id) = self.bike_id {
            filter = filter.with("bikeId", Condition::Equals(json!(bike_id)));
        }
        if let Some(kind) = self.kind {
            filter = filter.with("kind", Condition::Equals(json!(kind)));
        }
        if let Some(status) = self.status {
            filter = filter.with("status", Condition::Equals(json!(status)));
        }
        filter
    }
}

#[derive(Clone)]
pub struct TransactionService {
    transactions: Repository<Transaction>,
    bikes: Repository<Bike>,
    partners: Repository<Partner>,
    clock: Arc<dyn Clock>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transactions: Repository::new(Arc::clone(&store)),
            bikes: Repository::new(Arc::clone(&store)),
            partners: Repository::new(store),
            clock,
        }
    }

    /// Transactions, most recent first.
    pub async fn list(&self, query: TransactionQuery) -> Result<Paginated<Transaction>, Error> {
        let request = query.page.request(ADMIN_PAGE_LIMITS)?;
        find_page(
            &self.transactions,
            &query.filter(),
            ("occurredAt", SortOrder::Desc),
            request,
        )
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Transaction, Error> {
        self.transactions.require(id).await
    }

    pub async fn create(&self, input: NewTransaction) -> Result<Transaction, Error> {
        let bike = self.bikes.require(input.bike_id).await?;
        if let Some(partner_id) = input.partner_id {
            self.partners.require(partner_id).await?;
        }
        let now = self.clock.utc();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            bike_id: input.bike_id,
            kind: input.kind,
            amount: input.amount,
            partner_id: input.partner_id,
            counterparty: input.counterparty,
            payment_method: input.payment_method,
            status: input.status.unwrap_or(TransactionStatus::Completed),
            occurred_at: input.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        self.transactions.insert(&transaction).await?;
        self.settle_sale(bike, &transaction).await?;
        Ok(transaction)
    }

    pub async fn update(&self, id: Uuid, patch: TransactionPatch) -> Result<Transaction, Error> {
        let mut transaction = self.transactions.require(id).await?;
        if let Some(partner_id) = patch.partner_id {
            self.partners.require(partner_id).await?;
        }
        patch.apply(&mut transaction);
        transaction.updated_at = self.clock.utc();
        // A completed sale must still have its bike; other edits are allowed
        // after the bike is gone.
        let bike = if transaction.is_completed_sale() {
            Some(self.bikes.require(transaction.bike_id).await?)
        } else {
            None
        };
        self.transactions.replace(&transaction).await?;
        if let Some(bike) = bike {
            self.settle_sale(bike, &transaction).await?;
        }
        Ok(transaction)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        self.transactions.delete(id).await
    }

    async fn settle_sale(&self, mut bike: Bike, transaction: &Transaction) -> Result<(), Error> {
        if !transaction.is_completed_sale() {
            return Ok(());
        }
        bike.mark_sold(transaction.occurred_at, transaction.amount);
        bike.updated_at = self.clock.utc();
        self.bikes.replace(&bike).await?;
        info!(bike_id = %bike.id, transaction_id = %transaction.id, "bike marked sold");
        Ok(())
    }
}
