//! Purchase and sale transactions recorded against bikes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::apply_fields;
use super::wire_enum::wire_enum;
use crate::domain::ports::Collection;
use crate::domain::repository::Entity;

wire_enum! {
    /// Direction of a transaction.
    pub enum TransactionKind ("transaction kind") {
        Purchase => "purchase",
        Sale => "sale",
    }
}

wire_enum! {
    /// How money changed hands.
    pub enum PaymentMethod ("payment method") {
        Cash => "cash",
        BankTransfer => "bank_transfer",
        Card => "card",
        Financing => "financing",
    }
}

wire_enum! {
    /// Settlement state.
    pub enum TransactionStatus ("transaction status") {
        Pending => "pending",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// Stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub bike_id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    #[serde(default)]
    pub counterparty: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Transaction {
    const COLLECTION: Collection = Collection::new("transactions", &[]);
    const LABEL: &'static str = "Transaction";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Transaction {
    /// Whether this transaction settles the sale of its bike.
    pub fn is_completed_sale(&self) -> bool {
        self.kind == TransactionKind::Sale && self.status == TransactionStatus::Completed
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub bike_id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    pub partner_id: Option<Uuid>,
    pub counterparty: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: Option<TransactionStatus>,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Partial update of a transaction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub amount: Option<f64>,
    pub partner_id: Option<Uuid>,
    pub counterparty: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<TransactionStatus>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn apply(self, transaction: &mut Transaction) {
        apply_fields!(transaction, self;
            amount, payment_method, status, occurred_at;
            partner_id, counterparty);
    }
}
