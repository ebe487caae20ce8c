pub mod memory;
pub mod postgres;

use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryPaymentStore;
pub use postgres::PgPaymentStore;

/// Errors surfaced by a payment store.
///
/// Infrastructure failures carry the name of the store operation that hit
/// them; they are not classified further and never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op}: {source}")]
    Database {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("payment {id} not found")]
    NotFound { id: i64 },
}

/// Durable CRUD over the payments table.
///
/// The one contract that matters for correctness: every status-mutating
/// write is conditioned on the row's current status not being terminal,
/// atomically, in a single write. The returned row count (0 or 1) is the
/// only signal the caller gets; 0 means "absent or already terminal" and
/// the two cases are indistinguishable here.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment with status `new`, returning the generated id.
    async fn create(&self, input: &NewPayment) -> Result<i64, StoreError>;

    /// Conditional status write; returns the number of rows changed.
    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<u64, StoreError>;

    /// Current status of a payment, or `NotFound`.
    async fn get_status(&self, id: i64) -> Result<PaymentStatus, StoreError>;

    /// All payments matching the filter; an empty match is an empty vec,
    /// never an error.
    async fn get_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, StoreError>;

    /// Conditional write with fixed target status `canceled`.
    async fn cancel(&self, id: i64) -> Result<u64, StoreError>;
}
