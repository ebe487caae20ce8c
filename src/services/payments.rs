use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus};
use crate::store::{PaymentStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors returned by the status-transition engine. Domain rule violations
/// (`TerminalStatus`, `NoRowsUpdated`) are distinguishable from
/// infrastructure failures (`Store`); nothing is retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("payment {id} is in terminal status {status}, transition rejected")]
    TerminalStatus { id: i64, status: PaymentStatus },
    #[error("no rows changed for payment {id}, likely already terminal")]
    NoRowsUpdated { id: i64 },
}

enum TransitionOp {
    SetStatus(PaymentStatus),
    Cancel,
}

/// The status-transition engine.
///
/// Enforces the terminal-status invariant across a read-then-conditional-write
/// sequence that is inherently racy against concurrent writers. The store's
/// atomic conditional write is the sole correctness mechanism; the advisory
/// pre-check only buys a clearer error when it catches a frozen row first.
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    /// Creates a payment with status `new` and returns its id.
    ///
    /// On a store failure the engine runs a best-effort compensating
    /// `error`-status write before surfacing the original error. No id is
    /// assigned on the failure path, so the compensation target is the zero
    /// id and the write is an explicit no-op.
    pub async fn create_payment(&self, input: &NewPayment) -> Result<i64, ServiceError> {
        match self.store.create(input).await {
            Ok(id) => Ok(id),
            Err(err) => {
                self.compensate_failed_create(0).await;
                Err(err.into())
            }
        }
    }

    async fn compensate_failed_create(&self, id: i64) {
        if id == 0 {
            warn!(payment_id = id, "create failed before an id was assigned, skipping error-status write");
            return;
        }

        if let Err(err) = self.store.update_status(id, PaymentStatus::Error).await {
            warn!(payment_id = id, error = %err, "compensating error-status write failed");
        }
    }

    /// Guarded transition to an arbitrary status.
    pub async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<(), ServiceError> {
        self.guarded_transition(id, TransitionOp::SetStatus(status))
            .await
    }

    /// Guarded transition to `canceled`. Note that `canceled` is not
    /// terminal, so cancelling twice succeeds twice.
    pub async fn cancel_payment(&self, id: i64) -> Result<(), ServiceError> {
        self.guarded_transition(id, TransitionOp::Cancel).await
    }

    pub async fn get_status(&self, id: i64) -> Result<PaymentStatus, ServiceError> {
        Ok(self.store.get_status(id).await?)
    }

    pub async fn get_payments(
        &self,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.store.get_payments(filter).await?)
    }

    /// Advisory status pre-check followed by the store's atomic conditional
    /// write.
    ///
    /// The pre-check exists to report a clearer error when the payment is
    /// already frozen; it may read stale state, and only the conditional
    /// write is authoritative. A pre-check that fails at the store level is
    /// ignored and the write proceeds. Two concurrent calls on the same id
    /// may both pass the pre-check; the store then lets at most one write
    /// land, and the loser observes `NoRowsUpdated`.
    async fn guarded_transition(&self, id: i64, op: TransitionOp) -> Result<(), ServiceError> {
        if let Ok(status) = self.store.get_status(id).await {
            if status.is_terminal() {
                return Err(ServiceError::TerminalStatus { id, status });
            }
        }

        let written = match op {
            TransitionOp::SetStatus(status) => self.store.update_status(id, status).await?,
            TransitionOp::Cancel => self.store.cancel(id).await?,
        };

        if written == 0 {
            return Err(ServiceError::NoRowsUpdated { id });
        }

        Ok(())
    }
}
