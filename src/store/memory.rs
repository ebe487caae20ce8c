use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus};
use crate::store::{PaymentStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory payment store used by the emulator when no database is
/// configured, and by the test suite.
///
/// The terminal-status check-and-set runs while holding the dashmap entry
/// lock, so it is atomic per payment id, matching the conditional-write
/// contract of the SQL backend.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: DashMap<i64, Payment>,
    next_id: AtomicI64,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn conditional_status_write(&self, id: i64, status: PaymentStatus) -> u64 {
        match self.payments.get_mut(&id) {
            Some(mut entry) if !entry.status.is_terminal() => {
                entry.status = status;
                entry.updated_at = Utc::now();
                1
            }
            _ => 0,
        }
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, input: &NewPayment) -> Result<i64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();

        self.payments.insert(
            id,
            Payment {
                id,
                user_id: input.user_id,
                user_email: input.user_email.clone(),
                amount: input.amount,
                currency: input.currency.clone(),
                status: PaymentStatus::New,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<u64, StoreError> {
        Ok(self.conditional_status_write(id, status))
    }

    async fn get_status(&self, id: i64) -> Result<PaymentStatus, StoreError> {
        self.payments
            .get(&id)
            .map(|entry| entry.status)
            .ok_or(StoreError::NotFound { id })
    }

    async fn get_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, StoreError> {
        let matches = |payment: &Payment| match filter {
            PaymentFilter::ByUser(user_id) => payment.user_id == *user_id,
            PaymentFilter::ByEmail(email) => payment.user_email == *email,
        };

        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|entry| matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        payments.sort_by_key(|p| p.id);

        Ok(payments)
    }

    async fn cancel(&self, id: i64) -> Result<u64, StoreError> {
        Ok(self.conditional_status_write(id, PaymentStatus::Canceled))
    }
}
