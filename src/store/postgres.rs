use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus};
use crate::store::{PaymentStore, StoreError};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL-backed payment store.
///
/// The conditional `UPDATE ... WHERE status NOT IN ('success','failure')`
/// is the sole concurrency-correctness mechanism in the system; no
/// in-process lock exists per payment id.
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conditional_status_write(
        &self,
        op: &'static str,
        id: i64,
        status: PaymentStatus,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET status = $1, updated_at = now() \
             WHERE id = $2 AND status NOT IN ($3, $4)",
        )
        .bind(status.as_str())
        .bind(id)
        .bind(PaymentStatus::Success.as_str())
        .bind(PaymentStatus::Failure.as_str())
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Database { op, source })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn create(&self, input: &NewPayment) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO payments (user_id, user_email, amount, currency) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(input.user_id)
        .bind(&input.user_email)
        .bind(input.amount)
        .bind(&input.currency)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| StoreError::Database {
            op: "create_payment",
            source,
        })?;

        Ok(id)
    }

    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<u64, StoreError> {
        self.conditional_status_write("update_status", id, status)
            .await
    }

    async fn get_status(&self, id: i64) -> Result<PaymentStatus, StoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM payments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|source| StoreError::Database {
                    op: "get_status",
                    source,
                })?;

        match status {
            Some(text) => text.parse().map_err(|e: crate::models::ParseStatusError| {
                StoreError::Database {
                    op: "get_status",
                    source: sqlx::Error::Decode(Box::new(e)),
                }
            }),
            None => Err(StoreError::NotFound { id }),
        }
    }

    async fn get_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, StoreError> {
        const BY_USER: &str = "SELECT id, user_id, user_email, amount, currency, status, \
             created_at, updated_at FROM payments WHERE user_id = $1";
        const BY_EMAIL: &str = "SELECT id, user_id, user_email, amount, currency, status, \
             created_at, updated_at FROM payments WHERE user_email = $1";

        let query = match filter {
            PaymentFilter::ByUser(user_id) => {
                sqlx::query_as::<_, Payment>(BY_USER).bind(*user_id)
            }
            PaymentFilter::ByEmail(email) => {
                sqlx::query_as::<_, Payment>(BY_EMAIL).bind(email.clone())
            }
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StoreError::Database {
                op: "get_payments",
                source,
            })
    }

    async fn cancel(&self, id: i64) -> Result<u64, StoreError> {
        self.conditional_status_write("cancel_payment", id, PaymentStatus::Canceled)
            .await
    }
}
