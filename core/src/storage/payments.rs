use super::{db_err, PgStorage};
use async_trait::async_trait;
use rust_decimal::Decimal;
use settle_common::domain::payment::{Payment, PaymentStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{AccountId, OrderId, PaymentId};
use settle_common::money::Money;
use sqlx::FromRow;

fn parse_status(s: &str) -> PaymentStatus {
    match s {
        "authorized" => PaymentStatus::Authorized,
        "captured" => PaymentStatus::Captured,
        "voided" => PaymentStatus::Voided,
        "refunded" => PaymentStatus::Refunded,
        _ => PaymentStatus::Pending,
    }
}

pub(crate) fn status_str(s: PaymentStatus) -> &'static str {
    match s {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Authorized => "authorized",
        PaymentStatus::Captured => "captured",
        PaymentStatus::Voided => "voided",
        PaymentStatus::Refunded => "refunded",
    }
}

#[derive(FromRow)]
struct PaymentRow {
    external_id: uuid::Uuid,
    order_external_id: uuid::Uuid,
    payer_account_id: uuid::Uuid,
    payee_account_id: uuid::Uuid,
    fee_account_id: uuid::Uuid,
    amount: Decimal,
    fee_amount: Decimal,
    status: String,
    expires_at: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: PaymentId(row.external_id),
            order_id: OrderId(row.order_external_id),
            payer_account_id: AccountId(row.payer_account_id),
            payee_account_id: AccountId(row.payee_account_id),
            fee_account_id: AccountId(row.fee_account_id),
            amount: Money::from(row.amount),
            fee_amount: Money::from(row.fee_amount),
            status: parse_status(&row.status),
            expires_at: row.expires_at as u64,
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

pub struct NewPayment {
    pub order_id: OrderId,
    pub payer_account_id: AccountId,
    pub payee_account_id: AccountId,
    pub fee_account_id: AccountId,
    pub amount: Money,
    pub fee_amount: Money,
    pub expires_at: u64,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment(&self, new: NewPayment) -> CoreResult<Payment>;
    async fn get_payment(&self, id: PaymentId) -> CoreResult<Payment>;
    async fn set_payment_status(&self, id: PaymentId, status: PaymentStatus, now: u64) -> CoreResult<Payment>;
}

#[async_trait]
impl PaymentProvider for PgStorage {
    async fn create_payment(&self, new: NewPayment) -> CoreResult<Payment> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO payments \
             (external_id, order_external_id, payer_account_id, payee_account_id, fee_account_id, \
              amount, fee_amount, status, expires_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $9)",
        )
        .bind(external_id)
        .bind(new.order_id.0)
        .bind(new.payer_account_id.0)
        .bind(new.payee_account_id.0)
        .bind(new.fee_account_id.0)
        .bind(new.amount.as_decimal())
        .bind(new.fee_amount.as_decimal())
        .bind(new.expires_at as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("create_payment", e))?;

        self.get_payment(PaymentId(external_id)).await
    }

    async fn get_payment(&self, id: PaymentId) -> CoreResult<Payment> {
        sqlx::query_as::<_, PaymentRow>(
            "SELECT external_id, order_external_id, payer_account_id, payee_account_id, fee_account_id, \
                    amount, fee_amount, status, expires_at, created_at, updated_at \
             FROM payments WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_payment", e))?
        .map(Payment::from)
        .ok_or_else(|| CoreError::NotFound(format!("payment {id}")))
    }

    async fn set_payment_status(&self, id: PaymentId, status: PaymentStatus, now: u64) -> CoreResult<Payment> {
        sqlx::query("UPDATE payments SET status = $1, updated_at = $2 WHERE external_id = $3")
            .bind(status_str(status))
            .bind(now as i64)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_payment_status", e))?;

        self.get_payment(id).await
    }
}

/// Transaction-scoped payment reads/writes for handlers that drive a
/// payment through the Ledger Poster and a status change in one unit of
/// work (§4.3 step 3), mirroring `settle_core::outbox::enqueue`'s own
/// `&mut Transaction` parameter rather than going through `PgStorage`.
pub async fn create_payment_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: NewPayment,
) -> CoreResult<Payment> {
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    let external_id = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO payments \
         (external_id, order_external_id, payer_account_id, payee_account_id, fee_account_id, \
          amount, fee_amount, status, expires_at, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $9)",
    )
    .bind(external_id)
    .bind(new.order_id.0)
    .bind(new.payer_account_id.0)
    .bind(new.payee_account_id.0)
    .bind(new.fee_account_id.0)
    .bind(new.amount.as_decimal())
    .bind(new.fee_amount.as_decimal())
    .bind(new.expires_at as i64)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| db_err("create_payment", e))?;

    get_payment_tx(tx, PaymentId(external_id)).await
}

pub async fn get_payment_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: PaymentId,
) -> CoreResult<Payment> {
    sqlx::query_as::<_, PaymentRow>(
        "SELECT external_id, order_external_id, payer_account_id, payee_account_id, fee_account_id, \
                amount, fee_amount, status, expires_at, created_at, updated_at \
         FROM payments WHERE external_id = $1",
    )
    .bind(id.0)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| db_err("get_payment", e))?
    .map(Payment::from)
    .ok_or_else(|| CoreError::NotFound(format!("payment {id}")))
}

pub async fn set_payment_status_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: PaymentId,
    status: PaymentStatus,
    now: u64,
) -> CoreResult<Payment> {
    sqlx::query("UPDATE payments SET status = $1, updated_at = $2 WHERE external_id = $3")
        .bind(status_str(status))
        .bind(now as i64)
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("set_payment_status", e))?;

    get_payment_tx(tx, id).await
}
