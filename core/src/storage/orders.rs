use super::{db_err, PgStorage};
use async_trait::async_trait;
use rust_decimal::Decimal;
use settle_common::domain::order::{Order, OrderItem, OrderStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{InternalId, OrderId, UserId};
use settle_common::money::Money;
use sqlx::FromRow;

fn parse_status(s: &str) -> OrderStatus {
    match s {
        "confirmed" => OrderStatus::Confirmed,
        "paid" => OrderStatus::Paid,
        "shipped" => OrderStatus::Shipped,
        "completed" => OrderStatus::Completed,
        "cancelled" => OrderStatus::Cancelled,
        "refunded" => OrderStatus::Refunded,
        _ => OrderStatus::Pending,
    }
}

pub(crate) fn status_str(s: OrderStatus) -> &'static str {
    match s {
        OrderStatus::Pending => "pending",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::Paid => "paid",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Completed => "completed",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Refunded => "refunded",
    }
}

#[derive(FromRow)]
struct OrderRow {
    external_id: uuid::Uuid,
    buyer_user_id: uuid::Uuid,
    status: String,
    total_amount: Decimal,
    created_at: i64,
    updated_at: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: OrderId(row.external_id),
            buyer_user_id: UserId(row.buyer_user_id),
            status: parse_status(&row.status),
            total_amount: Money::from(row.total_amount),
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

#[derive(FromRow)]
struct OrderItemRow {
    id: i64,
    order_external_id: uuid::Uuid,
    product_ref: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: InternalId(row.id),
            order_id: OrderId(row.order_external_id),
            product_ref: row.product_ref,
            quantity: row.quantity as u32,
            unit_price: Money::from(row.unit_price),
        }
    }
}

pub struct NewOrderItem {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price: Money,
}

#[async_trait]
pub trait OrderProvider: Send + Sync {
    /// Creates an order with its line items in one transaction;
    /// `total_amount` is the caller-computed Σ(qty × price) (§3).
    async fn create_order(
        &self,
        buyer: UserId,
        items: Vec<NewOrderItem>,
        total_amount: Money,
    ) -> CoreResult<Order>;
    async fn get_order(&self, id: OrderId) -> CoreResult<Order>;
    async fn list_order_items(&self, id: OrderId) -> CoreResult<Vec<OrderItem>>;
    async fn set_order_status(&self, id: OrderId, status: OrderStatus, now: u64) -> CoreResult<Order>;
}

#[async_trait]
impl OrderProvider for PgStorage {
    async fn create_order(
        &self,
        buyer: UserId,
        items: Vec<NewOrderItem>,
        total_amount: Money,
    ) -> CoreResult<Order> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();

        let mut tx = self.pool.begin().await.map_err(|e| db_err("create_order:begin", e))?;
        sqlx::query(
            "INSERT INTO orders (external_id, buyer_user_id, status, total_amount, created_at, updated_at) \
             VALUES ($1, $2, 'pending', $3, $4, $4)",
        )
        .bind(external_id)
        .bind(buyer.0)
        .bind(total_amount.as_decimal())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("create_order:insert", e))?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_external_id, product_ref, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(external_id)
            .bind(item.product_ref)
            .bind(item.quantity as i32)
            .bind(item.unit_price.as_decimal())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("create_order:item", e))?;
        }
        tx.commit().await.map_err(|e| db_err("create_order:commit", e))?;

        self.get_order(OrderId(external_id)).await
    }

    async fn get_order(&self, id: OrderId) -> CoreResult<Order> {
        sqlx::query_as::<_, OrderRow>(
            "SELECT external_id, buyer_user_id, status, total_amount, created_at, updated_at \
             FROM orders WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_order", e))?
        .map(Order::from)
        .ok_or_else(|| CoreError::NotFound(format!("order {id}")))
    }

    async fn list_order_items(&self, id: OrderId) -> CoreResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_external_id, product_ref, quantity, unit_price \
             FROM order_items WHERE order_external_id = $1 ORDER BY id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_order_items", e))?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus, now: u64) -> CoreResult<Order> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE external_id = $3")
            .bind(status_str(status))
            .bind(now as i64)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_order_status", e))?;

        self.get_order(id).await
    }
}
