//! Postgres store backend
//!
//! Runs over the orders / order_history_events schema in [`crate::schema`].
//! `create_order` is a real transaction: the order insert and the
//! ORDER_CREATED event insert commit together or roll back together.

use crate::error::StoreError;
use crate::repo::{merge_replay, OrderStore, ReplayRecord};
use crate::schema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use types::{
    AccountId, Amount, EventId, EventKind, HistoryEvent, NewOrder, Order, OrderId, PairId, Price,
    Side,
};

const SELECT_ORDER_COLUMNS: &str =
    "SELECT id, pair_id, price, amount, created_at, order_type, account_id FROM orders";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Connect a fresh pool to the given database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema idempotently.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    pair_id: String,
    price: Decimal,
    amount: Decimal,
    created_at: DateTime<Utc>,
    order_type: i32,
    account_id: Option<i32>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, StoreError> {
        let side = Side::from_code(self.order_type as i64)
            .map_err(|e| StoreError::Decode(format!("orders.order_type: {e}")))?;
        let pair_id = PairId::try_new(self.pair_id)
            .ok_or_else(|| StoreError::Decode("orders.pair_id: bad symbol".into()))?;
        let price = Price::try_new(self.price)
            .ok_or_else(|| StoreError::Decode("orders.price: out of range".into()))?;
        let amount = Amount::try_new(self.amount)
            .ok_or_else(|| StoreError::Decode("orders.amount: out of range".into()))?;
        let account_id = self
            .account_id
            .map(AccountId::new)
            .ok_or_else(|| StoreError::Decode("orders.account_id: null".into()))?;

        Ok(Order {
            id: OrderId::new(self.id),
            pair_id,
            price,
            amount,
            account_id,
            created_at: self.created_at,
            side,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: i32,
    event: String,
    created_at: DateTime<Utc>,
    metadata: Value,
    order_id: Option<i64>,
}

impl EventRow {
    fn into_event(self) -> Result<HistoryEvent, StoreError> {
        let kind = EventKind::from_str(&self.event).ok_or_else(|| {
            StoreError::Decode(format!("order_history_events.event: {}", self.event))
        })?;
        let order_id = self
            .order_id
            .map(OrderId::new)
            .ok_or_else(|| StoreError::Decode("order_history_events.order_id: null".into()))?;

        Ok(HistoryEvent {
            id: EventId::new(self.id),
            event: kind,
            order_id,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, new: &NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders (pair_id, price, amount, order_type, account_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, pair_id, price, amount, created_at, order_type, account_id",
        )
        .bind(new.pair_id.as_str())
        .bind(new.price.as_decimal())
        .bind(new.amount.as_decimal())
        .bind(new.side.code())
        .bind(new.account_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO order_history_events (event, order_id) VALUES ($1, $2)")
            .bind(EventKind::OrderCreated.as_str())
            .bind(row.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        row.into_order()
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Order, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER_COLUMNS} WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or(StoreError::NotFound(id))?.into_order()
    }

    async fn append_event(
        &self,
        kind: EventKind,
        order_id: OrderId,
        metadata: Value,
    ) -> Result<HistoryEvent, StoreError> {
        let row: EventRow = sqlx::query_as(
            "INSERT INTO order_history_events (event, order_id, metadata) \
             VALUES ($1, $2, $3) \
             RETURNING id, event, created_at, metadata, order_id",
        )
        .bind(kind.as_str())
        .bind(order_id.as_i64())
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        row.into_event()
    }

    async fn orders_for_account(
        &self,
        account_id: AccountId,
        page: u32,
        size: u32,
    ) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER_COLUMNS} WHERE account_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(account_id.as_i32())
        .bind(size as i64)
        .bind(page as i64 * size as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn replay_log(&self) -> Result<Vec<ReplayRecord>, StoreError> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER_COLUMNS} ORDER BY created_at, id"))
                .fetch_all(&self.pool)
                .await?;
        let placements = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<Result<Vec<_>, _>>()?;

        let cancel_rows: Vec<(Option<i64>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT order_id, created_at FROM order_history_events \
             WHERE event = $1 ORDER BY created_at, id",
        )
        .bind(EventKind::OrderCancelled.as_str())
        .fetch_all(&self.pool)
        .await?;
        let cancellations = cancel_rows
            .into_iter()
            .map(|(order_id, at)| {
                order_id
                    .map(|id| (OrderId::new(id), at))
                    .ok_or_else(|| StoreError::Decode("order_history_events.order_id: null".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(merge_replay(placements, cancellations))
    }
}
