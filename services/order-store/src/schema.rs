//! Postgres schema
//!
//! Applied idempotently at boot by [`crate::PgOrderStore::ensure_schema`].
//! Account management lives elsewhere; the accounts table here is the bare
//! minimum needed to satisfy the foreign key.

pub const CREATE_ACCOUNTS: &str = "\
CREATE TABLE IF NOT EXISTS accounts (
    id SERIAL PRIMARY KEY
)";

pub const CREATE_ORDERS: &str = "\
CREATE TABLE IF NOT EXISTS orders (
    id          BIGSERIAL PRIMARY KEY,
    pair_id     VARCHAR(25) NOT NULL,
    price       DECIMAL(20, 10) NOT NULL,
    amount      DECIMAL(20, 10) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    order_type  INTEGER NOT NULL,
    account_id  INTEGER REFERENCES accounts (id)
)";

pub const CREATE_ORDER_HISTORY_EVENTS: &str = "\
CREATE TABLE IF NOT EXISTS order_history_events (
    id          SERIAL PRIMARY KEY,
    event       VARCHAR(255) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    metadata    JSONB NOT NULL DEFAULT '{}'::jsonb,
    order_id    BIGINT REFERENCES orders (id)
)";

pub const CREATE_INDEX_ORDERS_ACCOUNT: &str = "\
CREATE INDEX IF NOT EXISTS idx_orders_account_created
    ON orders (account_id, created_at DESC)";

pub const CREATE_INDEX_EVENTS_ORDER: &str = "\
CREATE INDEX IF NOT EXISTS idx_history_events_order
    ON order_history_events (order_id)";

pub const CREATE_INDEX_EVENTS_NAME: &str = "\
CREATE INDEX IF NOT EXISTS idx_history_events_event
    ON order_history_events (event)";

/// All statements, in dependency order.
pub const STATEMENTS: &[&str] = &[
    CREATE_ACCOUNTS,
    CREATE_ORDERS,
    CREATE_ORDER_HISTORY_EVENTS,
    CREATE_INDEX_ORDERS_ACCOUNT,
    CREATE_INDEX_EVENTS_ORDER,
    CREATE_INDEX_EVENTS_NAME,
];
