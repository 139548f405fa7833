//! SQL schema for the Tally SQLite store.
//!
//! Executed at connection startup. `PRAGMA user_version` records the schema
//! revision.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS businesses (
    business_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    sector      TEXT,
    currency    TEXT NOT NULL DEFAULT 'FCFA',
    owner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE
);

-- Transactions and expenses are append-only.
-- Rows only go away through the cascade from their business.
CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    business_id    TEXT NOT NULL REFERENCES businesses(business_id) ON DELETE CASCADE,
    amount         TEXT NOT NULL,   -- decimal string
    payment_method TEXT NOT NULL,   -- raw code; not constrained
    category       TEXT NOT NULL,
    description    TEXT,
    created_at     TEXT NOT NULL    -- fixed-width RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS expenses (
    expense_id  TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(business_id) ON DELETE CASCADE,
    amount      TEXT NOT NULL,
    category    TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS businesses_owner_idx  ON businesses(owner_id);
CREATE INDEX IF NOT EXISTS transactions_time_idx ON transactions(business_id, created_at);
CREATE INDEX IF NOT EXISTS expenses_time_idx     ON expenses(business_id, created_at);

PRAGMA user_version = 1;
";
