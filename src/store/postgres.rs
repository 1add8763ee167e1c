//! PostgreSQL store
//!
//! A sale commit is one transaction made of conditional updates. The goods row
//! is always touched before the wallet row so two concurrent sales cannot
//! deadlock on each other's locks. An update that matches no row means the
//! condition it guards no longer holds; the transaction is rolled back and
//! the losing condition is reported.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::PgConnection;

use super::{CommitOutcome, Conflict, SalesStore, WalletUpdate};
use crate::domain::aggregates::{Good, PurchaseRecord, SaleDraft, Wallet};
use crate::domain::value_objects::{Amount, Balance, GoodName, Price, Stock, MAX_MONEY};
use crate::{StoreError, StoreResult};

type GoodRow = (String, Decimal, i32, Option<String>);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Creates the user if needed and sets their wallet balance.
    pub async fn put_wallet(&self, username: &str, balance: Balance) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO users (id, username) VALUES ($1, $2) ON CONFLICT (username) DO NOTHING")
            .bind(uuid::Uuid::now_v7()).bind(username).execute(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO wallets (user_id, balance) SELECT id, $2 FROM users WHERE username = $1 \
             ON CONFLICT (user_id) DO UPDATE SET balance = EXCLUDED.balance",
        )
        .bind(username).bind(balance.amount()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Deletes the user; their wallet goes with them.
    pub async fn remove_user(&self, username: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1").bind(username).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }
}

fn good_from_row((name, price, count, description): GoodRow) -> StoreResult<Good> {
    let corrupt = |e: crate::domain::value_objects::ValueError| StoreError::Corrupt(format!("good {name:?}: {e}"));
    let good_name = GoodName::new(name.clone()).map_err(corrupt)?;
    let price = Price::new(price).map_err(corrupt)?;
    let count = Stock::try_from(count).map_err(corrupt)?;
    Ok(Good::new(good_name, price, count, description))
}

fn balance_from_row(username: &str, balance: Decimal) -> StoreResult<Balance> {
    Balance::new(balance).map_err(|e| StoreError::Corrupt(format!("wallet of {username:?}: {e}")))
}

async fn good_conflict(conn: &mut PgConnection, draft: &SaleDraft) -> StoreResult<Conflict> {
    let row: Option<(Decimal, i32)> = sqlx::query_as("SELECT price, count FROM goods WHERE name = $1")
        .bind(&draft.good_name).fetch_optional(conn).await?;
    Ok(match row {
        None => Conflict::GoodRemoved,
        Some((price, _)) if price != draft.price.amount() => Conflict::PriceChanged,
        Some(_) => Conflict::StockExhausted,
    })
}

async fn wallet_exists(conn: &mut PgConnection, username: &str) -> StoreResult<bool> {
    let row: Option<(Decimal,)> = sqlx::query_as("SELECT w.balance FROM wallets w JOIN users u ON u.id = w.user_id WHERE u.username = $1")
        .bind(username).fetch_optional(conn).await?;
    Ok(row.is_some())
}

async fn wallet_conflict(conn: &mut PgConnection, draft: &SaleDraft) -> StoreResult<Conflict> {
    Ok(if wallet_exists(conn, &draft.username).await? { Conflict::InsufficientFunds } else { Conflict::WalletRemoved })
}

#[async_trait]
impl SalesStore for PgStore {
    async fn find_good(&self, name: &str) -> StoreResult<Option<Good>> {
        sqlx::query_as::<_, GoodRow>("SELECT name, price, count, description FROM goods WHERE name = $1")
            .bind(name).fetch_optional(&self.pool).await?.map(good_from_row).transpose()
    }

    async fn list_goods_in_stock(&self, limit: u32) -> StoreResult<Vec<Good>> {
        let rows = sqlx::query_as::<_, GoodRow>("SELECT name, price, count, description FROM goods WHERE count > 0 ORDER BY name LIMIT $1")
            .bind(i64::from(limit)).fetch_all(&self.pool).await?;
        rows.into_iter().map(good_from_row).collect()
    }

    async fn insert_good(&self, good: &Good) -> StoreResult<bool> {
        let count = i32::try_from(good.count().value()).map_err(|_| StoreError::Corrupt(format!("good {:?}: count out of range", good.name().as_str())))?;
        let result = sqlx::query("INSERT INTO goods (name, price, count, description) VALUES ($1, $2, $3, $4) ON CONFLICT (name) DO NOTHING")
            .bind(good.name().as_str()).bind(good.price().amount()).bind(count).bind(good.description())
            .execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_wallet(&self, username: &str) -> StoreResult<Option<Wallet>> {
        let row: Option<(String, Decimal)> = sqlx::query_as("SELECT u.username, w.balance FROM users u JOIN wallets w ON w.user_id = u.id WHERE u.username = $1")
            .bind(username).fetch_optional(&self.pool).await?;
        let Some((username, balance)) = row else { return Ok(None) };
        let balance = balance_from_row(&username, balance)?;
        Ok(Some(Wallet::new(username, balance)))
    }

    async fn credit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate> {
        let mut conn = self.pool.acquire().await?;
        let credited: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE wallets w SET balance = w.balance + $2 FROM users u \
             WHERE w.user_id = u.id AND u.username = $1 AND w.balance + $2 <= $3 RETURNING w.balance",
        )
        .bind(username).bind(amount.value()).bind(MAX_MONEY).fetch_optional(&mut *conn).await?;
        let Some((balance,)) = credited else {
            let exists = wallet_exists(&mut conn, username).await?;
            return Ok(if exists { WalletUpdate::LimitExceeded } else { WalletUpdate::NotFound });
        };
        Ok(WalletUpdate::Applied(balance_from_row(username, balance)?))
    }

    async fn debit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate> {
        let mut conn = self.pool.acquire().await?;
        let debited: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE wallets w SET balance = w.balance - $2 FROM users u \
             WHERE w.user_id = u.id AND u.username = $1 AND w.balance >= $2 RETURNING w.balance",
        )
        .bind(username).bind(amount.value()).fetch_optional(&mut *conn).await?;
        let Some((balance,)) = debited else {
            let exists = wallet_exists(&mut conn, username).await?;
            return Ok(if exists { WalletUpdate::InsufficientFunds } else { WalletUpdate::NotFound });
        };
        Ok(WalletUpdate::Applied(balance_from_row(username, balance)?))
    }

    async fn commit_sale(&self, draft: &SaleDraft) -> StoreResult<CommitOutcome> {
        let price = draft.price.amount();
        let mut tx = self.pool.begin().await?;

        let taken: Option<(i32,)> = sqlx::query_as("UPDATE goods SET count = count - 1 WHERE name = $1 AND count > 0 AND price = $2 RETURNING count")
            .bind(&draft.good_name).bind(price).fetch_optional(&mut *tx).await?;
        if taken.is_none() {
            let conflict = good_conflict(&mut tx, draft).await?;
            tx.rollback().await?;
            return Ok(CommitOutcome::Rejected(conflict));
        }

        let debited: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE wallets w SET balance = w.balance - $2 FROM users u \
             WHERE w.user_id = u.id AND u.username = $1 AND w.balance >= $2 RETURNING w.balance",
        )
        .bind(&draft.username).bind(price).fetch_optional(&mut *tx).await?;
        let Some((remaining,)) = debited else {
            let conflict = wallet_conflict(&mut tx, draft).await?;
            tx.rollback().await?;
            return Ok(CommitOutcome::Rejected(conflict));
        };
        let remaining_balance = balance_from_row(&draft.username, remaining)?;

        let purchase = PurchaseRecord::new(&draft.username, &draft.good_name, draft.price);
        sqlx::query("INSERT INTO purchases (id, username, good_name, price, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(purchase.id).bind(&purchase.username).bind(&purchase.good_name).bind(price).bind(purchase.created_at)
            .execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(CommitOutcome::Committed { purchase, remaining_balance })
    }
}
