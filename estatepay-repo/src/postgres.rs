//! PostgreSQL ledger adapter.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use estatepay_types::domain::{
    Account, AccountId, PaymentOutcome, Property, PropertyGrant, PropertyId, RateSnapshot,
    Transaction, TransactionId, grant_window,
};
use estatepay_types::error::LedgerError;
use estatepay_types::ports::{NewPayment, PaymentLedger, Reconciliation};

use crate::types::{DbAccount, DbProperty, DbPropertyGrant, DbRateSnapshot, DbTransaction};

const TRANSACTION_COLUMNS: &str = "id, reference, property_id, account_id, purpose, amount, \
     currency, commission, status, duration_months, duration_days, start_date, created_at, \
     updated_at";

const GRANT_COLUMNS: &str = "id, transaction_id, property_id, account_id, amount, \
     duration_months, duration_days, start_date, end_date, expired, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL ledger with row-level locking on reconciliation.
pub struct PostgresLedger {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_property_transactions.sql"),
        "0002",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0003_create_exchange_rates.sql"),
        "0003",
    )
    .await?;

    Ok(())
}

/// Maps an insert failure, surfacing unique-index hits as conflicts.
fn map_insert_err(e: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return LedgerError::Conflict("duplicate reference".into());
        }
    }
    LedgerError::Database(e.to_string())
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with an existing pool).
    pub async fn create_schema(&self) -> Result<(), LedgerError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentLedger for PostgresLedger {
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let row: Option<DbAccount> =
            sqlx::query_as(r#"SELECT id, email, role, created_at FROM accounts WHERE id = $1"#)
                .bind(id.into_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

        row.map(DbAccount::into_domain).transpose()
    }

    async fn get_property(&self, id: PropertyId) -> Result<Option<Property>, LedgerError> {
        let row: Option<DbProperty> = sqlx::query_as(
            r#"SELECT id, owner_id, name, total_price, price_per_year, inspection_fee,
                      paid, publicized, category, kind, created_at
               FROM property WHERE id = $1"#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        row.map(DbProperty::into_domain).transpose()
    }

    async fn has_qualifying_success(
        &self,
        property_id: PropertyId,
    ) -> Result<bool, LedgerError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"SELECT EXISTS (
                   SELECT 1 FROM transactions
                   WHERE property_id = $1 AND status = 'success' AND purpose <> 'inspection_fee'
               )"#,
        )
        .bind(property_id.into_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(exists)
    }

    async fn create_pending(&self, new: NewPayment) -> Result<Transaction, LedgerError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        // Lock the property so the duplicate-payment guard and the insert
        // see the same ledger state.
        let property: Option<DbProperty> = sqlx::query_as(
            r#"SELECT id, owner_id, name, total_price, price_per_year, inspection_fee,
                      paid, publicized, category, kind, created_at
               FROM property WHERE id = $1 FOR UPDATE"#,
        )
        .bind(new.property_id.into_uuid())
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        if property.is_none() {
            return Err(LedgerError::NotFound);
        }

        let account: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM accounts WHERE id = $1"#)
            .bind(new.account_id.into_uuid())
            .fetch_optional(&mut *db_tx)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if account.is_none() {
            return Err(LedgerError::NotFound);
        }

        // Inspection fees may always repeat; everything else is blocked once
        // one qualifying success exists for the property.
        if new.purpose.grants_access() {
            let (exists,): (bool,) = sqlx::query_as(
                r#"SELECT EXISTS (
                       SELECT 1 FROM transactions
                       WHERE property_id = $1 AND status = 'success'
                         AND purpose <> 'inspection_fee'
                   )"#,
            )
            .bind(new.property_id.into_uuid())
            .fetch_one(&mut *db_tx)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

            if exists {
                return Err(LedgerError::DuplicatePayment);
            }
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO transactions
               (id, reference, property_id, account_id, purpose, amount, currency, commission,
                status, duration_months, duration_days, start_date, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10, $11, $12, $12)"#,
        )
        .bind(id)
        .bind(&new.reference)
        .bind(new.property_id.into_uuid())
        .bind(new.account_id.into_uuid())
        .bind(new.purpose.as_str())
        .bind(new.amount)
        .bind(new.display_currency.to_string())
        .bind(new.commission)
        .bind(new.term.months as i32)
        .bind(new.term.days as i32)
        .bind(new.start_date)
        .bind(now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_insert_err)?;

        db_tx
            .commit()
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        let row = DbTransaction {
            id,
            reference: new.reference,
            property_id: new.property_id.into_uuid(),
            account_id: new.account_id.into_uuid(),
            purpose: new.purpose.as_str().to_string(),
            amount: new.amount,
            currency: new.display_currency.to_string(),
            commission: new.commission,
            status: "pending".to_string(),
            duration_months: new.term.months as i32,
            duration_days: new.term.days as i32,
            start_date: new.start_date,
            created_at: now,
            updated_at: now,
        };
        row.into_domain()
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE reference = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn apply_outcome(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Reconciliation, LedgerError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        // Row lock serializes concurrent reconciliations on this reference:
        // exactly one caller sees a pending row, the rest short-circuit below.
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE reference = $1 FOR UPDATE",
            TRANSACTION_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        let transaction = row.ok_or(LedgerError::NotFound)?.into_domain()?;

        if transaction.is_terminal() {
            drop(db_tx);
            let grant = self.find_grant_for_transaction(transaction.id).await?;
            return Ok(Reconciliation {
                transaction,
                grant,
                newly_applied: false,
            });
        }

        let status = outcome.terminal_status();
        let now = Utc::now();

        sqlx::query(r#"UPDATE transactions SET status = $1, updated_at = $2 WHERE id = $3"#)
            .bind(status.as_str())
            .bind(now)
            .bind(transaction.id.into_uuid())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut grant = None;

        match outcome {
            PaymentOutcome::Success if transaction.purpose.grants_access() => {
                let (start, end) =
                    grant_window(transaction.purpose, transaction.term, transaction.start_date)
                        .ok_or_else(|| {
                            LedgerError::Transaction("grant window out of range".into())
                        })?;

                let grant_id = Uuid::new_v4();

                sqlx::query(
                    r#"INSERT INTO property_transactions
                       (id, transaction_id, property_id, account_id, amount, duration_months,
                        duration_days, start_date, end_date, expired, created_at)
                       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10)"#,
                )
                .bind(grant_id)
                .bind(transaction.id.into_uuid())
                .bind(transaction.property_id.into_uuid())
                .bind(transaction.account_id.into_uuid())
                .bind(transaction.amount.amount())
                .bind(transaction.term.months as i32)
                .bind(transaction.term.days as i32)
                .bind(start)
                .bind(end)
                .bind(now)
                .execute(&mut *db_tx)
                .await
                .map_err(map_insert_err)?;

                sqlx::query(
                    r#"UPDATE property SET paid = TRUE, publicized = TRUE WHERE id = $1"#,
                )
                .bind(transaction.property_id.into_uuid())
                .execute(&mut *db_tx)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

                grant = Some(PropertyGrant {
                    id: grant_id,
                    transaction_id: transaction.id,
                    property_id: transaction.property_id,
                    account_id: transaction.account_id,
                    amount: transaction.amount.amount(),
                    duration_months: transaction.term.months,
                    duration_days: transaction.term.days,
                    start_date: start,
                    end_date: end,
                    expired: false,
                    created_at: now,
                });
            }
            // Inspection fees never mark the property paid or earn a grant.
            PaymentOutcome::Success => {}
            PaymentOutcome::Failed => {
                // Recompute `paid` from the surviving successes instead of
                // toggling the flag blindly.
                sqlx::query(
                    r#"UPDATE property SET paid = EXISTS (
                           SELECT 1 FROM transactions
                           WHERE property_id = $1 AND status = 'success'
                             AND purpose <> 'inspection_fee'
                       )
                       WHERE id = $1"#,
                )
                .bind(transaction.property_id.into_uuid())
                .execute(&mut *db_tx)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
        }

        db_tx
            .commit()
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        let transaction = Transaction {
            status,
            updated_at: now,
            ..transaction
        };

        Ok(Reconciliation {
            transaction,
            grant,
            newly_applied: true,
        })
    }

    async fn find_grant_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<PropertyGrant>, LedgerError> {
        let row: Option<DbPropertyGrant> = sqlx::query_as(&format!(
            "SELECT {} FROM property_transactions WHERE transaction_id = $1",
            GRANT_COLUMNS
        ))
        .bind(transaction_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(row.map(DbPropertyGrant::into_domain))
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Transaction>, i64), LedgerError> {
        let offset = (page.saturating_sub(1) as i64) * per_page as i64;

        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE account_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            TRANSACTION_COLUMNS
        ))
        .bind(account_id.into_uuid())
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        let (total,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM transactions WHERE account_id = $1"#)
                .bind(account_id.into_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

        let transactions = rows
            .into_iter()
            .map(DbTransaction::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((transactions, total))
    }

    async fn current_rates(&self) -> Result<Option<RateSnapshot>, LedgerError> {
        let row: Option<DbRateSnapshot> = sqlx::query_as(
            r#"SELECT id, usd, eur, gbp, last_updated FROM exchange_rates
               ORDER BY last_updated DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(row.map(DbRateSnapshot::into_domain))
    }

    async fn refresh_rates(
        &self,
        usd: f64,
        eur: f64,
        gbp: f64,
        date: NaiveDate,
    ) -> Result<RateSnapshot, LedgerError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as(r#"SELECT id FROM exchange_rates LIMIT 1"#)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

        let id = match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"UPDATE exchange_rates SET usd = $1, eur = $2, gbp = $3, last_updated = $4
                       WHERE id = $5"#,
                )
                .bind(usd)
                .bind(eur)
                .bind(gbp)
                .bind(date)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;
                id
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"INSERT INTO exchange_rates (id, usd, eur, gbp, last_updated)
                       VALUES ($1, $2, $3, $4, $5)"#,
                )
                .bind(id)
                .bind(usd)
                .bind(eur)
                .bind(gbp)
                .bind(date)
                .execute(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;
                id
            }
        };

        Ok(RateSnapshot {
            id,
            usd,
            eur,
            gbp,
            last_updated: date,
        })
    }
}
