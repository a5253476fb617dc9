//! Finance ledger persistence.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::events::AppointmentPaid;
use crate::models::clinic::TransactionKind;

/// Row returned by ledger queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub kind: String,
    pub amount_cents: i64,
    pub description: String,
    pub category: Option<String>,
    pub occurred_on: NaiveDate,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Values for a manual ledger entry.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub category: Option<String>,
    pub occurred_on: NaiveDate,
}

/// List filter; date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

/// Totals for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
}

impl LedgerSummary {
    pub fn balance_cents(&self) -> i64 {
        self.income_cents - self.expense_cents
    }
}

const TRANSACTION_COLUMNS: &str = "id, clinician_id, kind, amount_cents, description, category, \
     occurred_on, appointment_id, created_at";

/// Category recorded on entries created from paid appointments.
pub const SESSION_CATEGORY: &str = "session";

/// Create a manual ledger entry.
pub async fn create_transaction(
    pool: &PgPool,
    clinician_id: &Uuid,
    tx: &NewTransaction,
) -> Result<TransactionRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO finance_transactions \
         (id, clinician_id, kind, amount_cents, description, category, occurred_on) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {TRANSACTION_COLUMNS}"
    );
    sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(Uuid::now_v7())
        .bind(clinician_id)
        .bind(tx.kind.as_str())
        .bind(tx.amount_cents)
        .bind(&tx.description)
        .bind(&tx.category)
        .bind(tx.occurred_on)
        .fetch_one(pool)
        .await
}

/// Insert or refresh the income entry for a paid appointment.
///
/// Keyed by `appointment_id`, so repeated delivery of the same event leaves a
/// single entry.
pub async fn upsert_appointment_income(
    pool: &PgPool,
    event: &AppointmentPaid,
) -> Result<TransactionRow, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO finance_transactions
            (id, clinician_id, kind, amount_cents, description, category, occurred_on, appointment_id)
        VALUES ($1, $2, 'income', $3, $4, $5, $6, $7)
        ON CONFLICT (appointment_id) DO UPDATE
        SET amount_cents = EXCLUDED.amount_cents,
            occurred_on = EXCLUDED.occurred_on
        RETURNING {TRANSACTION_COLUMNS}
        "#
    );
    sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(Uuid::now_v7())
        .bind(event.clinician_id)
        .bind(event.amount_cents)
        .bind(event.description())
        .bind(SESSION_CATEGORY)
        .bind(event.paid_on)
        .bind(event.appointment_id)
        .fetch_one(pool)
        .await
}

/// List ledger entries, newest first.
pub async fn list_transactions(
    pool: &PgPool,
    clinician_id: &Uuid,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {TRANSACTION_COLUMNS} FROM finance_transactions
        WHERE clinician_id = $1
          AND ($2::date IS NULL OR occurred_on >= $2)
          AND ($3::date IS NULL OR occurred_on <= $3)
          AND ($4::text IS NULL OR kind = $4)
        ORDER BY occurred_on DESC, created_at DESC
        "#
    );
    sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(clinician_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_all(pool)
        .await
}

/// Income and expense totals for a period.
pub async fn summarize(
    pool: &PgPool,
    clinician_id: &Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<LedgerSummary, sqlx::Error> {
    let (income_cents, expense_cents) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COALESCE(SUM(amount_cents) FILTER (WHERE kind = 'income'), 0)::bigint,
            COALESCE(SUM(amount_cents) FILTER (WHERE kind = 'expense'), 0)::bigint
        FROM finance_transactions
        WHERE clinician_id = $1
          AND ($2::date IS NULL OR occurred_on >= $2)
          AND ($3::date IS NULL OR occurred_on <= $3)
        "#,
    )
    .bind(clinician_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(LedgerSummary {
        income_cents,
        expense_cents,
    })
}

/// Delete a ledger entry.
pub async fn delete_transaction(
    pool: &PgPool,
    clinician_id: &Uuid,
    transaction_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM finance_transactions WHERE id = $1 AND clinician_id = $2")
            .bind(transaction_id)
            .bind(clinician_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_is_income_minus_expense() {
        let summary = LedgerSummary {
            income_cents: 50_000,
            expense_cents: 12_500,
        };
        assert_eq!(summary.balance_cents(), 37_500);
        assert_eq!(LedgerSummary::default().balance_cents(), 0);
    }
}
