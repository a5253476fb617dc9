//! Finance ledger service.

use praxis_core::finance::{self as store, NewTransaction, TransactionFilter, TransactionRow};
use praxis_core::models::clinic::TransactionKind;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PeriodQuery, SummaryView, TransactionListQuery, TransactionView};

pub fn view(row: TransactionRow) -> AppResult<TransactionView> {
    let kind = row
        .kind
        .parse::<TransactionKind>()
        .map_err(AppError::Internal)?;
    Ok(TransactionView {
        id: row.id,
        kind,
        amount_cents: row.amount_cents,
        description: row.description,
        category: row.category,
        occurred_on: row.occurred_on,
        appointment_id: row.appointment_id,
        created_at: row.created_at,
    })
}

pub async fn create_transaction(
    pool: &PgPool,
    clinician_id: &Uuid,
    tx: &NewTransaction,
) -> AppResult<TransactionView> {
    let row = store::create_transaction(pool, clinician_id, tx).await?;
    info!(transaction_id = %row.id, kind = %tx.kind, "ledger entry created");
    view(row)
}

pub async fn list_transactions(
    pool: &PgPool,
    clinician_id: &Uuid,
    query: TransactionListQuery,
) -> AppResult<Vec<TransactionView>> {
    let filter = TransactionFilter {
        from: query.from,
        to: query.to,
        kind: query.kind,
    };
    store::list_transactions(pool, clinician_id, &filter)
        .await?
        .into_iter()
        .map(view)
        .collect()
}

pub async fn delete_transaction(
    pool: &PgPool,
    clinician_id: &Uuid,
    transaction_id: &Uuid,
) -> AppResult<()> {
    if !store::delete_transaction(pool, clinician_id, transaction_id).await? {
        return Err(AppError::NotFound("Transaction not found".into()));
    }
    info!(transaction_id = %transaction_id, "ledger entry deleted");
    Ok(())
}

pub async fn summary(
    pool: &PgPool,
    clinician_id: &Uuid,
    period: PeriodQuery,
) -> AppResult<SummaryView> {
    let totals = store::summarize(pool, clinician_id, period.from, period.to).await?;
    Ok(SummaryView {
        income_cents: totals.income_cents,
        expense_cents: totals.expense_cents,
        balance_cents: totals.balance_cents(),
        from: period.from,
        to: period.to,
    })
}
