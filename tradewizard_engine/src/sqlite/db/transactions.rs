use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, SubscriptionDetail, Transaction, TransactionKind, TransactionStatus},
    traits::PaymentLedgerError,
};

/// Inserts a new `Pending` transaction, together with its subscription extension record when present.
/// Call inside a transaction to keep the two inserts atomic.
pub async fn insert_transaction(
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PaymentLedgerError> {
    if fetch_transaction(&tx.id, &mut *conn).await?.is_some() {
        return Err(PaymentLedgerError::TransactionAlreadyExists(tx.id));
    }
    let inserted: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                id,
                user_id,
                item_id,
                kind,
                amount,
                currency,
                payment_method,
                correlation_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.user_id)
    .bind(&tx.item_id)
    .bind(tx.kind)
    .bind(tx.amount)
    .bind(&tx.currency)
    .bind(&tx.payment_method)
    .bind(&tx.correlation_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate {
            PaymentLedgerError::DuplicateCorrelationId(tx.correlation_id.clone().unwrap_or_default())
        } else {
            PaymentLedgerError::from(e)
        }
    })?;
    let mut inserted = inserted;
    if let Some(detail) = tx.subscription {
        let detail: SubscriptionDetail = sqlx::query_as(
            r#"
                INSERT INTO subscription_details (transaction_id, start_date, end_date, is_active)
                VALUES ($1, $2, $3, 0)
                RETURNING *;
            "#,
        )
        .bind(&inserted.id)
        .bind(detail.start_date)
        .bind(detail.end_date)
        .fetch_one(&mut *conn)
        .await?;
        inserted.subscription = Some(detail);
    }
    debug!("📝️ Transaction [{}] inserted as {}", inserted.id, inserted.status);
    Ok(inserted)
}

pub async fn fetch_transaction(
    id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentLedgerError> {
    let tx: Option<Transaction> =
        sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    attach_subscription_detail(tx, conn).await
}

/// Returns the most recent transaction carrying the given correlation id. Pending rows take precedence, so a
/// reused correlation id (possible once the earlier attempt is terminal) resolves to the live attempt.
pub async fn fetch_transaction_by_correlation_id(
    correlation_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentLedgerError> {
    let tx: Option<Transaction> = sqlx::query_as(
        r#"
            SELECT * FROM transactions WHERE correlation_id = $1
            ORDER BY (status = 'Pending') DESC, created_at DESC
            LIMIT 1
        "#,
    )
    .bind(correlation_id)
    .fetch_optional(&mut *conn)
    .await?;
    attach_subscription_detail(tx, conn).await
}

/// The guarded transition out of `Pending`. The WHERE clause is the idempotency guard: only a row whose
/// persisted status is still `Pending` can be updated, so whichever trigger commits first wins and later
/// attempts match nothing.
pub async fn settle_pending_transaction(
    correlation_id: &str,
    succeeded: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentLedgerError> {
    let status = if succeeded { TransactionStatus::Completed } else { TransactionStatus::Failed };
    let settled: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE correlation_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(correlation_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(mut tx) = settled else {
        trace!("📝️ No pending transaction matched correlation id {correlation_id}");
        return Ok(None);
    };
    if tx.kind == TransactionKind::Subscription {
        let detail: Option<SubscriptionDetail> = sqlx::query_as(
            r#"
                UPDATE subscription_details SET is_active = $1
                WHERE transaction_id = $2
                RETURNING *;
            "#,
        )
        .bind(succeeded)
        .bind(&tx.id)
        .fetch_optional(&mut *conn)
        .await?;
        tx.subscription = detail;
    }
    debug!("📝️ Transaction [{}] settled to {}", tx.id, tx.status);
    Ok(Some(tx))
}

/// User cancellation of a completed subscription. Conditional on ownership, kind, and current status, so the
/// call can distinguish "not yours / not there" from "not cancellable".
pub async fn cancel_subscription(
    id: &str,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PaymentLedgerError> {
    let cancelled: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND user_id = $2 AND kind = 'Subscription' AND status = 'Completed'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    match cancelled {
        Some(mut tx) => {
            let detail: Option<SubscriptionDetail> =
                sqlx::query_as("UPDATE subscription_details SET is_active = 0 WHERE transaction_id = $1 RETURNING *")
                    .bind(&tx.id)
                    .fetch_optional(&mut *conn)
                    .await?;
            tx.subscription = detail;
            Ok(tx)
        },
        None => {
            // Work out why the guard failed so the caller can map a sensible error.
            let existing: Option<Transaction> =
                sqlx::query_as("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            match existing {
                None => Err(PaymentLedgerError::TransactionNotFound(id.to_string())),
                Some(tx) if tx.kind != TransactionKind::Subscription => Err(
                    PaymentLedgerError::TransactionModificationForbidden("Only subscriptions can be cancelled".into()),
                ),
                Some(tx) => Err(PaymentLedgerError::TransactionModificationForbidden(format!(
                    "Subscription in status {} cannot be cancelled",
                    tx.status
                ))),
            }
        },
    }
}

pub async fn transactions_for_user(
    user_id: &str,
    kind: Option<TransactionKind>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, PaymentLedgerError> {
    let rows: Vec<Transaction> = match kind {
        Some(kind) => {
            sqlx::query_as("SELECT * FROM transactions WHERE user_id = $1 AND kind = $2 ORDER BY created_at DESC")
                .bind(user_id)
                .bind(kind)
                .fetch_all(&mut *conn)
                .await?
        },
        None => {
            sqlx::query_as("SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&mut *conn)
                .await?
        },
    };
    attach_subscription_details(rows, conn).await
}

/// Completed subscriptions whose extension record is still active and unexpired.
pub async fn active_subscriptions_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, PaymentLedgerError> {
    let rows: Vec<Transaction> = sqlx::query_as(
        r#"
            SELECT transactions.* FROM transactions
            JOIN subscription_details ON transactions.id = subscription_details.transaction_id
            WHERE
                transactions.user_id = $1 AND
                transactions.status = 'Completed' AND
                subscription_details.is_active = 1 AND
                (subscription_details.end_date IS NULL OR
                 unixepoch(subscription_details.end_date) > unixepoch(CURRENT_TIMESTAMP))
            ORDER BY transactions.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    attach_subscription_details(rows, conn).await
}

pub async fn has_active_subscription(
    user_id: &str,
    plan_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentLedgerError> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM transactions
            JOIN subscription_details ON transactions.id = subscription_details.transaction_id
            WHERE
                transactions.user_id = $1 AND
                transactions.item_id = $2 AND
                transactions.status = 'Completed' AND
                subscription_details.is_active = 1 AND
                (subscription_details.end_date IS NULL OR
                 unixepoch(subscription_details.end_date) > unixepoch(CURRENT_TIMESTAMP))
        "#,
    )
    .bind(user_id)
    .bind(plan_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

async fn attach_subscription_detail(
    tx: Option<Transaction>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentLedgerError> {
    let Some(mut tx) = tx else {
        return Ok(None);
    };
    if tx.kind == TransactionKind::Subscription {
        tx.subscription = fetch_detail(&tx.id, conn).await?;
    }
    Ok(Some(tx))
}

async fn attach_subscription_details(
    rows: Vec<Transaction>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, PaymentLedgerError> {
    let mut result = Vec::with_capacity(rows.len());
    for mut tx in rows {
        if tx.kind == TransactionKind::Subscription {
            tx.subscription = fetch_detail(&tx.id, conn).await?;
        }
        result.push(tx);
    }
    Ok(result)
}

async fn fetch_detail(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<SubscriptionDetail>, PaymentLedgerError> {
    let detail = sqlx::query_as("SELECT * FROM subscription_details WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(detail)
}
