use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{new_record_id, NewSubscriptionPlan, SubscriptionPlan},
    traits::CatalogApiError,
};

pub async fn insert_plan(
    plan: NewSubscriptionPlan,
    conn: &mut SqliteConnection,
) -> Result<SubscriptionPlan, CatalogApiError> {
    let plan: SubscriptionPlan = sqlx::query_as(
        r#"
            INSERT INTO subscription_plans (id, name, description, price, currency, interval, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(plan.price)
    .bind(&plan.currency)
    .bind(plan.interval)
    .bind(Json(plan.features))
    .fetch_one(conn)
    .await?;
    debug!("📝️ Subscription plan [{}] inserted", plan.id);
    Ok(plan)
}

pub async fn fetch_plans(conn: &mut SqliteConnection) -> Result<Vec<SubscriptionPlan>, CatalogApiError> {
    let plans = sqlx::query_as("SELECT * FROM subscription_plans ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(plans)
}

pub async fn fetch_plan_by_id(
    id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<SubscriptionPlan>, CatalogApiError> {
    let plan = sqlx::query_as("SELECT * FROM subscription_plans WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(plan)
}

pub async fn delete_plan(id: &str, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM subscription_plans WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
