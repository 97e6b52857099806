use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{new_record_id, NewRobot, Robot, RobotUpdate},
    traits::CatalogApiError,
};

pub async fn insert_robot(robot: NewRobot, conn: &mut SqliteConnection) -> Result<Robot, CatalogApiError> {
    let robot: Robot = sqlx::query_as(
        r#"
            INSERT INTO robots (id, name, description, category, price, currency, features, image_url, download_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(&robot.name)
    .bind(&robot.description)
    .bind(&robot.category)
    .bind(robot.price)
    .bind(&robot.currency)
    .bind(Json(robot.features))
    .bind(&robot.image_url)
    .bind(&robot.download_url)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Robot [{}] inserted", robot.id);
    Ok(robot)
}

pub async fn fetch_robots(conn: &mut SqliteConnection) -> Result<Vec<Robot>, CatalogApiError> {
    let robots = sqlx::query_as("SELECT * FROM robots ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(robots)
}

pub async fn fetch_robot_by_id(id: &str, conn: &mut SqliteConnection) -> Result<Option<Robot>, CatalogApiError> {
    let robot = sqlx::query_as("SELECT * FROM robots WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(robot)
}

pub async fn update_robot(
    id: &str,
    update: RobotUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Robot>, CatalogApiError> {
    if update.is_empty() {
        return fetch_robot_by_id(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE robots SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(currency) = update.currency {
        set_clause.push("currency = ");
        set_clause.push_bind_unseparated(currency);
    }
    if let Some(features) = update.features {
        set_clause.push("features = ");
        set_clause.push_bind_unseparated(Json(features));
    }
    if let Some(image_url) = update.image_url {
        set_clause.push("image_url = ");
        set_clause.push_bind_unseparated(image_url);
    }
    if let Some(download_url) = update.download_url {
        set_clause.push("download_url = ");
        set_clause.push_bind_unseparated(download_url);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let robot = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Robot::from_row(&row)).transpose()?;
    Ok(robot)
}

pub async fn delete_robot(id: &str, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM robots WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
