use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{new_record_id, NewRobotRequest, RequestStatus, RobotRequest},
    traits::CatalogApiError,
};

pub async fn insert_robot_request(
    user_id: &str,
    request: NewRobotRequest,
    conn: &mut SqliteConnection,
) -> Result<RobotRequest, CatalogApiError> {
    let request: RobotRequest = sqlx::query_as(
        r#"
            INSERT INTO robot_requests (id, user_id, robot_type, trading_pairs, timeframe, risk_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(user_id)
    .bind(&request.robot_type)
    .bind(&request.trading_pairs)
    .bind(&request.timeframe)
    .bind(request.risk_level)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Robot request [{}] inserted for user {user_id}", request.id);
    Ok(request)
}

pub async fn robot_requests_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<RobotRequest>, CatalogApiError> {
    let requests = sqlx::query_as("SELECT * FROM robot_requests WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(requests)
}

pub async fn update_robot_request_status(
    id: &str,
    status: RequestStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<RobotRequest>, CatalogApiError> {
    let request = sqlx::query_as(
        "UPDATE robot_requests SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(request)
}
