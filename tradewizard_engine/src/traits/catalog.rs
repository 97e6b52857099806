use thiserror::Error;

use crate::db_types::{
    NewRobot,
    NewRobotRequest,
    NewSubscriptionPlan,
    RequestStatus,
    Robot,
    RobotRequest,
    RobotUpdate,
    SubscriptionPlan,
};

/// Storage contract for the robot catalog, subscription plans and custom-robot requests.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_robot(&self, robot: NewRobot) -> Result<Robot, CatalogApiError>;

    async fn fetch_robots(&self) -> Result<Vec<Robot>, CatalogApiError>;

    async fn fetch_robot_by_id(&self, id: &str) -> Result<Option<Robot>, CatalogApiError>;

    /// Apply a partial update. Returns the updated robot, or `NotFound` if the id is unknown.
    async fn update_robot(&self, id: &str, update: RobotUpdate) -> Result<Robot, CatalogApiError>;

    async fn delete_robot(&self, id: &str) -> Result<(), CatalogApiError>;

    async fn insert_plan(&self, plan: NewSubscriptionPlan) -> Result<SubscriptionPlan, CatalogApiError>;

    async fn fetch_plans(&self) -> Result<Vec<SubscriptionPlan>, CatalogApiError>;

    async fn fetch_plan_by_id(&self, id: &str) -> Result<Option<SubscriptionPlan>, CatalogApiError>;

    async fn delete_plan(&self, id: &str) -> Result<(), CatalogApiError>;

    async fn insert_robot_request(&self, user_id: &str, request: NewRobotRequest)
        -> Result<RobotRequest, CatalogApiError>;

    async fn robot_requests_for_user(&self, user_id: &str) -> Result<Vec<RobotRequest>, CatalogApiError>;

    /// Admin review of a custom-robot request.
    async fn update_robot_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<RobotRequest, CatalogApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Robot {0} not found")]
    RobotNotFound(String),
    #[error("Subscription plan {0} not found")]
    PlanNotFound(String),
    #[error("Robot request {0} not found")]
    RequestNotFound(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}
