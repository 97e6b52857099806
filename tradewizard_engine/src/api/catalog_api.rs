use log::*;

use crate::{
    db_types::{
        NewRobot,
        NewRobotRequest,
        NewSubscriptionPlan,
        RequestStatus,
        Robot,
        RobotRequest,
        RobotUpdate,
        SubscriptionPlan,
    },
    traits::{CatalogApiError, CatalogManagement},
};

/// Robot catalog, subscription plans, and custom-robot requests.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn create_robot(&self, robot: NewRobot) -> Result<Robot, CatalogApiError> {
        let robot = self.db.insert_robot(robot).await?;
        info!("🤖️ Robot [{}] ({}) added to the catalog", robot.id, robot.name);
        Ok(robot)
    }

    pub async fn robots(&self) -> Result<Vec<Robot>, CatalogApiError> {
        self.db.fetch_robots().await
    }

    pub async fn robot_by_id(&self, id: &str) -> Result<Option<Robot>, CatalogApiError> {
        self.db.fetch_robot_by_id(id).await
    }

    pub async fn update_robot(&self, id: &str, update: RobotUpdate) -> Result<Robot, CatalogApiError> {
        let robot = self.db.update_robot(id, update).await?;
        info!("🤖️ Robot [{}] updated", robot.id);
        Ok(robot)
    }

    pub async fn delete_robot(&self, id: &str) -> Result<(), CatalogApiError> {
        self.db.delete_robot(id).await?;
        info!("🤖️ Robot [{id}] removed from the catalog");
        Ok(())
    }

    pub async fn create_plan(&self, plan: NewSubscriptionPlan) -> Result<SubscriptionPlan, CatalogApiError> {
        let plan = self.db.insert_plan(plan).await?;
        info!("🤖️ Subscription plan [{}] ({}) created", plan.id, plan.name);
        Ok(plan)
    }

    pub async fn plans(&self) -> Result<Vec<SubscriptionPlan>, CatalogApiError> {
        self.db.fetch_plans().await
    }

    pub async fn plan_by_id(&self, id: &str) -> Result<Option<SubscriptionPlan>, CatalogApiError> {
        self.db.fetch_plan_by_id(id).await
    }

    pub async fn delete_plan(&self, id: &str) -> Result<(), CatalogApiError> {
        self.db.delete_plan(id).await?;
        info!("🤖️ Subscription plan [{id}] deleted");
        Ok(())
    }

    pub async fn create_robot_request(
        &self,
        user_id: &str,
        request: NewRobotRequest,
    ) -> Result<RobotRequest, CatalogApiError> {
        let request = self.db.insert_robot_request(user_id, request).await?;
        info!("🤖️ Robot request [{}] submitted by user {user_id}", request.id);
        Ok(request)
    }

    pub async fn robot_requests_for_user(&self, user_id: &str) -> Result<Vec<RobotRequest>, CatalogApiError> {
        self.db.robot_requests_for_user(user_id).await
    }

    pub async fn review_robot_request(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<RobotRequest, CatalogApiError> {
        let request = self.db.update_robot_request_status(id, status).await?;
        info!("🤖️ Robot request [{}] reviewed: {}", request.id, request.status);
        Ok(request)
    }
}
