//! `SqliteDatabase` is the concrete storage backend for the TradeWizard engine.
//!
//! It implements every trait in the [`crate::traits`] module (except the gateway client, which is not a storage
//! concern) on top of a SQLite connection pool.

use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{messaging, new_pool, notifications, plans, robot_requests, robots, transactions, users};
use crate::{
    db_types::{
        ChatMessage,
        Conversation,
        NewNotification,
        NewRobot,
        NewRobotRequest,
        NewSubscriptionPlan,
        NewTransaction,
        NewUser,
        Notification,
        RequestStatus,
        Robot,
        RobotRequest,
        RobotUpdate,
        SubscriptionPlan,
        Transaction,
        TransactionKind,
        User,
    },
    traits::{
        AccountApiError,
        CatalogApiError,
        CatalogManagement,
        MessagingApiError,
        MessagingManagement,
        PaymentLedgerDatabase,
        PaymentLedgerError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        super::MIGRATOR.run(&self.pool).await
    }
}

impl PaymentLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> Result<Transaction, PaymentLedgerError> {
        let mut db_tx = self.pool.begin().await?;
        let inserted = transactions::insert_transaction(tx, &mut db_tx).await?;
        db_tx.commit().await?;
        debug!("🗃️ Transaction [{}] saved in the ledger", inserted.id);
        Ok(inserted)
    }

    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(id, &mut conn).await
    }

    async fn fetch_transaction_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Transaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction_by_correlation_id(correlation_id, &mut conn).await
    }

    async fn settle_pending_transaction(
        &self,
        correlation_id: &str,
        succeeded: bool,
    ) -> Result<Option<Transaction>, PaymentLedgerError> {
        let mut db_tx = self.pool.begin().await?;
        let settled = transactions::settle_pending_transaction(correlation_id, succeeded, &mut db_tx).await?;
        db_tx.commit().await?;
        if let Some(tx) = &settled {
            debug!("🗃️ Transaction [{}] moved to {} in the ledger", tx.id, tx.status);
        }
        Ok(settled)
    }

    async fn cancel_subscription(&self, id: &str, user_id: &str) -> Result<Transaction, PaymentLedgerError> {
        let mut db_tx = self.pool.begin().await?;
        let cancelled = transactions::cancel_subscription(id, user_id, &mut db_tx).await?;
        db_tx.commit().await?;
        debug!("🗃️ Subscription [{}] cancelled in the ledger", cancelled.id);
        Ok(cancelled)
    }

    async fn transactions_for_user(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::transactions_for_user(user_id, kind, &mut conn).await
    }

    async fn active_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::active_subscriptions_for_user(user_id, &mut conn).await
    }

    async fn has_active_subscription(&self, user_id: &str, plan_id: &str) -> Result<bool, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::has_active_subscription(user_id, plan_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), PaymentLedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_id(&self, id: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_robot(&self, robot: NewRobot) -> Result<Robot, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robots::insert_robot(robot, &mut conn).await
    }

    async fn fetch_robots(&self) -> Result<Vec<Robot>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robots::fetch_robots(&mut conn).await
    }

    async fn fetch_robot_by_id(&self, id: &str) -> Result<Option<Robot>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robots::fetch_robot_by_id(id, &mut conn).await
    }

    async fn update_robot(&self, id: &str, update: RobotUpdate) -> Result<Robot, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robots::update_robot(id, update, &mut conn).await?.ok_or_else(|| CatalogApiError::RobotNotFound(id.to_string()))
    }

    async fn delete_robot(&self, id: &str) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        if robots::delete_robot(id, &mut conn).await? {
            Ok(())
        } else {
            Err(CatalogApiError::RobotNotFound(id.to_string()))
        }
    }

    async fn insert_plan(&self, plan: NewSubscriptionPlan) -> Result<SubscriptionPlan, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        plans::insert_plan(plan, &mut conn).await
    }

    async fn fetch_plans(&self) -> Result<Vec<SubscriptionPlan>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        plans::fetch_plans(&mut conn).await
    }

    async fn fetch_plan_by_id(&self, id: &str) -> Result<Option<SubscriptionPlan>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        plans::fetch_plan_by_id(id, &mut conn).await
    }

    async fn delete_plan(&self, id: &str) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        if plans::delete_plan(id, &mut conn).await? {
            Ok(())
        } else {
            Err(CatalogApiError::PlanNotFound(id.to_string()))
        }
    }

    async fn insert_robot_request(
        &self,
        user_id: &str,
        request: NewRobotRequest,
    ) -> Result<RobotRequest, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robot_requests::insert_robot_request(user_id, request, &mut conn).await
    }

    async fn robot_requests_for_user(&self, user_id: &str) -> Result<Vec<RobotRequest>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robot_requests::robot_requests_for_user(user_id, &mut conn).await
    }

    async fn update_robot_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<RobotRequest, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        robot_requests::update_robot_request_status(id, status, &mut conn)
            .await?
            .ok_or_else(|| CatalogApiError::RequestNotFound(id.to_string()))
    }
}

impl MessagingManagement for SqliteDatabase {
    async fn insert_conversation(
        &self,
        user_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::insert_conversation(user_id, title, &mut conn).await
    }

    async fn fetch_conversation(&self, id: &str) -> Result<Option<Conversation>, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::fetch_conversation(id, &mut conn).await
    }

    async fn conversations_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::conversations_for_user(user_id, &mut conn).await
    }

    async fn insert_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessage, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::insert_message(conversation_id, sender_id, content, &mut conn).await
    }

    async fn messages_for_conversation(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::messages_for_conversation(conversation_id, &mut conn).await
    }

    async fn fetch_message(&self, message_id: &str) -> Result<Option<ChatMessage>, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::fetch_message(message_id, &mut conn).await
    }

    async fn mark_message_read(&self, message_id: &str) -> Result<(), MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        if messaging::mark_message_read(message_id, &mut conn).await? {
            Ok(())
        } else {
            Err(MessagingApiError::MessageNotFound(message_id.to_string()))
        }
    }

    async fn unread_message_count(&self, user_id: &str) -> Result<i64, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        messaging::unread_message_count(user_id, &mut conn).await
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(notification, &mut conn).await
    }

    async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::notifications_for_user(user_id, &mut conn).await
    }

    async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        if notifications::mark_notification_read(id, user_id, &mut conn).await? {
            Ok(())
        } else {
            Err(MessagingApiError::NotificationNotFound(id.to_string()))
        }
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, MessagingApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_all_notifications_read(user_id, &mut conn).await
    }
}
