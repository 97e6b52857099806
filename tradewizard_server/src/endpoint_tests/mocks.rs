use mockall::mock;
use tradewizard_engine::{
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

mock! {
    pub Ledger {}
    impl PaymentLedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn insert_transaction(&self, tx: NewTransaction) -> Result<Transaction, PaymentLedgerError>;
        async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, PaymentLedgerError>;
        async fn fetch_transaction_by_correlation_id(&self, correlation_id: &str) -> Result<Option<Transaction>, PaymentLedgerError>;
        async fn settle_pending_transaction(&self, correlation_id: &str, succeeded: bool) -> Result<Option<Transaction>, PaymentLedgerError>;
        async fn cancel_subscription(&self, id: &str, user_id: &str) -> Result<Transaction, PaymentLedgerError>;
        async fn transactions_for_user(&self, user_id: &str, kind: Option<TransactionKind>) -> Result<Vec<Transaction>, PaymentLedgerError>;
        async fn active_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, PaymentLedgerError>;
        async fn has_active_subscription(&self, user_id: &str, plan_id: &str) -> Result<bool, PaymentLedgerError>;
    }
}

mock! {
    pub Users {}
    impl UserManagement for Users {
        async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError>;
        async fn fetch_user_by_id(&self, id: &str) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
    }
}

mock! {
    pub Catalog {}
    impl CatalogManagement for Catalog {
        async fn insert_robot(&self, robot: NewRobot) -> Result<Robot, CatalogApiError>;
        async fn fetch_robots(&self) -> Result<Vec<Robot>, CatalogApiError>;
        async fn fetch_robot_by_id(&self, id: &str) -> Result<Option<Robot>, CatalogApiError>;
        async fn update_robot(&self, id: &str, update: RobotUpdate) -> Result<Robot, CatalogApiError>;
        async fn delete_robot(&self, id: &str) -> Result<(), CatalogApiError>;
        async fn insert_plan(&self, plan: NewSubscriptionPlan) -> Result<SubscriptionPlan, CatalogApiError>;
        async fn fetch_plans(&self) -> Result<Vec<SubscriptionPlan>, CatalogApiError>;
        async fn fetch_plan_by_id(&self, id: &str) -> Result<Option<SubscriptionPlan>, CatalogApiError>;
        async fn delete_plan(&self, id: &str) -> Result<(), CatalogApiError>;
        async fn insert_robot_request(&self, user_id: &str, request: NewRobotRequest) -> Result<RobotRequest, CatalogApiError>;
        async fn robot_requests_for_user(&self, user_id: &str) -> Result<Vec<RobotRequest>, CatalogApiError>;
        async fn update_robot_request_status(&self, id: &str, status: RequestStatus) -> Result<RobotRequest, CatalogApiError>;
    }
}

mock! {
    pub Messaging {}
    impl MessagingManagement for Messaging {
        async fn insert_conversation(&self, user_id: &str, title: Option<String>) -> Result<Conversation, MessagingApiError>;
        async fn fetch_conversation(&self, id: &str) -> Result<Option<Conversation>, MessagingApiError>;
        async fn conversations_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, MessagingApiError>;
        async fn insert_message(&self, conversation_id: &str, sender_id: &str, content: &str) -> Result<ChatMessage, MessagingApiError>;
        async fn messages_for_conversation(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, MessagingApiError>;
        async fn fetch_message(&self, message_id: &str) -> Result<Option<ChatMessage>, MessagingApiError>;
        async fn mark_message_read(&self, message_id: &str) -> Result<(), MessagingApiError>;
        async fn unread_message_count(&self, user_id: &str) -> Result<i64, MessagingApiError>;
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingApiError>;
        async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, MessagingApiError>;
        async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), MessagingApiError>;
        async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, MessagingApiError>;
    }
}
