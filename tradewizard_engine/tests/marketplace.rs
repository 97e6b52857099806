//! CRUD behaviour of the marketplace surface: accounts, catalog, plans, robot requests, chat and notifications.

mod support;

use support::{prepare_test_env, seed_user};
use tradewizard_engine::{
    db_types::{NewNotification, NewRobot, NewRobotRequest, NewSubscriptionPlan, PlanInterval, RequestStatus, RobotUpdate},
    traits::{AccountApiError, CatalogApiError, MessagingApiError},
    AccountsApi,
    CatalogApi,
    MessagingApi,
};
use twz_common::Money;

fn demo_robot() -> NewRobot {
    NewRobot {
        name: "Momentum Hunter".into(),
        description: "Trend-following robot for major FX pairs".into(),
        category: "forex".into(),
        price: Money::from_units(150),
        currency: "USD".into(),
        features: vec!["MT5".into(), "trailing stops".into()],
        image_url: None,
        download_url: Some("https://cdn.example.com/bots/momentum-hunter.zip".into()),
    }
}

#[tokio::test]
async fn registration_and_login() {
    let db = prepare_test_env().await;
    let api = AccountsApi::new(db);

    let user = api.register("Alice".into(), "alice@example.com".into(), "hunter2").await.unwrap();
    assert!(!user.is_admin);
    assert_ne!(user.password_hash, "hunter2", "passwords are stored hashed");

    // Same email cannot register twice.
    let err = api.register("Alice2".into(), "alice@example.com".into(), "other").await.unwrap_err();
    assert!(matches!(err, AccountApiError::EmailAlreadyRegistered(_)));

    let authed = api.authenticate("alice@example.com", "hunter2").await.unwrap();
    assert_eq!(authed.id, user.id);

    let err = api.authenticate("alice@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AccountApiError::InvalidCredentials));
    let err = api.authenticate("nobody@example.com", "hunter2").await.unwrap_err();
    assert!(matches!(err, AccountApiError::InvalidCredentials));
}

#[tokio::test]
async fn robot_catalog_crud() {
    let db = prepare_test_env().await;
    let api = CatalogApi::new(db);

    let robot = api.create_robot(demo_robot()).await.unwrap();
    assert_eq!(api.robots().await.unwrap().len(), 1);
    assert_eq!(api.robot_by_id(&robot.id).await.unwrap().unwrap().name, "Momentum Hunter");

    let update = RobotUpdate { price: Some(Money::from_units(120)), ..Default::default() };
    let updated = api.update_robot(&robot.id, update).await.unwrap();
    assert_eq!(updated.price, Money::from_units(120));
    assert_eq!(updated.name, "Momentum Hunter", "unset fields are untouched");

    api.delete_robot(&robot.id).await.unwrap();
    assert!(api.robot_by_id(&robot.id).await.unwrap().is_none());
    let err = api.delete_robot(&robot.id).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::RobotNotFound(_)));
}

#[tokio::test]
async fn subscription_plans() {
    let db = prepare_test_env().await;
    let api = CatalogApi::new(db);

    let plan = api
        .create_plan(NewSubscriptionPlan {
            name: "Pro".into(),
            description: Some("All robots, monthly".into()),
            price: Money::from_units(20),
            currency: "USD".into(),
            interval: PlanInterval::Monthly,
            features: vec!["signals".into()],
        })
        .await
        .unwrap();
    assert_eq!(plan.interval, PlanInterval::Monthly);
    assert_eq!(api.plans().await.unwrap().len(), 1);

    api.delete_plan(&plan.id).await.unwrap();
    let deleted = api.plan_by_id(&plan.id).await.unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn robot_request_review_flow() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "quentin").await;
    let api = CatalogApi::new(db);

    let request = api
        .create_robot_request(&user.id, NewRobotRequest {
            robot_type: "scalper".into(),
            trading_pairs: "EURUSD,GBPUSD".into(),
            timeframe: "M5".into(),
            risk_level: 3,
        })
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let approved = api.review_robot_request(&request.id, RequestStatus::Approved).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    let listed = api.robot_requests_for_user(&user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, RequestStatus::Approved);

    let err = api.review_robot_request("missing", RequestStatus::Rejected).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::RequestNotFound(_)));
}

#[tokio::test]
async fn chat_and_unread_counts() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "rita").await;
    let admin = seed_user(&db, "support").await;
    let api = MessagingApi::new(db);

    let conversation = api.create_conversation(&user.id, Some("Help with my bot".into())).await.unwrap();
    assert_eq!(api.conversations_for_user(&user.id).await.unwrap().len(), 1);

    api.post_message(&conversation.id, &user.id, "It stopped trading").await.unwrap();
    let reply = api.post_message(&conversation.id, &admin.id, "Check your API keys").await.unwrap();

    // Only the admin's reply counts as unread for the owner.
    assert_eq!(api.unread_message_count(&user.id).await.unwrap(), 1);
    api.mark_message_read(&reply.id).await.unwrap();
    assert_eq!(api.unread_message_count(&user.id).await.unwrap(), 0);

    let messages = api.messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "It stopped trading");

    let err = api.post_message("missing", &user.id, "hello?").await.unwrap_err();
    assert!(matches!(err, MessagingApiError::ConversationNotFound(_)));
}

#[tokio::test]
async fn notification_lifecycle() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "sam").await;
    let api = MessagingApi::new(db);

    let first = api
        .notify(NewNotification {
            user_id: user.id.clone(),
            message: "Payment completed".into(),
            kind: "payment".into(),
            related_id: Some("tx-1".into()),
        })
        .await
        .unwrap();
    api.notify(NewNotification {
        user_id: user.id.clone(),
        message: "Your robot request was approved".into(),
        kind: "robot_request".into(),
        related_id: None,
    })
    .await
    .unwrap();

    let listed = api.notifications_for_user(&user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|n| !n.is_read));

    api.mark_notification_read(&first.id, &user.id).await.unwrap();
    let listed = api.notifications_for_user(&user.id).await.unwrap();
    assert_eq!(listed.iter().filter(|n| n.is_read).count(), 1);

    // Users cannot touch other users' notifications.
    let err = api.mark_notification_read(&first.id, "someone-else").await.unwrap_err();
    assert!(matches!(err, MessagingApiError::NotificationNotFound(_)));

    let marked = api.mark_all_notifications_read(&user.id).await.unwrap();
    assert_eq!(marked, 1);
    assert!(api.notifications_for_user(&user.id).await.unwrap().iter().all(|n| n.is_read));
}
