use std::time::Duration;

use actix_jwt_auth_middleware::{use_jwt::UseJWTOnApp, Authority};
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use daraja_tools::DarajaConfig;
use jwt_compact::alg::Hs256;
use log::*;
use tradewizard_engine::{
    db_types::{NewNotification, TransactionKind, TransactionStatus},
    events::{EventHandlers, EventHooks, EventProducers, TransactionResolvedEvent},
    AccountsApi,
    CatalogApi,
    MessagingApi,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::{build_token_signer, TokenIssuer},
    config::ServerConfig,
    errors::ServerError,
    integrations::{CardGateway, MpesaGateway},
    payment_routes::{initiate_payment, MpesaCallbackRoute, VerifyPaymentRoute},
    poll_worker::ReconcilerHandle,
    routes::{
        health,
        ActiveSubscriptionsRoute,
        AuthLoginRoute,
        AuthRegisterRoute,
        CancelSubscriptionRoute,
        CheckSubscriptionRoute,
        ConversationMessagesRoute,
        CreateConversationRoute,
        CreateNotificationRoute,
        CreatePlanRoute,
        CreateRobotRequestRoute,
        CreateRobotRoute,
        DeletePlanRoute,
        DeleteRobotRoute,
        MarkAllNotificationsReadRoute,
        MarkMessageReadRoute,
        MarkNotificationReadRoute,
        MyConversationsRoute,
        MyNotificationsRoute,
        MyProfileRoute,
        MyPurchasesRoute,
        MyRobotRequestsRoute,
        MySubscriptionsRoute,
        PlanByIdRoute,
        PlansRoute,
        PostChatMessageRoute,
        ReviewRobotRequestRoute,
        RobotByIdRoute,
        RobotsRoute,
        UnreadMessageCountRoute,
        UpdateRobotRoute,
        UserPurchasesRoute,
        UserRobotRequestsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    // The notification fan-out hangs off the transaction-resolved hook. Fire-and-forget: a failed notification
    // write is logged and nothing else; the settled transaction is already committed.
    let mut hooks = EventHooks::default();
    let hook_db = db.clone();
    hooks.on_transaction_resolved(move |event| {
        let db = hook_db.clone();
        Box::pin(async move { notify_transaction_resolved(db, event).await })
    });
    let handlers = EventHandlers::new(16, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let mpesa = MpesaGateway::new(DarajaConfig::new_from_env_or_default())?;
    let card = CardGateway::new();
    let reconciler = ReconcilerHandle::new(db.clone(), producers.clone(), config.reconciler);
    let srv = HttpServer::new(move || {
        let payments_api = PaymentFlowApi::new(db.clone(), producers.clone());
        let accounts_api = AccountsApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let messaging_api = MessagingApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let authority = Authority::<crate::auth::JwtClaims, Hs256, _, _>::new()
            .refresh_authorizer(|| async move { Ok(()) })
            .enable_header_tokens(true)
            .algorithm(Hs256)
            .verifying_key(config.auth.hs256_key())
            .token_signer(Some(build_token_signer(&config.auth)))
            .build()
            .expect("Failed to build authority");
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("twz::access_log"))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(messaging_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(mpesa.clone()))
            .app_data(web::Data::new(card.clone()))
            .app_data(web::Data::new(reconciler.clone()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(initiate_payment)
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(MyPurchasesRoute::<SqliteDatabase>::new())
            .service(UserPurchasesRoute::<SqliteDatabase>::new())
            .service(MySubscriptionsRoute::<SqliteDatabase>::new())
            .service(ActiveSubscriptionsRoute::<SqliteDatabase>::new())
            .service(CheckSubscriptionRoute::<SqliteDatabase>::new())
            .service(CancelSubscriptionRoute::<SqliteDatabase>::new())
            .service(CreateRobotRoute::<SqliteDatabase>::new())
            .service(UpdateRobotRoute::<SqliteDatabase>::new())
            .service(DeleteRobotRoute::<SqliteDatabase>::new())
            .service(CreatePlanRoute::<SqliteDatabase>::new())
            .service(DeletePlanRoute::<SqliteDatabase>::new())
            .service(CreateRobotRequestRoute::<SqliteDatabase>::new())
            .service(MyRobotRequestsRoute::<SqliteDatabase>::new())
            .service(UserRobotRequestsRoute::<SqliteDatabase>::new())
            .service(ReviewRobotRequestRoute::<SqliteDatabase>::new())
            .service(CreateConversationRoute::<SqliteDatabase>::new())
            .service(MyConversationsRoute::<SqliteDatabase>::new())
            .service(ConversationMessagesRoute::<SqliteDatabase>::new())
            .service(PostChatMessageRoute::<SqliteDatabase>::new())
            .service(MarkMessageReadRoute::<SqliteDatabase>::new())
            .service(UnreadMessageCountRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(MarkAllNotificationsReadRoute::<SqliteDatabase>::new())
            .service(CreateNotificationRoute::<SqliteDatabase>::new());
        app.use_jwt(authority, auth_scope)
            .service(health)
            .service(AuthRegisterRoute::<SqliteDatabase>::new())
            .service(AuthLoginRoute::<SqliteDatabase>::new())
            .service(RobotsRoute::<SqliteDatabase>::new())
            .service(RobotByIdRoute::<SqliteDatabase>::new())
            .service(PlansRoute::<SqliteDatabase>::new())
            .service(PlanByIdRoute::<SqliteDatabase>::new())
            .service(MpesaCallbackRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

async fn notify_transaction_resolved(db: SqliteDatabase, event: TransactionResolvedEvent) {
    let tx = event.transaction;
    let what = match tx.kind {
        TransactionKind::Purchase => "purchase",
        TransactionKind::Subscription => "subscription",
    };
    let message = match tx.status {
        TransactionStatus::Completed => {
            format!("Your {what} payment of {} {} completed successfully.", tx.amount, tx.currency)
        },
        TransactionStatus::Failed => format!("Your {what} payment of {} {} failed.", tx.amount, tx.currency),
        // Cancellation and pending states are not reconciler outcomes; nothing to announce.
        _ => return,
    };
    let api = MessagingApi::new(db);
    let notification =
        NewNotification { user_id: tx.user_id.clone(), message, kind: "payment".to_string(), related_id: Some(tx.id) };
    if let Err(e) = api.notify(notification).await {
        warn!("📬️ Could not store payment notification for user {}. {e}", tx.user_id);
    }
}
