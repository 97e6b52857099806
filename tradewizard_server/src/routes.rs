//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will
//! cause the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database
//! queries, gateway calls) must be expressed as futures or asynchronous functions, which get executed
//! concurrently by the worker threads.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::json;
use tradewizard_engine::{
    db_types::{NewChatMessage, NewNotification, NewRobot, NewRobotRequest, NewSubscriptionPlan, Role, RobotUpdate, TransactionKind},
    traits::{CatalogManagement, MessagingManagement, PaymentLedgerDatabase, UserManagement},
    AccountsApi,
    CatalogApi,
    MessagingApi,
    PaymentFlowApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        CreateNotificationRequest,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        NewConversationRequest,
        RegisterRequest,
        ReviewRobotRequest,
        UnreadCountResponse,
        UserView,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth_register => Post "/auth/register" impl UserManagement);
/// Create a new user account. Open route; new accounts never get the Admin role this way.
pub async fn auth_register<B: UserManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AccountsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let RegisterRequest { name, email, password } = body.into_inner();
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ServerError::ValidationError("name, email and password are all required".into()));
    }
    let user = api.register(name, email, &password).await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

route!(auth_login => Post "/auth/login" impl UserManagement);
/// Exchange an email/password pair for a JWT access token.
///
/// The token is valid for 24 hours and does NOT refresh. Clients supply it in the `access_token` header on
/// every authenticated request.
pub async fn auth_login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AccountsApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    let user = api.authenticate(&email, &password).await?;
    let access_token = signer.issue_token(&user, None)?;
    debug!("💻️ Issued access token for {}", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserView::from(&user),
    }))
}

route!(my_profile => Get "/me" impl UserManagement);
pub async fn my_profile<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AccountsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_profile for {}", claims.sub);
    let user = api.fetch_user(&claims.sub).await?.ok_or_else(|| ServerError::NoRecordFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(robots => Get "/robots" impl CatalogManagement);
/// The public robot catalog.
pub async fn robots<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    let robots = api.robots().await?;
    Ok(HttpResponse::Ok().json(robots))
}

route!(robot_by_id => Get "/robots/{robot_id}" impl CatalogManagement);
pub async fn robot_by_id<B: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let robot = api.robot_by_id(&id).await?.ok_or_else(|| ServerError::NoRecordFound("Robot not found".into()))?;
    Ok(HttpResponse::Ok().json(robot))
}

route!(create_robot => Post "/robots" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_robot<A: CatalogManagement>(
    body: web::Json<NewRobot>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let robot = api.create_robot(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(robot))
}

route!(update_robot => Patch "/robots/{robot_id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_robot<A: CatalogManagement>(
    path: web::Path<String>,
    body: web::Json<RobotUpdate>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let robot = api.update_robot(&id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(robot))
}

route!(delete_robot => Delete "/robots/{robot_id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_robot<A: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_robot(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Robot deleted successfully")))
}

//----------------------------------------------   Plans  ----------------------------------------------------
route!(plans => Get "/plans" impl CatalogManagement);
pub async fn plans<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    let plans = api.plans().await?;
    Ok(HttpResponse::Ok().json(plans))
}

route!(plan_by_id => Get "/plans/{plan_id}" impl CatalogManagement);
pub async fn plan_by_id<B: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let plan =
        api.plan_by_id(&id).await?.ok_or_else(|| ServerError::NoRecordFound("Subscription plan not found".into()))?;
    Ok(HttpResponse::Ok().json(plan))
}

route!(create_plan => Post "/plans" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_plan<A: CatalogManagement>(
    body: web::Json<NewSubscriptionPlan>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let plan = api.create_plan(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(plan))
}

route!(delete_plan => Delete "/plans/{plan_id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_plan<A: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_plan(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Subscription plan deleted successfully")))
}

//----------------------------------------------   Purchases  ----------------------------------------------------
route!(my_purchases => Get "/purchases" impl PaymentLedgerDatabase);
/// Authenticated users fetch their own purchases with this endpoint. Admins can use
/// `/users/{user_id}/purchases` to fetch anyone's.
pub async fn my_purchases<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_purchases for {}", claims.sub);
    let purchases = api.transactions_for_user(&claims.sub, Some(TransactionKind::Purchase)).await?;
    Ok(HttpResponse::Ok().json(purchases))
}

route!(user_purchases => Get "/users/{user_id}/purchases" impl PaymentLedgerDatabase);
pub async fn user_purchases<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    if !claims.may_access(&user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to view these purchases".into()));
    }
    let purchases = api.transactions_for_user(&user_id, Some(TransactionKind::Purchase)).await?;
    Ok(HttpResponse::Ok().json(purchases))
}

//----------------------------------------------   Subscriptions  ----------------------------------------------------
route!(my_subscriptions => Get "/subscriptions" impl PaymentLedgerDatabase);
pub async fn my_subscriptions<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_subscriptions for {}", claims.sub);
    let subscriptions = api.transactions_for_user(&claims.sub, Some(TransactionKind::Subscription)).await?;
    Ok(HttpResponse::Ok().json(subscriptions))
}

route!(active_subscriptions => Get "/subscriptions/active" impl PaymentLedgerDatabase);
pub async fn active_subscriptions<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let subscriptions = api.active_subscriptions_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(subscriptions))
}

route!(check_subscription => Get "/subscriptions/check/{plan_id}" impl PaymentLedgerDatabase);
/// Check whether the authenticated user holds an active subscription for a specific plan.
pub async fn check_subscription<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let plan_id = path.into_inner();
    let has_subscription = api.has_active_subscription(&claims.sub, &plan_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "has_subscription": has_subscription })))
}

route!(cancel_subscription => Post "/subscriptions/cancel/{transaction_id}" impl PaymentLedgerDatabase);
/// Cancel an active subscription. This is the only legal transition out of a terminal payment status, and it is
/// user-initiated; the reconciliation triggers never produce it.
pub async fn cancel_subscription<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = path.into_inner();
    info!("💻️ Cancel subscription request for {transaction_id} from {}", claims.sub);
    api.cancel_subscription(&transaction_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Subscription cancelled successfully")))
}

//----------------------------------------------   Robot requests  ----------------------------------------------------
route!(create_robot_request => Post "/robot-requests" impl CatalogManagement);
pub async fn create_robot_request<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewRobotRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    if !(1..=5).contains(&request.risk_level) {
        return Err(ServerError::ValidationError("risk_level must be between 1 and 5".into()));
    }
    let request = api.create_robot_request(&claims.sub, request).await?;
    Ok(HttpResponse::Ok().json(request))
}

route!(my_robot_requests => Get "/robot-requests" impl CatalogManagement);
pub async fn my_robot_requests<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let requests = api.robot_requests_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(requests))
}

route!(user_robot_requests => Get "/users/{user_id}/robot-requests" impl CatalogManagement);
pub async fn user_robot_requests<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    if !claims.may_access(&user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to view these requests".into()));
    }
    let requests = api.robot_requests_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

route!(review_robot_request => Patch "/robot-requests/{request_id}" impl CatalogManagement where requires [Role::Admin]);
/// Admin review of a custom-robot request: approve or reject.
pub async fn review_robot_request<A: CatalogManagement>(
    path: web::Path<String>,
    body: web::Json<ReviewRobotRequest>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let request = api.review_robot_request(&id, body.into_inner().status).await?;
    Ok(HttpResponse::Ok().json(request))
}

//----------------------------------------------   Chat  ----------------------------------------------------
route!(create_conversation => Post "/chat/conversations" impl MessagingManagement);
pub async fn create_conversation<B: MessagingManagement>(
    claims: JwtClaims,
    body: web::Json<NewConversationRequest>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversation = api.create_conversation(&claims.sub, body.into_inner().title).await?;
    Ok(HttpResponse::Ok().json(conversation))
}

route!(my_conversations => Get "/chat/conversations" impl MessagingManagement);
pub async fn my_conversations<B: MessagingManagement>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversations = api.conversations_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

route!(conversation_messages => Get "/chat/conversations/{conversation_id}/messages" impl MessagingManagement);
pub async fn conversation_messages<B: MessagingManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversation_id = path.into_inner();
    let conversation = api
        .conversation(&conversation_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Conversation not found".into()))?;
    if !claims.may_access(&conversation.user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to view this conversation".into()));
    }
    let messages = api.messages(&conversation_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

route!(post_chat_message => Post "/chat/messages" impl MessagingManagement);
pub async fn post_chat_message<B: MessagingManagement>(
    claims: JwtClaims,
    body: web::Json<NewChatMessage>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewChatMessage { conversation_id, content } = body.into_inner();
    if content.trim().is_empty() {
        return Err(ServerError::ValidationError("message content cannot be empty".into()));
    }
    let conversation = api
        .conversation(&conversation_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Conversation not found".into()))?;
    if !claims.may_access(&conversation.user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to post to this conversation".into()));
    }
    let message = api.post_message(&conversation_id, &claims.sub, &content).await?;
    Ok(HttpResponse::Ok().json(message))
}

route!(mark_message_read => Put "/chat/messages/{message_id}/read" impl MessagingManagement);
pub async fn mark_message_read<B: MessagingManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let message_id = path.into_inner();
    let message =
        api.message(&message_id).await?.ok_or_else(|| ServerError::NoRecordFound("Message not found".into()))?;
    let conversation = api
        .conversation(&message.conversation_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Conversation not found".into()))?;
    if !claims.may_access(&conversation.user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to mark this message as read".into()));
    }
    api.mark_message_read(&message_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Message marked as read")))
}

route!(unread_message_count => Get "/chat/messages/unread/count" impl MessagingManagement);
pub async fn unread_message_count<B: MessagingManagement>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let unread_count = api.unread_message_count(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(UnreadCountResponse { unread_count }))
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(my_notifications => Get "/notifications" impl MessagingManagement);
pub async fn my_notifications<B: MessagingManagement>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let notifications = api.notifications_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(mark_notification_read => Put "/notifications/{notification_id}/read" impl MessagingManagement);
pub async fn mark_notification_read<B: MessagingManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.mark_notification_read(&id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Notification marked as read")))
}

route!(mark_all_notifications_read => Put "/notifications/read-all" impl MessagingManagement);
pub async fn mark_all_notifications_read<B: MessagingManagement>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let marked = api.mark_all_notifications_read(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{marked} notifications marked as read"))))
}

route!(create_notification => Post "/notifications" impl MessagingManagement where requires [Role::Admin]);
/// Admins can push a notification to any user (system announcements, robot request outcomes, etc).
pub async fn create_notification<A: MessagingManagement>(
    body: web::Json<CreateNotificationRequest>,
    api: web::Data<MessagingApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let CreateNotificationRequest { user_id, message, kind, related_id } = body.into_inner();
    let notification = api.notify(NewNotification { user_id, message, kind, related_id }).await?;
    Ok(HttpResponse::Ok().json(notification))
}
