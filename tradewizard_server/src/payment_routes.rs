//! The payment flow routes: initiation, verification, and the provider callback.
//!
//! Initiation validates the request, submits the charge to the right gateway, persists a `Pending` ledger
//! record, and spawns the background status poller before returning. Verification is a pure read.
//! The callback is the provider-facing trigger: it must acknowledge with HTTP 200 no matter what, because the
//! provider retries callbacks that receive error responses.

use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use daraja_tools::StkCallbackEnvelope;
use log::*;
use tradewizard_engine::{
    api::transaction_objects::TransactionStatusView,
    db_types::{NewSubscriptionDetail, NewTransaction, PaymentMethodDetails, TransactionKind},
    traits::{ChargeRequest, GatewayError, PaymentGatewayClient, PaymentLedgerDatabase},
    CatalogApi,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::JwtClaims,
    data_objects::{InitiatePaymentRequest, InitiatePaymentResponse, JsonResponse},
    errors::ServerError,
    integrations::{CardGateway, MpesaGateway, PaymentGateways},
    poll_worker::ReconcilerHandle,
    route,
};

/// Initiate a payment for a robot purchase or a plan subscription.
///
/// The gateway call is made synchronously, but the payment itself resolves asynchronously: the response carries
/// a `Pending` transaction id, and either the provider callback or the background poller will settle it.
/// If the gateway is unreachable, a synthetic correlation id is substituted so the ledger record is still
/// created; the transaction then stays `Pending` until reconciliation.
#[post("/payments/initiate")]
pub async fn initiate_payment(
    claims: JwtClaims,
    body: web::Json<InitiatePaymentRequest>,
    ledger: web::Data<PaymentFlowApi<SqliteDatabase>>,
    catalog: web::Data<CatalogApi<SqliteDatabase>>,
    mpesa: web::Data<MpesaGateway>,
    card: web::Data<CardGateway>,
    reconciler: web::Data<ReconcilerHandle>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    trace!("💻️ Received payment initiation request from {}", claims.sub);
    if !request.amount.is_positive() {
        return Err(ServerError::ValidationError("amount must be positive".into()));
    }
    if request.currency.trim().is_empty() {
        return Err(ServerError::ValidationError("currency is required".into()));
    }

    // Resolve the item reference and build the ledger record for it.
    let new_tx = match request.kind {
        TransactionKind::Purchase => {
            let robot = catalog
                .robot_by_id(&request.item_id)
                .await?
                .ok_or_else(|| ServerError::NoRecordFound("Robot not found".into()))?;
            debug!("💻️ Payment initiation for robot {} by {}", robot.id, claims.sub);
            NewTransaction::purchase(
                claims.sub.clone(),
                robot.id,
                request.amount,
                request.currency.clone(),
                request.details.label(),
            )
        },
        TransactionKind::Subscription => {
            let plan = catalog
                .plan_by_id(&request.item_id)
                .await?
                .ok_or_else(|| ServerError::NoRecordFound("Subscription plan not found".into()))?;
            debug!("💻️ Payment initiation for plan {} by {}", plan.id, claims.sub);
            let start_date = Utc::now();
            let detail = NewSubscriptionDetail { start_date, end_date: Some(start_date + plan.interval.period()) };
            NewTransaction::subscription(
                claims.sub.clone(),
                plan.id,
                request.amount,
                request.currency.clone(),
                request.details.label(),
                detail,
            )
        },
    };

    let gateway = match &request.details {
        PaymentMethodDetails::Mpesa { .. } => PaymentGateways::Mpesa(mpesa.get_ref().clone()),
        PaymentMethodDetails::Card { .. } => PaymentGateways::Card(card.get_ref().clone()),
    };
    let charge = ChargeRequest {
        transaction_id: new_tx.id.clone(),
        amount: request.amount,
        currency: request.currency.clone(),
        description: format!("TradeWizard {} payment", new_tx.kind),
        method: request.details.clone(),
    };
    let correlation_id = match gateway.charge(&charge).await {
        Ok(result) => result.correlation_id,
        Err(GatewayError::Unavailable(e)) => {
            // Gateway unavailability is non-fatal to record creation. The transaction stays pending until
            // reconciliation catches up.
            warn!("💻️ Payment gateway unreachable during initiation ({e}). Falling back to a local correlation id.");
            format!("twz-{}", uuid::Uuid::new_v4())
        },
        Err(e) => {
            debug!("💻️ Charge rejected during initiation. {e}");
            return Err(ServerError::ValidationError(e.to_string()));
        },
    };

    let transaction = ledger.create_transaction(new_tx.with_correlation_id(correlation_id.clone())).await?;
    // Fire-and-forget: the caller gets the pending reference immediately, the poller settles it later.
    reconciler.spawn_poller(gateway, transaction.id.clone(), correlation_id.clone());

    let message = match &request.details {
        PaymentMethodDetails::Mpesa { .. } => "Payment initiated successfully. Please check your phone.",
        PaymentMethodDetails::Card { .. } => "Payment initiated successfully.",
    };
    Ok(HttpResponse::Ok().json(InitiatePaymentResponse {
        success: true,
        message: message.to_string(),
        transaction_id: transaction.id,
        correlation_id,
    }))
}

route!(verify_payment => Get "/payments/verify/{transaction_id}" impl PaymentLedgerDatabase);
/// Report the current status of a transaction.
///
/// Purely a read: the real provider outcome lands via the poller or the callback, so this endpoint never
/// queries the gateway and never transitions state. Users may only verify their own transactions; admins may
/// verify any.
pub async fn verify_payment<B: PaymentLedgerDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = path.into_inner();
    debug!("💻️ GET verify_payment({transaction_id}) for {}", claims.sub);
    let transaction = api
        .fetch_transaction(&transaction_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Transaction not found".into()))?;
    if !claims.may_access(&transaction.user_id) {
        return Err(ServerError::InsufficientPermissions("Not authorized to view this transaction".into()));
    }
    Ok(HttpResponse::Ok().json(TransactionStatusView::from(&transaction)))
}

route!(mpesa_callback => Post "/callback/mpesa" impl PaymentLedgerDatabase);
/// The Daraja STK callback. Unauthenticated by necessity; the payload's correlation id only matches a pending
/// transaction once, so replayed or late callbacks are no-ops.
///
/// Responses must always be HTTP 200: the provider retries callbacks that receive error responses, which is
/// exactly what we do not want. Malformed payloads are acknowledged negatively in the body instead.
pub async fn mpesa_callback<B: PaymentLedgerDatabase>(
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B>>,
) -> HttpResponse {
    trace!("💻️ Received M-Pesa callback");
    let envelope: StkCallbackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("💻️ Could not parse M-Pesa callback payload. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not parse callback payload"));
        },
    };
    let callback = envelope.body.stk_callback;
    let succeeded = callback.is_successful();
    info!(
        "💻️ M-Pesa callback for checkout request {} with result code {} ({})",
        callback.checkout_request_id, callback.result_code, callback.result_desc
    );
    let result = match api.reconcile_by_correlation_id(&callback.checkout_request_id, succeeded).await {
        Ok(Some(tx)) => {
            info!("💻️ Transaction [{}] settled to {} by the provider callback", tx.id, tx.status);
            JsonResponse::success(format!("Transaction {} {}", tx.id, tx.status))
        },
        Ok(None) => {
            info!("💻️ Callback for {} matched no pending transaction. Acknowledged.", callback.checkout_request_id);
            JsonResponse::success("Already processed")
        },
        Err(e) => {
            error!("💻️ Could not process M-Pesa callback. {e}");
            JsonResponse::failure("Could not process callback")
        },
    };
    HttpResponse::Ok().json(result)
}
