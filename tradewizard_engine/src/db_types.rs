use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;
use twz_common::Money;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Any authenticated account holder.
    User,
    /// Marketplace staff. Admins manage the catalog, plans and robot requests, and may read any user's records.
    Admin,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
/// The lifecycle states of a payment-bearing record.
///
/// `Pending` is the only non-terminal state. The reconciler moves a transaction out of `Pending` exactly once;
/// the sole transition between terminal states is `Completed` → `Cancelled` for subscriptions, triggered by an
/// explicit user cancellation rather than by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Created, awaiting the provider outcome.
    Pending,
    /// The provider confirmed the charge. For subscriptions this is the "active" state.
    Completed,
    /// The provider rejected the charge, or polling was exhausted without a confirmation.
    Failed,
    /// A previously completed subscription was cancelled by its owner.
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Completed => write!(f, "Completed"),
            TransactionStatus::Failed => write!(f, "Failed"),
            TransactionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//--------------------------------------   TransactionKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionKind {
    /// A once-off robot purchase.
    Purchase,
    /// A recurring subscription to a plan. Carries a [`SubscriptionDetail`] extension record.
    Subscription,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Purchase => write!(f, "Purchase"),
            TransactionKind::Subscription => write!(f, "Subscription"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(Self::Purchase),
            "Subscription" => Ok(Self::Subscription),
            s => Err(ConversionError(format!("Invalid transaction kind: {s}"))),
        }
    }
}

//-------------------------------------- PaymentMethodDetails ---------------------------------------------------------
/// The payer-supplied charge instrument, validated at the HTTP boundary before it reaches the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethodDetails {
    Mpesa { phone_number: String },
    Card { card_number: String, expiry: String, cvv: String },
}

impl PaymentMethodDetails {
    /// The label stored in the transaction's `payment_method` column.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethodDetails::Mpesa { .. } => "Mpesa",
            PaymentMethodDetails::Card { .. } => "Card",
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
/// A payment-bearing ledger record: one row per purchase or subscription attempt. Rows are never deleted; the
/// ledger is the audit trail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    /// Robot id for purchases, plan id for subscriptions.
    pub item_id: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub currency: String,
    pub payment_method: String,
    /// Provider-issued correlation id; the join key used by the poller and callback to locate this record.
    /// Null until the gateway call returns. Synthetic (`twz-` prefixed) ids are substituted when the gateway
    /// was unreachable during initiation.
    pub correlation_id: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub subscription: Option<SubscriptionDetail>,
}

impl Transaction {
    pub fn is_active_subscription(&self) -> bool {
        self.subscription.as_ref().map(|s| s.is_active).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct SubscriptionDetail {
    pub transaction_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

//--------------------------------------    NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub currency: String,
    pub payment_method: String,
    pub correlation_id: Option<String>,
    pub subscription: Option<NewSubscriptionDetail>,
}

#[derive(Debug, Clone)]
pub struct NewSubscriptionDetail {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn purchase(user_id: String, robot_id: String, amount: Money, currency: String, method: &str) -> Self {
        Self {
            id: new_record_id(),
            user_id,
            item_id: robot_id,
            kind: TransactionKind::Purchase,
            amount,
            currency,
            payment_method: method.to_string(),
            correlation_id: None,
            subscription: None,
        }
    }

    pub fn subscription(
        user_id: String,
        plan_id: String,
        amount: Money,
        currency: String,
        method: &str,
        detail: NewSubscriptionDetail,
    ) -> Self {
        Self {
            id: new_record_id(),
            user_id,
            item_id: plan_id,
            kind: TransactionKind::Subscription,
            amount,
            currency,
            payment_method: method.to_string(),
            correlation_id: None,
            subscription: Some(detail),
        }
    }

    pub fn with_correlation_id<S: Into<String>>(mut self, correlation_id: S) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Server-generated record ids are v4 uuids.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

//--------------------------------------        User          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn roles(&self) -> Roles {
        if self.is_admin {
            vec![Role::User, Role::Admin]
        } else {
            vec![Role::User]
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self { id: new_record_id(), name, email, password_hash, is_admin: false }
    }
}

//--------------------------------------        Robot         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Robot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub currency: String,
    pub features: Json<Vec<String>>,
    pub image_url: Option<String>,
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRobot {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub currency: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Partial update for a robot. Empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RobotUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub currency: Option<String>,
    pub features: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub download_url: Option<String>,
}

impl RobotUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.features.is_none()
            && self.image_url.is_none()
            && self.download_url.is_none()
    }
}

//--------------------------------------     RobotRequest     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "Pending"),
            RequestStatus::Approved => write!(f, "Approved"),
            RequestStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid request status: {s}"))),
        }
    }
}

/// A user's request for a custom trading robot build.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RobotRequest {
    pub id: String,
    pub user_id: String,
    pub robot_type: String,
    pub trading_pairs: String,
    pub timeframe: String,
    pub risk_level: i64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRobotRequest {
    pub robot_type: String,
    pub trading_pairs: String,
    pub timeframe: String,
    pub risk_level: i64,
}

//--------------------------------------   SubscriptionPlan   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PlanInterval {
    Monthly,
    Yearly,
}

impl PlanInterval {
    /// The nominal length of one billing period.
    pub fn period(&self) -> chrono::Duration {
        match self {
            PlanInterval::Monthly => chrono::Duration::days(30),
            PlanInterval::Yearly => chrono::Duration::days(365),
        }
    }
}

impl Display for PlanInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanInterval::Monthly => write!(f, "Monthly"),
            PlanInterval::Yearly => write!(f, "Yearly"),
        }
    }
}

impl FromStr for PlanInterval {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Monthly" => Ok(Self::Monthly),
            "Yearly" => Ok(Self::Yearly),
            s => Err(ConversionError(format!("Invalid plan interval: {s}"))),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub currency: String,
    pub interval: PlanInterval,
    pub features: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscriptionPlan {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub currency: String,
    pub interval: PlanInterval,
    #[serde(default)]
    pub features: Vec<String>,
}

//--------------------------------------      Messaging       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub admin_id: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChatMessage {
    pub conversation_id: String,
    pub content: String,
}

//--------------------------------------     Notification     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    /// Free-form discriminator, e.g. "payment", "robot_request", "message", "system".
    pub kind: String,
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub message: String,
    pub kind: String,
    pub related_id: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in ["Pending", "Completed", "Failed", "Cancelled"] {
            let status: TransactionStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("Paid".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn tagged_payment_method_deserialization() {
        let mpesa: PaymentMethodDetails =
            serde_json::from_str(r#"{"method": "mpesa", "phone_number": "0712345678"}"#).unwrap();
        assert_eq!(mpesa.label(), "Mpesa");
        let card: PaymentMethodDetails = serde_json::from_str(
            r#"{"method": "card", "card_number": "4242424242424242", "expiry": "12/29", "cvv": "123"}"#,
        )
        .unwrap();
        assert_eq!(card.label(), "Card");
    }

    #[test]
    fn admin_roles_include_user() {
        let now = chrono::Utc::now();
        let user = User {
            id: new_record_id(),
            name: "a".into(),
            email: "a@b.c".into(),
            password_hash: String::new(),
            is_admin: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.roles(), vec![Role::User, Role::Admin]);
    }
}
