//! TradeWizard Engine
//!
//! The engine contains the storage-backed domain logic for the TradeWizard marketplace: user accounts, the robot
//! catalog, subscription plans, support messaging, notifications, and, at its heart, the payment transaction
//! ledger and its reconciliation state machine.
//!
//! The library is divided into two main sections:
//! 1. Storage management ([`mod@sqlite`]). SQLite is the supported backend. You should never need to touch the
//!    database directly; use the public APIs instead. The exception is the data types stored in the database,
//!    which are defined in [`mod@db_types`] and are public.
//! 2. The public API surface ([`mod@api`]). Specific backends implement the traits in [`mod@traits`] in order to
//!    act as storage for the server.
//!
//! The engine also provides a set of events that can be subscribed to. When a payment transaction reaches a
//! terminal state, a `TransactionResolvedEvent` is emitted; the notification fan-out hangs off this hook, so
//! delivery failures can never roll a transaction back.

pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    accounts_api::AccountsApi,
    catalog_api::CatalogApi,
    messaging_api::MessagingApi,
    payment_flow_api::PaymentFlowApi,
    transaction_objects,
};
