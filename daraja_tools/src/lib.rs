//! # Daraja tools
//!
//! A small client for the Safaricom Daraja (M-Pesa) API, covering the subset of the API that the TradeWizard
//! backend needs:
//! * OAuth access-token generation
//! * Lipa na M-Pesa Online (STK push) payment initiation
//! * STK push transaction status queries
//! * Deserialization of the asynchronous STK callback envelope
//!
//! Credentials and endpoints are read from the environment; see [`config::DarajaConfig`].

pub mod config;
pub mod data_objects;
pub mod helpers;

mod api;
mod error;

pub use api::DarajaApi;
pub use config::DarajaConfig;
pub use data_objects::{StkCallback, StkCallbackEnvelope, StkPushResponse, StkQueryResponse};
pub use error::DarajaApiError;
