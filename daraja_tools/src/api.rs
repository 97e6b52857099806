use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use twz_common::Money;

use crate::{
    config::DarajaConfig,
    data_objects::{AccessTokenResponse, StkPushRequest, StkQueryRequest},
    helpers::{daraja_timestamp, lipa_password},
    DarajaApiError,
    StkPushResponse,
    StkQueryResponse,
};

/// The transaction type for Lipa na M-Pesa Online pay-bill charges.
const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Clone)]
pub struct DarajaApi {
    config: DarajaConfig,
    client: Arc<Client>,
}

impl DarajaApi {
    pub fn new(config: DarajaConfig) -> Result<Self, DarajaApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| DarajaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Fetch a fresh OAuth access token. Daraja tokens are short-lived, so one is requested per API call rather
    /// than cached.
    pub async fn access_token(&self) -> Result<String, DarajaApiError> {
        let auth = base64::encode(format!(
            "{}:{}",
            self.config.consumer_key.reveal(),
            self.config.consumer_secret.reveal()
        ));
        let url = self.url("/oauth/v1/generate?grant_type=client_credentials");
        trace!("Requesting Daraja access token");
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Basic {auth}"))
            .send()
            .await
            .map_err(|e| DarajaApiError::AuthTokenError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err(DarajaApiError::QueryError { status, message });
        }
        let token: AccessTokenResponse =
            response.json().await.map_err(|e| DarajaApiError::JsonError(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn authorized_post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DarajaApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("Sending Daraja request: {url}");
        let response = self
            .client
            .request(Method::POST, url)
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .map_err(|e| DarajaApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Daraja request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| DarajaApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| DarajaApiError::RestResponseError(e.to_string()))?;
            Err(DarajaApiError::QueryError { status, message })
        }
    }

    /// Initiate an STK push to `phone` for `amount`. The returned `CheckoutRequestID` is the correlation id for
    /// all subsequent status queries and callbacks.
    pub async fn stk_push(
        &self,
        phone: &str,
        amount: Money,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushResponse, DarajaApiError> {
        let timestamp = daraja_timestamp(Utc::now());
        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password: lipa_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp),
            timestamp,
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount: amount.whole_units(),
            party_a: phone.to_string(),
            party_b: self.config.shortcode.clone(),
            phone_number: phone.to_string(),
            callback_url: self.config.callback_url.clone(),
            account_reference: account_reference.to_string(),
            transaction_desc: description.to_string(),
        };
        debug!("Initiating STK push of {amount} to {phone}");
        let response: StkPushResponse = self.authorized_post("/mpesa/stkpush/v1/processrequest", &request).await?;
        info!("STK push accepted with checkout request id {}", response.checkout_request_id);
        Ok(response)
    }

    /// Query the status of a previously initiated STK push.
    pub async fn stk_query(&self, checkout_request_id: &str) -> Result<StkQueryResponse, DarajaApiError> {
        let timestamp = daraja_timestamp(Utc::now());
        let request = StkQueryRequest {
            business_short_code: self.config.shortcode.clone(),
            password: lipa_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp),
            timestamp,
            checkout_request_id: checkout_request_id.to_string(),
        };
        debug!("Querying STK push status for {checkout_request_id}");
        self.authorized_post("/mpesa/stkpushquery/v1/query", &request).await
    }
}
