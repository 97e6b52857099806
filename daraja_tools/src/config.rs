use log::*;
use twz_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct DarajaConfig {
    /// Base URL for the Daraja API, e.g. "https://sandbox.safaricom.co.ke"
    pub api_url: String,
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
    /// The Lipa na M-Pesa business short code.
    pub shortcode: String,
    pub passkey: Secret<String>,
    /// The publicly reachable URL that Daraja will POST STK callbacks to.
    pub callback_url: String,
}

impl DarajaConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("TWZ_MPESA_API_URL").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_API_URL not set, using the Safaricom sandbox as default");
            "https://sandbox.safaricom.co.ke".to_string()
        });
        let consumer_key = Secret::new(std::env::var("TWZ_MPESA_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_CONSUMER_KEY not set, using (probably useless) default");
            String::default()
        }));
        let consumer_secret = Secret::new(std::env::var("TWZ_MPESA_CONSUMER_SECRET").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_CONSUMER_SECRET not set, using (probably useless) default");
            String::default()
        }));
        let shortcode = std::env::var("TWZ_MPESA_SHORTCODE").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_SHORTCODE not set, using the sandbox test shortcode");
            "174379".to_string()
        });
        let passkey = Secret::new(std::env::var("TWZ_MPESA_PASSKEY").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_PASSKEY not set, using (probably useless) default");
            String::default()
        }));
        let callback_url = std::env::var("TWZ_MPESA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("TWZ_MPESA_CALLBACK_URL not set, callbacks will not be delivered");
            "http://localhost:8360/callback/mpesa".to_string()
        });
        Self { api_url, consumer_key, consumer_secret, shortcode, passkey, callback_url }
    }
}
