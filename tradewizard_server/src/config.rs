use std::{env, time::Duration};

use jwt_compact::alg::Hs256Key;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use twz_common::{helpers::parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_TWZ_HOST: &str = "127.0.0.1";
const DEFAULT_TWZ_PORT: u16 = 8000;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(6);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub reconciler: ReconcilerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TWZ_HOST.to_string(),
            port: DEFAULT_TWZ_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TWZ_HOST").ok().unwrap_or_else(|| DEFAULT_TWZ_HOST.into());
        let port = env::var("TWZ_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TWZ_PORT. {e} Using the default, {DEFAULT_TWZ_PORT}, instead."
                    );
                    DEFAULT_TWZ_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TWZ_PORT);
        let database_url = env::var("TWZ_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TWZ_DATABASE_URL is not set. Please set it to the URL for the TradeWizard database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let reconciler = ReconcilerConfig::from_env_or_default();
        Self { host, port, database_url, auth, reconciler }
    }
}

//-----------------------------------------  ReconcilerConfig  --------------------------------------------------------
/// Tuning for the background payment status poller.
#[derive(Clone, Copy, Debug)]
pub struct ReconcilerConfig {
    /// How long the poller sleeps between gateway status queries.
    pub poll_interval: Duration,
    /// The poller gives up after this many attempts.
    pub max_poll_attempts: u32,
    /// When true, the final attempt forces a resolution even if the gateway never gave a conclusive answer.
    /// An inconclusive forced resolution fails the payment; it never guesses success.
    pub force_resolve_on_exhaustion: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            force_resolve_on_exhaustion: true,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env_or_default() -> Self {
        let poll_interval = env::var("TWZ_POLL_INTERVAL_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ TWZ_POLL_INTERVAL_SECS is not set. Using the default value of {}s.",
                    DEFAULT_POLL_INTERVAL.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for TWZ_POLL_INTERVAL_SECS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let max_poll_attempts = env::var("TWZ_MAX_POLL_ATTEMPTS")
            .map_err(|_| {
                info!(
                    "🪛️ TWZ_MAX_POLL_ATTEMPTS is not set. Using the default value of {DEFAULT_MAX_POLL_ATTEMPTS}."
                )
            })
            .and_then(|s| {
                s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid configuration value for TWZ_MAX_POLL_ATTEMPTS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS);
        let force_resolve_on_exhaustion =
            parse_boolean_flag(env::var("TWZ_FORCE_RESOLVE_ON_EXHAUSTION").ok(), true);
        Self { poll_interval, max_poll_attempts, force_resolve_on_exhaustion }
    }
}

//-------------------------------------------  AuthConfig  ------------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify JWT access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since all issued tokens become invalid when the server restarts. Set TWZ_JWT_SECRET \
             instead. 🚨️🚨️🚨️"
        );
        let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("TWZ_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [TWZ_JWT_SECRET]")))?;
        if secret.len() < 32 {
            warn!("🪛️ TWZ_JWT_SECRET is shorter than 32 characters. Consider using a longer secret.");
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }

    pub fn hs256_key(&self) -> Hs256Key {
        Hs256Key::new(self.jwt_secret.reveal().as_bytes())
    }
}
