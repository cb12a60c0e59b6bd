//! Configuration module for environment variable parsing.
//!
//! Every setting has a default except the Stripe credentials. The API secret
//! key is required by the web binary; the webhook secret is optional here and
//! its absence is reported per-request by the gateway.

use std::env;
use tracing::warn;

/// Origins allowed by the CORS layer when `CORS_ALLOWED_ORIGINS` is unset.
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:3000",
];

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Stripe API secret key used for payment intent creation
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<String>,

    /// Maximum age in seconds for webhook signature timestamps
    pub webhook_tolerance_secs: u64,

    /// Base URL of the Stripe REST API
    pub stripe_api_base: String,

    /// Timeout for outbound Stripe API calls in milliseconds
    pub stripe_request_timeout_ms: u64,

    /// RabbitMQ connection URL; event forwarding is disabled when unset
    pub cloudamqp_url: Option<String>,

    /// Upper bound for a single forwarded publish in milliseconds
    pub forward_timeout_ms: u64,

    /// Origins allowed to call the API from a browser
    pub cors_allowed_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("stripe_secret_key", &redacted(&self.stripe_secret_key))
            .field("stripe_webhook_secret", &redacted(&self.stripe_webhook_secret))
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("stripe_api_base", &self.stripe_api_base)
            .field("stripe_request_timeout_ms", &self.stripe_request_timeout_ms)
            .field("cloudamqp_url", &redacted(&self.cloudamqp_url))
            .field("forward_timeout_ms", &self.forward_timeout_ms)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 8000),

            stripe_secret_key: non_empty("STRIPE_SECRET_KEY"),

            stripe_webhook_secret: non_empty("STRIPE_WEBHOOK_SECRET"),

            webhook_tolerance_secs: parse_or("STRIPE_WEBHOOK_TOLERANCE_SECS", 300), // 5 minutes

            stripe_api_base: env::var("STRIPE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),

            stripe_request_timeout_ms: parse_or("STRIPE_REQUEST_TIMEOUT_MS", 10_000),

            cloudamqp_url: non_empty("CLOUDAMQP_URL"),

            forward_timeout_ms: parse_or("FORWARD_TIMEOUT_MS", 2_000),

            cors_allowed_origins: parse_csv("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| {
                DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
            }),
        }
    }
}

/// Parse a numeric variable, falling back to `default` when unset or malformed.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
