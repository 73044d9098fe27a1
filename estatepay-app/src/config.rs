//! Configuration loading from environment.

use std::env;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Paystack secret key; also the webhook signing secret.
    pub paystack_secret_key: String,
    /// Override for the provider API base URL (stubs, test servers).
    pub paystack_base_url: Option<String>,
    /// Frontend origin payers return to after the hosted payment page.
    pub frontend_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let paystack_secret_key = env::var("PAYSTACK_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("PAYSTACK_SECRET_KEY environment variable is required"))?;

        let paystack_base_url = env::var("PAYSTACK_BASE_URL").ok();

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            port,
            database_url,
            paystack_secret_key,
            paystack_base_url,
            frontend_url,
        })
    }
}
