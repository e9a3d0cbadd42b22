use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Shared secret for the `/admin` approval surface (`x-api-key`).
    pub admin_api_key: String,
    pub bind_addr: String,
    /// Browser origin of the caregiver dashboard, for CORS.
    pub dashboard_origin: String,
}

impl Config {
    /// Reads configuration from the environment. DATABASE_URL and
    /// ADMIN_API_KEY have no default; startup fails without them.
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            admin_api_key: env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set"),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            dashboard_origin: env::var("DASHBOARD_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }
}
