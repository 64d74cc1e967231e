use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub booking_rules: BookingRules,
}

/// Policy knobs for the reservation flow
#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_max_passengers")]
    pub max_passengers_per_reservation: i32,
    #[serde(default = "default_cancellation_cutoff")]
    pub cancellation_cutoff_hours: i64,
    #[serde(default = "default_max_advance_days")]
    pub max_advance_days: i64,
    /// When the occupancy lookup fails, `false` (the default) blocks booking
    /// instead of treating the bus as empty
    #[serde(default)]
    pub occupancy_fail_open: bool,
}

fn default_max_passengers() -> i32 { 5 }
fn default_cancellation_cutoff() -> i64 { 24 }
fn default_max_advance_days() -> i64 { 30 }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_passengers_per_reservation: default_max_passengers(),
            cancellation_cutoff_hours: default_cancellation_cutoff(),
            max_advance_days: default_max_advance_days(),
            occupancy_fail_open: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of RAPIDA)
            // Eg. `RAPIDA__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("RAPIDA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
