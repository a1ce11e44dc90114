use crate::leave::balance::DriftPolicy;
use dotenvy::dotenv;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting, requests per minute per peer IP
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    /// What to do when a balance bucket would go negative:
    /// `clamp` (floor at 0, legacy behavior) or `reject`.
    pub leave_drift_policy: DriftPolicy,

    pub api_prefix: String,
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not valid: {e:?}")),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: required("SERVER_ADDR"),
            database_url: required("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET"),

            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900), // 15 min
            refresh_token_ttl: parsed_or("REFRESH_TOKEN_TTL", 604_800), // 7 days

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60),
            rate_register_per_min: parsed_or("RATE_REGISTER_PER_MIN", 30),
            rate_refresh_per_min: parsed_or("RATE_REFRESH_PER_MIN", 30),
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000),

            leave_drift_policy: env::var("LEAVE_DRIFT_POLICY")
                .unwrap_or_else(|_| "clamp".to_string())
                .parse()
                .expect("LEAVE_DRIFT_POLICY must be 'clamp' or 'reject'"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
