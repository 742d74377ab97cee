// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID; empty selects the in-memory store
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    /// JWT signing secret (raw bytes).
    ///
    /// May be empty: a missing secret is reported per-request as a distinct
    /// server-misconfiguration failure, checked before any signing attempt.
    pub token_secret: Vec<u8>,
    /// Access token lifetime in seconds (much shorter than refresh)
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: u64,
    /// Google OAuth client ID used as the expected ID-token audience
    pub google_client_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Infallible: every variable has a default, and the one setting that
    /// must eventually exist (the token signing secret) is reported
    /// per-request rather than at startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_default(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            token_secret: env::var("TOKEN_SECRET").unwrap_or_default().into_bytes(),
            access_token_ttl_secs: parse_ttl("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl_secs: parse_ttl(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            ),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: String::new(),
            port: 3000,
            token_secret: b"test_token_secret_32_bytes_min!!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            google_client_id: Some("test-google-client-id".to_string()),
        }
    }
}

fn parse_ttl(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env mutation and reads stay in one test so parallel test threads
    // don't race on TOKEN_SECRET.
    #[test]
    fn test_config_from_env() {
        env::set_var("TOKEN_SECRET", "env_test_secret");
        env::set_var("ACCESS_TOKEN_TTL_SECS", "600");

        let config = Config::from_env();

        assert_eq!(config.token_secret, b"env_test_secret");
        assert_eq!(config.access_token_ttl_secs, 600);
        assert_eq!(config.refresh_token_ttl_secs, DEFAULT_REFRESH_TOKEN_TTL_SECS);

        // The secret's absence is surfaced per-request, not at startup.
        env::remove_var("TOKEN_SECRET");
        let config = Config::from_env();
        assert!(config.token_secret.is_empty());
    }

    #[test]
    fn access_ttl_shorter_than_refresh_ttl() {
        let config = Config::test_default();
        assert!(config.access_token_ttl_secs < config.refresh_token_ttl_secs);
    }
}
