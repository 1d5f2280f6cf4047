//! Issues short-lived credentials for the realtime notification hub.
//!
//! The hub itself is external; clients treat this credential as best-effort
//! and degrade silently when it cannot be fetched.

use chrono::Utc;

use crate::config::Config;
use crate::models::user::RealtimeTokenResponse;
use crate::utils::token::generate_token;

pub fn issue_realtime_token(config: &Config) -> RealtimeTokenResponse {
    RealtimeTokenResponse {
        token: generate_token(),
        expires_at: Utc::now()
            + chrono::Duration::seconds(config.realtime_token_ttl_seconds as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_token_expires_in_the_future() {
        let mut config = Config::load().expect("config");
        config.realtime_token_ttl_seconds = 60;
        let issued = issue_realtime_token(&config);
        assert!(!issued.token.is_empty());
        assert!(issued.expires_at > Utc::now());
    }
}
