pub mod client;
pub mod types;

pub use client::{login_error_message, ApiClient, CSRF_HEADER};
pub use types::{token_from_payload, user_from_payload, AuthUser, RealtimeToken, SessionEnvelope};
