//! Client library for the Folio backend: credential store, auth session
//! orchestrator, and API client.

pub mod api;
pub mod error;
pub mod state;

pub use api::{ApiClient, AuthUser};
pub use error::ApiError;
pub use state::auth::{login_path, AuthSession, AuthState, LogoutOptions};
pub use state::credentials::{CookieJar, CookieNames, CredentialStore, MemoryJar};
