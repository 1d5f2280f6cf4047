pub mod github;
pub mod linkedin;

/// Outcome of talking to a third-party API.
#[derive(Debug)]
pub enum IntegrationApiError {
    /// The provider rejected the credentials.
    Rejected,
    /// The provider could not be reached or answered unexpectedly.
    Unreachable(anyhow::Error),
}
