use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Hub session not open. Open a session first.")]
    SessionNotOpen,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid access token: {0}")]
    InvalidToken(#[source] reqwest::header::InvalidHeaderValue),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}
