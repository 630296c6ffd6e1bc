//! Client Module
//! Mission: Talk to the API as a logged-in student from outside the browser

pub mod api_client;
pub mod session;
pub mod storage;

pub use api_client::ApiClient;
pub use session::{decode_unverified, SessionHolder, SessionState};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx answer; `message` is the server's text or `error` field
    #[error("server answered {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("not logged in")]
    NotAuthenticated,
    #[error("server returned a malformed token")]
    MalformedToken,
    #[error("token storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// The server refused the token (401/403)
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { status: 401 | 403, .. })
    }
}
