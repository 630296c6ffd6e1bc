//! Client Session Holder
//! Mission: Hold one token, attach it to outgoing requests, forget it on logout
//!
//! Claims decoded here are for display. The server verifies the token on
//! every protected call; nothing on this side is a trust decision.

use crate::auth::models::Claims;
use crate::client::storage::TokenStorage;
use crate::client::ClientError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::RequestBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// Credentials sent, or a stored token awaiting a server check
    PendingVerification,
    Authenticated(Claims),
}

pub struct SessionHolder<S: TokenStorage> {
    storage: S,
    state: SessionState,
    token: Option<String>,
}

impl<S: TokenStorage> SessionHolder<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: SessionState::Unauthenticated,
            token: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Pick up a token left by an earlier run. Returns whether one was found.
    pub fn resume(&mut self) -> Result<bool, ClientError> {
        match self.storage.load()? {
            Some(token) => {
                self.token = Some(token);
                self.state = SessionState::PendingVerification;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn begin_login(&mut self) {
        self.state = SessionState::PendingVerification;
    }

    /// Accept a token from the server and persist it
    pub fn complete_login(&mut self, token: String) -> Result<Claims, ClientError> {
        let Some(claims) = decode_unverified(&token) else {
            self.fail_login()?;
            return Err(ClientError::MalformedToken);
        };

        self.storage.store(&token)?;
        self.token = Some(token);
        self.state = SessionState::Authenticated(claims.clone());
        Ok(claims)
    }

    /// Login or re-validation failed; drop whatever token was held
    pub fn fail_login(&mut self) -> Result<(), ClientError> {
        self.token = None;
        self.state = SessionState::Unauthenticated;
        self.storage.clear()?;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.fail_login()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn claims(&self) -> Option<&Claims> {
        match &self.state {
            SessionState::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }

    /// Attach `Authorization: Bearer <token>` when a token is held
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Read the claims segment of a JWT without checking the signature
pub fn decode_unverified(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}
