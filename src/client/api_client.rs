//! HTTP client for the UniFind API

use crate::auth::models::{Claims, DashboardResponse, LoginRequest, LoginResponse, RegisterRequest};
use crate::client::session::SessionHolder;
use crate::client::storage::TokenStorage;
use crate::client::ClientError;
use crate::marketplace::{
    Created, InboxMessage, ItemFilter, ItemListing, LostFoundFilter, LostFoundListing, NewItem,
    NewMessage, PostKind,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ApiClient<S: TokenStorage> {
    client: Client,
    base_url: String,
    session: SessionHolder<S>,
}

impl<S: TokenStorage> ApiClient<S> {
    pub fn new(base_url: impl Into<String>, storage: S) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: SessionHolder::new(storage),
        })
    }

    pub fn session(&self) -> &SessionHolder<S> {
        &self.session
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder with the bearer token attached
    fn authed(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.session.token().is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(self.session.apply(self.client.request(method, self.url(path))))
    }

    /// Create an account. The server does not log the new user in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.client.post(self.url("/api/register")).json(&body).send().await?;
        Ok(check(resp).await?.text().await?)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Claims, ClientError> {
        self.session.begin_login();

        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let outcome = async {
            let resp = self.client.post(self.url("/api/login")).json(&body).send().await?;
            Ok::<_, ClientError>(check(resp).await?.json::<LoginResponse>().await?)
        }
        .await;

        match outcome {
            Ok(login) => self.session.complete_login(login.token),
            Err(e) => {
                self.session.fail_login()?;
                Err(e)
            }
        }
    }

    /// Re-validate a stored token against the server.
    ///
    /// `Ok(None)` when there is no token or the server refused it (the stored
    /// token is then discarded). Transport errors keep the token.
    pub async fn restore(&mut self) -> Result<Option<Claims>, ClientError> {
        if !self.session.resume()? {
            return Ok(None);
        }

        let checked = self.dashboard().await;
        match checked {
            Ok(_) => {
                let token = self.session.token().unwrap_or_default().to_string();
                self.session.complete_login(token).map(Some)
            }
            Err(e) if e.is_auth_rejection() => {
                debug!("Stored token refused: {}", e);
                self.session.fail_login()?;
                Ok(None)
            }
            Err(e) => {
                warn!("Could not re-validate stored token: {}", e);
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session.logout()
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse, ClientError> {
        let req = self.authed(reqwest::Method::GET, "/api/dashboard")?;
        fetch_json(req).await
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<ItemListing>, ClientError> {
        let req = self.authed(reqwest::Method::GET, "/api/items")?.query(filter);
        fetch_json(req).await
    }

    pub async fn create_item(&self, item: &NewItem) -> Result<Created, ClientError> {
        let req = self.authed(reqwest::Method::POST, "/api/items")?.json(item);
        fetch_json(req).await
    }

    pub async fn lost_found(
        &self,
        kind: Option<PostKind>,
    ) -> Result<Vec<LostFoundListing>, ClientError> {
        let req = self
            .authed(reqwest::Method::GET, "/api/lost-found")?
            .query(&LostFoundFilter { kind });
        fetch_json(req).await
    }

    pub async fn inbox(&self) -> Result<Vec<InboxMessage>, ClientError> {
        let req = self.authed(reqwest::Method::GET, "/api/messages")?;
        fetch_json(req).await
    }

    /// Returns the server's confirmation text
    pub async fn send_message(&self, message: &NewMessage) -> Result<String, ClientError> {
        let req = self.authed(reqwest::Method::POST, "/api/messages")?.json(message);
        let resp = req.send().await?;
        Ok(check(resp).await?.text().await?)
    }
}

async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req.send().await?;
    Ok(check(resp).await?.json::<T>().await?)
}

/// Turn a non-2xx response into `ClientError::Rejected`
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    // Resource errors are JSON `{ "error": .. }`, auth errors are plain text
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);

    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}
