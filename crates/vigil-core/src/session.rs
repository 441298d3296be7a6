//! Session boundary wire types and the native HTTP client
//!
//! The widget itself only ever calls `logout`, fire-and-forget. `login` and
//! `check_session` are the page-level gate's calls, exposed here for the CLI.

use serde::{Deserialize, Serialize};

/// `POST /login` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `{message}` body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

/// `GET /protected` success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBody {
    pub message: String,
    pub user: SessionUser,
}

#[cfg(feature = "http")]
pub use self::http::{HttpSessionBoundary, SessionApi};

#[cfg(feature = "http")]
mod http {
    use super::{Credentials, MessageBody, ProtectedBody};
    use crate::{host::SessionBoundary, Error, Result};
    use async_trait::async_trait;
    use reqwest::{Client, Response};
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tracing::{debug, info, instrument, warn};
    use url::Url;

    /// Async access to the authentication service
    #[async_trait]
    pub trait SessionApi {
        async fn login(&self, credentials: &Credentials) -> Result<MessageBody>;
        async fn logout_now(&self) -> Result<MessageBody>;
        async fn check_session(&self) -> Result<ProtectedBody>;
    }

    /// Cookie-carrying client for the session endpoints
    #[derive(Clone)]
    pub struct HttpSessionBoundary {
        client: Client,
        base: Url,
    }

    impl HttpSessionBoundary {
        pub fn new(base: Url, timeout: Duration) -> Result<Self> {
            let client = Client::builder().cookie_store(true).timeout(timeout).build()?;
            Ok(Self { client, base: with_trailing_slash(base) })
        }

        pub fn base(&self) -> &Url {
            &self.base
        }

        /// Resolve an endpoint below the base, keeping the base path
        pub fn endpoint(&self, path: &str) -> Result<Url> {
            Ok(self.base.join(path.trim_start_matches('/'))?)
        }

        async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
            let status = response.status();
            if status.is_success() {
                return Ok(response.json::<T>().await?);
            }
            let message = match response.json::<MessageBody>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            Err(Error::SessionRejected { status: status.as_u16(), message })
        }
    }

    fn with_trailing_slash(mut url: Url) -> Url {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    #[async_trait]
    impl SessionApi for HttpSessionBoundary {
        #[instrument(skip(self, credentials), fields(user = %credentials.username))]
        async fn login(&self, credentials: &Credentials) -> Result<MessageBody> {
            let response = self.client.post(self.endpoint("login")?).json(credentials).send().await?;
            let body = Self::decode(response).await?;
            info!("Logged in");
            Ok(body)
        }

        #[instrument(skip(self))]
        async fn logout_now(&self) -> Result<MessageBody> {
            let response = self.client.post(self.endpoint("logout")?).send().await?;
            Self::decode(response).await
        }

        #[instrument(skip(self))]
        async fn check_session(&self) -> Result<ProtectedBody> {
            let response = self.client.get(self.endpoint("protected")?).send().await?;
            Self::decode(response).await
        }
    }

    impl SessionBoundary for HttpSessionBoundary {
        /// Spawned on the current tokio runtime; the outcome is only logged
        fn logout(&self) {
            let this = self.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        match this.logout_now().await {
                            Ok(body) => debug!(message = %body.message, "Logout acknowledged"),
                            Err(e) => debug!(code = e.error_code(), error = %e, "Logout failed; ignored"),
                        }
                    });
                }
                Err(_) => warn!("No async runtime; logout not sent"),
            }
        }
    }

}
