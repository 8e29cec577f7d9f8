//! HTTP client for the Wakapp service.
//!
//! One async method per endpoint. The client holds no state beyond the base
//! URL and the underlying connection pool, so it can be shared freely.

pub mod types;

pub use types::{AlarmReceipt, FriendRequestPayload, FriendRequestReceipt, NewUser};

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::alarm::{Alarm, CreateAlarmRequest};
use crate::error::{CoreError, Result, TransportError};
use crate::friends::Friendship;
use crate::session::Identity;
use crate::storage::ApiConfig;
use types::ErrorBody;

/// Wakapp service client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    /// Build a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns `Transport` if the URL cannot be parsed or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(TransportError::Url)?;
        if base.cannot_be_a_base() {
            return Err(TransportError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase).into());
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL plus percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, path = url.path(), "api request");
        self.http.request(method, url)
    }

    /// Send and map non-success statuses. A 404 becomes `NotFound` for
    /// (`kind`, `id`).
    async fn send(&self, req: RequestBuilder, kind: &'static str, id: &str) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CoreError::not_found(kind, id));
        }

        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        tracing::debug!(status = status.as_u16(), %detail, "api error");
        Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        }
        .into())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        Ok(self.send(req, kind, id).await?.json().await?)
    }

    /// Like `send_json`, but an empty body reads as default. Any other body
    /// must decode.
    async fn send_receipt<T: DeserializeOwned + Default>(
        &self,
        req: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        let body = self.send(req, kind, id).await?.bytes().await?;
        decode_receipt(&body)
    }

    // -- users ---------------------------------------------------------------

    /// `GET /users`
    pub async fn list_users(&self) -> Result<Vec<Identity>> {
        let url = self.url(&["users"])?;
        self.send_json(self.request(Method::GET, url), "users", "")
            .await
    }

    /// `POST /users`. Returns the created identity when the service echoes
    /// one back with an id.
    pub async fn create_user(&self, user: &NewUser) -> Result<Option<Identity>> {
        let url = self.url(&["users"])?;
        let body: serde_json::Value = self
            .send_receipt(self.request(Method::POST, url).json(user), "users", "")
            .await?;
        Ok(serde_json::from_value::<Identity>(body).ok())
    }

    // -- friends -------------------------------------------------------------

    /// `GET /users/{id}/friends`
    pub async fn list_friends(&self, user_id: &str) -> Result<Vec<Friendship>> {
        let url = self.url(&["users", user_id, "friends"])?;
        self.send_json(self.request(Method::GET, url), "user", user_id)
            .await
    }

    /// `POST /friend-requests`
    pub async fn send_friend_request(
        &self,
        payload: &FriendRequestPayload,
    ) -> Result<FriendRequestReceipt> {
        let url = self.url(&["friend-requests"])?;
        self.send_receipt(
            self.request(Method::POST, url).json(payload),
            "user",
            &payload.user_id,
        )
        .await
    }

    /// `POST /friends/{id}/resend`
    pub async fn resend_friend_request(&self, friendship_id: &str) -> Result<()> {
        let url = self.url(&["friends", friendship_id, "resend"])?;
        self.send(self.request(Method::POST, url), "friendship", friendship_id)
            .await?;
        Ok(())
    }

    /// `DELETE /friends/{id}`
    pub async fn delete_friend(&self, friendship_id: &str) -> Result<()> {
        let url = self.url(&["friends", friendship_id])?;
        self.send(self.request(Method::DELETE, url), "friendship", friendship_id)
            .await?;
        Ok(())
    }

    // -- alarms --------------------------------------------------------------

    /// `GET /users/{id}/alarms`
    pub async fn list_alarms(&self, user_id: &str) -> Result<Vec<Alarm>> {
        let url = self.url(&["users", user_id, "alarms"])?;
        self.send_json(self.request(Method::GET, url), "user", user_id)
            .await
    }

    /// `POST /alarms`
    pub async fn create_alarm(&self, alarm: &CreateAlarmRequest) -> Result<AlarmReceipt> {
        let url = self.url(&["alarms"])?;
        self.send_receipt(
            self.request(Method::POST, url).json(alarm),
            "user",
            &alarm.user_id,
        )
        .await
    }

    /// `DELETE /alarms/{id}?user_id=`
    pub async fn delete_alarm(&self, alarm_id: &str, user_id: &str) -> Result<()> {
        let mut url = self.url(&["alarms", alarm_id])?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        self.send(self.request(Method::DELETE, url), "alarm", alarm_id)
            .await?;
        Ok(())
    }
}

fn decode_receipt<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "undecodable response body");
        TransportError::Decode(e).into()
    })
}
