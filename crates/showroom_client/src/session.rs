use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use client_logging::{client_debug, client_info, client_warn};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{map_transport_error, ApiError};
use crate::wire::{ErrorBody, LoginRequest, LoginResponse, RefreshRequest, TokenPair};
use crate::{ClientConfig, SessionStore, UserRecord};

/// Seconds-since-epoch supplier. Injectable so stores and TTLs can be
/// driven deterministically in tests.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub(crate) fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    })
}

/// Owns the credential lifecycle and gates every outbound API call.
///
/// All token mutation funnels through here: login, the single-flight
/// refresh, and logout. Other components never touch the store directly.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    /// Serializes refresh attempts; see `refresh_access_token`.
    refresh_gate: tokio::sync::Mutex<()>,
    /// Bumped on every successful credential replacement. A caller that
    /// saw a 401 under epoch E only performs the refresh round-trip if the
    /// epoch is still E by the time it holds the gate.
    epoch: AtomicU64,
    clock: Clock,
}

impl SessionManager {
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::with_clock(config, store, system_clock())
    }

    pub fn with_clock(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        clock: Clock,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            refresh_gate: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn now_secs(&self) -> i64 {
        (self.clock)()
    }

    /// Performs the credential exchange and stores the resulting pair
    /// together with the user record. Nothing is stored on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord, ApiError> {
        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .send_once(Method::POST, "admin/auth/login", Some(&body), &[], None)
            .await?;
        let login: LoginResponse = json_or_error(response).await?;

        self.store
            .put(
                &login.access_token,
                &login.refresh_token,
                &login.user,
                self.now_secs(),
            )
            .map_err(|err| ApiError::Store(err.to_string()))?;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        client_info!("logged in as {}", login.user.username);
        Ok(login.user)
    }

    /// Best-effort server notification, then an unconditional local clear.
    pub async fn logout(&self) {
        let token = self.store.snapshot(self.now_secs()).access_token;
        match self
            .send_once(Method::POST, "admin/auth/logout", None, &[], token.as_deref())
            .await
        {
            Ok(response) if !response.status().is_success() => {
                client_warn!("logout request rejected: {}", response.status());
            }
            Err(err) => client_warn!("logout request failed: {err}"),
            Ok(_) => {}
        }
        self.store.clear();
        client_info!("session cleared");
    }

    /// Presence check against the store; no expiry probe, no network.
    pub fn is_authenticated(&self) -> bool {
        let snapshot = self.store.snapshot(self.now_secs());
        snapshot.access_token.is_some() && snapshot.user.is_some()
    }

    /// The cached user record, when a complete session is present.
    pub fn current_user(&self) -> Option<UserRecord> {
        self.store.snapshot(self.now_secs()).user
    }

    /// Lightweight authenticated probe. Any failure reads as invalid; the
    /// caller decides whether to tear the session down.
    pub async fn check_token_validity(&self) -> bool {
        let Some(token) = self.store.snapshot(self.now_secs()).access_token else {
            return false;
        };
        match self
            .send_once(Method::GET, "admin/auth/me", None, &[], Some(&token))
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(Method::GET, path, None, &[]).await?;
        json_or_error(response).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::GET, path, None, query).await?;
        json_or_error(response).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::POST, path, body.as_ref(), &[]).await?;
        json_or_error(response).await
    }

    /// The one dispatch path every authenticated call goes through:
    /// attach bearer, send, and on a 401 refresh once and replay once.
    /// A 401 on the replay is terminal and clears the session.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        query: &[(String, String)],
    ) -> Result<Response, ApiError> {
        let observed_epoch = self.epoch.load(Ordering::Acquire);
        let token = self.store.snapshot(self.now_secs()).access_token;

        let response = self
            .send_once(method.clone(), path, body, query, token.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        client_debug!("401 on {path}, attempting token refresh");
        let refreshed = match self.refresh_access_token(observed_epoch).await {
            Ok(token) => token,
            Err(err) => {
                self.force_logout();
                return Err(err);
            }
        };

        let retry = self
            .send_once(method, path, body, query, Some(&refreshed))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            self.force_logout();
            return Err(ApiError::SessionExpired);
        }
        Ok(retry)
    }

    /// Exchanges the refresh token for a new credential pair, single-flight.
    ///
    /// Callers pass the epoch they observed before their request failed.
    /// Whoever wins the gate performs the one HTTP round-trip and bumps the
    /// epoch; everyone queued behind finds the epoch advanced and reuses
    /// the stored result. The gate is released on every path.
    pub(crate) async fn refresh_access_token(
        &self,
        observed_epoch: u64,
    ) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if self.epoch.load(Ordering::Acquire) != observed_epoch {
            // Another caller already replaced the credentials.
            return match self.store.snapshot(self.now_secs()).access_token {
                Some(token) => Ok(token),
                None => Err(ApiError::SessionExpired),
            };
        }

        let snapshot = self.store.snapshot(self.now_secs());
        let Some(refresh_token) = snapshot.refresh_token else {
            return Err(ApiError::NoRefreshToken);
        };
        let Some(user) = snapshot.user else {
            // Tokens without a user record count as unauthenticated.
            return Err(ApiError::NoRefreshToken);
        };

        let body = serde_json::to_value(RefreshRequest { refresh_token })
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .send_once(Method::POST, "admin/auth/refresh", Some(&body), &[], None)
            .await
            .map_err(|err| ApiError::RefreshFailed(err.to_string()))?;
        if !response.status().is_success() {
            let err = error_from_response(response).await;
            return Err(ApiError::RefreshFailed(err.to_string()));
        }
        let tokens: TokenPair = response
            .json()
            .await
            .map_err(|err| ApiError::RefreshFailed(err.to_string()))?;

        // The server may rotate the refresh token; both halves are
        // replaced together, never mixed with the old pair.
        self.store
            .put(
                &tokens.access_token,
                &tokens.refresh_token,
                &user,
                self.now_secs(),
            )
            .map_err(|err| ApiError::Store(err.to_string()))?;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        client_info!("access token refreshed");
        Ok(tokens.access_token)
    }

    fn force_logout(&self) {
        self.store.clear();
        client_info!("session cleared after authentication failure");
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        query: &[(String, String)],
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.http.request(method, self.endpoint(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(map_transport_error)
    }
}

pub(crate) async fn json_or_error<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    } else {
        Err(error_from_response(response).await)
    }
}

/// Normalizes a non-success response into the uniform error shape,
/// preferring the backend's `{"detail": ...}` body when present.
pub(crate) async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        });

    if status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::RateLimited { detail }
    } else {
        ApiError::Api {
            status: status.as_u16(),
            detail,
        }
    }
}
