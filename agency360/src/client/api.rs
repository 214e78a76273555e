//! HTTP API client for the dashboard backend.

use super::{AuthApi, Invalidation, SessionHandle};
use crate::auth::errors::{LOGIN_FAILED, PROFILE_FAILED, REGISTER_FAILED, status_message};
use crate::auth::{
    ApiError, ApiResult, AuthScheme, Credentials, ErrorKind, LoginCredentials, RegisterData,
    SessionInfo, User,
};
use crate::config::{ApiConfig, Endpoints};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

/// Body of a successful `POST /token/`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

/// API client for communicating with the dashboard backend
pub struct ApiClient {
    base_url: String,
    endpoints: Endpoints,
    client: reqwest::Client,
    session: SessionHandle,
    invalidations: broadcast::Sender<Invalidation>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL, proxy, timeout and endpoint paths
    /// * `session` - Credential state this client reads and updates
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be built
    pub fn new(config: &ApiConfig, session: SessionHandle) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ApiError::new(
                    ErrorKind::Unknown,
                    format!("Failed to build HTTP client: {e}"),
                )
            })?;

        let (invalidations, _) = broadcast::channel(16);

        Ok(Self {
            base_url: config.effective_base_url().trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            client,
            session,
            invalidations,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential state shared with this client
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the `Authorization` header for `credentials`, if any
    fn authorize(request: RequestBuilder, credentials: Option<&Credentials>) -> RequestBuilder {
        match credentials {
            Some(Credentials::Bearer { token }) => request.bearer_auth(token),
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        }
    }

    /// Send a request with the current credentials attached.
    ///
    /// A 401 clears the credentials that were attached (unless the session has
    /// moved on since) and broadcasts an [`Invalidation`]. Any non-success
    /// status becomes an [`ApiError`].
    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &str,
        fallback: &str,
    ) -> ApiResult<Response> {
        let (credentials, generation) = self.session.snapshot();
        let request = Self::authorize(request, credentials.as_ref());

        log::debug!("Sending request to {}", endpoint);
        let response = request.send().await.map_err(|e| {
            log::warn!("Request to {} failed: {}", endpoint, e);
            ApiError::from_transport(&e, fallback)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate(generation, endpoint);
        }

        let body = response.json::<serde_json::Value>().await.ok();
        let error = ApiError::from_status(status.as_u16(), body, fallback);
        log::debug!("{} answered {}: {}", endpoint, status, error.message);
        Err(error)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = self.send(request, endpoint, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_transport(&e, fallback))
    }

    fn invalidate(&self, generation: u64, endpoint: &str) {
        if self.session.clear_if(generation) {
            log::info!("Credentials rejected by {}, session cleared", endpoint);
            // No subscribers is fine: the credentials are already gone
            let _ = self.invalidations.send(Invalidation {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
    }

    /// Bearer mode: exchange the login for an access token
    async fn login_with_token(&self, credentials: &LoginCredentials) -> ApiResult<SessionInfo> {
        let generation = self.session.generation();
        let endpoint = &self.endpoints.token;

        let token: TokenResponse = self
            .send_json(
                self.client.post(self.url(endpoint)).json(credentials),
                endpoint,
                LOGIN_FAILED,
            )
            .await?;

        let bearer = Credentials::Bearer {
            token: token.access.clone(),
        };
        if !bearer.is_complete() {
            return Err(ApiError::new(ErrorKind::Unknown, LOGIN_FAILED));
        }

        let installed = self
            .session
            .install(generation, bearer)
            .ok_or_else(ApiError::cancelled)?;

        let user = match token.user {
            Some(user) => user,
            None => match self.profile().await {
                Ok(user) => user,
                Err(e) => {
                    self.session.clear_if(installed);
                    return Err(e);
                }
            },
        };

        log::info!("Logged in as {}", user.username);
        Ok(SessionInfo {
            access: Some(token.access),
            refresh: token.refresh,
            user,
            generation: installed,
        })
    }

    /// Basic mode: store the pair, then prove it with one probe request
    async fn login_with_probe(&self, credentials: &LoginCredentials) -> ApiResult<SessionInfo> {
        let basic = self
            .scheme()
            .credentials_for_login(credentials)
            .filter(Credentials::is_complete)
            .ok_or_else(|| {
                ApiError::new(
                    ErrorKind::Validation,
                    status_message(400).unwrap_or(LOGIN_FAILED),
                )
            })?;

        let generation = self.session.generation();
        let installed = self
            .session
            .install(generation, basic)
            .ok_or_else(ApiError::cancelled)?;

        let endpoint = &self.endpoints.probe;
        if let Err(e) = self
            .send(self.client.get(self.url(endpoint)), endpoint, LOGIN_FAILED)
            .await
        {
            self.session.clear_if(installed);
            return Err(e);
        }

        if self.session.generation() != installed {
            return Err(ApiError::cancelled());
        }

        log::info!("Logged in as {}", credentials.email);
        Ok(SessionInfo {
            access: None,
            refresh: None,
            user: User::from_login_name(&credentials.email),
            generation: installed,
        })
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    fn scheme(&self) -> AuthScheme {
        self.session.scheme()
    }

    fn credentials(&self) -> Option<Credentials> {
        self.session.credentials()
    }

    async fn login(&self, credentials: &LoginCredentials) -> ApiResult<SessionInfo> {
        match self.scheme() {
            AuthScheme::Bearer => self.login_with_token(credentials).await,
            AuthScheme::BasicProbe => self.login_with_probe(credentials).await,
        }
    }

    async fn register(&self, data: &RegisterData) -> ApiResult<User> {
        let endpoint = &self.endpoints.register;
        let response = self
            .send(
                self.client.post(self.url(endpoint)).json(data),
                endpoint,
                REGISTER_FAILED,
            )
            .await?;

        // Any 2xx means the account exists, whatever the body says
        let mut user = match response.json::<User>().await {
            Ok(user) => user,
            Err(e) => {
                log::debug!("{} returned no user ({}), using the submitted one", endpoint, e);
                User {
                    id: String::new(),
                    email: String::new(),
                    username: String::new(),
                }
            }
        };
        if user.email.is_empty() {
            user.email = data.email.clone();
        }
        if user.username.is_empty() {
            user.username = data.username.clone();
        }

        log::info!("Registered user {}", user.username);
        Ok(user)
    }

    async fn profile(&self) -> ApiResult<User> {
        let endpoint = &self.endpoints.profile;
        self.send_json(self.client.get(self.url(endpoint)), endpoint, PROFILE_FAILED)
            .await
    }

    fn logout(&self) {
        self.session.clear();
        log::info!("Logged out");
    }

    fn revoke(&self, generation: u64) -> bool {
        self.session.clear_if(generation)
    }

    fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.invalidations.subscribe()
    }
}
