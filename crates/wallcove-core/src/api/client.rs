//! HTTP client for the wallcove API.
//!
//! Every request made through `ApiClient` gets the same pipeline:
//!
//! - the bearer token is read from secure storage and attached per attempt,
//!   so a token refreshed mid-flight is picked up on retry
//! - transient failures retry with exponential backoff: transport errors
//!   (except timeouts) for any method, 5xx only for idempotent methods
//! - failures are normalized to the stable user-facing messages in
//!   `api::error`; other statuses pass through with the server's wording
//! - 401s and token-error bodies trigger the session-invalidation
//!   procedure in the background while the caller gets its result normally

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::credentials::{CredentialStore, AUTH_TOKEN_KEY};
use crate::config::Config;
use crate::models::{
    Ack, Category, Comment, LoginResponse, Pagination, UpdateUserRequest, UserProfile, Wallpaper,
    WallpaperPage,
};

use super::error::{body_signals_invalid_session, classify_http_failure, ApiError};
use super::pipeline::{self, LogoutCallback, PipelineShared, SessionNotifier};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s lets slow mobile networks finish large list responses while still
/// failing fast enough for a responsive UI.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Extra attempts for requests that fail in transport or hit a 5xx.
/// 3 retries rides out brief network blips without trapping the user in a
/// long stall.
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds between retry attempts.
/// 100ms keeps the doubling series (100/200/400) under a second total.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Whether a method is safe to re-send after a 5xx.
/// Transport errors retry regardless; only idempotent methods retry after
/// the server may have started processing.
fn is_idempotent(method: &Method) -> bool {
    matches!(
        method.as_str(),
        "GET" | "HEAD" | "OPTIONS" | "PUT" | "DELETE"
    )
}

/// HTTP client for the wallcove API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and clones share the pipeline state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    shared: Arc<PipelineShared>,
}

impl ApiClient {
    /// Create a new API client against the configured base URL.
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            store,
            shared: PipelineShared::new(notifier),
        })
    }

    /// Register the hook run when the server invalidates the session.
    /// Single slot: a later registration replaces the earlier one.
    pub async fn set_logout_callback(&self, callback: LogoutCallback) {
        *self.shared.logout_callback.lock().await = Some(callback);
    }

    /// Whether any request is currently in flight (spinner hint).
    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Build the per-request auth headers from secure storage.
    /// Read fresh on every attempt so a token replaced mid-flight is used
    /// by the next retry. A failed storage read aborts the request before
    /// anything reaches the wire; a token the header codec refuses is
    /// skipped, and the server's 401 then clears it.
    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self
            .store
            .get(AUTH_TOKEN_KEY)
            .context("Failed to read stored auth token")?
        {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(e) => warn!(error = %e, "Stored token is not a valid header value"),
            }
        }
        Ok(headers)
    }

    /// Send one request through the retry loop and return the response body
    /// on success, triggering session invalidation where the response calls
    /// for it.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        // Guard rather than a paired decrement: a caller dropping this
        // future mid-request must not leave the busy hint stuck
        let _in_flight = pipeline::InFlightGuard::enter(&self.shared.in_flight);
        self.dispatch_inner(method, path, query, body).await
    }

    async fn dispatch_inner(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempts = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    // Timeouts are not retried: the 30s budget is already
                    // generous, and re-spending it compounds the stall.
                    if !e.is_timeout() && attempts < MAX_RETRIES {
                        attempts += 1;
                        warn!(url = %url, attempt = attempts, backoff_ms, error = %e, "Request failed, retrying");
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms *= 2; // Exponential backoff
                        continue;
                    }
                    return Err(ApiError::Offline(e).into());
                }
            };

            let status = response.status();
            if status.is_server_error() && is_idempotent(&method) && attempts < MAX_RETRIES {
                attempts += 1;
                warn!(url = %url, attempt = attempts, backoff_ms, status = %status, "Server error, retrying");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => return Err(ApiError::Offline(e).into()),
            };

            if status.is_success() {
                // Some endpoints report a dead session inside a 200
                if body_signals_invalid_session(&text) {
                    debug!(url = %url, "Success body carries a token error");
                    pipeline::begin_session_invalidation(
                        &self.shared,
                        "token error in success body",
                    );
                }
                return Ok(text);
            }

            let err = classify_http_failure(status, &text);
            if matches!(err, ApiError::SessionInvalid { .. }) {
                pipeline::begin_session_invalidation(&self.shared, "unauthorized response");
            }
            return Err(err.into());
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.dispatch(Method::GET, path, None, None).await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let text = self.dispatch(Method::GET, path, Some(query), None).await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        let text = self
            .dispatch(Method::POST, path, None, Some(&body))
            .await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    // ===== Wallpapers =====

    /// Fetch a page of the main wallpaper feed.
    pub async fn fetch_wallpapers(&self, page: u32, limit: u32) -> Result<WallpaperPage> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        let response: FeedResponse = self.get_query("/getAllWallpapers", &query).await?;
        response.into_page()
    }

    /// Fetch the popular feed (server-curated ordering).
    pub async fn fetch_popular_wallpapers(&self) -> Result<WallpaperPage> {
        let response: FeedResponse = self.get("/getPopularWallpapers").await?;
        response.into_page()
    }

    /// Fetch a single wallpaper, including the caller's favorite/like flags.
    pub async fn fetch_wallpaper(&self, wallpaper_id: i64) -> Result<Wallpaper> {
        let response: WallpaperDetailResponse = self
            .get(&format!("/getWallpaperById/{}", wallpaper_id))
            .await?;
        match response.data {
            Some(wallpaper) if response.status => Ok(wallpaper),
            _ => Err(ApiError::Rejected {
                message: response.message,
            }
            .into()),
        }
    }

    /// Fetch wallpapers in a category. Older server versions omit the
    /// pagination block, so it comes back optional.
    pub async fn fetch_wallpapers_by_category(
        &self,
        category_id: i64,
        page: u32,
    ) -> Result<(Vec<Wallpaper>, Option<Pagination>)> {
        let query = [("page", page.to_string())];
        let response: FlatListResponse = self
            .get_query(&format!("/getWallpapersByCategory/{}", category_id), &query)
            .await?;
        if !response.status {
            return Err(ApiError::Rejected {
                message: response.message,
            }
            .into());
        }
        Ok((response.data, response.pagination))
    }

    // ===== Favorites =====

    /// Fetch the caller's favorite wallpapers (flat list, no pagination).
    pub async fn fetch_favorites(&self) -> Result<Vec<Wallpaper>> {
        let response: FlatListResponse = self.get("/getFavorites").await?;
        if !response.status {
            return Err(ApiError::Rejected {
                message: response.message,
            }
            .into());
        }
        Ok(response.data)
    }

    pub async fn add_favorite(&self, wallpaper_id: i64) -> Result<Ack> {
        self.post("/addFavorite", &json!({ "wallpaper_id": wallpaper_id }))
            .await
    }

    pub async fn remove_favorite(&self, wallpaper_id: i64) -> Result<Ack> {
        self.post("/removeFavorite", &json!({ "wallpaper_id": wallpaper_id }))
            .await
    }

    /// Whether a wallpaper is in the caller's favorites. The server has no
    /// point lookup, so this scans the favorites list.
    pub async fn is_favorite(&self, wallpaper_id: i64) -> Result<bool> {
        let favorites = self.fetch_favorites().await?;
        Ok(favorites.iter().any(|w| w.id == wallpaper_id))
    }

    // ===== Likes =====

    pub async fn like_wallpaper(&self, wallpaper_id: i64) -> Result<Ack> {
        self.post("/likeWallpaper", &json!({ "wallpaper_id": wallpaper_id }))
            .await
    }

    pub async fn unlike_wallpaper(&self, wallpaper_id: i64) -> Result<Ack> {
        self.post("/unlikeWallpaper", &json!({ "wallpaper_id": wallpaper_id }))
            .await
    }

    // ===== Comments =====

    /// Fetch the comments on a wallpaper, newest first as the server sends
    /// them.
    pub async fn fetch_comments(&self, wallpaper_id: i64) -> Result<Vec<Comment>> {
        let response: CommentsResponse = self
            .get(&format!("/getCommentsByWallpaper/{}", wallpaper_id))
            .await?;
        if !response.status {
            return Err(ApiError::Rejected {
                message: response.message,
            }
            .into());
        }
        Ok(response.data)
    }

    pub async fn add_comment(&self, wallpaper_id: i64, text: &str) -> Result<Ack> {
        self.post(
            "/addComment",
            &json!({ "wallpaper_id": wallpaper_id, "comment": text }),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<Ack> {
        self.post("/deleteComment", &json!({ "comment_id": comment_id }))
            .await
    }

    // ===== Categories =====

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let response: CategoryListResponse = self.get("/getAllCategories").await?;
        if !response.status {
            return Err(ApiError::Rejected {
                message: response.message,
            }
            .into());
        }
        Ok(response.data)
    }

    pub async fn fetch_category(&self, category_id: i64) -> Result<Category> {
        let response: CategoryDetailResponse =
            self.get(&format!("/categories/{}", category_id)).await?;
        match response.data {
            Some(category) if response.status => Ok(category),
            _ => Err(ApiError::Rejected {
                message: response.message,
            }
            .into()),
        }
    }

    // ===== Account =====

    /// POST credentials to the login endpoint and return the parsed body
    /// whether or not the server accepted them; the auth session decides
    /// what a refusal means.
    pub(crate) async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        self.post(
            "/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Fetch the caller's profile. The server wraps the row in a
    /// one-element array.
    pub async fn fetch_user_detail(&self) -> Result<UserProfile> {
        let response: UserDetailResponse = self.get("/getuserdetail").await?;
        if !response.status {
            return Err(ApiError::Rejected {
                message: response.message,
            }
            .into());
        }
        response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("User detail response was empty"))
    }

    pub async fn update_user(&self, update: &UpdateUserRequest) -> Result<Ack> {
        self.post("/updateUser", update).await
    }

    pub async fn update_password(&self, current_password: &str, new_password: &str) -> Result<Ack> {
        self.post(
            "/updateUserPassword",
            &json!({
                "current_password": current_password,
                "new_password": new_password,
            }),
        )
        .await
    }
}

// Internal API response types for parsing

/// Double-nested feed envelope used by the main and popular feeds.
#[derive(Debug, Clone, Deserialize)]
struct FeedResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<FeedInner>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeedInner {
    status: bool,
    #[serde(default)]
    data: Vec<Wallpaper>,
    pagination: Pagination,
}

impl FeedResponse {
    fn into_page(self) -> Result<WallpaperPage> {
        match self.data {
            Some(inner) if self.status && inner.status => Ok(WallpaperPage {
                wallpapers: inner.data,
                pagination: inner.pagination,
            }),
            _ => Err(ApiError::Rejected {
                message: self.message,
            }
            .into()),
        }
    }
}

/// Flat list envelope used by favorites and category browsing.
#[derive(Debug, Clone, Deserialize)]
struct FlatListResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Wallpaper>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
struct WallpaperDetailResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Wallpaper>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommentsResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Comment>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryListResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryDetailResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Category>,
}

#[derive(Debug, Clone, Deserialize)]
struct UserDetailResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<UserProfile>,
}
