use serde::{Deserialize, Serialize};

/// The caller's profile as returned by the user-detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role_description: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// String row id the server sends alongside the numeric user id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Body for the profile-update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
}

/// Raw body of a login attempt.
///
/// Kept whole (unknown fields land in `extra`) so the shell can read
/// whatever the server sends alongside the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
