use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OAuthTokenInternal {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}
