//! Blocking Reddit OAuth client.

use super::{listing, Platform, PlatformError};
use crate::domain::{CommentNode, InboxItem, MoreComments, Submission};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Renew the token this long before Reddit would reject it.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// `/api/morechildren` accepts at most this many IDs per call.
const MORE_CHILDREN_PAGE: usize = 100;

/// Script-app credentials for one bot account.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiJsonResponse {
    json: ApiJsonErrors,
}

#[derive(Debug, Deserialize)]
struct ApiJsonErrors {
    #[serde(default)]
    errors: Vec<Value>,
}

pub struct RedditClient {
    http: Client,
    credentials: RedditCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    /// Build the HTTP session and fetch the first access token.
    pub fn connect(credentials: RedditCredentials, user_agent: &str) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(|source| PlatformError::Http { endpoint: "client".to_string(), source })?;

        let client = Self { http, credentials, token: Mutex::new(None) };
        client.access_token()?;
        tracing::info!(username = %client.credentials.username, "Connected to reddit");
        Ok(client)
    }

    fn access_token(&self) -> Result<String, PlatformError> {
        let mut guard =
            self.token.lock().map_err(|_| PlatformError::Auth("token lock poisoned".to_string()))?;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token()?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    fn request_token(&self) -> Result<AccessToken, PlatformError> {
        tracing::debug!("Requesting reddit access token");
        let request = self
            .http
            .post(AUTH_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ]);
        let value = send(AUTH_URL, request)?;
        let response: TokenResponse = serde_json::from_value(value).map_err(|e| {
            PlatformError::Malformed { endpoint: AUTH_URL.to_string(), reason: e.to_string() }
        })?;

        if let Some(error) = response.error {
            return Err(PlatformError::Auth(error));
        }
        let value = response
            .access_token
            .ok_or_else(|| PlatformError::Auth("no access token in response".to_string()))?;
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(3600));
        Ok(AccessToken { value, expires_at: Instant::now() + lifetime })
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let token = self.access_token()?;
        let request = self.http.get(format!("{API_BASE}{path}")).bearer_auth(token).query(query);
        send(path, request)
    }

    fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let token = self.access_token()?;
        let request = self.http.post(format!("{API_BASE}{path}")).bearer_auth(token).form(form);
        send(path, request)
    }

    /// POST to an `api_type=json` endpoint and surface its `json.errors`.
    fn post_api(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PlatformError> {
        let value = self.post(path, form)?;
        if let Ok(response) = serde_json::from_value::<ApiJsonResponse>(value) {
            if !response.json.errors.is_empty() {
                return Err(PlatformError::Malformed {
                    endpoint: path.to_string(),
                    reason: format!("api errors: {:?}", response.json.errors),
                });
            }
        }
        Ok(())
    }
}

fn send(endpoint: &str, request: RequestBuilder) -> Result<Value, PlatformError> {
    let response = request
        .send()
        .map_err(|source| PlatformError::Http { endpoint: endpoint.to_string(), source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(PlatformError::Status { endpoint: endpoint.to_string(), status: status.as_u16() });
    }
    response.json().map_err(|source| PlatformError::Http { endpoint: endpoint.to_string(), source })
}

/// Reddit answers 403/404 for suspended, shadow-banned and deleted accounts.
fn account_status(name: &str, err: PlatformError) -> PlatformError {
    match err {
        PlatformError::Status { status, .. }
            if status == StatusCode::NOT_FOUND.as_u16()
                || status == StatusCode::FORBIDDEN.as_u16() =>
        {
            PlatformError::UnavailableAccount(name.to_string())
        }
        other => other,
    }
}

impl Platform for RedditClient {
    fn unread_inbox(&self) -> Result<Vec<InboxItem>, PlatformError> {
        let path = "/message/unread";
        let value = self.get(path, &[("limit", "100"), ("raw_json", "1")])?;
        listing::inbox(path, value)
    }

    fn mark_read(&self, fullname: &str) -> Result<(), PlatformError> {
        self.post("/api/read_message", &[("id", fullname)]).map(|_| ())
    }

    fn reply(&self, fullname: &str, text: &str) -> Result<(), PlatformError> {
        self.post_api("/api/comment", &[("api_type", "json"), ("thing_id", fullname), ("text", text)])
    }

    fn submission(&self, id: &str) -> Result<Submission, PlatformError> {
        let path = format!("/comments/{id}");
        let value = self.get(&path, &[("raw_json", "1")])?;
        listing::submission(&path, value)
    }

    fn expand(&self, more: &MoreComments) -> Result<Vec<CommentNode>, PlatformError> {
        // "continue this thread" placeholders carry no IDs
        if more.children.is_empty() {
            return Ok(Vec::new());
        }

        let page_len = more.children.len().min(MORE_CHILDREN_PAGE);
        let (page, rest) = more.children.split_at(page_len);
        let children = page.join(",");
        let path = "/api/morechildren";
        let value = self.get(
            path,
            &[
                ("api_type", "json"),
                ("link_id", more.link_id.as_str()),
                ("children", children.as_str()),
                ("limit_children", "false"),
                ("raw_json", "1"),
            ],
        )?;
        listing::more_children(path, value, more, rest.to_vec())
    }

    fn account_created(&self, name: &str) -> Result<DateTime<Utc>, PlatformError> {
        let path = format!("/user/{name}/about");
        let value = self.get(&path, &[("raw_json", "1")]).map_err(|e| account_status(name, e))?;
        listing::account_created(&path, name, value)
    }

    fn recent_activity(&self, name: &str, limit: usize) -> Result<Vec<String>, PlatformError> {
        let path = format!("/user/{name}/overview");
        let limit_param = limit.to_string();
        let value = self
            .get(&path, &[("sort", "new"), ("limit", limit_param.as_str()), ("raw_json", "1")])
            .map_err(|e| account_status(name, e))?;
        let mut subreddits = listing::activity_subreddits(&path, value)?;
        subreddits.truncate(limit);
        Ok(subreddits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_accounts_map_to_unavailable() {
        let err = PlatformError::Status { endpoint: "/user/x/about".to_string(), status: 404 };
        assert!(matches!(account_status("x", err), PlatformError::UnavailableAccount(n) if n == "x"));

        let err = PlatformError::Status { endpoint: "/user/x/about".to_string(), status: 403 };
        assert!(matches!(account_status("x", err), PlatformError::UnavailableAccount(_)));
    }

    #[test]
    fn server_errors_are_not_account_problems() {
        let err = PlatformError::Status { endpoint: "/user/x/about".to_string(), status: 503 };
        assert!(matches!(account_status("x", err), PlatformError::Status { status: 503, .. }));
    }
}
