//! Typed client for the care-management REST API.

use crate::errors::ApiError;
use crate::models::{ActivityLog, DashboardStats, Entity, MediaUpload, Page, Session, User};
use crate::storage::TokenStore;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{
    multipart::{Form, Part},
    Method, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tracing::{debug, warn};

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Query parameters, kept sorted so equal queries produce equal URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value`, skipping blank values.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        if value.trim().is_empty() {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), value.trim().to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Required,
    Anonymous,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<TokenStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Full request URL; doubles as the cache key of a read.
    pub fn url(&self, path: &str, params: &Params) -> String {
        if params.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{}", self.base_url, params.to_query())
        }
    }

    pub async fn list<E: Entity>(&self, params: &Params) -> Result<Page<E>, ApiError> {
        let response = self
            .send(Method::GET, E::PATH, params, None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn get<E: Entity>(&self, id: i64) -> Result<E, ApiError> {
        let path = format!("{}/{id}", E::PATH);
        let response = self
            .send(Method::GET, &path, &Params::new(), None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn create<E: Entity, B: Serialize + ?Sized>(&self, body: &B) -> Result<E, ApiError> {
        let response = self
            .send(Method::POST, E::PATH, &Params::new(), Some(body), Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn update<E: Entity, B: Serialize + ?Sized>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<E, ApiError> {
        let path = format!("{}/{id}", E::PATH);
        let response = self
            .send(Method::PUT, &path, &Params::new(), Some(body), Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn delete<E: Entity>(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{id}", E::PATH);
        self.send(Method::DELETE, &path, &Params::new(), None::<&()>, Auth::Required)
            .await?;
        Ok(())
    }

    pub async fn activity_logs(&self, params: &Params) -> Result<Page<ActivityLog>, ApiError> {
        let response = self
            .send(Method::GET, "/activities/logs", params, None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn create_activity_log<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<ActivityLog, ApiError> {
        let response = self
            .send(Method::POST, "/activities/logs", &Params::new(), Some(body), Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let response = self
            .send(Method::GET, "/dashboard/stats", &Params::new(), None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    /// Raw report data from `/reports/{name}`.
    pub async fn report(&self, name: &str, params: &Params) -> Result<Value, ApiError> {
        let path = report_path(name)?;
        let response = self
            .send(Method::GET, &path, params, None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    pub async fn upload_media(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        metadata: Option<&Value>,
    ) -> Result<MediaUpload, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let mut form = Form::new().part("file", part);
        if let Some(metadata) = metadata {
            form = form.text("metadata", metadata.to_string());
        }

        let token = self.tokens.access_token().await.ok_or(ApiError::Unauthenticated)?;
        debug!(path = "/media/upload", "api upload");
        let response = self
            .http
            .post(self.url("/media/upload", &Params::new()))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self
            .send(Method::POST, "/auth/login", &Params::new(), Some(&body), Auth::Anonymous)
            .await?;
        decode(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, ApiError> {
        let body = serde_json::json!({ "refresh": refresh_token });
        let response = self
            .send(Method::POST, "/auth/refresh", &Params::new(), Some(&body), Auth::Anonymous)
            .await?;
        decode(response).await
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        let response = self
            .send(Method::GET, "/auth/profile", &Params::new(), None::<&()>, Auth::Required)
            .await?;
        decode(response).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &Params,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<Response, ApiError> {
        let url = self.url(path, params);
        debug!(%method, path, "api request");

        let mut request = self.http.request(method, url);
        match (auth, self.tokens.access_token().await) {
            (_, Some(token)) => request = request.bearer_auth(token),
            (Auth::Required, None) => return Err(ApiError::Unauthenticated),
            (Auth::Anonymous, None) => {}
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        check(request.send().await?).await
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = status.as_u16(), %message, "api request failed");
    Err(ApiError::Http { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Message of a failed response: the body's `error` (or `detail`) field,
/// otherwise the status line.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "detail", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

fn report_path(name: &str) -> Result<String, ApiError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if !valid {
        return Err(ApiError::Http {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: format!("unknown report {name:?}"),
        });
    }
    Ok(format!("/reports/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn params_are_sorted_and_encoded() {
        let params = Params::new()
            .with("search", "Smith & Sons")
            .with("category", "verbal")
            .with("status", "  ");
        assert_eq!(params.to_query(), "category=verbal&search=Smith%20%26%20Sons");
        assert_eq!(params.get("status"), None);
    }

    #[test]
    fn equal_queries_share_a_url() {
        let client = ApiClient::new(
            "http://api.test/api/v1/",
            Duration::from_secs(1),
            Arc::new(TokenStore::in_memory(None)),
        )
        .unwrap();
        let a = Params::new().with("page", 2).with("search", "ann");
        let b = Params::new().with("search", "ann").with("page", 2);
        assert_eq!(client.url("/clients", &a), client.url("/clients", &b));
        assert_eq!(
            client.url("/clients", &Params::new()),
            "http://api.test/api/v1/clients"
        );
    }

    #[test]
    fn error_message_prefers_body_error_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"email already used"}"#),
            "email already used"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"detail":"token expired"}"#),
            "token expired"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "request failed with status 502 Bad Gateway"
        );
    }

    #[test]
    fn report_names_cannot_escape_the_reports_path() {
        assert_eq!(report_path("goal-progress").unwrap(), "/reports/goal-progress");
        assert!(report_path("../users").is_err());
        assert!(report_path("").is_err());
    }
}
