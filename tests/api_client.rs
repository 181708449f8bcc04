mod common;

use care_dashboard::api::Params;
use care_dashboard::auth::{self, SessionError};
use care_dashboard::errors::ApiError;
use care_dashboard::models::{Client, Session};
use care_dashboard::{ApiClient, Resources, TokenStore};
use common::MockUpstream;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn session(access: &str, refresh: Option<&str>) -> Session {
    Session {
        access: access.to_string(),
        refresh: refresh.map(str::to_string),
    }
}

fn resources(upstream: &MockUpstream, session: Option<Session>) -> Resources {
    let tokens = Arc::new(TokenStore::in_memory(session));
    let api = ApiClient::new(upstream.base_url.clone(), Duration::from_secs(5), tokens)
        .expect("build api client");
    Resources::new(api)
}

#[tokio::test]
async fn list_sends_bearer_token_and_decodes_page() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));

    let page = resources
        .api()
        .list::<Client>(&Params::new().with("status", "active"))
        .await
        .unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].full_name(), "Ada Byron");
    assert_eq!(
        upstream.lock().authorizations.last().map(String::as_str),
        Some("Bearer token-1")
    );
}

#[tokio::test]
async fn signed_out_requests_never_leave_the_process() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, None);

    let err = resources.api().list::<Client>(&Params::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthenticated));
    assert_eq!(upstream.hits("/clients"), 0);
}

#[tokio::test]
async fn failed_request_carries_body_message() {
    let upstream = MockUpstream::start();
    upstream.fail("/goals", true);
    let resources = resources(&upstream, Some(session("token-1", None)));

    let err = resources
        .api()
        .list::<care_dashboard::models::Goal>(&Params::new())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.to_string(), "database unavailable");
}

#[tokio::test]
async fn delete_accepts_empty_response() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));

    resources.delete::<Client>(2).await.unwrap();

    assert_eq!(upstream.lock().collections["clients"].len(), 1);
}

#[tokio::test]
async fn upload_sends_file_and_metadata_parts() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));

    let upload = resources
        .upload_media(
            "care-plan.pdf",
            "application/pdf",
            b"%PDF-1.4".to_vec(),
            Some(&json!({ "client": 1 })),
        )
        .await
        .unwrap();

    assert_eq!(upload.url, "/media/care-plan.pdf");
    let state = upstream.lock();
    let (name, size, metadata) = &state.uploads[0];
    assert_eq!(name, "care-plan.pdf");
    assert_eq!(*size, 8);
    assert_eq!(metadata.as_deref(), Some(r#"{"client":1}"#));
}

#[tokio::test]
async fn reads_are_cached_until_a_write_invalidates_them() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));
    let all = Params::new();

    let first = resources.clients(&all).await;
    let second = resources.clients(&all).await;
    assert_eq!(first.data.as_ref().map(|page| page.count), Some(2));
    assert_eq!(second.version, first.version);
    assert_eq!(upstream.hits("/clients"), 1);

    let created: Client = resources
        .create::<Client, _>(&json!({ "first_name": "Alan", "last_name": "Turing" }))
        .await
        .unwrap();
    assert_eq!(created.full_name(), "Alan Turing");

    let third = resources.clients(&all).await;
    assert_eq!(upstream.hits("/clients"), 2);
    assert_eq!(third.data.as_ref().map(|page| page.count), Some(3));
    assert!(third.version > first.version);
}

#[tokio::test]
async fn concurrent_reads_share_one_request() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));
    let all = Params::new();

    let (a, b, c) = tokio::join!(
        resources.goals(&all),
        resources.goals(&all),
        resources.goals(&all),
    );

    assert_eq!(upstream.hits("/goals"), 1);
    assert_eq!(a.version, b.version);
    assert_eq!(b.version, c.version);
}

#[tokio::test]
async fn failed_revalidation_keeps_last_good_data() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));
    let all = Params::new();

    let fresh = resources.behaviors(&all).await;
    assert!(fresh.error.is_none());

    upstream.fail("/behaviors", true);
    assert!(resources.mutate(&resources.api().url("/behaviors", &all)));
    let stale = resources.behaviors(&all).await;

    assert!(stale.stale);
    assert_eq!(stale.error_message().as_deref(), Some("database unavailable"));
    assert_eq!(stale.data.as_ref().map(|page| page.count), Some(2));
}

#[tokio::test]
async fn critical_behaviors_filter_by_severity() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));

    let critical = resources.critical_behaviors().await;
    let page = critical.data.expect("critical behaviors");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].behavior_type, "Shouting");
}

#[tokio::test]
async fn expired_access_token_is_refreshed_once() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("expired", Some("refresh-1"))));

    let user = auth::current_user(&resources).await.unwrap();

    assert_eq!(user.display_name(), "Casey Jones");
    let tokens = resources.api().tokens();
    assert_eq!(tokens.access_token().await.as_deref(), Some("token-2"));
    assert_eq!(tokens.refresh_token().await.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn rejected_refresh_signs_out() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("expired", Some("stolen"))));

    let result = auth::current_user(&resources).await;

    assert!(matches!(result, Err(SessionError::SignedOut)));
    assert!(!resources.api().tokens().is_signed_in().await);
    assert!(resources.cache().is_empty());
}

#[tokio::test]
async fn sign_in_stores_tokens_and_bad_credentials_surface() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, None);

    let err = auth::sign_in(&resources, "carer", "wrong").await.unwrap_err();
    assert_eq!(err.status.as_u16(), 401);
    assert_eq!(err.message, "Invalid credentials");
    assert!(!resources.api().tokens().is_signed_in().await);

    auth::sign_in(&resources, " carer ", "secret").await.unwrap();
    assert_eq!(
        resources.api().tokens().access_token().await.as_deref(),
        Some("token-1")
    );
}

#[tokio::test]
async fn reports_are_proxied_with_their_filters() {
    let upstream = MockUpstream::start();
    let resources = resources(&upstream, Some(session("token-1", None)));

    let report = resources
        .report("behavior-summary", &Params::new().with("client", 1))
        .await
        .into_result()
        .unwrap();

    assert_eq!(report["report"], "behavior-summary");
    assert_eq!(report["filters"]["client"], "1");

    let invalid = resources.report("../users", &Params::new()).await;
    assert!(invalid.is_error());
    assert_eq!(upstream.hits("/reports/../users"), 0);
}
