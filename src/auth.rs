use crate::errors::{ApiError, AppError};
use crate::models::{Session, User};
use crate::resources::Resources;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub enum SessionError {
    SignedOut,
    Upstream(Arc<ApiError>),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SignedOut => AppError {
                status: StatusCode::UNAUTHORIZED,
                message: "not signed in".to_string(),
            },
            SessionError::Upstream(err) => AppError {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
            },
        }
    }
}

/// Resolves the signed-in user through the cached profile read.
///
/// An unauthorized profile check tries the refresh token once; if that
/// fails too, the stored tokens and every cached response are dropped.
pub async fn current_user(resources: &Resources) -> Result<Arc<User>, SessionError> {
    let tokens = resources.api().tokens();
    if !tokens.is_signed_in().await {
        return Err(SessionError::SignedOut);
    }

    let profile = resources.profile().await;
    if !profile.is_unauthorized() {
        return profile.into_result().map_err(SessionError::Upstream);
    }

    if refresh(resources).await {
        let profile = resources.profile().await;
        if !profile.is_unauthorized() {
            return profile.into_result().map_err(SessionError::Upstream);
        }
    }

    info!("session rejected, signing out");
    if let Err(err) = sign_out(resources).await {
        warn!("failed to clear session: {}", err.message);
    }
    Err(SessionError::SignedOut)
}

async fn refresh(resources: &Resources) -> bool {
    let tokens = resources.api().tokens();
    let Some(refresh_token) = tokens.refresh_token().await else {
        return false;
    };
    match resources.api().refresh(&refresh_token).await {
        Ok(session) => {
            let session = Session {
                refresh: session.refresh.or(Some(refresh_token)),
                ..session
            };
            if let Err(err) = tokens.set(session).await {
                warn!("failed to store refreshed session: {}", err.message);
                return false;
            }
            resources.mutate(&resources.api().url("/auth/profile", &Default::default()));
            true
        }
        Err(err) => {
            info!("token refresh failed: {err}");
            false
        }
    }
}

pub async fn sign_in(resources: &Resources, username: &str, password: &str) -> Result<(), AppError> {
    let session = resources.api().login(username.trim(), password).await?;
    resources.clear();
    resources.api().tokens().set(session).await?;
    info!(username = username.trim(), "signed in");
    Ok(())
}

pub async fn sign_out(resources: &Resources) -> Result<(), AppError> {
    resources.clear();
    resources.api().tokens().clear().await
}
