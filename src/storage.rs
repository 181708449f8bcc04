use crate::errors::AppError;
use crate::models::Session;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::RwLock};
use tracing::error;

/// Access and refresh tokens, mirrored to a JSON file.
pub struct TokenStore {
    path: PathBuf,
    session: RwLock<Option<Session>>,
}

impl TokenStore {
    pub async fn open(path: PathBuf) -> Self {
        let session = load_session(&path).await;
        Self {
            path,
            session: RwLock::new(session),
        }
    }

    /// A store that never touches the disk.
    pub fn in_memory(session: Option<Session>) -> Self {
        Self {
            path: PathBuf::new(),
            session: RwLock::new(session),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|session| session.refresh.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn set(&self, session: Session) -> Result<(), AppError> {
        let mut guard = self.session.write().await;
        if !self.path.as_os_str().is_empty() {
            persist_session(&self.path, &session).await?;
        }
        *guard = Some(session);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        let mut guard = self.session.write().await;
        *guard = None;
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::internal(err)),
        }
    }
}

pub async fn load_session(path: &Path) -> Option<Session> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(err) => {
                error!("failed to parse session file: {err}");
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!("failed to read session file: {err}");
            None
        }
    }
}

pub async fn persist_session(path: &Path, session: &Session) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(session).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
