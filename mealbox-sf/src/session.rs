//! Authenticated session container
//!
//! Holds the bearer token handed over by the (external) login flow. The token
//! is opaque here.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(skip_serializing)]
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

/// Current session, if any
#[derive(Debug, Default)]
pub struct SessionState {
    current: RwLock<Option<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Install `session`, returning the one it replaced
    pub async fn login(&self, session: Session) -> Option<Session> {
        self.current.write().await.replace(session)
    }

    pub async fn logout(&self) -> Option<Session> {
        self.current.write().await.take()
    }
}
