//! Rendering traits and error types

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a rendering backend outside of navigation
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to connect to browser at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Failed to open rendering session: {0}")]
    Session(String),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Failed to close rendering session: {0}")]
    Close(String),
}

/// Errors from a single navigation attempt
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Timed out after {timeout:?} waiting for {readiness} on {url}")]
    Timeout {
        url: String,
        readiness: Readiness,
        timeout: Duration,
    },

    #[error("Navigation to {url} failed: {message}")]
    Failed { url: String, message: String },
}

/// Condition a navigation waits for before it counts as loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// Document loaded and network traffic has gone quiet
    NetworkQuiescent,

    /// Document parsed; late network activity is not awaited
    DomReady,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkQuiescent => write!(f, "network quiescence"),
            Self::DomReady => write!(f, "DOM readiness"),
        }
    }
}

/// One isolated rendering session (a browser tab)
///
/// A session is owned by exactly one worker for its whole lifetime.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url`, waiting for `readiness` within `timeout`
    async fn navigate(
        &mut self,
        url: &Url,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<(), NavigationError>;

    /// Evaluates a script in the current page and returns its JSON value
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError>;

    /// Releases the session
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Source of rendering sessions
#[async_trait]
pub trait RenderBackend: Send + Sync {
    type Session: RenderSession + 'static;

    /// Opens a new, independent session
    async fn open_session(&self) -> Result<Self::Session, RenderError>;
}
