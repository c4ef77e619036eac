//! Scripted in-memory rendering backend
//!
//! Serves canned pages keyed by URL so the harvester can be exercised without
//! a browser. Every navigation is recorded for later inspection.

use crate::render::traits::{
    NavigationError, Readiness, RenderBackend, RenderError, RenderSession,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// How a scripted page behaves when visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedPage {
    /// Loads under any readiness and lists these identifiers
    Items(Vec<String>),

    /// Never reaches network quiescence but loads once only DOM readiness is awaited
    Slow(Vec<String>),

    /// Times out under every readiness mode
    Unreachable,

    /// Loads, but the extraction script throws
    Broken,
}

impl ScriptedPage {
    /// Convenience constructor for an `Items` page
    pub fn items(ids: &[&str]) -> Self {
        Self::Items(ids.iter().map(|id| id.to_string()).collect())
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    pages: HashMap<String, ScriptedPage>,
    navigations: Mutex<Vec<(String, Readiness)>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Backend serving scripted pages
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<ScriptState>,
    latency: Duration,
    refuse_sessions: bool,
}

impl ScriptedBackend {
    /// Creates a backend with no pages; unknown URLs render as empty pages
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the behaviour of one URL
    ///
    /// Must be called before the backend is cloned or handed out.
    pub fn page(mut self, url: &Url, page: ScriptedPage) -> Self {
        match Arc::get_mut(&mut self.state) {
            Some(state) => {
                state.pages.insert(url.to_string(), page);
            }
            None => tracing::warn!("Scripted backend already shared; ignoring page {}", url),
        }
        self
    }

    /// Delays every navigation so sessions interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every `open_session` call fail
    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }

    /// Every navigation attempt made so far, in order
    pub fn navigations(&self) -> Vec<(String, Readiness)> {
        self.state
            .navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs of first navigation attempts, one per processed page
    pub fn visited_urls(&self) -> Vec<String> {
        self.navigations()
            .into_iter()
            .filter(|(_, readiness)| *readiness == Readiness::NetworkQuiescent)
            .map(|(url, _)| url)
            .collect()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for ScriptedBackend {
    type Session = ScriptedSession;

    async fn open_session(&self) -> Result<ScriptedSession, RenderError> {
        if self.refuse_sessions {
            return Err(RenderError::Session("scripted backend refuses sessions".to_string()));
        }

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
            latency: self.latency,
            current: None,
            closed: false,
        })
    }
}

/// Session of the scripted backend
#[derive(Debug)]
pub struct ScriptedSession {
    state: Arc<ScriptState>,
    latency: Duration,
    current: Option<ScriptedPage>,
    closed: bool,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(
        &mut self,
        url: &Url,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        self.state
            .navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_string(), readiness));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let page = self.state.pages.get(url.as_str()).cloned();
        let timed_out = match (&page, readiness) {
            (Some(ScriptedPage::Unreachable), _) => true,
            (Some(ScriptedPage::Slow(_)), Readiness::NetworkQuiescent) => true,
            _ => false,
        };

        if timed_out {
            self.current = None;
            return Err(NavigationError::Timeout {
                url: url.to_string(),
                readiness,
                timeout,
            });
        }

        self.current = page;
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value, RenderError> {
        match &self.current {
            Some(ScriptedPage::Items(ids)) | Some(ScriptedPage::Slow(ids)) => Ok(Value::Array(
                ids.iter().map(|id| json!({ "id": id })).collect(),
            )),
            Some(ScriptedPage::Broken) => Err(RenderError::Evaluation(
                "TypeError: cannot read properties of undefined".to_string(),
            )),
            Some(ScriptedPage::Unreachable) | None => Ok(Value::Null),
        }
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if !self.closed {
            self.closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
