//! Chrome DevTools Protocol backend
//!
//! Attaches to an already running Chromium instance and opens one tab per
//! session. Readiness is read from the page lifecycle events of the main
//! frame: `DOMContentLoaded` for a ready document and `networkIdle` for a
//! quiet network.

use crate::render::traits::{
    NavigationError, Readiness, RenderBackend, RenderError, RenderSession,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Lifecycle event emitted when a new document commits in a frame
const DOCUMENT_INIT: &str = "init";

/// Lifecycle event that satisfies a readiness condition
fn lifecycle_event(readiness: Readiness) -> &'static str {
    match readiness {
        Readiness::DomReady => "DOMContentLoaded",
        Readiness::NetworkQuiescent => "networkIdle",
    }
}

/// Tracks the main frame's lifecycle until the awaited event of the new
/// document arrives. Events seen before the document commits belong to the
/// previous document and are ignored.
#[derive(Debug)]
struct LifecycleWatch {
    frame: String,
    awaited: &'static str,
    committed: bool,
}

impl LifecycleWatch {
    fn new(frame: impl Into<String>, readiness: Readiness) -> Self {
        Self {
            frame: frame.into(),
            awaited: lifecycle_event(readiness),
            committed: false,
        }
    }

    /// Feeds one lifecycle event, returning true once the awaited one is seen
    fn observe(&mut self, frame: &str, name: &str) -> bool {
        if frame != self.frame {
            return false;
        }
        if name == DOCUMENT_INIT {
            self.committed = true;
            return false;
        }
        self.committed && name == self.awaited
    }
}

/// Rendering backend attached to a running browser over CDP
pub struct CdpBackend {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl CdpBackend {
    /// Connects to the browser's DevTools WebSocket
    ///
    /// # Arguments
    ///
    /// * `ws_url` - The `webSocketDebuggerUrl` returned by discovery
    pub async fn connect(ws_url: &str) -> Result<Self, RenderError> {
        let (browser, mut handler) =
            Browser::connect(ws_url)
                .await
                .map_err(|e| RenderError::Connect {
                    endpoint: ws_url.to_string(),
                    message: e.to_string(),
                })?;

        // The handler drives the protocol connection and must be polled for the
        // browser's lifetime.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
            tracing::debug!("CDP handler finished");
        });

        tracing::info!("Attached to browser over DevTools protocol");
        Ok(Self { browser, handler })
    }

    /// Detaches from the browser without closing it
    pub async fn disconnect(self) {
        self.handler.abort();
        let _ = self.handler.await;
    }
}

#[async_trait]
impl RenderBackend for CdpBackend {
    type Session = CdpSession;

    async fn open_session(&self) -> Result<CdpSession, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        Ok(CdpSession { page: Some(page) })
    }
}

/// One browser tab
pub struct CdpSession {
    page: Option<Page>,
}

impl CdpSession {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Session("session already closed".to_string()))
    }

    /// Starts a navigation from page script
    ///
    /// Unlike `Page::goto`, this returns as soon as the navigation is
    /// scheduled instead of waiting for the load event.
    async fn assign_location(page: &Page, url: &Url) -> Result<(), String> {
        let target = serde_json::to_string(url.as_str()).map_err(|e| e.to_string())?;
        let script = format!("window.location.assign({})", target);
        page.evaluate_expression(EvaluateParams::new(script))
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Consumes lifecycle events until the watch is satisfied
    async fn wait_for_lifecycle(
        events: &mut EventStream<EventLifecycleEvent>,
        watch: &mut LifecycleWatch,
    ) -> Result<(), String> {
        while let Some(event) = events.next().await {
            if watch.observe(event.frame_id.as_ref(), &event.name) {
                return Ok(());
            }
        }
        Err("lifecycle event stream closed".to_string())
    }
}

#[async_trait]
impl RenderSession for CdpSession {
    async fn navigate(
        &mut self,
        url: &Url,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        let page = self.page().map_err(|e| NavigationError::Failed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let failed = |message: String| NavigationError::Failed {
            url: url.to_string(),
            message,
        };

        let attempt = async {
            let frame = page
                .mainframe()
                .await
                .map_err(|e| failed(e.to_string()))?
                .ok_or_else(|| failed("page has no main frame".to_string()))?;

            // Subscribe before navigating so no event of the new document is missed
            let mut events = page
                .event_listener::<EventLifecycleEvent>()
                .await
                .map_err(|e| failed(e.to_string()))?;
            let mut watch = LifecycleWatch::new(frame.inner().clone(), readiness);

            match readiness {
                Readiness::DomReady => {
                    Self::assign_location(page, url).await.map_err(failed)?;
                }
                Readiness::NetworkQuiescent => {
                    // goto surfaces network errors; events keep buffering meanwhile
                    page.goto(url.as_str())
                        .await
                        .map_err(|e| failed(e.to_string()))?;
                }
            }

            Self::wait_for_lifecycle(&mut events, &mut watch)
                .await
                .map_err(failed)
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(NavigationError::Timeout {
                url: url.to_string(),
                readiness,
                timeout,
            }),
        }
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError> {
        let page = self.page()?;
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(RenderError::Evaluation)?;

        let result = page
            .evaluate_expression(params)
            .await
            .map_err(|e| RenderError::Evaluation(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        match self.page.take() {
            Some(page) => page
                .close()
                .await
                .map_err(|e| RenderError::Close(e.to_string())),
            None => Ok(()),
        }
    }
}
