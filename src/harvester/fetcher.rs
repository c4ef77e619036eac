//! Page fetching with a relaxed-readiness retry
//!
//! # Fetch Flow
//!
//! 1. Navigate and wait for network quiescence
//! 2. If that fails, navigate again waiting only for DOM readiness
//! 3. If both fail, the page is a hard failure
//! 4. After a successful navigation, wait the settle delay, then extract

use crate::harvester::extract::IdentifierExtractor;
use crate::render::{Readiness, RenderSession};
use std::time::Duration;
use url::Url;

/// Timing parameters of a fetch
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    /// Bound on each navigation attempt
    pub navigation_timeout: Duration,

    /// Pause between navigation and extraction
    pub settle_delay: Duration,
}

/// Result of fetching one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    /// Navigation succeeded; identifiers in page order (possibly none)
    Loaded(Vec<String>),

    /// Both navigation attempts failed
    Failed {
        /// Error of the last attempt
        error: String,
    },
}

/// Fetches a URL with the session and extracts its identifiers
///
/// Only touches the session's navigation state.
///
/// # Arguments
///
/// * `session` - The rendering session owned by the caller
/// * `url` - Page to load
/// * `settings` - Navigation timeout and settle delay
/// * `extractor` - Extraction collaborator run after the page settles
pub async fn fetch_page<S: RenderSession + ?Sized>(
    session: &mut S,
    url: &Url,
    settings: FetchSettings,
    extractor: &IdentifierExtractor,
) -> PageFetch {
    let timeout = settings.navigation_timeout;

    if let Err(first) = session
        .navigate(url, Readiness::NetworkQuiescent, timeout)
        .await
    {
        tracing::debug!("{}; retrying with {}", first, Readiness::DomReady);

        if let Err(second) = session.navigate(url, Readiness::DomReady, timeout).await {
            return PageFetch::Failed {
                error: second.to_string(),
            };
        }
    }

    if !settings.settle_delay.is_zero() {
        tokio::time::sleep(settings.settle_delay).await;
    }

    PageFetch::Loaded(extractor.extract(session).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderBackend, ScriptedBackend, ScriptedPage};

    fn url(page: u32) -> Url {
        Url::parse(&format!("https://shop.example.com/list?p={}", page)).unwrap()
    }

    fn settings() -> FetchSettings {
        FetchSettings {
            navigation_timeout: Duration::from_secs(1),
            settle_delay: Duration::ZERO,
        }
    }

    fn extractor() -> IdentifierExtractor {
        IdentifierExtractor::new("window.items", "id")
    }

    #[tokio::test]
    async fn test_loaded_page() {
        let backend = ScriptedBackend::new().page(&url(2), ScriptedPage::items(&["A3", "A4"]));
        let mut session = backend.open_session().await.unwrap();

        let fetch = fetch_page(&mut session, &url(2), settings(), &extractor()).await;
        assert_eq!(fetch, PageFetch::Loaded(vec!["A3".into(), "A4".into()]));
        assert_eq!(backend.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_with_dom_readiness() {
        let backend = ScriptedBackend::new().page(&url(3), ScriptedPage::Slow(vec!["A5".into()]));
        let mut session = backend.open_session().await.unwrap();

        let fetch = fetch_page(&mut session, &url(3), settings(), &extractor()).await;
        assert_eq!(fetch, PageFetch::Loaded(vec!["A5".into()]));

        let readiness: Vec<Readiness> = backend.navigations().into_iter().map(|(_, r)| r).collect();
        assert_eq!(readiness, vec![Readiness::NetworkQuiescent, Readiness::DomReady]);
    }

    #[tokio::test]
    async fn test_hard_failure_after_two_attempts() {
        let backend = ScriptedBackend::new().page(&url(5), ScriptedPage::Unreachable);
        let mut session = backend.open_session().await.unwrap();

        let fetch = fetch_page(&mut session, &url(5), settings(), &extractor()).await;
        assert!(matches!(fetch, PageFetch::Failed { .. }));
        assert_eq!(backend.navigations().len(), 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_empty() {
        let backend = ScriptedBackend::new().page(&url(6), ScriptedPage::Broken);
        let mut session = backend.open_session().await.unwrap();

        let fetch = fetch_page(&mut session, &url(6), settings(), &extractor()).await;
        assert_eq!(fetch, PageFetch::Loaded(Vec::new()));
    }
}
