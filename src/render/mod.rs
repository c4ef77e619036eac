//! Rendering session seam
//!
//! The harvester never talks to a browser directly. It asks a
//! [`RenderBackend`] for isolated [`RenderSession`]s, one per worker, and
//! drives them through navigation and script evaluation. The CDP backend
//! attaches to an already running Chromium; the scripted backend serves canned
//! pages for tests.

mod cdp;
mod discovery;
mod scripted;
mod traits;

pub use cdp::{CdpBackend, CdpSession};
pub use discovery::discover_websocket_url;
pub use scripted::{ScriptedBackend, ScriptedPage, ScriptedSession};
pub use traits::{NavigationError, Readiness, RenderBackend, RenderError, RenderSession};
