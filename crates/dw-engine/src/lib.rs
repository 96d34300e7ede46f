//! Embedded web-engine boundary: view trait, engine events, and request
//! interception.
//!
//! The shell talks to whatever engine renders its tabs exclusively through
//! [`EngineView`] and [`EngineEvent`]. Outgoing requests pass through a
//! [`UrlRequestInterceptor`] before any transfer starts. The bundled
//! [`LocalDocumentEngine`] implements the view trait for `about:` and
//! `file:` documents so the whole shell runs without a network stack.

pub mod intercept;
pub mod local;
pub mod view;

pub use intercept::AllowAllInterceptor;
pub use intercept::BlocklistInterceptor;
pub use intercept::RequestDecision;
pub use intercept::UrlRequestInfo;
pub use intercept::UrlRequestInterceptor;
pub use intercept::request_authority;
pub use local::LocalDocumentEngine;
pub use view::EngineEvent;
pub use view::EngineView;
pub use view::SnapshotId;
