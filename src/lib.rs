//! Configuration resolution and caching.
//!
//! A logical file name such as `app.toml` is resolved against an ordered set
//! of search directories (and optionally an in-binary resource overlay),
//! parsed once into a queryable [`Document`], and served from a cache that
//! is kept coherent with the file through change notifications.
//!
//! # Architecture Overview
//!
//! ```text
//!   Registry ──▶ ConfigHandle ──▶ DocumentCache ──hit──▶ Arc<Document>
//!                     │                 │ miss
//!                     │                 ▼
//!                     │          InlineContent? ──▶ sniff + parse
//!                     │          PathResolver   ──▶ overlay | disk
//!                     │                 │
//!                     │                 ▼
//!                     │          format dispatch ──▶ Document
//!                     │                 │ disk file
//!                     ▼                 ▼
//!               Invalidator ◀── WatchBackend (notify) events
//! ```

// Core
pub mod cache;
pub mod document;
pub mod error;
pub mod paths;

// Sources
pub mod content;
pub mod overlay;
pub mod overrides;

// Facade
pub mod handle;
pub mod registry;

// Cross-cutting concerns
pub mod observability;
pub mod watch;

pub use content::{InlineContent, DEFAULT_CONFIG_FILE};
pub use document::{Document, Format, Origin};
pub use error::{ConfigError, Result};
pub use handle::{ConfigHandle, ConfigHandleBuilder};
pub use overlay::{MapOverlay, OverlayFile, ResourceOverlay};
pub use overrides::Overrides;
pub use registry::{Registry, DEFAULT_INSTANCE};
pub use watch::{ChangeKind, ChangeNotifier, WatchBackend, WatchMode};
