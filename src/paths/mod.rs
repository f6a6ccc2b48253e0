//! Search path management and file resolution.
//!
//! # Data Flow
//! ```text
//! add_path / set_path
//!     → resolver.rs::resolve_directory (overlay → absolute → relative to entries)
//!     → search.rs (append or replace, published atomically)
//!
//! lookup of "app.toml"
//!     → resolver.rs::resolve
//!         1. overlay: "" "/" "config/" "config" "/config" "/config/" + name
//!         2. overlay: <search path> + same prefixes + name
//!         3. disk:    <search path>/name, <search path>/config/name
//! ```
//!
//! # Design Decisions
//! - Resolution is read-only and never touches the cache
//! - Absence is a normal `None`, error reporting is left to the caller

pub mod resolver;
pub mod search;

pub use resolver::{PathResolver, Resolved};
pub use search::SearchPathSet;
