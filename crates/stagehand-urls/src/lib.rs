//! # Stagehand URLs
//!
//! Action routing for the stagehand dispatch core.
//!
//! Actions are described by [`ScanEntry`] records produced by an external
//! scanner at boot. Each entry is parsed into an [`ActionDescriptor`] and
//! registered in an [`ActionRegistry`], which resolves request paths to
//! descriptors and extracts [`UriParameters`] from the remainder of the path.
//!
//! ## Pattern syntax
//!
//! | Segment     | Meaning                                        |
//! |-------------|------------------------------------------------|
//! | `edit`      | literal text, `\{` and `\}` escape braces      |
//! | `{id}`      | one non-empty path segment captured as `id`    |
//! | `{*rest}`   | the remaining path, only as the last segment   |
//!
//! ## Example
//!
//! ```
//! use stagehand_urls::{ActionRegistry, ScanEntry};
//!
//! let mut registry = ActionRegistry::new();
//! registry
//!     .register_scan(&ScanEntry::new("UserEdit", "/user/edit").with_pattern("{id}"))
//!     .unwrap();
//!
//! let found = registry.lookup("/user/edit/42").unwrap();
//! assert_eq!(found.descriptor.handler_type().as_str(), "UserEdit");
//! assert_eq!(found.uri_parameters.get("id"), Some("42"));
//! ```

pub mod descriptor;
pub mod error;
pub mod params;
pub mod pattern;
pub mod registry;

pub use descriptor::{ActionDescriptor, HandlerType, ScanEntry};
pub use error::RouteError;
pub use params::UriParameters;
pub use pattern::{
	DEFAULT_MAX_PATTERN_LENGTH, DEFAULT_MAX_PATTERN_SEGMENTS, PatternError, PatternLimits, Segment,
	UriPattern,
};
pub use registry::{ActionRegistry, RouteMatch};
