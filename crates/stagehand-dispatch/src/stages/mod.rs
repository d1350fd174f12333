//! Built-in stages.
//!
//! The default request flow is
//! `resolve → instantiate → bind → validate → invoke → render`, with
//! [`NotFoundStage`] taking over when resolution misses.

mod bind;
mod instantiate;
mod invoke;
mod not_found;
mod render;
mod resolve;
mod validate;

pub use bind::BindParametersStage;
pub use instantiate::InstantiateActionStage;
pub use invoke::InvokeActionStage;
pub use not_found::{DEFAULT_NOT_FOUND_RESULT, NotFoundStage};
pub use render::RenderResultStage;
pub use resolve::ResolveActionStage;
pub use validate::{DEFAULT_INPUT_RESULT, ValidateStage};
