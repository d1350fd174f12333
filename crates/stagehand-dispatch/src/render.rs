//! Rendering collaborator.

use crate::context::InvocationContext;
use crate::error::StageError;
use async_trait::async_trait;

/// Produces a response from a finished context.
///
/// The dispatch core never defines the output format. Implementations read
/// [`InvocationContext::result_code`], the action's
/// [`model`](crate::Action::model) and the validation errors, and deliver the
/// response through their own channel.
#[async_trait]
pub trait Renderer: Send + Sync {
	async fn render(&self, ctx: &InvocationContext) -> Result<(), StageError>;
}
