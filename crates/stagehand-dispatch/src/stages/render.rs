use crate::context::InvocationContext;
use crate::error::StageError;
use crate::render::Renderer;
use crate::stage::{Next, Stage};
use async_trait::async_trait;
use std::sync::Arc;

/// Hands the context to the renderer and marks it rendered.
pub struct RenderResultStage {
	renderer: Arc<dyn Renderer>,
}

impl RenderResultStage {
	pub fn new(renderer: Arc<dyn Renderer>) -> Self {
		Self { renderer }
	}
}

#[async_trait]
impl Stage for RenderResultStage {
	fn name(&self) -> &str {
		"render_result"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		self.renderer.render(ctx).await?;
		ctx.mark_rendered();
		next.run(ctx).await
	}
}
