use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use crate::stages::NotFoundStage;
use async_trait::async_trait;
use stagehand_urls::ActionRegistry;
use std::sync::Arc;

/// Resolves the request path against the action registry.
///
/// On a miss the context is marked missing and the missing stage runs in
/// place of the rest of the chain. It receives the continuation, so a custom
/// missing stage may still continue.
pub struct ResolveActionStage {
	registry: Arc<ActionRegistry>,
	missing: Arc<dyn Stage>,
}

impl ResolveActionStage {
	pub fn new(registry: Arc<ActionRegistry>) -> Self {
		Self {
			registry,
			missing: Arc::new(NotFoundStage::default()),
		}
	}

	pub fn with_missing_stage(mut self, missing: Arc<dyn Stage>) -> Self {
		self.missing = missing;
		self
	}
}

#[async_trait]
impl Stage for ResolveActionStage {
	fn name(&self) -> &str {
		"resolve_action"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		match self.registry.lookup(ctx.request().path()) {
			Some(route) => {
				tracing::trace!(
					path = %ctx.request().path(),
					handler = %route.descriptor.handler_type(),
					"Resolved action"
				);
				ctx.resolve(route);
				next.run(ctx).await
			}
			None => {
				tracing::debug!(path = %ctx.request().path(), "No action matched request path");
				ctx.mark_missing();
				self.missing.run(ctx, next).await
			}
		}
	}
}
