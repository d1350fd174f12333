use crate::action::ActionFactory;
use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use async_trait::async_trait;
use std::sync::Arc;

/// Creates the action instance for the resolved descriptor.
pub struct InstantiateActionStage {
	factory: Arc<dyn ActionFactory>,
}

impl InstantiateActionStage {
	pub fn new(factory: Arc<dyn ActionFactory>) -> Self {
		Self { factory }
	}
}

#[async_trait]
impl Stage for InstantiateActionStage {
	fn name(&self) -> &str {
		"instantiate_action"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		let descriptor = ctx
			.descriptor()
			.ok_or_else(|| StageError::internal("No resolved action to instantiate"))?;
		let action = self.factory.create(descriptor.handler_type())?;
		ctx.set_action(action);
		next.run(ctx).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::action::ActionCatalog;
	use crate::error::{INSTANTIATION, INTERNAL};
	use crate::pipeline::{Pipeline, PipelineState};
	use crate::request::ActionRequest;
	use crate::stages::ResolveActionStage;
	use crate::stages::testing::Article;
	use rstest::rstest;
	use stagehand_urls::{ActionRegistry, ScanEntry};
	use tokio_util::sync::CancellationToken;

	fn pipeline(catalog: ActionCatalog) -> Pipeline {
		let mut registry = ActionRegistry::new();
		registry
			.register_scan(&ScanEntry::new("Article", "/article"))
			.unwrap();
		registry
			.register_scan(&ScanEntry::new("Ghost", "/ghost"))
			.unwrap();
		Pipeline::builder()
			.stage(ResolveActionStage::new(Arc::new(registry)))
			.stage(InstantiateActionStage::new(Arc::new(catalog)))
			.exception_handler(&INSTANTIATION, |_: &mut InvocationContext, _: &StageError| {
				"unavailable".to_string()
			})
			.build()
	}

	#[rstest]
	#[tokio::test]
	async fn test_creates_action() {
		let catalog = ActionCatalog::new().with_action("Article", Article::default);

		let outcome = pipeline(catalog)
			.execute(ActionRequest::get("/article"), &CancellationToken::new())
			.await;

		assert_eq!(outcome.state, PipelineState::Completed);
		assert!(outcome.context.unwrap().action().is_some());
	}

	#[rstest]
	#[tokio::test]
	async fn test_unknown_handler_type_is_instantiation_error() {
		let catalog = ActionCatalog::new().with_action("Article", Article::default);

		let outcome = pipeline(catalog)
			.execute(ActionRequest::get("/ghost"), &CancellationToken::new())
			.await;

		assert_eq!(outcome.state, PipelineState::ShortCircuited);
		assert_eq!(outcome.result_code.as_deref(), Some("unavailable"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_requires_resolution() {
		let pipeline = Pipeline::builder()
			.stage(InstantiateActionStage::new(Arc::new(ActionCatalog::new())))
			.exception_handler(&INTERNAL, |_: &mut InvocationContext, e: &StageError| {
				e.kind().name().to_string()
			})
			.build();

		let outcome = pipeline
			.execute(ActionRequest::get("/article"), &CancellationToken::new())
			.await;

		assert_eq!(outcome.result_code.as_deref(), Some("internal"));
	}
}
