use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use async_trait::async_trait;

/// Executes the action and stores its result code.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeActionStage;

#[async_trait]
impl Stage for InvokeActionStage {
	fn name(&self) -> &str {
		"invoke_action"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		let (action, request) = ctx.action_with_request();
		let action = action.ok_or_else(|| StageError::internal("No action instance to invoke"))?;
		let code = action.execute(request).await?;

		tracing::trace!(path = %ctx.request().path(), result_code = %code, "Action executed");
		ctx.set_result_code(code);
		next.run(ctx).await
	}
}
