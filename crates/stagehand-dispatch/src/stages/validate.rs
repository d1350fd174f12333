use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use async_trait::async_trait;

/// Default result code for requests with binding or validation errors.
pub const DEFAULT_INPUT_RESULT: &str = "input";

/// Runs action validation and short-circuits when any error was reported,
/// including conversion errors collected during binding.
#[derive(Debug, Clone)]
pub struct ValidateStage {
	input_result: String,
}

impl ValidateStage {
	pub fn new(input_result: impl Into<String>) -> Self {
		Self {
			input_result: input_result.into(),
		}
	}
}

impl Default for ValidateStage {
	fn default() -> Self {
		Self::new(DEFAULT_INPUT_RESULT)
	}
}

#[async_trait]
impl Stage for ValidateStage {
	fn name(&self) -> &str {
		"validate"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		{
			let (action, errors) = ctx.action_with_errors();
			if let Some(action) = action {
				action.validate(errors);
			}
		}

		if !ctx.validation_errors().is_empty() {
			tracing::debug!(
				path = %ctx.request().path(),
				fields = ctx.validation_errors().len(),
				"Validation failed"
			);
			ctx.set_result_code(self.input_result.clone());
			return Ok(());
		}

		next.run(ctx).await
	}
}
