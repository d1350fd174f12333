use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use async_trait::async_trait;

/// Default result code for unresolved requests.
pub const DEFAULT_NOT_FOUND_RESULT: &str = "not_found";

/// Terminal stage for requests no action matched.
#[derive(Debug, Clone)]
pub struct NotFoundStage {
	result_code: String,
}

impl NotFoundStage {
	pub fn new(result_code: impl Into<String>) -> Self {
		Self {
			result_code: result_code.into(),
		}
	}
}

impl Default for NotFoundStage {
	fn default() -> Self {
		Self::new(DEFAULT_NOT_FOUND_RESULT)
	}
}

#[async_trait]
impl Stage for NotFoundStage {
	fn name(&self) -> &str {
		"not_found"
	}

	async fn run(&self, ctx: &mut InvocationContext, _next: Next<'_>) -> Result<(), StageError> {
		ctx.set_result_code(self.result_code.clone());
		Ok(())
	}
}
