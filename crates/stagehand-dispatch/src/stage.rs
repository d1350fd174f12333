//! Stages and the continuation that links them.

use crate::context::InvocationContext;
use crate::error::StageError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One unit of pipeline work.
///
/// A stage continues the chain by awaiting [`Next::run`]. Returning without
/// calling it short-circuits every remaining stage.
#[async_trait]
pub trait Stage: Send + Sync {
	/// Name used in logs and diagnostics.
	fn name(&self) -> &str;

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError>;
}

/// Continuation handle for the stages after the current one.
pub struct Next<'a> {
	stages: &'a [Arc<dyn Stage>],
	cancel: &'a CancellationToken,
}

impl<'a> Next<'a> {
	pub(crate) fn new(stages: &'a [Arc<dyn Stage>], cancel: &'a CancellationToken) -> Self {
		Self { stages, cancel }
	}

	/// Runs the remaining stages.
	///
	/// Cancellation is checked before each stage is entered. A stage that is
	/// already running is never interrupted.
	pub async fn run(self, ctx: &mut InvocationContext) -> Result<(), StageError> {
		let Some((stage, rest)) = self.stages.split_first() else {
			ctx.progress.completed = true;
			return Ok(());
		};

		if self.cancel.is_cancelled() {
			tracing::debug!(
				path = %ctx.request().path(),
				stage = stage.name(),
				"Request cancelled before stage"
			);
			ctx.progress.cancelled = true;
			return Ok(());
		}

		tracing::trace!(stage = stage.name(), "Entering stage");
		stage.run(ctx, Next::new(rest, self.cancel)).await
	}

	/// Name of the stage that [`run`](Self::run) would enter.
	pub fn name(&self) -> Option<&str> {
		self.stages.first().map(|stage| stage.name())
	}

	/// Number of stages left in the chain.
	pub fn remaining(&self) -> usize {
		self.stages.len()
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}
}
