//! Integration tests for the stage pipeline
//!
//! Tests the executor through the public API:
//! - Stage ordering and short-circuit
//! - Exception handler dispatch by error kind
//! - Rendering after short-circuit
//! - Cancellation between stages
//! - Panicking stages

use async_trait::async_trait;
use rstest::rstest;
use stagehand_dispatch::error::{ACTION, ERROR, ErrorKind, RENDER};
use stagehand_dispatch::{
	ActionRequest, InvocationContext, Next, Pipeline, PipelineBuilder, PipelineState, Renderer,
	ResultCode, Stage, StageError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

static LOCKED: ErrorKind = ErrorKind::child("locked", &ACTION);

type Trace = Arc<Mutex<Vec<&'static str>>>;

/// Stage that records itself and continues
struct Pass {
	name: &'static str,
	trace: Trace,
}

#[async_trait]
impl Stage for Pass {
	fn name(&self) -> &str {
		self.name
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		self.trace.lock().unwrap().push(self.name);
		next.run(ctx).await
	}
}

/// Stage that records itself and stops the chain with a result code
struct Stop {
	trace: Trace,
}

#[async_trait]
impl Stage for Stop {
	fn name(&self) -> &str {
		"stop"
	}

	async fn run(&self, ctx: &mut InvocationContext, _next: Next<'_>) -> Result<(), StageError> {
		self.trace.lock().unwrap().push("stop");
		ctx.set_result_code("stopped");
		Ok(())
	}
}

/// Stage that records itself and fails
struct Fail {
	trace: Trace,
	kind: &'static ErrorKind,
}

#[async_trait]
impl Stage for Fail {
	fn name(&self) -> &str {
		"fail"
	}

	async fn run(&self, _ctx: &mut InvocationContext, _next: Next<'_>) -> Result<(), StageError> {
		self.trace.lock().unwrap().push("fail");
		Err(StageError::new(self.kind, "stage failed"))
	}
}

/// Stage that cancels the request and then continues
struct CancelThenContinue {
	token: CancellationToken,
	trace: Trace,
}

#[async_trait]
impl Stage for CancelThenContinue {
	fn name(&self) -> &str {
		"cancel"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		self.trace.lock().unwrap().push("cancel");
		self.token.cancel();
		next.run(ctx).await
	}
}

/// Renderer that counts calls and captures the result code it saw
#[derive(Default)]
struct CountingRenderer {
	calls: AtomicUsize,
	seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl Renderer for CountingRenderer {
	async fn render(&self, ctx: &InvocationContext) -> Result<(), StageError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.seen
			.lock()
			.unwrap()
			.push(ctx.result_code().map(str::to_string));
		Ok(())
	}
}

/// Renderer that always fails
struct BrokenRenderer;

#[async_trait]
impl Renderer for BrokenRenderer {
	async fn render(&self, _ctx: &InvocationContext) -> Result<(), StageError> {
		Err(StageError::new(&RENDER, "template missing"))
	}
}

/// Stage that records itself and panics on an out-of-bounds index
struct Explode {
	trace: Trace,
}

#[async_trait]
impl Stage for Explode {
	fn name(&self) -> &str {
		"explode"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		self.trace.lock().unwrap().push("explode");
		let slots: Vec<&str> = Vec::new();
		ctx.set_result_code(slots[0]);
		next.run(ctx).await
	}
}

fn pass(name: &'static str, trace: &Trace) -> Pass {
	Pass {
		name,
		trace: trace.clone(),
	}
}

fn a_b_c(trace: &Trace, b: impl Stage + 'static) -> PipelineBuilder {
	Pipeline::builder()
		.stage(pass("a", trace))
		.stage(b)
		.stage(pass("c", trace))
}

#[rstest]
#[tokio::test]
async fn test_short_circuit_in_b_skips_c() {
	// Arrange
	let trace = Trace::default();
	let renderer = Arc::new(CountingRenderer::default());
	let pipeline = a_b_c(&trace, Stop { trace: trace.clone() })
		.renderer(renderer.clone())
		.build();

	// Act
	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	// Assert
	assert_eq!(*trace.lock().unwrap(), vec!["a", "stop"]);
	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(outcome.result_code.as_deref(), Some("stopped"));
	assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
	assert!(outcome.context.unwrap().is_rendered());
}

#[rstest]
#[tokio::test]
async fn test_handled_error_renders_handler_result() {
	// Arrange
	let trace = Trace::default();
	let renderer = Arc::new(CountingRenderer::default());
	let pipeline = a_b_c(
		&trace,
		Fail {
			trace: trace.clone(),
			kind: &LOCKED,
		},
	)
	.exception_handler(&LOCKED, ResultCode::new("locked_out"))
	.exception_handler(&ACTION, ResultCode::new("generic_action"))
	.renderer(renderer.clone())
	.build();

	// Act
	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	// Assert
	assert_eq!(*trace.lock().unwrap(), vec!["a", "fail"]);
	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(outcome.result_code.as_deref(), Some("locked_out"));
	assert_eq!(
		*renderer.seen.lock().unwrap(),
		vec![Some("locked_out".to_string())]
	);
}

#[rstest]
#[tokio::test]
async fn test_error_falls_back_to_ancestor_handler() {
	let trace = Trace::default();
	let pipeline = a_b_c(
		&trace,
		Fail {
			trace: trace.clone(),
			kind: &LOCKED,
		},
	)
	.exception_handler(&ACTION, ResultCode::new("generic_action"))
	.build();

	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	assert_eq!(outcome.result_code.as_deref(), Some("generic_action"));
}

#[rstest]
#[tokio::test]
async fn test_unregistered_error_fails_without_rendering() {
	// Arrange
	let trace = Trace::default();
	let renderer = Arc::new(CountingRenderer::default());
	let pipeline = a_b_c(
		&trace,
		Fail {
			trace: trace.clone(),
			kind: &RENDER,
		},
	)
	.exception_handler(&ACTION, ResultCode::new("generic_action"))
	.renderer(renderer.clone())
	.build();

	// Act
	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	// Assert
	assert_eq!(outcome.state, PipelineState::Failed);
	assert_eq!(outcome.result_code.as_deref(), Some("error"));
	assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
	assert_eq!(*trace.lock().unwrap(), vec!["a", "fail"]);
}

#[rstest]
#[tokio::test]
async fn test_render_on_short_circuit_can_be_disabled() {
	let trace = Trace::default();
	let renderer = Arc::new(CountingRenderer::default());
	let pipeline = a_b_c(&trace, Stop { trace: trace.clone() })
		.renderer(renderer.clone())
		.render_on_short_circuit(false)
		.build();

	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_failed_render_after_short_circuit_is_failure() {
	let trace = Trace::default();
	let pipeline = a_b_c(&trace, Stop { trace: trace.clone() })
		.renderer(Arc::new(BrokenRenderer))
		.failure_result("render_failed")
		.build();

	let outcome = pipeline
		.execute(ActionRequest::get("/"), &CancellationToken::new())
		.await;

	assert_eq!(outcome.state, PipelineState::Failed);
	assert_eq!(outcome.result_code.as_deref(), Some("render_failed"));
}

#[rstest]
#[tokio::test]
async fn test_cancellation_stops_before_next_stage() {
	// Arrange
	let trace = Trace::default();
	let token = CancellationToken::new();
	let pipeline = a_b_c(
		&trace,
		CancelThenContinue {
			token: token.clone(),
			trace: trace.clone(),
		},
	)
	.build();

	// Act
	let outcome = pipeline.execute(ActionRequest::get("/"), &token).await;

	// Assert
	assert_eq!(*trace.lock().unwrap(), vec!["a", "cancel"]);
	assert_eq!(outcome.state, PipelineState::Cancelled);
	assert!(outcome.result_code.is_none());
	assert!(outcome.context.is_none());
}

#[rstest]
#[tokio::test]
async fn test_concurrent_requests_do_not_share_context() {
	// Arrange
	struct Echo;

	#[async_trait]
	impl Stage for Echo {
		fn name(&self) -> &str {
			"echo"
		}

		async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
			let code = ctx.request().path().trim_start_matches('/').to_string();
			tokio::task::yield_now().await;
			ctx.set_result_code(code);
			next.run(ctx).await
		}
	}
	let pipeline = Arc::new(Pipeline::builder().stage(Echo).build());

	// Act
	let handles: Vec<_> = (0..16)
		.map(|i| {
			let pipeline = pipeline.clone();
			tokio::spawn(async move {
				let outcome = pipeline
					.execute(
						ActionRequest::get(format!("/{}", i)),
						&CancellationToken::new(),
					)
					.await;
				(i, outcome.result_code)
			})
		})
		.collect();

	// Assert
	for handle in handles {
		let (i, code) = handle.await.unwrap();
		assert_eq!(code, Some(i.to_string()));
	}
}

#[rstest]
#[tokio::test]
async fn test_panicking_stage_becomes_failure_outcome() {
	// Arrange
	let trace = Trace::default();
	let renderer = Arc::new(CountingRenderer::default());
	let pipeline = Arc::new(
		a_b_c(
			&trace,
			Explode {
				trace: trace.clone(),
			},
		)
		.exception_handler(&ERROR, ResultCode::new("handled"))
		.renderer(renderer.clone())
		.build(),
	);

	// Act
	let task = tokio::spawn({
		let pipeline = pipeline.clone();
		async move {
			pipeline
				.execute(ActionRequest::get("/"), &CancellationToken::new())
				.await
		}
	});
	let outcome = task.await.unwrap();

	// Assert
	assert_eq!(outcome.state, PipelineState::Failed);
	assert_eq!(outcome.result_code.as_deref(), Some("error"));
	assert_eq!(*trace.lock().unwrap(), vec!["a", "explode"]);
	assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
	assert_eq!(
		outcome.context.unwrap().state(),
		PipelineState::Failed
	);
}
