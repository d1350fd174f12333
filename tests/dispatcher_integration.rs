//! End-to-end tests for the assembled dispatcher
//!
//! Boots a dispatcher from scan entries, settings and converter bindings,
//! then drives requests through the full stage pipeline.

#![cfg(feature = "conf")]

use rstest::*;
use serde_json::{Value, json};
use stagehand::conf::DispatchSettings;
use stagehand::convert::{ConverterResult, StringConverter};
use stagehand::dispatch::error::{ACTION, ErrorKind};
use stagehand::prelude::*;
use stagehand::urls::{PatternError, RouteError};
use std::sync::{Arc, Mutex};

static QUOTA_EXCEEDED: ErrorKind = ErrorKind::child("quota_exceeded", &ACTION);

/// Converter for the `Email` type that lowercases addresses and rejects
/// anything without an `@`.
struct EmailConverter;

impl Converter for EmailConverter {
	fn name(&self) -> &str {
		"email"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		if !raw.contains('@') {
			return Err(stagehand::convert::ConverterError::InvalidValue {
				value: raw.to_string(),
				target: target.to_string(),
				reason: "missing '@'".to_string(),
			});
		}
		Ok(Value::String(raw.to_lowercase()))
	}

	fn to_raw(&self, value: &Value, _target: &TypeKey) -> ConverterResult<String> {
		Ok(value.as_str().unwrap_or_default().to_string())
	}
}

/// Edits a user profile.
#[derive(Default)]
struct EditProfile {
	id: Option<i64>,
	email: Option<String>,
	notify: Option<bool>,
	roles: Vec<String>,
}

#[async_trait]
impl Action for EditProfile {
	fn fields(&self) -> Vec<FieldSpec> {
		vec![
			FieldSpec::of::<i64>("id"),
			FieldSpec::new("email", TypeKey::named("WorkEmail")),
			FieldSpec::of::<Option<bool>>("notify"),
			FieldSpec::of::<Vec<String>>("roles"),
		]
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), StageError> {
		match name {
			"id" => self.id = value.as_i64(),
			"email" => self.email = value.as_str().map(str::to_string),
			"notify" => self.notify = value.as_bool(),
			"roles" => {
				self.roles = serde_json::from_value(value)
					.map_err(|e| StageError::binding("roles").with_source(e))?
			}
			other => return Err(StageError::binding(format!("unknown field {}", other))),
		}
		Ok(())
	}

	fn validate(&self, errors: &mut ValidationErrors) {
		if self.email.is_none() {
			errors.add("email", "is required");
		}
	}

	async fn execute(&mut self, _request: &ActionRequest) -> Result<String, StageError> {
		if self.roles.len() > 2 {
			return Err(StageError::new(&QUOTA_EXCEEDED, "too many roles")
				.with_payload(json!({"limit": 2})));
		}
		Ok("saved".to_string())
	}

	fn model(&self) -> Value {
		json!({
			"id": self.id,
			"email": self.email,
			"notify": self.notify,
			"roles": self.roles,
		})
	}
}

/// Records what it rendered.
#[derive(Default)]
struct MemoryRenderer {
	pages: Mutex<Vec<(String, Value, Value)>>,
}

#[async_trait]
impl Renderer for MemoryRenderer {
	async fn render(&self, ctx: &InvocationContext) -> Result<(), StageError> {
		let model = ctx.action().map(|a| a.model()).unwrap_or(Value::Null);
		self.pages.lock().unwrap().push((
			ctx.result_code().unwrap_or_default().to_string(),
			model,
			ctx.validation_errors().to_json(),
		));
		Ok(())
	}
}

#[fixture]
fn settings() -> DispatchSettings {
	DispatchSettings::from_toml_str(
		r#"
not_found_result = "missing"
input_result = "form"

[patterns]
max_segments = 4
"#,
	)
	.unwrap()
}

#[fixture]
fn scan_entries() -> Vec<ScanEntry> {
	vec![
		ScanEntry::new("EditProfile", "/profile/edit").with_pattern("{id}"),
		ScanEntry::new("EditProfile", "/me").overridable(true),
	]
}

fn dispatcher(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
	renderer: Arc<MemoryRenderer>,
) -> Dispatcher {
	Dispatcher::builder()
		.settings(settings)
		.scan_entries(scan_entries)
		.converters(|registry| {
			registry
				.declare_interface(TypeKey::named("Email"), Vec::new())
				.declare_class(TypeKey::named("WorkEmail"), None, vec![TypeKey::named("Email")])
				.declare_class(
					TypeKey::named("LegacyEmail"),
					Some(TypeKey::STRING),
					vec![TypeKey::named("Email")],
				)
				.register(TypeKey::named("Email"), Arc::new(EmailConverter))
		})
		.action_factory(Arc::new(
			ActionCatalog::new().with_action("EditProfile", EditProfile::default),
		))
		.renderer(renderer)
		.exception_handler(
			&QUOTA_EXCEEDED,
			|ctx: &mut InvocationContext, error: &StageError| {
				let limit = error.payload().and_then(|p| p["limit"].as_u64()).unwrap_or(0);
				ctx.validation_errors_mut()
					.add("roles", format!("at most {} roles", limit));
				"form".to_string()
			},
		)
		.build()
		.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_full_request_binds_and_renders(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
) {
	// Arrange
	let renderer = Arc::new(MemoryRenderer::default());
	let dispatcher = dispatcher(settings, scan_entries, renderer.clone());
	let request = ActionRequest::post("/profile/edit/42")
		.with_param("email", "Ada@Example.COM")
		.with_param("notify", "on")
		.with_param("roles", "admin")
		.with_param("roles", "editor");

	// Act
	let outcome = dispatcher.dispatch(request).await;

	// Assert
	assert_eq!(outcome.state, PipelineState::Completed);
	assert_eq!(outcome.result_code.as_deref(), Some("saved"));
	let pages = renderer.pages.lock().unwrap();
	assert_eq!(pages.len(), 1);
	assert_eq!(
		pages[0].1,
		json!({"id": 42, "email": "ada@example.com", "notify": true, "roles": ["admin", "editor"]})
	);
}

#[rstest]
fn test_converter_hierarchy_from_boot(settings: DispatchSettings, scan_entries: Vec<ScanEntry>) {
	let dispatcher = dispatcher(settings, scan_entries, Arc::new(MemoryRenderer::default()));
	let name_for = |key: &'static str| {
		dispatcher
			.converters()
			.lookup(&TypeKey::named(key))
			.map(|c| c.name().to_string())
	};

	// WorkEmail only reaches a converter through its interface.
	assert_eq!(name_for("WorkEmail").as_deref(), Some("email"));
	// LegacyEmail extends String, and the superclass chain is walked first.
	assert_eq!(name_for("LegacyEmail").as_deref(), Some(StringConverter.name()));
	assert_eq!(name_for("Unrelated"), None);
}

#[rstest]
#[tokio::test]
async fn test_conversion_failure_short_circuits_with_input_result(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
) {
	let renderer = Arc::new(MemoryRenderer::default());
	let dispatcher = dispatcher(settings, scan_entries, renderer.clone());

	let outcome = dispatcher
		.dispatch(
			ActionRequest::post("/profile/edit/abc")
				.with_param("email", "NoAtSign")
				.with_param("notify", "maybe"),
		)
		.await;

	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(outcome.result_code.as_deref(), Some("form"));
	let pages = renderer.pages.lock().unwrap();
	let errors = pages[0].2.as_object().unwrap();
	assert_eq!(
		errors.keys().collect::<Vec<_>>(),
		vec!["id", "email", "notify"]
	);
}

#[rstest]
#[tokio::test]
async fn test_handled_action_error_renders_form(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
) {
	let renderer = Arc::new(MemoryRenderer::default());
	let dispatcher = dispatcher(settings, scan_entries, renderer.clone());

	let outcome = dispatcher
		.dispatch(
			ActionRequest::post("/me")
				.with_param("email", "a@b.c")
				.with_param("roles", "a")
				.with_param("roles", "b")
				.with_param("roles", "c"),
		)
		.await;

	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(outcome.result_code.as_deref(), Some("form"));
	let pages = renderer.pages.lock().unwrap();
	assert_eq!(pages[0].2, json!({"roles": ["at most 2 roles"]}));
}

#[rstest]
#[tokio::test]
async fn test_unresolved_path_uses_configured_not_found(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
) {
	let renderer = Arc::new(MemoryRenderer::default());
	let dispatcher = dispatcher(settings, scan_entries, renderer.clone());

	let outcome = dispatcher.dispatch(ActionRequest::get("/profile")).await;

	assert_eq!(outcome.state, PipelineState::ShortCircuited);
	assert_eq!(outcome.result_code.as_deref(), Some("missing"));
	assert_eq!(renderer.pages.lock().unwrap()[0].0, "missing");
}

#[rstest]
#[tokio::test]
async fn test_cancelled_request_is_released(
	settings: DispatchSettings,
	scan_entries: Vec<ScanEntry>,
) {
	let renderer = Arc::new(MemoryRenderer::default());
	let dispatcher = dispatcher(settings, scan_entries, renderer.clone());
	let cancel = CancellationToken::new();
	cancel.cancel();

	let outcome = dispatcher
		.dispatch_with_cancel(ActionRequest::get("/me"), &cancel)
		.await;

	assert_eq!(outcome.state, PipelineState::Cancelled);
	assert!(outcome.context.is_none());
	assert!(renderer.pages.lock().unwrap().is_empty());
}

#[rstest]
fn test_stage_order(settings: DispatchSettings, scan_entries: Vec<ScanEntry>) {
	let dispatcher = dispatcher(settings, scan_entries, Arc::new(MemoryRenderer::default()));

	assert_eq!(
		dispatcher.pipeline().stage_names(),
		vec![
			"resolve_action",
			"instantiate_action",
			"bind_parameters",
			"validate",
			"invoke_action",
			"render_result",
		]
	);
	assert_eq!(dispatcher.registry().all().len(), 2);
	assert_eq!(
		dispatcher.pipeline().exception_handlers().kinds(),
		vec!["quota_exceeded"]
	);
}

#[rstest]
fn test_duplicate_route_aborts_boot(scan_entries: Vec<ScanEntry>) {
	let result = Dispatcher::builder()
		.scan_entries(scan_entries)
		.scan_entry(ScanEntry::new("Other", "/profile/edit/"))
		.action_factory(Arc::new(ActionCatalog::new()))
		.build();

	assert!(matches!(
		result,
		Err(BootError::Route(RouteError::Duplicate { .. }))
	));
}

#[rstest]
fn test_overridable_route_is_replaced_at_boot(scan_entries: Vec<ScanEntry>) {
	let dispatcher = Dispatcher::builder()
		.scan_entries(scan_entries)
		.scan_entry(ScanEntry::new("Account", "/me"))
		.action_factory(Arc::new(ActionCatalog::new()))
		.build()
		.unwrap();

	assert_eq!(
		dispatcher.registry().get("/me").unwrap().handler_type().as_str(),
		"Account"
	);
}

#[rstest]
#[case("{*rest}/{id}")]
#[case("{id")]
#[case("{a}/{b}/{c}/{d}/{e}")]
fn test_malformed_pattern_aborts_boot(settings: DispatchSettings, #[case] pattern: &str) {
	let result = Dispatcher::builder()
		.settings(settings)
		.scan_entry(ScanEntry::new("Bad", "/bad").with_pattern(pattern))
		.action_factory(Arc::new(ActionCatalog::new()))
		.build();

	match result {
		Err(BootError::Route(RouteError::MalformedPattern { source, .. })) => {
			assert!(!matches!(source, PatternError::DuplicateCapture { .. }))
		}
		other => panic!("expected malformed pattern, got {:?}", other.map(|_| ())),
	}
}

#[rstest]
fn test_missing_factory_aborts_boot() {
	let result = Dispatcher::builder().build();

	assert!(matches!(result, Err(BootError::MissingFactory)));
}

#[rstest]
fn test_invalid_settings_abort_boot() {
	let settings = DispatchSettings::new().with_failure_result("");

	let result = Dispatcher::builder()
		.settings(settings)
		.action_factory(Arc::new(ActionCatalog::new()))
		.build();

	assert!(matches!(result, Err(BootError::Settings(_))));
}
