use crate::context::InvocationContext;
use crate::error::StageError;
use crate::stage::{Next, Stage};
use async_trait::async_trait;
use stagehand_convert::ConverterRegistry;
use std::sync::Arc;

/// Populates action fields from URI captures and raw request parameters.
///
/// A URI capture shadows a raw parameter of the same name. Fields with no
/// submitted value are left untouched. Conversion failures are collected
/// into the context's validation errors and never stop the chain.
pub struct BindParametersStage {
	converters: Arc<ConverterRegistry>,
}

impl BindParametersStage {
	pub fn new(converters: Arc<ConverterRegistry>) -> Self {
		Self { converters }
	}
}

#[async_trait]
impl Stage for BindParametersStage {
	fn name(&self) -> &str {
		"bind_parameters"
	}

	async fn run(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Result<(), StageError> {
		let fields = ctx
			.action()
			.ok_or_else(|| StageError::internal("No action instance to bind"))?
			.fields();

		let mut converted = Vec::with_capacity(fields.len());
		for field in &fields {
			let raw = match ctx.uri_parameters().get(field.name()) {
				Some(value) => vec![value.to_string()],
				None => ctx.request().params(field.name()).to_vec(),
			};
			if raw.is_empty() {
				continue;
			}
			converted.push((field.name(), self.converters.convert_field(field, &raw)));
		}

		for (name, result) in converted {
			match result {
				Ok(value) => {
					if let Some(action) = ctx.action_mut() {
						action.set_field(name, value)?;
					}
				}
				Err(error) => {
					tracing::debug!(field = name, error = %error, "Parameter conversion failed");
					ctx.validation_errors_mut().add(name, error.to_string());
				}
			}
		}

		next.run(ctx).await
	}
}
