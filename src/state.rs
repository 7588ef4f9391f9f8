//! Form state machine
//!
//! Owns the live values, touched set, error map, and page index of one
//! in-progress form instance, and orchestrates validation-on-change,
//! wizard navigation, and submission. The runtime is owned exclusively
//! by its host view; nothing here reads ambient global state.

use crate::client::{Envelope, FormApi};
use crate::error::{FormEngineError, SchemaError};
use crate::schema::FormDefinition;
use crate::serialize::serialize;
use crate::validation::{FormValidator, initial_values};
use crate::value::FieldValue;
use std::collections::{HashMap, HashSet};

/// Lifecycle phase of a form instance.
///
/// `Loading` is the phase before a definition has arrived; hosts use
/// it while [`FormRuntime::load`] is in flight. A constructed runtime
/// starts in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
	Loading,
	#[default]
	Ready,
	Submitting,
	Success,
}

/// The runtime state of one active form instance.
pub struct FormRuntime {
	definition: FormDefinition,
	validator: FormValidator,
	values: HashMap<String, FieldValue>,
	/// Snapshot committed after every value dispatch; the dependent
	/// reset rule compares it against the live map.
	previous_values: HashMap<String, FieldValue>,
	initial: HashMap<String, FieldValue>,
	touched: HashSet<String>,
	errors: HashMap<String, String>,
	current_page: usize,
	phase: FormPhase,
	submit_error: Option<String>,
}

impl FormRuntime {
	/// Build a runtime from an already-fetched definition, seeding
	/// default values per field type.
	pub fn new(definition: FormDefinition) -> Result<Self, SchemaError> {
		definition.validate()?;

		let validator = FormValidator::compile(&definition);
		let values = initial_values(&definition);

		Ok(Self {
			validator,
			previous_values: values.clone(),
			initial: values.clone(),
			values,
			touched: HashSet::new(),
			errors: HashMap::new(),
			current_page: 0,
			phase: FormPhase::Ready,
			definition,
			submit_error: None,
		})
	}

	/// Fetch a definition by id and build the runtime from it.
	pub async fn load(form_id: &str, api: &dyn FormApi) -> Result<Self, FormEngineError> {
		let definition = api.fetch_form(form_id).await?;
		Ok(Self::new(definition)?)
	}

	pub fn definition(&self) -> &FormDefinition {
		&self.definition
	}

	pub fn phase(&self) -> FormPhase {
		self.phase
	}

	pub fn values(&self) -> &HashMap<String, FieldValue> {
		&self.values
	}

	pub fn value(&self, name: &str) -> Option<&FieldValue> {
		self.values.get(name)
	}

	pub fn errors(&self) -> &HashMap<String, String> {
		&self.errors
	}

	pub fn error(&self, name: &str) -> Option<&str> {
		self.errors.get(name).map(String::as_str)
	}

	pub fn is_touched(&self, name: &str) -> bool {
		self.touched.contains(name)
	}

	pub fn current_page(&self) -> usize {
		self.current_page
	}

	pub fn page_count(&self) -> usize {
		self.definition.page_count()
	}

	pub fn is_first_page(&self) -> bool {
		self.current_page == 0
	}

	pub fn is_last_page(&self) -> bool {
		self.current_page + 1 >= self.definition.page_count().max(1)
	}

	/// Form-level message from the last failed submission, if any.
	pub fn submit_error(&self) -> Option<&str> {
		self.submit_error.as_deref()
	}

	/// Whether any value differs from its seeded default.
	pub fn has_changed(&self) -> bool {
		self.values != self.initial
	}

	pub fn progress_percentage(&self) -> f32 {
		if self.definition.pages.is_empty() {
			return 0.0;
		}
		((self.current_page + 1) as f32 / self.definition.pages.len() as f32) * 100.0
	}

	/// The parent value a dependent field's options are keyed by, if
	/// the field has a dependency and the parent currently has a value.
	pub fn dependent_key(&self, field: &str) -> Option<String> {
		let schema = self.definition.field(field)?;
		let parent = schema.option_depending.as_deref()?;
		self.values
			.get(parent)
			.and_then(FieldValue::to_text)
			.filter(|text| !text.is_empty())
	}

	/// Dispatch a field edit: write the value, re-validate the field,
	/// and reset any field whose option dependency points at a parent
	/// that changed since the last committed snapshot.
	pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) {
		self.values.insert(name.to_string(), value.into());
		self.revalidate_field(name);

		let resets: Vec<String> = self
			.definition
			.fields()
			.filter(|field| {
				field.option_depending.as_deref().is_some_and(|parent| {
					let previous = self.previous_values.get(parent);
					let current = self.values.get(parent);
					matches!((previous, current), (Some(p), Some(c)) if p != c)
				})
			})
			.map(|field| field.field_name.clone())
			.collect();

		for dependent in resets {
			tracing::debug!(field = %dependent, "resetting dependent field after parent change");
			self.values
				.insert(dependent.clone(), FieldValue::Text(String::new()));
			self.errors.remove(&dependent);
		}

		self.previous_values = self.values.clone();
	}

	/// Mark a field as interacted with; errors only surface once a
	/// field is touched.
	pub fn touch(&mut self, name: &str) {
		self.touched.insert(name.to_string());
	}

	fn revalidate_field(&mut self, name: &str) {
		let Some(rule) = self.validator.rule(name) else {
			return;
		};
		let value = self.values.get(name).cloned().unwrap_or_default();
		match rule.validate(&value) {
			Ok(()) => {
				self.errors.remove(name);
			}
			Err(message) => {
				self.errors.insert(name.to_string(), message);
			}
		}
	}

	fn touch_page(&mut self, index: usize) {
		let names: Vec<String> = self
			.definition
			.page_fields(index)
			.unwrap_or_default()
			.iter()
			.map(|field| field.field_name.clone())
			.collect();
		self.touched.extend(names);
	}

	/// Advance to the next page after validating only the current
	/// page's fields. On failure every field of this page is marked
	/// touched and the page does not change.
	pub fn next_page(&mut self) -> Result<(), FormEngineError> {
		if self.current_page + 1 >= self.definition.page_count() {
			return Err(FormEngineError::InvalidTransition(
				"already at last page".to_string(),
			));
		}

		let page_errors = self.validator.validate_page(self.current_page, &self.values);
		if !page_errors.is_empty() {
			self.errors.extend(page_errors);
			self.touch_page(self.current_page);
			return Err(FormEngineError::Validation);
		}

		self.current_page += 1;
		self.touched.clear();
		Ok(())
	}

	/// Go back one page. Always permitted; no validation runs.
	pub fn previous_page(&mut self) -> Result<(), FormEngineError> {
		if self.current_page == 0 {
			return Err(FormEngineError::InvalidTransition(
				"already at first page".to_string(),
			));
		}
		self.current_page -= 1;
		Ok(())
	}

	/// Jump to an arbitrary page. Backward jumps are always allowed;
	/// forward jumps require every page in between to validate so a
	/// step cannot be skipped.
	pub fn goto_page(&mut self, target: usize) -> Result<(), FormEngineError> {
		if target >= self.definition.page_count() {
			return Err(FormEngineError::InvalidTransition(format!(
				"page {} does not exist",
				target
			)));
		}

		if target <= self.current_page {
			self.current_page = target;
			return Ok(());
		}

		for index in self.current_page..target {
			if !self.validator.validate_page(index, &self.values).is_empty() {
				return Err(FormEngineError::InvalidTransition(format!(
					"cannot skip to page {}: page {} is not complete",
					target, index
				)));
			}
		}

		self.current_page = target;
		Ok(())
	}

	/// Run full-form validation and post the serialized values.
	///
	/// Validation failure marks every field touched and aborts before
	/// any transport. Transport failure or an envelope with
	/// `status != 1` returns the machine to `Ready` with all entered
	/// values preserved and a surfaced message.
	pub async fn submit(
		&mut self,
		api: &dyn FormApi,
		url: &str,
	) -> Result<Envelope, FormEngineError> {
		if self.phase == FormPhase::Submitting {
			return Err(FormEngineError::InvalidTransition(
				"submission already in progress".to_string(),
			));
		}

		let errors = self.validator.validate_all(&self.values);
		if !errors.is_empty() {
			for index in 0..self.definition.page_count() {
				self.touch_page(index);
			}
			self.errors = errors;
			return Err(FormEngineError::Validation);
		}

		self.phase = FormPhase::Submitting;
		self.submit_error = None;

		let entries: Vec<(&str, &FieldValue)> = self
			.definition
			.fields()
			.filter_map(|field| {
				self.values
					.get(&field.field_name)
					.map(|value| (field.field_name.as_str(), value))
			})
			.collect();
		let fields = serialize(entries);

		match api.submit_form(url, fields).await {
			Ok(envelope) if envelope.is_success() => {
				self.phase = FormPhase::Success;
				Ok(envelope)
			}
			Ok(envelope) => {
				let reason = envelope
					.message
					.clone()
					.unwrap_or_else(|| "the server rejected the submission".to_string());
				self.phase = FormPhase::Ready;
				self.submit_error = Some(reason.clone());
				tracing::error!(form = %self.definition.form_name, reason = %reason, "submission rejected");
				Err(FormEngineError::Submission { reason })
			}
			Err(err) => {
				self.phase = FormPhase::Ready;
				self.submit_error = Some(err.to_string());
				tracing::error!(form = %self.definition.form_name, %err, "submission failed");
				Err(err)
			}
		}
	}
}
