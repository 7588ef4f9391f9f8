//! Option resolver
//!
//! Computes the selectable options for a field: statically from the
//! schema's inline `fieldOptions`, or by querying a remote endpoint,
//! honoring field-to-field dependencies. Failures never escape this
//! boundary; they are captured into the field's [`OptionState`].

use crate::client::FormApi;
use crate::schema::FieldSchema;
use crate::value::FieldValue;
use std::collections::HashMap;

/// One selectable option as the renderer consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
	pub value: String,
	pub label: String,
}

impl ChoiceOption {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}
}

/// The renderer-facing cell for one field's option list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionState {
	pub options: Vec<ChoiceOption>,
	pub loading: bool,
	pub error: Option<String>,
}

impl OptionState {
	pub fn ready(options: Vec<ChoiceOption>) -> Self {
		Self {
			options,
			loading: false,
			error: None,
		}
	}

	pub fn loading() -> Self {
		Self {
			options: vec![],
			loading: true,
			error: None,
		}
	}

	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			options: vec![],
			loading: false,
			error: Some(message.into()),
		}
	}

	pub fn empty() -> Self {
		Self::default()
	}
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::String(s) => Some(s.clone()),
		serde_json::Value::Number(n) => Some(n.to_string()),
		serde_json::Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn normalize_object(map: &serde_json::Map<String, serde_json::Value>) -> Option<ChoiceOption> {
	let value = map.get("value").and_then(scalar_text);
	let label = map.get("label").and_then(scalar_text);
	match (value, label) {
		(Some(value), Some(label)) => Some(ChoiceOption::new(value, label)),
		(Some(value), None) => Some(ChoiceOption::new(value.clone(), value)),
		(None, Some(label)) => Some(ChoiceOption::new(label.clone(), label)),
		(None, None) => {
			// No value/label keys; fall back to the first key/value pair.
			let (key, entry) = map.iter().next()?;
			let label = scalar_text(entry).unwrap_or_else(|| key.clone());
			Some(ChoiceOption::new(key.clone(), label))
		}
	}
}

/// Normalize inline static options to `{value, label}` pairs.
///
/// Each entry may be an object, a JSON-encoded string of an object, or
/// a bare scalar (used for both value and label).
///
/// # Examples
///
/// ```
/// use eventform::{ChoiceOption, normalize_static};
///
/// let options = normalize_static(&[
/// 	serde_json::json!({"value": "v2", "label": "L2"}),
/// 	serde_json::json!(r#"{"value":"v1","label":"L1"}"#),
/// 	serde_json::json!("X"),
/// ]);
/// assert_eq!(
/// 	options,
/// 	vec![
/// 		ChoiceOption::new("v2", "L2"),
/// 		ChoiceOption::new("v1", "L1"),
/// 		ChoiceOption::new("X", "X"),
/// 	]
/// );
/// ```
pub fn normalize_static(options: &[serde_json::Value]) -> Vec<ChoiceOption> {
	options
		.iter()
		.filter_map(|entry| match entry {
			serde_json::Value::String(raw) => {
				match serde_json::from_str::<serde_json::Value>(raw) {
					Ok(serde_json::Value::Object(map)) => normalize_object(&map),
					_ => Some(ChoiceOption::new(raw.clone(), raw.clone())),
				}
			}
			serde_json::Value::Object(map) => normalize_object(map),
			other => scalar_text(other).map(|text| ChoiceOption::new(text.clone(), text)),
		})
		.collect()
}

fn locate_rows<'a>(payload: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
	payload
		.get("data")
		.and_then(|data| data.get(path))
		.or_else(|| payload.get("result").and_then(|result| result.get(path)))
		.or_else(|| payload.get(path))
}

fn map_row(row: &serde_json::Value, value_key: &str, label_key: &str) -> Option<ChoiceOption> {
	let obj = row.as_object()?;

	let value = obj
		.get(value_key)
		.and_then(scalar_text)
		.or_else(|| obj.get("id").and_then(scalar_text))
		.or_else(|| obj.get("value").and_then(scalar_text));
	let label = obj
		.get(label_key)
		.and_then(scalar_text)
		.or_else(|| obj.get("label").and_then(scalar_text))
		.or_else(|| obj.get("title").and_then(scalar_text));

	match (value, label) {
		(None, None) => None,
		(value, label) => {
			let value = value.clone().or_else(|| label.clone()).unwrap_or_default();
			let label = label.unwrap_or_else(|| value.clone());
			Some(ChoiceOption::new(value, label))
		}
	}
}

/// Resolve the option list for one field.
///
/// Static fields never touch the network. A dependent field whose
/// parent has no value yet resolves to an empty list without a fetch.
/// Remote failures and non-array payloads are captured into the
/// returned state, never raised.
pub async fn resolve_options(
	field: &FieldSchema,
	dependent_value: Option<&FieldValue>,
	api: &dyn FormApi,
) -> OptionState {
	if !field.is_remote() {
		return OptionState::ready(normalize_static(&field.field_options));
	}

	if field.option_depending.is_some() {
		let parent_filled = dependent_value.is_some_and(|value| !value.is_empty());
		if !parent_filled {
			return OptionState::empty();
		}
	}

	let base_url = field.option_url.as_deref().unwrap_or_default();
	let suffix = dependent_value
		.filter(|_| field.option_depending.is_some())
		.and_then(|value| value.to_text());
	let url = match suffix {
		Some(suffix) => format!("{}/{}", base_url.trim_end_matches('/'), suffix),
		None => base_url.to_string(),
	};

	let payload = match api.fetch_options(field.option_request_type, &url).await {
		Ok(payload) => payload,
		Err(err) => {
			tracing::error!(field = %field.field_name, %err, "option fetch failed");
			return OptionState::failed(err.to_string());
		}
	};

	let path = field.option_path.as_deref().unwrap_or_default();
	let value_key = field.option_value.as_deref().unwrap_or("_id");
	let label_key = field.option_name.as_deref().unwrap_or("name");

	match locate_rows(&payload, path) {
		Some(serde_json::Value::Array(rows)) => OptionState::ready(
			rows.iter()
				.filter_map(|row| map_row(row, value_key, label_key))
				.collect(),
		),
		// Missing or non-array payload is tolerated: empty options,
		// logged for diagnostics, nothing surfaced to the user.
		_ => {
			tracing::error!(
				field = %field.field_name,
				path,
				"option payload is missing or not an array"
			);
			OptionState::ready(vec![])
		}
	}
}

#[derive(Debug, Clone)]
struct CacheEntry {
	state: OptionState,
	/// The dependent value this entry was resolved for; `None` for
	/// fields without a dependency.
	dependent_key: Option<String>,
}

/// Per-field option states, keyed by the dependent value each was
/// resolved for.
///
/// The key doubles as the cancellation token for superseded fetches: a
/// response stored against a dependent value that no longer matches the
/// field's current one is rejected, so a stale response can never
/// overwrite state for a newer dependency.
#[derive(Debug, Clone, Default)]
pub struct OptionCache {
	entries: HashMap<String, CacheEntry>,
}

impl OptionCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self, field: &str) -> Option<&OptionState> {
		self.entries.get(field).map(|entry| &entry.state)
	}

	/// Whether the cached entry (if any) was resolved for a different
	/// dependent value than the current one.
	pub fn needs_refresh(&self, field: &str, dependent_key: Option<&str>) -> bool {
		match self.entries.get(field) {
			Some(entry) => entry.dependent_key.as_deref() != dependent_key,
			None => true,
		}
	}

	pub fn mark_loading(&mut self, field: &str, dependent_key: Option<String>) {
		self.entries.insert(
			field.to_string(),
			CacheEntry {
				state: OptionState::loading(),
				dependent_key,
			},
		);
	}

	/// Store a resolved state. Returns `false` (and stores nothing)
	/// when the response's dependent key no longer matches the field's
	/// current one.
	pub fn store(
		&mut self,
		field: &str,
		dependent_key: Option<String>,
		state: OptionState,
		current_dependent: Option<&str>,
	) -> bool {
		if dependent_key.as_deref() != current_dependent {
			tracing::debug!(field, "discarding option response for superseded dependency");
			return false;
		}
		self.entries.insert(
			field.to_string(),
			CacheEntry {
				state,
				dependent_key,
			},
		);
		true
	}

	pub fn invalidate(&mut self, field: &str) {
		self.entries.remove(field);
	}
}
