//! Headless render model
//!
//! Projects a field schema plus the current runtime state into a
//! [`RenderedField`], a toolkit-neutral description of what a host
//! should draw. No widget code lives here; a terminal UI, a web view,
//! and a test harness all consume the same model.

use crate::options::{ChoiceOption, OptionCache, OptionState, normalize_static};
use crate::schema::{FieldSchema, FieldType};
use crate::state::FormRuntime;
use crate::value::FieldValue;

/// Concrete input mode for single-line text controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
	Text,
	Email,
	Number,
	Url,
	Tel,
	Password,
	Date,
	Hidden,
}

/// What kind of widget a field resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
	Input {
		kind: InputKind,
	},
	TextArea {
		rich: bool,
	},
	/// A dropdown. `awaiting_dependency` carries the parent field name
	/// when options cannot load until that parent has a value.
	Select {
		options: Vec<ChoiceOption>,
		loading: bool,
		error: Option<String>,
		awaiting_dependency: Option<String>,
	},
	RadioGroup {
		options: Vec<ChoiceOption>,
	},
	CheckboxGroup {
		options: Vec<ChoiceOption>,
	},
	/// A checkbox with fewer than two choices renders as a single
	/// boolean toggle.
	CheckboxSingle {
		option: Option<ChoiceOption>,
	},
	FilePicker {
		accept: Vec<String>,
		size_hint: Option<String>,
	},
}

/// One field, fully resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedField {
	pub name: String,
	pub label: Option<String>,
	pub description: Option<String>,
	pub placeholder: Option<String>,
	pub required: bool,
	pub control: Control,
	pub value: FieldValue,
	/// Only populated once the field has been touched.
	pub error: Option<String>,
	pub hidden: bool,
}

fn option_list(field: &FieldSchema, state: &OptionState) -> Vec<ChoiceOption> {
	if field.is_remote() {
		state.options.clone()
	} else {
		normalize_static(&field.field_options)
	}
}

fn build_control(field: &FieldSchema, state: &OptionState, parent_empty: bool) -> Control {
	match field.field_type {
		FieldType::Text => Control::Input { kind: InputKind::Text },
		FieldType::Email => Control::Input { kind: InputKind::Email },
		FieldType::Number => Control::Input { kind: InputKind::Number },
		FieldType::Url => Control::Input { kind: InputKind::Url },
		FieldType::Tel => Control::Input { kind: InputKind::Tel },
		FieldType::Password => Control::Input { kind: InputKind::Password },
		FieldType::Date => Control::Input { kind: InputKind::Date },
		FieldType::Hidden => Control::Input { kind: InputKind::Hidden },
		FieldType::Textarea => Control::TextArea { rich: false },
		FieldType::Html => Control::TextArea { rich: true },
		FieldType::Select => Control::Select {
			options: option_list(field, state),
			loading: state.loading,
			error: state.error.clone(),
			awaiting_dependency: field
				.option_depending
				.clone()
				.filter(|_| parent_empty),
		},
		FieldType::Radio => Control::RadioGroup {
			options: option_list(field, state),
		},
		FieldType::Checkbox => {
			if field.checkbox_is_multi() {
				Control::CheckboxGroup {
					options: option_list(field, state),
				}
			} else {
				Control::CheckboxSingle {
					option: option_list(field, state).into_iter().next(),
				}
			}
		}
		FieldType::File => Control::FilePicker {
			accept: field
				.file_type
				.iter()
				.map(|ext| ext.trim().to_lowercase())
				.filter(|ext| !ext.is_empty())
				.collect(),
			size_hint: field.file_size.clone(),
		},
	}
}

/// Resolve one field against its current value, error, and option
/// state. `parent_value` is the dependency parent's current value, if
/// the field declares one.
pub fn render_field(
	field: &FieldSchema,
	value: &FieldValue,
	error: Option<&str>,
	touched: bool,
	options: &OptionState,
	parent_value: Option<&FieldValue>,
) -> RenderedField {
	let hidden = field.field_type == FieldType::Hidden;
	let parent_empty = field.option_depending.is_some()
		&& parent_value.is_none_or(FieldValue::is_empty);

	let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_string());

	RenderedField {
		name: field.field_name.clone(),
		label: if hidden {
			None
		} else {
			non_empty(&field.field_title)
		},
		description: if hidden {
			None
		} else {
			non_empty(&field.field_description)
		},
		placeholder: non_empty(&field.place_holder),
		required: field.is_required,
		control: build_control(field, options, parent_empty),
		value: value.clone(),
		error: if touched {
			error.map(str::to_string)
		} else {
			None
		},
		hidden,
	}
}

/// Render every field of the runtime's current page, pulling option
/// state for remote fields out of the cache.
pub fn render_page(runtime: &FormRuntime, cache: &OptionCache) -> Vec<RenderedField> {
	let empty = OptionState::default();
	runtime
		.definition()
		.page_fields(runtime.current_page())
		.unwrap_or_default()
		.iter()
		.map(|field| {
			let name = field.field_name.as_str();
			let state = cache.state(name).unwrap_or(&empty);
			let parent_value = field
				.option_depending
				.as_deref()
				.and_then(|parent| runtime.value(parent));
			render_field(
				field,
				runtime.value(name).unwrap_or(&FieldValue::Null),
				runtime.error(name),
				runtime.is_touched(name),
				state,
				parent_value,
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{FormDefinition, FormPage};

	fn plain_state() -> OptionState {
		OptionState::default()
	}

	#[test]
	fn test_hidden_field_suppresses_label_and_description() {
		let mut field = FieldSchema::new("token", FieldType::Hidden).with_title("Token");
		field.field_description = "internal".to_string();

		let rendered = render_field(
			&field,
			&FieldValue::Text("abc".to_string()),
			None,
			false,
			&plain_state(),
			None,
		);

		assert!(rendered.hidden);
		assert_eq!(rendered.label, None);
		assert_eq!(rendered.description, None);
		assert_eq!(rendered.control, Control::Input { kind: InputKind::Hidden });
	}

	#[test]
	fn test_error_only_shown_once_touched() {
		let field = FieldSchema::new("name", FieldType::Text).required();

		let untouched = render_field(
			&field,
			&FieldValue::Text(String::new()),
			Some("This field is required"),
			false,
			&plain_state(),
			None,
		);
		let touched = render_field(
			&field,
			&FieldValue::Text(String::new()),
			Some("This field is required"),
			true,
			&plain_state(),
			None,
		);

		assert_eq!(untouched.error, None);
		assert_eq!(
			touched.error,
			Some("This field is required".to_string())
		);
	}

	#[test]
	fn test_dependent_select_awaits_parent() {
		let field = FieldSchema::new("city", FieldType::Select)
			.with_remote("/cities", "cities")
			.depending_on("country");

		let waiting = render_field(
			&field,
			&FieldValue::Null,
			None,
			false,
			&plain_state(),
			Some(&FieldValue::Text(String::new())),
		);
		let ready = render_field(
			&field,
			&FieldValue::Null,
			None,
			false,
			&plain_state(),
			Some(&FieldValue::Text("IN".to_string())),
		);

		let Control::Select {
			awaiting_dependency, ..
		} = &waiting.control
		else {
			panic!("expected a select control");
		};
		assert_eq!(awaiting_dependency.as_deref(), Some("country"));

		let Control::Select {
			awaiting_dependency, ..
		} = &ready.control
		else {
			panic!("expected a select control");
		};
		assert_eq!(*awaiting_dependency, None);
	}

	#[test]
	fn test_static_select_normalizes_inline_options() {
		let field = FieldSchema::new("size", FieldType::Select).with_options(vec![
			serde_json::json!("S"),
			serde_json::json!("M"),
		]);

		let rendered = render_field(
			&field,
			&FieldValue::Null,
			None,
			false,
			&plain_state(),
			None,
		);

		let Control::Select { options, .. } = rendered.control else {
			panic!("expected a select control");
		};
		assert_eq!(options, vec![
			ChoiceOption::new("S", "S"),
			ChoiceOption::new("M", "M"),
		]);
	}

	#[test]
	fn test_checkbox_single_vs_group() {
		let single = FieldSchema::new("agree", FieldType::Checkbox)
			.with_options(vec![serde_json::json!("I agree")]);
		let multi = FieldSchema::new("tags", FieldType::Checkbox).with_options(vec![
			serde_json::json!("rust"),
			serde_json::json!("web"),
		]);

		let single = render_field(&single, &FieldValue::Bool(false), None, false, &plain_state(), None);
		let multi = render_field(&multi, &FieldValue::List(vec![]), None, false, &plain_state(), None);

		assert!(matches!(single.control, Control::CheckboxSingle { option: Some(_) }));
		assert!(matches!(multi.control, Control::CheckboxGroup { .. }));
	}

	#[test]
	fn test_file_picker_hints() {
		let field = FieldSchema::new("resume", FieldType::File).with_file_constraints(
			vec!["pdf".to_string(), "DOCX".to_string()],
			Some("5MB".to_string()),
		);

		let rendered = render_field(
			&field,
			&FieldValue::Null,
			None,
			false,
			&plain_state(),
			None,
		);

		assert_eq!(
			rendered.control,
			Control::FilePicker {
				accept: vec!["pdf".to_string(), "docx".to_string()],
				size_hint: Some("5MB".to_string()),
			}
		);
	}

	#[test]
	fn test_render_page_covers_current_page_only() {
		let def = FormDefinition::new(
			"reg",
			vec![
				FormPage::new("one", vec![FieldSchema::new("a", FieldType::Text)]),
				FormPage::new("two", vec![FieldSchema::new("b", FieldType::Text)]),
			],
		);
		let runtime = crate::state::FormRuntime::new(def).unwrap();
		let cache = OptionCache::new();

		let fields = render_page(&runtime, &cache);

		assert_eq!(fields.len(), 1);
		assert_eq!(fields[0].name, "a");
	}
}
