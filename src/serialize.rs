//! Submission serializer
//!
//! Flattens a value map into multipart form fields with bracket-indexed
//! keys: arrays become `name[i]` (or `name[i][key]` for object
//! elements), nested objects become `name[key]`. The intermediate
//! [`MultipartField`] list is inspectable; the wire form is assembled
//! separately for the HTTP client.

use crate::value::{FieldValue, FileUpload};

/// The payload of one multipart entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
	Text(String),
	File(FileUpload),
}

/// One flattened multipart entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartField {
	pub name: String,
	pub part: PartValue,
}

impl MultipartField {
	pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			part: PartValue::Text(value.into()),
		}
	}

	pub fn file(name: impl Into<String>, file: FileUpload) -> Self {
		Self {
			name: name.into(),
			part: PartValue::File(file),
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match &self.part {
			PartValue::Text(text) => Some(text),
			PartValue::File(_) => None,
		}
	}
}

/// Flatten values to multipart entries, preserving input order.
///
/// `Null` values are omitted entirely, never serialized as a literal
/// `"null"`.
///
/// # Examples
///
/// ```
/// use eventform::{serialize, FieldValue, MultipartField};
///
/// let tags = FieldValue::List(vec!["x".into(), "y".into()]);
/// let fields = serialize([("tags", &tags)]);
/// assert_eq!(
/// 	fields,
/// 	vec![
/// 		MultipartField::text("tags[0]", "x"),
/// 		MultipartField::text("tags[1]", "y"),
/// 	]
/// );
/// ```
pub fn serialize<'a, I>(values: I) -> Vec<MultipartField>
where
	I: IntoIterator<Item = (&'a str, &'a FieldValue)>,
{
	let mut fields = Vec::new();
	for (name, value) in values {
		append(&mut fields, name, value);
	}
	fields
}

fn append(fields: &mut Vec<MultipartField>, key: &str, value: &FieldValue) {
	match value {
		FieldValue::Null => {}
		FieldValue::Text(text) => fields.push(MultipartField::text(key, text.clone())),
		FieldValue::Bool(flag) => fields.push(MultipartField::text(key, flag.to_string())),
		FieldValue::File(file) => fields.push(MultipartField::file(key, file.clone())),
		FieldValue::List(items) => {
			for (index, item) in items.iter().enumerate() {
				match item {
					FieldValue::Object(pairs) => {
						for (sub_key, sub_value) in pairs {
							append(fields, &format!("{key}[{index}][{sub_key}]"), sub_value);
						}
					}
					other => append(fields, &format!("{key}[{index}]"), other),
				}
			}
		}
		FieldValue::Object(pairs) => {
			for (sub_key, sub_value) in pairs {
				append(fields, &format!("{key}[{sub_key}]"), sub_value);
			}
		}
	}
}

/// Assemble the wire form for a multipart POST.
pub fn into_multipart_form(fields: Vec<MultipartField>) -> reqwest::multipart::Form {
	let mut form = reqwest::multipart::Form::new();
	for field in fields {
		form = match field.part {
			PartValue::Text(text) => form.text(field.name, text),
			PartValue::File(file) => {
				let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
					.file_name(file.file_name.clone());
				let part = match &file.content_type {
					Some(content_type) => match part.mime_str(content_type) {
						Ok(part) => part,
						Err(err) => {
							tracing::warn!(
								file = %file.file_name,
								%err,
								"ignoring malformed content type"
							);
							reqwest::multipart::Part::bytes(file.bytes.to_vec())
								.file_name(file.file_name.clone())
						}
					},
					None => part,
				};
				form.part(field.name, part)
			}
		};
	}
	form
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scalars_pass_through() {
		let name = FieldValue::Text("Acme".to_string());
		let active = FieldValue::Bool(true);

		let fields = serialize([("name", &name), ("active", &active)]);

		assert_eq!(
			fields,
			vec![
				MultipartField::text("name", "Acme"),
				MultipartField::text("active", "true"),
			]
		);
	}

	#[test]
	fn test_array_indices() {
		let tags = FieldValue::List(vec!["x".into(), "y".into()]);

		let fields = serialize([("tags", &tags)]);

		assert_eq!(
			fields,
			vec![
				MultipartField::text("tags[0]", "x"),
				MultipartField::text("tags[1]", "y"),
			]
		);
	}

	#[test]
	fn test_object_keys() {
		let addr = FieldValue::Object(vec![("city".to_string(), "A".into())]);

		let fields = serialize([("addr", &addr)]);

		assert_eq!(fields, vec![MultipartField::text("addr[city]", "A")]);
	}

	#[test]
	fn test_array_of_objects() {
		let contacts = FieldValue::List(vec![FieldValue::Object(vec![
			("name".to_string(), "Ann".into()),
			("phone".to_string(), "123".into()),
		])]);

		let fields = serialize([("contacts", &contacts)]);

		assert_eq!(
			fields,
			vec![
				MultipartField::text("contacts[0][name]", "Ann"),
				MultipartField::text("contacts[0][phone]", "123"),
			]
		);
	}

	#[test]
	fn test_null_values_omitted() {
		let gone = FieldValue::Null;
		let kept = FieldValue::Text("here".to_string());

		let fields = serialize([("gone", &gone), ("kept", &kept)]);

		assert_eq!(fields, vec![MultipartField::text("kept", "here")]);
	}

	#[test]
	fn test_file_entry() {
		let file = FieldValue::File(FileUpload::new("cv.pdf", vec![1u8, 2, 3]));

		let fields = serialize([("cv", &file)]);

		assert_eq!(fields.len(), 1);
		assert_eq!(fields[0].name, "cv");
		match &fields[0].part {
			PartValue::File(upload) => {
				assert_eq!(upload.file_name, "cv.pdf");
				assert_eq!(upload.size(), 3);
			}
			PartValue::Text(_) => panic!("expected a file part"),
		}
	}

	#[test]
	fn test_order_follows_input() {
		let a = FieldValue::Text("1".to_string());
		let b = FieldValue::Text("2".to_string());
		let c = FieldValue::Text("3".to_string());

		let fields = serialize([("z", &a), ("a", &b), ("m", &c)]);

		let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
		assert_eq!(names, vec!["z", "a", "m"]);
	}

	#[test]
	fn test_files_inside_arrays_keep_index_keys() {
		let gallery = FieldValue::List(vec![
			FieldValue::File(FileUpload::new("a.png", vec![1u8])),
			FieldValue::File(FileUpload::new("b.png", vec![2u8])),
		]);

		let fields = serialize([("gallery", &gallery)]);

		assert_eq!(fields[0].name, "gallery[0]");
		assert_eq!(fields[1].name, "gallery[1]");
	}
}
