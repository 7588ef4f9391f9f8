//! Runtime value model for form fields
//!
//! A field value is a string, a boolean, a list, a nested object, or an
//! uploaded file. Files carry raw bytes and therefore have no JSON
//! form; everything else converts to and from `serde_json::Value`.

use bytes::Bytes;

/// An uploaded file held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
	pub file_name: String,
	pub content_type: Option<String>,
	pub bytes: Bytes,
}

impl FileUpload {
	/// Create a new upload from a file name and its contents.
	///
	/// # Examples
	///
	/// ```
	/// use eventform::FileUpload;
	///
	/// let file = FileUpload::new("photo.JPG", vec![0xFF, 0xD8, 0xFF]);
	/// assert_eq!(file.size(), 3);
	/// assert_eq!(file.extension(), Some("jpg".to_string()));
	/// ```
	pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
		Self {
			file_name: file_name.into(),
			content_type: None,
			bytes: bytes.into(),
		}
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	pub fn size(&self) -> u64 {
		self.bytes.len() as u64
	}

	/// Lower-cased extension: the substring after the last `.`, if any.
	pub fn extension(&self) -> Option<String> {
		let (stem, ext) = self.file_name.rsplit_once('.')?;
		if stem.is_empty() || ext.is_empty() {
			return None;
		}
		Some(ext.to_lowercase())
	}
}

/// The current value of one form field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
	#[default]
	Null,
	Text(String),
	Bool(bool),
	List(Vec<FieldValue>),
	/// Nested object; pairs keep insertion order so serialization is
	/// deterministic.
	Object(Vec<(String, FieldValue)>),
	File(FileUpload),
}

impl FieldValue {
	/// Whether this value counts as "not filled in" for required checks
	/// and dependent-field gating.
	///
	/// `Bool(false)` is empty: a single required checkbox must be
	/// actually ticked.
	///
	/// # Examples
	///
	/// ```
	/// use eventform::FieldValue;
	///
	/// assert!(FieldValue::Null.is_empty());
	/// assert!(FieldValue::Text(String::new()).is_empty());
	/// assert!(FieldValue::Bool(false).is_empty());
	/// assert!(!FieldValue::Text("x".into()).is_empty());
	/// ```
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Text(s) => s.is_empty(),
			Self::Bool(b) => !b,
			Self::List(items) => items.is_empty(),
			Self::Object(pairs) => pairs.is_empty(),
			Self::File(_) => false,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_file(&self) -> Option<&FileUpload> {
		match self {
			Self::File(f) => Some(f),
			_ => None,
		}
	}

	/// The value as a plain string, used for URL suffixes and pattern
	/// matching. Lists and objects have no single text form.
	pub fn to_text(&self) -> Option<String> {
		match self {
			Self::Text(s) => Some(s.clone()),
			Self::Bool(b) => Some(b.to_string()),
			Self::Null | Self::List(_) | Self::Object(_) | Self::File(_) => None,
		}
	}

	/// Convert a JSON value into a field value. Numbers become their
	/// text form since the engine edits everything as strings.
	pub fn from_json(value: &serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(*b),
			serde_json::Value::Number(n) => Self::Text(n.to_string()),
			serde_json::Value::String(s) => Self::Text(s.clone()),
			serde_json::Value::Array(items) => {
				Self::List(items.iter().map(Self::from_json).collect())
			}
			serde_json::Value::Object(map) => Self::Object(
				map.iter()
					.map(|(k, v)| (k.clone(), Self::from_json(v)))
					.collect(),
			),
		}
	}

	/// Convert back to JSON. Files have no JSON form and map to null.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::Null | Self::File(_) => serde_json::Value::Null,
			Self::Text(s) => serde_json::Value::String(s.clone()),
			Self::Bool(b) => serde_json::Value::Bool(*b),
			Self::List(items) => {
				serde_json::Value::Array(items.iter().map(Self::to_json).collect())
			}
			Self::Object(pairs) => serde_json::Value::Object(
				pairs
					.iter()
					.map(|(k, v)| (k.clone(), v.to_json()))
					.collect(),
			),
		}
	}
}

impl From<&str> for FieldValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<bool> for FieldValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<FileUpload> for FieldValue {
	fn from(f: FileUpload) -> Self {
		Self::File(f)
	}
}
