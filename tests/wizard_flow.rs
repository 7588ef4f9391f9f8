//! End-to-end wizard flows against a stubbed backend.

use async_trait::async_trait;
use eventform::{
	ChoiceOption, Envelope, FieldSchema, FieldType, FieldValue, FormApi, FormDefinition,
	FormEngineError, FormPage, FormPhase, FormRuntime, MultipartField, OptionCache,
	OptionFetchError, OptionRequestType, resolve_options,
};
use std::sync::Mutex;

/// Stub backend serving one form definition, one option endpoint, and
/// recording every submission it receives.
struct StubBackend {
	definition: serde_json::Value,
	cities: serde_json::Value,
	fetched_urls: Mutex<Vec<String>>,
	submissions: Mutex<Vec<Vec<MultipartField>>>,
}

impl StubBackend {
	fn new(definition: serde_json::Value, cities: serde_json::Value) -> Self {
		Self {
			definition,
			cities,
			fetched_urls: Mutex::new(vec![]),
			submissions: Mutex::new(vec![]),
		}
	}
}

#[async_trait]
impl FormApi for StubBackend {
	async fn fetch_form(&self, _form_id: &str) -> Result<FormDefinition, FormEngineError> {
		serde_json::from_value(self.definition.clone())
			.map_err(|err| FormEngineError::SchemaLoad { reason: err.to_string() })
	}

	async fn fetch_options(
		&self,
		_method: OptionRequestType,
		url: &str,
	) -> Result<serde_json::Value, OptionFetchError> {
		self.fetched_urls.lock().unwrap().push(url.to_string());
		Ok(self.cities.clone())
	}

	async fn submit_form(
		&self,
		_url: &str,
		fields: Vec<MultipartField>,
	) -> Result<Envelope, FormEngineError> {
		self.submissions.lock().unwrap().push(fields);
		Ok(Envelope::success(serde_json::json!({"applicationId": "a-1"})))
	}
}

fn registration_definition() -> serde_json::Value {
	serde_json::json!({
		"formName": "conference-registration",
		"pages": [
			{
				"name": "attendee",
				"elements": [
					{
						"fieldName": "fullName",
						"fieldType": "text",
						"fieldTitle": "Full name",
						"isRequired": true,
						"fieldminLimit": 2
					},
					{
						"fieldName": "email",
						"fieldType": "email",
						"fieldTitle": "Email",
						"isRequired": true
					}
				]
			},
			{
				"name": "location",
				"elements": [
					{
						"fieldName": "country",
						"fieldType": "select",
						"fieldTitle": "Country",
						"isRequired": true,
						"fieldOptions": ["IN", "DE"]
					},
					{
						"fieldName": "city",
						"fieldType": "select",
						"fieldTitle": "City",
						"isRequired": true,
						"optionUrl": "/cities",
						"optionPath": "cities",
						"optionDepending": "country"
					}
				]
			},
			{
				"name": "preferences",
				"elements": [
					{
						"fieldName": "topics",
						"fieldType": "checkbox",
						"fieldTitle": "Topics",
						"isRequired": true,
						"fieldOptions": ["rust", "web", "embedded"]
					}
				]
			}
		]
	})
}

fn cities_payload() -> serde_json::Value {
	serde_json::json!({
		"status": 1,
		"data": {
			"cities": [
				{"_id": "1", "name": "Mumbai"},
				{"_id": "2", "name": "Pune"}
			]
		}
	})
}

#[tokio::test]
async fn dependent_select_fetches_by_parent_value() {
	// Picking a country triggers a fetch suffixed with its value, and
	// the response rows map to value/label pairs.
	let backend = StubBackend::new(registration_definition(), cities_payload());
	let mut runtime = FormRuntime::load("reg-1", &backend).await.unwrap();
	let mut cache = OptionCache::new();

	runtime.set_value("country", "IN");
	let city = runtime.definition().field("city").unwrap().clone();
	let key = runtime.dependent_key("city");
	assert_eq!(key.as_deref(), Some("IN"));
	assert!(cache.needs_refresh("city", key.as_deref()));

	cache.mark_loading("city", key.clone());
	let parent = runtime.value("country").cloned();
	let state = resolve_options(&city, parent.as_ref(), &backend).await;
	let stored = cache.store("city", key, state, runtime.dependent_key("city").as_deref());
	assert!(stored);

	assert_eq!(
		backend.fetched_urls.lock().unwrap().as_slice(),
		&["/cities/IN".to_string()]
	);
	let state = cache.state("city").unwrap();
	assert_eq!(state.options, vec![
		ChoiceOption::new("1", "Mumbai"),
		ChoiceOption::new("2", "Pune"),
	]);
}

#[tokio::test]
async fn dependent_field_resets_when_parent_changes() {
	let backend = StubBackend::new(registration_definition(), cities_payload());
	let mut runtime = FormRuntime::load("reg-1", &backend).await.unwrap();

	runtime.set_value("country", "IN");
	runtime.set_value("city", "1");
	runtime.set_value("country", "DE");

	assert_eq!(runtime.value("city"), Some(&FieldValue::Text(String::new())));
}

#[tokio::test]
async fn required_checkbox_blocks_until_selected() {
	// An empty required checkbox group fails with the stock required
	// message; one selection clears it.
	let backend = StubBackend::new(registration_definition(), cities_payload());
	let mut runtime = FormRuntime::load("reg-1", &backend).await.unwrap();

	fill_pages_one_and_two(&mut runtime);
	runtime.next_page().unwrap();
	runtime.next_page().unwrap();

	let result = runtime.submit(&backend, "/applications").await;
	assert!(matches!(result, Err(FormEngineError::Validation)));
	assert_eq!(runtime.error("topics"), Some("This field is required"));
	assert_eq!(backend.submissions.lock().unwrap().len(), 0);

	runtime.set_value("topics", FieldValue::List(vec!["rust".into()]));
	assert_eq!(runtime.error("topics"), None);
	runtime.submit(&backend, "/applications").await.unwrap();
	assert_eq!(runtime.phase(), FormPhase::Success);
}

#[tokio::test]
async fn wizard_reaches_success_only_after_last_page() {
	let backend = StubBackend::new(registration_definition(), cities_payload());
	let mut runtime = FormRuntime::load("reg-1", &backend).await.unwrap();
	assert_eq!(runtime.definition().page_count(), 3);

	// Page 1 cannot be skipped while empty.
	assert!(runtime.next_page().is_err());
	fill_pages_one_and_two(&mut runtime);

	runtime.next_page().unwrap();
	assert_eq!(runtime.phase(), FormPhase::Ready);
	runtime.next_page().unwrap();
	assert_eq!(runtime.phase(), FormPhase::Ready);

	runtime.set_value("topics", FieldValue::List(vec!["web".into()]));
	let envelope = runtime.submit(&backend, "/applications").await.unwrap();

	assert!(envelope.is_success());
	assert_eq!(runtime.phase(), FormPhase::Success);

	let submissions = backend.submissions.lock().unwrap();
	assert_eq!(submissions.len(), 1);
	let names: Vec<&str> = submissions[0].iter().map(|f| f.name.as_str()).collect();
	assert_eq!(
		names,
		vec!["fullName", "email", "country", "city", "topics[0]"]
	);
}

#[tokio::test]
async fn page_errors_are_scoped_to_the_current_page() {
	let backend = StubBackend::new(registration_definition(), cities_payload());
	let mut runtime = FormRuntime::load("reg-1", &backend).await.unwrap();

	let result = runtime.next_page();

	assert!(result.is_err());
	assert!(runtime.error("fullName").is_some());
	assert!(runtime.error("email").is_some());
	assert!(runtime.error("country").is_none());
	assert!(runtime.error("topics").is_none());
}

fn fill_pages_one_and_two(runtime: &mut FormRuntime) {
	runtime.set_value("fullName", "Ada Lovelace");
	runtime.set_value("email", "ada@example.com");
	runtime.set_value("country", "IN");
	runtime.set_value("city", "1");
}
