//! Request construction for the SharpSpring API.
//!
//! A [`SharpSpringRequest`] is built in one pass: request id, credential
//! check, target URL, envelope validation and serialization. Failures are
//! recorded in an [`ErrorSet`] instead of aborting, so a caller sees every
//! problem with the envelope at once and no network call is made while any
//! error is present.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::errors::{Credential, ErrorSet, LeadError, RequestField};
use crate::settings_store::Credentials;
use crate::sharpspring_client::SharpSpringClient;

/// SharpSpring method used to create leads.
pub const CREATE_LEADS: &str = "createLeads";

/// Opaque identifier sent as the `id` of a request envelope.
///
/// Only needs to be unique within the process; SharpSpring echoes it back
/// but nothing correlates on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("ss-req-{}", Uuid::new_v4().simple()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated request ready to be sent.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub body: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    id: &'a str,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug)]
pub struct SharpSpringRequest {
    request_id: RequestId,
    method: String,
    params: Value,
    request_url: Option<Url>,
    request_data: Option<String>,
    errors: ErrorSet,
}

impl SharpSpringRequest {
    /// Builds and validates a request.
    ///
    /// # Arguments
    ///
    /// * `api_url` - SharpSpring API base, e.g. `https://api.sharpspring.com/pubapi/v1`.
    /// * `credentials` - Account id and secret key from the settings.
    /// * `request_id` - Identifier for the envelope.
    /// * `method` - SharpSpring API method, e.g. [`CREATE_LEADS`].
    /// * `params` - Method parameters, formatted per the SharpSpring API docs.
    pub fn new(
        api_url: &str,
        credentials: &Credentials,
        request_id: RequestId,
        method: impl Into<String>,
        params: Value,
    ) -> Self {
        let mut request = Self {
            request_id,
            method: method.into(),
            params,
            request_url: None,
            request_data: None,
            errors: ErrorSet::new(),
        };

        let credentials = Credentials::new(
            credentials.account_id.trim(),
            credentials.secret_key.trim(),
        );
        if request.check_credentials(&credentials) {
            request.setup_request_url(api_url, &credentials);
        }
        request.set_request_data();

        request
    }

    /// Records a missing-credential error and returns `false` when the
    /// account id or secret key is empty. The account id is checked first.
    fn check_credentials(&mut self, credentials: &Credentials) -> bool {
        if credentials.account_id.is_empty() {
            self.errors
                .push(LeadError::MissingCredential(Credential::AccountId));
            return false;
        }
        if credentials.secret_key.is_empty() {
            self.errors
                .push(LeadError::MissingCredential(Credential::SecretKey));
            return false;
        }
        true
    }

    fn setup_request_url(&mut self, api_url: &str, credentials: &Credentials) {
        let base = format!("{}/", api_url.trim_end_matches('/'));
        match Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .clear()
                    .append_pair("accountID", &credentials.account_id)
                    .append_pair("secretKey", &credentials.secret_key);
                self.request_url = Some(url);
            }
            Err(e) => {
                tracing::error!("Invalid SharpSpring API URL '{}': {}", api_url, e);
                self.errors.push(LeadError::TransportFailure {
                    message: format!("Invalid SharpSpring API URL: {}", e),
                    status: None,
                });
            }
        }
    }

    /// Validates every envelope field, then serializes the envelope when all
    /// of them carry a value.
    fn set_request_data(&mut self) {
        let mut has_error = false;

        let checks = [
            (RequestField::Id, self.request_id.as_str().trim().is_empty()),
            (RequestField::Method, self.method.trim().is_empty()),
            (RequestField::Params, is_empty_value(&self.params)),
        ];
        for (field, empty) in checks {
            if empty {
                self.errors.push(LeadError::MissingField(field));
                has_error = true;
            }
        }

        if has_error {
            return;
        }

        let envelope = Envelope {
            id: self.request_id.as_str(),
            method: &self.method,
            params: &self.params,
        };
        match serde_json::to_string(&envelope) {
            Ok(data) => self.request_data = Some(data),
            Err(e) => self.errors.push(LeadError::invalid_input(
                RequestField::Params.name(),
                format!("Params could not be serialized: {}", e),
            )),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Target URL; `None` whenever the credentials were incomplete.
    pub fn request_url(&self) -> Option<&Url> {
        self.request_url.as_ref()
    }

    /// Serialized `{ id, method, params }` body; `None` when a field was empty.
    pub fn request_body(&self) -> Option<&str> {
        self.request_data.as_deref()
    }

    pub fn into_prepared(self) -> Result<PreparedRequest, ErrorSet> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        match (self.request_url, self.request_data) {
            (Some(url), Some(body)) => Ok(PreparedRequest { url, body }),
            (None, _) => Err(LeadError::MissingCredential(Credential::AccountId).into()),
            (_, None) => Err(LeadError::MissingField(RequestField::Params).into()),
        }
    }

    /// Sends the request, or returns the recorded errors without touching
    /// the network.
    pub async fn make_request(self, client: &SharpSpringClient) -> Result<Value, ErrorSet> {
        let request_id = self.request_id.clone();
        let method = self.method.clone();

        let prepared = self.into_prepared().map_err(|errors| {
            tracing::warn!(
                "SharpSpring request {} ({}) not sent: {} error(s)",
                request_id,
                method,
                errors.len()
            );
            errors
        })?;

        tracing::debug!("Sending SharpSpring request {} ({})", request_id, method);
        client
            .post_json(&prepared.url, prepared.body)
            .await
            .map_err(ErrorSet::from)
    }
}

/// Null, `false`, and empty strings, arrays or objects carry no value.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    const API_URL: &str = "https://api.sharpspring.com/pubapi/v1";

    fn params() -> Value {
        json!({ "objects": [{ "emailAddress": "jane@example.com" }] })
    }

    #[test]
    fn test_both_credentials_missing_reports_account_id() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::default(),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );

        assert!(request.has_errors());
        assert!(request.request_url().is_none());
        assert!(request.errors().get("account-id").is_some());
        assert!(request
            .errors()
            .contains_kind(ErrorKind::MissingCredential));
    }

    #[test]
    fn test_missing_secret_key_blocks_url() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("A", ""),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );

        assert!(request.request_url().is_none());
        assert!(request.errors().get("secret-key").is_some());
        assert!(request.errors().get("account-id").is_none());
    }

    #[test]
    fn test_url_carries_credentials_once() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("A", "B"),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );

        let url = request.request_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sharpspring.com/pubapi/v1/?accountID=A&secretKey=B"
        );
        assert_eq!(url.query(), Some("accountID=A&secretKey=B"));
    }

    #[test]
    fn test_credentials_are_form_encoded() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("A B", "k&y=1"),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );

        let url = request.request_url().unwrap();
        assert_eq!(url.query(), Some("accountID=A+B&secretKey=k%26y%3D1"));
    }

    #[test]
    fn test_url_uses_trimmed_credentials() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("  A ", "\tB\n"),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );

        let url = request.request_url().unwrap();
        assert_eq!(url.query(), Some("accountID=A&secretKey=B"));

        let blank = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("   ", "B"),
            RequestId::new("req-1"),
            CREATE_LEADS,
            params(),
        );
        assert!(blank.request_url().is_none());
        assert!(blank.errors().get("account-id").is_some());
    }

    #[test]
    fn test_all_empty_fields_are_reported() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("A", "B"),
            RequestId::new(""),
            "",
            json!({}),
        );

        let codes: Vec<String> = request.errors().iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["id", "method", "params"]);
        assert!(request.request_body().is_none());
        // URL is still built: the credentials were fine.
        assert!(request.request_url().is_some());
    }

    #[test]
    fn test_credential_and_field_errors_accumulate() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::default(),
            RequestId::new("req-1"),
            "",
            Value::Null,
        );

        let codes: Vec<String> = request.errors().iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["account-id", "method", "params"]);
    }

    #[test]
    fn test_body_has_exactly_id_method_params() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::new("A", "B"),
            RequestId::new("req-42"),
            CREATE_LEADS,
            params(),
        );

        let body: Value = serde_json::from_str(request.request_body().unwrap()).unwrap();
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(body["id"], "req-42");
        assert_eq!(body["method"], "createLeads");
        assert_eq!(body["params"], params());
    }

    #[test]
    fn test_into_prepared_returns_errors() {
        let request = SharpSpringRequest::new(
            API_URL,
            &Credentials::default(),
            RequestId::generate(),
            CREATE_LEADS,
            params(),
        );

        let errors = request.into_prepared().unwrap_err();
        assert_eq!(errors.to_json()["error"], json!(true));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ss-req-"));
    }

    #[test]
    fn test_empty_value_rules() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!(false)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!({"a": 1})));
        assert!(!is_empty_value(&json!(["x"])));
    }
}
