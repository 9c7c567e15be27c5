use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{
        header::{CONTENT_TYPE, COOKIE},
        HeaderMap,
    },
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    errors::{ErrorSet, LeadError},
    handlers::AppState,
    lead_models::{
        is_valid_email, parse_cookies, split_name, validate_name_string, AddLeadParams,
        CreateLeadsParams, LeadObject, TRACKING_COOKIE,
    },
    sharpspring_request::{RequestId, SharpSpringRequest, CREATE_LEADS},
};

/// Lead-capture endpoint.
///
/// Flow:
/// 1. Merge `name`, `email`, `campaignId` from the body and the query string.
/// 2. Validate name and email (400 before any outbound call).
/// 3. Split the name, read the `__ss_tk` tracking cookie.
/// 4. Build the `createLeads` request with the stored credentials.
/// 5. Send it and hand back SharpSpring's JSON untouched.
///
/// # Returns
///
/// * `Result<Json<Value>, ErrorSet>` - SharpSpring's response, or `{ error: true, details }`.
pub async fn add_lead(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ErrorSet> {
    let params = params_from_body(&headers, &body)?.or(AddLeadParams::from_pairs(query));

    let (name, email) = validate_params(&params)?;
    let campaign_id = params.campaign_id.unwrap_or_default();
    tracing::info!("📨 Received lead submission (campaign='{}')", campaign_id);

    let (first_name, last_name) = split_name(&name);
    let tracking_id = tracking_id(&headers);
    if tracking_id.is_empty() {
        tracing::debug!("No {} cookie on lead submission", TRACKING_COOKIE);
    }

    let lead = CreateLeadsParams::single(LeadObject {
        first_name,
        last_name,
        email_address: email.trim().to_string(),
        tracking_id,
        campaign_id,
    });
    let lead_params = serde_json::to_value(&lead)
        .map_err(|e| LeadError::invalid_input("params", format!("Invalid lead payload: {}", e)))?;

    let request = SharpSpringRequest::new(
        state.client.api_url(),
        &state.settings.credentials(),
        RequestId::generate(),
        CREATE_LEADS,
        lead_params,
    );

    let response = request.make_request(&state.client).await?;
    Ok(Json(response))
}

/// Reads lead params from a JSON or form-urlencoded body.
fn params_from_body(headers: &HeaderMap, body: &[u8]) -> Result<AddLeadParams, LeadError> {
    if body.is_empty() {
        return Ok(AddLeadParams::default());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| LeadError::invalid_input("body", format!("Malformed JSON body: {}", e)))?;
        Ok(AddLeadParams::from_json(&value))
    } else if content_type.is_empty()
        || content_type.starts_with("application/x-www-form-urlencoded")
    {
        Ok(AddLeadParams::from_pairs(
            url::form_urlencoded::parse(body).into_owned(),
        ))
    } else {
        Err(LeadError::invalid_input(
            "body",
            format!("Unsupported content type '{}'", content_type),
        ))
    }
}

/// Checks name and email, reporting every failing field.
fn validate_params(params: &AddLeadParams) -> Result<(String, String), ErrorSet> {
    let mut errors = ErrorSet::new();

    match params.name.as_deref().map(str::trim) {
        None | Some("") => errors.push(LeadError::invalid_input("name", "Missing name parameter")),
        Some(name) if !validate_name_string(name) => errors.push(LeadError::invalid_input(
            "name",
            "Invalid name: only letters, spaces and hyphens are allowed",
        )),
        Some(_) => {}
    }

    match params.email.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(LeadError::invalid_input("email", "Missing email parameter"))
        }
        Some(email) if !is_valid_email(email) => {
            errors.push(LeadError::invalid_input("email", "Invalid email address"))
        }
        Some(_) => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok((
        params.name.clone().unwrap_or_default(),
        params.email.clone().unwrap_or_default(),
    ))
}

/// SharpSpring tracking id from the `__ss_tk` cookie, empty when absent.
fn tracking_id(headers: &HeaderMap) -> String {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| parse_cookies(header).remove(TRACKING_COOKIE))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_validate_reports_both_fields() {
        let params = AddLeadParams {
            name: Some("John123".to_string()),
            email: Some("not-an-email".to_string()),
            campaign_id: None,
        };

        let errors = validate_params(&params).unwrap_err();
        let codes: Vec<String> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["name", "email"]);
    }

    #[test]
    fn test_blank_encoded_name_is_rejected() {
        let params = AddLeadParams {
            name: Some("%20".to_string()),
            email: Some("jane@example.com".to_string()),
            campaign_id: None,
        };

        let errors = validate_params(&params).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("name").is_some());
    }

    #[test]
    fn test_validate_requires_fields() {
        let errors = validate_params(&AddLeadParams::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_tracking_id_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("__ss_tk=202401|abc"));
        assert_eq!(tracking_id(&headers), "202401|abc");

        assert_eq!(tracking_id(&HeaderMap::new()), "");
    }

    #[test]
    fn test_form_body_params() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let params = params_from_body(
            &headers,
            b"name=Jane%20Doe&email=jane%40example.com&campaignId=7",
        )
        .unwrap();

        assert_eq!(params.name.as_deref(), Some("Jane Doe"));
        assert_eq!(params.email.as_deref(), Some("jane@example.com"));
        assert_eq!(params.campaign_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_malformed_json_body_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let err = params_from_body(&headers, b"{not json").unwrap_err();
        assert_eq!(err.code(), "body");
    }

    #[test]
    fn test_unsupported_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(params_from_body(&headers, b"hello").is_err());
    }
}
