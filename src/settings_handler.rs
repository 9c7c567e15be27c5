//! Administrative settings page for the SharpSpring credentials.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, Redirect},
    Form,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::settings_store::{Credentials, SettingKey};

pub const SETTINGS_PATH: &str = "/admin/settings";
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    updated: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    secret_key: String,
}

/// GET /admin/settings
///
/// Renders the settings form with the stored values.
pub async fn settings_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    authorize(&state, &headers)?;

    let credentials = state.settings.credentials();
    Ok(Html(render_settings_page(
        &credentials,
        state.settings.updated_at(),
        query.updated,
    )))
}

/// POST /admin/settings
///
/// Stores both settings and redirects back to the form.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect, AppError> {
    authorize(&state, &headers)?;

    state
        .settings
        .update(Credentials::new(form.api_key, form.secret_key))
        .await?;

    Ok(Redirect::to(&format!("{}?updated=true", SETTINGS_PATH)))
}

/// Checks the admin token from the `X-Admin-Token` header.
///
/// The token is never accepted in the URI, which `TraceLayer` logs.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(ref expected) = state.config.admin_token else {
        return Err(AppError::Forbidden(
            "Settings page is disabled, set ADMIN_TOKEN to enable it".to_string(),
        ));
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing admin token".to_string()))?;

    if !constant_time_compare(provided, expected) {
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_input(key: SettingKey, heading: &str, value: &str) -> String {
    format!(
        r#"<tr>
            <th scope="row"><label for="{name}">{heading}</label></th>
            <td><input name="{name}" id="{name}" value="{value}" autocomplete="off" /></td>
        </tr>"#,
        name = key.as_str(),
        heading = heading,
        value = escape_html(value),
    )
}

fn render_settings_page(
    credentials: &Credentials,
    updated_at: Option<DateTime<Utc>>,
    updated: bool,
) -> String {
    let notice = if updated {
        r#"<div class="notice">Settings saved.</div>"#
    } else {
        ""
    };
    let last_updated = match updated_at {
        Some(at) => format!("<p>Last updated {}</p>", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Endpoints for Sharpspring</title>
</head>
<body>
    <div class="wrap">
        {notice}
        <form action="{action}" method="post">
            <h1>Endpoints for Sharpspring</h1>
            <p>Please add the required sharpspring info</p>
            <table>
        {api_key}
        {secret_key}
            </table>
            {last_updated}
            <button type="submit">Save Changes</button>
        </form>
    </div>
</body>
</html>
"#,
        notice = notice,
        action = SETTINGS_PATH,
        api_key = render_input(
            SettingKey::ApiKey,
            "Your sharpspring api key",
            &credentials.account_id
        ),
        secret_key = render_input(
            SettingKey::SecretKey,
            "Your sharpspring secret key",
            &credentials.secret_key
        ),
        last_updated = last_updated,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>"x" & 'y'</script>"#),
            "&lt;script&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("token", "token"));
        assert!(!constant_time_compare("token", "tokem"));
        assert!(!constant_time_compare("token", "token2"));
    }

    #[test]
    fn test_page_prefills_escaped_values() {
        let html = render_settings_page(
            &Credentials::new("123", "a\"b"),
            None,
            true,
        );
        assert!(html.contains(r#"name="api_key" id="api_key" value="123""#));
        assert!(html.contains(r#"value="a&quot;b""#));
        assert!(html.contains("Settings saved."));
        assert!(html.contains(r#"action="/admin/settings""#));
    }
}
