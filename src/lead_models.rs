use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Name of the SharpSpring tracking cookie.
pub const TRACKING_COOKIE: &str = "__ss_tk";

/// Inbound lead-capture parameters, merged from the query string and the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddLeadParams {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "campaignId")]
    pub campaign_id: Option<String>,
}

impl AddLeadParams {
    /// Builds params from decoded key/value pairs; later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "name" => params.name = Some(value.into()),
                "email" => params.email = Some(value.into()),
                "campaignId" => params.campaign_id = Some(value.into()),
                _ => {}
            }
        }
        params
    }

    /// Reads the known fields from a JSON object. Numbers are accepted for
    /// `campaignId` since SharpSpring campaign ids are numeric.
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| match value.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            name: field("name"),
            email: field("email"),
            campaign_id: field("campaignId"),
        }
    }

    /// Fills fields missing from `self` with those from `fallback`.
    pub fn or(self, fallback: AddLeadParams) -> Self {
        Self {
            name: self.name.or(fallback.name),
            email: self.email.or(fallback.email),
            campaign_id: self.campaign_id.or(fallback.campaign_id),
        }
    }
}

/// A lead as expected by SharpSpring's `createLeads` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadObject {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "emailAddress")]
    pub email_address: String,
    #[serde(rename = "trackingID")]
    pub tracking_id: String,
    #[serde(rename = "campaignID")]
    pub campaign_id: String,
}

/// `params` of a `createLeads` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLeadsParams {
    pub objects: Vec<LeadObject>,
}

impl CreateLeadsParams {
    pub fn single(lead: LeadObject) -> Self {
        Self {
            objects: vec![lead],
        }
    }
}

/// Decodes `%XX` escapes and `+` the way form data is decoded.
pub fn url_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z\- ]+$").expect("name regex is valid"))
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified, with at least one dot in the domain
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email regex is valid")
    })
}

/// Validates a full name: letters, hyphens and spaces only, after URL-decoding,
/// with at least one non-space token.
pub fn validate_name_string(name: &str) -> bool {
    let decoded = url_decode(name);
    !decoded.trim().is_empty() && name_regex().is_match(&decoded)
}

/// Validates an email address.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() < 5 || email.len() > 254 {
        return false;
    }
    email_regex().is_match(email)
}

/// Splits a full name into first and last name.
///
/// The first token is the first name and the last token the last name; a
/// single token is used for both.
pub fn split_name(name: &str) -> (String, String) {
    let decoded = url_decode(name);
    let tokens: Vec<&str> = decoded.split(' ').filter(|t| !t.is_empty()).collect();
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => (String::new(), String::new()),
    }
}

/// Parses a `Cookie` header into name/value pairs.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), url_decode(value)))
        })
        .collect()
}
