use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};
use std::fmt;

/// A SharpSpring credential stored in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    AccountId,
    SecretKey,
}

impl Credential {
    fn code(self) -> &'static str {
        match self {
            Credential::AccountId => "account-id",
            Credential::SecretKey => "secret-key",
        }
    }

    fn setting(self) -> &'static str {
        match self {
            Credential::AccountId => "api_key",
            Credential::SecretKey => "secret_key",
        }
    }
}

/// A field of the outbound `{ id, method, params }` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    Id,
    Method,
    Params,
}

impl RequestField {
    pub fn name(self) -> &'static str {
        match self {
            RequestField::Id => "id",
            RequestField::Method => "method",
            RequestField::Params => "params",
        }
    }
}

/// Broad category of a [`LeadError`], used for the `kind` tag and the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    MissingField,
    InvalidInput,
    TransportFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::TransportFailure => "transport_failure",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ErrorKind::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::MissingField => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::TransportFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

/// A single failure recorded while handling a lead submission.
///
/// Errors raised by the SharpSpring API itself are not represented here: the
/// remote JSON is handed back to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadError {
    /// Account id or secret key is not set.
    MissingCredential(Credential),
    /// `id`, `method` or `params` of the outbound request is empty.
    MissingField(RequestField),
    /// Malformed inbound form field (name, email).
    InvalidInput { field: String, message: String },
    /// Network failure or undecodable response on the outbound call.
    TransportFailure {
        message: String,
        status: Option<u16>,
    },
}

impl LeadError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        LeadError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LeadError::MissingCredential(_) => ErrorKind::MissingCredential,
            LeadError::MissingField(_) => ErrorKind::MissingField,
            LeadError::InvalidInput { .. } => ErrorKind::InvalidInput,
            LeadError::TransportFailure { .. } => ErrorKind::TransportFailure,
        }
    }

    /// Key of this error inside an [`ErrorSet`].
    pub fn code(&self) -> String {
        match self {
            LeadError::MissingCredential(credential) => credential.code().to_string(),
            LeadError::MissingField(field) => field.name().to_string(),
            LeadError::InvalidInput { field, .. } => field.clone(),
            LeadError::TransportFailure { .. } => "transport".to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            LeadError::MissingCredential(Credential::AccountId) => {
                "Sharpspring account id is not set, please add your api key in the settings page"
                    .to_string()
            }
            LeadError::MissingCredential(Credential::SecretKey) => {
                "Sharpspring secret key is not set, please add your secret key in the settings page"
                    .to_string()
            }
            LeadError::MissingField(field) => {
                let name = field.name();
                let mut chars = name.chars();
                let capitalized: String = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                format!(
                    "{} does not have a meaningful value when building the SharpSpring request",
                    capitalized
                )
            }
            LeadError::InvalidInput { message, .. } => message.clone(),
            LeadError::TransportFailure { message, .. } => message.clone(),
        }
    }

    pub fn context(&self) -> Value {
        match self {
            LeadError::MissingCredential(credential) => {
                json!({ "setting": credential.setting() })
            }
            LeadError::MissingField(field) => json!({ "field": field.name() }),
            LeadError::InvalidInput { field, .. } => json!({ "param": field }),
            LeadError::TransportFailure {
                status: Some(status),
                ..
            } => json!({ "status": status }),
            LeadError::TransportFailure { status: None, .. } => json!({}),
        }
    }
}

impl fmt::Display for LeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl Serialize for LeadError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("LeadError", 4)?;
        record.serialize_field("kind", self.kind().as_str())?;
        record.serialize_field("code", &self.code())?;
        record.serialize_field("message", &self.message())?;
        record.serialize_field("context", &self.context())?;
        record.end()
    }
}

/// Ordered collection of [`LeadError`]s keyed by their code.
///
/// Insertion order is kept; pushing an error whose code is already present
/// replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    errors: Vec<LeadError>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: LeadError) {
        let code = error.code();
        match self.errors.iter().position(|existing| existing.code() == code) {
            Some(index) => self.errors[index] = error,
            None => self.errors.push(error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeadError> {
        self.errors.iter()
    }

    pub fn get(&self, code: &str) -> Option<&LeadError> {
        self.errors.iter().find(|error| error.code() == code)
    }

    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind() == kind)
    }

    /// HTTP status for this set, driven by the first recorded error.
    pub fn status_code(&self) -> StatusCode {
        self.errors
            .first()
            .map(|error| error.kind().status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The `{ "error": true, "details": [...] }` body returned to callers.
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "details": self.errors,
        })
    }
}

impl From<LeadError> for ErrorSet {
    fn from(error: LeadError) -> Self {
        let mut set = ErrorSet::new();
        set.push(error);
        set
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ErrorSet {}

impl IntoResponse for ErrorSet {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Lead request failed: {}", self);
        } else {
            tracing::warn!("Lead request rejected: {}", self);
        }
        (status, Json(self.to_json())).into_response()
    }
}

/// Application-specific error types for the service's own routes.
#[derive(Debug)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with an external API.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Unauthorized access error.
    Unauthorized(String),
    /// The route is disabled by configuration.
    Forbidden(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg)
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (*source).into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON error: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }
}
