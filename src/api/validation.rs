use actix_web::{error::InternalError, web, HttpResponse};
use serde::Serialize;

/// Failure envelope shared by every endpoint. `success` is always false.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: None,
            details: None,
            fields: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Success envelope: `{success: true, data}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

fn deserialize_error_message(err_string: &str) -> &'static str {
    if err_string.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if err_string.contains("unknown variant") {
        "Invalid enum value. Check allowed values for this field"
    } else if err_string.contains("missing field") {
        "Missing required fields"
    } else {
        "Invalid JSON format"
    }
}

fn bad_request(body: ErrorResponse) -> actix_web::Error {
    InternalError::from_response("", HttpResponse::BadRequest().json(body)).into()
}

/// JsonConfig for validated bodies with standardized error handling
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            let mut fields = serde_json::Map::new();
            for (field, errors) in validation_errors.field_errors() {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Validation error in field: {}", field))
                    })
                    .collect();
                fields.insert(field.to_string(), serde_json::json!({ "errors": messages }));
            }
            bad_request(ErrorResponse::new("Validation failed").with_fields(serde_json::Value::Object(fields)))
        }
        actix_web_validator::Error::Deserialize(de_err) => bad_request(
            ErrorResponse::new("Request validation failed")
                .with_details(deserialize_error_message(&de_err.to_string())),
        ),
        _ => bad_request(ErrorResponse::new("Validation failed").with_details("Validation error")),
    })
}

/// JsonConfig for bodies that are validated record by record in the service
pub fn plain_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        bad_request(
            ErrorResponse::new("Request validation failed")
                .with_details(deserialize_error_message(&err.to_string())),
        )
    })
}

/// Malformed query strings (for example a repeated key) are a client error
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        bad_request(ErrorResponse::new("Invalid query parameters").with_details(err.to_string()))
    })
}
