use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::rest::dto::ErrorBody;
use crate::domain::error::DomainError;

pub const MSG_CREDENTIALS_REQUIRED: &str = "Email e senha são obrigatórios.";
pub const MSG_EMAIL_TAKEN: &str = "E-mail já registrado.";
pub const MSG_INTERNAL: &str = "Erro interno do servidor.";

/// Error returned by REST handlers; renders as `{"error": ...}` with a fixed,
/// client-safe message per status.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DomainError);

/// Map domain error to status code and the fixed client message.
pub fn map_domain_error(e: &DomainError) -> (StatusCode, &'static str) {
    match e {
        DomainError::MissingCredentials => (StatusCode::BAD_REQUEST, MSG_CREDENTIALS_REQUIRED),
        DomainError::EmailAlreadyRegistered { .. } => (StatusCode::CONFLICT, MSG_EMAIL_TAKEN),
        DomainError::PasswordHashing { .. } | DomainError::Database { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, safe_msg) = map_domain_error(&self.0);

        if status.is_server_error() {
            // Details stay in the logs, never in the body.
            tracing::error!(error = %self.0, status = status.as_u16(), "Error registering user");
        } else {
            tracing::warn!(error = %self.0, status = status.as_u16(), "request failed");
        }

        let body = ErrorBody {
            error: safe_msg.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
