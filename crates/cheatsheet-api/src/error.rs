use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use askama::Template;
use thiserror::Error;
use tracing::{error, warn};

use cheatsheet_types::action::ValidationError;

use crate::views::ErrorTemplate;

/// Everything a request can fail with, mapped to a status at the request boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("there is no language named `{name}`")]
    UnknownLanguage { field: &'static str, name: String },

    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    #[error("only the owner can change this cheat sheet")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownLanguage { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The submitted field the error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(e) => Some(e.field()),
            Self::UnknownLanguage { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Message safe to show to the client. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            Self::Internal(e) => error!("Internal error: {:#}", e),
            other => warn!("Request rejected: {}", other),
        }
    }

    pub fn into_json_response(self) -> Response {
        self.log();
        let body = serde_json::json!({
            "error": self.public_message(),
            "field": self.field(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        Self::Internal(anyhow::anyhow!("template rendering failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let page = ErrorTemplate {
            nav_user: None,
            status: status.as_u16(),
            message: self.public_message(),
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                error!("Failed to render error page: {}", e);
                (status, self.public_message()).into_response()
            }
        }
    }
}
