// HTTP API Error Types
use std::collections::BTreeSet;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

use crate::auth::ownership::Forbidden;
use crate::auth::{AuthError, ResourceKind};
use crate::boards::BoardError;
use crate::database::DatabaseError;
use crate::validation::ReferenceReport;

/// Every failure a request can end in. Rendered as
/// `{"message": ..., "err": ..., <context fields>}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    Malformed {
        field: String,
        message: String,
    },
    ReferenceInvalid {
        malformed: BTreeSet<String>,
        missing: BTreeSet<String>,
    },
    DuplicateReferences {
        board: String,
        ids: BTreeSet<String>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden {
        missing_scope: String,
    },

    // 404 Not Found
    NotFound {
        kind: ResourceKind,
        key_field: &'static str,
        id: String,
    },

    // 409 Conflict
    Conflict {
        kind: ResourceKind,
        key_field: &'static str,
        id: String,
        reason: ConflictReason,
    },

    // 500 Internal Server Error
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyExists,
    ConcurrentModification,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Malformed { .. }
            | ApiError::ReferenceInvalid { .. }
            | ApiError::DuplicateReferences { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing description
    pub fn message(&self) -> String {
        match self {
            ApiError::Malformed { message, .. } => message.clone(),
            ApiError::ReferenceInvalid { .. } => {
                "Invalid cards were detected in the request. Some cards are malformed or do not exist".to_string()
            }
            ApiError::DuplicateReferences { board, .. } => {
                format!("Cards may only appear once on the '{board}' board")
            }
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Forbidden { .. } => "Invalid permissions to access this resource".to_string(),
            ApiError::NotFound { kind, key_field, .. } => {
                format!("Failed to find {kind} with the specified {key_field}")
            }
            ApiError::Conflict { kind, key_field, reason: ConflictReason::AlreadyExists, .. } => {
                format!("A {kind} already exists under this {key_field}")
            }
            ApiError::Conflict { kind, reason: ConflictReason::ConcurrentModification, .. } => {
                format!("The {kind} was modified by another request. Fetch it again and retry")
            }
            ApiError::Internal(_) => "An error occurred while processing your request".to_string(),
        }
    }

    /// Stable error string for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Malformed { .. } => "MALFORMED",
            ApiError::ReferenceInvalid { .. } => "INVALID_CARDS",
            ApiError::DuplicateReferences { .. } => "DUPLICATE_CARDS",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict { reason: ConflictReason::AlreadyExists, .. } => "ALREADY_EXISTS",
            ApiError::Conflict { reason: ConflictReason::ConcurrentModification, .. } => "CONCURRENT_MODIFICATION",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(self.message()));
        body.insert("err".into(), Value::String(self.error_code().to_string()));

        match self {
            ApiError::Malformed { field, .. } => {
                body.insert("field".into(), json!(field));
            }
            ApiError::ReferenceInvalid { malformed, missing } => {
                body.insert("invalidCards".into(), json!(malformed));
                body.insert("noExistCards".into(), json!(missing));
            }
            ApiError::DuplicateReferences { board, ids } => {
                body.insert("board".into(), json!(board));
                body.insert("duplicateCards".into(), json!(ids));
            }
            ApiError::Forbidden { missing_scope } => {
                body.insert("requiredScope".into(), json!(missing_scope));
            }
            ApiError::NotFound { key_field, id, .. } | ApiError::Conflict { key_field, id, .. } => {
                body.insert((*key_field).into(), json!(id));
            }
            ApiError::Unauthorized(_) | ApiError::Internal(_) => {}
        }

        Value::Object(body)
    }
}

// Static constructor methods
impl ApiError {
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Malformed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(missing_scope: impl Into<String>) -> Self {
        ApiError::Forbidden {
            missing_scope: missing_scope.into(),
        }
    }

    pub fn not_found(kind: ResourceKind, key_field: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            kind,
            key_field,
            id: id.into(),
        }
    }

    pub fn already_exists(kind: ResourceKind, key_field: &'static str, id: impl Into<String>) -> Self {
        ApiError::Conflict {
            kind,
            key_field,
            id: id.into(),
            reason: ConflictReason::AlreadyExists,
        }
    }

    pub fn concurrent_modification(kind: ResourceKind, key_field: &'static str, id: impl Into<String>) -> Self {
        ApiError::Conflict {
            kind,
            key_field,
            id: id.into(),
            reason: ConflictReason::ConcurrentModification,
        }
    }

    /// Log `cause` and return a generic 500.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal failure: {}", cause);
        ApiError::Internal(cause.to_string())
    }

    /// `Ok` when the report is clean, otherwise `ReferenceInvalid`.
    pub fn check_report(report: ReferenceReport) -> Result<Vec<String>, Self> {
        if report.is_clean() {
            Ok(report.valid)
        } else {
            Err(ApiError::ReferenceInvalid {
                malformed: report.malformed,
                missing: report.missing,
            })
        }
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { kind, key_field, id } => ApiError::not_found(kind, key_field, id),
            DatabaseError::AlreadyExists { kind, key_field, id } => ApiError::already_exists(kind, key_field, id),
            DatabaseError::VersionConflict { kind, key_field, id } => {
                tracing::warn!("Rejected stale write to {} {}", kind, id);
                ApiError::concurrent_modification(kind, key_field, id)
            }
            // Don't expose storage internals to clients
            other => ApiError::internal(format!("Database error: {other}")),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::VerifierUnavailable(_) | AuthError::InvalidSecret => ApiError::internal(err),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<Forbidden> for ApiError {
    fn from(err: Forbidden) -> Self {
        ApiError::Forbidden {
            missing_scope: err.missing_scope,
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        match &err {
            BoardError::UnknownBoard { board, .. } => ApiError::malformed(board.clone(), err.to_string()),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Internal(cause) => write!(f, "{}: {}", self.message(), cause),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
