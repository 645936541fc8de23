use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::data::Violation;

/// A request precondition that failed before any planning work began.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("student roster is empty")]
    EmptyRoster,

    #[error("room list is empty")]
    EmptyRooms,

    #[error("student with blank roll_number")]
    BlankRollNumber,

    #[error("student {roll_number} has a blank branch")]
    BlankBranch { roll_number: String },

    #[error("room with blank room_id")]
    BlankRoomId,

    #[error("room {room_id} has a blank branch")]
    BlankRoomBranch { room_id: String },

    #[error("room {room_id} must have at least one row and one column")]
    ZeroDimension { room_id: String },

    #[error("duplicate roll_number: {0}")]
    DuplicateRollNumber(String),

    #[error("duplicate room_id: {0}")]
    DuplicateRoomId(String),

    #[error("too many students: {count} exceeds the limit of {limit}")]
    TooManyStudents { count: usize, limit: usize },

    #[error("too many rooms: {count} exceeds the limit of {limit}")]
    TooManyRooms { count: usize, limit: usize },

    #[error("room {room_id} has {seats} seats, above the limit of {limit}")]
    RoomTooLarge {
        room_id: String,
        seats: usize,
        limit: usize,
    },
}

/// Errors that abort a planning request.
///
/// Students that cannot be seated are not an error; they are reported in the
/// response diagnostics.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The finished plan broke an invariant. This is a solver defect.
    #[error("plan failed validation with {} violation(s)", .0.len())]
    ConstraintViolation(Vec<Violation>),
}

impl PlanError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ConstraintViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlanError {
    fn into_response(self) -> Response {
        // violation details stay in the server log
        let body = match &self {
            Self::InvalidInput(e) => json!({ "error": "InvalidInput", "message": e.to_string() }),
            Self::ConstraintViolation(_) => {
                json!({ "error": "ConstraintViolation", "message": "internal server error" })
            }
        };
        (self.status_code(), Json(body)).into_response()
    }
}
