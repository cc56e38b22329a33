use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json};

/// Errors surfaced by the JSON API. Every variant renders as
/// `{"error": "..."}` with the matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("Too many requests, please try again later")]
    TooManyRequests,
    #[error("File exceeds the {0} MB upload limit")]
    PayloadTooLarge(i64),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::TooManyRequests => Status::TooManyRequests,
            ApiError::PayloadTooLarge(_) => Status::PayloadTooLarge,
            ApiError::Storage(_) => Status::InternalServerError,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// Lapsed or missing admin session; the client redirects to login.
    pub fn session_expired() -> Self {
        ApiError::Unauthorized("Session expired, please log in again")
    }

    /// Message sent to the client. Storage details stay in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

/// Model writes report failures as strings; unique-key clashes are the
/// caller's fault, anything else is ours.
impl From<String> for ApiError {
    fn from(e: String) -> Self {
        if e.contains("UNIQUE constraint failed") {
            ApiError::BadRequest("A record with that value already exists".to_string())
        } else {
            ApiError::Storage(e)
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if let ApiError::Storage(ref e) = self {
            log::error!("{} {}: {}", req.method(), req.uri(), e);
        }
        (status, Json(json!({ "error": self.public_message() }))).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_are_client_errors() {
        let err = ApiError::from("UNIQUE constraint failed: blog_posts.slug".to_string());
        assert_eq!(err.status(), Status::BadRequest);

        let err = ApiError::from("disk I/O error".to_string());
        assert_eq!(err.status(), Status::InternalServerError);
        assert!(!err.public_message().contains("disk"));
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(ApiError::NotFound("Contact").to_string(), "Contact not found");
        assert_eq!(ApiError::PayloadTooLarge(5).status(), Status::PayloadTooLarge);
    }
}
