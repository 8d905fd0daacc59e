//! Error rendering
//!
//! Problem-document rendering of [`AppError`] and its axum response.

use super::app_error::AppError;

impl AppError {
    /// RFC 7807 problem document for this error.
    pub fn to_problem_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "code": self.code(),
            "action": self.action(),
        })
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.to_problem_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;

    #[test]
    fn test_problem_json() {
        let err = AppError::new(ErrorKind::Forbidden, "Insufficient role level")
            .with_code("INSUFFICIENT_PERMISSION");
        let body = err.to_problem_json();
        assert_eq!(body["status"], 403);
        assert_eq!(body["title"], "Forbidden");
        assert_eq!(body["detail"], "Insufficient role level");
        assert_eq!(body["code"], "INSUFFICIENT_PERMISSION");
        assert!(body["action"].is_null());
    }
}
