use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Outcome of a request stage, independent of the hosting layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageReply {
    Status(StatusCode),
    /// `303 See Other` to the given location.
    Redirect(String),
}

impl StageReply {
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect(location.into())
    }

    /// Redirect to the error page carrying a human-readable message.
    pub fn error(message: &str) -> Self {
        Self::Redirect(with_query("/error", "msg", message))
    }

    /// Redirect to the error page without a message.
    pub fn generic_error() -> Self {
        Self::Redirect("/error".to_owned())
    }

    pub fn method_not_allowed() -> Self {
        Self::Status(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn forbidden() -> Self {
        Self::Status(StatusCode::FORBIDDEN)
    }

    pub fn bad_request() -> Self {
        Self::Status(StatusCode::BAD_REQUEST)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect(location) => Some(location),
            Self::Status(_) => None,
        }
    }
}

impl IntoResponse for StageReply {
    fn into_response(self) -> Response {
        match self {
            Self::Status(status) => status.into_response(),
            Self::Redirect(location) => {
                (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
            }
        }
    }
}

/// Append one urlencoded query parameter to `path`.
pub fn with_query(path: &str, key: &str, value: &str) -> String {
    match serde_urlencoded::to_string([(key, value)]) {
        Ok(query) => format!("{path}?{query}"),
        Err(_) => path.to_owned(),
    }
}
