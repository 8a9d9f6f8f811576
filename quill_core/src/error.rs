use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::borrow::Cow;
use std::collections::HashMap;

pub type QuillResult<T, E = QuillError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum QuillError {
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("user does not exist")]
    CurrentUserDoesNotExist,

    #[error("email does not exist")]
    EmailDoesNotExist,

    #[error("email is taken")]
    EmailTaken,

    #[error("post not found")]
    PostNotFound,

    #[error("duplicate post slug: {0}")]
    DuplicatePostSlug(String),

    #[error("comment not found")]
    CommentNotFound,

    #[error("comment body must not be empty")]
    EmptyCommentBody,

    #[error("poll not found")]
    PollNotFound,

    #[error("already voted in this poll")]
    AlreadyVoted,

    #[error("a database error occurred")]
    Sqlx(#[from] sqlx::Error),

    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),
}

impl QuillError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::CurrentUserDoesNotExist => StatusCode::NOT_FOUND,
            Self::EmailDoesNotExist => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EmailTaken => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PostNotFound => StatusCode::NOT_FOUND,
            Self::DuplicatePostSlug(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::CommentNotFound => StatusCode::NOT_FOUND,
            Self::EmptyCommentBody => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PollNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyVoted => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for QuillError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                self.status_code(),
                [(WWW_AUTHENTICATE, HeaderValue::from_static("Token"))]
                    .into_iter()
                    .collect::<HeaderMap>(),
                self.to_string(),
            )
                .into_response(),
            Self::EmailDoesNotExist => {
                unprocessable_entity_with_errors([("email".into(), vec!["does not exist".into()])])
            }
            Self::EmailTaken => {
                unprocessable_entity_with_errors([("email".into(), vec!["email is taken".into()])])
            }
            Self::DuplicatePostSlug(slug) => unprocessable_entity_with_errors([(
                "slug".into(),
                vec![format!("duplicate post slug: {slug}").into()],
            )]),
            Self::EmptyCommentBody => unprocessable_entity_with_errors([(
                "body".into(),
                vec!["must not be empty".into()],
            )]),
            Self::AlreadyVoted => unprocessable_entity_with_errors([(
                "poll".into(),
                vec!["already voted".into()],
            )]),
            Self::Sqlx(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (self.status_code(), self.to_string()).into_response()
            }
            Self::Anyhow(ref e) => {
                tracing::error!("Generic error: {:?}", e);
                (self.status_code(), self.to_string()).into_response()
            }
            _ => (self.status_code(), ()).into_response(),
        }
    }
}

#[derive(serde::Serialize)]
struct JsonErrors {
    errors: HashMap<Cow<'static, str>, Vec<Cow<'static, str>>>,
}

fn unprocessable_entity_with_errors(
    errors: impl Into<HashMap<Cow<'static, str>, Vec<Cow<'static, str>>>>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(JsonErrors {
            errors: errors.into(),
        }),
    )
        .into_response()
}
