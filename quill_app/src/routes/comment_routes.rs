use quill_comment::{CommentNode, CommentSubmission, SubmittedComment};
use quill_core::error::QuillResult;
use quill_user::auth::Token;

use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get};
use axum::Json;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize)]
struct CommentBody<T> {
    comment: T,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct MultipleCommentsBody {
    comments: Vec<CommentNode>,
}

#[derive(serde::Deserialize)]
struct DeleteCommentQuery {
    secret: Option<String>,
}

pub struct CommentRoutes<D>(std::marker::PhantomData<D>);

impl<D> CommentRoutes<D>
where
    D: quill_comment::ListComments
        + quill_comment::SubmitComment
        + quill_comment::DeleteComment
        + quill_user::auth::Authenticate
        + quill_user::auth::OptAuthenticate
        + Sized
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route(
                "/posts/:slug/comments",
                get(Self::list_comments).post(Self::submit_comment),
            )
            .route("/comments/:comment_id", delete(Self::delete_comment))
    }

    async fn list_comments(
        Extension(deps): Extension<D>,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<MultipleCommentsBody>> {
        Ok(Json(MultipleCommentsBody {
            comments: deps.list_comments(&slug).await?,
        }))
    }

    async fn submit_comment(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
        Json(CommentBody { comment }): Json<CommentBody<CommentSubmission>>,
    ) -> QuillResult<Json<SubmittedComment>> {
        let user = deps.authenticate(token)?;
        Ok(Json(deps.submit_comment(user, &slug, comment).await?))
    }

    async fn delete_comment(
        Extension(deps): Extension<D>,
        token: Option<Token>,
        Path(comment_id): Path<Uuid>,
        Query(query): Query<DeleteCommentQuery>,
    ) -> QuillResult<()> {
        let caller = deps.opt_authenticate(token)?;
        deps.delete_comment(caller, comment_id, query.secret).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use quill_user::auth::{Authenticated, MaybeAuthenticated};

    use axum::http::{Request, StatusCode};
    use quill_core::UserId;
    use unimock::*;

    fn test_router(deps: Unimock) -> axum::Router {
        CommentRoutes::<Unimock>::router().layer(Extension(deps))
    }

    #[tokio::test]
    async fn listing_comments_needs_no_auth() {
        let deps = mock(Some(
            quill_comment::list_comments::Fn
                .next_call(matching!("my-post"))
                .answers(|_| Ok(vec![]))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<MultipleCommentsBody>(
            test_router(deps),
            Request::get("/posts/my-post/comments").empty_body(),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert!(body.comments.is_empty());
    }

    #[tokio::test]
    async fn submitting_without_token_never_reaches_the_service() {
        let deps = mock(None::<unimock::Clause>);

        let (status, _) = request(
            test_router(deps),
            Request::post("/posts/my-post/comments").with_json_body(CommentBody {
                comment: CommentSubmission {
                    parent_id: None,
                    body: "hello".to_string(),
                },
            }),
        )
        .await;

        assert_eq!(StatusCode::UNAUTHORIZED, status);
    }

    #[tokio::test]
    async fn delete_passes_the_secret_through() {
        let comment_id = Uuid::from_u128(42);
        let deps = mock([
            quill_user::auth::opt_authenticate::Fn
                .next_call(matching!(None))
                .answers(|_| Ok(MaybeAuthenticated(None)))
                .once()
                .in_order(),
            quill_comment::delete_comment::Fn
                .next_call(matching! {
                    (MaybeAuthenticated(None), _, Some(secret)) if secret == "s3cr3t"
                })
                .answers(|_| Ok(()))
                .once()
                .in_order(),
        ]);

        let (status, _) = request(
            test_router(deps),
            Request::delete(format!("/comments/{comment_id}?secret=s3cr3t")).empty_body(),
        )
        .await;

        assert_eq!(StatusCode::OK, status);
    }

    #[tokio::test]
    async fn submit_requires_authentication_first() {
        let user_id = UserId(Uuid::from_u128(7));
        let deps = mock([
            quill_user::auth::authenticate::Fn
                .next_call(matching!(_))
                .answers(move |_| Ok(Authenticated(user_id)))
                .once()
                .in_order(),
            quill_comment::submit_comment::Fn
                .next_call(matching!((_, "my-post", _)))
                .answers(|_| {
                    Err(quill_core::error::QuillError::PostNotFound)
                })
                .once()
                .in_order(),
        ]);

        let (status, _) = request(
            test_router(deps),
            Request::post("/posts/my-post/comments")
                .header(axum::http::header::AUTHORIZATION, "Token t0k3n")
                .with_json_body(CommentBody {
                    comment: CommentSubmission {
                        parent_id: None,
                        body: "hello".to_string(),
                    },
                }),
        )
        .await;

        assert_eq!(StatusCode::NOT_FOUND, status);
    }
}
