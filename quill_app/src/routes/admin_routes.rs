use quill_core::error::QuillResult;
use quill_user::auth::Token;

use axum::extract::{Extension, Path};
use axum::routing::{get, post, put};
use axum::Json;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize)]
struct PostBody<T = quill_post::Post> {
    post: T,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct MultiplePostsBody {
    posts: Vec<quill_post::Post>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct MultipleModerationCommentsBody {
    comments: Vec<quill_comment::ModerationComment>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ApprovedBody {
    approved: bool,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SettingValueBody {
    value: String,
}

pub struct AdminRoutes<D>(std::marker::PhantomData<D>);

impl<D> AdminRoutes<D>
where
    D: quill_user::auth::AuthenticateAdmin
        + quill_post::ListAllPosts
        + quill_post::CreatePost
        + quill_post::UpdatePost
        + quill_post::DeletePost
        + quill_post::poll::CreatePoll
        + quill_comment::ListAllComments
        + quill_comment::SetCommentApproved
        + quill_site::FetchSiteStats
        + quill_site::PutSetting
        + Sized
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new().nest(
            "/admin",
            axum::Router::new()
                .route("/posts", get(Self::list_posts).post(Self::create_post))
                .route(
                    "/posts/:slug",
                    put(Self::update_post).delete(Self::delete_post),
                )
                .route("/posts/:slug/poll", post(Self::create_poll))
                .route("/comments", get(Self::list_comments))
                .route(
                    "/comments/:comment_id/approved",
                    put(Self::set_comment_approved),
                )
                .route("/stats", get(Self::stats))
                .route("/settings/:key", put(Self::put_setting)),
        )
    }

    async fn list_posts(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> QuillResult<Json<MultiplePostsBody>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(MultiplePostsBody {
            posts: deps.list_all_posts().await?,
        }))
    }

    async fn create_post(
        Extension(deps): Extension<D>,
        token: Token,
        Json(body): Json<PostBody<quill_post::PostCreate>>,
    ) -> QuillResult<Json<PostBody>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(PostBody {
            post: deps.create_post(body.post).await?,
        }))
    }

    async fn update_post(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
        Json(body): Json<PostBody<quill_post::PostUpdate>>,
    ) -> QuillResult<Json<PostBody>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(PostBody {
            post: deps.update_post(&slug, body.post).await?,
        }))
    }

    async fn delete_post(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
    ) -> QuillResult<()> {
        deps.authenticate_admin(token).await?;
        deps.delete_post(&slug).await
    }

    async fn create_poll(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
        Json(body): Json<quill_post::poll::PollCreate>,
    ) -> QuillResult<Json<quill_post::poll::PollView>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(deps.create_poll(&slug, body).await?))
    }

    async fn list_comments(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> QuillResult<Json<MultipleModerationCommentsBody>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(MultipleModerationCommentsBody {
            comments: deps.list_all_comments().await?,
        }))
    }

    async fn set_comment_approved(
        Extension(deps): Extension<D>,
        token: Token,
        Path(comment_id): Path<Uuid>,
        Json(body): Json<ApprovedBody>,
    ) -> QuillResult<()> {
        deps.authenticate_admin(token).await?;
        deps.set_comment_approved(comment_id, body.approved).await
    }

    async fn stats(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> QuillResult<Json<quill_site::SiteStats>> {
        deps.authenticate_admin(token).await?;
        Ok(Json(deps.fetch_site_stats().await?))
    }

    async fn put_setting(
        Extension(deps): Extension<D>,
        token: Token,
        Path(key): Path<String>,
        Json(body): Json<SettingValueBody>,
    ) -> QuillResult<()> {
        deps.authenticate_admin(token).await?;
        deps.put_setting(&key, &body.value).await
    }
}
