use quill_core::error::QuillResult;
use quill_post::bookmark;
use quill_post::poll;
use quill_user::auth::Token;

use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post};
use axum::Json;

#[derive(serde::Deserialize, serde::Serialize, Debug)]
struct PostBody<T = quill_post::Post> {
    post: T,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct MultiplePostsBody {
    posts: Vec<quill_post::Post>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ViewsBody {
    views: i64,
}

#[derive(serde::Serialize)]
struct PollBody {
    poll: Option<poll::PollView>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody {
    option_id: String,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct TrendingQuery {
    limit: Option<i64>,
}

pub struct PostRoutes<D>(std::marker::PhantomData<D>);

impl<D> PostRoutes<D>
where
    D: quill_post::ListPosts
        + quill_post::FetchPost
        + quill_post::ListTrendingPosts
        + quill_post::TrackPostView
        + bookmark::SetBookmark
        + bookmark::FetchBookmarkState
        + bookmark::ListBookmarkedPosts
        + poll::FetchPollForPost
        + poll::CastVote
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
            .route("/posts", get(Self::list_posts))
            .route("/trending", get(Self::list_trending))
            .route("/posts/:slug", get(Self::get_post))
            .route("/posts/:slug/view", post(Self::track_view))
            .route(
                "/posts/:slug/bookmark",
                get(Self::bookmark_state)
                    .post(Self::bookmark)
                    .delete(Self::unbookmark),
            )
            .route("/bookmarks", get(Self::list_bookmarks))
            .route("/posts/:slug/poll", get(Self::get_poll))
            .route("/posts/:slug/poll/vote", post(Self::vote))
    }

    async fn list_posts(
        Extension(deps): Extension<D>,
        Query(query): Query<quill_post::ListPostsQuery>,
    ) -> QuillResult<Json<MultiplePostsBody>> {
        Ok(Json(MultiplePostsBody {
            posts: deps.list_posts(query).await?,
        }))
    }

    async fn list_trending(
        Extension(deps): Extension<D>,
        Query(query): Query<TrendingQuery>,
    ) -> QuillResult<Json<MultiplePostsBody>> {
        Ok(Json(MultiplePostsBody {
            posts: deps.list_trending_posts(query.limit).await?,
        }))
    }

    async fn get_post(
        Extension(deps): Extension<D>,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<PostBody>> {
        Ok(Json(PostBody {
            post: deps.fetch_post(&slug).await?,
        }))
    }

    async fn track_view(
        Extension(deps): Extension<D>,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<ViewsBody>> {
        Ok(Json(ViewsBody {
            views: deps.track_post_view(&slug).await?,
        }))
    }

    async fn bookmark_state(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<bookmark::BookmarkState>> {
        let user = deps.authenticate(token)?;
        Ok(Json(deps.fetch_bookmark_state(user, &slug).await?))
    }

    async fn bookmark(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<bookmark::BookmarkState>> {
        let user = deps.authenticate(token)?;
        Ok(Json(deps.set_bookmark(user, &slug, true).await?))
    }

    async fn unbookmark(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<bookmark::BookmarkState>> {
        let user = deps.authenticate(token)?;
        Ok(Json(deps.set_bookmark(user, &slug, false).await?))
    }

    async fn list_bookmarks(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> QuillResult<Json<MultiplePostsBody>> {
        let user = deps.authenticate(token)?;
        Ok(Json(MultiplePostsBody {
            posts: deps.list_bookmarked_posts(user).await?,
        }))
    }

    async fn get_poll(
        Extension(deps): Extension<D>,
        token: Option<Token>,
        Path(slug): Path<String>,
    ) -> QuillResult<Json<PollBody>> {
        let viewer = deps.opt_authenticate(token)?;
        let post = deps.fetch_post(&slug).await?;
        Ok(Json(PollBody {
            poll: deps.fetch_poll_for_post(viewer, post.id).await?,
        }))
    }

    async fn vote(
        Extension(deps): Extension<D>,
        token: Token,
        Path(slug): Path<String>,
        Json(body): Json<VoteBody>,
    ) -> QuillResult<Json<poll::PollView>> {
        let viewer = deps.authenticate(token)?;
        let post = deps.fetch_post(&slug).await?;
        Ok(Json(
            deps.cast_vote(viewer, post.id, &body.option_id).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    use axum::http::{Request, StatusCode};
    use unimock::*;

    fn test_router(deps: Unimock) -> axum::Router {
        PostRoutes::<Unimock>::router().layer(Extension(deps))
    }

    #[tokio::test]
    async fn list_posts_should_accept_no_auth() {
        let deps = mock(Some(
            quill_post::list_posts::Fn
                .next_call(matching! {
                    (query) if query == &quill_post::ListPostsQuery::default()
                })
                .answers(|_| Ok(vec![]))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<MultiplePostsBody>(
            test_router(deps),
            Request::get("/posts").empty_body(),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert!(body.posts.is_empty());
    }

    #[tokio::test]
    async fn tracking_a_view_returns_the_new_count() {
        let deps = mock(Some(
            quill_post::track_post_view::Fn
                .next_call(matching!("slug"))
                .answers(|_| Ok(7))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<ViewsBody>(
            test_router(deps),
            Request::post("/posts/slug/view").empty_body(),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert_eq!(7, body.views);
    }

    #[tokio::test]
    async fn bookmarking_without_token_should_be_unauthorized() {
        let deps = mock(None::<unimock::Clause>);

        let (status, _) = request(
            test_router(deps),
            Request::post("/posts/slug/bookmark").empty_body(),
        )
        .await;

        assert_eq!(StatusCode::UNAUTHORIZED, status);
    }
}
