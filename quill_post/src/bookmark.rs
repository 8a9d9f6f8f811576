use crate::Post;

use quill_core::error::*;
use quill_core::UserId;
use quill_db::{bookmark_db, post_db};
use quill_user::auth::Authenticated;

use entrait::entrait_export as entrait;

#[derive(serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct BookmarkState {
    pub bookmarked: bool,
}

#[entrait(pub SetBookmark)]
async fn set_bookmark(
    deps: &(impl post_db::SelectPosts + bookmark_db::InsertBookmark + bookmark_db::DeleteBookmark),
    Authenticated(user_id): Authenticated<UserId>,
    slug: &str,
    value: bool,
) -> QuillResult<BookmarkState> {
    let post = deps
        .select_posts(post_db::Filter {
            slug: Some(slug),
            published_only: true,
            ..Default::default()
        })
        .await?
        .into_iter()
        .next()
        .ok_or(QuillError::PostNotFound)?;

    if value {
        deps.insert_bookmark(user_id, post.post_id).await?;
    } else {
        deps.delete_bookmark(user_id, post.post_id).await?;
    }

    Ok(BookmarkState { bookmarked: value })
}

#[entrait(pub FetchBookmarkState)]
async fn fetch_bookmark_state(
    deps: &(impl post_db::SelectPosts + bookmark_db::BookmarkExists),
    Authenticated(user_id): Authenticated<UserId>,
    slug: &str,
) -> QuillResult<BookmarkState> {
    let post = deps
        .select_posts(post_db::Filter {
            slug: Some(slug),
            published_only: true,
            ..Default::default()
        })
        .await?
        .into_iter()
        .next()
        .ok_or(QuillError::PostNotFound)?;

    Ok(BookmarkState {
        bookmarked: deps.bookmark_exists(user_id, post.post_id).await?,
    })
}

#[entrait(pub ListBookmarkedPosts)]
async fn list_bookmarked_posts(
    deps: &impl bookmark_db::SelectBookmarkedPosts,
    Authenticated(user_id): Authenticated<UserId>,
) -> QuillResult<Vec<Post>> {
    deps.select_bookmarked_posts(user_id)
        .await
        .map(|posts| posts.into_iter().map(Into::into).collect())
}
