use crate::post_db::Post;
use crate::GetDb;

use quill_core::error::QuillResult;
use quill_core::timestamp::Timestamptz;
use quill_core::UserId;

use entrait::entrait_export as entrait;
use futures::TryStreamExt;
use uuid::Uuid;

#[entrait(pub InsertBookmark)]
async fn insert_bookmark(deps: &impl GetDb, UserId(user_id): UserId, post_id: Uuid) -> QuillResult<()> {
    // Idempotent: bookmarking twice is a no-op.
    sqlx::query!(
        r#"INSERT INTO blog.bookmark (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
        user_id,
        post_id
    )
    .execute(&deps.get_db().pg_pool)
    .await?;

    Ok(())
}

#[entrait(pub DeleteBookmark)]
async fn delete_bookmark(deps: &impl GetDb, UserId(user_id): UserId, post_id: Uuid) -> QuillResult<()> {
    sqlx::query!(
        r#"DELETE FROM blog.bookmark WHERE user_id = $1 AND post_id = $2"#,
        user_id,
        post_id
    )
    .execute(&deps.get_db().pg_pool)
    .await?;

    Ok(())
}

#[entrait(pub BookmarkExists)]
async fn bookmark_exists(deps: &impl GetDb, UserId(user_id): UserId, post_id: Uuid) -> QuillResult<bool> {
    let exists = sqlx::query_scalar!(
        r#"SELECT EXISTS(SELECT 1 FROM blog.bookmark WHERE user_id = $1 AND post_id = $2) "exists!""#,
        user_id,
        post_id
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await?;

    Ok(exists)
}

#[entrait(pub SelectBookmarkedPosts)]
async fn select_bookmarked_posts(deps: &impl GetDb, UserId(user_id): UserId) -> QuillResult<Vec<Post>> {
    let posts: Vec<Post> = sqlx::query_as!(
        Post,
        // language=PostgreSQL
        r#"
            SELECT
                post_id,
                title,
                slug,
                excerpt,
                content,
                published,
                featured_image,
                view_count,
                tags,
                post.created_at "created_at: Timestamptz"
            FROM blog.post post
            INNER JOIN blog.bookmark bookmark USING (post_id)
            WHERE bookmark.user_id = $1 AND published
            ORDER BY bookmark.created_at DESC
        "#,
        user_id
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(posts)
}
