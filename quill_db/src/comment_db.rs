use crate::GetDb;

use quill_core::error::{QuillError, QuillResult};
use quill_core::timestamp::Timestamptz;

use entrait::entrait_export as entrait;
use futures::TryStreamExt;
use uuid::Uuid;

#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct Comment {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub avatar_url: Option<String>,
    pub approved: bool,
    pub created_at: Timestamptz,
}

/// A comment row joined with the title of its post, for the moderation
/// table.
#[cfg_attr(test, derive(Debug))]
pub struct ModerationComment {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub post_title: String,
    pub name: String,
    pub email: String,
    pub body: String,
    pub approved: bool,
    pub created_at: Timestamptz,
}

pub struct NewComment {
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub avatar_url: Option<String>,
    pub approved: bool,
    pub secret_hash: String,
}

/// What the delete authorization check needs to know about a comment.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct CommentOwnership {
    pub user_id: Option<Uuid>,
    pub secret_hash: Option<String>,
}

#[entrait(pub SelectApprovedComments)]
async fn select_approved_comments(deps: &impl GetDb, post_id: Uuid) -> QuillResult<Vec<Comment>> {
    let comments: Vec<Comment> = sqlx::query_as!(
        Comment,
        // language=PostgreSQL
        r#"
            SELECT
                comment_id,
                post_id,
                parent_id,
                user_id,
                name,
                email,
                body,
                avatar_url,
                approved,
                created_at "created_at: Timestamptz"
            FROM blog.comment
            WHERE post_id = $1 AND approved
            ORDER BY created_at
        "#,
        post_id
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(comments)
}

#[entrait(pub SelectAllComments)]
async fn select_all_comments(deps: &impl GetDb) -> QuillResult<Vec<ModerationComment>> {
    let comments: Vec<ModerationComment> = sqlx::query_as!(
        ModerationComment,
        // language=PostgreSQL
        r#"
            SELECT
                comment_id,
                comment.post_id,
                post.title post_title,
                comment.name,
                comment.email,
                body,
                approved,
                comment.created_at "created_at: Timestamptz"
            FROM blog.comment comment
            INNER JOIN blog.post post USING (post_id)
            ORDER BY comment.created_at DESC
        "#
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(comments)
}

/// Inserts a comment. If the deployment's schema predates the
/// `avatar_url` column, the insert is retried exactly once without it;
/// the retry's own failure is returned as-is.
#[entrait(pub InsertComment)]
async fn insert_comment(deps: &impl GetDb, new: NewComment) -> QuillResult<Comment> {
    let first_attempt = sqlx::query_as!(
        Comment,
        // language=PostgreSQL
        r#"
            INSERT INTO blog.comment
                (post_id, parent_id, user_id, name, email, body, avatar_url, approved, author_secret_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                comment_id,
                post_id,
                parent_id,
                user_id,
                name,
                email,
                body,
                avatar_url,
                approved,
                created_at "created_at: Timestamptz"
        "#,
        new.post_id,
        new.parent_id,
        new.user_id,
        new.name,
        new.email,
        new.body,
        new.avatar_url,
        new.approved,
        new.secret_hash
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await;

    match first_attempt {
        Ok(comment) => Ok(comment),
        Err(e) if is_undefined_column(&e) => {
            tracing::warn!("comment insert failed on missing column, retrying without avatar_url");
            let comment = sqlx::query_as!(
                Comment,
                // language=PostgreSQL
                r#"
                    INSERT INTO blog.comment
                        (post_id, parent_id, user_id, name, email, body, approved, author_secret_hash)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING
                        comment_id,
                        post_id,
                        parent_id,
                        user_id,
                        name,
                        email,
                        body,
                        NULL::text "avatar_url?",
                        approved,
                        created_at "created_at: Timestamptz"
                "#,
                new.post_id,
                new.parent_id,
                new.user_id,
                new.name,
                new.email,
                new.body,
                new.approved,
                new.secret_hash
            )
            .fetch_one(&deps.get_db().pg_pool)
            .await?;

            Ok(comment)
        }
        Err(e) => Err(e.into()),
    }
}

// Postgres 42703: undefined_column.
fn is_undefined_column(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(dbe) => dbe.code().as_deref() == Some("42703"),
        _ => false,
    }
}

#[entrait(pub FetchCommentOwnership)]
async fn fetch_comment_ownership(
    deps: &impl GetDb,
    comment_id: Uuid,
) -> QuillResult<Option<CommentOwnership>> {
    let record = sqlx::query!(
        r#"SELECT user_id, author_secret_hash FROM blog.comment WHERE comment_id = $1"#,
        comment_id
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?;

    Ok(record.map(|record| CommentOwnership {
        user_id: record.user_id,
        secret_hash: record.author_secret_hash,
    }))
}

/// Deletes a comment and its direct replies. Deeper descendants are left
/// in place; they drop out of the rendered thread because their parent is
/// gone.
#[entrait(pub DeleteCommentWithReplies)]
async fn delete_comment_with_replies(deps: &impl GetDb, comment_id: Uuid) -> QuillResult<()> {
    let result = sqlx::query!(
        r#"DELETE FROM blog.comment WHERE comment_id = $1 OR parent_id = $1"#,
        comment_id
    )
    .execute(&deps.get_db().pg_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QuillError::CommentNotFound);
    }

    Ok(())
}

#[entrait(pub UpdateCommentApproved)]
async fn update_comment_approved(
    deps: &impl GetDb,
    comment_id: Uuid,
    approved: bool,
) -> QuillResult<()> {
    let result = sqlx::query!(
        r#"UPDATE blog.comment SET approved = $1 WHERE comment_id = $2"#,
        approved,
        comment_id
    )
    .execute(&deps.get_db().pg_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QuillError::CommentNotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_test_db;
    use crate::post_db;

    use assert_matches::*;

    fn test_comment(post_id: Uuid, parent_id: Option<Uuid>) -> NewComment {
        NewComment {
            post_id,
            parent_id,
            user_id: None,
            name: "Reader".to_string(),
            email: "reader@example.com".to_string(),
            body: "hello".to_string(),
            avatar_url: None,
            approved: true,
            secret_hash: "d1gest".to_string(),
        }
    }

    async fn test_post(db: &impl GetDb) -> Uuid {
        post_db::insert_post(db, "Title", "slug", "", "body", true, None, &[])
            .await
            .unwrap()
            .post_id
    }

    #[tokio::test]
    async fn approved_listing_is_ascending_and_hides_unapproved() {
        let db = create_test_db().await;
        let post_id = test_post(&db).await;

        let first = db.insert_comment(test_comment(post_id, None)).await.unwrap();
        let second = db.insert_comment(test_comment(post_id, None)).await.unwrap();
        let hidden = db.insert_comment(test_comment(post_id, None)).await.unwrap();
        db.update_comment_approved(hidden.comment_id, false)
            .await
            .unwrap();

        let listed = db.select_approved_comments(post_id).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.comment_id).collect();
        assert_eq!(vec![first.comment_id, second.comment_id], ids);
    }

    #[tokio::test]
    async fn delete_cascades_exactly_one_level() {
        let db = create_test_db().await;
        let post_id = test_post(&db).await;

        let root = db.insert_comment(test_comment(post_id, None)).await.unwrap();
        let reply = db
            .insert_comment(test_comment(post_id, Some(root.comment_id)))
            .await
            .unwrap();
        let grandchild = db
            .insert_comment(test_comment(post_id, Some(reply.comment_id)))
            .await
            .unwrap();

        db.delete_comment_with_replies(root.comment_id).await.unwrap();

        // The grandchild row survives as an unreachable orphan.
        let remaining = db.select_approved_comments(post_id).await.unwrap();
        let ids: Vec<_> = remaining.iter().map(|c| c.comment_id).collect();
        assert_eq!(vec![grandchild.comment_id], ids);
        assert_eq!(Some(reply.comment_id), remaining[0].parent_id);
    }

    #[tokio::test]
    async fn insert_retries_exactly_once_when_avatar_column_is_missing() {
        let db = create_test_db().await;
        let post_id = test_post(&db).await;

        // Simulate a deployment whose schema predates the avatar column.
        sqlx::query("ALTER TABLE blog.comment DROP COLUMN avatar_url")
            .execute(&db.get_db().pg_pool)
            .await
            .unwrap();

        let mut new = test_comment(post_id, None);
        new.avatar_url = Some("https://example.com/a.png".to_string());

        let comment = db.insert_comment(new).await.unwrap();
        assert_eq!(None, comment.avatar_url);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog.comment")
            .fetch_one(&db.get_db().pg_pool)
            .await
            .unwrap();
        assert_eq!(1, count);
    }

    #[tokio::test]
    async fn ownership_is_removed_with_the_row() {
        let db = create_test_db().await;
        let post_id = test_post(&db).await;

        let comment = db.insert_comment(test_comment(post_id, None)).await.unwrap();

        let ownership = db
            .fetch_comment_ownership(comment.comment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Some("d1gest"), ownership.secret_hash.as_deref());

        db.delete_comment_with_replies(comment.comment_id)
            .await
            .unwrap();

        assert_matches!(
            db.fetch_comment_ownership(comment.comment_id).await,
            Ok(None)
        );
        assert_matches!(
            db.delete_comment_with_replies(comment.comment_id).await,
            Err(QuillError::CommentNotFound)
        );
    }
}
