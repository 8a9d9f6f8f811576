pub mod secret;
pub mod thread;

pub use thread::CommentNode;

use quill_core::error::*;
use quill_core::identity::{self, AdminIdentity};
use quill_core::timestamp::Timestamptz;
use quill_core::{GetConfig, UserId};
use quill_db::{comment_db, post_db, user_db};
use quill_user::auth::{Authenticated, MaybeAuthenticated};

use entrait::entrait_export as entrait;
use uuid::Uuid;

/// A comment as shown to readers. `name` and `is_admin` are resolved
/// against the configured admin identity at read time; the author's email
/// is never exposed here.
#[derive(serde::Serialize, serde::Deserialize, Clone)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub body: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamptz,
}

/// The response to a successful submission. `author_secret` is handed out
/// exactly once; a client that wants to delete the comment later without
/// being signed in on this account must remember it.
#[derive(serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct SubmittedComment {
    pub comment: CommentView,
    pub author_secret: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSubmission {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub body: String,
}

/// A row in the moderation table.
#[derive(serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct ModerationComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub post_title: String,
    pub name: String,
    pub email: String,
    pub body: String,
    pub approved: bool,
    pub created_at: Timestamptz,
}

fn decorate(db: comment_db::Comment, admin: &AdminIdentity) -> CommentView {
    let is_admin = identity::is_admin(&db.email, admin);

    CommentView {
        id: db.comment_id,
        parent_id: db.parent_id,
        user_id: db.user_id,
        name: if is_admin {
            admin.display_name.clone()
        } else {
            db.name
        },
        body: db.body,
        avatar_url: db.avatar_url,
        is_admin,
        created_at: db.created_at,
    }
}

/// The approved comments of a published post, as a forest. There is no
/// live feed: comments posted by other readers appear on the next fetch.
#[entrait(pub ListComments)]
async fn list_comments(
    deps: &(impl post_db::SelectPosts + comment_db::SelectApprovedComments + GetConfig),
    slug: &str,
) -> QuillResult<Vec<CommentNode>> {
    let post = fetch_published_post(deps, slug).await?;

    let comments: Vec<CommentView> = deps
        .select_approved_comments(post.post_id)
        .await?
        .into_iter()
        .map(|comment| decorate(comment, deps.get_admin_identity()))
        .collect();

    Ok(thread::build_forest(&comments))
}

/// Posts a comment as the authenticated user. The display name and email
/// are frozen at submission time; later profile edits don't rewrite
/// existing comments.
#[entrait(pub SubmitComment)]
async fn submit_comment(
    deps: &(impl post_db::SelectPosts
          + user_db::FindUserById
          + comment_db::InsertComment
          + GetConfig),
    Authenticated(user_id): Authenticated<UserId>,
    slug: &str,
    submission: CommentSubmission,
) -> QuillResult<SubmittedComment> {
    let body = submission.body.trim();
    if body.is_empty() {
        return Err(QuillError::EmptyCommentBody);
    }

    let post = fetch_published_post(deps, slug).await?;

    let (user, _) = deps
        .find_user_by_id(user_id)
        .await?
        .ok_or(QuillError::CurrentUserDoesNotExist)?;

    let resolved = identity::resolve(
        &user.email,
        user.full_name.as_deref(),
        deps.get_admin_identity(),
    );

    let author_secret = secret::generate();

    let comment = deps
        .insert_comment(comment_db::NewComment {
            post_id: post.post_id,
            parent_id: submission.parent_id,
            user_id: Some(user_id.0),
            name: resolved.name,
            email: user.email,
            body: body.to_string(),
            avatar_url: user.avatar_url,
            approved: true,
            secret_hash: secret::digest(&author_secret),
        })
        .await?;

    Ok(SubmittedComment {
        comment: decorate(comment, deps.get_admin_identity()),
        author_secret,
    })
}

/// Deletes a comment and its direct replies, if the caller is the site
/// owner, presents the comment's authorship secret, or owns the comment.
/// Deeper descendants stay in the table and drop out of the rendered
/// thread.
#[entrait(pub DeleteComment)]
async fn delete_comment(
    deps: &(impl comment_db::FetchCommentOwnership
          + comment_db::DeleteCommentWithReplies
          + user_db::FindUserById
          + GetConfig),
    MaybeAuthenticated(caller): MaybeAuthenticated<UserId>,
    comment_id: Uuid,
    presented_secret: Option<String>,
) -> QuillResult<()> {
    let ownership = deps
        .fetch_comment_ownership(comment_id)
        .await?
        .ok_or(QuillError::CommentNotFound)?;

    let caller_is_admin = match caller {
        Some(user_id) => match deps.find_user_by_id(user_id).await? {
            Some((user, _)) => identity::is_admin(&user.email, deps.get_admin_identity()),
            None => false,
        },
        None => false,
    };

    if !secret::may_delete(
        caller,
        caller_is_admin,
        presented_secret.as_deref(),
        ownership.user_id.map(UserId),
        ownership.secret_hash.as_deref(),
    ) {
        return Err(QuillError::Forbidden);
    }

    deps.delete_comment_with_replies(comment_id).await
}

/// Every comment on the site, newest first, for the moderation table.
#[entrait(pub ListAllComments)]
async fn list_all_comments(
    deps: &impl comment_db::SelectAllComments,
) -> QuillResult<Vec<ModerationComment>> {
    let comments = deps
        .select_all_comments()
        .await?
        .into_iter()
        .map(|comment| ModerationComment {
            id: comment.comment_id,
            post_id: comment.post_id,
            post_title: comment.post_title,
            name: comment.name,
            email: comment.email,
            body: comment.body,
            approved: comment.approved,
            created_at: comment.created_at,
        })
        .collect();

    Ok(comments)
}

/// Unapproving hides the comment (and with it, its subtree) from the
/// public listing without deleting anything.
#[entrait(pub SetCommentApproved)]
async fn set_comment_approved(
    deps: &impl comment_db::UpdateCommentApproved,
    comment_id: Uuid,
    approved: bool,
) -> QuillResult<()> {
    deps.update_comment_approved(comment_id, approved).await
}

async fn fetch_published_post(
    deps: &impl post_db::SelectPosts,
    slug: &str,
) -> QuillResult<post_db::Post> {
    deps.select_posts(post_db::Filter {
        slug: Some(slug),
        published_only: true,
        ..Default::default()
    })
    .await?
    .into_iter()
    .next()
    .ok_or(QuillError::PostNotFound)
}
