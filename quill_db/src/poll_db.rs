use crate::DbResultExt;
use crate::GetDb;

use quill_core::error::{QuillError, QuillResult};
use quill_core::UserId;

use entrait::entrait_export as entrait;
use futures::TryStreamExt;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(Debug, Eq, PartialEq))]
pub struct PollOption {
    pub id: String,
    pub text: String,
}

#[cfg_attr(test, derive(Debug))]
pub struct Poll {
    pub poll_id: Uuid,
    pub post_id: Uuid,
    pub question: String,
    pub options: Json<Vec<PollOption>>,
    pub placement: String,
}

#[entrait(pub SelectPollForPost)]
async fn select_poll_for_post(deps: &impl GetDb, post_id: Uuid) -> QuillResult<Option<Poll>> {
    let poll = sqlx::query_as!(
        Poll,
        // language=PostgreSQL
        r#"
            SELECT
                poll_id,
                post_id,
                question,
                options "options: Json<Vec<PollOption>>",
                placement
            FROM blog.poll
            WHERE post_id = $1
            ORDER BY created_at
            LIMIT 1
        "#,
        post_id
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?;

    Ok(poll)
}

#[entrait(pub InsertPoll)]
async fn insert_poll(
    deps: &impl GetDb,
    post_id: Uuid,
    question: &str,
    options: &[PollOption],
    placement: &str,
) -> QuillResult<Poll> {
    let poll = sqlx::query_as!(
        Poll,
        // language=PostgreSQL
        r#"
            INSERT INTO blog.poll (post_id, question, options, placement)
            VALUES ($1, $2, $3, $4)
            RETURNING
                poll_id,
                post_id,
                question,
                options "options: Json<Vec<PollOption>>",
                placement
        "#,
        post_id,
        question,
        serde_json::to_value(options).map_err(anyhow::Error::from)?,
        placement
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await?;

    Ok(poll)
}

/// One vote per user per poll, enforced by a unique constraint.
#[entrait(pub InsertVote)]
async fn insert_vote(
    deps: &impl GetDb,
    poll_id: Uuid,
    UserId(user_id): UserId,
    option_id: &str,
) -> QuillResult<()> {
    sqlx::query!(
        r#"INSERT INTO blog.poll_vote (poll_id, user_id, option_id) VALUES ($1, $2, $3)"#,
        poll_id,
        user_id,
        option_id
    )
    .execute(&deps.get_db().pg_pool)
    .await
    .on_constraint("poll_vote_poll_id_user_id_key", |_| QuillError::AlreadyVoted)
    .on_constraint("poll_vote_poll_id_fkey", |_| QuillError::PollNotFound)?;

    Ok(())
}

#[entrait(pub CountVotes)]
async fn count_votes(deps: &impl GetDb, poll_id: Uuid) -> QuillResult<Vec<(String, i64)>> {
    let counts = sqlx::query!(
        r#"
            SELECT option_id, COUNT(*) "count!"
            FROM blog.poll_vote
            WHERE poll_id = $1
            GROUP BY option_id
        "#,
        poll_id
    )
    .fetch(&deps.get_db().pg_pool)
    .map_ok(|record| (record.option_id, record.count))
    .try_collect::<Vec<_>>()
    .await?;

    Ok(counts)
}

#[entrait(pub FindUserVote)]
async fn find_user_vote(
    deps: &impl GetDb,
    poll_id: Uuid,
    UserId(user_id): UserId,
) -> QuillResult<Option<String>> {
    let option_id = sqlx::query_scalar!(
        r#"SELECT option_id FROM blog.poll_vote WHERE poll_id = $1 AND user_id = $2"#,
        poll_id,
        user_id
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?;

    Ok(option_id)
}

#[entrait(pub SelectVoterAvatars)]
async fn select_voter_avatars(deps: &impl GetDb, poll_id: Uuid, limit: i64) -> QuillResult<Vec<String>> {
    let avatars = sqlx::query_scalar!(
        r#"
            SELECT "user".avatar_url "avatar_url!"
            FROM blog.poll_vote vote
            INNER JOIN blog."user" "user" USING (user_id)
            WHERE vote.poll_id = $1 AND "user".avatar_url IS NOT NULL
            ORDER BY vote.created_at DESC
            LIMIT $2
        "#,
        poll_id,
        limit
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(avatars)
}
