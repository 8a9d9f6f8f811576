use quill_core::error::*;
use quill_core::UserId;
use quill_db::{poll_db, post_db};
use quill_user::auth::{Authenticated, MaybeAuthenticated};

use entrait::entrait_export as entrait;
use std::collections::HashMap;
use uuid::Uuid;

const VOTER_AVATAR_LIMIT: i64 = 5;

/// A poll as rendered on a post page: options with live counts, the
/// viewer's own vote, and a few recent voter avatars.
#[derive(serde::Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<poll_db::PollOption>,
    pub placement: String,
    pub votes: HashMap<String, i64>,
    pub total_votes: i64,
    pub user_vote: Option<String>,
    pub voter_avatars: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollCreate {
    pub question: String,
    pub options: Vec<poll_db::PollOption>,
    #[serde(default = "default_placement")]
    pub placement: String,
}

fn default_placement() -> String {
    "bottom".to_string()
}

/// Attaches a poll to a post (drafts included). Placement is one of
/// `top`, `middle`, `bottom`.
#[entrait(pub CreatePoll)]
async fn create_poll(
    deps: &(impl post_db::SelectPosts + poll_db::InsertPoll),
    slug: &str,
    poll: PollCreate,
) -> QuillResult<PollView> {
    let post = deps
        .select_posts(post_db::Filter {
            slug: Some(slug),
            ..Default::default()
        })
        .await?
        .into_iter()
        .next()
        .ok_or(QuillError::PostNotFound)?;

    let created = deps
        .insert_poll(post.post_id, &poll.question, &poll.options, &poll.placement)
        .await?;

    Ok(PollView {
        id: created.poll_id,
        question: created.question,
        options: created.options.0,
        placement: created.placement,
        votes: HashMap::new(),
        total_votes: 0,
        user_vote: None,
        voter_avatars: vec![],
    })
}

#[entrait(pub FetchPollForPost)]
async fn fetch_poll_for_post(
    deps: &(impl poll_db::SelectPollForPost
          + poll_db::CountVotes
          + poll_db::FindUserVote
          + poll_db::SelectVoterAvatars),
    MaybeAuthenticated(viewer): MaybeAuthenticated<UserId>,
    post_id: Uuid,
) -> QuillResult<Option<PollView>> {
    let poll = match deps.select_poll_for_post(post_id).await? {
        Some(poll) => poll,
        None => return Ok(None),
    };

    Ok(Some(build_view(deps, poll, viewer).await?))
}

/// Counts are derived from vote rows on every read, never stored.
#[entrait(pub CastVote)]
async fn cast_vote(
    deps: &(impl poll_db::InsertVote
          + poll_db::SelectPollForPost
          + poll_db::CountVotes
          + poll_db::FindUserVote
          + poll_db::SelectVoterAvatars),
    Authenticated(viewer): Authenticated<UserId>,
    post_id: Uuid,
    option_id: &str,
) -> QuillResult<PollView> {
    let poll = deps
        .select_poll_for_post(post_id)
        .await?
        .ok_or(QuillError::PollNotFound)?;

    deps.insert_vote(poll.poll_id, viewer, option_id).await?;

    build_view(deps, poll, Some(viewer)).await
}

async fn build_view(
    deps: &(impl poll_db::CountVotes + poll_db::FindUserVote + poll_db::SelectVoterAvatars),
    poll: poll_db::Poll,
    viewer: Option<UserId>,
) -> QuillResult<PollView> {
    let votes: HashMap<String, i64> = deps.count_votes(poll.poll_id).await?.into_iter().collect();
    let total_votes = votes.values().sum();

    let user_vote = match viewer {
        Some(viewer) => deps.find_user_vote(poll.poll_id, viewer).await?,
        None => None,
    };

    let voter_avatars = deps
        .select_voter_avatars(poll.poll_id, VOTER_AVATAR_LIMIT)
        .await?;

    Ok(PollView {
        id: poll.poll_id,
        question: poll.question,
        options: poll.options.0,
        placement: poll.placement,
        votes,
        total_votes,
        user_vote,
        voter_avatars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::*;
    use sqlx::types::Json;
    use unimock::*;

    fn test_poll(poll_id: Uuid, post_id: Uuid) -> poll_db::Poll {
        poll_db::Poll {
            poll_id,
            post_id,
            question: "Which?".to_string(),
            options: Json(vec![
                poll_db::PollOption {
                    id: "a".to_string(),
                    text: "Option A".to_string(),
                },
                poll_db::PollOption {
                    id: "b".to_string(),
                    text: "Option B".to_string(),
                },
            ]),
            placement: "bottom".to_string(),
        }
    }

    #[tokio::test]
    async fn post_without_poll_yields_none() {
        let deps = mock(Some(
            poll_db::select_poll_for_post::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(None))
                .once()
                .in_order(),
        ));

        let view = fetch_poll_for_post(&deps, MaybeAuthenticated(None), Uuid::new_v4())
            .await
            .unwrap();
        assert_matches!(view, None);
    }

    #[tokio::test]
    async fn anonymous_viewer_sees_counts_but_no_own_vote() {
        let poll_id = Uuid::new_v4();
        let post_id = Uuid::new_v4();
        let deps = mock([
            poll_db::select_poll_for_post::Fn
                .next_call(matching!(_))
                .answers(move |_| Ok(Some(test_poll(poll_id, post_id))))
                .once()
                .in_order(),
            poll_db::count_votes::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(vec![("a".to_string(), 3), ("b".to_string(), 1)]))
                .once()
                .in_order(),
            poll_db::select_voter_avatars::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(vec![]))
                .once()
                .in_order(),
        ]);

        let view = fetch_poll_for_post(&deps, MaybeAuthenticated(None), post_id)
            .await
            .unwrap()
            .expect("poll should be present");

        assert_eq!(4, view.total_votes);
        assert_eq!(Some(&3), view.votes.get("a"));
        assert_eq!(None, view.user_vote);
    }

    #[tokio::test]
    async fn voting_on_missing_poll_should_not_insert() {
        let deps = mock(Some(
            poll_db::select_poll_for_post::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(None))
                .once()
                .in_order(),
        ));

        assert_matches!(
            cast_vote(
                &deps,
                Authenticated(UserId(Uuid::new_v4())),
                Uuid::new_v4(),
                "a"
            )
            .await,
            Err(QuillError::PollNotFound)
        );
    }
}
