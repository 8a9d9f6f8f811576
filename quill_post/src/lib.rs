pub mod bookmark;
pub mod poll;

use quill_core::error::*;
use quill_core::timestamp::Timestamptz;
use quill_db::post_db;

use entrait::entrait_export as entrait;
use itertools::Itertools;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Clone)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub featured_image: Option<String>,
    pub view_count: i64,
    pub tags: Vec<String>,
    pub created_at: Timestamptz,
}

impl From<post_db::Post> for Post {
    fn from(q: post_db::Post) -> Self {
        Self {
            id: q.post_id,
            title: q.title,
            slug: q.slug,
            excerpt: q.excerpt,
            content: q.content,
            published: q.published,
            featured_image: q.featured_image,
            view_count: q.view_count,
            tags: q.tags,
            created_at: q.created_at,
        }
    }
}

#[derive(serde::Deserialize, Default, Eq, PartialEq)]
#[serde(default)]
pub struct ListPostsQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreate {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub featured_image: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[entrait(pub ListPosts)]
async fn list_posts(
    deps: &impl post_db::SelectPosts,
    query: ListPostsQuery,
) -> QuillResult<Vec<Post>> {
    deps.select_posts(post_db::Filter {
        slug: None,
        tag: query.tag.as_deref(),
        search: query.search.as_deref(),
        published_only: true,
        limit: query.limit,
        offset: query.offset,
    })
    .await
    .map(|posts| posts.into_iter().map(Into::into).collect())
}

/// Everything, drafts included, for the admin table.
#[entrait(pub ListAllPosts)]
async fn list_all_posts(deps: &impl post_db::SelectPosts) -> QuillResult<Vec<Post>> {
    deps.select_posts(post_db::Filter {
        limit: Some(1000),
        ..Default::default()
    })
    .await
    .map(|posts| posts.into_iter().map(Into::into).collect())
}

#[entrait(pub FetchPost)]
async fn fetch_post(deps: &impl post_db::SelectPosts, slug: &str) -> QuillResult<Post> {
    deps.select_posts(post_db::Filter {
        slug: Some(slug),
        published_only: true,
        ..Default::default()
    })
    .await?
    .into_iter()
    .next()
    .map(Into::into)
    .ok_or(QuillError::PostNotFound)
}

#[entrait(pub ListTrendingPosts)]
async fn list_trending_posts(
    deps: &impl post_db::SelectTrendingPosts,
    limit: Option<i64>,
) -> QuillResult<Vec<Post>> {
    deps.select_trending_posts(limit.unwrap_or(5).min(20))
        .await
        .map(|posts| posts.into_iter().map(Into::into).collect())
}

#[entrait(pub CreatePost)]
async fn create_post(deps: &impl post_db::InsertPost, post: PostCreate) -> QuillResult<Post> {
    let slug = match &post.slug {
        Some(slug) if !slug.trim().is_empty() => slug.clone(),
        _ => slugify(&post.title),
    };
    let excerpt = match &post.excerpt {
        Some(excerpt) if !excerpt.trim().is_empty() => excerpt.clone(),
        _ => excerpt_from_content(&post.content),
    };

    deps.insert_post(
        &post.title,
        &slug,
        &excerpt,
        &post.content,
        post.published,
        post.featured_image.as_deref(),
        &post.tags,
    )
    .await
    .map(Into::into)
}

/// The slug only changes when explicitly supplied; editing a title never
/// silently breaks existing links.
#[entrait(pub UpdatePost)]
async fn update_post(
    deps: &impl post_db::UpdatePost,
    slug: &str,
    update: PostUpdate,
) -> QuillResult<Post> {
    deps.update_post(
        slug,
        post_db::PostUpdate {
            title: update.title.as_deref(),
            slug: update.slug.as_deref(),
            excerpt: update.excerpt.as_deref(),
            content: update.content.as_deref(),
            published: update.published,
            featured_image: update.featured_image.as_deref(),
            tags: update.tags.as_deref(),
        },
    )
    .await
    .map(Into::into)
}

#[entrait(pub DeletePost)]
async fn delete_post(deps: &impl post_db::DeletePost, slug: &str) -> QuillResult<()> {
    deps.delete_post(slug).await
}

/// Registers one view and returns the new count. Deduplication of repeat
/// views within a browsing session is the caller's concern.
#[entrait(pub TrackPostView)]
async fn track_post_view(deps: &impl post_db::IncrementViewCount, slug: &str) -> QuillResult<i64> {
    deps.increment_view_count(slug).await
}

fn slugify(string: &str) -> String {
    const QUOTE_CHARS: &[char] = &['\'', '"'];

    string
        // Quotes don't split words, so contractions and possessives stay together.
        .split(|c: char| !(QUOTE_CHARS.contains(&c) || c.is_alphanumeric()))
        // Runs of separators produce empty substrings.
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut s = s.replace(QUOTE_CHARS, "");
            s.make_ascii_lowercase();
            s
        })
        .join("-")
}

const EXCERPT_LENGTH: usize = 150;

/// Derives a plain-text excerpt from HTML content: tags stripped,
/// whitespace collapsed, truncated on a character boundary.
fn excerpt_from_content(content: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;

    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => {
                if c.is_whitespace() {
                    if !text.ends_with(' ') && !text.is_empty() {
                        text.push(' ');
                    }
                } else {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    let text = text.trim();
    if text.chars().count() <= EXCERPT_LENGTH {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(EXCERPT_LENGTH).collect();
        format!("{}...", truncated.trim_end())
    }
}
