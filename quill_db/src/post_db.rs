use crate::DbResultExt;
use crate::GetDb;

use quill_core::error::{QuillError, QuillResult};
use quill_core::timestamp::Timestamptz;

use entrait::entrait_export as entrait;
use futures::TryStreamExt;
use uuid::Uuid;

#[derive(Clone)]
#[cfg_attr(test, derive(Eq, PartialEq, Debug))]
pub struct Post {
    pub post_id: Uuid,
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

#[derive(Default)]
pub struct Filter<'a> {
    pub slug: Option<&'a str>,
    pub tag: Option<&'a str>,
    /// Case-insensitive title substring search.
    pub search: Option<&'a str>,
    pub published_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Default)]
pub struct PostUpdate<'a> {
    pub title: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub content: Option<&'a str>,
    pub published: Option<bool>,
    pub featured_image: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

#[entrait(pub SelectPosts)]
async fn select_posts(deps: &impl GetDb, filter: Filter<'_>) -> QuillResult<Vec<Post>> {
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
                created_at "created_at: Timestamptz"
            FROM blog.post
            WHERE (
                $1::text IS NULL OR slug = $1
            ) AND (
                $2::text IS NULL OR tags @> array[$2]
            ) AND (
                $3::text IS NULL OR title ILIKE '%' || $3 || '%'
            ) AND (
                NOT $4 OR published
            )
            ORDER BY created_at DESC
            LIMIT $5
            OFFSET $6
        "#,
        filter.slug,
        filter.tag,
        filter.search,
        filter.published_only,
        filter.limit.unwrap_or(20),
        filter.offset.unwrap_or(0)
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(posts)
}

#[entrait(pub SelectTrendingPosts)]
async fn select_trending_posts(deps: &impl GetDb, limit: i64) -> QuillResult<Vec<Post>> {
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
                created_at "created_at: Timestamptz"
            FROM blog.post
            WHERE published
            ORDER BY view_count DESC, created_at DESC
            LIMIT $1
        "#,
        limit
    )
    .fetch(&deps.get_db().pg_pool)
    .try_collect::<Vec<_>>()
    .await?;

    Ok(posts)
}

#[entrait(pub InsertPost)]
async fn insert_post(
    deps: &impl GetDb,
    title: &str,
    slug: &str,
    excerpt: &str,
    content: &str,
    published: bool,
    featured_image: Option<&str>,
    tags: &[String],
) -> QuillResult<Post> {
    let post = sqlx::query_as!(
        Post,
        // language=PostgreSQL
        r#"
            INSERT INTO blog.post (title, slug, excerpt, content, published, featured_image, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                post_id,
                title,
                slug,
                excerpt,
                content,
                published,
                featured_image,
                view_count,
                tags,
                created_at "created_at: Timestamptz"
        "#,
        title,
        slug,
        excerpt,
        content,
        published,
        featured_image,
        tags
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await
    .on_constraint("post_slug_key", |_| {
        QuillError::DuplicatePostSlug(slug.to_string())
    })?;

    Ok(post)
}

#[entrait(pub UpdatePost)]
async fn update_post(deps: &impl GetDb, slug: &str, update: PostUpdate<'_>) -> QuillResult<Post> {
    let post = sqlx::query_as!(
        Post,
        // language=PostgreSQL
        r#"
            UPDATE blog.post SET
                title = COALESCE($1, title),
                slug = COALESCE($2, slug),
                excerpt = COALESCE($3, excerpt),
                content = COALESCE($4, content),
                published = COALESCE($5, published),
                featured_image = COALESCE($6, featured_image),
                tags = COALESCE($7, tags)
            WHERE slug = $8
            RETURNING
                post_id,
                title,
                slug,
                excerpt,
                content,
                published,
                featured_image,
                view_count,
                tags,
                created_at "created_at: Timestamptz"
        "#,
        update.title,
        update.slug,
        update.excerpt,
        update.content,
        update.published,
        update.featured_image,
        update.tags,
        slug
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await
    .on_constraint("post_slug_key", |_| {
        QuillError::DuplicatePostSlug(update.slug.unwrap_or(slug).to_string())
    })?;

    post.ok_or(QuillError::PostNotFound)
}

#[entrait(pub DeletePost)]
async fn delete_post(deps: &impl GetDb, slug: &str) -> QuillResult<()> {
    let result = sqlx::query!(r#"DELETE FROM blog.post WHERE slug = $1"#, slug)
        .execute(&deps.get_db().pg_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(QuillError::PostNotFound);
    }

    Ok(())
}

#[entrait(pub IncrementViewCount)]
async fn increment_view_count(deps: &impl GetDb, slug: &str) -> QuillResult<i64> {
    sqlx::query_scalar!(
        r#"UPDATE blog.post SET view_count = view_count + 1 WHERE slug = $1 RETURNING view_count"#,
        slug
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?
    .ok_or(QuillError::PostNotFound)
}

#[entrait(pub SumViewCounts)]
async fn sum_view_counts(deps: &impl GetDb) -> QuillResult<i64> {
    let total = sqlx::query_scalar!(
        r#"SELECT COALESCE(SUM(view_count), 0)::bigint "total!" FROM blog.post"#
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await?;

    Ok(total)
}
