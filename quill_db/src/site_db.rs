use crate::GetDb;

use quill_core::error::QuillResult;

use entrait::entrait_export as entrait;

#[entrait(pub UpsertSetting)]
async fn upsert_setting(deps: &impl GetDb, key: &str, value: &str) -> QuillResult<()> {
    sqlx::query!(
        // language=PostgreSQL
        r#"
            INSERT INTO blog.setting (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = now()
        "#,
        key,
        value
    )
    .execute(&deps.get_db().pg_pool)
    .await?;

    Ok(())
}

#[entrait(pub FindSetting)]
async fn find_setting(deps: &impl GetDb, key: &str) -> QuillResult<Option<String>> {
    let value = sqlx::query_scalar!(r#"SELECT value FROM blog.setting WHERE key = $1"#, key)
        .fetch_optional(&deps.get_db().pg_pool)
        .await?;

    Ok(value)
}

#[entrait(pub IncrementVisitors)]
async fn increment_visitors(deps: &impl GetDb) -> QuillResult<i64> {
    let total = sqlx::query_scalar!(
        r#"
            UPDATE blog.site_stats
            SET total_visitors = total_visitors + 1, updated_at = now()
            WHERE id = 1
            RETURNING total_visitors
        "#
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await?;

    Ok(total)
}

#[entrait(pub FetchTotalVisitors)]
async fn fetch_total_visitors(deps: &impl GetDb) -> QuillResult<i64> {
    let total = sqlx::query_scalar!(r#"SELECT total_visitors FROM blog.site_stats WHERE id = 1"#)
        .fetch_one(&deps.get_db().pg_pool)
        .await?;

    Ok(total)
}
