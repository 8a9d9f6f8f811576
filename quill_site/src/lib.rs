use quill_core::error::*;
use quill_db::{post_db, site_db};

use entrait::entrait_export as entrait;

/// The headline numbers on the admin dashboard.
#[derive(serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(Debug, Eq, PartialEq))]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_visitors: i64,
    pub total_post_views: i64,
}

/// Counts one site visit and returns the running total. Deduplication of
/// repeat visits within a browsing session is the caller's concern.
#[entrait(pub RecordVisit)]
async fn record_visit(deps: &impl site_db::IncrementVisitors) -> QuillResult<i64> {
    deps.increment_visitors().await
}

#[entrait(pub FetchSiteStats)]
async fn fetch_site_stats(
    deps: &(impl site_db::FetchTotalVisitors + post_db::SumViewCounts),
) -> QuillResult<SiteStats> {
    Ok(SiteStats {
        total_visitors: deps.fetch_total_visitors().await?,
        total_post_views: deps.sum_view_counts().await?,
    })
}

#[entrait(pub FetchSetting)]
async fn fetch_setting(deps: &impl site_db::FindSetting, key: &str) -> QuillResult<Option<String>> {
    deps.find_setting(key).await
}

#[entrait(pub PutSetting)]
async fn put_setting(deps: &impl site_db::UpsertSetting, key: &str, value: &str) -> QuillResult<()> {
    deps.upsert_setting(key, value).await
}
