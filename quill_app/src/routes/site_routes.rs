use quill_core::error::QuillResult;

use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::Json;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitorsBody {
    total_visitors: i64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SettingBody {
    value: Option<String>,
}

pub struct SiteRoutes<D>(std::marker::PhantomData<D>);

impl<D> SiteRoutes<D>
where
    D: quill_site::RecordVisit
        + quill_site::FetchSetting
        + Sized
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/site/visit", post(Self::record_visit))
            .route("/site/settings/:key", get(Self::get_setting))
    }

    async fn record_visit(Extension(deps): Extension<D>) -> QuillResult<Json<VisitorsBody>> {
        Ok(Json(VisitorsBody {
            total_visitors: deps.record_visit().await?,
        }))
    }

    async fn get_setting(
        Extension(deps): Extension<D>,
        Path(key): Path<String>,
    ) -> QuillResult<Json<SettingBody>> {
        Ok(Json(SettingBody {
            value: deps.fetch_setting(&key).await?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    use axum::http::{Request, StatusCode};
    use unimock::*;

    fn test_router(deps: Unimock) -> axum::Router {
        SiteRoutes::<Unimock>::router().layer(Extension(deps))
    }

    #[tokio::test]
    async fn recording_a_visit_returns_the_total() {
        let deps = mock(Some(
            quill_site::record_visit::Fn
                .next_call(matching!())
                .answers(|_| Ok(101))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<VisitorsBody>(
            test_router(deps),
            Request::post("/site/visit").empty_body(),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert_eq!(101, body.total_visitors);
    }

    #[tokio::test]
    async fn missing_setting_reads_as_null() {
        let deps = mock(Some(
            quill_site::fetch_setting::Fn
                .next_call(matching!("announcement"))
                .answers(|_| Ok(None))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<SettingBody>(
            test_router(deps),
            Request::get("/site/settings/announcement").empty_body(),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert_eq!(None, body.value);
    }
}
