pub mod app;
pub mod config;
pub mod routes;

#[cfg(test)]
mod test_util;

use app::App;

use axum::extract::Extension;
use entrait::Impl;

pub async fn serve(app: App) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = routes::api_router()
        .layer(Extension(Impl::new(app)))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    tracing::info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}
