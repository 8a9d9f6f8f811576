mod admin_routes;
mod comment_routes;
mod post_routes;
mod site_routes;
mod user_routes;

use crate::app::App;

use axum::routing::Router;
use entrait::Impl;

/// Axum API router for the real app.
pub fn api_router() -> axum::Router {
    Router::new().nest(
        "/api",
        Router::new()
            .merge(user_routes::UserRoutes::<Impl<App>>::router())
            .merge(post_routes::PostRoutes::<Impl<App>>::router())
            .merge(comment_routes::CommentRoutes::<Impl<App>>::router())
            .merge(admin_routes::AdminRoutes::<Impl<App>>::router())
            .merge(site_routes::SiteRoutes::<Impl<App>>::router()),
    )
}
