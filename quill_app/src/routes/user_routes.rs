use quill_core::error::QuillResult;
use quill_user::auth::Token;

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Json;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct UserBody<T> {
    user: T,
}

pub struct UserRoutes<D>(std::marker::PhantomData<D>);

impl<D> UserRoutes<D>
where
    D: quill_user::RegisterUser
        + quill_user::Login
        + quill_user::FetchCurrentUser
        + quill_user::UpdateUser
        + quill_user::auth::Authenticate
        + Sized
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/users", post(Self::register))
            .route("/users/login", post(Self::login))
            .route("/user", get(Self::current_user).put(Self::update_user))
    }

    async fn register(
        Extension(deps): Extension<D>,
        Json(body): Json<UserBody<quill_user::NewUser>>,
    ) -> QuillResult<Json<UserBody<quill_user::SignedUser>>> {
        Ok(Json(UserBody {
            user: deps.register_user(body.user).await?,
        }))
    }

    async fn login(
        Extension(deps): Extension<D>,
        Json(body): Json<UserBody<quill_user::LoginUser>>,
    ) -> QuillResult<Json<UserBody<quill_user::SignedUser>>> {
        Ok(Json(UserBody {
            user: deps.login(body.user).await?,
        }))
    }

    async fn current_user(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> QuillResult<Json<UserBody<quill_user::SignedUser>>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(UserBody {
            user: deps.fetch_current_user(user_id).await?,
        }))
    }

    async fn update_user(
        Extension(deps): Extension<D>,
        token: Token,
        Json(body): Json<UserBody<quill_user::UserUpdate>>,
    ) -> QuillResult<Json<UserBody<quill_user::SignedUser>>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(UserBody {
            user: deps.update_user(user_id, body.user).await?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use quill_user::SignedUser;

    use axum::http::{Request, StatusCode};
    use unimock::*;

    fn test_router(deps: Unimock) -> axum::Router {
        UserRoutes::<Unimock>::router().layer(Extension(deps))
    }

    fn test_signed_user() -> SignedUser {
        SignedUser {
            email: "reader@example.com".to_string(),
            token: "t0k3n".to_string(),
            name: "Avid Reader".to_string(),
            is_admin: false,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn register_should_return_signed_user() {
        let deps = mock(Some(
            quill_user::register_user::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(test_signed_user()))
                .once()
                .in_order(),
        ));

        let (status, body) = request_json::<UserBody<SignedUser>>(
            test_router(deps),
            Request::post("/users").with_json_body(UserBody {
                user: quill_user::NewUser {
                    email: "reader@example.com".to_string(),
                    password: "password".to_string(),
                    full_name: Some("Avid Reader".to_string()),
                },
            }),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, status);
        assert_eq!("t0k3n", body.user.token);
    }

    #[tokio::test]
    async fn current_user_without_token_should_be_unauthorized() {
        let deps = mock(None::<unimock::Clause>);

        let (status, _) = request(test_router(deps), Request::get("/user").empty_body()).await;

        assert_eq!(StatusCode::UNAUTHORIZED, status);
    }
}
