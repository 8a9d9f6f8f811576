use quill_core::error::{QuillError, QuillResult};
use quill_core::identity;
use quill_core::{GetConfig, System, UserId};
use quill_db::user_db;

use axum::http::HeaderValue;
use axum::TypedHeader;
use entrait::entrait_export as entrait;
use headers::authorization::Credentials;
use headers::Authorization;
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use uuid::Uuid;

const DEFAULT_SESSION_LENGTH: time::Duration = time::Duration::weeks(2);

#[derive(serde::Serialize, serde::Deserialize)]
struct AuthUserClaims {
    user_id: Uuid,
    /// Standard JWT `exp` claim.
    exp: i64,
}

#[entrait(pub SignUserId)]
fn sign_user_id(deps: &(impl System + GetConfig), user_id: UserId) -> String {
    AuthUserClaims {
        user_id: user_id.0,
        exp: (deps.get_current_time() + DEFAULT_SESSION_LENGTH).unix_timestamp(),
    }
    .sign_with_key(deps.get_jwt_signing_key())
    .expect("HMAC signing should be infallible")
}

/// Marker/Wrapper type for anything authenticated
#[derive(Clone, Copy, Debug)]
pub struct Authenticated<T>(pub T);

#[derive(Clone, Copy, Debug)]
pub struct MaybeAuthenticated<T>(pub Option<T>);

impl<T> From<Authenticated<T>> for MaybeAuthenticated<T> {
    fn from(authenticated: Authenticated<T>) -> Self {
        Self(Some(authenticated.0))
    }
}

impl<T> From<Option<Authenticated<T>>> for MaybeAuthenticated<T> {
    fn from(authenticated: Option<Authenticated<T>>) -> Self {
        match authenticated {
            Some(authenticated) => Self(Some(authenticated.0)),
            None => Self(None),
        }
    }
}

#[entrait(pub Authenticate)]
fn authenticate(
    deps: &(impl System + GetConfig),
    token: Token,
) -> QuillResult<Authenticated<UserId>> {
    let token = token.token();

    let jwt = jwt::Token::<jwt::Header, AuthUserClaims, _>::parse_unverified(token)
        .map_err(|_| QuillError::Unauthorized)?;

    let hmac = deps.get_jwt_signing_key();

    let jwt = jwt
        .verify_with_key(hmac)
        .map_err(|_| QuillError::Unauthorized)?;
    let (_header, claims) = jwt.into();

    if claims.exp < deps.get_current_time().unix_timestamp() {
        return Err(QuillError::Unauthorized);
    }

    Ok(Authenticated(UserId(claims.user_id)))
}

#[entrait(pub OptAuthenticate)]
fn opt_authenticate(
    deps: &impl Authenticate,
    token: Option<Token>,
) -> QuillResult<MaybeAuthenticated<UserId>> {
    Ok(match token {
        Some(token) => deps.authenticate(token)?.into(),
        None => MaybeAuthenticated(None),
    })
}

/// Authenticates the session and additionally requires the account to be
/// the configured site owner. The email check is the only admin authority;
/// there is no role column.
#[entrait(pub AuthenticateAdmin)]
async fn authenticate_admin(
    deps: &(impl Authenticate + user_db::FindUserById + GetConfig),
    token: Token,
) -> QuillResult<Authenticated<UserId>> {
    let Authenticated(user_id) = deps.authenticate(token)?;

    let (user, _) = deps
        .find_user_by_id(user_id)
        .await?
        .ok_or(QuillError::CurrentUserDoesNotExist)?;

    if !identity::is_admin(&user.email, deps.get_admin_identity()) {
        return Err(QuillError::Forbidden);
    }

    Ok(Authenticated(user_id))
}

///
/// Data for `Token` authorization scheme.
///
#[derive(Debug)]
pub struct Token(String);

impl Token {
    pub fn from_token(token: &str) -> Self {
        Self(format!("Token {token}"))
    }

    pub fn token(&self) -> &str {
        &self.0.as_str()["Token ".len()..]
    }
}

impl Credentials for Token {
    const SCHEME: &'static str = "Token";

    fn decode(value: &HeaderValue) -> Option<Self> {
        let auth_header = value.to_str().ok()?;

        Some(Token(auth_header.to_string()))
    }

    fn encode(&self) -> HeaderValue {
        HeaderValue::from_str(&self.0).unwrap()
    }
}

#[async_trait::async_trait]
impl<B: Send> axum::extract::FromRequest<B> for Token {
    type Rejection = QuillError;

    async fn from_request(
        req: &mut axum::extract::RequestParts<B>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(token)) =
            TypedHeader::<Authorization<Token>>::from_request(req)
                .await
                .map_err(|_| QuillError::Unauthorized)?;

        Ok(token)
    }
}
