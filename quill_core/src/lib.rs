use entrait::entrait_export as entrait;

pub mod error;
pub mod identity;
pub mod timestamp;

/// Identifier of an authenticated account.
///
/// The generic parameter makes `UserId<Option<Uuid>>` expressible for
/// operations that accept an optional viewer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserId<T = uuid::Uuid>(pub T);

impl UserId {
    pub fn into_id(self) -> uuid::Uuid {
        self.0
    }

    pub fn some(self) -> UserId<Option<uuid::Uuid>> {
        UserId(Some(self.0))
    }
}

#[derive(Clone)]
pub struct PasswordHash(pub String);

///
/// Mockable system abstraction
///
#[entrait]
pub trait System {
    fn get_current_time(&self) -> time::OffsetDateTime;
}

///
/// Mockable config accessor
///
#[entrait]
pub trait GetConfig {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384>;
    fn get_admin_identity(&self) -> &identity::AdminIdentity;
}

/// Reusable unimock clauses for the config/system seams, shared by the
/// unit tests of downstream crates.
pub mod test {
    use super::*;
    use unimock::*;

    pub fn test_admin_identity() -> identity::AdminIdentity {
        identity::AdminIdentity {
            email: "admin@example.com".to_string(),
            display_name: "Site Owner".to_string(),
        }
    }

    pub fn mock_current_time() -> unimock::Clause {
        System__get_current_time
            .each_call(matching!())
            .returns(time::OffsetDateTime::from_unix_timestamp(0).unwrap())
            .in_any_order()
    }

    pub fn mock_jwt_signing_key() -> unimock::Clause {
        use hmac::Mac;

        GetConfig__get_jwt_signing_key
            .each_call(matching!())
            .returns(
                hmac::Hmac::<sha2::Sha384>::new_from_slice("foobar".as_bytes())
                    .expect("HMAC-SHA-384 accepts any key length"),
            )
            .in_any_order()
    }

    pub fn mock_admin_identity() -> unimock::Clause {
        GetConfig__get_admin_identity
            .each_call(matching!())
            .returns(test_admin_identity())
            .in_any_order()
    }

    pub fn mock_system_and_config() -> unimock::Clause {
        [
            mock_current_time(),
            mock_jwt_signing_key(),
            mock_admin_identity(),
        ]
        .into()
    }
}
