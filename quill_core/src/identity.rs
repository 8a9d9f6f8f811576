//! The single authority for admin status and display names.
//!
//! Every call site that needs to know "is this the site owner" or "what
//! name do we show for this account" goes through here, with the admin
//! address injected from configuration.

/// The configured identity of the site owner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminIdentity {
    pub email: String,
    pub display_name: String,
}

/// Display identity derived from an account at one point in time.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub name: String,
    pub is_admin: bool,
}

pub fn is_admin(email: &str, admin: &AdminIdentity) -> bool {
    email == admin.email
}

/// Resolve the name shown next to content authored by `email`.
///
/// The admin's configured name always wins, regardless of the account's
/// stored metadata. Otherwise the account's full name, falling back to
/// the local part of the email.
pub fn resolve(email: &str, full_name: Option<&str>, admin: &AdminIdentity) -> ResolvedIdentity {
    if is_admin(email, admin) {
        return ResolvedIdentity {
            name: admin.display_name.clone(),
            is_admin: true,
        };
    }

    let name = full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_owned());

    ResolvedIdentity {
        name,
        is_admin: false,
    }
}
