#[derive(clap::Parser)]
pub struct Config {
    #[clap(long, env)]
    pub database_url: String,

    #[clap(long, env)]
    pub jwt_signing_key: JwtSigningKey,

    /// Email of the account treated as the site owner. This is the only
    /// admin authority in the system.
    #[clap(long, env)]
    pub admin_email: String,

    /// Name displayed for the site owner, wherever identity is resolved.
    #[clap(long, env)]
    pub admin_name: String,

    #[clap(long, env, default_value = "8080")]
    pub port: u16,
}

#[derive(Clone)]
pub struct JwtSigningKey(pub hmac::Hmac<sha2::Sha384>);

impl std::str::FromStr for JwtSigningKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use hmac::Mac;

        Ok(Self(
            hmac::Hmac::<sha2::Sha384>::new_from_slice(s.as_bytes())
                .map_err(|e| format!("Failed to parse hmac: {e:?}"))?,
        ))
    }
}
