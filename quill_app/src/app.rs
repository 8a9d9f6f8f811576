use crate::config::Config;
use quill_core::identity::AdminIdentity;
use quill_db::Db;

use entrait::Impl;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub admin_identity: AdminIdentity,
    pub db: Impl<Db>,
}

impl App {
    pub fn new(config: Config, db: Db) -> Self {
        let admin_identity = AdminIdentity {
            email: config.admin_email.clone(),
            display_name: config.admin_name.clone(),
        };

        Self {
            config: Arc::new(config),
            admin_identity,
            db: Impl::new(db),
        }
    }
}

impl quill_core::System for App {
    fn get_current_time(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl quill_core::GetConfig for App {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384> {
        &self.config.jwt_signing_key.0
    }

    fn get_admin_identity(&self) -> &AdminIdentity {
        &self.admin_identity
    }
}

impl quill_db::GetDb for Impl<App> {
    fn get_db(&self) -> &Db {
        &self.db
    }
}
