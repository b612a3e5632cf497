//! Shared fixtures for handler tests: an in-memory store, a frozen clock and
//! signed-in users.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{test::TestRequest, web};
use chrono::FixedOffset;

use crate::auth::{jwt::generate_access_token, password::hash_password};
use crate::config::Config;
use crate::model::{
    role::Role,
    user::{NewUser, User},
};
use crate::routes;
use crate::rules::clock::FixedClock;
use crate::state::AppState;
use crate::store::{MemoryStore, Store};

pub const PASSWORD: &str = "rahasia123";

pub struct TestUser {
    pub user: User,
    pub token: String,
}

pub struct TestContext {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
}

impl TestContext {
    /// Context whose clock reads `local` (`YYYY-MM-DD HH:MM`, UTC+7).
    pub fn at(local: &str) -> Self {
        let config = Config::for_tests();
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).unwrap();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at_local(local, offset));
        let state = AppState::new(config.clone(), store.clone(), clock.clone());
        TestContext {
            config,
            store,
            clock,
            state,
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        self.state.register(cfg);
        routes::configure(cfg, self.config.clone());
    }

    pub async fn user(&self, email: &str, role: Role) -> TestUser {
        let user = self
            .store
            .create_user(NewUser {
                name: format!("Nama {}", email.split('@').next().unwrap_or(email)),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                role,
                position: "Anggota".to_string(),
                region: "Jawa Barat".to_string(),
                institution: "SMAN 1 Bandung".to_string(),
                phone: String::new(),
            })
            .await
            .unwrap();
        self.state.emails.mark_taken(&user.email).await;

        let token = generate_access_token(
            &user.id,
            &user.email,
            user.role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
        .unwrap();
        TestUser { user, token }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    pub fn anon(&self, req: TestRequest) -> TestRequest {
        req.peer_addr(Self::peer())
    }

    fn authed(&self, req: TestRequest, as_user: &TestUser) -> TestRequest {
        self.anon(req)
            .insert_header(("Authorization", format!("Bearer {}", as_user.token)))
    }

    pub fn get(&self, uri: &str, as_user: &TestUser) -> TestRequest {
        self.authed(TestRequest::get().uri(uri), as_user)
    }

    pub fn post(&self, uri: &str, as_user: &TestUser) -> TestRequest {
        self.authed(TestRequest::post().uri(uri), as_user)
    }

    pub fn put(&self, uri: &str, as_user: &TestUser) -> TestRequest {
        self.authed(TestRequest::put().uri(uri), as_user)
    }

    pub fn delete(&self, uri: &str, as_user: &TestUser) -> TestRequest {
        self.authed(TestRequest::delete().uri(uri), as_user)
    }
}
