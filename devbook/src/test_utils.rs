//! Test utilities (available with the `test-utils` feature).
//!
//! Everything here runs against [`MemoryStorage`], so no database is needed.

use std::sync::Arc;

use crate::{
    AppState,
    auth::{
        password::{Argon2Params, hash_password},
        token::TokenCodec,
    },
    config::{AuthConfig, Config, PasswordConfig},
    db::{
        memory::MemoryStorage,
        models::{posts::PostCreateDBRequest, users::UserCreateDBRequest},
    },
    types::{PostId, UserId},
};

pub const TEST_SECRET: &str = "test-secret-key-for-devbook";

/// Password rules with cheap Argon2 parameters
pub fn test_password_config() -> PasswordConfig {
    PasswordConfig {
        min_length: 8,
        max_length: 64,
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some(TEST_SECRET.to_string()),
        auth: AuthConfig {
            password: test_password_config(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// App state over a fresh in-memory store. The store is returned as well so
/// tests can seed it and inspect it.
pub fn create_test_state() -> (AppState, Arc<MemoryStorage>) {
    let config = create_test_config();
    let storage = Arc::new(MemoryStorage::new());
    let tokens = TokenCodec::new(TEST_SECRET, config.auth.token_expiry);

    let state = AppState::builder()
        .db(storage.clone())
        .config(config)
        .tokens(Arc::new(tokens))
        .build();

    (state, storage)
}

/// Inserts a user with a fixed id and a real password hash. The email is
/// `<nick>@example.com`.
pub async fn seed_user(storage: &MemoryStorage, id: UserId, nick: &str, password: &str) {
    let password_hash = hash_password(password, Argon2Params::from(&test_password_config())).expect("hash test password");
    storage
        .insert_user_with_id(
            id,
            UserCreateDBRequest {
                name: nick.to_string(),
                nick: nick.to_string(),
                email: format!("{nick}@example.com"),
                password_hash,
            },
        )
        .await;
}

pub async fn seed_post(storage: &MemoryStorage, id: PostId, author_id: UserId, title: &str) {
    storage
        .insert_post_with_id(
            id,
            PostCreateDBRequest {
                title: title.to_string(),
                content: format!("{title} content"),
                author_id,
            },
        )
        .await;
}
