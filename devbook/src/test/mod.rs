//! End-to-end HTTP tests against the full router and an in-memory store.

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};

use crate::{
    AppState,
    api::{
        models::{auth::AuthResponse, posts::PostResponse, users::UserResponse},
        routes::routes,
    },
    build_router,
    db::{memory::MemoryStorage, store::Storage},
    test_utils::{create_test_state, seed_post, seed_user},
    types::UserId,
};

fn test_server() -> (TestServer, AppState, Arc<MemoryStorage>) {
    let (state, storage) = create_test_state();
    let router = build_router(state.clone()).expect("build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state, storage)
}

fn token_for(state: &AppState, user_id: UserId) -> String {
    state.tokens.issue(user_id).expect("issue token")
}

fn concrete_path(path: &str) -> String {
    path.replace("{id}", "1")
}

#[test_log::test(tokio::test)]
async fn test_protected_routes_reject_anonymous_callers() {
    let (server, _, storage) = test_server();
    seed_user(&storage, 1, "one", "password-one").await;

    for route in routes().into_iter().filter(|r| r.requires_auth) {
        let path = concrete_path(route.path);

        let response = server.method(route.method.clone(), &path).await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "{} {} without a credential",
            route.method,
            path
        );

        let response = server.method(route.method.clone(), &path).authorization_bearer("not-a-token").await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "{} {} with a garbage credential",
            route.method,
            path
        );
    }

    // Rejected before any handler touched storage
    assert_eq!(storage.calls(), 0);
}

#[tokio::test]
async fn test_public_routes_accept_anonymous_callers() {
    let (server, _, _) = test_server();

    for route in routes().into_iter().filter(|r| !r.requires_auth) {
        let path = concrete_path(route.path);
        // No body, so the handler's own extractors reject the request
        let response = server.method(route.method.clone(), &path).await;
        assert_ne!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "{} {} should be public",
            route.method,
            path
        );
    }

    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn test_expired_credential_rejected() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;

    let expired = state.tokens.issue_at(100, Utc::now() - TimeDelta::hours(7)).unwrap();
    let response = server.get("/users/100").authorization_bearer(&expired).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let fresh = token_for(&state, 100);
    server.get("/users/100").authorization_bearer(&fresh).await.assert_status_ok();
}

#[tokio::test]
async fn test_authorization_scheme_is_not_validated() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    let token = token_for(&state, 100);

    let response = server
        .get("/users/100")
        .add_header(header::AUTHORIZATION, HeaderValue::from_str(&format!("Token {token}")).unwrap())
        .await;
    response.assert_status_ok();

    // A bare credential without a scheme is not two parts
    let response = server
        .get("/users/100")
        .add_header(header::AUTHORIZATION, HeaderValue::from_str(&token).unwrap())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_delete_post_owned_by_another_user_is_forbidden() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    seed_user(&storage, 200, "two-hundred", "password-200").await;
    seed_post(&storage, 55, 200, "not yours").await;

    let response = server.delete("/posts/55").authorization_bearer(&token_for(&state, 100)).await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    // The owner is not revealed
    assert!(!body["error"].as_str().unwrap().contains("200"));
    assert!(storage.contains_post(55).await);
}

#[tokio::test]
async fn test_delete_own_post() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    seed_post(&storage, 55, 100, "mine").await;

    let response = server.delete("/posts/55").authorization_bearer(&token_for(&state, 100)).await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(!storage.contains_post(55).await);
}

#[tokio::test]
async fn test_update_post_ownership() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    seed_user(&storage, 200, "two-hundred", "password-200").await;
    seed_post(&storage, 55, 200, "original").await;

    let update = json!({"title": "hijacked", "content": "hijacked"});
    server
        .put("/posts/55")
        .authorization_bearer(&token_for(&state, 100))
        .json(&update)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(storage.get_post(55).await.unwrap().title, "original");

    let update = json!({"title": " edited ", "content": "new content"});
    server
        .put("/posts/55")
        .authorization_bearer(&token_for(&state, 200))
        .json(&update)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(storage.get_post(55).await.unwrap().title, "edited");
}

#[tokio::test]
async fn test_mutating_missing_post_is_not_found() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    let token = token_for(&state, 100);

    server
        .delete("/posts/999")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .put("/posts/999")
        .authorization_bearer(&token)
        .json(&json!({"title": "t", "content": "c"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;

    let response = server.get("/posts/abc").authorization_bearer(&token_for(&state, 100)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_update_and_delete_ownership() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 100, "hundred", "password-100").await;
    seed_user(&storage, 200, "two-hundred", "password-200").await;
    let token = token_for(&state, 100);
    let update = json!({"name": "New Name", "nick": "renamed", "email": "renamed@example.com"});

    server
        .put("/users/200")
        .authorization_bearer(&token)
        .json(&update)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete("/users/200")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete("/users/999")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .put("/users/100")
        .authorization_bearer(&token)
        .json(&update)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let user: UserResponse = server.get("/users/100").authorization_bearer(&token).await.json();
    assert_eq!(user.nick, "renamed");

    server
        .delete("/users/100")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(storage.get_user(100).await.is_err());
}

#[tokio::test]
async fn test_follow_self_rejected_without_storage_access() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 7, "seven", "password-seven").await;
    let token = token_for(&state, 7);
    let calls_before = storage.calls();

    server
        .post("/users/7/follow")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .post("/users/7/unfollow")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(storage.calls(), calls_before);
    assert!(!storage.is_following(7, 7).await);
}

#[tokio::test]
async fn test_follow_flow() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 1, "ada", "password-ada").await;
    seed_user(&storage, 2, "bob", "password-bob").await;
    seed_post(&storage, 10, 2, "bob writes").await;
    let ada = token_for(&state, 1);

    server
        .post("/users/2/follow")
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    // Idempotent
    server
        .post("/users/2/follow")
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let followers: Vec<UserResponse> = server.get("/users/2/followers").authorization_bearer(&ada).await.json();
    assert_eq!(followers.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1]);

    let following: Vec<UserResponse> = server.get("/users/1/following").authorization_bearer(&ada).await.json();
    assert_eq!(following.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

    let feed: Vec<PostResponse> = server.get("/posts").authorization_bearer(&ada).await.json();
    assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![10]);

    server
        .post("/users/2/unfollow")
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let feed: Vec<PostResponse> = server.get("/posts").authorization_bearer(&ada).await.json();
    assert!(feed.is_empty());

    // Following a user that does not exist
    server
        .post("/users/99/follow")
        .authorization_bearer(&ada)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_registration_and_login_flow() {
    let (server, _, _) = test_server();

    let response = server
        .post("/users")
        .json(&json!({
            "name": " Ada Lovelace ",
            "nick": "ada",
            "email": "ada@example.com",
            "password": "analytical-engine"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["name"], "Ada Lovelace");
    assert!(body.get("password").is_none());
    let user_id = body["id"].as_u64().unwrap();

    let wrong_password = server
        .post("/login")
        .json(&json!({"email": "ada@example.com", "password": "difference-engine"}))
        .await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);

    let unknown_email = server
        .post("/login")
        .json(&json!({"email": "nobody@example.com", "password": "analytical-engine"}))
        .await;
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());

    let response = server
        .post("/login")
        .json(&json!({"email": "ada@example.com", "password": "analytical-engine"}))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let auth: AuthResponse = response.json();
    assert_eq!(auth.id, user_id.to_string());

    let me: UserResponse = server
        .get(&format!("/users/{user_id}"))
        .authorization_bearer(&auth.token)
        .await
        .json();
    assert_eq!(me.nick, "ada");

    let found: Vec<UserResponse> = server
        .get("/users")
        .add_query_param("user", "LOVE")
        .authorization_bearer(&auth.token)
        .await
        .json();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_registration_validation() {
    let (server, _, _) = test_server();
    let valid = json!({"name": "Ada", "nick": "ada", "email": "ada@example.com", "password": "analytical-engine"});

    let mut bad_email = valid.clone();
    bad_email["email"] = json!("not-an-email");
    server.post("/users").json(&bad_email).await.assert_status(StatusCode::BAD_REQUEST);

    let mut short_password = valid.clone();
    short_password["password"] = json!("short");
    server
        .post("/users")
        .json(&short_password)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let mut blank_name = valid.clone();
    blank_name["name"] = json!("   ");
    server.post("/users").json(&blank_name).await.assert_status(StatusCode::BAD_REQUEST);

    server.post("/users").json(&valid).await.assert_status(StatusCode::CREATED);

    let mut same_nick = valid.clone();
    same_nick["email"] = json!("other@example.com");
    let response = server.post("/users").json(&same_nick).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "This nick is already taken");
}

#[test_log::test(tokio::test)]
async fn test_change_password_flow() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 42, "fortytwo", "old-password").await;
    seed_user(&storage, 43, "fortythree", "other-password").await;
    let token = token_for(&state, 42);

    // Someone else's password
    server
        .post("/users/43/password")
        .authorization_bearer(&token)
        .json(&json!({"old_password": "other-password", "new_password": "stolen-password"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .post("/users/42/password")
        .authorization_bearer(&token)
        .json(&json!({"old_password": "wrong-password", "new_password": "new-password"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/users/42/password")
        .authorization_bearer(&token)
        .json(&json!({"old_password": "old-password", "new_password": "new-password"}))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .post("/login")
        .json(&json!({"email": "fortytwo@example.com", "password": "old-password"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/login")
        .json(&json!({"email": "fortytwo@example.com", "password": "new-password"}))
        .await
        .assert_status(StatusCode::ACCEPTED);

    // Credentials issued before the change stay valid until they expire
    server.get("/users/42").authorization_bearer(&token).await.assert_status_ok();
}

#[tokio::test]
async fn test_posts_and_likes() {
    let (server, state, storage) = test_server();
    seed_user(&storage, 1, "ada", "password-ada").await;
    let token = token_for(&state, 1);

    let response = server
        .post("/posts")
        .authorization_bearer(&token)
        .json(&json!({"title": "Hello", "content": "First post"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let post: PostResponse = response.json();
    assert_eq!(post.author_id, 1);
    assert_eq!(post.author_nick, "ada");
    assert_eq!(post.likes, 0);

    let path = format!("/posts/{}", post.id);
    server
        .post(&format!("{path}/like"))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let liked: PostResponse = server.get(&path).authorization_bearer(&token).await.json();
    assert_eq!(liked.likes, 1);

    for _ in 0..3 {
        server
            .post(&format!("{path}/unlike"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    let unliked: PostResponse = server.get(&path).authorization_bearer(&token).await.json();
    assert_eq!(unliked.likes, 0);

    let by_author: Vec<PostResponse> = server.get("/users/1/posts").authorization_bearer(&token).await.json();
    assert_eq!(by_author.len(), 1);

    server
        .post("/posts/999/like")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/posts")
        .authorization_bearer(&token)
        .json(&json!({"title": "  ", "content": "no title"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
