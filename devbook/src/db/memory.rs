//! In-memory [`Storage`] used by tests.
//!
//! Mirrors the constraints of the PostgreSQL schema that handlers rely on:
//! unique nick and email, cascading deletes, idempotent follows, no self
//! follows, and a like counter that never goes below zero. Every trait call is
//! counted so tests can assert that a request was rejected before touching
//! storage.

use crate::db::{
    errors::{DbError, Result},
    handlers::{posts::PostFilter, users::UserFilter},
    models::{
        posts::{PostCreateDBRequest, PostDBResponse, PostUpdateDBRequest},
        users::{UserCreateDBRequest, UserCredentials, UserDBResponse, UserUpdateDBRequest},
    },
    store::Storage,
};
use crate::types::{PostId, ResourceKind, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredUser {
    name: String,
    nick: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredPost {
    title: String,
    content: String,
    author_id: UserId,
    likes: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, StoredUser>,
    posts: BTreeMap<PostId, StoredPost>,
    // (user_id, follower_id)
    follows: BTreeSet<(UserId, UserId)>,
    // Highest id ever handed out. Never reused, like a BIGSERIAL.
    last_user_id: UserId,
    last_post_id: PostId,
}

impl State {
    fn user_response(&self, id: UserId) -> Result<UserDBResponse> {
        let user = self.users.get(&id).ok_or(DbError::NotFound)?;
        Ok(UserDBResponse {
            id,
            name: user.name.clone(),
            nick: user.nick.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        })
    }

    fn post_response(&self, id: PostId) -> Result<PostDBResponse> {
        let post = self.posts.get(&id).ok_or(DbError::NotFound)?;
        let author_nick = self
            .users
            .get(&post.author_id)
            .map(|u| u.nick.clone())
            .ok_or(DbError::NotFound)?;
        Ok(PostDBResponse {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author_id,
            author_nick,
            likes: post.likes,
            created_at: post.created_at,
        })
    }

    fn check_unique(&self, id: Option<UserId>, nick: &str, email: &str) -> Result<()> {
        for (other_id, other) in &self.users {
            if Some(*other_id) == id {
                continue;
            }
            let constraint = if other.nick == nick {
                "users_nick_key"
            } else if other.email == email {
                "users_email_key"
            } else {
                continue;
            };
            return Err(DbError::UniqueViolation {
                constraint: Some(constraint.to_string()),
                table: Some("users".to_string()),
                message: format!("duplicate key value violates unique constraint \"{constraint}\""),
            });
        }
        Ok(())
    }

    fn require_user(&self, id: UserId, constraint: &str) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(DbError::ForeignKeyViolation {
                constraint: Some(constraint.to_string()),
                table: Some("followers".to_string()),
                message: format!("user {id} does not exist"),
            })
        }
    }

    fn next_user_id(&mut self) -> UserId {
        self.last_user_id += 1;
        self.last_user_id
    }

    fn next_post_id(&mut self) -> PostId {
        self.last_post_id += 1;
        self.last_post_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of [`Storage`] calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Inserts a user under a fixed id, bypassing the call counter.
    pub async fn insert_user_with_id(&self, id: UserId, request: UserCreateDBRequest) {
        let mut state = self.state.lock().await;
        state.last_user_id = state.last_user_id.max(id);
        state.users.insert(
            id,
            StoredUser {
                name: request.name,
                nick: request.nick,
                email: request.email,
                password_hash: request.password_hash,
                created_at: Utc::now(),
            },
        );
    }

    /// Inserts a post under a fixed id, bypassing the call counter.
    pub async fn insert_post_with_id(&self, id: PostId, request: PostCreateDBRequest) {
        let mut state = self.state.lock().await;
        state.last_post_id = state.last_post_id.max(id);
        state.posts.insert(
            id,
            StoredPost {
                title: request.title,
                content: request.content,
                author_id: request.author_id,
                likes: 0,
                created_at: Utc::now(),
            },
        );
    }

    /// Reads the stored hash without counting a call.
    pub async fn password_hash_of(&self, id: UserId) -> Option<String> {
        self.state.lock().await.users.get(&id).map(|u| u.password_hash.clone())
    }

    pub async fn contains_post(&self, id: PostId) -> bool {
        self.state.lock().await.posts.contains_key(&id)
    }

    pub async fn is_following(&self, user_id: UserId, follower_id: UserId) -> bool {
        self.state.lock().await.follows.contains(&(user_id, follower_id))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        self.record();
        let mut state = self.state.lock().await;
        state.check_unique(None, &request.nick, &request.email)?;
        let id = state.next_user_id();
        state.users.insert(
            id,
            StoredUser {
                name: request.name.clone(),
                nick: request.nick.clone(),
                email: request.email.clone(),
                password_hash: request.password_hash.clone(),
                created_at: Utc::now(),
            },
        );
        state.user_response(id)
    }

    async fn get_user(&self, id: UserId) -> Result<UserDBResponse> {
        self.record();
        self.state.lock().await.user_response(id)
    }

    async fn search_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        self.record();
        let state = self.state.lock().await;
        let query = filter.query.as_deref().map(|q| q.trim().to_lowercase()).unwrap_or_default();
        state
            .users
            .iter()
            .filter(|(_, u)| u.name.to_lowercase().contains(&query) || u.nick.to_lowercase().contains(&query))
            .map(|(id, _)| state.user_response(*id))
            .collect()
    }

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        self.record();
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        state.check_unique(Some(id), &request.nick, &request.email)?;
        if let Some(user) = state.users.get_mut(&id) {
            user.name = request.name.clone();
            user.nick = request.nick.clone();
            user.email = request.email.clone();
        }
        state.user_response(id)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.record();
        let mut state = self.state.lock().await;
        state.users.remove(&id).ok_or(DbError::NotFound)?;
        state.posts.retain(|_, p| p.author_id != id);
        state.follows.retain(|(user_id, follower_id)| *user_id != id && *follower_id != id);
        Ok(())
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        self.record();
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(_, u)| u.email == email).map(|(id, u)| UserCredentials {
            id: *id,
            password_hash: u.password_hash.clone(),
        }))
    }

    async fn fetch_password_hash(&self, id: UserId) -> Result<String> {
        self.record();
        let state = self.state.lock().await;
        state.users.get(&id).map(|u| u.password_hash.clone()).ok_or(DbError::NotFound)
    }

    async fn store_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        self.record();
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn follow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        self.record();
        let mut state = self.state.lock().await;
        if user_id == follower_id {
            return Err(DbError::CheckViolation {
                constraint: Some("followers_no_self_follow".to_string()),
                table: Some("followers".to_string()),
                message: "a user cannot follow themselves".to_string(),
            });
        }
        state.require_user(user_id, "followers_user_id_fkey")?;
        state.require_user(follower_id, "followers_follower_id_fkey")?;
        state.follows.insert((user_id, follower_id));
        Ok(())
    }

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        self.record();
        self.state.lock().await.follows.remove(&(user_id, follower_id));
        Ok(())
    }

    async fn followers(&self, user_id: UserId) -> Result<Vec<UserDBResponse>> {
        self.record();
        let state = self.state.lock().await;
        state
            .follows
            .iter()
            .filter(|(followed, _)| *followed == user_id)
            .map(|(_, follower)| state.user_response(*follower))
            .collect()
    }

    async fn following(&self, follower_id: UserId) -> Result<Vec<UserDBResponse>> {
        self.record();
        let state = self.state.lock().await;
        let mut followed: Vec<UserId> = state
            .follows
            .iter()
            .filter(|(_, follower)| *follower == follower_id)
            .map(|(followed, _)| *followed)
            .collect();
        followed.sort_unstable();
        followed.into_iter().map(|id| state.user_response(id)).collect()
    }

    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<PostDBResponse> {
        self.record();
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&request.author_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("posts_author_id_fkey".to_string()),
                table: Some("posts".to_string()),
                message: format!("user {} does not exist", request.author_id),
            });
        }
        let id = state.next_post_id();
        state.posts.insert(
            id,
            StoredPost {
                title: request.title.clone(),
                content: request.content.clone(),
                author_id: request.author_id,
                likes: 0,
                created_at: Utc::now(),
            },
        );
        state.post_response(id)
    }

    async fn get_post(&self, id: PostId) -> Result<PostDBResponse> {
        self.record();
        self.state.lock().await.post_response(id)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostDBResponse>> {
        self.record();
        let state = self.state.lock().await;
        let visible = |author_id: UserId| match *filter {
            PostFilter::Feed(user_id) => author_id == user_id || state.follows.contains(&(author_id, user_id)),
            PostFilter::Author(user_id) => author_id == user_id,
        };
        let mut ids: Vec<(DateTime<Utc>, PostId)> = state
            .posts
            .iter()
            .filter(|(_, p)| visible(p.author_id))
            .map(|(id, p)| (p.created_at, *id))
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.into_iter().map(|(_, id)| state.post_response(id)).collect()
    }

    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<PostDBResponse> {
        self.record();
        let mut state = self.state.lock().await;
        let post = state.posts.get_mut(&id).ok_or(DbError::NotFound)?;
        post.title = request.title.clone();
        post.content = request.content.clone();
        state.post_response(id)
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        self.record();
        self.state.lock().await.posts.remove(&id).map(|_| ()).ok_or(DbError::NotFound)
    }

    async fn like_post(&self, id: PostId) -> Result<()> {
        self.record();
        let mut state = self.state.lock().await;
        let post = state.posts.get_mut(&id).ok_or(DbError::NotFound)?;
        post.likes = post.likes.saturating_add(1);
        Ok(())
    }

    async fn unlike_post(&self, id: PostId) -> Result<()> {
        self.record();
        let mut state = self.state.lock().await;
        let post = state.posts.get_mut(&id).ok_or(DbError::NotFound)?;
        post.likes = post.likes.saturating_sub(1);
        Ok(())
    }

    async fn fetch_owner_of(&self, kind: ResourceKind, id: u64) -> Result<UserId> {
        self.record();
        let state = self.state.lock().await;
        match kind {
            ResourceKind::Post => state.posts.get(&id).map(|p| p.author_id).ok_or(DbError::NotFound),
            ResourceKind::User => state.users.contains_key(&id).then_some(id).ok_or(DbError::NotFound),
        }
    }
}
