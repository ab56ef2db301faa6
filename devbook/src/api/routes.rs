//! The route table.
//!
//! Every endpoint is declared once, together with whether it needs an
//! authenticated caller. [`build_api_router`] wraps exactly the routes marked
//! `requires_auth` in the authentication gate.

use axum::{
    Router,
    http::Method,
    middleware::from_fn_with_state,
    routing::{MethodRouter, delete, get, post, put},
};

use crate::{
    AppState,
    api::handlers::{auth, follows, posts, users},
    auth::middleware::require_authentication,
};

pub struct Route {
    pub path: &'static str,
    pub method: Method,
    pub handler: MethodRouter<AppState>,
    pub requires_auth: bool,
}

impl Route {
    fn public(method: Method, path: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            path,
            method,
            handler,
            requires_auth: false,
        }
    }

    fn protected(method: Method, path: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            path,
            method,
            handler,
            requires_auth: true,
        }
    }
}

pub fn routes() -> Vec<Route> {
    vec![
        // Users
        Route::public(Method::POST, "/users", post(users::create_user)),
        Route::protected(Method::GET, "/users", get(users::list_users)),
        Route::protected(Method::GET, "/users/{id}", get(users::get_user)),
        Route::protected(Method::PUT, "/users/{id}", put(users::update_user)),
        Route::protected(Method::DELETE, "/users/{id}", delete(users::delete_user)),
        Route::protected(Method::POST, "/users/{id}/follow", post(follows::follow_user)),
        Route::protected(Method::POST, "/users/{id}/unfollow", post(follows::unfollow_user)),
        Route::protected(Method::GET, "/users/{id}/followers", get(follows::list_followers)),
        Route::protected(Method::GET, "/users/{id}/following", get(follows::list_following)),
        Route::protected(Method::POST, "/users/{id}/password", post(auth::change_password)),
        Route::protected(Method::GET, "/users/{id}/posts", get(posts::list_user_posts)),
        // Login
        Route::public(Method::POST, "/login", post(auth::login)),
        // Posts
        Route::protected(Method::POST, "/posts", post(posts::create_post)),
        Route::protected(Method::GET, "/posts", get(posts::list_feed)),
        Route::protected(Method::GET, "/posts/{id}", get(posts::get_post)),
        Route::protected(Method::PUT, "/posts/{id}", put(posts::update_post)),
        Route::protected(Method::DELETE, "/posts/{id}", delete(posts::delete_post)),
        Route::protected(Method::POST, "/posts/{id}/like", post(posts::like_post)),
        Route::protected(Method::POST, "/posts/{id}/unlike", post(posts::unlike_post)),
    ]
}

/// Registers every route in [`routes`] exactly once.
pub fn build_api_router(state: &AppState) -> Router<AppState> {
    routes().into_iter().fold(Router::new(), |router, route| {
        let handler = if route.requires_auth {
            route.handler.route_layer(from_fn_with_state(state.clone(), require_authentication))
        } else {
            route.handler
        };
        router.route(route.path, handler)
    })
}
