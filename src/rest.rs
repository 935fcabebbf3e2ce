//! HTTP layer: routes, the session gate, and page handlers.
//!
//! Protected routes sit behind `auth_middleware`, which resolves the session
//! cookie on every request and redirects to `/login` when it is missing,
//! forged, expired, revoked, or names a user that no longer exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::auth::{CredentialStore, SessionStore};
use crate::error::{AppError, CredentialError};
use crate::models::Folder;
use crate::query::top_matches;
use crate::recommend::recommendations;
use crate::storage::Dataset;
use crate::views;

pub const SESSION_COOKIE: &str = "session";

/// Everything handlers share. Built once in `main` and injected as state.
pub struct AppState {
    pub dataset: Dataset,
    pub credentials: CredentialStore,
    pub sessions: SessionStore,
    pub folders: HashMap<String, Vec<Folder>>,
}

impl AppState {
    pub fn new(dataset: Dataset, credentials: CredentialStore, sessions: SessionStore) -> Self {
        Self {
            dataset,
            credentials,
            sessions,
            folders: HashMap::new(),
        }
    }

    /// Signed-in username, if the cookie names a live session whose
    /// credential has not been replaced since it was issued.
    fn current_user(&self, jar: &CookieJar) -> Option<String> {
        let token = jar.get(SESSION_COOKIE)?;
        let owner = self.sessions.resolve(token.value())?;
        self.credentials
            .is_current(&owner.username, owner.generation)
            .then_some(owner.username)
    }
}

/// Username of the signed-in caller, inserted by `auth_middleware`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

#[derive(Deserialize)]
pub struct SearchForm {
    pub query: String,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match state.current_user(&jar) {
        Some(username) => {
            req.extensions_mut().insert(CurrentUser(username));
            next.run(req).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/", get(home_handler))
        .route("/search", get(search_page_handler).post(search_handler))
        .route("/recipe/:recipe_id", get(recipe_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/register", get(register_page_handler).post(register_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let recommended = recommendations(&user, &state.credentials, &state.folders);
    views::home(&user, &recommended).into_response()
}

async fn search_page_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    views::search_form(&user).into_response()
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<SearchForm>,
) -> Response {
    let results = top_matches(&form.query, &state.dataset.recipes);
    debug!(user = %user, query = %form.query, shown = results.len(), "recipe search");
    views::search_results(&user, &form.query, &results).into_response()
}

async fn recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(recipe_id): Path<String>,
) -> Response {
    match state.dataset.recipe(&recipe_id) {
        Some(recipe) => {
            let reviews = state.dataset.reviews_for(&recipe_id);
            views::recipe_detail(&user, recipe, reviews).into_response()
        }
        None => {
            debug!(recipe_id = %recipe_id, "recipe not found");
            views::error_page(Some(&user), "Recipe not found").into_response()
        }
    }
}

async fn login_page_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if state.current_user(&jar).is_some() {
        return Redirect::to("/").into_response();
    }
    views::login(None).into_response()
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = form.username.clone();
    let verifier = state.clone();
    let verified = tokio::task::spawn_blocking(move || {
        verifier.credentials.verify(&form.username, &form.password)
    })
    .await?;

    let Some(generation) = verified else {
        warn!(username = %username, "login failed");
        return Ok(views::login(Some("Invalid username or password")).into_response());
    };

    let token = state.sessions.issue(&username, generation)?;
    info!(username = %username, "login succeeded");
    let cookie = session_cookie(token, state.sessions.ttl());
    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

async fn register_page_handler() -> Response {
    views::register(None).into_response()
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = form.username.clone();
    let writer = state.clone();
    let registered =
        tokio::task::spawn_blocking(move || writer.credentials.register(&form.username, &form.password))
            .await?;

    let generation = match registered {
        Ok(generation) => generation,
        Err(CredentialError::PasswordTooLong { max }) => {
            warn!(username = %username, "registration rejected: password too long");
            let message = format!("Password must be at most {max} bytes");
            return Ok(views::register(Some(&message)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // Sessions opened under the old password no longer resolve to a current
    // credential; drop them from the store as well.
    let revoked = state.sessions.revoke_user(&username);
    let token = state.sessions.issue(&username, generation)?;
    info!(username = %username, revoked, "user registered");

    let cookie = session_cookie(token, state.sessions.ttl());
    Ok((jar.add(cookie), Redirect::to("/login")).into_response())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> String {
    format!(
        "ok: {} recipes, {} reviews, {} users",
        state.dataset.recipes.len(),
        state.dataset.reviews.len(),
        state.credentials.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Review;
    use crate::storage::fixtures::recipe;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt; // For .oneshot() testing

    fn test_state() -> AppState {
        let mut recipes = vec![recipe("1", "Chicken Soup", "warming")];
        for i in 2..=9 {
            recipes.push(recipe(&i.to_string(), &format!("Noodle dish {i}"), ""));
        }
        recipes.push(recipe("10", "Toast", "with noodle butter"));

        let reviews = vec![Review {
            recipe_id: "1".to_string(),
            review_id: "r1".to_string(),
            author_name: "Sam".to_string(),
            rating: "5".to_string(),
            review: "Lovely broth".to_string(),
            ..Review::default()
        }];

        let dataset = Dataset::new(recipes.into_iter().collect(), reviews.into_iter().collect());
        let credentials = CredentialStore::with_seed("user", "password", 4).unwrap();
        let sessions = SessionStore::new(b"test-secret", Duration::from_secs(60));
        AppState::new(dataset, credentials, sessions)
    }

    fn test_app() -> Router {
        create_router(test_state())
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).method("GET");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(form.to_string())).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    /// `session=<token>` from the response's Set-Cookie header.
    fn cookie_from(response: &Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn login(app: &Router, form: &str) -> String {
        let response = app
            .clone()
            .oneshot(post_form("/login", form, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        cookie_from(&response)
    }

    fn set_cookie_attributes(response: &Response) -> String {
        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_to_login() {
        let app = test_app();
        for uri in ["/", "/search", "/recipe/1"] {
            let response = app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/login");
        }

        let response = app
            .clone()
            .oneshot(post_form("/search", "query=soup", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_forged_session_cookie_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(get("/", Some("session=eyJhbGciOiJIUzI1NiJ9.e30.bogus")))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_login_with_bad_password_shows_inline_error() {
        let app = test_app();
        let response = app
            .oneshot(post_form("/login", "username=user&password=wrong", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_login_then_home_page() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(post_form("/login", "username=user&password=password", None))
            .await
            .unwrap();
        let attributes = set_cookie_attributes(&response);
        assert!(attributes.contains("Max-Age=60"), "{attributes}");
        assert!(attributes.contains("HttpOnly"));
        assert!(attributes.contains("SameSite=Lax"));
        assert!(attributes.contains("Path=/"));
        let cookie = cookie_from(&response);

        let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Welcome, user"));
        assert!(body.contains("No recommendations yet."));

        // Already signed in: the login page bounces home.
        let response = app.oneshot(get("/login", Some(&cookie))).await.unwrap();
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_search_shows_first_five_matches() {
        let app = test_app();
        let cookie = login(&app, "username=user&password=password").await;

        let response = app
            .clone()
            .oneshot(post_form("/search", "query=NOODLE", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert_eq!(body.matches("href=\"/recipe/").count(), 5);
        for id in 2..=6 {
            assert!(body.contains(&format!("href=\"/recipe/{id}\"")));
        }
        assert!(!body.contains("href=\"/recipe/10\""));

        let response = app.oneshot(get("/search", Some(&cookie))).await.unwrap();
        assert!(body_text(response).await.contains("name=\"query\""));
    }

    #[tokio::test]
    async fn test_empty_search_shows_first_five_recipes() {
        let app = test_app();
        let cookie = login(&app, "username=user&password=password").await;

        let response = app
            .oneshot(post_form("/search", "query=", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert_eq!(body.matches("href=\"/recipe/").count(), 5);
        for id in 1..=5 {
            assert!(body.contains(&format!("href=\"/recipe/{id}\"")));
        }
        assert!(!body.contains("href=\"/recipe/6\""));
    }

    #[tokio::test]
    async fn test_recipe_page_lists_reviews() {
        let app = test_app();
        let cookie = login(&app, "username=user&password=password").await;

        let response = app.oneshot(get("/recipe/1", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Chicken Soup"));
        assert!(body.contains("Lovely broth"));
    }

    #[tokio::test]
    async fn test_register_then_missing_recipe_is_not_found_page() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_form("/register", "username=alice&password=pw1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        let cookie = cookie_from(&response);

        let response = app.clone().oneshot(get("/login", Some(&cookie))).await.unwrap();
        assert_eq!(location(&response), "/");

        let response = app.oneshot(get("/recipe/42", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Recipe not found"));
    }

    #[tokio::test]
    async fn test_reregistration_revokes_old_sessions_and_password() {
        let app = test_app();
        let old_cookie = login(&app, "username=user&password=password").await;

        let response = app
            .clone()
            .oneshot(post_form("/register", "username=user&password=changed", None))
            .await
            .unwrap();
        let new_cookie = cookie_from(&response);

        let response = app.clone().oneshot(get("/", Some(&old_cookie))).await.unwrap();
        assert_eq!(location(&response), "/login");

        let response = app.clone().oneshot(get("/", Some(&new_cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_form("/login", "username=user&password=password", None))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("Invalid username or password"));

        login(&app, "username=user&password=changed").await;
    }

    #[tokio::test]
    async fn test_register_rejects_overlong_password() {
        let app = test_app();
        let form = format!("username=alice&password={}", "a".repeat(80));

        let response = app
            .clone()
            .oneshot(post_form("/register", &form, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response)
            .await
            .contains("Password must be at most 72 bytes"));

        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert!(body_text(response).await.ends_with("1 users"));
    }

    #[test]
    fn test_session_from_replaced_credential_is_not_signed_in() {
        let state = test_state();

        // A login checked the old password, then a registration replaced it
        // before the login issued its session.
        let seen = state.credentials.verify("user", "password").unwrap();
        let current = state.credentials.register("user", "changed").unwrap();
        state.sessions.revoke_user("user");
        let late = state.sessions.issue("user", seen).unwrap();

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, late));
        assert!(state.current_user(&jar).is_none());

        let fresh = state.sessions.issue("user", current).unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, fresh));
        assert_eq!(state.current_user(&jar).as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let app = test_app();
        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok: 10 recipes, 1 reviews, 1 users");
    }
}
