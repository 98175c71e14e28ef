#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use quizdeck_api::{
    config::{Config, SessionConfig},
    create_router,
    models::{Catalog, Puzzle, VisitorSession},
    services::{
        session_service::SessionKey,
        session_store::{MemorySessionStore, SessionStore},
        AppState,
    },
};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        app_env: "test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        secret_key: TEST_SECRET.to_string(),
        session: SessionConfig::default(),
        redis_uri: None,
    }
}

/// Router plus a tiny cookie-carrying client, acting as one browser.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemorySessionStore>,
    pub cookie: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = Arc::new(MemorySessionStore::new());
    let app_state = Arc::new(
        AppState::with_store(test_config(), store.clone())
            .expect("Failed to initialize test app state"),
    );

    TestApp {
        router: create_router(app_state),
        store,
        cookie: None,
    }
}

impl TestApp {
    /// Another browser sharing the same server and store.
    pub fn new_visitor(&self) -> TestApp {
        TestApp {
            router: self.router.clone(),
            store: self.store.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POSTs a form and follows the redirect like a browser would.
    pub async fn submit(&mut self, uri: &str, form: &str) -> TestResponse {
        let response = self.post_form(uri, form).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "body: {}", response.body);

        let location = response
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("redirect without location")
            .to_string();
        self.get(&location).await
    }

    /// Reads back what the server stored for this visitor.
    pub async fn session(&self) -> VisitorSession {
        let cookie = self.cookie.as_ref().expect("no session cookie yet");
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, cookie.parse().unwrap());

        let jar: SignedCookieJar =
            SignedCookieJar::from_headers(&headers, SessionKey::from_secret(TEST_SECRET).into());
        let id = jar
            .get("quiz_session")
            .expect("session cookie failed verification")
            .value()
            .to_string();

        let payload = self
            .store
            .load(&id)
            .await
            .unwrap()
            .expect("session missing from store");
        serde_json::from_str(&payload).unwrap()
    }

    /// The puzzle currently shown to this visitor.
    pub async fn current_puzzle(&self) -> Puzzle {
        let state = self.session().await.puzzle.expect("no puzzle state");
        let catalog = Catalog::builtin().unwrap();
        catalog.puzzles()[state.current()].clone()
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).to_string(),
        }
    }
}
