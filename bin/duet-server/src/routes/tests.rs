//! Router-level tests: the full middleware stack against an in-memory SQLite
//! store, with the session cookie carried by hand.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use duet_core::store::{ListOrder, SqliteStore};
use duet_core::{AccessConfig, Account, MessageStore, Role};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::config::Config;
use crate::middleware::{NOINDEX, X_ROBOTS_TAG};
use crate::state::AppState;
use crate::views::Views;

const TOKEN: &str = "s3cret";

fn config(order: ListOrder) -> Config {
    Config {
        port: 5000,
        database_url: None,
        sqlite_path: "unused.db".into(),
        db_max_connections: 1,
        access_file: "unused.toml".into(),
        log_order: order,
        secure_cookies: false,
        session_idle_minutes: 30,
        log_level: "info".into(),
        log_json: false,
    }
}

fn credential_access() -> AccessConfig {
    AccessConfig::credential([
        (
            "asher".to_owned(),
            Account {
                password: "pw-asher".into(),
                role: Role::Harrow,
            },
        ),
        (
            "param".to_owned(),
            Account {
                password: "pw-param".into(),
                role: Role::Maparam,
            },
        ),
    ])
    .unwrap()
}

fn token_access() -> AccessConfig {
    AccessConfig::token(TOKEN).unwrap()
}

/// Minimal browser: one router, one cookie jar slot.
struct Client {
    app: Router,
    store: Arc<dyn MessageStore>,
    cookie: Option<String>,
}

impl Client {
    async fn new(access: AccessConfig) -> Self {
        Self::with_order(access, ListOrder::Ascending).await
    }

    async fn with_order(access: AccessConfig, order: ListOrder) -> Self {
        let sqlite = SqliteStore::in_memory().await.expect("in-memory sqlite");
        sqlite.init_schema().await.expect("schema");
        let store: Arc<dyn MessageStore> = Arc::new(sqlite);
        let state = Arc::new(AppState {
            config: Arc::new(config(order)),
            access: Arc::new(access),
            store: Arc::clone(&store),
            views: Arc::new(Views::new().expect("views")),
        });
        Self {
            app: super::build(state),
            store,
            cookie: None,
        }
    }

    async fn send(&mut self, mut req: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let resp = self.app.clone().oneshot(req).await.unwrap();
        if let Some(set) = resp.headers().get(header::SET_COOKIE) {
            let set = set.to_str().unwrap();
            if set.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = set.split(';').next().map(str::to_owned);
            }
        }
        resp
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&mut self, uri: &str, body: &str) -> Response {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap();
        self.send(req).await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response {
        self.post_form("/login", &format!("username={username}&password={password}"))
            .await
    }

    async fn messages(&self) -> Vec<duet_core::Message> {
        self.store.list(ListOrder::Ascending).await.unwrap()
    }
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// ── Shared behaviour ──────────────────────────────────────────────────────────

#[tokio::test]
async fn robots_is_public_and_exact() {
    for access in [credential_access(), token_access()] {
        let mut client = Client::new(access).await;
        let resp = client.get("/robots.txt").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(resp.headers().get(X_ROBOTS_TAG).unwrap(), NOINDEX);
        assert_eq!(body_text(resp).await, "User-agent: *\nDisallow: /\n");
    }
}

#[tokio::test]
async fn health_is_public_and_follows_the_store() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(r#""status":"ok""#), "{body}");
    assert!(body.contains(r#""backend":"sqlite""#), "{body}");

    client.store.close().await;
    let resp = client.get("/health").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(resp).await.contains(r#""status":"unavailable""#));
}

#[tokio::test]
async fn session_cookie_expires_when_idle() {
    let mut client = Client::new(credential_access()).await;
    let resp = client.login("asher", "pw-asher").await;
    let set = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set.contains("Max-Age="), "{set}");
    assert!(!set.contains("Max-Age=0"), "{set}");
}

#[tokio::test]
async fn noindex_header_is_on_denials_too() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get("/log").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers().get(X_ROBOTS_TAG).unwrap(), NOINDEX);

    let mut client = Client::new(credential_access()).await;
    let resp = client.get("/log").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(X_ROBOTS_TAG).unwrap(), NOINDEX);
}

// ── Credential policy ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthenticated_requests_redirect_to_login() {
    let mut client = Client::new(credential_access()).await;
    for path in ["/", "/send", "/log", "/gallery", "/no-such-page"] {
        let resp = client.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/login", "{path}");
    }
}

#[tokio::test]
async fn unauthenticated_post_never_reaches_store() {
    let mut client = Client::new(credential_access()).await;
    let resp = client.post_form("/send", "content=sneaky").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert!(client.messages().await.is_empty());
}

#[tokio::test]
async fn login_page_is_public() {
    let mut client = Client::new(credential_access()).await;
    let resp = client.get("/login").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("password"));
}

#[tokio::test]
async fn login_send_and_read_log() {
    let mut client = Client::new(credential_access()).await;

    let resp = client.login("asher", "pw-asher").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/send");

    let resp = client.get("/send").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("textarea"));

    let resp = client.post_form("/send", "content=hello+world").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/log");

    let messages = client.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Role::Harrow);
    assert_eq!(messages[0].content, "hello world");
    assert!(!messages[0].created_at.is_empty());

    let resp = client.get("/log").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("hello world"));
    assert!(body.contains(r#"<span class="sender">H</span>"#));
}

#[tokio::test]
async fn role_comes_from_account() {
    let mut client = Client::new(credential_access()).await;
    client.login("param", "pw-param").await;
    client.post_form("/send", "content=line+one%0Aline+two").await;
    let messages = client.messages().await;
    assert_eq!(messages[0].sender, Role::Maparam);
    assert_eq!(messages[0].content, "line one line two");
}

#[tokio::test]
async fn oversized_message_is_rejected() {
    let mut client = Client::new(credential_access()).await;
    client.login("asher", "pw-asher").await;
    client.post_form("/send", "content=kept").await;

    let before = client.get("/log").await;
    let before = body_text(before).await;

    let resp = client
        .post_form("/send", &format!("content={}", "a".repeat(300)))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.messages().await.len(), 1);

    let after = body_text(client.get("/log").await).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let mut client = Client::new(credential_access()).await;
    client.login("asher", "pw-asher").await;
    for body in ["content=", "content=+++%0D%0A+", ""] {
        let resp = client.post_form("/send", body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body:?}");
    }
    assert!(client.messages().await.is_empty());
}

#[tokio::test]
async fn failed_login_rerenders_form() {
    let mut client = Client::new(credential_access()).await;
    let resp = client.login("asher", "wrong").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Wrong username or password."));

    let resp = client.get("/send").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let mut client = Client::new(credential_access()).await;
    client.login("asher", "pw-asher").await;
    assert_eq!(client.get("/send").await.status(), StatusCode::OK);

    let resp = client.get("/logout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let resp = client.get("/send").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn gallery_needs_login_and_select_is_absent() {
    let mut client = Client::new(credential_access()).await;
    client.login("asher", "pw-asher").await;
    assert_eq!(client.get("/gallery").await.status(), StatusCode::OK);
    assert_eq!(client.get("/select").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn log_reads_are_stable() {
    let mut client = Client::new(credential_access()).await;
    client.login("asher", "pw-asher").await;
    client.post_form("/send", "content=one").await;
    client.post_form("/send", "content=two").await;

    let first = body_text(client.get("/log").await).await;
    let second = body_text(client.get("/log").await).await;
    assert_eq!(first, second);
    assert!(first.find("one").unwrap() < first.find("two").unwrap());
}

#[tokio::test]
async fn descending_order_is_opt_in() {
    let mut client = Client::with_order(credential_access(), ListOrder::Descending).await;
    client.login("asher", "pw-asher").await;
    client.post_form("/send", "content=older").await;
    client.post_form("/send", "content=newer").await;

    let body = body_text(client.get("/log").await).await;
    assert!(body.find("newer").unwrap() < body.find("older").unwrap());
}

// ── Token policy ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_wrong_token_is_forbidden() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get("/select").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_text(resp).await.contains("access token"));

    let resp = client.get("/select?token=guess").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client.post_form("/send?token=guess", "content=hi").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(client.messages().await.is_empty());
}

#[tokio::test]
async fn select_role_then_compose() {
    let mut client = Client::new(token_access()).await;

    let resp = client.get(&format!("/select?user=H&token={TOKEN}")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/send?token={TOKEN}"));

    // The token is remembered, so plain URLs work from here on.
    let resp = client.get("/send").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("textarea"));

    client.post_form("/send", "content=hello").await;
    let messages = client.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Role::Harrow);
}

#[tokio::test]
async fn select_by_form_post() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get(&format!("/select?token={TOKEN}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let picker = body_text(resp).await;
    assert!(picker.contains(r#"name="user" value="H""#), "{picker}");
    assert!(picker.contains(r#"name="user" value="M""#), "{picker}");
    // The form posts back with the token carried along.
    assert!(picker.contains(&format!("select?token={TOKEN}")), "{picker}");

    let resp = client.post_form("/select", "user=M").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/send?token={TOKEN}"));

    client.post_form("/send", "content=from+m").await;
    assert_eq!(client.messages().await[0].sender, Role::Maparam);
}

#[tokio::test]
async fn invalid_role_is_rejected_and_role_stays_unset() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get(&format!("/select?user=X&token={TOKEN}")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client.post_form("/select", "user=h").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client.get("/send").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/select?token={TOKEN}"));
}

#[tokio::test]
async fn views_without_role_redirect_to_select() {
    let mut client = Client::new(token_access()).await;
    for path in ["/send", "/log"] {
        let resp = client.get(&format!("{path}?token={TOKEN}")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), format!("/select?token={TOKEN}"));
    }
    let resp = client.post_form("/send", "content=no+role").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(client.messages().await.is_empty());
}

#[tokio::test]
async fn home_goes_to_select_with_token() {
    let mut client = Client::new(token_access()).await;
    let resp = client.get(&format!("/?token={TOKEN}")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/select?token={TOKEN}"));
}

#[tokio::test]
async fn wrong_token_clears_remembered_one() {
    let mut client = Client::new(token_access()).await;
    client.get(&format!("/select?user=M&token={TOKEN}")).await;
    assert_eq!(client.get("/log").await.status(), StatusCode::OK);

    let resp = client.get("/log?token=stale").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client.get("/log").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn repeated_wrong_token_is_refused_despite_session() {
    let mut client = Client::new(token_access()).await;
    client.get(&format!("/select?user=M&token={TOKEN}")).await;
    assert_eq!(client.get("/log").await.status(), StatusCode::OK);

    let resp = client.get("/log?token=wrong&token=wrong").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(client.get("/log").await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn repeated_good_token_is_accepted() {
    let mut client = Client::new(token_access()).await;
    let resp = client
        .get(&format!("/select?token={TOKEN}&token={TOKEN}"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_logout_returns_to_select_and_forgets_token() {
    let mut client = Client::new(token_access()).await;
    client.get(&format!("/select?user=H&token={TOKEN}")).await;
    assert_eq!(client.get("/send").await.status(), StatusCode::OK);

    let resp = client.get("/logout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/select");

    let resp = client.get("/send").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_route_absent_under_token_policy() {
    let mut client = Client::new(token_access()).await;
    assert_eq!(client.get("/login").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        client.get(&format!("/login?token={TOKEN}")).await.status(),
        StatusCode::NOT_FOUND
    );
}
