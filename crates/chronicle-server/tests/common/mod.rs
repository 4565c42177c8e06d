use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chronicle_api::{AppState, AppStateInner};
use chronicle_db::Database;
use chronicle_gateway::ChatHub;
use chronicle_server::app;
use chronicle_server::config::Config;
use chronicle_server::pipeline::Pipeline;

/// Boot a full server on an ephemeral port with a throwaway database.
pub async fn spawn_app() -> SocketAddr {
    let db_path = std::env::temp_dir().join(format!("chronicle-test-{}.db", uuid::Uuid::new_v4()));
    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        db_path,
        session_secret: "0123456789abcdef0123456789abcdef".into(),
        public_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../public"),
    };
    config.validate().expect("test config");

    let db = Database::open(&config.db_path).expect("open test store");
    let state: AppState = Arc::new(AppStateInner { db });
    let hub = ChatHub::new();
    let pipeline = Pipeline::validate(&Pipeline::STANDARD).expect("standard pipeline");
    let router = app::build_router(&pipeline, state, hub, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    addr
}

/// Browser-like client: follows redirects and keeps session cookies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("build client")
}

pub async fn register_and_login(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) {
    let res = client
        .post(format!("{base}/users/register"))
        .form(&[
            ("name", "Test User"),
            ("email", &format!("{username}@example.com")),
            ("username", username),
            ("password", password),
            ("password2", password),
        ])
        .send()
        .await
        .expect("register");
    assert_eq!(res.url().path(), "/users/login");

    let res = client
        .post(format!("{base}/users/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("login");
    assert_eq!(res.url().path(), "/");
}
