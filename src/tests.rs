//! Integration tests for the AuraLink backend.

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.expect("Failed to init DB");

        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let app = create_router(AppState::new(Repository::new(pool), config));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a profile and return its id.
    async fn profile(&self, name: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/profiles"))
            .json(&json!({ "displayName": name, "interests": ["hiking"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a group as `admin` and return its id.
    async fn group(&self, admin: &str, name: &str) -> String {
        let body = self
            .send(self.client.post(self.url("/api/groups")), admin, json!({ "name": name }))
            .await;
        assert_eq!(body["success"], true);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn join(&self, group: &str, actor: &str) {
        let resp = self
            .client
            .post(self.url(&format!("/api/groups/{}/join", group)))
            .header("x-actor-id", actor)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    async fn send(&self, request: reqwest::RequestBuilder, actor: &str, body: Value) -> Value {
        request
            .header("x-actor-id", actor)
            .json(&body)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn post(&self, group: &str, actor: &str, content: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/groups/{}/posts", group)))
            .header("x-actor-id", actor)
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap()
    }

    async fn comment(
        &self,
        group: &str,
        position: usize,
        actor: &str,
        content: &str,
    ) -> reqwest::Response {
        self.client
            .post(self.url(&format!(
                "/api/groups/{}/posts/{}/comments",
                group, position
            )))
            .header("x-actor-id", actor)
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, actor: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header("x-actor-id", actor)
            .send()
            .await
            .unwrap()
    }

    async fn board(&self, group: &str, actor: &str) -> Value {
        let resp = self
            .client
            .get(self.url(&format!("/api/groups/{}", group)))
            .header("x-actor-id", actor)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/profiles"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_bearer_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/profiles"))
        .header("Authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = Client::new()
        .get(fixture.url("/api/profiles"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_open_mode_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/profiles"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_unknown_actor_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/groups"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .get(fixture.url("/api/groups"))
        .header("x-actor-id", "nobody")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_profile_name_validation() {
    let fixture = TestFixture::new().await;

    for name in ["", "   ", "Ana - Admin", "Ana -", "Ana - "] {
        let resp = fixture
            .client
            .post(fixture.url("/api/profiles"))
            .json(&json!({ "displayName": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let id = fixture.profile("Ana").await;
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/profiles/{}", id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["displayName"], "Ana");
    assert_eq!(body["data"]["interests"], json!(["hiking"]));
}

#[tokio::test]
async fn test_post_comment_delete_scenario() {
    let fixture = TestFixture::new().await;
    let ana = fixture.profile("Ana").await;
    let bo = fixture.profile("Bo").await;
    let group = fixture.group(&ana, "Climbers").await;
    fixture.join(&group, &bo).await;

    let resp = fixture.post(&group, &ana, "hello").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["created"]["position"], 0);
    let encoded = body["data"]["created"]["encoded"].as_str().unwrap();
    assert!(encoded.starts_with("Ana - hello - "));
    assert!(encoded.ends_with(&format!(" - {}", ana)));

    let resp = fixture.comment(&group, 0, &bo, "hi").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["created"]["user"], "Bo");
    assert_eq!(body["data"]["created"]["userId"], bo.as_str());

    let board = fixture.board(&group, &bo).await;
    assert_eq!(board["posts"][0]["content"], "hello");
    assert_eq!(board["posts"][0]["authorId"], ana.as_str());
    assert_eq!(board["posts"][0]["comments"][0]["content"], "hi");

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0", group), &ana)
        .await;
    assert_eq!(resp.status(), 200);

    let board = fixture.board(&group, &ana).await;
    assert_eq!(board["posts"], json!([]));
    assert_eq!(board["postCount"], 0);
}

#[tokio::test]
async fn test_delete_reindexes_comments() {
    let fixture = TestFixture::new().await;
    let ana = fixture.profile("Ana").await;
    let bo = fixture.profile("Bo").await;
    let group = fixture.group(&ana, "Readers").await;
    fixture.join(&group, &bo).await;

    for i in 0..4 {
        fixture.post(&group, &bo, &format!("post {}", i)).await;
        fixture
            .comment(&group, i, &ana, &format!("reply {}", i))
            .await;
    }

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/1", group), &bo)
        .await;
    assert_eq!(resp.status(), 200);

    let board = fixture.board(&group, &ana).await;
    let posts = board["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 3);
    // Newest first; each post still carries its own replies.
    for (post, (position, n)) in posts.iter().zip([(2, 3), (1, 2), (0, 0)]) {
        assert_eq!(post["position"], position);
        assert_eq!(post["content"], format!("post {}", n));
        assert_eq!(post["comments"][0]["content"], format!("reply {}", n));
    }
}

#[tokio::test]
async fn test_delete_rights() {
    let fixture = TestFixture::new().await;
    let admin = fixture.profile("Admin").await;
    let ana = fixture.profile("Ana").await;
    let bo = fixture.profile("Bo").await;
    let group = fixture.group(&admin, "Runners").await;
    fixture.join(&group, &ana).await;
    fixture.join(&group, &bo).await;

    fixture.post(&group, &ana, "ana's post").await;
    fixture.comment(&group, 0, &ana, "ana's comment").await;

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0", group), &bo)
        .await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0/comments/0", group), &bo)
        .await;
    assert_eq!(resp.status(), 403);

    let board = fixture.board(&group, &bo).await;
    assert_eq!(board["posts"].as_array().unwrap().len(), 1);
    assert_eq!(board["posts"][0]["comments"].as_array().unwrap().len(), 1);

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0/comments/0", group), &admin)
        .await;
    assert_eq!(resp.status(), 200);
    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0", group), &admin)
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_non_members_cannot_read_or_post() {
    let fixture = TestFixture::new().await;
    let ana = fixture.profile("Ana").await;
    let eve = fixture.profile("Eve").await;
    let group = fixture.group(&ana, "Private").await;

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/groups/{}", group)))
        .header("x-actor-id", &eve)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture.post(&group, &eve, "let me in").await;
    assert_eq!(resp.status(), 403);

    let body = fixture
        .send(fixture.client.get(fixture.url("/api/groups")), &eve, json!({}))
        .await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_board_not_found_and_validation() {
    let fixture = TestFixture::new().await;
    let ana = fixture.profile("Ana").await;
    let group = fixture.group(&ana, "Cooks").await;

    let resp = fixture.post(&group, &ana, "  ").await;
    assert_eq!(resp.status(), 400);

    let resp = fixture.comment(&group, 0, &ana, "nothing to reply to").await;
    assert_eq!(resp.status(), 404);

    let resp = fixture.post("missing-group", &ana, "hello").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_content_with_separator_over_http() {
    let fixture = TestFixture::new().await;
    let ana = fixture.profile("Ana").await;
    let group = fixture.group(&ana, "Debaters").await;

    fixture
        .post(&group, &ana, "pros - cons - 2024T - done")
        .await;

    let board = fixture.board(&group, &ana).await;
    assert_eq!(board["posts"][0]["content"], "pros - cons - 2024T - done");
    assert_eq!(board["posts"][0]["authorName"], "Ana");

    let resp = fixture.post(&group, &ana, "pros - cons -").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let board = fixture.board(&group, &ana).await;
    assert_eq!(board["posts"].as_array().unwrap().len(), 1);

    let resp = fixture
        .delete(&format!("/api/groups/{}/posts/0", group), &ana)
        .await;
    assert_eq!(resp.status(), 200);
}
