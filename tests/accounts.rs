//! Supabase account operations against a local mock of GoTrue and PostgREST.

use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bizmap::accounts::models::OAuthProvider;
use bizmap::accounts::{AccountError, SupabaseClient};

const TOKEN: &str = "reader-access-token";
const USER_ID: &str = "0b7e8f6a-1c2d-4e3f-8a9b-c0d1e2f3a4b5";
const ANON_KEY: &str = "anon-key";

fn client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&server.uri(), SecretString::from(ANON_KEY.to_string()))
        .expect("client builds")
}

async fn mount_signed_in_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("apikey", ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": USER_ID,
            "email": "reader@example.jp",
            "user_metadata": {"full_name": "宮崎 太郎"}
        })))
        .mount(server)
        .await;
}

fn bookmark_row(article_id: &str) -> serde_json::Value {
    json!({
        "id": "6f1c1f2e-5a4b-4c3d-9e8f-0a1b2c3d4e5f",
        "user_id": USER_ID,
        "article_id": article_id,
        "created_at": "2025-03-01T09:30:00.123456+00:00"
    })
}

// ──────────────────────────────────────────
// Session
// ──────────────────────────────────────────

#[tokio::test]
async fn current_user_resolves_token() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;

    let user = assert_ok!(client(&server).current_user(TOKEN).await).expect("signed in");
    assert_eq!(user.id.to_string(), USER_ID);
    assert_eq!(user.user_metadata.full_name.as_deref(), Some("宮崎 太郎"));
}

#[tokio::test]
async fn rejected_token_is_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
        .mount(&server)
        .await;

    let user = assert_ok!(client(&server).current_user("expired").await);
    assert!(user.is_none());
}

#[tokio::test]
async fn oauth_url_redirects_to_callback() {
    let server = MockServer::start().await;
    let url = client(&server).oauth_authorize_url(OAuthProvider::Google, "https://biz-map.bond-llc.jp/");

    assert_eq!(
        url,
        format!(
            "{}/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fbiz-map.bond-llc.jp%2Fauth%2Fcallback",
            server.uri()
        )
    );
}

#[tokio::test]
async fn sign_out_posts_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client(&server).sign_out(TOKEN).await);
}

// ──────────────────────────────────────────
// Bookmarks and follows
// ──────────────────────────────────────────

#[tokio::test]
async fn add_bookmark_inserts_row() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookmarks"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"user_id": USER_ID, "article_id": "miyazaki-dx"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([bookmark_row("miyazaki-dx")])))
        .expect(1)
        .mount(&server)
        .await;

    let bookmark = assert_ok!(client(&server).add_bookmark(Some(TOKEN), "miyazaki-dx").await);
    assert_eq!(bookmark.article_id, "miyazaki-dx");
    assert_eq!(bookmark.user_id.to_string(), USER_ID);
}

#[tokio::test]
async fn duplicate_bookmark_is_reported() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookmarks"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (user_id, article_id) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .add_bookmark(Some(TOKEN), "miyazaki-dx")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AlreadyBookmarked));
    assert_eq!(err.to_string(), "既にブックマーク済みです");
}

#[tokio::test]
async fn duplicate_follow_is_reported() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/author_follows"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"code": "23505", "message": "duplicate"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .follow_author(Some(TOKEN), "bond")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AlreadyFollowing));
}

#[tokio::test]
async fn anonymous_writes_require_auth() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client.add_bookmark(None, "a").await.unwrap_err();
    assert!(matches!(err, AccountError::AuthRequired));
    let err = client.remove_bookmark(None, "a").await.unwrap_err();
    assert!(matches!(err, AccountError::AuthRequired));
    let err = client.follow_author(None, "bond").await.unwrap_err();
    assert!(matches!(err, AccountError::AuthRequired));
}

#[tokio::test]
async fn anonymous_reads_are_empty() {
    let server = MockServer::start().await;
    let client = client(&server);

    assert!(assert_ok!(client.bookmarks(None).await).is_empty());
    assert!(assert_ok!(client.followed_authors(None).await).is_empty());
    assert!(!client.is_bookmarked(None, "a").await);
    assert!(client.reading_history(None, 20).await.is_empty());
    assert!(client.current_profile(None).await.is_none());
}

#[tokio::test]
async fn bookmarks_listed_newest_first() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("user_id", format!("eq.{USER_ID}").as_str()))
        .and(query_param("order", "created_at.desc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([bookmark_row("newer"), bookmark_row("older")])),
        )
        .mount(&server)
        .await;

    let bookmarks = assert_ok!(client(&server).bookmarks(Some(TOKEN)).await);
    let ids: Vec<&str> = bookmarks.iter().map(|b| b.article_id.as_str()).collect();
    assert_eq!(ids, vec!["newer", "older"]);
}

#[tokio::test]
async fn bookmark_lookup_error_reads_as_false() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client(&server).is_bookmarked(Some(TOKEN), "a").await);
}

#[tokio::test]
async fn remove_bookmark_filters_by_user_and_article() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("user_id", format!("eq.{USER_ID}").as_str()))
        .and(query_param("article_id", "eq.miyazaki-dx"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client(&server).remove_bookmark(Some(TOKEN), "miyazaki-dx").await);
}

// ──────────────────────────────────────────
// Reading history
// ──────────────────────────────────────────

#[tokio::test]
async fn article_view_upserts_history() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reading_history"))
        .and(query_param("on_conflict", "user_id,article_id"))
        .and(header_regex("prefer", "resolution=merge-duplicates"))
        .and(body_partial_json(json!({
            "article_id": "miyazaki-dx",
            "last_read_at": "2025-03-01T12:00:00+00:00"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    client(&server)
        .track_article_view(Some(TOKEN), "miyazaki-dx", now)
        .await;
}

#[tokio::test]
async fn history_write_failure_is_swallowed() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reading_history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    client(&server)
        .track_article_view(Some(TOKEN), "a", Utc::now())
        .await;
}

#[tokio::test]
async fn history_read_failure_is_empty() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reading_history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client(&server).reading_history(Some(TOKEN), 20).await.is_empty());
}

#[tokio::test]
async fn history_limit_is_forwarded() {
    let server = MockServer::start().await;
    mount_signed_in_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reading_history"))
        .and(query_param("limit", "5"))
        .and(query_param("order", "last_read_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "6f1c1f2e-5a4b-4c3d-9e8f-0a1b2c3d4e5f",
            "user_id": USER_ID,
            "article_id": "a",
            "last_read_at": "2025-03-01T12:00:00+00:00"
        }])))
        .mount(&server)
        .await;

    let history = client(&server).reading_history(Some(TOKEN), 5).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].article_id, "a");
}
