//! HTTP flows against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (dl-cli migrate)
//! - The storefront running (cargo run -p delicious-storefront)
//!
//! Run with: cargo test -p delicious-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;

use delicious_integration_tests::{storefront_base_url, unique_email};

/// Client that keeps cookies and does not follow redirects.
///
/// Each client claims its own forwarded address so the per-IP limit on auth
/// forms doesn't throttle the suite.
fn client() -> Client {
    let octets = uuid::Uuid::new_v4().into_bytes();
    let forwarded = format!("10.{}.{}.{}", octets[0], octets[1], octets[2]);

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_str(&forwarded).unwrap());

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh account; the session cookie stays in `client`.
async fn register(client: &Client) -> String {
    let base_url = storefront_base_url();
    let email = unique_email("api");
    let resp = client
        .post(format!("{base_url}/auth/register"))
        .form(&[
            ("name", "Api Tester"),
            ("email", email.as_str()),
            ("password", "correct horse"),
            ("password_confirm", "correct horse"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    email
}

fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Load the page a redirect points at and return its body.
async fn follow(client: &Client, resp: &reqwest::Response) -> String {
    let base_url = storefront_base_url();
    client
        .get(format!("{base_url}{}", location(resp)))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

/// Create a listing and return its slug.
async fn create_store(client: &Client, name: &str) -> String {
    let base_url = storefront_base_url();
    let form = Form::new()
        .text("name", name.to_string())
        .text("description", "Created by an integration test")
        .text("tags", "Wifi")
        .text("tags", "Open Late")
        .text("address", "1 King St W, Hamilton")
        .text("lng", "-79.8711")
        .text("lat", "43.2557");

    let resp = client
        .post(format!("{base_url}/add"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create store");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    location(&resp).strip_prefix("/store/").unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health_endpoints() {
    let base_url = storefront_base_url();
    let client = client();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(format!("{base_url}/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_logout_login() {
    let base_url = storefront_base_url();
    let client = client();
    let email = register(&client).await;

    let resp = client.post(format!("{base_url}/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("email", email.as_str()), ("password", "wrong password")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/auth/login");
    assert!(follow(&client, &resp).await.contains("Failed login!"));

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("email", email.as_str()), ("password", "correct horse")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
    assert!(follow(&client, &resp).await.contains("You are now logged in!"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unknown_reset_token_redirects_to_login() {
    let base_url = storefront_base_url();
    let client = client();
    let resp = client
        .get(format!("{base_url}/auth/reset/{}", "0".repeat(40)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
    assert!(follow(&client, &resp).await.contains("flash--error"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_query_string_text_never_reaches_the_banner() {
    let base_url = storefront_base_url();
    let marker = format!("account-locked-{}", uuid::Uuid::new_v4().simple());
    let body = client()
        .get(format!("{base_url}/stores?error={marker}&success={marker}&info={marker}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains(&marker));
    assert!(!body.contains("flash--error"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_add_page_requires_login() {
    let base_url = storefront_base_url();
    let client = client();
    let resp = client.get(format!("{base_url}/add")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
    assert!(follow(&client, &resp).await.contains("You must be logged in to do that!"));
}

// ============================================================================
// Stores
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_create_store_then_view_and_review() {
    let base_url = storefront_base_url();
    let client = client();
    register(&client).await;

    let name = format!("Api Store {}", uuid::Uuid::new_v4().simple());
    let slug = create_store(&client, &name).await;

    let resp = client.get(format!("{base_url}/store/{slug}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(&name));

    let id = body
        .split("/reviews/")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();

    let resp = client
        .post(format!("{base_url}/reviews/{id}"))
        .header("referer", format!("{base_url}/store/{slug}"))
        .form(&[("text", "Lovely"), ("rating", "4")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), format!("/store/{slug}"));
    assert!(follow(&client, &resp).await.contains("Review Saved!"));

    let resp = client
        .post(format!("{base_url}/reviews/{id}"))
        .form(&[("text", "No stars")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(follow(&client, &resp).await.contains("flash--error"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_same_name_stores_get_numbered_slugs() {
    let client = client();
    register(&client).await;

    let name = format!("Twin {}", uuid::Uuid::new_v4().simple());
    let first = create_store(&client, &name).await;
    let second = create_store(&client, &name).await;
    assert_eq!(second, format!("{first}-2"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_other_user_cannot_edit() {
    let base_url = storefront_base_url();
    let owner = client();
    register(&owner).await;
    let slug = create_store(&owner, &format!("Guarded {}", uuid::Uuid::new_v4().simple())).await;

    let body = owner
        .get(format!("{base_url}/store/{slug}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let id = body
        .split("/reviews/")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();

    let intruder = client();
    register(&intruder).await;
    let resp = intruder
        .get(format!("{base_url}/stores/{id}/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unknown_store_is_not_found() {
    let base_url = storefront_base_url();
    let resp = client()
        .get(format!("{base_url}/store/definitely-not-a-real-store-{}", uuid::Uuid::new_v4().simple()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// JSON API
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_search_and_near() {
    let base_url = storefront_base_url();
    let client = client();
    register(&client).await;

    let marker = uuid::Uuid::new_v4().simple().to_string();
    let slug = create_store(&client, &format!("Searchable {marker}")).await;

    let hits: Vec<Value> = client
        .get(format!("{base_url}/api/search"))
        .query(&[("q", marker.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(hits.iter().any(|h| h["slug"] == slug.as_str()));

    let near: Vec<Value> = client
        .get(format!("{base_url}/api/stores/near"))
        .query(&[("lng", "-79.8711"), ("lat", "43.2557")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(near.len() <= 10);
    assert!(near.iter().all(|s| s["location"]["type"] == "Point"));

    let resp = client
        .get(format!("{base_url}/api/stores/near"))
        .query(&[("lng", "500"), ("lat", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_heart_requires_login() {
    let base_url = storefront_base_url();
    let resp = client()
        .post(format!("{base_url}/api/stores/1/heart"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_heart_toggle_round_trip() {
    let base_url = storefront_base_url();
    let client = client();
    register(&client).await;
    let marker = uuid::Uuid::new_v4().simple().to_string();
    create_store(&client, &format!("Lovable {marker}")).await;

    let hits: Vec<Value> = client
        .get(format!("{base_url}/api/search"))
        .query(&[("q", marker.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = hits.first().unwrap()["id"].as_i64().unwrap();

    let on: Value = client
        .post(format!("{base_url}/api/stores/{id}/heart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(on["hearted"], true);

    let off: Value = client
        .post(format!("{base_url}/api/stores/{id}/heart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(off["hearted"], false);
    assert_eq!(off["hearts"], serde_json::json!([]));
}
