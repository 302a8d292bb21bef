//! API integration tests
//!
//! These run against a live server with a fresh database:
//!   cargo run & cargo test -- --ignored
//!
//! A seeded admin account (admin@comlib.org / administrator) is expected.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

const ADMIN_EMAIL: &str = "admin@comlib.org";
const ADMIN_PASSWORD: &str = "administrator";

/// Register a throwaway member and return its (email, password)
async fn register_member(client: &Client) -> (String, String) {
    let email = format!("member-{}@comlib.org", uuid::Uuid::new_v4());
    let password = "a-strong-password".to_string();

    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "name": "Test Member",
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    (email, password)
}

/// Log in and return the bearer token from the Authorization response header
async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success());

    response
        .headers()
        .get("authorization")
        .expect("No Authorization header in login response")
        .to_str()
        .expect("Invalid Authorization header")
        .trim_start_matches("Bearer ")
        .to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Create a book as admin and return its id
async fn create_book(client: &Client, token: &str, title: &str) -> String {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "description": "A book created by the integration tests",
            "publication_year": 2020,
            "isbn": "978-0-00-000000-0"
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["book"]["id"]
        .as_str()
        .expect("No book id in response")
        .to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let (email, password) = register_member(&client).await;

    let token = login(&client, &email, &password).await;
    assert!(!token.is_empty());

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["role"], "member");
    // The password hash must never leave the server
    assert!(body["user"]["password"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email() {
    let client = Client::new();
    let (email, _) = register_member(&client).await;

    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "name": "Impostor",
            "email": email,
            "password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_login_wrong_password() {
    let client = Client::new();
    let (email, _) = register_member(&client).await;

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_login_unknown_email() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "email": "nobody@comlib.org",
            "password": "whatever-it-takes"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_tampered_token_rejected() {
    let client = Client::new();
    let (email, password) = register_member(&client).await;
    let token = login(&client, &email, &password).await;

    // Flip the signature tail
    let tampered = format!("{}AAAA", &token[..token.len() - 4]);

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", tampered))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_missing_token_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_refresh_token_rotation() {
    // Cookie store keeps the refresh cookie between login and refresh
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let (email, password) = register_member(&client).await;
    let token = login(&client, &email, &password).await;

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let user_id = body["user"]["id"].as_str().expect("No user id").to_string();

    let response = client
        .post(format!("{}/users/{}/refresh", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send refresh request");

    assert!(response.status().is_success());
    let new_token = response
        .headers()
        .get("authorization")
        .expect("No Authorization header in refresh response")
        .to_str()
        .unwrap()
        .trim_start_matches("Bearer ")
        .to_string();
    assert!(!new_token.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let (email, password) = register_member(&client).await;
    let member_token = login(&client, &email, &password).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .json(&json!({
            "title": "Forbidden Book",
            "author": "Nobody"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_create_book_duplicate_title() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let title = format!("Unique Title {}", uuid::Uuid::new_v4());
    create_book(&client, &token, &title).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "author": "Another Author"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (email, password) = register_member(&client).await;
    let member = login(&client, &email, &password).await;

    let title = format!("Borrowable {}", uuid::Uuid::new_v4());
    let book_id = create_book(&client, &admin, &title).await;

    // Borrow
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    // The book no longer shows up among available books
    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let available = body["availablebooks"].as_array().expect("No book list");
    assert!(available.iter().all(|b| b["id"] != book_id.as_str()));

    // A second borrow of the same copy conflicts
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // The loan appears in the member's history
    let response = client
        .get(format!("{}/loans/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let loans = body["loans"].as_array().expect("No loan list");
    assert!(loans.iter().any(|l| l["book_id"] == book_id.as_str()));

    // Return
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());

    // Returning twice is a 404: no open loan remains
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_have_one_winner() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let (email_a, password_a) = register_member(&client).await;
    let (email_b, password_b) = register_member(&client).await;
    let member_a = login(&client, &email_a, &password_a).await;
    let member_b = login(&client, &email_b, &password_b).await;

    let title = format!("Contested {}", uuid::Uuid::new_v4());
    let book_id = create_book(&client, &admin, &title).await;

    let borrow = |token: String| {
        let client = client.clone();
        let book_id = book_id.clone();
        async move {
            client
                .post(format!("{}/loans", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "book_id": book_id }))
                .send()
                .await
                .expect("Failed to send borrow request")
                .status()
                .as_u16()
        }
    };

    // Two members race for the same copy
    let (first, second) = tokio::join!(borrow(member_a.clone()), borrow(member_b.clone()));

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    // The copy is gone from the available list
    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_a))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let available = body["availablebooks"].as_array().expect("No book list");
    assert!(available.iter().all(|b| b["id"] != book_id.as_str()));

    // Exactly one of the two accounts holds the loan
    let mut holders = 0;
    let mut total_count = 0;
    for token in [&member_a, &member_b] {
        let response = client
            .get(format!("{}/loans/me", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to send request");
        let body: Value = response.json().await.expect("Failed to parse response");
        let loans = body["loans"].as_array().expect("No loan list");
        if loans.iter().any(|l| l["book_id"] == book_id.as_str()) {
            holders += 1;
        }

        let response = client
            .get(format!("{}/users/me", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to send request");
        let body: Value = response.json().await.expect("Failed to parse response");
        total_count += body["user"]["loan_count"].as_i64().expect("No loan count");
    }
    assert_eq!(holders, 1);
    // The loser's counter bump was rolled back with its transaction
    assert_eq!(total_count, 1);
}

#[tokio::test]
#[ignore]
async fn test_borrow_with_deleted_account() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (email, password) = register_member(&client).await;
    let member = login(&client, &email, &password).await;

    let title = format!("Orphaned {}", uuid::Uuid::new_v4());
    let book_id = create_book(&client, &admin, &title).await;

    // The access token outlives the account
    let response = client
        .delete(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send delete request");
    assert!(response.status().is_success());

    // A borrow from a deleted account is not-found, not at-cap
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    // And leaves the book available
    let admin_view = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = admin_view.json().await.expect("Failed to parse response");
    let available = body["availablebooks"].as_array().expect("No book list");
    assert!(available.iter().any(|b| b["id"] == book_id.as_str()));
}

#[tokio::test]
#[ignore]
async fn test_borrow_unknown_book() {
    let client = Client::new();
    let (email, password) = register_member(&client).await;
    let member = login(&client, &email, &password).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": uuid::Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_loan_cap_enforced() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (email, password) = register_member(&client).await;
    let member = login(&client, &email, &password).await;

    // Fill the member's quota (5 open loans)
    for i in 0..5 {
        let title = format!("Cap Filler {} {}", i, uuid::Uuid::new_v4());
        let book_id = create_book(&client, &admin, &title).await;
        let response = client
            .post(format!("{}/loans", BASE_URL))
            .header("Authorization", format!("Bearer {}", member))
            .json(&json!({ "book_id": book_id }))
            .send()
            .await
            .expect("Failed to send borrow request");
        assert_eq!(response.status(), 201);
    }

    // The sixth borrow is forbidden even though the book is free
    let title = format!("One Too Many {}", uuid::Uuid::new_v4());
    let book_id = create_book(&client, &admin, &title).await;
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // The rejected book is still available for everyone else
    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let available = body["availablebooks"].as_array().expect("No book list");
    assert!(available.iter().any(|b| b["id"] == book_id.as_str()));
}

#[tokio::test]
#[ignore]
async fn test_admin_views_user_loans() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (email, password) = register_member(&client).await;
    let member = login(&client, &email, &password).await;

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let user_id = body["user"]["id"].as_str().expect("No user id").to_string();

    // Members cannot inspect other accounts
    let response = client
        .get(format!("{}/loans/users/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/loans/users/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["email"], email.as_str());
    assert!(body["loans"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_update_and_delete_account() {
    let client = Client::new();
    let (email, password) = register_member(&client).await;
    let token = login(&client, &email, &password).await;

    let response = client
        .put(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Renamed Member" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["name"], "Renamed Member");

    let response = client
        .delete(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert!(response.status().is_success());

    // The deleted account can no longer log in
    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_register_validation() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "name": "",
            "email": "not-an-email",
            "password": "short"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}
