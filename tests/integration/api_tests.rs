//! API integration tests
//!
//! These run against a live server with a seeded admin account
//! (admin@pustaka.id / admin). Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// Helper to get an admin token
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@pustaka.id",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to register a fresh member and log them in
async fn register_member(client: &Client) -> (String, String) {
    let email = format!("member{}@example.com", unique_suffix());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test Member",
            "email": email,
            "password": "member-password"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "member-password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (token, email)
}

/// Helper to register a book with one copy, returning the title id
async fn create_book(client: &Client, admin_token: &str, title: &str) -> String {
    let response = client
        .post(format!("{}/admin/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "synopsis": "A test book",
            "category": "Fiction",
            "barcode_sn": format!("SN-{}", unique_suffix()),
            "condition": "Good"
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["title_id"].as_str().expect("No title id").to_string()
}

/// Helper to request a loan, returning the raw response
async fn request_loan(client: &Client, token: &str, title_id: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title_id": title_id,
            "due_date": "2099-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send loan request")
}

/// Helper for the admin decision call
async fn decide_loan(
    client: &Client,
    admin_token: &str,
    loan_id: &str,
    action: &str,
) -> reqwest::Response {
    client
        .patch(format!("{}/admin/loans/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "action": action }))
        .send()
        .await
        .expect("Failed to send decision request")
}

#[tokio::test]
#[ignore]
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
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@pustaka.id",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_request_with_past_due_date_fails() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Past Due {}", unique_suffix())).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "title_id": title_id,
            "due_date": "2000-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send loan request");

    assert_eq!(response.status(), 400);

    // No copy was reserved by the failed request
    let second = request_loan(&client, &member, &title_id).await;
    assert_eq!(second.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_last_copy_single_winner() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member_a, _) = register_member(&client).await;
    let (member_b, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Last Copy {}", unique_suffix())).await;

    // One copy, two concurrent requests: exactly one wins
    let (first, second) = tokio::join!(
        request_loan(&client, &member_a, &title_id),
        request_loan(&client, &member_b, &title_id)
    );

    let statuses = [first.status().as_u16(), second.status().as_u16()];
    assert!(
        statuses.contains(&201) && statuses.contains(&409),
        "expected one winner and one OUT_OF_STOCK, got {:?}",
        statuses
    );
}

#[tokio::test]
#[ignore]
async fn test_decide_is_single_shot() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Decide Once {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();

    let response = decide_loan(&client, &admin, &loan_id, "APPROVE").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "APPROVED");

    // A second decision hits a loan that is no longer REQUESTED
    let response = decide_loan(&client, &admin, &loan_id, "REJECT").await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_decide_requires_admin() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Forbidden {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();

    let response = decide_loan(&client, &member, &loan_id, "APPROVE").await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_reject_frees_the_copy() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Reject {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();

    let response = decide_loan(&client, &admin, &loan_id, "REJECT").await;
    assert_eq!(response.status(), 200);

    // The single copy is available again
    let response = request_loan(&client, &member, &title_id).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_return_with_review_updates_rating_and_counter() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Review {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();

    decide_loan(&client, &admin, &loan_id, "APPROVE").await;

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "rating": 5,
            "review_text": "Great"
        }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["review_created"], true);

    // Title now has one 5-star review and avg_rating 5.0
    let response = client
        .get(format!("{}/books/{}", BASE_URL, title_id))
        .send()
        .await
        .expect("Failed to send detail request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["reviews"].as_array().expect("reviews").len(), 1);
    assert_eq!(body["avg_rating"].as_f64().expect("avg"), 5.0);

    // Borrower's finished-books counter incremented by exactly one
    let response = client
        .get(format!("{}/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send profile request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_books_finished"].as_i64().expect("counter"), 1);

    // A second return of the same loan is rejected
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_review_rolls_back_return() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Duplicate {}", unique_suffix())).await;

    // First loan: return with a review
    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();
    decide_loan(&client, &admin, &loan_id, "APPROVE").await;
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "rating": 4, "review_text": "Nice" }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    // Second loan of the same title: a second review must abort the return
    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();
    decide_loan(&client, &admin, &loan_id, "APPROVE").await;

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "rating": 2, "review_text": "Changed my mind" }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 409);

    // The whole transaction rolled back: the loan is still APPROVED,
    // so a plain return still works
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["review_created"], false);
}

#[tokio::test]
#[ignore]
async fn test_return_requires_rating_and_text_together() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Half Review {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();
    decide_loan(&client, &admin, &loan_id, "APPROVE").await;

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "rating": 5 }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_return_of_anothers_loan_forbidden() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member_a, _) = register_member(&client).await;
    let (member_b, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Not Yours {}", unique_suffix())).await;

    let response = request_loan(&client, &member_a, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();
    decide_loan(&client, &admin, &loan_id, "APPROVE").await;

    // Another member cannot return a loan they do not hold
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member_b))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 403);

    // The loan is untouched: the borrower's own return still works
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member_a))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_return_of_unapproved_loan_fails() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("Unapproved {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_str().expect("No loan id").to_string();

    // Still REQUESTED, not APPROVED
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_loan_history() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (member, _) = register_member(&client).await;
    let title_id = create_book(&client, &admin, &format!("History {}", unique_suffix())).await;

    let response = request_loan(&client, &member, &title_id).await;
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/loans/history", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send history request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let history = body.as_array().expect("history array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "REQUESTED");
}
