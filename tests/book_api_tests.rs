//! Catalog endpoints

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{days_from_today, TestApp};
use library_server::models::UserRole;

#[tokio::test]
async fn test_catalog_is_public_but_writes_are_admin_only() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let (_, reader) = app.user_with_token("reader", UserRole::User).await;
    let book = json!({
        "title": "Middlemarch",
        "author": "George Eliot",
        "isbn": "978-0-14-143954-9",
        "page_count": 880
    });

    let anonymous = app.post("/api/books", None, book.clone()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let member = app.post("/api/books", Some(&reader), book.clone()).await;
    assert_eq!(member.status, StatusCode::FORBIDDEN);
    assert_eq!(
        member.body["error"]["message"],
        "Forbidden: You do not have permission to perform this action."
    );

    let created = app.post("/api/books", Some(&admin), book).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["isbn"], "9780141439549");
    assert_eq!(created.body["availability"], true);
    let id = created.body["id"].as_str().unwrap().to_string();

    let listed = app.get("/api/books", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["count"], 1);
    assert_eq!(listed.body["results"][0]["title"], "Middlemarch");

    let fetched = app.get(&format!("/api/books/{}", id), None).await;
    assert_eq!(fetched.body["author"], "George Eliot");

    let delete_member = app.delete(&format!("/api/books/{}", id), Some(&reader)).await;
    assert_eq!(delete_member.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_book_validation_messages() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;

    let invalid = app
        .post(
            "/api/books",
            Some(&admin),
            json!({
                "title": "   ",
                "author": "a".repeat(201),
                "isbn": "12345",
                "page_count": 0
            }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let details = &invalid.body["error"]["details"];
    assert_eq!(details["title"][0], "This field may not be blank.");
    assert!(details["author"].is_array());
    assert_eq!(details["isbn"][0], "ISBN must be 10 or 13 digits long.");
    assert_eq!(details["page_count"][0], "Page count must be a positive number.");

    let malformed = app
        .request(Method::POST, "/api/books", Some(&admin), Some(json!({ "title": 5 })))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_isbn_is_rejected_after_normalization() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    app.create_book(&admin, "Original", "9780306406157").await;

    let duplicate = app
        .post(
            "/api/books",
            Some(&admin),
            json!({
                "title": "Copy",
                "author": "Someone",
                "isbn": "978-0-306-40615-7",
                "page_count": 10
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["error"]["details"]["isbn"][0],
        "book with this isbn already exists."
    );
}

#[tokio::test]
async fn test_search_and_availability_filters() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let hobbit = app.create_book(&admin, "The Hobbit", "9780261102217").await;
    app.create_book(&admin, "The Silmarillion", "9780261102736").await;
    app.create_book(&admin, "Dune", "9780441013593").await;

    let search = app.get("/api/books?search=the%20hobbit", None).await;
    assert_eq!(search.body["count"], 1);
    assert_eq!(search.body["results"][0]["title"], "The Hobbit");

    // every term must match title or author
    let by_author = app.get("/api/books?search=test,author", None).await;
    assert_eq!(by_author.body["count"], 3);
    let no_match = app.get("/api/books?search=hobbit%20dune", None).await;
    assert_eq!(no_match.body["count"], 0);

    app.post(
        "/api/loans",
        Some(&admin),
        json!({ "book": hobbit, "due_date": days_from_today(7) }),
    )
    .await;

    let available = app.get("/api/books?availability=true", None).await;
    assert_eq!(available.body["count"], 2);
    let checked_out = app.get("/api/books?availability=false&search=the", None).await;
    assert_eq!(checked_out.body["count"], 1);
    assert_eq!(checked_out.body["results"][0]["title"], "The Hobbit");
}

#[tokio::test]
async fn test_partial_update_keeps_availability_owned_by_loans() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let id = app.create_book(&admin, "Draft Title", "9780000000019").await;

    let updated = app
        .patch(
            &format!("/api/books/{}", id),
            Some(&admin),
            json!({ "title": "Final Title", "availability": false }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Final Title");
    assert_eq!(updated.body["author"], "Test Author");
    assert_eq!(updated.body["availability"], true);

    let put = app
        .request(
            Method::PUT,
            &format!("/api/books/{}", id),
            Some(&admin),
            Some(json!({ "page_count": 321 })),
        )
        .await;
    assert_eq!(put.status, StatusCode::OK);
    assert_eq!(put.body["page_count"], 321);
    assert_eq!(put.body["title"], "Final Title");
}

#[tokio::test]
async fn test_book_with_active_loan_cannot_be_deleted() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let (_, reader) = app.user_with_token("reader", UserRole::User).await;
    let id = app.create_book(&admin, "Borrowed", "9780000000026").await;

    let loan = app
        .post(
            "/api/loans",
            Some(&reader),
            json!({ "book": id, "due_date": days_from_today(4) }),
        )
        .await;

    let blocked = app.delete(&format!("/api/books/{}", id), Some(&admin)).await;
    assert_eq!(blocked.status, StatusCode::BAD_REQUEST);

    app.request(
        Method::POST,
        &format!("/api/loans/{}/return", loan.body["id"].as_str().unwrap()),
        Some(&reader),
        None,
    )
    .await;

    let deleted = app.delete(&format!("/api/books/{}", id), Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app.get(&format!("/api/books/{}", id), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    // returned loans go with the book
    let history = app.get("/api/loans", Some(&reader)).await;
    assert_eq!(history.body["count"], 0);
}

#[tokio::test]
async fn test_book_pages() {
    let app = TestApp::with_page_size(2);
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    for i in 0..3 {
        app.create_book(&admin, &format!("Volume {}", i), &format!("000000000{}", i))
            .await;
    }

    let first = app.get("/api/books?search=volume", None).await;
    assert_eq!(first.body["count"], 3);
    assert_eq!(first.body["results"][0]["title"], "Volume 0");
    assert_eq!(first.body["next"], "/api/books?search=volume&page=2");

    let second = app.get("/api/books?search=volume&page=2", None).await;
    assert_eq!(second.body["results"][0]["title"], "Volume 2");
    assert_eq!(second.body["previous"], "/api/books?search=volume");

    let zero = app.get("/api/books?page=0", None).await;
    assert_eq!(zero.status, StatusCode::NOT_FOUND);
    let beyond = app.get("/api/books?page=3", None).await;
    assert_eq!(beyond.status, StatusCode::NOT_FOUND);
}
