use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn login_body() -> String {
    format!(
        r#"{{"email":"{}","password":"{}"}}"#,
        mock_server::TEST_EMAIL,
        mock_server::TEST_PASSWORD
    )
}

// --- find ---

#[tokio::test]
async fn find_on_empty_collection_returns_envelope() {
    let app = mock_server::app();
    let resp = app.oneshot(get_request("/api/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["docs"], json!([]));
    assert_eq!(page["totalDocs"], 0);
    assert_eq!(page["hasNextPage"], false);
}

#[tokio::test]
async fn find_ignores_filter_query_params() {
    let app = mock_server::app();
    let resp = app
        .oneshot(get_request("/api/posts?where[title][equals]=test&limit=5"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["limit"], 5);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_request_headers_lowercased() {
    let app = mock_server::app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/echo")
                .header("Accept", "application/json")
                .header("X-Tenant", "alpha")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["headers"]["accept"], "application/json");
    assert_eq!(body["headers"]["x-tenant"], "alpha");
}

// --- create / get / update / delete ---

#[tokio::test]
async fn create_returns_201_with_doc_envelope() {
    let app = mock_server::app();
    let resp = app
        .oneshot(json_request("POST", "/api/posts", r#"{"title":"First"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Document created successfully.");
    assert_eq!(body["doc"]["title"], "First");
    assert!(body["doc"]["id"].is_string());
}

#[tokio::test]
async fn created_doc_is_retrievable_and_deletable() {
    let app = mock_server::app();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/posts", r#"{"title":"Keep"}"#))
        .await
        .unwrap();
    let id = body_json(resp).await["doc"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .clone()
        .oneshot(get_request(&format!("/api/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "Keep");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/posts/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "Keep");

    let resp = app
        .oneshot(get_request(&format!("/api/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_merges_fields_and_keeps_id() {
    let app = mock_server::app();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/posts",
            r#"{"title":"Old","content":"Body"}"#,
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["doc"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/posts/{id}"),
            r#"{"title":"New","id":"hijack"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Updated successfully.");
    assert_eq!(body["doc"]["title"], "New");
    assert_eq!(body["doc"]["content"], "Body");
    assert_eq!(body["doc"]["id"], json!(id));
}

#[tokio::test]
async fn missing_doc_is_404_with_message() {
    let app = mock_server::app();
    let resp = app.oneshot(get_request("/api/posts/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Resource not found");
    assert!(body.get("errors").is_none());
}

// --- count ---

#[tokio::test]
async fn count_reflects_collection_size() {
    let app = mock_server::app();
    for title in ["a", "b"] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/posts",
                &format!(r#"{{"title":"{title}"}}"#),
            ))
            .await
            .unwrap();
    }

    let resp = app.oneshot(get_request("/api/posts/count")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["totalDocs"], 2);
}

// --- upload ---

#[tokio::test]
async fn multipart_upload_decodes_payload_and_records_file() {
    let boundary = "testboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         hello\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"_payload\"\r\n\r\n\
         {{\"title\":\"Doc\"}}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/media")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .unwrap();

    let app = mock_server::app();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["doc"]["title"], "Doc");
    assert_eq!(body["doc"]["filename"], "a.txt");
    assert_eq!(body["doc"]["mimeType"], "text/plain");
    assert_eq!(body["doc"]["filesize"], 5);
}

// --- auth ---

#[tokio::test]
async fn login_issues_token_for_test_account() {
    let app = mock_server::app();
    let resp = app
        .oneshot(json_request("POST", "/api/users/login", &login_body()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], mock_server::TEST_EMAIL);
    assert!(body["token"].is_string());
    assert!(body["exp"].is_number());
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_field_errors() {
    let app = mock_server::app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/users/login",
            r#"{"email":"reader@example.com","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(
        body["message"],
        "The email or password provided is incorrect."
    );
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn me_requires_an_issued_token() {
    let app = mock_server::app();

    let resp = app
        .clone()
        .oneshot(get_request("/api/users/me"))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["user"], Value::Null);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/login", &login_body()))
        .await
        .unwrap();
    let token = body_json(resp).await["token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await["user"]["email"],
        mock_server::TEST_EMAIL
    );

    // A token the server never issued is no session.
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header(http::header::AUTHORIZATION, "Bearer forged")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["user"], Value::Null);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = mock_server::app();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/login", &login_body()))
        .await
        .unwrap();
    let token = body_json(resp).await["token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/logout")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await["message"],
        "You have been logged out successfully."
    );

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["user"], Value::Null);
}
