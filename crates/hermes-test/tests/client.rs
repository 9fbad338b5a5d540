use hermes::middleware::builtins::BearerAuth;
use hermes::prelude::*;
use hermes_test::{TestClient, TestError};
use http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Created {
    name: String,
    caller: String,
}

fn bundle() -> RouteBundle {
    let global = GlobalSpec::new().auth_strategy(
        "bearer",
        BearerAuth::new(|token: &str| {
            if token == "secret" {
                Ok(CallerIdentity::user("alice"))
            } else {
                Err(Error::unauthorized("unknown token"))
            }
        }),
    );

    let create = global
        .route(
            RouteSpec::new([Method::POST])
                .auth("bearer")
                .json_body(
                    JsonSchema::shared(json!({
                        "type": "object",
                        "properties": { "name": { "type": "string" } },
                        "required": ["name"]
                    }))
                    .unwrap(),
                ),
            FnEndpoint::new(|ctx, req| {
                let name = req.json_body().cloned().unwrap_or_default()["name"].clone();
                Box::pin(async move {
                    Ok(ctx
                        .json(json!({ "name": name, "caller": ctx.identity().log_id() }))
                        .status(StatusCode::CREATED))
                })
            }),
        )
        .unwrap();

    let form = global
        .route(
            RouteSpec::new([Method::POST]).url_encoded_form_data(
                JsonSchema::shared(json!({ "type": "object" })).unwrap(),
            ),
            FnEndpoint::new(|ctx, req| {
                let form = req.url_encoded_form_data().cloned().unwrap_or_default();
                Box::pin(async move { Ok(ctx.json(form)) })
            }),
        )
        .unwrap();

    let boom = global
        .route(
            RouteSpec::new([Method::GET]),
            FnEndpoint::new(|_ctx, _req| {
                Box::pin(async { Err(Error::other(std::io::Error::other("boom"))) })
            }),
        )
        .unwrap();

    RouteBundle::builder()
        .route("/users", create)
        .route("/form", form)
        .route("/boom", boom)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_authenticated_json_post() {
    let client = TestClient::new(bundle());
    let response = client
        .post("/users")
        .bearer_token("secret")
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();

    response.assert_status(StatusCode::CREATED);
    let created: Created = response.json().unwrap();
    assert_eq!(created.name, "Alice");
    assert_eq!(created.caller, "user:alice");
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let client = TestClient::new(bundle());
    let response = client
        .post("/users")
        .bearer_token("wrong")
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("UNAUTHORIZED");
}

#[tokio::test]
async fn test_default_headers_apply_to_every_request() {
    let client = TestClient::new(bundle()).with_default_header("authorization", "Bearer secret");
    let response = client
        .post("/users")
        .json(&json!({ "name": 7 }))
        .send()
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("INPUT_VALIDATION_ERROR");
}

#[tokio::test]
async fn test_form_body() {
    let client = TestClient::new(bundle());
    let response = client
        .post("/form")
        .form(&[("a", "1"), ("b", "two")])
        .send()
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json_value().unwrap(), json!({ "a": "1", "b": "two" }));
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let client = TestClient::new(bundle());

    let missing = client.get("/nowhere").send().await.unwrap();
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.text().unwrap(), "Not found");

    // Auth runs before the method check, so the caller must get past it.
    let wrong = client
        .delete("/users")
        .bearer_token("secret")
        .send()
        .await
        .unwrap();
    wrong
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_header("allow", "POST");
}

#[tokio::test]
async fn test_unconverted_error_surfaces_as_dispatch_error() {
    let client = TestClient::new(bundle());
    let error = client.get("/boom").send().await.unwrap_err();
    assert!(matches!(error, TestError::Dispatch(Error::Other(_))));
}

#[tokio::test]
async fn test_invalid_header_fails_before_dispatch() {
    let client = TestClient::new(bundle());
    let error = client
        .get("/users")
        .header("bad header", "x")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(error, TestError::RequestBuild(_)));
}

#[tokio::test]
async fn test_custom_options_are_used() {
    let options = MakeRequestOptions::new()
        .automatically_remove_pathname_prefix(false)
        .remove_pathname_prefix("/api");
    let client = TestClient::with_options(bundle(), options);

    let response = client
        .post("/api/users")
        .bearer_token("secret")
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    response.assert_status(StatusCode::CREATED);
}
