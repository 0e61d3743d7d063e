use super::*;

#[tokio::test]
async fn renders_error_body() {
    let resp = ApiError::bad_request("Missing video or sketch file").into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "Missing video or sketch file"}));
}

#[test]
fn client_errors_keep_their_status() {
    let err = ApiError::from_composer(ComposerError::validation("duration"), "Failed");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(err.message.contains("duration"));
}

#[test]
fn environment_errors_become_generic_500s() {
    let err = ApiError::from_composer(
        ComposerError::render_invocation("ffmpeg exited with 1: secret path"),
        "Failed to compose video",
    );
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message, "Failed to compose video");
}
