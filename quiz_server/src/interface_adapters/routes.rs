use crate::interface_adapters::handlers::{
    clear_results, get_quiz_status, list_results, root, set_quiz_status, submit_result,
};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/results",
            get(list_results).post(submit_result).delete(clear_results),
        )
        .route("/quiz-status", get(get_quiz_status).post(set_quiz_status))
        .route("/ws", get(ws_handler))
        // The quiz pages are served from a different origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::frameworks::db;
    use crate::use_cases::{Gateway, SessionRegistry};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn build_test_state(enforce_active: bool) -> AppState {
        let db = db::init_pool("sqlite::memory:", 1)
            .await
            .expect("expected in-memory database");
        let admin = Identity::parse("admin").expect("expected valid identity");
        let registry = Arc::new(SessionRegistry::new(admin));
        let gateway = Arc::new(Gateway::new(registry.clone(), 16));

        AppState {
            db,
            registry,
            gateway,
            enforce_active,
        }
    }

    async fn build_test_app() -> Router {
        app(build_test_state(false).await)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("expected request to build");

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, payload)
    }

    #[tokio::test]
    async fn when_deployment_is_fresh_then_quiz_status_is_inactive() {
        let app = build_test_app().await;

        let (status, payload) = send(&app, "GET", "/quiz-status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({ "active": false }));
    }

    #[tokio::test]
    async fn when_quiz_status_is_set_then_it_is_returned_and_persisted() {
        let app = build_test_app().await;

        let (status, payload) =
            send(&app, "POST", "/quiz-status", Some(json!({ "active": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({ "success": true, "active": true }));

        let (_, payload) = send(&app, "GET", "/quiz-status", None).await;
        assert_eq!(payload, json!({ "active": true }));
    }

    #[tokio::test]
    async fn when_quiz_status_payload_lacks_active_then_returns_400() {
        let app = build_test_app().await;

        let (status, payload) = send(&app, "POST", "/quiz-status", Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["success"], false);
        assert_eq!(payload["message"], "active must be a boolean");
    }

    #[tokio::test]
    async fn when_active_is_not_a_boolean_then_returns_400_with_message() {
        let app = build_test_app().await;

        let (status, payload) =
            send(&app, "POST", "/quiz-status", Some(json!({ "active": "yes" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            payload,
            json!({ "success": false, "message": "active must be a boolean" })
        );

        let (_, payload) = send(&app, "GET", "/quiz-status", None).await;
        assert_eq!(payload, json!({ "active": false }));
    }

    #[tokio::test]
    async fn when_name_is_not_a_string_then_returns_400_and_no_row_is_created() {
        let app = build_test_app().await;

        let (status, payload) = send(
            &app,
            "POST",
            "/results",
            Some(json!({ "name": 5, "score": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            payload,
            json!({ "success": false, "message": "name must be a string" })
        );

        let (_, payload) = send(&app, "GET", "/results", None).await;
        assert_eq!(payload, json!([]));
    }

    #[tokio::test]
    async fn when_body_is_not_json_then_returns_400_with_message() {
        let app = build_test_app().await;

        for uri in ["/results", "/quiz-status"] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .expect("expected request to build");

            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let bytes = to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("expected response body");
            let payload: Value =
                serde_json::from_slice(&bytes).expect("expected json error body");
            assert_eq!(payload["success"], false);
            assert!(payload["message"].is_string());
        }
    }

    #[tokio::test]
    async fn when_results_are_submitted_then_list_is_ranked_by_score_then_date() {
        let app = build_test_app().await;

        for (name, score, date) in [
            ("Sam", 9, "2024-01-01T10:00:00Z"),
            ("Ana", 9, "2024-01-01T09:00:00Z"),
            ("Lee", 11, "2024-01-02T00:00:00Z"),
        ] {
            let (status, payload) = send(
                &app,
                "POST",
                "/results",
                Some(json!({ "name": name, "score": score, "date": date })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(payload["success"], true);
            assert!(payload["id"].is_i64());
        }

        let (status, payload) = send(&app, "GET", "/results", None).await;
        assert_eq!(status, StatusCode::OK);

        let rows = payload.as_array().expect("expected json array");
        let summary: Vec<(&str, i64, &str)> = rows
            .iter()
            .map(|row| {
                (
                    row["name"].as_str().unwrap_or_default(),
                    row["score"].as_i64().unwrap_or_default(),
                    row["date"].as_str().unwrap_or_default(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Lee", 11, "2024-01-02T00:00:00.000000000Z"),
                ("Ana", 9, "2024-01-01T09:00:00.000000000Z"),
                ("Sam", 9, "2024-01-01T10:00:00.000000000Z"),
            ]
        );
    }

    #[tokio::test]
    async fn when_name_is_empty_then_returns_400_and_no_row_is_created() {
        let app = build_test_app().await;

        let (status, payload) = send(
            &app,
            "POST",
            "/results",
            Some(json!({ "name": "", "score": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["success"], false);
        assert_eq!(payload["message"], "name is required");

        let (_, payload) = send(&app, "GET", "/results", None).await;
        assert_eq!(payload, json!([]));
    }

    #[tokio::test]
    async fn when_score_is_missing_or_not_a_number_then_returns_400() {
        let app = build_test_app().await;

        let (status, payload) =
            send(&app, "POST", "/results", Some(json!({ "name": "Kim" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["message"], "score is required");

        let (status, payload) = send(
            &app,
            "POST",
            "/results",
            Some(json!({ "name": "Kim", "score": "ten" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["message"], "score must be a non-negative whole number");

        let (_, payload) = send(&app, "GET", "/results", None).await;
        assert_eq!(payload, json!([]));
    }

    #[tokio::test]
    async fn when_results_are_cleared_then_list_is_empty() {
        let app = build_test_app().await;
        for score in [1, 2, 3] {
            send(
                &app,
                "POST",
                "/results",
                Some(json!({ "name": "Kim", "score": score })),
            )
            .await;
        }

        let (status, payload) = send(&app, "DELETE", "/results", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["success"], true);
        assert_eq!(payload["cleared"], 3);

        let (_, payload) = send(&app, "GET", "/results", None).await;
        assert_eq!(payload, json!([]));
    }

    #[tokio::test]
    async fn when_gate_is_enforced_and_quiz_is_closed_then_submit_returns_409() {
        let state = build_test_state(true).await;
        let registry = state.registry.clone();
        let app = app(state);

        let (status, payload) = send(
            &app,
            "POST",
            "/results",
            Some(json!({ "name": "Kim", "score": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(payload["message"], "quiz is not active");

        registry.set_active(true);
        let (status, _) = send(
            &app,
            "POST",
            "/results",
            Some(json!({ "name": "Kim", "score": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn when_store_is_unavailable_then_returns_500_with_error() {
        let state = build_test_state(false).await;
        state.db.close().await;
        let app = app(state);

        let (status, payload) = send(&app, "GET", "/results", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["success"], false);
        assert!(payload["error"].is_string());
    }

    #[tokio::test]
    async fn when_results_route_is_called_with_put_then_returns_405() {
        let app = build_test_app().await;

        let (status, _) = send(&app, "PUT", "/results", Some(json!({}))).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn when_route_does_not_exist_then_returns_404() {
        let app = build_test_app().await;

        let (status, _) = send(&app, "GET", "/api/does-not-exist", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
