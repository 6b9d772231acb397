use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edgehmi_gateway::build_app;
use edgehmi_gateway::config::AppConfig;

fn gateway_config(services: &[(&str, String)]) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.gateway.services = services.iter().map(|(n, _)| n.to_string()).collect();
    cfg.upstream.overrides = services
        .iter()
        .map(|(n, u)| (n.to_string(), u.clone()))
        .collect();
    cfg.upstream.connect_timeout_ms = 500;
    cfg.upstream.request_timeout_ms = 5_000;
    cfg
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn get_forwards_path_query_and_headers() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work_order/42"))
        .and(query_param("limit", "10"))
        .and(header("x-operator", "kim"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 42, "order_no": "WO-042"}))
                .insert_header("x-backend-version", "1.0.1"),
        )
        .mount(&backend)
        .await;

    let cfg = gateway_config(&[("work_order", backend.uri())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/work_order/42?limit=10")
                .header("x-operator", "kim")
                .header("connection", "keep-alive")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Backend headers are relayed.
    assert_eq!(
        response.headers().get("x-backend-version").unwrap(),
        "1.0.1"
    );
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"id": 42, "order_no": "WO-042"}));

    // Hop-by-hop headers never reach the backend.
    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("connection"));
}

#[tokio::test]
async fn post_forwards_body_and_relays_created() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/parts_mst"))
        .and(body_json(json!({"part_no": "P-100", "part_name": "bolt"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 7, "part_no": "P-100"}))
                .insert_header("location", "/parts_mst/7"),
        )
        .mount(&backend)
        .await;

    let cfg = gateway_config(&[("parts_mst", backend.uri())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/parts_mst")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"part_no": "P-100", "part_name": "bolt"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("location").unwrap(), "/parts_mst/7");
}

#[tokio::test]
async fn patch_and_delete_are_forwarded() {
    let backend = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/work_order/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/work_order/5"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&backend)
        .await;

    let cfg = gateway_config(&[("work_order", backend.uri())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/work_order/5")
                .header("content-type", "application/json")
                .body(Body::from(json!({"target_cnt": 200}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/work_order/5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn binary_bodies_pass_through_unmodified() {
    let upload = vec![0x01, 0x02, 0xFA, 0xFF, 0x00];
    let download = vec![0x00, 0x9F, 0x92, 0x96];

    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sensor_mst/calibration"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(download.clone(), "application/octet-stream"),
        )
        .mount(&backend)
        .await;

    let cfg = gateway_config(&[("sensor_mst", backend.uri())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sensor_mst/calibration")
                .header("content-type", "application/octet-stream")
                .body(Body::from(upload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, download);

    let received = backend.received_requests().await.unwrap();
    assert_eq!(received[0].body, upload);
}

#[tokio::test]
async fn backend_redirects_are_relayed_not_followed() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alarm_his/latest"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("location", "/alarm_his/latest/"),
        )
        .mount(&backend)
        .await;

    let cfg = gateway_config(&[("alarm_his", backend.uri())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/alarm_his/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/alarm_his/latest/"
    );
}

#[tokio::test]
async fn unreachable_backend_returns_bad_gateway() {
    let cfg = gateway_config(&[("defect_code_mst", "http://127.0.0.1:9".to_string())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/defect_code_mst")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "upstream-unreachable");
}

#[tokio::test]
async fn slow_backend_returns_gateway_timeout() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prod_his"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&backend)
        .await;

    let mut cfg = gateway_config(&[("prod_his", backend.uri())]);
    cfg.upstream.request_timeout_ms = 200;
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/prod_his")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "upstream-timeout");
}

#[tokio::test]
async fn unknown_service_returns_not_found() {
    let cfg = gateway_config(&[("line_mst", "http://127.0.0.1:9".to_string())]);
    let app = build_app(&cfg).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/equip_mst/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "unknown-service");
}

#[tokio::test]
async fn down_backend_only_fails_proxying_not_aggregation() {
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paths": {"/line_mst": {"get": {"tags": ["line_mst"]}}}
        })))
        .mount(&healthy)
        .await;

    let cfg = gateway_config(&[
        ("line_mst", healthy.uri()),
        ("defect_code_mst", "http://127.0.0.1:9".to_string()),
    ]);
    let app = build_app(&cfg).unwrap();

    // Proxying to the dead service fails for that request only.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/defect_code_mst")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // Aggregation still succeeds, with the dead service simply omitted.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths.contains_key("/line_mst"));
}
