//! API Integration Tests for the NetScaler exporter
//!
//! End-to-end scrapes against fake NITRO appliances served on loopback.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use netscaler_exporter::collector::Exporter;
use netscaler_exporter::config::AppConfig;
use netscaler_exporter::netscaler::{Scheme, TargetConfig};
use netscaler_exporter::server::{AppState, create_router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

/// Bind a random loopback port. `None` if the sandbox forbids it.
async fn bind() -> Option<TcpListener> {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(l) => Some(l),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => None,
        Err(e) => panic!("Failed to bind random port: {e}"),
    }
}

/// Serve `router` and return its address.
async fn spawn(router: Router) -> Option<SocketAddr> {
    let listener = bind().await?;
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Some(addr)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("X-NITRO-USER").and_then(|v| v.to_str().ok()) == Some("nsroot")
        && headers.get("X-NITRO-PASS").and_then(|v| v.to_str().ok()) == Some("secret")
}

/// Fake appliance answering both stat sections.
fn appliance() -> Router {
    Router::new()
        .route(
            "/nitro/v1/stat/ns",
            get(|headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({
                            "errorcode": 354,
                            "message": "Invalid username or password"
                        })),
                    )
                        .into_response();
                }
                axum::Json(json!({
                    "errorcode": 0,
                    "message": "Done",
                    "ns": {
                        "cpuusagepcnt": 7.5,
                        "memusagepcnt": "41.2",
                        "httptotrequests": "5000",
                        "tcpcurclientconn": 12
                    }
                }))
                .into_response()
            }),
        )
        .route(
            "/nitro/v1/stat/lbvserver",
            get(|headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                axum::Json(json!({
                    "errorcode": 0,
                    "message": "Done",
                    "lbvserver": [
                        {
                            "name": "vs_web",
                            "state": "UP",
                            "totalrequests": "900",
                            "vslbhealth": 100
                        },
                        {
                            "name": "vs_api",
                            "state": "DOWN",
                            "totalrequests": 3,
                            "vslbhealth": "0"
                        }
                    ]
                }))
                .into_response()
            }),
        )
}

/// Address nothing listens on.
async fn refused_addr() -> Option<SocketAddr> {
    let listener = bind().await?;
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Some(addr)
}

fn target(addr: SocketAddr) -> TargetConfig {
    TargetConfig::new(addr.to_string(), "nsroot", "secret")
        .with_scheme(Scheme::Http)
        .with_timeout(Duration::from_secs(2))
}

/// Start the exporter for `targets` and return its base URL.
async fn start_exporter(targets: &[TargetConfig]) -> Option<String> {
    let exporter = Exporter::from_targets(targets).expect("Failed to build exporter");
    let router = create_router(AppState {
        exporter: Arc::new(exporter),
        metrics_path: "/metrics".to_string(),
    });
    let addr = spawn(router).await?;
    Some(format!("http://{}", addr))
}

// =============================================================================
// Scrape Tests
// =============================================================================

#[tokio::test]
async fn test_scrape_healthy_and_unreachable_targets() {
    let Some(ns1) = spawn(appliance()).await else {
        return;
    };
    let Some(ns2) = refused_addr().await else {
        return;
    };
    let Some(base_url) = start_exporter(&[target(ns1), target(ns2)]).await else {
        return;
    };

    let resp = reqwest::get(format!("{}/metrics", base_url))
        .await
        .expect("Failed to scrape");
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    let body = resp.text().await.unwrap();

    assert!(body.contains(&format!(r#"netscaler_up{{ns_host="{}"}} 1"#, ns1)));
    assert!(body.contains(&format!(r#"netscaler_up{{ns_host="{}"}} 0"#, ns2)));
    assert!(body.contains(&format!(
        r#"netscaler_cpu_usage_percent{{ns_host="{}"}} 7.5"#,
        ns1
    )));
    assert!(body.contains(&format!(
        r#"netscaler_http_requests_total{{ns_host="{}"}} 5000"#,
        ns1
    )));
    assert!(body.contains(&format!(
        r#"netscaler_vserver_up{{ns_host="{}",vserver="vs_web"}} 1"#,
        ns1
    )));
    assert!(body.contains(&format!(
        r#"netscaler_vserver_up{{ns_host="{}",vserver="vs_api"}} 0"#,
        ns1
    )));
    assert!(body.contains(&format!(
        r#"netscaler_vserver_requests_total{{ns_host="{}",vserver="vs_web"}} 900"#,
        ns1
    )));

    // The unreachable target contributes only its up gauge
    let ns2_label = format!(r#"ns_host="{}""#, ns2);
    let ns2_lines = body
        .lines()
        .filter(|l| !l.starts_with('#') && l.contains(&ns2_label))
        .count();
    assert_eq!(ns2_lines, 1);
}

#[tokio::test]
async fn test_scrape_bad_credentials() {
    let Some(ns1) = spawn(appliance()).await else {
        return;
    };
    let wrong = TargetConfig::new(ns1.to_string(), "nsroot", "wrong")
        .with_scheme(Scheme::Http)
        .with_timeout(Duration::from_secs(2));
    let Some(base_url) = start_exporter(&[wrong]).await else {
        return;
    };

    let body = reqwest::get(format!("{}/metrics", base_url))
        .await
        .expect("Failed to scrape")
        .text()
        .await
        .unwrap();

    assert!(body.contains(&format!(r#"netscaler_up{{ns_host="{}"}} 0"#, ns1)));
    assert!(!body.contains("netscaler_vserver_"));
}

#[tokio::test]
async fn test_scrape_without_targets() {
    let Some(base_url) = start_exporter(&[]).await else {
        return;
    };

    let resp = reqwest::get(format!("{}/metrics", base_url))
        .await
        .expect("Failed to scrape");
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_scrapes_are_independent() {
    let Some(ns1) = spawn(appliance()).await else {
        return;
    };
    let Some(base_url) = start_exporter(&[target(ns1)]).await else {
        return;
    };
    let client = reqwest::Client::new();

    let first = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(first, second);
}

// =============================================================================
// Probe and Schema Tests
// =============================================================================

#[tokio::test]
async fn test_health_probe() {
    let Some(base_url) = start_exporter(&[]).await else {
        return;
    };

    let resp = reqwest::get(format!("{}/healthz", base_url))
        .await
        .expect("Failed to send healthz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse healthz response");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_describe_api() {
    // Describe must answer even when every target is down
    let Some(ns1) = refused_addr().await else {
        return;
    };
    let Some(base_url) = start_exporter(&[target(ns1)]).await else {
        return;
    };

    let resp = reqwest::get(format!("{}/api/describe", base_url))
        .await
        .expect("Failed to fetch schema");
    assert_eq!(resp.status(), 200);

    let schema: Vec<Value> = resp.json().await.expect("Failed to parse schema");
    let names: Vec<&str> = schema.iter().filter_map(|m| m["name"].as_str()).collect();
    assert!(names.contains(&"netscaler_up"));
    assert!(names.contains(&"netscaler_vserver_requests_total"));

    let requests = schema
        .iter()
        .find(|m| m["name"] == "netscaler_vserver_requests_total")
        .unwrap();
    assert_eq!(requests["kind"], "counter");
    assert_eq!(requests["label_names"], json!(["ns_host", "vserver"]));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[tokio::test]
async fn test_config_file_to_scrape() {
    let Some(ns1) = spawn(appliance()).await else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        format!(
            concat!(
                "server:\n",
                "  metrics_path: /scrape\n",
                "netscaler:\n",
                "  static_targets:\n",
                "    - host: \"{}\"\n",
                "      scheme: http\n",
                "      username: nsroot\n",
                "      password: \"${{NONEXISTENT_NS_PASSWORD_4242:-secret}}\"\n",
                "      timeout: 2s\n",
            ),
            ns1
        ),
    )
    .unwrap();

    let config = AppConfig::load(&path).expect("Failed to load config");
    let exporter = Exporter::from_targets(&config.netscaler.static_targets).unwrap();
    let router = create_router(AppState {
        exporter: Arc::new(exporter),
        metrics_path: config.server.metrics_path.clone(),
    });
    let Some(addr) = spawn(router).await else {
        return;
    };

    let body = reqwest::get(format!("http://{}/scrape", addr))
        .await
        .expect("Failed to scrape")
        .text()
        .await
        .unwrap();
    assert!(body.contains(&format!(r#"netscaler_up{{ns_host="{}"}} 1"#, ns1)));
}
