use std::time::Duration;

use region_rankings::config::ProbeConfig;
use region_rankings::validator::{HttpProbe, ReachabilityProbe};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe() -> HttpProbe {
    HttpProbe::new(&ProbeConfig {
        timeout: Duration::from_secs(2),
        max_redirects: 3,
        ..ProbeConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn ok_status_is_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(probe().is_reachable(&format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn error_status_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(!probe().is_reachable(&format!("{}/gone", server.uri())).await);
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(probe().is_reachable(&format!("{}/old", server.uri())).await);
}

#[tokio::test]
async fn redirect_loop_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", format!("{}/loop", server.uri())))
        .mount(&server)
        .await;

    assert!(!probe().is_reachable(&format!("{}/loop", server.uri())).await);
}

#[tokio::test]
async fn slow_site_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(&ProbeConfig {
        timeout: Duration::from_millis(50),
        ..ProbeConfig::default()
    })
    .unwrap();
    assert!(!probe.is_reachable(&server.uri()).await);
}

#[tokio::test]
async fn unreachable_host_is_unreachable() {
    assert!(!probe().is_reachable("http://127.0.0.1:1/").await);
}
