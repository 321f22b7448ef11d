mod common;

use common::GridClashServer;

#[tokio::test]
async fn welcome_page_suggests_keys() {
    let server = GridClashServer::start(&["--board-size", "12"]).await;

    let (status, body) = server.get("/").await;
    assert!(status.is_success());
    assert!(body.contains("12x12"), "board size missing from rules: {body}");
    assert_eq!(body.matches("<li><a href=\"/").count(), 5);

    server.shutdown().await;
}

#[tokio::test]
async fn session_route_reports_ready() {
    let server = GridClashServer::start(&[]).await;

    let (status, body) = server.get("/jungle").await;
    assert!(status.is_success());
    assert!(body.contains("Game 'jungle' is ready"));

    // Reuse is transparent to the caller.
    let (status, _) = server.get("/jungle").await;
    assert!(status.is_success());

    server.shutdown().await;
}

#[tokio::test]
async fn healthz_responds() {
    let server = GridClashServer::start(&[]).await;
    let (status, body) = server.get("/healthz").await;
    assert!(status.is_success());
    assert_eq!(body, "ok");
    server.shutdown().await;
}
