mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use course_platform_api::config::AppConfig;
use common::TestServer;

async fn signin(server: &TestServer, forwarded_for: Option<&str>) -> Result<StatusCode> {
    let mut request = server.post("/api/auth/signin", None).json(&json!({}));
    if let Some(ip) = forwarded_for {
        request = request.header("x-forwarded-for", ip);
    }
    Ok(request.send().await?.status())
}

#[tokio::test]
async fn signin_limited_after_five_attempts() -> Result<()> {
    let server = TestServer::start().await?;

    for _ in 0..5 {
        assert_eq!(signin(&server, None).await?, StatusCode::BAD_REQUEST);
    }

    let res = server.post("/api/auth/signin", None).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "TOO_MANY_REQUESTS");
    Ok(())
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() -> Result<()> {
    let server = TestServer::start().await?;

    for i in 0..5 {
        let ip = format!("203.0.113.{}", i + 1);
        assert_eq!(signin(&server, Some(&ip)).await?, StatusCode::BAD_REQUEST);
    }

    // Without a trusted proxy the socket peer is the key
    assert_eq!(signin(&server, Some("203.0.113.99")).await?, StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn trusted_proxy_limits_each_forwarded_client() -> Result<()> {
    let mut config = AppConfig::development();
    config.api.trust_proxy_headers = true;
    let server = TestServer::start_with(config).await?;

    for _ in 0..5 {
        assert_eq!(signin(&server, Some("203.0.113.10")).await?, StatusCode::BAD_REQUEST);
    }
    assert_eq!(signin(&server, Some("203.0.113.10")).await?, StatusCode::TOO_MANY_REQUESTS);

    // Another client behind the same proxy keeps its own window
    assert_eq!(signin(&server, Some("203.0.113.11")).await?, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn signup_limited_after_three_attempts() -> Result<()> {
    let server = TestServer::start().await?;

    for _ in 0..3 {
        let res = server
            .post("/api/auth/signup", None)
            .json(&json!({ "name": "A" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = server
        .post("/api/auth/signup", None)
        .json(&json!({ "name": "A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn signin_validates_email_format() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .post("/api/auth/signin", None)
        .json(&json!({ "email": "not-an-email", "password": "whatever" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid email format");
    Ok(())
}
