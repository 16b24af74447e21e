mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use course_platform_api::auth::Role;
use common::TestServer;

#[tokio::test]
async fn admin_lists_active_sessions() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.session_for(1, Role::Admin).await?;
    server.session_for(7, Role::User).await?;
    server.session_for(7, Role::User).await?;

    let res = server.get("/api/admin/tokens/7", Some(&admin)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["userId"], 7);
    assert_eq!(body["data"]["activeTokens"], 2);
    let tokens = body["data"]["tokens"].as_array().expect("tokens array");
    assert_eq!(tokens.len(), 2);
    // Digests never leave the server
    assert!(tokens.iter().all(|t| t.get("token_hash").is_none()));
    Ok(())
}

#[tokio::test]
async fn admin_revokes_all_sessions_of_user() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.session_for(1, Role::Admin).await?;
    let first = server.session_for(7, Role::User).await?;
    let second = server.session_for(7, Role::User).await?;

    let res = server.delete("/api/admin/tokens/7", Some(&admin)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["revoked"], 2);

    for token in [&first, &second] {
        let res = server.get("/api/user/enrolled-courses", Some(token)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // The admin's own session is untouched
    assert!(server.state.sessions.verify(&admin).await.is_some());
    Ok(())
}

#[tokio::test]
async fn cleanup_deletes_revoked_rows() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.session_for(1, Role::Admin).await?;
    server.session_for(7, Role::User).await?;
    server.session_for(7, Role::User).await?;
    server.state.sessions.revoke_all_for_user(7).await?;

    let res = server.post("/api/admin/tokens/cleanup", Some(&admin)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["cleanedUp"], 2);

    // Only the admin's live session remains
    assert_eq!(server.store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_user_id_is_bad_request() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.session_for(1, Role::Admin).await?;

    let res = server.get("/api/admin/tokens/abc", Some(&admin)).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid user ID");
    Ok(())
}
