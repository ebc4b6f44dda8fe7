mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn grant_endpoints_require_authentication() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/sharing/grants", server.base_url);

    assert_eq!(client.get(&url).send().await?.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        client.post(&url).json(&json!({ "email": "a@b.com" })).send().await?.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        client.delete(&url).json(&json!({ "email": "a@b.com" })).send().await?.status(),
        StatusCode::UNAUTHORIZED
    );
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_manage_grants() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_token(Uuid::new_v4(), "delegate@example.com");

    let res = client
        .post(format!("{}/api/sharing/grants", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "email": "someone@example.com", "access_level": "read" }))
        .send()
        .await?;

    // 403 with a database behind the gate; 503 when the store is unreachable.
    // Either way the request is refused.
    assert!(
        res.status() == StatusCode::FORBIDDEN || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}

#[tokio::test]
async fn owner_grant_with_invalid_level_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_token(Uuid::new_v4(), common::OWNER_EMAIL);

    let res = client
        .post(format!("{}/api/sharing/grants", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "email": "assistant@example.com", "access_level": "root" }))
        .send()
        .await?;

    assert!(
        res.status() == StatusCode::BAD_REQUEST || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}
