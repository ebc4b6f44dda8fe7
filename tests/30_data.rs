mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn data_routes_require_authentication() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/api/data/notes", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn collection_names_are_validated_before_any_data_access() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_token(Uuid::new_v4(), common::OWNER_EMAIL);

    // Validation happens ahead of the authorization gate, so this is a
    // deterministic 400 even with no database behind the server
    let res = client
        .get(format!("{}/api/data/Not-A-Collection", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/api/data/UPPER", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn record_ids_must_be_uuids() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_token(Uuid::new_v4(), common::OWNER_EMAIL);

    let res = client
        .get(format!("{}/api/data/notes/not-a-uuid", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
