// Integration tests for the Snowflake SQL API driver against a mock server.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mockito::{Matcher, Server};
use near_fees::domain::models::{CanonicalKey, ColumnType, WarehouseConfig};
use near_fees::infrastructure::credentials::decode_pem;
use near_fees::infrastructure::snowflake::{KeyPairClaims, KeyPairSigner, SqlApiDriver};
use near_fees::{
    Authenticator, ConnectionParams, ResolvedCredential, WarehouseDriver, WarehouseError,
};
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use serde_json::json;
use std::time::Duration;
use zeroize::Zeroizing;

const NOPASS_PEM: &str = include_str!("fixtures/rsa_key_nopass.p8");
const ENCRYPTED_PEM: &str = include_str!("fixtures/rsa_key.p8");
const FINGERPRINT: &str = include_str!("fixtures/public_key_fingerprint.txt");
const PASSPHRASE: &str = "fixture-passphrase";

const JWT_BEARER: &str = r"^Bearer [A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$";

fn canonical_key() -> CanonicalKey {
    decode_pem(NOPASS_PEM, None, "fixture").unwrap()
}

fn key_pair_params() -> ConnectionParams {
    ConnectionParams {
        account: "myorg.acct".to_string(),
        user: "analyst".to_string(),
        authenticator: Authenticator::SnowflakeJwt,
        credential: ResolvedCredential::KeyBytes(canonical_key()),
        warehouse: "COMPUTE_WH".to_string(),
        database: "NEAR".to_string(),
        schema: Some("DEFI".to_string()),
    }
}

fn driver_for(server: &Server) -> SqlApiDriver {
    let config = WarehouseConfig {
        base_url: Some(server.url()),
        ..Default::default()
    };
    SqlApiDriver::new(&config).unwrap()
}

fn fees_response() -> serde_json::Value {
    json!({
        "code": "090001",
        "message": "Statement executed successfully.",
        "statementHandle": "01b2-handle",
        "resultSetMetaData": {
            "numRows": 2,
            "format": "jsonv2",
            "rowType": [
                {"name": "ASSET", "type": "text"},
                {"name": "FEE_EVENTS", "type": "fixed", "scale": 0},
                {"name": "TOTAL_USD", "type": "fixed", "scale": 2}
            ],
            "partitionInfo": [{"rowCount": 2}]
        },
        "data": [["USDC", "42", "1050.25"], ["wNEAR", "7", null]]
    })
}

#[tokio::test]
async fn test_key_pair_statement_round_trip() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v2/statements")
        .match_header("authorization", Matcher::Regex(JWT_BEARER.to_string()))
        .match_header("x-snowflake-authorization-token-type", "KEYPAIR_JWT")
        .match_header("accept", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "statement": "SELECT * FROM fees",
            "warehouse": "COMPUTE_WH",
            "database": "NEAR",
            "schema": "DEFI"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(fees_response().to_string())
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();
    let raw = session.execute("SELECT * FROM fees").await.unwrap();

    mock.assert_async().await;
    assert_eq!(raw.columns.len(), 3);
    assert_eq!(raw.columns[0].name, "ASSET");
    assert_eq!(raw.columns[2].column_type, ColumnType::Fixed { scale: 2 });
    let first_row: Vec<Option<String>> = vec![Some("USDC".into()), Some("42".into()), Some("1050.25".into())];
    assert_eq!(raw.rows[0], first_row);
    assert_eq!(raw.rows[1][2], None);
}

#[tokio::test]
async fn test_extra_partitions_are_fetched_in_order() {
    let mut server = Server::new_async().await;
    let mut body = fees_response();
    body["resultSetMetaData"]["numRows"] = json!(4);
    body["resultSetMetaData"]["partitionInfo"] = json!([{"rowCount": 2}, {"rowCount": 1}, {"rowCount": 1}]);

    let first = server
        .mock("POST", "/api/v2/statements")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/v2/statements/01b2-handle")
        .match_query(Matcher::UrlEncoded("partition".into(), "1".into()))
        .match_header("x-snowflake-authorization-token-type", "KEYPAIR_JWT")
        .with_status(200)
        .with_body(json!({"data": [["AURORA", "3", "9.99"]]}).to_string())
        .create_async()
        .await;
    let third = server
        .mock("GET", "/api/v2/statements/01b2-handle")
        .match_query(Matcher::UrlEncoded("partition".into(), "2".into()))
        .with_status(200)
        .with_body(json!({"data": [["ZEC", "1", "0.50"]]}).to_string())
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();
    let raw = session.execute("SELECT 1").await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
    let assets: Vec<_> = raw.rows.iter().map(|row| row[0].clone().unwrap()).collect();
    assert_eq!(assets, vec!["USDC", "wNEAR", "AURORA", "ZEC"]);
}

#[tokio::test]
async fn test_statement_without_result_set() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/statements")
        .with_status(200)
        .with_body(json!({"code": "090001", "statementHandle": "h"}).to_string())
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();
    let raw = session.execute("USE WAREHOUSE COMPUTE_WH").await.unwrap();
    assert!(raw.columns.is_empty());
    assert!(raw.rows.is_empty());
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/statements")
        .with_status(401)
        .with_body(json!({"code": "390144", "message": "JWT token is invalid."}).to_string())
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();
    match session.execute("SELECT 1").await {
        Err(WarehouseError::Authentication(message)) => assert_eq!(message, "JWT token is invalid."),
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pending_and_server_errors() {
    let mut server = Server::new_async().await;
    let _pending = server
        .mock("POST", "/api/v2/statements")
        .match_body(Matcher::PartialJson(json!({"statement": "SELECT SLOW"})))
        .with_status(202)
        .with_body(json!({"code": "333334", "statementHandle": "01b2-slow"}).to_string())
        .create_async()
        .await;
    let _failed = server
        .mock("POST", "/api/v2/statements")
        .match_body(Matcher::PartialJson(json!({"statement": "SELEC 1"})))
        .with_status(422)
        .with_body(json!({"code": "001003", "message": "SQL compilation error"}).to_string())
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();

    match session.execute("SELECT SLOW").await {
        Err(WarehouseError::StatementPending { handle }) => assert_eq!(handle, "01b2-slow"),
        other => panic!("expected pending statement, got {other:?}"),
    }
    match session.execute("SELEC 1").await {
        Err(WarehouseError::Api { status, message }) => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "SQL compilation error");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_body_is_scrubbed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/statements")
        .with_status(403)
        .with_body("rejected Authorization: Bearer abc.def.ghi")
        .create_async()
        .await;

    let session = driver_for(&server).connect(&key_pair_params()).await.unwrap();
    let err = session.execute("SELECT 1").await.unwrap_err();
    assert_eq!(err.kind(), "AuthenticationError");
    assert!(!err.to_string().contains("abc.def.ghi"));
}

#[tokio::test]
async fn test_token_session_uses_oauth_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v2/statements")
        .match_header("authorization", "Bearer pat-token-123")
        .match_header("x-snowflake-authorization-token-type", "OAUTH")
        .with_status(200)
        .with_body(fees_response().to_string())
        .create_async()
        .await;

    let mut params = key_pair_params();
    params.authenticator = Authenticator::OAuth;
    params.credential = ResolvedCredential::Token(Zeroizing::new("pat-token-123".to_string()));

    let session = driver_for(&server).connect(&params).await.unwrap();
    session.execute("SELECT 1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_encrypted_key_file_is_decrypted_on_connect() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("rsa_key.p8");
    std::fs::write(&path, ENCRYPTED_PEM).unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v2/statements")
        .match_header("authorization", Matcher::Regex(JWT_BEARER.to_string()))
        .with_status(200)
        .with_body(fees_response().to_string())
        .create_async()
        .await;

    let mut params = key_pair_params();
    params.credential = ResolvedCredential::KeyFile {
        path: path.clone(),
        passphrase: Some(Zeroizing::new(PASSPHRASE.to_string())),
    };
    let session = driver_for(&server).connect(&params).await.unwrap();
    session.execute("SELECT 1").await.unwrap();
    mock.assert_async().await;

    params.credential = ResolvedCredential::KeyFile { path, passphrase: None };
    let err = driver_for(&server).connect(&params).await.err().unwrap();
    assert_eq!(err.kind(), "EncryptedKeyWithoutPasswordError");
}

#[test]
fn test_issued_jwt_carries_fingerprint_issuer() {
    let signer = KeyPairSigner::from_canonical(&canonical_key(), "fixture").unwrap();
    let token = signer
        .issue("myorg.acct", "analyst", Utc::now(), Duration::from_secs(3540))
        .unwrap();

    let public_der = RsaPrivateKey::from_pkcs8_pem(NOPASS_PEM)
        .unwrap()
        .to_public_key()
        .to_pkcs1_der()
        .unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_aud = false;
    let claims = decode::<KeyPairClaims>(&token, &DecodingKey::from_rsa_der(public_der.as_bytes()), &validation)
        .unwrap()
        .claims;

    assert_eq!(claims.sub, "MYORG-ACCT.ANALYST");
    assert_eq!(claims.iss, format!("MYORG-ACCT.ANALYST.SHA256:{}", FINGERPRINT.trim()));
    assert_eq!(claims.exp - claims.iat, 3540);
}
