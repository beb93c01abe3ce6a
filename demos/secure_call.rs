//! Secure call demo
//!
//! Runs a few calls through the full pipeline against a live endpoint:
//! 1. Loads network options from `SECURE_RPC_CONFIG` (YAML) or defaults, with env overrides
//! 2. Installs an AES session secret so POST JSON bodies are signed and encrypted
//! 3. Registers a login-expired hook that clears the stored token
//!
//! Usage: SECURE_RPC_BASE_URL=https://api.example.com/v1/ cargo run --example secure_call

use anyhow::Context;
use secure_rpc::{ApiResult, AppInfo, CryptoScheme, NetworkClient, NetworkOptions, TokenManager};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("secure_rpc=debug")),
        )
        .init();

    let options = match std::env::var("SECURE_RPC_CONFIG") {
        Ok(path) => NetworkOptions::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => NetworkOptions {
            encrypt_params: true,
            ..Default::default()
        },
    }
    .with_env_overrides();
    let base_url = std::env::var("SECURE_RPC_BASE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080/api/".to_string());

    let tokens = Arc::new(TokenManager::open(
        "secure-call-demo",
        std::env::temp_dir().join("secure-call-demo.credentials.json"),
    ));
    let hook_tokens = tokens.clone();
    let client = NetworkClient::builder()
        .options(options)
        .app_info(AppInfo::new("secure-call-demo").with_version("1", "0.1.0"))
        .token_manager(tokens)
        .on_login_expired(move |event| {
            tracing::warn!(url = %event.url, "login expired, clearing token");
            hook_tokens.clear();
        })
        .build()?;
    println!("token backend: {}", client.tokens().backend());

    let secret = client.security().generate_anonymous_secret()?;
    println!("anonymous session secret: {} chars", secret.len());

    let api = client.endpoint(&base_url)?;
    let login: ApiResult<Value> = api
        .post("user/login")
        .json(&json!({"name": "demo", "password": "demo"}))
        .execute();
    println!("login -> code={} msg={:?}", login.code, login.msg);

    if let Some(token) = login.data().and_then(|d| d.get("token")).and_then(Value::as_str) {
        client.tokens().reset_token(token);
        client.security().reset_secret(CryptoScheme::Aes, token)?;
    }

    let profile: ApiResult<Value> = api.get("user/profile").query("id", 1).execute();
    if profile.is_success() {
        println!("profile: {}", serde_json::to_string_pretty(&profile.data)?);
    } else {
        println!("profile failed: code={} msg={:?}", profile.code, profile.msg);
    }

    Ok(())
}
