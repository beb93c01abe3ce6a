//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use mockito::{Mock, Server, ServerGuard};
use secure_rpc::credential::{MemoryStore, TokenManager};
use secure_rpc::{Endpoint, NetworkClient, NetworkClientBuilder, NetworkOptions};
use std::sync::Arc;

/// Test fixture that owns a mock server and knows its API root.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub fn new() -> Self {
        let server = Server::new();
        let base_url = format!("{}/api/", server.url());
        Self { server, base_url }
    }

    /// Builder preconfigured with in-memory token storage.
    pub fn builder(&self, options: NetworkOptions) -> NetworkClientBuilder {
        NetworkClient::builder()
            .options(options)
            .token_manager(Arc::new(TokenManager::new(Box::new(MemoryStore::new()))))
    }

    pub fn client(&self, options: NetworkOptions) -> NetworkClient {
        self.builder(options).build().expect("client should build")
    }

    pub fn endpoint(&self, client: &NetworkClient) -> Endpoint {
        client.endpoint(&self.base_url).expect("mock url is valid")
    }

    /// Mock a JSON response for `method` on `/api/{path}`.
    pub fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, format!("/api/{}", path).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create()
    }
}
