//! Integration tests for Nevyra.
//!
//! Each test starts the storefront backend in-process on an ephemeral
//! port and drives it through the real client library over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nevyra-integration-tests
//! ```

use std::net::SocketAddr;
use std::ops::Deref;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use nevyra_client::{ClientConfig, NevyraClient};
use nevyra_storefront::config::StorefrontConfig;
use nevyra_storefront::state::AppState;

/// Email granted admin access on every test server.
pub const ADMIN_EMAIL: &str = "admin@nevyra.test";

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

const PAYMENT_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

/// A backend serving the demo catalog on `127.0.0.1:<random port>`.
///
/// The server task is aborted on drop.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected or the port cannot be bound.
    pub async fn start() -> Self {
        let config = StorefrontConfig::from_source(|key| match key {
            "NEVYRA_PAYMENT_SECRET" => Some(PAYMENT_SECRET.to_string()),
            "NEVYRA_ADMIN_EMAILS" => Some(ADMIN_EMAIL.to_string()),
            _ => None,
        })
        .expect("test configuration is valid");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("listener has an address");
        let app = nevyra_storefront::app(AppState::new(config));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self { addr, handle }
    }

    /// Server root, e.g. `http://127.0.0.1:53124`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// API root the client talks to.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("{}/api", self.base_url())).expect("valid API URL")
    }

    /// A fresh client with its own storage and a short gateway delay.
    #[must_use]
    pub fn client(&self) -> TestClient {
        self.client_with_delay(Duration::from_millis(50))
    }

    /// A fresh client whose simulated gateway waits `delay`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the client cannot be created.
    #[must_use]
    pub fn client_with_delay(&self, delay: Duration) -> TestClient {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = ClientConfig::with_data_dir(dir.path());
        config.api_url = self.api_url();
        config.gateway_delay = delay;
        config.http_timeout = Duration::from_secs(10);

        let client = NevyraClient::open(config).expect("Failed to open client");
        TestClient { client, _dir: dir }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A client plus the temporary directory holding its persisted state.
pub struct TestClient {
    client: NevyraClient,
    _dir: TempDir,
}

impl Deref for TestClient {
    type Target = NevyraClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
