//! In-process backend for client tests.

use axum::Router;
use tokio::net::TcpListener;

use culina_core::config::ApiConfig;

use crate::client::ApiClient;

fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap()
}

/// Serve `router` on an ephemeral port and return a client pointed at it.
pub async fn serve(router: Router) -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    client_for(format!("http://{}", addr))
}

/// A client pointed at a port nobody listens on.
pub async fn unreachable() -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    client_for(format!("http://{}", addr))
}
