// grpc.health.v1 client helpers for tests that run the real server.

use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic_health::pb::health_check_response::ServingStatus as WireStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

use crate::health::ServingStatus;

/// Port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Connects to the health server on `port`, waiting for it to come up.
pub async fn health_client(port: u16) -> HealthClient<Channel> {
    let endpoint = format!("http://127.0.0.1:{}", port);
    for _ in 0..100 {
        if let Ok(channel) = Endpoint::new(endpoint.clone()).unwrap().connect().await {
            return HealthClient::new(channel);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("health server on port {} never came up", port);
}

/// Status a grpc.health.v1 Check call returns for `service`.
pub async fn served(client: &mut HealthClient<Channel>, service: &str) -> ServingStatus {
    let response = client
        .check(HealthCheckRequest {
            service: service.to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    match WireStatus::try_from(response.status) {
        Ok(WireStatus::Serving) => ServingStatus::Serving,
        Ok(WireStatus::NotServing) => ServingStatus::NotServing,
        _ => ServingStatus::Unknown,
    }
}
