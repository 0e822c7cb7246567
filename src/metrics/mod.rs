//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Leg outcomes per direction and chain
//! - Completed rounds
//! - Time from submission to confirmation

use crate::coordination::Direction;
use crate::error::{BridgeError, BridgeResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref LEGS_CONFIRMED: CounterVec = register_counter_vec!(
        "bridge_shuttle_legs_confirmed_total",
        "Total legs confirmed on chain",
        &["direction", "chain_id"]
    ).unwrap();

    pub static ref LEGS_FAILED: CounterVec = register_counter_vec!(
        "bridge_shuttle_legs_failed_total",
        "Total legs that failed before confirmation",
        &["direction", "chain_id"]
    ).unwrap();

    pub static ref ROUNDS_COMPLETED: Counter = register_counter!(
        "bridge_shuttle_rounds_completed_total",
        "Total rounds completed, successful or not"
    ).unwrap();

    pub static ref CONFIRMATION_LATENCY: HistogramVec = register_histogram_vec!(
        "bridge_shuttle_confirmation_latency_seconds",
        "Time from nonce lookup to confirmed receipt",
        &["chain_id"],
        vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> BridgeResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| BridgeError::Config(format!("Cannot bind metrics port {}: {}", self.port, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| BridgeError::Config(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    render().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Text exposition of all registered metrics
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

// Helper functions to record metrics

pub fn record_leg_confirmed(direction: Direction, chain_id: u64) {
    LEGS_CONFIRMED
        .with_label_values(&[direction.as_str(), &chain_id.to_string()])
        .inc();
}

pub fn record_leg_failed(direction: Direction, chain_id: u64) {
    LEGS_FAILED
        .with_label_values(&[direction.as_str(), &chain_id.to_string()])
        .inc();
}

pub fn record_round_completed() {
    ROUNDS_COMPLETED.inc();
}

pub fn record_confirmation_latency(chain_id: u64, latency_secs: f64) {
    CONFIRMATION_LATENCY
        .with_label_values(&[&chain_id.to_string()])
        .observe(latency_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_leg_counters() {
        record_leg_confirmed(Direction::Outbound, 424242);
        record_leg_failed(Direction::Return, 424242);

        let text = render().unwrap();
        assert!(text.contains("bridge_shuttle_legs_confirmed_total"));
        assert!(text.contains("direction=\"return\""));
        assert!(text.contains("chain_id=\"424242\""));
    }
}
