//! Coordination of the bridge round trip
//!
//! The orchestrator:
//! 1. Verifies both networks once at startup
//! 2. Sends the outbound leg, waits for its receipt
//! 3. Sends the return leg, waits for its receipt
//! 4. Repeats until the round limit or a stop request

pub mod engine;
pub mod leg;

pub use engine::{BridgeOrchestrator, OrchestratorConfig};
pub use leg::{Direction, LegRoute, RoundLimit};
