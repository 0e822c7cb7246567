//! Round-trip orchestration between the two networks

use super::leg::{
    Direction, LegConfirmation, LegOutcome, LegRoute, RoundLimit, RunSummary,
};
use crate::config::Settings;
use crate::error::{BridgeError, BridgeResult};
use crate::tx::{Account, TransactionComposer};

use ethers::types::U256;
use ethers::utils::format_ether;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};
use tracing::{error, info, warn};

/// Run parameters fixed at startup
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Value sent with every leg
    pub value_wei: U256,
    pub rounds: RoundLimit,
    /// Pause after each round
    pub round_delay: Duration,
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> BridgeResult<Self> {
        Ok(Self {
            value_wei: settings.value_wei()?,
            rounds: settings.round_limit(),
            round_delay: settings.round_delay(),
        })
    }
}

/// Drives alternating outbound and return legs
pub struct BridgeOrchestrator {
    config: OrchestratorConfig,
    account: Account,
    outbound: LegRoute,
    return_leg: LegRoute,
    /// Shutdown flag, checked once per round
    shutdown: Arc<RwLock<bool>>,
    /// Wakes the pause between rounds on stop
    stop_notify: Arc<Notify>,
}

impl BridgeOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        account: Account,
        outbound: LegRoute,
        return_leg: LegRoute,
    ) -> Self {
        Self {
            config,
            account,
            outbound,
            return_leg,
            shutdown: Arc::new(RwLock::new(false)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Check both networks, then run the rounds.
    ///
    /// Only the connectivity check can fail; once rounds start every error is
    /// absorbed into a leg outcome.
    pub async fn start(&self) -> BridgeResult<RunSummary> {
        self.check_connectivity().await?;
        Ok(self.run().await)
    }

    /// Like `start`, stopping at the next round boundary when `shutdown`
    /// fires and abandoning the round in progress when it fires again.
    ///
    /// Returns `None` if the run was abandoned.
    pub async fn start_with_shutdown<S, F>(
        &self,
        mut shutdown: S,
    ) -> Option<BridgeResult<RunSummary>>
    where
        S: FnMut() -> F,
        F: Future<Output = ()>,
    {
        let run = self.start();
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => return Some(result),
            _ = shutdown() => {
                info!("Shutdown signal received, finishing current round (signal again to abandon it)...");
                self.stop().await;
            }
        }

        tokio::select! {
            result = &mut run => Some(result),
            _ = shutdown() => {
                warn!("Second shutdown signal received, abandoning the round in progress");
                None
            }
        }
    }

    /// Verify both endpoints before any transaction is sent
    pub async fn check_connectivity(&self) -> BridgeResult<()> {
        for route in [&self.outbound, &self.return_leg] {
            if let Err(e) = route.client.check_connectivity().await {
                error!("Unable to connect for {} leg: {}", route.direction, e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Main round loop
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        info!(
            "Starting {} rounds between {} and {}, each leg with {} ETH",
            self.config.rounds,
            self.outbound.label,
            self.return_leg.label,
            format_ether(self.config.value_wei)
        );

        while !self.config.rounds.reached(summary.rounds_completed) {
            if *self.shutdown.read().await {
                warn!("Stop requested, ending after {} rounds", summary.rounds_completed);
                break;
            }

            let round = summary.rounds_completed + 1;
            info!("Round {}", round);

            for route in [&self.outbound, &self.return_leg] {
                let outcome = self.run_leg(route, round).await;
                summary.record(route.direction, &outcome);
            }

            summary.rounds_completed = round;
            crate::metrics::record_round_completed();

            if !self.config.round_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.round_delay) => {}
                    _ = self.stop_notify.notified() => {}
                }
            }
        }

        info!(
            "Finished {} rounds: outbound {}/{} confirmed, return {}/{} confirmed",
            summary.rounds_completed,
            summary.outbound_confirmed,
            summary.outbound_confirmed + summary.outbound_failed,
            summary.return_confirmed,
            summary.return_confirmed + summary.return_failed
        );

        summary
    }

    /// Run one leg to completion and report its outcome
    async fn run_leg(&self, route: &LegRoute, round: u64) -> LegOutcome {
        let started = Instant::now();

        info!(
            "{}: sending {} ETH",
            route.label,
            format_ether(self.config.value_wei)
        );

        let outcome = match self.execute_leg(route).await {
            Ok(confirmation) => LegOutcome::Confirmed(confirmation),
            Err(cause) => LegOutcome::Failed { cause },
        };
        self.report_leg(route, round, &outcome, started);
        outcome
    }

    fn report_leg(&self, route: &LegRoute, round: u64, outcome: &LegOutcome, started: Instant) {
        let chain_id = route.constants.chain_id;

        match outcome {
            LegOutcome::Confirmed(confirmation) => {
                info!(
                    "{}: {:?} confirmed in block {} (round {}, nonce {})",
                    route.label,
                    confirmation.tx_hash,
                    confirmation.receipt.block_number,
                    round,
                    confirmation.nonce
                );
                crate::metrics::record_leg_confirmed(route.direction, chain_id);
                crate::metrics::record_confirmation_latency(
                    chain_id,
                    started.elapsed().as_secs_f64(),
                );
            }
            LegOutcome::Failed { cause } => {
                if !cause.is_recoverable() {
                    warn!("{}: unexpected error class inside a leg", route.label);
                }
                error!("{}: bridge leg failed (round {}): {}", route.label, round, cause);
                crate::metrics::record_leg_failed(route.direction, chain_id);
            }
        }
    }

    /// nonce -> compose -> sign -> send -> confirm
    async fn execute_leg(&self, route: &LegRoute) -> BridgeResult<LegConfirmation> {
        let client = &route.client;
        let from = self.account.address();

        let nonce = client.get_nonce(from).await?;

        let tx = TransactionComposer::compose(
            &route.constants,
            from,
            &route.calldata,
            self.config.value_wei,
            nonce,
        );

        let raw = client.sign(&tx, self.account.wallet()).await?;
        let tx_hash = client.send(raw).await?;
        info!("{}: transaction sent, hash {:?}", route.label, tx_hash);

        let receipt = client.await_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            return Err(BridgeError::Reverted {
                chain_id: route.constants.chain_id,
                tx_hash: format!("{:?}", tx_hash),
                block_number: receipt.block_number,
            });
        }

        Ok(LegConfirmation {
            nonce,
            tx_hash,
            receipt,
        })
    }

    /// Request a stop; takes effect before the next round and cuts the
    /// pause between rounds short
    pub async fn stop(&self) {
        *self.shutdown.write().await = true;
        self.stop_notify.notify_one();
        info!("Orchestrator shutdown initiated");
    }
}
