//! Background temperature sampling.
//!
//! Every sample interval the collector task reads the REAL temperature
//! register and records it. With simulation enabled it first writes a
//! slowly drifting value into that register, with an occasional jump so
//! the anomaly detection has something to find.

use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use plcdash_core::address::to_index;
use plcdash_core::VariableKind;

use crate::AppState;

/// Base temperature of the simulated process.
pub const BASE_TEMPERATURE: f64 = 70.0;

/// Every this many samples the simulation inserts a jump.
pub const SPIKE_EVERY: u64 = 40;

/// Simulated temperature for the `step`-th sample.
pub fn simulated_temperature(step: u64) -> f64 {
    let drift = 3.0 * (step as f64 / 12.0).sin();
    let spike = if step > 0 && step % SPIKE_EVERY == 0 { 4.0 } else { 0.0 };
    BASE_TEMPERATURE + drift + spike
}

/// Start the sampling task. The first sample is taken immediately.
pub fn spawn_collector(state: AppState, simulate: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.collector.read().await.interval();
        let index = match usize::try_from(to_index(VariableKind::Real, state.temperature_address)) {
            Ok(index) => index,
            Err(_) => {
                warn!(
                    "Temperature address {} is not a holding register",
                    state.temperature_address
                );
                return;
            }
        };
        info!(
            "Collecting temperature from HR {} every {:?}{}",
            state.temperature_address,
            period,
            if simulate { " (simulated)" } else { "" }
        );

        let mut interval = tokio::time::interval(period);
        let mut step = 0u64;
        loop {
            interval.tick().await;
            sample_once(&state, index, simulate.then_some(step)).await;
            step += 1;
        }
    })
}

async fn sample_once(state: &AppState, index: usize, simulated_step: Option<u64>) {
    if state.ensure_connected().await.is_err() {
        warn!("Temperature read skipped: device unreachable");
        return;
    }

    let reading = {
        let mut registers = state.registers.write().await;
        if let Some(step) = simulated_step {
            let value = simulated_temperature(step) as f32;
            if let Err(e) = registers.write_real(index, value) {
                warn!("Simulation write failed: {}", e);
            }
        }
        registers.read_real(index)
    };

    match reading {
        Ok(temperature) => {
            let temperature = temperature as f64;
            state
                .collector
                .write()
                .await
                .record(temperature, Local::now().naive_local());
        }
        Err(e) => debug!("Temperature read failed: {}", e),
    }
}
