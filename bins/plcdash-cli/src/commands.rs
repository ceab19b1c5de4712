//! Subcommand handlers.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::{Local, TimeZone};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

use plcdash_client::{
    ControlPanel, MonitoringPanel, Notice, Panel, Session, TemperatureClient, TemperatureMonitor,
    Watchdog,
};
use plcdash_client::watchdog::{WATCHDOG_ADDRESS, WATCHDOG_PERIOD};
use plcdash_core::address::validate_address;
use plcdash_core::config::{ApiStyle, ConfigHandlers, DashboardSettings};
use plcdash_core::render::RangeSelected;
use plcdash_core::{DeviceTarget, OperationResult, VariableDescriptor, VariableKind};
use plcdash_mock::{simulation, MockConfig, MockService};

use crate::output;
use crate::storage::FileConfigStorage;

/// Extra wait after the verify delay before showing the verified value.
const VERIFY_GRACE: Duration = Duration::from_millis(250);

/// First redraw of a live view, leaving the initial reads time to land.
const FIRST_DRAW: Duration = Duration::from_millis(500);

pub struct Context {
    pub settings: DashboardSettings,
    pub storage: FileConfigStorage,
}

impl Context {
    fn session(&self) -> Result<Session> {
        Ok(Session::from_settings(&self.settings)?)
    }

    fn monitor(&self, session: &Session) -> TemperatureMonitor {
        TemperatureMonitor::new(
            TemperatureClient::new(session.client().transport()),
            session.notifier().clone(),
            self.settings.history_limit(),
            self.settings.stats_hours(),
        )
    }

    /// Load the remote catalog, falling back to the local one when the
    /// service cannot list its variables.
    async fn load_catalog(&self, session: &Session) -> Result<()> {
        if session.load_catalog().await.success {
            return Ok(());
        }
        let catalog = ConfigHandlers::get_catalog(&self.storage)?;
        warn!("Using the local catalog ({} variables)", catalog.len());
        session.set_catalog(&catalog).await;
        Ok(())
    }
}

/// Accepts a catalog name or `KIND:ADDRESS`.
async fn resolve(session: &Session, spec: &str) -> Result<VariableDescriptor> {
    if let Some((kind, address)) = spec.split_once(':') {
        let kind: VariableKind = kind.parse().map_err(|e: String| anyhow!(e))?;
        let address: u32 = address
            .parse()
            .with_context(|| format!("invalid address {:?}", address))?;
        return Ok(VariableDescriptor::new(spec, kind, address));
    }
    session
        .find(spec)
        .await
        .ok_or_else(|| anyhow!("unknown variable {:?}", spec))
}

fn check<T>(result: OperationResult<T>) -> Result<T> {
    result.into_result().map_err(|e| anyhow!(e))
}

/// Show the variable after its verify read had time to complete.
async fn show_verified(ctx: &Context, session: &Session, descriptor: &VariableDescriptor) {
    tokio::time::sleep(ctx.settings.write_verify_delay() + VERIFY_GRACE).await;
    if let Some(entry) = session.entry(&descriptor.key()).await {
        let view = plcdash_core::render::variable_view(&entry);
        print!("{}", output::variable_table(&[view]));
    }
}

pub async fn read(ctx: &Context, variable: Option<&str>) -> Result<()> {
    let session = ctx.session()?;
    ctx.load_catalog(&session).await?;

    match variable {
        Some(spec) => {
            let descriptor = resolve(&session, spec).await?;
            let result = session.refresh(&descriptor).await;
            println!("{} = {}", descriptor.name(), output::outcome(&result));
            check(result)?;
        }
        None => {
            let summary = match ctx.settings.api_style() {
                ApiStyle::Rest => session.refresh_snapshot().await,
                ApiStyle::Rpc => session.refresh_all().await,
            };
            print!("{}", output::variable_table(&session.views().await));
            if summary.failed > 0 {
                bail!("{} of {} reads failed", summary.failed, summary.ok + summary.failed);
            }
        }
    }
    Ok(())
}

pub async fn write(ctx: &Context, variable: &str, value: &str) -> Result<()> {
    let session = ctx.session()?;
    ctx.load_catalog(&session).await?;
    let descriptor = resolve(&session, variable).await?;

    check(session.write(&descriptor, value).await)?;
    show_verified(ctx, &session, &descriptor).await;
    Ok(())
}

pub async fn toggle(ctx: &Context, variable: &str) -> Result<()> {
    let session = ctx.session()?;
    ctx.load_catalog(&session).await?;
    let descriptor = resolve(&session, variable).await?;

    // current state first; an unknown coil toggles to ON
    session.refresh(&descriptor).await;
    check(session.toggle(&descriptor).await)?;
    show_verified(ctx, &session, &descriptor).await;
    Ok(())
}

/// Drive a live view until Ctrl-C: redraw every `period` and print
/// notices as they arrive.
async fn run_live<P, F, Fut>(
    panel: &mut P,
    mut notices: broadcast::Receiver<Notice>,
    period: Duration,
    mut draw: F,
) -> Result<()>
where
    P: Panel,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = String>,
{
    panel.set_visible(true);
    let mut redraw = interval_at(Instant::now() + FIRST_DRAW, period);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = redraw.tick() => println!("{}", draw().await),
            notice = notices.recv() => match notice {
                Ok(notice) => println!("{}", output::notice_line(&notice)),
                Err(broadcast::error::RecvError::Lagged(n)) => warn!("Dropped {} notices", n),
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    panel.teardown().await;
    Ok(())
}

pub async fn watch(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let notices = session.notices();
    ctx.load_catalog(&session).await?;

    let mut panel = ControlPanel::new(session.clone(), &ctx.settings);
    run_live(&mut panel, notices, ctx.settings.variable_poll(), || {
        let session = session.clone();
        async move { output::variable_table(&session.views().await) }
    })
    .await
}

pub async fn monitor(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let session = ctx.session()?;
    let notices = session.notices();
    let monitor = ctx.monitor(&session);
    if let Some(limit) = limit {
        // failures show up in the panel
        monitor.select_range(RangeSelected { limit }).await;
    }

    let mut panel = MonitoringPanel::new(monitor.clone(), &ctx.settings);
    run_live(&mut panel, notices, ctx.settings.temperature_poll(), || {
        let monitor = monitor.clone();
        async move { output::monitor_panel(&monitor.view().await) }
    })
    .await
}

pub async fn analyze(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let analysis = check(ctx.monitor(&session).analyze().await)?;

    println!("{}", analysis.analysis);
    if let Some(points) = analysis.data_points {
        println!("\n({} readings, generated {})", points, analysis.timestamp);
    }
    Ok(())
}

pub async fn report(ctx: &Context, hours: Option<u32>) -> Result<()> {
    let session = ctx.session()?;
    let client = TemperatureClient::new(session.client().transport());
    let report = client
        .report(hours.unwrap_or_else(|| ctx.settings.stats_hours()))
        .await?;
    println!("{}", report.report);
    Ok(())
}

pub async fn device(ctx: &Context, ip: String, port: u16) -> Result<()> {
    let session = ctx.session()?;
    let applied = check(session.configure_device(&DeviceTarget { ip, port }).await)?;
    println!("Device set to {}:{}", applied.ip, applied.port);
    Ok(())
}

pub async fn status(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let status = check(session.status().await)?;

    let checked = status
        .last_check
        .and_then(|ts| Local.timestamp_opt(ts as i64, 0).single())
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    if status.connected {
        println!("connected (checked {})", checked);
    } else {
        println!(
            "disconnected: {} (checked {})",
            status.error.as_deref().unwrap_or("unknown error"),
            checked
        );
    }
    Ok(())
}

pub fn config(ctx: &Context, save: bool) -> Result<()> {
    let settings = &ctx.settings;
    println!("serviceUrl         {}", settings.service_url());
    println!("apiStyle           {:?}", settings.api_style());
    println!("variablePoll       {:?}", settings.variable_poll());
    println!("temperaturePoll    {:?}", settings.temperature_poll());
    println!("statsPoll          {:?}", settings.stats_poll());
    println!("writeVerifyDelay   {:?}", settings.write_verify_delay());
    println!("requestTimeout     {:?}", settings.request_timeout());
    println!("historyLimit       {}", settings.history_limit());
    println!("statsHours         {}", settings.stats_hours());

    if save {
        ConfigHandlers::put_settings(&ctx.storage, settings.clone())?;
        println!("\nSaved to {}", ctx.storage.dir().display());
    }
    Ok(())
}

/// Keep the heartbeat register moving until Ctrl-C.
pub async fn watchdog(ctx: &Context, address: Option<u32>, period_ms: Option<u64>) -> Result<()> {
    let session = ctx.session()?;
    let period = period_ms.map_or(WATCHDOG_PERIOD, Duration::from_millis);
    let mut dog = Watchdog::new(
        session.client().clone(),
        address.unwrap_or(WATCHDOG_ADDRESS),
        period,
    );

    validate_address(VariableKind::Int, dog.address())?;
    info!("Watchdog on INT @{} every {:?}", dog.address(), period);

    dog.start();
    tokio::signal::ctrl_c().await?;
    dog.stop();
    println!("{} heartbeats, {} failed", dog.beats(), dog.failures());
    Ok(())
}

pub async fn mock(bind: SocketAddr, simulate: bool, interval: u64) -> Result<()> {
    let config = MockConfig {
        sample_interval: Duration::from_secs(interval.max(1)),
        ..MockConfig::default()
    };
    let state = MockService::new(config).into_state();
    let collector = simulation::spawn_collector(state.clone(), simulate);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;

    tokio::select! {
        result = plcdash_mock::serve(listener, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    collector.abort();
    Ok(())
}
