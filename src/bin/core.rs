//! Entry point for the `fedrt-core` binary: parses CLI flags, wires the requested
//! transport into a [`fedrt_net::Core`], registers against the broker, and runs until
//! disconnect (spec.md §6).

use anyhow::{bail, Context};
use clap::Parser;
use fedrt::cli::{Cli, CoreType, EXIT_CLEAN, EXIT_ERROR_STATE};
use fedrt::{FederateConfig, InterfaceKind, Time};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: tracing::Level) {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.loglevel.into());

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "fedrt-core exiting on error");
            EXIT_ERROR_STATE
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    tracing::info!(name = %cli.name, coretype = ?cli.coretype, "starting fedrt-core");

    let Some(broker_endpoint) = cli.broker.clone() else {
        if cli.autobroker {
            bail!("--autobroker without an in-process broker implementation is not yet wired up");
        }
        bail!("--broker is required unless --autobroker is set");
    };

    match cli.coretype {
        CoreType::Tcp => run_tcp(&cli, &broker_endpoint).await,
        CoreType::Udp => run_udp(&cli, &broker_endpoint).await,
        CoreType::TcpSs => run_tcp_ss(&cli, &broker_endpoint).await,
        CoreType::Test => run_test(&cli, &broker_endpoint).await,
        CoreType::Ipc | CoreType::Zmq | CoreType::ZmqSs => {
            bail!("coretype {:?} requires the matching fedrt_net feature to be enabled at build time", cli.coretype)
        }
    }
}

async fn run_tcp(cli: &Cli, broker_endpoint: &str) -> anyhow::Result<i32> {
    let transport = fedrt_net::transport::tcp::TcpTransport::new();
    run_core(cli, transport, broker_endpoint).await
}

async fn run_udp(cli: &Cli, broker_endpoint: &str) -> anyhow::Result<i32> {
    let local: std::net::SocketAddr = "0.0.0.0:0".parse().unwrap();
    let transport = fedrt_net::transport::udp::UdpTransport::bind(local).await.context("binding udp socket")?;
    run_core(cli, transport, broker_endpoint).await
}

async fn run_tcp_ss(cli: &Cli, broker_endpoint: &str) -> anyhow::Result<i32> {
    let transport = fedrt_net::transport::tcp_ss::TcpSsTransport::new();
    run_core(cli, transport, broker_endpoint).await
}

async fn run_test(cli: &Cli, broker_endpoint: &str) -> anyhow::Result<i32> {
    let directory = fedrt_net::transport::inprocess::new_directory();
    let transport = fedrt_net::transport::inprocess::InProcessTransport::new(directory);
    run_core(cli, transport, broker_endpoint).await
}

async fn run_core<T: fedrt_net::transport::Transport>(
    cli: &Cli,
    transport: T,
    broker_endpoint: &str,
) -> anyhow::Result<i32> {
    let mut core = fedrt_net::Core::connect(transport, broker_endpoint).await.context("connecting to broker")?;

    core.register_federate(&cli.name).await.context("registering federate")?;
    let federate_id = core.await_federate_registration().await.context("awaiting federate id assignment")?;
    tracing::info!(?federate_id, "federate registered with broker");

    core.register_interface(&format!("{}.out", cli.name), InterfaceKind::Publication).await.ok();

    let stop_time = cli.stoptime.map(Time::from_ticks).unwrap_or(Time::MAX);
    let period = cli.period.map(Time::from_ticks);
    let config = FederateConfig {
        name: cli.name.clone(),
        lookahead: Time::from_ticks(cli.timedelta),
        period,
        offset: Time::from_ticks(cli.offset),
        stop_time,
        event_triggered: false,
    };
    core.host_federate(config, period, stop_time).context("hosting federate")?;

    tracing::info!(federates = cli.federates, "core registered, driving hosted federate to completion");
    match core.run().await.context("running core dispatch loop")? {
        Ok(()) => Ok(EXIT_CLEAN),
        Err(err) => {
            tracing::error!(%err, "hosted federate exited with an error");
            Ok(EXIT_ERROR_STATE)
        }
    }
}
