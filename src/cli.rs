//! CLI surface for the `fedrt-core` binary (spec.md §6): core type selection, broker
//! address, federation size, and time-coordination parameters.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoreType {
    #[value(name = "ZMQ")]
    Zmq,
    #[value(name = "ZMQ_SS")]
    ZmqSs,
    #[value(name = "TCP")]
    Tcp,
    #[value(name = "TCP_SS")]
    TcpSs,
    #[value(name = "UDP")]
    Udp,
    #[value(name = "IPC")]
    Ipc,
    #[value(name = "TEST")]
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Arguments accepted by the `fedrt-core` binary, mirroring the flag set of spec.md §6.
#[derive(Debug, Parser)]
#[command(name = "fedrt-core", version, about = "Broker/core process for a fedrt federation")]
pub struct Cli {
    /// This core's own name within the federation.
    #[arg(long)]
    pub name: String,

    /// Transport adapter to use for the broker link.
    #[arg(long, value_enum, default_value_t = CoreType::Tcp)]
    pub coretype: CoreType,

    /// Address of the broker to connect to (`host:port`, a path for `IPC`, or an
    /// in-process directory key for `TEST`).
    #[arg(long)]
    pub broker: Option<String>,

    /// Number of federates this core expects to host before entering executing mode.
    #[arg(long, default_value_t = 1)]
    pub federates: usize,

    /// Spawn a broker in-process if `--broker` cannot be reached.
    #[arg(long, default_value_t = false)]
    pub autobroker: bool,

    /// Periodic rounding interval for time grants, in ticks.
    #[arg(long)]
    pub period: Option<i64>,

    /// Offset added to every period boundary, in ticks.
    #[arg(long, default_value_t = 0)]
    pub offset: i64,

    /// Simulation stop time, in ticks.
    #[arg(long)]
    pub stoptime: Option<i64>,

    /// Lookahead added between a federate's sends and the earliest time a dependent
    /// may be granted, in ticks.
    #[arg(long, default_value_t = 0)]
    pub timedelta: i64,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Optional path to a federation config file (interfaces, connector rules).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Process exit codes (spec.md §6): `0` on a clean disconnect, nonzero once the core
/// has observed `FederateState::Error` on any hosted federate.
pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_ERROR_STATE: i32 = 1;
