pub mod history;
pub mod scan;
pub mod topology;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use lanscope_common::network::target::TargetSpec;

#[derive(Parser)]
#[command(name = "lanscope")]
#[command(about = "Scans a network and infers its device topology.")]
pub struct CommandLine {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a target range and infer its topology
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Inspect stored scan sessions
    #[command(alias = "h")]
    History {
        /// History file to operate on
        #[arg(long, default_value = "lanscope-history.json")]
        history: PathBuf,
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Print the topology of a stored session
    #[command(alias = "t")]
    Topology {
        /// Stored session id
        id: u64,
        #[arg(long, default_value = "lanscope-history.json")]
        history: PathBuf,
    },
}

#[derive(Args)]
pub struct ScanArgs {
    /// What to scan: `lan`, an address, a `start-end` range or a CIDR block
    pub target: TargetSpec,

    /// Per-probe timeout in milliseconds
    #[arg(long, default_value_t = 500)]
    pub timeout_ms: u64,

    /// Worker pool size
    #[arg(long, default_value_t = 64)]
    pub concurrency: usize,

    /// Ports to probe (comma separated); defaults to the common set
    #[arg(long, value_delimiter = ',')]
    pub ports: Vec<u16>,

    /// Skip reverse-DNS lookups
    #[arg(long)]
    pub no_dns: bool,

    /// Skip the port sweep of alive hosts
    #[arg(long)]
    pub no_ports: bool,

    /// Skip ICMP and rely on TCP-connect reachability
    #[arg(long)]
    pub no_icmp: bool,

    /// Abort the whole scan after this many seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// History file the finished session is appended to
    #[arg(long, default_value = "lanscope-history.json")]
    pub history: PathBuf,

    /// Do not store the session
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List stored sessions
    #[command(alias = "ls")]
    List,
    /// Show one stored session in full
    Show { id: u64 },
    /// Delete a stored session
    #[command(alias = "rm")]
    Delete { id: u64 },
    /// Hosts that appeared or vanished between two sessions
    Diff { earlier: u64, later: u64 },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
