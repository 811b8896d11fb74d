//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use cookie_broker_core::Framing;

/// Policy-gated cookie access broker for external applications.
///
/// Reads request envelopes from stdin, answers `getAllCookies` requests with
/// the cookies the administrator whitelist grants each caller, and writes
/// response envelopes to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "cookie-broker")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Managed policy JSON file holding the whitelist (re-read on every request)
    #[arg(short, long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Cookie export to serve (Netscape cookie file or JSON export)
    #[arg(short = 'k', long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Envelope framing on stdin/stdout: json-lines or native
    #[arg(short, long, value_name = "FRAMING")]
    pub framing: Option<Framing>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}
