use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "webssh-server",
    version,
    about = "Browser terminal to SSH bridge over WebSocket"
)]
pub struct Args {
    /// Path to a TOML config file. Defaults to `<config dir>/webssh/config.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on. Overrides the config file and `PORT`.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` still wins.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}
