use std::env;
use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sleepwatch")]
#[command(about = "Daemon to run a command when the system is put to sleep", long_about = None)]
struct Cli {
    /// Command to execute when the system goes to sleep. The command must
    /// not take longer than about 15 seconds, because after that timeout
    /// the sleep mode is forced by the system.
    #[arg(short = 's', long = "sleep", value_name = "COMMAND")]
    sleep: String,
}

/// Immutable daemon configuration, parsed once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Program name used as the prefix of every diagnostic line.
    pub progname: String,
    pub sleep_command: Option<String>,
    /// Pidfile path, cleared again on shutdown. Not CLI-exposed; the only
    /// accepted invocation is `-s <COMMAND>`.
    pub pidfile: Option<PathBuf>,
}

impl Config {
    /// Parses the command line. Usage errors print the clap usage text and
    /// exit the process with status 2 before any registration happens.
    pub fn from_args() -> Self {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Self {
        Config {
            progname: progname(),
            sleep_command: Some(cli.sleep),
            pidfile: None,
        }
    }
}

fn progname() -> String {
    env::args()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or("sleepwatch")
        .to_string()
}
