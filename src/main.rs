mod command;
mod config;
mod daemon;
mod pidfile;
mod power;

use std::process;

use config::Config;

#[tokio::main]
async fn main() {
    let config = Config::from_args();
    pidfile::write(&config.progname, config.pidfile.as_deref());
    let progname = config.progname.clone();
    if let Err(err) = daemon::run(config).await {
        eprintln!("{}: {:#}", progname, err);
        process::exit(1);
    }
}
