//! The daemon's event loop: a single `select!` over logind power events and
//! termination signals, so both are handled on the same task in arrival
//! order. Command execution is awaited inline; a slow command delays the
//! acknowledgement (and any queued shutdown), which is deliberate — only one
//! sleep transition can be in flight at a time.

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::spawn_blocking;

use crate::command;
use crate::config::Config;
use crate::pidfile;
use crate::power::{AckToken, PowerEvent, SleepMonitor};

pub async fn run(config: Config) -> Result<()> {
    let mut monitor = SleepMonitor::register(&config.progname).await?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = sigint.recv() => return shutdown(&config, "SIGINT"),
            _ = sigterm.recv() => return shutdown(&config, "SIGTERM"),
            event = monitor.next_event() => {
                let event = event?;
                handle_event(&config, event, |token| monitor.acknowledge(token)).await;
            }
        }
    }
}

/// Dispatches one power notification. A will-sleep event runs the configured
/// command (if any) and is then acknowledged no matter how the command fared,
/// so the acknowledgement comes last and unconditionally; a resume event only
/// logs. Returns the command's exit status when one was run.
async fn handle_event(
    config: &Config,
    event: PowerEvent,
    ack: impl FnOnce(AckToken),
) -> Option<i32> {
    match event {
        PowerEvent::WillSleep(token) => {
            let status = run_sleep_command(config).await;
            ack(token);
            status
        }
        PowerEvent::Resumed => {
            println!("{}: woke up", config.progname);
            None
        }
    }
}

/// Runs the configured sleep command, if any, and logs its exit status.
/// Returns the status for inspection; `None` means no command is configured
/// and nothing was run.
async fn run_sleep_command(config: &Config) -> Option<i32> {
    let cmd = config.sleep_command.clone()?;
    let status = spawn_blocking({
        let cmd = cmd.clone();
        move || command::run(&cmd)
    })
    .await
    .unwrap_or(-1);
    println!("{}: sleep: {}: {}", config.progname, cmd, status);
    Some(status)
}

fn shutdown(config: &Config, signame: &str) -> Result<()> {
    println!("{}: got {} - exiting", config.progname, signame);
    pidfile::clear(&config.progname, config.pidfile.as_deref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn test_config(sleep_command: Option<&str>) -> Config {
        Config {
            progname: "sleepwatch".to_string(),
            sleep_command: sleep_command.map(str::to_string),
            pidfile: None,
        }
    }

    #[tokio::test]
    async fn no_configured_command_runs_nothing() {
        assert_eq!(run_sleep_command(&test_config(None)).await, None);
    }

    #[tokio::test]
    async fn successful_command_reports_status_zero() {
        assert_eq!(run_sleep_command(&test_config(Some("true"))).await, Some(0));
    }

    #[tokio::test]
    async fn failing_command_reports_its_status() {
        assert_eq!(
            run_sleep_command(&test_config(Some("exit 3"))).await,
            Some(3)
        );
    }

    #[tokio::test]
    async fn unstartable_command_reports_a_status_too() {
        assert_eq!(
            run_sleep_command(&test_config(Some("/no/such/binary-for-sleepwatch"))).await,
            Some(127)
        );
    }

    #[tokio::test]
    async fn will_sleep_without_a_command_is_still_acknowledged_exactly_once() {
        let acks = Cell::new(0);
        let event = PowerEvent::WillSleep(AckToken::empty());
        let status = handle_event(&test_config(None), event, |token| {
            acks.set(acks.get() + 1);
            drop(token);
        })
        .await;
        assert_eq!(status, None);
        assert_eq!(acks.get(), 1);
    }

    #[tokio::test]
    async fn will_sleep_is_acknowledged_even_when_the_command_fails() {
        let acks = Cell::new(0);
        let event = PowerEvent::WillSleep(AckToken::empty());
        let status = handle_event(&test_config(Some("exit 3")), event, |token| {
            acks.set(acks.get() + 1);
            drop(token);
        })
        .await;
        assert_eq!(status, Some(3));
        assert_eq!(acks.get(), 1);
    }

    #[tokio::test]
    async fn resume_runs_no_command_and_acknowledges_nothing() {
        let acks = Cell::new(0);
        let status = handle_event(&test_config(Some("exit 3")), PowerEvent::Resumed, |token| {
            acks.set(acks.get() + 1);
            drop(token);
        })
        .await;
        assert_eq!(status, None);
        assert_eq!(acks.get(), 0);
    }

    #[test]
    fn shutdown_clears_the_pidfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleepwatch.pid");
        std::fs::write(&path, "1234").unwrap();
        let config = Config {
            pidfile: Some(path.clone()),
            ..test_config(None)
        };
        shutdown(&config, "SIGTERM").unwrap();
        assert!(!path.exists());
    }
}
