//! Bridge to the system power-notification source: systemd-logind over D-Bus.
//!
//! A *delay* inhibitor lock is held whenever the system is awake. When logind
//! announces a pending sleep via `PrepareForSleep(true)`, it waits for every
//! delay lock holder to release its lock (or for the inhibit timeout) before
//! letting the transition proceed. Releasing the lock is therefore the
//! acknowledgement the handler owes for every will-sleep event. On
//! `PrepareForSleep(false)` (resume) the bridge re-takes the lock so the next
//! cycle is delayed again.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use zbus::dbus_proxy;
use zbus::zvariant::OwnedFd;
use zbus::Connection;

#[dbus_proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait Manager {
    /// Takes an inhibitor lock; the lock is held until the returned fd is
    /// closed.
    fn inhibit(&self, what: &str, who: &str, why: &str, mode: &str) -> zbus::Result<OwnedFd>;

    #[dbus_proxy(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

const INHIBIT_WHAT: &str = "sleep";
const INHIBIT_WHY: &str = "running the configured sleep command";
const INHIBIT_MODE: &str = "delay";

/// One discrete power notification, as seen by the event loop.
#[derive(Debug)]
pub enum PowerEvent {
    /// The system is about to sleep. The token must be given back (via
    /// [`SleepMonitor::acknowledge`]) to let the transition proceed.
    WillSleep(AckToken),
    /// The sleep transition is over; the system is awake again.
    Resumed,
}

/// Opaque acknowledgement token for a single will-sleep event. It wraps the
/// delay lock the monitor held while awake; releasing it tells logind this
/// daemon is done. Consumed by value, so it can be released exactly once,
/// and dropping it on any path still releases the lock.
#[derive(Debug)]
pub struct AckToken {
    _lock: Option<OwnedFd>,
}

#[cfg(test)]
impl AckToken {
    /// Token with no lock behind it, for exercising handler dispatch.
    pub(crate) fn empty() -> Self {
        AckToken { _lock: None }
    }
}

/// The daemon's subscription to the power-notification stream. Owns the bus
/// connection, the signal stream, and the currently-held delay lock. Lives
/// from registration to process exit; there is no explicit deregistration.
pub struct SleepMonitor {
    manager: ManagerProxy<'static>,
    events: PrepareForSleepStream<'static>,
    who: String,
    lock: Option<OwnedFd>,
}

impl SleepMonitor {
    /// Registers with logind: connects to the system bus, subscribes to
    /// `PrepareForSleep` and takes the initial delay lock. Any failure here
    /// is fatal to the daemon, which has no purpose without notifications.
    pub async fn register(who: &str) -> Result<Self> {
        let connection = Connection::system()
            .await
            .context("can't connect to the system bus")?;
        let manager = ManagerProxy::new(&connection)
            .await
            .context("can't reach logind")?;
        let events = manager
            .receive_prepare_for_sleep()
            .await
            .context("can't subscribe to sleep notifications")?;
        let lock = manager
            .inhibit(INHIBIT_WHAT, who, INHIBIT_WHY, INHIBIT_MODE)
            .await
            .context("can't take the sleep delay lock")?;
        Ok(SleepMonitor {
            manager,
            events,
            who: who.to_string(),
            lock: Some(lock),
        })
    }

    /// Waits for the next power notification. Re-arms the delay lock on
    /// resume before reporting it; a failure to re-arm is a warning (the
    /// daemon still gets notified of the next sleep, just without a
    /// guaranteed delay window).
    pub async fn next_event(&mut self) -> Result<PowerEvent> {
        let signal = self
            .events
            .next()
            .await
            .context("lost connection to logind")?;
        let args = signal.args()?;
        if *args.start() {
            return Ok(PowerEvent::WillSleep(AckToken {
                _lock: self.lock.take(),
            }));
        }
        match self
            .manager
            .inhibit(INHIBIT_WHAT, &self.who, INHIBIT_WHY, INHIBIT_MODE)
            .await
        {
            Ok(lock) => self.lock = Some(lock),
            Err(err) => eprintln!("{}: can't re-take the sleep delay lock: {}", self.who, err),
        }
        Ok(PowerEvent::Resumed)
    }

    /// Releases the delay lock held for this sleep cycle, allowing the
    /// system to proceed with the transition.
    pub fn acknowledge(&self, token: AckToken) {
        drop(token);
    }
}
