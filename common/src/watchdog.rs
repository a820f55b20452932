use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Ticker};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::Config;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Connect, send or receive failed.
    Transport,
    /// Backend answered with something other than 200.
    Status(u16),
    Timeout,
    /// No network link, nothing was sent.
    LinkDown,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Transport => f.write_str("transport error"),
            ProbeError::Status(code) => write!(f, "status {}", code),
            ProbeError::Timeout => f.write_str("timed out"),
            ProbeError::LinkDown => f.write_str("link down"),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    async fn probe(&mut self) -> Result<(), ProbeError>;
}

/// Backend reachability level plus an edge signal for whoever wants to react
/// to changes.
pub struct Reachability {
    reachable: AtomicBool,
    link_up: AtomicBool,
    changed: Signal<CriticalSectionRawMutex, bool>,
}

impl Default for Reachability {
    fn default() -> Self {
        Self::new()
    }
}

impl Reachability {
    /// Starts unreachable with the link up. Targets that track their network
    /// link clear it until they have an address.
    pub const fn new() -> Self {
        Self {
            reachable: AtomicBool::new(false),
            link_up: AtomicBool::new(true),
            changed: Signal::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    pub fn is_link_up(&self) -> bool {
        self.link_up.load(Ordering::Acquire)
    }

    pub fn set_link_up(&self, up: bool) {
        if self.link_up.swap(up, Ordering::AcqRel) != up {
            log::info!("network link {}", if up { "up" } else { "down" });
        }
    }

    /// Record a probe outcome. Returns true when the level changed.
    pub fn report(&self, reachable: bool) -> bool {
        if self.reachable.swap(reachable, Ordering::AcqRel) == reachable {
            return false;
        }
        log::info!(
            "backend {}",
            if reachable { "reachable" } else { "unreachable" }
        );
        self.changed.signal(reachable);
        true
    }

    /// Next reachability change. Meant for a single consumer.
    pub async fn wait_change(&self) -> bool {
        self.changed.wait().await
    }
}

/// Probes the backend on a fixed period, forever.
pub struct Watchdog<P> {
    probe: P,
    period: Duration,
    timeout: Duration,
}

impl<P: HealthProbe> Watchdog<P> {
    pub fn new(probe: P, config: &Config) -> Self {
        Self::with_timing(probe, config.probe_period, config.probe_timeout)
    }

    pub fn with_timing(probe: P, period: Duration, timeout: Duration) -> Self {
        Self {
            probe,
            period,
            timeout,
        }
    }

    /// One probe cycle. Returns true when reachability changed.
    pub async fn check(&mut self, reachability: &Reachability) -> bool {
        let outcome = if reachability.is_link_up() {
            match with_timeout(self.timeout, self.probe.probe()).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout),
            }
        } else {
            Err(ProbeError::LinkDown)
        };

        match outcome {
            Ok(()) => log::debug!("health probe ok"),
            Err(e) => log::debug!("health probe failed: {}", e),
        }
        reachability.report(outcome.is_ok())
    }

    /// Probes on a fixed period; a slow probe does not push later cycles back.
    pub async fn run(&mut self, reachability: &Reachability) -> ! {
        let mut ticker = Ticker::every(self.period);
        loop {
            self.check(reachability).await;
            ticker.next().await;
        }
    }
}
