// Standard library imports
use core::net::SocketAddr;
use std::net::ToSocketAddrs;

// Embassy framework imports
use embassy_executor::Executor;
use embassy_futures::select::{select, Either};
use embassy_time::{with_timeout, Duration};

// Networking imports
use edge_net::std::Stack;

// Other external crates
use anyhow::{anyhow, Context};
use static_cell::StaticCell;

// Local crates
use common::{
    BackendUrl, Config, ConnectionMachine, HttpHealthProbe, PeripheralEvent, Watchdog,
    WaypointState,
};
use waypoint_nmea::ChecksumPolicy;

// Local modules
mod radio;

use crate::radio::{EventQueue, SimRadio};

// Constants
const DEFAULT_BACKEND: &str = "http://127.0.0.1:3000";
const NAV_PERIOD: Duration = Duration::from_secs(1);
const MAX_FIX_JSON: usize = 256;

static STATE: WaypointState = WaypointState::new();
static EVENTS: EventQueue = EventQueue::new();

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("async_io", log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    static CONFIG: StaticCell<Config> = StaticCell::new();
    let config: &'static Config = CONFIG.init(load_config()?);
    let addr = resolve(&config.backend)?;
    log::info!(
        "{} starting, backend {} ({}), checksum {:?}",
        config.device_name,
        config.backend.host(),
        addr,
        config.checksum
    );

    // Init network stack
    static STACK: StaticCell<Stack> = StaticCell::new();
    let stack: &'static Stack = STACK.init(Stack::new());
    let probe = HttpHealthProbe::new(stack, addr, &config.backend)
        .map_err(|e| anyhow!("backend url: {}", e))?;

    radio::spawn_console(&EVENTS, &STATE).context("failed to start console")?;
    // the simulated stack is up straight away
    EVENTS
        .try_send(PeripheralEvent::Registered)
        .map_err(|_| anyhow!("radio event queue full"))?;

    static EXECUTOR: StaticCell<Executor> = StaticCell::new();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        let result = spawner.spawn(peripheral_task(config, SimRadio::new(&EVENTS)));
        if result.is_err() {
            log::warn!("failed to spawn peripheral task");
        }

        let result = spawner.spawn(watchdog_task(config, probe));
        if result.is_err() {
            log::warn!("failed to spawn watchdog task");
        }

        let result = spawner.spawn(navigation_task());
        if result.is_err() {
            log::warn!("failed to spawn navigation task");
        }
    })
}

/// `WAYPOINT_BACKEND_URL` and `WAYPOINT_CHECKSUM` from the environment.
fn load_config() -> anyhow::Result<Config> {
    let url = std::env::var("WAYPOINT_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND.into());
    let backend =
        BackendUrl::parse(&url).map_err(|e| anyhow!("WAYPOINT_BACKEND_URL {}: {}", url, e))?;

    let mut config = Config::new(backend);
    if let Ok(policy) = std::env::var("WAYPOINT_CHECKSUM") {
        let checksum = policy
            .parse::<ChecksumPolicy>()
            .map_err(|_| anyhow!("WAYPOINT_CHECKSUM must be ignore or verify, got {}", policy))?;
        config = config.with_checksum(checksum);
    }
    Ok(config)
}

fn resolve(backend: &BackendUrl) -> anyhow::Result<SocketAddr> {
    (backend.host(), backend.port())
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve {}", backend.host()))?
        .next()
        .ok_or_else(|| anyhow!("{} has no address", backend.host()))
}

#[embassy_executor::task]
async fn peripheral_task(config: &'static Config, mut radio: SimRadio) -> ! {
    let mut machine = ConnectionMachine::new(config, &STATE);
    machine.run(&mut radio).await
}

#[embassy_executor::task]
async fn watchdog_task(config: &'static Config, probe: HttpHealthProbe<'static, Stack>) -> ! {
    let mut watchdog = Watchdog::new(probe, config);
    watchdog.run(&STATE.backend).await
}

/// Consumer side: what the compass display loop would read.
#[embassy_executor::task]
async fn navigation_task() -> ! {
    loop {
        let updated = match select(
            with_timeout(NAV_PERIOD, STATE.fixes.wait_update()),
            STATE.backend.wait_change(),
        )
        .await
        {
            Either::First(waited) => waited.is_ok(),
            Either::Second(reachable) => {
                log::info!("upload {}", if reachable { "resumed" } else { "paused" });
                false
            }
        };

        let fix = STATE.get_current_fix().await;
        match serde_json_core::to_string::<_, MAX_FIX_JSON>(&fix) {
            Ok(json) if updated => log::info!(
                "nav {} connected: {} reachable: {}",
                json,
                STATE.is_connected(),
                STATE.is_reachable()
            ),
            Ok(json) => log::debug!("nav {}", json),
            Err(e) => log::warn!("failed to render fix: {:?}", e),
        }
    }
}
