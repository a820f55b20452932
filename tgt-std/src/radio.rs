use std::io::BufRead;
use std::thread::JoinHandle;

use common::{
    AttrHandle, GattService, GattStatus, PeerHandle, Peripheral, PeripheralEvent, TransportError,
    WaypointState, WriteData,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use waypoint_nmea::{format_gga, GeoFix, BLE_SOURCE};

/// Handle the simulated stack assigns to the GPS characteristic.
pub const SIM_GPS_HANDLE: AttrHandle = 0x2a;
const SIM_HDOP: f32 = 0.9;

pub type EventQueue = Channel<CriticalSectionRawMutex, PeripheralEvent, 8>;

/// Stand-in for the BLE stack. Events come from the console thread.
pub struct SimRadio {
    events: &'static EventQueue,
}

impl SimRadio {
    pub fn new(events: &'static EventQueue) -> Self {
        Self { events }
    }
}

impl Peripheral for SimRadio {
    async fn next_event(&mut self) -> Result<PeripheralEvent, TransportError> {
        Ok(self.events.receive().await)
    }

    async fn set_device_name(&mut self, name: &str) -> Result<(), TransportError> {
        log::info!("[radio] device name: {}", name);
        Ok(())
    }

    async fn register_service(&mut self, service: &GattService) -> Result<AttrHandle, TransportError> {
        log::info!(
            "[radio] service {:032x}, characteristic {:032x} {:?}",
            service.service,
            service.characteristic,
            service.properties
        );
        Ok(SIM_GPS_HANDLE)
    }

    async fn start_advertising(&mut self) -> Result<(), TransportError> {
        log::info!("[radio] advertising");
        Ok(())
    }

    async fn respond(&mut self, peer: PeerHandle, status: GattStatus) -> Result<(), TransportError> {
        log::debug!("[radio] write response to {}: {:?}", peer, status);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect(PeerHandle),
    Disconnect,
    /// Raw bytes written to the GPS characteristic.
    Write(WriteData),
    Link(bool),
    Status,
    Help,
}

const HELP: &str = "commands: connect [peer] | disconnect | $GPGGA,... | fix <lat> <lon> [alt] | link up|down | status";

/// One console line to a command. Lines starting with `$` are sent as is.
pub fn parse_command(line: &str) -> Result<Command, &'static str> {
    let line = line.trim();
    if line.starts_with('$') {
        return write_data(line.as_bytes());
    }

    let mut words = line.split_whitespace();
    match words.next() {
        Some("connect") => match words.next() {
            Some(peer) => peer.parse().map(Command::Connect).map_err(|_| "bad peer id"),
            None => Ok(Command::Connect(1)),
        },
        Some("disconnect") => Ok(Command::Disconnect),
        Some("fix") => {
            let mut number = || words.next().and_then(|w| w.parse::<f64>().ok());
            let (latitude, longitude) = match (number(), number()) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => return Err("usage: fix <lat> <lon> [alt]"),
            };
            let altitude = number().unwrap_or(0.0) as f32;
            let fix = GeoFix {
                latitude,
                longitude,
                altitude,
                accuracy: SIM_HDOP,
                valid: true,
                source: BLE_SOURCE,
            };
            let sentence = format_gga(&fix, 1).map_err(|_| "fix does not fit a sentence")?;
            write_data(sentence.as_bytes())
        }
        Some("link") => match words.next() {
            Some("up") => Ok(Command::Link(true)),
            Some("down") => Ok(Command::Link(false)),
            _ => Err("usage: link up|down"),
        },
        Some("status") => Ok(Command::Status),
        Some("help") | None => Ok(Command::Help),
        Some(_) => Err("unknown command, try help"),
    }
}

fn write_data(sentence: &[u8]) -> Result<Command, &'static str> {
    let mut data = WriteData::new();
    data.extend_from_slice(sentence)
        .and_then(|_| data.extend_from_slice(b"\r\n"))
        .map_err(|_| "sentence too long")?;
    Ok(Command::Write(data))
}

/// Reads commands from stdin and turns them into radio events.
pub fn spawn_console(
    events: &'static EventQueue,
    state: &'static WaypointState,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let mut peer: PeerHandle = 0;
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::error!("console read failed: {}", e);
                        break;
                    }
                };

                let event = match parse_command(&line) {
                    Ok(Command::Connect(id)) => {
                        peer = id;
                        PeripheralEvent::Connected(id)
                    }
                    Ok(Command::Disconnect) => PeripheralEvent::Disconnected(peer),
                    Ok(Command::Write(data)) => PeripheralEvent::Write {
                        peer,
                        handle: SIM_GPS_HANDLE,
                        data,
                    },
                    Ok(Command::Link(up)) => {
                        state.backend.set_link_up(up);
                        continue;
                    }
                    Ok(Command::Status) => {
                        log::info!(
                            "connected: {}, reachable: {}",
                            state.is_connected(),
                            state.is_reachable()
                        );
                        continue;
                    }
                    Ok(Command::Help) => {
                        log::info!("{}", HELP);
                        continue;
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        continue;
                    }
                };
                embassy_futures::block_on(events.send(event));
            }
            log::info!("console closed");
        })
}
