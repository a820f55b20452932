use core::fmt;

use embassy_time::Timer;
use heapless::Vec;
use waypoint_nmea::{DecodeError, Decoder, BLE_SOURCE};

use crate::config::Config;
use crate::consts::*;
use crate::state::WaypointState;

/// Connection id assigned by the radio stack.
pub type PeerHandle = u16;
/// Attribute handle assigned at service registration.
pub type AttrHandle = u16;
pub type WriteData = Vec<u8, MAX_WRITE_LEN>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Stack not registered yet.
    Idle,
    Advertising,
    Connected(PeerHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    /// The radio stack is up and the application may provision services.
    Registered,
    Connected(PeerHandle),
    Disconnected(PeerHandle),
    Write {
        peer: PeerHandle,
        handle: AttrHandle,
        data: WriteData,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GattStatus {
    Ok,
    InvalidHandle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportError {
    Busy,
    NotConnected,
    /// Stack specific error code.
    Rejected(u16),
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Busy => f.write_str("radio busy"),
            TransportError::NotConnected => f.write_str("peer not connected"),
            TransportError::Rejected(code) => write!(f, "rejected by stack (0x{:04x})", code),
            TransportError::Closed => f.write_str("radio closed"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CharProperties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GattService {
    pub service: u128,
    pub characteristic: u128,
    pub properties: CharProperties,
}

/// The single service the phone writes sentences into.
pub const GPS_SERVICE: GattService = GattService {
    service: GPS_SERVICE_UUID,
    characteristic: GPS_CHARACTERISTIC_UUID,
    properties: CharProperties {
        read: true,
        write: true,
        notify: true,
    },
};

/// Radio stack seen from the application.
#[allow(async_fn_in_trait)]
pub trait Peripheral {
    async fn next_event(&mut self) -> Result<PeripheralEvent, TransportError>;
    async fn set_device_name(&mut self, name: &str) -> Result<(), TransportError>;
    /// Returns the value handle of the characteristic.
    async fn register_service(&mut self, service: &GattService) -> Result<AttrHandle, TransportError>;
    async fn start_advertising(&mut self) -> Result<(), TransportError>;
    async fn respond(&mut self, peer: PeerHandle, status: GattStatus) -> Result<(), TransportError>;
}

/// Side effect to run after a transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action<'e> {
    None,
    /// Name the device, register the GPS service, then advertise.
    Provision,
    Advertise,
    Deliver { peer: PeerHandle, data: &'e [u8] },
    Reject { peer: PeerHandle },
}

/// Next state and the work it needs.
///
/// The returned state is the one reached once the action has completed.
pub fn transition<'e>(
    state: ConnectionState,
    event: &'e PeripheralEvent,
    gps_handle: Option<AttrHandle>,
) -> (ConnectionState, Action<'e>) {
    use ConnectionState::*;

    match (state, event) {
        (Idle, PeripheralEvent::Registered)
        | (Advertising, PeripheralEvent::Registered)
        | (Connected(_), PeripheralEvent::Registered) => (Advertising, Action::Provision),

        (Idle, PeripheralEvent::Connected(peer))
        | (Advertising, PeripheralEvent::Connected(peer))
        | (Connected(_), PeripheralEvent::Connected(peer)) => (Connected(*peer), Action::None),

        (Connected(current), PeripheralEvent::Disconnected(peer)) if current == *peer => {
            (Advertising, Action::Advertise)
        }
        (Connected(current), PeripheralEvent::Disconnected(_)) => (Connected(current), Action::None),
        (Idle, PeripheralEvent::Disconnected(_)) => (Idle, Action::None),
        (Advertising, PeripheralEvent::Disconnected(_)) => (Advertising, Action::None),

        // GPS writes are taken in any state, one may race a disconnect
        (Idle, PeripheralEvent::Write { peer, handle, data })
        | (Advertising, PeripheralEvent::Write { peer, handle, data })
        | (Connected(_), PeripheralEvent::Write { peer, handle, data })
            if Some(*handle) == gps_handle =>
        {
            (state, Action::Deliver { peer: *peer, data: data.as_slice() })
        }
        (Idle, PeripheralEvent::Write { peer, .. })
        | (Advertising, PeripheralEvent::Write { peer, .. })
        | (Connected(_), PeripheralEvent::Write { peer, .. }) => {
            (state, Action::Reject { peer: *peer })
        }
    }
}

/// Retry a radio operation until it succeeds, pausing between attempts.
macro_rules! retry_transport {
    ($what:literal, $op:expr) => {
        loop {
            match $op.await {
                Ok(value) => break value,
                Err(e) => {
                    log::error!(concat!($what, " failed: {}, retrying"), e);
                    Timer::after(TRANSPORT_RETRY_DELAY).await;
                }
            }
        }
    };
}

/// Owns the link state and feeds GPS writes into the fix store.
pub struct ConnectionMachine<'a> {
    state: ConnectionState,
    gps_handle: Option<AttrHandle>,
    decoder: Decoder,
    device_name: &'static str,
    shared: &'a WaypointState,
}

impl<'a> ConnectionMachine<'a> {
    pub fn new(config: &Config, shared: &'a WaypointState) -> Self {
        Self {
            state: ConnectionState::Idle,
            gps_handle: None,
            decoder: Decoder::new(config.checksum, BLE_SOURCE),
            device_name: config.device_name,
            shared,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub async fn run<P: Peripheral>(&mut self, peripheral: &mut P) -> ! {
        loop {
            match peripheral.next_event().await {
                Ok(event) => self.handle(peripheral, &event).await,
                Err(e) => {
                    log::warn!("radio event error: {}", e);
                    Timer::after(TRANSPORT_RETRY_DELAY).await;
                }
            }
        }
    }

    pub async fn handle<P: Peripheral>(&mut self, peripheral: &mut P, event: &PeripheralEvent) {
        let (next, action) = transition(self.state, event, self.gps_handle);
        if next != self.state {
            log::info!("link {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.shared
            .set_connected(matches!(next, ConnectionState::Connected(_)));

        match action {
            Action::None => {}
            Action::Provision => self.provision(peripheral).await,
            Action::Advertise => self.advertise(peripheral).await,
            Action::Deliver { peer, data } => {
                self.deliver(data).await;
                self.respond(peripheral, peer, GattStatus::Ok).await;
            }
            Action::Reject { peer } => {
                log::warn!("write from {} to unknown attribute", peer);
                self.respond(peripheral, peer, GattStatus::InvalidHandle)
                    .await;
            }
        }
    }

    async fn provision<P: Peripheral>(&mut self, peripheral: &mut P) {
        retry_transport!("set device name", peripheral.set_device_name(self.device_name));
        let handle = retry_transport!("register gps service", peripheral.register_service(&GPS_SERVICE));
        log::info!("gps characteristic at handle {}", handle);
        self.gps_handle = Some(handle);
        self.advertise(peripheral).await;
    }

    async fn advertise<P: Peripheral>(&mut self, peripheral: &mut P) {
        retry_transport!("start advertising", peripheral.start_advertising());
        log::info!("advertising as {}", self.device_name);
    }

    async fn deliver(&self, data: &[u8]) {
        for outcome in self.decoder.decode(data) {
            match outcome {
                Ok(fix) => {
                    log::info!(
                        "fix {:.6}, {:.6} alt: {:.1} hdop: {:.1}",
                        fix.latitude,
                        fix.longitude,
                        fix.altitude,
                        fix.accuracy
                    );
                    self.shared.fixes.publish(fix).await;
                }
                Err(DecodeError::NoFix) | Err(DecodeError::Unsupported) => {
                    log::debug!("no position in sentence")
                }
                Err(e) => log::warn!("discarding sentence: {}", e),
            }
        }
    }

    /// The peer may already be gone, so give up after a few attempts.
    async fn respond<P: Peripheral>(&self, peripheral: &mut P, peer: PeerHandle, status: GattStatus) {
        for attempt in 1..=RESPONSE_ATTEMPTS {
            match peripheral.respond(peer, status).await {
                Ok(()) => return,
                Err(e) => {
                    log::warn!(
                        "write response to {} failed ({}/{}): {}",
                        peer,
                        attempt,
                        RESPONSE_ATTEMPTS,
                        e
                    );
                    if attempt < RESPONSE_ATTEMPTS {
                        Timer::after(TRANSPORT_RETRY_DELAY).await;
                    }
                }
            }
        }
        log::error!("giving up on write response to {}", peer);
    }
}
