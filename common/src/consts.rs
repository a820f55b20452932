use embassy_time::Duration;

/// GAP name the phone app looks for.
pub const DEVICE_NAME: &str = "WaypointCompass";

// Nordic UART Service layout, so generic BLE terminal apps can push sentences
pub const GPS_SERVICE_UUID: u128 = 0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E;
pub const GPS_CHARACTERISTIC_UUID: u128 = 0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E;

/// Largest attribute value a central can write (ATT limit).
pub const MAX_WRITE_LEN: usize = 512;

pub const TRANSPORT_RETRY_DELAY: Duration = Duration::from_millis(500);
pub const RESPONSE_ATTEMPTS: usize = 3;

/// Bound on how long a reader waits for the fix store lock.
pub const FIX_READ_TIMEOUT: Duration = Duration::from_millis(100);

pub const PROBE_PERIOD: Duration = Duration::from_secs(10);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const HEALTH_PATH: &str = "/health";

pub const MAX_HOST_LEN: usize = 64;
pub const MAX_PATH_LEN: usize = 128;
pub const HTTP_BUF_SIZE: usize = 1024;
