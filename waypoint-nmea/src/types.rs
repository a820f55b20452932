use serde::Serialize;

/// Source id stamped on fixes that arrive over the phone link.
pub const BLE_SOURCE: &str = "ble_gps";

/// One decoded position.
///
/// Field names follow the backend's GPS schema so the struct can be handed
/// straight to a JSON serializer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct GeoFix {
    /// Decimal degrees, south negative.
    pub latitude: f64,
    /// Decimal degrees, west negative.
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude: f32,
    /// Horizontal dilution of precision, lower is better.
    pub accuracy: f32,
    pub valid: bool,
    #[serde(rename = "deviceId")]
    pub source: &'static str,
}

impl GeoFix {
    /// Zero-value fix reported before anything has been decoded.
    pub const NONE: GeoFix = GeoFix {
        latitude: 0.0,
        longitude: 0.0,
        altitude: 0.0,
        accuracy: 0.0,
        valid: false,
        source: "",
    };
}
