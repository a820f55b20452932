use core::fmt::Write;

use crate::decoder::checksum;
use crate::types::GeoFix;

pub const MAX_GGA_LEN: usize = 96;

pub type GgaSentence = heapless::String<MAX_GGA_LEN>;

/// Render a fix as a checksummed GGA sentence, without line terminator.
///
/// Time and satellite count are left empty, the fix does not carry them.
pub fn format_gga(fix: &GeoFix, quality: u8) -> Result<GgaSentence, core::fmt::Error> {
    let (lat_deg, lat_min) = split_degrees(fix.latitude);
    let (lon_deg, lon_min) = split_degrees(fix.longitude);
    let ns = if fix.latitude < 0.0 { 'S' } else { 'N' };
    let ew = if fix.longitude < 0.0 { 'W' } else { 'E' };

    let mut sentence = GgaSentence::new();
    write!(
        sentence,
        "$GPGGA,,{:02}{:08.5},{},{:03}{:08.5},{},{},,{:.1},{:.1},M,,M,,",
        lat_deg, lat_min, ns, lon_deg, lon_min, ew, quality, fix.accuracy, fix.altitude,
    )?;
    let cs = checksum(&sentence);
    write!(sentence, "*{:02X}", cs)?;

    Ok(sentence)
}

// whole degrees and minutes, minutes rounded to the printed precision
fn split_degrees(decimal: f64) -> (u32, f64) {
    let abs = libm::fabs(decimal);
    let mut degrees = libm::floor(abs);
    let mut minutes = libm::round((abs - degrees) * 60.0 * 100_000.0) / 100_000.0;
    if minutes >= 60.0 {
        degrees += 1.0;
        minutes -= 60.0;
    }
    (degrees as u32, minutes)
}
