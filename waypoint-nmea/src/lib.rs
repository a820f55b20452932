#![no_std]

#[cfg(test)]
extern crate std;

mod decoder;
mod format;
mod types;

pub use decoder::{
    checksum, ddmm_to_decimal, ChecksumPolicy, DecodeError, Decoded, Decoder, GGA_FIELDS,
    MAX_SENTENCE_LEN,
};
pub use format::{format_gga, GgaSentence, MAX_GGA_LEN};
pub use types::{GeoFix, BLE_SOURCE};

#[cfg(test)]
mod decoder_tests;
