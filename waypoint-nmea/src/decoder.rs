use core::fmt;

use crate::types::GeoFix;

/// Longest sentence accepted, terminator excluded. Anything longer is
/// rejected rather than cut short.
pub const MAX_SENTENCE_LEN: usize = 510;

/// Fields a GGA sentence must carry for a fix: tag through altitude.
pub const GGA_FIELDS: usize = 10;

// GGA field positions
const LATITUDE: usize = 2;
const NS_INDICATOR: usize = 3;
const LONGITUDE: usize = 4;
const EW_INDICATOR: usize = 5;
const FIX_QUALITY: usize = 6;
const HDOP: usize = 8;
const ALTITUDE: usize = 9;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Parse fields without looking at the `*hh` suffix.
    #[default]
    Ignore,
    /// Reject sentences whose checksum is missing or wrong.
    Verify,
}

impl core::str::FromStr for ChecksumPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(ChecksumPolicy::Ignore),
            "verify" => Ok(ChecksumPolicy::Verify),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not a GGA sentence.
    Unsupported,
    /// Well formed, but the receiver has no fix (quality 0).
    NoFix,
    TooLong(usize),
    NotUtf8,
    /// Number of fields found.
    TooFewFields(usize),
    /// Index of the offending field.
    InvalidField(usize),
    BadChecksum,
}

impl DecodeError {
    /// Everything except the "no satellites yet" steady state.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, DecodeError::NoFix)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Unsupported => f.write_str("unsupported sentence"),
            DecodeError::NoFix => f.write_str("no fix"),
            DecodeError::TooLong(len) => write!(f, "sentence too long ({} bytes)", len),
            DecodeError::NotUtf8 => f.write_str("sentence is not text"),
            DecodeError::TooFewFields(count) => write!(f, "only {} fields", count),
            DecodeError::InvalidField(index) => write!(f, "invalid field {}", index),
            DecodeError::BadChecksum => f.write_str("checksum mismatch"),
        }
    }
}

/// XOR of every byte between the leading `$` and the `*`.
pub fn checksum(body: &str) -> u8 {
    body.strip_prefix('$')
        .unwrap_or(body)
        .bytes()
        .fold(0u8, |acc, b| acc ^ b)
}

/// `DDMM.MMMM` (or `DDDMM.MMMM`) to decimal degrees.
pub fn ddmm_to_decimal(value: f64) -> f64 {
    let degrees = libm::floor(value / 100.0);
    degrees + (value - degrees * 100.0) / 60.0
}

#[derive(Debug, Copy, Clone)]
pub struct Decoder {
    checksum: ChecksumPolicy,
    source: &'static str,
}

impl Decoder {
    pub const fn new(checksum: ChecksumPolicy, source: &'static str) -> Self {
        Self { checksum, source }
    }

    /// Decode every sentence in a link payload.
    ///
    /// The payload may hold several sentences separated by CR and/or LF;
    /// empty lines are skipped. Each item is the outcome for one sentence.
    pub fn decode<'a>(&self, payload: &'a [u8]) -> Decoded<'a> {
        Decoded {
            decoder: *self,
            sentences: payload.split(is_line_break as fn(&u8) -> bool),
        }
    }

    pub fn decode_sentence(&self, sentence: &[u8]) -> Result<GeoFix, DecodeError> {
        if sentence.len() > MAX_SENTENCE_LEN {
            return Err(DecodeError::TooLong(sentence.len()));
        }
        let text = core::str::from_utf8(sentence).map_err(|_| DecodeError::NotUtf8)?;

        let (body, suffix) = match text.split_once('*') {
            Some((body, suffix)) => (body, Some(suffix)),
            None => (text, None),
        };

        let tag = body.split(',').next().unwrap_or_default();
        if tag != "$GPGGA" && tag != "$GNGGA" {
            log::trace!("ignoring {}", tag);
            return Err(DecodeError::Unsupported);
        }

        if self.checksum == ChecksumPolicy::Verify {
            verify_checksum(body, suffix)?;
        }

        let mut fields = [""; GGA_FIELDS];
        let mut count = 0;
        for (slot, field) in fields.iter_mut().zip(body.split(',')) {
            *slot = field;
            count += 1;
        }
        if count < GGA_FIELDS {
            return Err(DecodeError::TooFewFields(count));
        }

        let quality = fields[FIX_QUALITY]
            .parse::<u8>()
            .map_err(|_| DecodeError::InvalidField(FIX_QUALITY))?;
        if quality == 0 {
            return Err(DecodeError::NoFix);
        }

        let latitude = parse_coordinate(
            fields[LATITUDE],
            fields[NS_INDICATOR],
            ("N", "S"),
            90.0,
            LATITUDE,
        )?;
        let longitude = parse_coordinate(
            fields[LONGITUDE],
            fields[EW_INDICATOR],
            ("E", "W"),
            180.0,
            LONGITUDE,
        )?;

        // receivers may leave these blank while the position is still good
        let accuracy = parse_optional_f32(fields[HDOP], HDOP)?;
        if accuracy < 0.0 {
            return Err(DecodeError::InvalidField(HDOP));
        }
        let altitude = parse_optional_f32(fields[ALTITUDE], ALTITUDE)?;

        Ok(GeoFix {
            latitude,
            longitude,
            altitude,
            accuracy,
            valid: true,
            source: self.source,
        })
    }
}

/// Iterator returned by [`Decoder::decode`].
pub struct Decoded<'a> {
    decoder: Decoder,
    sentences: core::slice::Split<'a, u8, fn(&u8) -> bool>,
}

impl Iterator for Decoded<'_> {
    type Item = Result<GeoFix, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let sentence = self.sentences.next()?;
            if sentence.is_empty() {
                continue;
            }
            return Some(self.decoder.decode_sentence(sentence));
        }
    }
}

fn is_line_break(b: &u8) -> bool {
    *b == b'\r' || *b == b'\n'
}

fn verify_checksum(body: &str, suffix: Option<&str>) -> Result<(), DecodeError> {
    let expected = suffix
        .and_then(|s| s.get(..2))
        .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        .ok_or(DecodeError::BadChecksum)?;

    if checksum(body) == expected {
        Ok(())
    } else {
        Err(DecodeError::BadChecksum)
    }
}

fn parse_coordinate(
    value: &str,
    hemisphere: &str,
    (positive, negative): (&str, &str),
    limit: f64,
    index: usize,
) -> Result<f64, DecodeError> {
    let raw = value
        .parse::<f64>()
        .map_err(|_| DecodeError::InvalidField(index))?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(DecodeError::InvalidField(index));
    }

    let minutes = raw - libm::floor(raw / 100.0) * 100.0;
    let decimal = ddmm_to_decimal(raw);
    if minutes >= 60.0 || decimal > limit {
        return Err(DecodeError::InvalidField(index));
    }

    if hemisphere == positive {
        Ok(decimal)
    } else if hemisphere == negative {
        Ok(-decimal)
    } else {
        Err(DecodeError::InvalidField(index + 1))
    }
}

/// Empty reads as zero, anything else must be a finite number.
fn parse_optional_f32(value: &str, index: usize) -> Result<f32, DecodeError> {
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DecodeError::InvalidField(index)),
    }
}
