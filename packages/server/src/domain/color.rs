//! Deterministic participant colors.
//!
//! The color is derived from the identity with a 32-bit string hash so the
//! same user renders with the same color in every session and on every
//! server instance.

use std::fmt;

use serde::{Serialize, Serializer};

use super::value_object::UserId;

const SATURATION_BASE: i32 = 70;
const SATURATION_SPAN: i32 = 31;
const LIGHTNESS_BASE: i32 = 55;
const LIGHTNESS_SPAN: i32 = 26;

/// HSL color assigned to a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantColor {
    hue: u16,
    saturation: u8,
    lightness: u8,
}

impl ParticipantColor {
    /// Derive the color for an identity.
    ///
    /// Saturation stays within 70..=100 and lightness within 55..=80.
    pub fn from_identity(user_id: &UserId) -> Self {
        let hash = identity_hash(user_id.as_str());
        Self {
            hue: hash.rem_euclid(360) as u16,
            saturation: (SATURATION_BASE + hash.rem_euclid(SATURATION_SPAN)) as u8,
            lightness: (LIGHTNESS_BASE + hash.rem_euclid(LIGHTNESS_SPAN)) as u8,
        }
    }

    pub fn hue(&self) -> u16 {
        self.hue
    }

    pub fn saturation(&self) -> u8 {
        self.saturation
    }

    pub fn lightness(&self) -> u8 {
        self.lightness
    }
}

/// `h = c + (h << 5) - h` over UTF-16 code units, wrapping at 32 bits.
fn identity_hash(value: &str) -> i32 {
    value.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

impl fmt::Display for ParticipantColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Serialize for ParticipantColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
