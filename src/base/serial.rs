//! Serial number arithmetic.
//!
//! SOA serials and RRSIG timestamps are 32 bit values that wrap around.
//! [RFC 1982] defines how to add to and compare such values. [`Serial`]
//! implements these rules.
//!
//! [RFC 1982]: https://tools.ietf.org/html/rfc1982

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fmt, str};

/// Half the number space. Values this far apart are incomparable.
const HALF: u32 = 1 << 31;

//------------ Serial --------------------------------------------------------

/// A 32 bit serial number.
///
/// Equality is plain integer equality. Ordering follows RFC 1982 and is
/// therefore partial: values exactly `2^31` apart have no order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Serial(pub u32);

impl Serial {
    /// Returns the current Unix time in seconds, truncated to 32 bits.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Serial(secs as u32)
    }

    #[must_use]
    pub fn into_int(self) -> u32 {
        self.0
    }

    /// Returns the serial `n` steps after this one.
    ///
    /// RFC 1982 only defines addition for `n < 2^31`. Larger values are
    /// reduced to `2^31 - 1`.
    #[must_use]
    pub fn add(self, n: u32) -> Self {
        Serial(self.0.wrapping_add(n.min(HALF - 1)))
    }

    /// Returns how many steps `later` lies ahead of this serial.
    ///
    /// Returns `None` if `later` is actually earlier or incomparable.
    #[must_use]
    pub fn distance_to(self, later: Serial) -> Option<u32> {
        let diff = later.0.wrapping_sub(self.0);
        (diff < HALF).then_some(diff)
    }

    /// Appends the wire format of the value to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.0.to_be_bytes())
    }
}

impl From<u32> for Serial {
    fn from(value: u32) -> Self {
        Serial(value)
    }
}

impl From<Serial> for u32 {
    fn from(value: Serial) -> Self {
        value.0
    }
}

impl str::FromStr for Serial {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Serial)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialOrd for Serial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match other.0.wrapping_sub(self.0) {
            0 => Some(Ordering::Equal),
            HALF => None,
            diff if diff < HALF => Some(Ordering::Less),
            _ => Some(Ordering::Greater),
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrapping_addition() {
        assert_eq!(Serial(7).add(3), Serial(10));
        assert_eq!(Serial(u32::MAX - 1).add(5), Serial(3));
        assert_eq!(Serial(0).add(u32::MAX), Serial(HALF - 1));
    }

    #[test]
    fn ordering() {
        assert!(Serial(1) < Serial(2));
        assert!(Serial(u32::MAX) < Serial(0));
        assert!(Serial(0) > Serial(u32::MAX));
        assert!(Serial(10) > Serial(10u32.wrapping_sub(HALF - 1)));
        assert_eq!(Serial(5).partial_cmp(&Serial(5)), Some(Ordering::Equal));
        assert_eq!(Serial(0).partial_cmp(&Serial(HALF)), None);
        assert_eq!(Serial(HALF).partial_cmp(&Serial(0)), None);
    }

    #[test]
    fn distance() {
        assert_eq!(Serial(10).distance_to(Serial(15)), Some(5));
        assert_eq!(Serial(10).distance_to(Serial(10)), Some(0));
        assert_eq!(Serial(15).distance_to(Serial(10)), None);
        assert_eq!(Serial(u32::MAX).distance_to(Serial(4)), Some(5));
    }

    #[test]
    fn parse_and_display() {
        let serial: Serial = "2024010100".parse().unwrap();
        assert_eq!(serial, Serial(2_024_010_100));
        assert_eq!(serial.to_string(), "2024010100");
        assert!("-1".parse::<Serial>().is_err());
    }
}
