//! The EDNS data of a message.
//!
//! Only the parts of the OPT record relevant to a validating stub are
//! kept: the advertised UDP payload size, the DNSSEC OK bit of
//! [RFC 3225] and the extended DNS errors of [RFC 8914].
//!
//! [RFC 3225]: https://tools.ietf.org/html/rfc3225
//! [RFC 8914]: https://tools.ietf.org/html/rfc8914

use crate::base::iana::ExtendedErrorCode;
use std::fmt;

//------------ Opt -----------------------------------------------------------

/// The EDNS(0) data of a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Opt {
    /// The requestor’s UDP payload size.
    udp_payload_size: u16,

    /// The DNSSEC OK bit.
    dnssec_ok: bool,

    /// Extended DNS errors included in the message.
    extended_errors: Vec<ExtendedError>,
}

impl Opt {
    /// The UDP payload size we advertise by default.
    pub const DEFAULT_UDP_PAYLOAD_SIZE: u16 = 1232;

    /// Creates EDNS data with the given DO bit.
    #[must_use]
    pub fn new(dnssec_ok: bool) -> Self {
        Opt {
            udp_payload_size: Self::DEFAULT_UDP_PAYLOAD_SIZE,
            dnssec_ok,
            extended_errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn udp_payload_size(&self) -> u16 {
        self.udp_payload_size
    }

    pub fn set_udp_payload_size(&mut self, value: u16) {
        self.udp_payload_size = value
    }

    /// Returns whether the DNSSEC OK bit is set.
    #[must_use]
    pub fn dnssec_ok(&self) -> bool {
        self.dnssec_ok
    }

    pub fn set_dnssec_ok(&mut self, value: bool) {
        self.dnssec_ok = value
    }

    /// Returns the extended errors.
    #[must_use]
    pub fn extended_errors(&self) -> &[ExtendedError] {
        &self.extended_errors
    }

    /// Adds an extended error.
    pub fn push_extended_error(&mut self, error: ExtendedError) {
        self.extended_errors.push(error)
    }

    /// Removes all extended errors.
    pub fn clear_extended_errors(&mut self) {
        self.extended_errors.clear()
    }
}

impl Default for Opt {
    fn default() -> Self {
        Self::new(false)
    }
}

//------------ ExtendedError -------------------------------------------------

/// Option data for an extended DNS error.
///
/// The Extended DNS Error option allows a server to include more detailed
/// information in a response to a failed query why it did. It contains a
/// standardized [`ExtendedErrorCode`] for machines and an optional UTF-8
/// error text for humans.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ExtendedError {
    /// The extended error code.
    code: ExtendedErrorCode,

    /// Optional human-readable error information.
    text: Option<String>,
}

impl ExtendedError {
    /// The maximum length of the text.
    ///
    /// The option data is limited to 65,535 octets, two of which are
    /// taken by the code.
    pub const MAX_TEXT_LEN: usize = 65533;

    /// Creates a new value from a code and optional text.
    ///
    /// Text that is too long is truncated at a character boundary.
    #[must_use]
    pub fn new(code: ExtendedErrorCode, text: Option<String>) -> Self {
        let text = text.map(|mut text| {
            if text.len() > Self::MAX_TEXT_LEN {
                let mut end = Self::MAX_TEXT_LEN;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text.truncate(end);
            }
            text
        });
        Self { code, text }
    }

    /// Returns the error code.
    #[must_use]
    pub fn code(&self) -> ExtendedErrorCode {
        self.code
    }

    /// Returns the text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl From<ExtendedErrorCode> for ExtendedError {
    fn from(code: ExtendedErrorCode) -> Self {
        Self::new(code, None)
    }
}

impl fmt::Display for ExtendedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.code.fmt(f)?;
        if let Some(text) = self.text() {
            write!(f, " ({})", text)?;
        }
        Ok(())
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let ede = ExtendedError::new(
            ExtendedErrorCode::DNSSEC_BOGUS,
            Some("no signature".into()),
        );
        assert_eq!(ede.to_string(), "DNSSEC Bogus (no signature)");
        assert_eq!(
            ExtendedError::from(ExtendedErrorCode::NETWORK_ERROR).to_string(),
            "Network Error"
        );
    }

    #[test]
    fn long_text_is_truncated() {
        let text = "ä".repeat(ExtendedError::MAX_TEXT_LEN);
        let ede =
            ExtendedError::new(ExtendedErrorCode::OTHER, Some(text));
        let len = ede.text().map(str::len).unwrap_or(0);
        assert!(len <= ExtendedError::MAX_TEXT_LEN);
        assert!(len > ExtendedError::MAX_TEXT_LEN - 2);
    }
}
