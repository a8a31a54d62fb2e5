//! Record data from [RFC 3596]: AAAA records.
//!
//! [RFC 3596]: https://tools.ietf.org/html/rfc3596

use crate::base::iana::Rtype;
use crate::base::scan::{ScanError, Scanner};
use crate::rdata::RecordData;
use std::fmt;
use std::net::Ipv6Addr;

//------------ Aaaa ---------------------------------------------------------

/// AAAA record data.
///
/// AAAA records contain the IPv6 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Aaaa {
    addr: Ipv6Addr,
}

impl Aaaa {
    #[must_use]
    pub fn new(addr: Ipv6Addr) -> Aaaa {
        Aaaa { addr }
    }

    #[must_use]
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        scanner.scan_parse("expected IPv6 address").map(Self::new)
    }
}

impl RecordData for Aaaa {
    fn rtype(&self) -> Rtype {
        Rtype::AAAA
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.addr.octets())
    }
}

impl fmt::Display for Aaaa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}
