//! Record data from [RFC 1035]: initial record types.
//!
//! This RFC defines the initial set of record types. Only the types still
//! in common use are provided here.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use crate::base::iana::Rtype;
use crate::base::name::Name;
use crate::base::record::Ttl;
use crate::base::scan::{ScanError, Scanner};
use crate::base::serial::Serial;
use crate::rdata::RecordData;
use bytes::Bytes;
use std::fmt;
use std::net::Ipv4Addr;

//------------ A ------------------------------------------------------------

/// A record data.
///
/// A records convey the IPv4 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct A {
    addr: Ipv4Addr,
}

impl A {
    /// Creates a new A record data from an IPv4 address.
    #[must_use]
    pub fn new(addr: Ipv4Addr) -> A {
        A { addr }
    }

    /// Returns the IPv4 address.
    #[must_use]
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        scanner.scan_parse("expected IPv4 address").map(Self::new)
    }
}

impl RecordData for A {
    fn rtype(&self) -> Rtype {
        Rtype::A
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.addr.octets())
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}

//------------ Name-only record data -----------------------------------------

macro_rules! name_type {
    ($(#[$attr:meta])* $target:ident, $rtype:ident, $field:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $target {
            $field: Name,
        }

        impl $target {
            #[must_use]
            pub fn new($field: Name) -> Self {
                $target { $field }
            }

            #[must_use]
            pub fn $field(&self) -> &Name {
                &self.$field
            }

            pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
                scanner.scan_name().map(Self::new)
            }
        }

        impl RecordData for $target {
            fn rtype(&self) -> Rtype {
                Rtype::$rtype
            }

            fn compose_rdata(&self, target: &mut Vec<u8>) {
                self.$field.compose(target)
            }

            fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
                self.$field.compose_canonical(target)
            }
        }

        impl fmt::Display for $target {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.$field.fmt(f)
            }
        }
    };
}

name_type! {
    /// NS record data.
    ///
    /// NS records specify hosts that are authoritative for a class and
    /// domain.
    Ns, NS, nsdname
}

name_type! {
    /// CNAME record data.
    ///
    /// The CNAME record specifies the canonical or primary name for domain
    /// name alias.
    Cname, CNAME, cname
}

name_type! {
    /// PTR record data.
    Ptr, PTR, ptrdname
}

//------------ Soa ----------------------------------------------------------

/// Soa record data.
///
/// SOA records mark the top of a zone and contain information pertinent to
/// name server maintenance operations. In a negative response the SOA
/// record identifies the zone the denial was made for.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Soa {
    mname: Name,
    rname: Name,
    serial: Serial,
    refresh: Ttl,
    retry: Ttl,
    expire: Ttl,
    minimum: Ttl,
}

impl Soa {
    /// Creates new Soa record data from content.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        mname: Name,
        rname: Name,
        serial: Serial,
        refresh: Ttl,
        retry: Ttl,
        expire: Ttl,
        minimum: Ttl,
    ) -> Self {
        Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// The primary name server for the zone.
    #[must_use]
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// The mailbox for the person responsible for this zone.
    #[must_use]
    pub fn rname(&self) -> &Name {
        &self.rname
    }

    /// The serial number of the original copy of the zone.
    #[must_use]
    pub fn serial(&self) -> Serial {
        self.serial
    }

    /// The minimum TTL, used as TTL for negative responses.
    #[must_use]
    pub fn minimum(&self) -> Ttl {
        self.minimum
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_name()?,
            scanner.scan_name()?,
            Serial(scanner.scan_parse("expected serial")?),
            Ttl::from_secs(scanner.scan_parse("expected refresh")?),
            Ttl::from_secs(scanner.scan_parse("expected retry")?),
            Ttl::from_secs(scanner.scan_parse("expected expire")?),
            Ttl::from_secs(scanner.scan_parse("expected minimum")?),
        ))
    }

    /// Composes everything after the two names.
    fn compose_tail(&self, target: &mut Vec<u8>) {
        self.serial.compose(target);
        self.refresh.compose(target);
        self.retry.compose(target);
        self.expire.compose(target);
        self.minimum.compose(target);
    }
}

impl RecordData for Soa {
    fn rtype(&self) -> Rtype {
        Rtype::SOA
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        self.mname.compose(target);
        self.rname.compose(target);
        self.compose_tail(target);
    }

    fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
        self.mname.compose_canonical(target);
        self.rname.compose_canonical(target);
        self.compose_tail(target);
    }
}

impl fmt::Display for Soa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh.as_secs(),
            self.retry.as_secs(),
            self.expire.as_secs(),
            self.minimum.as_secs()
        )
    }
}

//------------ Mx -----------------------------------------------------------

/// Mx record data.
///
/// The Mx record specifies a host willing to serve as a mail exchange for
/// the owner name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Mx {
    preference: u16,
    exchange: Name,
}

impl Mx {
    /// Creates a new Mx record data from the components.
    #[must_use]
    pub fn new(preference: u16, exchange: Name) -> Self {
        Mx {
            preference,
            exchange,
        }
    }

    /// The preference for this record.
    #[must_use]
    pub fn preference(&self) -> u16 {
        self.preference
    }

    /// The name of the host that is the exchange.
    #[must_use]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_parse("expected preference")?,
            scanner.scan_name()?,
        ))
    }
}

impl RecordData for Mx {
    fn rtype(&self) -> Rtype {
        Rtype::MX
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.preference.to_be_bytes());
        self.exchange.compose(target);
    }

    fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.preference.to_be_bytes());
        self.exchange.compose_canonical(target);
    }
}

impl fmt::Display for Mx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

//------------ Txt ----------------------------------------------------------

/// Txt record data.
///
/// Txt records hold descriptive text as a sequence of character strings
/// of at most 255 octets each.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Txt {
    strings: Vec<Bytes>,
}

impl Txt {
    /// Creates new TXT record data from character strings.
    ///
    /// Returns `None` if there are no strings or a string is too long.
    #[must_use]
    pub fn new(strings: Vec<Bytes>) -> Option<Self> {
        if strings.is_empty() || strings.iter().any(|s| s.len() > 255) {
            return None;
        }
        Some(Txt { strings })
    }

    /// Returns an iterator over the character strings.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.strings.iter().map(AsRef::as_ref)
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let mut strings = Vec::new();
        while !scanner.is_exhausted() {
            let token = scanner.scan_str()?;
            strings.push(Bytes::copy_from_slice(token.as_bytes()));
        }
        Self::new(strings).ok_or(ScanError::new("invalid TXT data"))
    }
}

impl RecordData for Txt {
    fn rtype(&self) -> Rtype {
        Rtype::TXT
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        for s in &self.strings {
            target.push(s.len() as u8);
            target.extend_from_slice(s);
        }
    }
}

impl fmt::Display for Txt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for s in &self.strings {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str("\"")?;
            for &ch in s.iter() {
                if ch == b'"' || ch == b'\\' {
                    write!(f, "\\{}", ch as char)?;
                } else if ch.is_ascii_graphic() || ch == b' ' {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{ch:03}")?;
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}
