//! Resource data implementations.
//!
//! This module contains implementations for the record data of the record
//! types the validator needs to look into plus a few common ones that
//! show up in answers. Everything else is kept as opaque
//! [`UnknownRecordData`].
//!
//! The types are named identically to the [`Rtype`] constant they
//! implement. They are grouped into submodules for the RFCs they are
//! defined in. All types are also re-exported at the top level here.
//!
//! [`Rtype`]: crate::base::iana::Rtype

#[macro_use]
mod macros;

pub mod aaaa;
pub mod dnssec;
pub mod nsec3;
pub mod rfc1035;
pub mod rfc6672;

use crate::base::iana::Rtype;
use crate::base::scan::{ScanError, Scanner};
use bytes::Bytes;
use data_encoding::HEXUPPER;
use std::{error, fmt};

// The rdata_types! macro (defined in self::macros) reexports the record
// data types here and creates the AllRecordData enum containing all record
// types that can be handled by this crate.
rdata_types! {
    rfc1035::{
        A => A,
        NS => Ns,
        CNAME => Cname,
        SOA => Soa,
        PTR => Ptr,
        MX => Mx,
        TXT => Txt,
    }
    aaaa::{
        AAAA => Aaaa,
    }
    rfc6672::{
        DNAME => Dname,
    }
    dnssec::{
        DNSKEY => Dnskey,
        RRSIG => Rrsig,
        NSEC => Nsec,
        DS => Ds,
    }
    nsec3::{
        NSEC3 => Nsec3,
    }
}

//------------ RecordData ----------------------------------------------------

/// A type that represents record data.
///
/// The type needs to be able to tell the record type it belongs to and
/// produce its wire format, both as is and in the canonical form used
/// for DNSSEC signatures.
pub trait RecordData {
    /// Returns the record type associated with this record data instance.
    fn rtype(&self) -> Rtype;

    /// Appends the wire format of the record data to `target`.
    ///
    /// Domain names are never compressed.
    fn compose_rdata(&self, target: &mut Vec<u8>);

    /// Appends the canonical wire format of the record data to `target`.
    ///
    /// For the record types listed in RFC 4034, section 6.2 and updated by
    /// RFC 6840, embedded domain names are converted to lowercase. For
    /// all other types this is the same as [`compose_rdata`].
    ///
    /// [`compose_rdata`]: RecordData::compose_rdata
    fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
        self.compose_rdata(target)
    }
}

//------------ UnknownRecordData ---------------------------------------------

/// A type for parsing any type of record data.
///
/// This type accepts any record type and stores the plain, unparsed record
/// data as an octets sequence.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnknownRecordData {
    /// The record type of this data.
    rtype: Rtype,

    /// The record data.
    data: Bytes,
}

impl UnknownRecordData {
    /// Create generic record data from record type and data.
    #[must_use]
    pub fn from_octets(rtype: Rtype, data: Bytes) -> Self {
        UnknownRecordData { rtype, data }
    }

    /// Returns the record data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Scans the generic record data format.
    ///
    /// This is `\#` followed by the length in octets followed by the
    /// data in hex, see RFC 3597.
    pub fn scan(
        rtype: Rtype,
        scanner: &mut Scanner,
    ) -> Result<Self, ScanError> {
        if scanner.scan_str()? != "\\#" {
            return Err(ScanError::new("expected generic record data"));
        }
        let len: usize = scanner.scan_parse("expected data length")?;
        let data = scanner.scan_hex_rest()?;
        if data.len() != len {
            return Err(ScanError::new("generic data length mismatch"));
        }
        Ok(Self::from_octets(rtype, data.into()))
    }
}

impl RecordData for UnknownRecordData {
    fn rtype(&self) -> Rtype {
        self.rtype
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.data)
    }
}

impl fmt::Display for UnknownRecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            write!(f, " {}", HEXUPPER.encode(&self.data))?;
        }
        Ok(())
    }
}

//------------ WrongRecordType -----------------------------------------------

/// Record data was requested as a type it isn’t.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WrongRecordType(());

impl fmt::Display for WrongRecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("wrong record type")
    }
}

impl error::Error for WrongRecordType {}

//============ Testing =======================================================
