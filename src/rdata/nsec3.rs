//! Record data from [RFC 5155]: NSEC3 records.
//!
//! This RFC defines the NSEC3 resource record for hashed authenticated
//! denial of existence.
//!
//! [RFC 5155]: https://tools.ietf.org/html/rfc5155

use super::dnssec::RtypeBitmap;
use crate::base::iana::{Nsec3HashAlgorithm, Rtype};
use crate::base::name::Name;
use crate::base::scan::{ScanError, Scanner};
use crate::rdata::RecordData;
use bytes::Bytes;
use data_encoding::{BASE32HEX_NOPAD, HEXLOWER};
use std::fmt;
use std::str::FromStr;

//------------ Nsec3 ---------------------------------------------------------

/// NSEC3 record data.
///
/// The owner name of an NSEC3 record is the hashed name of an existing
/// name in the zone prepended as a base32hex label to the zone apex. The
/// record data contains the hash of the next existing name in hash order
/// and the types present at the unhashed name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsec3 {
    hash_algorithm: Nsec3HashAlgorithm,
    flags: u8,
    iterations: u16,
    salt: Nsec3Salt,
    next_owner: OwnerHash,
    types: RtypeBitmap,
}

impl Nsec3 {
    /// The opt-out flag.
    ///
    /// If set, the span of the record may contain unsigned delegations.
    pub const OPT_OUT: u8 = 0x01;

    #[must_use]
    pub fn new(
        hash_algorithm: Nsec3HashAlgorithm,
        flags: u8,
        iterations: u16,
        salt: Nsec3Salt,
        next_owner: OwnerHash,
        types: RtypeBitmap,
    ) -> Self {
        Nsec3 {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_owner,
            types,
        }
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> Nsec3HashAlgorithm {
        self.hash_algorithm
    }

    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns whether the opt-out flag is set.
    #[must_use]
    pub fn opt_out(&self) -> bool {
        self.flags & Self::OPT_OUT != 0
    }

    #[must_use]
    pub fn iterations(&self) -> u16 {
        self.iterations
    }

    #[must_use]
    pub fn salt(&self) -> &Nsec3Salt {
        &self.salt
    }

    #[must_use]
    pub fn next_owner(&self) -> &OwnerHash {
        &self.next_owner
    }

    #[must_use]
    pub fn types(&self) -> &RtypeBitmap {
        &self.types
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_parse("expected hash algorithm")?,
            scanner.scan_parse("expected NSEC3 flags")?,
            scanner.scan_parse("expected NSEC3 iterations")?,
            scanner.scan_parse("expected NSEC3 salt")?,
            OwnerHash::from_octets(scanner.scan_base32hex()?.into())?,
            RtypeBitmap::scan(scanner)?,
        ))
    }
}

impl RecordData for Nsec3 {
    fn rtype(&self) -> Rtype {
        Rtype::NSEC3
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        self.hash_algorithm.compose(target);
        target.push(self.flags);
        target.extend_from_slice(&self.iterations.to_be_bytes());
        target.push(self.salt.len() as u8);
        target.extend_from_slice(self.salt.as_slice());
        target.push(self.next_owner.len() as u8);
        target.extend_from_slice(self.next_owner.as_slice());
        target.extend_from_slice(self.types.as_slice());
    }
}

impl fmt::Display for Nsec3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.hash_algorithm.to_int(),
            self.flags,
            self.iterations,
            self.salt,
            self.next_owner
        )?;
        if self.types.iter().next().is_some() {
            write!(f, " {}", self.types)?;
        }
        Ok(())
    }
}

//------------ Nsec3Salt -----------------------------------------------------

/// The salt value of an NSEC3 record.
///
/// The salt can never be longer than 255 octets since its length is encoded
/// as a single octet. In presentation format an empty salt is written as
/// a single dash.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Nsec3Salt(Bytes);

impl Nsec3Salt {
    /// Creates an empty salt value.
    #[must_use]
    pub fn empty() -> Self {
        Nsec3Salt(Bytes::new())
    }

    /// Creates a new salt value from the given octets.
    ///
    /// Returns succesfully if `octets` can indeed be used as a
    /// character string, i.e., it is not longer than 255 bytes.
    pub fn from_octets(octets: Bytes) -> Result<Self, Nsec3SaltError> {
        if octets.len() > 255 {
            Err(Nsec3SaltError(()))
        } else {
            Ok(Nsec3Salt(octets))
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Nsec3Salt {
    type Err = Nsec3SaltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self::empty());
        }
        let octets = data_encoding::HEXUPPER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(|_| Nsec3SaltError(()))?;
        Self::from_octets(octets.into())
    }
}

impl fmt::Display for Nsec3Salt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&HEXLOWER.encode(self.as_slice()))
        }
    }
}

//------------ OwnerHash -----------------------------------------------------

/// The hash over the next owner name.
///
/// This hash is used instead of the actual owner name in NSEC3 records.
/// In presentation format it is written in base32hex without padding.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OwnerHash(Bytes);

impl OwnerHash {
    /// Creates a new owner hash from the given octets.
    pub fn from_octets(octets: Bytes) -> Result<Self, ScanError> {
        if octets.is_empty() || octets.len() > 255 {
            Err(ScanError::new("invalid owner hash length"))
        } else {
            Ok(OwnerHash(octets))
        }
    }

    /// Decodes an owner hash from the first label of an NSEC3 owner name.
    ///
    /// Returns `None` if the label is not valid base32hex.
    #[must_use]
    pub fn from_label(label: &[u8]) -> Option<Self> {
        let text = label.to_ascii_uppercase();
        let octets = BASE32HEX_NOPAD.decode(&text).ok()?;
        Self::from_octets(octets.into()).ok()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the hash as a label in presentation format.
    #[must_use]
    pub fn to_label(&self) -> String {
        BASE32HEX_NOPAD.encode(self.as_slice()).to_ascii_lowercase()
    }

    /// Returns the NSEC3 owner name for this hash in the given zone.
    pub fn owner_name(
        &self,
        zone: &Name,
    ) -> Result<Name, crate::base::name::NameError> {
        zone.prepend(self.to_label().as_bytes())
    }
}

impl fmt::Display for OwnerHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_label())
    }
}

//------------ Nsec3SaltError ------------------------------------------------

/// A byte sequence does not represent a valid NSEC3 salt.
///
/// This can happen if it is longer than 255 octets or is not valid hex.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Nsec3SaltError(());

impl fmt::Display for Nsec3SaltError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("illegal NSEC3 salt")
    }
}

impl std::error::Error for Nsec3SaltError {}

//============ Testing =======================================================
