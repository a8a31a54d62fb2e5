//! Record data from [RFC 4034]: DS, DNSKEY, RRSIG, and NSEC records.
//!
//! This RFC defines the record types for DNSSEC.
//!
//! [RFC 4034]: https://tools.ietf.org/html/rfc4034

use crate::base::iana::{DigestAlgorithm, Rtype, SecurityAlgorithm};
use crate::base::name::Name;
use crate::base::record::Ttl;
use crate::base::scan::{ScanError, Scanner};
use crate::base::serial::Serial;
use crate::rdata::RecordData;
use bytes::Bytes;
use data_encoding::{BASE64, HEXUPPER};
use std::cmp::Ordering;
use std::{cmp, fmt};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

//------------ Dnskey --------------------------------------------------------

/// DNSKEY record data.
///
/// A DNSKEY record holds a public key of a zone. The flags tell whether
/// the key may sign zone data at all (the zone key flag) and whether it is
/// meant as an entry point for the chain of trust (the secure entry point
/// flag, commonly set on key signing keys).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Dnskey {
    flags: u16,
    protocol: u8,
    algorithm: SecurityAlgorithm,
    public_key: Bytes,
}

impl Dnskey {
    /// The zone key flag, bit 7.
    pub const ZONE_KEY: u16 = 0x0100;

    /// The revoke flag from RFC 5011, bit 8.
    pub const REVOKE: u16 = 0x0080;

    /// The secure entry point flag, bit 15.
    pub const SECURE_ENTRY_POINT: u16 = 0x0001;

    #[must_use]
    pub fn new(
        flags: u16,
        protocol: u8,
        algorithm: SecurityAlgorithm,
        public_key: Bytes,
    ) -> Self {
        Dnskey {
            flags,
            protocol,
            algorithm,
            public_key,
        }
    }

    #[must_use]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    #[must_use]
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    #[must_use]
    pub fn algorithm(&self) -> SecurityAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }

    /// Returns whether the Revoke flag is set.
    ///
    /// See [RFC 5011, Section 3].
    ///
    /// [RFC 5011, Section 3]: https://tools.ietf.org/html/rfc5011#section-3
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.flags & Self::REVOKE != 0
    }

    /// Returns whether the Secure Entry Point (SEP) flag is set.
    ///
    /// Validation ignores this flag.
    #[must_use]
    pub fn is_secure_entry_point(&self) -> bool {
        self.flags & Self::SECURE_ENTRY_POINT != 0
    }

    /// Returns whether the Zone Key flag is set.
    ///
    /// If the flag is not set, the key MUST NOT be used to verify RRSIGs
    /// that cover RRSETs. See [RFC 4034, Section 2.1.1].
    ///
    /// [RFC 4034, Section 2.1.1]: https://tools.ietf.org/html/rfc4034#section-2.1.1
    #[must_use]
    pub fn is_zone_key(&self) -> bool {
        self.flags & Self::ZONE_KEY != 0
    }

    /// Returns the key tag for this DNSKEY data.
    ///
    /// This is the algorithm of RFC 4034, appendix B.
    #[must_use]
    pub fn key_tag(&self) -> u16 {
        if self.algorithm == SecurityAlgorithm::RSAMD5 {
            // RFC 4034, Appendix B.1: bits 16 to 31 of the modulus.
            let len = self.public_key.len();
            if len > 2 {
                u16::from_be_bytes([
                    self.public_key[len - 3],
                    self.public_key[len - 2],
                ])
            } else {
                0
            }
        } else {
            // RFC 4034, Appendix B: the RDATA as big-endian 16 bit words,
            // summed with the carry folded back in.
            let [flags_hi, flags_lo] = self.flags.to_be_bytes();
            let head =
                [flags_hi, flags_lo, self.protocol, self.algorithm.to_int()];
            let sum = head
                .iter()
                .chain(self.public_key.iter())
                .enumerate()
                .fold(0u32, |sum, (i, &octet)| {
                    if i % 2 == 0 {
                        sum + (u32::from(octet) << 8)
                    } else {
                        sum + u32::from(octet)
                    }
                });
            ((sum + (sum >> 16)) & 0xFFFF) as u16
        }
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_parse("expected DNSKEY flags")?,
            scanner.scan_parse("expected DNSKEY protocol")?,
            scanner.scan_parse("expected DNSKEY algorithm")?,
            scanner.scan_base64_rest()?.into(),
        ))
    }
}

impl RecordData for Dnskey {
    fn rtype(&self) -> Rtype {
        Rtype::DNSKEY
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.flags.to_be_bytes());
        target.push(self.protocol);
        self.algorithm.compose(target);
        target.extend_from_slice(&self.public_key);
    }
}

impl fmt::Display for Dnskey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.flags,
            self.protocol,
            self.algorithm.to_int(),
            BASE64.encode(&self.public_key)
        )
    }
}

//------------ Ds -----------------------------------------------------------

/// DS record data.
///
/// A DS record lives in the parent zone and holds the digest of a DNSKEY
/// of the child zone, linking the two in the chain of trust.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ds {
    key_tag: u16,
    algorithm: SecurityAlgorithm,
    digest_type: DigestAlgorithm,
    digest: Bytes,
}

impl Ds {
    #[must_use]
    pub fn new(
        key_tag: u16,
        algorithm: SecurityAlgorithm,
        digest_type: DigestAlgorithm,
        digest: Bytes,
    ) -> Self {
        Ds {
            key_tag,
            algorithm,
            digest_type,
            digest,
        }
    }

    #[must_use]
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    #[must_use]
    pub fn algorithm(&self) -> SecurityAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn digest_type(&self) -> DigestAlgorithm {
        self.digest_type
    }

    #[must_use]
    pub fn digest(&self) -> &Bytes {
        &self.digest
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_parse("expected DS key tag")?,
            scanner.scan_parse("expected DS algorithm")?,
            scanner.scan_parse("expected DS digest type")?,
            scanner.scan_hex_rest()?.into(),
        ))
    }
}

impl RecordData for Ds {
    fn rtype(&self) -> Rtype {
        Rtype::DS
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.key_tag.to_be_bytes());
        self.algorithm.compose(target);
        self.digest_type.compose(target);
        target.extend_from_slice(&self.digest);
    }
}

impl fmt::Display for Ds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.key_tag,
            self.algorithm.to_int(),
            self.digest_type.to_int(),
            HEXUPPER.encode(&self.digest)
        )
    }
}

//------------ Timestamp ------------------------------------------------------

/// The inception or expiration time of an RRSIG.
///
/// Seconds since the Unix epoch modulo 2^32 ([RFC 4034], Section 3.1.5).
/// Because the value wraps, ordering follows the serial number arithmetic
/// of [RFC 1982] and is only defined for times less than 68 years apart.
///
/// [RFC 1982]: https://tools.ietf.org/html/rfc1982
/// [RFC 4034]: https://tools.ietf.org/html/rfc4034
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Timestamp(Serial);

impl Timestamp {
    /// Returns a serial number for the current Unix time.
    #[must_use]
    pub fn now() -> Self {
        Self(Serial::now())
    }

    /// Returns the timestamp as a raw integer.
    #[must_use]
    pub fn into_int(self) -> u32 {
        self.0.into_int()
    }

    /// Returns the number of seconds from `self` until `later`.
    ///
    /// Returns `None` if `later` is not actually later.
    #[must_use]
    pub fn secs_until(self, later: Timestamp) -> Option<u32> {
        self.0.distance_to(later.0)
    }

    /// Returns a timestamp `secs` seconds after this one.
    #[must_use]
    pub fn add_secs(self, secs: u32) -> Self {
        Timestamp(self.0.add(secs))
    }

    /// Reads a time from presentation format.
    ///
    /// Either `YYYYMMDDHHmmSS` in UTC or a plain number of seconds.
    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        scanner
            .scan_str()?
            .parse()
            .map_err(|_| ScanError::new("illegal signature time"))
    }
}

/// # Parsing and Composing
///
impl Timestamp {
    pub fn compose(&self, target: &mut Vec<u8>) {
        self.0.compose(target)
    }
}

//--- From and FromStr

impl From<u32> for Timestamp {
    fn from(item: u32) -> Self {
        Self(Serial::from(item))
    }
}

impl std::str::FromStr for Timestamp {
    type Err = IllegalSignatureTime;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if !src.is_ascii() || !src.bytes().all(|ch| ch.is_ascii_digit()) {
            return Err(IllegalSignatureTime(()));
        }
        if src.len() == 14 {
            let year = u32::from_str(&src[0..4])
                .map_err(|_| IllegalSignatureTime(()))?
                as i32;
            let month = Month::try_from(
                u8::from_str(&src[4..6])
                    .map_err(|_| IllegalSignatureTime(()))?,
            )
            .map_err(|_| IllegalSignatureTime(()))?;
            let day = u8::from_str(&src[6..8])
                .map_err(|_| IllegalSignatureTime(()))?;
            let hour = u8::from_str(&src[8..10])
                .map_err(|_| IllegalSignatureTime(()))?;
            let minute = u8::from_str(&src[10..12])
                .map_err(|_| IllegalSignatureTime(()))?;
            let second = u8::from_str(&src[12..14])
                .map_err(|_| IllegalSignatureTime(()))?;
            Ok(Timestamp(Serial(
                PrimitiveDateTime::new(
                    Date::from_calendar_date(year, month, day)
                        .map_err(|_| IllegalSignatureTime(()))?,
                    Time::from_hms(hour, minute, second)
                        .map_err(|_| IllegalSignatureTime(()))?,
                )
                .assume_utc()
                .unix_timestamp() as u32,
            )))
        } else if src.len() <= 10 {
            u32::from_str(src)
                .map(Into::into)
                .map_err(|_| IllegalSignatureTime(()))
        } else {
            Err(IllegalSignatureTime(()))
        }
    }
}

//--- Display

impl fmt::Display for Timestamp {
    /// Formats the timestamp as `YYYYMMDDHHmmSS`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match OffsetDateTime::from_unix_timestamp(i64::from(self.into_int()))
        {
            Ok(dt) => write!(
                f,
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

//--- Deserialize

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Timestamp {
    /// Accepts the presentation format, i.e., `YYYYMMDDHHmmSS` or the
    /// plain number of seconds, as a string.
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

//--- PartialOrd

impl cmp::PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

//------------ IllegalSignatureTime ------------------------------------------

/// An illegal signature time was encountered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IllegalSignatureTime(());

impl fmt::Display for IllegalSignatureTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("illegal signature time")
    }
}

impl std::error::Error for IllegalSignatureTime {}

//------------ Rrsig ---------------------------------------------------------

/// RRSIG record data.
///
/// An RRSIG record holds the signature over one RRset together with the
/// information needed to check it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Rrsig {
    type_covered: Rtype,
    algorithm: SecurityAlgorithm,
    labels: u8,
    original_ttl: Ttl,
    expiration: Timestamp,
    inception: Timestamp,
    key_tag: u16,
    signer_name: Name,
    signature: Bytes,
}

impl Rrsig {
    #[allow(clippy::too_many_arguments)] // XXX Consider changing.
    #[must_use]
    pub fn new(
        type_covered: Rtype,
        algorithm: SecurityAlgorithm,
        labels: u8,
        original_ttl: Ttl,
        expiration: Timestamp,
        inception: Timestamp,
        key_tag: u16,
        signer_name: Name,
        signature: Bytes,
    ) -> Self {
        Rrsig {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        }
    }

    #[must_use]
    pub fn type_covered(&self) -> Rtype {
        self.type_covered
    }

    #[must_use]
    pub fn algorithm(&self) -> SecurityAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn labels(&self) -> u8 {
        self.labels
    }

    #[must_use]
    pub fn original_ttl(&self) -> Ttl {
        self.original_ttl
    }

    #[must_use]
    pub fn expiration(&self) -> Timestamp {
        self.expiration
    }

    #[must_use]
    pub fn inception(&self) -> Timestamp {
        self.inception
    }

    #[must_use]
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    #[must_use]
    pub fn signer_name(&self) -> &Name {
        &self.signer_name
    }

    #[must_use]
    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: Bytes) {
        self.signature = signature
    }

    /// Appends the RRSIG data without the signature field to `target`.
    ///
    /// This is the first part of the data that is signed. The signer
    /// name is in canonical form as required by RFC 4034, section 3.1.8.1.
    pub fn compose_canonical_head(&self, target: &mut Vec<u8>) {
        self.type_covered.compose(target);
        self.algorithm.compose(target);
        target.push(self.labels);
        self.original_ttl.compose(target);
        self.expiration.compose(target);
        self.inception.compose(target);
        target.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer_name.compose_canonical(target);
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(
            scanner.scan_parse("expected type covered")?,
            scanner.scan_parse("expected algorithm")?,
            scanner.scan_parse("expected labels")?,
            Ttl::from_secs(scanner.scan_parse("expected original TTL")?),
            Timestamp::scan(scanner)?,
            Timestamp::scan(scanner)?,
            scanner.scan_parse("expected key tag")?,
            scanner.scan_name()?,
            scanner.scan_base64_rest()?.into(),
        ))
    }
}

impl RecordData for Rrsig {
    fn rtype(&self) -> Rtype {
        Rtype::RRSIG
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        self.type_covered.compose(target);
        self.algorithm.compose(target);
        target.push(self.labels);
        self.original_ttl.compose(target);
        self.expiration.compose(target);
        self.inception.compose(target);
        target.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer_name.compose(target);
        target.extend_from_slice(&self.signature);
    }

    fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
        self.compose_canonical_head(target);
        target.extend_from_slice(&self.signature);
    }
}

impl fmt::Display for Rrsig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {}",
            self.type_covered,
            self.algorithm.to_int(),
            self.labels,
            self.original_ttl.as_secs(),
            self.expiration,
            self.inception,
            self.key_tag,
            self.signer_name,
            BASE64.encode(&self.signature)
        )
    }
}

//------------ Nsec ----------------------------------------------------------

/// NSEC record data.
///
/// An NSEC record names the next owner name in the canonical order of the
/// zone and lists the types present at its own owner name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsec {
    next_name: Name,
    types: RtypeBitmap,
}

impl Nsec {
    #[must_use]
    pub fn new(next_name: Name, types: RtypeBitmap) -> Self {
        Nsec { next_name, types }
    }

    #[must_use]
    pub fn next_name(&self) -> &Name {
        &self.next_name
    }

    #[must_use]
    pub fn types(&self) -> &RtypeBitmap {
        &self.types
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        Ok(Self::new(scanner.scan_name()?, RtypeBitmap::scan(scanner)?))
    }
}

impl RecordData for Nsec {
    fn rtype(&self) -> Rtype {
        Rtype::NSEC
    }

    // The next name is not converted to lowercase, see RFC 6840,
    // section 5.1.
    fn compose_rdata(&self, target: &mut Vec<u8>) {
        self.next_name.compose(target);
        target.extend_from_slice(self.types.as_slice());
    }
}

impl fmt::Display for Nsec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.next_name, self.types)
    }
}

//------------ RtypeBitmap ---------------------------------------------------

/// The type bitmap of NSEC and NSEC3 records.
///
/// The bitmap is kept in its wire format: a sequence of windows, each
/// consisting of the window number, the length of the bitmap in octets
/// and the bitmap itself where the most significant bit of the first
/// octet represents the first type of the window.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RtypeBitmap(Bytes);

impl RtypeBitmap {
    /// Creates a bitmap from its wire format.
    pub fn from_octets(octets: Bytes) -> Result<Self, ScanError> {
        let mut data = octets.as_ref();
        let mut last_window = None;
        while !data.is_empty() {
            if data.len() < 2 {
                return Err(ScanError::new("short type bitmap"));
            }
            let (window, len) = (data[0], usize::from(data[1]));
            if last_window.map_or(false, |last| window <= last) {
                return Err(ScanError::new("unordered type bitmap"));
            }
            if len == 0 || len > 32 || data.len() < 2 + len {
                return Err(ScanError::new("invalid type bitmap window"));
            }
            last_window = Some(window);
            data = &data[2 + len..];
        }
        Ok(RtypeBitmap(octets))
    }

    /// Creates a bitmap containing the given types.
    pub fn from_types(types: impl IntoIterator<Item = Rtype>) -> Self {
        let mut windows = [[0_u8; 32]; 256];
        let mut used = [0_usize; 256];
        for rtype in types {
            let [window, low] = rtype.to_int().to_be_bytes();
            let (window, low) = (usize::from(window), usize::from(low));
            windows[window][low / 8] |= 0x80 >> (low % 8);
            used[window] = cmp::max(used[window], low / 8 + 1);
        }
        let mut res = Vec::new();
        for (window, &len) in used.iter().enumerate() {
            if len > 0 {
                res.push(window as u8);
                res.push(len as u8);
                res.extend_from_slice(&windows[window][..len]);
            }
        }
        RtypeBitmap(res.into())
    }

    /// Returns the wire format of the bitmap.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns whether the bitmap contains the given type.
    #[must_use]
    pub fn contains(&self, rtype: Rtype) -> bool {
        self.iter().any(|item| item == rtype)
    }

    /// Returns an iterator over the types in the bitmap.
    pub fn iter(&self) -> impl Iterator<Item = Rtype> + '_ {
        let mut res = Vec::new();
        let mut data = self.as_slice();
        while data.len() >= 2 {
            let (window, len) = (u16::from(data[0]), usize::from(data[1]));
            let bits = &data[2..cmp::min(2 + len, data.len())];
            for (octet_idx, octet) in bits.iter().enumerate() {
                for bit in 0..8 {
                    if octet & (0x80 >> bit) != 0 {
                        res.push(Rtype::from_int(
                            (window << 8) | (octet_idx as u16 * 8 + bit),
                        ));
                    }
                }
            }
            data = &data[cmp::min(2 + len, data.len())..];
        }
        res.into_iter()
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let mut types = Vec::new();
        while !scanner.is_exhausted() {
            types.push(scanner.scan_parse("expected record type")?);
        }
        Ok(Self::from_types(types))
    }
}

impl fmt::Display for RtypeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for rtype in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            rtype.fmt(f)?;
        }
        Ok(())
    }
}

//------------ Helper Functions ----------------------------------------------

/// Compares two records by their canonical record data.
///
/// This is the order used for the records of an RRset when computing
/// signatures (RFC 4034, section 6.3).
pub fn canonical_rdata_cmp<D: RecordData>(left: &D, right: &D) -> Ordering {
    let mut left_buf = Vec::new();
    let mut right_buf = Vec::new();
    left.compose_canonical_rdata(&mut left_buf);
    right.compose_canonical_rdata(&mut right_buf);
    left_buf.cmp(&right_buf)
}

//============ Test ==========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::record::Record;
    use std::str::FromStr;

    // Root KSK-2017 as published by IANA.
    const ROOT_KSK: &str = ". 172800 IN DNSKEY 257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=";

    #[test]
    fn dnskey_key_tag() {
        let rec = Record::from_str(ROOT_KSK).unwrap();
        let key = rec.to_record::<Dnskey>().unwrap();
        assert_eq!(key.data().key_tag(), 20326);
        assert!(key.data().is_zone_key());
        assert!(key.data().is_secure_entry_point());
        assert!(!key.data().is_revoked());
    }

    #[test]
    fn dnskey_flags() {
        let key = Dnskey::new(
            Dnskey::ZONE_KEY | Dnskey::REVOKE,
            3,
            SecurityAlgorithm::ED25519,
            Bytes::from_static(b"key"),
        );
        assert!(key.is_zone_key());
        assert!(key.is_revoked());
        assert!(!key.is_secure_entry_point());
    }

    #[test]
    fn timestamp_parse_and_display() {
        let ts = Timestamp::from_str("20230101000000").unwrap();
        assert_eq!(ts.into_int(), 1672531200);
        assert_eq!(ts.to_string(), "20230101000000");
        assert_eq!(Timestamp::from_str("1672531200").unwrap(), ts);
        assert!(Timestamp::from_str("20231301000000").is_err());
        assert!(Timestamp::from_str("2023-01-01").is_err());
        assert!(Timestamp::from_str("123456789012").is_err());
    }

    #[test]
    fn timestamp_serial_arithmetic() {
        let early = Timestamp::from(u32::MAX - 10);
        let late = early.add_secs(100);
        assert!(early < late);
        assert_eq!(early.secs_until(late), Some(100));
        assert_eq!(late.secs_until(early), None);
    }

    #[test]
    fn bitmap() {
        let types = [Rtype::A, Rtype::MX, Rtype::RRSIG, Rtype::NSEC];
        let bitmap = RtypeBitmap::from_types(types);
        // Example from RFC 4034, section 4.3.
        assert_eq!(
            bitmap.as_slice(),
            &[0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03]
        );
        assert!(bitmap.contains(Rtype::MX));
        assert!(!bitmap.contains(Rtype::NS));
        assert_eq!(bitmap.iter().collect::<Vec<_>>(), types.to_vec());
        assert_eq!(bitmap.to_string(), "A MX RRSIG NSEC");

        let high = RtypeBitmap::from_types([Rtype::A, Rtype::from_int(1234)]);
        assert!(high.contains(Rtype::from_int(1234)));
        assert!(RtypeBitmap::from_octets(high.0.clone()).is_ok());
        assert!(RtypeBitmap::from_octets(Bytes::from_static(&[0, 0])).is_err());
        assert!(
            RtypeBitmap::from_octets(Bytes::from_static(&[1, 1, 0, 0, 1, 0]))
                .is_err()
        );
    }

    #[test]
    fn rrsig_display_round_trip() {
        let text = "example. 3600 IN RRSIG A 13 1 3600 20240101000000 20231201000000 12345 example. AAEC";
        let rec = Record::from_str(text).unwrap();
        let sig = rec.to_record::<Rrsig>().unwrap();
        assert_eq!(sig.data().type_covered(), Rtype::A);
        assert_eq!(sig.data().labels(), 1);
        assert_eq!(sig.data().signature().as_ref(), &[0, 1, 2]);
        assert_eq!(rec.to_string(), text);
    }

    #[test]
    fn ds_display() {
        let rec = Record::from_str(
            ". IN DS 20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D",
        )
        .unwrap();
        let ds = rec.to_record::<Ds>().unwrap();
        assert_eq!(ds.data().key_tag(), 20326);
        assert_eq!(ds.data().digest_type(), DigestAlgorithm::SHA256);
        assert_eq!(ds.data().digest().len(), 32);
        assert!(rec.to_string().ends_with("7C7F8EC8D"));
    }
}
