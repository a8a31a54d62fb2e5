// Trust anchor

//! Trust anchors.
//!
//! A trust anchor is a set of DS or DNSKEY records for a zone that is
//! trusted without further validation. Anchors are read from text in
//! zone file presentation format once at startup and never change
//! afterwards.

use std::fmt;
use std::str;

use crate::base::iana::Rtype;
use crate::base::record::scan_records;
use crate::base::scan::ScanError;
use crate::base::{Name, Record};
use crate::rdata::{Dnskey, Ds};

//------------ TrustAnchor ---------------------------------------------------

/// The DS and DNSKEY records configured for one zone.
#[derive(Clone, Debug)]
pub struct TrustAnchor {
    owner: Name,
    label_count: usize,
    ds: Vec<Ds>,
    dnskeys: Vec<Dnskey>,
}

impl TrustAnchor {
    fn new(owner: Name) -> Self {
        let label_count = owner.label_count();
        Self {
            owner,
            label_count,
            ds: Vec::new(),
            dnskeys: Vec::new(),
        }
    }

    fn add(&mut self, rr: Record) -> Result<(), AnchorError> {
        if let Some(ds) = rr.to_record::<Ds>() {
            self.ds.push(ds.into_data());
        } else if let Some(dnskey) = rr.to_record::<Dnskey>() {
            self.dnskeys.push(dnskey.into_data());
        } else {
            return Err(AnchorError::WrongType(rr.rtype()));
        }
        Ok(())
    }

    /// Returns the zone the anchor is for.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the DS records of the anchor.
    pub fn ds(&self) -> &[Ds] {
        &self.ds
    }

    /// Returns the DNSKEY records of the anchor.
    pub fn dnskeys(&self) -> &[Dnskey] {
        &self.dnskeys
    }

    /// Returns whether `key` is one of the anchor’s DNSKEY records.
    pub fn has_dnskey(&self, key: &Dnskey) -> bool {
        self.dnskeys.iter().any(|anchor| {
            anchor.flags() == key.flags()
                && anchor.protocol() == key.protocol()
                && anchor.algorithm() == key.algorithm()
                && anchor.public_key() == key.public_key()
        })
    }
}

//------------ TrustAnchors --------------------------------------------------

/// The set of all configured trust anchors.
#[derive(Clone, Debug, Default)]
pub struct TrustAnchors(Vec<TrustAnchor>);

impl TrustAnchors {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Creates trust anchors from presentation format text.
    pub fn from_u8(text: &[u8]) -> Result<Self, AnchorError> {
        let mut new_self = Self::empty();
        new_self.add_u8(text)?;
        Ok(new_self)
    }

    /// Adds the anchors in presentation format text.
    ///
    /// Records other than DS and DNSKEY are rejected. Nothing is added if
    /// the text contains an error.
    pub fn add_u8(&mut self, text: &[u8]) -> Result<(), AnchorError> {
        let text = str::from_utf8(text).map_err(|_| AnchorError::Utf8)?;
        let records = scan_records(text)?;
        if let Some(rr) = records
            .iter()
            .find(|rr| rr.rtype() != Rtype::DS && rr.rtype() != Rtype::DNSKEY)
        {
            return Err(AnchorError::WrongType(rr.rtype()));
        }
        for rr in records {
            self.add(rr)?;
        }
        Ok(())
    }

    /// Adds a single DS or DNSKEY record.
    pub fn add(&mut self, rr: Record) -> Result<(), AnchorError> {
        // Very simplistic implementation of add. If this O(n^2) algorithm is
        // not enough, then we should use a small hash table or sort first.
        if let Some(anchor) = self.0.iter_mut().find(|a| a.owner == *rr.owner())
        {
            return anchor.add(rr);
        }
        let mut anchor = TrustAnchor::new(rr.owner().clone());
        anchor.add(rr)?;
        self.0.push(anchor);
        Ok(())
    }

    /// Returns the closest anchor at or above `name`.
    pub fn lookup(&self, name: &Name) -> Option<&TrustAnchor> {
        self.0
            .iter()
            .filter(|ta| name.ends_with(&ta.owner))
            .max_by_key(|ta| ta.label_count)
    }

    /// Returns the anchor configured for exactly `name`.
    pub fn get(&self, name: &Name) -> Option<&TrustAnchor> {
        self.0.iter().find(|ta| ta.owner == *name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//------------ AnchorError ---------------------------------------------------

/// Trust anchor text could not be used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnchorError {
    /// The text is not valid UTF-8.
    Utf8,

    /// The text is not valid presentation format.
    Scan(ScanError),

    /// A record is neither DS nor DNSKEY.
    WrongType(Rtype),
}

impl From<ScanError> for AnchorError {
    fn from(err: ScanError) -> Self {
        AnchorError::Scan(err)
    }
}

impl fmt::Display for AnchorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorError::Utf8 => f.write_str("trust anchor is not UTF-8"),
            AnchorError::Scan(err) => write!(f, "bad trust anchor: {err}"),
            AnchorError::WrongType(rtype) => {
                write!(f, "{rtype} record in trust anchor")
            }
        }
    }
}

impl std::error::Error for AnchorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnchorError::Scan(err) => Some(err),
            _ => None,
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ROOT: &str = ". 172800 IN DNSKEY 257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU= ;{id = 20326 (ksk), size = 2048b}
. IN DS 20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D
";

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn parse_and_lookup() {
        let mut ta = TrustAnchors::from_u8(ROOT.as_bytes()).unwrap();
        ta.add_u8(b"example.com. DS 12345 13 2 ( 0011 2233 )").unwrap();

        let root = ta.lookup(&name("www.example.org.")).unwrap();
        assert!(root.owner().is_root());
        assert_eq!(root.dnskeys().len(), 1);
        assert_eq!(root.ds().len(), 1);
        assert_eq!(root.dnskeys()[0].key_tag(), 20326);
        assert!(root.has_dnskey(&root.dnskeys()[0].clone()));

        let com = ta.lookup(&name("www.Example.COM.")).unwrap();
        assert_eq!(com.owner(), &name("example.com."));
        assert_eq!(com.ds()[0].key_tag(), 12345);
        assert!(ta.get(&name("com.")).is_none());
    }

    #[test]
    fn no_anchor() {
        let ta = TrustAnchors::from_u8(b"nl. DS 1 13 2 00").unwrap();
        assert!(ta.lookup(&name("example.com.")).is_none());
        assert!(TrustAnchors::empty().is_empty());
    }

    #[test]
    fn reject_other_types() {
        assert_eq!(
            TrustAnchors::from_u8(b"example. 3600 IN A 192.0.2.1")
                .unwrap_err(),
            AnchorError::WrongType(Rtype::A)
        );
        assert!(matches!(
            TrustAnchors::from_u8(b"example. DS 1 2"),
            Err(AnchorError::Scan(_))
        ));
    }
}
