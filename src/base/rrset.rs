//! Resource record sets.
//!
//! An RRset is the set of all records sharing owner name, class and
//! record type. It is the unit DNSSEC signs: an RRSIG record covers an
//! entire RRset, never a single record.

use crate::base::iana::{Class, Rtype};
use crate::base::name::Name;
use crate::base::record::{Record, Ttl};
use crate::rdata::{AllRecordData, RecordData, Rrsig};
use std::{error, fmt};

//------------ Rrset ---------------------------------------------------------

/// A non-empty set of records with the same owner, class, and type.
///
/// The set also holds the RRSIG records covering it, which may be empty.
/// An RRset without signatures is simply unsigned. Whether that is
/// acceptable is up to the validator.
///
/// Once created, an RRset is not modified anymore.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rrset {
    owner: Name,
    class: Class,
    rtype: Rtype,
    records: Vec<Record>,
    sigs: Vec<Record<Rrsig>>,
}

impl Rrset {
    /// Creates an RRset from records and signatures.
    ///
    /// Fails if `records` is empty, if the records don’t all share owner,
    /// class, and type, or if a signature is for a different owner, class,
    /// or type.
    pub fn new(
        records: Vec<Record>,
        sigs: Vec<Record<Rrsig>>,
    ) -> Result<Self, MalformedSetError> {
        let first = records.first().ok_or(MalformedSetError::Empty)?;
        let owner = first.owner().clone();
        let class = first.class();
        let rtype = first.rtype();
        if rtype == Rtype::RRSIG {
            return Err(MalformedSetError::SignatureRecords);
        }
        if records.iter().any(|record| {
            record.owner() != &owner
                || record.class() != class
                || record.rtype() != rtype
        }) {
            return Err(MalformedSetError::MixedRecords);
        }
        if sigs.iter().any(|sig| {
            sig.owner() != &owner
                || sig.class() != class
                || sig.data().type_covered() != rtype
        }) {
            return Err(MalformedSetError::SignatureMismatch);
        }
        Ok(Rrset {
            owner,
            class,
            rtype,
            records,
            sigs,
        })
    }

    /// Returns the owner name of the set.
    #[must_use]
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the class of the set.
    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the record type of the set.
    #[must_use]
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the TTL of the set.
    ///
    /// This is the smallest TTL of all member records.
    #[must_use]
    pub fn ttl(&self) -> Ttl {
        self.records
            .iter()
            .map(Record::ttl)
            .min()
            .unwrap_or(Ttl::ZERO)
    }

    /// Returns the records of the set in the order they were given.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns an iterator over the record data of the set.
    pub fn iter_data(&self) -> impl Iterator<Item = &AllRecordData> {
        self.records.iter().map(Record::data)
    }

    /// Returns an iterator over the record data of a concrete type.
    ///
    /// If `Data` is not the type of the set, the iterator is empty.
    pub fn iter_typed<'a, Data: 'a>(&'a self) -> impl Iterator<Item = &'a Data>
    where
        &'a Data: TryFrom<&'a AllRecordData>,
    {
        self.records
            .iter()
            .filter_map(|record| <&'a Data>::try_from(record.data()).ok())
    }

    /// Returns the signatures covering the set.
    #[must_use]
    pub fn sigs(&self) -> &[Record<Rrsig>] {
        &self.sigs
    }

    /// Returns whether there are signatures for this set.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        !self.sigs.is_empty()
    }

    /// Returns a copy of the set with its TTLs capped at `ttl`.
    ///
    /// Both member records and signatures are capped.
    #[must_use]
    pub fn with_ttl_cap(&self, ttl: Ttl) -> Self {
        let mut res = self.clone();
        for record in &mut res.records {
            record.set_ttl(record.ttl().min(ttl));
        }
        for sig in &mut res.sigs {
            sig.set_ttl(sig.ttl().min(ttl));
        }
        res
    }

    /// Returns all records including the signatures as generic records.
    pub fn iter_all(&self) -> impl Iterator<Item = Record> + '_ {
        self.records.iter().cloned().chain(
            self.sigs
                .iter()
                .map(|sig| sig.with_data(sig.data().clone().into())),
        )
    }
}

impl fmt::Display for Rrset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.class, self.rtype)
    }
}

//------------ MalformedSetError ---------------------------------------------

/// Records could not be combined into an RRset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MalformedSetError {
    /// There were no records.
    Empty,

    /// The records don’t share owner, class, and type.
    MixedRecords,

    /// RRSIG records were given as members of a set.
    SignatureRecords,

    /// A signature covers a different owner, class, or type.
    SignatureMismatch,
}

impl fmt::Display for MalformedSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MalformedSetError::Empty => "empty RRset",
            MalformedSetError::MixedRecords => {
                "records differ in owner, class, or type"
            }
            MalformedSetError::SignatureRecords => "RRSIG records in RRset",
            MalformedSetError::SignatureMismatch => {
                "signature does not cover the RRset"
            }
        })
    }
}

impl error::Error for MalformedSetError {}

//============ Testing =======================================================
