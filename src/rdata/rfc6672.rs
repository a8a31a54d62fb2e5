//! Record data from [RFC 6672]: DNAME records.
//!
//! [RFC 6672]: https://tools.ietf.org/html/rfc6672

use crate::base::iana::Rtype;
use crate::base::name::Name;
use crate::base::scan::{ScanError, Scanner};
use crate::rdata::RecordData;
use std::fmt;

//------------ Dname --------------------------------------------------------

/// DNAME record data.
///
/// The DNAME record provides redirection for a subtree of the domain
/// name tree in the DNS. Queries for names below the owner are answered
/// by substituting the owner suffix with the target.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Dname {
    target: Name,
}

impl Dname {
    #[must_use]
    pub fn new(target: Name) -> Self {
        Dname { target }
    }

    /// Returns the substitution target.
    #[must_use]
    pub fn target(&self) -> &Name {
        &self.target
    }

    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        scanner.scan_name().map(Self::new)
    }
}

impl RecordData for Dname {
    fn rtype(&self) -> Rtype {
        Rtype::DNAME
    }

    fn compose_rdata(&self, target: &mut Vec<u8>) {
        self.target.compose(target)
    }

    fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
        self.target.compose_canonical(target)
    }
}

impl fmt::Display for Dname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.target.fmt(f)
    }
}
