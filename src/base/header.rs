//! The header of a DNS message.
//!
//! Each DNS message starts with a twelve octet long header section
//! containing some general information related to the message as well as
//! the number of records in each of the four sections that follow the
//! header. Since the message type of this crate keeps its sections as
//! vectors, only the first four octets of the header with the ID, the
//! flags, the opcode and the response code are kept here.

use crate::base::iana::Rcode;
use std::fmt;

//------------ Header --------------------------------------------------

/// The first part of the header of a DNS message.
///
/// The flags are accessed through a pair of a getter and a setter each,
/// named after the abbreviation used for the flag in RFC 1035 and its
/// successors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Header {
    id: u16,
    qr: bool,
    opcode: u8,
    aa: bool,
    tc: bool,
    rd: bool,
    ra: bool,
    ad: bool,
    cd: bool,
    rcode: Rcode,
}

impl Header {
    /// Creates a new header.
    ///
    /// The new header has all fields as either zero or false. Thus, the
    /// opcode will be QUERY and the response code will be NOERROR.
    #[must_use]
    pub fn new() -> Self {
        Header {
            id: 0,
            qr: false,
            opcode: 0,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            ad: false,
            cd: false,
            rcode: Rcode::NOERROR,
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// # Field Access
///
impl Header {
    /// Returns the value of the ID field.
    ///
    /// The ID field is an identifier chosen by whoever created a query
    /// and is copied into a response by a server. It allows matching
    /// incoming responses to their queries.
    #[must_use]
    pub fn id(self) -> u16 {
        self.id
    }

    /// Sets the value of the ID field.
    pub fn set_id(&mut self, value: u16) {
        self.id = value
    }

    /// Sets the value of the ID field to a randomly chosen number.
    pub fn set_random_id(&mut self) {
        self.set_id(rand::random())
    }

    /// Returns whether the QR bit is set.
    ///
    /// The QR bit specifies whether this message is a query (`false`) or
    /// a response (`true`).
    #[must_use]
    pub fn qr(self) -> bool {
        self.qr
    }

    pub fn set_qr(&mut self, set: bool) {
        self.qr = set
    }

    /// Returns the raw opcode.
    #[must_use]
    pub fn opcode(self) -> u8 {
        self.opcode
    }

    pub fn set_opcode(&mut self, opcode: u8) {
        self.opcode = opcode & 0x0F
    }

    /// Returns whether the AA bit is set.
    #[must_use]
    pub fn aa(self) -> bool {
        self.aa
    }

    pub fn set_aa(&mut self, set: bool) {
        self.aa = set
    }

    /// Returns whether the TC bit is set.
    #[must_use]
    pub fn tc(self) -> bool {
        self.tc
    }

    pub fn set_tc(&mut self, set: bool) {
        self.tc = set
    }

    /// Returns whether the RD bit is set.
    ///
    /// The recursion desired bit may be set in a query to ask the name
    /// server to try and recursively gather a response if it doesn’t
    /// have the data available locally.
    #[must_use]
    pub fn rd(self) -> bool {
        self.rd
    }

    pub fn set_rd(&mut self, set: bool) {
        self.rd = set
    }

    /// Returns whether the RA bit is set.
    #[must_use]
    pub fn ra(self) -> bool {
        self.ra
    }

    pub fn set_ra(&mut self, set: bool) {
        self.ra = set
    }

    /// Returns whether the AD bit is set.
    ///
    /// The authentic data bit is used by security-aware recursive name
    /// servers to indicate that it considers all RRsets in its response
    /// to be authentic, i.e., to have successfully passed DNSSEC
    /// validation.
    #[must_use]
    pub fn ad(self) -> bool {
        self.ad
    }

    pub fn set_ad(&mut self, set: bool) {
        self.ad = set
    }

    /// Returns whether the CD bit is set.
    ///
    /// The checking disabled bit is used by a security aware resolver
    /// to indicate that it does not want upstream name servers to perform
    /// verification but rather would do it all by itself.
    #[must_use]
    pub fn cd(self) -> bool {
        self.cd
    }

    pub fn set_cd(&mut self, set: bool) {
        self.cd = set
    }

    /// Returns the value of the RCODE field.
    #[must_use]
    pub fn rcode(self) -> Rcode {
        self.rcode
    }

    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.rcode = rcode
    }
}

//--- Display

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "id {} rcode {} flags", self.id, self.rcode)?;
        for (set, name) in [
            (self.qr, "QR"),
            (self.aa, "AA"),
            (self.tc, "TC"),
            (self.rd, "RD"),
            (self.ra, "RA"),
            (self.ad, "AD"),
            (self.cd, "CD"),
        ] {
            if set {
                write!(f, " {}", name)?;
            }
        }
        Ok(())
    }
}

//============ Testing ======================================================
