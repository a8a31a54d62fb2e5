//! Structured DNS messages.
//!
//! This module defines [`Message`], a complete DNS message with all
//! sections decoded into [`Record`]s. Producing and consuming the wire
//! format is the business of the transport underneath the validator. What
//! arrives here has already been decoded and is treated as untrusted.

use crate::base::header::Header;
use crate::base::iana::{Rcode, Rtype};
use crate::base::name::Name;
use crate::base::opt::{ExtendedError, Opt};
use crate::base::question::Question;
use crate::base::record::{Record, Ttl};
use crate::rdata::AllRecordData;
use std::fmt;
use std::time::Duration;

//------------ Section -------------------------------------------------------

/// The three record sections of a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl Section {
    /// All sections in message order.
    pub const ALL: [Section; 3] =
        [Section::Answer, Section::Authority, Section::Additional];
}

//------------ Message -------------------------------------------------------

/// A DNS message.
///
/// The message consists of the [`Header`], the question section, three
/// record sections and, optionally, the EDNS data taken from the OPT
/// record. The OPT record itself never appears in the additional section.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    header: Header,
    question: Vec<Question>,
    answer: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
    opt: Option<Opt>,
}

/// # Creation
///
impl Message {
    /// Creates a new, empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recursive query for the given question.
    ///
    /// The query has a random ID, the RD bit set and EDNS data with the
    /// DO bit set as requested.
    #[must_use]
    pub fn query(question: Question, dnssec_ok: bool) -> Self {
        let mut res = Self::new();
        res.header.set_random_id();
        res.header.set_rd(true);
        res.question.push(question);
        res.opt = Some(Opt::new(dnssec_ok));
        res
    }

    /// Starts a response to the given request.
    ///
    /// The response copies ID, opcode, the RD and CD bits, and the
    /// question. It has EDNS data if the request had.
    #[must_use]
    pub fn start_response(request: &Message) -> Self {
        let mut res = Self::new();
        res.header.set_id(request.header.id());
        res.header.set_qr(true);
        res.header.set_opcode(request.header.opcode());
        res.header.set_rd(request.header.rd());
        res.header.set_cd(request.header.cd());
        res.question = request.question.clone();
        res.opt = request.opt.as_ref().map(|opt| Opt::new(opt.dnssec_ok()));
        res
    }
}

/// # Header and Question Access
///
impl Message {
    #[must_use]
    pub fn header(&self) -> Header {
        self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns the response code of the message.
    #[must_use]
    pub fn rcode(&self) -> Rcode {
        self.header.rcode()
    }

    /// Returns all entries of the question section.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.question
    }

    /// Returns the question if the message has exactly one.
    #[must_use]
    pub fn sole_question(&self) -> Option<&Question> {
        match self.question.as_slice() {
            [question] => Some(question),
            _ => None,
        }
    }

    pub fn push_question(&mut self, question: Question) {
        self.question.push(question)
    }
}

/// # Record Sections
///
impl Message {
    #[must_use]
    pub fn answer(&self) -> &[Record] {
        &self.answer
    }

    #[must_use]
    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    #[must_use]
    pub fn additional(&self) -> &[Record] {
        &self.additional
    }

    /// Returns the records of the given section.
    #[must_use]
    pub fn section(&self, section: Section) -> &[Record] {
        match section {
            Section::Answer => &self.answer,
            Section::Authority => &self.authority,
            Section::Additional => &self.additional,
        }
    }

    /// Returns a mutable reference to the records of the given section.
    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Record> {
        match section {
            Section::Answer => &mut self.answer,
            Section::Authority => &mut self.authority,
            Section::Additional => &mut self.additional,
        }
    }

    /// Appends a record to the given section.
    pub fn push(&mut self, section: Section, record: impl Into<Record>) {
        self.section_mut(section).push(record.into())
    }

    /// Returns an iterator over the records of all three sections.
    pub fn all_records(&self) -> impl Iterator<Item = &Record> {
        self.answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
    }

    /// Removes all records for which `op` returns `false`.
    pub fn retain_records(&mut self, mut op: impl FnMut(&Record) -> bool) {
        for section in Section::ALL {
            self.section_mut(section).retain(&mut op)
        }
    }

    /// Removes RRSIG, NSEC, and NSEC3 records not explicitly asked for.
    ///
    /// This is what needs to happen to a response to a client that has not
    /// set the DO bit (RFC 3225, section 3).
    pub fn strip_dnssec_records(&mut self) {
        let qtype = self.sole_question().map(Question::qtype);
        let keep_answer = |record: &Record| {
            !record.rtype().is_dnssec() || Some(record.rtype()) == qtype
        };
        self.answer.retain(keep_answer);
        self.authority.retain(|record| !record.rtype().is_dnssec());
        self.additional.retain(|record| !record.rtype().is_dnssec());
    }

    /// Returns the smallest TTL of all records in the message.
    ///
    /// For negative responses the minimum field of a SOA record in the
    /// authority section caps the TTL as well. Returns `None` if there are
    /// no records at all.
    #[must_use]
    pub fn min_ttl(&self) -> Option<Ttl> {
        let mut res = self.all_records().map(Record::ttl).min();
        for record in &self.authority {
            if let AllRecordData::Soa(ref soa) = *record.data() {
                let ttl = record.ttl().min(soa.minimum());
                res = Some(res.map_or(ttl, |res| res.min(ttl)));
            }
        }
        res
    }

    /// Reduces the TTL of every record by `elapsed`, saturating at zero.
    pub fn decrement_ttl(&mut self, elapsed: Duration) {
        let elapsed = Ttl::from_duration_lossy(elapsed);
        for section in Section::ALL {
            for record in self.section_mut(section) {
                record.set_ttl(record.ttl().saturating_sub(elapsed));
            }
        }
    }

    /// Returns whether the answer section contains a record of the given
    /// type owned by the given name.
    #[must_use]
    pub fn has_answer(&self, owner: &Name, rtype: Rtype) -> bool {
        self.answer
            .iter()
            .any(|record| record.rtype() == rtype && record.owner() == owner)
    }
}

/// # EDNS
///
impl Message {
    #[must_use]
    pub fn opt(&self) -> Option<&Opt> {
        self.opt.as_ref()
    }

    pub fn opt_mut(&mut self) -> Option<&mut Opt> {
        self.opt.as_mut()
    }

    pub fn set_opt(&mut self, opt: Option<Opt>) {
        self.opt = opt
    }

    /// Returns whether the DNSSEC OK bit is set.
    ///
    /// A message without EDNS data never has the bit set.
    #[must_use]
    pub fn dnssec_ok(&self) -> bool {
        self.opt.as_ref().map_or(false, Opt::dnssec_ok)
    }

    /// Sets the DNSSEC OK bit, adding EDNS data if necessary.
    pub fn set_dnssec_ok(&mut self, value: bool) {
        self.opt.get_or_insert_with(Opt::default).set_dnssec_ok(value)
    }

    /// Returns the extended errors of the message.
    #[must_use]
    pub fn extended_errors(&self) -> &[ExtendedError] {
        match self.opt.as_ref() {
            Some(opt) => opt.extended_errors(),
            None => &[],
        }
    }

    /// Adds an extended error, adding EDNS data if necessary.
    pub fn push_extended_error(&mut self, error: ExtendedError) {
        self.opt
            .get_or_insert_with(Opt::default)
            .push_extended_error(error)
    }
}

//--- Display

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ";; {}", self.header)?;
        if let Some(opt) = self.opt.as_ref() {
            write!(f, ";; EDNS udp {}", opt.udp_payload_size())?;
            if opt.dnssec_ok() {
                f.write_str(" do")?;
            }
            writeln!(f)?;
            for ede in opt.extended_errors() {
                writeln!(f, ";; EDE {}", ede)?;
            }
        }
        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.question {
            writeln!(f, ";{}", question)?;
        }
        for (section, name) in [
            (&self.answer, "ANSWER"),
            (&self.authority, "AUTHORITY"),
            (&self.additional, "ADDITIONAL"),
        ] {
            if section.is_empty() {
                continue;
            }
            writeln!(f, ";; {} SECTION:", name)?;
            for record in section {
                writeln!(f, "{}", record)?;
            }
        }
        Ok(())
    }
}

//============ Testing =======================================================
