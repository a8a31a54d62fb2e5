//! Resource Records.
//!
//! This module defines [`Record`], a single resource record with owner
//! name, class, time-to-live and record data, and [`Ttl`], the type used
//! for time-to-live values.

use crate::base::iana::{Class, Rtype};
use crate::base::name::Name;
use crate::base::scan::{self, ScanError, Scanner};
use crate::rdata::{AllRecordData, RecordData};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The TTL assumed for records in presentation format that omit it.
const DEFAULT_TTL: Ttl = Ttl::from_secs(3600);

//------------ Record --------------------------------------------------------

/// A DNS resource record.
///
/// The record data is generic so that code that knows which type it is
/// dealing with can use the concrete data type, such as
/// `Record<Rrsig>`. The default is [`AllRecordData`] which can hold any
/// record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record<Data = AllRecordData> {
    /// The owner of the record.
    owner: Name,

    /// The class of the record.
    class: Class,

    /// The time-to-live value of the record.
    ttl: Ttl,

    /// The record data.
    data: Data,
}

impl<Data> Record<Data> {
    /// Creates a new record from its parts.
    pub fn new(owner: Name, class: Class, ttl: Ttl, data: Data) -> Self {
        Record {
            owner,
            class,
            ttl,
            data,
        }
    }

    /// Returns a reference to the owner domain name.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype
    where
        Data: RecordData,
    {
        self.data.rtype()
    }

    /// Returns the record class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the record’s time-to-live.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Sets the record’s time-to-live.
    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl
    }

    /// Return a reference to the record data.
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Trades the record for its record data.
    pub fn into_data(self) -> Data {
        self.data
    }

    /// Creates a record with the same owner, class, and TTL but other data.
    pub fn with_data<Other>(&self, data: Other) -> Record<Other> {
        Record::new(self.owner.clone(), self.class, self.ttl, data)
    }
}

impl Record<AllRecordData> {
    /// Converts the record into one with concrete record data.
    ///
    /// Returns `None` if the record data is of a different type.
    pub fn to_record<Data>(&self) -> Option<Record<Data>>
    where
        Data: Clone,
        for<'a> &'a Data: TryFrom<&'a AllRecordData>,
    {
        let data = <&Data>::try_from(&self.data).ok()?;
        Some(self.with_data(data.clone()))
    }

    /// Scans a record from a presentation format entry.
    ///
    /// The entry is `owner [ttl] [class] type rdata`, where TTL and class
    /// may appear in either order. A missing class means IN.
    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        let owner = scanner.scan_name()?;
        let mut ttl = None;
        let mut class = None;
        let rtype = loop {
            let token = scanner.scan_str()?;
            if ttl.is_none() {
                if let Ok(value) = token.parse::<u32>() {
                    ttl = Some(Ttl::from_secs(value));
                    continue;
                }
            }
            if class.is_none() {
                if let Ok(value) = Class::from_str(token) {
                    class = Some(value);
                    continue;
                }
            }
            break Rtype::from_str(token)
                .map_err(|_| ScanError::new("unknown record type"))?;
        };
        let data = AllRecordData::scan(rtype, scanner)?;
        scanner.finish()?;
        Ok(Record::new(
            owner,
            class.unwrap_or(Class::IN),
            ttl.unwrap_or(DEFAULT_TTL),
            data,
        ))
    }
}

impl FromStr for Record<AllRecordData> {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = scan::entries(s)?;
        let entry = match entries.len() {
            1 => entries.remove(0),
            0 => return Err(ScanError::new("empty record")),
            _ => return Err(ScanError::new("more than one record")),
        };
        Record::scan(&mut Scanner::new(&entry))
    }
}

/// Scans all records in a piece of presentation format text.
pub fn scan_records(text: &str) -> Result<Vec<Record>, ScanError> {
    scan::entries(text)?
        .iter()
        .map(|entry| Record::scan(&mut Scanner::new(entry)))
        .collect()
}

//--- Display

impl<Data: RecordData + fmt::Display> fmt::Display for Record<Data> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner,
            self.ttl.as_secs(),
            self.class,
            self.rtype(),
            self.data
        )
    }
}

//------------ Ttl ----------------------------------------------------------

/// A span of time, typically used to describe the time a given DNS record
/// is valid.
///
/// `Ttl` implements many common arithmetic operators for easy
/// interaction. The values are kept in seconds as in the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct Ttl(u32);

impl Ttl {
    /// A time-to-live of zero.
    pub const ZERO: Ttl = Ttl(0);

    /// The largest possible time-to-live value.
    ///
    /// RFC 2181 caps TTLs at 2^31 - 1.
    pub const MAX: Ttl = Ttl((1 << 31) - 1);

    /// Creates a new `Ttl` from the specified number of seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Ttl(secs)
    }

    /// Returns the total time to live in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Creates a `Ttl` from a `Duration`, dropping sub-second parts and
    /// saturating at the maximum.
    #[must_use]
    pub fn from_duration_lossy(duration: Duration) -> Self {
        match u32::try_from(duration.as_secs()) {
            Ok(secs) => Ttl(secs).cap(),
            Err(_) => Ttl::MAX,
        }
    }

    /// Converts the `Ttl` into a `Duration`.
    #[must_use]
    pub const fn into_duration(&self) -> Duration {
        Duration::from_secs(self.0 as u64)
    }

    /// Checked integer subtraction.
    #[must_use]
    pub const fn checked_sub(self, rhs: Ttl) -> Option<Ttl> {
        match self.0.checked_sub(rhs.0) {
            Some(ttl) => Some(Ttl(ttl)),
            None => None,
        }
    }

    /// Saturating integer subtraction.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Ttl) -> Ttl {
        Ttl(self.0.saturating_sub(rhs.0))
    }

    /// Caps the value at [`Ttl::MAX`].
    #[must_use]
    pub const fn cap(self) -> Ttl {
        if self.0 > Self::MAX.0 {
            Self::MAX
        } else {
            self
        }
    }

    /// Appends the wire format of the value to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.0.to_be_bytes())
    }
}

impl From<Ttl> for Duration {
    fn from(value: Ttl) -> Self {
        value.into_duration()
    }
}

//============ Testing =======================================================
