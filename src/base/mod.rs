//! Basics.
//!
//! This module provides types for working with DNS data as the validator
//! sees it: domain names, resource records, RRsets, and complete messages
//! with their sections already decoded.
//!
//! # Types for DNS Data
//!
//! The module contains a number of types for DNS data, both fundamental
//! and composed. Because they often come with a number of support types,
//! they are arranged in submodules. These are:
//!
//! * [header] for the header of DNS messages,
//! * [iana] for the parameters defined in IANA registries,
//! * [message] for complete DNS messages,
//! * [name] for domain names,
//! * [opt] for the EDNS data of a message,
//! * [question] for questions,
//! * [record] for DNS resource records,
//! * [rrset] for sets of records of the same owner, class, and type,
//! * [scan] for reading the presentation format of records, and
//! * [serial] for serial numbers.
//!
//! The most important types are re-exported here.

pub use self::header::Header;
pub use self::iana::{Class, Rcode, Rtype};
pub use self::message::{Message, Section};
pub use self::name::Name;
pub use self::question::Question;
pub use self::record::{Record, Ttl};
pub use self::rrset::{MalformedSetError, Rrset};
pub use self::serial::Serial;

pub mod header;
pub mod iana;
pub mod message;
pub mod name;
pub mod opt;
pub mod question;
pub mod record;
pub mod rrset;
pub mod scan;
pub mod serial;
