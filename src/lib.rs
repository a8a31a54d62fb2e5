//! A DNSSEC validating stub resolver core.
//!
//! This crate provides the pieces a stub resolver needs to check the
//! authenticity of the answers it receives from an upstream recursive
//! resolver. It doesn't talk to the network itself. Instead, the user
//! supplies an upstream transport and the crate stacks validation and
//! caching on top of it.
//!
//! # Modules
//!
//! * [base] contains the types for DNS data: names, records, RRsets, and
//!   decoded messages,
//! * [rdata] contains the record data of the record types the validator
//!   looks into,
//! * [crypto] verifies signatures and computes digests,
//! * [validator] implements DNSSEC validation of responses against a set
//!   of trust anchors, and
//! * [net] provides the validating and caching transports.
//!
//! The [utils] module has a few helpers shared by the others.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod crypto;
pub mod net;
pub mod rdata;
pub mod utils;
pub mod validator;
