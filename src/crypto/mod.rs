//! Cryptographic backend.
//!
//! The validator only ever verifies signatures and computes digests. Both
//! are done with `ring`. The [`common`] module maps DNSSEC algorithm
//! numbers onto the closed set of algorithms available here, the
//! [`ring`](self::ring) module does the actual work.

pub mod common;
pub mod ring;

pub use self::common::{AlgorithmError, DigestType, SignatureAlgorithm};
pub use self::ring::{Digest, DigestBuilder, PublicKey};
