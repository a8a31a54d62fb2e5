//! IANA Definitions for DNS.
//!
//! This module contains types for parameters defined in IANA registries
//! that are needed by the validator.
//!
//! All types defined hereunder follow the same basic structure. They are
//! newtypes around the raw integer with associated constants for the
//! well-defined values. Since we cannot restrict the integer to only the
//! undefined values, the full set of possible values is allowed.
//!
//! There are two methods `from_int()` and `to_int()` to convert from and
//! to raw integer values as well as implementations of the `From` trait
//! for these. `FromStr` and `Display` are implemented to convert from
//! the string codes to the values and back.

pub use self::class::Class;
pub use self::digestalg::DigestAlgorithm;
pub use self::exterr::ExtendedErrorCode;
pub use self::nsec3::Nsec3HashAlgorithm;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;
pub use self::secalg::SecurityAlgorithm;

#[macro_use]
mod macros;

pub mod class;
pub mod digestalg;
pub mod exterr;
pub mod nsec3;
pub mod rcode;
pub mod rtype;
pub mod secalg;
