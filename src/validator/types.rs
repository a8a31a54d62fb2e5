// Collection of useful types.

use crate::base::iana::ExtendedErrorCode;
use crate::base::name::NameError;
use crate::base::opt::ExtendedError;
use crate::base::rrset::MalformedSetError;
use crate::net::client::request::Error as TransportError;
use std::error;
use std::fmt;

//------------ ValidationState -----------------------------------------------

// RFC 4033, Section 5 defines the security states of data:
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValidationState {
    Secure,
    Insecure,
    Bogus,
    Indeterminate,
}

impl ValidationState {
    /// Returns the weaker of two states.
    ///
    /// Bogus beats everything, then indeterminate, then insecure. Only
    /// two secure states combine into a secure state.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if self.weakness() >= other.weakness() {
            self
        } else {
            other
        }
    }

    fn weakness(self) -> u8 {
        match self {
            ValidationState::Secure => 0,
            ValidationState::Insecure => 1,
            ValidationState::Indeterminate => 2,
            ValidationState::Bogus => 3,
        }
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationState::Secure => "secure",
            ValidationState::Insecure => "insecure",
            ValidationState::Bogus => "bogus",
            ValidationState::Indeterminate => "indeterminate",
        })
    }
}

//------------ ValidationResult ----------------------------------------------

/// The verdict of a validation plus the reason attached where it failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationResult {
    state: ValidationState,
    ede: Option<ExtendedError>,
}

impl ValidationResult {
    #[must_use]
    pub fn new(state: ValidationState, ede: Option<ExtendedError>) -> Self {
        Self { state, ede }
    }

    #[must_use]
    pub fn secure() -> Self {
        Self::new(ValidationState::Secure, None)
    }

    #[must_use]
    pub fn insecure(ede: Option<ExtendedError>) -> Self {
        Self::new(ValidationState::Insecure, ede)
    }

    #[must_use]
    pub fn bogus(ede: Option<ExtendedError>) -> Self {
        Self::new(ValidationState::Bogus, ede)
    }

    #[must_use]
    pub fn indeterminate(ede: Option<ExtendedError>) -> Self {
        Self::new(ValidationState::Indeterminate, ede)
    }

    /// Translates a component error into a verdict.
    ///
    /// This is where errors stop: no caller above the orchestrator ever
    /// sees anything but the state and the extended error.
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self::new(err.state(), Some(err.extended_error()))
    }

    #[must_use]
    pub fn state(&self) -> ValidationState {
        self.state
    }

    #[must_use]
    pub fn ede(&self) -> Option<&ExtendedError> {
        self.ede.as_ref()
    }

    pub fn into_parts(self) -> (ValidationState, Option<ExtendedError>) {
        (self.state, self.ede)
    }

    /// Combines two results, keeping the reason of the weaker one.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if self.state.combine(other.state) == self.state {
            if self.ede.is_none() && self.state == other.state {
                return other;
            }
            self
        } else {
            other
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ede {
            Some(ref ede) => write!(f, "{} ({})", self.state, ede),
            None => write!(f, "{}", self.state),
        }
    }
}

//------------ CryptoError ---------------------------------------------------

/// Verifying one signature with one key failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CryptoError {
    /// Key tag, algorithm, flags, protocol or owner don’t fit the RRSIG.
    KeyMismatch,

    /// The signature expired.
    SignatureExpired,

    /// The signature’s inception lies in the future.
    SignatureNotYetValid,

    /// The signer name or label count doesn’t fit the RRset.
    SignerMismatch,

    /// The cryptographic check failed.
    BadSignature,

    /// The algorithm is not one we can verify.
    UnsupportedAlgorithm,
}

impl CryptoError {
    fn extended_error(self) -> ExtendedError {
        let code = match self {
            CryptoError::KeyMismatch => ExtendedErrorCode::DNSKEY_MISSING,
            CryptoError::SignatureExpired => {
                ExtendedErrorCode::SIGNATURE_EXPIRED
            }
            CryptoError::SignatureNotYetValid => {
                ExtendedErrorCode::SIGNATURE_NOT_YET_VALID
            }
            CryptoError::UnsupportedAlgorithm => {
                ExtendedErrorCode::UNSUPPORTED_DNSKEY_ALGORITHM
            }
            CryptoError::SignerMismatch | CryptoError::BadSignature => {
                ExtendedErrorCode::DNSSEC_BOGUS
            }
        };
        ExtendedError::new(code, Some(self.to_string()))
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CryptoError::KeyMismatch => "key does not match signature",
            CryptoError::SignatureExpired => "signature expired",
            CryptoError::SignatureNotYetValid => "signature not yet valid",
            CryptoError::SignerMismatch => "signer does not match owner",
            CryptoError::BadSignature => "bad signature",
            CryptoError::UnsupportedAlgorithm => "unsupported algorithm",
        })
    }
}

impl error::Error for CryptoError {}

//------------ ChainError ----------------------------------------------------

/// The chain of trust from an anchor to a zone is broken.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChainError {
    /// No DS record matches a key that signs the DNSKEY set.
    DsMismatch,

    /// The zone has no DNSKEY set.
    DnskeyMissing,

    /// A set that needs signatures has none.
    RrsigsMissing,

    /// No key of the zone validated the DNSKEY set.
    NoZoneKey,

    /// The walk down from the anchor took too many steps.
    TooDeep,

    /// A lookup returned something that cannot be part of a chain.
    Malformed(MalformedSetError),
}

impl ChainError {
    fn extended_error(&self) -> ExtendedError {
        let code = match self {
            ChainError::DnskeyMissing => ExtendedErrorCode::DNSKEY_MISSING,
            ChainError::RrsigsMissing => ExtendedErrorCode::RRSIGS_MISSING,
            ChainError::NoZoneKey => ExtendedErrorCode::NO_ZONE_KEY_BIT_SET,
            ChainError::DsMismatch
            | ChainError::TooDeep
            | ChainError::Malformed(_) => ExtendedErrorCode::DNSSEC_BOGUS,
        };
        ExtendedError::new(code, Some(self.to_string()))
    }
}

impl From<MalformedSetError> for ChainError {
    fn from(err: MalformedSetError) -> Self {
        ChainError::Malformed(err)
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::DsMismatch => {
                f.write_str("no DS matches a valid DNSKEY")
            }
            ChainError::DnskeyMissing => f.write_str("DNSKEY set missing"),
            ChainError::RrsigsMissing => f.write_str("signatures missing"),
            ChainError::NoZoneKey => {
                f.write_str("no zone key validates the DNSKEY set")
            }
            ChainError::TooDeep => f.write_str("chain of trust too long"),
            ChainError::Malformed(err) => write!(f, "malformed set: {err}"),
        }
    }
}

impl error::Error for ChainError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ChainError::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

//------------ ProofError ----------------------------------------------------

/// A denial of existence could not be proven.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProofError {
    /// There are no usable NSEC or NSEC3 records.
    Missing,

    /// The records present do not prove what is needed.
    Invalid(&'static str),
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofError::Missing => f.write_str("no denial of existence"),
            ProofError::Invalid(reason) => f.write_str(reason),
        }
    }
}

impl error::Error for ProofError {}

//------------ LookupFailure -------------------------------------------------

/// An on-demand lookup did not produce a response.
#[derive(Clone, Debug)]
pub enum LookupFailure {
    /// The transport returned an error.
    Transport(TransportError),

    /// The lookup took longer than the configured timeout.
    Timeout,
}

impl From<TransportError> for LookupFailure {
    fn from(err: TransportError) -> Self {
        LookupFailure::Transport(err)
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::Transport(err) => write!(f, "lookup failed: {err}"),
            LookupFailure::Timeout => f.write_str("lookup timed out"),
        }
    }
}

impl error::Error for LookupFailure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LookupFailure::Transport(err) => Some(err),
            LookupFailure::Timeout => None,
        }
    }
}

//------------ NoAnchorError -------------------------------------------------

/// No trust anchor covers a name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoAnchorError;

impl fmt::Display for NoAnchorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no trust anchor")
    }
}

impl error::Error for NoAnchorError {}

//------------ Error ---------------------------------------------------------

/// Any error that can happen during validation.
#[derive(Clone, Debug)]
pub enum Error {
    Malformed(MalformedSetError),
    Crypto(CryptoError),
    Chain(ChainError),
    Proof(ProofError),
    Lookup(LookupFailure),
    NoAnchor(NoAnchorError),
    Name(NameError),
}

impl Error {
    /// Returns the validation state an error leads to.
    #[must_use]
    pub fn state(&self) -> ValidationState {
        match self {
            Error::Lookup(_) | Error::NoAnchor(_) => {
                ValidationState::Indeterminate
            }
            _ => ValidationState::Bogus,
        }
    }

    /// Returns the extended error reporting this error.
    #[must_use]
    pub fn extended_error(&self) -> ExtendedError {
        match self {
            Error::Crypto(err) => err.extended_error(),
            Error::Chain(err) => err.extended_error(),
            Error::Proof(err) => ExtendedError::new(
                ExtendedErrorCode::NSEC_MISSING,
                Some(err.to_string()),
            ),
            Error::Lookup(err) => ExtendedError::new(
                ExtendedErrorCode::NETWORK_ERROR,
                Some(err.to_string()),
            ),
            Error::NoAnchor(err) => ExtendedError::new(
                ExtendedErrorCode::DNSSEC_INDETERMINATE,
                Some(err.to_string()),
            ),
            Error::Malformed(_) | Error::Name(_) => ExtendedError::new(
                ExtendedErrorCode::DNSSEC_BOGUS,
                Some(self.to_string()),
            ),
        }
    }
}

impl From<MalformedSetError> for Error {
    fn from(err: MalformedSetError) -> Self {
        Error::Malformed(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}

impl From<ChainError> for Error {
    fn from(err: ChainError) -> Self {
        Error::Chain(err)
    }
}

impl From<ProofError> for Error {
    fn from(err: ProofError) -> Self {
        Error::Proof(err)
    }
}

impl From<LookupFailure> for Error {
    fn from(err: LookupFailure) -> Self {
        Error::Lookup(err)
    }
}

impl From<NoAnchorError> for Error {
    fn from(err: NoAnchorError) -> Self {
        Error::NoAnchor(err)
    }
}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Error::Name(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Malformed(err) => write!(f, "malformed RRset: {err}"),
            Error::Crypto(err) => err.fmt(f),
            Error::Chain(err) => err.fmt(f),
            Error::Proof(err) => err.fmt(f),
            Error::Lookup(err) => err.fmt(f),
            Error::NoAnchor(err) => err.fmt(f),
            Error::Name(err) => write!(f, "bad name: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Malformed(err) => Some(err),
            Error::Crypto(err) => Some(err),
            Error::Chain(err) => Some(err),
            Error::Proof(err) => Some(err),
            Error::Lookup(err) => Some(err),
            Error::NoAnchor(err) => Some(err),
            Error::Name(err) => Some(err),
        }
    }
}

//============ Tests =========================================================
