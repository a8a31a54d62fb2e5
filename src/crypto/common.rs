//! Algorithm selection shared by the cryptographic backend.
//!
//! DNSSEC names its algorithms by number. This module maps those numbers
//! onto the closed set of algorithms the crate can actually verify. Every
//! number outside that set is reported as unsupported rather than skipped.

use crate::base::iana::{DigestAlgorithm, SecurityAlgorithm};
use crate::rdata::Dnskey;
use std::{error, fmt};

//----------- DigestType -----------------------------------------------------

/// Type of message digest to compute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigestType {
    /// [FIPS Secure Hash Standard] Section 6.1.
    ///
    /// [FIPS Secure Hash Standard]: http://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.180-4.pdf
    Sha1,

    /// [FIPS Secure Hash Standard] Section 6.2.
    ///
    /// [FIPS Secure Hash Standard]: http://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.180-4.pdf
    Sha256,

    /// [FIPS Secure Hash Standard] Section 6.5.
    ///
    /// [FIPS Secure Hash Standard]: http://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.180-4.pdf
    Sha384,
}

impl DigestType {
    /// Returns the digest type for a DS digest algorithm.
    pub fn from_ds_algorithm(
        algorithm: DigestAlgorithm,
    ) -> Result<Self, AlgorithmError> {
        match algorithm {
            DigestAlgorithm::SHA1 => Ok(DigestType::Sha1),
            DigestAlgorithm::SHA256 => Ok(DigestType::Sha256),
            DigestAlgorithm::SHA384 => Ok(DigestType::Sha384),
            _ => Err(AlgorithmError::Unsupported),
        }
    }

    /// Returns the length of the digest in octets.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            DigestType::Sha1 => 20,
            DigestType::Sha256 => 32,
            DigestType::Sha384 => 48,
        }
    }
}

//----------- SignatureAlgorithm ---------------------------------------------

/// The signature algorithms that can be verified.
///
/// This is the closed set of verification functions. A
/// [`SecurityAlgorithm`] not listed here is unsupported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureAlgorithm {
    /// RSA/SHA-1, also used for the NSEC3 alias of the algorithm.
    RsaSha1,

    /// RSA/SHA-256 from RFC 5702.
    RsaSha256,

    /// RSA/SHA-512 from RFC 5702.
    RsaSha512,

    /// ECDSA P-256 with SHA-256 from RFC 6605.
    EcdsaP256Sha256,

    /// ECDSA P-384 with SHA-384 from RFC 6605.
    EcdsaP384Sha384,

    /// Ed25519 from RFC 8080.
    Ed25519,
}

impl SignatureAlgorithm {
    /// Selects the verification algorithm for an algorithm number.
    pub fn from_security_algorithm(
        algorithm: SecurityAlgorithm,
    ) -> Result<Self, AlgorithmError> {
        match algorithm {
            SecurityAlgorithm::RSASHA1
            | SecurityAlgorithm::RSASHA1_NSEC3_SHA1 => {
                Ok(SignatureAlgorithm::RsaSha1)
            }
            SecurityAlgorithm::RSASHA256 => Ok(SignatureAlgorithm::RsaSha256),
            SecurityAlgorithm::RSASHA512 => Ok(SignatureAlgorithm::RsaSha512),
            SecurityAlgorithm::ECDSAP256SHA256 => {
                Ok(SignatureAlgorithm::EcdsaP256Sha256)
            }
            SecurityAlgorithm::ECDSAP384SHA384 => {
                Ok(SignatureAlgorithm::EcdsaP384Sha384)
            }
            SecurityAlgorithm::ED25519 => Ok(SignatureAlgorithm::Ed25519),
            _ => Err(AlgorithmError::Unsupported),
        }
    }

    /// Returns whether the algorithm number can be verified.
    #[must_use]
    pub fn is_supported(algorithm: SecurityAlgorithm) -> bool {
        Self::from_security_algorithm(algorithm).is_ok()
    }
}

/// Return the RSA exponent and modulus components from DNSKEY record data.
///
/// The format is described in RFC 3110, section 2.
pub fn rsa_exponent_modulus(
    dnskey: &Dnskey,
    min_len: usize,
) -> Result<(Vec<u8>, Vec<u8>), AlgorithmError> {
    let public_key = dnskey.public_key().as_ref();
    if public_key.len() <= 3 {
        return Err(AlgorithmError::InvalidData);
    }

    let (pos, exp_len) = match public_key[0] {
        0 => (
            3,
            (usize::from(public_key[1]) << 8) | usize::from(public_key[2]),
        ),
        len => (1, usize::from(len)),
    };

    // Check if there's enough space for exponent and modulus.
    if public_key[pos..].len() <= exp_len {
        return Err(AlgorithmError::InvalidData);
    };

    let (e, n) = public_key[pos..].split_at(exp_len);

    // Check for minimum supported key size
    if n.len() < min_len {
        return Err(AlgorithmError::Unsupported);
    }

    Ok((e.to_vec(), n.to_vec()))
}

//------------ AlgorithmError ------------------------------------------------

/// An algorithm error during verification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlgorithmError {
    /// Unsupported algorithm.
    Unsupported,

    /// Bad signature.
    BadSig,

    /// Invalid data.
    InvalidData,
}

//--- Display, Error

impl fmt::Display for AlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AlgorithmError::Unsupported => "unsupported algorithm",
            AlgorithmError::BadSig => "bad signature",
            AlgorithmError::InvalidData => "invalid data",
        })
    }
}

impl error::Error for AlgorithmError {}

//============ Tests =========================================================
