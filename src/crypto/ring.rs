//! DNSSEC message digests and signature verification using `ring`.
//!
//! This backend supports the following algorithms:
//!
//! - RSA/SHA-1, RSA/SHA-256 and RSA/SHA-512 (1024 to 8192 bit keys)
//! - ECDSA P-256/SHA-256
//! - ECDSA P-384/SHA-384
//! - Ed25519

use ring::digest;
use ring::digest::SHA1_FOR_LEGACY_USE_ONLY;
use ring::digest::{Context, Digest as RingDigest};
use ring::signature::{self, RsaParameters, UnparsedPublicKey};

use super::common::{
    rsa_exponent_modulus, AlgorithmError, DigestType, SignatureAlgorithm,
};

use crate::rdata::Dnskey;

//----------- DigestBuilder --------------------------------------------------

/// Incremental computation of a DS digest.
pub struct DigestBuilder(Context);

impl DigestBuilder {
    /// Starts a digest of the given type.
    #[must_use]
    pub fn new(digest_type: DigestType) -> Self {
        Self(match digest_type {
            DigestType::Sha1 => Context::new(&SHA1_FOR_LEGACY_USE_ONLY),
            DigestType::Sha256 => Context::new(&digest::SHA256),
            DigestType::Sha384 => Context::new(&digest::SHA384),
        })
    }

    /// Feeds more data into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data)
    }

    /// Returns the digest of everything fed so far.
    #[must_use]
    pub fn finish(self) -> Digest {
        Digest(self.0.finish())
    }
}

//----------- Digest ---------------------------------------------------------

/// A finished digest.
pub struct Digest(RingDigest);

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

//----------- PublicKey ------------------------------------------------------

/// A DNSKEY public key in the form `ring` verifies with.
pub enum PublicKey {
    /// Exponent and modulus with the PKCS#1 parameters to use.
    Rsa(
        &'static RsaParameters,
        signature::RsaPublicKeyComponents<Vec<u8>>,
    ),

    /// ECDSA and Ed25519 keys as raw octets.
    Unparsed(SignatureAlgorithm, UnparsedPublicKey<Vec<u8>>),
}

impl PublicKey {
    /// The smallest RSA modulus accepted, in octets.
    const RSA_MIN_BYTES: usize = 1024 / 8;

    /// Converts the key material of a [`Dnskey`].
    ///
    /// Fails for algorithms outside the supported set and for keys of the
    /// wrong size.
    pub fn from_dnskey(dnskey: &Dnskey) -> Result<Self, AlgorithmError> {
        let sec_alg =
            SignatureAlgorithm::from_security_algorithm(dnskey.algorithm())?;
        match sec_alg {
            SignatureAlgorithm::RsaSha1
            | SignatureAlgorithm::RsaSha256
            | SignatureAlgorithm::RsaSha512 => {
                let algorithm = match sec_alg {
                    SignatureAlgorithm::RsaSha1 => {
                        &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY
                    }
                    SignatureAlgorithm::RsaSha256 => {
                        &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY
                    }
                    _ => {
                        &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY
                    }
                };

                // RFC 3110 key material, not DER. Hand over the components.
                let (e, n) =
                    rsa_exponent_modulus(dnskey, Self::RSA_MIN_BYTES)?;
                let public_key = signature::RsaPublicKeyComponents { n, e };
                Ok(PublicKey::Rsa(algorithm, public_key))
            }
            SignatureAlgorithm::EcdsaP256Sha256
            | SignatureAlgorithm::EcdsaP384Sha384 => {
                let (algorithm, key_len) = match sec_alg {
                    SignatureAlgorithm::EcdsaP256Sha256 => {
                        (&signature::ECDSA_P256_SHA256_FIXED, 64)
                    }
                    _ => (&signature::ECDSA_P384_SHA384_FIXED, 96),
                };

                let public_key = dnskey.public_key().as_ref();
                if public_key.len() != key_len {
                    return Err(AlgorithmError::InvalidData);
                }

                // ring wants the uncompressed point marker (RFC 6605).
                let mut key = Vec::with_capacity(public_key.len() + 1);
                key.push(0x4);
                key.extend_from_slice(public_key);

                Ok(PublicKey::Unparsed(
                    sec_alg,
                    signature::UnparsedPublicKey::new(algorithm, key),
                ))
            }
            SignatureAlgorithm::Ed25519 => {
                let key = dnskey.public_key().as_ref().to_vec();
                if key.len() != 32 {
                    return Err(AlgorithmError::InvalidData);
                }
                Ok(PublicKey::Unparsed(
                    sec_alg,
                    signature::UnparsedPublicKey::new(
                        &signature::ED25519,
                        key,
                    ),
                ))
            }
        }
    }

    /// Verify a signature.
    pub fn verify(
        &self,
        signed_data: &[u8],
        signature: &[u8],
    ) -> Result<(), AlgorithmError> {
        match self {
            PublicKey::Rsa(algorithm, public_key) => {
                public_key.verify(algorithm, signed_data, signature)
            }
            PublicKey::Unparsed(_, public_key) => {
                public_key.verify(signed_data, signature)
            }
        }
        .map_err(|_| AlgorithmError::BadSig)
    }
}

//============ Tests =========================================================
