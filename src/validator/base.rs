//! Base functions for DNSSEC validation.
//!
//! Everything in here is a pure function of its arguments: the current
//! time is passed in rather than read from the clock.

use bytes::Bytes;
use tracing::trace;

use crate::base::iana::{DigestAlgorithm, Nsec3HashAlgorithm};
use crate::base::{Name, Record, Rrset};
use crate::crypto::{
    AlgorithmError, Digest, DigestBuilder, DigestType, PublicKey,
};
use crate::rdata::dnssec::Timestamp;
use crate::rdata::nsec3::{Nsec3Salt, OwnerHash};
use crate::rdata::{Dnskey, RecordData, Rrsig};

use super::types::CryptoError;

//------------ Dnskey --------------------------------------------------------

/// DNSSEC operations on DNSKEY record data.
pub trait DnskeyExt {
    /// Computes the DS digest of the key.
    ///
    /// The digest covers the canonical owner name followed by the DNSKEY
    /// RDATA ([RFC 4034, Section 5.1.4]).
    ///
    /// [RFC 4034, Section 5.1.4]: https://tools.ietf.org/html/rfc4034#section-5.1.4
    fn digest(
        &self,
        name: &Name,
        algorithm: DigestAlgorithm,
    ) -> Result<Digest, AlgorithmError>;
}

impl DnskeyExt for Dnskey {
    fn digest(
        &self,
        name: &Name,
        algorithm: DigestAlgorithm,
    ) -> Result<Digest, AlgorithmError> {
        let mut buf: Vec<u8> = Vec::new();
        name.compose_canonical(&mut buf);
        self.compose_canonical_rdata(&mut buf);

        let mut ctx = DigestBuilder::new(DigestType::from_ds_algorithm(
            algorithm,
        )?);
        ctx.update(&buf);
        Ok(ctx.finish())
    }
}

/// Whether DS records with this digest algorithm can be checked.
pub fn supported_digest(d: DigestAlgorithm) -> bool {
    DigestType::from_ds_algorithm(d).is_ok()
}

//------------ Rrsig ---------------------------------------------------------

/// Extensions for RRSIG record type.
pub trait RrsigExt {
    /// Compose the signed data according to [RFC 4035, Section 5.3.2].
    ///
    /// The records are put into canonical order and duplicates are
    /// removed. Expanded wildcards are turned back into their source.
    ///
    /// [RFC 4035, Section 5.3.2]: https://tools.ietf.org/html/rfc4035#section-5.3.2
    fn signed_data<D: RecordData>(
        &self,
        buf: &mut Vec<u8>,
        records: &[Record<D>],
    );

    /// Return the closest encloser if `owner` was expanded from a wildcard
    /// according to the information in this signature.
    fn wildcard_closest_encloser(&self, owner: &Name) -> Option<Name>;

    /// Use the cryptographic signature to authenticate the signed data.
    fn verify_signed_data(
        &self,
        dnskey: &Dnskey,
        signed_data: &[u8],
    ) -> Result<(), AlgorithmError>;
}

impl RrsigExt for Rrsig {
    fn signed_data<D: RecordData>(
        &self,
        buf: &mut Vec<u8>,
        records: &[Record<D>],
    ) {
        // The RRSIG RDATA without the signature, then every record in
        // canonical form and order (RFC 4034, Sections 3.1.8.1 and 6.3).
        self.compose_canonical_head(buf);

        let mut rdatas: Vec<(&Record<D>, Vec<u8>)> = records
            .iter()
            .map(|rr| {
                let mut rdata = Vec::new();
                rr.data().compose_canonical_rdata(&mut rdata);
                (rr, rdata)
            })
            .collect();
        rdatas.sort_by(|a, b| a.1.cmp(&b.1));
        rdatas.dedup_by(|a, b| a.1 == b.1);

        for (rr, rdata) in rdatas {
            let rrsig_labels = usize::from(self.labels());
            let fqdn = rr.owner();
            // The labels field doesn't count the root.
            let fqdn_labels = fqdn.label_count() - 1;
            if rrsig_labels < fqdn_labels {
                // Wildcard expansion. Sign the wildcard owner instead.
                buf.extend_from_slice(b"\x01*");
                match fqdn.suffix_with_labels(rrsig_labels + 1) {
                    Some(name) => name.compose_canonical(buf),
                    None => fqdn.compose_canonical(buf),
                }
            } else {
                fqdn.compose_canonical(buf);
            }

            rr.rtype().compose(buf);
            rr.class().compose(buf);
            self.original_ttl().compose(buf);
            // Record data is limited to 65535 octets on the wire.
            let len = u16::try_from(rdata.len()).unwrap_or(u16::MAX);
            buf.extend_from_slice(&len.to_be_bytes());
            buf.extend_from_slice(&rdata);
        }
    }

    fn wildcard_closest_encloser(&self, owner: &Name) -> Option<Name> {
        // RFC 4035, Section 5.3.2.
        let rrsig_labels = usize::from(self.labels());
        if rrsig_labels < owner.rrsig_label_count() {
            owner.suffix_with_labels(rrsig_labels + 1)
        } else {
            None
        }
    }

    fn verify_signed_data(
        &self,
        dnskey: &Dnskey,
        signed_data: &[u8],
    ) -> Result<(), AlgorithmError> {
        // Caller needs to ensure that the signature matches the key, but
        // enforce the algorithm match.
        if self.algorithm() != dnskey.algorithm() {
            return Err(AlgorithmError::InvalidData);
        }

        let public_key = PublicKey::from_dnskey(dnskey)?;
        public_key.verify(signed_data, self.signature().as_ref())
    }
}

//------------ verify --------------------------------------------------------

/// Verifies one signature over an RRset with one key.
///
/// The checks of RFC 4035, Section 5.3.1 are done in a fixed order and
/// the first one that fails determines the error. On success, returns the
/// closest encloser if the RRset was expanded from a wildcard.
pub fn verify(
    rrset: &Rrset,
    sig: &Record<Rrsig>,
    key: &Record<Dnskey>,
    now: Timestamp,
) -> Result<Option<Name>, CryptoError> {
    let rrsig = sig.data();
    let dnskey = key.data();

    // The key must be the one named by the signature.
    if dnskey.key_tag() != rrsig.key_tag()
        || dnskey.algorithm() != rrsig.algorithm()
        || !dnskey.is_zone_key()
        || dnskey.protocol() != 3
        || key.owner() != rrsig.signer_name()
    {
        return Err(CryptoError::KeyMismatch);
    }

    // The validity period must include now.
    if rrsig.expiration() < now {
        return Err(CryptoError::SignatureExpired);
    }
    if now < rrsig.inception() {
        return Err(CryptoError::SignatureNotYetValid);
    }

    // The signer must be at or above the owner and the label count must
    // lie between the two.
    let owner = rrset.owner();
    let signer = rrsig.signer_name();
    let labels = usize::from(rrsig.labels());
    if sig.owner() != owner
        || sig.class() != rrset.class()
        || rrsig.type_covered() != rrset.rtype()
        || !owner.ends_with(signer)
        || labels > owner.rrsig_label_count()
        || labels < signer.rrsig_label_count()
    {
        return Err(CryptoError::SignerMismatch);
    }

    let mut signed_data = Vec::new();
    rrsig.signed_data(&mut signed_data, rrset.records());
    match rrsig.verify_signed_data(dnskey, &signed_data) {
        Ok(()) => Ok(rrsig.wildcard_closest_encloser(owner)),
        Err(AlgorithmError::Unsupported) => {
            trace!(
                "unsupported algorithm {} for {}",
                rrsig.algorithm(),
                owner
            );
            Err(CryptoError::UnsupportedAlgorithm)
        }
        Err(AlgorithmError::BadSig) | Err(AlgorithmError::InvalidData) => {
            Err(CryptoError::BadSignature)
        }
    }
}

//------------ nsec3_hash ----------------------------------------------------

/// Compute the NSEC3 hash of `owner` according to RFC 5155, Section 5.
///
/// Only SHA-1 is defined. Other algorithms are unsupported.
pub fn nsec3_hash(
    owner: &Name,
    algorithm: Nsec3HashAlgorithm,
    iterations: u16,
    salt: &Nsec3Salt,
) -> Result<OwnerHash, AlgorithmError> {
    if algorithm != Nsec3HashAlgorithm::SHA1 {
        return Err(AlgorithmError::Unsupported);
    }

    let mut buf = Vec::new();
    owner.compose_canonical(&mut buf);
    buf.extend_from_slice(salt.as_slice());

    let mut ctx = DigestBuilder::new(DigestType::Sha1);
    ctx.update(&buf);
    let mut h = ctx.finish();

    for _ in 0..iterations {
        let mut ctx = DigestBuilder::new(DigestType::Sha1);
        ctx.update(h.as_ref());
        ctx.update(salt.as_slice());
        h = ctx.finish();
    }

    OwnerHash::from_octets(Bytes::copy_from_slice(h.as_ref()))
        .map_err(|_| AlgorithmError::InvalidData)
}

//============ Test ==========================================================
