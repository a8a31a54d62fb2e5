//! Extended DNS Error codes.

//------------ ExtendedErrorCode ---------------------------------------------

int_enum! {
    /// Extended DNS Error codes.
    ///
    /// Defined in [RFC 8914]. The validator attaches one of these to every
    /// verdict that is not secure so that callers can learn why.
    ///
    /// [RFC 8914]: https://www.rfc-editor.org/rfc/rfc8914
    =>
    ExtendedErrorCode, u16;

    /// The error doesn't match any other code.
    (OTHER => 0, "Other Error")

    /// The resolver attempted DNSSEC validation but no DNSKEY uses a
    /// supported algorithm.
    (UNSUPPORTED_DNSKEY_ALGORITHM => 1, "Unsupported DNSKEY Algorithm")

    /// The resolver attempted DNSSEC validation but no DS uses a supported
    /// digest type.
    (UNSUPPORTED_DS_DIGEST_TYPE => 2, "Unsupported DS Digest Type")

    /// The resolver detected a forged answer.
    (FORGED_ANSWER => 4, "Forged Answer")

    /// DNSSEC validation ended in the indeterminate state.
    (DNSSEC_INDETERMINATE => 5, "DNSSEC Indeterminate")

    /// DNSSEC validation ended in the bogus state.
    (DNSSEC_BOGUS => 6, "DNSSEC Bogus")

    /// No signature is currently valid, at least one has expired.
    (SIGNATURE_EXPIRED => 7, "Signature Expired")

    /// No signature is currently valid, at least one is not yet valid.
    (SIGNATURE_NOT_YET_VALID => 8, "Signature Not Yet Valid")

    /// A DS record matches no DNSKEY of the child zone.
    (DNSKEY_MISSING => 9, "DNSKEY Missing")

    /// A signed zone returned an RRset without signatures.
    (RRSIGS_MISSING => 10, "RRSIGs Missing")

    /// No key with the zone key bit set was found.
    (NO_ZONE_KEY_BIT_SET => 11, "No Zone Key Bit Set")

    /// A denial of existence could not be proven.
    (NSEC_MISSING => 12, "NSEC Missing")

    /// The upstream could not be reached.
    (NO_REACHABLE_AUTHORITY => 22, "No Reachable Authority")

    /// An unrecoverable network error occurred.
    (NETWORK_ERROR => 23, "Network Error")

    /// The data is invalid.
    (INVALID_DATA => 24, "Invalid Data")

    /// An NSEC3 record uses more iterations than the resolver supports.
    (UNSUPPORTED_NSEC3_ITERATIONS_VALUE => 27, "Unsupported NSEC3 Iterations Value")
}

int_enum_str_with_decimal!(ExtendedErrorCode, u16, "unknown extended error code");
