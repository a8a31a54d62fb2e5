//! DNSSEC Algorithm Numbers

//------------ SecurityAlgorithm ---------------------------------------------

int_enum! {
    /// Security Algorithm Numbers.
    ///
    /// These numbers are used in various security related record types.
    ///
    /// For the currently registered values see the [IANA registration].
    ///
    /// [IANA registration]: http://www.iana.org/assignments/dns-sec-alg-numbers/dns-sec-alg-numbers.xhtml#dns-sec-alg-numbers-1
    =>
    SecurityAlgorithm, u8;

    /// Delete DS
    ///
    /// This algorithm is used in RFC 8087 to signal to the parent that a
    /// certain DS record should be deleted. It is _not_ an actual algorithm.
    (DELETE => 0, "DELETE")

    /// RSA/MD5
    ///
    /// Deprecated by RFC 3110, must not be used for zone signing.
    (RSAMD5 => 1, "RSAMD5")

    /// Diffie-Hellman
    (DH => 2, "DH")

    /// DSA/SHA1
    ///
    /// This algorithm is described in RFC 2536.
    (DSA => 3, "DSA")

    /// RSA/SHA-1
    ///
    /// This algorithm is described in RFC 3110.
    (RSASHA1 => 5, "RSASHA1")

    /// DSA-NSEC3-SHA1
    ///
    /// This value is an alias for `DSA` for use within NSEC3 records.
    (DSA_NSEC3_SHA1 => 6, "DSA-NSEC3-SHA1")

    /// RSASHA1-NSEC3-SHA1
    ///
    /// This value is an alias for `RSASHA1` for use within NSEC3 records.
    (RSASHA1_NSEC3_SHA1 => 7, "RSASHA1-NSEC3-SHA1")

    /// RSA/SHA-256
    ///
    /// This algorithm is described in RFC 5702.
    (RSASHA256 => 8, "RSASHA256")

    /// RSA/SHA-512
    ///
    /// This algorithm is described in RFC 5702.
    (RSASHA512 => 10, "RSASHA512")

    /// GOST R 34.10-2001
    ///
    /// This algorithm is described in RFC 5933.
    (ECC_GOST => 12, "ECC-GOST")

    /// ECDSA Curve P-256 with SHA-256
    ///
    /// This algorithm is described in RFC 6605.
    (ECDSAP256SHA256 => 13, "ECDSAP256SHA256")

    /// ECDSA Curve P-384 with SHA-384
    ///
    /// This algorithm is described in RFC 6605.
    (ECDSAP384SHA384 => 14, "ECDSAP384SHA384")

    /// ED25519
    ///
    /// This algorithm is described in RFC 8080.
    (ED25519 => 15, "ED25519")

    /// ED448
    ///
    /// This algorithm is described in RFC 8080.
    (ED448 => 16, "ED448")

    /// A private algorithm identified by a domain name.
    (PRIVATEDNS => 253, "PRIVATEDNS")

    /// A private algorithm identified by a ISO OID.
    (PRIVATEOID => 254, "PRIVATEOID")
}

int_enum_str_with_decimal!(SecurityAlgorithm, u8, "unknown algorithm");
