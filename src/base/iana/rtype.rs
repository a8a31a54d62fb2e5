//! Resource Record (RR) TYPEs

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource Record Types.
    ///
    /// Each resource records has a 16 bit type value indicating what kind of
    /// information is represented by the record. Normal query includes the
    /// type of record information is requested for. A few aditional types,
    /// called query types, are defined as well and can only be used in
    /// questions. This type represents both these types.
    ///
    /// The currently assigned values are maintained in an [IANA registry].
    /// Only the types the validator has a use for have constants. All other
    /// values are still representable via [`Rtype::from_int`].
    ///
    /// [IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    =>
    Rtype, u16;

    /// A host address.
    (A => 1, "A")

    /// An authoritative name server.
    (NS => 2, "NS")

    /// The canonical name for an alias
    (CNAME => 5, "CNAME")

    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")

    /// A domain name pointer.
    (PTR => 12, "PTR")

    /// Mail exchange.
    (MX => 15, "MX")

    /// Text strings.
    (TXT => 16, "TXT")

    /// IPv6 address.
    (AAAA =>  28, "AAAA")

    /// Server selection.
    (SRV => 33, "SRV")

    /// Delegation name.
    ///
    /// See RFC 6672.
    (DNAME => 39, "DNAME")

    /// OPT pseudo-RR.
    (OPT => 41, "OPT")

    /// Delegation signer.
    ///
    /// See RFC 4034.
    (DS => 43, "DS")

    /// RRSIG.
    ///
    /// See RFC 4034.
    (RRSIG => 46, "RRSIG")

    /// NSEC.
    ///
    /// See RFC 4034.
    (NSEC => 47, "NSEC")

    /// DNSKEY.
    ///
    /// See RFC 4034.
    (DNSKEY => 48, "DNSKEY")

    /// NSEC3.
    ///
    /// See RFC 5155.
    (NSEC3 => 50, "NSEC3")

    /// NSEC3PARAM.
    ///
    /// See RFC 5155.
    (NSEC3PARAM => 51, "NSEC3PARAM")

    /// Child DS.
    ///
    /// See RFC 7344.
    (CDS => 59, "CDS")

    /// Child DNSKEY.
    ///
    /// See RFC 7344.
    (CDNSKEY => 60, "CDNSKEY")

    /// A request for all records the server/cache has available.
    (ANY => 255, "ANY")
}

int_enum_str_with_prefix!(Rtype, "TYPE", u16, "unknown record type");

impl Rtype {
    /// Returns whether the type only exists to carry DNSSEC proofs.
    ///
    /// These are the types that are removed from a response when the
    /// client did not set the DO flag.
    #[must_use]
    pub fn is_dnssec(self) -> bool {
        self == Rtype::RRSIG || self == Rtype::NSEC || self == Rtype::NSEC3
    }

    /// Returns whether the type appears only on the parent side of a zone
    /// cut.
    #[must_use]
    pub fn is_parent_side(self) -> bool {
        self == Rtype::DS
    }
}

//============ Tests =========================================================
