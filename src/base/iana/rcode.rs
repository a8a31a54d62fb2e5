//! DNS response codes.

//------------ Rcode ---------------------------------------------------------

int_enum! {
    /// DNS Response Codes.
    ///
    /// The response code of a response indicates what happend on the server
    /// when trying to answer the query. The code is a 4 bit value and part
    /// of the header of a DNS message. Only the header part is modelled
    /// here, the extended bits carried in the OPT record are not needed by
    /// a stub resolver.
    ///
    /// The values are defined in the [IANA DNS RCODEs] registry.
    ///
    /// [IANA DNS RCODEs]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6
    =>
    Rcode, u8;

    /// No error condition.
    (NOERROR => 0, "NOERROR")

    /// Format error.
    ///
    /// The name server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// Server failure.
    ///
    /// The name server was unable to process this query due to a problem
    /// with the name server. A validating resolver also uses it to signal
    /// that the answer failed validation.
    (SERVFAIL => 2, "SERVFAIL")

    /// Name error.
    ///
    /// The domain name given in the query does not exist at the name server.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// Not implemented.
    (NOTIMP => 4, "NOTIMP")

    /// Query refused.
    (REFUSED => 5, "REFUSED")

    /// Name exists when it should not.
    ///
    /// Also returned when a DNAME substitution would overflow the maximum
    /// name length (RFC 6672, section 2.2).
    (YXDOMAIN => 6, "YXDOMAIN")
}

int_enum_str_with_prefix!(Rcode, "RCODE", u8, "unknown rcode");
