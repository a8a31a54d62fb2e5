//! DNS CLASSes.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS CLASSes.
    ///
    /// The domain name space is partitioned into separate classes for
    /// different network types. In practice, only the IN class is really
    /// relevant and it is the only class DNSSEC validation is performed for.
    ///
    /// See [RFC 1034] for the introduction of classes and the
    /// [DNS CLASSes IANA registry] for an overview of assigned values.
    ///
    /// [RFC 1034]: https://tools.ietf.org/html/rfc1034
    /// [DNS CLASSes IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-2
    =>
    Class, u16;

    /// Internet (IN).
    (IN => 1, "IN")

    /// Chaosnet (CH).
    (CH => 3, "CH")

    /// Hesiod (HS).
    (HS => 4, "HS")

    /// Query class None.
    (NONE => 0xFE, "NONE")

    /// Query class * (ANY).
    (ANY => 0xFF, "ANY")
}

int_enum_str_with_prefix!(Class, "CLASS", u16, "unknown class");

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::Class;
    use std::str::FromStr;

    #[test]
    fn from_str() {
        assert_eq!(Class::from_str("in").unwrap(), Class::IN);
        assert_eq!(Class::from_str("CLASS1").unwrap(), Class::IN);
        assert_eq!(Class::from_str("class5").unwrap(), Class::from_int(5));
        assert!(Class::from_str("CLASS").is_err());
        assert!(Class::from_str("INX").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Class::IN.to_string(), "IN");
        assert_eq!(Class::from_int(5).to_string(), "CLASS5");
    }
}
