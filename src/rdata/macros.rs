//! Macros for use in rdata definitions.
//!
//! These macros are not public but are used by the super module only. They
//! are here so that `mod.rs` doesn’t become too unwieldly.

macro_rules! rdata_types {
    ( $(
        $module:ident::{ $( $rtype:ident => $mtype:ident, )* }
    )* ) => {
        $(
            pub use self::$module::{ $( $mtype, )* };
        )*

        //------------- AllRecordData ----------------------------------------

        /// Record data for all record types.
        ///
        /// This enum collects the record data types for all currently
        /// implemented record types. Everything else ends up as
        /// [`UnknownRecordData`].
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum AllRecordData {
            $( $(
                $mtype($mtype),
            )* )*
            Unknown(UnknownRecordData),
        }

        impl AllRecordData {
            /// Scans record data of the given type.
            ///
            /// Data in the generic format of RFC 3597 is accepted for any
            /// record type.
            pub fn scan(
                rtype: $crate::base::iana::Rtype,
                scanner: &mut $crate::base::scan::Scanner,
            ) -> Result<Self, $crate::base::scan::ScanError> {
                if scanner.peek().map(|token| token.as_str()) == Some("\\#") {
                    return UnknownRecordData::scan(rtype, scanner)
                        .map(AllRecordData::Unknown);
                }
                match rtype {
                    $( $(
                        $crate::base::iana::Rtype::$rtype => {
                            $mtype::scan(scanner).map(AllRecordData::$mtype)
                        }
                    )* )*
                    _ => Err($crate::base::scan::ScanError::new(
                        "unknown record type requires generic data",
                    )),
                }
            }
        }

        impl RecordData for AllRecordData {
            fn rtype(&self) -> $crate::base::iana::Rtype {
                match *self {
                    $( $(
                        AllRecordData::$mtype(ref inner) => inner.rtype(),
                    )* )*
                    AllRecordData::Unknown(ref inner) => inner.rtype(),
                }
            }

            fn compose_rdata(&self, target: &mut Vec<u8>) {
                match *self {
                    $( $(
                        AllRecordData::$mtype(ref inner) => {
                            inner.compose_rdata(target)
                        }
                    )* )*
                    AllRecordData::Unknown(ref inner) => {
                        inner.compose_rdata(target)
                    }
                }
            }

            fn compose_canonical_rdata(&self, target: &mut Vec<u8>) {
                match *self {
                    $( $(
                        AllRecordData::$mtype(ref inner) => {
                            inner.compose_canonical_rdata(target)
                        }
                    )* )*
                    AllRecordData::Unknown(ref inner) => {
                        inner.compose_canonical_rdata(target)
                    }
                }
            }
        }

        //--- From and TryFrom

        $( $(
            impl From<$mtype> for AllRecordData {
                fn from(value: $mtype) -> Self {
                    AllRecordData::$mtype(value)
                }
            }

            impl<'a> TryFrom<&'a AllRecordData> for &'a $mtype {
                type Error = WrongRecordType;

                fn try_from(
                    value: &'a AllRecordData,
                ) -> Result<Self, Self::Error> {
                    match *value {
                        AllRecordData::$mtype(ref inner) => Ok(inner),
                        _ => Err(WrongRecordType(())),
                    }
                }
            }
        )* )*

        impl From<UnknownRecordData> for AllRecordData {
            fn from(value: UnknownRecordData) -> Self {
                AllRecordData::Unknown(value)
            }
        }

        //--- Display

        impl core::fmt::Display for AllRecordData {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match *self {
                    $( $(
                        AllRecordData::$mtype(ref inner) => inner.fmt(f),
                    )* )*
                    AllRecordData::Unknown(ref inner) => inner.fmt(f),
                }
            }
        }
    }
}
