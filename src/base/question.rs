//! The question of a DNS message.

use super::iana::{Class, Rtype};
use super::name::Name;
use std::fmt;

//------------ Question ------------------------------------------------------

/// A query name, type, and class.
///
/// Equality and hashing ignore the ASCII case of the name, but the name
/// keeps its case for display so that responses can echo it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    qname: Name,
    qtype: Rtype,
    qclass: Class,
}

impl Question {
    #[must_use]
    pub fn new(qname: Name, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a question in class IN.
    #[must_use]
    pub fn new_in(qname: Name, qtype: Rtype) -> Self {
        Self::new(qname, qtype, Class::IN)
    }

    #[must_use]
    pub fn qname(&self) -> &Name {
        &self.qname
    }

    #[must_use]
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    #[must_use]
    pub fn qclass(&self) -> Class {
        self.qclass
    }

    #[must_use]
    pub fn into_qname(self) -> Name {
        self.qname
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}
