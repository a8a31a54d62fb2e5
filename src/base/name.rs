//! Domain names.
//!
//! This module provides [`Name`], an owned, absolute domain name kept in
//! uncompressed wire format. Comparison and hashing ignore ASCII case as
//! required by [RFC 4343] and the ordering of names is the canonical DNS
//! name order defined in section 6.1 of [RFC 4034], the order that NSEC
//! chains are built in.
//!
//! [RFC 4343]: https://tools.ietf.org/html/rfc4343
//! [RFC 4034]: https://tools.ietf.org/html/rfc4034

use bytes::{BufMut, Bytes, BytesMut};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::{error, fmt};

/// The maximum length of a domain name in wire format.
pub const MAX_NAME_LEN: usize = 255;

/// The maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

//------------ Name ----------------------------------------------------------

/// An absolute domain name.
///
/// The name is kept as a sequence of length-prefixed labels ending in the
/// empty root label. Construction always checks that the data is a valid
/// uncompressed name, so all other methods can rely on it.
#[derive(Clone)]
pub struct Name(Bytes);

impl Name {
    /// Returns the root name.
    #[must_use]
    pub fn root() -> Self {
        Name(Bytes::from_static(b"\0"))
    }

    /// Creates a name from its uncompressed wire format.
    pub fn from_octets(octets: Bytes) -> Result<Self, NameError> {
        Self::check_slice(octets.as_ref())?;
        Ok(Name(octets))
    }

    /// Creates a name from a slice with its uncompressed wire format.
    pub fn from_slice(slice: &[u8]) -> Result<Self, NameError> {
        Self::from_octets(Bytes::copy_from_slice(slice))
    }

    /// Creates a name from a sequence of labels.
    ///
    /// The labels should not include the root label, it is added
    /// automatically.
    pub fn from_labels<'a>(
        labels: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<Self, NameError> {
        let mut buf = BytesMut::new();
        for label in labels {
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LongLabel);
            }
            buf.put_u8(label.len() as u8);
            buf.put_slice(label);
        }
        buf.put_u8(0);
        if buf.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        Ok(Name(buf.freeze()))
    }

    /// Checks that a slice is a valid uncompressed absolute name.
    fn check_slice(mut slice: &[u8]) -> Result<(), NameError> {
        if slice.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        loop {
            let (&len, tail) =
                slice.split_first().ok_or(NameError::ShortInput)?;
            let len = usize::from(len);
            if len == 0 {
                if !tail.is_empty() {
                    return Err(NameError::TrailingData);
                }
                return Ok(());
            }
            if len > MAX_LABEL_LEN {
                return Err(NameError::LongLabel);
            }
            if tail.len() < len {
                return Err(NameError::ShortInput);
            }
            slice = &tail[len..];
        }
    }

    /// Returns the wire format of the name.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the length of the wire format of the name.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether this is the root name.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Returns whether the first label is the asterisk label.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.first() == b"*"
    }

    /// Returns an iterator over the labels of the name.
    ///
    /// The iterator includes the final, empty root label.
    #[must_use]
    pub fn iter_labels(&self) -> LabelIter<'_> {
        LabelIter {
            slice: self.as_slice(),
        }
    }

    /// Returns the number of labels including the root label.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.iter_labels().count()
    }

    /// Returns the number of labels as counted by the RRSIG labels field.
    ///
    /// This count excludes the root label and a leading asterisk label
    /// (RFC 4034, section 3.1.3).
    #[must_use]
    pub fn rrsig_label_count(&self) -> usize {
        let count = self.label_count() - 1;
        if self.is_wildcard() {
            count - 1
        } else {
            count
        }
    }

    /// Returns the content of the first label.
    ///
    /// For the root name, this is the empty root label.
    #[must_use]
    pub fn first(&self) -> &[u8] {
        let len = usize::from(self.0[0]);
        &self.0[1..1 + len]
    }

    /// Returns the parent of the name or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Name> {
        if self.is_root() {
            return None;
        }
        let len = usize::from(self.0[0]);
        Some(Name(self.0.slice(len + 1..)))
    }

    /// Returns an iterator over the name and all its ancestors.
    ///
    /// The iterator starts with the name itself and ends with the root.
    #[must_use]
    pub fn iter_suffixes(&self) -> SuffixIter {
        SuffixIter {
            name: Some(self.clone()),
        }
    }

    /// Returns the suffix of the name with `count` labels, root included.
    ///
    /// Returns `None` if the name has fewer labels.
    #[must_use]
    pub fn suffix_with_labels(&self, count: usize) -> Option<Name> {
        let total = self.label_count();
        if count > total || count == 0 {
            return None;
        }
        self.iter_suffixes().nth(total - count)
    }

    /// Returns whether `base` is a suffix of this name.
    ///
    /// The comparison is label-wise and ignores ASCII case. A name ends
    /// with itself and every name ends with the root.
    #[must_use]
    pub fn ends_with(&self, base: &Name) -> bool {
        let mut self_iter = self.iter_labels().rev();
        for base_label in base.iter_labels().rev() {
            match self_iter.next() {
                Some(label) if label.eq_ignore_ascii_case(base_label) => {}
                _ => return false,
            }
        }
        true
    }

    /// Returns whether this name is strictly below `base`.
    #[must_use]
    pub fn is_below(&self, base: &Name) -> bool {
        self.ends_with(base) && self.label_count() > base.label_count()
    }

    /// Returns a new name with `label` prepended to this name.
    pub fn prepend(&self, label: &[u8]) -> Result<Name, NameError> {
        if label.is_empty() {
            return Err(NameError::EmptyLabel);
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(NameError::LongLabel);
        }
        if label.len() + 1 + self.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        let mut buf = BytesMut::with_capacity(label.len() + 1 + self.len());
        buf.put_u8(label.len() as u8);
        buf.put_slice(label);
        buf.put_slice(self.as_slice());
        Ok(Name(buf.freeze()))
    }

    /// Returns the wildcard name `*.<self>`.
    pub fn wildcard(&self) -> Result<Name, NameError> {
        self.prepend(b"*")
    }

    /// Replaces the suffix `old` of this name by `new`.
    ///
    /// This is the DNAME substitution of RFC 6672, section 2.2. Returns an
    /// error if `old` is not a suffix or if the result is too long.
    pub fn replace_suffix(
        &self,
        old: &Name,
        new: &Name,
    ) -> Result<Name, NameError> {
        if !self.ends_with(old) {
            return Err(NameError::NotASuffix);
        }
        let prefix_len = self.len() - old.len();
        if prefix_len + new.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        let mut buf = BytesMut::with_capacity(prefix_len + new.len());
        buf.put_slice(&self.as_slice()[..prefix_len]);
        buf.put_slice(new.as_slice());
        Ok(Name(buf.freeze()))
    }

    /// Appends the wire format of the name to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(self.as_slice())
    }

    /// Appends the canonical wire format of the name to `target`.
    ///
    /// This is the uncompressed wire format with all ASCII letters
    /// converted to lowercase.
    pub fn compose_canonical(&self, target: &mut Vec<u8>) {
        target.extend(self.as_slice().iter().map(u8::to_ascii_lowercase))
    }

    /// Returns a copy of the name with all ASCII letters lowercased.
    #[must_use]
    pub fn to_lowercase(&self) -> Name {
        Name(Bytes::from(self.0.to_ascii_lowercase()))
    }
}

//--- FromStr

impl FromStr for Name {
    type Err = NameError;

    /// Parses a name in presentation format.
    ///
    /// Relative names are treated as absolute. Escapes of the forms `\X`
    /// and `\DDD` are supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NameError::EmptyLabel);
        }
        if s == "." {
            return Ok(Name::root());
        }
        let mut labels: Vec<Vec<u8>> = Vec::new();
        let mut label = Vec::new();
        let mut chars = s.bytes();
        let mut trailing_dot = false;
        while let Some(ch) = chars.next() {
            trailing_dot = false;
            match ch {
                b'.' => {
                    if label.is_empty() {
                        return Err(NameError::EmptyLabel);
                    }
                    labels.push(std::mem::take(&mut label));
                    trailing_dot = true;
                }
                b'\\' => {
                    let first = chars.next().ok_or(NameError::BadEscape)?;
                    if first.is_ascii_digit() {
                        let second =
                            chars.next().ok_or(NameError::BadEscape)?;
                        let third =
                            chars.next().ok_or(NameError::BadEscape)?;
                        if !second.is_ascii_digit() || !third.is_ascii_digit()
                        {
                            return Err(NameError::BadEscape);
                        }
                        let value = u16::from(first - b'0') * 100
                            + u16::from(second - b'0') * 10
                            + u16::from(third - b'0');
                        let value = u8::try_from(value)
                            .map_err(|_| NameError::BadEscape)?;
                        label.push(value);
                    } else {
                        label.push(first);
                    }
                }
                _ => label.push(ch),
            }
        }
        if !trailing_dot {
            labels.push(label);
        }
        Name::from_labels(labels.iter().map(Vec::as_slice))
    }
}

//--- PartialEq, Eq, and Hash

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for ch in self.0.iter() {
            ch.to_ascii_lowercase().hash(state)
        }
    }
}

//--- PartialOrd and Ord

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    /// Compares two names in canonical order.
    ///
    /// Labels are compared starting from the root, each one as a string of
    /// lowercase octets where a shorter label sorts first.
    fn cmp(&self, other: &Self) -> Ordering {
        let mut self_iter = self.iter_labels().rev();
        let mut other_iter = other.iter_labels().rev();
        loop {
            match (self_iter.next(), other_iter.next()) {
                (Some(left), Some(right)) => {
                    match left
                        .iter()
                        .map(u8::to_ascii_lowercase)
                        .cmp(right.iter().map(u8::to_ascii_lowercase))
                    {
                        Ordering::Equal => {}
                        res => return res,
                    }
                }
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            }
        }
    }
}

//--- Display and Debug

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.iter_labels() {
            if label.is_empty() {
                break;
            }
            for &ch in label {
                if ch == b'.' || ch == b'\\' {
                    write!(f, "\\{}", ch as char)?;
                } else if ch.is_ascii_graphic() {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{ch:03}")?;
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

//------------ LabelIter -----------------------------------------------------

/// An iterator over the labels of a name.
#[derive(Clone, Debug)]
pub struct LabelIter<'a> {
    /// The remaining labels in wire format.
    slice: &'a [u8],
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, tail) = self.slice.split_first()?;
        let len = usize::from(len);
        let (label, rest) = tail.split_at(len);
        self.slice = rest;
        Some(label)
    }
}

impl<'a> DoubleEndedIterator for LabelIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.slice.is_empty() {
            return None;
        }
        // Walk forward to the start of the last label.
        let mut start = 0;
        loop {
            let len = usize::from(self.slice[start]);
            let end = start + 1 + len;
            if end >= self.slice.len() {
                let label = &self.slice[start + 1..end];
                self.slice = &self.slice[..start];
                return Some(label);
            }
            start = end;
        }
    }
}

//------------ SuffixIter ----------------------------------------------------

/// An iterator over a name and its ancestors.
#[derive(Clone, Debug)]
pub struct SuffixIter {
    /// The next name to return.
    name: Option<Name>,
}

impl Iterator for SuffixIter {
    type Item = Name;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.name.take()?;
        self.name = name.parent();
        Some(name)
    }
}

//------------ NameError -----------------------------------------------------

/// An error happened while creating a name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameError {
    /// The name is longer than 255 octets.
    LongName,

    /// A label is longer than 63 octets.
    LongLabel,

    /// An empty label appeared before the end of the name.
    EmptyLabel,

    /// An escape sequence was malformed.
    BadEscape,

    /// The wire format ended before the root label.
    ShortInput,

    /// There was data after the root label.
    TrailingData,

    /// The name to replace was not a suffix.
    NotASuffix,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::LongName => f.write_str("name exceeds 255 octets"),
            NameError::LongLabel => f.write_str("label exceeds 63 octets"),
            NameError::EmptyLabel => f.write_str("empty label"),
            NameError::BadEscape => f.write_str("invalid escape sequence"),
            NameError::ShortInput => f.write_str("unexpected end of name"),
            NameError::TrailingData => {
                f.write_str("trailing data after root label")
            }
            NameError::NotASuffix => f.write_str("not a suffix of the name"),
        }
    }
}

impl error::Error for NameError {}

//============ Testing =======================================================
