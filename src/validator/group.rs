//! Records of one owner and type together with their signatures.
//!
//! Such a bundle is called a group here to keep it apart from an RRset,
//! which has no signatures.
//!
//! A group is what a section of a response breaks up into before
//! validation: sometimes there are no signatures, sometimes there is a
//! signature but no RRset.

use std::cmp::{max, min};

use tracing::{debug, trace};

use crate::base::iana::{Class, ExtendedErrorCode, Rtype};
use crate::base::opt::ExtendedError;
use crate::base::{MalformedSetError, Name, Record, Rrset, Ttl};
use crate::net::client::request::{RequestMessage, SendRequest};
use crate::rdata::dnssec::Timestamp;
use crate::rdata::{AllRecordData, Rrsig};

use super::base::verify;
use super::context::{Config, Node, Pass};
use super::types::{CryptoError, ValidationResult, ValidationState};
use super::utilities::{make_ede, map_dname, ttl_for_sig};

//------------ Group ---------------------------------------------------------

/// The records of an RRset, the RRSIGs covering it, and any synthesized
/// CNAMEs that belong to a DNAME in the set.
///
/// A group is never empty: either `rr_set` or `sig_set` has a record.
/// All records share owner and class, and all signatures cover the type
/// of the records in `rr_set`.
#[derive(Clone, Debug)]
pub struct Group {
    rr_set: Vec<Record>,
    sig_set: Vec<Record<Rrsig>>,
    extra_set: Vec<Record>,
    found_duplicate: bool,
}

impl Group {
    fn new(rr: &Record) -> Self {
        match rr.to_record::<Rrsig>() {
            Some(sig) => Self {
                rr_set: Vec::new(),
                sig_set: vec![sig],
                extra_set: Vec::new(),
                found_duplicate: false,
            },
            None => Self {
                rr_set: vec![rr.clone()],
                sig_set: Vec::new(),
                extra_set: Vec::new(),
                found_duplicate: false,
            },
        }
    }

    /// Adds `rr` if it belongs to this group.
    ///
    /// Returns whether the record was taken.
    fn add(&mut self, rr: &Record) -> bool {
        if rr.owner() != self.owner() || rr.class() != self.class() {
            return false;
        }
        let curr_rtype = match self.rr_set.first() {
            Some(first) => first.rtype(),
            None => self.sig_set[0].data().type_covered(),
        };

        if let Some(sig) = rr.to_record::<Rrsig>() {
            if sig.data().type_covered() != curr_rtype {
                return false;
            }
            // Duplicates happen. Keep one.
            if self.sig_set.contains(&sig) {
                self.found_duplicate = true;
            } else {
                self.sig_set.push(sig);
            }
            return true;
        }

        if rr.rtype() != curr_rtype {
            return false;
        }
        // Copies with a different TTL are still the same record. The
        // smaller TTL wins.
        match self.rr_set.iter_mut().find(|r| r.data() == rr.data()) {
            Some(existing) => {
                existing.set_ttl(existing.ttl().min(rr.ttl()));
                self.found_duplicate = true;
            }
            None => self.rr_set.push(rr.clone()),
        }
        true
    }

    /// Attaches the CNAME synthesized from the group's DNAME.
    ///
    /// It is not validated but has to go back into the secure response.
    fn add_extra(&mut self, rr: &Record) {
        self.extra_set.push(rr.clone());
    }

    pub fn owner(&self) -> &Name {
        if let Some(rr) = self.rr_set.first() {
            return rr.owner();
        }

        self.sig_set[0].owner()
    }

    pub fn class(&self) -> Class {
        if let Some(rr) = self.rr_set.first() {
            return rr.class();
        }
        self.sig_set[0].class()
    }

    pub fn rtype(&self) -> Rtype {
        if let Some(rr) = self.rr_set.first() {
            return rr.rtype();
        }

        Rtype::RRSIG
    }

    pub fn rr_set(&self) -> &[Record] {
        &self.rr_set
    }

    pub fn sig_set(&self) -> &[Record<Rrsig>] {
        &self.sig_set
    }

    /// Returns the group as an RRset for signature verification.
    pub fn rrset(&self) -> Result<Rrset, MalformedSetError> {
        Rrset::new(self.rr_set.clone(), self.sig_set.clone())
    }

    /// Validates the group with the keys of the zone that signed it.
    pub(crate) async fn validated<Upstream>(
        &self,
        pass: &mut Pass<'_, Upstream>,
    ) -> ValidatedGroup
    where
        Upstream: SendRequest<RequestMessage> + Send + Sync,
    {
        let (result, signer_name, closest_encloser, adjust_ttl) =
            self.validate_with_pass(pass).await;
        self.with_result(result, signer_name, closest_encloser, adjust_ttl)
    }

    /// Validates the group with the keys of a known node.
    pub(crate) fn validated_with_node(
        &self,
        node: &Node,
        now: Timestamp,
        config: &Config,
    ) -> ValidatedGroup {
        let (result, closest_encloser, adjust_ttl) =
            self.validate_with_node(node, now, config);
        self.with_result(
            result,
            node.apex().clone(),
            closest_encloser,
            adjust_ttl,
        )
    }

    fn with_result(
        &self,
        result: ValidationResult,
        signer_name: Name,
        closest_encloser: Option<Name>,
        adjust_ttl: Option<Ttl>,
    ) -> ValidatedGroup {
        let (state, ede) = result.into_parts();
        ValidatedGroup {
            rr_set: self.rr_set.clone(),
            sig_set: self.sig_set.clone(),
            extra_set: self.extra_set.clone(),
            state,
            signer_name,
            closest_encloser,
            ede,
            adjust_ttl,
            found_duplicate: self.found_duplicate,
        }
    }

    async fn validate_with_pass<Upstream>(
        &self,
        pass: &mut Pass<'_, Upstream>,
    ) -> (ValidationResult, Name, Option<Name>, Option<Ttl>)
    where
        Upstream: SendRequest<RequestMessage> + Send + Sync,
    {
        // Signed sets are checked in the zone of their signer, unsigned
        // ones in the zone of their owner, where they are bogus unless the
        // zone turns out to be insecure. Lone RRSIGs can't be checked.
        if self.rr_set.is_empty() {
            return (
                ValidationResult::insecure(make_ede(
                    ExtendedErrorCode::DNSSEC_INDETERMINATE,
                    "RRSIG without RRset",
                )),
                Name::root(),
                None,
                None,
            );
        }

        let target = match self.sig_set.first() {
            Some(sig_rr) => sig_rr.data().signer_name(),
            None => self.owner(),
        };
        let node = pass.get_node(target).await;
        let (result, closest_encloser, adjust_ttl) =
            self.validate_with_node(&node, pass.now(), pass.config());
        (result, node.apex().clone(), closest_encloser, adjust_ttl)
    }

    /// Tries to validate the signatures using the keys of a node.
    ///
    /// Returns the result, whether the signature was expanded from a
    /// wildcard and the TTL to cap the group at. The latter two are valid
    /// only if the state is secure.
    pub(crate) fn validate_with_node(
        &self,
        node: &Node,
        now: Timestamp,
        config: &Config,
    ) -> (ValidationResult, Option<Name>, Option<Ttl>) {
        if node.state() != ValidationState::Secure {
            return (node.result(), None, None);
        }

        if self.sig_set.is_empty() {
            debug!("unsigned {} {} in secure zone", self.owner(), self.rtype());
            return (
                ValidationResult::bogus(make_ede(
                    ExtendedErrorCode::RRSIGS_MISSING,
                    "no signature in secure zone",
                )),
                None,
                None,
            );
        }

        let rrset = match self.rrset() {
            Ok(rrset) => rrset,
            Err(err) => return (ValidationResult::from_error(err), None, None),
        };
        let group_max_ttl = self.max_ttl();

        let mut opt_ede = None;
        let mut bad_sigs = 0;
        for sig_rec in &self.sig_set {
            let sig = sig_rec.data();
            if sig.signer_name() != node.apex() {
                continue;
            }
            for key in node.keys() {
                if key.data().algorithm() != sig.algorithm()
                    || key.data().key_tag() != sig.key_tag()
                {
                    continue;
                }

                match verify(&rrset, sig_rec, key, now) {
                    Ok(wildcard) => {
                        let sig_ttl = ttl_for_sig(sig_rec, now);
                        let adjust_ttl = if sig_ttl < group_max_ttl {
                            Some(sig_ttl)
                        } else {
                            None
                        };
                        trace!(
                            "{} {} secure with key {}",
                            self.owner(),
                            self.rtype(),
                            sig.key_tag()
                        );
                        return (
                            ValidationResult::secure(),
                            wildcard,
                            adjust_ttl,
                        );
                    }
                    Err(err) => {
                        debug!(
                            "signature {} over {} {}: {}",
                            sig.key_tag(),
                            self.owner(),
                            self.rtype(),
                            err
                        );
                        // An unsupported algorithm costs no CPU. Everything
                        // else counts towards the KeyTrap (CVE-2023-50387)
                        // limit.
                        if err != CryptoError::UnsupportedAlgorithm {
                            bad_sigs += 1;
                            if bad_sigs > config.max_bad_signatures() {
                                return (
                                    ValidationResult::bogus(make_ede(
                                        ExtendedErrorCode::DNSSEC_BOGUS,
                                        "too many bad signatures",
                                    )),
                                    None,
                                    None,
                                );
                            }
                        }
                        if opt_ede.is_none() {
                            opt_ede = ValidationResult::from_error(err)
                                .ede()
                                .cloned();
                        }
                    }
                }
            }
        }

        let ede = match opt_ede {
            Some(ede) => Some(ede),
            None => ValidationResult::from_error(CryptoError::KeyMismatch)
                .ede()
                .cloned(),
        };
        (ValidationResult::bogus(ede), None, None)
    }

    pub fn min_ttl(&self) -> Ttl {
        self.rr_set
            .iter()
            .map(Record::ttl)
            .min()
            .unwrap_or(Ttl::ZERO)
    }

    pub fn max_ttl(&self) -> Ttl {
        let mut ttl = Ttl::ZERO;
        for rr in &self.rr_set {
            ttl = max(ttl, rr.ttl());
        }
        for rr in &self.sig_set {
            ttl = max(ttl, rr.ttl());
        }
        for rr in &self.extra_set {
            ttl = max(ttl, rr.ttl());
        }
        ttl
    }
}

//------------ GroupSet ------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct GroupSet(Vec<Group>);

impl GroupSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a group set from the records of one message section.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut set = Self::new();
        for rr in records {
            set.add(rr);
        }
        set
    }

    pub fn add(&mut self, rr: &Record) {
        // Quadratic, but sections are short and mostly sorted already.
        if let Some(last) = self.0.last_mut() {
            if last.add(rr) {
                return;
            }
        }

        let len = self.0.len();
        for g in self.0.iter_mut().take(len.saturating_sub(1)) {
            if g.add(rr) {
                return;
            }
        }

        self.0.push(Group::new(rr));
    }

    /// Moves CNAME records synthesized from a DNAME into the DNAME group.
    ///
    /// Only unsigned CNAMEs whose target is exactly the DNAME substitution
    /// of their owner are moved. Anything else stays and has to validate
    /// on its own.
    pub fn move_redundant_cnames(&mut self) {
        // Backwards, so removals don't shift unvisited groups.
        for cname_ind in (0..self.0.len()).rev() {
            let group = &self.0[cname_ind];
            if group.rtype() != Rtype::CNAME {
                continue;
            }
            if group.rr_set.len() != 1 {
                continue; // Let it fail if it is in secure zone.
            }
            if !group.sig_set.is_empty() {
                continue;
            }

            let cname_rr = group.rr_set[0].clone();
            let found_duplicate = group.found_duplicate;
            if self.moved_to_dname(&cname_rr, found_duplicate) {
                trace!("synthesized CNAME at {} matches DNAME", cname_rr.owner());
                let _ = self.0.remove(cname_ind);
            }
        }
    }

    fn moved_to_dname(&mut self, cname_rr: &Record, found_duplicate: bool) -> bool {
        let AllRecordData::Cname(cname) = cname_rr.data() else {
            return false;
        };
        let cname_name = cname_rr.owner();
        for g in &mut self.0 {
            if g.rtype() != Rtype::DNAME || g.class() != cname_rr.class() {
                continue;
            }
            let mut matched = false;
            for rr in &g.rr_set {
                let owner = rr.owner();
                if !cname_name.is_below(owner) {
                    // Not below the DNAME, or both a CNAME and a DNAME at
                    // the same name.
                    continue;
                }

                let AllRecordData::Dname(dname) = rr.data() else {
                    continue;
                };
                match map_dname(owner, dname, cname_name) {
                    Ok(result_name) if *cname.cname() == result_name => {
                        matched = true;
                        break;
                    }
                    // Not the substitution. Leave it to fail on its own.
                    _ => continue,
                }
            }
            if matched {
                g.add_extra(cname_rr);
                g.found_duplicate |= found_duplicate;
                return true;
            }
        }

        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates all groups in order.
    pub(crate) async fn validated<Upstream>(
        &self,
        pass: &mut Pass<'_, Upstream>,
    ) -> Vec<ValidatedGroup>
    where
        Upstream: SendRequest<RequestMessage> + Send + Sync,
    {
        let mut res = Vec::with_capacity(self.0.len());
        for g in &self.0 {
            res.push(g.validated(pass).await);
        }
        res
    }
}

//------------ ValidatedGroup ------------------------------------------------

#[derive(Clone, Debug)]
pub struct ValidatedGroup {
    rr_set: Vec<Record>,
    sig_set: Vec<Record<Rrsig>>,
    extra_set: Vec<Record>,
    state: ValidationState,
    signer_name: Name,
    closest_encloser: Option<Name>,
    ede: Option<ExtendedError>,
    adjust_ttl: Option<Ttl>,
    found_duplicate: bool,
}

impl ValidatedGroup {
    pub fn class(&self) -> Class {
        if let Some(rr) = self.rr_set.first() {
            return rr.class();
        }

        self.sig_set[0].class()
    }

    pub fn rtype(&self) -> Rtype {
        if let Some(rr) = self.rr_set.first() {
            return rr.rtype();
        }

        Rtype::RRSIG
    }

    pub fn owner(&self) -> &Name {
        if let Some(rr) = self.rr_set.first() {
            return rr.owner();
        }
        self.sig_set[0].owner()
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Returns the apex of the zone whose keys were used.
    pub fn signer_name(&self) -> &Name {
        &self.signer_name
    }

    /// Returns the closest encloser if the RRset was expanded from a
    /// wildcard.
    pub fn closest_encloser(&self) -> Option<&Name> {
        self.closest_encloser.as_ref()
    }

    pub fn ede(&self) -> Option<&ExtendedError> {
        self.ede.as_ref()
    }

    pub fn result(&self) -> ValidationResult {
        ValidationResult::new(self.state, self.ede.clone())
    }

    pub fn rr_set(&self) -> &[Record] {
        &self.rr_set
    }

    pub fn sig_set(&self) -> &[Record<Rrsig>] {
        &self.sig_set
    }

    pub fn extra_set(&self) -> &[Record] {
        &self.extra_set
    }

    pub fn adjust_ttl(&self) -> Option<Ttl> {
        self.adjust_ttl
    }

    pub fn found_duplicate(&self) -> bool {
        self.found_duplicate
    }

    /// Returns all records of the group including signatures.
    ///
    /// If `cap` is true, TTLs are capped to what the signatures allow.
    pub fn records(&self, cap: bool) -> impl Iterator<Item = Record> + '_ {
        let ttl_cap = if cap { self.adjust_ttl } else { None };
        let capped = move |mut rr: Record| {
            if let Some(ttl) = ttl_cap {
                rr.set_ttl(min(rr.ttl(), ttl));
            }
            rr
        };
        self.rr_set
            .iter()
            .cloned()
            .chain(self.extra_set.iter().cloned())
            .chain(
                self.sig_set
                    .iter()
                    .map(|sig| sig.with_data(sig.data().clone().into())),
            )
            .map(capped)
    }
}

//============ Tests =========================================================
