//! Signed zones and a scripted upstream for tests.
//!
//! A [MockUpstream] acts like a recursive resolver that knows a set of
//! zones. Zones are signed with freshly generated keys when the upstream
//! is created, the delegations between them are added automatically.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
};

use crate::base::iana::{
    Class, DigestAlgorithm, Nsec3HashAlgorithm, Rcode, Rtype,
    SecurityAlgorithm,
};
use crate::base::record::scan_records;
use crate::base::{Message, Name, Question, Record, Section, Ttl};
use crate::net::client::request::{
    ComposeRequest, Error, GetResponse, RequestMessage, SendRequest,
};
use crate::rdata::dnssec::{RtypeBitmap, Timestamp};
use crate::rdata::nsec3::{Nsec3Salt, OwnerHash};
use crate::rdata::{AllRecordData, Cname, Dnskey, Ds, Nsec, Nsec3, Rrsig};

use super::anchor::TrustAnchors;
use super::base::{nsec3_hash, DnskeyExt, RrsigExt};

/// TTL of the SOA record and of negative answers.
const NEGATIVE_TTL: u32 = 300;

/// Longest alias chain the upstream follows.
const MAX_CHASE: usize = 16;

pub(crate) fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

/// Installs a tracing subscriber that honours `RUST_LOG`.
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//------------ SigningKey ----------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Algorithm {
    Ed25519,
    EcdsaP256,
}

enum KeyPairKind {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
}

/// A key that can sign RRsets.
pub(crate) struct SigningKey {
    pair: KeyPairKind,
    dnskey: Dnskey,
    rng: SystemRandom,
}

impl SigningKey {
    /// Generates a new key with the SEP and zone key flags set.
    pub fn generate(algorithm: Algorithm) -> Self {
        let rng = SystemRandom::new();
        let flags = Dnskey::ZONE_KEY | Dnskey::SECURE_ENTRY_POINT;
        match algorithm {
            Algorithm::Ed25519 => {
                let doc = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
                let pair = Ed25519KeyPair::from_pkcs8(doc.as_ref()).unwrap();
                let dnskey = Dnskey::new(
                    flags,
                    3,
                    SecurityAlgorithm::ED25519,
                    Bytes::copy_from_slice(pair.public_key().as_ref()),
                );
                Self {
                    pair: KeyPairKind::Ed25519(pair),
                    dnskey,
                    rng,
                }
            }
            Algorithm::EcdsaP256 => {
                let alg = &ECDSA_P256_SHA256_FIXED_SIGNING;
                let doc = EcdsaKeyPair::generate_pkcs8(alg, &rng).unwrap();
                let pair =
                    EcdsaKeyPair::from_pkcs8(alg, doc.as_ref(), &rng).unwrap();
                // DNSSEC leaves out the leading 0x04 of the point.
                let dnskey = Dnskey::new(
                    flags,
                    3,
                    SecurityAlgorithm::ECDSAP256SHA256,
                    Bytes::copy_from_slice(&pair.public_key().as_ref()[1..]),
                );
                Self {
                    pair: KeyPairKind::Ecdsa(pair),
                    dnskey,
                    rng,
                }
            }
        }
    }

    pub fn dnskey(&self) -> &Dnskey {
        &self.dnskey
    }

    fn sign(&self, data: &[u8]) -> Bytes {
        match &self.pair {
            KeyPairKind::Ed25519(pair) => {
                Bytes::copy_from_slice(pair.sign(data).as_ref())
            }
            KeyPairKind::Ecdsa(pair) => Bytes::copy_from_slice(
                pair.sign(&self.rng, data).unwrap().as_ref(),
            ),
        }
    }

    /// Returns the DS record data for this key at `owner`.
    pub fn ds(&self, owner: &Name) -> Ds {
        let digest = self.dnskey.digest(owner, DigestAlgorithm::SHA256).unwrap();
        Ds::new(
            self.dnskey.key_tag(),
            self.dnskey.algorithm(),
            DigestAlgorithm::SHA256,
            Bytes::copy_from_slice(digest.as_ref()),
        )
    }
}

//------------ Zone ----------------------------------------------------------

/// How a signed zone denies existence.
#[derive(Clone, Debug)]
pub(crate) enum Denial {
    Nsec,
    Nsec3 { iterations: u16, opt_out: bool },
}

/// What the parent publishes for a zone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParentDs {
    /// A DS record for the key of the zone.
    Matching,

    /// A DS record for some other key.
    Mismatch,

    /// No DS record.
    Missing,
}

/// The content of a zone before signing.
pub(crate) struct Zone {
    apex: Name,
    key: Option<SigningKey>,
    denial: Denial,
    parent_ds: ParentDs,
    records: Vec<Record>,
}

impl Zone {
    /// Creates a signed zone with SOA and NS records at the apex.
    pub fn signed(apex: &str, algorithm: Algorithm, denial: Denial) -> Self {
        Self::new(apex, Some(SigningKey::generate(algorithm)), denial)
    }

    /// Creates an unsigned zone with SOA and NS records at the apex.
    pub fn unsigned(apex: &str) -> Self {
        Self::new(apex, None, Denial::Nsec)
    }

    fn new(apex: &str, key: Option<SigningKey>, denial: Denial) -> Self {
        let apex = name(apex);
        let ns = apex.prepend(b"ns").unwrap();
        let admin = apex.prepend(b"hostmaster").unwrap();
        let records = scan_records(&format!(
            "{apex} {NEGATIVE_TTL} IN SOA {ns} {admin} 1 7200 3600 1209600 {NEGATIVE_TTL}\n\
             {apex} 3600 IN NS {ns}\n"
        ))
        .unwrap();
        let parent_ds = if key.is_some() {
            ParentDs::Matching
        } else {
            ParentDs::Missing
        };
        Self {
            apex,
            key,
            denial,
            parent_ds,
            records,
        }
    }

    /// Adds records in presentation format.
    pub fn with_records(mut self, text: &str) -> Self {
        self.records.extend(scan_records(text).unwrap());
        self
    }

    pub fn with_parent_ds(mut self, parent_ds: ParentDs) -> Self {
        self.parent_ds = parent_ds;
        self
    }

    pub fn apex(&self) -> &Name {
        &self.apex
    }

    /// Returns the DS records the parent should publish.
    fn parent_records(&self) -> Vec<Record> {
        let ns = self.apex.prepend(b"ns").unwrap();
        let mut res = scan_records(&format!("{} 3600 IN NS {ns}", self.apex))
            .unwrap();
        let ds = match (&self.key, self.parent_ds) {
            (Some(key), ParentDs::Matching) => key.ds(&self.apex),
            (Some(_), ParentDs::Mismatch) => {
                SigningKey::generate(Algorithm::Ed25519).ds(&self.apex)
            }
            _ => return res,
        };
        res.push(Record::new(
            self.apex.clone(),
            Class::IN,
            Ttl::from_secs(3600),
            AllRecordData::from(ds),
        ));
        res
    }
}

//------------ SignedZone ----------------------------------------------------

/// The NSEC3 parameters of a zone.
struct Nsec3Params {
    iterations: u16,
    salt: Nsec3Salt,
    opt_out: bool,
}

/// A zone ready to answer queries.
struct SignedZone {
    apex: Name,
    key: Option<SigningKey>,
    rrsets: BTreeMap<(Name, Rtype), Vec<Record>>,
    sigs: HashMap<(Name, Rtype), Record<Rrsig>>,
    nsec_chain: Vec<Name>,
    nsec3: Option<Nsec3Params>,
    nsec3_chain: Vec<(OwnerHash, Name)>,
}

impl SignedZone {
    fn new(zone: Zone) -> Self {
        let Zone {
            apex,
            key,
            denial,
            records,
            ..
        } = zone;
        let mut rrsets: BTreeMap<(Name, Rtype), Vec<Record>> = BTreeMap::new();
        for rr in records {
            rrsets
                .entry((rr.owner().clone(), rr.rtype()))
                .or_default()
                .push(rr);
        }
        if let Some(key) = key.as_ref() {
            rrsets.insert(
                (apex.clone(), Rtype::DNSKEY),
                vec![Record::new(
                    apex.clone(),
                    Class::IN,
                    Ttl::from_secs(3600),
                    AllRecordData::from(key.dnskey().clone()),
                )],
            );
        }

        let mut res = Self {
            apex,
            key,
            rrsets,
            sigs: HashMap::new(),
            nsec_chain: Vec::new(),
            nsec3: None,
            nsec3_chain: Vec::new(),
        };
        if res.key.is_none() {
            return res;
        }
        match denial {
            Denial::Nsec => res.add_nsec_chain(),
            Denial::Nsec3 {
                iterations,
                opt_out,
            } => res.add_nsec3_chain(Nsec3Params {
                iterations,
                salt: Nsec3Salt::from_octets(Bytes::from_static(
                    b"\xaa\xbb\xcc\xdd",
                ))
                .unwrap(),
                opt_out,
            }),
        }
        res.sign_all();
        res
    }

    fn has(&self, owner: &Name, rtype: Rtype) -> bool {
        self.rrsets.contains_key(&(owner.clone(), rtype))
    }

    fn types_at(&self, owner: &Name) -> Vec<Rtype> {
        self.rrsets
            .keys()
            .filter(|(n, _)| n == owner)
            .map(|(_, t)| *t)
            .collect()
    }

    /// Returns whether a name has records or is an empty non-terminal.
    fn exists(&self, name: &Name) -> bool {
        self.rrsets.keys().any(|(n, _)| n.ends_with(name))
    }

    /// Returns all owner names that exist, including empty non-terminals.
    fn all_names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = Vec::new();
        for (owner, _) in self.rrsets.keys() {
            for n in owner.iter_suffixes() {
                if !n.ends_with(&self.apex) {
                    break;
                }
                names.push(n);
            }
        }
        names.sort();
        names.dedup();
        names
    }

    fn is_delegation(&self, name: &Name) -> bool {
        *name != self.apex && self.has(name, Rtype::NS)
    }

    /// Returns whether the set at `owner` gets a signature.
    fn is_signed(&self, owner: &Name, rtype: Rtype) -> bool {
        !(rtype == Rtype::NS && self.is_delegation(owner))
    }

    fn add_nsec_chain(&mut self) {
        let mut owners: Vec<Name> =
            self.rrsets.keys().map(|(n, _)| n.clone()).collect();
        owners.sort();
        owners.dedup();
        for (idx, owner) in owners.iter().enumerate() {
            let next = owners.get(idx + 1).unwrap_or(&self.apex).clone();
            let mut types = self.types_at(owner);
            types.extend([Rtype::RRSIG, Rtype::NSEC]);
            let nsec = Nsec::new(next, RtypeBitmap::from_types(types));
            self.rrsets.insert(
                (owner.clone(), Rtype::NSEC),
                vec![Record::new(
                    owner.clone(),
                    Class::IN,
                    Ttl::from_secs(NEGATIVE_TTL),
                    AllRecordData::from(nsec),
                )],
            );
        }
        self.nsec_chain = owners;
    }

    fn add_nsec3_chain(&mut self, params: Nsec3Params) {
        let mut chain: Vec<(OwnerHash, Name)> = Vec::new();
        let mut types_for: HashMap<OwnerHash, Vec<Rtype>> = HashMap::new();
        for n in self.all_names() {
            let insecure_cut =
                self.is_delegation(&n) && !self.has(&n, Rtype::DS);
            if params.opt_out && insecure_cut {
                continue;
            }
            let hash = nsec3_hash(
                &n,
                Nsec3HashAlgorithm::SHA1,
                params.iterations,
                &params.salt,
            )
            .unwrap();
            let mut types = self.types_at(&n);
            if !types.is_empty() && !insecure_cut {
                types.push(Rtype::RRSIG);
            }
            types_for.insert(hash.clone(), types);
            chain.push((hash.clone(), hash.owner_name(&self.apex).unwrap()));
        }
        chain.sort();
        let flags = if params.opt_out { Nsec3::OPT_OUT } else { 0 };
        for (idx, (hash, owner)) in chain.iter().enumerate() {
            let next = chain.get(idx + 1).unwrap_or(&chain[0]).0.clone();
            let nsec3 = Nsec3::new(
                Nsec3HashAlgorithm::SHA1,
                flags,
                params.iterations,
                params.salt.clone(),
                next,
                RtypeBitmap::from_types(types_for[hash].clone()),
            );
            self.rrsets.insert(
                (owner.clone(), Rtype::NSEC3),
                vec![Record::new(
                    owner.clone(),
                    Class::IN,
                    Ttl::from_secs(NEGATIVE_TTL),
                    AllRecordData::from(nsec3),
                )],
            );
        }
        self.nsec3 = Some(params);
        self.nsec3_chain = chain;
    }

    fn sign_all(&mut self) {
        let Some(key) = self.key.as_ref() else {
            return;
        };
        let now = Timestamp::now();
        let inception = Timestamp::from(now.into_int().wrapping_sub(3600));
        let expiration = now.add_secs(30 * 86400);
        let mut sigs = HashMap::new();
        for ((owner, rtype), records) in &self.rrsets {
            if !self.is_signed(owner, *rtype) {
                continue;
            }
            let first = &records[0];
            let mut rrsig = Rrsig::new(
                *rtype,
                key.dnskey().algorithm(),
                owner.rrsig_label_count() as u8,
                first.ttl(),
                expiration,
                inception,
                key.dnskey().key_tag(),
                self.apex.clone(),
                Bytes::new(),
            );
            let mut buf = Vec::new();
            rrsig.signed_data(&mut buf, records.as_slice());
            rrsig.set_signature(key.sign(&buf));
            sigs.insert(
                (owner.clone(), *rtype),
                Record::new(owner.clone(), Class::IN, first.ttl(), rrsig),
            );
        }
        self.sigs = sigs;
    }

    //--- Answering

    /// Adds the answer for a name to `msg`.
    ///
    /// Returns the name to continue with if the answer is an alias.
    fn answer(
        &self,
        qname: &Name,
        qtype: Rtype,
        msg: &mut Message,
    ) -> Option<Name> {
        if let Some(cut) = self.cut_above(qname, qtype) {
            self.push_set(msg, Section::Authority, &cut, Rtype::NS);
            if self.has(&cut, Rtype::DS) {
                self.push_set(msg, Section::Authority, &cut, Rtype::DS);
            } else {
                self.push_nodata_proof(msg, &cut);
            }
            return None;
        }

        if self.exists(qname) {
            if self.has(qname, qtype) {
                self.push_set(msg, Section::Answer, qname, qtype);
                return None;
            }
            if let Some(target) = self.cname_target(qname) {
                self.push_set(msg, Section::Answer, qname, Rtype::CNAME);
                return Some(target);
            }
            self.push_set(msg, Section::Authority, &self.apex, Rtype::SOA);
            self.push_nodata_proof(msg, qname);
            return None;
        }

        for owner in qname.iter_suffixes().skip(1) {
            if !owner.ends_with(&self.apex) {
                break;
            }
            let Some(rrs) = self.rrsets.get(&(owner.clone(), Rtype::DNAME))
            else {
                continue;
            };
            let AllRecordData::Dname(dname) = rrs[0].data() else {
                continue;
            };
            self.push_set(msg, Section::Answer, &owner, Rtype::DNAME);
            let target = qname.replace_suffix(&owner, dname.target()).ok()?;
            msg.push(
                Section::Answer,
                Record::new(
                    qname.clone(),
                    Class::IN,
                    rrs[0].ttl(),
                    AllRecordData::from(Cname::new(target.clone())),
                ),
            );
            return Some(target);
        }

        let ce = self.closest_encloser(qname);
        let wildcard = ce.wildcard().unwrap();
        if self.exists(&wildcard) {
            self.push_not_exists_proof(msg, qname);
            if self.has(&wildcard, qtype) {
                self.push_expanded(msg, &wildcard, qname, qtype);
                return None;
            }
            if let Some(target) = self.cname_target(&wildcard) {
                self.push_expanded(msg, &wildcard, qname, Rtype::CNAME);
                return Some(target);
            }
            self.push_set(msg, Section::Authority, &self.apex, Rtype::SOA);
            self.push_nodata_proof(msg, &wildcard);
            return None;
        }

        msg.header_mut().set_rcode(Rcode::NXDOMAIN);
        self.push_set(msg, Section::Authority, &self.apex, Rtype::SOA);
        self.push_not_exists_proof(msg, qname);
        self.push_covering(msg, &wildcard);
        None
    }

    /// Returns the delegation at or above `qname` that the query hits.
    fn cut_above(&self, qname: &Name, qtype: Rtype) -> Option<Name> {
        let mut names: Vec<Name> = qname
            .iter_suffixes()
            .take_while(|n| *n != self.apex)
            .collect();
        names.reverse();
        names.into_iter().find(|n| {
            self.is_delegation(n) && !(n == qname && qtype == Rtype::DS)
        })
    }

    fn cname_target(&self, owner: &Name) -> Option<Name> {
        let rrs = self.rrsets.get(&(owner.clone(), Rtype::CNAME))?;
        match rrs[0].data() {
            AllRecordData::Cname(cname) => Some(cname.cname().clone()),
            _ => None,
        }
    }

    fn closest_encloser(&self, qname: &Name) -> Name {
        qname
            .iter_suffixes()
            .skip(1)
            .find(|n| self.exists(n))
            .unwrap_or_else(|| self.apex.clone())
    }

    /// Adds a set and its signature unless it is already there.
    fn push_set(
        &self,
        msg: &mut Message,
        section: Section,
        owner: &Name,
        rtype: Rtype,
    ) {
        if msg
            .section(section)
            .iter()
            .any(|rr| rr.owner() == owner && rr.rtype() == rtype)
        {
            return;
        }
        let Some(records) = self.rrsets.get(&(owner.clone(), rtype)) else {
            return;
        };
        for rr in records {
            msg.push(section, rr.clone());
        }
        if let Some(sig) = self.sigs.get(&(owner.clone(), rtype)) {
            msg.push(section, sig.with_data(sig.data().clone().into()));
        }
    }

    /// Adds a set expanded from a wildcard.
    fn push_expanded(
        &self,
        msg: &mut Message,
        wildcard: &Name,
        qname: &Name,
        rtype: Rtype,
    ) {
        let Some(records) = self.rrsets.get(&(wildcard.clone(), rtype)) else {
            return;
        };
        for rr in records {
            msg.push(
                Section::Answer,
                Record::new(qname.clone(), rr.class(), rr.ttl(), rr.data().clone()),
            );
        }
        if let Some(sig) = self.sigs.get(&(wildcard.clone(), rtype)) {
            msg.push(
                Section::Answer,
                Record::new(
                    qname.clone(),
                    sig.class(),
                    sig.ttl(),
                    AllRecordData::from(sig.data().clone()),
                ),
            );
        }
    }

    /// Adds the proof that `name` exists but lacks the asked for type.
    fn push_nodata_proof(&self, msg: &mut Message, name: &Name) {
        if self.nsec3.is_some() {
            match self.nsec3_matching(name) {
                Some(owner) => {
                    self.push_set(msg, Section::Authority, &owner, Rtype::NSEC3)
                }
                None => self.push_encloser_proof(msg, name),
            }
        } else {
            self.push_covering(msg, name);
        }
    }

    /// Adds the proof that `name` does not exist.
    fn push_not_exists_proof(&self, msg: &mut Message, name: &Name) {
        if self.nsec3.is_some() {
            self.push_encloser_proof(msg, name);
        } else {
            self.push_covering(msg, name);
        }
    }

    /// Adds the NSEC or NSEC3 record matching or covering `name`.
    fn push_covering(&self, msg: &mut Message, name: &Name) {
        if self.nsec3.is_some() {
            let owner = self.nsec3_covering(name);
            self.push_set(msg, Section::Authority, &owner, Rtype::NSEC3);
        } else if !self.nsec_chain.is_empty() {
            let idx = self.nsec_chain.partition_point(|n| n <= name);
            let owner = &self.nsec_chain[idx.saturating_sub(1)];
            self.push_set(msg, Section::Authority, owner, Rtype::NSEC);
        }
    }

    /// Adds the NSEC3 closest encloser proof for `name`.
    fn push_encloser_proof(&self, msg: &mut Message, name: &Name) {
        let Some((ce, owner)) = name
            .iter_suffixes()
            .skip(1)
            .find_map(|n| self.nsec3_matching(&n).map(|owner| (n, owner)))
        else {
            return;
        };
        self.push_set(msg, Section::Authority, &owner, Rtype::NSEC3);
        if let Some(next_closer) = name.suffix_with_labels(ce.label_count() + 1)
        {
            let owner = self.nsec3_covering(&next_closer);
            self.push_set(msg, Section::Authority, &owner, Rtype::NSEC3);
        }
    }

    fn nsec3_hash(&self, name: &Name) -> Option<OwnerHash> {
        let params = self.nsec3.as_ref()?;
        nsec3_hash(
            name,
            Nsec3HashAlgorithm::SHA1,
            params.iterations,
            &params.salt,
        )
        .ok()
    }

    fn nsec3_matching(&self, name: &Name) -> Option<Name> {
        let hash = self.nsec3_hash(name)?;
        self.nsec3_chain
            .iter()
            .find(|(h, _)| *h == hash)
            .map(|(_, owner)| owner.clone())
    }

    fn nsec3_covering(&self, name: &Name) -> Name {
        let hash = self.nsec3_hash(name).unwrap();
        let idx = self.nsec3_chain.partition_point(|(h, _)| *h <= hash);
        match idx {
            0 => self.nsec3_chain[self.nsec3_chain.len() - 1].1.clone(),
            idx => self.nsec3_chain[idx - 1].1.clone(),
        }
    }
}

//------------ MockUpstream --------------------------------------------------

struct Inner {
    zones: Vec<SignedZone>,
    overrides: Mutex<HashMap<(Name, Rtype), Message>>,
    failing: Mutex<HashSet<(Name, Rtype)>>,
    fail_all: AtomicBool,
    count: AtomicUsize,
    requests: Mutex<Vec<Message>>,
}

/// An upstream that answers from a set of signed zones.
#[derive(Clone)]
pub(crate) struct MockUpstream {
    inner: Arc<Inner>,
    anchors: TrustAnchors,
}

impl MockUpstream {
    /// Signs the zones and links them with delegations.
    ///
    /// The first zone without a parent in the set becomes the trust
    /// anchor.
    pub fn new(mut zones: Vec<Zone>) -> Self {
        let delegations: Vec<(usize, Vec<Record>)> = zones
            .iter()
            .filter_map(|child| {
                let parent = zones
                    .iter()
                    .enumerate()
                    .filter(|(_, z)| child.apex().is_below(z.apex()))
                    .max_by_key(|(_, z)| z.apex().label_count())?
                    .0;
                Some((parent, child.parent_records()))
            })
            .collect();
        for (parent, records) in delegations {
            zones[parent].records.extend(records);
        }

        let mut anchors = TrustAnchors::empty();
        if let Some(top) = zones.iter().find(|zone| {
            zone.key.is_some()
                && !zones.iter().any(|z| zone.apex().is_below(z.apex()))
        }) {
            let key = top.key.as_ref().unwrap();
            anchors
                .add(Record::new(
                    top.apex().clone(),
                    Class::IN,
                    Ttl::from_secs(3600),
                    AllRecordData::from(key.ds(top.apex())),
                ))
                .unwrap();
        }

        Self {
            inner: Arc::new(Inner {
                zones: zones.into_iter().map(SignedZone::new).collect(),
                overrides: Default::default(),
                failing: Default::default(),
                fail_all: AtomicBool::new(false),
                count: AtomicUsize::new(0),
                requests: Default::default(),
            }),
            anchors,
        }
    }

    pub fn anchors(&self) -> TrustAnchors {
        self.anchors.clone()
    }

    /// Answers a query with `msg` from now on.
    pub fn set_override(&self, qname: &Name, qtype: Rtype, msg: Message) {
        self.inner
            .overrides
            .lock()
            .unwrap()
            .insert((qname.clone(), qtype), msg);
    }

    /// Makes queries for a name and type fail.
    pub fn fail(&self, qname: &Name, qtype: Rtype) {
        self.inner
            .failing
            .lock()
            .unwrap()
            .insert((qname.clone(), qtype));
    }

    /// Makes all queries fail.
    pub fn fail_all(&self, value: bool) {
        self.inner.fail_all.store(value, Ordering::SeqCst)
    }

    /// Returns the number of queries received so far.
    pub fn query_count(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    /// Returns the queries received so far.
    pub fn requests(&self) -> Vec<Message> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Returns the response to a DO query without counting it.
    pub fn response(&self, qname: &str, qtype: Rtype) -> Message {
        let query = Message::query(Question::new_in(name(qname), qtype), true);
        self.resolve(&query)
    }

    fn respond(&self, request: &Message) -> Result<Message, Error> {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
        self.inner.requests.lock().unwrap().push(request.clone());
        let question = request.sole_question().ok_or(Error::FormError)?;
        let key = (question.qname().clone(), question.qtype());
        if self.inner.fail_all.load(Ordering::SeqCst)
            || self.inner.failing.lock().unwrap().contains(&key)
        {
            return Err(Error::ConnectionClosed);
        }
        if let Some(msg) = self.inner.overrides.lock().unwrap().get(&key) {
            let mut msg = msg.clone();
            msg.header_mut().set_id(request.header().id());
            return Ok(msg);
        }
        Ok(self.resolve(request))
    }

    fn resolve(&self, request: &Message) -> Message {
        let mut msg = Message::start_response(request);
        msg.header_mut().set_ra(true);
        let Some(question) = request.sole_question() else {
            msg.header_mut().set_rcode(Rcode::FORMERR);
            return msg;
        };
        let qtype = question.qtype();
        let mut qname = question.qname().clone();
        let mut seen = HashSet::new();
        for _ in 0..MAX_CHASE {
            if !seen.insert(qname.clone()) {
                break;
            }
            let Some(zone) = self.zone_for(&qname, qtype) else {
                if msg.answer().is_empty() {
                    msg.header_mut().set_rcode(Rcode::REFUSED);
                }
                break;
            };
            match zone.answer(&qname, qtype, &mut msg) {
                Some(target) => qname = target,
                None => break,
            }
        }
        if !request.dnssec_ok() {
            msg.strip_dnssec_records();
        }
        msg
    }

    fn zone_for(&self, qname: &Name, qtype: Rtype) -> Option<&SignedZone> {
        self.inner
            .zones
            .iter()
            .filter(|z| qname.ends_with(&z.apex))
            .filter(|z| qtype != Rtype::DS || z.apex != *qname || qname.is_root())
            .max_by_key(|z| z.apex.label_count())
    }
}

impl SendRequest<RequestMessage> for MockUpstream {
    fn send_request(
        &self,
        request_msg: RequestMessage,
    ) -> Box<dyn GetResponse + Send + Sync> {
        Box::new(MockResponse {
            result: Some(self.respond(&request_msg.to_message())),
        })
    }
}

#[derive(Debug)]
struct MockResponse {
    result: Option<Result<Message, Error>>,
}

impl GetResponse for MockResponse {
    fn get_response(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + '_>> {
        let result = self.result.take().unwrap_or(Err(Error::ConnectionClosed));
        Box::pin(async move { result })
    }
}

//------------ Standard zones ------------------------------------------------

/// Builds the zones most tests run against.
///
/// The root and `example.` are signed, `example.` uses the given denial
/// method. Below `example.` there are a secure child `sub.example.`, an
/// insecure child `insecure.example.`, a child with a mismatching DS
/// `bad.example.`, and a child whose DS only uses an unsupported algorithm
/// `oddalg.example.`. The signed zone `other.` sits next to `example.`,
/// `alias.example.` and `ext.example.` are DNAMEs into `d.example.` and
/// `other.`.
pub(crate) fn standard(denial: Denial) -> MockUpstream {
    let root = Zone::signed(".", Algorithm::Ed25519, Denial::Nsec);
    let example = Zone::signed("example.", Algorithm::Ed25519, denial.clone())
        .with_records(
            "www.example. 3600 IN A 192.0.2.1\n\
             www.example. 3600 IN AAAA 2001:db8::1\n\
             host.example. 3600 IN A 192.0.2.2\n\
             alias.example. 3600 IN DNAME d.example.\n\
             ext.example. 3600 IN DNAME other.\n\
             www.d.example. 3600 IN CNAME host.example.\n\
             cname.example. 3600 IN CNAME www.example.\n\
             *.wild.example. 3600 IN A 192.0.2.3\n\
             x.ent.example. 3600 IN TXT \"x\"\n\
             loop1.example. 3600 IN CNAME loop2.example.\n\
             loop2.example. 3600 IN CNAME loop1.example.\n\
             ref.example. 3600 IN NS ns.ref.example.\n\
             oddalg.example. 3600 IN DS 12345 16 2 \
                 0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF\n",
        );
    let sub = Zone::signed("sub.example.", Algorithm::EcdsaP256, denial.clone())
        .with_records("www.sub.example. 3600 IN A 192.0.2.10\n");
    let insecure = Zone::unsigned("insecure.example.")
        .with_records("www.insecure.example. 3600 IN A 192.0.2.20\n");
    let bad = Zone::signed("bad.example.", Algorithm::Ed25519, denial)
        .with_parent_ds(ParentDs::Mismatch)
        .with_records("www.bad.example. 3600 IN A 192.0.2.30\n");
    let oddalg = Zone::unsigned("oddalg.example.")
        .with_records("www.oddalg.example. 3600 IN A 192.0.2.40\n");
    let other = Zone::signed("other.", Algorithm::EcdsaP256, Denial::Nsec)
        .with_records("www.other. 3600 IN A 192.0.2.50\n");
    MockUpstream::new(vec![root, example, sub, insecure, bad, oddalg, other])
}

/// Flips a bit in every signature covering `rtype` in the answer.
pub(crate) fn corrupt_signatures(msg: &mut Message, rtype: Rtype) {
    for rr in msg.section_mut(Section::Answer) {
        let AllRecordData::Rrsig(rrsig) = rr.data() else {
            continue;
        };
        if rrsig.type_covered() != rtype {
            continue;
        }
        let mut rrsig = rrsig.clone();
        let mut signature = rrsig.signature().to_vec();
        if let Some(octet) = signature.last_mut() {
            *octet ^= 0x01;
        }
        rrsig.set_signature(signature.into());
        *rr = rr.with_data(AllRecordData::from(rrsig));
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_zones_answer() {
        let upstream = standard(Denial::Nsec);

        let msg = upstream.response("www.example.", Rtype::A);
        assert_eq!(msg.rcode(), Rcode::NOERROR);
        assert!(msg.has_answer(&name("www.example."), Rtype::A));
        assert!(msg.has_answer(&name("www.example."), Rtype::RRSIG));

        let msg = upstream.response("nope.example.", Rtype::A);
        assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
        assert!(msg.authority().iter().any(|rr| rr.rtype() == Rtype::NSEC));

        let msg = upstream.response("www.alias.example.", Rtype::A);
        assert!(msg.has_answer(&name("www.alias.example."), Rtype::CNAME));
        assert!(msg.has_answer(&name("host.example."), Rtype::A));

        let msg = upstream.response("www.ext.example.", Rtype::A);
        assert!(msg.has_answer(&name("ext.example."), Rtype::DNAME));
        assert!(msg.has_answer(&name("www.other."), Rtype::A));

        let msg = upstream.response("sub.example.", Rtype::DS);
        assert!(msg.has_answer(&name("sub.example."), Rtype::DS));

        let msg = upstream.response("www.ref.example.", Rtype::A);
        assert!(msg.answer().is_empty());
        assert!(msg.authority().iter().any(|rr| rr.rtype() == Rtype::NS));
        assert_eq!(upstream.query_count(), 0);
    }

    #[test]
    fn nsec3_chain() {
        let upstream = standard(Denial::Nsec3 {
            iterations: 0,
            opt_out: false,
        });
        let msg = upstream.response("nope.example.", Rtype::A);
        assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
        let nsec3s = msg
            .authority()
            .iter()
            .filter(|rr| rr.rtype() == Rtype::NSEC3)
            .count();
        assert!((2..=3).contains(&nsec3s));
    }

    #[test]
    fn dnssec_records_need_do() {
        let upstream = standard(Denial::Nsec);
        let query = Message::query(
            Question::new_in(name("www.example."), Rtype::A),
            false,
        );
        let msg = upstream.resolve(&query);
        assert!(msg.has_answer(&name("www.example."), Rtype::A));
        assert!(!msg.has_answer(&name("www.example."), Rtype::RRSIG));
    }
}
