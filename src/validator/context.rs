//! Validation context.
//!
//! The validation context contains the trust anchors, a transport
//! connection for issuing on-demand queries, the configuration and a cache
//! of NSEC3 hashes. It is built once and then shared by all validations,
//! typically behind an [Arc].
//!
//! Everything learned about the chain of trust during one validation
//! lives in a [Pass] and is dropped when the validation is done.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::base::iana::{Class, ExtendedErrorCode, Rcode, Rtype};
use crate::base::{Message, Name, Question, Record, Rrset};
use crate::crypto::SignatureAlgorithm;
use crate::net::client::request::{
    Error as TransportError, RequestMessage, SendRequest,
};
use crate::rdata::dnssec::Timestamp;
use crate::rdata::{Dnskey, Ds};
use crate::utils::config::DefMinMax;

use super::anchor::{TrustAnchor, TrustAnchors};
use super::base::{supported_digest, verify, DnskeyExt};
use super::group::{GroupSet, ValidatedGroup};
use super::nsec::{
    nsec3_for_nodata, nsec3_for_nxdomain, nsec_for_nodata,
    nsec_for_nxdomain, Nsec3Cache, Nsec3NXState, Nsec3State, NsecNXState,
    NsecState,
};
use super::types::{
    ChainError, CryptoError, LookupFailure, NoAnchorError, ValidationResult,
    ValidationState,
};
use super::utilities::make_ede;

//------------ Config --------------------------------------------------------

/// Limit on the number of CNAME and DNAME records followed in a response.
const MAX_CNAME_DNAME: DefMinMax<u8> = DefMinMax::new(12, 0, 100);

/// Limit on the number of labels walked below a trust anchor.
const MAX_CHAIN_DEPTH: DefMinMax<u8> = DefMinMax::new(64, 1, 128);

/// Limit on failed signature verifications per RRset.
///
/// This protects against KeyTrap (CVE-2023-50387).
const MAX_BAD_SIGNATURES: DefMinMax<u8> = DefMinMax::new(1, 0, 8);

/// NSEC3 iteration count above which a proof is treated as insecure.
///
/// See [RFC 9276](https://www.rfc-editor.org/info/rfc9276), Section 3.2.
const NSEC3_ITER_INSECURE: DefMinMax<u16> = DefMinMax::new(100, 0, 500);

/// NSEC3 iteration count above which a proof is treated as bogus.
const NSEC3_ITER_BOGUS: DefMinMax<u16> = DefMinMax::new(500, 0, 2500);

/// Time to wait for the response to an on-demand lookup.
const LOOKUP_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(100),
    Duration::from_secs(60),
);

/// Number of NSEC3 hashes kept in the cache.
const NSEC3_CACHE_SIZE: u64 = 10_000;

/// Configuration of a validation context.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "kebab-case")
)]
pub struct Config {
    /// Maximum number of CNAME and DNAME records followed.
    max_cname_dname: u8,

    /// Maximum number of DS lookups walking down from a trust anchor.
    max_chain_depth: u8,

    /// Maximum number of failed signature verifications per RRset.
    max_bad_signatures: u8,

    /// Iteration count above which NSEC3 proofs are insecure.
    nsec3_iter_insecure: u16,

    /// Iteration count above which NSEC3 proofs are bogus.
    nsec3_iter_bogus: u16,

    /// Timeout for on-demand lookups.
    lookup_timeout: Duration,

    /// Fixed time to validate signatures at.
    val_override_date: Option<Timestamp>,
}

impl Config {
    /// Creates a new config with default values.
    ///
    /// The default values are documented at the relevant set_* methods.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the maximum number of CNAME and DNAME records followed.
    pub fn max_cname_dname(&self) -> u8 {
        self.max_cname_dname
    }

    /// Sets the maximum number of CNAME and DNAME records followed.
    ///
    /// A response with a longer alias chain is bogus. The default is 12,
    /// the limit is 100.
    pub fn set_max_cname_dname(&mut self, value: u8) {
        self.max_cname_dname = MAX_CNAME_DNAME.limit(value)
    }

    /// Returns the maximum number of DS lookups below a trust anchor.
    pub fn max_chain_depth(&self) -> u8 {
        self.max_chain_depth
    }

    /// Sets the maximum number of DS lookups below a trust anchor.
    ///
    /// Every label walked while the chain of trust is still secure costs
    /// one DS lookup. A chain that needs more lookups is bogus. Labels
    /// below an insecure zone or a name that doesn't exist are free. The
    /// default is 64, the value must be between 1 and 128.
    pub fn set_max_chain_depth(&mut self, value: u8) {
        self.max_chain_depth = MAX_CHAIN_DEPTH.limit(value)
    }

    /// Returns the maximum number of failed verifications per RRset.
    pub fn max_bad_signatures(&self) -> u8 {
        self.max_bad_signatures
    }

    /// Sets the maximum number of failed verifications per RRset.
    ///
    /// Once more verifications than this have failed the RRset is bogus
    /// without trying the remaining keys and signatures. The default is 1,
    /// the limit is 8.
    pub fn set_max_bad_signatures(&mut self, value: u8) {
        self.max_bad_signatures = MAX_BAD_SIGNATURES.limit(value)
    }

    /// Returns the iteration count above which NSEC3 proofs are insecure.
    pub fn nsec3_iter_insecure(&self) -> u16 {
        self.nsec3_iter_insecure
    }

    /// Sets the iteration count above which NSEC3 proofs are insecure.
    ///
    /// The default is 100, the limit is 500.
    pub fn set_nsec3_iter_insecure(&mut self, value: u16) {
        self.nsec3_iter_insecure = NSEC3_ITER_INSECURE.limit(value)
    }

    /// Returns the iteration count above which NSEC3 proofs are bogus.
    pub fn nsec3_iter_bogus(&self) -> u16 {
        self.nsec3_iter_bogus
    }

    /// Sets the iteration count above which NSEC3 proofs are bogus.
    ///
    /// The default is 500, the limit is 2500.
    pub fn set_nsec3_iter_bogus(&mut self, value: u16) {
        self.nsec3_iter_bogus = NSEC3_ITER_BOGUS.limit(value)
    }

    /// Returns the timeout for on-demand lookups.
    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Sets the timeout for on-demand lookups.
    ///
    /// A lookup that takes longer fails and makes the chain that needed
    /// it indeterminate. The default is 5 seconds, the value must be
    /// between 100 milliseconds and one minute.
    pub fn set_lookup_timeout(&mut self, value: Duration) {
        self.lookup_timeout = LOOKUP_TIMEOUT.limit(value)
    }

    /// Returns the fixed time signatures are validated at, if any.
    pub fn val_override_date(&self) -> Option<Timestamp> {
        self.val_override_date
    }

    /// Sets a fixed time to validate signatures at.
    ///
    /// This is mostly useful for testing against recorded data. By
    /// default the current system time is used.
    pub fn set_val_override_date(&mut self, value: Option<Timestamp>) {
        self.val_override_date = value
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cname_dname: MAX_CNAME_DNAME.default(),
            max_chain_depth: MAX_CHAIN_DEPTH.default(),
            max_bad_signatures: MAX_BAD_SIGNATURES.default(),
            nsec3_iter_insecure: NSEC3_ITER_INSECURE.default(),
            nsec3_iter_bogus: NSEC3_ITER_BOGUS.default(),
            lookup_timeout: LOOKUP_TIMEOUT.default(),
            val_override_date: None,
        }
    }
}

//------------ ValidationContext ---------------------------------------------

/// Everything needed to validate responses.
pub struct ValidationContext<Upstream> {
    ta: TrustAnchors,
    upstream: Upstream,
    config: Config,
    nsec3_cache: Nsec3Cache,
}

impl<Upstream> ValidationContext<Upstream> {
    /// Creates a new context with a default configuration.
    ///
    /// Note that Upstream needs to implement [SendRequest] to be useful.
    pub fn new(ta: TrustAnchors, upstream: Upstream) -> Self {
        Self::with_config(ta, upstream, Config::default())
    }

    /// Creates a new context with the given configuration.
    pub fn with_config(
        ta: TrustAnchors,
        upstream: Upstream,
        config: Config,
    ) -> Self {
        if ta.is_empty() {
            warn!("validation context without trust anchors");
        }
        Self {
            ta,
            upstream,
            config,
            nsec3_cache: Nsec3Cache::new(NSEC3_CACHE_SIZE),
        }
    }

    pub fn anchors(&self) -> &TrustAnchors {
        &self.ta
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the time to validate signatures at.
    pub fn now(&self) -> Timestamp {
        self.config.val_override_date.unwrap_or_else(Timestamp::now)
    }

    pub(crate) fn nsec3_cache(&self) -> &Nsec3Cache {
        &self.nsec3_cache
    }
}

impl<Upstream> ValidationContext<Upstream>
where
    Upstream: SendRequest<RequestMessage> + Send + Sync,
{
    /// Validates a DNSKEY RRset for a zone.
    ///
    /// The set is secure if a trust anchor for the zone or a validated DS
    /// record of the zone points at a key that signs the set.
    pub async fn validate_key_set(
        &self,
        zone: &Name,
        dnskeys: &Rrset,
    ) -> ValidationResult {
        if dnskeys.rtype() != Rtype::DNSKEY || dnskeys.owner() != zone {
            return ValidationResult::from_error(ChainError::DnskeyMissing);
        }
        let mut pass = Pass::new(self);
        pass.key_set_result(zone, dnskeys).await
    }

    /// Sends a query for validation data upstream.
    ///
    /// The query has the DO and CD bits set so that the upstream returns
    /// signatures and doesn't filter bogus data.
    pub(crate) async fn lookup(
        &self,
        name: &Name,
        rtype: Rtype,
    ) -> Result<Message, LookupFailure> {
        trace!("lookup {} {}", name, rtype);
        let question = Question::new(name.clone(), rtype, Class::IN);
        let mut msg = Message::query(question.clone(), true);
        msg.header_mut().set_cd(true);

        let mut request = self.upstream.send_request(RequestMessage::new(msg));
        let reply = timeout(self.config.lookup_timeout, request.get_response())
            .await
            .map_err(|_| LookupFailure::Timeout)??;
        if reply.sole_question() != Some(&question) {
            return Err(TransportError::WrongReplyForQuery.into());
        }
        Ok(reply)
    }
}

impl<Upstream> fmt::Debug for ValidationContext<Upstream> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("ta", &self.ta)
            .field("config", &self.config)
            .finish()
    }
}

/// Returns whether both digest and algorithm of a DS record are supported.
fn is_supported_ds(ds: &Ds) -> bool {
    supported_digest(ds.digest_type())
        && SignatureAlgorithm::is_supported(ds.algorithm())
}

//------------ Node ----------------------------------------------------------

/// What is known about the zone a name lives in.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// The apex of the zone.
    apex: Name,

    /// The state of the zone.
    result: ValidationResult,

    /// The validated keys of the zone. Only secure zones have keys.
    keys: Vec<Record<Dnskey>>,
}

impl Node {
    fn secure(apex: Name, keys: Vec<Record<Dnskey>>) -> Self {
        Self {
            apex,
            result: ValidationResult::secure(),
            keys,
        }
    }

    fn with_result(apex: Name, result: ValidationResult) -> Self {
        Self {
            apex,
            result,
            keys: Vec::new(),
        }
    }

    pub fn apex(&self) -> &Name {
        &self.apex
    }

    pub fn state(&self) -> ValidationState {
        self.result.state()
    }

    pub fn result(&self) -> ValidationResult {
        self.result.clone()
    }

    pub fn keys(&self) -> &[Record<Dnskey>] {
        &self.keys
    }
}

//------------ Pass ----------------------------------------------------------

/// The state of a single validation.
///
/// Nodes found while walking down from a trust anchor are kept here so
/// that every zone is looked up at most once per validation.
pub(crate) struct Pass<'a, Upstream> {
    vc: &'a ValidationContext<Upstream>,
    now: Timestamp,
    nodes: HashMap<Name, Arc<Node>>,
}

/// The outcome of looking up the DS set of a name.
enum DsStep {
    /// The name is a zone cut with these validated DS records.
    Cut(Vec<Ds>),

    /// The name exists but is not a zone cut.
    NotCut,

    /// The name does not exist.
    NoName,

    /// The walk ends with this node.
    Done(Node),
}

impl<'a, Upstream> Pass<'a, Upstream> {
    pub fn new(vc: &'a ValidationContext<Upstream>) -> Self {
        Self {
            vc,
            now: vc.now(),
            nodes: HashMap::new(),
        }
    }

    pub fn vc(&self) -> &'a ValidationContext<Upstream> {
        self.vc
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn config(&self) -> &'a Config {
        &self.vc.config
    }
}

impl<'a, Upstream> Pass<'a, Upstream>
where
    Upstream: SendRequest<RequestMessage> + Send + Sync,
{
    /// Returns the node of the zone `name` lives in.
    ///
    /// The walk starts at the closest trust anchor and looks up the DS
    /// set of every name between the anchor and `name`.
    pub async fn get_node(&mut self, name: &Name) -> Arc<Node> {
        if let Some(node) = self.nodes.get(name) {
            return node.clone();
        }

        let vc = self.vc;
        let Some(ta) = vc.ta.lookup(name) else {
            debug!("no trust anchor for {}", name);
            let node = Arc::new(Node::with_result(
                Name::root(),
                ValidationResult::from_error(NoAnchorError),
            ));
            self.nodes.insert(name.clone(), node.clone());
            return node;
        };

        let mut current = match self.nodes.get(ta.owner()) {
            Some(node) => node.clone(),
            None => {
                let node = Arc::new(self.anchor_node(ta).await);
                self.nodes.insert(ta.owner().clone(), node.clone());
                node
            }
        };

        let mut names: Vec<Name> = name
            .iter_suffixes()
            .take_while(|n| n != ta.owner())
            .collect();
        names.reverse();

        let max_steps = usize::from(self.config().max_chain_depth());
        let mut steps = 0;
        let mut exists = true;
        for n in names {
            if let Some(node) = self.nodes.get(&n) {
                current = node.clone();
                continue;
            }
            if exists && current.state() == ValidationState::Secure {
                steps += 1;
                if steps > max_steps {
                    debug!(
                        "more than {} DS lookups below {} for {}",
                        max_steps,
                        ta.owner(),
                        name
                    );
                    return Arc::new(Node::with_result(
                        current.apex().clone(),
                        ValidationResult::from_error(ChainError::TooDeep),
                    ));
                }
                match self.ds_step(&current, &n).await {
                    DsStep::Cut(ds) => {
                        current = Arc::new(self.zone_node(&n, &ds).await);
                    }
                    DsStep::NotCut => (),
                    DsStep::NoName => exists = false,
                    DsStep::Done(node) => current = Arc::new(node),
                }
            }
            self.nodes.insert(n, current.clone());
        }
        current
    }

    /// Validates a DNSKEY set with a trust anchor or the DS set of `zone`.
    async fn key_set_result(
        &mut self,
        zone: &Name,
        dnskeys: &Rrset,
    ) -> ValidationResult {
        let vc = self.vc;
        if let Some(ta) = vc.ta.get(zone) {
            return match self.validate_dnskeys(zone, dnskeys, ta.ds(), Some(ta))
            {
                Ok(_) => ValidationResult::secure(),
                Err(result) => result,
            };
        }

        let Some(parent) = zone.parent() else {
            return ValidationResult::from_error(NoAnchorError);
        };
        let current = self.get_node(&parent).await;
        if current.state() != ValidationState::Secure {
            return current.result();
        }
        match self.ds_step(&current, zone).await {
            DsStep::Cut(ds) => {
                match self.validate_dnskeys(zone, dnskeys, &ds, None) {
                    Ok(_) => ValidationResult::secure(),
                    Err(result) => result,
                }
            }
            DsStep::NotCut | DsStep::NoName => {
                ValidationResult::insecure(None)
            }
            DsStep::Done(node) => node.result(),
        }
    }

    /// Creates the node for a trust anchor.
    async fn anchor_node(&mut self, ta: &TrustAnchor) -> Node {
        let apex = ta.owner();
        let dnskeys = match self.fetch_dnskeys(apex).await {
            Ok(dnskeys) => dnskeys,
            Err(result) => return Node::with_result(apex.clone(), result),
        };
        match self.validate_dnskeys(apex, &dnskeys, ta.ds(), Some(ta)) {
            Ok(keys) => {
                trace!("trust anchor {} is secure", apex);
                Node::secure(apex.clone(), keys)
            }
            Err(result) => {
                debug!("trust anchor {}: {}", apex, result);
                Node::with_result(apex.clone(), result)
            }
        }
    }

    /// Creates the node for a zone with a validated DS set.
    async fn zone_node(&mut self, apex: &Name, ds: &[Ds]) -> Node {
        if !ds.iter().any(is_supported_ds) {
            // RFC 4035, Section 5.2: without a supported DS record the
            // zone is treated as unsigned.
            debug!("no supported DS record for {}", apex);
            return Node::with_result(
                apex.clone(),
                ValidationResult::insecure(make_ede(
                    ExtendedErrorCode::UNSUPPORTED_DS_DIGEST_TYPE,
                    "no supported DS record",
                )),
            );
        }
        let dnskeys = match self.fetch_dnskeys(apex).await {
            Ok(dnskeys) => dnskeys,
            Err(result) => return Node::with_result(apex.clone(), result),
        };
        match self.validate_dnskeys(apex, &dnskeys, ds, None) {
            Ok(keys) => {
                trace!("zone {} is secure", apex);
                Node::secure(apex.clone(), keys)
            }
            Err(result) => {
                debug!("zone {}: {}", apex, result);
                Node::with_result(apex.clone(), result)
            }
        }
    }

    /// Looks up the DNSKEY set of a zone.
    async fn fetch_dnskeys(
        &mut self,
        apex: &Name,
    ) -> Result<Rrset, ValidationResult> {
        let msg = self
            .vc
            .lookup(apex, Rtype::DNSKEY)
            .await
            .map_err(ValidationResult::from_error)?;
        let groups = GroupSet::from_records(msg.answer());
        let group = groups
            .iter()
            .find(|g| g.rtype() == Rtype::DNSKEY && g.owner() == apex)
            .ok_or_else(|| {
                ValidationResult::from_error(ChainError::DnskeyMissing)
            })?;
        if group.sig_set().is_empty() {
            return Err(ValidationResult::from_error(
                ChainError::RrsigsMissing,
            ));
        }
        group.rrset().map_err(ValidationResult::from_error)
    }

    /// Validates a DNSKEY set against DS records and anchor keys.
    ///
    /// The DS records are tried in order, then the DNSKEY records of
    /// `anchor` if there is one. The first key
    /// that matches and signs the set makes it secure. Returns the keys of
    /// the set on success.
    fn validate_dnskeys(
        &self,
        apex: &Name,
        dnskeys: &Rrset,
        ds_list: &[Ds],
        anchor: Option<&TrustAnchor>,
    ) -> Result<Vec<Record<Dnskey>>, ValidationResult> {
        let keys: Vec<Record<Dnskey>> = dnskeys
            .records()
            .iter()
            .filter_map(|rr| rr.to_record::<Dnskey>())
            .collect();

        let mut bad_sigs = 0;
        let mut first_error = None;
        let mut self_signed = |key: &Record<Dnskey>| -> Result<bool, ()> {
            for sig in dnskeys.sigs() {
                if sig.data().key_tag() != key.data().key_tag()
                    || sig.data().algorithm() != key.data().algorithm()
                {
                    continue;
                }
                match verify(dnskeys, sig, key, self.now) {
                    Ok(_) => return Ok(true),
                    Err(err) => {
                        debug!("DNSKEY {} of {}: {}", key.data().key_tag(), apex, err);
                        if err != CryptoError::UnsupportedAlgorithm {
                            bad_sigs += 1;
                            if bad_sigs > self.config().max_bad_signatures() {
                                return Err(());
                            }
                        }
                        first_error.get_or_insert(err);
                    }
                }
            }
            Ok(false)
        };

        let supported: Vec<&Ds> =
            ds_list.iter().filter(|ds| is_supported_ds(ds)).collect();

        let mut too_many = false;
        'ds: for ds in &supported {
            for key in &keys {
                let dnskey = key.data();
                if dnskey.key_tag() != ds.key_tag()
                    || dnskey.algorithm() != ds.algorithm()
                {
                    continue;
                }
                match dnskey.digest(apex, ds.digest_type()) {
                    Ok(digest) if digest.as_ref() == ds.digest().as_ref() => {}
                    _ => continue,
                }
                match self_signed(key) {
                    Ok(true) => return Ok(keys),
                    Ok(false) => (),
                    Err(()) => {
                        too_many = true;
                        break 'ds;
                    }
                }
            }
        }

        if let Some(anchor) = anchor.filter(|_| !too_many) {
            for key in &keys {
                if !anchor.has_dnskey(key.data()) {
                    continue;
                }
                match self_signed(key) {
                    Ok(true) => return Ok(keys),
                    Ok(false) => (),
                    Err(()) => {
                        too_many = true;
                        break;
                    }
                }
            }
        }

        if too_many {
            return Err(ValidationResult::bogus(make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "too many bad signatures",
            )));
        }
        let anchor_keys = anchor.map_or(0, |ta| ta.dnskeys().len());
        if supported.is_empty() && !ds_list.is_empty() && anchor_keys == 0 {
            // RFC 4035, Section 5.2: without a supported DS record the
            // zone is treated as unsigned.
            return Err(ValidationResult::insecure(make_ede(
                ExtendedErrorCode::UNSUPPORTED_DS_DIGEST_TYPE,
                "no supported DS record",
            )));
        }
        Err(match first_error {
            Some(err) => ValidationResult::from_error(err),
            None => ValidationResult::from_error(ChainError::DsMismatch),
        })
    }

    /// Looks up and evaluates the DS set of `name`.
    ///
    /// `current` is the node of the zone `name` lives in if it is not a
    /// zone cut. It has to be secure.
    async fn ds_step(&mut self, current: &Node, name: &Name) -> DsStep {
        let apex = current.apex();
        let msg = match self.vc.lookup(name, Rtype::DS).await {
            Ok(msg) => msg,
            Err(err) => {
                debug!("DS lookup for {} failed: {}", name, err);
                return DsStep::Done(Node::with_result(
                    apex.clone(),
                    ValidationResult::from_error(err),
                ));
            }
        };

        let answers = GroupSet::from_records(msg.answer());
        for g in answers.iter() {
            if g.owner() != name {
                continue;
            }
            let rtype = g.rtype();
            if rtype != Rtype::DS && rtype != Rtype::CNAME {
                continue;
            }
            let (result, _, _) =
                g.validate_with_node(current, self.now, self.config());
            if result.state() != ValidationState::Secure {
                debug!("{} {} in {}: {}", name, rtype, apex, result);
                return DsStep::Done(Node::with_result(apex.clone(), result));
            }
            if rtype == Rtype::CNAME {
                // An alias is never a zone cut.
                return DsStep::NotCut;
            }
            let ds = g
                .rr_set()
                .iter()
                .filter_map(|rr| rr.to_record::<Ds>())
                .map(Record::into_data)
                .collect();
            trace!("secure DS for {}", name);
            return DsStep::Cut(ds);
        }

        // No DS. The authority section has to prove it.
        let authorities: Vec<ValidatedGroup> =
            GroupSet::from_records(msg.authority())
                .iter()
                .map(|g| g.validated_with_node(current, self.now, self.config()))
                .collect();
        let nsec3_cache = self.vc.nsec3_cache();
        let config = self.config();

        match msg.rcode() {
            Rcode::NXDOMAIN => {
                let (state, ede) =
                    nsec_for_nxdomain(name, &authorities, apex);
                if let NsecNXState::DoesNotExist(_) = state {
                    trace!("NSEC proves {} does not exist", name);
                    return DsStep::NoName;
                }
                let (state, ede3) = nsec3_for_nxdomain(
                    name,
                    &authorities,
                    apex,
                    nsec3_cache,
                    config,
                )
                .await;
                let ede = ede.or(ede3);
                match state {
                    Nsec3NXState::DoesNotExist(_) => {
                        trace!("NSEC3 proves {} does not exist", name);
                        DsStep::NoName
                    }
                    Nsec3NXState::DoesNotExistInsecure(_)
                    | Nsec3NXState::Insecure => DsStep::Done(
                        Node::with_result(
                            apex.clone(),
                            ValidationResult::insecure(ede),
                        ),
                    ),
                    Nsec3NXState::Bogus | Nsec3NXState::Nothing => {
                        DsStep::Done(Node::with_result(
                            apex.clone(),
                            ValidationResult::bogus(ede.or_else(|| {
                                make_ede(
                                    ExtendedErrorCode::NSEC_MISSING,
                                    "no proof of non-existence for DS",
                                )
                            })),
                        ))
                    }
                }
            }
            Rcode::NOERROR => {
                let (state, ede) =
                    nsec_for_nodata(name, &authorities, Rtype::DS, apex);
                match state {
                    NsecState::NoData(Some(types)) => {
                        return if types.contains(Rtype::NS) {
                            trace!("NSEC proves insecure delegation {}", name);
                            DsStep::Done(Node::with_result(
                                name.clone(),
                                ValidationResult::insecure(None),
                            ))
                        } else {
                            DsStep::NotCut
                        };
                    }
                    NsecState::NoData(None) => return DsStep::NotCut,
                    NsecState::Nothing => (),
                }
                let (state, ede3) = nsec3_for_nodata(
                    name,
                    &authorities,
                    Rtype::DS,
                    apex,
                    nsec3_cache,
                    config,
                )
                .await;
                let ede = ede.or(ede3);
                match state {
                    Nsec3State::NoData(types) => {
                        if types.contains(Rtype::NS) {
                            trace!("NSEC3 proves insecure delegation {}", name);
                            DsStep::Done(Node::with_result(
                                name.clone(),
                                ValidationResult::insecure(None),
                            ))
                        } else {
                            DsStep::NotCut
                        }
                    }
                    Nsec3State::NoDataInsecure => DsStep::Done(
                        Node::with_result(
                            name.clone(),
                            ValidationResult::insecure(ede),
                        ),
                    ),
                    Nsec3State::Bogus | Nsec3State::Nothing => {
                        DsStep::Done(Node::with_result(
                            apex.clone(),
                            ValidationResult::bogus(ede.or_else(|| {
                                make_ede(
                                    ExtendedErrorCode::NSEC_MISSING,
                                    "no proof of non-existence for DS",
                                )
                            })),
                        ))
                    }
                }
            }
            rcode => {
                debug!("DS lookup for {} returned {}", name, rcode);
                DsStep::Done(Node::with_result(
                    apex.clone(),
                    ValidationResult::indeterminate(make_ede(
                        ExtendedErrorCode::DNSSEC_INDETERMINATE,
                        "DS lookup failed",
                    )),
                ))
            }
        }
    }
}

//============ Tests =========================================================
