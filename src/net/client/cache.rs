//! A response cache.
//!
//! [Connection] is a transport that keeps complete responses of its
//! upstream in memory for as long as their TTLs allow. A response served
//! from the cache has its TTLs reduced by the time it spent there, carries
//! the ID of the new request and repeats the query name exactly as the new
//! request spelled it.
//!
//! Entries are keyed by query name, class, and type plus the CD, DO, and
//! RD flags of the request. Two of the flags allow a shortcut: a request
//! with DO clear can be answered from a response to a DO request once the
//! DNSSEC records are removed, and a request with RD clear can be answered
//! from a response to an RD request. CD never does. A validator upstream
//! only checks requests without CD, so the two kinds of responses must not
//! mix.
//!
//! In a validating setup, the cache can sit in front of the upstream of the
//! [validation context][crate::validator::context::ValidationContext] so
//! that DNSKEY and DS lookups are shared between validations, or in front
//! of the [validating transport][crate::net::client::validator] itself.

#![warn(missing_docs)]

use std::boxed::Box;
use std::cmp::min;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::time::Instant;
use tracing::trace;

use crate::base::iana::{Class, Rcode, Rtype};
use crate::base::{Message, Name, Section};
use crate::net::client::request::{
    ComposeRequest, Error, GetResponse, SendRequest,
};
use crate::utils::config::DefMinMax;

//------------ Config ---------------------------------------------------------

/// Bounds for the number of cached responses.
const MAX_ENTRIES: DefMinMax<u64> = DefMinMax::new(10_000, 1, 1_000_000_000);

/// Bounds for the lifetime of any entry.
///
/// RFC 8767 suggests a cap of one week.
const MAX_VALIDITY: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(7 * 24 * 3600),
    Duration::from_secs(60),
    Duration::from_secs(70 * 24 * 3600),
);

/// Bounds for the lifetime of NXDOMAIN responses.
///
/// RFC 2308 recommends one to three hours and no more than a day.
const MAX_NXDOMAIN_VALIDITY: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(3600),
    Duration::from_secs(60),
    Duration::from_secs(24 * 3600),
);

/// Bounds for the lifetime of NODATA responses, same as for NXDOMAIN.
const MAX_NODATA_VALIDITY: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(3600),
    Duration::from_secs(60),
    Duration::from_secs(24 * 3600),
);

/// Bounds for the lifetime of responses with other rcodes.
///
/// RFC 9520 asks for between one second and five minutes.
const MISC_ERROR_DURATION: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(30),
    Duration::from_secs(1),
    Duration::from_secs(300),
);

/// Bounds for the time a transport failure is remembered.
const TRANSPORT_FAILURE_DURATION: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(30),
    Duration::from_secs(1),
    Duration::from_secs(300),
);

/// Configuration of a caching transport.
///
/// All durations are upper limits. An entry never outlives the smallest
/// TTL in its response.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "kebab-case")
)]
pub struct Config {
    /// Maximum number of entries.
    max_entries: u64,

    /// Maximum lifetime of any entry.
    max_validity: Duration,

    /// Maximum lifetime of an NXDOMAIN response.
    max_nxdomain_validity: Duration,

    /// Maximum lifetime of a NODATA response.
    max_nodata_validity: Duration,

    /// Lifetime of responses with rcodes other than NOERROR and NXDOMAIN.
    misc_error_duration: Duration,

    /// Lifetime of a transport failure.
    transport_failure_duration: Duration,
}

impl Config {
    /// Creates a config with the default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the maximum number of entries.
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Sets the maximum number of entries.
    ///
    /// Clamped to between one and a billion. Defaults to 10,000.
    pub fn set_max_entries(&mut self, value: u64) {
        self.max_entries = MAX_ENTRIES.limit(value)
    }

    /// Returns the maximum lifetime of any entry.
    pub fn max_validity(&self) -> Duration {
        self.max_validity
    }

    /// Sets the maximum lifetime of any entry.
    ///
    /// Clamped to between a minute and ten weeks. Defaults to a week.
    pub fn set_max_validity(&mut self, value: Duration) {
        self.max_validity = MAX_VALIDITY.limit(value)
    }

    /// Returns the maximum lifetime of an NXDOMAIN response.
    pub fn max_nxdomain_validity(&self) -> Duration {
        self.max_nxdomain_validity
    }

    /// Sets the maximum lifetime of an NXDOMAIN response.
    ///
    /// Clamped to between a minute and a day. Defaults to an hour.
    pub fn set_max_nxdomain_validity(&mut self, value: Duration) {
        self.max_nxdomain_validity = MAX_NXDOMAIN_VALIDITY.limit(value)
    }

    /// Returns the maximum lifetime of a NODATA response.
    pub fn max_nodata_validity(&self) -> Duration {
        self.max_nodata_validity
    }

    /// Sets the maximum lifetime of a NODATA response.
    ///
    /// Clamped to between a minute and a day. Defaults to an hour.
    pub fn set_max_nodata_validity(&mut self, value: Duration) {
        self.max_nodata_validity = MAX_NODATA_VALIDITY.limit(value)
    }

    /// Returns the lifetime of responses with other rcodes.
    pub fn misc_error_duration(&self) -> Duration {
        self.misc_error_duration
    }

    /// Sets the lifetime of responses with rcodes other than NOERROR and
    /// NXDOMAIN.
    ///
    /// Clamped to between a second and five minutes. Defaults to 30
    /// seconds.
    pub fn set_misc_error_duration(&mut self, value: Duration) {
        self.misc_error_duration = MISC_ERROR_DURATION.limit(value)
    }

    /// Returns how long a transport failure is remembered.
    pub fn transport_failure_duration(&self) -> Duration {
        self.transport_failure_duration
    }

    /// Sets how long a transport failure is remembered.
    ///
    /// Clamped to between a second and five minutes. Defaults to 30
    /// seconds.
    pub fn set_transport_failure_duration(&mut self, value: Duration) {
        self.transport_failure_duration =
            TRANSPORT_FAILURE_DURATION.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES.default(),
            max_validity: MAX_VALIDITY.default(),
            max_nxdomain_validity: MAX_NXDOMAIN_VALIDITY.default(),
            max_nodata_validity: MAX_NODATA_VALIDITY.default(),
            misc_error_duration: MISC_ERROR_DURATION.default(),
            transport_failure_duration: TRANSPORT_FAILURE_DURATION.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// A transport that caches the responses of its upstream.
#[derive(Clone)]
pub struct Connection<Upstream> {
    /// The transport cache misses go to.
    upstream: Upstream,

    /// The entries, shared by all clones of the connection.
    cache: Cache<Key, Arc<Entry>>,

    /// The configuration.
    config: Config,
}

impl<Upstream> Connection<Upstream> {
    /// Creates a caching transport with the default configuration.
    pub fn new(upstream: Upstream) -> Self {
        Self::with_config(upstream, Config::default())
    }

    /// Creates a caching transport with the given configuration.
    pub fn with_config(upstream: Upstream, config: Config) -> Self {
        Self {
            upstream,
            cache: Cache::new(config.max_entries),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<Upstream> Debug for Connection<Upstream> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("Connection")
            .field("entries", &self.cache.entry_count())
            .field("config", &self.config)
            .finish()
    }
}

impl<CR, Upstream> SendRequest<CR> for Connection<Upstream>
where
    CR: ComposeRequest + Clone + 'static,
    Upstream: SendRequest<CR> + Clone + Send + Sync + 'static,
{
    fn send_request(
        &self,
        request_msg: CR,
    ) -> Box<dyn GetResponse + Send + Sync> {
        Box::new(Request {
            request_msg,
            upstream: self.upstream.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        })
    }
}

//------------ Request --------------------------------------------------------

/// A request going through the cache.
pub struct Request<CR, Upstream> {
    request_msg: CR,
    upstream: Upstream,
    cache: Cache<Key, Arc<Entry>>,
    config: Config,
}

impl<CR, Upstream> Request<CR, Upstream>
where
    CR: ComposeRequest + Clone,
    Upstream: SendRequest<CR> + Send + Sync,
{
    async fn get_response_impl(&mut self) -> Result<Message, Error> {
        let Some(key) = Key::for_request(&self.request_msg) else {
            trace!("request not cacheable, passing through");
            let mut request =
                self.upstream.send_request(self.request_msg.clone());
            return request.get_response().await;
        };

        if let Some(response) = self.lookup(&key).await {
            trace!("cache hit for {} {}", key.qname, key.qtype);
            return response;
        }

        let mut request = self.upstream.send_request(self.request_msg.clone());
        let response = request.get_response().await;
        let lifetime = lifetime(&response, &self.config);
        if lifetime.is_zero() {
            trace!("not caching response for {} {}", key.qname, key.qtype);
        } else {
            trace!(
                "caching response for {} {} for {}s",
                key.qname,
                key.qtype,
                lifetime.as_secs()
            );
            let entry = Entry::new(response.clone(), lifetime);
            self.cache.insert(key, Arc::new(entry)).await;
        }
        response
    }

    /// Finds an unexpired entry usable for the request.
    async fn lookup(&self, key: &Key) -> Option<Result<Message, Error>> {
        for (candidate, adjust) in key.candidates() {
            let Some(entry) = self.cache.get(&candidate).await else {
                continue;
            };
            match entry.serve(&self.request_msg, adjust) {
                Some(response) => return Some(response),
                None => self.cache.invalidate(&candidate).await,
            }
        }
        None
    }
}

impl<CR, Upstream> Debug for Request<CR, Upstream> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("Request")
            .field("config", &self.config)
            .finish()
    }
}

impl<CR, Upstream> GetResponse for Request<CR, Upstream>
where
    CR: ComposeRequest + Clone,
    Upstream: SendRequest<CR> + Send + Sync,
{
    fn get_response(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + '_>>
    {
        Box::pin(self.get_response_impl())
    }
}

//------------ Key ------------------------------------------------------------

/// What a response is cached under.
///
/// Names compare case-insensitively, so `WWW.example.` and `www.example.`
/// share an entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Key {
    qname: Name,
    qclass: Class,
    qtype: Rtype,
    cd: bool,
    dnssec_ok: bool,
    rd: bool,
}

impl Key {
    /// Returns the key for a request or `None` if it can't be cached.
    ///
    /// Only standard queries for a single question in class IN are.
    fn for_request(request: &impl ComposeRequest) -> Option<Self> {
        let header = request.header();
        let question = request.question()?;
        if header.opcode() != 0 || question.qclass() != Class::IN {
            return None;
        }
        Some(Key {
            qname: question.qname().clone(),
            qclass: question.qclass(),
            qtype: question.qtype(),
            cd: header.cd(),
            dnssec_ok: request.dnssec_ok(),
            rd: header.rd(),
        })
    }

    /// Returns the keys whose entries can answer this key's request.
    ///
    /// The exact key comes first.
    fn candidates(&self) -> Vec<(Key, Adjust)> {
        let mut res = vec![(self.clone(), Adjust::default())];
        // A response to a DO request for a DNSSEC type without the
        // DNSSEC records would be empty.
        let strip = !self.dnssec_ok && !self.qtype.is_dnssec();
        if !self.rd {
            res.push((
                Key {
                    rd: true,
                    ..self.clone()
                },
                Adjust {
                    clear_rd: true,
                    strip_dnssec: false,
                },
            ));
        }
        if strip {
            res.push((
                Key {
                    dnssec_ok: true,
                    ..self.clone()
                },
                Adjust {
                    clear_rd: false,
                    strip_dnssec: true,
                },
            ));
        }
        if strip && !self.rd {
            res.push((
                Key {
                    rd: true,
                    dnssec_ok: true,
                    ..self.clone()
                },
                Adjust {
                    clear_rd: true,
                    strip_dnssec: true,
                },
            ));
        }
        res
    }
}

/// Changes needed to serve an entry stored under a different key.
#[derive(Clone, Copy, Debug, Default)]
struct Adjust {
    clear_rd: bool,
    strip_dnssec: bool,
}

//------------ Entry ----------------------------------------------------------

/// A cached response.
#[derive(Debug)]
struct Entry {
    stored: Instant,
    lifetime: Duration,
    response: Result<Message, Error>,
}

impl Entry {
    fn new(mut response: Result<Message, Error>, lifetime: Duration) -> Self {
        // Whatever comes out of the cache is not authoritative.
        if let Ok(msg) = response.as_mut() {
            msg.header_mut().set_aa(false);
        }
        Entry {
            stored: Instant::now(),
            lifetime,
            response,
        }
    }

    /// Produces the response to `request` or `None` if the entry expired.
    fn serve(
        &self,
        request: &impl ComposeRequest,
        adjust: Adjust,
    ) -> Option<Result<Message, Error>> {
        let age = self.stored.elapsed();
        if age > self.lifetime {
            return None;
        }
        let cached = match &self.response {
            Ok(msg) => msg,
            Err(err) => return Some(Err(err.clone())),
        };

        let header = request.header();
        let mut msg = Message::new();
        *msg.header_mut() = cached.header();
        msg.header_mut().set_id(header.id());
        if adjust.clear_rd {
            msg.header_mut().set_rd(false);
        }
        match request.question() {
            Some(question) => msg.push_question(question.clone()),
            None => {
                for question in cached.questions() {
                    msg.push_question(question.clone())
                }
            }
        }
        for section in Section::ALL {
            *msg.section_mut(section) = cached.section(section).to_vec();
        }
        msg.set_opt(cached.opt().cloned());
        if adjust.strip_dnssec {
            msg.strip_dnssec_records();
            if let Some(opt) = msg.opt_mut() {
                opt.set_dnssec_ok(false);
            }
        }
        msg.decrement_ttl(age);
        Some(Ok(msg))
    }
}

//------------ Lifetime -------------------------------------------------------

/// Returns how long a response may be cached.
///
/// Zero means not at all.
fn lifetime(response: &Result<Message, Error>, config: &Config) -> Duration {
    let msg = match response {
        Ok(msg) => msg,
        Err(_) => return config.transport_failure_duration,
    };
    // A retry over a stream transport may get the complete message.
    if msg.header().tc() {
        return Duration::ZERO;
    }
    let cap = match Kind::of(msg) {
        Kind::Answer | Kind::Referral => config.max_validity,
        Kind::NoData => min(config.max_validity, config.max_nodata_validity),
        Kind::NxDomain => {
            min(config.max_validity, config.max_nxdomain_validity)
        }
        Kind::Failure => config.misc_error_duration,
        Kind::Unusable => return Duration::ZERO,
    };
    // For negative responses, min_ttl honours the SOA minimum (RFC 2308).
    match msg.min_ttl() {
        Some(ttl) => min(cap, ttl.into_duration()),
        None => cap,
    }
}

/// The rough shape of a response as far as caching is concerned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    Answer,
    NoData,
    NxDomain,
    Referral,
    Failure,
    Unusable,
}

impl Kind {
    fn of(msg: &Message) -> Self {
        match msg.rcode() {
            Rcode::NOERROR => {}
            Rcode::NXDOMAIN => return Kind::NxDomain,
            _ => return Kind::Failure,
        }
        if msg.sole_question().is_none() {
            return Kind::Unusable;
        }
        if !msg.answer().is_empty() {
            return Kind::Answer;
        }
        let authority = msg.authority();
        if authority.iter().any(|rr| rr.rtype() == Rtype::SOA) {
            Kind::NoData
        } else if authority.iter().any(|rr| rr.rtype() == Rtype::NS) {
            Kind::Referral
        } else {
            Kind::Unusable
        }
    }
}

//============ Tests =========================================================
