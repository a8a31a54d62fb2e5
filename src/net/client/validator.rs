//! A DNSSEC validating transport.
//!
//! This module implements a pass-through transport that validates the
//! responses it gets from its upstream. Responses that validate as secure
//! are returned with the AD flag set, insecure and indeterminate responses
//! are returned as they are but with AD clear. Bogus responses never reach
//! the caller: they are replaced by a SERVFAIL response that carries an
//! Extended DNS Error explaining what went wrong.
//!
//! Requests with the CD flag set are passed upstream without validation.
//!
//! Validation needs DNSKEY and DS records and sometimes NSEC or NSEC3
//! records that are not part of the response. These are fetched through
//! the upstream of the [ValidationContext], which may or may not be the
//! same transport as the one used for the actual requests.

#![warn(missing_docs)]

use std::boxed::Box;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, trace};

use crate::base::iana::{ExtendedErrorCode, Rcode, Rtype};
use crate::base::opt::ExtendedError;
use crate::base::{Message, Name, Question};
use crate::net::client::request::{
    ComposeRequest, Error, GetResponse, RequestMessage, SendRequest,
};
use crate::utils::config::DefMinMax;
use crate::validator::context::ValidationContext;
use crate::validator::types::ValidationState;

//------------ Config ---------------------------------------------------------

/// Limit on the time to wait for the upstream response to a request.
///
/// On-demand lookups done during validation have their own limit in the
/// validation context.
const RESPONSE_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(10),
    Duration::from_millis(100),
    Duration::from_secs(120),
);

/// Configuration of a validating transport.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "kebab-case")
)]
pub struct Config {
    /// Time to wait for the upstream response.
    response_timeout: Duration,
}

impl Config {
    /// Creates a new config with default values.
    ///
    /// The default values are documented at the relevant set_* methods.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the time to wait for the upstream response.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Sets the time to wait for the upstream response.
    ///
    /// The value has to be at least 100 milliseconds, at most two minutes
    /// and the default is 10 seconds.
    pub fn set_response_timeout(&mut self, value: Duration) {
        self.response_timeout = RESPONSE_TIMEOUT.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_timeout: RESPONSE_TIMEOUT.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// A connection that validates responses from an upstream connection.
#[derive(Clone)]
pub struct Connection<Upstream, VCUpstream = Upstream> {
    /// Upstream transport to use for requests.
    upstream: Upstream,

    /// The validation context shared by all requests.
    vc: Arc<ValidationContext<VCUpstream>>,

    /// The configuration of this connection.
    config: Config,
}

impl<Upstream, VCUpstream> Connection<Upstream, VCUpstream> {
    /// Create a new connection with default configuration parameters.
    ///
    /// Note that Upstream needs to implement [SendRequest]
    /// (and Clone/Send/Sync) to be useful.
    pub fn new(
        upstream: Upstream,
        vc: Arc<ValidationContext<VCUpstream>>,
    ) -> Self {
        Self::with_config(upstream, vc, Default::default())
    }

    /// Create a new connection with specified configuration parameters.
    pub fn with_config(
        upstream: Upstream,
        vc: Arc<ValidationContext<VCUpstream>>,
        config: Config,
    ) -> Self {
        Self {
            upstream,
            vc,
            config,
        }
    }

    /// Returns the validation context of this connection.
    pub fn context(&self) -> &ValidationContext<VCUpstream> {
        &self.vc
    }
}

impl<Upstream, VCUpstream> Connection<Upstream, VCUpstream>
where
    Upstream: Clone + SendRequest<RequestMessage> + Send + Sync + 'static,
    VCUpstream: SendRequest<RequestMessage> + Send + Sync + 'static,
{
    /// Resolves a name and type in the IN class.
    ///
    /// The request doesn't ask for DNSSEC records, so the response
    /// contains no RRSIG, NSEC or NSEC3 records. It has AD set if it
    /// validated as secure.
    pub async fn resolve(
        &self,
        qname: Name,
        qtype: Rtype,
    ) -> Result<Message, Error> {
        let msg = Message::query(Question::new_in(qname, qtype), false);
        let mut request = self.send_request(RequestMessage::new(msg));
        request.get_response().await
    }
}

impl<Upstream, VCUpstream> Debug for Connection<Upstream, VCUpstream> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("Connection")
            .field("vc", &self.vc)
            .field("config", &self.config)
            .finish()
    }
}

//------------ SendRequest ----------------------------------------------------

impl<CR, Upstream, VCUpstream> SendRequest<CR>
    for Connection<Upstream, VCUpstream>
where
    CR: ComposeRequest + Clone + 'static,
    Upstream: Clone + SendRequest<CR> + Send + Sync + 'static,
    VCUpstream: SendRequest<RequestMessage> + Send + Sync + 'static,
{
    fn send_request(
        &self,
        request_msg: CR,
    ) -> Box<dyn GetResponse + Send + Sync> {
        Box::new(Request::new(
            request_msg,
            self.upstream.clone(),
            self.vc.clone(),
            self.config.clone(),
        ))
    }
}

//------------ Request --------------------------------------------------------

/// The state of a request that is executed.
pub struct Request<CR, Upstream, VCUpstream> {
    /// The request message.
    request_msg: CR,

    /// The upstream transport of the connection.
    upstream: Upstream,

    /// The validation context.
    vc: Arc<ValidationContext<VCUpstream>>,

    /// The configuration of the connection.
    config: Config,
}

impl<CR, Upstream, VCUpstream> Request<CR, Upstream, VCUpstream>
where
    CR: ComposeRequest + Clone,
    Upstream: SendRequest<CR> + Send + Sync,
    VCUpstream: SendRequest<RequestMessage> + Send + Sync,
{
    /// Create a new Request object.
    fn new(
        request_msg: CR,
        upstream: Upstream,
        vc: Arc<ValidationContext<VCUpstream>>,
        config: Config,
    ) -> Self {
        Self {
            request_msg,
            upstream,
            vc,
            config,
        }
    }

    /// This is the implementation of the get_response method.
    ///
    /// This function is not cancel safe.
    async fn get_response_impl(&mut self) -> Result<Message, Error> {
        let header = self.request_msg.header();
        let dnssec_ok = self.request_msg.dnssec_ok();

        if header.cd() {
            // Checking disabled: the client validates itself. The
            // upstream's opinion on authenticity is of no interest.
            trace!("CD set, not validating");
            let mut request =
                self.upstream.send_request(self.request_msg.clone());
            let mut response = request.get_response().await?;
            response.header_mut().set_ad(false);
            return Ok(response);
        }

        // Signatures and proofs are needed even if the client doesn't
        // want to see them.
        let mut upstream_msg = self.request_msg.clone();
        upstream_msg.set_dnssec_ok(true);
        let mut request = self.upstream.send_request(upstream_msg);
        let response =
            match timeout(self.config.response_timeout, request.get_response())
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    debug!("upstream request failed: {}", err);
                    return Ok(self.servfail(ExtendedError::new(
                        ExtendedErrorCode::NETWORK_ERROR,
                        Some(err.to_string()),
                    )));
                }
                Err(_) => {
                    debug!("upstream request timed out");
                    return Ok(self.servfail(ExtendedError::new(
                        ExtendedErrorCode::NETWORK_ERROR,
                        Some(Error::Timeout.to_string()),
                    )));
                }
            };

        let validated = self.vc.validate_msg(&response).await;
        let state = validated.state();
        debug!(
            "{} response validated as {}",
            validated.shape(),
            validated.result()
        );

        let mut response = match state {
            ValidationState::Secure => {
                let mut msg =
                    validated.into_secure_message().unwrap_or(response);
                msg.header_mut().set_ad(true);
                msg
            }
            ValidationState::Insecure => {
                let mut msg = response;
                msg.header_mut().set_ad(false);
                msg
            }
            ValidationState::Indeterminate => {
                let ede = validated.ede().cloned().unwrap_or_else(|| {
                    ExtendedErrorCode::DNSSEC_INDETERMINATE.into()
                });
                let mut msg = response;
                msg.header_mut().set_ad(false);
                msg.push_extended_error(ede);
                msg
            }
            ValidationState::Bogus => {
                let ede = validated
                    .ede()
                    .cloned()
                    .unwrap_or_else(|| ExtendedErrorCode::DNSSEC_BOGUS.into());
                return Ok(self.servfail(ede));
            }
        };

        if !dnssec_ok {
            response.strip_dnssec_records();
            if let Some(opt) = response.opt_mut() {
                opt.set_dnssec_ok(false);
            }
        }
        Ok(response)
    }

    /// Creates a SERVFAIL response to the request.
    ///
    /// The response has the question of the request, empty sections, and
    /// the extended error.
    fn servfail(&self, ede: ExtendedError) -> Message {
        trace!("returning SERVFAIL: {}", ede);
        let mut msg = Message::start_response(&self.request_msg.to_message());
        msg.header_mut().set_ra(true);
        msg.header_mut().set_rcode(Rcode::SERVFAIL);
        msg.push_extended_error(ede);
        msg
    }
}

impl<CR, Upstream, VCUpstream> Debug for Request<CR, Upstream, VCUpstream> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("Request")
            .field("fut", &format_args!("_"))
            .finish()
    }
}

impl<CR, Upstream, VCUpstream> GetResponse for Request<CR, Upstream, VCUpstream>
where
    CR: ComposeRequest + Clone,
    Upstream: SendRequest<CR> + Send + Sync,
    VCUpstream: SendRequest<RequestMessage> + Send + Sync,
{
    fn get_response(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + '_>>
    {
        Box::pin(self.get_response_impl())
    }
}
