//! Sending requests and receiving responses.
//!
//! This module provides the transports of the stub resolver. A transport
//! implements the [SendRequest][request::SendRequest] trait: it takes a
//! request and returns an object from which the response can later be
//! collected. Transports are meant to be stacked. The bottom of the stack
//! is whatever actually talks to the network and is provided by the user.
//! On top of that, the crate offers two transports:
//!
//! * [validator] validates responses and turns bogus ones into SERVFAIL,
//! * [cache] caches responses for the time their TTLs allow.
//!
//! A typical stack puts the cache in front of the validator so that
//! validation only happens once per response:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use valstub::base::{Name, Rtype};
//! # use valstub::net::client::{cache, validator};
//! # use valstub::net::client::request::{RequestMessage, SendRequest};
//! # use valstub::validator::anchor::TrustAnchors;
//! # use valstub::validator::context::ValidationContext;
//! # use std::str::FromStr;
//! #
//! # async fn f<Upstream>(upstream: Upstream, ta: TrustAnchors)
//! # where
//! #     Upstream: SendRequest<RequestMessage> + Clone + Send + Sync + 'static
//! # {
//! let vc = Arc::new(ValidationContext::new(ta, upstream.clone()));
//! let validating = validator::Connection::new(upstream, vc.clone());
//! let caching = cache::Connection::new(validating);
//!
//! let msg = valstub::base::Message::query(
//!     valstub::base::Question::new_in(
//!         Name::from_str("www.example.com.").unwrap(),
//!         Rtype::AAAA,
//!     ),
//!     false,
//! );
//! let mut request = caching.send_request(RequestMessage::new(msg));
//! let response = request.get_response().await.unwrap();
//! println!("AD: {}", response.header().ad());
//! # }
//! ```

pub mod cache;
pub mod request;
pub mod validator;

mod validator_test;
