//! DNSSEC validation.
//!
//! DNSSEC validation requires a trust anchor. A trust anchor can be
//! created using [anchor::TrustAnchors].
//! The trust anchor is then used, together with a [crate::net::client]
//! transport and optionally a [context::Config] to create a DNSSEC
//! validation [context::ValidationContext].
//! The validation context then provides the
//! method [context::ValidationContext::validate_msg()] to validate a
//! reply message.
//!
//! Most applications don't call the validator directly but put the
//! [validating transport][crate::net::client::validator] in front of
//! their upstream.
//!
//! Example:
//! ```no_run
//! # use valstub::base::{Message, Name, Question, Rtype};
//! # use valstub::net::client::request::{RequestMessage, SendRequest};
//! # use valstub::validator::anchor::TrustAnchors;
//! # use valstub::validator::context::{Config, ValidationContext};
//! # use std::str::FromStr;
//! #
//! # async fn f<Upstream>(upstream: Upstream)
//! # where Upstream: SendRequest<RequestMessage> + Clone + Send + Sync {
//!     let qname = Name::from_str("example.com.").unwrap();
//!     let msg = Message::query(Question::new_in(qname, Rtype::AAAA), true);
//!
//!     // Send a query message.
//!     let mut request = upstream.send_request(RequestMessage::new(msg));
//!
//!     // Get the reply
//!     let reply = request.get_response().await.unwrap();
//!
//!     let ta = TrustAnchors::from_u8(b". 172800 IN DNSKEY 257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU= ;{id = 20326 (ksk), size = 2048b}").unwrap();
//!     let mut conf = Config::new();
//!     conf.set_nsec3_iter_insecure(50);
//!     let vc = ValidationContext::with_config(ta, upstream, conf);
//!     let res = vc.validate_msg(&reply).await;
//!
//!     println!("Validation result: {}", res.result());
//! # }
//! ```

pub mod anchor;
pub mod base;
pub mod context;
mod group;
mod nsec;
pub mod response;
pub mod types;
mod utilities;

#[cfg(test)]
pub(crate) mod test_util;
