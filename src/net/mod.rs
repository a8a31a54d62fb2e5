//! Sending and receiving DNS messages.
//!
//! Only the client side exists: the [`client`] module provides the
//! transports a stub resolver stacks on top of its upstream.

pub mod client;
