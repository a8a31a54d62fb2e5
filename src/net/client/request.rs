//! Constructing and sending requests.
//!
//! A transport is anything that implements [SendRequest]. Sending a
//! request returns a [GetResponse] object from which the response can be
//! awaited. Transports can be stacked: the
//! [validator][crate::net::client::validator] and the
//! [cache][crate::net::client::cache] both wrap an upstream transport and
//! are transports themselves.

#![warn(missing_docs)]

use std::boxed::Box;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::{error, fmt, io};

use crate::base::{Header, Message, Question};

//------------ ComposeRequest ------------------------------------------------

/// A trait that allows composing a request as a series.
pub trait ComposeRequest: Debug + Send + Sync {
    /// Create a message that captures the recorded changes.
    fn to_message(&self) -> Message;

    /// Return the header of the request.
    fn header(&self) -> Header;

    /// Return a reference to a mutable Header to record changes to the header.
    fn header_mut(&mut self) -> &mut Header;

    /// Return the question of the request if it has exactly one.
    fn question(&self) -> Option<&Question>;

    /// Return whether the DO bit is set in the request.
    fn dnssec_ok(&self) -> bool;

    /// Set or clear the DO bit.
    ///
    /// Setting the bit adds EDNS data to the request if it had none.
    fn set_dnssec_ok(&mut self, value: bool);
}

//------------ SendRequest ---------------------------------------------------

/// Trait for starting a DNS request based on a request composer.
///
/// In the future, the return type of request should become an associated
/// type. However, the use of `dyn GetResponse` in stacked transports
/// currently prevents that.
pub trait SendRequest<CR> {
    /// Request function that takes a ComposeRequest type.
    fn send_request(&self, request_msg: CR) -> Box<dyn GetResponse + Send + Sync>;
}

impl<CR, T: SendRequest<CR> + ?Sized> SendRequest<CR> for Arc<T> {
    fn send_request(&self, request_msg: CR) -> Box<dyn GetResponse + Send + Sync> {
        (**self).send_request(request_msg)
    }
}

//------------ GetResponse ---------------------------------------------------

/// Trait for getting the result of a DNS query.
///
/// In the future, the return type of get_response should become an
/// associated type. However, too many uses of `dyn GetResponse` currently
/// prevent that.
pub trait GetResponse: Debug {
    /// Get the result of a DNS request.
    ///
    /// This function is intended to be cancel safe.
    fn get_response(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + '_>>;
}

//------------ RequestMessage ------------------------------------------------

/// Object that implements the [ComposeRequest] trait for a [Message].
#[derive(Clone, Debug)]
pub struct RequestMessage {
    /// Base message.
    msg: Message,
}

impl RequestMessage {
    /// Create a new request from a message.
    pub fn new(msg: impl Into<Message>) -> Self {
        Self { msg: msg.into() }
    }

    /// Return the message of the request.
    pub fn message(&self) -> &Message {
        &self.msg
    }
}

impl From<Message> for RequestMessage {
    fn from(msg: Message) -> Self {
        Self::new(msg)
    }
}

impl ComposeRequest for RequestMessage {
    fn to_message(&self) -> Message {
        self.msg.clone()
    }

    fn header(&self) -> Header {
        self.msg.header()
    }

    fn header_mut(&mut self) -> &mut Header {
        self.msg.header_mut()
    }

    fn question(&self) -> Option<&Question> {
        self.msg.sole_question()
    }

    fn dnssec_ok(&self) -> bool {
        self.msg.dnssec_ok()
    }

    fn set_dnssec_ok(&mut self, value: bool) {
        self.msg.set_dnssec_ok(value)
    }
}

//------------ Error ---------------------------------------------------------

/// Error type for client transports.
#[derive(Clone, Debug)]
pub enum Error {
    /// Connection was already closed.
    ConnectionClosed,

    /// The request was malformed.
    FormError,

    /// An I/O error in the underlying transport.
    Io(Arc<io::Error>),

    /// No transport available to transmit request.
    NoTransportAvailable,

    /// Timeout waiting for a response.
    Timeout,

    /// Reply does not match the query.
    WrongReplyForQuery,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::FormError => write!(f, "malformed request"),
            Error::Io(_) => write!(f, "I/O error"),
            Error::NoTransportAvailable => {
                write!(f, "no transport available")
            }
            Error::Timeout => write!(f, "timeout waiting for response"),
            Error::WrongReplyForQuery => {
                write!(f, "reply does not match query")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::ConnectionClosed
            | Error::FormError
            | Error::NoTransportAvailable
            | Error::Timeout
            | Error::WrongReplyForQuery => None,
        }
    }
}

//============ Tests =========================================================
