//! Minimal HTTP/1.1 server side over any `embedded-io-async` stream.
//!
//! One request per connection, always answered with `Connection: close`.

mod connection;
pub mod form;
mod headers;
mod server;

pub use connection::{BODY_BUFFER_SIZE, HEADER_BUFFER_SIZE, HttpConnection, PATH_SIZE};
pub use headers::{ContentHeaders, ContentType, HttpMethod, ResponseHeaders, StatusCode, TextEncoding};
pub use server::{HttpHandler, serve_connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peer closed the connection early
    Closed,
    Parse,
    /// Request line, headers or body exceed their buffer
    TooLarge,
    NoData,
    FormatHeaders,
    Io(embedded_io::ErrorKind),
}

impl Error {
    /// Whether the request was malformed, as opposed to the connection
    /// failing.
    pub fn is_bad_request(self) -> bool {
        matches!(self, Error::Parse | Error::TooLarge | Error::NoData)
    }

    pub(crate) fn io<E: embedded_io::Error>(error: E) -> Self {
        match error.kind() {
            embedded_io::ErrorKind::ConnectionReset
            | embedded_io::ErrorKind::ConnectionAborted
            | embedded_io::ErrorKind::BrokenPipe => Error::Closed,
            kind => Error::Io(kind),
        }
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_error: core::fmt::Error) -> Self {
        Error::FormatHeaders
    }
}

pub type HttpResult = Result<(), Error>;
