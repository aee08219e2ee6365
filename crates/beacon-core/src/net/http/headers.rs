use core::fmt::Write;

use embedded_io_async::Read;

use super::Error;

pub type StatusCode = u16;

fn reason_phrase(code: StatusCode) -> &'static str {
    match code {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Request Entity Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// HTTP Content Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    TextHtml,
    TextCss,
    TextPlain,
}

impl ContentType {
    /// Convert the content type to a string.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::TextHtml => "text/html",
            ContentType::TextCss => "text/css",
            ContentType::TextPlain => "text/plain",
        }
    }
}

/// Text Encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
}

impl TextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
        }
    }
}

/// HTTP socket connection policy.
#[derive(Debug, Clone, Copy)]
enum ConnectionPolicy {
    Close,
}

impl ConnectionPolicy {
    fn as_str(self) -> &'static str {
        match self {
            ConnectionPolicy::Close => "close",
        }
    }
}

pub(super) trait TargetWriter {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error>;
}

/// HTTP Content Headers.
#[derive(Debug, Clone, Copy)]
pub struct ContentHeaders {
    content_type: ContentType,
    content_length: usize,
    text_encoding: Option<TextEncoding>,
}

impl ContentHeaders {
    pub const fn new(content_type: ContentType, length: usize) -> Self {
        Self {
            content_type,
            content_length: length,
            text_encoding: None,
        }
    }

    /// Content headers matching `body`.
    pub const fn for_body(content_type: ContentType, body: &[u8]) -> Self {
        Self::new(content_type, body.len())
    }

    /// Set the text encoding.
    #[must_use]
    pub const fn with_text_encoding(mut self, text_encoding: TextEncoding) -> Self {
        self.text_encoding = Some(text_encoding);
        self
    }
}

impl TargetWriter for ContentHeaders {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        write!(writer, "Content-Type: {}", self.content_type.as_str())?;
        if let Some(text_encoding) = self.text_encoding {
            write!(writer, "; charset={}", text_encoding.as_str())?;
        }
        write!(writer, "\r\n")?;
        write!(writer, "Content-Length: {}\r\n", self.content_length)
    }
}

/// Response Headers.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHeaders {
    status: StatusCode,
    connection: ConnectionPolicy,
    content: Option<ContentHeaders>,
    allow: Option<HttpMethod>,
}

impl ResponseHeaders {
    /// Create response headers with a status code and no content.
    pub const fn from_code(code: StatusCode) -> Self {
        Self {
            status: code,
            connection: ConnectionPolicy::Close,
            content: None,
            allow: None,
        }
    }

    pub const fn success() -> Self {
        Self::from_code(200)
    }

    pub const fn bad_request() -> Self {
        Self::from_code(400)
    }

    pub const fn not_found() -> Self {
        Self::from_code(404)
    }

    /// 405 naming the single accepted method.
    pub const fn method_not_allowed(allow: HttpMethod) -> Self {
        let mut headers = Self::from_code(405);
        headers.allow = Some(allow);
        headers
    }

    pub const fn conflict() -> Self {
        Self::from_code(409)
    }

    pub const fn internal_error() -> Self {
        Self::from_code(500)
    }

    /// Set the content headers.
    #[must_use]
    pub const fn with_content(mut self, content: ContentHeaders) -> Self {
        self.content = Some(content);
        self
    }
}

impl TargetWriter for ResponseHeaders {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        let reason = reason_phrase(self.status);
        write!(writer, "HTTP/1.1 {} {}\r\n", self.status, reason)?;
        if let Some(allow) = self.allow {
            write!(writer, "Allow: {}\r\n", allow.as_str())?;
        }
        match &self.content {
            Some(content) => content.write_to(writer)?,
            None => write!(writer, "Content-Length: 0\r\n")?,
        }
        write!(writer, "Connection: {}\r\n", self.connection.as_str())?;
        write!(writer, "\r\n")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub(super) fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// Parse the request line from the header string.
///
/// Returns the method, path, and rest of the header string.
pub(super) fn parse_request_line(header_str: &str) -> Option<(HttpMethod, &str, &str)> {
    let line_end = header_str.find("\r\n")?;
    let first_line = &header_str[..line_end];
    let mut parts = first_line.split_whitespace();
    let method = parts.next().and_then(HttpMethod::parse)?;
    let path = parts.next()?;
    if !path.starts_with('/') {
        return None;
    }
    match parts.next() {
        Some(version) if version.starts_with("HTTP/1.") => {}
        _ => return None,
    }

    Some((method, path, &header_str[line_end + 2..]))
}

/// Read the start line and headers from the stream.
///
/// Returns the position of the end of the headers and the number of bytes
/// read, which may include the start of the body. `(0, 0)` means the peer
/// closed the connection without sending anything.
pub(super) async fn read_heading<S: Read>(
    buf: &mut [u8],
    stream: &mut S,
) -> Result<(usize, usize), Error> {
    let mut header_len = 0;
    loop {
        if header_len >= buf.len() {
            return Err(Error::TooLarge);
        }
        let n = stream
            .read(&mut buf[header_len..])
            .await
            .map_err(Error::io)?;
        if n == 0 {
            return if header_len == 0 {
                Ok((0, 0))
            } else {
                Err(Error::Parse)
            };
        }
        // Terminator may straddle two reads
        let search_from = header_len.saturating_sub(3);
        header_len += n;
        if let Some(pos) = buf[search_from..header_len]
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
        {
            return Ok((search_from + pos + 4, header_len));
        }
    }
}

/// Find the content length in the header string.
///
/// `Ok(None)` when the header is absent, an error when it is malformed.
pub(super) fn find_content_length(header: &str) -> Result<Option<usize>, Error> {
    const TARGET: &str = "content-length:";
    for line in header.split("\r\n") {
        if let Some(value) = line
            .get(..TARGET.len())
            .filter(|name| name.eq_ignore_ascii_case(TARGET))
            .map(|_| &line[TARGET.len()..])
        {
            let value_str = value.trim();
            let length = value_str.parse::<usize>().map_err(|_| Error::Parse)?;
            return Ok(Some(length));
        }
    }
    Ok(None)
}
