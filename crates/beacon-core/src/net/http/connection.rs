use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

use super::{
    Error,
    HttpResult,
    headers::{
        HttpMethod,
        ResponseHeaders,
        TargetWriter as _,
        find_content_length,
        parse_request_line,
        read_heading,
    },
};

/// Largest request line plus headers
pub const HEADER_BUFFER_SIZE: usize = 1024;
/// Largest accepted request body
pub const BODY_BUFFER_SIZE: usize = 1024;
/// Longest accepted request target, query included
pub const PATH_SIZE: usize = 128;

const BODY_RX_CHUNK_SIZE: usize = 256;
const STREAM_CHUNK_SIZE: usize = 512;

/// HTTP connection context
pub struct HttpConnection<S> {
    method: HttpMethod,
    path: String<PATH_SIZE>,

    stream: S,
    content_length: usize,
    header_end: usize,
    header_buf: Vec<u8, HEADER_BUFFER_SIZE>,
    body_buf: Vec<u8, BODY_BUFFER_SIZE>,
}

impl<S: Read + Write> HttpConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            method: HttpMethod::Get,
            path: String::new(),
            stream,
            content_length: 0,
            header_end: 0,
            header_buf: Vec::new(),
            body_buf: Vec::new(),
        }
    }

    /// Read the request line and headers.
    ///
    /// [`Error::NoData`] means the peer closed the connection without sending
    /// a request, which deserves no response.
    pub async fn read_request(&mut self) -> HttpResult {
        self.header_buf.clear();
        self.header_buf
            .resize(HEADER_BUFFER_SIZE, 0)
            .map_err(|_| Error::TooLarge)?;
        let (header_end, header_len) =
            read_heading(self.header_buf.as_mut_slice(), &mut self.stream).await?;
        self.header_buf.truncate(header_len);
        if header_len == 0 {
            return Err(Error::NoData);
        }

        // Only parse the headers portion, the rest may be body data
        let header_str =
            core::str::from_utf8(&self.header_buf[..header_end]).map_err(|_| Error::Parse)?;
        let (method, raw_path, rest_headers) =
            parse_request_line(header_str).ok_or(Error::Parse)?;
        let content_length = find_content_length(rest_headers)?.unwrap_or(0);

        self.path.clear();
        self.path.push_str(raw_path).map_err(|_| Error::TooLarge)?;
        self.method = method;
        self.content_length = content_length;
        self.header_end = header_end;
        Ok(())
    }

    /// Request method and path, without the query string.
    pub fn route(&self) -> (HttpMethod, &str) {
        let path = self.path.as_str();
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        (self.method, path)
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Read the whole request body.
    pub async fn read_body(&mut self) -> Result<&[u8], Error> {
        if self.content_length == 0 {
            return Err(Error::NoData);
        }
        if self.content_length > BODY_BUFFER_SIZE {
            return Err(Error::TooLarge);
        }

        self.body_buf.clear();
        if self.header_buf.len() > self.header_end {
            let tail = &self.header_buf[self.header_end..];
            let tail = &tail[..tail.len().min(self.content_length)];
            self.body_buf
                .extend_from_slice(tail)
                .map_err(|_| Error::TooLarge)?;
        }

        while self.body_buf.len() < self.content_length {
            let mut buf = [0u8; BODY_RX_CHUNK_SIZE];
            let wanted = (self.content_length - self.body_buf.len()).min(buf.len());
            let n = self
                .stream
                .read(&mut buf[..wanted])
                .await
                .map_err(Error::io)?;
            if n == 0 {
                return Err(Error::Closed);
            }
            self.body_buf
                .extend_from_slice(&buf[..n])
                .map_err(|_| Error::TooLarge)?;
        }

        Ok(self.body_buf.as_slice())
    }

    /// Write the headers to the connection
    pub async fn write_headers(&mut self, headers: &ResponseHeaders) -> HttpResult {
        let mut head = String::<256>::new();
        headers.write_to(&mut head)?;
        self.write_all(head.as_bytes()).await
    }

    /// Write the body to the connection
    pub async fn write_body(&mut self, body: &[u8]) -> HttpResult {
        for chunk in body.chunks(STREAM_CHUNK_SIZE) {
            self.write_all(chunk).await?;
        }
        Ok(())
    }

    /// Write a complete response.
    ///
    /// `body` is sent as-is, its length has to match the content headers.
    pub async fn write_response(&mut self, headers: &ResponseHeaders, body: &[u8]) -> HttpResult {
        self.write_headers(headers).await?;
        self.write_body(body).await?;
        self.flush().await
    }

    pub async fn flush(&mut self) -> HttpResult {
        self.stream.flush().await.map_err(Error::io)
    }

    async fn write_all(&mut self, buf: &[u8]) -> HttpResult {
        self.stream.write_all(buf).await.map_err(Error::io)
    }
}
