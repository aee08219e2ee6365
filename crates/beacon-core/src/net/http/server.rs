use embedded_io_async::{Read, Write};

use super::{
    Error,
    HttpResult,
    connection::HttpConnection,
    headers::{ContentHeaders, ContentType, ResponseHeaders},
};

const BAD_REQUEST_BODY: &[u8] = b"Bad Request\n";

#[allow(async_fn_in_trait)]
pub trait HttpHandler {
    /// Answer a request whose line and headers have been read.
    async fn handle_request<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult;
}

/// Serve a single request on an accepted stream.
///
/// Malformed requests are answered with `400` without reaching the handler;
/// a connection closed before sending anything gets no response at all.
/// Closing the stream is left to the caller.
pub async fn serve_connection<H: HttpHandler, S: Read + Write>(handler: &H, stream: S) -> HttpResult {
    let mut conn = HttpConnection::new(stream);
    match conn.read_request().await {
        Ok(()) => {}
        Err(Error::NoData) => return Ok(()),
        Err(e) if e.is_bad_request() => {
            log::debug!("http_server: rejecting request: {:?}", e);
            let headers = ResponseHeaders::bad_request()
                .with_content(ContentHeaders::for_body(ContentType::TextPlain, BAD_REQUEST_BODY));
            return conn.write_response(&headers, BAD_REQUEST_BODY).await;
        }
        Err(e) => return Err(e),
    }

    let (method, path) = conn.route();
    log::debug!("http_server: {} {}", method.as_str(), path);
    handler.handle_request(&mut conn).await
}
