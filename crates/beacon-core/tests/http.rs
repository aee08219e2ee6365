//! Integration tests for the HTTP connection layer and form decoding.

mod common;

use beacon_core::net::http::{
    ContentHeaders,
    ContentType,
    Error,
    HttpConnection,
    HttpHandler,
    HttpMethod,
    HttpResult,
    ResponseHeaders,
    form::{self, FormError},
    serve_connection,
};
use common::{MockStream, Response};
use embassy_futures::block_on;
use embedded_io_async::{Read, Write};

// -----------------------------------------------------------------------------
// Request parsing
// -----------------------------------------------------------------------------

#[test]
fn reads_request_line_and_body() {
    let raw = b"POST /admin/save.htm?x=1 HTTP/1.1\r\nHost: 10.42.42.1\r\ncontent-length: 9\r\n\r\nprefix=%2F";
    let mut conn = HttpConnection::new(MockStream::new(raw).with_chunk(7));

    block_on(conn.read_request()).unwrap();
    assert_eq!(conn.route(), (HttpMethod::Post, "/admin/save.htm"));
    assert_eq!(conn.content_length(), 9);
    assert_eq!(block_on(conn.read_body()).unwrap(), b"prefix=%2");
}

#[test]
fn empty_connection_reports_no_data() {
    let mut conn = HttpConnection::new(MockStream::new(b""));

    assert_eq!(block_on(conn.read_request()), Err(Error::NoData));
}

#[test]
fn malformed_request_lines_are_rejected() {
    for raw in [
        &b"GARBAGE\r\n\r\n"[..],
        b"GET\r\n\r\n",
        b"GET relative HTTP/1.1\r\n\r\n",
        b"FETCH / HTTP/1.1\r\n\r\n",
        b"GET / SPDY/3\r\n\r\n",
        b"GET / HTTP/1.1\r\nContent-Length: lots\r\n\r\n",
    ] {
        let mut conn = HttpConnection::new(MockStream::new(raw));
        assert_eq!(block_on(conn.read_request()), Err(Error::Parse), "{raw:?}");
    }
}

#[test]
fn oversized_requests_are_rejected() {
    let long_path = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(200));
    let mut conn = HttpConnection::new(MockStream::new(long_path.as_bytes()));
    assert_eq!(block_on(conn.read_request()), Err(Error::TooLarge));

    let long_headers = format!("GET / HTTP/1.1\r\nX-Fill: {}\r\n\r\n", "a".repeat(1100));
    let mut conn = HttpConnection::new(MockStream::new(long_headers.as_bytes()));
    assert_eq!(block_on(conn.read_request()), Err(Error::TooLarge));

    let big_body = b"POST / HTTP/1.1\r\nContent-Length: 5000\r\n\r\n";
    let mut conn = HttpConnection::new(MockStream::new(big_body));
    block_on(conn.read_request()).unwrap();
    assert_eq!(block_on(conn.read_body()).err(), Some(Error::TooLarge));
}

#[test]
fn body_cut_short_reports_closed() {
    let raw = b"POST / HTTP/1.1\r\nContent-Length: 20\r\n\r\nshort";
    let mut conn = HttpConnection::new(MockStream::new(raw));

    block_on(conn.read_request()).unwrap();
    assert_eq!(block_on(conn.read_body()).err(), Some(Error::Closed));
}

// -----------------------------------------------------------------------------
// Responses
// -----------------------------------------------------------------------------

#[test]
fn writes_response_with_length_and_close() {
    let mut stream = MockStream::new(b"");
    let body = b"body { color: red }";
    let headers =
        ResponseHeaders::success().with_content(ContentHeaders::for_body(ContentType::TextCss, body));

    block_on(HttpConnection::new(&mut stream).write_response(&headers, body)).unwrap();

    assert_eq!(stream.flushes, 1);
    let response = Response::parse(&stream.output);
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/css"));
    assert_eq!(response.header("content-length"), Some("19"));
    assert_eq!(response.header("connection"), Some("close"));
    assert_eq!(response.body, "body { color: red }");
}

/// Handler that echoes the route back.
struct Echo;

impl HttpHandler for Echo {
    async fn handle_request<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult {
        let (method, path) = conn.route();
        let text = format!("{} {}", method.as_str(), path);
        let headers = ResponseHeaders::success()
            .with_content(ContentHeaders::for_body(ContentType::TextPlain, text.as_bytes()));
        conn.write_response(&headers, text.as_bytes()).await
    }
}

fn serve(raw: &[u8]) -> Vec<u8> {
    let mut stream = MockStream::new(raw);
    block_on(serve_connection(&Echo, &mut stream)).unwrap();
    stream.output
}

#[test]
fn serve_connection_dispatches_to_handler() {
    let response = Response::parse(&serve(b"HEAD /hotspot-detect.html HTTP/1.0\r\n\r\n"));

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "HEAD /hotspot-detect.html");
}

#[test]
fn serve_connection_answers_bad_requests_with_400() {
    let response = Response::parse(&serve(b"NONSENSE\r\n\r\n"));

    assert_eq!(response.status, 400);
    assert_eq!(response.header("connection"), Some("close"));
}

#[test]
fn serve_connection_is_silent_on_empty_connection() {
    assert!(serve(b"").is_empty());
}

// -----------------------------------------------------------------------------
// Forms
// -----------------------------------------------------------------------------

#[test]
fn form_fields_are_decoded() {
    let body = "prefix=%2Fcfg%2F&title=Hello+there&message=caf%C3%A9&hidden";

    assert_eq!(form::field::<32>(body, "prefix").unwrap().unwrap().as_str(), "/cfg/");
    assert_eq!(form::field::<32>(body, "title").unwrap().unwrap().as_str(), "Hello there");
    assert_eq!(form::field::<32>(body, "message").unwrap().unwrap().as_str(), "café");
    assert_eq!(form::field::<32>(body, "hidden").unwrap().unwrap().as_str(), "");
    assert_eq!(form::field::<32>(body, "ssid").unwrap(), None);
}

#[test]
fn form_decoding_errors() {
    assert_eq!(form::decode::<8>("%G1"), Err(FormError::BadEscape));
    assert_eq!(form::decode::<8>("%4"), Err(FormError::BadEscape));
    assert_eq!(form::decode::<8>("%FF"), Err(FormError::InvalidUtf8));
    assert_eq!(form::decode::<4>("abcde"), Err(FormError::TooLong));
}
