#![allow(dead_code)]

use axum::http::{header, HeaderMap, HeaderValue};
use bytes::Bytes;

pub const BOUNDARY: &str = "X-DRIVE-BOUNDARY";

/// multipart/form-data body with one file field per `(filename, data)`
pub fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// plain (non-file) form field, to be spliced in front of a body
pub fn text_field(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
    .into_bytes()
}

pub fn content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn multipart_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type()).unwrap(),
    );
    headers
}

/// split `body` into chunks of `size` bytes, the way a socket would deliver it
pub fn chunked(body: Vec<u8>, size: usize) -> Vec<Result<Bytes, std::io::Error>> {
    body.chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}
