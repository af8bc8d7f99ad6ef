//! The structured request template (spec §4.2): a byte-oriented record with
//! placeholder tokens, rendered to a wire-ready request just before it is sent.
//!
//! Headers and bodies are kept as raw bytes rather than `String` because several
//! catalog gadgets (see `catalog.rs`) inject bytes above 0x7F that are not valid
//! UTF-8 on their own (`ch\x96nked`, `Transf\x82r-Encoding`, a literal 0xFF).

use rand::Rng;

const RANDOM_TOKEN: &[u8] = b"__RANDOM__";
const REPLACE_CL_TOKEN: &[u8] = b"__REPLACE_CL__";
const METHOD_TOKEN: &[u8] = b"__METHOD__";
const ENDPOINT_TOKEN: &[u8] = b"__ENDPOINT__";
const HOST_TOKEN: &[u8] = b"__HOST__";

/// A request template: header lines, a body, and the substitution values for
/// its placeholder tokens. Cloned and parametrized per-probe; never mutated
/// in place once built by the catalog.
#[derive(Debug, Clone)]
pub struct Payload {
    pub header: Vec<u8>,
    pub body: Vec<u8>,
    pub method: String,
    pub endpoint: String,
    pub host: String,
    /// Declared Content-Length. If negative, `render()` substitutes `body.len()`.
    pub cl: i64,
}

impl Payload {
    /// Renders the wire-form request: `header + "\r\n" + body`, with every
    /// placeholder token replaced. Panics if `header` or `host` is empty —
    /// that is a programmer error, not a runtime condition to recover from.
    pub fn render(&self) -> Vec<u8> {
        assert!(!self.header.is_empty(), "Payload has no header data");
        assert!(!self.host.is_empty(), "Payload has no host specified");

        let mut buf = Vec::with_capacity(self.header.len() + 2 + self.body.len());
        buf.extend_from_slice(&self.header);
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);

        let buf = replace_random(&buf);

        let cl = if self.cl < 0 {
            self.body.len() as i64
        } else {
            self.cl
        };
        let buf = replace_all(&buf, REPLACE_CL_TOKEN, cl.to_string().as_bytes());
        let buf = replace_all(&buf, METHOD_TOKEN, self.method.as_bytes());
        let buf = replace_all(&buf, ENDPOINT_TOKEN, self.endpoint.as_bytes());
        replace_all(&buf, HOST_TOKEN, self.host.as_bytes())
    }
}

/// Replaces every `__RANDOM__` occurrence with an independently drawn token:
/// a uniform fraction in [0,1), formatted to six decimal digits, keeping only
/// the digits after the point (falling back to `"0"` if there were none).
fn replace_random(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = find(rest, RANDOM_TOKEN) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(random_fraction_digits().as_bytes());
        rest = &rest[pos + RANDOM_TOKEN.len()..];
    }
    out.extend_from_slice(rest);
    out
}

fn random_fraction_digits() -> String {
    let f: f64 = rand::thread_rng().gen_range(0.0..1.0);
    let formatted = format!("{:.6}", f);
    match formatted.split_once('.') {
        Some((_, frac)) if !frac.is_empty() => frac.to_string(),
        _ => "0".to_string(),
    }
}

fn replace_all(input: &[u8], token: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = find(rest, token) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(value);
        rest = &rest[pos + token.len()..];
    }
    out.extend_from_slice(rest);
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `chunked("Z")` => `"1\r\nZ\r\n"`; `chunked("")` => `"0\r\n"`.
pub fn chunked(data: &str) -> String {
    format!("{:x}\r\n{}\r\n", data.len(), data)
}

/// The literal byte sequence that terminates a chunked body.
pub const END_CHUNK: &str = "0\r\n\r\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn base_payload() -> Payload {
        Payload {
            header: b"__METHOD__ __ENDPOINT__ HTTP/1.1\r\nHost: __HOST__\r\nContent-Length: __REPLACE_CL__\r\n".to_vec(),
            body: b"hello".to_vec(),
            method: "GET".to_string(),
            endpoint: "/".to_string(),
            host: "example.com".to_string(),
            cl: -1,
        }
    }

    #[test]
    fn render_is_deterministic_without_random() {
        let p = base_payload();
        let a = p.render();
        let b = p.render();
        assert_eq!(a, b);
    }

    #[test]
    fn render_substitutes_content_length_from_body_when_negative() {
        let p = base_payload();
        let rendered = String::from_utf8(p.render()).unwrap();
        assert!(rendered.contains("Content-Length: 5"));
    }

    #[test]
    fn render_uses_declared_cl_when_nonnegative() {
        let mut p = base_payload();
        p.cl = 42;
        let rendered = String::from_utf8(p.render()).unwrap();
        assert!(rendered.contains("Content-Length: 42"));
    }

    #[test]
    fn render_substitutes_method_endpoint_host() {
        let mut p = base_payload();
        p.method = "POST".to_string();
        p.endpoint = "/login".to_string();
        p.host = "target.internal".to_string();
        let rendered = String::from_utf8(p.render()).unwrap();
        assert!(rendered.starts_with("POST /login HTTP/1.1\r\n"));
        assert!(rendered.contains("Host: target.internal\r\n"));
    }

    #[test]
    fn render_appends_blank_line_separator_once() {
        let p = base_payload();
        let rendered = String::from_utf8(p.render()).unwrap();
        // header block's own trailing \r\n plus the explicit separator = blank line
        assert!(rendered.contains("\r\n\r\n"));
    }

    #[test]
    #[should_panic(expected = "no header data")]
    fn render_panics_on_empty_header() {
        let mut p = base_payload();
        p.header.clear();
        p.render();
    }

    #[test]
    #[should_panic(expected = "no host specified")]
    fn render_panics_on_empty_host() {
        let mut p = base_payload();
        p.host.clear();
        p.render();
    }

    #[test]
    fn random_tokens_expand_independently() {
        let mut p = base_payload();
        p.body = b"__RANDOM__-__RANDOM__".to_vec();
        let rendered = String::from_utf8(p.render()).unwrap();
        let body_part = rendered.rsplit("\r\n\r\n").next().unwrap();
        let halves: Vec<&str> = body_part.split('-').collect();
        assert_eq!(halves.len(), 2);
        for half in &halves {
            assert!(half.chars().all(|c| c.is_ascii_digit()));
            assert!(!half.is_empty());
        }
    }

    #[test]
    fn high_bytes_in_header_survive_render() {
        let mut p = base_payload();
        p.header = b"__METHOD__ __ENDPOINT__ HTTP/1.1\r\nTransfer-Encoding:\xFFchunked\r\nHost: __HOST__\r\nContent-Length: __REPLACE_CL__\r\n".to_vec();
        let rendered = p.render();
        assert!(rendered.contains(&0xFFu8));
    }

    #[test]
    fn chunked_wraps_data_with_hex_length() {
        assert_eq!(chunked("Z"), "1\r\nZ\r\n");
        assert_eq!(chunked(""), "0\r\n\r\n");
    }

    #[test]
    fn chunked_uses_lowercase_hex_without_padding() {
        let data = "x".repeat(255);
        let encoded = chunked(&data);
        assert!(encoded.starts_with("ff\r\n"));
    }

    #[test]
    fn end_chunk_marker_is_exact_literal() {
        assert_eq!(END_CHUNK, "0\r\n\r\n");
    }
}
