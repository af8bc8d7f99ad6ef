//! Integration tests for TECL/CLTE request construction.

use std::time::Duration;

use desyncx::catalog;
use desyncx::probe::{build_clte, build_tecl};
use desyncx::reporting::Reporter;
use desyncx::session::DesyncSession;

fn session() -> DesyncSession {
    DesyncSession {
        host: "victim.example".to_string(),
        port: 443,
        method: "POST".to_string(),
        endpoint: "/login".to_string(),
        vhost: None,
        url: "https://victim.example/login".to_string(),
        timeout: Duration::from_secs(5),
        tls: true,
        proxy: None,
        exit_early: false,
        cookies: Vec::new(),
        attempts: 0,
        reporter: Reporter::new(None, true, true),
    }
}

fn first_template() -> desyncx::template::Payload {
    catalog::build().into_iter().next().unwrap().1
}

#[test]
fn tecl_variant_zero_declares_length_six_with_stray_byte_body() {
    let s = session();
    let p = build_tecl(&s, &first_template(), 0);
    assert_eq!(p.cl, 6);
    assert_eq!(p.body, b"0\r\n\r\nX");
    assert_eq!(p.host, "victim.example");
    assert_eq!(p.method, "POST");
    assert_eq!(p.endpoint, "/login");
}

#[test]
fn tecl_variant_one_declares_length_five() {
    let s = session();
    let p = build_tecl(&s, &first_template(), 1);
    assert_eq!(p.cl, 5);
}

#[test]
fn clte_variant_zero_declares_length_four_with_chunked_body() {
    let s = session();
    let p = build_clte(&s, &first_template(), 0);
    assert_eq!(p.cl, 4);
    assert_eq!(p.body, b"1\r\nZ\r\n0\r\n\r\n");
}

#[test]
fn clte_variant_one_declares_length_eleven() {
    let s = session();
    let p = build_clte(&s, &first_template(), 1);
    assert_eq!(p.cl, 11);
}

#[test]
fn vhost_overrides_the_session_host_in_rendered_requests() {
    let mut s = session();
    s.vhost = Some("internal-only.example".to_string());
    let p = build_tecl(&s, &first_template(), 0);
    assert_eq!(p.host, "internal-only.example");
}

#[test]
fn cookies_are_appended_as_a_single_joined_header() {
    let mut s = session();
    s.cookies = vec!["a=1;".to_string(), "b=2;".to_string()];
    let p = build_clte(&s, &first_template(), 0);
    let header = String::from_utf8_lossy(&p.header);
    assert!(header.contains("Cookie: a=1;b=2;\r\n"));
}
