//! The probe engine (spec §4.4): builds the TECL and CLTE concrete requests
//! for a mutation, sends them over the transport, classifies the response,
//! and runs the edge-case confirmation retry that distinguishes a real desync
//! signal from transient network noise.

use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::SmugglexError;
use crate::session::DesyncSession;
use crate::template::{chunked, Payload, END_CHUNK};
use crate::transport;

/// Classification of a single probe's transport behavior (spec §3/§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Read succeeded; carries the non-ASCII-filtered response text.
    Ok(String),
    /// Read timed out and elapsed time was >= `timeout - 1s` (server hung
    /// waiting for more body — the desync signal).
    Timeout,
    /// Read timed out and elapsed time was < `timeout - 1s` (server closed
    /// the connection early).
    Disconnected,
    /// Dial, write, or any other read error.
    SocketError,
}

/// Connects, writes the rendered payload, and classifies the response per
/// spec §4.4 step 4: a single bounded read of up to 4096 bytes, non-ASCII
/// bytes replaced with `'0'`.
pub async fn test(session: &DesyncSession, payload: &Payload) -> (ProbeOutcome, Duration) {
    let start = Instant::now();

    let mut conn = match transport::connect(
        &session.host,
        session.port,
        session.timeout,
        session.tls,
        session.proxy.as_ref().map(|(h, p)| (h.as_str(), *p)),
    )
    .await
    {
        Ok(c) => c,
        Err(_) => return (ProbeOutcome::SocketError, start.elapsed()),
    };

    let rendered = payload.render();
    match tokio::time::timeout(session.timeout, conn.write_all(&rendered)).await {
        Ok(Ok(())) => {}
        _ => return (ProbeOutcome::SocketError, start.elapsed()),
    }

    let mut buf = vec![0u8; 4096];
    let read_start = Instant::now();
    let read_result = tokio::time::timeout(session.timeout, conn.read(&mut buf)).await;
    let elapsed = read_start.elapsed();

    match read_result {
        Err(_) => {
            // tokio::time::timeout elapsed: the read never returned.
            if elapsed < session.timeout.saturating_sub(Duration::from_secs(1)) {
                (ProbeOutcome::Disconnected, start.elapsed())
            } else {
                (ProbeOutcome::Timeout, start.elapsed())
            }
        }
        Ok(Err(e)) => {
            let err: SmugglexError = e.into();
            if err.is_timeout() {
                (ProbeOutcome::Timeout, start.elapsed())
            } else {
                (ProbeOutcome::SocketError, start.elapsed())
            }
        }
        // A clean 0-byte/EOF read is not a timeout error, so it cannot be
        // DISCONNECTED under the classification invariant (spec §8.5); the
        // Go original's (0, io.EOF) case likewise isn't a net.Error timeout
        // and falls through to SOCKET_ERROR.
        Ok(Ok(0)) => (ProbeOutcome::SocketError, start.elapsed()),
        Ok(Ok(n)) => {
            let filtered: String = buf[..n]
                .iter()
                .map(|&b| if b > 0x7f { '0' } else { b as char })
                .collect();
            (ProbeOutcome::Ok(filtered), start.elapsed())
        }
    }
}

/// Builds the TECL probe request: the body ends cleanly per Transfer-Encoding
/// (`0\r\n\r\n`) plus a stray byte, but declares a Content-Length that a CL
/// reader will block waiting to fill.
pub fn build_tecl(session: &DesyncSession, template: &Payload, variant: u8) -> Payload {
    let mut p = template.clone();
    p.host = session.vhost.clone().unwrap_or_else(|| session.host.clone());
    p.method = session.method.clone();
    p.endpoint = session.endpoint.clone();
    if !session.cookies.is_empty() {
        p.header
            .extend_from_slice(format!("Cookie: {}\r\n", session.cookies.join("")).as_bytes());
    }
    p.cl = if variant == 0 { 6 } else { 5 };
    p.body = format!("{}X", END_CHUNK).into_bytes();
    p
}

/// Builds the CLTE probe request: a chunked body that a TE reader parses and
/// returns from promptly, but whose declared Content-Length under- or
/// over-states its true length for a CL reader.
pub fn build_clte(session: &DesyncSession, template: &Payload, variant: u8) -> Payload {
    let mut p = template.clone();
    p.host = session.vhost.clone().unwrap_or_else(|| session.host.clone());
    p.method = session.method.clone();
    p.endpoint = session.endpoint.clone();
    if !session.cookies.is_empty() {
        p.header
            .extend_from_slice(format!("Cookie: {}\r\n", session.cookies.join("")).as_bytes());
    }
    p.cl = if variant == 0 { 4 } else { 11 };
    p.body = format!("{}{}", chunked("Z"), END_CHUNK).into_bytes();
    p
}

fn extract_status_code(response: &str) -> String {
    match response.lines().next() {
        Some(line) => line
            .split_whitespace()
            .nth(1)
            .unwrap_or("N/A")
            .to_string(),
        None => "N/A".to_string(),
    }
}

/// Outcome of running the full two-probe test, plus the rendered request that
/// should be archived on a confirmed finding.
pub struct ExecResult {
    pub found: bool,
    pub summary: String,
}

/// Runs the TECL and CLTE probes for one mutation, composes the status line,
/// and applies the three-confirmation edge-case retry (spec §4.4 step 5).
/// Recursion is boxed because `async fn` cannot recurse directly.
pub fn create_exec_test<'a>(
    session: &'a mut DesyncSession,
    name: &'a str,
    template: &'a Payload,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ExecResult> + 'a>> {
    Box::pin(async move {
        session.reporter.status(name, "Checking...");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let tecl_payload = build_tecl(session, template, 0);
        let (tecl_outcome, tecl_elapsed) = test(session, &tecl_payload).await;
        let status_tecl = match &tecl_outcome {
            ProbeOutcome::Ok(text) => extract_status_code(text),
            _ => "ERR".to_string(),
        };
        session.reporter.status(
            name,
            &format!("TECL: {} ({:.2}s)", status_tecl, tecl_elapsed.as_secs_f64()),
        );

        let clte_payload = build_clte(session, template, 0);
        let (clte_outcome, clte_elapsed) = test(session, &clte_payload).await;
        let status_clte = match &clte_outcome {
            ProbeOutcome::Ok(text) => extract_status_code(text),
            _ => "ERR".to_string(),
        };

        let mut summary = format!(
            "TECL: {} ({:.2}s) | CLTE: {} ({:.2}s)",
            status_tecl,
            tecl_elapsed.as_secs_f64(),
            status_clte,
            clte_elapsed.as_secs_f64()
        );
        if matches!(tecl_outcome, ProbeOutcome::Timeout) || matches!(clte_outcome, ProbeOutcome::Timeout) {
            summary.push_str(" - TIMEOUT");
        } else if matches!(tecl_outcome, ProbeOutcome::SocketError)
            || matches!(clte_outcome, ProbeOutcome::SocketError)
        {
            summary.push_str(" - SOCKET ERROR");
        } else if matches!(tecl_outcome, ProbeOutcome::Disconnected)
            || matches!(clte_outcome, ProbeOutcome::Disconnected)
        {
            summary.push_str(" - DISCONNECTED");
        }
        session.reporter.status(name, &summary);

        if matches!(clte_outcome, ProbeOutcome::Timeout) {
            let edge_payload = build_clte(session, template, 1);
            let (edge_outcome, _) = test(session, &edge_payload).await;
            if matches!(edge_outcome, ProbeOutcome::Ok(_)) {
                session.attempts += 1;
                if session.attempts < 3 {
                    return create_exec_test(session, name, template).await;
                }
                let msg = format!(
                    "Potential CLTE Issue Found - {} @ http://{}{}",
                    session.method, session.host, session.endpoint
                );
                session.reporter.status(name, &msg);
                session.write_payload(&clte_payload, "CLTE", name);
                session.attempts = 0;
                return ExecResult {
                    found: true,
                    summary: msg,
                };
            } else {
                session
                    .reporter
                    .status(name, "CLTE TIMEOUT ON BOTH LENGTH 4 AND 11");
            }
        } else if matches!(tecl_outcome, ProbeOutcome::Timeout) {
            let edge_payload = build_tecl(session, template, 1);
            let (edge_outcome, _) = test(session, &edge_payload).await;
            if matches!(edge_outcome, ProbeOutcome::Ok(_)) {
                session.attempts += 1;
                if session.attempts < 3 {
                    return create_exec_test(session, name, template).await;
                }
                let msg = format!(
                    "Potential TECL Issue Found - {} @ http://{}{}",
                    session.method, session.host, session.endpoint
                );
                session.reporter.status(name, &msg);
                session.write_payload(&tecl_payload, "TECL", name);
                session.attempts = 0;
                return ExecResult {
                    found: true,
                    summary: msg,
                };
            } else {
                session
                    .reporter
                    .status(name, "TECL TIMEOUT ON BOTH LENGTH 6 AND 5");
            }
        } else if matches!(tecl_outcome, ProbeOutcome::SocketError)
            || matches!(clte_outcome, ProbeOutcome::SocketError)
        {
            session.reporter.status(name, "SOCKET ERROR");
        }

        session.attempts = 0;
        ExecResult {
            found: false,
            summary,
        }
    })
}
