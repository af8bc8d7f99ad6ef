//! The session driver (spec §4.5): cookie pre-flight, the mutation loop, and
//! artifact persistence for confirmed findings.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::probe::create_exec_test;
use crate::reporting::{LogLevel, Reporter};
use crate::template::Payload;
use crate::transport;

/// Per-target configuration and mutable scan state (spec §3 `DesyncSession`).
pub struct DesyncSession {
    pub host: String,
    pub port: u16,
    pub method: String,
    pub endpoint: String,
    pub vhost: Option<String>,
    pub url: String,
    pub timeout: Duration,
    pub tls: bool,
    pub proxy: Option<(String, u16)>,
    pub exit_early: bool,
    pub cookies: Vec<String>,
    pub attempts: u32,
    pub reporter: Reporter,
}

impl DesyncSession {
    /// Cookie pre-flight (spec §4.5 step 1): a minimal GET with a random
    /// cache-busting query string, a 500ms settle delay, then a best-effort
    /// read-to-EOF that parses any `Set-Cookie` lines. Connection failure
    /// aborts the whole session; read failure is tolerated.
    pub async fn preflight_cookies(&mut self) -> bool {
        let cb: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(5)
            .map(char::from)
            .collect();

        let request = format!(
            "GET {}?cb={} HTTP/1.1\r\n\
             Host: {}\r\n\
             User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/78.0.3904.87 Safari/537.36\r\n\
             Content-type: application/x-www-form-urlencoded; charset=UTF-8\r\n\
             Content-Length: 0\r\n\r\n",
            self.endpoint, cb, self.host
        );

        let preflight_timeout = Duration::from_secs(2);
        let mut conn = match transport::connect(
            &self.host,
            self.port,
            preflight_timeout,
            self.tls,
            self.proxy.as_ref().map(|(h, p)| (h.as_str(), *p)),
        )
        .await
        {
            Ok(c) => c,
            Err(_) => {
                self.reporter.info("Error      : Unable to connect to host");
                return false;
            }
        };

        if conn.write_all(request.as_bytes()).await.is_err() {
            self.reporter
                .info("Error      : Failed to send cookies request");
            return false;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;

        let mut response = Vec::new();
        let read = tokio::time::timeout(preflight_timeout, conn.read_to_end(&mut response)).await;
        if read.is_err() {
            // Read failure is tolerated: proceed with whatever was collected (none, here).
            return true;
        }

        let text = String::from_utf8_lossy(&response);
        for line in text.split("\r\n") {
            if line.len() > 11
                && line[0..11].to_lowercase().replace(' ', "") == "set-cookie:"
            {
                let rest = {
                    let lower = line.to_lowercase();
                    let idx = lower.find("set-cookie:").unwrap();
                    line[idx + "set-cookie:".len()..].to_string()
                };
                let cookie = rest.to_lowercase();
                let value = cookie.split(';').next().unwrap_or("").to_string();
                self.cookies.push(format!("{};", value));
            }
        }

        self.reporter.info(&format!(
            "Cookies    : {} (Appending to the attack)",
            self.cookies.len()
        ));
        true
    }

    /// Runs every catalog mutation against this session (spec §4.5 step 2).
    pub async fn run(&mut self, catalog: &[(String, Payload)]) {
        for (name, template) in catalog {
            let mut hosted = template.clone();
            hosted.host = self.host.clone();
            let result = create_exec_test(self, name, &hosted).await;
            if result.found && self.exit_early {
                break;
            }
        }
        self.reporter.clear();
    }

    /// Writes the rendered offending request to `payloads/` next to the
    /// running executable (spec §4.5 artifact writing).
    pub fn write_payload(&mut self, payload: &Payload, kind: &str, name: &str) {
        let furl = self.host.replace('.', "_");
        let furl = if self.tls {
            format!("https_{}", furl)
        } else {
            format!("http_{}", furl)
        };

        let exe_path = std::env::current_exe()
            .unwrap_or_else(|_| PathBuf::from(std::env::args().next().unwrap_or_default()));
        let base_dir = exe_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let dir = base_dir.join("payloads");
        if let Err(e) = fs::create_dir_all(&dir) {
            crate::reporting::log(
                LogLevel::Warning,
                &format!("could not create payloads directory: {e}"),
            );
            return;
        }

        let filename = dir.join(format!("{}_{}_{}.txt", furl, kind, name));
        if let Err(e) = fs::write(&filename, payload.render()) {
            crate::reporting::log(LogLevel::Warning, &format!("could not write payload: {e}"));
            return;
        }

        self.reporter.info(&format!(
            "[CRITICAL] {} Payload: {} URL: {}",
            kind,
            filename.display(),
            self.url
        ));
    }
}
