use clap::Parser;
use colored::*;
use std::fs::File;
use std::io::IsTerminal;
use std::time::Duration;
use url::Url;

use desyncx::catalog;
use desyncx::cli::Cli;
use desyncx::error::Result;
use desyncx::reporting::{self, LogLevel, Reporter};
use desyncx::session::DesyncSession;

fn print_banner() {
    println!();
    println!("{}", "╔══════════════════════════════════════════╗".cyan());
    println!(
        "{}",
        "║  desyncx — HTTP request smuggling probe   ║"
            .cyan()
            .bold()
    );
    println!("{}", "╚══════════════════════════════════════════╝".cyan());
    println!();
}

/// Resolves scheme/host/port/TLS for a target URL (spec §6 URL parsing):
/// `http` defaults to port 80, `https` to port 443 with TLS on; an explicit
/// port in the URL overrides the default.
fn resolve_url(raw: &str) -> Result<(String, u16, String, bool, String)> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err("malformed URL not supported".into()),
    }
    let host = url.host_str().ok_or("malformed URL not supported")?.to_string();
    let tls = url.scheme() == "https";
    let port = url.port_or_known_default().ok_or("malformed URL not supported")?;
    let path = if url.path().is_empty() {
        "/".to_string()
    } else {
        url.path().to_string()
    };
    Ok((host, port, path, tls, raw.to_string()))
}

/// Parses an upstream proxy address of the form `host:port`.
fn parse_proxy(spec: &str) -> Option<(String, u16)> {
    let (host, port) = spec.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    Some((host.to_string(), port))
}

/// One `URL [METHOD]` line from stdin or `-u`, normalized per spec §6.
struct Target {
    url: String,
    method: String,
}

fn collect_targets(cli: &Cli) -> Vec<Target> {
    if let Some(url) = &cli.url {
        return vec![Target {
            url: url.clone(),
            method: cli.method.to_uppercase(),
        }];
    }

    let mut targets = Vec::new();
    let mut line = String::new();
    while std::io::stdin().read_line(&mut line).unwrap_or(0) > 0 {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let mut parts = trimmed.split_whitespace();
            let raw_url = parts.next().unwrap_or("").to_string();
            let method = parts.next().unwrap_or(&cli.method).to_uppercase();
            let url = if raw_url.to_lowercase().starts_with("http") {
                raw_url
            } else {
                format!("https://{}", raw_url)
            };
            targets.push(Target { url, method });
        }
        line.clear();
    }
    targets
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.url.is_none() && std::io::stdin().is_terminal() {
        reporting::log(
            LogLevel::Error,
            "no direct URL or piped URL specified. Usage: desyncx -u <url> [options]",
        );
        std::process::exit(1);
    }

    if let Some(path) = &cli.log {
        if File::create(path).is_err() {
            reporting::log(LogLevel::Error, "issue with log file destination");
            std::process::exit(1);
        }
    }

    print_banner();

    let proxy = cli.proxy.as_deref().and_then(parse_proxy);
    let timeout = Duration::from_secs_f64(cli.timeout.max(0.0));

    for target in collect_targets(&cli) {
        let (host, port, endpoint, tls, url) = match resolve_url(&target.url) {
            Ok(v) => v,
            Err(_) => {
                reporting::log(
                    LogLevel::Error,
                    &format!("malformed URL not supported: {}", target.url),
                );
                std::process::exit(1);
            }
        };

        let mut reporter = Reporter::new(
            match &cli.log {
                Some(path) => File::options().append(true).open(path).ok(),
                None => None,
            },
            cli.no_color,
            cli.quiet,
        );
        reporter.info(&format!("URL        : {}", url));
        reporter.info(&format!("Method     : {}", target.method));
        reporter.info(&format!("Endpoint   : {}", endpoint));
        reporter.info(&format!("Timeout    : {:.1} seconds", cli.timeout));

        let mut session = DesyncSession {
            host,
            port,
            method: target.method,
            endpoint,
            vhost: cli.vhost.clone(),
            url,
            timeout,
            tls,
            proxy: proxy.clone(),
            exit_early: cli.exit_early,
            cookies: Vec::new(),
            attempts: 0,
            reporter,
        };

        if !session.preflight_cookies().await {
            continue;
        }

        let catalog = catalog::build();
        session.run(&catalog).await;
    }

    Ok(())
}
