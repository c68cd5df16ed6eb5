mod calc;
mod config;
mod dto;
mod exam;
mod gateway;
mod ipc;
#[cfg(test)]
mod testing;
mod ui;
mod views;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn init_logging() {
    // stdout carries the IPC channel; logs go to stderr only.
    let filter = EnvFilter::try_from_env("BULLETIND_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging();

    let cfg = match config::Config::from_env() {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let gateway = match gateway::from_config(&cfg) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("cannot build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        configured = gateway.is_configured(),
        "bulletind ready"
    );
    let mut state = ipc::AppState::new(cfg, gateway, Box::new(ui::StdoutSink));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!("unparseable request: {e}");
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let mut stdout = io::stdout().lock();
                let _ = writeln!(stdout, "{reply}");
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
    ExitCode::SUCCESS
}
