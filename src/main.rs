// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! liftsync CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use liftsync::collab::{HistoryEngine, RuleClassifier};
use liftsync::coordinator::{Backend, CoreConfig, SessionCoordinator};
use liftsync::mcp::LiftsyncMcp;
use liftsync::store::{MemoryStore, Store, WriteDurability};
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--store <file>] [--durable-writes] [--mcp-http-port <port>] [tuning]\n  {program} [--store <file>] [--durable-writes] --mcp [tuning]\n\nTuning:\n  --suggestion-ttl-secs <n>  how long suggestions stay cached (default 300)\n  --timeout-secs <n>         classifier and suggestion engine timeout (default 20)\n  --verify                   re-read the session after every change\n\nWithout --store the database lives in memory only.\nHTTP mode serves MCP at `http://127.0.0.1:<port>/mcp` (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n--durable-writes fsyncs the store file on every change.\nLogging is controlled by LIFTSYNC_LOG (falls back to RUST_LOG, then `info`)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    store: Option<String>,
    mcp_http_port: Option<u16>,
    suggestion_ttl_secs: Option<u64>,
    timeout_secs: Option<u64>,
    verify: bool,
    durable_writes: bool,
}

impl CliOptions {
    fn core_config(&self) -> CoreConfig {
        let mut config = CoreConfig { verify_after_apply: self.verify, ..CoreConfig::default() };
        if let Some(secs) = self.suggestion_ttl_secs {
            config.suggestion_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout_secs {
            config.classifier_timeout = Duration::from_secs(secs);
            config.engine_timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn take_value<T: std::str::FromStr>(
    slot: &mut Option<T>,
    args: &mut impl Iterator<Item = String>,
) -> Result<(), ()> {
    if slot.is_some() {
        return Err(());
    }
    let raw = args.next().ok_or(())?;
    *slot = Some(raw.parse().map_err(|_| ())?);
    Ok(())
}

fn set_flag(flag: &mut bool) -> Result<(), ()> {
    if *flag {
        return Err(());
    }
    *flag = true;
    Ok(())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => set_flag(&mut options.mcp)?,
            "--verify" => set_flag(&mut options.verify)?,
            "--durable-writes" => set_flag(&mut options.durable_writes)?,
            "--store" => take_value(&mut options.store, &mut args)?,
            "--mcp-http-port" => take_value(&mut options.mcp_http_port, &mut args)?,
            "--suggestion-ttl-secs" => take_value(&mut options.suggestion_ttl_secs, &mut args)?,
            "--timeout-secs" => take_value(&mut options.timeout_secs, &mut args)?,
            _ => return Err(()),
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }
    if options.durable_writes && options.store.is_none() {
        return Err(());
    }
    if options.timeout_secs == Some(0) {
        return Err(());
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "liftsync".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        liftsync::logging::init();

        let store: Arc<dyn Store> = match options.store.as_deref() {
            Some(path) => {
                let durability = if options.durable_writes {
                    WriteDurability::Durable
                } else {
                    WriteDurability::BestEffort
                };
                Arc::new(MemoryStore::open(path, durability)?)
            }
            None => Arc::new(MemoryStore::new()),
        };
        let config = options.core_config();
        let backend = Backend {
            store: store.clone(),
            classifier: Arc::new(RuleClassifier::new()?),
            engine: Arc::new(HistoryEngine::new(store, config.history_limit)),
        };

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let coordinator = SessionCoordinator::setup(backend, config).await?;
            let mcp = LiftsyncMcp::new(coordinator.clone());

            if options.mcp {
                tracing::info!("serving MCP over stdio");
                let served = mcp.serve_stdio().await;
                coordinator.teardown().await;
                served?;
                return Ok::<(), Box<dyn Error>>(());
            }

            let port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            tracing::info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

            let http_config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = http_config.cancellation_token.clone();
            let server_shutdown = shutdown_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, http_config);
            let router = Router::new().nest_service("/mcp", mcp_service);

            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutting down");
                }
                shutdown_token.cancel();
            });

            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                })
                .await;
            ctrl_c.abort();
            coordinator.teardown().await;
            served?;
            Ok(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        tracing::error!(error = %err, "liftsync failed");
        eprintln!("liftsync: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_options, CliOptions};

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|arg| (*arg).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
        assert_eq!(options.core_config(), liftsync::coordinator::CoreConfig::default());
    }

    #[test]
    fn parses_store_and_mcp() {
        let options = parse_options(args(&["--store", "gym.json", "--durable-writes", "--mcp"]))
            .expect("parse options");
        assert_eq!(options.store.as_deref(), Some("gym.json"));
        assert!(options.durable_writes);
        assert!(options.mcp);
        assert_eq!(options.mcp_http_port, None);
    }

    #[test]
    fn tuning_flags_reach_the_core_config() {
        let options = parse_options(args(&["--suggestion-ttl-secs", "60", "--timeout-secs", "5", "--verify"]))
            .expect("parse options");
        let config = options.core_config();
        assert_eq!(config.suggestion_ttl, Duration::from_secs(60));
        assert_eq!(config.classifier_timeout, Duration::from_secs(5));
        assert_eq!(config.engine_timeout, Duration::from_secs(5));
        assert!(config.verify_after_apply);
    }

    #[test]
    fn parses_mcp_http_port() {
        let options = parse_options(args(&["--mcp-http-port", "1234"])).expect("parse options");
        assert_eq!(options.mcp_http_port, Some(1234));
        assert!(!options.mcp);
    }

    #[test]
    fn rejects_mcp_http_port_with_stdio_mcp_mode() {
        parse_options(args(&["--mcp", "--mcp-http-port", "0"])).unwrap_err();
    }

    #[test]
    fn rejects_durable_writes_without_store() {
        parse_options(args(&["--durable-writes"])).unwrap_err();
    }

    #[test]
    fn rejects_bad_values() {
        parse_options(args(&["--timeout-secs", "0"])).unwrap_err();
        parse_options(args(&["--timeout-secs", "soon"])).unwrap_err();
        parse_options(args(&["--mcp-http-port", "70000"])).unwrap_err();
        parse_options(args(&["--store"])).unwrap_err();
    }

    #[test]
    fn rejects_unknown_and_duplicate_args() {
        parse_options(args(&["--nope"])).unwrap_err();
        parse_options(args(&["gym.json"])).unwrap_err();
        parse_options(args(&["--mcp", "--mcp"])).unwrap_err();
        parse_options(args(&["--store", "a.json", "--store", "b.json"])).unwrap_err();
    }
}
