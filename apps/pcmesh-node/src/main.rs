//! pcmesh node - a personal-cloud mesh node.
//!
//! The node accepts HTTP requests from other nodes of the same personal cloud
//! and admits only those carrying a valid shared-key authentication digest.
//!
//! # Usage
//!
//! ```text
//! PCMESH_CLOUDS=cloudA=010203 pcmesh-node
//! pcmesh-node --sign cloudA http://node.local:7330/api/list
//! pcmesh-node --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PCMESH_LISTEN` | `0.0.0.0:7330` | Bind address |
//! | `PCMESH_CLOUDS` | *(empty)* | Comma-separated `cloudId=hexkey` pairs |
//! | `PCMESH_MIN_VERSION` | `1` | Lowest accepted protocol version |
//! | `PCMESH_MAX_CLOCK_SKEW_MS` | *(unset)* | Freshness window; unset disables it |
//! | `PCMESH_DIGEST` | `xxhash64` | `xxhash64` or `hmac-sha256` |
//! | `PCMESH_URL_SCHEME` | `http` | Scheme used for origin-form request URLs |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod service;

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use pcmesh_auth::headers::CURRENT_VERSION;
use pcmesh_auth::{Signer, Verifier};
use pcmesh_core::{CloudKeyRegistry, PcMeshConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::service::NodeService;

/// Node version reported in health check responses.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the cloud key registry from the clouds listed in the configuration.
fn build_registry(config: &PcMeshConfig) -> Arc<CloudKeyRegistry> {
    Arc::new(config.clouds.iter().cloned().collect())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: NodeService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the node and requesting `/health`.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// Sign `url` for `cloud_id` with the key from the configuration and render
/// the authentication headers, one `name: value` per line.
fn sign_command(config: &PcMeshConfig, cloud_id: &str, url: &str) -> Result<String> {
    let key = config
        .clouds
        .iter()
        .find(|(id, _)| id.as_str() == cloud_id)
        .map(|(_, key)| key)
        .with_context(|| format!("cloud {cloud_id} is not listed in PCMESH_CLOUDS"))?;

    let signed = Signer::new(CURRENT_VERSION, config.digest_algorithm)
        .sign_now(cloud_id, url, key)
        .with_context(|| format!("cannot sign {url}"))?;

    let mut out = String::new();
    for (name, value) in signed.to_pairs() {
        writeln!(out, "{name}: {value}")?;
    }
    Ok(out)
}

/// The `count` values following `flag` on the command line, if the flag is present.
fn flag_values(args: &[String], flag: &str, count: usize) -> Option<Result<Vec<String>>> {
    let pos = args.iter().position(|a| a == flag)?;
    let values: Vec<String> = args.iter().skip(pos + 1).take(count).cloned().collect();
    if values.len() == count {
        Some(Ok(values))
    } else {
        Some(Err(anyhow::anyhow!("{flag} expects {count} arguments")))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PcMeshConfig::from_env().context("invalid configuration")?;
    let args: Vec<String> = std::env::args().collect();

    // Handle --health-check flag for container health probes.
    if args.iter().any(|a| a == "--health-check") {
        let healthy = run_health_check(&config.listen).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    if let Some(values) = flag_values(&args, "--sign", 2) {
        let values = values?;
        print!("{}", sign_command(&config, &values[0], &values[1])?);
        return Ok(());
    }

    init_tracing(&config.log_level)?;

    let registry = build_registry(&config);
    let verifier = Verifier::from_config(&config, registry.clone());
    let service = NodeService::new(verifier, VERSION);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        clouds = ?registry.cloud_ids(),
        min_version = config.min_version,
        digest = %config.digest_algorithm,
        max_clock_skew_ms = ?config.max_clock_skew_ms,
        version = VERSION,
        "starting pcmesh node",
    );

    serve(listener, service).await
}

#[cfg(test)]
mod tests {
    use pcmesh_auth::compute_digest;
    use pcmesh_core::DigestAlgorithm;

    use super::*;

    fn config() -> PcMeshConfig {
        PcMeshConfig::from_vars(|key| match key {
            "PCMESH_CLOUDS" => Some("cloudA=010203, cloudB=ff".to_owned()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_should_build_registry_from_config() {
        let registry = build_registry(&config());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("cloudA").unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_should_render_signed_headers() {
        let out = sign_command(&config(), "cloudA", "http://node.local/api/list").unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "authentication-version: 1");
        assert!(lines[1].starts_with("authentication-timestamp: "));
        assert_eq!(lines[3], "authentication-pcid: cloudA");

        let timestamp: i64 = lines[1]
            .trim_start_matches("authentication-timestamp: ")
            .parse()
            .unwrap();
        let digest = compute_digest(timestamp, "http://node.local/api/list", &[1, 2, 3]).unwrap();
        assert_eq!(lines[2], format!("authentication-hash: {digest}"));
    }

    #[test]
    fn test_should_refuse_to_sign_for_unknown_cloud() {
        assert!(sign_command(&config(), "cloudZ", "http://node.local/").is_err());
    }

    #[test]
    fn test_should_refuse_to_sign_relative_url() {
        assert!(sign_command(&config(), "cloudA", "/api/list").is_err());
    }

    #[test]
    fn test_should_sign_with_configured_digest() {
        let mut config = config();
        config.digest_algorithm = DigestAlgorithm::HmacSha256;
        let out = sign_command(&config, "cloudB", "http://node.local/").unwrap();
        assert!(out.contains("authentication-pcid: cloudB"));
    }

    #[test]
    fn test_should_read_flag_values() {
        let args: Vec<String> = ["pcmesh-node", "--sign", "cloudA", "http://n/x"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let values = flag_values(&args, "--sign", 2).unwrap().unwrap();
        assert_eq!(values, vec!["cloudA", "http://n/x"]);
        assert!(flag_values(&args, "--health-check", 0).is_none());
        assert!(flag_values(&args[..3], "--sign", 2).unwrap().is_err());
    }
}
