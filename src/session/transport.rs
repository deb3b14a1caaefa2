//! Byte stream to the game server: plain TCP dial, TCP listen, or TLS dial.

use crate::config::{ConnectionConfig, ConnectionMode};
use crate::error::TransportError;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls;

/// Anything the framed connection can read from and write to.
pub trait GameStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> GameStream for T {}

pub type BoxedStream = Box<dyn GameStream>;

/// Open a stream according to the configured mode.
pub async fn open(cfg: &ConnectionConfig) -> anyhow::Result<BoxedStream> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    tracing::info!(mode = %cfg.mode, addr = addr.as_str(), "Opening game server connection");

    let stream: BoxedStream = match cfg.mode {
        ConnectionMode::Connect => Box::new(dial(&addr).await?),
        ConnectionMode::Listen => Box::new(accept_one(&addr).await?),
        ConnectionMode::Tls => Box::new(dial_tls(&cfg.host, &addr).await?),
    };
    Ok(stream)
}

async fn dial(addr: &str) -> anyhow::Result<TcpStream> {
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|e| TransportError::Connection {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
    tcp.set_nodelay(true).context("set TCP_NODELAY")?;
    Ok(tcp)
}

/// Bind, wait for the game server to dial in, and stop listening.
async fn accept_one(addr: &str) -> anyhow::Result<TcpStream> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind game socket {addr}"))?;
    tracing::info!(addr, "Waiting for the game server");
    let (tcp, peer) = listener.accept().await.context("accept game server")?;
    tracing::info!(peer = %peer, "Game server connected");
    tcp.set_nodelay(true).context("set TCP_NODELAY")?;
    Ok(tcp)
}

async fn dial_tls(
    host: &str,
    addr: &str,
) -> anyhow::Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let tcp = dial(addr).await?;

    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));
    let domain = rustls_pki_types::ServerName::try_from(host.to_string())
        .with_context(|| format!("invalid TLS server name {host}"))?;
    let tls = connector
        .connect(domain, tcp)
        .await
        .map_err(|e| TransportError::Connection {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
    Ok(tls)
}
