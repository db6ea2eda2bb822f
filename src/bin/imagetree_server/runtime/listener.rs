use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

/// Binds `addr` and reports the address actually bound (port 0 resolves here).
pub(super) async fn bind(addr: SocketAddr) -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    let local = listener.local_addr().context("read listener local addr")?;
    Ok((listener, local))
}

/// Publishes the bound address for whoever launched the server.
///
/// The file is written next to its final name and renamed into place, so a
/// poller never reads a half-written address.
pub(super) fn publish_addr(addr_file: Option<&Path>, local: SocketAddr) -> Result<()> {
    let Some(path) = addr_file else {
        return Ok(());
    };
    let tmp = path.with_extension("partial");
    std::fs::write(&tmp, local.to_string())
        .with_context(|| format!("write addr file {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("publish addr file {}", path.display()))
}

#[cfg(test)]
#[path = "../../../tests/bin/imagetree_server/runtime/listener_tests.rs"]
mod tests;
