use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::{Child, Stdio},
    sync::mpsc,
};

use crossbeam_channel::Receiver;
use debugger::{Output, OutputSource};
use eyre::WrapErr;

use crate::{Startup, spawn_stream_reader};

/// Printed by `dlv` once the JSON-RPC listener accepts connections
const READY_NEEDLE: &str = "API server listening at:";

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit `dlv` binary; looked up on `PATH` otherwise
    pub dlv: Option<PathBuf>,
    /// Capacity of the output channel
    pub output_queue_depth: usize,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            dlv: None,
            output_queue_depth: 256,
        }
    }
}

/// A headless `dlv debug` process serving the JSON-RPC v2 API on loopback.
///
/// Dropping the server kills the process.
pub struct DelveServer {
    child: Child,
    addr: SocketAddr,
    output: Receiver<Output>,
}

impl DelveServer {
    /// Build and start `target` under delve on a free port
    pub fn launch(target: &Path, options: &LaunchOptions) -> eyre::Result<Self> {
        let port = crate::get_random_tcp_port().context("reserving port for delve")?;
        Self::on_port(target, port, options)
    }

    pub fn on_port(target: &Path, port: u16, options: &LaunchOptions) -> eyre::Result<Self> {
        tracing::debug!(port = ?port, target = %target.display(), "starting server process");

        let dlv = match &options.dlv {
            Some(path) => path.clone(),
            None => which::which("dlv").map_err(|_| {
                eyre::eyre!(
                    "dlv not found in PATH. Install delve: https://github.com/go-delve/delve"
                )
            })?,
        };

        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let cwd = std::env::current_dir().context("getting current directory")?;
        let mut child = std::process::Command::new(&dlv)
            .arg("debug")
            .arg("--headless")
            .arg("--api-version=2")
            .arg(format!("--listen={addr}"))
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&cwd)
            .spawn()
            .with_context(|| format!("spawning {}", dlv.display()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| eyre::eyre!("delve stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| eyre::eyre!("delve stderr was not captured"))?;

        let (tx, output) = crossbeam_channel::bounded(options.output_queue_depth.max(1));
        let (ready_tx, ready_rx) = mpsc::channel();
        let startup = Startup::default();
        spawn_stream_reader(
            stdout,
            OutputSource::Stdout,
            tx.clone(),
            startup.clone(),
            Some((READY_NEEDLE.to_string(), ready_tx)),
        );
        spawn_stream_reader(stderr, OutputSource::Stderr, tx, startup.clone(), None);

        // wait until server is ready
        tracing::debug!("waiting until server is ready");
        if let Err(e) = crate::wait_for_ready(
            ready_rx,
            READY_NEEDLE,
            crate::SERVER_READY_TIMEOUT,
            &mut child,
            &startup,
        ) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e).context("waiting for delve server readiness");
        }

        tracing::debug!(%addr, "server ready");
        Ok(Self {
            child,
            addr,
            output,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Lines printed by the debuggee and by delve itself.
    ///
    /// The channel is meant for a single consumer.
    pub fn output(&self) -> &Receiver<Output> {
        &self.output
    }
}

impl Drop for DelveServer {
    fn drop(&mut self) {
        tracing::debug!("terminating server");
        match self.child.kill() {
            Ok(_) => {
                tracing::debug!("server terminated");
                let _ = self.child.wait();
            }
            Err(e) => tracing::warn!(error = %e, "could not terminate server process"),
        }
    }
}
