use std::{
    io::{BufRead, BufReader, Read},
    net::TcpListener,
    process::Child,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::Sender;
use debugger::{Output, OutputSource};

pub mod delve;

pub use delve::{DelveServer, LaunchOptions};

/// Default timeout for waiting for a server to become ready
const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Startup bookkeeping shared by the reader threads of one child process.
///
/// Until the server reports readiness every line is kept for error reporting;
/// afterwards lines are forwarded to the output channel instead.
#[derive(Clone, Default)]
struct Startup {
    ready: Arc<AtomicBool>,
    collected: Arc<Mutex<Vec<String>>>,
}

impl Startup {
    fn collected_output(&self) -> String {
        self.collected
            .lock()
            .map(|o| o.join("\n"))
            .unwrap_or_default()
    }
}

/// Line reader for one child stream.
///
/// Lines are forwarded in the order they were read. The thread ends when the
/// stream closes or the receiving end of `output` goes away.
fn spawn_stream_reader(
    reader: impl Read + Send + 'static,
    source: OutputSource,
    output: Sender<Output>,
    startup: Startup,
    readiness: Option<(String, mpsc::Sender<()>)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(reader);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };

            if !startup.ready.load(Ordering::Acquire) {
                let is_ready_line = readiness
                    .as_ref()
                    .is_some_and(|(needle, _)| line.contains(needle.as_str()));
                if is_ready_line {
                    startup.ready.store(true, Ordering::Release);
                    if let Some((_, tx)) = &readiness {
                        let _ = tx.send(());
                    }
                } else if let Ok(mut collected) = startup.collected.lock() {
                    collected.push(line);
                }
                continue;
            }

            if output.send(Output::new(source, line)).is_err() {
                tracing::debug!(?source, "output receiver dropped, stopping reader");
                break;
            }
        }
        tracing::debug!(?source, "stream closed");
    })
}

/// Wait for the stdout reader to see the readiness line.
///
/// Returns an error if the timeout is exceeded or the child process exits
/// before becoming ready.
fn wait_for_ready(
    ready: mpsc::Receiver<()>,
    needle: &str,
    timeout: Duration,
    child: &mut Child,
    startup: &Startup,
) -> eyre::Result<()> {
    match ready.recv_timeout(timeout) {
        Ok(()) => Ok(()),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            // Check if the child has already exited
            let exit_info = match child.try_wait() {
                Ok(Some(status)) => format!(" (process exited with status: {status})"),
                Ok(None) => " (process still running)".to_string(),
                Err(e) => format!(" (could not check process status: {e})"),
            };

            let output = startup.collected_output();
            eyre::bail!(
                "timed out after {timeout:?} waiting for server readiness \
                 (expected '{needle}'){exit_info}\nCollected output:\n{output}"
            )
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let exit_info = match child.wait() {
                Ok(status) => format!("process exited with status: {status}"),
                Err(e) => format!("could not check process status: {e}"),
            };
            // let the stderr reader collect the failure reason
            thread::sleep(Duration::from_millis(50));

            let output = startup.collected_output();
            eyre::bail!(
                "server readiness detection failed: {exit_info}\nCollected output:\n{output}"
            )
        }
    }
}

/// Reserve a free loopback port by binding to port 0 and releasing it
pub fn get_random_tcp_port() -> eyre::Result<u16> {
    for _ in 0..50 {
        match TcpListener::bind("127.0.0.1:0").and_then(|listener| listener.local_addr()) {
            Ok(addr) => return Ok(addr.port()),
            Err(e) => {
                tracing::warn!(%e, "binding");
            }
        }
    }

    eyre::bail!("could not get free port");
}
