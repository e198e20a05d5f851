//! HTTP streaming byte source
//!
//! Downloads the response body on a background thread and hands chunks to the
//! decoder through a bounded channel. Reads wait (yielding) for the next chunk
//! and return 0 once the download ends or the connection drops.

use super::ByteSource;
use crate::config::HttpSourceConfig;
use crate::error::{Result, StreamError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use tracing::{debug, info, warn};

/// Non-seekable byte source over an HTTP response body
pub struct HttpStreamSource {
    config: HttpSourceConfig,

    /// Chunks from the download thread (None when closed)
    chunk_receiver: Option<Receiver<Vec<u8>>>,

    /// Chunk currently being served and the read offset into it
    pending: Vec<u8>,
    pending_pos: usize,

    /// Flag to signal download thread to stop
    stop_signal: Arc<AtomicBool>,

    _download_thread: Option<thread::JoinHandle<()>>,

    /// Bytes handed out so far
    pos: u32,

    /// Whether the body is still being delivered
    connected: bool,
}

impl HttpStreamSource {
    /// Create a closed source; call `open` with a URL
    pub fn new(config: HttpSourceConfig) -> Self {
        Self {
            config,
            chunk_receiver: None,
            pending: Vec::new(),
            pending_pos: 0,
            stop_signal: Arc::new(AtomicBool::new(false)),
            _download_thread: None,
            pos: 0,
            connected: false,
        }
    }

    /// Create a source and open `url`
    pub fn connect(url: &str, config: HttpSourceConfig) -> Result<Self> {
        let mut source = Self::new(config);
        source.open(url)?;
        Ok(source)
    }

    /// Background thread: run the request and forward body chunks
    fn download(
        url: String,
        config: HttpSourceConfig,
        status: Sender<std::result::Result<(), String>>,
        chunks: Sender<Vec<u8>>,
        stop_signal: Arc<AtomicBool>,
    ) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let _ = status.send(Err(format!("Failed to create runtime: {}", e)));
                return;
            }
        };

        runtime.block_on(async {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = config.connect_timeout() {
                builder = builder.connect_timeout(timeout);
            }
            let client = match builder.build() {
                Ok(client) => client,
                Err(e) => {
                    let _ = status.send(Err(e.to_string()));
                    return;
                }
            };

            let mut response = match client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    let _ = status.send(Err(e.to_string()));
                    return;
                }
            };

            if !response.status().is_success() {
                let _ = status.send(Err(format!("HTTP error: {}", response.status())));
                return;
            }
            if status.send(Ok(())).is_err() {
                return;
            }

            while !stop_signal.load(Ordering::Relaxed) {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        // Blocks while the decoder is behind; fails once the receiver is dropped
                        if chunks.send(chunk.to_vec()).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!(url = %url, "HTTP body complete");
                        break;
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "HTTP stream interrupted");
                        break;
                    }
                }
            }
        });
    }

    /// Wait for the next non-empty chunk, `false` once the stream is over
    fn next_chunk(&mut self) -> bool {
        let Some(receiver) = self.chunk_receiver.as_ref() else {
            return false;
        };

        loop {
            match receiver.try_recv() {
                Ok(chunk) if chunk.is_empty() => continue,
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pending_pos = 0;
                    return true;
                }
                Err(TryRecvError::Empty) => {
                    if self.stop_signal.load(Ordering::Relaxed) {
                        return false;
                    }
                    thread::yield_now();
                    thread::sleep(self.config.poll_interval());
                }
                Err(TryRecvError::Disconnected) => {
                    self.connected = false;
                    return false;
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.stop_signal.store(true, Ordering::Relaxed);
        // Dropping the receiver unblocks a sender waiting on a full channel
        self.chunk_receiver = None;
        self.pending.clear();
        self.pending_pos = 0;
        self.connected = false;
        // Detached; exits on its next chunk or when the connection ends
        self._download_thread = None;
    }
}

impl ByteSource for HttpStreamSource {
    fn open(&mut self, locator: &str) -> Result<()> {
        self.shutdown();

        let (status_tx, status_rx) = bounded(1);
        let (chunk_tx, chunk_rx) = bounded(self.config.channel_capacity);
        let stop_signal = Arc::new(AtomicBool::new(false));

        let url = locator.to_string();
        let config = self.config.clone();
        let stop_signal_clone = Arc::clone(&stop_signal);
        let handle = thread::Builder::new()
            .name("wav-http-source".to_string())
            .spawn(move || Self::download(url, config, status_tx, chunk_tx, stop_signal_clone))?;

        self.stop_signal = stop_signal;
        self.chunk_receiver = Some(chunk_rx);
        self._download_thread = Some(handle);
        self.pos = 0;

        match status_rx.recv_timeout(self.config.response_timeout()) {
            Ok(Ok(())) => {
                info!(url = %locator, "HTTP stream connected");
                self.connected = true;
                Ok(())
            }
            Ok(Err(msg)) => {
                self.shutdown();
                Err(StreamError::Open(msg))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.shutdown();
                Err(StreamError::Open(format!(
                    "no response within {} ms",
                    self.config.response_timeout_ms
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.shutdown();
                Err(StreamError::Open("download thread exited".to_string()))
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending_pos >= self.pending.len() && !self.next_chunk() {
            return Ok(0);
        }

        let available = &self.pending[self.pending_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        self.pos = self.pos.saturating_add(n as u32);
        Ok(n)
    }

    fn seek_forward(&mut self, _count: u32) -> Result<()> {
        Err(StreamError::SeekUnsupported)
    }

    fn is_open(&self) -> bool {
        self.connected || self.pending_pos < self.pending.len()
    }

    fn close(&mut self) -> Result<()> {
        self.shutdown();
        Ok(())
    }

    fn position(&self) -> u32 {
        self.pos
    }
}

impl Drop for HttpStreamSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}
