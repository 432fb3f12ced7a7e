//! Multi-producer / single-consumer log funnel.
//!
//! Worker threads never touch the log file or stderr themselves: each
//! formatted record is sent whole over a channel, and one sink thread
//! writes records in arrival order.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing_subscriber::fmt::MakeWriter;

const CHANNEL_CAPACITY: usize = 4096;
const FLUSH_WAIT: Duration = Duration::from_secs(2);

enum SinkMessage {
    Record(Vec<u8>),
    Flush(Sender<()>),
}

/// Owns the sink thread. Cloneable producers are handed out via
/// [`LogSink::make_writer`].
pub struct LogSink {
    tx: Sender<SinkMessage>,
    handle: Option<JoinHandle<()>>,
}

impl LogSink {
    /// Start the sink thread. Records go to stderr and, when given, are also
    /// appended to `log_file`.
    pub fn start(log_file: Option<&Path>) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        Ok(Self::start_with(Box::new(io::stderr()), file))
    }

    /// Start the sink with an explicit primary writer (tests capture output here).
    pub fn start_with(primary: Box<dyn Write + Send>, file: Option<File>) -> Self {
        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let handle = thread::Builder::new()
            .name("faultscan-log-sink".to_string())
            .spawn(move || run_sink(rx, primary, file))
            .ok();
        Self { tx, handle }
    }

    pub fn make_writer(&self) -> ChannelMakeWriter {
        ChannelMakeWriter {
            tx: self.tx.clone(),
        }
    }

    /// Block until every record sent before this call has been written.
    pub fn flush(&self) {
        flush_channel(&self.tx);
    }

    /// Detach the sink thread, returning a guard that flushes on drop.
    pub fn into_guard(mut self) -> LogSinkGuard {
        self.handle.take();
        LogSinkGuard {
            tx: Some(self.tx.clone()),
        }
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        flush_channel(&self.tx);
    }
}

/// Flushes the sink when dropped. Hold it for the lifetime of `main`.
pub struct LogSinkGuard {
    tx: Option<Sender<SinkMessage>>,
}

impl LogSinkGuard {
    /// Guard for a process where tracing was already initialized elsewhere.
    pub fn inert() -> Self {
        Self { tx: None }
    }
}

impl Drop for LogSinkGuard {
    fn drop(&mut self) {
        if let Some(tx) = &self.tx {
            flush_channel(tx);
        }
    }
}

fn flush_channel(tx: &Sender<SinkMessage>) {
    let (ack_tx, ack_rx) = bounded(1);
    if tx.send(SinkMessage::Flush(ack_tx)).is_ok() {
        let _ = ack_rx.recv_timeout(FLUSH_WAIT);
    }
}

fn run_sink(rx: Receiver<SinkMessage>, mut primary: Box<dyn Write + Send>, mut file: Option<File>) {
    for message in rx {
        match message {
            SinkMessage::Record(bytes) => {
                let _ = primary.write_all(&bytes);
                if let Some(f) = file.as_mut() {
                    let _ = f.write_all(&bytes);
                }
            }
            SinkMessage::Flush(ack) => {
                let _ = primary.flush();
                if let Some(f) = file.as_mut() {
                    let _ = f.flush();
                }
                let _ = ack.send(());
            }
        }
    }
}

/// `MakeWriter` handing each event its own buffer.
#[derive(Clone)]
pub struct ChannelMakeWriter {
    tx: Sender<SinkMessage>,
}

impl<'a> MakeWriter<'a> for ChannelMakeWriter {
    type Writer = ChannelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ChannelWriter {
            buf: Vec::new(),
            tx: self.tx.clone(),
        }
    }
}

/// Buffers one formatted record and sends it whole when dropped.
pub struct ChannelWriter {
    buf: Vec<u8>,
    tx: Sender<SinkMessage>,
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            let _ = self.tx.send(SinkMessage::Record(std::mem::take(&mut self.buf)));
        }
    }
}
