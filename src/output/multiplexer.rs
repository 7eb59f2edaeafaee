//! Tagged line multiplexing
//!
//! Each parallel unit gets two drain tasks, one per stream; completed
//! lines flow through one unbounded channel to a single printer task.
//! Order is preserved within one unit's one stream only; lines from
//! different units or from a unit's two streams interleave freely.

use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Column width the sequence index is padded to in tagged output.
const INDEX_PAD: usize = 4;

/// Which stream of the child a line came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    /// Single-character marker used in the tagged output.
    pub fn marker(&self) -> char {
        match self {
            StreamKind::Stdout => 'O',
            StreamKind::Stderr => 'E',
        }
    }
}

/// One line of unit output, tagged with its origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedLine {
    pub index: usize,
    pub stream: StreamKind,
    pub text: String,
}

impl TaggedLine {
    pub fn new(index: usize, stream: StreamKind, text: impl Into<String>) -> Self {
        Self {
            index,
            stream,
            text: text.into(),
        }
    }
}

impl fmt::Display for TaggedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:>width$} {}",
            self.stream.marker(),
            self.index,
            self.text,
            width = INDEX_PAD
        )
    }
}

/// Fan-in channel for tagged lines, paired with the printer draining it
pub struct OutputMultiplexer {
    tx: UnboundedSender<TaggedLine>,
}

impl OutputMultiplexer {
    /// Create the channel and spawn the printer task. The handle resolves
    /// once every sender is dropped and the backlog is flushed.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(print_lines(rx));
        (Self { tx }, printer)
    }

    /// A sender handle for one drain task.
    pub fn sender(&self) -> UnboundedSender<TaggedLine> {
        self.tx.clone()
    }
}

async fn print_lines(mut rx: UnboundedReceiver<TaggedLine>) {
    while let Some(line) = rx.recv().await {
        println!("{line}");
    }
}

/// Drain one stream of one unit: forward each completed line to the
/// printer and keep a copy for the unit's outcome. Returns the captured
/// lines at EOF.
pub async fn drain_stream<R>(
    reader: R,
    index: usize,
    stream: StreamKind,
    tx: UnboundedSender<TaggedLine>,
) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut captured = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        // The printer may already be gone on the fail-fast path.
        let _ = tx.send(TaggedLine::new(index, stream, line.clone()));
        captured.push(line);
    }
    captured
}
