//! Append-only record of a session's console output.
//!
//! Every chunk read from the child's stdout or stderr is stored with its
//! source stream and an arrival sequence number, so the console can be
//! re-rendered from a snapshot at any time.

use serde::{Deserialize, Serialize};

/// Which pipe a chunk was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// A single piece of output as delivered by the OS pipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChunk {
    /// Arrival order within the session, starting at 0.
    pub seq: u64,
    pub source: StreamSource,
    pub text: String,
}

/// Ordered output of one session. Grows monotonically until cleared.
#[derive(Debug, Default)]
pub struct OutputLog {
    chunks: Vec<OutputChunk>,
    next_seq: u64,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the stored copy with its sequence number.
    pub fn append(&mut self, source: StreamSource, text: String) -> OutputChunk {
        let chunk = OutputChunk {
            seq: self.next_seq,
            source,
            text,
        };
        self.next_seq += 1;
        self.chunks.push(chunk.clone());
        chunk
    }

    /// Get all chunks in arrival order.
    pub fn chunks(&self) -> &[OutputChunk] {
        &self.chunks
    }

    /// Get the number of chunks in the log.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drop all chunks. Sequence numbers keep counting so a cleared log never
    /// hands out a number twice.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_arrival_order() {
        let mut log = OutputLog::new();
        let a = log.append(StreamSource::Stdout, "one\n".to_string());
        let b = log.append(StreamSource::Stderr, "two\n".to_string());
        let c = log.append(StreamSource::Stdout, "three\n".to_string());

        assert_eq!((a.seq, b.seq, c.seq), (0, 1, 2));
        assert_eq!(log.len(), 3);
        assert_eq!(log.chunks()[1].source, StreamSource::Stderr);
        let text: String = log.chunks().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = OutputLog::new();
        log.append(StreamSource::Stdout, "hello".to_string());
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.chunks().is_empty());
    }

    #[test]
    fn test_sequence_continues_after_clear() {
        let mut log = OutputLog::new();
        log.append(StreamSource::Stdout, "a".to_string());
        log.clear();
        let chunk = log.append(StreamSource::Stdout, "b".to_string());
        assert_eq!(chunk.seq, 1);
    }

    #[test]
    fn test_chunk_serializes_lowercase_source() {
        let chunk = OutputChunk {
            seq: 4,
            source: StreamSource::Stderr,
            text: "warn".to_string(),
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, r#"{"seq":4,"source":"stderr","text":"warn"}"#);
    }
}
