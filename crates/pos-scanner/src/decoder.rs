//! Frame decoder adapter seam.
//!
//! The barcode library is an external capability. It is attached to a live
//! stream and then reports one [`DecodeAttempt`] per processed frame through
//! a [`FrameSink`], on whatever schedule the host runs it. Deliveries are
//! synchronous and never block; once the receiving session has finished
//! they are dropped.

use crate::camera::MediaStream;
use crate::error::Result;
use std::fmt;
use tokio::sync::mpsc;

/// Result of running the decoder over one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeAttempt {
    /// A barcode was found; the raw text is not yet validated
    Decoded(String),
    /// Nothing recognisable in this frame
    NoMatch,
    /// The decoder hit a transient error (blur, checksum, ...)
    Failed(String),
}

/// A decode attempt tagged with the session generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEvent {
    /// Generation of the session whose sink delivered the event
    pub generation: u64,
    /// What the decoder saw
    pub attempt: DecodeAttempt,
}

/// Inbound channel from the decoder into a scan session.
#[derive(Clone)]
pub struct FrameSink {
    generation: u64,
    tx: mpsc::UnboundedSender<FrameEvent>,
}

impl FrameSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<FrameEvent>) -> Self {
        Self { generation, tx }
    }

    /// Hand one decode attempt to the session.
    ///
    /// Returns `false` when the session has already been torn down; the
    /// attempt is discarded.
    pub fn deliver(&self, attempt: DecodeAttempt) -> bool {
        self.tx
            .send(FrameEvent {
                generation: self.generation,
                attempt,
            })
            .is_ok()
    }

    /// Whether the session stopped listening.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Generation of the session this sink feeds.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSink")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A running decode loop bound to one stream.
pub trait DecoderAttachment: Send {
    /// Stop decoding and free decoder resources.
    fn detach(&mut self);
}

/// Barcode decoder factory.
pub trait FrameDecoder: Send + Sync {
    /// Start decoding frames from `stream`, reporting through `sink`.
    ///
    /// # Errors
    /// Returns a platform error if the decoder cannot bind to the stream.
    fn attach(&self, stream: &dyn MediaStream, sink: FrameSink)
        -> Result<Box<dyn DecoderAttachment>>;
}

/// Owns an attachment and detaches it exactly once.
pub(crate) struct DecoderSession {
    attachment: Option<Box<dyn DecoderAttachment>>,
}

impl DecoderSession {
    pub(crate) fn new(attachment: Box<dyn DecoderAttachment>) -> Self {
        Self {
            attachment: Some(attachment),
        }
    }

    pub(crate) fn release(&mut self) -> bool {
        match self.attachment.take() {
            Some(mut attachment) => {
                attachment.detach();
                true
            }
            None => false,
        }
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        self.release();
    }
}
