//! Explain records: a structured account of why each line came out the way
//! it did.
//!
//! Records are only built when a sink is installed. A processor without a
//! sink pays one branch per decision and formats nothing.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// What happened to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExplainKind {
    /// A rule matched.
    Matched,
    /// No rule matched; the line passes through.
    Unmatched,
    /// A field was bound to a value.
    FieldExtracted,
    /// The output template was applied.
    TransformApplied,
    /// A leader opened a sequence.
    SequenceStarted,
    /// A follower joined the active sequence.
    SequenceAppended,
    /// A sequence was emitted as a block.
    SequenceFlushed,
    /// A template referenced a field with no binding.
    TemplateError,
}

impl ExplainKind {
    /// The snake_case name used in serialized records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
            Self::FieldExtracted => "field_extracted",
            Self::TransformApplied => "transform_applied",
            Self::SequenceStarted => "sequence_started",
            Self::SequenceAppended => "sequence_appended",
            Self::SequenceFlushed => "sequence_flushed",
            Self::TemplateError => "template_error",
        }
    }
}

impl fmt::Display for ExplainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One explain record.
///
/// A line served from the normalization cache gets a single `matched` (or
/// `unmatched`) record marked "(cached)"; the field bindings and the
/// template are not replayed. The records for a line therefore depend on
/// whether it was seen before. Disable the cache for a full account of
/// every line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplainRecord {
    /// 1-based line number, counted across every input the processor has seen.
    pub line_number: u64,
    /// What happened.
    pub kind: ExplainKind,
    /// Human-readable detail.
    pub detail: String,
}

impl fmt::Display for ExplainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {}: {}",
            self.line_number, self.kind, self.detail
        )
    }
}

/// Destination for explain records.
///
/// Implemented for closures taking an [`ExplainRecord`] and for
/// [`ExplainBuffer`].
///
/// ```
/// use lognorm::{ExplainRecord, ExplainSink};
///
/// fn takes_sink(_: impl ExplainSink) {}
/// takes_sink(|record: ExplainRecord| eprintln!("EXPLAIN: {record}"));
/// ```
pub trait ExplainSink: Send {
    /// Receive one record.
    fn record(&mut self, record: ExplainRecord);
}

impl<F> ExplainSink for F
where
    F: FnMut(ExplainRecord) + Send,
{
    fn record(&mut self, record: ExplainRecord) {
        self(record);
    }
}

/// A cloneable collector: every clone appends to the same list.
///
/// Install one clone as a processor's sink, keep another to read records.
///
/// ```
/// use lognorm::ExplainBuffer;
///
/// let buffer = ExplainBuffer::new();
/// let reader = buffer.clone();
/// assert!(reader.take().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExplainBuffer {
    records: Arc<Mutex<Vec<ExplainRecord>>>,
}

impl ExplainBuffer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every record collected so far.
    #[must_use]
    pub fn take(&self) -> Vec<ExplainRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Copy of the records collected so far.
    #[must_use]
    pub fn records(&self) -> Vec<ExplainRecord> {
        self.lock().clone()
    }

    /// Number of records collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ExplainRecord>> {
        // A panic while pushing cannot leave the Vec half-written.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExplainSink for ExplainBuffer {
    fn record(&mut self, record: ExplainRecord) {
        self.lock().push(record);
    }
}

/// A processor's explain channel. Disabled unless a sink is installed.
#[derive(Default)]
pub(crate) struct Explainer {
    sink: Option<Box<dyn ExplainSink>>,
}

impl Explainer {
    pub(crate) fn new(sink: Box<dyn ExplainSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit a record. `detail` is only called when a sink is installed.
    pub(crate) fn emit<D>(&mut self, line_number: u64, kind: ExplainKind, detail: D)
    where
        D: FnOnce() -> String,
    {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(ExplainRecord {
                line_number,
                kind,
                detail: detail(),
            });
        }
    }
}

impl fmt::Debug for Explainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explainer")
            .field("enabled", &self.enabled())
            .finish()
    }
}
