//! Processor: drives lines through cache, rules, templates and sequences
//!
//! ```text
//! line ─▶ strip ANSI ─▶ buffering? ──yes──▶ leader? ─▶ flush, start new
//!                          │                 follower? ─▶ append
//!                          │                 neither ─▶ flush, then as idle
//!                          no
//!                          ▼
//!                    cache lookup ──hit──▶ emit
//!                          │miss
//!                          ▼
//!                    first matching rule ─▶ leader? ─▶ start sequence
//!                          │                 otherwise ─▶ render, cache, emit
//!                          ▼
//!                    no match ─▶ pass through, cache, emit
//! ```

use crate::ansi;
use crate::explain::Explainer;
use crate::stats::Counters;
use crate::{
    ExplainKind, ExplainSink, LineCache, MatchResult, Rule, RuleSet, SequenceProcessor, Stats,
    DEFAULT_CACHE_CAPACITY,
};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Per-processor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ProcessorConfig {
    /// Distinct lines remembered by the normalization cache. `0` disables it.
    pub cache_capacity: usize,
    /// Remove ANSI escape sequences before matching.
    pub strip_ansi: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            strip_ansi: true,
        }
    }
}

/// What the cache remembers about a line.
#[derive(Debug, Clone)]
enum Normalized {
    Rendered { rule: String, text: String },
    PassThrough,
    TemplateError { rule: String, field: String },
}

/// One unit of output, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A single normalized (or passed-through) line.
    Line(String),
    /// A completed sequence, emitted atomically.
    Block(Vec<String>),
}

impl Output {
    /// The output lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Line(line) => std::slice::from_ref(line),
            Self::Block(lines) => lines,
        }
    }

    /// Consume into owned lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Self::Line(line) => vec![line],
            Self::Block(lines) => lines,
        }
    }

    /// Write every line followed by `\n`.
    ///
    /// # Errors
    ///
    /// Propagates the writer's error.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for line in self.lines() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Normalizes lines against a shared [`RuleSet`].
///
/// A processor owns its cache, sequence state, counters and explain sink.
/// It can be reused for any number of inputs; the cache, statistics and
/// explain line numbers carry over between them.
///
/// # Example
///
/// ```
/// use lognorm::{Component, Output, Processor, Rule, RuleSet};
/// use std::sync::Arc;
///
/// let question = Rule::new("question", vec![Component::literal("Q: "), Component::field("q")], "[q:{q}]")
///     .unwrap()
///     .with_followers(vec![Rule::follower("more", vec![Component::literal("  "), Component::field("t")]).unwrap()])
///     .unwrap();
/// let mut processor = Processor::new(Arc::new(RuleSet::new(vec![question]).unwrap()));
///
/// assert!(processor.process_line("Q: why").is_empty());
/// assert!(processor.process_line("  because").is_empty());
/// assert_eq!(
///     processor.process_line("done"),
///     vec![
///         Output::Block(vec!["[q:why]".into(), "  because".into()]),
///         Output::Line("done".into()),
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct Processor {
    rules: Arc<RuleSet>,
    config: ProcessorConfig,
    cache: LineCache<Normalized>,
    sequence: SequenceProcessor,
    counters: Counters,
    explain: Explainer,
    line_number: u64,
}

impl Processor {
    /// A processor with [`ProcessorConfig::default`].
    #[must_use]
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self::with_config(rules, ProcessorConfig::default())
    }

    /// A processor with explicit settings.
    #[must_use]
    pub fn with_config(rules: Arc<RuleSet>, config: ProcessorConfig) -> Self {
        tracing::debug!(
            rules = rules.len(),
            cache_capacity = config.cache_capacity,
            strip_ansi = config.strip_ansi,
            "processor created"
        );
        Self {
            cache: LineCache::new(config.cache_capacity),
            rules,
            config,
            sequence: SequenceProcessor::new(),
            counters: Counters::default(),
            explain: Explainer::default(),
            line_number: 0,
        }
    }

    /// Install an explain sink.
    #[must_use]
    pub fn with_explain(mut self, sink: impl ExplainSink + 'static) -> Self {
        self.explain = Explainer::new(Box::new(sink));
        self
    }

    /// Process one line (without its trailing newline).
    ///
    /// Returns the outputs this line completes: nothing while a sequence is
    /// buffering, a flushed block, the line itself, or a block followed by
    /// the line.
    pub fn process_line(&mut self, line: &str) -> Vec<Output> {
        self.line_number += 1;
        self.counters.lines_processed += 1;

        let rules = Arc::clone(&self.rules);
        let text = if self.config.strip_ansi {
            ansi::strip(line)
        } else {
            Cow::Borrowed(line)
        };
        let mut out = Vec::new();

        if self.sequence.is_buffering() {
            // A new leader ends the current sequence even if a follower
            // would also match.
            if let Some((index, rule, m)) = rules.evaluate_rule(&text) {
                if rule.is_leader() {
                    out.extend(self.flush_sequence());
                    self.start_sequence(index, rule, &m, line, &mut out);
                    return out;
                }
            }
            if let Some((follower, m)) = self.sequence.match_follower(&rules, &text) {
                self.append_follower(follower, &m, line);
                return out;
            }
            out.extend(self.flush_sequence());
        }

        self.process_idle(&rules, line, &text, &mut out);
        out
    }

    /// Flush a pending sequence at end of input.
    pub fn finish(&mut self) -> Option<Output> {
        self.flush_sequence()
    }

    /// Lazily normalize `lines`, flushing any pending sequence at the end.
    ///
    /// To stop early, end with [`Normalize::finish`] instead of dropping the
    /// iterator; a dropped iterator leaves the open sequence in the
    /// processor until [`Processor::finish`] is called.
    pub fn normalize<I>(&mut self, lines: I) -> Normalize<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Normalize {
            processor: self,
            lines: lines.into_iter(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Normalize a whole stream, writing each output line followed by `\n`.
    ///
    /// Lines end at `\n` or `\r\n`; the terminator is not part of the line.
    /// Invalid UTF-8 is decoded lossily. A pending sequence is flushed at
    /// end of input and before a read error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first read or write error. After a write error the
    /// pending sequence, if any, stays available through
    /// [`finish`](Self::finish).
    pub fn process_stream<R, W>(&mut self, mut reader: R, mut writer: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let start = self.line_number;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    if let Some(block) = self.finish() {
                        // Best effort: the read error is the one reported.
                        let _ = block.write_to(&mut writer);
                        let _ = writer.flush();
                    }
                    return Err(e);
                }
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf);
            for output in self.process_line(&line) {
                output.write_to(&mut writer)?;
            }
        }
        if let Some(block) = self.finish() {
            block.write_to(&mut writer)?;
        }
        writer.flush()?;

        tracing::debug!(
            lines = self.line_number - start,
            cache_entries = self.cache.len(),
            "stream completed"
        );
        Ok(())
    }

    /// Statistics so far.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.counters
            .snapshot(self.cache.hits(), self.cache.misses())
    }

    /// Returns `true` while a sequence is open.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.sequence.is_buffering()
    }

    /// The shared rules.
    #[must_use]
    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// The processor's settings.
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Number of lines processed so far, across all inputs.
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Forget every cached line. Statistics are kept.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Line handling
    // ═══════════════════════════════════════════════════════════════════════

    fn process_idle(&mut self, rules: &RuleSet, line: &str, text: &str, out: &mut Vec<Output>) {
        if let Some(cached) = self.cache.get(line) {
            out.push(self.emit_cached(cached, line));
            return;
        }

        let Some((index, rule, m)) = rules.evaluate_rule(text) else {
            tracing::trace!(line = self.line_number, "no rule matched");
            self.explain
                .emit(self.line_number, ExplainKind::Unmatched, || {
                    "no rule matched, passing through".to_string()
                });
            self.cache.insert(line, Normalized::PassThrough);
            out.push(Output::Line(line.to_string()));
            return;
        };

        if rule.is_leader() {
            self.start_sequence(index, rule, &m, line, out);
            return;
        }

        self.explain_match(rule, &m);
        match rule.template().render(line, &m.bindings) {
            Ok(rendered) => {
                self.counters.lines_matched += 1;
                tracing::trace!(line = self.line_number, rule = rule.name(), "line normalized");
                self.explain_transform(&rendered);
                self.cache.insert(
                    line,
                    Normalized::Rendered {
                        rule: rule.name().to_string(),
                        text: rendered.clone(),
                    },
                );
                out.push(Output::Line(rendered));
            }
            Err(missing) => {
                self.template_error(rule.name(), &missing.field);
                self.cache.insert(
                    line,
                    Normalized::TemplateError {
                        rule: rule.name().to_string(),
                        field: missing.field,
                    },
                );
                out.push(Output::Line(line.to_string()));
            }
        }
    }

    fn emit_cached(&mut self, cached: Normalized, line: &str) -> Output {
        match cached {
            Normalized::Rendered { rule, text } => {
                self.counters.lines_matched += 1;
                tracing::trace!(line = self.line_number, rule = %rule, cached = true, "line normalized");
                self.explain
                    .emit(self.line_number, ExplainKind::Matched, || {
                        format!("rule \"{rule}\" (cached)")
                    });
                Output::Line(text)
            }
            Normalized::PassThrough => {
                tracing::trace!(line = self.line_number, cached = true, "no rule matched");
                self.explain
                    .emit(self.line_number, ExplainKind::Unmatched, || {
                        "no rule matched, passing through (cached)".to_string()
                    });
                Output::Line(line.to_string())
            }
            Normalized::TemplateError { rule, field } => {
                self.template_error(&rule, &field);
                Output::Line(line.to_string())
            }
        }
    }

    fn start_sequence(
        &mut self,
        index: usize,
        leader: &Rule,
        m: &MatchResult,
        line: &str,
        out: &mut Vec<Output>,
    ) {
        self.explain_match(leader, m);
        match leader.template().render(line, &m.bindings) {
            Ok(rendered) => {
                self.counters.lines_matched += 1;
                self.counters.sequences_started += 1;
                tracing::debug!(
                    line = self.line_number,
                    leader = leader.name(),
                    "sequence started"
                );
                self.explain_transform(&rendered);
                self.explain
                    .emit(self.line_number, ExplainKind::SequenceStarted, || {
                        format!("leader \"{}\"", leader.name())
                    });
                if let Some(previous) = self.sequence.start(index, leader.name(), rendered) {
                    // Only reachable if the caller did not flush first.
                    out.push(Output::Block(previous.lines));
                }
            }
            Err(missing) => {
                self.template_error(leader.name(), &missing.field);
                out.push(Output::Line(line.to_string()));
            }
        }
    }

    fn append_follower(&mut self, follower: &Rule, m: &MatchResult, line: &str) {
        self.explain_match(follower, m);
        let entry = match follower.template().render(line, &m.bindings) {
            Ok(rendered) => {
                self.counters.lines_matched += 1;
                self.explain_transform(&rendered);
                rendered
            }
            Err(missing) => {
                self.template_error(follower.name(), &missing.field);
                line.to_string()
            }
        };
        tracing::trace!(line = self.line_number, follower = follower.name(), "sequence appended");
        self.explain
            .emit(self.line_number, ExplainKind::SequenceAppended, || {
                format!("follower \"{}\"", follower.name())
            });
        self.sequence.append(entry);
    }

    fn flush_sequence(&mut self) -> Option<Output> {
        let flushed = self.sequence.flush()?;
        self.counters.sequences_flushed += 1;
        tracing::debug!(
            leader = %flushed.leader,
            lines = flushed.lines.len(),
            "sequence flushed"
        );
        self.explain
            .emit(self.line_number, ExplainKind::SequenceFlushed, || {
                format!(
                    "leader \"{}\", {} line(s)",
                    flushed.leader,
                    flushed.lines.len()
                )
            });
        Some(Output::Block(flushed.lines))
    }

    fn template_error(&mut self, rule: &str, field: &str) {
        self.counters.template_errors += 1;
        tracing::warn!(
            line = self.line_number,
            rule,
            field,
            "template references unbound field, passing line through"
        );
        self.explain
            .emit(self.line_number, ExplainKind::TemplateError, || {
                format!("rule \"{rule}\": no value for field \"{field}\"")
            });
    }

    fn explain_match(&mut self, rule: &Rule, m: &MatchResult) {
        if !self.explain.enabled() {
            return;
        }
        let line_number = self.line_number;
        self.explain.emit(line_number, ExplainKind::Matched, || {
            format!("rule \"{}\"", rule.name())
        });
        for (name, value) in &m.bindings {
            self.explain
                .emit(line_number, ExplainKind::FieldExtracted, || {
                    format!("{name} = \"{value}\"")
                });
        }
    }

    fn explain_transform(&mut self, rendered: &str) {
        self.explain
            .emit(self.line_number, ExplainKind::TransformApplied, || {
                format!("output \"{rendered}\"")
            });
    }
}

/// Lazy iterator returned by [`Processor::normalize`].
#[derive(Debug)]
pub struct Normalize<'p, I> {
    processor: &'p mut Processor,
    lines: I,
    pending: VecDeque<Output>,
    done: bool,
}

impl<I> Iterator for Normalize<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Output;

    fn next(&mut self) -> Option<Output> {
        loop {
            if let Some(output) = self.pending.pop_front() {
                return Some(output);
            }
            if self.done {
                return None;
            }
            match self.lines.next() {
                Some(line) => self
                    .pending
                    .extend(self.processor.process_line(line.as_ref())),
                None => {
                    self.done = true;
                    self.pending.extend(self.processor.finish());
                }
            }
        }
    }
}

impl<I> Normalize<'_, I> {
    /// Stop consuming input and return what is still owed: outputs already
    /// produced but not yet yielded, then the open sequence as one block.
    pub fn finish(mut self) -> Vec<Output> {
        if !self.done {
            self.done = true;
            self.pending.extend(self.processor.finish());
        }
        self.pending.into_iter().collect()
    }
}
