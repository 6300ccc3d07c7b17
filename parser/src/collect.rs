//! The collect flow: buffer parts while accumulating a selected subset
//! of elements, then release the assembled data set followed by the
//! buffered parts.
//!
//! The flow is a look-ahead window over a part stream. Every incoming
//! part is buffered; in parallel, parts whose tag path satisfies the
//! `collect` predicate are assembled into an [`Elements`] data set. When
//! the `stop` condition fires on a top-level header tag, or upstream
//! ends, the flow emits a synthetic [`DicomPart::Elements`] part, then
//! the buffered parts in arrival order, and switches to pass-through.
//!
//! Buffering is bounded by `max_buffer_size` (0 means unbounded);
//! exceeding the bound fails the stream with
//! [`Error::BufferOverflow`](crate::error::Error).

use std::collections::VecDeque;

use dicom_streams_core::dictionary::tags;
use dicom_streams_core::{Tag, TagPath, TagTree};

use crate::element::{Element, ElementFlow};
use crate::error::{BufferOverflowSnafu, Result};
use crate::part::DicomPart;
use crate::sink::ElementSink;

/// Collect the elements selected by a whitelist of tag trees.
///
/// A part is selected when some tree either extends its tag path or is a
/// prefix of it, so that the structural parts along the trunk of every
/// whitelisted location are included. The flow stops buffering at the
/// first top-level tag beyond the highest whitelisted root tag (or
/// immediately, for an empty whitelist). The _Specific Character Set_
/// element is always collected so that text in the assembled subset
/// decodes correctly.
pub fn collect_from_trees<'a, I>(
    parts: I,
    whitelist: Vec<TagTree>,
    label: &str,
    max_buffer_size: usize,
) -> CollectFlow<'a, I>
where
    I: Iterator<Item = Result<DicomPart>>,
{
    let max_head: Option<Tag> = whitelist.iter().filter_map(|t| t.head_tag()).max();
    let empty = whitelist.is_empty();
    let collect = move |path: &TagPath| {
        whitelist
            .iter()
            .any(|tree| tree.has_trunk(path) || tree.is_trunk_of(path))
    };
    let stop = move |path: &TagPath| empty || (path.is_root() && path.tag() > max_head);
    CollectFlow::new(parts, label, max_buffer_size, collect, stop)
}

enum Phase {
    Buffering,
    PassThrough,
    Done,
}

/// A part stream stage with generic collect and stop conditions.
pub struct CollectFlow<'a, I> {
    parts: I,
    label: String,
    max_buffer_size: usize,
    collect: Box<dyn Fn(&TagPath) -> bool + 'a>,
    stop: Box<dyn Fn(&TagPath) -> bool + 'a>,
    buffer: VecDeque<DicomPart>,
    buffered_bytes: usize,
    flow: ElementFlow,
    tracker: PathTracker,
    sink: ElementSink,
    out: VecDeque<Result<DicomPart>>,
    phase: Phase,
}

impl<'a, I> CollectFlow<'a, I>
where
    I: Iterator<Item = Result<DicomPart>>,
{
    /// Create a collect flow with explicit collect and stop conditions.
    ///
    /// `stop` is evaluated on the root-level tag path of every top-level
    /// header before it is buffered.
    pub fn new(
        parts: I,
        label: &str,
        max_buffer_size: usize,
        collect: impl Fn(&TagPath) -> bool + 'a,
        stop: impl Fn(&TagPath) -> bool + 'a,
    ) -> Self {
        CollectFlow {
            parts,
            label: label.to_string(),
            max_buffer_size,
            collect: Box::new(collect),
            stop: Box::new(stop),
            buffer: VecDeque::new(),
            buffered_bytes: 0,
            flow: ElementFlow::new(),
            tracker: PathTracker::default(),
            sink: ElementSink::new(),
            out: VecDeque::new(),
            phase: Phase::Buffering,
        }
    }

    fn release(&mut self, trailing: Option<DicomPart>) {
        let sink = std::mem::take(&mut self.sink);
        self.out.push_back(Ok(DicomPart::Elements {
            label: self.label.clone(),
            elements: sink.finish(),
        }));
        for part in self.buffer.drain(..) {
            self.out.push_back(Ok(part));
        }
        self.phase = match trailing {
            Some(part) => {
                self.out.push_back(Ok(part));
                Phase::PassThrough
            }
            None => Phase::Done,
        };
    }
}

impl<I> Iterator for CollectFlow<'_, I>
where
    I: Iterator<Item = Result<DicomPart>>,
{
    type Item = Result<DicomPart>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.out.pop_front() {
                return Some(item);
            }
            match self.phase {
                Phase::Done => return None,
                Phase::PassThrough => return self.parts.next(),
                Phase::Buffering => match self.parts.next() {
                    None => self.release(None),
                    Some(Err(e)) => {
                        self.phase = Phase::Done;
                        return Some(Err(e));
                    }
                    Some(Ok(part)) => {
                        if self.tracker.at_root() {
                            if let Some(tag) = part.tag() {
                                if (self.stop)(&TagPath::from_tag(tag)) {
                                    self.release(Some(part));
                                    continue;
                                }
                            }
                        }
                        self.buffered_bytes += part.bytes().len();
                        if self.max_buffer_size > 0 && self.buffered_bytes > self.max_buffer_size
                        {
                            self.phase = Phase::Done;
                            return Some(
                                BufferOverflowSnafu {
                                    size: self.buffered_bytes,
                                    max: self.max_buffer_size,
                                }
                                .fail(),
                            );
                        }
                        let mut events = Vec::new();
                        self.flow.push(&part, &mut events);
                        for event in events {
                            let path = self.tracker.update(&event);
                            let selected = (self.collect)(&path)
                                || path == TagPath::from_tag(tags::SPECIFIC_CHARACTER_SET);
                            if selected {
                                self.sink.update(event);
                            }
                        }
                        self.buffer.push_back(part);
                    }
                },
            }
        }
    }
}

/// Tracks the tag path of each element event as nested structures open
/// and close.
#[derive(Debug, Default)]
struct PathTracker {
    frames: Vec<Frame>,
    fragments_tag: Option<Tag>,
}

#[derive(Debug)]
struct Frame {
    tag: Tag,
    item: Option<u32>,
}

impl PathTracker {
    fn at_root(&self) -> bool {
        self.frames.is_empty()
    }

    fn base(&self, depth: usize) -> TagPath {
        self.frames[..depth]
            .iter()
            .fold(TagPath::empty(), |path, frame| {
                path.then_item(frame.tag, frame.item.unwrap_or(0))
            })
    }

    fn update(&mut self, event: &Element) -> TagPath {
        match event {
            Element::Value(value) => self.base(self.frames.len()).then_tag(value.tag),
            Element::Sequence { tag, .. } => {
                let path = self.base(self.frames.len()).then_sequence(*tag);
                self.frames.push(Frame {
                    tag: *tag,
                    item: None,
                });
                path
            }
            Element::Item { index, .. } => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.item = Some(*index);
                }
                self.base(self.frames.len())
            }
            Element::ItemDelimitation { .. } => {
                let path = self.base(self.frames.len());
                if let Some(frame) = self.frames.last_mut() {
                    frame.item = None;
                }
                path
            }
            Element::SequenceDelimitation => {
                if let Some(tag) = self.fragments_tag.take() {
                    self.base(self.frames.len()).then_tag(tag)
                } else {
                    match self.frames.pop() {
                        Some(frame) => self.base(self.frames.len()).then_sequence(frame.tag),
                        None => TagPath::empty(),
                    }
                }
            }
            Element::Fragments { tag, .. } => {
                self.fragments_tag = Some(*tag);
                self.base(self.frames.len()).then_tag(*tag)
            }
            Element::Fragment { .. } => {
                let tag = self.fragments_tag.unwrap_or(Tag(0, 0));
                self.base(self.frames.len()).then_tag(tag)
            }
        }
    }
}
