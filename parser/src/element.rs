//! Element events: the part stream collapsed one step further, with
//! value chunks merged into whole elements.
//!
//! Besides merging chunks, the flow guarantees delimitation events:
//! explicit-length items and sequences do not carry delimitations on the
//! wire, so their ends are derived from byte extents and emitted as
//! synthetic [`Element::ItemDelimitation`] and
//! [`Element::SequenceDelimitation`] events. Consumers therefore see one
//! uniform grammar regardless of the length encoding.

use std::collections::VecDeque;

use dicom_streams_core::{Length, Tag, Value, ValueElement, VR};

use crate::error::Result;
use crate::part::DicomPart;

/// One assembled element event.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A complete value element, chunks merged.
    Value(ValueElement),
    /// The start of an encapsulated pixel data element.
    Fragments {
        /// the attribute tag
        tag: Tag,
        /// the value representation
        vr: VR,
        /// whether the element is encoded in big endian
        big_endian: bool,
        /// whether the element is encoded with an explicit VR header
        explicit_vr: bool,
    },
    /// A complete fragment item, chunks merged. The first item of a
    /// fragments element holds the frame offset table.
    Fragment {
        /// the 1-based item index within the fragments element
        index: u32,
        /// the fragment content
        value: Value,
        /// whether the fragment is encoded in big endian
        big_endian: bool,
    },
    /// The start of a sequence.
    Sequence {
        /// the attribute tag
        tag: Tag,
        /// the encoded content length, indeterminate or explicit
        length: Length,
        /// whether the sequence is encoded in big endian
        big_endian: bool,
        /// whether the sequence is encoded with an explicit VR header
        explicit_vr: bool,
    },
    /// The start of a sequence item.
    Item {
        /// the 1-based item index
        index: u32,
        /// the encoded content length, indeterminate or explicit
        length: Length,
        /// whether the item is encoded in big endian
        big_endian: bool,
    },
    /// The end of an item, read or synthesized.
    ItemDelimitation {
        /// the 1-based index of the closed item
        index: u32,
    },
    /// The end of a sequence or fragments element, read or synthesized.
    SequenceDelimitation,
}

/// The push-based core of the element flow: parts in, element events
/// out.
#[derive(Debug, Default)]
pub struct ElementFlow {
    pending: Option<PendingValue>,
    in_fragments: bool,
    pos: u64,
    extents: Vec<Extent>,
}

#[derive(Debug)]
struct PendingValue {
    tag: Tag,
    vr: VR,
    big_endian: bool,
    explicit_vr: bool,
    fragment_index: Option<u32>,
    buffer: Vec<u8>,
}

/// The byte position at which an explicit-length item or sequence ends.
#[derive(Debug, Clone, Copy)]
struct Extent {
    item: bool,
    index: u32,
    end: u64,
}

impl ElementFlow {
    /// Create a fresh flow.
    pub fn new() -> Self {
        ElementFlow::default()
    }

    /// Feed one part, appending the resulting element events to `out`.
    pub fn push(&mut self, part: &DicomPart, out: &mut Vec<Element>) {
        self.pos += part.bytes().len() as u64;
        match part {
            DicomPart::Preamble { .. }
            | DicomPart::DeflatedChunk { .. }
            | DicomPart::Unknown { .. }
            | DicomPart::Elements { .. } => {}
            DicomPart::Header {
                tag,
                vr,
                length,
                big_endian,
                explicit_vr,
                ..
            } => {
                if *length == 0 {
                    out.push(Element::Value(ValueElement::empty(
                        *tag,
                        *vr,
                        *big_endian,
                        *explicit_vr,
                    )));
                    self.check_extents(out);
                } else {
                    self.pending = Some(PendingValue {
                        tag: *tag,
                        vr: *vr,
                        big_endian: *big_endian,
                        explicit_vr: *explicit_vr,
                        fragment_index: None,
                        buffer: Vec::new(),
                    });
                }
            }
            DicomPart::ValueChunk { bytes, last, .. } => {
                if let Some(pending) = &mut self.pending {
                    pending.buffer.extend_from_slice(bytes);
                    if *last {
                        let pending = self.pending.take().expect("pending value present");
                        let value = Value::from_bytes(pending.buffer);
                        match pending.fragment_index {
                            Some(index) => out.push(Element::Fragment {
                                index,
                                value,
                                big_endian: pending.big_endian,
                            }),
                            None => out.push(Element::Value(ValueElement::new(
                                pending.tag,
                                pending.vr,
                                value,
                                pending.big_endian,
                                pending.explicit_vr,
                            ))),
                        }
                        self.check_extents(out);
                    }
                }
            }
            DicomPart::Sequence {
                tag,
                length,
                big_endian,
                explicit_vr,
                ..
            } => {
                out.push(Element::Sequence {
                    tag: *tag,
                    length: *length,
                    big_endian: *big_endian,
                    explicit_vr: *explicit_vr,
                });
                if let Some(len) = length.get() {
                    self.extents.push(Extent {
                        item: false,
                        index: 0,
                        end: self.pos + len as u64,
                    });
                }
                self.check_extents(out);
            }
            DicomPart::Item {
                index,
                length,
                big_endian,
                ..
            } => {
                if self.in_fragments {
                    if length.get() == Some(0) {
                        out.push(Element::Fragment {
                            index: *index,
                            value: Value::empty(),
                            big_endian: *big_endian,
                        });
                    } else {
                        self.pending = Some(PendingValue {
                            tag: Tag(0xFFFE, 0xE000),
                            vr: VR::OB,
                            big_endian: *big_endian,
                            explicit_vr: false,
                            fragment_index: Some(*index),
                            buffer: Vec::new(),
                        });
                    }
                } else {
                    out.push(Element::Item {
                        index: *index,
                        length: *length,
                        big_endian: *big_endian,
                    });
                    if let Some(len) = length.get() {
                        self.extents.push(Extent {
                            item: true,
                            index: *index,
                            end: self.pos + len as u64,
                        });
                    }
                    self.check_extents(out);
                }
            }
            DicomPart::ItemDelimitation { index, .. } => {
                out.push(Element::ItemDelimitation { index: *index });
                self.check_extents(out);
            }
            DicomPart::SequenceDelimitation { .. } => {
                self.in_fragments = false;
                out.push(Element::SequenceDelimitation);
                self.check_extents(out);
            }
            DicomPart::Fragments {
                tag,
                vr,
                big_endian,
                explicit_vr,
                ..
            } => {
                self.in_fragments = true;
                out.push(Element::Fragments {
                    tag: *tag,
                    vr: *vr,
                    big_endian: *big_endian,
                    explicit_vr: *explicit_vr,
                });
            }
        }
    }

    /// Emit delimitation events for every extent ending at the current
    /// position.
    fn check_extents(&mut self, out: &mut Vec<Element>) {
        while let Some(top) = self.extents.last() {
            if top.end > self.pos {
                break;
            }
            let top = self.extents.pop().expect("extent present");
            if top.item {
                out.push(Element::ItemDelimitation { index: top.index });
            } else {
                out.push(Element::SequenceDelimitation);
            }
        }
    }
}

/// An iterator adapter turning a part stream into element events.
#[derive(Debug)]
pub struct ElementIterator<I> {
    parts: I,
    flow: ElementFlow,
    queue: VecDeque<Element>,
}

impl<I> ElementIterator<I> {
    /// Wrap the given part stream.
    pub fn new(parts: I) -> Self {
        ElementIterator {
            parts,
            flow: ElementFlow::new(),
            queue: VecDeque::new(),
        }
    }
}

impl<I> Iterator for ElementIterator<I>
where
    I: Iterator<Item = Result<DicomPart>>,
{
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.queue.pop_front() {
                return Some(Ok(element));
            }
            match self.parts.next()? {
                Ok(part) => {
                    let mut out = Vec::new();
                    self.flow.push(&part, &mut out);
                    self.queue.extend(out);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
