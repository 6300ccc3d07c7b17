//! The part stream schema: the smallest pieces of structured DICOM data
//! emitted by the parser.
//!
//! Concatenating the raw bytes of every part (including value chunk
//! bytes) in emission order reproduces the original input, except when
//! the parser is inflating a deflated data set, in which case the bytes
//! reproduce the inflated stream.

use std::fmt;

use dicom_streams_core::{Elements, Length, Tag, VR};

/// One part of a DICOM part stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DicomPart {
    /// The 132 leading bytes: a 128-byte application-defined preamble
    /// followed by the magic code `DICM`.
    Preamble {
        /// the raw preamble and magic bytes
        bytes: Vec<u8>,
    },
    /// A data element header. Always followed by the element's value
    /// chunks when `length` is positive.
    Header {
        /// the attribute tag
        tag: Tag,
        /// the value representation
        vr: VR,
        /// the value length in bytes
        length: u32,
        /// whether the element belongs to the file meta information
        fmi: bool,
        /// whether the element is encoded in big endian
        big_endian: bool,
        /// whether the element is encoded with an explicit VR header
        explicit_vr: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// A chunk of value data for the preceding header or fragment item.
    ValueChunk {
        /// whether the value is encoded in big endian
        big_endian: bool,
        /// the chunk data
        bytes: Vec<u8>,
        /// whether this is the final chunk of the value
        last: bool,
    },
    /// The start of a sequence of items.
    Sequence {
        /// the attribute tag
        tag: Tag,
        /// the encoded content length, indeterminate or explicit
        length: Length,
        /// whether the sequence is encoded in big endian
        big_endian: bool,
        /// whether the sequence is encoded with an explicit VR header
        explicit_vr: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// The start of an item, in a sequence or in a fragments element.
    Item {
        /// the 1-based item index
        index: u32,
        /// the encoded content length, indeterminate or explicit
        length: Length,
        /// whether the item is encoded in big endian
        big_endian: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// The delimitation closing an indeterminate-length item.
    ItemDelimitation {
        /// the 1-based index of the closed item
        index: u32,
        /// whether the item is encoded in big endian
        big_endian: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// The delimitation closing an indeterminate-length sequence or a
    /// fragments element.
    SequenceDelimitation {
        /// whether the sequence is encoded in big endian
        big_endian: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// The start of an encapsulated pixel data element.
    Fragments {
        /// the attribute tag
        tag: Tag,
        /// the encoded length (always indeterminate)
        length: Length,
        /// the value representation
        vr: VR,
        /// whether the element is encoded in big endian
        big_endian: bool,
        /// whether the element is encoded with an explicit VR header
        explicit_vr: bool,
        /// the raw header bytes
        bytes: Vec<u8>,
    },
    /// A chunk of deflated data, emitted when inflation is disabled.
    DeflatedChunk {
        /// whether the inflated data is encoded in big endian
        big_endian: bool,
        /// the compressed data
        bytes: Vec<u8>,
        /// whether the data is raw deflate rather than zlib-wrapped
        nowrap: bool,
    },
    /// An unrecognized piece of data, consumed and passed on verbatim.
    Unknown {
        /// whether the stream is encoded in big endian
        big_endian: bool,
        /// the raw bytes
        bytes: Vec<u8>,
    },
    /// A synthetic part carrying a data set assembled by the collect
    /// flow. Does not correspond to any stream bytes.
    Elements {
        /// the label given to the collect flow
        label: String,
        /// the assembled data set
        elements: Elements,
    },
}

impl DicomPart {
    /// The raw stream bytes of this part. Synthetic parts yield an empty
    /// slice.
    pub fn bytes(&self) -> &[u8] {
        match self {
            DicomPart::Preamble { bytes }
            | DicomPart::Header { bytes, .. }
            | DicomPart::ValueChunk { bytes, .. }
            | DicomPart::Sequence { bytes, .. }
            | DicomPart::Item { bytes, .. }
            | DicomPart::ItemDelimitation { bytes, .. }
            | DicomPart::SequenceDelimitation { bytes, .. }
            | DicomPart::Fragments { bytes, .. }
            | DicomPart::DeflatedChunk { bytes, .. }
            | DicomPart::Unknown { bytes, .. } => bytes,
            DicomPart::Elements { .. } => &[],
        }
    }

    /// The attribute tag of this part, for the parts which carry one.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            DicomPart::Header { tag, .. }
            | DicomPart::Sequence { tag, .. }
            | DicomPart::Fragments { tag, .. } => Some(*tag),
            _ => None,
        }
    }
}

impl fmt::Display for DicomPart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DicomPart::Preamble { .. } => write!(f, "Preamble"),
            DicomPart::Header { tag, vr, length, .. } => {
                write!(f, "Header({}, {}, {} bytes)", tag, vr, length)
            }
            DicomPart::ValueChunk { bytes, last, .. } => {
                write!(f, "ValueChunk({} bytes, last = {})", bytes.len(), last)
            }
            DicomPart::Sequence { tag, length, .. } => write!(f, "Sequence({}, {})", tag, length),
            DicomPart::Item { index, length, .. } => write!(f, "Item({}, {})", index, length),
            DicomPart::ItemDelimitation { index, .. } => write!(f, "ItemDelimitation({})", index),
            DicomPart::SequenceDelimitation { .. } => write!(f, "SequenceDelimitation"),
            DicomPart::Fragments { tag, vr, .. } => write!(f, "Fragments({}, {})", tag, vr),
            DicomPart::DeflatedChunk { bytes, nowrap, .. } => {
                write!(f, "DeflatedChunk({} bytes, nowrap = {})", bytes.len(), nowrap)
            }
            DicomPart::Unknown { bytes, .. } => write!(f, "Unknown({} bytes)", bytes.len()),
            DicomPart::Elements { label, elements } => {
                write!(f, "Elements({}, {})", label, elements)
            }
        }
    }
}
