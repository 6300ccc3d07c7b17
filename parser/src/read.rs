//! The incremental parser: a pull-based state machine turning a byte
//! stream into a stream of [`DicomPart`]s.
//!
//! The parser recognizes the optional preamble, autodetects the initial
//! encoding, reads the file meta information group, switches to the
//! transfer syntax it announces (including the deflated syntaxes), and
//! walks the data set emitting headers, bounded value chunks and the
//! item and delimitation markers of sequences and fragments.
//!
//! Anomalies which the wire format allows recovering from are logged as
//! warnings; anything else fails the stream with an [`Error`].

use std::io::{Cursor, Read};

use flate2::read::{DeflateDecoder, ZlibDecoder};
use snafu::ResultExt;
use tracing::warn;

use dicom_streams_core::bytes;
use dicom_streams_core::dictionary::{self, tags, uids};
use dicom_streams_core::{Length, Tag, VR};

use crate::error::{
    ImplicitBigEndianNotSupportedSnafu, IoSnafu, NotDicomSnafu, Result, TruncatedSnafu,
};
use crate::part::DicomPart;
use crate::source::ByteSource;

/// The set of options for the parser.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParserOptions {
    /// The maximum number of bytes emitted per value or deflated chunk.
    pub chunk_size: usize,
    /// Whether to inflate deflated data sets on the fly. When disabled,
    /// the compressed bytes are emitted as [`DicomPart::DeflatedChunk`]s.
    pub inflate: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            chunk_size: 8192,
            inflate: true,
        }
    }
}

impl ParserOptions {
    /// Replace the chunk size of the options.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Replace the inflate setting of the options.
    pub fn inflate(mut self, inflate: bool) -> Self {
        self.inflate = inflate;
        self
    }
}

/// Parse the given byte source into a part stream with default options.
pub fn parse<'a, R: Read + 'a>(source: R) -> DicomParser<'a> {
    DicomParser::new(source)
}

/// A streaming parser over a byte source, iterated as a fallible
/// sequence of [`DicomPart`]s.
pub struct DicomParser<'a> {
    source: ByteSource<Box<dyn Read + 'a>>,
    options: ParserOptions,
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    AtBeginning { preamble_read: bool },
    InFmiHeader(FmiState),
    InDatasetHeader(DatasetState),
    InValue(ValueState),
    InFragments(FragmentsState),
    InDeflatedData { big_endian: bool, nowrap: bool },
    Finished,
}

#[derive(Debug, Clone)]
struct FmiState {
    big_endian: bool,
    explicit_vr: bool,
    ts_uid: Option<String>,
    fmi_end_pos: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct DatasetState {
    big_endian: bool,
    explicit_vr: bool,
    item_index: u32,
}

#[derive(Debug, Clone)]
struct ValueState {
    big_endian: bool,
    bytes_left: u64,
    next: Box<State>,
}

#[derive(Debug, Clone, Copy)]
struct FragmentsState {
    big_endian: bool,
    explicit_vr: bool,
    index: u32,
}

enum Step {
    Emit(DicomPart, State),
    Continue(State),
    Complete,
}

struct HeaderInfo {
    tag: Tag,
    vr: Option<VR>,
    header_length: usize,
    value_length: u32,
}

struct Detected {
    big_endian: bool,
    explicit_vr: bool,
    fmi: bool,
}

impl<'a> DicomParser<'a> {
    /// Create a parser over the given byte source with default options.
    pub fn new<R: Read + 'a>(source: R) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    /// Create a parser over the given byte source.
    pub fn with_options<R: Read + 'a>(source: R, options: ParserOptions) -> Self {
        DicomParser {
            source: ByteSource::new(Box::new(source)),
            options,
            state: State::AtBeginning {
                preamble_read: false,
            },
        }
    }

    fn at_beginning(&mut self, preamble_read: bool) -> Result<Step> {
        if !preamble_read {
            self.source.ensure(132).context(IoSnafu)?;
            if self.source.remaining() >= 132 {
                let peeked = self.source.peek(132);
                if &peeked[128..132] == b"DICM" {
                    let bytes = self.source.take(132);
                    return Ok(Step::Emit(
                        DicomPart::Preamble { bytes },
                        State::AtBeginning {
                            preamble_read: true,
                        },
                    ));
                }
            }
        }
        if !self.source.ensure(8).context(IoSnafu)? {
            if self.source.remaining() == 0 {
                return Ok(Step::Complete);
            }
            return NotDicomSnafu.fail();
        }
        let buf = self.source.peek(8).to_vec();
        let detected = detect_encoding(&buf)?;
        if detected.fmi {
            if detected.big_endian {
                warn!("file meta information encoded in big endian");
            }
            if !detected.explicit_vr {
                warn!("file meta information encoded with implicit VR");
            }
            Ok(Step::Continue(State::InFmiHeader(FmiState {
                big_endian: detected.big_endian,
                explicit_vr: detected.explicit_vr,
                ts_uid: None,
                fmi_end_pos: None,
            })))
        } else {
            Ok(Step::Continue(State::InDatasetHeader(DatasetState {
                big_endian: detected.big_endian,
                explicit_vr: detected.explicit_vr,
                item_index: 0,
            })))
        }
    }

    fn in_fmi_header(&mut self, st: FmiState) -> Result<Step> {
        if let Some(end) = st.fmi_end_pos {
            if self.source.position() >= end {
                self.source.ensure(2).context(IoSnafu)?;
                let peeked = self.source.peek(2);
                if peeked.len() == 2 && bytes::read_u16(peeked, st.big_endian) == 0x0002 {
                    // the group length was too short; keep reading file
                    // meta elements until the first data set tag
                    warn!("file meta information group length too short");
                    return self.read_fmi_element(FmiState {
                        fmi_end_pos: None,
                        ..st
                    });
                }
                return self.to_dataset(&st);
            }
        }
        self.read_fmi_element(st)
    }

    fn read_fmi_element(&mut self, mut st: FmiState) -> Result<Step> {
        let Some(info) = self.peek_header(st.big_endian, st.explicit_vr)? else {
            return Ok(Step::Complete);
        };
        if info.tag.group() != 0x0002 {
            warn!(
                "missing or wrong file meta information group length, data set starts at {}",
                info.tag
            );
            return self.to_dataset(&st);
        }
        let header_length = info.header_length;
        if info.tag == tags::FILE_META_INFORMATION_GROUP_LENGTH && info.value_length == 4 {
            if self.source.ensure(header_length + 4).context(IoSnafu)? {
                let peeked = self.source.peek(header_length + 4);
                let group_length = bytes::read_u32(&peeked[header_length..], st.big_endian);
                st.fmi_end_pos = Some(
                    self.source.position() + header_length as u64 + 4 + group_length as u64,
                );
            }
        } else if info.tag == tags::TRANSFER_SYNTAX_UID {
            if info.value_length < 1024 {
                let total = header_length + info.value_length as usize;
                if self.source.ensure(total).context(IoSnafu)? {
                    let peeked = self.source.peek(total);
                    let uid = String::from_utf8_lossy(&peeked[header_length..])
                        .trim_matches(|c| c == ' ' || c == '\0')
                        .to_string();
                    st.ts_uid = Some(uid);
                }
            } else {
                warn!(
                    "transfer syntax UID length {} exceeds sanity limit, ignoring",
                    info.value_length
                );
            }
        }
        let bytes = self.source.take(header_length);
        let part = DicomPart::Header {
            tag: info.tag,
            vr: info.vr.unwrap_or(VR::UN),
            length: info.value_length,
            fmi: true,
            big_endian: st.big_endian,
            explicit_vr: st.explicit_vr,
            bytes,
        };
        let next = if info.value_length > 0 {
            State::InValue(ValueState {
                big_endian: st.big_endian,
                bytes_left: info.value_length as u64,
                next: Box::new(State::InFmiHeader(st)),
            })
        } else {
            State::InFmiHeader(st)
        };
        Ok(Step::Emit(part, next))
    }

    fn to_dataset(&mut self, st: &FmiState) -> Result<Step> {
        let ts = st.ts_uid.clone().unwrap_or_else(|| {
            warn!("transfer syntax not specified, assuming explicit VR little endian");
            uids::EXPLICIT_VR_LITTLE_ENDIAN.to_string()
        });
        if uids::is_deflated(&ts) {
            self.source.ensure(2).context(IoSnafu)?;
            let peeked = self.source.peek(2);
            let zlib = peeked.len() == 2 && peeked[0] == 0x78 && peeked[1] == 0x9C;
            if self.options.inflate {
                self.inflate_source(zlib);
                return Ok(Step::Continue(State::InDatasetHeader(DatasetState {
                    big_endian: false,
                    explicit_vr: true,
                    item_index: 0,
                })));
            }
            return Ok(Step::Continue(State::InDeflatedData {
                big_endian: false,
                nowrap: !zlib,
            }));
        }
        let (big_endian, explicit_vr) = if uids::is_big_endian(&ts) {
            (true, true)
        } else if uids::is_implicit_vr(&ts) {
            (false, false)
        } else {
            (false, true)
        };
        Ok(Step::Continue(State::InDatasetHeader(DatasetState {
            big_endian,
            explicit_vr,
            item_index: 0,
        })))
    }

    fn inflate_source(&mut self, zlib: bool) {
        let empty: Box<dyn Read + 'a> = Box::new(std::io::empty());
        let old = std::mem::replace(&mut self.source, ByteSource::new(empty));
        let (rest, inner) = old.into_parts();
        let chained = Cursor::new(rest).chain(inner);
        let reader: Box<dyn Read + 'a> = if zlib {
            Box::new(ZlibDecoder::new(chained))
        } else {
            Box::new(DeflateDecoder::new(chained))
        };
        self.source = ByteSource::new(reader);
    }

    fn in_dataset_header(&mut self, mut st: DatasetState) -> Result<Step> {
        let Some(info) = self.peek_header(st.big_endian, st.explicit_vr)? else {
            return Ok(Step::Complete);
        };
        if info.tag == tags::ITEM {
            let bytes = self.source.take(8);
            st.item_index += 1;
            let part = DicomPart::Item {
                index: st.item_index,
                length: Length(info.value_length),
                big_endian: st.big_endian,
                bytes,
            };
            return Ok(Step::Emit(part, State::InDatasetHeader(st)));
        }
        if info.tag == tags::ITEM_DELIMITATION_ITEM {
            let bytes = self.source.take(8);
            let part = DicomPart::ItemDelimitation {
                index: st.item_index,
                big_endian: st.big_endian,
                bytes,
            };
            return Ok(Step::Emit(part, State::InDatasetHeader(st)));
        }
        if info.tag == tags::SEQUENCE_DELIMITATION_ITEM {
            let bytes = self.source.take(8);
            st.item_index = 0;
            let part = DicomPart::SequenceDelimitation {
                big_endian: st.big_endian,
                bytes,
            };
            return Ok(Step::Emit(part, State::InDatasetHeader(st)));
        }
        let vr = info.vr.unwrap_or(VR::UN);
        let undefined = info.value_length == 0xFFFF_FFFF;
        if vr == VR::SQ || (vr == VR::UN && undefined) {
            let bytes = self.source.take(info.header_length);
            st.item_index = 0;
            let part = DicomPart::Sequence {
                tag: info.tag,
                length: Length(info.value_length),
                big_endian: st.big_endian,
                explicit_vr: st.explicit_vr,
                bytes,
            };
            return Ok(Step::Emit(part, State::InDatasetHeader(st)));
        }
        if undefined {
            let bytes = self.source.take(info.header_length);
            let part = DicomPart::Fragments {
                tag: info.tag,
                length: Length::UNDEFINED,
                vr,
                big_endian: st.big_endian,
                explicit_vr: st.explicit_vr,
                bytes,
            };
            return Ok(Step::Emit(
                part,
                State::InFragments(FragmentsState {
                    big_endian: st.big_endian,
                    explicit_vr: st.explicit_vr,
                    index: 0,
                }),
            ));
        }
        let bytes = self.source.take(info.header_length);
        let part = DicomPart::Header {
            tag: info.tag,
            vr,
            length: info.value_length,
            fmi: false,
            big_endian: st.big_endian,
            explicit_vr: st.explicit_vr,
            bytes,
        };
        let next = if info.value_length > 0 {
            State::InValue(ValueState {
                big_endian: st.big_endian,
                bytes_left: info.value_length as u64,
                next: Box::new(State::InDatasetHeader(st)),
            })
        } else {
            State::InDatasetHeader(st)
        };
        Ok(Step::Emit(part, next))
    }

    fn in_value(&mut self, st: ValueState) -> Result<Step> {
        let want = st.bytes_left.min(self.options.chunk_size.max(1) as u64) as usize;
        if !self.source.ensure(want).context(IoSnafu)? {
            let bytes = self.source.take(want);
            warn!(
                "stream ended inside a value, emitting {} of {} remaining bytes",
                bytes.len(),
                st.bytes_left
            );
            return Ok(Step::Emit(
                DicomPart::ValueChunk {
                    big_endian: st.big_endian,
                    bytes,
                    last: true,
                },
                State::Finished,
            ));
        }
        let bytes = self.source.take(want);
        let last = st.bytes_left == want as u64;
        let part = DicomPart::ValueChunk {
            big_endian: st.big_endian,
            bytes,
            last,
        };
        let next = if last {
            *st.next
        } else {
            State::InValue(ValueState {
                big_endian: st.big_endian,
                bytes_left: st.bytes_left - want as u64,
                next: st.next,
            })
        };
        Ok(Step::Emit(part, next))
    }

    fn in_fragments(&mut self, mut st: FragmentsState) -> Result<Step> {
        let Some(info) = self.peek_header(st.big_endian, st.explicit_vr)? else {
            warn!("stream ended inside fragments");
            return Ok(Step::Complete);
        };
        if info.tag == tags::ITEM {
            let bytes = self.source.take(8);
            st.index += 1;
            let part = DicomPart::Item {
                index: st.index,
                length: Length(info.value_length),
                big_endian: st.big_endian,
                bytes,
            };
            let next = if info.value_length > 0 {
                State::InValue(ValueState {
                    big_endian: st.big_endian,
                    bytes_left: info.value_length as u64,
                    next: Box::new(State::InFragments(st)),
                })
            } else {
                State::InFragments(st)
            };
            return Ok(Step::Emit(part, next));
        }
        if info.tag == tags::SEQUENCE_DELIMITATION_ITEM {
            let bytes = self.source.take(8);
            let part = DicomPart::SequenceDelimitation {
                big_endian: st.big_endian,
                bytes,
            };
            return Ok(Step::Emit(
                part,
                State::InDatasetHeader(DatasetState {
                    big_endian: st.big_endian,
                    explicit_vr: st.explicit_vr,
                    item_index: 0,
                }),
            ));
        }
        warn!("unexpected element {} inside fragments", info.tag);
        let total = info.header_length + info.value_length as usize;
        if !self.source.ensure(total).context(IoSnafu)? {
            return TruncatedSnafu {
                position: self.source.position(),
            }
            .fail();
        }
        let bytes = self.source.take(total);
        Ok(Step::Emit(
            DicomPart::Unknown {
                big_endian: st.big_endian,
                bytes,
            },
            State::InFragments(st),
        ))
    }

    fn in_deflated(&mut self, big_endian: bool, nowrap: bool) -> Result<Step> {
        let chunk_size = self.options.chunk_size.max(1);
        self.source.ensure(chunk_size).context(IoSnafu)?;
        let bytes = self.source.take(chunk_size);
        if bytes.is_empty() {
            return Ok(Step::Complete);
        }
        Ok(Step::Emit(
            DicomPart::DeflatedChunk {
                big_endian,
                bytes,
                nowrap,
            },
            State::InDeflatedData { big_endian, nowrap },
        ))
    }

    /// Peek the next element header without consuming it. Returns `None`
    /// on a clean end of stream at a header boundary.
    fn peek_header(&mut self, big_endian: bool, explicit_vr: bool) -> Result<Option<HeaderInfo>> {
        if !self.source.ensure(8).context(IoSnafu)? {
            if self.source.remaining() == 0 {
                return Ok(None);
            }
            return TruncatedSnafu {
                position: self.source.position(),
            }
            .fail();
        }
        let buf = self.source.peek(8).to_vec();
        let tag = bytes::read_tag(&buf, big_endian);
        if tag.is_item_marker() {
            return Ok(Some(HeaderInfo {
                tag,
                vr: None,
                header_length: 8,
                value_length: bytes::read_u32(&buf[4..8], big_endian),
            }));
        }
        let info = if explicit_vr {
            let vr = VR::from_binary([buf[4], buf[5]]).unwrap_or(VR::UN);
            if vr.is_long_header() {
                if !self.source.ensure(12).context(IoSnafu)? {
                    return TruncatedSnafu {
                        position: self.source.position(),
                    }
                    .fail();
                }
                let buf = self.source.peek(12).to_vec();
                HeaderInfo {
                    tag,
                    vr: Some(vr),
                    header_length: 12,
                    value_length: bytes::read_u32(&buf[8..12], big_endian),
                }
            } else {
                HeaderInfo {
                    tag,
                    vr: Some(vr),
                    header_length: 8,
                    value_length: bytes::read_u16(&buf[6..8], big_endian) as u32,
                }
            }
        } else {
            HeaderInfo {
                tag,
                vr: Some(dictionary::vr_of(tag)),
                header_length: 8,
                value_length: bytes::read_u32(&buf[4..8], big_endian),
            }
        };
        if info.value_length != 0xFFFF_FFFF && info.value_length % 2 != 0 {
            warn!("element {} has odd value length {}", tag, info.value_length);
        }
        Ok(Some(info))
    }
}

impl Iterator for DicomParser<'_> {
    type Item = Result<DicomPart>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let state = std::mem::replace(&mut self.state, State::Finished);
            let step = match state {
                State::Finished => return None,
                State::AtBeginning { preamble_read } => self.at_beginning(preamble_read),
                State::InFmiHeader(st) => self.in_fmi_header(st),
                State::InDatasetHeader(st) => self.in_dataset_header(st),
                State::InValue(st) => self.in_value(st),
                State::InFragments(st) => self.in_fragments(st),
                State::InDeflatedData { big_endian, nowrap } => {
                    self.in_deflated(big_endian, nowrap)
                }
            };
            match step {
                Ok(Step::Emit(part, next)) => {
                    self.state = next;
                    return Some(Ok(part));
                }
                Ok(Step::Continue(next)) => self.state = next,
                Ok(Step::Complete) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Inspect the first 8 bytes of a stream, trying little endian first,
/// and determine the initial encoding.
fn detect_encoding(buf: &[u8]) -> Result<Detected> {
    for big_endian in [false, true] {
        if let Some(detected) = try_encoding(buf, big_endian)? {
            return Ok(detected);
        }
    }
    NotDicomSnafu.fail()
}

fn try_encoding(buf: &[u8], big_endian: bool) -> Result<Option<Detected>> {
    let tag = bytes::read_tag(buf, big_endian);
    // an unknown leading tag means the byte order guess is wrong, or the
    // data is not DICOM at all
    if dictionary::vr_of(tag) == VR::UN {
        return Ok(None);
    }
    let fmi = tag.is_file_meta_information();
    // explicit VR is only chosen within the file meta information group;
    // a bare data set is read with the length heuristic below, so that
    // implicit length bytes which happen to spell a VR code do not flip
    // the interpretation
    if fmi && VR::from_binary([buf[4], buf[5]]).is_some() {
        return Ok(Some(Detected {
            big_endian,
            explicit_vr: true,
            fmi,
        }));
    }
    if bytes::read_i32(&buf[4..8], big_endian) >= 0 {
        if big_endian {
            return ImplicitBigEndianNotSupportedSnafu.fail();
        }
        return Ok(Some(Detected {
            big_endian: false,
            explicit_vr: false,
            fmi,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn parts_of(data: &[u8]) -> Vec<DicomPart> {
        parse(data)
            .map(|r| r.expect("part stream should not fail"))
            .collect()
    }

    fn concat_bytes(parts: &[DicomPart]) -> Vec<u8> {
        parts.iter().flat_map(|p| p.bytes().to_vec()).collect()
    }

    /// Prefix a bare data set with file meta information announcing
    /// explicit VR little endian. Autodetection only chooses explicit VR
    /// within the file meta information group, so explicit data sets in
    /// these tests need this context. The parsed file meta information
    /// contributes four leading parts (two headers, two value chunks).
    fn with_fmi(dataset: &[u8]) -> Vec<u8> {
        #[rustfmt::skip]
        let mut data = vec![
            // (0002,0000) FileMetaInformationGroupLength, UL, 4: 28
            0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0x1C, 0x00, 0x00, 0x00,
            // (0002,0010) TransferSyntaxUID, UI, 20: explicit VR little endian
            0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x14, 0x00,
        ];
        data.extend_from_slice(b"1.2.840.10008.1.2.1\0");
        data.extend_from_slice(dataset);
        data
    }

    #[test]
    fn autodetect_implicit_little_endian() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, // (0008,0020) StudyDate
            0x08, 0x00, 0x00, 0x00, // length: 8
            b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
        ];
        let parts = parts_of(DATA);
        assert_eq!(
            parts,
            vec![
                DicomPart::Header {
                    tag: Tag(0x0008, 0x0020),
                    vr: VR::DA,
                    length: 8,
                    fmi: false,
                    big_endian: false,
                    explicit_vr: false,
                    bytes: DATA[..8].to_vec(),
                },
                DicomPart::ValueChunk {
                    big_endian: false,
                    bytes: b"20200101".to_vec(),
                    last: true,
                },
            ]
        );
        assert_eq!(concat_bytes(&parts), DATA);
    }

    #[test]
    fn bare_explicit_big_endian_is_not_autodetected() {
        // outside the file meta information group there is no explicit
        // VR detection; the only big endian reading left is implicit,
        // which is not a defined transfer syntax
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x00, 0x08, 0x00, 0x20, // (0008,0020) StudyDate, big endian
            b'D', b'A', 0x00, 0x08, // explicit VR, length 8
            b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
        ];
        let results: Vec<_> = parse(DATA).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(Error::ImplicitBigEndianNotSupported { .. })
        ));
    }

    #[test]
    fn preamble_fmi_and_dataset() {
        let mut data = vec![0u8; 128];
        data.extend_from_slice(b"DICM");
        #[rustfmt::skip]
        data.extend_from_slice(&[
            // (0002,0000) FileMetaInformationGroupLength, UL, 4: 28
            0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0x1C, 0x00, 0x00, 0x00,
            // (0002,0010) TransferSyntaxUID, UI, 20: explicit VR little endian
            0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x14, 0x00,
            b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8',
            b'.', b'1', b'.', b'2', b'.', b'1', 0x00,
            // (0008,0020) StudyDate, DA, 8
            0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00,
            b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
            // (0010,0010) PatientName, PN, 10
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x0A, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n', b' ', b' ',
        ]);
        let parts = parts_of(&data);
        assert!(matches!(&parts[0], DicomPart::Preamble { bytes } if bytes.len() == 132));
        assert!(matches!(
            parts[1],
            DicomPart::Header {
                tag: Tag(0x0002, 0x0000),
                vr: VR::UL,
                length: 4,
                fmi: true,
                ..
            }
        ));
        assert!(matches!(
            parts[3],
            DicomPart::Header {
                tag: Tag(0x0002, 0x0010),
                vr: VR::UI,
                length: 20,
                fmi: true,
                ..
            }
        ));
        assert!(matches!(
            parts[5],
            DicomPart::Header {
                tag: Tag(0x0008, 0x0020),
                vr: VR::DA,
                length: 8,
                fmi: false,
                explicit_vr: true,
                ..
            }
        ));
        assert!(
            matches!(&parts[6], DicomPart::ValueChunk { bytes, last: true, .. } if bytes == b"20200101")
        );
        assert!(matches!(
            parts[7],
            DicomPart::Header {
                tag: Tag(0x0010, 0x0010),
                vr: VR::PN,
                length: 10,
                ..
            }
        ));
        assert!(
            matches!(&parts[8], DicomPart::ValueChunk { bytes, last: true, .. } if bytes == b"Doe^John  ")
        );
        assert_eq!(parts.len(), 9);
        assert_eq!(concat_bytes(&parts), data);
    }

    #[test]
    fn explicit_length_sequence() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (0018,6011) SequenceOfUltrasoundRegions, SQ, length 28
            0x18, 0x00, 0x11, 0x60, b'S', b'Q', 0x00, 0x00, 0x1C, 0x00, 0x00, 0x00,
            // item, length 20
            0xFE, 0xFF, 0x00, 0xE0, 0x14, 0x00, 0x00, 0x00,
            // (0018,6012) RegionSpatialFormat, US, 2: 1
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
            // (0018,6014) RegionDataType, US, 2: 2
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00,
            // (0020,4000) ImageComments, LT, 4
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, b'T', b'E', b'S', b'T',
        ]);
        let parts = parts_of(&data);
        assert!(matches!(
            parts[4],
            DicomPart::Sequence {
                tag: Tag(0x0018, 0x6011),
                length: Length(28),
                ..
            }
        ));
        assert!(matches!(
            parts[5],
            DicomPart::Item {
                index: 1,
                length: Length(20),
                ..
            }
        ));
        assert!(matches!(parts[6], DicomPart::Header { tag: Tag(0x0018, 0x6012), .. }));
        assert!(matches!(parts[8], DicomPart::Header { tag: Tag(0x0018, 0x6014), .. }));
        assert!(matches!(parts[10], DicomPart::Header { tag: Tag(0x0020, 0x4000), .. }));
        assert_eq!(parts.len(), 12);
        assert_eq!(concat_bytes(&parts), data);
    }

    #[test]
    fn indeterminate_sequence_with_delimitations() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (0008,1110) ReferencedStudySequence, SQ, indeterminate
            0x08, 0x00, 0x10, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // item, indeterminate
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // (0020,000D) StudyInstanceUID, UI, 6
            0x20, 0x00, 0x0D, 0x00, b'U', b'I', 0x06, 0x00, b'1', b'.', b'2', b'.', b'3', 0x00,
            // item delimitation
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimitation
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let parts = parts_of(&data);
        assert!(matches!(
            parts[4],
            DicomPart::Sequence { tag: Tag(0x0008, 0x1110), length: Length::UNDEFINED, .. }
        ));
        assert!(matches!(
            parts[5],
            DicomPart::Item { index: 1, length: Length::UNDEFINED, .. }
        ));
        assert!(matches!(parts[6], DicomPart::Header { tag: Tag(0x0020, 0x000D), vr: VR::UI, .. }));
        assert!(matches!(parts[8], DicomPart::ItemDelimitation { index: 1, .. }));
        assert!(matches!(parts[9], DicomPart::SequenceDelimitation { .. }));
        assert_eq!(parts.len(), 10);
        assert_eq!(concat_bytes(&parts), data);
    }

    #[test]
    fn encapsulated_pixel_data_fragments() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (7FE0,0010) PixelData, OB, indeterminate
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // offset table item, 4 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // fragment item, 6 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x06, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6,
            // sequence delimitation
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let parts = parts_of(&data);
        assert!(matches!(
            parts[4],
            DicomPart::Fragments { tag: Tag(0x7FE0, 0x0010), vr: VR::OB, .. }
        ));
        assert!(matches!(parts[5], DicomPart::Item { index: 1, length: Length(4), .. }));
        assert!(matches!(&parts[6], DicomPart::ValueChunk { bytes, last: true, .. } if bytes == &[0, 0, 0, 0]));
        assert!(matches!(parts[7], DicomPart::Item { index: 2, length: Length(6), .. }));
        assert!(matches!(&parts[8], DicomPart::ValueChunk { bytes, last: true, .. } if bytes == &[1, 2, 3, 4, 5, 6]));
        assert!(matches!(parts[9], DicomPart::SequenceDelimitation { .. }));
        assert_eq!(parts.len(), 10);
        assert_eq!(concat_bytes(&parts), data);
    }

    #[test]
    fn values_are_chunked() {
        let mut data = vec![
            0x08, 0x00, 0x20, 0x00, // (0008,0020)
            0x20, 0x00, 0x00, 0x00, // length: 32, implicit VR
        ];
        data.extend_from_slice(&[b'0'; 32]);
        let parts: Vec<_> = DicomParser::with_options(
            &data[..],
            ParserOptions::default().chunk_size(10),
        )
        .map(|r| r.unwrap())
        .collect();
        let chunks: Vec<_> = parts
            .iter()
            .filter_map(|p| match p {
                DicomPart::ValueChunk { bytes, last, .. } => Some((bytes.len(), *last)),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, vec![(10, false), (10, false), (10, false), (2, true)]);
    }

    #[test]
    fn truncation_inside_value_completes_cleanly() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00, // length 8
            b'2', b'0', b'2', b'0', // only 4 value bytes present
        ];
        let parts: Vec<_> = parse(DATA).collect::<Result<_>>().unwrap();
        assert!(matches!(
            &parts[1],
            DicomPart::ValueChunk { bytes, last: true, .. } if bytes == b"2020"
        ));
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn truncation_inside_header_fails() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00,
            b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
            0x10, 0x00, 0x10, 0x00, // partial header
        ];
        let results: Vec<_> = parse(DATA).collect();
        assert!(results[..2].iter().all(|r| r.is_ok()));
        assert!(matches!(results.last(), Some(Err(Error::Truncated { .. }))));
    }

    #[test]
    fn garbage_is_not_dicom() {
        static DATA: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0xCA, 0xFE, 0xBA, 0xBE, 1, 2, 3];
        let results: Vec<_> = parse(DATA).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::NotDicom { .. })));
    }

    #[test]
    fn empty_input_completes_without_parts() {
        let results: Vec<_> = parse(&[][..]).collect();
        assert!(results.is_empty());
    }

    #[test]
    fn unknown_vr_with_defined_length_is_a_value_element() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (0008,0020) written with UN and defined length
            0x08, 0x00, 0x20, 0x00, b'U', b'N', 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xAB, 0xCD,
        ]);
        let parts = parts_of(&data);
        assert!(matches!(
            parts[4],
            DicomPart::Header { vr: VR::UN, length: 2, .. }
        ));
        assert_eq!(parts.len(), 6);
    }

    #[test]
    fn unknown_vr_with_indeterminate_length_is_a_sequence() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            0x08, 0x00, 0x20, 0x00, b'U', b'N', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let parts = parts_of(&data);
        assert!(matches!(parts[4], DicomPart::Sequence { .. }));
        assert!(matches!(parts[5], DicomPart::SequenceDelimitation { .. }));
    }
}
