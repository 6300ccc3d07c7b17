//! Decoding and encoding of text in DICOM data structures, driven by the
//! _Specific Character Set_ (0008,0005) attribute.
//!
//! Besides the single-codec repertoires (ISO 8859 parts, UTF-8, GB18030,
//! TIS 620, Shift JIS), multi-valued specific character sets enable ISO 2022
//! code extensions: escape sequences inside a value switch the active G0/G1
//! code elements until the next delimiter resets them. This mechanism is
//! used in person names and the long text representations, most commonly
//! for Japanese and Korean content.
//!
//! All decoding is fail-soft: bytes which do not form valid text in the
//! active repertoire are replaced, never reported as errors.

use encoding::all::{
    ASCII, GB18030, GBK, ISO_2022_JP, ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5,
    ISO_8859_6, ISO_8859_7, ISO_8859_8, UTF_8, WINDOWS_1254, WINDOWS_31J, WINDOWS_874, WINDOWS_949,
};
use encoding::{DecoderTrap, EncoderTrap, EncodingRef};

use crate::header::VR;

const ESC: u8 = 0x1B;

/// The character sets active for a data set, as listed by the
/// _Specific Character Set_ attribute. An empty list stands for the
/// default repertoire (ISO-IR 6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterSets {
    names: Vec<String>,
}

/// The code element designated by an escape sequence.
#[derive(Clone, Copy)]
enum Active {
    /// A complete codec; segment bytes are decoded directly.
    Single(EncodingRef),
    /// A JIS multi-byte set; the segment is decoded together with its
    /// escape sequence by the ISO 2022 JP codec.
    Jis { esc: [u8; 4], len: usize },
}

impl CharacterSets {
    /// Create a character set configuration from the values of a
    /// _Specific Character Set_ element.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CharacterSets {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The configured specific character set values.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether text for the affected representations is encoded in UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.names.iter().any(|n| n.trim() == "ISO_IR 192")
    }

    /// Decode the given bytes as text of the given value representation.
    ///
    /// Only the representations listed as affected by the specific
    /// character set (SH, LO, ST, LT, PN, UC, UT) are decoded with the
    /// configured repertoires; all others use the default repertoire.
    pub fn decode(&self, vr: VR, bytes: &[u8]) -> String {
        if Self::is_affected(vr) {
            self.decode_extended(bytes, vr == VR::PN)
        } else {
            decode_single(ISO_8859_1, bytes)
        }
    }

    /// Encode a text value with the active repertoire.
    ///
    /// Code extensions are not re-created on encoding: text is written in
    /// UTF-8 whenever ISO-IR 192 is among the configured sets, and with
    /// the initial codec (with replacement of unmappable characters)
    /// otherwise.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let codec: EncodingRef = if self.is_utf8() {
            UTF_8
        } else {
            match self.initial() {
                Active::Single(c) => c,
                Active::Jis { .. } => ASCII,
            }
        };
        codec
            .encode(text, EncoderTrap::Replace)
            .unwrap_or_else(|_| text.as_bytes().to_vec())
    }

    fn is_affected(vr: VR) -> bool {
        matches!(
            vr,
            VR::SH | VR::LO | VR::ST | VR::LT | VR::PN | VR::UC | VR::UT
        )
    }

    fn initial(&self) -> Active {
        let term = self.names.first().map(|s| s.trim()).unwrap_or("");
        Active::Single(codec_for(term).unwrap_or(ASCII))
    }

    fn decode_extended(&self, bytes: &[u8], person_name: bool) -> String {
        let initial = self.initial();
        let mut active = initial;
        let mut out = String::with_capacity(bytes.len());
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == ESC {
                flush(&mut out, active, &bytes[start..i]);
                // designation sequences are three bytes, or four when a
                // multi-byte set is designated with an intermediate byte
                let len = if bytes.len() > i + 2
                    && bytes[i + 1] == 0x24
                    && (bytes[i + 2] == 0x28 || bytes[i + 2] == 0x29)
                {
                    4
                } else {
                    3
                };
                let end = (i + len).min(bytes.len());
                active = designate(active, &bytes[i..end]);
                i = end;
                start = i;
            } else if is_delimiter(b, person_name) && !matches!(active, Active::Jis { .. }) {
                // inside a multi-byte segment such byte values are part
                // of double-byte characters, not delimiters
                flush(&mut out, active, &bytes[start..i]);
                out.push(b as char);
                // delimiters reset the designated code elements
                active = initial;
                i += 1;
                start = i;
            } else {
                i += 1;
            }
        }
        flush(&mut out, active, &bytes[start..]);
        out
    }
}

fn is_delimiter(b: u8, person_name: bool) -> bool {
    matches!(b, b'\\' | 0x09 | 0x0A | 0x0C | 0x0D) || (person_name && matches!(b, b'^' | b'='))
}

fn flush(out: &mut String, active: Active, segment: &[u8]) {
    if segment.is_empty() {
        return;
    }
    match active {
        Active::Single(codec) => out.push_str(&decode_single(codec, segment)),
        Active::Jis { esc, len } => {
            let mut buf = Vec::with_capacity(len + segment.len());
            buf.extend_from_slice(&esc[..len]);
            buf.extend_from_slice(segment);
            out.push_str(&decode_single(ISO_2022_JP, &buf));
        }
    }
}

fn decode_single(codec: EncodingRef, bytes: &[u8]) -> String {
    codec
        .decode(bytes, DecoderTrap::Replace)
        .unwrap_or_default()
}

/// Resolve a designation escape sequence to the code element it selects.
/// Unrecognized sequences leave the active element unchanged.
fn designate(current: Active, esc: &[u8]) -> Active {
    match esc {
        [ESC, 0x28, 0x42] => Active::Single(ASCII),
        // JIS X 0201: romaji in G0, katakana in G1
        [ESC, 0x28, 0x4A] | [ESC, 0x29, 0x49] => Active::Single(WINDOWS_31J),
        [ESC, 0x2D, 0x41] => Active::Single(ISO_8859_1),
        [ESC, 0x2D, 0x42] => Active::Single(ISO_8859_2),
        [ESC, 0x2D, 0x43] => Active::Single(ISO_8859_3),
        [ESC, 0x2D, 0x44] => Active::Single(ISO_8859_4),
        [ESC, 0x2D, 0x4C] => Active::Single(ISO_8859_5),
        [ESC, 0x2D, 0x47] => Active::Single(ISO_8859_6),
        [ESC, 0x2D, 0x46] => Active::Single(ISO_8859_7),
        [ESC, 0x2D, 0x48] => Active::Single(ISO_8859_8),
        [ESC, 0x2D, 0x4D] => Active::Single(WINDOWS_1254),
        [ESC, 0x2D, 0x54] => Active::Single(WINDOWS_874),
        // JIS X 0208 and JIS X 0212
        [ESC, 0x24, 0x42] => Active::Jis {
            esc: [ESC, 0x24, 0x42, 0],
            len: 3,
        },
        [ESC, 0x24, 0x28, 0x44] => Active::Jis {
            esc: [ESC, 0x24, 0x28, 0x44],
            len: 4,
        },
        // KS X 1001 in G1
        [ESC, 0x24, 0x29, 0x43] => Active::Single(WINDOWS_949),
        // GB 2312 in G1
        [ESC, 0x24, 0x29, 0x41] => Active::Single(GBK),
        _ => current,
    }
}

/// Look up the codec of a single specific character set defined term.
fn codec_for(term: &str) -> Option<EncodingRef> {
    let codec: EncodingRef = match term {
        "" | "ISO_IR 6" | "ISO 2022 IR 6" => ASCII,
        "ISO_IR 100" | "ISO 2022 IR 100" => ISO_8859_1,
        "ISO_IR 101" | "ISO 2022 IR 101" => ISO_8859_2,
        "ISO_IR 109" | "ISO 2022 IR 109" => ISO_8859_3,
        "ISO_IR 110" | "ISO 2022 IR 110" => ISO_8859_4,
        "ISO_IR 144" | "ISO 2022 IR 144" => ISO_8859_5,
        "ISO_IR 127" | "ISO 2022 IR 127" => ISO_8859_6,
        "ISO_IR 126" | "ISO 2022 IR 126" => ISO_8859_7,
        "ISO_IR 138" | "ISO 2022 IR 138" => ISO_8859_8,
        "ISO_IR 148" | "ISO 2022 IR 148" => WINDOWS_1254,
        "ISO_IR 166" | "ISO 2022 IR 166" => WINDOWS_874,
        "ISO_IR 13" | "ISO 2022 IR 13" => WINDOWS_31J,
        "ISO 2022 IR 149" => WINDOWS_949,
        "ISO 2022 IR 58" => GBK,
        "ISO_IR 192" => UTF_8,
        "GB18030" => GB18030,
        "GBK" => GBK,
        _ => return None,
    };
    Some(codec)
}
