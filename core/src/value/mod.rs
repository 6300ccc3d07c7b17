//! The value envelope for data elements: a raw byte buffer together with
//! conversions to and from strings, numbers, dates, times and person
//! names, honoring the value representation, the byte order and the
//! active character sets.
//!
//! All conversions are total. A value whose bytes cannot be interpreted
//! in the requested way yields an empty sequence (or `None` at the
//! element level), never an error.

pub mod deserialize;
pub mod person_name;

pub use person_name::{ComponentGroup, PersonName};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};
use smallvec::SmallVec;
use std::fmt;

use crate::bytes;
use crate::header::VR;
use crate::text::CharacterSets;

/// The preferred container type for multi-valued conversion results.
pub type C<T> = SmallVec<[T; 2]>;

/// A raw element value: a byte buffer of even length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Value {
    data: Vec<u8>,
}

impl Value {
    /// Create an empty value.
    pub fn empty() -> Value {
        Value::default()
    }

    /// Create a value from raw bytes, as is.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Value {
        Value { data: data.into() }
    }

    /// The raw bytes of this value.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Unwrap the value into its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// The value length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the value holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pad the value to even length with the padding byte of the given
    /// value representation.
    pub fn ensure_padding(mut self, vr: VR) -> Value {
        if self.data.len() % 2 != 0 {
            self.data.push(vr.padding());
        }
        self
    }

    // --- constructors from typed values ---

    /// Encode a single string with the given character sets.
    pub fn from_string(vr: VR, value: &str, cs: &CharacterSets) -> Value {
        Value {
            data: cs.encode(value),
        }
        .ensure_padding(vr)
    }

    /// Encode multiple string values, separated by backslash.
    pub fn from_strings<S: AsRef<str>>(vr: VR, values: &[S], cs: &CharacterSets) -> Value {
        let joined = values
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("\\");
        Value::from_string(vr, &joined, cs)
    }

    /// Encode 16-bit integer values.
    pub fn from_shorts(vr: VR, values: &[i16], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 2);
        for &v in values {
            match vr {
                VR::US => bytes::put_u16(&mut data, v as u16, big_endian),
                _ => bytes::put_i16(&mut data, v, big_endian),
            }
        }
        Value { data }
    }

    /// Encode 32-bit integer values.
    pub fn from_ints(vr: VR, values: &[i32], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 4);
        for &v in values {
            match vr {
                VR::UL => bytes::put_u32(&mut data, v as u32, big_endian),
                VR::US => bytes::put_u16(&mut data, v as u16, big_endian),
                VR::SS => bytes::put_i16(&mut data, v as i16, big_endian),
                _ => bytes::put_i32(&mut data, v, big_endian),
            }
        }
        Value { data }
    }

    /// Encode 64-bit integer values.
    pub fn from_longs(vr: VR, values: &[i64], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 8);
        for &v in values {
            match vr {
                VR::UL => bytes::put_u32(&mut data, v as u32, big_endian),
                VR::SL => bytes::put_i32(&mut data, v as i32, big_endian),
                VR::US => bytes::put_u16(&mut data, v as u16, big_endian),
                VR::SS => bytes::put_i16(&mut data, v as i16, big_endian),
                VR::UV => bytes::put_u64(&mut data, v as u64, big_endian),
                _ => bytes::put_i64(&mut data, v, big_endian),
            }
        }
        Value { data }
    }

    /// Encode unsigned 64-bit integer values.
    pub fn from_very_longs(vr: VR, values: &[u64], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 8);
        for &v in values {
            bytes::put_u64(&mut data, v, big_endian);
        }
        Value { data }
    }

    /// Encode single precision floating point values.
    pub fn from_floats(vr: VR, values: &[f32], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 4);
        for &v in values {
            match vr {
                VR::FD | VR::OD => bytes::put_f64(&mut data, v as f64, big_endian),
                _ => bytes::put_f32(&mut data, v, big_endian),
            }
        }
        Value { data }
    }

    /// Encode double precision floating point values.
    pub fn from_doubles(vr: VR, values: &[f64], big_endian: bool) -> Value {
        if is_string_vr(vr) {
            return from_number_strings(vr, values);
        }
        let mut data = Vec::with_capacity(values.len() * 8);
        for &v in values {
            match vr {
                VR::FL | VR::OF => bytes::put_f32(&mut data, v as f32, big_endian),
                _ => bytes::put_f64(&mut data, v, big_endian),
            }
        }
        Value { data }
    }

    /// Encode date values.
    pub fn from_dates(values: &[NaiveDate]) -> Value {
        let joined = values
            .iter()
            .map(|d| d.format("%Y%m%d").to_string())
            .collect::<Vec<_>>()
            .join("\\");
        Value::from_bytes(joined.into_bytes()).ensure_padding(VR::DA)
    }

    /// Encode time values.
    pub fn from_times(values: &[NaiveTime]) -> Value {
        let joined = values
            .iter()
            .map(|t| format_time(*t))
            .collect::<Vec<_>>()
            .join("\\");
        Value::from_bytes(joined.into_bytes()).ensure_padding(VR::TM)
    }

    /// Encode date-time values, with an explicit timezone suffix.
    pub fn from_date_times(values: &[DateTime<FixedOffset>]) -> Value {
        let joined = values
            .iter()
            .map(|dt| format_date_time(*dt))
            .collect::<Vec<_>>()
            .join("\\");
        Value::from_bytes(joined.into_bytes()).ensure_padding(VR::DT)
    }

    /// Encode person name values.
    pub fn from_person_names(values: &[PersonName], cs: &CharacterSets) -> Value {
        let joined = values
            .iter()
            .map(|pn| pn.to_dicom_string())
            .collect::<Vec<_>>()
            .join("\\");
        Value::from_string(VR::PN, &joined, cs)
    }

    // --- conversions to typed values ---

    /// Interpret the value as one or more strings.
    ///
    /// Text representations are decoded with the given character sets and
    /// split at backslashes where the representation is multi-valued;
    /// binary numeric representations are formatted as decimal strings.
    pub fn to_strings(&self, vr: VR, big_endian: bool, cs: &CharacterSets) -> C<String> {
        if self.data.is_empty() {
            return C::new();
        }
        match vr {
            // empty values in the middle of a multi-valued string are
            // positional and must be preserved
            _ if is_split_string_vr(vr) => cs
                .decode(vr, &self.data)
                .split('\\')
                .map(|s| trim_text(s, vr).to_string())
                .collect(),
            VR::LT | VR::ST | VR::UT | VR::UR => {
                let s = cs.decode(vr, &self.data);
                let t = trim_text(&s, vr);
                if t.is_empty() {
                    C::new()
                } else {
                    let mut out = C::new();
                    out.push(t.to_string());
                    out
                }
            }
            VR::AT => self
                .data
                .chunks_exact(4)
                .map(|c| bytes::read_tag(c, big_endian).to_string())
                .collect(),
            VR::US => map_chunks(&self.data, 2, |c| bytes::read_u16(c, big_endian).to_string()),
            VR::SS => map_chunks(&self.data, 2, |c| bytes::read_i16(c, big_endian).to_string()),
            VR::UL => map_chunks(&self.data, 4, |c| bytes::read_u32(c, big_endian).to_string()),
            VR::SL => map_chunks(&self.data, 4, |c| bytes::read_i32(c, big_endian).to_string()),
            VR::UV => map_chunks(&self.data, 8, |c| bytes::read_u64(c, big_endian).to_string()),
            VR::SV => map_chunks(&self.data, 8, |c| bytes::read_i64(c, big_endian).to_string()),
            VR::FL => map_chunks(&self.data, 4, |c| bytes::read_f32(c, big_endian).to_string()),
            VR::FD => map_chunks(&self.data, 8, |c| bytes::read_f64(c, big_endian).to_string()),
            _ => C::new(),
        }
    }

    /// Interpret the value as 16-bit integers.
    pub fn to_shorts(&self, vr: VR, big_endian: bool) -> C<i16> {
        match vr {
            VR::US => map_chunks(&self.data, 2, |c| bytes::read_u16(c, big_endian) as i16),
            VR::SS => map_chunks(&self.data, 2, |c| bytes::read_i16(c, big_endian)),
            VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as 32-bit integers.
    ///
    /// Binary representations yield one integer per word; the numeric
    /// string representations yield one integer per parsed string value.
    pub fn to_ints(&self, vr: VR, big_endian: bool) -> C<i32> {
        match vr {
            VR::UL => map_chunks(&self.data, 4, |c| bytes::read_u32(c, big_endian) as i32),
            VR::SL => map_chunks(&self.data, 4, |c| bytes::read_i32(c, big_endian)),
            VR::US => map_chunks(&self.data, 2, |c| bytes::read_u16(c, big_endian) as i32),
            VR::SS => map_chunks(&self.data, 2, |c| bytes::read_i16(c, big_endian) as i32),
            VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as 64-bit integers.
    pub fn to_longs(&self, vr: VR, big_endian: bool) -> C<i64> {
        match vr {
            VR::UL => map_chunks(&self.data, 4, |c| bytes::read_u32(c, big_endian) as i64),
            VR::SL => map_chunks(&self.data, 4, |c| bytes::read_i32(c, big_endian) as i64),
            VR::US => map_chunks(&self.data, 2, |c| bytes::read_u16(c, big_endian) as i64),
            VR::SS => map_chunks(&self.data, 2, |c| bytes::read_i16(c, big_endian) as i64),
            VR::SV => map_chunks(&self.data, 8, |c| bytes::read_i64(c, big_endian)),
            VR::UV => map_chunks(&self.data, 8, |c| bytes::read_u64(c, big_endian) as i64),
            VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as unsigned 64-bit integers.
    pub fn to_very_longs(&self, vr: VR, big_endian: bool) -> C<u64> {
        match vr {
            VR::UV => map_chunks(&self.data, 8, |c| bytes::read_u64(c, big_endian)),
            VR::UL => map_chunks(&self.data, 4, |c| bytes::read_u32(c, big_endian) as u64),
            VR::US => map_chunks(&self.data, 2, |c| bytes::read_u16(c, big_endian) as u64),
            VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as single precision floating point numbers.
    pub fn to_floats(&self, vr: VR, big_endian: bool) -> C<f32> {
        match vr {
            VR::FL | VR::OF => map_chunks(&self.data, 4, |c| bytes::read_f32(c, big_endian)),
            VR::FD => map_chunks(&self.data, 8, |c| bytes::read_f64(c, big_endian) as f32),
            VR::DS | VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as double precision floating point numbers.
    pub fn to_doubles(&self, vr: VR, big_endian: bool) -> C<f64> {
        match vr {
            VR::FD | VR::OD => map_chunks(&self.data, 8, |c| bytes::read_f64(c, big_endian)),
            VR::FL => map_chunks(&self.data, 4, |c| bytes::read_f32(c, big_endian) as f64),
            VR::DS | VR::IS => self.parse_numbers(),
            _ => C::new(),
        }
    }

    /// Interpret the value as dates.
    pub fn to_dates(&self, vr: VR) -> C<NaiveDate> {
        if vr != VR::DA {
            return C::new();
        }
        self.ascii_strings()
            .iter()
            .filter_map(|s| deserialize::parse_date(s))
            .collect()
    }

    /// Interpret the value as times.
    pub fn to_times(&self, vr: VR) -> C<NaiveTime> {
        if vr != VR::TM {
            return C::new();
        }
        self.ascii_strings()
            .iter()
            .filter_map(|s| deserialize::parse_time(s))
            .collect()
    }

    /// Interpret the value as date-times, resolving a missing timezone
    /// suffix with the given offset.
    pub fn to_date_times(&self, vr: VR, default_offset: FixedOffset) -> C<DateTime<FixedOffset>> {
        if vr != VR::DT {
            return C::new();
        }
        self.ascii_strings()
            .iter()
            .filter_map(|s| deserialize::parse_date_time(s, default_offset))
            .collect()
    }

    /// Interpret the value as person names.
    pub fn to_person_names(&self, vr: VR, cs: &CharacterSets) -> C<PersonName> {
        if vr != VR::PN {
            return C::new();
        }
        self.to_strings(vr, false, cs)
            .iter()
            .map(|s| PersonName::parse(s))
            .collect()
    }

    fn parse_numbers<T: std::str::FromStr>(&self) -> C<T> {
        self.ascii_strings()
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    fn ascii_strings(&self) -> C<String> {
        String::from_utf8_lossy(&self.data)
            .split('\\')
            .map(|s| s.trim_matches(|c| c == ' ' || c == '\0').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl From<Vec<u8>> for Value {
    fn from(data: Vec<u8>) -> Value {
        Value { data }
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Value {
        Value {
            data: data.to_vec(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Value({} bytes)", self.data.len())
    }
}

/// Representations whose values are strings.
fn is_string_vr(vr: VR) -> bool {
    is_split_string_vr(vr) || matches!(vr, VR::LT | VR::ST | VR::UT | VR::UR)
}

/// String representations which may hold multiple backslash-separated
/// values.
fn is_split_string_vr(vr: VR) -> bool {
    matches!(
        vr,
        VR::AE
            | VR::AS
            | VR::CS
            | VR::DA
            | VR::DS
            | VR::DT
            | VR::IS
            | VR::LO
            | VR::PN
            | VR::SH
            | VR::TM
            | VR::UC
            | VR::UI
    )
}

fn trim_text(s: &str, vr: VR) -> &str {
    match vr {
        VR::UI => s.trim_matches(|c| c == '\0' || c == ' '),
        _ => s.trim_matches(' '),
    }
}

fn map_chunks<T>(data: &[u8], size: usize, f: impl Fn(&[u8]) -> T) -> C<T> {
    data.chunks_exact(size).map(f).collect()
}

fn from_number_strings<T: ToString>(vr: VR, values: &[T]) -> Value {
    let joined = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\\");
    Value::from_bytes(joined.into_bytes()).ensure_padding(vr)
}

fn format_time(t: NaiveTime) -> String {
    let micro = t.nanosecond() / 1000;
    if micro == 0 {
        t.format("%H%M%S").to_string()
    } else {
        format!("{}.{:06}", t.format("%H%M%S"), micro)
    }
}

fn format_date_time(dt: DateTime<FixedOffset>) -> String {
    let secs = dt.offset().local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.unsigned_abs();
    format!(
        "{}{}{:02}{:02}",
        format_time_part(dt),
        sign,
        secs / 3600,
        secs % 3600 / 60
    )
}

fn format_time_part(dt: DateTime<FixedOffset>) -> String {
    let micro = dt.nanosecond() / 1000;
    if micro == 0 {
        dt.format("%Y%m%d%H%M%S").to_string()
    } else {
        format!("{}.{:06}", dt.format("%Y%m%d%H%M%S"), micro)
    }
}
