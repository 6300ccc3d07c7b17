//! The in-memory data set model: an ordered collection of value elements,
//! sequences and fragments, with tag and tag-path based access.
//!
//! [`Elements`] presents value semantics: every mutation returns a new
//! instance, leaving the receiver untouched. Two invariants hold at all
//! times: the elements are strictly ascending by tag at every nesting
//! level, and every stored value has even length.

mod builder;
pub mod serialize;

pub use builder::ElementsBuilder;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use snafu::{Backtrace, Snafu};
use std::fmt;

use crate::dictionary::{self, tags};
use crate::header::{Length, Tag, VR};
use crate::tagpath::TagPath;
use crate::text::CharacterSets;
use crate::value::{deserialize, PersonName, Value, C};

/// Error raised when the shape of a tag path does not fit the operation
/// or the addressed structure.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InvalidPathError {
    /// An intermediate path step does not address a sequence item.
    #[snafu(display("tag path step {} does not address an item", step))]
    NotAnItemStep {
        /// display form of the offending step
        step: String,
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The final path step should address a sequence.
    #[snafu(display("tag path must end in a sequence step"))]
    NotASequencePath {
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The final path step should address an item.
    #[snafu(display("tag path must end in an item step"))]
    NotAnItemPath {
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The path addresses a sequence or item which is not present.
    #[snafu(display("no sequence item at {}", step))]
    Unreachable {
        /// display form of the missing step
        step: String,
        /// error backtrace
        backtrace: Backtrace,
    },
}

type Result<T, E = InvalidPathError> = std::result::Result<T, E>;

/// A plain data element holding a raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueElement {
    /// the attribute tag
    pub tag: Tag,
    /// the value representation
    pub vr: VR,
    /// the raw value
    pub value: Value,
    /// whether the element is encoded in big endian
    pub big_endian: bool,
    /// whether the element is encoded with an explicit VR header
    pub explicit_vr: bool,
}

impl ValueElement {
    /// Create a value element, padding the value to even length.
    pub fn new(tag: Tag, vr: VR, value: Value, big_endian: bool, explicit_vr: bool) -> Self {
        ValueElement {
            tag,
            vr,
            value: value.ensure_padding(vr),
            big_endian,
            explicit_vr,
        }
    }

    /// Create an empty value element.
    pub fn empty(tag: Tag, vr: VR, big_endian: bool, explicit_vr: bool) -> Self {
        ValueElement::new(tag, vr, Value::empty(), big_endian, explicit_vr)
    }

    /// The value length in bytes.
    pub fn length(&self) -> Length {
        Length(self.value.len() as u32)
    }

    /// Encode this element as header and value bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = serialize::header_bytes(
            self.tag,
            Some(self.vr),
            self.value.len() as u32,
            self.big_endian,
            self.explicit_vr,
        );
        out.extend_from_slice(self.value.bytes());
        out
    }
}

/// One item of a sequence, holding a nested data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// the nested data set
    pub elements: Elements,
    /// the encoded content length, indeterminate or explicit
    pub length: Length,
    /// whether the item is encoded in big endian
    pub big_endian: bool,
}

impl Item {
    /// Create an item with the given encoded length.
    pub fn new(elements: Elements, length: Length, big_endian: bool) -> Self {
        Item {
            elements,
            length,
            big_endian,
        }
    }

    /// Create an item of indeterminate length.
    pub fn indeterminate(elements: Elements, big_endian: bool) -> Self {
        Item::new(elements, Length::UNDEFINED, big_endian)
    }

    /// Create an item with an explicit length matching its content.
    pub fn explicit(elements: Elements, big_endian: bool) -> Self {
        let length = Length(elements.dataset_bytes().len() as u32);
        Item::new(elements, length, big_endian)
    }

    /// Whether the item is encoded with indeterminate length.
    pub fn is_indeterminate(&self) -> bool {
        self.length.is_undefined()
    }

    /// Encode this item as header, content and, for indeterminate items,
    /// a trailing item delimitation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let content = self.elements.dataset_bytes();
        let length = if self.is_indeterminate() {
            Length::UNDEFINED
        } else {
            Length(content.len() as u32)
        };
        let mut out = serialize::item_bytes(length, self.big_endian);
        out.extend_from_slice(&content);
        if self.is_indeterminate() {
            out.extend_from_slice(&serialize::item_delimitation_bytes(self.big_endian));
        }
        out
    }
}

/// A sequence element: a list of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// the attribute tag
    pub tag: Tag,
    /// the encoded content length, indeterminate or explicit
    pub length: Length,
    /// the items of the sequence
    pub items: Vec<Item>,
    /// whether the sequence is encoded in big endian
    pub big_endian: bool,
    /// whether the sequence is encoded with an explicit VR header
    pub explicit_vr: bool,
}

impl Sequence {
    /// Create a sequence from its parts.
    pub fn new(
        tag: Tag,
        length: Length,
        items: Vec<Item>,
        big_endian: bool,
        explicit_vr: bool,
    ) -> Self {
        Sequence {
            tag,
            length,
            items,
            big_endian,
            explicit_vr,
        }
    }

    /// Create an empty sequence with the given encoded length.
    pub fn empty(tag: Tag, length: Length, big_endian: bool, explicit_vr: bool) -> Self {
        Sequence::new(tag, length, Vec::new(), big_endian, explicit_vr)
    }

    /// The value representation of any sequence.
    pub fn vr(&self) -> VR {
        VR::SQ
    }

    /// Whether the sequence is encoded with indeterminate length.
    pub fn is_indeterminate(&self) -> bool {
        self.length.is_undefined()
    }

    /// The number of items.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Access an item by its 1-based index.
    pub fn item(&self, index: usize) -> Option<&Item> {
        index.checked_sub(1).and_then(|i| self.items.get(i))
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for item in &self.items {
            out.extend_from_slice(&item.to_bytes());
        }
        out
    }

    /// Encode this sequence as header, items and, for indeterminate
    /// sequences, a trailing sequence delimitation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let content = self.content_bytes();
        let length = if self.is_indeterminate() {
            0xFFFF_FFFF
        } else {
            content.len() as u32
        };
        let mut out = serialize::header_bytes(
            self.tag,
            Some(VR::SQ),
            length,
            self.big_endian,
            self.explicit_vr,
        );
        out.extend_from_slice(&content);
        if self.is_indeterminate() {
            out.extend_from_slice(&serialize::sequence_delimitation_bytes(self.big_endian));
        }
        out
    }
}

/// One fragment of an encapsulated pixel data element.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// the fragment content length in bytes
    pub length: u32,
    /// the fragment content
    pub value: Value,
    /// whether the fragment is encoded in big endian
    pub big_endian: bool,
}

impl Fragment {
    /// Create a fragment from its content.
    pub fn new(value: Value, big_endian: bool) -> Self {
        Fragment {
            length: value.len() as u32,
            value,
            big_endian,
        }
    }
}

/// An encapsulated pixel data element: an optional frame offset table
/// followed by byte fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragments {
    /// the attribute tag
    pub tag: Tag,
    /// the value representation
    pub vr: VR,
    /// the frame offsets; absent when no item has been seen, present and
    /// possibly empty otherwise
    pub offsets: Option<Vec<u64>>,
    /// the data fragments
    pub fragments: Vec<Fragment>,
    /// whether the element is encoded in big endian
    pub big_endian: bool,
    /// whether the element is encoded with an explicit VR header
    pub explicit_vr: bool,
}

impl Fragments {
    /// Create an encapsulated pixel data element with no items.
    pub fn empty(tag: Tag, vr: VR, big_endian: bool, explicit_vr: bool) -> Self {
        Fragments {
            tag,
            vr,
            offsets: None,
            fragments: Vec::new(),
            big_endian,
            explicit_vr,
        }
    }

    /// The number of frames described by this element.
    pub fn frame_count(&self) -> usize {
        match &self.offsets {
            None if self.fragments.is_empty() => 0,
            None => 1,
            Some(offsets) => offsets.len(),
        }
    }

    /// Iterate over the frames: the concatenated fragment bytes split at
    /// the offset table boundaries.
    pub fn frame_iter(&self) -> impl Iterator<Item = Vec<u8>> {
        let mut data = Vec::new();
        for f in &self.fragments {
            data.extend_from_slice(f.value.bytes());
        }
        let bounds: Vec<usize> = match &self.offsets {
            None if self.fragments.is_empty() => Vec::new(),
            None => vec![0],
            Some(offsets) => offsets.iter().map(|&o| o as usize).collect(),
        };
        let mut frames = Vec::with_capacity(bounds.len());
        for (i, &start) in bounds.iter().enumerate() {
            let end = bounds.get(i + 1).copied().unwrap_or(data.len());
            let start = start.min(data.len());
            let end = end.clamp(start, data.len());
            frames.push(data[start..end].to_vec());
        }
        frames.into_iter()
    }

    /// Encode this element as header, offset table item, fragment items
    /// and the closing sequence delimitation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = serialize::header_bytes(
            self.tag,
            Some(self.vr),
            0xFFFF_FFFF,
            self.big_endian,
            self.explicit_vr,
        );
        if let Some(offsets) = &self.offsets {
            out.extend_from_slice(&serialize::item_bytes(
                Length(offsets.len() as u32 * 4),
                self.big_endian,
            ));
            for &offset in offsets {
                crate::bytes::put_u32(&mut out, offset as u32, self.big_endian);
            }
        }
        for fragment in &self.fragments {
            out.extend_from_slice(&serialize::item_bytes(
                Length(fragment.length),
                self.big_endian,
            ));
            out.extend_from_slice(fragment.value.bytes());
        }
        out.extend_from_slice(&serialize::sequence_delimitation_bytes(self.big_endian));
        out
    }
}

/// Any element of a data set: a plain value, a sequence of items, or
/// encapsulated pixel data fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSet {
    /// a plain value element
    Value(ValueElement),
    /// a sequence of items
    Sequence(Sequence),
    /// encapsulated pixel data fragments
    Fragments(Fragments),
}

impl ElementSet {
    /// The attribute tag.
    pub fn tag(&self) -> Tag {
        match self {
            ElementSet::Value(e) => e.tag,
            ElementSet::Sequence(e) => e.tag,
            ElementSet::Fragments(e) => e.tag,
        }
    }

    /// The value representation.
    pub fn vr(&self) -> VR {
        match self {
            ElementSet::Value(e) => e.vr,
            ElementSet::Sequence(_) => VR::SQ,
            ElementSet::Fragments(e) => e.vr,
        }
    }

    /// Whether the element is encoded in big endian.
    pub fn big_endian(&self) -> bool {
        match self {
            ElementSet::Value(e) => e.big_endian,
            ElementSet::Sequence(e) => e.big_endian,
            ElementSet::Fragments(e) => e.big_endian,
        }
    }

    /// Whether the element is encoded with an explicit VR header.
    pub fn explicit_vr(&self) -> bool {
        match self {
            ElementSet::Value(e) => e.explicit_vr,
            ElementSet::Sequence(e) => e.explicit_vr,
            ElementSet::Fragments(e) => e.explicit_vr,
        }
    }

    /// Encode this element in full.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ElementSet::Value(e) => e.to_bytes(),
            ElementSet::Sequence(e) => e.to_bytes(),
            ElementSet::Fragments(e) => e.to_bytes(),
        }
    }
}

/// An immutable data set: element sets strictly ordered by tag, together
/// with the character sets and timezone offset they establish.
#[derive(Debug, Clone)]
pub struct Elements {
    data: Vec<ElementSet>,
    character_sets: CharacterSets,
    zone_offset: FixedOffset,
}

/// Equality considers the element data only. The character sets and the
/// zone offset are derived state: at the root they follow from the data,
/// and in nested data sets they may additionally be inherited from the
/// enclosing context.
impl PartialEq for Elements {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Default for Elements {
    fn default() -> Self {
        Elements {
            data: Vec::new(),
            character_sets: CharacterSets::default(),
            zone_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }
}

macro_rules! typed_getters {
    ($(#[$meta:meta])* $single:ident, $multi:ident, $single_path:ident, $t:ty, $conv:expr) => {
        $(#[$meta])*
        pub fn $multi(&self, tag: Tag) -> C<$t> {
            let conv: fn(&Elements, &ValueElement) -> C<$t> = $conv;
            self.value_element(tag)
                .map(|e| conv(self, e))
                .unwrap_or_default()
        }

        $(#[$meta])*
        pub fn $single(&self, tag: Tag) -> Option<$t> {
            self.$multi(tag).into_iter().next()
        }

        $(#[$meta])*
        pub fn $single_path(&self, path: &TagPath) -> Option<$t> {
            let (elements, tag) = self.leaf_context(path)?;
            elements.$single(tag)
        }
    };
}

impl Elements {
    /// Create an empty data set.
    pub fn empty() -> Elements {
        Elements::default()
    }

    /// The character sets established by this data set's
    /// _Specific Character Set_ element.
    pub fn character_sets(&self) -> &CharacterSets {
        &self.character_sets
    }

    /// The timezone offset established by this data set's
    /// _Timezone Offset From UTC_ element.
    pub fn zone_offset(&self) -> FixedOffset {
        self.zone_offset
    }

    /// The number of elements at this level.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the elements in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &ElementSet> {
        self.data.iter()
    }

    /// The first element in tag order.
    pub fn head(&self) -> Option<&ElementSet> {
        self.data.first()
    }

    /// A copy with the elements re-sorted by tag. The data is kept sorted
    /// by every mutation, so this is only useful after constructing from
    /// unchecked input.
    pub fn sorted(&self) -> Elements {
        let mut out = self.clone();
        out.data.sort_by_key(|e| e.tag());
        out
    }

    /// Keep only the elements satisfying the predicate.
    pub fn filter(&self, predicate: impl Fn(&ElementSet) -> bool) -> Elements {
        let mut out = self.clone();
        out.data.retain(|e| predicate(e));
        out.refresh_context();
        out
    }

    // --- access by tag ---

    /// Access the element with the given tag.
    pub fn element(&self, tag: Tag) -> Option<&ElementSet> {
        self.data
            .binary_search_by_key(&tag, |e| e.tag())
            .ok()
            .map(|i| &self.data[i])
    }

    /// Whether an element with the given tag is present.
    pub fn contains(&self, tag: Tag) -> bool {
        self.element(tag).is_some()
    }

    fn value_element(&self, tag: Tag) -> Option<&ValueElement> {
        match self.element(tag) {
            Some(ElementSet::Value(e)) => Some(e),
            _ => None,
        }
    }

    /// Access the sequence with the given tag.
    pub fn get_sequence(&self, tag: Tag) -> Option<&Sequence> {
        match self.element(tag) {
            Some(ElementSet::Sequence(s)) => Some(s),
            _ => None,
        }
    }

    /// Access the encapsulated pixel data element with the given tag.
    pub fn get_fragments(&self, tag: Tag) -> Option<&Fragments> {
        match self.element(tag) {
            Some(ElementSet::Fragments(f)) => Some(f),
            _ => None,
        }
    }

    /// Access an item of the sequence with the given tag, by 1-based
    /// index.
    pub fn get_item(&self, tag: Tag, index: usize) -> Option<&Item> {
        self.get_sequence(tag).and_then(|s| s.item(index))
    }

    /// Access the data set nested in an item of the sequence with the
    /// given tag, by 1-based index.
    pub fn get_nested(&self, tag: Tag, index: usize) -> Option<&Elements> {
        self.get_item(tag, index).map(|i| &i.elements)
    }

    /// Access the raw bytes of the value element with the given tag.
    pub fn get_bytes(&self, tag: Tag) -> Option<&[u8]> {
        self.value_element(tag).map(|e| e.value.bytes())
    }

    typed_getters!(
        /// Get string values.
        get_string,
        get_strings,
        get_string_by_path,
        String,
        |e, v| v.value.to_strings(v.vr, v.big_endian, &e.character_sets)
    );

    typed_getters!(
        /// Get 16-bit integer values.
        get_short,
        get_shorts,
        get_short_by_path,
        i16,
        |_, v| v.value.to_shorts(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get 32-bit integer values.
        get_int,
        get_ints,
        get_int_by_path,
        i32,
        |_, v| v.value.to_ints(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get 64-bit integer values.
        get_long,
        get_longs,
        get_long_by_path,
        i64,
        |_, v| v.value.to_longs(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get unsigned 64-bit integer values.
        get_very_long,
        get_very_longs,
        get_very_long_by_path,
        u64,
        |_, v| v.value.to_very_longs(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get single precision floating point values.
        get_float,
        get_floats,
        get_float_by_path,
        f32,
        |_, v| v.value.to_floats(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get double precision floating point values.
        get_double,
        get_doubles,
        get_double_by_path,
        f64,
        |_, v| v.value.to_doubles(v.vr, v.big_endian)
    );

    typed_getters!(
        /// Get date values.
        get_date,
        get_dates,
        get_date_by_path,
        NaiveDate,
        |_, v| v.value.to_dates(v.vr)
    );

    typed_getters!(
        /// Get time values.
        get_time,
        get_times,
        get_time_by_path,
        NaiveTime,
        |_, v| v.value.to_times(v.vr)
    );

    typed_getters!(
        /// Get date-time values, resolving missing zone suffixes with the
        /// data set timezone offset.
        get_date_time,
        get_date_times,
        get_date_time_by_path,
        DateTime<FixedOffset>,
        |e, v| v.value.to_date_times(v.vr, e.zone_offset)
    );

    typed_getters!(
        /// Get person name values.
        get_person_name,
        get_person_names,
        get_person_name_by_path,
        PersonName,
        |e, v| v.value.to_person_names(v.vr, &e.character_sets)
    );

    /// Get a URI value.
    pub fn get_uri(&self, tag: Tag) -> Option<String> {
        self.value_element(tag)
            .filter(|e| e.vr == VR::UR)
            .and_then(|e| {
                e.value
                    .to_strings(e.vr, e.big_endian, &self.character_sets)
                    .into_iter()
                    .next()
            })
    }

    // --- access by path ---

    /// Access the data set nested at the given path of item steps.
    pub fn nested_by_path(&self, path: &TagPath) -> Option<&Elements> {
        let mut current = self;
        for node in path.nodes() {
            match node {
                TagPath::Item { tag, item, .. } => {
                    current = current.get_nested(*tag, *item as usize)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Access the element addressed by the given path. The final step
    /// must be an element or sequence step; intermediate steps must be
    /// item steps.
    pub fn element_by_path(&self, path: &TagPath) -> Option<&ElementSet> {
        let (elements, tag) = self.leaf_context(path)?;
        elements.element(tag)
    }

    /// Whether the given path resolves to an existing structure.
    pub fn contains_path(&self, path: &TagPath) -> bool {
        let nodes = path.nodes();
        let Some((last, prefix)) = nodes.split_last() else {
            return true;
        };
        let mut current = self;
        for node in prefix {
            match node {
                TagPath::Item { tag, item, .. } => {
                    match current.get_nested(*tag, *item as usize) {
                        Some(nested) => current = nested,
                        None => return false,
                    }
                }
                _ => return false,
            }
        }
        match last {
            TagPath::Empty => true,
            TagPath::Tag { tag, .. } => current.contains(*tag),
            TagPath::Sequence { tag, .. } => current.get_sequence(*tag).is_some(),
            TagPath::Item { tag, item, .. } => {
                current.get_item(*tag, *item as usize).is_some()
            }
        }
    }

    fn leaf_context(&self, path: &TagPath) -> Option<(&Elements, Tag)> {
        let nodes = path.nodes();
        let (last, prefix) = nodes.split_last()?;
        let mut current = self;
        for node in prefix {
            match node {
                TagPath::Item { tag, item, .. } => {
                    current = current.get_nested(*tag, *item as usize)?;
                }
                _ => return None,
            }
        }
        match last {
            TagPath::Tag { tag, .. } | TagPath::Sequence { tag, .. } => Some((current, *tag)),
            _ => None,
        }
    }

    // --- mutation ---

    /// Insert or replace an element, keeping the tag order. Setting the
    /// _Specific Character Set_ or _Timezone Offset From UTC_ attributes
    /// also updates the decoding context of the new data set.
    pub fn set(&self, element: ElementSet) -> Elements {
        let mut out = self.clone();
        out.insert_in_place(element);
        out
    }

    /// Remove the element with the given tag, if present.
    pub fn remove(&self, tag: Tag) -> Elements {
        let mut out = self.clone();
        if let Ok(i) = out.data.binary_search_by_key(&tag, |e| e.tag()) {
            out.data.remove(i);
            if tag == tags::SPECIFIC_CHARACTER_SET || tag == tags::TIMEZONE_OFFSET_FROM_UTC {
                out.refresh_context();
            }
        }
        out
    }

    /// Insert or replace an element inside the item addressed by the
    /// given path. The empty path addresses this data set.
    pub fn set_by_path(&self, path: &TagPath, element: ElementSet) -> Result<Elements> {
        let steps = item_steps(path)?;
        self.update_nested(&steps, &|e| Ok(e.set(element.clone())))
    }

    /// Replace the data set nested in the item addressed by the given
    /// path.
    pub fn set_nested(&self, path: &TagPath, elements: Elements) -> Result<Elements> {
        let steps = item_steps(path)?;
        if steps.is_empty() {
            return Ok(elements);
        }
        self.update_nested(&steps, &|_| Ok(elements.clone()))
    }

    /// Append an item holding the given data set to the sequence
    /// addressed by the path.
    ///
    /// An indeterminate-length sequence receives an indeterminate-length
    /// item; an explicit-length sequence receives an explicit-length item
    /// and has its own length updated accordingly. A missing sequence is
    /// created with indeterminate length.
    pub fn add_item(&self, path: &TagPath, elements: Elements) -> Result<Elements> {
        let nodes = path.nodes();
        let Some((last, prefix)) = nodes.split_last() else {
            return NotASequencePathSnafu.fail();
        };
        let TagPath::Sequence { tag, .. } = last else {
            return NotASequencePathSnafu.fail();
        };
        let tag = *tag;
        let steps = item_steps_of(prefix)?;
        self.update_nested(&steps, &|e| {
            let mut seq = match e.get_sequence(tag) {
                Some(seq) => seq.clone(),
                None => Sequence::empty(tag, Length::UNDEFINED, false, true),
            };
            let item = if seq.is_indeterminate() {
                Item::indeterminate(elements.clone(), seq.big_endian)
            } else {
                Item::explicit(elements.clone(), seq.big_endian)
            };
            seq.items.push(item);
            if !seq.is_indeterminate() {
                seq.length = Length(seq.content_bytes().len() as u32);
            }
            Ok(e.set(ElementSet::Sequence(seq)))
        })
    }

    /// Remove the structure addressed by the given path: an element, a
    /// whole sequence, or a single item.
    pub fn remove_path(&self, path: &TagPath) -> Result<Elements> {
        let nodes = path.nodes();
        let Some((last, prefix)) = nodes.split_last() else {
            return Ok(self.clone());
        };
        let steps = item_steps_of(prefix)?;
        match last {
            TagPath::Tag { tag, .. } | TagPath::Sequence { tag, .. } => {
                let tag = *tag;
                self.update_nested(&steps, &|e| Ok(e.remove(tag)))
            }
            TagPath::Item { tag, item, .. } => {
                let (tag, index) = (*tag, *item as usize);
                self.update_nested(&steps, &|e| {
                    let mut seq = e
                        .get_sequence(tag)
                        .cloned()
                        .ok_or_else(|| UnreachableSnafu { step: tag.to_string() }.build())?;
                    if index == 0 || index > seq.items.len() {
                        return UnreachableSnafu {
                            step: format!("{}[{}]", tag, index),
                        }
                        .fail();
                    }
                    seq.items.remove(index - 1);
                    if !seq.is_indeterminate() {
                        seq.length = Length(seq.content_bytes().len() as u32);
                    }
                    Ok(e.set(ElementSet::Sequence(seq)))
                })
            }
            TagPath::Empty => Ok(self.clone()),
        }
    }

    fn update_nested(
        &self,
        steps: &[(Tag, u32)],
        f: &dyn Fn(&Elements) -> Result<Elements>,
    ) -> Result<Elements> {
        let Some(&(tag, index)) = steps.first() else {
            return f(self);
        };
        let seq = self
            .get_sequence(tag)
            .ok_or_else(|| UnreachableSnafu { step: tag.to_string() }.build())?;
        let item = seq.item(index as usize).ok_or_else(|| {
            UnreachableSnafu {
                step: format!("{}[{}]", tag, index),
            }
            .build()
        })?;
        let nested = item.elements.update_nested(&steps[1..], f)?;
        let mut new_item = item.clone();
        new_item.elements = nested;
        if !new_item.is_indeterminate() {
            new_item.length = Length(new_item.elements.dataset_bytes().len() as u32);
        }
        let mut new_seq = seq.clone();
        new_seq.items[index as usize - 1] = new_item;
        if !new_seq.is_indeterminate() {
            new_seq.length = Length(new_seq.content_bytes().len() as u32);
        }
        Ok(self.set(ElementSet::Sequence(new_seq)))
    }

    fn insert_in_place(&mut self, element: ElementSet) {
        let tag = element.tag();
        match self.data.binary_search_by_key(&tag, |e| e.tag()) {
            Ok(i) => self.data[i] = element,
            Err(i) => self.data.insert(i, element),
        }
        if tag == tags::SPECIFIC_CHARACTER_SET || tag == tags::TIMEZONE_OFFSET_FROM_UTC {
            self.refresh_context();
        }
    }

    fn refresh_context(&mut self) {
        self.character_sets = match self.value_element(tags::SPECIFIC_CHARACTER_SET) {
            Some(e) => CharacterSets::new(
                e.value
                    .to_strings(e.vr, e.big_endian, &CharacterSets::default())
                    .into_iter(),
            ),
            None => CharacterSets::default(),
        };
        self.zone_offset = self
            .value_element(tags::TIMEZONE_OFFSET_FROM_UTC)
            .and_then(|e| {
                e.value
                    .to_strings(e.vr, e.big_endian, &CharacterSets::default())
                    .into_iter()
                    .next()
            })
            .and_then(|s| deserialize::parse_zone_offset(&s))
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    }

    // --- typed setters ---

    /// Set a string element, with the VR looked up in the dictionary.
    pub fn set_string(&self, tag: Tag, value: &str) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_string(vr, value, &self.character_sets))
    }

    /// Set a multi-valued string element.
    pub fn set_strings<S: AsRef<str>>(&self, tag: Tag, values: &[S]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_strings(vr, values, &self.character_sets))
    }

    /// Set a 16-bit integer element.
    pub fn set_short(&self, tag: Tag, value: i16) -> Elements {
        self.set_shorts(tag, &[value])
    }

    /// Set a multi-valued 16-bit integer element.
    pub fn set_shorts(&self, tag: Tag, values: &[i16]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_shorts(vr, values, false))
    }

    /// Set a 32-bit integer element.
    pub fn set_int(&self, tag: Tag, value: i32) -> Elements {
        self.set_ints(tag, &[value])
    }

    /// Set a multi-valued 32-bit integer element.
    pub fn set_ints(&self, tag: Tag, values: &[i32]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_ints(vr, values, false))
    }

    /// Set a 64-bit integer element.
    pub fn set_long(&self, tag: Tag, value: i64) -> Elements {
        self.set_longs(tag, &[value])
    }

    /// Set a multi-valued 64-bit integer element.
    pub fn set_longs(&self, tag: Tag, values: &[i64]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_longs(vr, values, false))
    }

    /// Set an unsigned 64-bit integer element.
    pub fn set_very_long(&self, tag: Tag, value: u64) -> Elements {
        self.set_very_longs(tag, &[value])
    }

    /// Set a multi-valued unsigned 64-bit integer element.
    pub fn set_very_longs(&self, tag: Tag, values: &[u64]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_very_longs(vr, values, false))
    }

    /// Set a single precision floating point element.
    pub fn set_float(&self, tag: Tag, value: f32) -> Elements {
        self.set_floats(tag, &[value])
    }

    /// Set a multi-valued single precision floating point element.
    pub fn set_floats(&self, tag: Tag, values: &[f32]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_floats(vr, values, false))
    }

    /// Set a double precision floating point element.
    pub fn set_double(&self, tag: Tag, value: f64) -> Elements {
        self.set_doubles(tag, &[value])
    }

    /// Set a multi-valued double precision floating point element.
    pub fn set_doubles(&self, tag: Tag, values: &[f64]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_doubles(vr, values, false))
    }

    /// Set a date element.
    pub fn set_date(&self, tag: Tag, value: NaiveDate) -> Elements {
        self.set_dates(tag, &[value])
    }

    /// Set a multi-valued date element.
    pub fn set_dates(&self, tag: Tag, values: &[NaiveDate]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_dates(values))
    }

    /// Set a time element.
    pub fn set_time(&self, tag: Tag, value: NaiveTime) -> Elements {
        self.set_times(tag, &[value])
    }

    /// Set a multi-valued time element.
    pub fn set_times(&self, tag: Tag, values: &[NaiveTime]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_times(values))
    }

    /// Set a date-time element.
    pub fn set_date_time(&self, tag: Tag, value: DateTime<FixedOffset>) -> Elements {
        self.set_date_times(tag, &[value])
    }

    /// Set a multi-valued date-time element.
    pub fn set_date_times(&self, tag: Tag, values: &[DateTime<FixedOffset>]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_date_times(values))
    }

    /// Set a person name element.
    pub fn set_person_name(&self, tag: Tag, value: &PersonName) -> Elements {
        self.set_person_names(tag, &[value.clone()])
    }

    /// Set a multi-valued person name element.
    pub fn set_person_names(&self, tag: Tag, values: &[PersonName]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_person_names(values, &self.character_sets))
    }

    /// Set a URI element.
    pub fn set_uri(&self, tag: Tag, value: &str) -> Elements {
        self.set_value(
            tag,
            VR::UR,
            Value::from_string(VR::UR, value, &self.character_sets),
        )
    }

    /// Set a raw byte element, with the VR looked up in the dictionary.
    pub fn set_bytes(&self, tag: Tag, value: &[u8]) -> Elements {
        let vr = dictionary::vr_of(tag);
        self.set_value(tag, vr, Value::from_bytes(value))
    }

    fn set_value(&self, tag: Tag, vr: VR, value: Value) -> Elements {
        self.set(ElementSet::Value(ValueElement::new(tag, vr, value, false, true)))
    }

    // --- serialization ---

    /// Encode all elements in tag order, without a preamble.
    pub fn dataset_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for element in &self.data {
            out.extend_from_slice(&element.to_bytes());
        }
        out
    }

    /// Encode the data set, optionally preceded by the 128-byte preamble
    /// and magic code.
    pub fn to_bytes(&self, with_preamble: bool) -> Vec<u8> {
        let mut out = if with_preamble {
            serialize::preamble_bytes()
        } else {
            Vec::new()
        };
        out.extend_from_slice(&self.dataset_bytes());
        out
    }
}

impl fmt::Display for Elements {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Elements({} elements)", self.data.len())
    }
}

fn item_steps(path: &TagPath) -> Result<Vec<(Tag, u32)>> {
    item_steps_of(&path.nodes())
}

fn item_steps_of(nodes: &[&TagPath]) -> Result<Vec<(Tag, u32)>> {
    nodes
        .iter()
        .map(|node| match node {
            TagPath::Item { tag, item, .. } => Ok((*tag, *item)),
            other => NotAnItemStepSnafu {
                step: other
                    .tag()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "<empty>".into()),
            }
            .fail(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::tags;

    fn sample() -> Elements {
        Elements::empty()
            .set_string(tags::STUDY_DATE, "20200101")
            .set_string(tags::PATIENT_NAME, "Doe^John")
            .set_string(tags::PATIENT_ID, "42")
    }

    #[test]
    fn tags_stay_strictly_ascending() {
        let e = Elements::empty()
            .set_string(tags::PATIENT_ID, "42")
            .set_string(tags::STUDY_DATE, "20200101")
            .set_string(tags::PATIENT_NAME, "Doe^John")
            .set_string(tags::STUDY_DATE, "20200102");
        let tags_seen: Vec<Tag> = e.iter().map(|el| el.tag()).collect();
        assert_eq!(
            tags_seen,
            vec![tags::STUDY_DATE, tags::PATIENT_NAME, tags::PATIENT_ID]
        );
        assert_eq!(e.get_string(tags::STUDY_DATE).unwrap(), "20200102");
    }

    #[test]
    fn typed_round_trips() {
        let e = Elements::empty()
            .set_short(Tag(0x0028, 0x0010), 512)
            .set_int(Tag(0x0020, 0x0013), 7)
            .set_date(
                tags::STUDY_DATE,
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            );
        assert_eq!(e.get_short(Tag(0x0028, 0x0010)), Some(512));
        // InstanceNumber is IS, stored as a numeric string
        assert_eq!(e.get_bytes(Tag(0x0020, 0x0013)), Some(&b"7 "[..]));
        assert_eq!(e.get_int(Tag(0x0020, 0x0013)), Some(7));
        assert_eq!(
            e.get_date(tags::STUDY_DATE),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
    }

    #[test]
    fn character_set_side_effect() {
        let e = Elements::empty().set_string(tags::SPECIFIC_CHARACTER_SET, "ISO_IR 100");
        assert_eq!(e.character_sets().names(), ["ISO_IR 100".to_string()]);
        // latin-1 decoding now applies to person names
        let e = e.set(ElementSet::Value(ValueElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            Value::from_bytes(&b"Buc^J\xE9r\xF4me"[..]),
            false,
            true,
        )));
        assert_eq!(
            e.get_person_name(tags::PATIENT_NAME).unwrap().alphabetic.given,
            "J\u{e9}r\u{f4}me"
        );
        let e = e.remove(tags::SPECIFIC_CHARACTER_SET);
        assert_eq!(e.character_sets(), &CharacterSets::default());
    }

    #[test]
    fn zone_offset_side_effect() {
        let e = Elements::empty().set_string(tags::TIMEZONE_OFFSET_FROM_UTC, "+0100");
        assert_eq!(e.zone_offset(), FixedOffset::east_opt(3600).unwrap());
        let dt = e
            .set_string(tags::ACQUISITION_DATE_TIME, "20200101120000")
            .get_date_time(tags::ACQUISITION_DATE_TIME)
            .unwrap();
        assert_eq!(dt.offset(), &FixedOffset::east_opt(3600).unwrap());
    }

    #[test]
    fn values_are_padded_even() {
        let e = Elements::empty().set_string(tags::PATIENT_ID, "123");
        assert_eq!(e.get_bytes(tags::PATIENT_ID), Some(&b"123 "[..]));
        for el in sample().iter() {
            if let ElementSet::Value(v) = el {
                assert_eq!(v.value.len() % 2, 0);
            }
        }
    }

    #[test]
    fn add_item_to_indeterminate_sequence() {
        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let path = TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE);
        let e = Elements::empty().add_item(&path, nested.clone()).unwrap();
        let seq = e.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap();
        assert!(seq.is_indeterminate());
        assert_eq!(seq.size(), 1);
        assert!(seq.item(1).unwrap().is_indeterminate());
        assert_eq!(
            e.get_nested(tags::REFERENCED_STUDY_SEQUENCE, 1)
                .unwrap()
                .get_string(tags::STUDY_INSTANCE_UID)
                .unwrap(),
            "1.2.3"
        );
    }

    #[test]
    fn add_item_to_explicit_sequence_updates_lengths() {
        let seq = Sequence::empty(tags::REFERENCED_STUDY_SEQUENCE, Length(0), false, true);
        let e = Elements::empty().set(ElementSet::Sequence(seq));
        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let path = TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE);
        let e = e.add_item(&path, nested.clone()).unwrap();

        let seq = e.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap();
        let item = seq.item(1).unwrap();
        assert!(!item.is_indeterminate());
        let content_len = nested.dataset_bytes().len() as u32;
        assert_eq!(item.length, Length(content_len));
        // item header is 8 bytes
        assert_eq!(seq.length, Length(content_len + 8));

        // a second item extends the sequence length by its encoded size
        let before = seq.length;
        let e = e.add_item(&path, nested.clone()).unwrap();
        let seq = e.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap();
        assert_eq!(seq.length, Length(before.0 + content_len + 8));
    }

    #[test]
    fn set_and_get_through_paths() {
        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let seq_path = TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE);
        let e = Elements::empty().add_item(&seq_path, nested).unwrap();

        let item_path = TagPath::from_item(tags::REFERENCED_STUDY_SEQUENCE, 1);
        let e = e
            .set_by_path(
                &item_path,
                ElementSet::Value(ValueElement::new(
                    tags::ACCESSION_NUMBER,
                    VR::SH,
                    Value::from_bytes(&b"A1"[..]),
                    false,
                    true,
                )),
            )
            .unwrap();

        let leaf = item_path.clone().then_tag(tags::ACCESSION_NUMBER);
        assert_eq!(e.get_string_by_path(&leaf).unwrap(), "A1");
        assert!(e.contains_path(&leaf));
        assert!(e.contains_path(&item_path));
        assert!(!e.contains_path(&TagPath::from_item(tags::REFERENCED_STUDY_SEQUENCE, 2)));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let e = sample();
        // element step where an item step is required
        let bad = TagPath::from_tag(tags::STUDY_DATE);
        assert!(matches!(
            e.set_by_path(&bad, ElementSet::Value(ValueElement::empty(
                tags::PATIENT_ID,
                VR::LO,
                false,
                true
            ))),
            Err(InvalidPathError::NotAnItemStep { .. })
        ));
        // missing sequence
        let missing = TagPath::from_item(tags::REFERENCED_STUDY_SEQUENCE, 1);
        assert!(matches!(
            e.set_by_path(&missing, ElementSet::Value(ValueElement::empty(
                tags::PATIENT_ID,
                VR::LO,
                false,
                true
            ))),
            Err(InvalidPathError::Unreachable { .. })
        ));
        // add_item needs a sequence step
        assert!(matches!(
            e.add_item(&TagPath::from_tag(tags::STUDY_DATE), Elements::empty()),
            Err(InvalidPathError::NotASequencePath { .. })
        ));
    }

    #[test]
    fn remove_by_tag_and_path() {
        let e = sample();
        assert!(e.contains(tags::PATIENT_NAME));
        let e = e.remove(tags::PATIENT_NAME);
        assert!(!e.contains(tags::PATIENT_NAME));
        assert_eq!(e.len(), 2);

        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let seq_path = TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE);
        let e = e.add_item(&seq_path, nested.clone()).unwrap();
        let e = e.add_item(&seq_path, nested).unwrap();
        let e = e
            .remove_path(&TagPath::from_item(tags::REFERENCED_STUDY_SEQUENCE, 1))
            .unwrap();
        assert_eq!(
            e.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap().size(),
            1
        );
    }

    #[test]
    fn filter_and_head() {
        let e = sample();
        assert_eq!(e.head().unwrap().tag(), tags::STUDY_DATE);
        let filtered = e.filter(|el| el.tag() != tags::PATIENT_ID);
        assert_eq!(filtered.len(), 2);
        assert!(!filtered.contains(tags::PATIENT_ID));
    }

    #[test]
    fn fragments_frame_counts() {
        let mut f = Fragments::empty(tags::PIXEL_DATA, VR::OB, false, true);
        assert_eq!(f.frame_count(), 0);
        assert_eq!(f.frame_iter().count(), 0);

        f.fragments
            .push(Fragment::new(Value::from_bytes(vec![1, 2, 3, 4]), false));
        assert_eq!(f.frame_count(), 1);
        assert_eq!(f.frame_iter().next().unwrap(), vec![1, 2, 3, 4]);

        f.offsets = Some(vec![0, 4]);
        f.fragments
            .push(Fragment::new(Value::from_bytes(vec![5, 6]), false));
        assert_eq!(f.frame_count(), 2);
        let frames: Vec<_> = f.frame_iter().collect();
        assert_eq!(frames, vec![vec![1, 2, 3, 4], vec![5, 6]]);

        f.offsets = Some(Vec::new());
        assert_eq!(f.frame_count(), 0);
    }

    #[test]
    fn serialization_matches_hand_crafted_bytes() {
        let e = Elements::empty().set_string(tags::STUDY_DATE, "20200101");
        assert_eq!(
            e.to_bytes(false),
            vec![
                0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00, b'2', b'0', b'2', b'0', b'0',
                b'1', b'0', b'1'
            ]
        );
        let with_preamble = e.to_bytes(true);
        assert_eq!(with_preamble.len(), 132 + 16);
        assert_eq!(&with_preamble[128..132], b"DICM");
    }

    #[test]
    fn indeterminate_sequence_serialization_has_delimiters() {
        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let seq_path = TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE);
        let e = Elements::empty().add_item(&seq_path, nested).unwrap();
        let bytes = e.to_bytes(false);
        // sequence header with indeterminate length
        assert_eq!(
            &bytes[..12],
            &[0x08, 0x00, 0x10, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        // item header with indeterminate length
        assert_eq!(&bytes[12..20], &[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
        // ends with item delimitation and sequence delimitation
        let n = bytes.len();
        assert_eq!(&bytes[n - 16..n - 8], &[0xFE, 0xFF, 0x0D, 0xE0, 0, 0, 0, 0]);
        assert_eq!(&bytes[n - 8..], &[0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]);
    }
}
