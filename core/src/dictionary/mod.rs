//! The DICOM data element dictionary: value representations, value
//! multiplicities and keywords of standard attributes.
//!
//! Lookups are total functions. A tag which is not known to the dictionary
//! resolves to [`VR::UN`], [`VM::OneToMany`] and an empty keyword; only the
//! reverse keyword lookup can fail.
//!
//! Repeating group attributes (curve data in groups `50xx`, overlays in
//! `60xx` and the pixel data groups `7Fxx`) are normalized to their lowest
//! group number before lookup, so that for instance any `(60xx,3000)` tag
//! resolves to _OverlayData_.

mod entries;
pub mod tags;
pub mod uids;

use snafu::{Backtrace, Snafu};

use crate::header::{Tag, VM, VR};
use entries::{Entry, ENTRIES_LOWER, ENTRIES_UPPER, SPLIT_TAG};

/// Error raised when a keyword does not name a known attribute.
#[derive(Debug, Snafu)]
#[snafu(display("unknown attribute keyword `{}`", keyword))]
pub struct UnknownKeywordError {
    keyword: String,
    backtrace: Backtrace,
}

/// Retrieve the standard value representation of the attribute with the
/// given tag.
///
/// Group length elements, private tags and the retired repeating groups
/// are resolved before consulting the dictionary tables. Unknown tags
/// resolve to [`VR::UN`].
pub fn vr_of(tag: Tag) -> VR {
    if tag.is_group_length() {
        return VR::UL;
    }
    if tag.is_private() {
        // (gggg,0010-00FF) in an odd group reserves a private block
        return if tag.element() & 0xFF00 == 0 && tag.element() & 0x00F0 != 0 {
            VR::LO
        } else {
            VR::UN
        };
    }
    if tag.as_u32() & 0xFFFF_FF00 == tags::SOURCE_IMAGE_IDS.as_u32() {
        return VR::CS;
    }
    lookup(normalize(tag)).map(|e| e.vr).unwrap_or(VR::UN)
}

/// Retrieve the standard value multiplicity of the attribute with the
/// given tag. Unknown tags resolve to [`VM::OneToMany`].
pub fn vm_of(tag: Tag) -> VM {
    lookup(normalize(tag)).map(|e| e.vm).unwrap_or(VM::OneToMany)
}

/// Retrieve the canonical keyword of the attribute with the given tag,
/// or an empty string if the tag is not known.
pub fn keyword_of(tag: Tag) -> &'static str {
    lookup(normalize(tag)).map(|e| e.keyword).unwrap_or("")
}

/// Retrieve the tag of the attribute with the given keyword.
pub fn tag_of(keyword: &str) -> Result<Tag, UnknownKeywordError> {
    ENTRIES_LOWER
        .iter()
        .chain(ENTRIES_UPPER.iter())
        .find(|e| e.keyword == keyword)
        .map(|e| Tag::from_u32(e.tag))
        .ok_or_else(|| {
            UnknownKeywordSnafu {
                keyword: keyword.to_string(),
            }
            .build()
        })
}

/// Zero out the repeating portion of curve, overlay and pixel data group
/// numbers so that the tag can be found in the dictionary tables.
fn normalize(tag: Tag) -> u32 {
    let t = tag.as_u32();
    if t & 0xFFE0_0000 == 0x5000_0000 || t & 0xFFE0_0000 == 0x6000_0000 {
        t & 0xFFE0_FFFF
    } else if t & 0xFF00_0000 == 0x7F00_0000 && t & 0xFFFF_0000 != 0x7FE0_0000 {
        t & 0xFF00_FFFF
    } else {
        t
    }
}

fn lookup(tag: u32) -> Option<&'static Entry> {
    let table = if tag < SPLIT_TAG {
        ENTRIES_LOWER
    } else {
        ENTRIES_UPPER
    };
    table
        .binary_search_by_key(&tag, |e| e.tag)
        .ok()
        .map(|i| &table[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_lengths_are_ul() {
        assert_eq!(vr_of(Tag(0x0008, 0x0000)), VR::UL);
        assert_eq!(vr_of(Tag(0x7FE0, 0x0000)), VR::UL);
    }

    #[test]
    fn private_tags() {
        // private creator slots
        assert_eq!(vr_of(Tag(0x0009, 0x0010)), VR::LO);
        assert_eq!(vr_of(Tag(0x0009, 0x00FF)), VR::LO);
        // other private elements are unknown
        assert_eq!(vr_of(Tag(0x0009, 0x1001)), VR::UN);
        assert_eq!(vr_of(Tag(0x0009, 0x0001)), VR::UN);
    }

    #[test]
    fn source_image_ids_range() {
        assert_eq!(vr_of(Tag(0x0020, 0x3100)), VR::CS);
        assert_eq!(vr_of(Tag(0x0020, 0x31FF)), VR::CS);
    }

    #[test]
    fn repeating_groups_are_normalized() {
        assert_eq!(vr_of(Tag(0x6002, 0x3000)), VR::OW);
        assert_eq!(keyword_of(Tag(0x6002, 0x3000)), "OverlayData");
        assert_eq!(vr_of(Tag(0x501E, 0x3000)), VR::OW);
        assert_eq!(keyword_of(Tag(0x501E, 0x0020)), "TypeOfData");
        // the pixel data groups are not part of the repeating 7Fxx range
        assert_eq!(vr_of(Tag(0x7FE0, 0x0010)), VR::OW);
    }

    #[test]
    fn lookup_spans_both_tables() {
        assert_eq!(vr_of(Tag(0x0008, 0x0020)), VR::DA);
        assert_eq!(vr_of(Tag(0x0010, 0x0010)), VR::PN);
        assert_eq!(vr_of(Tag(0x0028, 0x0010)), VR::US);
        assert_eq!(vr_of(Tag(0x7FE0, 0x0009)), VR::OD);
    }

    #[test]
    fn unknown_tags_are_total() {
        let tag = Tag(0x0008, 0x7FFF);
        assert_eq!(vr_of(tag), VR::UN);
        assert_eq!(vm_of(tag), VM::OneToMany);
        assert_eq!(keyword_of(tag), "");
    }

    #[test]
    fn multiplicities() {
        assert_eq!(vm_of(Tag(0x0020, 0x0032)), VM::Fixed(3));
        assert_eq!(vm_of(Tag(0x0008, 0x0005)), VM::OneToMany);
        assert_eq!(vm_of(Tag(0x0008, 0x0008)), VM::Unbounded(2));
    }

    #[test]
    fn keyword_round_trip() {
        assert_eq!(keyword_of(tags::STUDY_DATE), "StudyDate");
        assert_eq!(tag_of("StudyDate").unwrap(), tags::STUDY_DATE);
        assert_eq!(tag_of("PixelData").unwrap(), tags::PIXEL_DATA);
        assert!(tag_of("NoSuchKeyword").is_err());
    }
}
