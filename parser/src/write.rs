//! Rendering data sets back into part streams.
//!
//! The emitted parts carry the exact header bytes of the byte-level
//! serialization, so concatenating their raw bytes equals
//! [`Elements::to_bytes`] with the same preamble setting.

use dicom_streams_core::bytes;
use dicom_streams_core::elements::serialize;
use dicom_streams_core::{ElementSet, Elements, Fragments, Length, Sequence, VR};

use crate::part::DicomPart;

/// Render a data set as a stream of parts.
pub fn elements_to_parts(elements: &Elements, with_preamble: bool) -> Vec<DicomPart> {
    let mut out = Vec::new();
    if with_preamble {
        out.push(DicomPart::Preamble {
            bytes: serialize::preamble_bytes(),
        });
    }
    for element in elements.iter() {
        element_to_parts(element, &mut out);
    }
    out
}

fn element_to_parts(element: &ElementSet, out: &mut Vec<DicomPart>) {
    match element {
        ElementSet::Value(e) => {
            let length = e.value.len() as u32;
            out.push(DicomPart::Header {
                tag: e.tag,
                vr: e.vr,
                length,
                fmi: e.tag.is_file_meta_information(),
                big_endian: e.big_endian,
                explicit_vr: e.explicit_vr,
                bytes: serialize::header_bytes(e.tag, Some(e.vr), length, e.big_endian, e.explicit_vr),
            });
            if length > 0 {
                out.push(DicomPart::ValueChunk {
                    big_endian: e.big_endian,
                    bytes: e.value.bytes().to_vec(),
                    last: true,
                });
            }
        }
        ElementSet::Sequence(s) => sequence_to_parts(s, out),
        ElementSet::Fragments(f) => fragments_to_parts(f, out),
    }
}

fn sequence_to_parts(sequence: &Sequence, out: &mut Vec<DicomPart>) {
    let length = if sequence.is_indeterminate() {
        Length::UNDEFINED
    } else {
        Length(
            sequence
                .items
                .iter()
                .map(|i| i.to_bytes().len() as u32)
                .sum(),
        )
    };
    out.push(DicomPart::Sequence {
        tag: sequence.tag,
        length,
        big_endian: sequence.big_endian,
        explicit_vr: sequence.explicit_vr,
        bytes: serialize::header_bytes(
            sequence.tag,
            Some(VR::SQ),
            length.0,
            sequence.big_endian,
            sequence.explicit_vr,
        ),
    });
    for (i, item) in sequence.items.iter().enumerate() {
        let index = i as u32 + 1;
        let item_length = if item.is_indeterminate() {
            Length::UNDEFINED
        } else {
            Length(item.elements.dataset_bytes().len() as u32)
        };
        out.push(DicomPart::Item {
            index,
            length: item_length,
            big_endian: item.big_endian,
            bytes: serialize::item_bytes(item_length, item.big_endian),
        });
        for element in item.elements.iter() {
            element_to_parts(element, out);
        }
        if item.is_indeterminate() {
            out.push(DicomPart::ItemDelimitation {
                index,
                big_endian: item.big_endian,
                bytes: serialize::item_delimitation_bytes(item.big_endian),
            });
        }
    }
    if sequence.is_indeterminate() {
        out.push(DicomPart::SequenceDelimitation {
            big_endian: sequence.big_endian,
            bytes: serialize::sequence_delimitation_bytes(sequence.big_endian),
        });
    }
}

fn fragments_to_parts(fragments: &Fragments, out: &mut Vec<DicomPart>) {
    out.push(DicomPart::Fragments {
        tag: fragments.tag,
        length: Length::UNDEFINED,
        vr: fragments.vr,
        big_endian: fragments.big_endian,
        explicit_vr: fragments.explicit_vr,
        bytes: serialize::header_bytes(
            fragments.tag,
            Some(fragments.vr),
            0xFFFF_FFFF,
            fragments.big_endian,
            fragments.explicit_vr,
        ),
    });
    let mut index = 0;
    if let Some(offsets) = &fragments.offsets {
        index += 1;
        let mut value = Vec::with_capacity(offsets.len() * 4);
        for &offset in offsets {
            bytes::put_u32(&mut value, offset as u32, fragments.big_endian);
        }
        out.push(DicomPart::Item {
            index,
            length: Length(value.len() as u32),
            big_endian: fragments.big_endian,
            bytes: serialize::item_bytes(Length(value.len() as u32), fragments.big_endian),
        });
        if !value.is_empty() {
            out.push(DicomPart::ValueChunk {
                big_endian: fragments.big_endian,
                bytes: value,
                last: true,
            });
        }
    }
    for fragment in &fragments.fragments {
        index += 1;
        out.push(DicomPart::Item {
            index,
            length: Length(fragment.length),
            big_endian: fragment.big_endian,
            bytes: serialize::item_bytes(Length(fragment.length), fragment.big_endian),
        });
        if fragment.length > 0 {
            out.push(DicomPart::ValueChunk {
                big_endian: fragment.big_endian,
                bytes: fragment.value.bytes().to_vec(),
                last: true,
            });
        }
    }
    out.push(DicomPart::SequenceDelimitation {
        big_endian: fragments.big_endian,
        bytes: serialize::sequence_delimitation_bytes(fragments.big_endian),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_streams_core::dictionary::tags;
    use dicom_streams_core::{Fragment, TagPath, Value};

    fn concat_bytes(parts: &[DicomPart]) -> Vec<u8> {
        parts.iter().flat_map(|p| p.bytes().to_vec()).collect()
    }

    #[test]
    fn parts_reproduce_the_byte_serialization() {
        let nested = Elements::empty().set_string(tags::STUDY_INSTANCE_UID, "1.2.3");
        let elements = Elements::empty()
            .set_string(tags::STUDY_DATE, "20200101")
            .add_item(
                &TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE),
                nested,
            )
            .unwrap()
            .set_string(tags::PATIENT_NAME, "Doe^John");

        for with_preamble in [false, true] {
            let parts = elements_to_parts(&elements, with_preamble);
            assert_eq!(concat_bytes(&parts), elements.to_bytes(with_preamble));
        }
    }

    #[test]
    fn fragments_render_offset_table_and_items() {
        let mut fragments = Fragments::empty(tags::PIXEL_DATA, VR::OB, false, true);
        fragments.offsets = Some(vec![0]);
        fragments
            .fragments
            .push(Fragment::new(Value::from_bytes(vec![1, 2, 3, 4, 5, 6]), false));
        let elements = Elements::empty().set(ElementSet::Fragments(fragments));

        let parts = elements_to_parts(&elements, false);
        assert!(matches!(parts[0], DicomPart::Fragments { .. }));
        assert!(matches!(parts[1], DicomPart::Item { index: 1, length: Length(4), .. }));
        assert!(matches!(parts[3], DicomPart::Item { index: 2, length: Length(6), .. }));
        assert!(matches!(parts[5], DicomPart::SequenceDelimitation { .. }));
        assert_eq!(concat_bytes(&parts), elements.to_bytes(false));
    }
}
