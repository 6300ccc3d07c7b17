//! The element sink: aggregating a part stream back into an [`Elements`]
//! data set.

use dicom_streams_core::bytes;
use dicom_streams_core::{
    ElementSet, Elements, ElementsBuilder, Fragment, Fragments, Item, Length, Sequence,
};

use crate::element::{Element, ElementIterator};
use crate::error::Result;
use crate::part::DicomPart;

/// Assemble a whole part stream into a data set.
///
/// Preamble, deflated and unknown parts are skipped; everything else is
/// merged into elements and aggregated. File meta information elements
/// become ordinary elements of the resulting data set.
pub fn sink_elements<I>(parts: I) -> Result<Elements>
where
    I: IntoIterator<Item = Result<DicomPart>>,
{
    let mut sink = ElementSink::new();
    for element in ElementIterator::new(parts.into_iter()) {
        sink.update(element?);
    }
    Ok(sink.finish())
}

/// A stack-based aggregator of element events.
///
/// One builder per nesting depth assembles the data sets; a parallel
/// stack holds the sequences being filled. Nested builders inherit the
/// character sets and timezone offset in effect in their parent, so that
/// values inside items decode correctly.
#[derive(Debug)]
pub struct ElementSink {
    builders: Vec<ElementsBuilder>,
    sequences: Vec<Sequence>,
    fragments: Option<Fragments>,
}

impl Default for ElementSink {
    fn default() -> Self {
        ElementSink::new()
    }
}

impl ElementSink {
    /// Create a sink with a single empty root builder.
    pub fn new() -> Self {
        ElementSink {
            builders: vec![ElementsBuilder::new()],
            sequences: Vec::new(),
            fragments: None,
        }
    }

    /// Feed one element event.
    pub fn update(&mut self, element: Element) {
        match element {
            Element::Value(value) => {
                if let Some(builder) = self.builders.last_mut() {
                    builder.add(ElementSet::Value(value));
                }
            }
            Element::Fragments {
                tag,
                vr,
                big_endian,
                explicit_vr,
            } => {
                self.fragments = Some(Fragments::empty(tag, vr, big_endian, explicit_vr));
            }
            Element::Fragment {
                value, big_endian, ..
            } => {
                if let Some(fragments) = &mut self.fragments {
                    if fragments.offsets.is_none() && fragments.fragments.is_empty() {
                        // the first item holds the frame offset table
                        let offsets = value
                            .bytes()
                            .chunks_exact(4)
                            .map(|c| bytes::read_u32(c, big_endian) as u64)
                            .collect();
                        fragments.offsets = Some(offsets);
                    } else {
                        fragments.fragments.push(Fragment::new(value, big_endian));
                    }
                }
            }
            Element::Sequence {
                tag,
                length,
                big_endian,
                explicit_vr,
            } => {
                self.sequences
                    .push(Sequence::empty(tag, length, big_endian, explicit_vr));
            }
            Element::Item {
                length, big_endian, ..
            } => {
                if !self.sequences.is_empty() {
                    let nested = match self.builders.last() {
                        Some(parent) => ElementsBuilder::with_context(
                            parent.character_sets().clone(),
                            parent.zone_offset(),
                        ),
                        None => ElementsBuilder::new(),
                    };
                    if let Some(sequence) = self.sequences.last_mut() {
                        sequence
                            .items
                            .push(Item::new(Elements::empty(), length, big_endian));
                    }
                    self.builders.push(nested);
                }
            }
            Element::ItemDelimitation { .. } => {
                if !self.sequences.is_empty() && self.builders.len() > 1 {
                    let elements = match self.builders.pop() {
                        Some(builder) => builder.build(),
                        None => Elements::empty(),
                    };
                    if let Some(item) =
                        self.sequences.last_mut().and_then(|s| s.items.last_mut())
                    {
                        item.elements = elements;
                        if !item.is_indeterminate() {
                            item.length = Length(item.elements.dataset_bytes().len() as u32);
                        }
                    }
                }
            }
            Element::SequenceDelimitation => {
                if let Some(fragments) = self.fragments.take() {
                    if let Some(builder) = self.builders.last_mut() {
                        builder.add(ElementSet::Fragments(fragments));
                    }
                } else if let Some(mut sequence) = self.sequences.pop() {
                    if !sequence.is_indeterminate() {
                        let content: usize =
                            sequence.items.iter().map(|i| i.to_bytes().len()).sum();
                        sequence.length = Length(content as u32);
                    }
                    if let Some(builder) = self.builders.last_mut() {
                        builder.add(ElementSet::Sequence(sequence));
                    }
                }
            }
        }
    }

    /// Finish aggregation, producing the root data set. Fragments left
    /// open by a gracefully truncated pixel data sequence are attached;
    /// other unterminated structures are dropped.
    pub fn finish(mut self) -> Elements {
        if let Some(fragments) = self.fragments.take() {
            if let Some(builder) = self.builders.first_mut() {
                builder.add(ElementSet::Fragments(fragments));
            }
        }
        self.builders
            .drain(..)
            .next()
            .map(|b| b.build())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::parse;
    use dicom_streams_core::dictionary::tags;

    /// Prefix a bare data set with file meta information announcing
    /// explicit VR little endian, so that autodetection accepts the
    /// explicit encoding. The two file meta elements end up in the
    /// assembled data set alongside the data set elements.
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
    fn sequence_with_one_item() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (0008,1110) ReferencedStudySequence, SQ, indeterminate
            0x08, 0x00, 0x10, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // item, indeterminate
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // (0020,000D) StudyInstanceUID, UI, 6
            0x20, 0x00, 0x0D, 0x00, b'U', b'I', 0x06, 0x00, b'1', b'.', b'2', b'.', b'3', 0x00,
            // item delimitation, sequence delimitation
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let elements = sink_elements(parse(&data[..])).unwrap();
        let sequence = elements
            .get_sequence(tags::REFERENCED_STUDY_SEQUENCE)
            .expect("sequence present");
        assert!(sequence.is_indeterminate());
        assert_eq!(sequence.size(), 1);
        assert_eq!(
            elements
                .get_nested(tags::REFERENCED_STUDY_SEQUENCE, 1)
                .unwrap()
                .get_string(tags::STUDY_INSTANCE_UID)
                .unwrap(),
            "1.2.3"
        );
    }

    #[test]
    fn explicit_length_sequence_lengths_are_recomputed() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            0x18, 0x00, 0x11, 0x60, b'S', b'Q', 0x00, 0x00, 0x12, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, 0x0A, 0x00, 0x00, 0x00,
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
        ]);
        let elements = sink_elements(parse(&data[..])).unwrap();
        let sequence = elements
            .get_sequence(tags::SEQUENCE_OF_ULTRASOUND_REGIONS)
            .expect("sequence present");
        assert_eq!(sequence.length, Length(18));
        assert_eq!(sequence.item(1).unwrap().length, Length(10));
        assert_eq!(
            elements.get_short_by_path(
                &dicom_streams_core::TagPath::from_item(tags::SEQUENCE_OF_ULTRASOUND_REGIONS, 1)
                    .then_tag(dicom_streams_core::Tag(0x0018, 0x6012))
            ),
            Some(1)
        );
    }

    #[test]
    fn encapsulated_pixel_data() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, 0x06, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let elements = sink_elements(parse(&data[..])).unwrap();
        let fragments = elements
            .get_fragments(tags::PIXEL_DATA)
            .expect("fragments present");
        assert_eq!(fragments.offsets, Some(vec![0]));
        assert_eq!(fragments.fragments.len(), 1);
        assert_eq!(fragments.fragments[0].length, 6);
        assert_eq!(fragments.frame_count(), 1);
        assert_eq!(
            fragments.frame_iter().collect::<Vec<_>>(),
            vec![vec![1, 2, 3, 4, 5, 6]]
        );
    }

    #[test]
    fn character_sets_apply_to_nested_items() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            // (0008,0005) SpecificCharacterSet, CS, 10: "ISO_IR 100"
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'0', b'0',
            // (0008,1110) SQ indeterminate, one item with a PN value
            0x08, 0x00, 0x10, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // (0010,0010) PatientName, PN, 10: "Buc^Jerome" with accents
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x0A, 0x00,
            b'B', b'u', b'c', b'^', b'J', 0xE9, b'r', 0xF4, b'm', b'e',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ]);
        let elements = sink_elements(parse(&data[..])).unwrap();
        let nested = elements
            .get_nested(tags::REFERENCED_STUDY_SEQUENCE, 1)
            .unwrap();
        assert_eq!(
            nested.get_person_name(tags::PATIENT_NAME).unwrap().alphabetic.given,
            "J\u{e9}r\u{f4}me"
        );
    }

    #[test]
    fn truncated_pixel_sequence_still_yields_fragments() {
        #[rustfmt::skip]
        let data = with_fmi(&[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, 0x06, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6,
            // no sequence delimitation: stream ends here
        ]);
        let elements = sink_elements(parse(&data[..])).unwrap();
        let fragments = elements.get_fragments(tags::PIXEL_DATA).unwrap();
        assert_eq!(fragments.frame_count(), 1);
    }
}
