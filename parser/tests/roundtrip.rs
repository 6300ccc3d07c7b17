//! End to end tests over the whole pipeline: data sets serialized to
//! bytes, parsed back into parts and aggregated into equal data sets.

use std::io::Write;

use dicom_streams_core::dictionary::tags;
use dicom_streams_core::{
    ElementSet, Elements, Fragment, Fragments, TagPath, Value, VR,
};
use dicom_streams_parser::{elements_to_parts, parse, sink_elements, DicomPart, ParserOptions};

fn sample_elements() -> Elements {
    let nested = Elements::empty()
        .set_string(tags::STUDY_INSTANCE_UID, "1.2.826.0.1.3680043.8.498.1")
        .set_string(tags::ACCESSION_NUMBER, "A001");

    let mut fragments = Fragments::empty(tags::PIXEL_DATA, VR::OB, false, true);
    fragments.offsets = Some(vec![0]);
    fragments
        .fragments
        .push(Fragment::new(Value::from_bytes(vec![1, 2, 3, 4, 5, 6]), false));

    Elements::empty()
        // the group length covers the transfer syntax element: 8 + 20 bytes
        .set_int(tags::FILE_META_INFORMATION_GROUP_LENGTH, 28)
        .set_string(tags::TRANSFER_SYNTAX_UID, "1.2.840.10008.1.2.1")
        .set_string(tags::SPECIFIC_CHARACTER_SET, "ISO_IR 100")
        .set_string(tags::STUDY_DATE, "20200101")
        .set_string(tags::TIMEZONE_OFFSET_FROM_UTC, "+0100")
        .add_item(
            &TagPath::from_sequence(tags::REFERENCED_STUDY_SEQUENCE),
            nested,
        )
        .unwrap()
        .set_string(tags::PATIENT_NAME, "Buc^J\u{e9}r\u{f4}me")
        .set(ElementSet::Fragments(fragments))
}

#[test]
fn serialize_parse_sink_is_identity() {
    let elements = sample_elements();
    for with_preamble in [false, true] {
        let bytes = elements.to_bytes(with_preamble);
        let parsed = sink_elements(parse(&bytes[..])).unwrap();
        assert_eq!(parsed, elements);
    }
}

#[test]
fn parts_writer_agrees_with_parser() {
    let elements = sample_elements();
    let bytes = elements.to_bytes(true);
    let reparsed: Vec<DicomPart> = parse(&bytes[..]).map(|r| r.unwrap()).collect();
    let written = elements_to_parts(&elements, true);
    assert_eq!(written, reparsed);
}

#[test]
fn parsed_byte_concatenation_is_faithful() {
    let elements = sample_elements();
    let bytes = elements.to_bytes(true);
    let replay: Vec<u8> = parse(&bytes[..])
        .map(|r| r.unwrap())
        .flat_map(|p| p.bytes().to_vec())
        .collect();
    assert_eq!(replay, bytes);
}

#[test]
fn small_chunk_sizes_do_not_change_the_result() {
    let elements = sample_elements();
    let bytes = elements.to_bytes(false);
    let parser = dicom_streams_parser::DicomParser::with_options(
        &bytes[..],
        ParserOptions::default().chunk_size(3),
    );
    let parsed = sink_elements(parser).unwrap();
    assert_eq!(parsed, elements);
}

/// The data set bytes used in the deflate tests: StudyDate and
/// PatientName in explicit VR little endian.
#[rustfmt::skip]
static DATASET: &[u8] = &[
    0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00,
    b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
    0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x0A, 0x00,
    b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n', b' ', b' ',
];

/// File meta information announcing the given transfer syntax UID.
fn fmi_with_ts(uid: &str) -> Vec<u8> {
    assert_eq!(uid.len() % 2, 0);
    let ts_element_len = 8 + uid.len() as u32;
    let mut data = Vec::new();
    #[rustfmt::skip]
    data.extend_from_slice(&[
        0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00,
        ts_element_len as u8, (ts_element_len >> 8) as u8, 0x00, 0x00,
        0x02, 0x00, 0x10, 0x00, b'U', b'I', uid.len() as u8, 0x00,
    ]);
    data.extend_from_slice(uid.as_bytes());
    data
}

fn dataset_parts(parts: &[DicomPart]) -> Vec<&DicomPart> {
    parts
        .iter()
        .filter(|p| !matches!(p, DicomPart::Header { fmi: true, .. }))
        .skip_while(|p| matches!(p, DicomPart::ValueChunk { .. }))
        .collect()
}

#[test]
fn raw_deflate_is_inflated_on_the_fly() {
    let mut data = fmi_with_ts("1.2.840.10008.1.2.1.99");
    // a single stored deflate block holding the data set
    data.push(0x01);
    data.extend_from_slice(&(DATASET.len() as u16).to_le_bytes());
    data.extend_from_slice(&(!(DATASET.len() as u16)).to_le_bytes());
    data.extend_from_slice(DATASET);

    let parts: Vec<DicomPart> = parse(&data[..]).map(|r| r.unwrap()).collect();
    let tail = dataset_parts(&parts);
    assert!(matches!(
        tail[0],
        DicomPart::Header {
            tag: dicom_streams_core::Tag(0x0008, 0x0020),
            vr: VR::DA,
            length: 8,
            ..
        }
    ));
    assert!(
        matches!(tail[1], DicomPart::ValueChunk { bytes, last: true, .. } if bytes == b"20200101")
    );
    assert!(matches!(
        tail[2],
        DicomPart::Header {
            tag: dicom_streams_core::Tag(0x0010, 0x0010),
            vr: VR::PN,
            length: 10,
            ..
        }
    ));

    let elements = sink_elements(parse(&data[..])).unwrap();
    assert_eq!(elements.get_string(tags::STUDY_DATE).unwrap(), "20200101");
    assert_eq!(
        elements.get_person_name(tags::PATIENT_NAME).unwrap().alphabetic.family,
        "Doe"
    );
}

#[test]
fn zlib_wrapped_deflate_is_detected_and_inflated() {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(DATASET).unwrap();
    let compressed = encoder.finish().unwrap();
    assert_eq!(compressed[0], 0x78);

    let mut data = fmi_with_ts("1.2.840.10008.1.2.1.99");
    data.extend_from_slice(&compressed);

    let elements = sink_elements(parse(&data[..])).unwrap();
    assert_eq!(elements.get_string(tags::STUDY_DATE).unwrap(), "20200101");
}

#[test]
fn deflated_chunks_are_emitted_when_inflation_is_off() {
    let payload = {
        let mut data = Vec::new();
        data.push(0x01);
        data.extend_from_slice(&(DATASET.len() as u16).to_le_bytes());
        data.extend_from_slice(&(!(DATASET.len() as u16)).to_le_bytes());
        data.extend_from_slice(DATASET);
        data
    };
    let mut data = fmi_with_ts("1.2.840.10008.1.2.1.99");
    data.extend_from_slice(&payload);

    let parser = dicom_streams_parser::DicomParser::with_options(
        &data[..],
        ParserOptions::default().inflate(false),
    );
    let parts: Vec<DicomPart> = parser.map(|r| r.unwrap()).collect();
    let deflated: Vec<u8> = parts
        .iter()
        .filter_map(|p| match p {
            DicomPart::DeflatedChunk { bytes, nowrap, .. } => {
                assert!(*nowrap);
                Some(bytes.clone())
            }
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(deflated, payload);
}

#[test]
fn implicit_vr_transfer_syntax_switches_the_data_set_encoding() {
    let mut data = fmi_with_ts("1.2.840.10008.1.2\0");
    #[rustfmt::skip]
    data.extend_from_slice(&[
        // (0008,0020) StudyDate in implicit VR little endian
        0x08, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00,
        b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
    ]);
    let parts: Vec<DicomPart> = parse(&data[..]).map(|r| r.unwrap()).collect();
    let header = parts
        .iter()
        .find(|p| matches!(p, DicomPart::Header { fmi: false, .. }))
        .unwrap();
    assert!(matches!(
        header,
        DicomPart::Header {
            vr: VR::DA,
            explicit_vr: false,
            big_endian: false,
            ..
        }
    ));
}

#[test]
fn big_endian_transfer_syntax_switches_the_data_set_encoding() {
    let mut data = fmi_with_ts("1.2.840.10008.1.2.2\0");
    #[rustfmt::skip]
    data.extend_from_slice(&[
        // (0008,0020) StudyDate in explicit VR big endian
        0x00, 0x08, 0x00, 0x20, b'D', b'A', 0x00, 0x08,
        b'2', b'0', b'2', b'0', b'0', b'1', b'0', b'1',
    ]);
    let elements = sink_elements(parse(&data[..])).unwrap();
    assert_eq!(elements.get_string(tags::STUDY_DATE).unwrap(), "20200101");
    let ElementSet::Value(e) = elements.element(tags::STUDY_DATE).unwrap() else {
        panic!("expected a value element");
    };
    assert!(e.big_endian);
}
