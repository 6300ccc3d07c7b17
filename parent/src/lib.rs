//! This crate serves as a parent for the library crates of the
//! dicom-streams project.
//!
//! The [`core`] crate holds the primitives, the data dictionary and the
//! [`Elements`](core::Elements) data set model; the [`parser`] crate
//! holds the streaming parser, flows and sinks. The most commonly used
//! items are re-exported at the root.
pub use dicom_streams_core as core;
pub use dicom_streams_parser as parser;

pub use dicom_streams_core::{
    CharacterSets, ElementSet, Elements, Length, PersonName, Tag, TagPath, TagTree, Value, VM, VR,
};
pub use dicom_streams_parser::{
    collect_from_trees, elements_to_parts, parse, sink_elements, DicomPart, DicomParser,
    ParserOptions,
};
