#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unused_import_braces)]
#![warn(missing_docs, unused_qualifications)]
//! Streaming layer of the DICOM codec: an incremental parser producing a
//! typed part stream, flows over that stream, and sinks materializing
//! data sets.
//!
//! The stages compose as plain iterators:
//!
//! bytes → [`parse`] → parts → [`collect_from_trees`] (optional) →
//! [`sink_elements`] → [`Elements`](dicom_streams_core::Elements) →
//! [`elements_to_parts`] / `to_bytes` → bytes

pub mod collect;
pub mod element;
pub mod error;
pub mod part;
pub mod read;
pub mod sink;
pub mod source;
pub mod write;

pub use collect::{collect_from_trees, CollectFlow};
pub use element::{Element, ElementFlow, ElementIterator};
pub use error::Error;
pub use part::DicomPart;
pub use read::{parse, DicomParser, ParserOptions};
pub use sink::{sink_elements, ElementSink};
pub use write::elements_to_parts;
