#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unused_import_braces)]
#![warn(missing_docs, unused_qualifications)]
//! Primitives, data dictionary and data set model for streaming DICOM
//! data.
//!
//! This crate provides the building blocks shared by every layer of the
//! codec: attribute tags, value representations and lengths
//! ([`header`]), primitive byte order helpers ([`bytes`]), the standard
//! attribute dictionary ([`dictionary`]), character set handling
//! ([`text`]), raw values with typed conversions ([`value`]), tag paths
//! and trees ([`tagpath`]), and the [`Elements`] data set model with its
//! byte serialization ([`elements`]).

pub mod bytes;
pub mod dictionary;
pub mod elements;
pub mod header;
pub mod tagpath;
pub mod text;
pub mod value;

pub use elements::{
    ElementSet, Elements, ElementsBuilder, Fragment, Fragments, InvalidPathError, Item, Sequence,
    ValueElement,
};
pub use header::{Length, Tag, VM, VR};
pub use tagpath::{TagPath, TagTree};
pub use text::CharacterSets;
pub use value::{PersonName, Value};
