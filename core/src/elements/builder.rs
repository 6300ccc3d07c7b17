//! An owned accumulator for element sets, used when assembling data sets
//! from ordered streams of elements.

use chrono::FixedOffset;

use super::{ElementSet, Elements};
use crate::dictionary::tags;
use crate::text::CharacterSets;
use crate::value::deserialize;

/// A mutable builder of [`Elements`].
///
/// Elements are expected to arrive in tag order and are appended; out of
/// order input is still inserted at the correct position. The builder
/// tracks the character sets and timezone offset attributes as they are
/// added, so that nested builders can inherit the decoding context of
/// their parent data set.
#[derive(Debug, Clone)]
pub struct ElementsBuilder {
    data: Vec<ElementSet>,
    character_sets: CharacterSets,
    zone_offset: FixedOffset,
}

impl Default for ElementsBuilder {
    fn default() -> Self {
        ElementsBuilder::new()
    }
}

impl ElementsBuilder {
    /// Create an empty builder with the default decoding context.
    pub fn new() -> Self {
        ElementsBuilder {
            data: Vec::new(),
            character_sets: CharacterSets::default(),
            zone_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    /// Create an empty builder inheriting the given decoding context.
    pub fn with_context(character_sets: CharacterSets, zone_offset: FixedOffset) -> Self {
        ElementsBuilder {
            data: Vec::new(),
            character_sets,
            zone_offset,
        }
    }

    /// The character sets currently in effect.
    pub fn character_sets(&self) -> &CharacterSets {
        &self.character_sets
    }

    /// The timezone offset currently in effect.
    pub fn zone_offset(&self) -> FixedOffset {
        self.zone_offset
    }

    /// Add an element, replacing any previous element with the same tag.
    pub fn add(&mut self, element: ElementSet) -> &mut Self {
        if let ElementSet::Value(e) = &element {
            if e.tag == tags::SPECIFIC_CHARACTER_SET {
                self.character_sets = CharacterSets::new(
                    e.value
                        .to_strings(e.vr, e.big_endian, &CharacterSets::default())
                        .into_iter(),
                );
            } else if e.tag == tags::TIMEZONE_OFFSET_FROM_UTC {
                if let Some(offset) = e
                    .value
                    .to_strings(e.vr, e.big_endian, &CharacterSets::default())
                    .into_iter()
                    .next()
                    .and_then(|s| deserialize::parse_zone_offset(&s))
                {
                    self.zone_offset = offset;
                }
            }
        }
        match self.data.last() {
            Some(last) if last.tag() < element.tag() => self.data.push(element),
            None => self.data.push(element),
            _ => match self.data.binary_search_by_key(&element.tag(), |e| e.tag()) {
                Ok(i) => self.data[i] = element,
                Err(i) => self.data.insert(i, element),
            },
        }
        self
    }

    /// Finish building, producing the data set.
    pub fn build(self) -> Elements {
        Elements {
            data: self.data,
            character_sets: self.character_sets,
            zone_offset: self.zone_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::tags;
    use crate::header::VR;
    use crate::value::Value;
    use crate::elements::ValueElement;

    fn value_element(tag: crate::header::Tag, vr: VR, bytes: &[u8]) -> ElementSet {
        ElementSet::Value(ValueElement::new(
            tag,
            vr,
            Value::from_bytes(bytes),
            false,
            true,
        ))
    }

    #[test]
    fn appends_in_order_and_sorts_stragglers() {
        let mut b = ElementsBuilder::new();
        b.add(value_element(tags::STUDY_DATE, VR::DA, b"20200101"));
        b.add(value_element(tags::PATIENT_NAME, VR::PN, b"Doe^John"));
        b.add(value_element(tags::SPECIFIC_CHARACTER_SET, VR::CS, b"ISO_IR 100"));
        let e = b.build();
        let tags_seen: Vec<_> = e.iter().map(|el| el.tag()).collect();
        assert_eq!(
            tags_seen,
            vec![tags::SPECIFIC_CHARACTER_SET, tags::STUDY_DATE, tags::PATIENT_NAME]
        );
    }

    #[test]
    fn tracks_decoding_context() {
        let mut b = ElementsBuilder::new();
        b.add(value_element(
            tags::SPECIFIC_CHARACTER_SET,
            VR::CS,
            b"ISO_IR 100",
        ));
        b.add(value_element(tags::TIMEZONE_OFFSET_FROM_UTC, VR::SH, b"+0100"));
        assert_eq!(b.character_sets().names(), ["ISO_IR 100".to_string()]);
        assert_eq!(b.zone_offset(), FixedOffset::east_opt(3600).unwrap());

        let nested = ElementsBuilder::with_context(b.character_sets().clone(), b.zone_offset());
        assert_eq!(nested.character_sets().names(), ["ISO_IR 100".to_string()]);
    }
}
