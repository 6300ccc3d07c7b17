//! Handling of DICOM values with the PN (person name) value representation
//! as per PS3.5 sect 6.2.
//!
//! A person name value consists of up to three component groups separated
//! by `'='` (alphabetic, ideographic and phonetic), each holding up to
//! five components separated by `'^'`.

use std::fmt::{Display, Formatter};

/// One component group of a person name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentGroup {
    /// Family name complex
    pub family: String,
    /// Given name complex
    pub given: String,
    /// Middle name
    pub middle: String,
    /// Name prefix
    pub prefix: String,
    /// Name suffix
    pub suffix: String,
}

impl ComponentGroup {
    /// Parse a component group from its `'^'`-separated representation.
    pub fn parse(s: &str) -> ComponentGroup {
        let mut parts = s.split('^');
        let mut next = || parts.next().unwrap_or("").to_string();
        ComponentGroup {
            family: next(),
            given: next(),
            middle: next(),
            prefix: next(),
            suffix: next(),
        }
    }

    /// Whether all components are empty.
    pub fn is_empty(&self) -> bool {
        self.family.is_empty()
            && self.given.is_empty()
            && self.middle.is_empty()
            && self.prefix.is_empty()
            && self.suffix.is_empty()
    }

    /// Format the group with `'^'` separators, dropping trailing empty
    /// components.
    pub fn to_dicom_string(&self) -> String {
        let components = [
            self.family.as_str(),
            self.given.as_str(),
            self.middle.as_str(),
            self.prefix.as_str(),
            self.suffix.as_str(),
        ];
        let last = components
            .iter()
            .rposition(|c| !c.is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        components[..last].join("^")
    }
}

impl Display for ComponentGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let components = [
            &self.prefix,
            &self.given,
            &self.middle,
            &self.family,
            &self.suffix,
        ];
        let mut it = components.iter().filter(|c| !c.is_empty()).peekable();
        while let Some(component) = it.next() {
            if it.peek().is_some() {
                write!(f, "{} ", component)?;
            } else {
                write!(f, "{}", component)?;
            }
        }
        Ok(())
    }
}

/// A DICOM _Person Name_ (PN value representation).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonName {
    /// The alphabetic component group
    pub alphabetic: ComponentGroup,
    /// The ideographic component group
    pub ideographic: ComponentGroup,
    /// The phonetic component group
    pub phonetic: ComponentGroup,
}

impl PersonName {
    /// Parse a person name from its `'='`-separated group representation.
    pub fn parse(s: &str) -> PersonName {
        let mut groups = s.split('=');
        let mut next = || groups.next().map(ComponentGroup::parse).unwrap_or_default();
        PersonName {
            alphabetic: next(),
            ideographic: next(),
            phonetic: next(),
        }
    }

    /// Format the name with `'='` group separators, dropping trailing
    /// empty groups.
    pub fn to_dicom_string(&self) -> String {
        let groups = [
            self.alphabetic.to_dicom_string(),
            self.ideographic.to_dicom_string(),
            self.phonetic.to_dicom_string(),
        ];
        let last = groups
            .iter()
            .rposition(|g| !g.is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        groups[..last].join("=")
    }
}

impl Display for PersonName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.alphabetic, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_group() {
        let pn = PersonName::parse("Doe^John");
        assert_eq!(pn.alphabetic.family, "Doe");
        assert_eq!(pn.alphabetic.given, "John");
        assert!(pn.alphabetic.middle.is_empty());
        assert!(pn.ideographic.is_empty());
        assert!(pn.phonetic.is_empty());
    }

    #[test]
    fn parse_all_groups_and_components() {
        let pn = PersonName::parse("Adams^John^Quincy^Rev.^B.A. M.Div.=x^y=a^b");
        assert_eq!(pn.alphabetic.middle, "Quincy");
        assert_eq!(pn.alphabetic.prefix, "Rev.");
        assert_eq!(pn.alphabetic.suffix, "B.A. M.Div.");
        assert_eq!(pn.ideographic.family, "x");
        assert_eq!(pn.phonetic.given, "b");
    }

    #[test]
    fn format_drops_trailing_empties() {
        let pn = PersonName::parse("Doe^John^^^");
        assert_eq!(pn.to_dicom_string(), "Doe^John");
        let pn = PersonName::parse("Doe^John==");
        assert_eq!(pn.to_dicom_string(), "Doe^John");
        let pn = PersonName::parse("Yamada^Tarou=\u{5c71}\u{7530}^\u{592a}\u{90ce}");
        assert_eq!(
            pn.to_dicom_string(),
            "Yamada^Tarou=\u{5c71}\u{7530}^\u{592a}\u{90ce}"
        );
    }

    #[test]
    fn display_reads_naturally() {
        let pn = PersonName::parse("Adams^John^Quincy^Rev.");
        assert_eq!(pn.to_string(), "Rev. John Quincy Adams");
    }
}
