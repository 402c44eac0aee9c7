//! Ordinal sustainability classes produced by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class names indexed by ordinal code.
pub const CLASS_NAMES: [&str; 3] = ["Unsustainable", "Moderate", "Sustainable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SustainabilityClass {
    Unsustainable = 0,
    Moderate = 1,
    Sustainable = 2,
}

impl SustainabilityClass {
    pub const ALL: [SustainabilityClass; 3] = [
        SustainabilityClass::Unsustainable,
        SustainabilityClass::Moderate,
        SustainabilityClass::Sustainable,
    ];

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn code(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        CLASS_NAMES[self.code()]
    }
}

impl fmt::Display for SustainabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClass(pub String);

impl fmt::Display for UnknownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown prediction '{}', expected one of {}",
            self.0,
            CLASS_NAMES.join(", ")
        )
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for SustainabilityClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

impl TryFrom<String> for SustainabilityClass {
    type Error = UnknownClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SustainabilityClass> for String {
    fn from(class: SustainabilityClass) -> Self {
        class.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_lookup_table() {
        for (code, name) in CLASS_NAMES.iter().enumerate() {
            let class = SustainabilityClass::from_code(code).unwrap();
            assert_eq!(class.code(), code);
            assert_eq!(class.name(), *name);
        }
        assert_eq!(SustainabilityClass::from_code(3), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "moderate".parse::<SustainabilityClass>().unwrap(),
            SustainabilityClass::Moderate
        );
        assert_eq!(
            " Sustainable ".parse::<SustainabilityClass>().unwrap(),
            SustainabilityClass::Sustainable
        );
        assert!("Thriving".parse::<SustainabilityClass>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&SustainabilityClass::Unsustainable).unwrap();
        assert_eq!(json, "\"Unsustainable\"");
        let back: SustainabilityClass = serde_json::from_str("\"Moderate\"").unwrap();
        assert_eq!(back, SustainabilityClass::Moderate);
    }
}
