use serde::{Deserialize, Serialize};

/// Length unit suffix of an eLCA thickness string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Millimetre,
    Centimetre,
    Metre,
}

impl LengthUnit {
    /// Unknown suffixes are read as millimetres, the eLCA default.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.trim().to_lowercase().as_str() {
            "cm" => Self::Centimetre,
            "m" => Self::Metre,
            _ => Self::Millimetre,
        }
    }

    #[must_use]
    pub fn to_metres(self, value: f64) -> f64 {
        match self {
            Self::Millimetre => value / 1000.0,
            Self::Centimetre => value / 100.0,
            Self::Metre => value,
        }
    }
}

/// A layer record from the XML project export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerThicknessRecord {
    pub element_category: String,
    pub element_name: String,
    pub layer_name: String,
    /// Raw thickness text, kept for diagnostics.
    pub raw: String,
    /// Resolved thickness in meters.
    pub thickness_m: f64,
}

/// An `<element>` of the XML project export with its layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlElementRecord {
    pub category_code: String,
    pub name: String,
    pub layers: Vec<LayerThicknessRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_case_insensitive() {
        assert_eq!(LengthUnit::from_suffix("CM"), LengthUnit::Centimetre);
        assert_eq!(LengthUnit::from_suffix(" m "), LengthUnit::Metre);
        assert_eq!(LengthUnit::from_suffix("inch"), LengthUnit::Millimetre);
    }
}
