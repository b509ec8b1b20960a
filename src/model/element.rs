use serde::{Deserialize, Serialize};

/// A building element (wall type, ceiling build-up, ...) from the eLCA report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingElement {
    /// DIN 276 cost group, e.g. "330".
    pub category_code: String,
    pub name: String,
    pub components: Vec<Component>,
}

/// One material layer or constituent of a [`BuildingElement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Raw quantity text as printed in the report, e.g. "200,00 mm".
    #[serde(default)]
    pub quantity: String,
    /// Layer thickness in meters, set by the XML matcher.
    #[serde(default)]
    pub layer_thickness: Option<f64>,
    #[serde(default)]
    pub lifecycle_processes: Vec<ProcessRef>,
}

/// Reference to an Ökobaudat lifecycle process dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRef {
    pub uuid: String,
    pub process_name: String,
}

impl BuildingElement {
    #[must_use]
    pub fn new(category_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category_code: category_code.into(),
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Name used for the layer set and the type entity: "330 Wall A".
    #[must_use]
    pub fn label(&self) -> String {
        if self.category_code.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.category_code, self.name)
        }
    }

    #[must_use]
    pub fn layers_with_thickness(&self) -> usize {
        self.components.iter().filter(|c| c.has_thickness()).count()
    }
}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            layer_thickness: None,
            lifecycle_processes: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_thickness(&self) -> bool {
        self.layer_thickness.is_some_and(|t| t > 0.0)
    }
}

#[must_use]
pub fn component_count(elements: &[BuildingElement]) -> usize {
    elements.iter().map(|e| e.components.len()).sum()
}

/// Components across all elements whose matched thickness is above zero.
#[must_use]
pub fn layers_with_thickness(elements: &[BuildingElement]) -> usize {
    elements.iter().map(BuildingElement::layers_with_thickness).sum()
}
