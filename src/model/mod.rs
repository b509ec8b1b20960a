pub mod element;
pub mod layer;
pub mod summary;

pub use element::{component_count, layers_with_thickness, BuildingElement, Component, ProcessRef};
pub use layer::{LayerThicknessRecord, LengthUnit, XmlElementRecord};
pub use summary::MatchSummary;
