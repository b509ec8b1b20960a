pub mod html;
pub mod step;
pub mod thickness;
pub mod xml;

pub use crate::error::ParseError;
pub use html::{extract_building_elements, parse_html_file};
pub use step::{StepEntity, StepFile, StepValue};
pub use thickness::{
    parse_thickness, resolve_thickness_m, thickness_or_default, DEFAULT_LAYER_THICKNESS_M,
};
pub use xml::{parse_project_xml, parse_xml_file};
