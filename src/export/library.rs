use crate::config::{LibrarySettings, OEKOBAUDAT_DATASET_URL};
use crate::error::ExportError;
use crate::export::writer::{enumeration, ifc_guid, refs, text, write_owner_history, StepWriter};
use crate::export::write_atomically;
use crate::model::{BuildingElement, Component};
use crate::parser::step::StepValue;
use crate::parser::thickness::{resolve_thickness_m, thickness_or_default};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Type entity per DIN 276 cost group prefix; anything else becomes a wall type.
const TYPE_BY_COST_GROUP: &[(&str, ElementKind)] = &[
    ("32", ElementKind::SLAB_BASE),
    ("35", ElementKind::SLAB_FLOOR),
    ("36", ElementKind::SLAB_ROOF),
];

/// Type entities the library can contain.
pub const LIBRARY_TYPE_ENTITIES: &[&str] = &["IFCWALLTYPE", "IFCSLABTYPE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementKind {
    pub entity: &'static str,
    pub predefined_type: &'static str,
    pub noun: &'static str,
}

impl ElementKind {
    pub const WALL: Self = Self {
        entity: "IFCWALLTYPE",
        predefined_type: "STANDARD",
        noun: "Wall",
    };
    pub const SLAB_BASE: Self = Self {
        entity: "IFCSLABTYPE",
        predefined_type: "BASESLAB",
        noun: "Slab",
    };
    pub const SLAB_FLOOR: Self = Self {
        entity: "IFCSLABTYPE",
        predefined_type: "FLOOR",
        noun: "Slab",
    };
    pub const SLAB_ROOF: Self = Self {
        entity: "IFCSLABTYPE",
        predefined_type: "ROOF",
        noun: "Slab",
    };

    #[must_use]
    pub fn for_category(category_code: &str) -> Self {
        TYPE_BY_COST_GROUP
            .iter()
            .find(|(prefix, _)| category_code.trim().starts_with(prefix))
            .map_or(Self::WALL, |(_, kind)| *kind)
    }
}

/// Counts of what went into a library file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReport {
    pub path: PathBuf,
    pub layer_sets: usize,
    pub materials: usize,
    pub element_types: usize,
    pub process_references: usize,
    pub layers_with_thickness: usize,
}

/// Thickness written for a component: the matched XML thickness, otherwise
/// the one parsed from its quantity text.
#[must_use]
pub fn component_thickness_m(component: &Component) -> f64 {
    component
        .layer_thickness
        .unwrap_or_else(|| resolve_thickness_m(&component.quantity))
}

/// [`component_thickness_m`] without the warning for unparseable quantities.
#[must_use]
pub fn displayed_thickness_m(component: &Component) -> f64 {
    component
        .layer_thickness
        .unwrap_or_else(|| thickness_or_default(&component.quantity))
}

/// Builds the library entity graph without touching the filesystem.
///
/// Elements without components are skipped.
#[must_use]
pub fn build_library(
    elements: &[BuildingElement],
    settings: &LibrarySettings,
    creation_date: i64,
) -> StepWriter {
    let mut writer = StepWriter::new();
    let owner = write_owner_history(&mut writer, settings, creation_date);
    let oh = StepValue::Reference(owner.owner_history);

    let length_unit = writer.add(
        "IFCSIUNIT",
        vec![
            StepValue::Derived,
            enumeration("LENGTHUNIT"),
            StepValue::Null,
            enumeration("METRE"),
        ],
    );
    let units = writer.add("IFCUNITASSIGNMENT", vec![refs(&[length_unit])]);
    writer.add(
        "IFCPROJECT",
        vec![
            text(ifc_guid()),
            oh.clone(),
            text(settings.project_name.as_str()),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Reference(units),
        ],
    );
    let library = writer.add(
        "IFCLIBRARYINFORMATION",
        vec![
            text(settings.library_name.as_str()),
            text(settings.library_version.as_str()),
            StepValue::Reference(owner.organization),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
        ],
    );

    for element in elements {
        if element.components.is_empty() {
            debug!(element = %element.label(), "skipping element without components");
            continue;
        }

        let layers: Vec<u64> = element
            .components
            .iter()
            .map(|component| write_layer(&mut writer, component))
            .collect();

        let label = element.label();
        let layer_set = writer.add(
            "IFCMATERIALLAYERSET",
            vec![refs(&layers), text(label.as_str()), StepValue::Null],
        );

        let kind = ElementKind::for_category(&element.category_code);
        let element_type = writer.add(
            kind.entity,
            vec![
                text(ifc_guid()),
                oh.clone(),
                text(label.as_str()),
                text(format!("{} type for {}", kind.noun, element.name)),
                text(""),
                StepValue::Null,
                StepValue::Null,
                text(""),
                text(label.as_str()),
                enumeration(kind.predefined_type),
            ],
        );

        writer.add(
            "IFCRELASSOCIATESMATERIAL",
            vec![
                text(ifc_guid()),
                oh.clone(),
                StepValue::Null,
                StepValue::Null,
                refs(&[element_type]),
                StepValue::Reference(layer_set),
            ],
        );
        writer.add(
            "IFCRELASSOCIATESLIBRARY",
            vec![
                text(ifc_guid()),
                oh.clone(),
                text(format!("Association {}", element.name)),
                text(format!("Association to library for {}", element.name)),
                refs(&[element_type]),
                StepValue::Reference(library),
            ],
        );
    }

    writer
}

fn write_layer(writer: &mut StepWriter, component: &Component) -> u64 {
    let material = writer.add(
        "IFCMATERIAL",
        vec![text(component.name.as_str()), StepValue::Null, StepValue::Null],
    );

    for process in &component.lifecycle_processes {
        if process.uuid.is_empty() {
            continue;
        }
        let uuid_property = writer.add(
            "IFCPROPERTYSINGLEVALUE",
            vec![
                text("uuid"),
                text("Uuid from Oekobaudat"),
                StepValue::Typed("IFCIDENTIFIER".to_string(), Box::new(text(process.uuid.as_str()))),
                StepValue::Null,
            ],
        );
        let process_name = if process.process_name.is_empty() {
            "Unknown"
        } else {
            process.process_name.as_str()
        };
        let link_property = writer.add(
            "IFCPROPERTYSINGLEVALUE",
            vec![
                text(process_name),
                text("Link to Oekobaudat"),
                StepValue::Typed(
                    "IFCURIREFERENCE".to_string(),
                    Box::new(text(format!("{OEKOBAUDAT_DATASET_URL}{}", process.uuid))),
                ),
                StepValue::Null,
            ],
        );
        writer.add(
            "IFCMATERIALPROPERTIES",
            vec![
                text("pset_oekobaudat"),
                StepValue::Null,
                refs(&[uuid_property, link_property]),
                StepValue::Reference(material),
            ],
        );
    }

    writer.add(
        "IFCMATERIALLAYER",
        vec![
            StepValue::Reference(material),
            StepValue::Real(component_thickness_m(component)),
            StepValue::Null,
            text(component.name.as_str()),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
        ],
    )
}

/// Writes an IFC4 material library for the elements to `path`.
///
/// The file is written only after the whole entity graph is built.
pub fn create_library<P: AsRef<Path>>(
    elements: &[BuildingElement],
    path: P,
    settings: &LibrarySettings,
) -> Result<LibraryReport, ExportError> {
    let path_ref = path.as_ref();
    let now = chrono::Local::now();
    let writer = build_library(elements, settings, now.timestamp());

    let file_name = path_ref
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let content = writer.to_file_string(
        &file_name,
        &now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        settings,
    );

    write_atomically(path_ref, content.as_bytes()).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let report = LibraryReport {
        path: path_ref.to_path_buf(),
        layer_sets: writer.count_of("IFCMATERIALLAYERSET"),
        materials: writer.count_of("IFCMATERIAL"),
        element_types: LIBRARY_TYPE_ENTITIES
            .iter()
            .map(|t| writer.count_of(t))
            .sum(),
        process_references: writer.count_of("IFCMATERIALPROPERTIES"),
        layers_with_thickness: crate::model::layers_with_thickness(elements),
    };
    info!(
        path = %path_ref.display(),
        layer_sets = report.layer_sets,
        materials = report.materials,
        "IFC library written"
    );
    Ok(report)
}
