//! Copies a material library into an existing IFC project file.
//!
//! The project text is left untouched; new entities are appended at the end of
//! its DATA section with ids above the project's highest id.

use crate::config::LibrarySettings;
use crate::error::{ExportError, ParseError};
use crate::export::library::LIBRARY_TYPE_ENTITIES;
use crate::export::write_atomically;
use crate::export::writer::{ifc_guid, refs, text, write_owner_history, StepWriter};
use crate::parser::step::{StepEntity, StepFile, StepValue};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    pub element_types: usize,
    pub materials: usize,
    pub skipped_types: usize,
    pub new_entities: usize,
}

/// Merges the library at `library_path` into the project at `project_path`.
///
/// Nothing is written unless the merged file could be built completely.
pub fn attach_library_to_project<P: AsRef<Path>, Q: AsRef<Path>>(
    project_path: P,
    library_path: Q,
    settings: &LibrarySettings,
) -> Result<AttachReport, ExportError> {
    let project_path = project_path.as_ref();
    let project_text = read(project_path)?;
    let library_text = read(library_path.as_ref())?;

    let project = StepFile::parse(&project_text)?;
    let library = StepFile::parse(&library_text)?;

    let (merged, report) = merge_library(&project_text, &project, &library, settings)?;

    write_atomically(project_path, merged.as_bytes()).map_err(|source| {
        ExportError::FileCreate {
            path: project_path.to_path_buf(),
            source,
        }
    })?;

    info!(
        project = %project_path.display(),
        types = report.element_types,
        skipped = report.skipped_types,
        "library attached to project"
    );
    Ok(report)
}

fn read(path: &Path) -> Result<String, ExportError> {
    std::fs::read_to_string(path).map_err(|source| {
        ExportError::Parse(ParseError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Builds the merged project text in memory.
///
/// Projects declaring a schema other than IFC4 are rejected.
pub fn merge_library(
    project_text: &str,
    project: &StepFile,
    library: &StepFile,
    settings: &LibrarySettings,
) -> Result<(String, AttachReport), ExportError> {
    let library_info = library
        .get_entities_by_type("IFCLIBRARYINFORMATION")
        .first()
        .copied()
        .ok_or_else(|| ExportError::Attach {
            message: "no library information found in the library file".to_string(),
        })?;

    if !project.schema.is_empty() && !project.schema.to_uppercase().starts_with("IFC4") {
        return Err(ExportError::Attach {
            message: format!(
                "project schema {} is not supported, the library is written in IFC4",
                project.schema
            ),
        });
    }
    if project.get_entities_by_type("IFCPROJECT").is_empty() {
        return Err(ExportError::Attach {
            message: "no project found in the project file".to_string(),
        });
    }
    let data_end = project.data_end.ok_or_else(|| ExportError::Attach {
        message: "project file has no DATA section".to_string(),
    })?;

    let mut writer = StepWriter::starting_at(project.max_id() + 1);
    let owner_history = match project.get_entities_by_type("IFCOWNERHISTORY").first() {
        Some(existing) => existing.id,
        None => write_owner_history(&mut writer, settings, chrono::Local::now().timestamp())
            .owner_history,
    };

    let mut copier = Copier {
        library,
        writer: &mut writer,
        owner_history,
        materials: 0,
    };
    let new_library = copier.copy_library_information(library_info, settings);

    let material_of_type = material_associations(library);
    let mut report = AttachReport::default();

    let type_entities = library
        .entities
        .values()
        .filter(|e| LIBRARY_TYPE_ENTITIES.contains(&e.entity_type.as_str()));

    for element_type in type_entities {
        let type_name = element_type.string_at(2).unwrap_or("<unnamed>");
        let Some(layer_set) = material_of_type
            .get(&element_type.id)
            .and_then(|id| library.get_entity(*id))
        else {
            warn!(element_type = type_name, "no material association for type");
            report.skipped_types += 1;
            continue;
        };
        if layer_set.entity_type != "IFCMATERIALLAYERSET" {
            warn!(element_type = type_name, "material association is not a layer set");
            report.skipped_types += 1;
            continue;
        }

        if copier.copy_element_type(element_type, layer_set, new_library) {
            report.element_types += 1;
        } else {
            report.skipped_types += 1;
        }
    }

    report.materials = copier.materials;
    report.new_entities = writer.entities().len();

    let mut merged = String::with_capacity(project_text.len() + writer.entities().len() * 96);
    merged.push_str(&project_text[..data_end]);
    merged.push_str(&writer.data_lines());
    merged.push_str(&project_text[data_end..]);

    Ok((merged, report))
}

/// element type id -> relating material id
fn material_associations(library: &StepFile) -> HashMap<u64, u64> {
    let mut map = HashMap::new();
    for rel in library.get_entities_by_type("IFCRELASSOCIATESMATERIAL") {
        if let Some(material) = rel.ref_at(5) {
            for object in rel.refs_at(4) {
                map.entry(object).or_insert(material);
            }
        }
    }
    map
}

struct Copier<'a> {
    library: &'a StepFile,
    writer: &'a mut StepWriter,
    owner_history: u64,
    materials: usize,
}

impl Copier<'_> {
    fn copy_library_information(&mut self, info: &StepEntity, settings: &LibrarySettings) -> u64 {
        let publisher_name = info
            .ref_at(2)
            .and_then(|id| self.library.get_entity(id))
            .and_then(|org| org.string_at(1))
            .unwrap_or(&settings.publisher)
            .to_string();

        let publisher = self.writer.add(
            "IFCORGANIZATION",
            vec![
                StepValue::Null,
                text(publisher_name),
                StepValue::Null,
                StepValue::Null,
                StepValue::Null,
            ],
        );
        self.writer.add(
            "IFCLIBRARYINFORMATION",
            vec![
                info.value_at(0),
                info.value_at(1),
                StepValue::Reference(publisher),
                StepValue::Null,
                StepValue::Null,
                StepValue::Null,
            ],
        )
    }

    /// Returns false when no layer of the set could be copied.
    fn copy_element_type(
        &mut self,
        element_type: &StepEntity,
        layer_set: &StepEntity,
        library_info: u64,
    ) -> bool {
        let library = self.library;
        let layers: Vec<u64> = layer_set
            .refs_at(0)
            .into_iter()
            .filter_map(|id| library.get_entity(id))
            .filter_map(|layer| self.copy_layer(layer))
            .collect();

        if layers.is_empty() {
            warn!(
                element_type = element_type.string_at(2).unwrap_or("<unnamed>"),
                "layer set has no usable layers"
            );
            return false;
        }

        let new_set = self.writer.add(
            "IFCMATERIALLAYERSET",
            vec![refs(&layers), layer_set.value_at(1), layer_set.value_at(2)],
        );

        let mut values = element_type.values.clone();
        for value in &mut values {
            if contains_reference(value) {
                *value = StepValue::Null;
            }
        }
        if let Some(guid) = values.get_mut(0) {
            *guid = text(ifc_guid());
        }
        if let Some(owner) = values.get_mut(1) {
            *owner = StepValue::Reference(self.owner_history);
        }
        let new_type = self.writer.add(&element_type.entity_type, values);

        let type_name = element_type.string_at(2).unwrap_or_default().to_string();
        self.writer.add(
            "IFCRELASSOCIATESMATERIAL",
            vec![
                text(ifc_guid()),
                StepValue::Reference(self.owner_history),
                StepValue::Null,
                StepValue::Null,
                refs(&[new_type]),
                StepValue::Reference(new_set),
            ],
        );
        self.writer.add(
            "IFCRELASSOCIATESLIBRARY",
            vec![
                text(ifc_guid()),
                StepValue::Reference(self.owner_history),
                text(format!("Association {type_name}")),
                text(format!("Association to library for {type_name}")),
                refs(&[new_type]),
                StepValue::Reference(library_info),
            ],
        );
        true
    }

    fn copy_layer(&mut self, layer: &StepEntity) -> Option<u64> {
        let material = layer.ref_at(0).and_then(|id| self.library.get_entity(id))?;
        let new_material = self.copy_material(material);

        let mut values = layer.values.clone();
        values[0] = StepValue::Reference(new_material);
        Some(self.writer.add("IFCMATERIALLAYER", values))
    }

    fn copy_material(&mut self, material: &StepEntity) -> u64 {
        let new_material = self.writer.add(
            "IFCMATERIAL",
            vec![material.value_at(0), material.value_at(1), material.value_at(2)],
        );
        self.materials += 1;

        let library = self.library;
        for pset in library.get_entities_by_type("IFCMATERIALPROPERTIES") {
            if pset.ref_at(3) != Some(material.id) {
                continue;
            }
            let properties: Vec<u64> = pset
                .refs_at(2)
                .into_iter()
                .filter_map(|id| library.get_entity(id))
                .filter(|p| p.entity_type == "IFCPROPERTYSINGLEVALUE")
                .map(|p| {
                    self.writer.add(
                        "IFCPROPERTYSINGLEVALUE",
                        vec![p.value_at(0), p.value_at(1), p.value_at(2), StepValue::Null],
                    )
                })
                .collect();
            self.writer.add(
                "IFCMATERIALPROPERTIES",
                vec![
                    pset.value_at(0),
                    pset.value_at(1),
                    refs(&properties),
                    StepValue::Reference(new_material),
                ],
            );
        }

        for rel in library.get_entities_by_type("IFCRELASSOCIATESCLASSIFICATION") {
            if !rel.refs_at(4).contains(&material.id) {
                continue;
            }
            let Some(reference) = rel.ref_at(5).and_then(|id| library.get_entity(id)) else {
                continue;
            };
            let new_reference = self.writer.add(
                "IFCCLASSIFICATIONREFERENCE",
                vec![
                    reference.value_at(0),
                    reference.value_at(1),
                    reference.value_at(2),
                    StepValue::Null,
                    StepValue::Null,
                    StepValue::Null,
                ],
            );
            self.writer.add(
                "IFCRELASSOCIATESCLASSIFICATION",
                vec![
                    text(ifc_guid()),
                    StepValue::Reference(self.owner_history),
                    StepValue::Null,
                    StepValue::Null,
                    refs(&[new_material]),
                    StepValue::Reference(new_reference),
                ],
            );
        }

        new_material
    }
}

fn contains_reference(value: &StepValue) -> bool {
    match value {
        StepValue::Reference(_) => true,
        StepValue::List(items) => items.iter().any(contains_reference),
        StepValue::Typed(_, inner) => contains_reference(inner),
        _ => false,
    }
}
