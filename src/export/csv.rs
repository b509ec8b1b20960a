use crate::error::ExportError;
use crate::model::BuildingElement;
use std::fs::File;
use std::path::Path;

/// One row per component: where it sits, what eLCA printed, what was matched.
pub fn export_layer_csv<P: AsRef<Path>>(
    elements: &[BuildingElement],
    path: P,
) -> Result<usize, ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "Category",
        "Element",
        "Component",
        "Quantity",
        "Thickness (m)",
        "Process UUIDs",
    ])?;

    let mut rows = 0;
    for element in elements {
        for component in &element.components {
            let thickness = component
                .layer_thickness
                .map(|t| format!("{t:.4}"))
                .unwrap_or_default();
            let uuids = component
                .lifecycle_processes
                .iter()
                .map(|p| p.uuid.as_str())
                .collect::<Vec<_>>()
                .join(";");

            writer.write_record([
                element.category_code.as_str(),
                element.name.as_str(),
                component.name.as_str(),
                component.quantity.as_str(),
                thickness.as_str(),
                uuids.as_str(),
            ])?;
            rows += 1;
        }
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;

    #[test]
    fn writes_one_row_per_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.csv");

        let mut element = BuildingElement::new("330", "Wall A");
        let mut beton = Component::new("Beton", "200,00 mm");
        beton.layer_thickness = Some(0.2);
        element.components = vec![beton, Component::new("Putz", "")];

        let rows = export_layer_csv(&[element, BuildingElement::new("340", "Empty")], &path).unwrap();
        assert_eq!(rows, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "330,Wall A,Beton,\"200,00 mm\",0.2000,");
        assert_eq!(lines[2], "330,Wall A,Putz,,,");
    }
}
