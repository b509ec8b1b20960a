use crate::error::ParseError;
use crate::model::{LayerThicknessRecord, XmlElementRecord};
use crate::parser::thickness::{parse_thickness, parse_thickness_with_unit, DEFAULT_LAYER_THICKNESS_M};
use roxmltree::{Document, Node};
use std::path::Path;
use tracing::{info, warn};

/// Reads an eLCA project export from disk.
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read and
/// [`ParseError::InvalidXml`] if it is not well-formed XML.
pub fn parse_xml_file<P: AsRef<Path>>(path: P) -> Result<Vec<XmlElementRecord>, ParseError> {
    let bytes = std::fs::read(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    parse_project_xml(&bytes)
}

/// Collects every `<element>` of the export with its `<layer>` records.
///
/// Tags are matched by local name, so namespaced exports work unchanged.
pub fn parse_project_xml(xml: &[u8]) -> Result<Vec<XmlElementRecord>, ParseError> {
    let text = std::str::from_utf8(xml).map_err(|e| ParseError::InvalidXml {
        message: format!("export is not UTF-8: {e}"),
    })?;
    let doc = Document::parse(text).map_err(|e| ParseError::InvalidXml {
        message: e.to_string(),
    })?;

    let records: Vec<XmlElementRecord> = doc
        .descendants()
        .filter(|n| is_tag(n, "element"))
        .map(|node| read_element(&node))
        .collect();

    info!(
        elements = records.len(),
        layers = records.iter().map(|r| r.layers.len()).sum::<usize>(),
        "XML project parsed"
    );
    Ok(records)
}

fn is_tag(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn read_element(node: &Node<'_, '_>) -> XmlElementRecord {
    let category_code = node
        .attribute("din276Code")
        .or_else(|| node.attribute("category"))
        .unwrap_or_default()
        .trim()
        .to_string();

    let name = node
        .attribute("name")
        .map(str::to_string)
        .or_else(|| {
            node.children()
                .find(|c| is_tag(c, "name"))
                .and_then(|c| c.text())
                .map(str::to_string)
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    // Layers of a nested <element> belong to that element only.
    let layers = node
        .descendants()
        .filter(|n| is_tag(n, "layer"))
        .filter(|n| n.ancestors().find(|a| is_tag(a, "element")) == Some(*node))
        .map(|layer| read_layer(&layer, &category_code, &name))
        .collect();

    XmlElementRecord {
        category_code,
        name,
        layers,
    }
}

fn read_layer(node: &Node<'_, '_>, category: &str, element_name: &str) -> LayerThicknessRecord {
    let layer_name = node.attribute("name").unwrap_or_default().trim().to_string();
    let raw = node.attribute("thickness").unwrap_or_default().trim();

    let parsed = match node.attribute("unit") {
        Some(unit) => parse_thickness_with_unit(raw, unit),
        None => parse_thickness(raw),
    };

    let thickness_m = if raw.is_empty() {
        0.0
    } else {
        parsed.unwrap_or_else(|err| {
            warn!(
                element = element_name,
                layer = %layer_name,
                raw,
                %err,
                "unparseable layer thickness, using default"
            );
            DEFAULT_LAYER_THICKNESS_M
        })
    };

    LayerThicknessRecord {
        element_category: category.to_string(),
        element_name: element_name.to_string(),
        layer_name,
        raw: match node.attribute("unit") {
            Some(unit) => format!("{raw} {unit}"),
            None => raw.to_string(),
        },
        thickness_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_elements_and_layers() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <elcaProject xmlns="https://www.bauteileditor.de">
              <element din276Code="330" name="Wall A">
                <layer name="Beton" thickness="200,00 mm"/>
                <layer name="Dämmung" thickness="12" unit="cm"/>
              </element>
              <element category="340"><name>Wall B</name></element>
            </elcaProject>"#;

        let records = parse_project_xml(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].layers.len(), 2);
        assert!((records[0].layers[0].thickness_m - 0.2).abs() < 1e-12);
        assert!((records[0].layers[1].thickness_m - 0.12).abs() < 1e-12);
        assert_eq!(records[0].layers[1].raw, "12 cm");
        assert_eq!(records[1].category_code, "340");
        assert_eq!(records[1].name, "Wall B");
        assert!(records[1].layers.is_empty());
    }

    #[test]
    fn bad_thickness_uses_default() {
        let xml = r#"<p><element din276Code="330" name="W">
            <layer name="Beton" thickness="thick"/>
            <layer name="Luft"/>
        </element></p>"#;
        let records = parse_project_xml(xml.as_bytes()).unwrap();
        let layers = &records[0].layers;
        assert!((layers[0].thickness_m - DEFAULT_LAYER_THICKNESS_M).abs() < 1e-12);
        assert!(layers[1].thickness_m.abs() < 1e-12);
    }

    #[test]
    fn nested_element_layers_are_not_counted_twice() {
        let xml = r#"<p><element din276Code="330" name="Outer">
            <layers><layer name="Beton" thickness="200"/></layers>
            <element din276Code="331" name="Inner">
                <layer name="Putz" thickness="15"/>
            </element>
        </element></p>"#;
        let records = parse_project_xml(xml.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        let names: Vec<Vec<&str>> = records
            .iter()
            .map(|r| r.layers.iter().map(|l| l.layer_name.as_str()).collect())
            .collect();
        assert_eq!(names, vec![vec!["Beton"], vec!["Putz"]]);
    }

    #[test]
    fn ill_formed_xml_is_an_error() {
        let err = parse_project_xml(b"<elcaProject><element>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidXml { .. }));
    }
}
