use crate::error::ParseError;
use crate::model::{BuildingElement, Component, ProcessRef};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::{debug, info, warn};

// Selectors of the eLCA report template. A change in the template is a
// compatibility break, so they are kept in one place.
const REPORT_ROOT: &str = ".elca-report";
const ELEMENT: &str = ".element";
const ELEMENT_TITLE: &str = ".element-title";
const ELEMENT_CODE: &str = ".din-code";
const ELEMENT_NAME: &str = ".element-name";
const COMPONENT: &str = ".component";
const COMPONENT_NAME: &str = ".component-name";
const COMPONENT_QUANTITY: &str = ".component-quantity";
const PROCESS: &str = ".process";

struct Selectors {
    root: Selector,
    element: Selector,
    title: Selector,
    code: Selector,
    name: Selector,
    component: Selector,
    component_name: Selector,
    quantity: Selector,
    process: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ParseError> {
        Ok(Self {
            root: selector(REPORT_ROOT)?,
            element: selector(ELEMENT)?,
            title: selector(ELEMENT_TITLE)?,
            code: selector(ELEMENT_CODE)?,
            name: selector(ELEMENT_NAME)?,
            component: selector(COMPONENT)?,
            component_name: selector(COMPONENT_NAME)?,
            quantity: selector(COMPONENT_QUANTITY)?,
            process: selector(PROCESS)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::InvalidHtml {
        message: format!("bad selector '{css}': {e}"),
    })
}

/// Reads an eLCA HTML report from disk and extracts its building elements.
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read and
/// [`ParseError::InvalidHtml`] if it is not an eLCA report.
pub fn parse_html_file<P: AsRef<Path>>(path: P) -> Result<Vec<BuildingElement>, ParseError> {
    let bytes = std::fs::read(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    extract_building_elements(&bytes)
}

/// Extracts building elements and their components from report bytes.
///
/// Optional fields (quantity, process list) default to empty. Elements with
/// the same category and name are merged so each appears once, in the order
/// first seen.
pub fn extract_building_elements(html: &[u8]) -> Result<Vec<BuildingElement>, ParseError> {
    let text = std::str::from_utf8(html).map_err(|e| ParseError::InvalidHtml {
        message: format!("report is not UTF-8: {e}"),
    })?;

    let sel = Selectors::new()?;
    let document = Html::parse_document(text);

    let Some(root) = document.select(&sel.root).next() else {
        return Err(ParseError::InvalidHtml {
            message: format!("no '{REPORT_ROOT}' container found"),
        });
    };

    let mut elements: Vec<BuildingElement> = Vec::new();

    for (position, node) in root.select(&sel.element).enumerate() {
        let (category_code, name) = read_element_header(&sel, node);
        if name.is_empty() {
            return Err(ParseError::InvalidHtml {
                message: format!("building element #{} has no name", position + 1),
            });
        }

        let existing = elements
            .iter()
            .position(|e| e.category_code == category_code && e.name == name);
        let index = match existing {
            Some(index) => index,
            None => {
                elements.push(BuildingElement::new(category_code, name));
                elements.len() - 1
            }
        };

        let element = &mut elements[index];
        for row in node.select(&sel.component) {
            let idx = element.components.len();
            element.components.push(read_component(&sel, row, idx));
        }
        debug!(
            element = %element.label(),
            components = element.components.len(),
            "extracted building element"
        );
    }

    if elements.is_empty() {
        warn!("report contains no building elements");
    }
    info!(
        elements = elements.len(),
        components = crate::model::component_count(&elements),
        "HTML extraction finished"
    );

    Ok(elements)
}

fn read_element_header(sel: &Selectors, node: ElementRef<'_>) -> (String, String) {
    let title = node
        .select(&sel.title)
        .next()
        .map(collapse_text)
        .unwrap_or_default();

    let code = node
        .select(&sel.code)
        .next()
        .map(collapse_text)
        .unwrap_or_else(|| leading_code(&title).to_string());

    let name = node.select(&sel.name).next().map_or_else(
        || {
            title
                .strip_prefix(code.as_str())
                .unwrap_or(&title)
                .trim()
                .to_string()
        },
        collapse_text,
    );

    (code, name)
}

fn read_component(sel: &Selectors, row: ElementRef<'_>, idx: usize) -> Component {
    let name = row
        .select(&sel.component_name)
        .next()
        .map(collapse_text)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Component_{idx}"));

    let quantity = row
        .select(&sel.quantity)
        .next()
        .map(collapse_text)
        .unwrap_or_default();

    let lifecycle_processes = row
        .select(&sel.process)
        .filter_map(read_process)
        .collect();

    Component {
        name,
        quantity,
        layer_thickness: None,
        lifecycle_processes,
    }
}

fn read_process(node: ElementRef<'_>) -> Option<ProcessRef> {
    let attrs = node.value();
    let uuid = attrs
        .attr("data-uuid")
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| {
            attrs
                .attr("href")
                .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
                .filter(|u| !u.is_empty())
        })?;

    Some(ProcessRef {
        uuid: uuid.to_string(),
        process_name: collapse_text(node),
    })
}

/// Leading numeric token of a title such as "330 Außenwand".
fn leading_code(title: &str) -> &str {
    title
        .split_whitespace()
        .next()
        .filter(|token| token.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .unwrap_or_default()
}

fn collapse_text(node: ElementRef<'_>) -> String {
    node.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"
        <html><body><div class="elca-report">
          <div class="element">
            <h3 class="element-title"><span class="din-code">330</span>
              <span class="element-name">Wall A</span></h3>
            <table class="components"><tbody>
              <tr class="component">
                <td class="component-name">Beton</td>
                <td class="component-quantity">200,00 mm</td>
                <td class="component-processes">
                  <a class="process" data-uuid="a1b2">Transportbeton C20/25</a>
                </td>
              </tr>
              <tr class="component">
                <td class="component-name">Mineralwolle</td>
              </tr>
            </tbody></table>
          </div>
          <div class="element">
            <h3 class="element-title">340 Wall B</h3>
            <table class="components"><tbody>
              <tr class="component">
                <td class="component-name">Gipskarton</td>
                <td class="component-quantity">12,5 mm</td>
                <td><a class="process" href="https://oekobaudat.de/datasetdetail/c3d4/">Gips</a></td>
              </tr>
            </tbody></table>
          </div>
        </div></body></html>
    "#;

    #[test]
    fn extracts_elements_and_components() {
        let elements = extract_building_elements(REPORT.as_bytes()).unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].label(), "330 Wall A");
        assert_eq!(elements[0].components.len(), 2);
        assert_eq!(elements[0].components[0].quantity, "200,00 mm");
        assert_eq!(
            elements[0].components[0].lifecycle_processes,
            vec![ProcessRef {
                uuid: "a1b2".to_string(),
                process_name: "Transportbeton C20/25".to_string(),
            }]
        );
        assert_eq!(elements[1].category_code, "340");
        assert_eq!(elements[1].name, "Wall B");
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let elements = extract_building_elements(REPORT.as_bytes()).unwrap();
        let wool = &elements[0].components[1];
        assert_eq!(wool.quantity, "");
        assert!(wool.lifecycle_processes.is_empty());
        assert_eq!(wool.layer_thickness, None);
    }

    #[test]
    fn process_uuid_falls_back_to_href() {
        let elements = extract_building_elements(REPORT.as_bytes()).unwrap();
        assert_eq!(elements[1].components[0].lifecycle_processes[0].uuid, "c3d4");
    }

    #[test]
    fn repeated_extraction_is_stable() {
        let first = extract_building_elements(REPORT.as_bytes()).unwrap();
        let second = extract_building_elements(REPORT.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_elements_are_merged() {
        let html = r#"<div class="elca-report">
            <div class="element"><h3 class="element-title">330 Wall A</h3>
              <table><tr class="component"><td class="component-name">Beton</td></tr></table></div>
            <div class="element"><h3 class="element-title">330 Wall A</h3>
              <table><tr class="component"><td class="component-name">Putz</td></tr></table></div>
        </div>"#;
        let elements = extract_building_elements(html.as_bytes()).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].components.len(), 2);
    }

    #[test]
    fn unnamed_component_gets_positional_name() {
        let html = r#"<div class="elca-report"><div class="element">
            <h3 class="element-title">330 Wall A</h3>
            <table><tr class="component"><td class="component-quantity">5 cm</td></tr></table>
        </div></div>"#;
        let elements = extract_building_elements(html.as_bytes()).unwrap();
        assert_eq!(elements[0].components[0].name, "Component_0");
    }

    #[test]
    fn rejects_documents_without_report_root() {
        let err = extract_building_elements(b"<html><body><p>hello</p></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHtml { .. }));
    }

    #[test]
    fn rejects_unnamed_elements() {
        let html = r#"<div class="elca-report"><div class="element"></div></div>"#;
        assert!(extract_building_elements(html.as_bytes()).is_err());
    }

    #[test]
    fn rejects_non_utf8() {
        assert!(extract_building_elements(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn empty_report_is_not_an_error() {
        let elements = extract_building_elements(br#"<div class="elca-report"></div>"#).unwrap();
        assert!(elements.is_empty());
    }
}
