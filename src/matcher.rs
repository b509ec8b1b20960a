//! Attaches XML layer thicknesses to the components extracted from HTML.
//!
//! Element choice, in order: equal category and name; equal category and one
//! name containing the other; equal name when the XML carries no category.
//! Layer choice inside the element: first unclaimed component with an equal
//! name, then first unclaimed component where one name contains the other.
//! All comparisons are on trimmed, lowercased, whitespace-collapsed text and
//! ties go to document order, so equal inputs always give equal matches.

use crate::model::{BuildingElement, MatchSummary, XmlElementRecord};
use tracing::{debug, info, warn};

/// Matches every XML layer onto a component and stores its thickness.
///
/// Unmatched layers are counted, never raised. Layers without a positive
/// thickness never overwrite a component and count as unmatched. Components are claimed at most
/// once per call, so repeated layer names map onto repeated components in
/// order, and running the matcher twice yields the same result.
pub fn match_layers(elements: &mut [BuildingElement], records: &[XmlElementRecord]) -> MatchSummary {
    let mut summary = MatchSummary {
        total_elements: records.len(),
        ..MatchSummary::default()
    };
    let mut claimed: Vec<Vec<bool>> = elements
        .iter()
        .map(|e| vec![false; e.components.len()])
        .collect();

    for record in records {
        summary.total_layers += record
            .layers
            .iter()
            .filter(|l| l.thickness_m > 0.0)
            .count();

        let Some(element_idx) = find_element(elements, record) else {
            debug!(
                category = %record.category_code,
                name = %record.name,
                "no building element for XML element"
            );
            summary.unmatched_layers += record.layers.len();
            continue;
        };

        let element = &mut elements[element_idx];
        for layer in &record.layers {
            if layer.thickness_m <= 0.0 {
                summary.unmatched_layers += 1;
                debug!(element = %element.name, layer = %layer.layer_name, "layer without thickness");
                continue;
            }
            match find_component(element, &claimed[element_idx], &layer.layer_name) {
                Some(component_idx) => {
                    claimed[element_idx][component_idx] = true;
                    let component = &mut element.components[component_idx];
                    component.layer_thickness = Some(layer.thickness_m);
                    summary.matched_layers += 1;
                    debug!(
                        element = %element.name,
                        layer = %layer.layer_name,
                        component = %element.components[component_idx].name,
                        thickness_m = layer.thickness_m,
                        "matched layer"
                    );
                }
                None => {
                    summary.unmatched_layers += 1;
                    debug!(element = %element.name, layer = %layer.layer_name, "unmatched layer");
                }
            }
        }
    }

    if summary.is_empty() {
        warn!(
            xml_elements = summary.total_elements,
            "no layer thickness data found in XML"
        );
    }
    info!(
        xml_elements = summary.total_elements,
        xml_layers = summary.total_layers,
        matched = summary.matched_layers,
        unmatched = summary.unmatched_layers,
        "layer matching finished"
    );
    summary
}

fn find_element(elements: &[BuildingElement], record: &XmlElementRecord) -> Option<usize> {
    let category = normalize(&record.category_code);
    let name = normalize(&record.name);
    if name.is_empty() {
        return None;
    }

    let normalized: Vec<(String, String)> = elements
        .iter()
        .map(|e| (normalize(&e.category_code), normalize(&e.name)))
        .collect();

    normalized
        .iter()
        .position(|(c, n)| *c == category && *n == name)
        .or_else(|| {
            normalized
                .iter()
                .position(|(c, n)| *c == category && overlaps(n, &name))
        })
        .or_else(|| {
            if category.is_empty() {
                normalized.iter().position(|(_, n)| *n == name)
            } else {
                None
            }
        })
}

fn find_component(element: &BuildingElement, claimed: &[bool], layer_name: &str) -> Option<usize> {
    let layer = normalize(layer_name);
    if layer.is_empty() {
        return None;
    }

    let candidates: Vec<(usize, String)> = element
        .components
        .iter()
        .enumerate()
        .filter(|(idx, _)| !claimed[*idx])
        .map(|(idx, c)| (idx, normalize(&c.name)))
        .collect();

    candidates
        .iter()
        .find(|(_, n)| *n == layer)
        .or_else(|| candidates.iter().find(|(_, n)| overlaps(n, &layer)))
        .map(|(idx, _)| *idx)
}

/// One non-empty name contains the other.
fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
