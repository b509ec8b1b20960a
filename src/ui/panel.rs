//! Status panels shown by the dashboard and the `status` command.
//!
//! Hosts ask every registered [`PanelContributor`] for its lines and lay them
//! out themselves, so adding a panel never touches the host's drawing code.

use crate::export::library::displayed_thickness_m;
use crate::session::Session;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Done,
    Pending,
    Warning,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub kind: LineKind,
    pub text: String,
}

impl PanelLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self.kind {
            LineKind::Done => "✓ ",
            LineKind::Warning => "⚠ ",
            LineKind::Pending | LineKind::Detail => "",
        }
    }
}

impl fmt::Display for PanelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.marker(), self.text)
    }
}

pub trait PanelContributor {
    fn title(&self) -> &str;
    fn lines(&self, session: &Session) -> Vec<PanelLine>;
}

/// Load progress and the next thing to do.
#[derive(Debug, Default)]
pub struct WorkflowStatusPanel;

impl PanelContributor for WorkflowStatusPanel {
    fn title(&self) -> &str {
        "eLCA Integration"
    }

    fn lines(&self, session: &Session) -> Vec<PanelLine> {
        let mut lines = Vec::new();

        match &session.html_path {
            Some(path) => lines.push(PanelLine::new(
                LineKind::Done,
                format!("HTML loaded: {}", file_name(path)),
            )),
            None => lines.push(PanelLine::new(LineKind::Pending, "1. Load HTML results file")),
        }

        match (&session.xml_path, session.layer_summary) {
            (Some(path), Some(summary)) if session.matched => {
                lines.push(PanelLine::new(
                    LineKind::Done,
                    format!("XML loaded: {}", file_name(path)),
                ));
                lines.push(PanelLine::new(
                    LineKind::Detail,
                    format!(
                        "  {} elements, {} layers matched",
                        summary.total_elements, summary.total_layers
                    ),
                ));
            }
            (Some(path), _) => lines.push(PanelLine::new(
                LineKind::Warning,
                format!("XML loaded: {} (no matching)", file_name(path)),
            )),
            (None, _) => lines.push(PanelLine::new(LineKind::Pending, "2. Load XML project file")),
        }

        let hint = if !session.html_loaded() {
            "Next: elca-bridge load-html <HTML>"
        } else if !session.xml_loaded() {
            "Next: elca-bridge load-xml <XML>"
        } else if session.matched {
            "3. Create IFC Library: elca-bridge create-library"
        } else {
            "Next: reload the XML project, or create the library anyway"
        };
        lines.push(PanelLine::new(LineKind::Pending, hint));

        lines
    }
}

/// One line per building element: layer count and summed thickness.
#[derive(Debug, Default)]
pub struct LayerSetsPanel;

impl PanelContributor for LayerSetsPanel {
    fn title(&self) -> &str {
        "Material Layer Sets"
    }

    fn lines(&self, session: &Session) -> Vec<PanelLine> {
        let sets: Vec<_> = session
            .elements
            .iter()
            .filter(|e| !e.components.is_empty())
            .collect();
        if sets.is_empty() {
            return vec![PanelLine::new(LineKind::Pending, "No material sets found")];
        }

        let mut lines = vec![PanelLine::new(
            LineKind::Detail,
            format!("Found {} layer sets", sets.len()),
        )];
        lines.extend(sets.iter().map(|element| {
            let total_mm: f64 = element
                .components
                .iter()
                .map(displayed_thickness_m)
                .sum::<f64>()
                * 1000.0;
            PanelLine::new(
                LineKind::Detail,
                format!(
                    "  - {} ({} layers, {:.1}mm thick)",
                    element.label(),
                    element.components.len(),
                    total_mm
                ),
            )
        }));
        lines
    }
}

/// Contributors in display order.
pub struct PanelRegistry {
    contributors: Vec<Box<dyn PanelContributor>>,
}

impl PanelRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            contributors: Vec::new(),
        }
    }

    pub fn register(&mut self, contributor: impl PanelContributor + 'static) {
        self.contributors.push(Box::new(contributor));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn PanelContributor + 'static)> {
        self.contributors.iter().map(AsRef::as_ref)
    }

    /// Renders every panel as plain text, one block per panel.
    #[must_use]
    pub fn render_text(&self, session: &Session) -> String {
        let mut out = String::new();
        for panel in self.iter() {
            out.push_str(&format!("[{}]\n", panel.title()));
            for line in panel.lines(session) {
                out.push_str(&format!("{line}\n"));
            }
        }
        out
    }
}

impl Default for PanelRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(WorkflowStatusPanel);
        registry.register(LayerSetsPanel);
        registry
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuildingElement, Component, MatchSummary};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn text(lines: &[PanelLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn fresh_session_asks_for_html() {
        let lines = WorkflowStatusPanel.lines(&Session::default());
        assert_eq!(
            text(&lines),
            vec![
                "1. Load HTML results file",
                "2. Load XML project file",
                "Next: elca-bridge load-html <HTML>",
            ]
        );
    }

    #[test]
    fn matched_session_shows_counts() {
        let session = Session {
            html_path: Some(PathBuf::from("/data/report.html")),
            xml_path: Some(PathBuf::from("/data/project.xml")),
            matched: true,
            layer_summary: Some(MatchSummary {
                total_elements: 4,
                total_layers: 9,
                matched_layers: 8,
                unmatched_layers: 1,
            }),
            elements: Vec::new(),
        };

        assert_eq!(
            text(&WorkflowStatusPanel.lines(&session)),
            vec![
                "✓ HTML loaded: report.html",
                "✓ XML loaded: project.xml",
                "  4 elements, 9 layers matched",
                "3. Create IFC Library: elca-bridge create-library",
            ]
        );
    }

    #[test]
    fn unmatched_xml_is_flagged() {
        let session = Session {
            html_path: Some(PathBuf::from("report.html")),
            xml_path: Some(PathBuf::from("project.xml")),
            layer_summary: Some(MatchSummary::default()),
            ..Session::default()
        };
        let lines = WorkflowStatusPanel.lines(&session);
        assert_eq!(lines[1].kind, LineKind::Warning);
        assert_eq!(lines[1].to_string(), "⚠ XML loaded: project.xml (no matching)");
    }

    #[test]
    fn layer_sets_sum_thickness() {
        let mut wall = BuildingElement::new("330", "Wall A");
        let mut beton = Component::new("Beton", "");
        beton.layer_thickness = Some(0.2);
        wall.components = vec![beton, Component::new("Putz", "1,5 cm")];
        let session = Session {
            elements: vec![wall, BuildingElement::new("340", "Empty")],
            ..Session::default()
        };

        assert_eq!(
            text(&LayerSetsPanel.lines(&session)),
            vec![
                "Found 1 layer sets",
                "  - 330 Wall A (2 layers, 215.0mm thick)",
            ]
        );
    }

    #[test]
    fn registry_renders_in_registration_order() {
        let rendered = PanelRegistry::default().render_text(&Session::default());
        let titles: Vec<&str> = rendered.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(titles, vec!["[eLCA Integration]", "[Material Layer Sets]"]);
    }
}
