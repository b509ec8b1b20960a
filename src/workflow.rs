//! The load / match / create steps, run against a [`Session`].
//!
//! Steps validate their preconditions and parse everything before touching
//! the session, so a failed step leaves it as it was. Saving the session is
//! left to the caller.

use crate::config::LibrarySettings;
use crate::error::WorkflowError;
use crate::export::{attach_library_to_project, create_library as write_library, AttachReport, LibraryReport};
use crate::matcher::match_layers;
use crate::model::layers_with_thickness;
use crate::parser::html::parse_html_file;
use crate::parser::xml::parse_xml_file;
use crate::session::Session;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

/// What a step did: user-facing messages plus the counts behind them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub messages: Vec<Message>,
    pub elements: usize,
    pub components: usize,
    /// Components carrying a thickness above zero.
    pub matched_layers: usize,
    pub xml_elements: usize,
    pub xml_layers: usize,
    pub library: Option<LibraryReport>,
    pub attach: Option<AttachReport>,
}

impl StepOutcome {
    fn from_session(session: &Session) -> Self {
        let summary = session.layer_summary.unwrap_or_default();
        Self {
            elements: session.elements.len(),
            components: session.component_count(),
            matched_layers: layers_with_thickness(&session.elements),
            xml_elements: summary.total_elements,
            xml_layers: summary.total_layers,
            ..Self::default()
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            severity: Severity::Info,
            text: text.into(),
        });
    }

    fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{text}");
        self.messages.push(Message {
            severity: Severity::Warning,
            text,
        });
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warning)
    }
}

/// Step 1: extracts building elements from the HTML report.
///
/// Any XML state from an earlier run is dropped.
pub fn load_results(session: &mut Session, html_path: &Path) -> Result<StepOutcome, WorkflowError> {
    ensure_exists(html_path)?;
    let elements = parse_html_file(html_path)?;

    session.html_path = Some(html_path.to_path_buf());
    session.elements = elements;
    session.clear_xml();

    let mut outcome = StepOutcome::from_session(session);
    info!(
        path = %html_path.display(),
        elements = outcome.elements,
        components = outcome.components,
        "HTML results loaded"
    );
    outcome.info(format!(
        "Loaded HTML with {} building elements and {} components",
        outcome.elements, outcome.components
    ));
    Ok(outcome)
}

/// Step 2: re-reads the HTML report and attaches the XML layer thicknesses.
pub fn load_project(session: &mut Session, xml_path: &Path) -> Result<StepOutcome, WorkflowError> {
    let html_path = session
        .html_path
        .clone()
        .filter(|p| p.exists())
        .ok_or(WorkflowError::HtmlNotLoaded)?;
    ensure_exists(xml_path)?;

    let mut elements = parse_html_file(&html_path)?;
    let records = parse_xml_file(xml_path)?;
    let summary = match_layers(&mut elements, &records);

    session.xml_path = Some(xml_path.to_path_buf());
    session.elements = elements;
    session.matched = summary.total_layers > 0;
    session.layer_summary = Some(summary);

    let mut outcome = StepOutcome::from_session(session);
    if session.matched {
        outcome.info(format!(
            "Matched {} components with layer thicknesses from {} XML elements",
            outcome.matched_layers, summary.total_elements
        ));
    } else {
        outcome.warning("No layer thickness data found in XML file");
    }
    Ok(outcome)
}

/// Step 3: writes the IFC library and optionally attaches it to a project.
///
/// `output` defaults to the HTML path with an `.ifc` extension. A failed
/// attach is reported as a warning; the library file is kept.
pub fn create_library(
    session: &Session,
    output: Option<&Path>,
    attach: Option<&Path>,
    settings: &LibrarySettings,
) -> Result<StepOutcome, WorkflowError> {
    let html_path = session.html_path.as_deref().ok_or(WorkflowError::HtmlNotLoaded)?;
    if !session.xml_loaded() {
        return Err(WorkflowError::XmlNotLoaded);
    }
    if session.elements.is_empty() {
        return Err(WorkflowError::NoElements);
    }

    let mut outcome = StepOutcome::from_session(session);
    if !session.matched {
        outcome.warning("Data matching may not be complete. Proceeding anyway...");
    }

    let output = output.map_or_else(|| html_path.with_extension("ifc"), Path::to_path_buf);
    emit(session, &output, attach, settings, &mut outcome)?;
    Ok(outcome)
}

/// Runs all steps in one go without a stored session.
///
/// Without an XML project the thicknesses come from the quantity texts alone.
pub fn convert(
    html_path: &Path,
    xml_path: Option<&Path>,
    output: &Path,
    attach: Option<&Path>,
    settings: &LibrarySettings,
) -> Result<StepOutcome, WorkflowError> {
    let mut session = Session::default();
    let mut outcome = load_results(&mut session, html_path)?;
    if let Some(xml_path) = xml_path {
        let matched = load_project(&mut session, xml_path)?;
        outcome.messages.extend(matched.messages);
    }
    if session.elements.is_empty() {
        return Err(WorkflowError::NoElements);
    }

    let counts = StepOutcome::from_session(&session);
    outcome = StepOutcome {
        messages: outcome.messages,
        ..counts
    };
    emit(&session, output, attach, settings, &mut outcome)?;
    Ok(outcome)
}

/// Removes the stored session.
pub fn reset(session_path: &Path) -> Result<StepOutcome, WorkflowError> {
    let cleared = Session::reset(session_path)?;
    let mut outcome = StepOutcome::default();
    outcome.info(format!("Reset eLCA data - cleared {cleared} stored properties"));
    Ok(outcome)
}

fn emit(
    session: &Session,
    output: &Path,
    attach: Option<&Path>,
    settings: &LibrarySettings,
    outcome: &mut StepOutcome,
) -> Result<(), WorkflowError> {
    let report = write_library(&session.elements, output, settings)?;
    outcome.info(format!(
        "Created IFC library with {} elements ({} with layer thicknesses) at {}",
        outcome.elements,
        report.layers_with_thickness,
        output.display()
    ));
    outcome.library = Some(report);

    if let Some(project) = attach {
        match attach_library_to_project(project, output, settings) {
            Ok(report) => {
                outcome.info(format!("Attached library to project at {}", project.display()));
                outcome.attach = Some(report);
            }
            Err(e) => outcome.warning(format!("Could not attach to project: {e}")),
        }
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<(), WorkflowError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(WorkflowError::InputNotFound {
            path: PathBuf::from(path),
        })
    }
}
