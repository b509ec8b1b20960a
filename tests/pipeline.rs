use elca_bridge::config::LibrarySettings;
use elca_bridge::error::WorkflowError;
use elca_bridge::parser::step::{StepFile, StepValue};
use elca_bridge::session::Session;
use elca_bridge::workflow;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const REPORT: &str = r#"<!DOCTYPE html>
<html lang="de"><head><meta charset="utf-8"><title>eLCA Bauteilkatalog</title></head>
<body>
<div class="elca-report">
  <section class="element">
    <h2 class="element-title"><span class="din-code">330</span> <span class="element-name">Außenwand Beton</span></h2>
    <div class="component">
      <span class="component-name">Stahlbeton C30/37</span>
      <span class="component-quantity">200,00 mm</span>
      <a class="process" href="https://oekobaudat.de/OEKOBAU.DAT/datasetdetail/7b5a2a6f-52a4-4b4c-a04e-2f1c4e0b8d11">Beton der Druckfestigkeitsklasse C 30/37</a>
      <a class="process" data-uuid="a1c7ad1e-9d8a-4c3e-b1f0-6e2b0b3b2a77">Bewehrungsstahl</a>
    </div>
    <div class="component">
      <span class="component-name">Kalkzementputz</span>
      <span class="component-quantity">1,50 cm</span>
    </div>
  </section>
  <section class="element">
    <h2 class="element-title"><span class="din-code">350</span> <span class="element-name">Geschossdecke</span></h2>
    <div class="component">
      <span class="component-name">Estrich</span>
      <span class="component-quantity">ca. 5 cm</span>
    </div>
  </section>
  <section class="element">
    <h2 class="element-title"><span class="din-code">360</span> <span class="element-name">Flachdach</span></h2>
  </section>
</div>
</body></html>"#;

const PROJECT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<elca xmlns="https://www.bauteileditor.de/elca">
  <project name="Musterhaus">
    <element din276Code="330" name="Außenwand Beton">
      <layer name="Stahlbeton C30/37" thickness="200,00" unit="mm"/>
      <layer name="Kalkzementputz" thickness="1,5" unit="cm"/>
    </element>
    <element din276Code="350" name="Geschossdecke">
      <layer name="Trittschalldämmung" thickness="30" unit="mm"/>
    </element>
  </project>
</elca>"#;

const IFC_PROJECT: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('house.ifc','2026-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPERSON($,'Doe','Jane',$,$,$,$,$);
#2=IFCORGANIZATION($,'Studio',$,$,$);
#3=IFCPERSONANDORGANIZATION(#1,#2,$);
#4=IFCAPPLICATION(#2,'1','Tool','tool');
#5=IFCOWNERHISTORY(#3,#4,$,.ADDED.,$,$,$,0);
#6=IFCPROJECT('2O2Fr$t4X7Zf8NOew3FLOH',#5,'Musterhaus',$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn layer_thicknesses(ifc: &StepFile) -> Vec<(String, f64)> {
    ifc.get_entities_by_type("IFCMATERIALLAYER")
        .into_iter()
        .map(|layer| {
            let name = layer.string_at(3).unwrap_or_default().to_string();
            let thickness = match layer.values[1] {
                StepValue::Real(t) => t,
                _ => f64::NAN,
            };
            (name, thickness)
        })
        .collect()
}

#[test]
fn steps_hand_off_through_the_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let html = write(dir.path(), "results.html", REPORT);
    let xml = write(dir.path(), "project.xml", PROJECT_XML);
    let state = dir.path().join(".elca-session.json");

    let mut session = Session::load_or_default(&state);
    let loaded = workflow::load_results(&mut session, &html).unwrap();
    session.save(&state).unwrap();
    assert_eq!((loaded.elements, loaded.components), (3, 3));

    let mut session = Session::load(&state).unwrap();
    let matched = workflow::load_project(&mut session, &xml).unwrap();
    session.save(&state).unwrap();
    assert_eq!(matched.xml_elements, 2);
    assert_eq!(matched.xml_layers, 3);
    assert_eq!(matched.matched_layers, 2);
    assert!(!matched.has_warnings());

    let session = Session::load(&state).unwrap();
    assert!(session.matched);
    let created =
        workflow::create_library(&session, None, None, &LibrarySettings::default()).unwrap();

    let library_path = dir.path().join("results.ifc");
    let report = created.library.unwrap();
    assert_eq!(report.path, library_path);
    assert_eq!(report.layer_sets, 2);
    assert_eq!(report.element_types, 2);
    assert_eq!(report.layers_with_thickness, 2);

    let ifc = StepFile::parse(&std::fs::read_to_string(&library_path).unwrap()).unwrap();
    assert_eq!(ifc.schema, "IFC4");
    assert_eq!(ifc.get_entities_by_type("IFCWALLTYPE").len(), 1);
    assert_eq!(ifc.get_entities_by_type("IFCSLABTYPE").len(), 1);
    assert_eq!(ifc.get_entities_by_type("IFCMATERIALPROPERTIES").len(), 2);

    let layers = layer_thicknesses(&ifc);
    let names: Vec<&str> = layers.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Stahlbeton C30/37", "Kalkzementputz", "Estrich"]);
    assert!((layers[0].1 - 0.2).abs() < 1e-9);
    assert!((layers[1].1 - 0.015).abs() < 1e-9);
    assert!((layers[2].1 - 0.01).abs() < 1e-9);
}

#[test]
fn convert_attaches_to_an_existing_project() {
    let dir = tempfile::tempdir().unwrap();
    let html = write(dir.path(), "results.html", REPORT);
    let xml = write(dir.path(), "project.xml", PROJECT_XML);
    let house = write(dir.path(), "house.ifc", IFC_PROJECT);
    let output = dir.path().join("library.ifc");

    let outcome = workflow::convert(
        &html,
        Some(&xml),
        &output,
        Some(&house),
        &LibrarySettings::default().with_library_name(Some("Musterhaus Materialien".to_string())),
    )
    .unwrap();

    assert!(!outcome.has_warnings());
    let attach = outcome.attach.unwrap();
    assert_eq!(attach.element_types, 2);
    assert_eq!(attach.skipped_types, 0);

    let merged_text = std::fs::read_to_string(&house).unwrap();
    assert!(merged_text.contains("#6=IFCPROJECT('2O2Fr$t4X7Zf8NOew3FLOH',#5,'Musterhaus'"));
    let merged = StepFile::parse(&merged_text).unwrap();
    assert_eq!(merged.get_entities_by_type("IFCOWNERHISTORY").len(), 1);
    assert_eq!(merged.get_entities_by_type("IFCPROJECT").len(), 1);

    let info = merged.get_entities_by_type("IFCLIBRARYINFORMATION");
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].string_at(0), Some("Musterhaus Materialien"));
}

#[test]
fn xml_before_html_is_rejected_without_touching_state() {
    let dir = tempfile::tempdir().unwrap();
    let xml = write(dir.path(), "project.xml", PROJECT_XML);
    let state = dir.path().join(".elca-session.json");

    let mut session = Session::load_or_default(&state);
    let err = workflow::load_project(&mut session, &xml).unwrap_err();

    assert!(matches!(err, WorkflowError::HtmlNotLoaded));
    assert_eq!(session, Session::default());
    assert!(!state.exists());
}

#[test]
fn broken_report_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let html = write(dir.path(), "results.html", "<html><body><p>Login</p></body></html>");

    let err = workflow::load_results(&mut Session::default(), &html).unwrap_err();
    assert!(matches!(err, WorkflowError::Parse(_)));
}
