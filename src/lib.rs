//! # eLCA Bridge
//!
//! Turns eLCA lifecycle-assessment results into an IFC4 material library.
//!
//! ## Features
//!
//! - Extract building elements and material components from eLCA HTML reports
//! - Attach layer thicknesses from the eLCA XML project export
//! - Write an IFC4 library of material layer sets with Ökobaudat references
//! - Attach the library to an existing IFC project file
//! - Browse the loaded data in a terminal UI, export it to CSV
//!
//! ## Example
//!
//! ```no_run
//! use elca_bridge::config::LibrarySettings;
//! use elca_bridge::workflow;
//! use std::path::Path;
//!
//! let outcome = workflow::convert(
//!     Path::new("results.html"),
//!     Some(Path::new("project.xml")),
//!     Path::new("library.ifc"),
//!     None,
//!     &LibrarySettings::default(),
//! )
//! .expect("conversion failed");
//! println!("Elements: {}", outcome.elements);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod session;
pub mod ui;
pub mod workflow;
