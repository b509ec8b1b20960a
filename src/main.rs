use clap::{ArgAction, Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use elca_bridge::config::{LibrarySettings, DEFAULT_STATE_FILE};
use elca_bridge::export::export_layer_csv;
use elca_bridge::session::Session;
use elca_bridge::ui::{App, PanelRegistry};
use elca_bridge::workflow::{self, Severity, StepOutcome};

#[derive(Parser, Debug)]
#[command(name = "elca-bridge")]
#[command(about = "eLCA Bridge - turn eLCA results into an IFC material library")]
#[command(version)]
struct Args {
    /// Session snapshot shared between steps
    #[arg(long, value_name = "FILE", env = "ELCA_BRIDGE_STATE", default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Step 1: load the eLCA results report (.html / .htm)
    LoadHtml { html: PathBuf },

    /// Step 2: load the eLCA project export (.xml) and match layer thicknesses
    LoadXml { xml: PathBuf },

    /// Step 3: write the IFC material library
    CreateLibrary {
        /// Output path (defaults to the HTML path with .ifc extension)
        #[arg(long, value_name = "IFC")]
        output: Option<PathBuf>,

        /// IFC project file to attach the library to
        #[arg(long, value_name = "PROJECT_IFC")]
        attach: Option<PathBuf>,

        #[command(flatten)]
        library: LibraryArgs,
    },

    /// Show load progress and layer sets
    Status,

    /// Export one CSV row per component
    Report { csv: PathBuf },

    /// Browse the loaded elements in a terminal UI
    Inspect,

    /// Remove the stored session
    Reset,

    /// Run all steps at once without touching the session
    Convert {
        html: PathBuf,

        #[arg(long, value_name = "XML")]
        xml: Option<PathBuf>,

        #[arg(long, value_name = "IFC")]
        output: PathBuf,

        #[arg(long, value_name = "PROJECT_IFC")]
        attach: Option<PathBuf>,

        #[command(flatten)]
        library: LibraryArgs,
    },
}

#[derive(clap::Args, Debug)]
struct LibraryArgs {
    /// Name of the IfcLibraryInformation
    #[arg(long, value_name = "NAME")]
    library_name: Option<String>,

    /// Publishing organization
    #[arg(long, value_name = "NAME")]
    publisher: Option<String>,
}

impl LibraryArgs {
    fn settings(self) -> LibrarySettings {
        LibrarySettings::default()
            .with_library_name(self.library_name)
            .with_publisher(self.publisher)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::LoadHtml { html } => {
            let mut session = Session::load_or_default(&args.state);
            let outcome = workflow::load_results(&mut session, &html)?;
            session.save(&args.state)?;
            print_outcome(&outcome);
        }
        Command::LoadXml { xml } => {
            let mut session = Session::load_or_default(&args.state);
            let outcome = workflow::load_project(&mut session, &xml)?;
            session.save(&args.state)?;
            print_outcome(&outcome);
        }
        Command::CreateLibrary {
            output,
            attach,
            library,
        } => {
            let session = Session::load_or_default(&args.state);
            let outcome = workflow::create_library(
                &session,
                output.as_deref(),
                attach.as_deref(),
                &library.settings(),
            )?;
            print_outcome(&outcome);
        }
        Command::Status => {
            let session = Session::load_or_default(&args.state);
            print!("{}", PanelRegistry::default().render_text(&session));
        }
        Command::Report { csv } => {
            let session = Session::load_or_default(&args.state);
            let rows = export_layer_csv(&session.elements, &csv)?;
            println!("Exported {rows} components to CSV: {}", csv.display());
        }
        Command::Inspect => {
            let session = Session::load_or_default(&args.state);
            run_inspector(session)?;
        }
        Command::Reset => {
            let outcome = workflow::reset(&args.state)?;
            print_outcome(&outcome);
        }
        Command::Convert {
            html,
            xml,
            output,
            attach,
            library,
        } => {
            let outcome = workflow::convert(
                &html,
                xml.as_deref(),
                &output,
                attach.as_deref(),
                &library.settings(),
            )?;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_inspector(session: Session) -> Result<()> {
    let terminal = ratatui::init();
    let result = App::new(session).run(terminal);
    ratatui::restore();
    result
}

fn print_outcome(outcome: &StepOutcome) {
    for message in &outcome.messages {
        match message.severity {
            Severity::Info => println!("{}", message.text),
            Severity::Warning => println!("⚠ {}", message.text),
        }
    }

    let has_counts = outcome.elements > 0 || outcome.library.is_some();
    if has_counts {
        println!("  Elements:              {}", outcome.elements);
        println!("  Components:            {}", outcome.components);
        println!("  Layers with thickness: {}", outcome.matched_layers);
        println!("  XML elements:          {}", outcome.xml_elements);
        println!("  XML layers:            {}", outcome.xml_layers);
    }
    if let Some(attach) = &outcome.attach {
        println!(
            "  Attached {} element types ({} already present)",
            attach.element_types, attach.skipped_types
        );
    }
    if let Some(library) = &outcome.library {
        println!("  Library: {}", library.path.display());
    }
}
