pub mod app;
pub mod dashboard;
pub mod panel;

pub use app::App;
pub use panel::{PanelContributor, PanelRegistry, WorkflowStatusPanel};
