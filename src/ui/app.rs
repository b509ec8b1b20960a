use crate::export::library::displayed_thickness_m;
use crate::model::{BuildingElement, Component};
use crate::session::Session;
use crate::ui::panel::{PanelRegistry, WorkflowStatusPanel};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Dashboard,
    ComponentDetail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPanel {
    Elements,
    Components,
}

pub struct App {
    pub session: Session,
    pub panels: PanelRegistry,
    pub view: View,
    pub focus_panel: FocusPanel,
    pub selected_element: usize,
    pub selected_component: usize,
    pub process_scroll_offset: usize,
    pub should_quit: bool,
}

impl App {
    /// Starts on the element list with only the workflow status panel.
    #[must_use]
    pub fn new(session: Session) -> Self {
        let mut panels = PanelRegistry::empty();
        panels.register(WorkflowStatusPanel);
        Self {
            session,
            panels,
            view: View::Dashboard,
            focus_panel: FocusPanel::Elements,
            selected_element: 0,
            selected_component: 0,
            process_scroll_offset: 0,
            should_quit: false,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match self.view {
            View::Dashboard => super::dashboard::draw_dashboard(frame, self),
            View::ComponentDetail => super::dashboard::draw_component_detail(frame, self),
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }
            self.handle_key(key.code);
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match self.view {
            View::Dashboard => self.handle_dashboard_keys(code),
            View::ComponentDetail => self.handle_detail_keys(code),
        }
    }

    fn handle_dashboard_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => self.navigate_down(),
            KeyCode::Left | KeyCode::Char('h') => self.focus_panel = FocusPanel::Elements,
            KeyCode::Right | KeyCode::Char('l') => self.focus_panel = FocusPanel::Components,
            KeyCode::Enter => self.enter_component_detail(),
            _ => {}
        }
    }

    fn handle_detail_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.view = View::Dashboard;
                self.process_scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.process_scroll_offset = self.process_scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll_processes_down(),
            KeyCode::Left | KeyCode::Char('h') => self.previous_component_in_detail(),
            KeyCode::Right | KeyCode::Char('l') => self.next_component_in_detail(),
            _ => {}
        }
    }

    fn navigate_up(&mut self) {
        match self.focus_panel {
            FocusPanel::Elements => {
                if self.selected_element > 0 {
                    self.selected_element -= 1;
                    self.selected_component = 0;
                }
            }
            FocusPanel::Components => {
                self.selected_component = self.selected_component.saturating_sub(1);
            }
        }
    }

    fn navigate_down(&mut self) {
        match self.focus_panel {
            FocusPanel::Elements => {
                if self.selected_element < self.session.elements.len().saturating_sub(1) {
                    self.selected_element += 1;
                    self.selected_component = 0;
                }
            }
            FocusPanel::Components => {
                if self.selected_component < self.component_count().saturating_sub(1) {
                    self.selected_component += 1;
                }
            }
        }
    }

    fn enter_component_detail(&mut self) {
        if self.focus_panel == FocusPanel::Components && self.get_selected_component().is_some() {
            self.view = View::ComponentDetail;
            self.process_scroll_offset = 0;
        }
    }

    fn scroll_processes_down(&mut self) {
        let max = self
            .get_selected_component()
            .map_or(0, |c| c.lifecycle_processes.len().saturating_sub(1));
        if self.process_scroll_offset < max {
            self.process_scroll_offset += 1;
        }
    }

    /// Previous component of the element, wrapping around.
    fn previous_component_in_detail(&mut self) {
        let count = self.component_count();
        if count == 0 {
            return;
        }
        self.selected_component = if self.selected_component > 0 {
            self.selected_component - 1
        } else {
            count - 1
        };
        self.process_scroll_offset = 0;
    }

    /// Next component of the element, wrapping around.
    fn next_component_in_detail(&mut self) {
        let count = self.component_count();
        if count == 0 {
            return;
        }
        self.selected_component = (self.selected_component + 1) % count;
        self.process_scroll_offset = 0;
    }

    fn component_count(&self) -> usize {
        self.get_selected_element().map_or(0, |e| e.components.len())
    }

    #[must_use]
    pub fn get_selected_element(&self) -> Option<&BuildingElement> {
        self.session.elements.get(self.selected_element)
    }

    #[must_use]
    pub fn get_selected_component(&self) -> Option<&Component> {
        self.get_selected_element()
            .and_then(|e| e.components.get(self.selected_component))
    }

    #[must_use]
    pub fn source_name(&self) -> String {
        self.session
            .html_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map_or_else(|| "no report loaded".to_string(), |n| n.to_string_lossy().to_string())
    }
}

/// Thickness column text; a trailing `*` marks a value derived from the
/// quantity instead of the XML project.
#[must_use]
pub fn thickness_label(component: &Component) -> String {
    match component.layer_thickness {
        Some(t) => format!("{:.1} mm", t * 1000.0),
        None => format!("{:.1} mm*", displayed_thickness_m(component) * 1000.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn app() -> App {
        let mut wall = BuildingElement::new("330", "Wall A");
        wall.components = vec![
            Component::new("Beton", "200,00 mm"),
            Component::new("Putz", "1,5 cm"),
        ];
        let mut roof = BuildingElement::new("360", "Roof");
        roof.components = vec![Component::new("Ziegel", "")];
        App::new(Session {
            elements: vec![wall, roof],
            ..Session::default()
        })
    }

    #[test]
    fn element_change_resets_component() {
        let mut app = app();
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected_component, 1);

        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected_element, 1);
        assert_eq!(app.selected_component, 0);
        assert_eq!(app.get_selected_component().unwrap().name, "Ziegel");
    }

    #[test]
    fn detail_wraps_between_components() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::Dashboard);

        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::ComponentDetail);

        app.handle_key(KeyCode::Left);
        assert_eq!(app.selected_component, 1);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.selected_component, 0);

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.view, View::Dashboard);
        assert!(!app.should_quit);
    }

    #[test]
    fn thickness_label_marks_derived_values() {
        let mut matched = Component::new("Beton", "");
        matched.layer_thickness = Some(0.2);
        assert_eq!(thickness_label(&matched), "200.0 mm");
        assert_eq!(thickness_label(&Component::new("Putz", "1,5 cm")), "15.0 mm*");
        assert_eq!(thickness_label(&Component::new("Putz", "n/a")), "10.0 mm*");
    }
}
