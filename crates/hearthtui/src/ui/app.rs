use std::sync::Arc;

use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use strum::IntoEnumIterator;

use super::view::Tab;
use super::view::TableView;
use crate::hub::HubInfo;
use crate::sync::Notice;
use crate::sync::Snapshot;

pub const TITLE: &str = "hearthtui - Home Assistant TUI";

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    Toggle(String),
}

/// UI state: one view per tab plus whatever the status bar needs
pub struct App {
    pub server: String,
    pub views: Vec<TableView>,
    pub active: usize,
    pub loaded: bool,
    pub info: Option<Arc<HubInfo>>,
    pub notice: Option<Notice>,
    snapshot: Option<Arc<Snapshot>>,
}

impl App {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            views: Tab::iter().map(TableView::new).collect(),
            active: 0,
            loaded: false,
            info: None,
            notice: None,
            snapshot: None,
        }
    }

    pub fn active_view(&self) -> &TableView {
        &self.views[self.active]
    }

    fn active_view_mut(&mut self) -> &mut TableView {
        &mut self.views[self.active]
    }

    /// Pick up the latest snapshot; views are rebuilt only when it changed
    pub fn observe(&mut self, snapshot: Arc<Snapshot>, loaded: bool, info: Option<Arc<HubInfo>>) {
        self.loaded = loaded;
        self.info = info;

        if self
            .snapshot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &snapshot))
        {
            return;
        }

        for view in &mut self.views {
            view.update(&snapshot);
        }
        self.snapshot = Some(snapshot);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// " <location> | <server> | HA <version>", plus the temperature unit
    /// when the hub reports one
    pub fn status_line(&self) -> String {
        let Some(info) = &self.info else {
            return format!(" {}", self.server);
        };

        let mut line = format!(
            " {} | {} | HA {}",
            info.location_name, self.server, info.version
        );
        if let Some(unit) = info.temperature_unit() {
            line.push_str(" | ");
            line.push_str(unit);
        }
        line
    }

    pub fn select_tab(&mut self, index: usize) {
        if index < self.views.len() {
            self.active = index;
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            _ => Action::None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => {
                // Replaced by the running cycle's own notice
                self.push_notice(Notice::info("Refresh requested"));
                Action::Refresh
            }
            KeyCode::Char('t') | KeyCode::Enter => match self.active_view().selected_entity_id() {
                Some(entity_id) => Action::Toggle(entity_id.to_string()),
                None => Action::None,
            },
            KeyCode::Char(c @ '1'..='5') => {
                self.select_tab(c as usize - '1' as usize);
                Action::None
            }
            KeyCode::Tab => {
                self.active = (self.active + 1) % self.views.len();
                Action::None
            }
            KeyCode::BackTab => {
                self.active = (self.active + self.views.len() - 1) % self.views.len();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.active_view_mut().move_selection(1);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.active_view_mut().move_selection(-1);
                Action::None
            }
            KeyCode::PageDown => {
                self.active_view_mut().move_selection(10);
                Action::None
            }
            KeyCode::PageUp => {
                self.active_view_mut().move_selection(-10);
                Action::None
            }
            _ => Action::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serde_json::Map;

    use super::*;
    use crate::hub::Entity;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot() -> Arc<Snapshot> {
        Arc::new(Snapshot::from_entities(vec![
            Entity::from_api(&json!({ "entity_id": "light.kitchen", "state": "on" })),
            Entity::from_api(&json!({ "entity_id": "light.porch", "state": "off" })),
            Entity::from_api(&json!({ "entity_id": "sensor.x", "state": "3" })),
        ]))
    }

    fn loaded_app() -> App {
        let mut app = App::new("http://localhost:8123");
        app.observe(snapshot(), true, None);
        app
    }

    #[test]
    fn test_new_has_a_view_per_tab() {
        let app = App::new("http://localhost:8123");
        let tabs: Vec<Tab> = app.views.iter().map(|v| v.tab).collect();
        assert_eq!(
            tabs,
            vec![Tab::Lights, Tab::Switches, Tab::Sensors, Tab::Climate, Tab::All]
        );
        assert_eq!(app.active_view().tab, Tab::Lights);
    }

    #[test]
    fn test_quit_and_refresh_keys() {
        let mut app = loaded_app();
        assert_eq!(app.handle_key(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(app.handle_key(press(KeyCode::Char('r'))), Action::Refresh);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_refresh_key_announces_request() {
        let mut app = loaded_app();
        assert!(app.notice.is_none());
        assert_eq!(app.handle_key(press(KeyCode::Char('r'))), Action::Refresh);
        assert_eq!(app.notice, Some(Notice::info("Refresh requested")));

        app.push_notice(Notice::info("Refreshed"));
        assert_eq!(app.notice, Some(Notice::info("Refreshed")));
    }

    #[test]
    fn test_toggle_uses_selected_row_of_active_tab() {
        let mut app = loaded_app();
        assert_eq!(
            app.handle_key(press(KeyCode::Char('t'))),
            Action::Toggle("light.kitchen".to_string())
        );

        app.handle_key(press(KeyCode::Down));
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            Action::Toggle("light.porch".to_string())
        );

        app.handle_key(press(KeyCode::Char('3')));
        assert_eq!(app.active_view().tab, Tab::Sensors);
        assert_eq!(
            app.handle_key(press(KeyCode::Char('t'))),
            Action::Toggle("sensor.x".to_string())
        );
    }

    #[test]
    fn test_toggle_on_empty_tab_does_nothing() {
        let mut app = loaded_app();
        app.handle_key(press(KeyCode::Char('4')));
        assert_eq!(app.active_view().tab, Tab::Climate);
        assert_eq!(app.handle_key(press(KeyCode::Char('t'))), Action::None);
    }

    #[test]
    fn test_tab_cycling() {
        let mut app = loaded_app();
        app.handle_key(press(KeyCode::BackTab));
        assert_eq!(app.active_view().tab, Tab::All);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.active_view().tab, Tab::Lights);
        app.handle_key(press(KeyCode::Char('5')));
        assert_eq!(app.active_view().tab, Tab::All);
    }

    #[test]
    fn test_observe_skips_unchanged_snapshot() {
        let mut app = App::new("http://localhost:8123");
        let snapshot = snapshot();
        app.observe(Arc::clone(&snapshot), true, None);
        app.handle_key(press(KeyCode::Down));

        app.observe(snapshot, true, None);
        assert_eq!(app.active_view().selected_entity_id(), Some("light.porch"));
    }

    #[test]
    fn test_status_line() {
        let mut app = App::new("http://localhost:8123");
        assert_eq!(app.status_line(), " http://localhost:8123");

        let mut config = Map::new();
        config.insert("version".to_string(), json!("2026.1.0"));
        config.insert("location_name".to_string(), json!("Home"));
        app.observe(snapshot(), true, Some(Arc::new(HubInfo::from_config(config))));
        assert_eq!(
            app.status_line(),
            " Home | http://localhost:8123 | HA 2026.1.0"
        );

        let mut config = Map::new();
        config.insert("version".to_string(), json!("2026.1.0"));
        config.insert("location_name".to_string(), json!("Home"));
        config.insert("unit_system".to_string(), json!({ "temperature": "°F" }));
        app.observe(snapshot(), true, Some(Arc::new(HubInfo::from_config(config))));
        assert_eq!(
            app.status_line(),
            " Home | http://localhost:8123 | HA 2026.1.0 | °F"
        );
    }
}
