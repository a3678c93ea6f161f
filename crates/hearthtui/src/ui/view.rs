use std::sync::Arc;

use strum::Display;
use strum::EnumIter;
use tracing::debug;

use crate::hub::Entity;
use crate::sync::Snapshot;

/// Longest friendly name shown before truncation
const NAME_WIDTH: usize = 40;

/// Column headers shared by the UI table and the plain-text listing
pub const COLUMNS: [&str; 4] = ["Entity", "Name", "State", "Last Changed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Tab {
    Lights,
    Switches,
    Sensors,
    Climate,
    All,
}

impl Tab {
    /// Domain shown on this tab, `None` for every domain
    pub fn domain(self) -> Option<&'static str> {
        match self {
            Tab::Lights => Some("light"),
            Tab::Switches => Some("switch"),
            Tab::Sensors => Some("sensor"),
            Tab::Climate => Some("climate"),
            Tab::All => None,
        }
    }
}

/// Display form of an entity's state; on/off domains are shouted
pub fn display_state(entity: &Entity) -> String {
    match (entity.domain(), entity.state.as_str()) {
        ("light" | "switch" | "fan", "on") => "ON".to_string(),
        ("light" | "switch" | "fan", "off") => "OFF".to_string(),
        (_, state) => state.to_string(),
    }
}

/// `2026-01-17T12:00:00.123+00:00` -> `2026-01-17 12:00:00`
pub fn display_last_changed(last_changed: &str) -> String {
    last_changed
        .chars()
        .take(19)
        .collect::<String>()
        .replace('T', " ")
}

pub fn display_name(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

/// One table row, already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub last_changed: String,
}

impl RowData {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            entity_id: entity.entity_id().to_string(),
            name: display_name(&entity.friendly_name),
            state: display_state(entity),
            last_changed: display_last_changed(&entity.last_changed),
        }
    }

    pub fn cells(&self) -> [&str; 4] {
        [&self.entity_id, &self.name, &self.state, &self.last_changed]
    }
}

/// Rows for one domain (or all), in display order
pub fn rows(snapshot: &Snapshot, domain: Option<&str>) -> Vec<RowData> {
    snapshot
        .sorted(domain)
        .into_iter()
        .map(RowData::from_entity)
        .collect()
}

/// The rows and cursor of one tab
#[derive(Debug, Clone)]
pub struct TableView {
    pub tab: Tab,
    pub rows: Vec<RowData>,
    pub selected: Option<usize>,
}

impl TableView {
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            rows: Vec::new(),
            selected: None,
        }
    }

    /// Rebuild rows from `snapshot`, keeping the cursor on the same entity
    /// when it still exists.
    pub fn update(&mut self, snapshot: &Arc<Snapshot>) {
        let previous = self.selected_entity_id().map(str::to_string);
        self.rows = rows(snapshot, self.tab.domain());

        self.selected = match previous {
            _ if self.rows.is_empty() => None,
            None => Some(0),
            Some(id) => match self.rows.iter().position(|r| r.entity_id == id) {
                Some(index) => Some(index),
                None => {
                    let clamped = self.selected.unwrap_or(0).min(self.rows.len() - 1);
                    debug!(
                        "{} view: {} is gone, moving cursor to row {}",
                        self.tab, id, clamped
                    );
                    Some(clamped)
                }
            },
        };
    }

    pub fn selected_entity_id(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.rows.get(i))
            .map(|r| r.entity_id.as_str())
    }

    /// Move the cursor by `delta` rows, stopping at either end
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = None;
            return;
        }
        let last = self.rows.len() - 1;
        let current = self.selected.unwrap_or(0);
        self.selected = Some(current.saturating_add_signed(delta).min(last));
    }
}

/// Plain-text table for non-interactive output
pub fn render_plain(rows: &[RowData]) -> String {
    let mut widths = COLUMNS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = COLUMNS.map(str::to_uppercase);
    let lines = std::iter::once(header.each_ref().map(String::as_str))
        .chain(rows.iter().map(RowData::cells))
        .map(|cells| {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        });

    let mut out = lines.collect::<Vec<_>>().join("\n");
    out.push('\n');
    out
}
