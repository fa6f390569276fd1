//! Conflict view that prints differing resources as a table.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use metaguard_core::conflict::{ConflictPanel, ConflictSnapshot, ConflictView};

use crate::style;

/// Keeps the last snapshot like [`ConflictPanel`] and renders it to stdout
/// whenever it is reset with differing resources.
#[derive(Default)]
pub struct TablePanel {
    inner: ConflictPanel,
}

impl TablePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<ConflictSnapshot> {
        self.inner.snapshot()
    }
}

impl ConflictView for TablePanel {
    fn reset(&self, principal: &str, differing: Vec<String>) {
        let count = differing.len();
        self.inner.reset(principal, differing);
        if count == 0 {
            return;
        }
        if let Some(snapshot) = self.inner.snapshot() {
            println!();
            println!(
                "{}",
                style::header(&format!("Conflicts with {} ({})", snapshot.principal, count))
            );
            println!("{}", render(&snapshot));
            println!();
        }
    }
}

/// One row per differing resource.
pub fn render(snapshot: &ConflictSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Resource", "Checked"]);

    let checked = snapshot.reset_at.format("%Y-%m-%d %H:%M:%S").to_string();
    for resource in &snapshot.differing {
        table.add_row(vec![Cell::new(resource), Cell::new(&checked)]);
    }
    table
}
