//! `chatloom modes`: list the registered chat modes.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatloom_types::chat::ChatMode;

use crate::state::AppState;

pub fn list_modes(state: &AppState, json: bool) -> Result<()> {
    let modes = state.sessions.modes();

    if json {
        let out: Vec<_> = modes
            .iter()
            .map(|m| serde_json::json!({ "tag": m.tag(), "label": m.label() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Mode").fg(Color::White),
        Cell::new("Label").fg(Color::White),
    ]);

    for mode in modes {
        let tag = if *mode == ChatMode::default() {
            format!("{} (default)", mode.tag())
        } else {
            mode.tag().to_string()
        };
        table.add_row(vec![
            Cell::new(tag).fg(Color::Cyan),
            Cell::new(mode.label()).fg(Color::White),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} Modes are fixed per thread once it starts.",
        style("i").blue().bold()
    );
    println!();

    Ok(())
}
