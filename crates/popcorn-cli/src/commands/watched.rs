use super::{format_average, open_watched_store};
use crate::output::{Output, OutputFormat};
use crate::WatchedCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use popcorn_config::PathManager;
use popcorn_models::{WatchedEntry, WatchedSummary};
use serde_json::json;

pub fn run_watched(cmd: Option<WatchedCommands>, json: bool, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        Some(WatchedCommands::Remove { id }) => remove_entry(&id, paths, output),
        None => list_entries(json, paths, output),
    }
}

fn list_entries(json: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let store = open_watched_store(paths, output)?;
    let summary = store.summary();

    if json || output.format() != OutputFormat::Human {
        let data = json!({
            "entries": store.entries(),
            "summary": summary,
        });
        if json && output.format() == OutputFormat::Human {
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            output.json(&data);
        }
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    if store.is_empty() {
        println!("{}", "Nothing watched yet. Rate a movie in `popcorn interactive` to add it.".bright_black());
        return Ok(());
    }

    println!("{}", entries_table(store.entries()));
    println!();
    println!("{}", summary_line(&summary));
    Ok(())
}

fn remove_entry(id: &str, paths: &PathManager, output: &Output) -> Result<()> {
    let mut store = open_watched_store(paths, output)?;
    let removed = store
        .remove(id)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to update watched list: {}", e))?;

    if removed {
        output.success(format!("Removed {} from the watched list", id));
    } else {
        output.warn(format!("{} is not in the watched list", id));
    }
    Ok(())
}

pub(crate) fn entries_table(entries: &[WatchedEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("IMDb").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Yours").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Runtime").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(&entry.title),
            Cell::new(&entry.year),
            Cell::new(entry.imdb_rating.map(format_average).unwrap_or_else(|| "-".to_string())),
            Cell::new(entry.user_rating),
            Cell::new(
                entry
                    .runtime_minutes
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

pub(crate) fn summary_line(summary: &WatchedSummary) -> String {
    format!(
        "#️⃣ {} movies  ⭐️ {}  🌟 {}  ⏳ {} min",
        summary.count,
        format_average(summary.average_imdb_rating),
        format_average(summary.average_user_rating),
        format_average(summary.average_runtime_minutes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_for_empty_list() {
        let line = summary_line(&WatchedSummary::default());
        assert!(line.contains("0 movies"));
        assert!(line.contains("0.0 min"));
    }
}
