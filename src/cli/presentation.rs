//! CLI presentation: text and json formatters for a load summary.

use crate::client::SchemaKind;
use crate::error::LoadError;
use crate::loader::LoadSummary;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_summary_json(summary: &LoadSummary) -> Result<String, LoadError> {
    serde_json::to_string_pretty(summary)
        .map_err(|e| LoadError::Config(format!("Failed to render summary: {}", e)))
}

pub fn format_summary_text(summary: &LoadSummary, color: bool) -> String {
    let status = if summary.success { "succeeded" } else { "failed" };
    let status = match (color, summary.success) {
        (false, _) => status.to_string(),
        (true, true) => status.green().bold().to_string(),
        (true, false) => status.red().bold().to_string(),
    };
    let mut out = format!(
        "Schema load of graph '{}' {} in {} ms",
        summary.graph, status, summary.duration_ms
    );
    if summary.dry_run {
        out.push_str(" (dry run)");
    }
    if summary.cleared {
        out.push_str("\nGraph data was cleared before loading");
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Schema", "Total", "Created", "Skipped"]);
    let script = summary.script.as_ref();
    let rows = [
        ("property keys", summary.counts.property_keys, SchemaKind::PropertyKey),
        ("vertex labels", summary.counts.vertex_labels, SchemaKind::VertexLabel),
        ("edge labels", summary.counts.edge_labels, SchemaKind::EdgeLabel),
        ("index labels", summary.counts.index_labels, SchemaKind::IndexLabel),
    ];
    for (label, total, kind) in rows {
        let created = script
            .map(|r| r.created.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0);
        let skipped = script
            .map(|r| r.skipped.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0);
        table.add_row(vec![
            label.to_string(),
            total.to_string(),
            created.to_string(),
            skipped.to_string(),
        ]);
    }
    out.push('\n');
    out.push_str(&table.to_string());

    if let Some(error) = &summary.error {
        out.push_str(&format!("\nError: {}", error));
    }
    out
}
