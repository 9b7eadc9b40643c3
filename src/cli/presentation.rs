//! CLI presentation: text and json formatters per command.

use crate::archive::ArchiveManifest;
use crate::model::SiteReport;
use crate::op::Value;
use comfy_table::Table;
use serde_json::json;
use std::path::Path;

fn accuracy(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

fn short_checksum(checksum: &str) -> &str {
    checksum.get(..12).unwrap_or(checksum)
}

pub fn format_train_result_text(reports: &[SiteReport], out: &Path) -> String {
    if reports.is_empty() {
        return format!(
            "No choice sites found in the training traces.\nEmpty archive written to {}",
            out.display()
        );
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Site", "Kind", "Examples", "Epochs", "Train", "Validation"]);
    for report in reports {
        table.add_row(vec![
            report.sid.to_string(),
            report.kind.clone(),
            report.report.examples.to_string(),
            report.report.epochs_run.to_string(),
            accuracy(report.report.train_accuracy),
            accuracy(report.report.validation_accuracy),
        ]);
    }
    format!(
        "{}\n\nSaved {} site model(s) to {}",
        table,
        reports.len(),
        out.display()
    )
}

pub fn format_train_result_json(reports: &[SiteReport], out: &Path) -> String {
    let out = json!({
        "archive": out.display().to_string(),
        "sites": reports,
        "total": reports.len(),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_manifest_text(manifest: &ArchiveManifest) -> String {
    let mut output = format!(
        "Archive format: v{}\nCreated: {}\n",
        manifest.format_version, manifest.created_at
    );
    if manifest.sites.is_empty() {
        output.push_str("\nNo site models stored.");
        return output;
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Site", "Kind", "Group", "Tags", "Checksum"]);
    for entry in &manifest.sites {
        table.add_row(vec![
            entry.sid.to_string(),
            entry.kind.clone(),
            entry.op_info.group.clone().unwrap_or_else(|| "-".to_string()),
            entry.op_info.tags.join(","),
            short_checksum(&entry.checksum).to_string(),
        ]);
    }
    output.push_str(&format!("\n{}\n\nTotal: {} site(s)", table, manifest.sites.len()));
    output
}

pub fn format_manifest_json(manifest: &ArchiveManifest) -> String {
    serde_json::to_string_pretty(manifest).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_ranking_text(sid: &str, ranked: &[Value]) -> String {
    let mut output = format!("Ranking for {}:\n", sid);
    for (position, value) in ranked.iter().enumerate() {
        output.push_str(&format!("  {:>3}. {}\n", position + 1, value));
    }
    output
}

pub fn format_ranking_json(sid: &str, ranked: &[Value]) -> String {
    let out = json!({ "sid": sid, "ranked": ranked });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
