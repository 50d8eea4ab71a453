use crate::aggregate::{StatsReport, TypeCounts, VisibilityCount, WorkspaceSummary};
use crate::error::Result;
use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::{Deserialize, Serialize};

pub const TOTAL_LABEL: &str = "TTL";
pub const TYPE_HEADER: [&str; 5] = ["Type", "Version", "Public", "Private", "Total"];
pub const WORKSPACE_HEADER: [&str; 3] = ["Workspace", "Visibility", "Objects"];

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Tab-separated rows
    #[default]
    Tsv,
    /// Bordered table for terminals
    Table,
    /// The full report as JSON
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Append the per-workspace table.
    pub show_workspaces: bool,
}

pub fn render_report(report: &StatsReport, options: &RenderOptions) -> Result<String> {
    match options.format {
        OutputFormat::Tsv => Ok(render_tsv(report, options.show_workspaces)),
        OutputFormat::Table => Ok(render_table(report, options.show_workspaces)),
        OutputFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &StatsReport) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

pub fn render_tsv(report: &StatsReport, show_workspaces: bool) -> String {
    let mut out = String::new();
    push_tsv_line(&mut out, TYPE_HEADER.iter().map(|s| s.to_string()));
    for row in type_rows(&report.types) {
        push_tsv_line(&mut out, row.into_iter());
    }

    if show_workspaces {
        out.push('\n');
        push_tsv_line(&mut out, WORKSPACE_HEADER.iter().map(|s| s.to_string()));
        for row in workspace_rows(&report.workspaces) {
            push_tsv_line(&mut out, row.into_iter());
        }
    }
    out
}

pub fn render_table(report: &StatsReport, show_workspaces: bool) -> String {
    let mut types = table_base();
    types.set_header(TYPE_HEADER.to_vec());
    for row in type_rows(&report.types) {
        types.add_row(
            row.into_iter()
                .enumerate()
                .map(|(idx, text)| count_cell(idx >= 2, text)),
        );
    }

    let mut out = types.to_string();
    out.push('\n');

    if show_workspaces {
        let mut workspaces = table_base();
        workspaces.set_header(WORKSPACE_HEADER.to_vec());
        for row in workspace_rows(&report.workspaces) {
            workspaces.add_row(
                row.into_iter()
                    .enumerate()
                    .map(|(idx, text)| count_cell(idx != 1, text)),
            );
        }
        out.push('\n');
        out.push_str(&workspaces.to_string());
        out.push('\n');
    }
    out
}

/// Version rows, a subtotal row per type, then the grand total.
fn type_rows(types: &TypeCounts) -> Vec<[String; 5]> {
    let mut rows = Vec::new();
    for (name, versions) in types.iter() {
        for (version, count) in versions {
            rows.push(count_row(name, version.as_str(), count));
        }
        rows.push(count_row(name, TOTAL_LABEL, &types.type_total(name)));
    }
    rows.push(count_row(TOTAL_LABEL, "-", &types.grand_total()));
    rows
}

fn count_row(name: &str, version: &str, count: &VisibilityCount) -> [String; 5] {
    [
        sanitize_cell_text(name),
        sanitize_cell_text(version),
        count.public.to_string(),
        count.private.to_string(),
        count.total().to_string(),
    ]
}

fn workspace_rows(workspaces: &[WorkspaceSummary]) -> Vec<[String; 3]> {
    workspaces
        .iter()
        .map(|ws| {
            [
                ws.ws_id.to_string(),
                ws.visibility.to_string(),
                ws.num_obj.to_string(),
            ]
        })
        .collect()
}

fn push_tsv_line(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.collect();
    out.push_str(&line.join("\t"));
    out.push('\n');
}

fn table_base() -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn count_cell(numeric: bool, text: String) -> Cell {
    let cell = Cell::new(text);
    if numeric {
        cell.set_alignment(CellAlignment::Right)
    } else {
        cell
    }
}

// Type names come from stored documents; keep them from breaking the columns.
fn sanitize_cell_text(raw: &str) -> String {
    raw.chars()
        .map(|ch| match ch {
            '\t' | '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}
