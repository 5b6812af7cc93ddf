//! Output formats for `ugrid view` and `ugrid load`.

use std::io::{self, Write};

use clap::ValueEnum;
use unigrid_engine::{LoadReport, Page, Row};

use crate::util::{column_widths, pad_right, single_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for the terminal
    #[default]
    Table,
    /// One JSON document with page info and rows
    Json,
    /// Tab-separated, header line first
    Tsv,
}

fn cells(row: &Row, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| single_line(&row.get(h).as_text()))
        .collect()
}

pub fn write_page(
    out: &mut impl Write,
    format: OutputFormat,
    headers: &[String],
    page: &Page<'_>,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_table(out, headers, page),
        OutputFormat::Tsv => write_tsv(out, headers, &page.rows),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &page_json(headers, page))?;
            writeln!(out)
        }
    }
}

fn write_table(out: &mut impl Write, headers: &[String], page: &Page<'_>) -> io::Result<()> {
    let lines: Vec<Vec<String>> = page.rows.iter().map(|r| cells(r, headers)).collect();
    let widths = column_widths(headers, lines.iter().cloned());

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| pad_right(h, w))
        .collect();
    writeln!(out, "{}", header_line.join("  ").trim_end())?;
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", rule.join("  "))?;

    for line in &lines {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(v, &w)| pad_right(v, w))
            .collect();
        writeln!(out, "{}", padded.join("  ").trim_end())?;
    }

    let report = &page.report;
    writeln!(out)?;
    writeln!(
        out,
        "Page {} of {} ({} shown, {} matching, {} total)",
        report.page,
        report.total_pages,
        report.rows_on_page,
        report.filtered_rows,
        report.total_rows
    )
}

fn write_tsv(out: &mut impl Write, headers: &[String], rows: &[&Row]) -> io::Result<()> {
    writeln!(out, "{}", headers.join("\t"))?;
    for row in rows {
        writeln!(out, "{}", cells(row, headers).join("\t"))?;
    }
    Ok(())
}

/// `{"page": {...}, "headers": [...], "rows": [{column: value}]}`; absent
/// values are `null`.
pub fn page_json(headers: &[String], page: &Page<'_>) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = page
        .rows
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = headers
                .iter()
                .map(|h| {
                    let value = serde_json::to_value(row.get(h)).unwrap_or(serde_json::Value::Null);
                    (h.clone(), value)
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::json!({
        "page": page.report,
        "headers": headers,
        "rows": rows,
    })
}

pub fn write_load_report(out: &mut impl Write, report: &LoadReport, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        return writeln!(out);
    }

    writeln!(out, "{}", report.status_text())?;
    writeln!(out, "  rows read:        {}", report.rows_merged)?;
    writeln!(out, "  reference rows:   {} (removed)", report.rows_excluded)?;
    writeln!(out, "  columns:          {}", report.headers)?;

    let c = &report.correlation;
    writeln!(
        out,
        "  known phones:     {} ({} from files, {} from directory)",
        c.map_size, c.local_entries, c.external_applied
    )?;
    writeln!(out, "  phones filled in: {}", c.backfilled)?;
    if let Some(err) = &c.provider_error {
        writeln!(out, "  contact lookup:   failed ({})", err)?;
    }

    if !report.files_skipped.is_empty() {
        writeln!(out, "  skipped files:")?;
        for file in &report.files_skipped {
            writeln!(out, "    {}: {}", file.name, file.reason)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigrid_engine::paginate::PageInfo;
    use unigrid_engine::{CellValue, PageReport};

    fn page<'a>(rows: Vec<&'a Row>) -> Page<'a> {
        let info = PageInfo::compute(rows.len(), 100, 1);
        Page {
            report: PageReport {
                rows_on_page: rows.len(),
                filtered_rows: rows.len(),
                total_rows: 5,
                page: 1,
                total_pages: 1,
                has_previous: false,
                has_next: false,
            },
            rows,
            info,
        }
    }

    fn row() -> Row {
        let mut row = Row::new();
        row.set("Email", CellValue::text("ana@x.com"));
        row.set("Rest.", CellValue::Number(12.0));
        row
    }

    #[test]
    fn json_keeps_header_order_and_nulls() {
        let headers = vec!["Rest.".to_string(), "Email".to_string(), "Ciudad".to_string()];
        let r = row();
        let value = page_json(&headers, &page(vec![&r]));
        let keys: Vec<&String> = value["rows"][0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Rest.", "Email", "Ciudad"]);
        assert_eq!(value["rows"][0]["Rest."], 12.0);
        assert!(value["rows"][0]["Ciudad"].is_null());
        assert_eq!(value["page"]["totalRows"], 5);
    }

    #[test]
    fn tsv_output() {
        let headers = vec!["Email".to_string(), "Rest.".to_string()];
        let r = row();
        let mut out = Vec::new();
        write_page(&mut out, OutputFormat::Tsv, &headers, &page(vec![&r])).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Email\tRest.\nana@x.com\t12\n");
    }

    #[test]
    fn table_has_footer() {
        let headers = vec!["Email".to_string()];
        let r = row();
        let mut out = Vec::new();
        write_page(&mut out, OutputFormat::Table, &headers, &page(vec![&r])).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Email\n---------\nana@x.com\n"));
        assert!(text.ends_with("Page 1 of 1 (1 shown, 1 matching, 5 total)\n"));
    }
}
