// Integration tests for the `ugrid` binary against a folder of real .xlsx files.
// Run with: cargo test -p unigrid-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::Workbook;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let rows: [[&str; 4]; 3] = [
            ["Email", "Whatsapp", "Rest.", "Nombre"],
            ["ana@x.com", "", "12", "Ana"],
            ["luis@x.com", "0991 234", "40", "Luis"],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) if r > 0 && c == 2 => sheet.write_number(r as u32, c as u16, n).unwrap(),
                    _ => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        workbook.save(dir.path().join("clientes.xlsx")).unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Email").unwrap();
        sheet.write_string(0, 1, "Whatsapp").unwrap();
        sheet.write_string(1, 0, "ANA@x.com").unwrap();
        sheet.write_string(1, 1, "+593 99 111").unwrap();
        workbook.save(dir.path().join("leads.xlsx")).unwrap();

        // Small page size allowed so paging shows up with three rows
        std::fs::write(
            dir.path().join("settings.json"),
            "{\n    // test settings\n    \"view.pageSizes\": [2, 25, 100]\n}\n",
        )
        .unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let settings: PathBuf = self.path().join("settings.json");
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ugrid"));
        cmd.current_dir(self.path())
            .env_remove("UNIGRID_CONTACTS_KEY")
            .arg("--settings")
            .arg(&settings);
        cmd
    }

    /// Table commands, always without the contact directory.
    fn ugrid(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .arg("--no-contacts")
            .output()
            .expect("run ugrid")
    }

    fn folder(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}

fn json(output: &Output) -> serde_json::Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

// ---------------------------------------------------------------------------
// load / headers
// ---------------------------------------------------------------------------

#[test]
fn load_reports_backfill() {
    let fx = Fixture::new();
    let report = json(&fx.ugrid(&["load", &fx.folder(), "--json"]));
    assert_eq!(report["files_processed"], 2);
    assert_eq!(report["rows"], 3);
    assert_eq!(report["correlation"]["backfilled"], 1);
    assert!(report["correlation"]["provider_error"].is_null());
}

#[test]
fn load_text_status_line() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["load", &fx.folder()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Combined 2 files and 3 rows."));
}

#[test]
fn headers_in_display_order() {
    let fx = Fixture::new();
    let headers = json(&fx.ugrid(&["headers", &fx.folder(), "--json"]));
    assert_eq!(headers, serde_json::json!(["Source", "Email", "Whatsapp", "Rest.", "Nombre"]));
}

#[test]
fn headers_find_prefix() {
    let fx = Fixture::new();
    let found = json(&fx.ugrid(&["headers", &fx.folder(), "--find", "  REST", "--json"]));
    assert_eq!(found, serde_json::json!({ "index": 3, "header": "Rest." }));

    let output = fx.ugrid(&["headers", &fx.folder(), "--find", "whats"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2\tWhatsapp\n");
}

#[test]
fn headers_find_no_match() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["headers", &fx.folder(), "--find", "univers"]);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// view
// ---------------------------------------------------------------------------

#[test]
fn view_search_and_sort() {
    let fx = Fixture::new();
    let page = json(&fx.ugrid(&[
        "view", &fx.folder(), "--search", "ana", "--sort", "Source", "--desc", "--format", "json",
    ]));
    assert_eq!(page["page"]["filteredRows"], 2);
    assert_eq!(page["page"]["totalRows"], 3);
    assert_eq!(page["rows"][0]["Source"], "leads");
    assert_eq!(page["rows"][1]["Source"], "clientes");
    // Filled in from the leads file
    assert_eq!(page["rows"][1]["Whatsapp"], "59399111");
}

#[test]
fn view_rest_bucket_filter_tsv() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["view", &fx.folder(), "--filter", "Rest.=verde", "--format", "tsv"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "clientes\tluis@x.com\t0991234\t40\tLuis");
}

#[test]
fn view_pages() {
    let fx = Fixture::new();
    let page = json(&fx.ugrid(&[
        "view", &fx.folder(), "--page-size", "2", "--page", "9", "--format", "json",
    ]));
    assert_eq!(page["page"]["page"], 2);
    assert_eq!(page["page"]["totalPages"], 2);
    assert_eq!(page["page"]["rowsOnPage"], 1);
    assert_eq!(page["page"]["hasNext"], false);
}

#[test]
fn page_size_outside_choices() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["view", &fx.folder(), "--page-size", "7"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported page size: 7"));
    assert!(stderr.contains("2, 25, 100"));
}

#[test]
fn unknown_column_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["view", &fx.folder(), "--filter", "Ciudad=Quito"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown column: Ciudad"));
}

#[test]
fn missing_folder_exit_code() {
    let fx = Fixture::new();
    let missing = fx.path().join("nope");
    let output = fx.ugrid(&["load", &missing.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn folder_without_spreadsheets_exit_code() {
    let fx = Fixture::new();
    let empty = fx.path().join("vacio");
    std::fs::create_dir(&empty).unwrap();
    std::fs::write(empty.join("notas.txt"), "x").unwrap();
    let output = fx.ugrid(&["headers", &empty.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_filtered_csv() {
    let fx = Fixture::new();
    let out = fx.path().join("salida.csv");
    let out_arg = out.to_string_lossy();
    let output = fx.ugrid(&["export", &fx.folder(), "--search", "luis", "--output", &out_arg]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec!["Source,Email,Whatsapp,Rest.,Nombre", "clientes,luis@x.com,0991234,40,Luis"]
    );
}

#[test]
fn export_default_name() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["export", &fx.folder()]);
    assert!(output.status.success());
    assert!(fx.path().join("tabla_combinada_filtrada.xlsx").exists());
}

#[test]
fn export_nothing_matching() {
    let fx = Fixture::new();
    let out = fx.path().join("vacio.xlsx");
    let out_arg = out.to_string_lossy();
    let output = fx.ugrid(&["export", &fx.folder(), "--search", "nadie", "--output", &out_arg]);
    assert_eq!(output.status.code(), Some(10));
    assert!(!out.exists());
}

#[test]
fn export_bad_extension() {
    let fx = Fixture::new();
    let output = fx.ugrid(&["export", &fx.folder(), "--output", "tabla.ods"]);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// contacts
// ---------------------------------------------------------------------------

#[test]
fn contacts_status_unconfigured() {
    let fx = Fixture::new();
    let output = fx.command().args(["contacts", "status", "--json"]).output().unwrap();
    let status = json(&output);
    assert_eq!(status["enabled"], true);
    assert!(status["url"].is_null());
    assert_eq!(status["tables"], serde_json::json!(["contacts", "activities"]));
    assert_eq!(status["configured"], false);
}

#[test]
fn contacts_test_without_url() {
    let fx = Fixture::new();
    let output = fx.command().args(["contacts", "status", "--test"]).output().unwrap();
    assert_eq!(output.status.code(), Some(20));
}
