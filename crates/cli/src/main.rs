// UniGrid CLI - merge a folder of spreadsheet exports into one table,
// then list, filter, sort, page and export it headlessly.

mod exit_codes;
mod render;
mod util;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use unigrid_config::Settings;
use unigrid_config::secrets::{delete_contacts_key, get_contacts_key, set_contacts_key};
use unigrid_contacts::{ContactsClient, ContactsError};
use unigrid_engine::columns::position_by_prefix;
use unigrid_engine::{ContactProvider, LoadError, NoContacts, Session};
use unigrid_io::export::{export, ExportError, ExportFormat};
use unigrid_io::source::FolderSource;

use exit_codes::{
    export_exit_code, load_exit_code, EXIT_CONTACTS_FETCH, EXIT_CONTACTS_KEYCHAIN,
    EXIT_CONTACTS_NOT_CONFIGURED, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};
use render::OutputFormat;

#[derive(Parser)]
#[command(name = "ugrid")]
#[command(about = "Merge spreadsheet exports into one searchable table")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More logging (debug level unless RUST_LOG says otherwise)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true, value_name = "PATH", env = "UNIGRID_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the folder and print the load report
    #[command(after_help = "\
Examples:
  ugrid load
  ugrid load ~/exports --no-contacts
  ugrid load ~/exports --json")]
    Load {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the merged column order
    #[command(after_help = "\
Examples:
  ugrid headers
  ugrid headers --find univers")]
    Headers {
        #[command(flatten)]
        source: SourceArgs,

        /// Print only the position of the first column whose name starts
        /// with PREFIX (case-insensitive)
        #[arg(long, value_name = "PREFIX")]
        find: Option<String>,

        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print one page of the filtered, sorted table
    #[command(after_help = "\
Examples:
  ugrid view --search 0991234
  ugrid view --filter Rest.=verde --sort Start --desc
  ugrid view --filter Pendientes_= --page 2 --page-size 50 --format tsv")]
    View {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Page number (1-based, clamped to the last page)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page, one of view.pageSizes (default view.pageSize)
        #[arg(long)]
        page_size: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Write every filtered row to CSV or Excel
    #[command(after_help = "\
Examples:
  ugrid export --output clientes.xlsx
  ugrid export --search @gmail.com --output gmail.csv")]
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Output file; .csv or .xlsx picks the format
        /// (default: tabla_combinada_filtrada.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Contact directory key and connectivity
    Contacts {
        #[command(subcommand)]
        command: ContactsCommands,
    },
}

#[derive(Subcommand)]
enum ContactsCommands {
    /// Show the contact directory configuration and where the key comes from
    #[command(after_help = "\
Examples:
  ugrid contacts status
  ugrid contacts status --test --json")]
    Status {
        /// Fetch the contact list and report how many records came back
        #[arg(long)]
        test: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store the API key in the system keychain (read from stdin)
    SetKey,

    /// Remove the API key from the system keychain
    DeleteKey,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Folder with the exports (default: source.folder from settings)
    folder: Option<PathBuf>,

    /// Skip the external contact directory
    #[arg(long)]
    no_contacts: bool,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    /// Column filter; repeatable. An empty value clears a default filter.
    #[arg(long = "filter", value_name = "COL=VALUE")]
    filters: Vec<String>,

    /// Search every column (column filters given with --filter still apply)
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Sort by this column
    #[arg(long, value_name = "COL")]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  unigrid-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match &cli.settings {
        Some(path) if path.exists() => Settings::load_from(path),
        Some(path) => {
            log::debug!("{} not found, using default settings", path.display());
            Settings::default()
        }
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Load { source, json } => cmd_load(&settings, &source, json),
        Commands::Headers { source, find, json } => {
            cmd_headers(&settings, &source, find.as_deref(), json)
        }
        Commands::View {
            source,
            query,
            page,
            page_size,
            format,
        } => cmd_view(&settings, &source, &query, page, page_size, format),
        Commands::Export {
            source,
            query,
            output,
        } => cmd_export(&settings, &source, &query, output),
        Commands::Contacts { command } => match command {
            ContactsCommands::Status { test, json } => cmd_contacts_status(&settings, test, json),
            ContactsCommands::SetKey => cmd_contacts_set_key(),
            ContactsCommands::DeleteKey => cmd_contacts_delete_key(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a load failure with the proper exit code.
    pub fn load(err: LoadError, folder: &std::path::Path) -> Self {
        let code = load_exit_code(&err);
        let hint = match &err {
            LoadError::NoData => Some(
                "every spreadsheet was empty or could not be read; run with -v for details"
                    .to_string(),
            ),
            LoadError::Source(_) => Some(format!(
                "pass a folder argument or set \"source.folder\" in {}",
                Settings::config_path_display()
            )),
        };
        Self {
            code,
            message: format!("{} ({})", err, folder.display()),
            hint,
        }
    }

    pub fn contacts(err: ContactsError) -> Self {
        let (code, hint) = match &err {
            ContactsError::NotConfigured(_) => (
                EXIT_CONTACTS_NOT_CONFIGURED,
                Some(format!(
                    "set \"contacts.url\" in {} and run `ugrid contacts set-key`",
                    Settings::config_path_display()
                )),
            ),
            _ => (EXIT_CONTACTS_FETCH, None),
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn export(err: ExportError) -> Self {
        let code = export_exit_code(&err);
        let hint = match &err {
            ExportError::NoRows => Some("loosen the filters; nothing matched".to_string()),
            ExportError::UnsupportedFormat(_) => Some("use a .csv or .xlsx file name".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Loading
// ============================================================================

fn contacts_provider(settings: &Settings, disabled: bool) -> Arc<dyn ContactProvider> {
    if disabled || !settings.contacts_enabled {
        log::debug!("contact lookup disabled");
        return Arc::new(NoContacts);
    }
    if !settings.contacts_configured() {
        log::debug!("contact lookup skipped: contacts.url is not set");
        return Arc::new(NoContacts);
    }
    match ContactsClient::from_settings(settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::warn!("{}", e);
            Arc::new(NoContacts)
        }
    }
}

fn load_session(settings: &Settings, args: &SourceArgs) -> Result<Session, CliError> {
    let folder = args
        .folder
        .clone()
        .unwrap_or_else(|| settings.effective_source_folder());
    let source =
        FolderSource::new(&folder).with_subfolders(settings.source_subfolders.iter().cloned());

    let mut session = Session::new(settings.page_size)
        .with_input_window(Duration::from_millis(settings.debounce_ms));
    session
        .load(&source, contacts_provider(settings, args.no_contacts))
        .map_err(|e| CliError::load(e, &folder))?;
    Ok(session)
}

fn column_exists(session: &Session, column: &str) -> Result<(), CliError> {
    if session.headers().iter().any(|h| h == column) {
        return Ok(());
    }
    Err(CliError::args(format!("unknown column: {}", column))
        .with_hint("run `ugrid headers` to list the columns"))
}

/// Apply the query flags in the order the table UI would see them: search,
/// then column filters, then sort.
fn apply_query(session: &mut Session, query: &QueryArgs) -> Result<(), CliError> {
    if let Some(search) = &query.search {
        // Typed then Enter: no need to wait out the input window
        session.type_search(search, Instant::now());
        session.flush_input();
    }

    for filter in &query.filters {
        let (column, value) = filter.split_once('=').ok_or_else(|| {
            CliError::args(format!("invalid filter: {}", filter))
                .with_hint("use --filter COLUMN=VALUE")
        })?;
        let column = column.trim();
        column_exists(session, column)?;
        session.update(|v| v.with_column_filter(column, value));
    }

    if let Some(column) = &query.sort {
        column_exists(session, column)?;
        session.update(|v| v.with_sort_toggled(column));
        if query.desc {
            session.update(|v| v.with_sort_toggled(column));
        }
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_load(settings: &Settings, source: &SourceArgs, json: bool) -> Result<(), CliError> {
    let session = load_session(settings, source)?;
    let Some(report) = session.report() else {
        return Err(CliError::io("load finished without a report"));
    };
    let mut out = io::stdout().lock();
    render::write_load_report(&mut out, report, json).map_err(|e| CliError::io(e.to_string()))
}

fn cmd_headers(
    settings: &Settings,
    source: &SourceArgs,
    find: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let session = load_session(settings, source)?;
    let mut out = io::stdout().lock();

    if let Some(prefix) = find {
        let Some(index) = position_by_prefix(session.headers(), prefix) else {
            return Err(CliError::args(format!("no column starts with: {}", prefix))
                .with_hint("run `ugrid headers` to list the columns"));
        };
        let header = &session.headers()[index];
        let written = if json {
            let found = serde_json::json!({ "index": index, "header": header });
            serde_json::to_writer_pretty(&mut out, &found)
                .map_err(io::Error::from)
                .and_then(|_| writeln!(out))
        } else {
            writeln!(out, "{}\t{}", index, header)
        };
        return written.map_err(|e| CliError::io(e.to_string()));
    }

    let written = if json {
        serde_json::to_writer_pretty(&mut out, session.headers())
            .map_err(io::Error::from)
            .and_then(|_| writeln!(out))
    } else {
        session
            .headers()
            .iter()
            .try_for_each(|h| writeln!(out, "{}", h))
    };
    written.map_err(|e| CliError::io(e.to_string()))
}

fn cmd_view(
    settings: &Settings,
    source: &SourceArgs,
    query: &QueryArgs,
    page: usize,
    page_size: Option<usize>,
    format: OutputFormat,
) -> Result<(), CliError> {
    if let Some(size) = page_size {
        if !settings.allows_page_size(size) {
            let choices: Vec<String> = settings.page_sizes.iter().map(|n| n.to_string()).collect();
            return Err(CliError::args(format!("unsupported page size: {}", size))
                .with_hint(format!("choose one of {} (view.pageSizes)", choices.join(", "))));
        }
    }

    let mut session = load_session(settings, source)?;
    apply_query(&mut session, query)?;
    if let Some(size) = page_size {
        session.update(|v| v.with_page_size(size));
    }
    session.update(|v| v.with_page(page));

    let current = session.page();
    let mut out = io::stdout().lock();
    render::write_page(&mut out, format, session.headers(), &current)
        .map_err(|e| CliError::io(e.to_string()))
}

fn cmd_export(
    settings: &Settings,
    source: &SourceArgs,
    query: &QueryArgs,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let path = output.unwrap_or_else(|| PathBuf::from(ExportFormat::Xlsx.default_file_name()));
    // Fail on the extension before spending time on the load
    if ExportFormat::from_path(&path).is_none() {
        return Err(CliError::export(ExportError::UnsupportedFormat(path.display().to_string())));
    }

    let mut session = load_session(settings, source)?;
    apply_query(&mut session, query)?;

    let written =
        export(&path, session.headers(), session.visible_rows()).map_err(CliError::export)?;
    eprintln!("Exported {} rows to {}", written, path.display());
    Ok(())
}

// ============================================================================
// contacts
// ============================================================================

fn cmd_contacts_status(settings: &Settings, test: bool, json: bool) -> Result<(), CliError> {
    let lookup = get_contacts_key();

    let fetched = if test {
        let client = ContactsClient::from_settings(settings).map_err(CliError::contacts)?;
        Some(client.fetch_all().map_err(CliError::contacts)?.len())
    } else {
        None
    };

    let mut out = io::stdout().lock();
    let written = if json {
        let status = serde_json::json!({
            "enabled": settings.contacts_enabled,
            "url": settings.contacts_url,
            "tables": settings.contacts_tables,
            "key_source": lookup.source.as_str(),
            "configured": settings.contacts_configured() && lookup.key.is_some(),
            "records": fetched,
        });
        serde_json::to_writer_pretty(&mut out, &status)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(out))
    } else {
        let url = settings.contacts_url.as_deref().unwrap_or("(not set)");
        writeln!(out, "enabled:  {}", settings.contacts_enabled)
            .and_then(|_| writeln!(out, "url:      {}", url))
            .and_then(|_| writeln!(out, "tables:   {}", settings.contacts_tables.join(", ")))
            .and_then(|_| writeln!(out, "key:      {}", lookup.source.as_str()))
            .and_then(|_| match fetched {
                Some(n) => writeln!(out, "records:  {}", n),
                None => Ok(()),
            })
    };
    written.map_err(|e| CliError::io(e.to_string()))
}

fn cmd_contacts_set_key() -> Result<(), CliError> {
    let mut key = String::new();
    io::stdin()
        .lock()
        .read_line(&mut key)
        .map_err(|e| CliError::io(e.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args("no key on stdin")
            .with_hint("echo \"$KEY\" | ugrid contacts set-key"));
    }

    set_contacts_key(key).map_err(|e| CliError {
        code: EXIT_CONTACTS_KEYCHAIN,
        message: e,
        hint: Some(format!("set {} instead", unigrid_config::secrets::CONTACTS_KEY_ENV)),
    })?;
    eprintln!("Contact directory key stored in the system keychain");
    Ok(())
}

fn cmd_contacts_delete_key() -> Result<(), CliError> {
    delete_contacts_key().map_err(|e| CliError {
        code: EXIT_CONTACTS_KEYCHAIN,
        message: e,
        hint: None,
    })?;
    eprintln!("Contact directory key removed from the system keychain");
    Ok(())
}
