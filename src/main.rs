use anyhow::{bail, Context, Result};
use clap::Parser;
use glob::glob;
use seapetl::{
    config::BulletinConfig,
    export::{
        export_bulletins, DocumentStore, ExistPolicy, ExportPlan, FileExportOptions,
        RecordStore, TableServiceStore, WriteMode,
    },
    fetch, ExplicitDate, TableName,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Parse SEAP/RJ weekly custody bulletins and export their tables.
#[derive(Parser, Debug)]
#[command(name = "seapetl", version)]
struct Args {
    /// Workbook paths, glob patterns or http(s) URLs
    inputs: Vec<String>,

    /// Reference date, overriding the one stated in the sheet
    #[arg(long)]
    date: Option<String>,

    /// YAML file overriding the bulletin layout
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output template, e.g. out/[YYYY]/[MM]/boletim_[DD].json
    #[arg(long, short)]
    output: Option<String>,

    /// Tables to export (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Vec<String>,

    /// Stamp file exports with the bulletin date under this column
    #[arg(long)]
    date_column: Option<String>,

    /// Append to existing output files instead of replacing them
    #[arg(long)]
    append: bool,

    /// Hosted data-table service base URL
    #[arg(long)]
    table_service: Option<String>,

    /// Bearer token for the table service
    #[arg(long, env = "SEAP_TABLES_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Document store URL; credentials may be embedded
    #[arg(long, env = "SEAP_DOCSTORE_URL", hide_env_values = true)]
    docstore: Option<String>,

    /// Document store database
    #[arg(long, default_value = "seap")]
    database: String,

    /// What to do with records already stored: fail, ignore, force/update
    #[arg(long, default_value = "ignore")]
    policy: String,

    /// Page to scan for .xlsx bulletin links, added to the inputs
    #[arg(long)]
    index: Option<String>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "info,seapetl=debug",
        _ => "info,seapetl=trace",
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
}

/// Expand globs and download URLs into local workbook paths. Also returns how
/// many downloads failed.
fn resolve_inputs(
    args: &Args,
    client: &reqwest::blocking::Client,
    downloads: &Path,
) -> Result<(Vec<PathBuf>, usize)> {
    let mut urls: Vec<String> = Vec::new();
    let mut paths = Vec::new();

    if let Some(index) = &args.index {
        let links = fetch::find_bulletin_links(client, index)
            .with_context(|| format!("scanning index page {index}"))?;
        info!(index = %index, count = links.len(), "bulletin links discovered");
        urls.extend(links.into_iter().map(String::from));
    }

    for input in &args.inputs {
        if input.starts_with("http://") || input.starts_with("https://") {
            urls.push(input.clone());
        } else if input.contains(['*', '?', '[']) {
            let matches: Vec<PathBuf> = glob(input)
                .with_context(|| format!("invalid glob pattern {input}"))?
                .filter_map(|entry| entry.ok())
                .collect();
            if matches.is_empty() {
                warn!(pattern = %input, "glob matched no files");
            }
            paths.extend(matches);
        } else {
            paths.push(PathBuf::from(input));
        }
    }

    let mut failed = 0;
    for (i, url) in urls.iter().enumerate() {
        // one directory per download keeps same-named files apart
        let dest = downloads.join(i.to_string());
        match fetch::download_bulletin(client, url, &dest) {
            Ok(path) => paths.push(path),
            Err(e) => {
                error!(url = %url, error = %e, "download failed");
                failed += 1;
            }
        }
    }
    Ok((paths, failed))
}

fn selected_tables(args: &Args) -> Result<Vec<TableName>> {
    if args.tables.is_empty() {
        return Ok(TableName::ALL.to_vec());
    }
    args.tables
        .iter()
        .map(|t| t.parse::<TableName>().map_err(Into::into))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => BulletinConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BulletinConfig::default(),
    };
    let policy: ExistPolicy = args.policy.parse()?;
    let tables = selected_tables(&args)?;

    let mut stores: Vec<Box<dyn RecordStore>> = Vec::new();
    if let Some(url) = &args.table_service {
        let store = TableServiceStore::new(url, args.token.clone())
            .context("configuring table service")?;
        stores.push(Box::new(store));
    }
    if let Some(url) = &args.docstore {
        let store = DocumentStore::new(Some(url.as_str()), &args.database, &config.source_name)
            .context("configuring document store")?;
        stores.push(Box::new(store));
    }
    if args.output.is_none() && stores.is_empty() {
        warn!("no --output, --table-service or --docstore given; bulletins are only parsed");
    }

    let client = fetch::build_client()?;
    let downloads = TempDir::new().context("creating download directory")?;
    let (inputs, failed_downloads) = resolve_inputs(&args, &client, downloads.path())?;
    if inputs.is_empty() && failed_downloads == 0 {
        bail!("no input bulletins");
    }

    let explicit = args.date.clone().map(ExplicitDate::from);
    let plan = ExportPlan {
        tables: &tables,
        template: args.output.as_deref(),
        options: FileExportOptions {
            date_column: args.date_column.clone(),
            mode: if args.append {
                WriteMode::Append
            } else {
                WriteMode::Overwrite
            },
        },
        stores: &stores,
        policy,
    };
    let summary = export_bulletins(&inputs, explicit.as_ref(), &config, &plan);

    let failed_inputs = summary.failed_inputs + failed_downloads;
    let failed_exports = summary.failed_exports;
    info!(
        inputs = summary.inputs,
        failed_inputs, failed_exports, "done"
    );
    if failed_inputs > 0 || failed_exports > 0 {
        bail!("{failed_inputs} input(s) and {failed_exports} export(s) failed");
    }
    Ok(())
}
