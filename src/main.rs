use anyhow::{bail, Context, Result};
use clap::Parser;
use shimcov::catalog::{CatalogProvider, JsonCatalog, UsageCatalog};
use shimcov::cli::{AnalysisMode, Cli, OutputFormat, PopularitySource};
use shimcov::config::AnalyzerConfig;
use shimcov::coverage::CoverageAnalysis;
use shimcov::csv_output::{package_query_csv, workload_query_csv, CsvGapOutput};
use shimcov::error::CoverageError;
use shimcov::fetch::Fetcher;
use shimcov::json_output::JsonOutput;
use shimcov::loupe::LoupeCatalog;
use shimcov::popularity::{
    PopconFeed, PopconField, PopularityCsv, PopularityProvider, PopularityTable, UniformWeights,
};
use shimcov::query::{packages_using, workloads_using, CoverageReport};
use shimcov::support::{load_implemented, load_stubbed, SupportSet};
use shimcov::syscalls::SyscallTable;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Kernel syscall table for naming Loupe syscall numbers
fn syscall_table(config: &AnalyzerConfig, fetcher: &Fetcher) -> Result<SyscallTable> {
    let text = fetcher.fetch_text(&config.syscall_table_url)?;
    let table = SyscallTable::parse(&text);
    if table.is_empty() {
        return Err(CoverageError::Ingestion {
            source_name: config.syscall_table_url.clone(),
            reason: "no syscall entries found".to_string(),
        }
        .into());
    }
    info!(
        "{} syscall names from {}",
        table.len(),
        config.syscall_table_url
    );
    Ok(table)
}

/// Build the dynamic usage catalog from a Loupe database
fn ingest_loupe(root: &Path, config: &AnalyzerConfig, fetcher: &Fetcher) -> Result<()> {
    let table = syscall_table(config, fetcher)?;
    let catalog = LoupeCatalog::new(root, table).load()?;
    let json = catalog.to_json_pretty()?;

    let out = Path::new(&config.application_api_usage);
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(out, json)
        .with_context(|| format!("Failed to write usage catalog: {}", out.display()))?;
    println!(
        "Wrote {} workloads to {}",
        catalog.len(),
        config.application_api_usage
    );
    Ok(())
}

fn load_catalog(cli: &Cli, config: &AnalyzerConfig, fetcher: &Fetcher) -> Result<UsageCatalog> {
    let location = match (&cli.api_usage, cli.mode) {
        (Some(path), _) => path.clone(),
        (None, AnalysisMode::Static) => config.api_usage.clone(),
        (None, AnalysisMode::Dynamic) => config.application_api_usage.clone(),
    };
    Ok(JsonCatalog::new(location, fetcher.clone()).load()?)
}

fn load_popularity(
    cli: &Cli,
    config: &AnalyzerConfig,
    fetcher: &Fetcher,
    catalog: &UsageCatalog,
) -> Result<PopularityTable> {
    let provider: Box<dyn PopularityProvider> = match (cli.mode, cli.source) {
        (AnalysisMode::Dynamic, _) => Box::new(UniformWeights),
        (AnalysisMode::Static, PopularitySource::UbuntuInst) => Box::new(PopularityCsv {
            location: config.ubuntu_popularity.clone(),
            fetcher: fetcher.clone(),
        }),
        (AnalysisMode::Static, source) => {
            let field = match source {
                PopularitySource::Vote => PopconField::Vote,
                _ => PopconField::Inst,
            };
            Box::new(PopconFeed {
                location: PopconFeed::location_for(&config.popcon_url, field),
                field,
                maintainers: cli.maintainers.clone(),
                fetcher: fetcher.clone(),
            })
        }
    };
    Ok(provider.popularity(catalog)?)
}

fn load_support(cli: &Cli, config: &AnalyzerConfig, fetcher: &Fetcher) -> Result<SupportSet> {
    let location = cli
        .implement_syscalls
        .as_deref()
        .unwrap_or(&config.libos_table_url);
    let mut support = SupportSet::new(load_implemented(location, fetcher)?);
    if let Some(stubs) = &cli.stub_syscalls {
        support = support.with_stubbed(load_stubbed(stubs, fetcher)?);
    }
    info!(
        "support set: {} implemented, {} stubbed",
        support.implemented_count(),
        support.stubbed_count()
    );
    Ok(support)
}

fn run_query(
    syscall: &str,
    cli: &Cli,
    catalog: &UsageCatalog,
    popularity: &PopularityTable,
) -> Result<String> {
    let mut json = JsonOutput::new(cli.mode.as_str());
    let out = match cli.mode {
        AnalysisMode::Static => {
            let query = packages_using(syscall, catalog, popularity);
            match cli.format {
                OutputFormat::Text => query.to_text(),
                OutputFormat::Csv => package_query_csv(&query),
                OutputFormat::Json => {
                    json.set_package_query(&query);
                    json.to_json()?
                }
            }
        }
        AnalysisMode::Dynamic => {
            let query = workloads_using(syscall, catalog);
            match cli.format {
                OutputFormat::Text => query.to_text(),
                OutputFormat::Csv => workload_query_csv(&query),
                OutputFormat::Json => {
                    json.set_workload_query(&query);
                    json.to_json()?
                }
            }
        }
    };
    Ok(out)
}

fn render_report(report: &CoverageReport, cli: &Cli) -> Result<String> {
    let out = match cli.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => {
            let mut json = JsonOutput::new(cli.mode.as_str());
            json.set_report(report);
            json.to_json()?
        }
        OutputFormat::Csv => {
            let mut csv = CsvGapOutput::new(cli.mode == AnalysisMode::Dynamic);
            for gap in &report.gaps {
                csv.add_gap(gap.clone());
            }
            csv.to_csv()
        }
    };
    Ok(out)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let mut config = AnalyzerConfig::load(cli.config.as_deref())?;
    if let Some(top) = cli.top {
        config.top = top;
    }
    if let Some(path) = &cli.api_usage {
        if cli.ingest_loupe.is_some() {
            bail!("--api-usage cannot be combined with --ingest-loupe (got {})", path);
        }
    }
    config.validate()?;
    let fetcher = Fetcher::new(config.http_timeout());

    if let Some(root) = &cli.ingest_loupe {
        return ingest_loupe(root, &config, &fetcher);
    }

    let catalog = load_catalog(&cli, &config, &fetcher)?;
    let popularity = load_popularity(&cli, &config, &fetcher, &catalog)?;

    let out = if let Some(syscall) = &cli.syscall {
        run_query(syscall, &cli, &catalog, &popularity)?
    } else {
        let support = load_support(&cli, &config, &fetcher)?;
        let analysis = CoverageAnalysis::run(&support, &catalog, &popularity)?;
        let report = CoverageReport::new(&analysis, &support, config.top, cli.mode);
        render_report(&report, &cli)?
    };
    print!("{}", out);

    Ok(())
}
