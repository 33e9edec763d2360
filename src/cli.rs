//! Command line interface
//!
//! `serve` (the default) runs the HTTP API. `run` drives the whole pipeline
//! over a local CSV file and writes the export CSV.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing::info;

use crate::agents::{entity_keys, ExtractionAgent, ExtractionMap, SearchAgent};
use crate::config::Config;
use crate::dataset::Table;
use crate::export::extraction_csv;
use crate::middleware::apply_cors;
use crate::models::AppState;

#[derive(Parser)]
#[command(name = "entity-lens")]
#[command(about = "Search the web for a column of entities and extract facts with an LLM")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Search and extract for one column of a local CSV file
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// CSV file with a header row
    #[arg(long)]
    csv: PathBuf,
    /// Column holding the entities
    #[arg(long)]
    column: String,
    /// Search query template, e.g. "{entity} contact"
    #[arg(long)]
    search_template: String,
    /// Extraction prompt template, e.g. "Extract the email address of {entity}"
    #[arg(long)]
    extract_template: String,
    /// First row to process (0-based, inclusive)
    #[arg(long, default_value = "0")]
    start_row: usize,
    /// Row to stop before (exclusive); defaults to the end of the file
    #[arg(long)]
    end_row: Option<usize>,
    /// Write the CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => serve(config, state, host, port).await,
        Commands::Run(args) => run_csv(&state, args).await,
    }
}

async fn run_csv(state: &AppState, args: RunArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.csv)
        .await
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;
    let table = Table::from_csv(&bytes)?.slice(args.start_row, args.end_row);

    let results = run_pipeline(
        state,
        &table,
        &args.column,
        &args.search_template,
        &args.extract_template,
    )
    .await?;
    let data = extraction_csv(&results)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), entities = results.len(), "Results written");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn serve(config: Config, state: AppState, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let app = apply_cors(crate::create_router(state), &config.server.cors_allowed_origins);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Search then extract for every entity of `column`
pub async fn run_pipeline(
    state: &AppState,
    table: &Table,
    column: &str,
    search_template: &str,
    extract_template: &str,
) -> Result<ExtractionMap> {
    let search_template = SearchAgent::parse_template(search_template)
        .context("Invalid search template")?;
    let extract_template = ExtractionAgent::parse_template(extract_template)
        .context("Invalid extraction template")?;

    let entities = entity_keys(&table.column_values(column)?);
    info!(entities = entities.len(), column = %column, "Running pipeline");

    let searched = state
        .search_agent
        .search_entities(&entities, &search_template)
        .await;
    for (entity, reason) in searched.failures() {
        tracing::warn!(entity = %entity, reason = %reason, "No search results used for entity");
    }

    let search_results = searched.into_search_map();
    let extracted = state
        .extraction_agent
        .extract_entities(&entities, &search_results, &extract_template)
        .await;

    Ok(extracted.into_extraction_map())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;

    #[tokio::test]
    async fn test_run_pipeline_over_csv_column() {
        let table = Table::from_csv(b"name,size\nAcme,1\nGlobex,2\nFailCo,3\n").unwrap();
        let results = run_pipeline(
            &test_state(),
            &table.slice(0, Some(2)),
            "name",
            "{entity} contact",
            "Email of {entity}: {context}",
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results["Acme"],
            "Email of Acme: snippet: Acme contact\n\nTitle: About Acme contact\nSnippet: snippet: Acme contact"
        );
        assert!(results["Globex"].starts_with("Email of Globex: snippet: Globex contact"));
    }

    #[tokio::test]
    async fn test_run_pipeline_rejects_bad_input() {
        let table = Table::from_csv(b"name\nAcme\n").unwrap();
        let state = test_state();

        assert!(run_pipeline(&state, &table, "missing", "{entity}", "{entity}").await.is_err());
        assert!(run_pipeline(&state, &table, "name", "no placeholder", "{entity}").await.is_err());
        assert!(run_pipeline(&state, &table, "name", "{entity}", "{context}").await.is_err());
    }

    #[tokio::test]
    async fn test_run_csv_writes_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("leads.csv");
        let output = dir.path().join("out.csv");
        tokio::fs::write(&input, "company\nAcme\nFailCo\nGlobex\n").await.unwrap();

        let args = RunArgs {
            csv: input,
            column: "company".into(),
            search_template: "{entity}".into(),
            extract_template: "Email of {entity}".into(),
            start_row: 1,
            end_row: None,
            output: Some(output.clone()),
        };
        run_csv(&test_state(), args).await.unwrap();

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(written.starts_with(
            "Entity,Extracted Info\nFailCo,Error: LLM API error: model overloaded\nGlobex,\"Email of Globex\n\n"
        ));
        assert!(!written.contains("Acme"));
    }

    #[tokio::test]
    async fn test_run_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            csv: dir.path().join("absent.csv"),
            column: "company".into(),
            search_template: "{entity}".into(),
            extract_template: "{entity}".into(),
            start_row: 0,
            end_row: None,
            output: None,
        };

        let err = run_csv(&test_state(), args).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "entity-lens",
            "run",
            "--csv",
            "leads.csv",
            "--column",
            "company",
            "--search-template",
            "{entity} contact",
            "--extract-template",
            "Extract the email address of {entity}",
            "--end-row",
            "10",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.csv, PathBuf::from("leads.csv"));
                assert_eq!(args.column, "company");
                assert_eq!(args.start_row, 0);
                assert_eq!(args.end_row, Some(10));
                assert!(args.output.is_none());
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["entity-lens"]).unwrap();
        assert!(cli.command.is_none());
    }
}
