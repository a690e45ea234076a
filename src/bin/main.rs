//! chainsql CLI - Translate query trees to SQL
//!
//! Usage:
//!   chainsql translate --schema <schema.toml> --query <query.json> [--dialect <dialect>]
//!   chainsql entities --schema <schema.toml>
//!
//! Examples:
//!   chainsql translate --schema blogging.toml --query top_blogs.json --dialect tsql
//!   RUST_LOG=chainsql=debug chainsql translate --query top_blogs.json
//!   chainsql entities --schema blogging.toml

use chainsql::config::Settings;
use chainsql::schema::Schema;
use chainsql::sql::Dialect;
use chainsql::translation::{translate_with, TranslateOptions};
use chainsql::tree::QueryExpr;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "chainsql")]
#[command(about = "chainsql - Translates chained query-operator trees into multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $CHAINSQL_CONFIG, then ./chainsql.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSON query tree to SQL
    Translate {
        /// Path to the schema file (overrides the config's `schema`)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Path to the JSON query tree
        #[arg(short, long)]
        query: PathBuf,

        /// SQL dialect to generate: sqlite, tsql, mysql or postgres
        /// (overrides the config's dialect)
        #[arg(short, long, value_parser = str::parse::<Dialect>)]
        dialect: Option<Dialect>,
    },

    /// List entities in a schema
    Entities {
        /// Path to the schema file (overrides the config's `schema`)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only SQL
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Translate {
            schema,
            query,
            dialect,
        } => cmd_translate(&settings, schema, query, dialect),
        Commands::Entities { schema } => cmd_entities(&settings, schema),
    }
}

fn load_schema(settings: &Settings, path: Option<PathBuf>) -> Result<Schema, String> {
    let path = match path {
        Some(p) => p,
        None => settings
            .schema_path()
            .map_err(|e| e.to_string())?
            .ok_or("no schema given; pass --schema or set `schema` in the config")?,
    };
    Schema::from_file(&path).map_err(|e| format!("schema '{}': {}", path.display(), e))
}

fn cmd_translate(
    settings: &Settings,
    schema: Option<PathBuf>,
    query: PathBuf,
    dialect: Option<Dialect>,
) -> ExitCode {
    let schema = match load_schema(settings, schema) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(&query) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: reading query '{}': {}", query.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let tree: QueryExpr = match serde_json::from_str(&source) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: parsing query '{}': {}", query.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let dialect = dialect.unwrap_or(settings.translation.dialect);
    let options = TranslateOptions::from(&settings.translation);

    match translate_with(&tree, &schema, dialect, options) {
        Ok(select) => {
            println!("{}", select.to_sql(dialect));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_entities(settings: &Settings, schema: Option<PathBuf>) -> ExitCode {
    let schema = match load_schema(settings, schema) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if schema.entities.is_empty() {
        println!("No entities found.");
        return ExitCode::SUCCESS;
    }

    println!("Entities:");
    for entity in &schema.entities {
        let table = match &entity.schema {
            Some(s) => format!("{}.{}", s, entity.table),
            None => entity.table.clone(),
        };
        println!("  {} ({})", entity.name, table);
        for rel in &entity.relationships {
            println!("    -> {} : {} ({:?})", rel.name, rel.target, rel.cardinality);
        }
    }

    ExitCode::SUCCESS
}
