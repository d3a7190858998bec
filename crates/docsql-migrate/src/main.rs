//! docsql-migrate CLI
//!
//! Applies property-schema files to a SQLite database.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use docsql_migrate::prelude::*;
use docsql_sqlite::SqliteStorage;

/// Non-destructive SQLite migrations from JSON property schemas.
#[derive(Parser)]
#[command(name = "docsql-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Suffix of the shadow table used when a table is rebuilt.
    #[arg(long, default_value = "_shadow")]
    shadow_suffix: String,

    /// Skip creating indexes.
    #[arg(long)]
    no_indexes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CREATE TABLE and CREATE INDEX statements of schema files.
    Ddl {
        /// Schema files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the steps needed to bring each table in line, without applying them.
    Plan {
        /// Schema files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Migrate each table to its schema file.
    Alter {
        /// Schema files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let migrator = SchemaMigrator::with_options(MigratorOptions {
        shadow_suffix: cli.shadow_suffix,
        create_indexes: !cli.no_indexes,
        ..MigratorOptions::default()
    });

    match cli.command {
        Commands::Ddl { files } => {
            for path in files {
                let schema = SchemaFile::load(&path)?;
                let plan = migrator.plan(&schema.table_schema()?, None);
                for step in plan.steps() {
                    println!("{step}");
                }
            }
        }

        Commands::Plan { files } => {
            let mut storage = SqliteStorage::connect(&cli.database).await?;
            for path in files {
                let schema = SchemaFile::load(&path)?;
                let plan = migrator
                    .plan_for(&mut storage, &schema.table_name()?, &schema.properties()?)
                    .await?;
                print!("{plan}");
            }
        }

        Commands::Alter { files } => {
            let mut storage = SqliteStorage::connect(&cli.database).await?;
            for path in files {
                info!(file = %path.display(), "Loading schema file");
                let schema = SchemaFile::load(&path)?;
                let outcome = migrator
                    .alter(&mut storage, &schema.table_name()?, &schema.properties()?)
                    .await?;
                println!("{outcome}");
            }
        }
    }

    Ok(())
}
