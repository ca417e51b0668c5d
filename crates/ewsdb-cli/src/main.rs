//! EWSDB CLI
//!
//! Command-line interface over the EWSDB persistence engine, managing a
//! small library of authors and books.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ewsdb_core::Engine;

mod commands;
mod config;
mod database;
mod logging;
mod models;
mod output;

use commands::book::NewBook;
use config::Config;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ewsdb")]
#[command(about = "EWSDB - metadata-driven SQLite persistence")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - print ids only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its tables
    Init,
    /// Print the schema statements
    Schema,
    /// Show database location and contents
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Manage authors
    Author {
        #[command(subcommand)]
        command: AuthorCommands,
    },
    /// Manage books
    Book {
        #[command(subcommand)]
        command: BookCommands,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_file, busy_timeout_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
enum AuthorCommands {
    /// Add an author
    #[command(alias = "create")]
    Add {
        /// Author name
        name: String,
        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List all authors
    #[command(alias = "ls")]
    List,
    /// Show an author and their books
    Show {
        /// Author ID
        id: String,
    },
    /// Edit an author
    Edit {
        /// Author ID
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New email ("none" clears it)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Delete an author (refused while books reference them)
    #[command(alias = "rm")]
    Delete {
        /// Author ID
        id: String,
    },
}

#[derive(Subcommand)]
enum BookCommands {
    /// Add a book
    #[command(alias = "create")]
    Add {
        /// Book title
        title: String,
        /// Author ID
        #[arg(short, long)]
        author: String,
        /// Publication year
        #[arg(short, long)]
        year: Option<i32>,
        /// Rating from 0 to 5
        #[arg(short, long)]
        rating: Option<f64>,
        /// Mark as already read
        #[arg(long)]
        read: bool,
    },
    /// List books
    #[command(alias = "ls")]
    List {
        /// Only books by this author ID
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Show book details
    Show {
        /// Book ID
        id: String,
    },
    /// Mark a book as read
    MarkRead {
        /// Book ID
        id: String,
        /// Mark as unread instead
        #[arg(long)]
        unread: bool,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the database
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let registry = database::registry()?;
    let engine = Engine::new(&registry);

    if let Commands::Schema = &cli.command {
        return commands::schema::show(&engine, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let conn = database::open(&config)?;
    engine
        .ensure_schema(&conn)
        .context("Failed to prepare database schema")?;

    match cli.command {
        Commands::Init => commands::schema::init(&engine, &conn, &config, &output),
        Commands::Status => commands::status::show(&engine, &conn, &config, &output),
        Commands::Author { command } => handle_author_command(command, &engine, &conn, &output),
        Commands::Book { command } => handle_book_command(command, &engine, &conn, &output),
        Commands::Config { .. } | Commands::Schema => Ok(()), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

fn handle_author_command(
    command: AuthorCommands,
    engine: &Engine,
    conn: &rusqlite::Connection,
    output: &Output,
) -> Result<()> {
    match command {
        AuthorCommands::Add { name, email } => {
            commands::author::add(engine, conn, name, email, output).map(|_| ())
        }
        AuthorCommands::List => commands::author::list(engine, conn, output),
        AuthorCommands::Show { id } => commands::author::show(engine, conn, id, output),
        AuthorCommands::Edit { id, name, email } => {
            commands::author::edit(engine, conn, id, name, email, output)
        }
        AuthorCommands::Delete { id } => commands::author::delete(engine, conn, id, output),
    }
}

fn handle_book_command(
    command: BookCommands,
    engine: &Engine,
    conn: &rusqlite::Connection,
    output: &Output,
) -> Result<()> {
    match command {
        BookCommands::Add {
            title,
            author,
            year,
            rating,
            read,
        } => commands::book::add(
            engine,
            conn,
            NewBook {
                title,
                author,
                year,
                rating,
                read,
            },
            output,
        )
        .map(|_| ()),
        BookCommands::List { author } => commands::book::list(engine, conn, author, output),
        BookCommands::Show { id } => commands::book::show(engine, conn, id, output),
        BookCommands::MarkRead { id, unread } => {
            commands::book::mark_read(engine, conn, id, !unread, output)
        }
        BookCommands::Delete { id } => commands::book::delete(engine, conn, id, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ewsdb", "author", "list", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Author {
                command: AuthorCommands::List
            }
        ));
    }

    #[test]
    fn test_book_add_arguments() {
        let cli = Cli::try_parse_from([
            "ewsdb", "book", "add", "Dune", "--author", "3", "--year", "1965", "--read",
        ])
        .unwrap();
        match cli.command {
            Commands::Book {
                command:
                    BookCommands::Add {
                        title,
                        author,
                        year,
                        read,
                        ..
                    },
            } => {
                assert_eq!(title, "Dune");
                assert_eq!(author, "3");
                assert_eq!(year, Some(1965));
                assert!(read);
            }
            _ => panic!("expected book add"),
        }
    }

    #[test]
    fn test_book_add_requires_author() {
        assert!(Cli::try_parse_from(["ewsdb", "book", "add", "Dune"]).is_err());
    }
}
