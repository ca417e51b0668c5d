//! Status command handler

use anyhow::Result;
use rusqlite::Connection;

use ewsdb_core::Engine;

use crate::config::Config;
use crate::database;
use crate::models::{Author, Book};
use crate::output::{Output, OutputFormat};

/// Row counts shown by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub authors: i64,
    pub books: i64,
}

fn counts(engine: &Engine, conn: &Connection) -> Result<Counts> {
    Ok(Counts {
        authors: engine.count::<Author, _>(conn)?,
        books: engine.count::<Book, _>(conn)?,
    })
}

/// Show status information
pub fn show(engine: &Engine, conn: &Connection, config: &Config, output: &Output) -> Result<()> {
    let path = config.database_path();
    let size = database::file_size(&path).unwrap_or(0);
    let counts = counts(engine, conn)?;
    let guarded: Vec<String> = engine
        .registry()
        .entries()
        .iter()
        .flat_map(|entry| {
            engine
                .guard()
                .references_to(entry.table_name())
                .iter()
                .map(move |r| format!("{}.{} -> {}", r.table, r.field, entry.table_name()))
        })
        .collect();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": path,
                    "size": size,
                    "busy_timeout_ms": config.busy_timeout_ms,
                    "counts": {
                        "authors": counts.authors,
                        "books": counts.books
                    },
                    "guarded_references": guarded
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            println!("EWSDB Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Location: {}", path.display());
            println!("  Size:     {} bytes", size);
            println!();
            println!("Contents:");
            println!("  Authors: {}", counts.authors);
            println!("  Books:   {}", counts.books);
            println!();
            println!("Delete guards:");
            if guarded.is_empty() {
                println!("  (none)");
            }
            for reference in &guarded {
                println!("  {}", reference);
            }
        }
    }

    Ok(())
}
