//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag), printing ids only

use std::collections::HashMap;

use serde::Serialize;

use ewsdb_core::RecordId;

use crate::models::{Author, Book};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single author with the books that reference them
    pub fn print_author(&self, author: &Author, books: &[Book]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", display_id(author.id));
                println!("Name:    {}", author.name);
                if let Some(ref email) = author.email {
                    println!("Email:   {}", email);
                }
                println!("Created: {}", author.created_at.format("%Y-%m-%d %H:%M"));

                if !books.is_empty() {
                    println!();
                    println!("── Books ({}) ──", books.len());
                    for book in books {
                        println!("[{}] {}", display_id(book.id), book.title);
                    }
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({ "author": author, "books": books }));
            }
            OutputFormat::Quiet => {
                println!("{}", display_id(author.id));
            }
        }
    }

    /// Print a list of authors
    pub fn print_authors(&self, authors: &[Author]) {
        match self.format {
            OutputFormat::Human => {
                if authors.is_empty() {
                    println!("No authors found.");
                    return;
                }
                for author in authors {
                    println!(
                        "{:>5} | {} | {}",
                        display_id(author.id),
                        truncate(&author.name, 35),
                        author.email.as_deref().unwrap_or("-")
                    );
                }
                println!("\n{} author(s)", authors.len());
            }
            OutputFormat::Json => print_json(&authors),
            OutputFormat::Quiet => {
                for author in authors {
                    println!("{}", display_id(author.id));
                }
            }
        }
    }

    /// Print a single book, naming its author when known
    pub fn print_book(&self, book: &Book, author: Option<&Author>) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", display_id(book.id));
                println!("Title:  {}", book.title);
                match author {
                    Some(author) => println!("Author: {} ({})", author.name, book.author),
                    None => println!("Author: {} (missing)", book.author),
                }
                if let Some(year) = book.year {
                    println!("Year:   {}", year);
                }
                if let Some(rating) = book.rating {
                    println!("Rating: {:.1}", rating);
                }
                println!("Read:   {}", if book.read { "yes" } else { "no" });
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({ "book": book, "author": author }));
            }
            OutputFormat::Quiet => {
                println!("{}", display_id(book.id));
            }
        }
    }

    /// Print a list of books; `authors` maps author ids to names
    pub fn print_books(&self, books: &[Book], authors: &HashMap<RecordId, String>) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books found.");
                    return;
                }
                for book in books {
                    let author = authors.get(&book.author).map_or("?", String::as_str);
                    let year = book.year.map(|y| y.to_string()).unwrap_or_default();
                    println!(
                        "{:>5} | {} | {} | {:>4} | {}",
                        display_id(book.id),
                        truncate(&book.title, 35),
                        truncate(author, 25),
                        year,
                        if book.read { "read" } else { "unread" }
                    );
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => print_json(&books),
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", display_id(book.id));
                }
            }
        }
    }

    /// Print DDL statements, one per line
    pub fn print_statements(&self, statements: &[String]) {
        match self.format {
            OutputFormat::Human | OutputFormat::Quiet => {
                for statement in statements {
                    println!("{};", statement);
                }
            }
            OutputFormat::Json => print_json(&statements),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn display_id(id: Option<RecordId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
