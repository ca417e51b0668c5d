//! Book command handlers

use std::collections::HashMap;

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

use ewsdb_core::{Engine, RecordId};

use crate::models::{Author, Book};
use crate::output::Output;

use super::{explain, parse_id};

/// Fields accepted by `book add`
#[derive(Debug, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub read: bool,
}

/// Add a book for an existing author
pub fn add(engine: &Engine, conn: &Connection, new: NewBook, output: &Output) -> Result<Book> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        bail!("Book title cannot be empty");
    }
    if let Some(rating) = new.rating {
        if !(0.0..=5.0).contains(&rating) {
            bail!("Rating must be between 0 and 5, got {}", rating);
        }
    }

    let author_id = parse_id(&new.author)?;
    if engine
        .fetch_one::<Author, _>(conn, author_id)
        .map_err(explain)?
        .is_none()
    {
        bail!("Author not found: {}", author_id);
    }

    let mut book = Book::new(title, author_id);
    book.year = new.year;
    book.rating = new.rating;
    book.read = new.read;

    let book = engine.save(conn, &book).map_err(explain)?;
    info!(id = ?book.id, author = author_id.get(), "book added");

    if output.is_quiet() {
        output.print_book(&book, None);
    } else {
        output.success(&format!(
            "Added book '{}' ({})",
            book.title,
            book.id.map(|id| id.to_string()).unwrap_or_default()
        ));
    }
    Ok(book)
}

/// List books, optionally only those of one author
pub fn list(
    engine: &Engine,
    conn: &Connection,
    author: Option<String>,
    output: &Output,
) -> Result<()> {
    let author_filter = author.as_deref().map(parse_id).transpose()?;

    let books: Vec<Book> = engine.fetch_all(conn).map_err(explain)?;
    let books: Vec<Book> = books
        .into_iter()
        .filter(|b| author_filter.map_or(true, |id| b.author == id))
        .collect();

    output.print_books(&books, &author_names(engine, conn)?);
    Ok(())
}

/// Show one book
pub fn show(engine: &Engine, conn: &Connection, id: String, output: &Output) -> Result<()> {
    let book = find(engine, conn, &id)?;
    let author = engine
        .fetch_one::<Author, _>(conn, book.author)
        .map_err(explain)?;
    output.print_book(&book, author.as_ref());
    Ok(())
}

/// Mark a book as read or unread
pub fn mark_read(
    engine: &Engine,
    conn: &Connection,
    id: String,
    read: bool,
    output: &Output,
) -> Result<()> {
    let mut book = find(engine, conn, &id)?;
    book.read = read;
    let book = engine.save(conn, &book).map_err(explain)?;
    output.success(&format!(
        "Marked '{}' as {}",
        book.title,
        if read { "read" } else { "unread" }
    ));
    Ok(())
}

/// Delete a book
pub fn delete(engine: &Engine, conn: &Connection, id: String, output: &Output) -> Result<()> {
    let book = find(engine, conn, &id)?;
    engine.delete(conn, &book).map_err(explain)?;
    output.success(&format!("Deleted book '{}'", book.title));
    Ok(())
}

fn find(engine: &Engine, conn: &Connection, id: &str) -> Result<Book> {
    let record_id = parse_id(id)?;
    match engine.fetch_one::<Book, _>(conn, record_id).map_err(explain)? {
        Some(book) => Ok(book),
        None => bail!("Book not found: {}", record_id),
    }
}

fn author_names(engine: &Engine, conn: &Connection) -> Result<HashMap<RecordId, String>> {
    let authors: Vec<Author> = engine.fetch_all(conn).map_err(explain)?;
    Ok(authors
        .into_iter()
        .filter_map(|a| a.id.map(|id| (id, a.name)))
        .collect())
}
