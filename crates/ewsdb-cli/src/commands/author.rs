//! Author command handlers

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

use ewsdb_core::Engine;

use crate::models::{Author, Book};
use crate::output::Output;

use super::{explain, parse_id};

/// Add a new author
pub fn add(
    engine: &Engine,
    conn: &Connection,
    name: String,
    email: Option<String>,
    output: &Output,
) -> Result<Author> {
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("Author name cannot be empty");
    }

    let author = engine.save(conn, &Author::new(name, email)).map_err(explain)?;
    info!(id = ?author.id, "author added");

    if output.is_quiet() {
        output.print_author(&author, &[]);
    } else {
        output.success(&format!("Added author '{}' ({})", author.name, id_of(&author)));
    }
    Ok(author)
}

/// List every author
pub fn list(engine: &Engine, conn: &Connection, output: &Output) -> Result<()> {
    let authors: Vec<Author> = engine.fetch_all(conn).map_err(explain)?;
    output.print_authors(&authors);
    Ok(())
}

/// Show one author and their books
pub fn show(engine: &Engine, conn: &Connection, id: String, output: &Output) -> Result<()> {
    let author = find(engine, conn, &id)?;
    let books = books_by(engine, conn, &author)?;
    output.print_author(&author, &books);
    Ok(())
}

/// Change an author's name or email
pub fn edit(
    engine: &Engine,
    conn: &Connection,
    id: String,
    name: Option<String>,
    email: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut author = find(engine, conn, &id)?;

    if let Some(name) = name {
        let name = name.trim().to_string();
        if name.is_empty() {
            bail!("Author name cannot be empty");
        }
        author.name = name;
    }
    if let Some(email) = email {
        author.email = if email.is_empty() || email == "none" {
            None
        } else {
            Some(email)
        };
    }

    let author = engine.save(conn, &author).map_err(explain)?;
    output.success(&format!("Updated author {}", id_of(&author)));
    Ok(())
}

/// Delete an author no book refers to
pub fn delete(engine: &Engine, conn: &Connection, id: String, output: &Output) -> Result<()> {
    let author = find(engine, conn, &id)?;
    engine.delete(conn, &author).map_err(explain)?;
    output.success(&format!("Deleted author '{}'", author.name));
    Ok(())
}

fn find(engine: &Engine, conn: &Connection, id: &str) -> Result<Author> {
    let record_id = parse_id(id)?;
    match engine.fetch_one::<Author, _>(conn, record_id).map_err(explain)? {
        Some(author) => Ok(author),
        None => bail!("Author not found: {}", record_id),
    }
}

fn books_by(engine: &Engine, conn: &Connection, author: &Author) -> Result<Vec<Book>> {
    let books: Vec<Book> = engine.fetch_all(conn).map_err(explain)?;
    Ok(books
        .into_iter()
        .filter(|b| Some(b.author) == author.id)
        .collect())
}

fn id_of(author: &Author) -> String {
    author.id.map(|id| id.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::setup;

    #[test]
    fn test_add_and_find() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);

        let added = add(&engine, &conn, "  Ursula K. Le Guin ".into(), None, &output).unwrap();
        assert_eq!(added.name, "Ursula K. Le Guin");

        let id = added.id.unwrap().to_string();
        assert_eq!(find(&engine, &conn, &id).unwrap(), added);
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);
        assert!(add(&engine, &conn, "   ".into(), None, &output).is_err());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);

        add(&engine, &conn, "Octavia Butler".into(), None, &output).unwrap();
        let err = add(&engine, &conn, "Octavia Butler".into(), None, &output).unwrap_err();
        assert!(err.to_string().contains("Hint:"));
        assert_eq!(engine.count::<Author, _>(&conn).unwrap(), 1);
    }

    #[test]
    fn test_edit_updates_in_place() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);

        let added = add(&engine, &conn, "Iain Banks".into(), None, &output).unwrap();
        let id = added.id.unwrap().to_string();

        edit(
            &engine,
            &conn,
            id.clone(),
            Some("Iain M. Banks".into()),
            Some("iain@example.com".into()),
            &output,
        )
        .unwrap();

        let edited = find(&engine, &conn, &id).unwrap();
        assert_eq!(edited.name, "Iain M. Banks");
        assert_eq!(edited.email.as_deref(), Some("iain@example.com"));
        assert_eq!(edited.created_at, added.created_at);

        edit(&engine, &conn, id.clone(), None, Some("none".into()), &output).unwrap();
        assert!(find(&engine, &conn, &id).unwrap().email.is_none());
    }

    #[test]
    fn test_delete_blocked_by_book() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);

        let author = add(&engine, &conn, "Frank Herbert".into(), None, &output).unwrap();
        let book = engine
            .save(&conn, &Book::new("Dune", author.id.unwrap()))
            .unwrap();
        let id = author.id.unwrap().to_string();

        let err = delete(&engine, &conn, id.clone(), &output).unwrap_err();
        assert!(err.to_string().contains("books.author"));
        assert_eq!(books_by(&engine, &conn, &author).unwrap(), vec![book.clone()]);

        engine.delete(&conn, &book).unwrap();
        delete(&engine, &conn, id.clone(), &output).unwrap();
        assert!(find(&engine, &conn, &id).is_err());
    }

    #[test]
    fn test_show_unknown_author() {
        let (conn, registry, output) = setup();
        let engine = Engine::new(&registry);

        let err = show(&engine, &conn, "99".into(), &output).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(show(&engine, &conn, "x".into(), &output).is_err());
    }
}
