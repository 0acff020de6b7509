//! Interactive document selection and confirmation.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use docdeploy_core::{ContentSource, Document};

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "type")]
    document_type: String,
    #[tabled(rename = "content")]
    content: String,
}

fn content_label(document: &Document) -> String {
    match &document.content {
        Some(ContentSource::ShellScript(path)) => format!("shell: {}", path.display()),
        Some(ContentSource::File(path)) => path.display().to_string(),
        Some(ContentSource::Inline(_)) => "inline".to_string(),
        None => "-".to_string(),
    }
}

/// Pick the documents to operate on.
///
/// A single loaded document, or `all`, selects everything. Otherwise the
/// documents are listed and the user answers with comma-separated indexes.
pub fn select_documents<R: BufRead, W: Write>(
    documents: Vec<Document>,
    all: bool,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<Document>> {
    if documents.len() <= 1 || all {
        return Ok(documents);
    }

    let rows: Vec<DocumentRow> = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| DocumentRow {
            index: i + 1,
            name: doc.name.to_string(),
            document_type: doc.document_type.clone(),
            content: content_label(doc),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    writeln!(output, "{table}")?;
    write!(output, "{} ", "Select documents (e.g. 1,3):".bold())?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("failed to read selection")?;
    let indexes = parse_indexes(&answer, documents.len())?;
    if indexes.is_empty() {
        bail!("No documents selected");
    }

    let mut slots: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
    Ok(indexes
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

/// Parse 1-based, comma-separated indexes into 0-based positions, keeping the
/// first occurrence of each.
pub fn parse_indexes(answer: &str, len: usize) -> Result<Vec<usize>> {
    let mut picked = Vec::new();
    for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part
            .parse()
            .with_context(|| format!("'{part}' is not a document index"))?;
        if n == 0 || n > len {
            bail!("index {n} out of range (1-{len})");
        }
        if !picked.contains(&(n - 1)) {
            picked.push(n - 1);
        }
    }
    Ok(picked)
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm<R: BufRead, W: Write>(message: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{} {} ", message.bold(), "[y/N]".dimmed())?;
    output.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn docs(names: &[&str]) -> Vec<Document> {
        names.iter().map(|n| Document::new(*n)).collect()
    }

    #[test]
    fn single_document_is_selected_without_prompt() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let picked = select_documents(docs(&["only"]), false, &mut input, &mut output).unwrap();
        assert_eq!(picked.len(), 1);
        assert!(output.is_empty());
    }

    #[test]
    fn all_flag_skips_prompt() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let picked = select_documents(docs(&["a", "b", "c"]), true, &mut input, &mut output).unwrap();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn answer_selects_in_answer_order() {
        let mut input = Cursor::new(b"3, 1,3\n".to_vec());
        let mut output = Vec::new();
        let picked = select_documents(docs(&["a", "b", "c"]), false, &mut input, &mut output).unwrap();
        let names: Vec<&str> = picked.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("name"));
        assert!(shown.contains('b'));
    }

    #[test]
    fn empty_answer_is_an_error() {
        let mut input = Cursor::new(b"\n".to_vec());
        let mut output = Vec::new();
        let err = select_documents(docs(&["a", "b"]), false, &mut input, &mut output).unwrap_err();
        assert_eq!(err.to_string(), "No documents selected");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(parse_indexes("0", 2).is_err());
        assert!(parse_indexes("3", 2).is_err());
        assert!(parse_indexes("x", 2).is_err());
    }

    #[test]
    fn confirmation_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false)] {
            let mut input = Cursor::new(answer.as_bytes().to_vec());
            let mut output = Vec::new();
            assert_eq!(confirm("Sure?", &mut input, &mut output).unwrap(), expected);
        }
    }
}
