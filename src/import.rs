use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::NewBook;

#[derive(Debug, Deserialize)]
struct CsvBookRow {
    title: String,
    author: String,
    #[serde(default)]
    translator: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    pdf_loc: Option<String>,
    #[serde(default)]
    cover_img_loc: Option<String>,
    #[serde(default)]
    published_on: Option<String>,
    #[serde(default)]
    genre: Option<String>,
}

/// Parse an uploaded books CSV (header-keyed, `title` and `author` required).
///
/// The first malformed row or date aborts the whole batch; callers insert
/// nothing unless every row parsed.
pub fn parse_books_csv(content: &[u8]) -> Result<Vec<NewBook>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);

    let mut books = Vec::new();

    for result in rdr.deserialize() {
        let record: CsvBookRow = result.map_err(|e| format!("CSV parse error: {}", e))?;

        if record.title.trim().is_empty() {
            return Err("CSV parse error: missing title".to_string());
        }
        if record.author.trim().is_empty() {
            return Err("CSV parse error: missing author".to_string());
        }

        // Validate ISO dates up front so a bad row can't land mid-batch
        let published_on = match record.published_on.filter(|s| !s.trim().is_empty()) {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("Invalid published_on date '{}': {}", raw.trim(), e))?;
                Some(date.to_string())
            }
            None => None,
        };

        books.push(NewBook {
            title: record.title,
            author: record.author,
            translator: record.translator.filter(|s| !s.is_empty()),
            description: record.description.filter(|s| !s.is_empty()),
            pdf_loc: record.pdf_loc.filter(|s| !s.is_empty()),
            cover_img_loc: record.cover_img_loc.filter(|s| !s.is_empty()),
            published_on,
            genre: record.genre.filter(|s| !s.is_empty()),
        });
    }

    Ok(books)
}

/// Extension check for ingestion uploads; only csv and sql are accepted.
pub fn allowed_upload(filename: &str) -> Option<&str> {
    let ext = filename.rsplit_once('.')?.1;
    match ext.to_ascii_lowercase().as_str() {
        "csv" => Some("csv"),
        "sql" => Some("sql"),
        _ => None,
    }
}
