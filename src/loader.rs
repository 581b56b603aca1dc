use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::data::{Table, APP, COUNTRY};
use crate::error::LoadError;
use crate::report::Reporter;

/// Load a dataset, normalizing `Country` and `App`.
///
/// Never fails: any read or parse problem is reported and an empty table is
/// returned, so downstream queries simply find no rows.
pub fn load(path: &Path, reporter: &dyn Reporter) -> Table {
    match try_load(path) {
        Ok(table) => {
            log::info!(
                "Loaded {} rows x {} columns from {}",
                table.len(),
                table.headers.len(),
                path.display()
            );
            table
        }
        Err(e) => {
            reporter.error(&format!("Error loading data: {e}"));
            Table::default()
        }
    }
}

/// Dispatch by extension; anything that is not `.json` is read as CSV
pub fn try_load(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    match ext.as_str() {
        "json" => load_json(file),
        _ => load_from_reader(file),
    }
}

/// Read CSV from any reader and normalize the key columns
pub fn load_from_reader<R: Read>(reader: R) -> Result<Table, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    finish(Table::from_raw(headers, rows))
}

fn load_json<R: Read>(reader: R) -> Result<Table, LoadError> {
    let value: serde_json::Value =
        serde_json::from_reader(reader).map_err(|e| LoadError::Json(e.to_string()))?;
    let table = Table::from_json(&value).map_err(|e| LoadError::Json(e.to_string()))?;
    finish(table)
}

fn finish(mut table: Table) -> Result<Table, LoadError> {
    for required in [COUNTRY, APP] {
        if !table.has_column(required) {
            return Err(LoadError::MissingColumn(required));
        }
    }
    table.normalize_column(COUNTRY);
    table.normalize_column(APP);
    Ok(table)
}

/// Memoizes [`load`] per source path
#[derive(Debug, Default)]
pub struct DataLoader {
    cache: HashMap<PathBuf, Table>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path, reporter: &dyn Reporter) -> &Table {
        self.cache.entry(path.to_path_buf()).or_insert_with(|| {
            log::debug!("Cache miss for {}", path.display());
            load(path, reporter)
        })
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::report::CollectingReporter;

    const CSV: &str = "Country,App,Likes\n  USA ,Instagram,10\nusa, instagram ,20\nUK,Facebook,5\n";

    #[test]
    fn test_load_from_reader_normalizes_keys() {
        let table = load_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.unique_labels("Country"), vec!["uk", "usa"]);
        assert_eq!(table.unique_labels("App"), vec!["facebook", "instagram"]);
        let likes = table.column_index("Likes").unwrap();
        assert_eq!(table.rows[1][likes], Value::Integer(20));
    }

    #[test]
    fn test_load_is_idempotent() {
        let first = load_from_reader(CSV.as_bytes()).unwrap();
        let second = load_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_required_column() {
        let result = load_from_reader("Country,Likes\nusa,1\n".as_bytes());
        assert!(matches!(result, Err(LoadError::MissingColumn("App"))));
    }

    #[test]
    fn test_load_missing_file_reports_and_returns_empty() {
        let reporter = CollectingReporter::new();
        let table = load(Path::new("does/not/exist.csv"), &reporter);
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error loading data"));
    }

    #[test]
    fn test_data_loader_memoizes() {
        let reporter = CollectingReporter::new();
        let mut loader = DataLoader::new();
        let path = Path::new("does/not/exist.csv");
        assert!(loader.load(path, &reporter).is_empty());
        assert!(loader.load(path, &reporter).is_empty());
        assert_eq!(loader.cached(), 1);
        // Second call is served from the cache, so only one diagnostic
        assert_eq!(reporter.messages().len(), 1);
    }
}
