use crate::error::{Result, SurveyError};
use log::{debug, error, info};
use polars::prelude::*;
use regex::Regex;
use std::fs::{self, File};
use std::path::Path;
use std::sync::LazyLock;

static COLUMN_LIST_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\s',"]*(.*?)[\s',"]*$"#).expect("column list pattern is valid")
});

/// Reads a column-list file: one identifier per line, optionally wrapped in
/// quotes and followed by a comma. Blank lines are skipped.
pub fn read_column_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        error!("Failed to read column list {:?}: {}", path, e);
        SurveyError::Io(e)
    })?;

    let columns: Vec<String> = content
        .lines()
        .filter_map(|line| {
            COLUMN_LIST_ENTRY
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .filter(|name| !name.is_empty())
        .collect();

    debug!("Read {} column names from {:?}", columns.len(), path);
    Ok(columns)
}

/// Reads a CSV whose first record holds the column names, every column as
/// text. `skipped_rows` records after the header (question text, import
/// metadata) are discarded and empty cells become empty strings.
pub fn read_table(path: &Path, skipped_rows: usize) -> Result<DataFrame> {
    info!("Reading {:?}", path);

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows_after_header(skipped_rows)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| {
            error!("Failed to read CSV {:?}: {}", path, e);
            SurveyError::Polars(e)
        })?;
    let frame = frame.lazy().fill_null(lit("")).collect()?;

    info!(
        "Read {} rows with {} columns from {:?}",
        frame.height(),
        frame.width(),
        path
    );
    Ok(frame)
}

/// Writes the frame with a header row, creating parent directories.
pub fn write_table_csv(frame: &mut DataFrame, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output_path).map_err(|e| {
        error!("Failed to create {:?}: {}", output_path, e);
        SurveyError::Io(e)
    })?;
    CsvWriter::new(file).include_header(true).finish(frame)?;

    info!(
        "Wrote {} rows with {} columns to {:?}",
        frame.height(),
        frame.width(),
        output_path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::string_values;
    use std::io::Write;

    #[test]
    fn column_list_strips_quotes_and_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "'WORKERID',").unwrap();
        writeln!(file, "Progress").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  'Ethnicity simplified',  ").unwrap();
        write!(file, "\"Q1_1\"").unwrap();

        let columns = read_column_list(&path).unwrap();
        assert_eq!(
            columns,
            vec!["WORKERID", "Progress", "Ethnicity simplified", "Q1_1"]
        );
    }

    #[test]
    fn export_header_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(
            &path,
            "ResponseId,Progress,Q1\n\
             Response ID,Progress,How much do you support...\n\
             \"{\"\"ImportId\"\":\"\"_recordId\"\"}\",\"{\"\"ImportId\"\":\"\"progress\"\"}\",\"{\"\"ImportId\"\":\"\"QID1\"\"}\"\n\
             R_1,100,5\n\
             R_2,80,\n",
        )
        .unwrap();

        let frame = read_table(&path, 2).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(string_values(&frame, "ResponseId").unwrap(), vec!["R_1", "R_2"]);
        assert_eq!(string_values(&frame, "Q1").unwrap(), vec!["5", ""]);
        assert_eq!(frame.column("Progress").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn written_table_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");

        let mut frame = df!("name" => ["a"], "text" => ["with, comma"]).unwrap();
        write_table_csv(&mut frame, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "name,text\na,\"with, comma\"\n");

        let back = read_table(&path, 0).unwrap();
        assert_eq!(string_values(&back, "text").unwrap(), vec!["with, comma"]);
    }
}
