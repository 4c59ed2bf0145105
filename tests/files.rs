use std::io::Write;

use tempfile::NamedTempFile;

use pull_csv::{Config, Parser, Result};

fn temp_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn headers() -> Config {
    let mut config = Config::new();
    config.headers(true);
    config
}

#[test]
fn test_from_path() -> Result<()> {
    let file = temp_csv("name,surname\njohn,landis\nlucy,rose\n");

    let mut parser = Parser::from_path(file.path(), &headers())?;

    let row = parser.shift()?.unwrap();
    assert_eq!(row.get("name").unwrap(), "john");
    assert_eq!(row.get("surname").unwrap(), "landis");

    let row = parser.shift()?.unwrap();
    assert_eq!(row.get("name").unwrap(), "lucy");

    assert_eq!(parser.shift()?, None);

    Ok(())
}

#[test]
fn test_rewind_file() -> Result<()> {
    let file = temp_csv("a,b\r\n1,2\r\n3,4");

    let mut parser = Parser::from_path(file.path(), &Config::new())?;

    let first_pass = parser.read_all()?;
    assert_eq!(first_pass.len(), 3);

    parser.rewind()?;
    assert_eq!(parser.read_all()?, first_pass);

    Ok(())
}

#[test]
fn test_read_and_foreach() -> Result<()> {
    let file = temp_csv("x;y\n1;2\n3;4\n5;6\n");

    let mut config = headers();
    config.col_sep(";");

    let rows = pull_csv::read(file.path(), &config)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("y").unwrap(), "6");

    let mut sum = 0;

    pull_csv::foreach(file.path(), &config, |row| {
        sum += row.get("x").unwrap().to_str().unwrap().parse::<u32>().unwrap();
    })?;

    assert_eq!(sum, 9);

    Ok(())
}

#[test]
fn test_open() -> Result<()> {
    let file = temp_csv("a\nb\nc\n");

    let mut parser = pull_csv::open(file.path(), &Config::new())?;
    assert_eq!(parser.rows().count(), 3);

    parser.close();
    assert!(parser.is_closed());

    Ok(())
}

#[test]
fn test_with_open() -> Result<()> {
    let file = temp_csv("a\nb\nc\n");

    let first = pull_csv::with_open(file.path(), &Config::new(), |parser| {
        Ok(parser.shift()?.unwrap().get_index(0).unwrap().to_string())
    })?;

    assert_eq!(first, "a");

    // Errors raised by the closure are surfaced after closing
    let result = pull_csv::with_open(file.path(), &Config::new(), |parser| {
        parser.close();
        parser.rewind()
    });

    assert!(result.is_err());

    Ok(())
}

#[test]
fn test_malformed_file() -> Result<()> {
    let file = temp_csv("a,b\n1,\"2\n");

    let mut parser = Parser::from_path(file.path(), &Config::new())?;

    assert!(parser.shift()?.is_some());

    let err = parser.shift().unwrap_err();
    assert!(err.is_malformed_input());
    assert!(err.to_string().contains("row 2"));

    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.csv");

    let err = Parser::from_path(&path, &Config::new()).unwrap_err();
    assert!(err.is_io_error());

    assert!(pull_csv::read(&path, &Config::new()).is_err());
}
