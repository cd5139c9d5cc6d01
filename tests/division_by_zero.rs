use std::error::Error;
use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::NamedTempFile;

fn source_file(src: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(src.as_bytes())?;
    Ok(file)
}

#[test]
fn quoshunt_of_by_zero_exits_with_the_runtime_error_code() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\nI HAS A X ITZ QUOSHUNT OF 7 AN 0\nKTHXBYE\n",
    )?;

    // Process exit statuses are a single byte on every platform this
    // binary targets, so the interpreter's 506 (500-series, interpreter)
    // diagnostic code arrives at the OS truncated mod 256.
    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .failure()
        .code((506 % 256) as i32)
        .stderr(contains("division by zero"));

    Ok(())
}

#[test]
fn a_missing_source_file_exits_with_the_file_open_error_code() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("ohai")?
        .arg("/no/such/file.ohai")
        .assert()
        .failure()
        .code(100);

    Ok(())
}
