use std::error::Error;
use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn source_file(src: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(src.as_bytes())?;
    Ok(file)
}

#[test]
fn prints_a_string_literal() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\nVISIBLE \"HELLO WORLD!\"\nKTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("HELLO WORLD!\n");

    Ok(())
}

#[test]
fn bang_suppresses_the_trailing_newline() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\nVISIBLE \"NO NEWLINE HERE\" !\nKTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("NO NEWLINE HERE");

    Ok(())
}
