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
fn smoosh_concatenates_and_both_saem_compares_the_result() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\n\
         I HAS A A ITZ \"FOO\"\n\
         I HAS A B ITZ \"BAR\"\n\
         I HAS A C ITZ SMOOSH A AN B MKAY\n\
         VISIBLE C\n\
         VISIBLE BOTH SAEM C AN \"FOOBAR\"\n\
         VISIBLE DIFFRINT C AN \"BARFOO\"\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("FOOBAR\nWIN\nWIN\n");

    Ok(())
}

#[test]
fn a_non_empty_string_in_it_tests_truthy() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\n\
         \"anything\"\n\
         O RLY?\n\
         YA RLY\n\
         VISIBLE \"truthy\"\n\
         NO WAI\n\
         VISIBLE \"falsy\"\n\
         OIC\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("truthy\n");

    Ok(())
}

#[test]
fn both_saem_across_incompatible_types_is_a_runtime_error() -> Result<(), Box<dyn Error>> {
    let file = source_file("HAI 1.2\nBOTH SAEM 1 AN \"x\"\nKTHXBYE\n")?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .failure()
        .code((507 % 256) as i32)
        .stderr(contains("operand type error"));

    Ok(())
}
