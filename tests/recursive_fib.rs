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
fn how_iz_and_found_yr_support_recursive_calls() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\n\
         HOW IZ I FIB YR N\n\
         BOTH SAEM N AN 0\n\
         O RLY?\n\
         YA RLY\n\
         FOUND YR 0\n\
         NO WAI\n\
         BOTH SAEM N AN 1\n\
         O RLY?\n\
         YA RLY\n\
         FOUND YR 1\n\
         NO WAI\n\
         FOUND YR SUM OF I IZ FIB YR DIFF OF N AN 1 MKAY AN I IZ FIB YR DIFF OF N AN 2 MKAY\n\
         OIC\n\
         OIC\n\
         IF U SAY SO\n\
         I HAS A R ITZ I IZ FIB YR 10 MKAY\n\
         VISIBLE R\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("55\n");

    Ok(())
}
