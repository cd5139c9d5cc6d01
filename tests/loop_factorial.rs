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
fn uppin_yr_and_til_drive_an_iterative_factorial() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\n\
         I HAS A N ITZ 1\n\
         I HAS A I ITZ 1\n\
         IM IN YR LOOP UPPIN YR I TIL BOTH SAEM I AN 6\n\
         N R PRODUKT OF N AN I\n\
         IM OUTTA YR LOOP\n\
         VISIBLE N\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("120\n");

    Ok(())
}

#[test]
fn loop_variable_left_undeclared_is_implicitly_zero() -> Result<(), Box<dyn Error>> {
    // The literal input from spec §8 end-to-end scenario 3: `I` is used
    // by the loop's `UPPIN YR`/`TIL` clauses but never `I HAS A`'d.
    let file = source_file(
        "HAI 1.2\n\
         I HAS A N ITZ 5\n\
         I HAS A F ITZ 1\n\
         IM IN YR L UPPIN YR I TIL BOTH SAEM I AN N\n\
         F R PRODUKT OF F AN SUM OF I AN 1\n\
         IM OUTTA YR L\n\
         VISIBLE F\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("120\n");

    Ok(())
}

#[test]
fn gtfo_breaks_out_of_the_loop_early() -> Result<(), Box<dyn Error>> {
    let file = source_file(
        "HAI 1.2\n\
         I HAS A I ITZ 1\n\
         IM IN YR LOOP UPPIN YR I WILE WIN\n\
         BOTH SAEM I AN 4\n\
         O RLY?\n\
         YA RLY\n\
         GTFO\n\
         OIC\n\
         IM OUTTA YR LOOP\n\
         VISIBLE I\n\
         KTHXBYE\n",
    )?;

    Command::cargo_bin("ohai")?
        .arg(file.path())
        .assert()
        .success()
        .stdout("4\n");

    Ok(())
}
