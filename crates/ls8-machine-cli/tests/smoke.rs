#![cfg(not(target_arch = "wasm32"))]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn ls8() -> Command {
    Command::cargo_bin("ls8").expect("ls8 binary should be built for integration tests")
}

fn write_image(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("failed to write program image");
    path
}

const PRINT8: &str = "\
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";

const MULT: &str = "\
10000010 # LDI R0,9
00000000
00001001
10000010 # LDI R1,3
00000001
00000011
10100010 # MUL R0,R1
00000000
00000001
00000001 # HLT
";

#[test]
fn prints_value_and_exits_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "print8.ls8", PRINT8);

    ls8()
        .arg(&image)
        .assert()
        .success()
        .stdout("Value = 8\n");
}

#[test]
fn mult_prints_product() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "mult.ls8", MULT);

    ls8()
        .arg(&image)
        .assert()
        .success()
        .stdout("Multiplying operation result: 27\n");
}

#[test]
fn missing_argument_is_a_usage_error() {
    ls8()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_file_exits_with_two() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.ls8");

    ls8()
        .arg(&missing)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope.ls8 not found"));
}

#[test]
fn malformed_image_exits_with_three() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "bad.ls8", "10000010\n12\n");

    ls8()
        .arg(&image)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn non_utf8_image_exits_with_three() {
    let tmp = tempfile::tempdir().unwrap();
    let image = tmp.path().join("bin.ls8");
    std::fs::write(&image, [0x31, 0x30, 0x0a, 0xff, 0xfe, 0x0a]).unwrap();

    ls8()
        .arg(&image)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("is not UTF-8 text"));
}

#[test]
fn fault_exits_with_four() {
    let tmp = tempfile::tempdir().unwrap();
    // PUSH R0 with SP = 0 targets address 255, one past the default memory.
    let image = write_image(tmp.path(), "push.ls8", "01000101\n00000000\n00000001\n");

    ls8()
        .arg(&image)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("out of bounds"));
}

#[test]
fn stack_pointer_flag_enables_push() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(
        tmp.path(),
        "stack.ls8",
        "\
10000010 # LDI R0,42
00000000
00101010
01000101 # PUSH R0
00000000
01000110 # POP R1
00000001
01000111 # PRN R1
00000001
00000001 # HLT
",
    );

    ls8()
        .arg(&image)
        .args(["--stack-pointer", "0xF4"])
        .assert()
        .success()
        .stdout("Value = 42\n");
}

#[test]
fn unknown_opcode_halts_gracefully_with_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "unknown.ls8", "10000010\n00000000\n00000101\n11111111\n");

    ls8()
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unknown opcode"));
}

#[test]
fn trace_goes_to_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "print8.ls8", PRINT8);

    ls8()
        .arg(&image)
        .arg("--trace")
        .assert()
        .success()
        .stdout("Value = 8\n")
        .stderr(predicate::str::contains(
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 00",
        ));
}

#[test]
fn max_insts_stops_early() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "print8.ls8", PRINT8);

    ls8()
        .arg(&image)
        .args(["--max-insts", "1"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("stopped after 1 instructions"));
}

#[test]
fn invalid_memory_size_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let image = write_image(tmp.path(), "print8.ls8", PRINT8);

    ls8()
        .arg(&image)
        .args(["--memory-size", "1000"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid memory size 1000"));
}
