#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ls8_machine::program::load_program_file;
use ls8_machine::{Machine, MachineConfig, RunExit};

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Route core `tracing` output through the test harness so it shows up for failing tests only.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub struct FixtureRun {
    pub exit: RunExit,
    pub stdout: String,
    pub machine: Machine,
}

pub fn run_fixture(name: &str, cfg: MachineConfig) -> Result<FixtureRun> {
    init_logging();
    let program = load_program_file(fixture(name))?;
    let mut machine = Machine::new(cfg)?;
    machine
        .load(&program)
        .with_context(|| format!("failed to load fixture {name}"))?;

    let exit = machine.run();
    let stdout = String::from_utf8(machine.take_output()).context("output is not UTF-8")?;
    Ok(FixtureRun {
        exit,
        stdout,
        machine,
    })
}
