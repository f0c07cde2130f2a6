#![allow(dead_code)]

use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tableflow_datafusion::fixtures::{FixtureTable, SAMPLE_ORDERS, write_orders_table};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_tfq")
}

fn command(args: &[&str]) -> Command {
    let mut cmd = Command::new(cli_bin());
    cmd.args(args)
        .env_remove("TFQ_BASE_DIR")
        .env_remove("RUST_LOG")
        .env("TFQ_LOG", "off");
    cmd
}

pub fn run_cli(args: &[&str]) -> io::Result<Output> {
    command(args).output()
}

pub fn run_cli_with_base(base: &Path, args: &[&str]) -> io::Result<Output> {
    command(args).env("TFQ_BASE_DIR", base).output()
}

pub fn assert_cli_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn assert_cli_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Create `root/metadata` with empty metadata files for `versions` and an
/// optional version hint.
pub fn write_table(root: &Path, versions: &[u64], hint: Option<&str>) -> TestResult<PathBuf> {
    let metadata = root.join("metadata");
    std::fs::create_dir_all(&metadata)?;
    for v in versions {
        std::fs::write(metadata.join(format!("v{v}.metadata.json")), "{}")?;
    }
    if let Some(hint) = hint {
        std::fs::write(metadata.join("version-hint.text"), hint)?;
    }
    Ok(metadata)
}

/// Write a real orders table at `root` with two data files in two commits.
pub fn write_orders_fixture(root: &Path) -> TestResult<FixtureTable> {
    let rt = tokio::runtime::Runtime::new()?;
    let table = rt.block_on(write_orders_table(
        root,
        &[&SAMPLE_ORDERS[..2], &SAMPLE_ORDERS[2..]],
    ))?;
    Ok(table)
}
