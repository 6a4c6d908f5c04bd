//! ktdecode CLI - コマンドラインインターフェース
//!
//! テストベクタのバンドルを読み込み、デコードしたテストケースを表示します。

mod bundle;
mod render;

use anyhow::{bail, Context, Result};
use bundle::Bundle;
use clap::{Parser, Subcommand};
use ktdecode_core::{Assembler, CaseFilters, PredicateFilter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// ktdecode - KTest decoder
#[derive(Parser)]
#[command(name = "ktdecode")]
#[command(version = "0.1.0")]
#[command(about = "Decode symbolic execution test vectors into C/C++ test values", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: DecodeCommand,
}

#[derive(Subcommand)]
enum DecodeCommand {
    /// Decode every test vector of a bundle
    Decode {
        /// Path to the JSON bundle
        bundle: PathBuf,

        /// Print the decoded test cases as JSON
        #[arg(long)]
        json: bool,

        /// Keep only test cases that reached the target line or path
        #[arg(long)]
        path_flag: bool,

        /// Put every test case into the error suite
        #[arg(long)]
        assert: bool,

        /// Return value predicate (==, !=, <, >, <=, >=)
        #[arg(long, requires = "expected")]
        predicate: Option<String>,

        /// Expected return value for --predicate
        #[arg(long)]
        expected: Option<String>,

        /// Type used to compare the return value
        #[arg(long, default_value = "int32_t")]
        validation: String,

        /// Override the symbolic stdin capacity in bytes
        #[arg(long)]
        stdin_size: Option<usize>,

        /// Override the maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// List the records and enums of a bundle
    Types {
        /// Path to the JSON bundle
        bundle: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        DecodeCommand::Decode {
            bundle,
            json,
            path_flag,
            assert,
            predicate,
            expected,
            validation,
            stdin_size,
            max_depth,
        } => {
            let predicate = match (predicate, expected) {
                (Some(op), Some(expected)) => Some(PredicateFilter {
                    op,
                    expected,
                    validation,
                }),
                (None, Some(_)) => bail!("--expected needs --predicate"),
                _ => None,
            };
            let filters = CaseFilters {
                path_flag,
                for_assert: assert,
                predicate,
            };
            handle_decode(&bundle, json, &filters, stdin_size, max_depth)
        }
        DecodeCommand::Types { bundle } => handle_types(&bundle),
    }
}

/// ログ出力を初期化する（RUST_LOG があればそちらを優先）
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Decodeコマンドを処理する
fn handle_decode(
    path: &Path,
    json: bool,
    filters: &CaseFilters,
    stdin_size: Option<usize>,
    max_depth: Option<usize>,
) -> Result<()> {
    let bundle = Bundle::load(path)?;
    let mut config = bundle.config.clone().unwrap_or_default();
    if let Some(size) = stdin_size {
        config.symbolic_stdin_size = size;
    }
    if let Some(depth) = max_depth {
        config.max_depth = depth;
    }
    debug!(?config, vectors = bundle.vectors.len(), "loaded bundle");

    let assembler = Assembler::new(&bundle.types, config);
    let cases = assembler
        .assemble(&bundle.vectors, &bundle.method, filters)
        .with_context(|| format!("decode test vectors of {}", bundle.method.name))?;
    info!(
        method = %bundle.method.name,
        vectors = bundle.vectors.len(),
        cases = cases.len(),
        "decoded"
    );

    if json {
        let text = serde_json::to_string_pretty(&cases).context("serialize test cases")?;
        println!("{}", text);
        return Ok(());
    }

    if cases.is_empty() {
        println!("No test cases for {}", bundle.method.name);
        return Ok(());
    }
    for case in &cases {
        let text = render::render_case(case).context("render test case")?;
        print!("{}", text);
        println!();
    }
    Ok(())
}

/// Typesコマンドを処理する
fn handle_types(path: &Path) -> Result<()> {
    let bundle = Bundle::load(path)?;
    let text = render::render_types(&bundle.types).context("render types")?;
    if text.is_empty() {
        println!("No records or enums");
    } else {
        print!("{}", text);
    }
    Ok(())
}
