use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use monkey_core::{
    ast::parse_program,
    stmt::Program,
    vm::{Bytecode, Vm, VmConfig, compile_program},
};
use tracing::debug;

mod repl;


static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "monkey_core=debug,monkey_cli=info";

#[derive(Debug, Parser)]
#[command(name = "monkey", author, version, about = "Bytecode compiler and VM for Monkey", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source file to compile and run; starts the REPL when omitted
    #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
    file: Option<PathBuf>,

    /// Print the value of the last expression statement after running FILE
    #[arg(long, requires = "file")]
    print: bool,

    #[command(flatten)]
    limits: Limits,
}

/// VM capacities, shared by every mode that executes code.
#[derive(Debug, Clone, Copy, Args)]
struct Limits {
    #[arg(long, global = true, default_value_t = VmConfig::default().stack_size)]
    stack_size: usize,
    #[arg(long, global = true, default_value_t = VmConfig::default().max_frames)]
    max_frames: usize,
    #[arg(long, global = true, default_value_t = VmConfig::default().globals_size)]
    globals_size: usize,
}

impl From<Limits> for VmConfig {
    fn from(limits: Limits) -> Self {
        VmConfig {
            stack_size: limits.stack_size,
            globals_size: limits.globals_size,
            max_frames: limits.max_frames,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse and compile a file without running it.
    Check {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
    /// Print the compiled instructions and constant pool of a file.
    Disasm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Emit JSON instead of the text listing
        #[arg(long)]
        json: bool,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);
    if p.components().any(|comp| matches!(comp, Component::ParentDir)) {
        anyhow::bail!("Parent directory components ('..') are not allowed in file paths.");
    }
    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    !(trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("0")
        || trimmed.eq_ignore_ascii_case("false")
        || trimmed.eq_ignore_ascii_case("off"))
}

/// `MONKEY_TRACE=1` uses `RUST_LOG` or the default filter; any other enabled
/// value is taken as the filter itself.
fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("1") || trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let Ok(raw) = std::env::var("MONKEY_TRACE") else {
        return;
    };
    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());
        let builder = fmt().with_writer(std::io::stderr);
        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };
        let _ = builder.try_init();
    });
}

fn parse_file(path: &Path) -> anyhow::Result<Program> {
    let src = std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    parse_program(&src).with_context(|| format!("parse error in {}", path.display()))
}

fn compile_file(path: &Path) -> anyhow::Result<Bytecode> {
    let program = parse_file(path)?;
    let bytecode = compile_program(&program).with_context(|| format!("compile error in {}", path.display()))?;
    debug!(
        file = %path.display(),
        bytes = bytecode.instructions.len(),
        constants = bytecode.constants.len(),
        "compiled"
    );
    Ok(bytecode)
}

fn run_file(path: &Path, config: VmConfig, print: bool) -> anyhow::Result<()> {
    let bytecode = compile_file(path)?;
    let mut vm = Vm::with_config(bytecode, config);
    vm.run().with_context(|| format!("runtime error in {}", path.display()))?;
    if print {
        println!("{}", vm.last_popped());
    }
    Ok(())
}

fn disasm_file(path: &Path, json: bool) -> anyhow::Result<()> {
    let bytecode = compile_file(path)?;
    if json {
        let listing = bytecode.disassemble()?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{bytecode}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs {
        command,
        file,
        print,
        limits,
    } = CliArgs::parse();
    let config = VmConfig::from(limits);

    match (command, file) {
        (Some(Commands::Check { file }), _) => {
            compile_file(&file)?;
            eprintln!("{}: ok", file.display());
            Ok(())
        }
        (Some(Commands::Disasm { file, json }), _) => disasm_file(&file, json),
        (None, Some(file)) => run_file(&file, config, print),
        (None, None) => repl::run(config),
    }
}
