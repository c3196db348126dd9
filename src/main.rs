//! sdb_sim 命令行入口
//!
//! 加载镜像后进入调试器；`-b` 时直接运行到结束。

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sdb_sim::debugger::Sdb;
use sdb_sim::sim_env::{DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE, SimConfig, SimEnv};

#[derive(Parser, Debug)]
#[command(version, about = "RV32IM simulator with a simple debugger")]
struct Args {
    /// Raw binary image, loaded at the memory base
    image: Option<PathBuf>,

    /// ELF executable (segments, entry point and function symbols)
    #[arg(short, long)]
    elf: Option<PathBuf>,

    /// Run the program to the end without the interactive prompt
    #[arg(short, long)]
    batch: bool,

    /// Write log output to FILE instead of stderr
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Trace function calls and returns (needs --elf for symbol names)
    #[arg(long)]
    ftrace: bool,

    /// Guest physical memory base address
    #[arg(long, value_parser = parse_u32, default_value_t = DEFAULT_MEM_BASE)]
    base: u32,

    /// Guest physical memory size in MiB
    #[arg(long, default_value_t = DEFAULT_MEM_SIZE >> 20)]
    mem_size: usize,
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{text}': {e}"))
}

fn init_logger(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logger(args.log.as_ref())?;

    let mem_size = args
        .mem_size
        .checked_mul(1 << 20)
        .context("memory size is too large")?;
    let mut config = SimConfig::new()
        .with_memory("pmem", args.base, mem_size)
        .with_ftrace(args.ftrace);
    if let Some(image) = args.image {
        config = config.with_bin_path(image);
    }
    if let Some(elf) = args.elf {
        config = config.with_elf_path(elf);
    }

    let env = SimEnv::from_config(config).context("failed to initialize the simulator")?;
    let mut sdb = Sdb::new(env);
    sdb.set_batch_mode(args.batch);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    sdb.run(stdin.lock(), &mut stdout)
        .context("simulation aborted")?;

    if sdb.env().is_exit_status_bad() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
