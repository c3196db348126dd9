//! 简易调试器（sdb）
//!
//! 逐行读取命令，按命令表分派。输入是任意 `BufRead`，输出是任意 `Write`，
//! 因此可以交互使用，也可以用脚本驱动。

pub mod expr;
pub mod watch;

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::cpu::{CpuState, ExecError};
use crate::memory::Memory;
use crate::sim_env::{ExecOutcome, SimEnv};
use expr::ExprError;
use watch::WatchError;

const PROMPT: &str = "(sdb) ";

/// 命令处理后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdFlow {
    Continue,
    Quit,
}

/// 结束调试会话的错误
#[derive(Debug, Error)]
pub enum SdbError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

type Handler = fn(&mut Sdb, Option<&str>, &mut dyn Write) -> Result<CmdFlow, SdbError>;

struct Command {
    name: &'static str,
    description: &'static str,
    handler: Handler,
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        description: "Display information about all supported commands",
        handler: Sdb::cmd_help,
    },
    Command {
        name: "c",
        description: "Continue the execution of the program",
        handler: Sdb::cmd_c,
    },
    Command {
        name: "q",
        description: "Exit the debugger",
        handler: Sdb::cmd_q,
    },
    Command {
        name: "si",
        description: "Step N instructions (default 1): si [N]",
        handler: Sdb::cmd_si,
    },
    Command {
        name: "info",
        description: "Print registers (info r) or watchpoints (info w)",
        handler: Sdb::cmd_info,
    },
    Command {
        name: "x",
        description: "Dump N words of memory starting at ADDR: x N ADDR",
        handler: Sdb::cmd_x,
    },
    Command {
        name: "p",
        description: "Evaluate an expression: p EXPR",
        handler: Sdb::cmd_p,
    },
    Command {
        name: "w",
        description: "Stop when the value of EXPR changes: w EXPR",
        handler: Sdb::cmd_w,
    },
    Command {
        name: "d",
        description: "Delete watchpoint N: d N",
        handler: Sdb::cmd_d,
    },
];

/// 调试器前端
pub struct Sdb {
    env: SimEnv,
    batch: bool,
}

impl Sdb {
    pub fn new(env: SimEnv) -> Self {
        Self { env, batch: false }
    }

    /// 批处理模式下直接执行 `c` 然后返回
    pub fn set_batch_mode(&mut self, batch: bool) {
        self.batch = batch;
    }

    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// 主循环
    ///
    /// 读到 `q` 或输入结束时正常返回；致命错误会使 CPU 进入 `Aborted` 并返回错误。
    pub fn run<R: BufRead>(&mut self, mut input: R, out: &mut dyn Write) -> Result<(), SdbError> {
        if self.batch {
            return self.execute_line("c", out).map(|_| ()).inspect_err(|_| self.abort());
        }

        let mut line = String::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                self.quit();
                return Ok(());
            }

            match self.execute_line(&line, out) {
                Ok(CmdFlow::Continue) => {}
                Ok(CmdFlow::Quit) => return Ok(()),
                Err(e) => {
                    self.abort();
                    return Err(e);
                }
            }
        }
    }

    /// 执行一行命令
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(CmdFlow::Continue);
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        match COMMANDS.iter().find(|c| c.name == name) {
            Some(cmd) => (cmd.handler)(self, args, out),
            None => {
                writeln!(out, "Unknown command '{name}'")?;
                Ok(CmdFlow::Continue)
            }
        }
    }

    /// 程序尚未结束时标记为用户退出
    fn quit(&mut self) {
        if !matches!(
            self.env.cpu.state(),
            CpuState::Ended { .. } | CpuState::Aborted
        ) {
            self.env.cpu.set_state(CpuState::Quit);
        }
    }

    fn abort(&mut self) {
        self.env.cpu.set_state(CpuState::Aborted);
    }

    fn exec(&mut self, n: u64, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        match self.env.exec(n)? {
            ExecOutcome::Paused => {}
            ExecOutcome::Watch(hits) => {
                for hit in hits {
                    writeln!(
                        out,
                        "Watchpoint {}: {}\n  old value = 0x{:08x}\n  new value = 0x{:08x}",
                        hit.id, hit.expr, hit.old, hit.new
                    )?;
                }
            }
            ExecOutcome::Ended { pc, code } => {
                if code == 0 {
                    writeln!(out, "HIT GOOD TRAP at pc = 0x{pc:08x}")?;
                } else {
                    writeln!(out, "HIT BAD TRAP at pc = 0x{pc:08x}, a0 = {code}")?;
                }
            }
            ExecOutcome::Finished => {
                writeln!(
                    out,
                    "The program has ended. To restart it, exit the debugger and run again."
                )?;
            }
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_help(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        match args {
            None => {
                for cmd in COMMANDS {
                    writeln!(out, "{} - {}", cmd.name, cmd.description)?;
                }
            }
            Some(name) => match COMMANDS.iter().find(|c| c.name == name) {
                Some(cmd) => writeln!(out, "{} - {}", cmd.name, cmd.description)?,
                None => writeln!(out, "Unknown command '{name}'")?,
            },
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_c(&mut self, _args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        self.exec(u64::MAX, out)
    }

    fn cmd_q(&mut self, _args: Option<&str>, _out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        self.quit();
        Ok(CmdFlow::Quit)
    }

    fn cmd_si(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let n = match args.map(str::parse::<u64>) {
            None => 1,
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                writeln!(out, "Usage: si [N]")?;
                return Ok(CmdFlow::Continue);
            }
        };
        self.exec(n, out)
    }

    fn cmd_info(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        match args {
            Some("r") => self.env.cpu.dump_regs(out)?,
            Some("w") => {
                if self.env.watchpoints.is_empty() {
                    writeln!(out, "No watchpoints.")?;
                }
                for wp in self.env.watchpoints.iter() {
                    writeln!(
                        out,
                        "Watchpoint {}: {} = 0x{:08x} ({})",
                        wp.id, wp.expr, wp.value, wp.value
                    )?;
                }
            }
            _ => writeln!(out, "Usage: info r|w")?,
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_x(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let parsed = args
            .and_then(|a| a.split_once(char::is_whitespace))
            .and_then(|(n, addr)| Some((n.parse::<u32>().ok()?, addr.trim())));
        let Some((count, addr)) = parsed else {
            writeln!(out, "Usage: x N ADDR")?;
            return Ok(CmdFlow::Continue);
        };

        let base = match parse_hex(addr) {
            Some(base) => base,
            None => match self.env.evaluate(addr) {
                Ok(base) => base,
                Err(e) => {
                    report_expr_error(out, &e)?;
                    return Ok(CmdFlow::Continue);
                }
            },
        };

        for i in 0..count {
            let addr = base.wrapping_add(i.wrapping_mul(4));
            match self.env.memory.load32(addr) {
                Ok(word) => writeln!(out, "0x{addr:08x}: 0x{word:08x}")?,
                Err(e) => {
                    writeln!(out, "Cannot access memory at address 0x{addr:08x}: {e}")?;
                    break;
                }
            }
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_p(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let Some(text) = args else {
            writeln!(out, "Usage: p EXPR")?;
            return Ok(CmdFlow::Continue);
        };
        match self.env.evaluate(text) {
            Ok(value) => writeln!(out, "{value} (0x{value:08x})")?,
            Err(e) => report_expr_error(out, &e)?,
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_w(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let Some(text) = args else {
            writeln!(out, "Usage: w EXPR")?;
            return Ok(CmdFlow::Continue);
        };
        let value = match self.env.evaluate(text) {
            Ok(value) => value,
            Err(e) => {
                report_expr_error(out, &e)?;
                return Ok(CmdFlow::Continue);
            }
        };

        match self.env.watchpoints.allocate(text, value) {
            Ok(id) => writeln!(out, "Watchpoint {id}: {text}")?,
            Err(e) if !e.is_fatal() => writeln!(out, "{e}")?,
            Err(e) => return Err(e.into()),
        }
        Ok(CmdFlow::Continue)
    }

    fn cmd_d(&mut self, args: Option<&str>, out: &mut dyn Write) -> Result<CmdFlow, SdbError> {
        let Some(id) = args.and_then(|a| a.parse::<usize>().ok()) else {
            writeln!(out, "Usage: d N")?;
            return Ok(CmdFlow::Continue);
        };
        self.env.watchpoints.release(id)?;
        writeln!(out, "Deleted watchpoint {id}")?;
        Ok(CmdFlow::Continue)
    }
}

/// 十六进制地址，`0x` 前缀可省略
fn parse_hex(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn report_expr_error(out: &mut dyn Write, e: &ExprError) -> io::Result<()> {
    match e {
        ExprError::Memory(_) => writeln!(out, "{e}"),
        _ => writeln!(out, "invalid expression: {e}"),
    }
}
