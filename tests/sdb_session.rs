//! 通过公开接口驱动完整的调试会话

use std::io::{Cursor, Write};

use sdb_sim::cpu::CpuState;
use sdb_sim::debugger::{Sdb, SdbError};
use sdb_sim::sim_env::{SimConfig, SimEnv};
use tempfile::NamedTempFile;

/// t0 从 5 倒数到 0，然后 a0 = 0 并 ebreak
const COUNTDOWN: [u32; 5] = [
    0x00500293, // addi t0, zero, 5
    0xfff28293, // addi t0, t0, -1
    0xfe029ee3, // bnez t0, -4
    0x00000513, // li   a0, 0
    0x00100073, // ebreak
];

fn image(words: &[u32]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for word in words {
        file.write_all(&word.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

fn session(words: &[u32]) -> (Sdb, NamedTempFile) {
    let file = image(words);
    let config = SimConfig::new()
        .with_memory_size(4096)
        .with_bin_path(file.path());
    let env = SimEnv::from_config(config).unwrap();
    (Sdb::new(env), file)
}

fn run(sdb: &mut Sdb, input: &str) -> (Result<(), SdbError>, String) {
    let mut out = Vec::new();
    let result = sdb.run(Cursor::new(input), &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn batch_mode_runs_to_good_trap() {
    let (mut sdb, _file) = session(&COUNTDOWN);
    sdb.set_batch_mode(true);

    let (result, out) = run(&mut sdb, "");
    result.unwrap();
    assert!(out.contains("HIT GOOD TRAP at pc = 0x80000010"), "{out}");
    assert!(!out.contains("(sdb)"));
    assert_eq!(sdb.env().instructions_executed, 13);
    assert!(!sdb.env().is_exit_status_bad());
}

#[test]
fn bad_trap_reports_exit_code() {
    let (mut sdb, _file) = session(&[
        0x00300513, // li a0, 3
        0x00100073, // ebreak
    ]);
    sdb.set_batch_mode(true);

    let (result, out) = run(&mut sdb, "");
    result.unwrap();
    assert!(out.contains("HIT BAD TRAP at pc = 0x80000004, a0 = 3"), "{out}");
    assert!(sdb.env().is_exit_status_bad());
}

#[test]
fn watchpoint_stops_continue() {
    let (mut sdb, _file) = session(&COUNTDOWN);

    let (result, out) = run(&mut sdb, "si\np $t0\nw $t0\nc\ninfo w\nq\n");
    result.unwrap();
    assert!(out.contains("5 (0x00000005)"), "{out}");
    assert!(out.contains("Watchpoint 0: $t0\n"), "{out}");
    assert!(
        out.contains("Watchpoint 0: $t0\n  old value = 0x00000005\n  new value = 0x00000004"),
        "{out}"
    );
    assert!(out.contains("Watchpoint 0: $t0 = 0x00000004 (4)"), "{out}");
    assert_eq!(sdb.env().cpu.state(), CpuState::Quit);
    assert!(!sdb.env().is_exit_status_bad());
}

#[test]
fn delete_watchpoint_then_finish() {
    let (mut sdb, _file) = session(&COUNTDOWN);

    let (result, out) = run(&mut sdb, "si\nw $t0\nd 0\ninfo w\nc\nc\n");
    result.unwrap();
    assert!(out.contains("Deleted watchpoint 0"), "{out}");
    assert!(out.contains("No watchpoints."), "{out}");
    assert!(out.contains("HIT GOOD TRAP"), "{out}");
    assert!(out.contains("The program has ended."), "{out}");
    // EOF 不覆盖已结束的状态
    assert_eq!(
        sdb.env().cpu.state(),
        CpuState::Ended {
            pc: 0x8000_0010,
            code: 0
        }
    );
}

#[test]
fn examine_memory_and_registers() {
    let (mut sdb, _file) = session(&COUNTDOWN);

    let (result, out) = run(&mut sdb, "x 2 0x80000000\nx 1 $pc + 8\nsi 3\ninfo r\n");
    result.unwrap();
    assert!(out.contains("0x80000000: 0x00500293\n0x80000004: 0xfff28293"), "{out}");
    assert!(out.contains("0x80000008: 0xfe029ee3"), "{out}");
    assert!(out.contains("pc"), "{out}");
    assert!(out.contains("0x80000004"), "{out}");
    assert!(out.contains("mstatus"), "{out}");
}

#[test]
fn examine_past_end_of_memory() {
    let (mut sdb, _file) = session(&COUNTDOWN);

    let (result, out) = run(&mut sdb, "x 2 0x80000ffc\n");
    result.unwrap();
    assert!(out.contains("0x80000ffc: 0x00000000"), "{out}");
    assert!(out.contains("Cannot access memory at address 0x80001000"), "{out}");
}

#[test]
fn bad_input_keeps_session_alive() {
    let (mut sdb, _file) = session(&COUNTDOWN);

    let (result, out) = run(&mut sdb, "frobnicate\np 1 +\np 4 / 0\nsi x\nq\n");
    result.unwrap();
    assert!(out.contains("Unknown command 'frobnicate'"), "{out}");
    assert!(out.contains("invalid expression"), "{out}");
    assert!(out.contains("Usage: si [N]"), "{out}");
    assert_eq!(sdb.env().cpu.state(), CpuState::Quit);
}

#[test]
fn invalid_instruction_aborts_session() {
    let (mut sdb, _file) = session(&[
        0x00100513, // li a0, 1
        0x00000000, // 非法指令
    ]);

    let (result, _out) = run(&mut sdb, "c\np 1\n");
    assert!(matches!(result, Err(SdbError::Exec(_))));
    assert_eq!(sdb.env().cpu.state(), CpuState::Aborted);
    assert!(sdb.env().is_exit_status_bad());
}

#[test]
fn builtin_image_without_arguments() {
    let env = SimEnv::from_config(SimConfig::new().with_memory_size(4096)).unwrap();
    let mut sdb = Sdb::new(env);
    sdb.set_batch_mode(true);

    let (result, out) = run(&mut sdb, "");
    result.unwrap();
    assert!(out.contains("HIT GOOD TRAP at pc = 0x8000000c"), "{out}");
}

#[test]
fn watchpoint_on_stored_word() {
    let (mut sdb, _file) = session(&[
        0x00000117, // auipc sp, 0
        0x02A00093, // li    ra, 42
        0x10112023, // sw    ra, 256(sp)
        0x00000013, // nop
        0x00100073, // ebreak
    ]);

    let (result, out) = run(&mut sdb, "w *0x80000100\nc\nsi\nc\n");
    result.unwrap();
    assert!(
        out.contains("Watchpoint 0: *0x80000100\n  old value = 0x00000000\n  new value = 0x0000002a"),
        "{out}"
    );
    assert_eq!(out.matches("new value").count(), 1, "{out}");
    assert!(out.contains("HIT GOOD TRAP at pc = 0x80000010"), "{out}");
}
