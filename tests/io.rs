mod common;

use common::Prog;
use masm_vm::consts::*;
use masm_vm::prelude::*;

// seed scenario: hello world via the data segment
#[test]
fn hello_world_from_the_data_segment() {
    let mut prog = Prog::new();
    prog.op(Opcode::OUT, &[Operand::immediate(1), Operand::data(256)]);
    prog.op(Opcode::HLT, &[]);
    let mut image = prog.image();
    image.push_data(256, b"Hello, World!\n\0");

    let vm = common::run_image(&image);
    assert_eq!(vm.console().out_utf8(), "Hello, World!\n");
    assert!(vm.console().err().is_empty());
}

#[test]
fn out_renders_integers_for_value_kinds() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::MOV,
        &[Operand::register(REG_RAX), Operand::immediate(-42)],
    );
    prog.op(
        Opcode::OUT,
        &[Operand::immediate(1), Operand::register(REG_RAX)],
    );
    prog.op(Opcode::OUT, &[Operand::immediate(1), Operand::immediate(7)]);
    prog.op(Opcode::HLT, &[]);

    let vm = common::run(&prog);
    assert_eq!(vm.console().out_utf8(), "-427");
}

#[test]
fn out_renders_strings_for_address_kinds() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::MOV,
        &[Operand::register(REG_RSI), Operand::immediate(256)],
    );
    prog.op(
        Opcode::OUT,
        &[Operand::immediate(1), Operand::reg_address(REG_RSI)],
    );
    prog.op(Opcode::HLT, &[]);
    let mut image = prog.image();
    image.push_data(256, b"via register\0");

    let vm = common::run_image(&image);
    assert_eq!(vm.console().out_utf8(), "via register");
}

#[test]
fn port_two_reaches_stderr() {
    let mut prog = Prog::new();
    prog.op(Opcode::OUT, &[Operand::immediate(2), Operand::data(256)]);
    prog.op(Opcode::HLT, &[]);
    let mut image = prog.image();
    image.push_data(256, b"oops\0");

    let vm = common::run_image(&image);
    assert!(vm.console().out().is_empty());
    assert_eq!(vm.console().err_utf8(), "oops");
}

#[test]
fn invalid_ports_trap() {
    let mut prog = Prog::new();
    prog.op(Opcode::OUT, &[Operand::immediate(3), Operand::immediate(1)]);

    let (_, err) = common::run_err(&prog);
    assert!(matches!(
        err.trap_reason(),
        Some(RuntimeError::InvalidPort(3))
    ));
}

#[test]
fn cout_writes_the_low_byte_as_a_character() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::COUT,
        &[Operand::immediate(1), Operand::immediate(0x0141)],
    );
    prog.op(Opcode::HLT, &[]);

    let vm = common::run(&prog);
    assert_eq!(vm.console().out_utf8(), "A");
}

#[test]
fn outstr_writes_exactly_len_bytes() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::OUTSTR,
        &[
            Operand::immediate(1),
            Operand::immediate(256),
            Operand::immediate(3),
        ],
    );
    prog.op(Opcode::HLT, &[]);
    let mut image = prog.image();
    image.push_data(256, b"abcdef");

    let vm = common::run_image(&image);
    assert_eq!(vm.console().out_utf8(), "abc");
}

#[test]
fn outchar_writes_one_byte_from_ram() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::OUTCHAR,
        &[Operand::immediate(1), Operand::immediate(256)],
    );
    prog.op(Opcode::HLT, &[]);
    let mut image = prog.image();
    image.push_data(256, b"Z");

    let vm = common::run_image(&image);
    assert_eq!(vm.console().out_utf8(), "Z");
}

#[test]
fn in_stores_the_line_nul_terminated() {
    let mut prog = Prog::new();
    prog.op(Opcode::IN, &[Operand::data(512)]);
    prog.op(Opcode::OUT, &[Operand::immediate(1), Operand::data(512)]);
    prog.op(Opcode::HLT, &[]);

    let mut vm = Interpreter::capturing();
    vm.console_mut().push_line("typed input");
    vm.load(&prog.image()).expect("image should load");
    vm.run().expect("program should run");

    assert_eq!(vm.console().out_utf8(), "typed input");
    assert_eq!(vm.memory().load_byte(512 + 11).unwrap(), 0);
}

#[test]
fn in_rejects_value_destinations() {
    let mut prog = Prog::new();
    prog.op(Opcode::IN, &[Operand::register(REG_RAX)]);

    let (_, err) = common::run_err(&prog);
    assert!(matches!(
        err.trap_reason(),
        Some(RuntimeError::InvalidInputDestination(OperandKind::Register))
    ));
}

#[test]
fn argc_and_getarg_surface_program_arguments() {
    let mut prog = Prog::new();
    prog.op(Opcode::ARGC, &[Operand::register(REG_RCX)]);
    prog.op(
        Opcode::GETARG,
        &[Operand::register(REG_RAX), Operand::immediate(1)],
    );
    prog.op(
        Opcode::OUT,
        &[Operand::immediate(1), Operand::reg_address(REG_RAX)],
    );
    prog.op(
        Opcode::FREE,
        &[Operand::register(REG_RBX), Operand::register(REG_RAX)],
    );
    prog.op(Opcode::HLT, &[]);

    let mut vm = Interpreter::capturing().with_args(vec!["alpha".into(), "beta".into()]);
    vm.load(&prog.image()).expect("image should load");
    vm.run().expect("program should run");

    assert_eq!(vm.register(REG_RCX), 2);
    assert_eq!(vm.console().out_utf8(), "beta");
    assert_eq!(vm.register(REG_RBX), 0);
}

#[test]
fn getarg_out_of_range_traps() {
    let mut prog = Prog::new();
    prog.op(
        Opcode::GETARG,
        &[Operand::register(REG_RAX), Operand::immediate(0)],
    );

    let (_, err) = common::run_err(&prog);
    assert!(matches!(
        err.trap_reason(),
        Some(RuntimeError::ArgIndexOutOfRange { index: 0, argc: 0 })
    ));
}
