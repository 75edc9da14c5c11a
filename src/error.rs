//! Runtime interpreter error implementation

use crate::consts::Word;
use crate::operand::OperandKind;

use std::io;
use thiserror::Error;

/// Errors raised while decoding a binary image, before any instruction
/// executes.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The first four bytes are not the `MASM` magic.
    #[error("invalid magic {0:#010x}, not a MASM image")]
    BadMagic(u32),
    /// The image was produced by a newer toolchain.
    #[error("unsupported image version {0}")]
    UnsupportedVersion(u16),
    /// A declared segment extends past the end of the file.
    #[error("truncated {segment} segment: expected {expected} bytes, found {found}")]
    TruncatedSegment {
        segment: &'static str,
        expected: usize,
        found: usize,
    },
    /// The entry point does not land inside the code segment.
    #[error("entry point {entry:#x} outside code segment of {code_size} bytes")]
    EntryPointOutOfRange { entry: u32, code_size: usize },
    /// A data record header or payload is inconsistent with the segment size.
    #[error("malformed data record at data segment offset {0}")]
    MalformedDataRecord(usize),
    /// A debug record is missing its terminator or address.
    #[error("malformed debug record at debug segment offset {0}")]
    MalformedDebugRecord(usize),
    /// A data record does not fit into the configured RAM.
    #[error("data record at address {addr} ({len} bytes) does not fit in {ram} bytes of RAM")]
    DataOutsideRam { addr: i64, len: usize, ram: usize },
    /// I/O and OS related errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reasons a single instruction can trap.
///
/// None of these are recovered inside the VM; they are attached to their
/// faulting location and propagate out of the dispatcher as
/// [`ExecutionError::Trap`]. Heap failures are deliberately absent: the
/// allocator reports through return codes and flags instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("unknown operand kind {0:#03x}")]
    UnknownOperandKind(u8),
    #[error("operand extends past the end of the code segment at {0:#x}")]
    OperandOverrun(u32),
    #[error("memory access out of bounds: address {addr:#x}, length {len}")]
    MemoryOutOfBounds { addr: i64, len: usize },
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("write to read-only {0} operand")]
    WriteToConstant(OperandKind),
    #[error("{0} operand has no memory address")]
    NoAddress(OperandKind),
    #[error("register index {0} out of range")]
    RegisterOutOfRange(i64),
    #[error("expected a register operand, got {0}")]
    ExpectedRegister(OperandKind),
    #[error("math operand uses unknown operator code {0}")]
    UnknownMathOperator(u8),
    #[error("jump target must be a code address, got {0} operand")]
    InvalidJumpTarget(OperandKind),
    #[error("jump target {0:#x} outside the code segment")]
    JumpOutOfCode(i64),
    #[error("IN destination must be addressable, got {0} operand")]
    InvalidInputDestination(OperandKind),
    #[error("unsupported {0} operand for OUT")]
    UnsupportedOut(OperandKind),
    #[error("invalid output port {0}")]
    InvalidPort(Word),
    #[error("negative length {0} for block memory operation")]
    NegativeLength(Word),
    #[error("unregistered MNI function called: {0}")]
    MissingForeign(String),
    #[error("argument index {index} out of range (argc = {argc})")]
    ArgIndexOutOfRange { index: Word, argc: usize },
    /// A foreign handler rejected its invocation.
    #[error("{name}: {message}")]
    Foreign { name: String, message: String },
    /// Console read or write failure while executing an I/O instruction.
    #[error("I/O failure: {0}")]
    Io(String),
}

impl RuntimeError {
    /// Shorthand for handler-originated failures.
    pub fn foreign(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Foreign {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Top-level execution error: an invalid image, a trap bound to its faulting
/// location, or an I/O failure outside the dispatch loop.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Image(#[from] ImageError),
    /// An instruction trapped. `opcode` is the raw byte so that even an
    /// unknown opcode reports faithfully.
    #[error("runtime error at bytecode offset {offset:#x} (opcode {opcode:#04x}): {reason}")]
    Trap {
        offset: u32,
        opcode: u8,
        #[source]
        reason: RuntimeError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExecutionError {
    /// The faulting location, if this error is a trap.
    pub const fn trap_location(&self) -> Option<(u32, u8)> {
        match self {
            Self::Trap { offset, opcode, .. } => Some((*offset, *opcode)),
            _ => None,
        }
    }

    /// The trap reason, if applicable.
    pub const fn trap_reason(&self) -> Option<&RuntimeError> {
        match self {
            Self::Trap { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
