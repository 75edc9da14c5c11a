//! VM parameters

/* REGISTER FILE */

/// Register count for checking constraints
pub const VM_REGISTER_COUNT: usize = 24;

/// Machine word as seen by the program: signed 32-bit.
pub type Word = i32;

/// Accumulator by convention.
pub const REG_RAX: usize = 0x00;

pub const REG_RBX: usize = 0x01;

pub const REG_RCX: usize = 0x02;

pub const REG_RDX: usize = 0x03;

pub const REG_RSI: usize = 0x04;

pub const REG_RDI: usize = 0x05;

/// Base pointer. Anchor of the current stack frame; frames are linked through
/// the saved value at `[RBP]`, with the return address at `[RBP+4]`.
pub const REG_RBP: usize = 0x06;

/// Stack pointer. The stack grows downward from the top of RAM.
pub const REG_RSP: usize = 0x07;

/// Display names for the 24 registers, indexed by register id.
pub const REGISTER_NAMES: [&str; VM_REGISTER_COUNT] = [
    "RAX", "RBX", "RCX", "RDX", "RSI", "RDI", "RBP", "RSP", "R0", "R1", "R2", "R3", "R4", "R5",
    "R6", "R7", "R8", "R9", "R10", "R11", "R12", "R13", "R14", "R15",
];

/* MEMORY GEOMETRY */

/// Length of a stack slot and of the widest integer load/store, in bytes.
pub const WORD_SIZE: usize = core::mem::size_of::<Word>();

/// Default VM RAM, in bytes.
pub const VM_DEFAULT_RAM: usize = 64 * 1024;

/// First byte of the heap region for a given RAM size. Low memory is left to
/// the data segment, the top quarter to the stack.
pub const fn heap_base(ram_size: usize) -> usize {
    ram_size / 2
}

/// Byte length of the heap region for a given RAM size.
pub const fn heap_size(ram_size: usize) -> usize {
    ram_size / 4
}

/* IMAGE FORMAT */

/// Image magic: the ASCII bytes `MASM` read as a little-endian `u32`.
pub const IMAGE_MAGIC: u32 = 0x4D53_414D;

/// Current (and maximum supported) image format version.
pub const IMAGE_VERSION: u16 = 2;

/// Byte length of the packed image header.
pub const IMAGE_HEADER_SIZE: usize = 22;

/// Environment variable overriding the debugger prompt.
pub const DEBUGGER_PS1_ENV: &str = "MasmDebuggerPS1";
