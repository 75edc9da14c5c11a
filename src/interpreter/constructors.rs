//! Exposed constructors API for the [`Interpreter`]

use super::{Console, Flags, Interpreter, MemoryConsole, StdConsole};
use crate::consts::{heap_base, heap_size, Word, REG_RSP, VM_DEFAULT_RAM, VM_REGISTER_COUNT};
use crate::heap::Heap;
use crate::memory::Memory;
use crate::mni::MniRegistry;
use crate::state::Debugger;

use std::collections::BTreeMap;

impl<C: Console> Interpreter<C> {
    /// Create a VM with the default RAM size on the given console.
    pub fn with_console(console: C) -> Self {
        Self::with_console_and_ram(console, VM_DEFAULT_RAM)
    }

    /// Create a VM with an explicit RAM size. RSP starts at the top of RAM,
    /// RBP at zero, and the heap region is carved per the default geometry.
    pub fn with_console_and_ram(console: C, ram_size: usize) -> Self {
        let mut registers = [0; VM_REGISTER_COUNT];
        registers[REG_RSP] = ram_size as Word;

        Self {
            registers,
            memory: Memory::new(ram_size),
            heap: Heap::new(heap_base(ram_size) as Word, heap_size(ram_size) as Word),
            flags: Flags::default(),
            ip: 0,
            code: Vec::new(),
            labels: BTreeMap::new(),
            args: Vec::new(),
            registry: MniRegistry::with_builtins(),
            foreign_stack: Vec::new(),
            debugger: Debugger::disabled(),
            stack_traces: false,
            console,
        }
    }

    /// Program arguments exposed through ARGC/GETARG.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Engage the interactive debugger.
    pub fn with_debugger(mut self) -> Self {
        self.debugger = Debugger::interactive();
        self
    }

    /// Include a frame-walked stack trace in trap reports.
    pub fn with_stack_traces(mut self) -> Self {
        self.stack_traces = true;
        self
    }
}

impl Interpreter<StdConsole> {
    /// A VM on the process's own stdio streams.
    pub fn stdio() -> Self {
        Self::with_console(StdConsole)
    }
}

impl Interpreter<MemoryConsole> {
    /// A VM that captures all output in memory. The usual harness for tests.
    pub fn capturing() -> Self {
        Self::with_console(MemoryConsole::default())
    }
}
