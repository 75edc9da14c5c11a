use crate::consts::DEBUGGER_PS1_ENV;

use std::collections::HashSet;
use std::env;

/// Session state of the interactive debugger.
///
/// The dispatcher consults it through a hook before every instruction and
/// once more after halt; when disabled the hook is a no-op. The command loop
/// itself lives on the interpreter, which owns the console.
#[derive(Debug, Clone)]
pub struct Debugger {
    enabled: bool,
    pub(crate) breakpoints: HashSet<u32>,
    /// Instructions left to run before prompting again.
    pub(crate) steps: u32,
    pub(crate) continuing: bool,
    pub(crate) prev_command: String,
    pub(crate) prompt: String,
    captured: Vec<u8>,
}

impl Debugger {
    /// A disabled debugger: every hook returns immediately.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            breakpoints: HashSet::new(),
            steps: 0,
            continuing: false,
            prev_command: String::new(),
            prompt: String::new(),
            captured: Vec::new(),
        }
    }

    /// An interactive debugger. The prompt comes from `MasmDebuggerPS1` when
    /// set.
    pub fn interactive() -> Self {
        Self {
            enabled: true,
            prompt: env::var(DEBUGGER_PS1_ENV).unwrap_or_else(|_| "> ".to_string()),
            ..Self::disabled()
        }
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle a breakpoint; returns true when the address was added.
    pub fn toggle_breakpoint(&mut self, addr: u32) -> bool {
        if self.breakpoints.remove(&addr) {
            false
        } else {
            self.breakpoints.insert(addr);
            true
        }
    }

    pub fn has_breakpoint(&self, addr: u32) -> bool {
        self.breakpoints.contains(&addr)
    }

    /// Append program output to the `stdout` replay buffer.
    pub(crate) fn capture(&mut self, bytes: &[u8]) {
        self.captured.extend_from_slice(bytes);
    }

    /// Program output collected so far, for the `stdout` command.
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::disabled()
    }
}
