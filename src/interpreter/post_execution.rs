//! Failure-path and shutdown reporting.

use super::{Console, Interpreter};
use crate::backtrace::Backtrace;
use crate::error::ExecutionError;

use tracing::warn;

impl<C: Console> Interpreter<C> {
    /// Render the trap report on stderr: foreign-call names, optional stack
    /// trace, and the register dump. The error itself propagates afterwards.
    pub(crate) fn report_trap(&mut self, err: &ExecutionError) {
        let backtrace = Backtrace::from_vm_error(self, err);
        let report = backtrace.to_string();
        let _ = self.console.write_err(report.as_bytes());
        self.foreign_stack.clear();
    }

    /// Report heap blocks still allocated at shutdown.
    pub(crate) fn report_heap_leaks(&mut self) {
        let live: Vec<_> = self.heap.live_blocks().collect();
        if live.is_empty() {
            return;
        }
        warn!(blocks = live.len(), "unfreed heap blocks at shutdown");
        let mut report = String::new();
        for (addr, size) in live {
            report.push_str(&format!("unfreed heap block at {addr:#x} ({size} bytes)\n"));
        }
        let _ = self.console.write_err(report.as_bytes());
    }
}
