//! Foreign-call dispatch.

use super::{Console, Interpreter};
use crate::error::RuntimeError;
use crate::mni::MniHandler;
use crate::operand::{Operand, OperandKind};

use tracing::trace;

impl<C: Console> Interpreter<C> {
    /// Register an additional `Module.name` handler on this instance.
    pub fn register_foreign(&mut self, module: &str, name: &str, handler: MniHandler<C>) {
        self.registry.register(module, name, handler);
    }

    /// Invoke a foreign handler by its full name, maintaining the diagnostic
    /// name stack. On failure the frames are left in place so the trap report
    /// can show them.
    pub fn call_foreign(&mut self, name: &str, args: &[Operand]) -> Result<(), RuntimeError> {
        let Some(handler) = self.registry.get(name) else {
            return Err(RuntimeError::MissingForeign(name.to_string()));
        };
        self.foreign_stack.push(name.to_string());
        handler(self, args)?;
        self.foreign_stack.pop();
        Ok(())
    }

    /// `MNI "Module.name" args... None`: the argument list ends at the first
    /// `None` operand.
    pub(crate) fn op_mni(&mut self) -> Result<(), RuntimeError> {
        let name = self.next_code_str()?;
        let mut args = Vec::new();
        loop {
            let op = self.next_operand()?;
            if op.kind() == OperandKind::None {
                break;
            }
            args.push(op);
        }
        trace!(function = %name, argc = args.len(), "foreign call");
        self.call_foreign(&name, &args)
    }
}
