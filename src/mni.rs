//! MicroASM Native Interface: the foreign-call registry.
//!
//! Handlers are plain function pointers keyed by their `Module.name`. The
//! registry is a field of each VM instance, populated at construction and
//! injected into handlers, rather than process-wide mutable state.

use crate::consts::{Word, REG_RAX, WORD_SIZE};
use crate::error::RuntimeError;
use crate::interpreter::{Console, Interpreter};
use crate::operand::{Operand, OperandKind};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::warn;

/// A foreign handler: full access to the VM plus the decoded argument list.
pub type MniHandler<C> = fn(&mut Interpreter<C>, &[Operand]) -> Result<(), RuntimeError>;

/// Name to handler table for one VM instance.
#[derive(Debug)]
pub struct MniRegistry<C> {
    handlers: HashMap<String, MniHandler<C>>,
}

impl<C: Console> MniRegistry<C> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The default table every VM starts from.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Math", "sin", handlers::math_sin);
        registry.register("IO", "write", handlers::io_write);
        registry.register("Test", "recursiveCall", handlers::test_recursive_call);
        registry.register(
            "Test",
            "recursiveCallbreaker",
            handlers::test_recursive_call_breaker,
        );
        registry
    }

    /// Register `Module.name`. A duplicate registration keeps the first
    /// handler and warns.
    pub fn register(&mut self, module: &str, name: &str, handler: MniHandler<C>) {
        let full = format!("{module}.{name}");
        match self.handlers.entry(full) {
            Entry::Vacant(slot) => {
                slot.insert(handler);
            }
            Entry::Occupied(slot) => {
                warn!(function = %slot.key(), "MNI function already registered");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<MniHandler<C>> {
        self.handlers.get(name).copied()
    }
}

impl<C: Console> Default for MniRegistry<C> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

mod handlers {
    use super::*;

    /// `Math.sin src_reg, dest_reg`: integer truncation of `sin` over an
    /// integer argument.
    pub(super) fn math_sin<C: Console>(
        vm: &mut Interpreter<C>,
        args: &[Operand],
    ) -> Result<(), RuntimeError> {
        if args.len() != 2 {
            return Err(RuntimeError::foreign(
                "Math.sin",
                "requires 2 arguments (srcReg, destReg)",
            ));
        }
        let src = vm.register_index(&args[0])?;
        let dest = vm.register_index(&args[1])?;
        let value = (vm.register(src) as f64).sin() as Word;
        vm.set_register(dest, value);
        Ok(())
    }

    /// `IO.write port, addr`: print the NUL-terminated string at the
    /// resolved address.
    pub(super) fn io_write<C: Console>(
        vm: &mut Interpreter<C>,
        args: &[Operand],
    ) -> Result<(), RuntimeError> {
        if args.len() != 2 {
            return Err(RuntimeError::foreign(
                "IO.write",
                "requires 2 arguments (port, address)",
            ));
        }
        if !matches!(
            args[1].kind(),
            OperandKind::Register | OperandKind::DataAddress | OperandKind::Immediate
        ) {
            return Err(RuntimeError::foreign(
                "IO.write",
                "address argument must be a register or data address",
            ));
        }
        let port = vm.operand_value(&args[0], WORD_SIZE)?;
        let addr = vm.operand_value(&args[1], WORD_SIZE)?;
        let text = vm.memory().load_cstr(addr as i64)?;
        vm.write_port(port, text.as_bytes())
    }

    /// Exercises the VM stack from foreign code.
    pub(super) fn test_recursive_call<C: Console>(
        vm: &mut Interpreter<C>,
        _args: &[Operand],
    ) -> Result<(), RuntimeError> {
        vm.push(42)?;
        let value = vm.pop()?;
        vm.set_register(REG_RAX, value);
        Ok(())
    }

    /// Re-enters the registry until the countdown reaches zero, then fails so
    /// the diagnostic name stack has something to show.
    pub(super) fn test_recursive_call_breaker<C: Console>(
        vm: &mut Interpreter<C>,
        args: &[Operand],
    ) -> Result<(), RuntimeError> {
        if args.len() != 1 {
            return Err(RuntimeError::foreign(
                "Test.recursiveCallbreaker",
                "requires 1 argument (count)",
            ));
        }
        let count = vm.operand_value(&args[0], WORD_SIZE)?;
        if count <= 0 {
            return Err(RuntimeError::foreign(
                "Test.recursiveCallbreaker",
                format!("reached max recursion depth: {count}"),
            ));
        }
        for _ in 0..count {
            vm.call_foreign("Test.recursiveCall", &[])?;
        }
        vm.call_foreign(
            "Test.recursiveCallbreaker",
            &[Operand::immediate(count - 1)],
        )
    }
}
