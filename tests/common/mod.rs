#![allow(dead_code)]

use masm_vm::prelude::*;

/// Incremental code-stream builder for test programs.
pub struct Prog {
    pub code: Vec<u8>,
}

impl Prog {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    pub fn op(&mut self, opcode: Opcode, operands: &[Operand]) -> &mut Self {
        self.code.push(opcode as u8);
        for operand in operands {
            operand.encode_into(&mut self.code);
        }
        self
    }

    /// A foreign call: name, arguments, and the `None` terminator.
    pub fn mni(&mut self, name: &str, operands: &[Operand]) -> &mut Self {
        self.code.push(Opcode::MNI as u8);
        self.code.extend_from_slice(name.as_bytes());
        self.code.push(0);
        for operand in operands {
            operand.encode_into(&mut self.code);
        }
        Operand::none().encode_into(&mut self.code);
        self
    }

    /// Current code offset; the target of a backward jump.
    pub fn here(&self) -> u32 {
        self.code.len() as u32
    }

    /// Emit a jump with a placeholder target, returning the patch handle for
    /// [`Prog::patch`].
    pub fn jump(&mut self, opcode: Opcode) -> usize {
        self.code.push(opcode as u8);
        let at = self.code.len();
        Operand::label(0).encode_into(&mut self.code);
        at
    }

    pub fn patch(&mut self, at: usize, target: u32) {
        self.code[at + 1..at + 5].copy_from_slice(&target.to_le_bytes());
    }

    pub fn image(&self) -> Image {
        Image::new(self.code.clone())
    }
}

/// Load and run to completion on a capturing console.
pub fn run(prog: &Prog) -> Interpreter<MemoryConsole> {
    run_image(&prog.image())
}

pub fn run_image(image: &Image) -> Interpreter<MemoryConsole> {
    let mut vm = Interpreter::capturing();
    vm.load(image).expect("image should load");
    vm.run().expect("program should run to completion");
    vm
}

/// Load and run a program expected to trap.
pub fn run_err(prog: &Prog) -> (Interpreter<MemoryConsole>, ExecutionError) {
    let mut vm = Interpreter::capturing();
    vm.load(&prog.image()).expect("image should load");
    let err = vm.run().expect_err("program should trap");
    (vm, err)
}
