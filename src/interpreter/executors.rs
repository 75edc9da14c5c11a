//! The fetch/decode/dispatch loop.

use super::{Console, Interpreter};
use crate::error::{ExecutionError, RuntimeError};
use crate::opcode::Opcode;
use crate::operand::Operand;
use crate::state::ExecuteState;

use tracing::trace;

impl<C: Console> Interpreter<C> {
    /// Run until a `HLT`, the instruction pointer leaving the code segment,
    /// or a fatal trap. Traps are reported before they propagate; unfreed
    /// heap blocks are reported on every exit path.
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        if self.debugger.enabled() {
            self.debugger_welcome()?;
        }

        while (self.ip as usize) < self.code.len() {
            self.debugger_hook()?;
            match self.step() {
                Ok(state) if state.should_continue() => (),
                Ok(_) => break,
                Err(err) => {
                    self.report_trap(&err);
                    self.report_heap_leaks();
                    return Err(err);
                }
            }
        }

        self.report_heap_leaks();
        if self.debugger.enabled() {
            self.debugger_finished()?;
        }
        Ok(())
    }

    /// Execute the single instruction at the current instruction pointer.
    pub fn step(&mut self) -> Result<ExecuteState, ExecutionError> {
        let offset = self.ip;
        if offset as usize >= self.code.len() {
            return Ok(ExecuteState::Halt);
        }
        let byte = self.code[offset as usize];
        self.ip += 1;

        let located = |reason| ExecutionError::Trap {
            offset,
            opcode: byte,
            reason,
        };
        let opcode = Opcode::try_from(byte).map_err(located)?;
        trace!(offset, opcode = %opcode, "execute");
        self.instruction(opcode).map_err(located)
    }

    fn instruction(&mut self, opcode: Opcode) -> Result<ExecuteState, RuntimeError> {
        match opcode {
            Opcode::MOV => self.op_mov()?,
            Opcode::MOVB => self.op_movb()?,
            Opcode::ADD => self.op_add()?,
            Opcode::SUB => self.op_sub()?,
            Opcode::MUL => self.op_mul()?,
            Opcode::DIV => self.op_div()?,
            Opcode::INC => self.op_inc()?,
            Opcode::AND => self.op_and()?,
            Opcode::OR => self.op_or()?,
            Opcode::XOR => self.op_xor()?,
            Opcode::NOT => self.op_not()?,
            Opcode::SHL => self.op_shl()?,
            Opcode::SHR => self.op_shr()?,
            Opcode::CMP => self.op_cmp()?,
            Opcode::JMP => self.op_jmp()?,
            Opcode::JE
            | Opcode::JNE
            | Opcode::JL
            | Opcode::JG
            | Opcode::JLE
            | Opcode::JGE => self.op_jump_conditional(opcode)?,
            Opcode::CALL => self.op_call()?,
            Opcode::RET => self.op_ret()?,
            Opcode::PUSH => self.op_push()?,
            Opcode::POP => self.op_pop()?,
            Opcode::ENTER => self.op_enter()?,
            Opcode::LEAVE => self.op_leave()?,
            Opcode::MOVADDR => self.op_movaddr()?,
            Opcode::MOVTO => self.op_movto()?,
            Opcode::COPY => self.op_copy()?,
            Opcode::FILL => self.op_fill()?,
            Opcode::CMPMEM => self.op_cmp_mem()?,
            Opcode::OUT => self.op_out()?,
            Opcode::COUT => self.op_cout()?,
            Opcode::OUTSTR => self.op_outstr()?,
            Opcode::OUTCHAR => self.op_outchar()?,
            Opcode::IN => self.op_in()?,
            Opcode::ARGC => self.op_argc()?,
            Opcode::GETARG => self.op_getarg()?,
            Opcode::MALLOC => self.op_malloc()?,
            Opcode::FREE => self.op_free()?,
            Opcode::MNI => self.op_mni()?,
            Opcode::HLT => return Ok(ExecuteState::Halt),
        }
        Ok(ExecuteState::Proceed)
    }

    /// Decode the operand at the instruction pointer and advance past it.
    pub(crate) fn next_operand(&mut self) -> Result<Operand, RuntimeError> {
        let (operand, next) = Operand::decode(&self.code, self.ip as usize)?;
        trace!(operand = %operand, "operand");
        self.ip = next as u32;
        Ok(operand)
    }

    /// Read the NUL-terminated string at the instruction pointer and advance
    /// past its terminator.
    pub(crate) fn next_code_str(&mut self) -> Result<String, RuntimeError> {
        let start = self.ip as usize;
        let nul = self.code[start..]
            .iter()
            .position(|b| *b == 0)
            .ok_or(RuntimeError::OperandOverrun(self.ip))?;
        let text = String::from_utf8_lossy(&self.code[start..start + nul]).into_owned();
        self.ip = (start + nul + 1) as u32;
        Ok(text)
    }
}
