//! Arithmetic, bitwise and comparison instructions.

use super::{Console, Interpreter};
use crate::consts::{Word, WORD_SIZE};
use crate::error::RuntimeError;

impl<C: Console> Interpreter<C> {
    /// `D <- f(D, S)` over full machine words.
    fn alu_binary(&mut self, f: fn(Word, Word) -> Word) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let src = self.next_operand()?;
        let a = self.operand_value(&dest, WORD_SIZE)?;
        let b = self.operand_value(&src, WORD_SIZE)?;
        self.write_operand(&dest, f(a, b), WORD_SIZE)
    }

    pub(crate) fn op_mov(&mut self) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let src = self.next_operand()?;
        let value = self.operand_value(&src, WORD_SIZE)?;
        self.write_operand(&dest, value, WORD_SIZE)
    }

    /// 1-byte copy; register destinations are zero-extended.
    pub(crate) fn op_movb(&mut self) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let src = self.next_operand()?;
        let value = self.operand_value(&src, 1)? & 0xff;
        self.write_operand(&dest, value, 1)
    }

    pub(crate) fn op_add(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(Word::wrapping_add)
    }

    pub(crate) fn op_sub(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(Word::wrapping_sub)
    }

    pub(crate) fn op_mul(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(Word::wrapping_mul)
    }

    pub(crate) fn op_div(&mut self) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let src = self.next_operand()?;
        let divisor = self.operand_value(&src, WORD_SIZE)?;
        if divisor == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        let value = self.operand_value(&dest, WORD_SIZE)?.wrapping_div(divisor);
        self.write_operand(&dest, value, WORD_SIZE)
    }

    pub(crate) fn op_inc(&mut self) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let value = self.operand_value(&dest, WORD_SIZE)?.wrapping_add(1);
        self.write_operand(&dest, value, WORD_SIZE)
    }

    pub(crate) fn op_and(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(|a, b| a & b)
    }

    pub(crate) fn op_or(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(|a, b| a | b)
    }

    pub(crate) fn op_xor(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(|a, b| a ^ b)
    }

    pub(crate) fn op_not(&mut self) -> Result<(), RuntimeError> {
        let dest = self.next_operand()?;
        let value = !self.operand_value(&dest, WORD_SIZE)?;
        self.write_operand(&dest, value, WORD_SIZE)
    }

    /// Shift counts are masked to the word width.
    pub(crate) fn op_shl(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(|a, n| a.wrapping_shl(n as u32))
    }

    /// Arithmetic right shift.
    pub(crate) fn op_shr(&mut self) -> Result<(), RuntimeError> {
        self.alu_binary(|a, n| a.wrapping_shr(n as u32))
    }

    pub(crate) fn op_cmp(&mut self) -> Result<(), RuntimeError> {
        let left = self.next_operand()?;
        let right = self.next_operand()?;
        let a = self.operand_value(&left, WORD_SIZE)?;
        let b = self.operand_value(&right, WORD_SIZE)?;
        self.flags.zero = a == b;
        self.flags.sign = a < b;
        Ok(())
    }
}
