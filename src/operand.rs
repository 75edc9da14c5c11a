//! Tagged operand model and its wire codec.
//!
//! Every operand travels as a 1-byte header — width nibble over kind nibble —
//! followed by a little-endian value of 1 to 6 bytes. A width nibble of `0`
//! means 4 bytes, except for math operands where it means 3. The bare header
//! byte `0x06` is the dedicated form of a math operand whose second term is a
//! register rather than an immediate.

use crate::consts::{Word, REGISTER_NAMES};
use crate::error::RuntimeError;

use core::fmt;

/// Kind tag of a decoded operand. Writability and addressability are
/// properties of the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperandKind {
    None = 0x00,
    Register = 0x01,
    Immediate = 0x02,
    LabelAddress = 0x03,
    DataAddress = 0x04,
    RegisterAsAddress = 0x05,
    MathOperator = 0x06,
}

impl OperandKind {
    /// Kinds that resolve to a RAM address.
    pub const fn is_address(&self) -> bool {
        matches!(
            self,
            Self::DataAddress | Self::RegisterAsAddress | Self::MathOperator
        )
    }

    /// Kinds a destination operand may use. The constant kinds are read-only.
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Register) || self.is_address()
    }

    fn try_from_byte(b: u8) -> Result<Self, RuntimeError> {
        Ok(match b {
            0x00 => Self::None,
            0x01 => Self::Register,
            0x02 => Self::Immediate,
            0x03 => Self::LabelAddress,
            0x04 => Self::DataAddress,
            0x05 => Self::RegisterAsAddress,
            0x06 => Self::MathOperator,
            _ => return Err(RuntimeError::UnknownOperandKind(b)),
        })
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Register => "register",
            Self::Immediate => "immediate",
            Self::LabelAddress => "label address",
            Self::DataAddress => "data address",
            Self::RegisterAsAddress => "register-as-address",
            Self::MathOperator => "math operator",
        };
        f.write_str(name)
    }
}

/// Operator connecting the base register of a math operand with its second
/// term. The `B` variants evaluate with the terms swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MathOp {
    Add = 0x01,
    Sub = 0x02,
    BSub = 0x03,
    Mul = 0x04,
    Div = 0x05,
    BDiv = 0x06,
    Lsl = 0x07,
    Lsr = 0x08,
    BLsl = 0x09,
    BLsr = 0x0a,
    And = 0x0b,
    Or = 0x0c,
    Xor = 0x0d,
}

impl MathOp {
    pub(crate) fn try_from_byte(b: u8) -> Result<Self, RuntimeError> {
        Ok(match b {
            0x01 => Self::Add,
            0x02 => Self::Sub,
            0x03 => Self::BSub,
            0x04 => Self::Mul,
            0x05 => Self::Div,
            0x06 => Self::BDiv,
            0x07 => Self::Lsl,
            0x08 => Self::Lsr,
            0x09 => Self::BLsl,
            0x0a => Self::BLsr,
            0x0b => Self::And,
            0x0c => Self::Or,
            0x0d => Self::Xor,
            _ => return Err(RuntimeError::UnknownMathOperator(b)),
        })
    }

    /// Two's-complement evaluation. Divisions trap on a zero divisor instead
    /// of wrapping.
    pub fn eval(self, a: Word, b: Word) -> Result<Word, RuntimeError> {
        let v = match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::BSub => b.wrapping_sub(a),
            Self::Mul => a.wrapping_mul(b),
            Self::Div => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            Self::BDiv => {
                if a == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                b.wrapping_div(a)
            }
            Self::Lsl => a.wrapping_shl(b as u32),
            Self::Lsr => a.wrapping_shr(b as u32),
            Self::BLsl => b.wrapping_shl(a as u32),
            Self::BLsr => b.wrapping_shr(a as u32),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
        };
        Ok(v)
    }

    const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub | Self::BSub => "-",
            Self::Mul => "*",
            Self::Div | Self::BDiv => "/",
            Self::Lsl | Self::BLsl => "<<",
            Self::Lsr | Self::BLsr => ">>",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
        }
    }

    const fn is_swapped(&self) -> bool {
        matches!(self, Self::BSub | Self::BDiv | Self::BLsl | Self::BLsr)
    }
}

/// One decoded instruction operand: a kind tag plus its raw wire value.
///
/// Values stay in `i64` while in flight because widths 5 and 6 carry more
/// than 32 bits; consumers truncate to [`Word`]. Widths below 4 arrive
/// zero-extended, width 4 is the full 32-bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    kind: OperandKind,
    value: i64,
    other_is_register: bool,
}

impl Operand {
    /// The argument-list terminator of a foreign call.
    pub const fn none() -> Self {
        Self {
            kind: OperandKind::None,
            value: 0,
            other_is_register: false,
        }
    }

    pub const fn register(index: usize) -> Self {
        Self {
            kind: OperandKind::Register,
            value: index as i64,
            other_is_register: false,
        }
    }

    /// An immediate constant. Stored as its zero-extended 32-bit pattern, the
    /// form the wire produces.
    pub const fn immediate(value: Word) -> Self {
        Self {
            kind: OperandKind::Immediate,
            value: value as u32 as i64,
            other_is_register: false,
        }
    }

    /// A code offset, as produced by the assembler for label references.
    pub const fn label(offset: u32) -> Self {
        Self {
            kind: OperandKind::LabelAddress,
            value: offset as i64,
            other_is_register: false,
        }
    }

    /// A literal RAM address.
    pub const fn data(address: u32) -> Self {
        Self {
            kind: OperandKind::DataAddress,
            value: address as i64,
            other_is_register: false,
        }
    }

    /// A RAM address taken from a register at evaluation time.
    pub const fn reg_address(index: usize) -> Self {
        Self {
            kind: OperandKind::RegisterAsAddress,
            value: index as i64,
            other_is_register: false,
        }
    }

    /// A math operand `$[reg op other_reg]`.
    pub const fn math_reg(reg: usize, op: MathOp, other: usize) -> Self {
        Self {
            kind: OperandKind::MathOperator,
            value: reg as i64 | (op as i64) << 8 | (other as i64) << 16,
            other_is_register: true,
        }
    }

    /// A math operand `$[reg op imm]`.
    pub const fn math_imm(reg: usize, op: MathOp, imm: u16) -> Self {
        Self {
            kind: OperandKind::MathOperator,
            value: reg as i64 | (op as i64) << 8 | (imm as i64) << 16,
            other_is_register: false,
        }
    }

    pub const fn kind(&self) -> OperandKind {
        self.kind
    }

    /// The raw wire value, zero-extended except for full 4-byte patterns.
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// The value truncated to a machine word.
    pub const fn word(&self) -> Word {
        self.value as Word
    }

    /// Whether the second term of a math operand is a register index.
    pub const fn other_is_register(&self) -> bool {
        self.other_is_register
    }

    /// The packed fields of a math operand: base register, operator code,
    /// second term.
    pub(crate) const fn math_parts(&self) -> (usize, u8, i64) {
        (
            (self.value & 0xff) as usize,
            ((self.value >> 8) & 0xff) as u8,
            (self.value >> 16) & 0xffff,
        )
    }

    /// Decode one operand at `offset` in `code`, returning it together with
    /// the offset just past it.
    pub fn decode(code: &[u8], offset: usize) -> Result<(Self, usize), RuntimeError> {
        let header = *code
            .get(offset)
            .ok_or(RuntimeError::OperandOverrun(offset as u32))?;
        let mut offset = offset + 1;

        let kind = OperandKind::try_from_byte(header & 0x0f)?;
        if kind == OperandKind::None {
            return Ok((Self::none(), offset));
        }

        let width = value_width(header);
        let bytes = code
            .get(offset..offset + width)
            .ok_or(RuntimeError::OperandOverrun(offset as u32))?;
        let mut acc = 0u64;
        for (i, b) in bytes.iter().enumerate() {
            acc |= (*b as u64) << (8 * i);
        }
        offset += width;

        Ok((
            Self {
                kind,
                value: acc as i64,
                other_is_register: header == OperandKind::MathOperator as u8,
            },
            offset,
        ))
    }

    /// Encode with the canonical width: 4 bytes for value-carrying kinds,
    /// none for `None`. A register-other math operand takes the implied
    /// 3-byte form; the immediate-other form needs 4 bytes to keep its full
    /// 16-bit second term.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self.kind {
            OperandKind::None => out.push(0x00),
            OperandKind::MathOperator if self.other_is_register => self.encode_with_width(3, out),
            OperandKind::MathOperator => self.encode_with_width(4, out),
            _ => {
                out.push(self.kind as u8);
                out.extend_from_slice(&(self.value as u64).to_le_bytes()[..4]);
            }
        }
    }

    /// Encode with an explicit value width of 1 to 6 bytes. The value is
    /// masked to the width; a register-other math operand always takes the
    /// bare `0x06` header with its implied 3-byte value.
    pub fn encode_with_width(&self, width: usize, out: &mut Vec<u8>) {
        debug_assert!((1..=6).contains(&width));
        match self.kind {
            OperandKind::None => out.push(0x00),
            OperandKind::MathOperator if self.other_is_register => {
                out.push(OperandKind::MathOperator as u8);
                out.extend_from_slice(&(self.value as u64).to_le_bytes()[..3]);
            }
            kind => {
                out.push(((width as u8) << 4) | kind as u8);
                out.extend_from_slice(&(self.value as u64).to_le_bytes()[..width]);
            }
        }
    }
}

/// Width in bytes of the value following an operand header.
const fn value_width(header: u8) -> usize {
    match (header >> 4) as usize {
        0 if header & 0x0f == OperandKind::MathOperator as u8 => 3,
        0 => 4,
        w => w,
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg_name = |i: i64| {
            REGISTER_NAMES
                .get(i as usize)
                .copied()
                .unwrap_or("R?")
                .to_string()
        };
        match self.kind {
            OperandKind::None => f.write_str("[NONE]"),
            OperandKind::Register => f.write_str(&reg_name(self.value)),
            OperandKind::RegisterAsAddress => write!(f, "${}", reg_name(self.value)),
            OperandKind::Immediate => write!(f, "{}", self.word()),
            OperandKind::LabelAddress => write!(f, "#{}", self.value),
            OperandKind::DataAddress => write!(f, "${}", self.value),
            OperandKind::MathOperator => {
                let (reg, op, other) = self.math_parts();
                let first = reg_name(reg as i64);
                let second = if self.other_is_register {
                    reg_name(other)
                } else {
                    other.to_string()
                };
                match MathOp::try_from_byte(op) {
                    Ok(op) if op.is_swapped() => {
                        write!(f, "$[{second}{}{first}]", op.symbol())
                    }
                    Ok(op) => write!(f, "$[{first}{}{second}]", op.symbol()),
                    Err(_) => write!(f, "$[{first}?{second}]"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_encoding_round_trips() {
        let ops = [
            Operand::none(),
            Operand::register(7),
            Operand::immediate(-1),
            Operand::immediate(Word::MAX),
            Operand::label(0x1234),
            Operand::data(256),
            Operand::reg_address(23),
            Operand::math_reg(6, MathOp::Sub, 8),
            Operand::math_imm(6, MathOp::Add, 4),
            Operand::math_imm(6, MathOp::Add, 0x1234),
        ];
        for op in ops {
            let mut wire = Vec::new();
            op.encode_into(&mut wire);
            let (decoded, consumed) = Operand::decode(&wire, 0).expect("decode");
            assert_eq!(decoded, op);
            assert_eq!(consumed, wire.len());
        }
    }

    #[test]
    fn width_nibble_zero_means_four_bytes() {
        // kind = immediate, width nibble 0, value 0xdeadbeef
        let wire = [0x02, 0xef, 0xbe, 0xad, 0xde];
        let (op, next) = Operand::decode(&wire, 0).expect("decode");
        assert_eq!(op.kind(), OperandKind::Immediate);
        assert_eq!(op.value(), 0xdead_beef);
        assert_eq!(op.word(), 0xdead_beefu32 as Word);
        assert_eq!(next, 5);
    }

    #[test]
    fn narrow_widths_zero_extend() {
        // 1-byte immediate 0xff is 255, not -1
        let wire = [0x12, 0xff];
        let (op, _) = Operand::decode(&wire, 0).expect("decode");
        assert_eq!(op.word(), 255);
    }

    #[test]
    fn header_six_sets_register_flag() {
        let op = Operand::math_reg(0, MathOp::Add, 1);
        let mut wire = Vec::new();
        op.encode_into(&mut wire);
        assert_eq!(wire[0], 0x06);

        let (decoded, _) = Operand::decode(&wire, 0).expect("decode");
        assert!(decoded.other_is_register());

        // explicit width nibble means the second term is an immediate
        let imm = Operand::math_imm(0, MathOp::Add, 1);
        let mut wire = Vec::new();
        imm.encode_into(&mut wire);
        assert_eq!(wire[0], 0x46);
        let (decoded, _) = Operand::decode(&wire, 0).expect("decode");
        assert!(!decoded.other_is_register());
    }

    #[test]
    fn wide_math_immediates_survive_the_canonical_encoding() {
        let op = Operand::math_imm(1, MathOp::Add, 0x1234);
        let mut wire = Vec::new();
        op.encode_into(&mut wire);
        let (decoded, _) = Operand::decode(&wire, 0).expect("decode");
        assert_eq!(decoded, op);
    }

    #[test]
    fn truncated_value_is_an_error() {
        let wire = [0x42, 0x01];
        assert!(matches!(
            Operand::decode(&wire, 0),
            Err(RuntimeError::OperandOverrun(_))
        ));
    }

    #[test]
    fn math_eval_operators() {
        use MathOp::*;
        assert_eq!(Add.eval(3, 4), Ok(7));
        assert_eq!(Sub.eval(3, 4), Ok(-1));
        assert_eq!(BSub.eval(3, 4), Ok(1));
        assert_eq!(Mul.eval(-3, 4), Ok(-12));
        assert_eq!(Div.eval(12, 4), Ok(3));
        assert_eq!(BDiv.eval(4, 12), Ok(3));
        assert_eq!(Lsl.eval(1, 4), Ok(16));
        assert_eq!(Lsr.eval(-16, 2), Ok(-4));
        assert_eq!(BLsl.eval(4, 1), Ok(16));
        assert_eq!(BLsr.eval(2, 16), Ok(4));
        assert_eq!(And.eval(0b1100, 0b1010), Ok(0b1000));
        assert_eq!(Or.eval(0b1100, 0b1010), Ok(0b1110));
        assert_eq!(Xor.eval(0b1100, 0b1010), Ok(0b0110));
        assert_eq!(Div.eval(1, 0), Err(RuntimeError::DivisionByZero));
        assert_eq!(BDiv.eval(0, 1), Err(RuntimeError::DivisionByZero));
    }
}
