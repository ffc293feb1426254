use std::fmt;

use serde::Serialize;

use crate::val::Val;
use crate::vm::VmError;

/// One-byte operation codes. Operands follow the opcode byte, big-endian,
/// with the widths given by [`Opcode::definition`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Push `constants[u16]`.
    Constant = 0,
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    True,
    False,
    Null,
    Equal,
    NotEqual,
    /// `a < b` is emitted as `b > a`, so this is the only ordering opcode.
    GreaterThan,
    Minus,
    Bang,
    /// Absolute jump to the u16 target offset.
    Jump,
    /// Pop; jump to the u16 target when the value is falsy.
    JumpNotTruthy,
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
    GetFree,
    GetBuiltin,
    /// Push the closure of the executing frame.
    CurrentClosure,
    /// Collect the top u16 stack values into an array.
    Array,
    /// Collect the top u16 stack values (key, value, key, value, ..) into a hash.
    Hash,
    Index,
    /// Call the callee sitting below u8 arguments.
    Call,
    ReturnValue,
    Return,
    /// Wrap `constants[u16]` with u8 free values popped from the stack.
    Closure,
}

/// Name and operand layout of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Bytes taken by the operands, excluding the opcode byte.
    pub fn operand_len(&self) -> usize {
        self.operand_widths.iter().sum()
    }
}

const NONE: &[usize] = &[];
const U16: &[usize] = &[2];
const U8: &[usize] = &[1];
const U16_U8: &[usize] = &[2, 1];

impl Opcode {
    pub const ALL: [Opcode; 30] = [
        Opcode::Constant,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::True,
        Opcode::False,
        Opcode::Null,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::GreaterThan,
        Opcode::Minus,
        Opcode::Bang,
        Opcode::Jump,
        Opcode::JumpNotTruthy,
        Opcode::GetGlobal,
        Opcode::SetGlobal,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::GetFree,
        Opcode::GetBuiltin,
        Opcode::CurrentClosure,
        Opcode::Array,
        Opcode::Hash,
        Opcode::Index,
        Opcode::Call,
        Opcode::ReturnValue,
        Opcode::Return,
        Opcode::Closure,
    ];

    pub fn definition(self) -> Definition {
        let (name, operand_widths) = match self {
            Opcode::Constant => ("OpConstant", U16),
            Opcode::Pop => ("OpPop", NONE),
            Opcode::Add => ("OpAdd", NONE),
            Opcode::Sub => ("OpSub", NONE),
            Opcode::Mul => ("OpMul", NONE),
            Opcode::Div => ("OpDiv", NONE),
            Opcode::True => ("OpTrue", NONE),
            Opcode::False => ("OpFalse", NONE),
            Opcode::Null => ("OpNull", NONE),
            Opcode::Equal => ("OpEqual", NONE),
            Opcode::NotEqual => ("OpNotEqual", NONE),
            Opcode::GreaterThan => ("OpGreaterThan", NONE),
            Opcode::Minus => ("OpMinus", NONE),
            Opcode::Bang => ("OpBang", NONE),
            Opcode::Jump => ("OpJump", U16),
            Opcode::JumpNotTruthy => ("OpJumpNotTruthy", U16),
            Opcode::GetGlobal => ("OpGetGlobal", U16),
            Opcode::SetGlobal => ("OpSetGlobal", U16),
            Opcode::GetLocal => ("OpGetLocal", U8),
            Opcode::SetLocal => ("OpSetLocal", U8),
            Opcode::GetFree => ("OpGetFree", U8),
            Opcode::GetBuiltin => ("OpGetBuiltin", U8),
            Opcode::CurrentClosure => ("OpCurrentClosure", NONE),
            Opcode::Array => ("OpArray", U16),
            Opcode::Hash => ("OpHash", U16),
            Opcode::Index => ("OpIndex", NONE),
            Opcode::Call => ("OpCall", U8),
            Opcode::ReturnValue => ("OpReturnValue", NONE),
            Opcode::Return => ("OpReturn", NONE),
            Opcode::Closure => ("OpClosure", U16_U8),
        };
        Definition { name, operand_widths }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = VmError;

    #[inline]
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .get(byte as usize)
            .copied()
            .ok_or(VmError::UnknownOpcode(byte))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

pub fn lookup(byte: u8) -> Result<Definition, VmError> {
    Opcode::try_from(byte).map(Opcode::definition)
}

/// Encodes one instruction. Callers enforce operand limits first; an operand
/// count or value that does not fit the layout is a compiler bug.
pub fn make(op: Opcode, operands: &[usize]) -> Vec<u8> {
    let def = op.definition();
    debug_assert_eq!(
        operands.len(),
        def.operand_widths.len(),
        "{} takes {} operands",
        def.name,
        def.operand_widths.len()
    );
    let mut out = Vec::with_capacity(1 + def.operand_len());
    out.push(op as u8);
    for (i, width) in def.operand_widths.iter().enumerate() {
        let operand = operands.get(i).copied().unwrap_or(0);
        debug_assert!(
            operand < 1 << (8 * width),
            "operand {operand} of {} does not fit {width} byte(s)",
            def.name
        );
        match width {
            2 => out.extend_from_slice(&(operand as u16).to_be_bytes()),
            _ => out.push(operand as u8),
        }
    }
    out
}

/// Decodes the operands that follow an opcode. `ins` starts right after the
/// opcode byte. Returns the operands and the number of bytes read.
pub fn read_operands(def: &Definition, ins: &[u8]) -> (Vec<usize>, usize) {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;
    for width in def.operand_widths {
        let operand = match width {
            2 => read_u16(ins, offset).map(usize::from),
            _ => read_u8(ins, offset).map(usize::from),
        };
        operands.push(operand.unwrap_or(0));
        offset += width;
    }
    (operands, offset)
}

#[inline]
pub fn read_u16(ins: &[u8], at: usize) -> Option<u16> {
    match ins.get(at..at + 2) {
        Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
        _ => None,
    }
}

#[inline]
pub fn read_u8(ins: &[u8], at: usize) -> Option<u8> {
    ins.get(at).copied()
}

/// A flat, encoded instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(pub Vec<u8>);

/// One decoded instruction, as emitted by `monkey disasm --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisasmLine {
    pub offset: usize,
    pub opcode: &'static str,
    pub operands: Vec<usize>,
}

impl Instructions {
    /// Joins encoded instructions, mostly for building expected streams.
    pub fn concat(parts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self(parts.into_iter().flatten().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn disassemble(&self) -> Result<Vec<DisasmLine>, VmError> {
        let mut lines = Vec::new();
        let mut ip = 0;
        while ip < self.0.len() {
            let def = lookup(self.0[ip])?;
            if ip + 1 + def.operand_len() > self.0.len() {
                return Err(VmError::MalformedBytecode {
                    ip,
                    reason: "truncated operands",
                });
            }
            let (operands, read) = read_operands(&def, &self.0[ip + 1..]);
            lines.push(DisasmLine {
                offset: ip,
                opcode: def.name,
                operands,
            });
            ip += 1 + read;
        }
        Ok(lines)
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DisasmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {}", self.offset, self.opcode)?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Instructions {
    /// One line per instruction: `0000 OpConstant 1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.disassemble() {
            Ok(lines) => {
                for line in lines {
                    writeln!(f, "{line}")?;
                }
                Ok(())
            }
            Err(err) => writeln!(f, "ERROR: {err}"),
        }
    }
}

/// Compiler output: the main instruction stream plus its constant pool.
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Val>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstantListing {
    pub index: usize,
    pub kind: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<DisasmLine>>,
}

/// Serializable view of a whole program.
#[derive(Debug, Clone, Serialize)]
pub struct Disassembly {
    pub instructions: Vec<DisasmLine>,
    pub constants: Vec<ConstantListing>,
}

impl Bytecode {
    pub fn disassemble(&self) -> Result<Disassembly, VmError> {
        let mut constants = Vec::with_capacity(self.constants.len());
        for (index, constant) in self.constants.iter().enumerate() {
            let instructions = match constant {
                Val::Function(func) => Some(func.instructions.disassemble()?),
                _ => None,
            };
            constants.push(ConstantListing {
                index,
                kind: constant.type_name(),
                value: constant.to_string(),
                instructions,
            });
        }
        Ok(Disassembly {
            instructions: self.instructions.disassemble()?,
            constants,
        })
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== main ==")?;
        write!(f, "{}", self.instructions)?;
        for (index, constant) in self.constants.iter().enumerate() {
            match constant {
                Val::Function(func) => {
                    writeln!(f, "== constant {index}: {constant} ==")?;
                    write!(f, "{}", func.instructions)?;
                }
                Val::Str(s) => writeln!(f, "== constant {index}: {s:?} ==")?,
                other => writeln!(f, "== constant {index}: {other} ==")?,
            }
        }
        Ok(())
    }
}
