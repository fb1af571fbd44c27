use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn symbol(self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
            ArithOp::Rem => '%',
        }
    }
}

/// A decoded NORMAL-mode instruction.
///
/// The alphabet is fixed; every character decodes to something, with
/// unknown characters becoming [`Opcode::Nop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// `<` `^` `>` `v`
    Go(Vector2),
    /// `←` `↑` `→` `↓`: pop, take `then` if non-zero, `otherwise` if zero.
    Branch { then: Vector2, otherwise: Vector2 },
    /// `?`
    Random,
    /// `#`
    Skip,
    /// `+ - * / %`
    Arith(ArithOp),
    /// `!`
    Not,
    /// `` ` ``
    Greater,
    /// `"`
    ToggleMode,
    /// `.`
    PrintInt,
    /// `,`
    PrintChar,
    /// `&`
    ReadInt,
    /// `~`
    ReadChar,
    /// `:`
    Duplicate,
    /// `\`
    Swap,
    /// `$`
    Discard,
    /// `p`
    Place,
    /// `g`
    Grab,
    /// `@`
    Halt,
    /// `0`-`9`
    Digit(u8),
    Nop,
}

impl Opcode {
    pub fn decode(c: char) -> Opcode {
        match c {
            '<' => Opcode::Go(Vector2::LEFT),
            '^' => Opcode::Go(Vector2::UP),
            '>' => Opcode::Go(Vector2::RIGHT),
            'v' => Opcode::Go(Vector2::DOWN),
            '←' => Opcode::Branch {
                then: Vector2::LEFT,
                otherwise: Vector2::RIGHT,
            },
            '↑' => Opcode::Branch {
                then: Vector2::UP,
                otherwise: Vector2::DOWN,
            },
            '→' => Opcode::Branch {
                then: Vector2::RIGHT,
                otherwise: Vector2::LEFT,
            },
            '↓' => Opcode::Branch {
                then: Vector2::DOWN,
                otherwise: Vector2::UP,
            },
            '?' => Opcode::Random,
            '#' => Opcode::Skip,
            '+' => Opcode::Arith(ArithOp::Add),
            '-' => Opcode::Arith(ArithOp::Sub),
            '*' => Opcode::Arith(ArithOp::Mul),
            '/' => Opcode::Arith(ArithOp::Div),
            '%' => Opcode::Arith(ArithOp::Rem),
            '!' => Opcode::Not,
            '`' => Opcode::Greater,
            '"' => Opcode::ToggleMode,
            '.' => Opcode::PrintInt,
            ',' => Opcode::PrintChar,
            '&' => Opcode::ReadInt,
            '~' => Opcode::ReadChar,
            ':' => Opcode::Duplicate,
            '\\' => Opcode::Swap,
            '$' => Opcode::Discard,
            'p' => Opcode::Place,
            'g' => Opcode::Grab,
            '@' => Opcode::Halt,
            '0'..='9' => Opcode::Digit(c as u8 - b'0'),
            _ => Opcode::Nop,
        }
    }
}

/// Returns true if `c` means something in NORMAL mode. The debug display
/// marks cells that are not.
pub fn is_instruction(c: char) -> bool {
    Opcode::decode(c) != Opcode::Nop
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_decode_to_values() {
        assert_eq!(Opcode::decode('0'), Opcode::Digit(0));
        assert_eq!(Opcode::decode('9'), Opcode::Digit(9));
    }

    #[test]
    fn arrows_pair_directions() {
        assert_eq!(
            Opcode::decode('↓'),
            Opcode::Branch {
                then: Vector2::DOWN,
                otherwise: Vector2::UP
            }
        );
        assert_eq!(Opcode::decode('v'), Opcode::Go(Vector2::DOWN));
    }

    #[test]
    fn unknown_is_nop() {
        assert_eq!(Opcode::decode(' '), Opcode::Nop);
        assert_eq!(Opcode::decode('V'), Opcode::Nop);
        assert!(!is_instruction('x'));
        assert!(is_instruction('@'));
    }
}
