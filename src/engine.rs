use std::fmt;

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};
use rand::Rng;
use tracing::{debug, trace};

use crate::boundary::BoundaryHooks;
use crate::delta::{Delta, DeltaLog};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::io::IoPort;
use crate::opcode::{ArithOp, Opcode};
use crate::stack::Stack;
use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Cells are opcodes.
    #[default]
    Normal,
    /// Cells are pushed as character codes until the next `"`.
    Text,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Normal => "NORMAL",
            Mode::Text => "TEXT",
        })
    }
}

/// What a call to [`Engine::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One instruction ran and was committed to the log.
    Executed,
    /// The engine is not running; nothing happened.
    Halted,
    /// The pointer is past the right or bottom edge; nothing happened.
    Stalled,
}

/// How `/` and `%` treat a zero divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivisionPolicy {
    /// Fail the step with [`Error::DivisionByZero`], leaving state untouched.
    #[default]
    Fatal,
    /// Push zero as the result.
    YieldZero,
}

/// The interpreter: grid, pointer, stack and mode, plus the capabilities it
/// runs against (I/O port, boundary hooks, delta log, randomness).
///
/// Every step either fails before touching any state or commits exactly one
/// group to the log, so [`Engine::unstep`] always undoes whole steps.
pub struct Engine<I, H, L, R> {
    grid: Grid,
    position: Vector2,
    velocity: Vector2,
    stack: Stack,
    mode: Mode,
    running: bool,
    division: DivisionPolicy,
    io: I,
    hooks: H,
    log: L,
    rng: R,
}

impl<I: IoPort, H: BoundaryHooks, L: DeltaLog, R: Rng> Engine<I, H, L, R> {
    /// Start at the top-left corner moving right, in NORMAL mode, with an
    /// empty stack.
    pub fn new(grid: Grid, io: I, hooks: H, log: L, rng: R) -> Self {
        Self {
            grid,
            position: Vector2::ZERO,
            velocity: Vector2::RIGHT,
            stack: Stack::new(),
            mode: Mode::Normal,
            running: true,
            division: DivisionPolicy::default(),
            io,
            hooks,
            log,
            rng,
        }
    }

    pub fn with_division_policy(mut self, policy: DivisionPolicy) -> Self {
        self.division = policy;
        self
    }

    /// Execute the instruction under the pointer.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if !self.running {
            return Ok(StepOutcome::Halted);
        }
        let Some(c) = self.grid.read(self.position.x, self.position.y, &mut self.hooks)? else {
            return Ok(StepOutcome::Stalled);
        };
        trace!(position = %self.position, opcode = %c, mode = %self.mode, "step");
        match self.mode {
            Mode::Text => self.text(c),
            Mode::Normal => self.dispatch(Opcode::decode(c))?,
        }
        self.log.commit();
        Ok(StepOutcome::Executed)
    }

    /// Undo the most recent committed step. Returns `false` if there is
    /// nothing to undo.
    ///
    /// Every delta in the group is reverted even if the I/O port fails to
    /// retract output; the first such failure is returned afterwards.
    pub fn unstep(&mut self) -> Result<bool> {
        let Some(group) = self.log.pop() else {
            return Ok(false);
        };
        debug!(deltas = group.len(), remaining = self.log.depth(), "unstep");
        let mut failure = None;
        for delta in group {
            if let Err(e) = self.revert(delta) {
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    fn text(&mut self, c: char) {
        if c == '"' {
            self.set_mode(Mode::Normal);
        } else {
            self.push_literal(BigInt::from(u32::from(c)));
        }
        self.advance();
    }

    fn dispatch(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::Halt => {
                self.accelerate(Vector2::ZERO);
                self.running = false;
                return Ok(());
            }
            Opcode::Go(v) => self.accelerate(v),
            Opcode::Branch { then, otherwise } => {
                let popped = self.stack.try_pop();
                let v = if popped.as_ref().is_none_or(|v| v.is_zero()) {
                    otherwise
                } else {
                    then
                };
                self.log.record(Delta::Branch {
                    popped,
                    from: self.velocity,
                });
                self.velocity = v;
            }
            Opcode::Random => {
                let v = Vector2::DIRECTIONS[self.rng.gen_range(0..Vector2::DIRECTIONS.len())];
                self.accelerate(v);
            }
            Opcode::Skip => self.advance(),
            Opcode::Arith(op) => self.math(op)?,
            Opcode::Not => {
                let popped = self.stack.try_pop();
                let result = popped.as_ref().is_none_or(|v| v.is_zero());
                self.stack.push(BigInt::from(u8::from(result)));
                self.log.record(Delta::Not { popped });
            }
            Opcode::Greater => {
                let a = self.stack.try_pop();
                let b = self.stack.try_pop();
                let result = b.clone().unwrap_or_default() > a.clone().unwrap_or_default();
                self.stack.push(BigInt::from(u8::from(result)));
                self.log.record(Delta::GreaterThan { a, b });
            }
            Opcode::ToggleMode => self.set_mode(Mode::Text),
            Opcode::PrintInt => {
                let text = format!(" {} ", self.stack.peek(0));
                self.io.emit(&text)?;
                let popped = self.stack.try_pop();
                self.log.record(Delta::PrintInt { popped, text });
            }
            Opcode::PrintChar => {
                let text = to_char(&self.stack.peek(0)).to_string();
                self.io.emit(&text)?;
                let popped = self.stack.try_pop();
                self.log.record(Delta::PrintChar { popped, text });
            }
            Opcode::ReadInt => {
                let digit = self.io.consume_digit()?;
                self.stack.push(BigInt::from(digit));
                self.log.record(Delta::ReadInt { digit });
            }
            Opcode::ReadChar => {
                let ch = self.io.consume_char()?;
                self.stack.push(BigInt::from(u32::from(ch)));
                self.log.record(Delta::ReadChar { ch });
            }
            Opcode::Duplicate => {
                let popped = self.stack.try_pop();
                let v = popped.clone().unwrap_or_default();
                self.stack.push(v.clone());
                self.stack.push(v);
                self.log.record(Delta::Duplicate { popped });
            }
            Opcode::Swap => {
                let a = self.stack.try_pop();
                let b = self.stack.try_pop();
                self.stack.push(a.clone().unwrap_or_default());
                self.stack.push(b.clone().unwrap_or_default());
                self.log.record(Delta::Swap { a, b });
            }
            Opcode::Discard => {
                let popped = self.stack.try_pop();
                self.log.record(Delta::Discard { popped });
            }
            Opcode::Place => self.place()?,
            Opcode::Grab => self.grab()?,
            Opcode::Digit(d) => self.push_literal(BigInt::from(d)),
            Opcode::Nop => {}
        }
        self.advance();
        Ok(())
    }

    fn math(&mut self, op: ArithOp) -> Result<()> {
        let by_zero = matches!(op, ArithOp::Div | ArithOp::Rem) && self.stack.peek(0).is_zero();
        if by_zero && self.division == DivisionPolicy::Fatal {
            return Err(Error::DivisionByZero {
                op: op.symbol(),
                position: self.position,
            });
        }
        let a = self.stack.try_pop();
        let b = self.stack.try_pop();
        let x = a.clone().unwrap_or_default();
        let y = b.clone().unwrap_or_default();
        let result = match op {
            ArithOp::Add => y + x,
            ArithOp::Sub => y - x,
            ArithOp::Mul => y * x,
            _ if by_zero => BigInt::zero(),
            ArithOp::Div => y / x,
            ArithOp::Rem => y % x,
        };
        self.stack.push(result);
        self.log.record(Delta::Math { a, b });
        Ok(())
    }

    fn place(&mut self) -> Result<()> {
        let y = to_coordinate(&self.stack.peek(0));
        let x = to_coordinate(&self.stack.peek(1));
        let c = to_char(&self.stack.peek(2));
        let previous = self
            .grid
            .write(x, y, c, &mut self.hooks)?
            .map(|prev| (x as usize, y as usize, prev));
        let y = self.stack.try_pop();
        let x = self.stack.try_pop();
        let v = self.stack.try_pop();
        self.log.record(Delta::Place { y, x, v, previous });
        Ok(())
    }

    /// A read that finds no cell pushes a space.
    fn grab(&mut self) -> Result<()> {
        let y = to_coordinate(&self.stack.peek(0));
        let x = to_coordinate(&self.stack.peek(1));
        let c = self.grid.read(x, y, &mut self.hooks)?.unwrap_or(' ');
        let y = self.stack.try_pop();
        let x = self.stack.try_pop();
        self.stack.push(BigInt::from(u32::from(c)));
        self.log.record(Delta::Grab { y, x });
        Ok(())
    }

    fn advance(&mut self) {
        self.log.record(Delta::Move {
            from: self.position,
        });
        self.position += self.velocity;
    }

    fn accelerate(&mut self, v: Vector2) {
        self.log.record(Delta::Accelerate {
            from: self.velocity,
        });
        self.velocity = v;
    }

    fn set_mode(&mut self, mode: Mode) {
        self.log.record(Delta::ModeChange { from: self.mode });
        self.mode = mode;
    }

    fn push_literal(&mut self, v: BigInt) {
        self.stack.push(v);
        self.log.record(Delta::PushLiteral);
    }

    fn revert(&mut self, delta: Delta) -> Result<()> {
        match delta {
            Delta::Move { from } => self.position = from,
            Delta::Accelerate { from } => self.velocity = from,
            Delta::Branch { popped, from } => {
                self.velocity = from;
                self.stack.restore(popped);
            }
            Delta::Math { a, b } | Delta::GreaterThan { a, b } => {
                self.stack.try_pop();
                self.stack.restore(b);
                self.stack.restore(a);
            }
            Delta::Swap { a, b } => {
                self.stack.try_pop();
                self.stack.try_pop();
                self.stack.restore(b);
                self.stack.restore(a);
            }
            Delta::Not { popped } => {
                self.stack.try_pop();
                self.stack.restore(popped);
            }
            Delta::ModeChange { from } => self.mode = from,
            Delta::Duplicate { popped } => {
                self.stack.try_pop();
                self.stack.try_pop();
                self.stack.restore(popped);
            }
            Delta::Discard { popped } => self.stack.restore(popped),
            Delta::Place { y, x, v, previous } => {
                if let Some((cx, cy, c)) = previous {
                    self.grid.set(cx, cy, c);
                }
                self.stack.restore(v);
                self.stack.restore(x);
                self.stack.restore(y);
            }
            Delta::Grab { y, x } => {
                self.stack.try_pop();
                self.stack.restore(x);
                self.stack.restore(y);
            }
            Delta::PushLiteral => {
                self.stack.try_pop();
            }
            Delta::PrintInt { popped, text } | Delta::PrintChar { popped, text } => {
                let retracted = self.io.unemit(&text);
                self.stack.restore(popped);
                return retracted;
            }
            Delta::ReadInt { digit } => {
                self.stack.try_pop();
                self.io.unconsume_digit(digit);
            }
            Delta::ReadChar { ch } => {
                self.stack.try_pop();
                self.io.unconsume_char(ch);
            }
        }
        Ok(())
    }
}

impl<I, H, L: DeltaLog, R> Engine<I, H, L, R> {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Direct stack access for embedders. Changes made here are not logged.
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Stop without executing `@`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Resume after a halt. The velocity is left as it is, so a caller
    /// resuming at an `@` usually unsteps first.
    pub fn restart(&mut self) {
        self.running = true;
    }

    /// The cell under the pointer, if there is one.
    pub fn operator(&self) -> Option<char> {
        self.grid.get(self.position.x, self.position.y)
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Number of steps that can currently be undone.
    pub fn history_depth(&self) -> usize {
        self.log.depth()
    }
}

/// Grid coordinate from a stack value, saturating at the `i64` range.
fn to_coordinate(v: &BigInt) -> i64 {
    v.to_i64().unwrap_or(if v.sign() == Sign::Minus {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Character for a code point; invalid codes become U+FFFD.
fn to_char(v: &BigInt) -> char {
    v.to_u32()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
