use num_bigint::Sign;
use rand::Rng;
use tracing::debug;

use crate::boundary::BoundaryHooks;
use crate::delta::DeltaLog;
use crate::engine::{Engine, StepOutcome};
use crate::error::Result;
use crate::io::IoPort;
use crate::stack::Stack;

/// Configuration for a non-interactive run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Stop after this many executed steps (`None` for no limit).
    pub step_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of steps actually executed.
    pub steps: usize,
    /// Why the run ended. `Executed` means the step limit was reached.
    pub outcome: StepOutcome,
    pub exit_code: i32,
}

/// Step until the program halts, stalls past the grid, or hits the limit.
pub fn run<I, H, L, R>(engine: &mut Engine<I, H, L, R>, config: &RunConfig) -> Result<RunSummary>
where
    I: IoPort,
    H: BoundaryHooks,
    L: DeltaLog,
    R: Rng,
{
    let mut steps = 0;
    let outcome = loop {
        if config.step_limit.is_some_and(|limit| steps >= limit) {
            break StepOutcome::Executed;
        }
        match engine.step()? {
            StepOutcome::Executed => steps += 1,
            other => break other,
        }
    };
    debug!(steps, ?outcome, "run finished");
    Ok(RunSummary {
        steps,
        outcome,
        exit_code: exit_code(engine.stack()),
    })
}

/// Process exit value: the low 32 bits of the top of the stack, two's
/// complement, or 0 if the stack is empty.
pub fn exit_code(stack: &Stack) -> i32 {
    let Some(top) = stack.top() else {
        return 0;
    };
    let (sign, digits) = top.to_u32_digits();
    let low = digits.first().copied().unwrap_or(0);
    match sign {
        Sign::Minus => low.wrapping_neg() as i32,
        _ => low as i32,
    }
}
