use std::fmt;

use num_bigint::BigInt;

/// The single operand stack. Values are unbounded integers.
///
/// Popping an empty stack yields zero instead of failing. Programs are
/// allowed to rely on this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    values: Vec<BigInt>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: BigInt) {
        self.values.push(value);
    }

    /// Pop the top value, or zero if the stack is empty.
    pub fn pop(&mut self) -> BigInt {
        self.values.pop().unwrap_or_default()
    }

    /// Pop the top value, reporting whether one was actually there.
    ///
    /// The delta log stores this so that undo never pushes values an
    /// underflowing pop did not really remove.
    pub fn try_pop(&mut self) -> Option<BigInt> {
        self.values.pop()
    }

    /// Push back a value previously taken with [`Stack::try_pop`].
    pub fn restore(&mut self, value: Option<BigInt>) {
        if let Some(v) = value {
            self.values.push(v);
        }
    }

    pub fn top(&self) -> Option<&BigInt> {
        self.values.last()
    }

    /// The value `depth` entries below the top, or zero if absent.
    pub fn peek(&self, depth: usize) -> BigInt {
        self.values
            .len()
            .checked_sub(depth + 1)
            .map(|i| self.values[i].clone())
            .unwrap_or_default()
    }

    /// Copy of the contents, bottom first.
    pub fn snapshot(&self) -> Vec<BigInt> {
        self.values.clone()
    }

    pub fn replace(&mut self, values: Vec<BigInt>) {
        self.values = values;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_empty_yields_zero() {
        let mut s = Stack::new();
        assert_eq!(s.pop(), BigInt::from(0));
        assert_eq!(s.pop(), BigInt::from(0));
        assert!(s.is_empty());
    }

    #[test]
    fn lifo_order() {
        let mut s = Stack::new();
        s.push(BigInt::from(1));
        s.push(BigInt::from(2));
        assert_eq!(s.pop(), BigInt::from(2));
        assert_eq!(s.pop(), BigInt::from(1));
    }

    #[test]
    fn try_pop_distinguishes_underflow() {
        let mut s = Stack::new();
        assert_eq!(s.try_pop(), None);
        s.push(BigInt::from(0));
        assert_eq!(s.try_pop(), Some(BigInt::from(0)));
    }

    #[test]
    fn restore_skips_missing_values() {
        let mut s = Stack::new();
        s.restore(None);
        assert!(s.is_empty());
        s.restore(Some(BigInt::from(7)));
        assert_eq!(s.snapshot(), vec![BigInt::from(7)]);
    }

    #[test]
    fn peek_below_top() {
        let mut s = Stack::new();
        s.replace(vec![BigInt::from(4), BigInt::from(5)]);
        assert_eq!(s.peek(0), BigInt::from(5));
        assert_eq!(s.peek(1), BigInt::from(4));
        assert_eq!(s.peek(2), BigInt::from(0));
    }

    #[test]
    fn display_lists_bottom_first() {
        let mut s = Stack::new();
        s.replace(vec![BigInt::from(1), BigInt::from(-2), BigInt::from(3)]);
        assert_eq!(s.to_string(), "[1, -2, 3]");
    }

    #[test]
    fn values_beyond_machine_words() {
        let mut s = Stack::new();
        let big: BigInt = BigInt::from(u64::MAX) * BigInt::from(u64::MAX);
        s.push(big.clone());
        assert_eq!(s.pop(), big);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pop_never_fails(values in prop::collection::vec(any::<i64>(), 0..32), pops in 0usize..64) {
            let mut s = Stack::new();
            s.replace(values.iter().copied().map(BigInt::from).collect());
            for i in 0..pops {
                let v = s.pop();
                if i >= values.len() {
                    prop_assert_eq!(v, BigInt::from(0));
                }
            }
            prop_assert_eq!(s.len(), values.len().saturating_sub(pops));
        }
    }
}
