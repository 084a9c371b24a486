//! The arithmetic-logic unit.
//!
//! Mirrors `original_source/alu.py`: every operation stores its `result` and
//! refreshes the `zero`/`negative` flags from it. `div`/`mod` use Python's
//! floor-division semantics (toward negative infinity, remainder sharing the
//! divisor's sign) rather than Rust's default truncating `/`/`%`.

use crate::fault::Fault;

/// Floor division: rounds toward negative infinity, unlike Rust's `/` which
/// truncates toward zero. Diverges from `i64::div_euclid` when `b` is
/// negative — Euclidean division keeps the remainder non-negative instead of
/// matching the divisor's sign.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Remainder sharing the divisor's sign, paired with [`floor_div`].
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Alu {
    pub a: i64,
    pub b: i64,
    pub result: i64,
    pub zero: bool,
    pub negative: bool,
}

impl Alu {
    pub fn new() -> Alu {
        Alu::default()
    }

    fn settle(&mut self, result: i64) -> i64 {
        self.result = result;
        self.zero = result == 0;
        self.negative = result < 0;
        result
    }

    pub fn add(&mut self) -> i64 {
        self.settle(self.a + self.b)
    }

    pub fn sub(&mut self) -> i64 {
        self.settle(self.a - self.b)
    }

    pub fn mul(&mut self) -> i64 {
        self.settle(self.a * self.b)
    }

    pub fn div(&mut self) -> Result<i64, Fault> {
        if self.b == 0 {
            return Err(Fault::DivideByZero);
        }
        Ok(self.settle(floor_div(self.a, self.b)))
    }

    pub fn modulo(&mut self) -> Result<i64, Fault> {
        if self.b == 0 {
            return Err(Fault::DivideByZero);
        }
        Ok(self.settle(floor_mod(self.a, self.b)))
    }

    pub fn compare(&mut self) -> i64 {
        let cmp = match self.a.cmp(&self.b) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        };
        self.settle(cmp)
    }

    pub fn equals(&mut self) -> i64 {
        self.settle(if self.a == self.b { -1 } else { 0 })
    }

    pub fn less(&mut self) -> i64 {
        self.settle(if self.a < self.b { -1 } else { 0 })
    }

    pub fn greater(&mut self) -> i64 {
        self.settle(if self.a > self.b { -1 } else { 0 })
    }

    /// Boolean-style negation yielding `0`/`1`, not the `-1`/`0` convention
    /// used by `equals`/`less`/`greater` — composes with `jmz`/`jnz` but not
    /// arithmetically with the comparison ops.
    pub fn not_a(&mut self) -> i64 {
        self.settle(if self.a == 0 { 1 } else { 0 })
    }

    pub fn not_b(&mut self) -> i64 {
        self.settle(if self.b == 0 { 1 } else { 0 })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn div_floors_toward_negative_infinity() {
        let mut alu = Alu::new();
        alu.a = -7;
        alu.b = 2;
        assert_eq!(alu.div().unwrap(), -4);
    }

    #[test]
    fn modulo_shares_sign_with_divisor() {
        let mut alu = Alu::new();
        alu.a = -7;
        alu.b = 2;
        assert_eq!(alu.modulo().unwrap(), 1);
    }

    #[test]
    fn div_floors_with_negative_divisor() {
        let mut alu = Alu::new();
        alu.a = 7;
        alu.b = -2;
        assert_eq!(alu.div().unwrap(), -4);
        alu.a = 7;
        alu.b = -2;
        assert_eq!(alu.modulo().unwrap(), -1);
    }

    #[test]
    fn div_by_zero_faults() {
        let mut alu = Alu::new();
        alu.a = 1;
        alu.b = 0;
        assert_eq!(alu.div().unwrap_err(), Fault::DivideByZero);
    }

    #[test]
    fn not_composed_with_itself_is_identity_on_bit() {
        let mut alu = Alu::new();
        alu.a = 0;
        let once = alu.not_a();
        alu.a = once;
        let twice = alu.not_a();
        assert_eq!(twice, 0);
    }

    #[test]
    fn comparisons_use_minus_one_zero_convention() {
        let mut alu = Alu::new();
        alu.a = 3;
        alu.b = 5;
        assert_eq!(alu.less(), -1);
        assert_eq!(alu.greater(), 0);
        alu.a = 5;
        alu.b = 5;
        assert_eq!(alu.equals(), -1);
    }

    #[test]
    fn compare_yields_minus_one_zero_one() {
        let mut alu = Alu::new();
        alu.a = 1;
        alu.b = 2;
        assert_eq!(alu.compare(), -1);
        alu.a = 2;
        alu.b = 1;
        assert_eq!(alu.compare(), 1);
        alu.a = 2;
        alu.b = 2;
        assert_eq!(alu.compare(), 0);
    }
}
