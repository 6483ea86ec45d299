//! Running net/spent/saved balances.
//!
//! Each category is accumulated exactly, as a two's complement integer counting units of
//! 2^-1074 (the smallest positive `f64`). Every finite amount is a whole number of those
//! units, so crediting and later reversing an amount restores the previous value bit for
//! bit and the result is independent of mutation order. Rounding to `f64` happens only
//! when [`Totals`] are read.

use serde::{Deserialize, Serialize};

use super::record::{Category, TransactionRecord};

/// Exponent of the accumulator unit: one unit is 2^-1074.
const UNIT_EXPONENT: i32 = -1074;
/// Room for `usize::MAX` records of `f64::MAX` plus a sign bit: 1074 + 1024 + 64 + 1 bits.
const LIMBS: usize = 34;
const LIMB_BITS: i32 = 64;

/// Exact signed sum of `f64` amounts.
#[derive(Clone, PartialEq, Eq)]
struct ExactSum {
    /// Little-endian limbs.
    limbs: [u64; LIMBS],
}

impl Default for ExactSum {
    fn default() -> Self {
        Self { limbs: [0; LIMBS] }
    }
}

impl std::fmt::Debug for ExactSum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExactSum").field(&self.to_f64()).finish()
    }
}

impl ExactSum {
    fn add(&mut self, amount: f64) {
        if let Some((mantissa, shift)) = decompose(amount) {
            let (index, low, high) = split(mantissa, shift);
            self.add_at(index, low);
            self.add_at(index + 1, high);
        }
    }

    fn sub(&mut self, amount: f64) {
        if let Some((mantissa, shift)) = decompose(amount) {
            let (index, low, high) = split(mantissa, shift);
            self.sub_at(index, low);
            self.sub_at(index + 1, high);
        }
    }

    fn add_at(&mut self, mut index: usize, value: u64) {
        let mut carry = value;
        while carry != 0 && index < LIMBS {
            let (sum, overflow) = self.limbs[index].overflowing_add(carry);
            self.limbs[index] = sum;
            carry = u64::from(overflow);
            index += 1;
        }
    }

    fn sub_at(&mut self, mut index: usize, value: u64) {
        let mut borrow = value;
        while borrow != 0 && index < LIMBS {
            let (difference, underflow) = self.limbs[index].overflowing_sub(borrow);
            self.limbs[index] = difference;
            borrow = u64::from(underflow);
            index += 1;
        }
    }

    fn is_negative(&self) -> bool {
        self.limbs[LIMBS - 1] >> 63 == 1
    }

    fn negated(&self) -> Self {
        let mut negated = Self {
            limbs: self.limbs.map(|limb| !limb),
        };
        negated.add_at(0, 1);
        negated
    }

    /// Nearest `f64` to the exact sum; sums beyond `f64::MAX` read as infinity.
    fn to_f64(&self) -> f64 {
        if self.is_negative() {
            return -self.negated().to_f64();
        }
        // High limbs first, so a sum that fits in an f64 is reproduced exactly.
        self.limbs
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, limb)| **limb != 0)
            .fold(0.0, |total, (index, limb)| {
                let exponent = UNIT_EXPONENT + LIMB_BITS * index as i32;
                total + *limb as f64 * pow2(exponent)
            })
    }
}

/// Splits a positive finite amount into `mantissa * 2^(shift - 1074)`.
fn decompose(amount: f64) -> Option<(u64, u32)> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let bits = amount.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as u32;
    let fraction = bits & ((1 << 52) - 1);
    if exponent == 0 {
        Some((fraction, 0))
    } else {
        Some((fraction | (1 << 52), exponent - 1))
    }
}

/// Places `mantissa << shift` onto limb `index` and the one above it.
fn split(mantissa: u64, shift: u32) -> (usize, u64, u64) {
    let index = (shift / 64) as usize;
    let offset = shift % 64;
    let low = mantissa << offset;
    let high = if offset == 0 {
        0
    } else {
        mantissa >> (64 - offset)
    };
    (index, low, high)
}

/// Exact 2^exponent for the range an `f64` can hold, infinity above it.
fn pow2(exponent: i32) -> f64 {
    if exponent > 1023 {
        f64::INFINITY
    } else if exponent >= -1022 {
        f64::from_bits(((exponent + 1023) as u64) << 52)
    } else {
        f64::from_bits(1 << (exponent + 1074))
    }
}

/// Point-in-time view of the aggregate balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub net: f64,
    pub spent: f64,
    pub saved: f64,
}

/// Incrementally maintained sums of the live Income and Spent amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTracker {
    saved: ExactSum,
    spent: ExactSum,
}

impl AggregateTracker {
    /// Single reduction over a freshly loaded record set.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut tracker, record| {
                tracker.credit(record.category, record.amount);
                tracker
            })
    }

    /// Applies the `+amount` delta for a newly added record.
    pub fn credit(&mut self, category: Category, amount: f64) {
        match category {
            Category::Income => self.saved.add(amount),
            Category::Spent => self.spent.add(amount),
        }
    }

    /// Applies the `-amount` delta for a removed record, undoing its earlier credit.
    pub fn reverse(&mut self, category: Category, amount: f64) {
        match category {
            Category::Income => self.saved.sub(amount),
            Category::Spent => self.spent.sub(amount),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn totals(&self) -> Totals {
        let saved = self.saved.to_f64();
        let spent = self.spent.to_f64();
        Totals {
            net: saved - spent,
            spent,
            saved,
        }
    }
}
