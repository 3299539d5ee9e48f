//! Scalar payload of a leaf node.
//!
//! Integers and floats compare and hash as numbers, so `Int(2)` equals
//! `Float(2.0)`. A total order exists for sorting: numbers before text.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// The additive identity used when an absent operand is zero-filled.
    pub fn zero() -> Self {
        Value::Int(0)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(_) => false,
        }
    }

    /// Own emptiness notion: only text can be empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Size used to order non-numeric scalars.
    pub fn size(&self) -> usize {
        match self {
            Value::Text(s) => s.chars().count(),
            _ => 0,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Text(_) => 1,
        }
    }

    /// Total order over all values: numbers by exact magnitude, then text.
    ///
    /// `-0.0` equals `0.0`; NaNs sort past the infinities on their sign's side.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_floats(*a, *b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int),
            (Value::Text(a), Value::Text(b)) => Some(Value::Text(format!("{a}{b}"))),
            (a, b) => Some(Value::Float(a.as_f64()? + b.as_f64()?)),
        }
    }

    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int),
            (a, b) => Some(Value::Float(a.as_f64()? - b.as_f64()?)),
        }
    }

    pub fn checked_mul(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int),
            (a, b) => Some(Value::Float(a.as_f64()? * b.as_f64()?)),
        }
    }

    /// Integer division stays integral only when exact.
    pub fn checked_div(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(_), Value::Int(0)) => None,
            (Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => {
                a.checked_div(*b).map(Value::Int)
            }
            (a, b) => Some(Value::Float(a.as_f64()? / b.as_f64()?)),
        }
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

fn cmp_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// The `i64` a float equals exactly, if any.
fn exact_int(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f)).then(|| f as i64)
}

/// Compares without rounding the integer through `f64`.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    i.cmp(&(whole as i64)).then_with(|| cmp_floats(whole, f))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Value::Float(f) => match exact_int(*f) {
                Some(i) => {
                    0u8.hash(state);
                    i.hash(state);
                }
                None => {
                    1u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            Value::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn int_and_integral_float_are_equal_and_hash_alike() {
        let mut set = HashSet::new();
        set.insert(Value::Int(2));
        assert!(set.contains(&Value::Float(2.0)));
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
    }

    #[test]
    fn large_int_and_float_compare_exactly() {
        let exact = 9_007_199_254_740_992i64; // 2^53
        let float = Value::Float(exact as f64);
        let above = Value::Int(exact + 1);

        assert_eq!(float, Value::Int(exact));
        assert_ne!(above, float);
        assert!(above > float);
        assert!(Value::Float(-0.5) < Value::Int(0));
        assert!(Value::Float(f64::INFINITY) > Value::Int(i64::MAX));
        assert_eq!(Value::Float(-0.0), Value::Int(0));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));

        let set: HashSet<Value> = [Value::Int(exact), above.clone()].into_iter().collect();
        assert!(set.contains(&float));
        assert!(set.contains(&above));
        assert_eq!(set.len(), 2);
        let floats: HashSet<Value> = [float, Value::Int(exact)].into_iter().collect();
        assert_eq!(floats.len(), 1);
    }

    #[test]
    fn numbers_sort_before_text() {
        let mut values = vec![Value::from("a"), Value::Float(1.5), Value::Int(1)];
        values.sort();
        assert_eq!(values, vec![Value::Int(1), Value::Float(1.5), Value::from("a")]);
    }

    #[test]
    fn division_is_integral_only_when_exact() {
        assert_eq!(Value::Int(10).checked_div(&Value::Int(5)), Some(Value::Int(2)));
        assert_eq!(
            Value::Int(100).checked_div(&Value::Int(150)),
            Some(Value::Float(100.0 / 150.0))
        );
        assert_eq!(Value::Int(10).checked_div(&Value::Int(0)), None);
    }

    #[test]
    fn arithmetic_on_text_is_undefined_except_concatenation() {
        assert_eq!(Value::from("a").checked_add(&Value::from("b")), Some(Value::from("ab")));
        assert_eq!(Value::from("a").checked_add(&Value::Int(1)), None);
        assert_eq!(Value::from("a").checked_mul(&Value::Int(2)), None);
    }

    #[test]
    fn overflow_is_undefined() {
        assert_eq!(Value::Int(i64::MAX).checked_add(&Value::Int(1)), None);
    }
}
