use core::hash::Hash;
use core::hash::Hasher;
use serde::Serialize;
use serde::Serializer;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Add;

/// Value of a numeric literal node.
///
/// Literals compare by bit pattern, with every NaN treated as the same value: `-0` and `0` are
/// different literals, so folding and deduplication must never merge them.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsNumber(pub f64);

impl JsNumber {
  fn canonical(self) -> f64 {
    if self.0.is_nan() {
      f64::NAN
    } else {
      self.0
    }
  }

  pub fn is_negative_zero(self) -> bool {
    self.0 == 0.0 && self.0.is_sign_negative()
  }

  /// The value as an `i32` when it is exactly one. `-0` is not.
  pub fn as_int32(self) -> Option<i32> {
    let v = self.0;
    if v.fract() != 0.0 || self.is_negative_zero() {
      return None;
    };
    if v < i32::MIN as f64 || v > i32::MAX as f64 {
      return None;
    };
    Some(v as i32)
  }
}

impl Display for JsNumber {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.0 {
      v if v.is_nan() => write!(f, "NaN"),
      v if v == f64::INFINITY => write!(f, "Infinity"),
      v if v == f64::NEG_INFINITY => write!(f, "-Infinity"),
      v => write!(f, "{v}"),
    }
  }
}

impl PartialEq for JsNumber {
  fn eq(&self, other: &Self) -> bool {
    self.canonical().to_bits() == other.canonical().to_bits()
  }
}

impl Eq for JsNumber {}

impl Ord for JsNumber {
  fn cmp(&self, other: &Self) -> Ordering {
    self.canonical().total_cmp(&other.canonical())
  }
}

impl PartialOrd for JsNumber {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Hash for JsNumber {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.canonical().to_bits().hash(state);
  }
}

impl Add for JsNumber {
  type Output = JsNumber;

  fn add(self, rhs: Self) -> Self::Output {
    JsNumber(self.0 + rhs.0)
  }
}

impl Serialize for JsNumber {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self.as_int32() {
      Some(v) => serializer.serialize_i32(v),
      None => serializer.serialize_f64(self.0),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::JsNumber;

  #[test]
  fn zeros_are_distinct_literals() {
    assert_ne!(JsNumber(0.0), JsNumber(-0.0));
    assert!(JsNumber(-0.0) < JsNumber(0.0));
    assert_eq!(JsNumber(f64::NAN), JsNumber(-f64::NAN));
  }

  #[test]
  fn int32_view() {
    assert_eq!(JsNumber(7.0).as_int32(), Some(7));
    assert_eq!(JsNumber(-2147483648.0).as_int32(), Some(i32::MIN));
    assert_eq!(JsNumber(2147483648.0).as_int32(), None);
    assert_eq!(JsNumber(0.5).as_int32(), None);
    assert_eq!(JsNumber(-0.0).as_int32(), None);
    assert_eq!(JsNumber(f64::NAN).as_int32(), None);
    assert_eq!(JsNumber(f64::INFINITY).as_int32(), None);
  }

  #[test]
  fn displays_like_js() {
    assert_eq!(JsNumber(1.0).to_string(), "1");
    assert_eq!(JsNumber(1.5).to_string(), "1.5");
    assert_eq!(JsNumber(f64::NEG_INFINITY).to_string(), "-Infinity");
    assert_eq!(JsNumber(f64::NAN).to_string(), "NaN");
  }
}
