use serde::Serialize;
use std::cmp::max;
use std::cmp::min;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::ops::Add;
use std::ops::AddAssign;

/// A single point in the source: a line number plus a column index within that line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TokenPtr {
  pub lineno: u32,
  pub index: u32,
}

impl TokenPtr {
  pub const fn new(lineno: u32, index: u32) -> TokenPtr {
    TokenPtr { lineno, index }
  }
}

impl Ord for TokenPtr {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .lineno
      .cmp(&other.lineno)
      .then(self.index.cmp(&other.index))
  }
}

impl PartialOrd for TokenPtr {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Debug for TokenPtr {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.lineno, self.index)
  }
}

/// The source span of a node. Like a location elsewhere in this workspace, this is not guaranteed to correspond to real source text: nodes synthesized by rewrites get a best-effort span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TokenPos {
  pub begin: TokenPtr,
  pub end: TokenPtr,
}

impl TokenPos {
  pub fn make(begin: TokenPtr, end: TokenPtr) -> TokenPos {
    debug_assert!(begin <= end, "span must not end before it begins");
    TokenPos { begin, end }
  }

  /// The smallest span covering both `left` and `right`.
  pub fn box_of(left: TokenPos, right: TokenPos) -> TokenPos {
    let mut pos = left;
    pos.extend(right);
    pos
  }

  /// Span on a single line, handy for tests and synthesized nodes.
  pub fn on_line(lineno: u32, begin: u32, end: u32) -> TokenPos {
    TokenPos::make(TokenPtr::new(lineno, begin), TokenPtr::new(lineno, end))
  }

  pub fn is_empty(&self) -> bool {
    self.begin >= self.end
  }

  pub fn encloses(&self, other: TokenPos) -> bool {
    self.begin <= other.begin && other.end <= self.end
  }

  /// True if this span ends at or before `other` begins.
  pub fn precedes(&self, other: TokenPos) -> bool {
    self.end <= other.begin
  }

  pub fn extend(&mut self, other: TokenPos) {
    self.begin = min(self.begin, other.begin);
    self.end = max(self.end, other.end);
  }

  pub fn add_option(self, rhs: Option<TokenPos>) -> TokenPos {
    let mut new = self;
    if let Some(rhs) = rhs {
      new.extend(rhs);
    };
    new
  }
}

impl Debug for TokenPos {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "[{:?}-{:?}]", self.begin, self.end)
  }
}

impl Add for TokenPos {
  type Output = TokenPos;

  fn add(self, rhs: Self) -> Self::Output {
    TokenPos::box_of(self, rhs)
  }
}

impl AddAssign for TokenPos {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(rhs);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_ptrs_order_by_line_then_index() {
    assert!(TokenPtr::new(1, 40) < TokenPtr::new(2, 0));
    assert!(TokenPtr::new(3, 1) < TokenPtr::new(3, 2));
    assert_eq!(TokenPtr::new(3, 2), TokenPtr::new(3, 2));
  }

  #[test]
  fn box_covers_both_spans() {
    let left = TokenPos::on_line(1, 4, 6);
    let right = TokenPos::make(TokenPtr::new(1, 9), TokenPtr::new(2, 3));
    let boxed = left + right;
    assert_eq!(boxed.begin, TokenPtr::new(1, 4));
    assert_eq!(boxed.end, TokenPtr::new(2, 3));
    assert!(boxed.encloses(left));
    assert!(boxed.encloses(right));
    assert!(left.precedes(right));
    assert!(!right.precedes(left));
  }

  #[test]
  fn add_option_ignores_missing_span() {
    let pos = TokenPos::on_line(0, 1, 2);
    assert_eq!(pos.add_option(None), pos);
    assert_eq!(
      pos.add_option(Some(TokenPos::on_line(0, 5, 8))),
      TokenPos::on_line(0, 1, 8)
    );
  }
}
