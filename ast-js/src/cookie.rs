use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

/// Where an upvar's value lives, as a `(level, slot)` pair packed into one `u32`: the static level
/// of the frame that owns it in the high half, the slot within that frame in the low half.
///
/// The level is an absolute static level, not a skip count relative to the using frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpvarCookie(u32);

impl UpvarCookie {
  /// All levels at or above this one are reserved so that [`Self::FREE_VALUE`] can mean "unbound".
  pub const FREE_LEVEL: u16 = 0x3fff;
  /// Functions nested deeper than this are never given upvar fast paths.
  pub const UPVAR_LEVEL_LIMIT: u16 = 16;
  /// Slot number naming the callee itself.
  pub const CALLEE_SLOT: u16 = 0xffff;

  const FREE_VALUE: u32 = 0xffff_ffff;

  pub const fn free() -> UpvarCookie {
    UpvarCookie(Self::FREE_VALUE)
  }

  pub fn new(level: u16, slot: u16) -> UpvarCookie {
    let mut cookie = UpvarCookie::free();
    cookie.set(level, slot);
    cookie
  }

  pub fn is_level_reserved(level: u16) -> bool {
    level >= Self::FREE_LEVEL
  }

  pub fn is_free(&self) -> bool {
    self.0 == Self::FREE_VALUE
  }

  /// Check [`Self::is_free`] first; a free cookie has no level.
  pub fn level(&self) -> u16 {
    debug_assert!(!self.is_free());
    (self.0 >> 16) as u16
  }

  /// Check [`Self::is_free`] first; a free cookie has no slot.
  pub fn slot(&self) -> u16 {
    debug_assert!(!self.is_free());
    self.0 as u16
  }

  pub fn set(&mut self, level: u16, slot: u16) {
    debug_assert!(
      !Self::is_level_reserved(level),
      "level {level} is reserved for the free sentinel"
    );
    self.0 = (u32::from(level) << 16) | u32::from(slot);
  }

  pub fn set_from(&mut self, other: UpvarCookie) {
    self.set(other.level(), other.slot());
  }

  pub fn make_free(&mut self) {
    self.0 = Self::FREE_VALUE;
    debug_assert!(self.is_free());
  }

  pub fn as_raw(&self) -> u32 {
    self.0
  }
}

impl Default for UpvarCookie {
  fn default() -> Self {
    UpvarCookie::free()
  }
}

impl Debug for UpvarCookie {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.is_free() {
      write!(f, "UpvarCookie(free)")
    } else {
      write!(f, "UpvarCookie({}, {})", self.level(), self.slot())
    }
  }
}

impl Serialize for UpvarCookie {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    if self.is_free() {
      serializer.serialize_none()
    } else {
      serializer.collect_seq([self.level(), self.slot()])
    }
  }
}

#[cfg(test)]
mod tests {
  use super::UpvarCookie;
  use proptest::prelude::*;

  #[test]
  fn default_cookie_is_free() {
    let cookie = UpvarCookie::default();
    assert!(cookie.is_free());
    assert_eq!(cookie, UpvarCookie::free());
  }

  #[test]
  fn make_free_after_set() {
    let mut cookie = UpvarCookie::new(2, 7);
    assert!(!cookie.is_free());
    cookie.make_free();
    assert!(cookie.is_free());
  }

  #[test]
  fn callee_slot_at_level_zero_is_not_free() {
    let cookie = UpvarCookie::new(0, UpvarCookie::CALLEE_SLOT);
    assert!(!cookie.is_free());
    assert_eq!(cookie.slot(), UpvarCookie::CALLEE_SLOT);
  }

  #[test]
  fn reserved_levels() {
    assert!(!UpvarCookie::is_level_reserved(UpvarCookie::UPVAR_LEVEL_LIMIT));
    assert!(!UpvarCookie::is_level_reserved(UpvarCookie::FREE_LEVEL - 1));
    assert!(UpvarCookie::is_level_reserved(UpvarCookie::FREE_LEVEL));
    assert!(UpvarCookie::is_level_reserved(u16::MAX));
  }

  proptest! {
    #[test]
    fn set_round_trips(level in 0..UpvarCookie::FREE_LEVEL, slot in any::<u16>()) {
      let cookie = UpvarCookie::new(level, slot);
      prop_assert!(!cookie.is_free());
      prop_assert_eq!(cookie.level(), level);
      prop_assert_eq!(cookie.slot(), slot);

      let mut copy = UpvarCookie::free();
      copy.set_from(cookie);
      prop_assert_eq!(copy, cookie);
    }
  }
}
