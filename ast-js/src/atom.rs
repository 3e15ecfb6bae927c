use ahash::AHashMap;
use serde::Serialize;

/// An interned identifier, label, or string literal. Atoms are handed out in interning order, so ordered maps keyed by `Atom` iterate in first-seen order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Atom(pub u32);

#[derive(Debug, Default, Clone)]
pub struct AtomTable {
  names: Vec<String>,
  map: AHashMap<String, Atom>,
}

impl AtomTable {
  pub fn intern(&mut self, name: impl AsRef<str>) -> Atom {
    let name_ref = name.as_ref();
    if let Some(existing) = self.map.get(name_ref) {
      return *existing;
    }
    let id = Atom(self.names.len() as u32);
    self.names.push(name_ref.to_string());
    self.map.insert(name_ref.to_string(), id);
    id
  }

  pub fn lookup(&self, name: &str) -> Option<Atom> {
    self.map.get(name).copied()
  }

  /// Returns the text of an atom created by this table.
  pub fn get(&self, atom: Atom) -> &str {
    &self.names[atom.0 as usize]
  }

  /// Length of the atom's text in UTF-16 code units, as seen by script.
  pub fn js_len(&self, atom: Atom) -> usize {
    self.get(atom).encode_utf16().count()
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::AtomTable;

  #[test]
  fn interning_is_deduplicated() {
    let mut atoms = AtomTable::default();
    let a = atoms.intern("foo");
    let b = atoms.intern("foo");
    let c = atoms.intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a < c);
    assert_eq!(atoms.len(), 2);
    assert_eq!(atoms.get(c), "bar");
    assert_eq!(atoms.lookup("bar"), Some(c));
    assert_eq!(atoms.lookup("baz"), None);
  }

  #[test]
  fn js_len_counts_utf16_units() {
    let mut atoms = AtomTable::default();
    let astral = atoms.intern("a\u{1F600}");
    assert_eq!(atoms.js_len(astral), 3);
  }
}
