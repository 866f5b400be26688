//! Bidirectional name tables for opcodes and zones.

/// Static `name <-> code` table.
///
/// Names are matched case-insensitively on lookup and printed exactly as
/// declared. Persisted game records replay these names verbatim, so an entry
/// may be added but never renamed.
#[derive(Clone, Copy, Debug)]
pub struct NameTable {
    entries: &'static [(&'static str, u16)],
}

impl NameTable {
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, u16)]) -> Self {
        Self { entries }
    }

    /// Printed name for a code.
    #[must_use]
    pub fn name(&self, code: u16) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| *name)
    }

    /// Code for a name, ignoring ASCII case.
    #[must_use]
    pub fn code(&self, name: &str) -> Option<u16> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code)| *code)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, u16)> {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if no two entries share a name (ignoring case) or a code.
    #[must_use]
    pub fn is_bijective(&self) -> bool {
        self.entries.iter().enumerate().all(|(i, (name, code))| {
            self.entries[i + 1..]
                .iter()
                .all(|(n, c)| c != code && !n.eq_ignore_ascii_case(name))
        })
    }

    /// True if the two tables share no name.
    #[must_use]
    pub fn is_disjoint(&self, other: &NameTable) -> bool {
        self.entries
            .iter()
            .all(|(name, _)| other.code(name).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: NameTable = NameTable::new(&[("Pick", 1), ("Drop", 2), ("Move", 3)]);

    #[test]
    fn test_lookup_both_ways() {
        assert_eq!(TABLE.code("Drop"), Some(2));
        assert_eq!(TABLE.name(3), Some("Move"));
        assert_eq!(TABLE.name(9), None);
        assert_eq!(TABLE.code("Jump"), None);
        assert_eq!(TABLE.len(), 3);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(TABLE.code("pick"), Some(1));
        assert_eq!(TABLE.code("MOVE"), Some(3));
    }

    #[test]
    fn test_bijective() {
        assert!(TABLE.is_bijective());
        const DUP: NameTable = NameTable::new(&[("Pick", 1), ("pick", 2)]);
        assert!(!DUP.is_bijective());
        const SAME_CODE: NameTable = NameTable::new(&[("Pick", 1), ("Drop", 1)]);
        assert!(!SAME_CODE.is_bijective());
    }

    #[test]
    fn test_disjoint() {
        const OTHER: NameTable = NameTable::new(&[("Done", 10)]);
        assert!(TABLE.is_disjoint(&OTHER));
        assert!(!TABLE.is_disjoint(&TABLE));
    }
}
