//! Phase sets.
//!
//! A [`PhaseSet`] is a small bit set over the conductors an object touches:
//! the three primary phases, the neutral, and the split-phase secondary (`S`)
//! used by center-tapped transformers and triplex equipment.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// One conductor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    A,
    B,
    C,
    N,
    S,
}

impl Phase {
    /// The three primary phases in canonical order.
    pub const PRIMARY: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    const fn bit(self) -> u8 {
        match self {
            Phase::A => 0b00001,
            Phase::B => 0b00010,
            Phase::C => 0b00100,
            Phase::N => 0b01000,
            Phase::S => 0b10000,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Phase::A => 'A',
            Phase::B => 'B',
            Phase::C => 'C',
            Phase::N => 'N',
            Phase::S => 'S',
        }
    }

    /// Zero-based index of a primary phase (A=0, B=1, C=2).
    pub fn primary_index(self) -> Option<usize> {
        match self {
            Phase::A => Some(0),
            Phase::B => Some(1),
            Phase::C => Some(2),
            Phase::N | Phase::S => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhaseSet(u8);

impl PhaseSet {
    pub const EMPTY: PhaseSet = PhaseSet(0);
    pub const ABC: PhaseSet = PhaseSet(0b00111);

    pub fn single(phase: Phase) -> Self {
        PhaseSet(phase.bit())
    }

    /// Parse a phase field.
    ///
    /// Accepts the numeric codes used by the equipment tables
    /// (1=A, 2=B, 3=C, 4=AB, 5=AC, 6=BC, 7=ABC) or a string of phase letters
    /// in any order and case. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(code) = trimmed.parse::<u8>() {
            let letters = match code {
                1 => "A",
                2 => "B",
                3 => "C",
                4 => "AB",
                5 => "AC",
                6 => "BC",
                7 => "ABC",
                _ => return None,
            };
            return Self::parse(letters);
        }
        let mut set = PhaseSet::EMPTY;
        for ch in trimmed.chars() {
            let phase = match ch.to_ascii_uppercase() {
                'A' => Phase::A,
                'B' => Phase::B,
                'C' => Phase::C,
                'N' => Phase::N,
                'S' => Phase::S,
                _ => return None,
            };
            set.insert(phase);
        }
        Some(set)
    }

    pub fn insert(&mut self, phase: Phase) {
        self.0 |= phase.bit();
    }

    pub fn remove(&mut self, phase: Phase) {
        self.0 &= !phase.bit();
    }

    pub fn contains(self, phase: Phase) -> bool {
        self.0 & phase.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(self, other: PhaseSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn intersection(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 & other.0)
    }

    pub fn union(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 | other.0)
    }

    /// Only the A/B/C members.
    pub fn primary(self) -> PhaseSet {
        PhaseSet(self.0 & Self::ABC.0)
    }

    /// Primary phases present, in canonical order.
    pub fn primary_phases(self) -> impl Iterator<Item = Phase> {
        Phase::PRIMARY.into_iter().filter(move |p| self.contains(*p))
    }

    pub fn primary_count(self) -> usize {
        self.primary_phases().count()
    }

    fn phases(self) -> impl Iterator<Item = Phase> {
        [Phase::A, Phase::B, Phase::C, Phase::N, Phase::S]
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl BitAnd for PhaseSet {
    type Output = PhaseSet;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl BitOr for PhaseSet {
    type Output = PhaseSet;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for phase in self.phases() {
            write!(f, "{}", phase.letter())?;
        }
        Ok(())
    }
}

impl Serialize for PhaseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_codes() {
        assert_eq!(PhaseSet::parse("1").unwrap().to_string(), "A");
        assert_eq!(PhaseSet::parse("5").unwrap().to_string(), "AC");
        assert_eq!(PhaseSet::parse(" 7 ").unwrap(), PhaseSet::ABC);
        assert!(PhaseSet::parse("8").is_none());
    }

    #[test]
    fn parses_letters_in_any_order() {
        assert_eq!(PhaseSet::parse("nCba").unwrap().to_string(), "ABCN");
        assert_eq!(PhaseSet::parse("AS").unwrap().to_string(), "AS");
        assert!(PhaseSet::parse("AX").is_none());
        assert!(PhaseSet::parse("").is_none());
    }

    #[test]
    fn set_operations() {
        let abc = PhaseSet::ABC;
        let an = PhaseSet::parse("AN").unwrap();
        assert_eq!((abc & an).to_string(), "A");
        assert_eq!((abc | an).to_string(), "ABCN");
        assert!(PhaseSet::single(Phase::B).is_subset(abc));
        assert!(!an.is_subset(abc));
        assert_eq!(an.primary(), PhaseSet::single(Phase::A));
        assert_eq!(abc.primary_count(), 3);
    }

    #[test]
    fn insert_and_remove() {
        let mut set = PhaseSet::EMPTY;
        set.insert(Phase::C);
        set.insert(Phase::N);
        assert_eq!(set.to_string(), "CN");
        set.remove(Phase::N);
        assert_eq!(set.to_string(), "C");
        assert!(!set.is_empty());
    }

    #[test]
    fn serializes_as_letters() {
        let json = serde_json::to_string(&PhaseSet::parse("6").unwrap()).unwrap();
        assert_eq!(json, "\"BC\"");
    }
}
