//! Deterministic staff name generation from curated name lists.
//!
//! Same RNG stream = same names, so a replayed run hires the same people.

use crate::rng::SubsystemRng;

pub struct NameGenerator;

impl NameGenerator {
    /// "First Last".
    pub fn generate_full_name(rng: &mut SubsystemRng) -> String {
        let first = Self::pick(rng, Self::first_names());
        let last = Self::pick(rng, Self::last_names());
        format!("{first} {last}")
    }

    /// A full name not already in `taken`. Falls back to a numbered
    /// suffix once the retry budget is spent.
    pub fn generate_unique_name(rng: &mut SubsystemRng, taken: &[&str]) -> String {
        for _ in 0..16 {
            let name = Self::generate_full_name(rng);
            if !taken.contains(&name.as_str()) {
                return name;
            }
        }
        let base = Self::generate_full_name(rng);
        let mut n = 2;
        loop {
            let candidate = format!("{base} {n}");
            if !taken.contains(&candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn pick(rng: &mut SubsystemRng, names: &'static [&'static str]) -> &'static str {
        names[rng.next_u64_below(names.len() as u64) as usize]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "Alex", "Bea", "Carlos", "Dana", "Eli", "Farah", "Gus", "Hana",
            "Ivan", "Jia", "Kofi", "Lena", "Marco", "Nia", "Oskar", "Priya",
            "Quinn", "Rosa", "Sami", "Tess", "Umar", "Vera", "Wes", "Ximena",
            "Yusuf", "Zoe", "Ana", "Bruno", "Chloe", "Dev", "Elif", "Finn",
            "Greta", "Hugo", "Iris", "Joao", "Kira", "Luca", "Mina", "Nico",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Abbott", "Baptiste", "Castillo", "Dubois", "Eriksen", "Fontaine",
            "Garcia", "Haddad", "Ibrahim", "Jensen", "Kowalski", "Laurent",
            "Moreau", "Nakamura", "Okafor", "Petrov", "Quintero", "Rossi",
            "Schmidt", "Tanaka", "Urban", "Varga", "Walsh", "Xu", "Yilmaz",
            "Zhang", "Alvarez", "Brennan", "Costa", "Delgado", "Ferreira",
            "Gallagher", "Horvat", "Iqbal", "Kaur", "Lindqvist", "Mendes",
            "Novak", "Olsen", "Park",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, RngSlot};

    #[test]
    fn name_generation_is_deterministic() {
        let bank = RngBank::new(12345);
        let mut rng1 = bank.for_slot_at_day(RngSlot::Names, 1);
        let mut rng2 = bank.for_slot_at_day(RngSlot::Names, 1);

        assert_eq!(
            NameGenerator::generate_full_name(&mut rng1),
            NameGenerator::generate_full_name(&mut rng2),
            "Same seed should produce same name"
        );
    }

    #[test]
    fn generates_two_part_names() {
        let mut rng = RngBank::new(12345).for_slot_at_day(RngSlot::Names, 1);
        for _ in 0..100 {
            let name = NameGenerator::generate_full_name(&mut rng);
            let parts: Vec<&str> = name.split_whitespace().collect();
            assert_eq!(parts.len(), 2, "Name should have exactly 2 parts: {name}");
        }
    }

    #[test]
    fn unique_names_avoid_taken_ones() {
        let mut rng = SubsystemRng::from_seed(3);
        let mut taken: Vec<String> = Vec::new();
        for _ in 0..200 {
            let refs: Vec<&str> = taken.iter().map(String::as_str).collect();
            let name = NameGenerator::generate_unique_name(&mut rng, &refs);
            assert!(!taken.contains(&name), "duplicate {name}");
            taken.push(name);
        }
    }
}
