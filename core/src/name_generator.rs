//! Deterministic company and contact name generation using curated lists.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::SeedRng;

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// "Prefix Suffix NNN", e.g. "Cloud Analytics 412"
    pub fn generate_company_name(rng: &mut SeedRng) -> String {
        let prefix = rng.pick(Self::company_prefixes());
        let suffix = rng.pick(Self::company_suffixes());
        let number = rng.range_inclusive(1, 999);
        format!("{prefix} {suffix} {number}")
    }

    /// Generate a full name (first + last) deterministically
    pub fn generate_person_name(rng: &mut SeedRng) -> String {
        let first = rng.pick(Self::first_names());
        let last = rng.pick(Self::last_names());
        format!("{first} {last}")
    }

    /// `first.<company_id>@example.com`; unique per company.
    pub fn contact_email(person_name: &str, company_id: i64) -> String {
        let first = person_name
            .split_whitespace()
            .next()
            .unwrap_or("contact")
            .to_ascii_lowercase();
        format!("{first}.{company_id}@example.com")
    }

    /// 14-digit registration number: 8 random digits, branch "0001", 2 check digits.
    pub fn generate_tax_id(rng: &mut SeedRng) -> String {
        let base = rng.range_inclusive(10_000_000, 99_999_999);
        let check = rng.range_inclusive(10, 99);
        format!("{base}0001{check}")
    }

    fn company_prefixes() -> &'static [&'static str] {
        &["Tech", "Soft", "Data", "Cloud", "Nova", "Web", "Net", "Sys", "Bright", "Apex"]
    }

    fn company_suffixes() -> &'static [&'static str] {
        &["Solutions", "Systems", "Labs", "Group", "Digital", "Analytics", "Works", "Partners"]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "Arthur", "Anna", "Bruno", "Carla", "Daniel", "Elena", "Fabio", "Gabriela",
            "James", "Mary", "Robert", "Linda", "Michael", "Sarah", "David", "Laura",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Silva", "Santos", "Oliveira", "Smith", "Johnson", "Brown", "Garcia", "Miller",
            "Davis", "Martinez", "Wilson", "Anderson",
        ]
    }
}
