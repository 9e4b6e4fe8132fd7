//! IBAN validation and formatting.
//!
//! Accepts both the electronic form (`NL91ABNA0417164300`) and the print
//! form (`NL91 ABNA 0417 1643 00`); anything that is not alphanumeric is
//! dropped before validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use std::sync::LazyLock;

static STRUCTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{11,30}$").unwrap());

/// BBAN layout per country code, in SWIFT IBAN registry notation:
/// `n` digits, `a` letters, `c` letters or digits, `4!` an exact count.
const BBAN_FORMATS: &[(&str, &str)] = &[
    ("AD", "4!n4!n12!c"), ("AE", "3!n16!n"), ("AL", "8!n16!c"),
    ("AT", "5!n11!n"), ("AZ", "4!a20!c"), ("BA", "3!n3!n8!n2!n"),
    ("BE", "3!n7!n2!n"), ("BG", "4!a4!n2!n8!c"), ("BH", "4!a14!c"),
    ("BR", "8!n5!n10!n1!a1!c"), ("BY", "4!c4!n16!c"), ("CH", "5!n12!c"),
    ("CR", "4!n14!n"), ("CY", "3!n5!n16!c"), ("CZ", "4!n6!n10!n"),
    ("DE", "8!n10!n"), ("DK", "4!n9!n1!n"), ("DO", "4!c20!n"),
    ("EE", "2!n2!n11!n1!n"), ("EG", "4!n4!n17!n"), ("ES", "4!n4!n1!n1!n10!n"),
    ("FI", "3!n11!n"), ("FO", "4!n9!n1!n"), ("FR", "5!n5!n11!c2!n"),
    ("GB", "4!a6!n8!n"), ("GE", "2!a16!n"), ("GI", "4!a15!c"),
    ("GL", "4!n9!n1!n"), ("GR", "3!n4!n16!c"), ("GT", "4!c20!c"),
    ("HR", "7!n10!n"), ("HU", "3!n4!n1!n15!n1!n"), ("IE", "4!a6!n8!n"),
    ("IL", "3!n3!n13!n"), ("IQ", "4!a3!n12!n"), ("IS", "4!n2!n6!n10!n"),
    ("IT", "1!a5!n5!n12!c"), ("JO", "4!a4!n18!c"), ("KW", "4!a22!c"),
    ("KZ", "3!n13!c"), ("LB", "4!n20!c"), ("LC", "4!a24!c"),
    ("LI", "5!n12!c"), ("LT", "5!n11!n"), ("LU", "3!n13!c"),
    ("LV", "4!a13!c"), ("MC", "5!n5!n11!c2!n"), ("MD", "2!c18!c"),
    ("ME", "3!n13!n2!n"), ("MK", "3!n10!c2!n"), ("MR", "5!n5!n11!n2!n"),
    ("MT", "4!a5!n18!c"), ("MU", "4!a2!n2!n12!n3!n3!a"), ("NL", "4!a10!n"),
    ("NO", "4!n6!n1!n"), ("PK", "4!a16!c"), ("PL", "8!n16!n"),
    ("PS", "4!a21!c"), ("PT", "4!n4!n11!n2!n"), ("QA", "4!a21!c"),
    ("RO", "4!a16!c"), ("RS", "3!n13!n2!n"), ("SA", "2!n18!c"),
    ("SC", "4!a2!n2!n16!n3!a"), ("SE", "3!n16!n1!n"), ("SI", "5!n8!n2!n"),
    ("SK", "4!n6!n10!n"), ("SM", "1!a5!n5!n12!c"), ("ST", "4!n4!n11!n2!n"),
    ("SV", "4!a20!n"), ("TL", "3!n14!n2!n"), ("TN", "2!n3!n13!n2!n"),
    ("TR", "5!n1!n16!c"), ("UA", "6!n19!c"), ("VA", "3!n15!n"),
    ("VG", "4!a16!n"), ("XK", "4!n10!n2!n"),
];

/// Does `bban` follow `format`? Length is implied by the format.
fn bban_matches(format: &str, bban: &str) -> bool {
    let mut chars = bban.chars();
    let mut count = 0usize;

    for f in format.chars() {
        match f {
            '0'..='9' => count = count * 10 + (f as usize - '0' as usize),
            '!' => {}
            'n' | 'a' | 'c' => {
                let ok = (&mut chars).take(count).filter(|c| match f {
                    'n' => c.is_ascii_digit(),
                    'a' => c.is_ascii_uppercase(),
                    _ => c.is_ascii_uppercase() || c.is_ascii_digit(),
                });
                if ok.count() != count {
                    return false;
                }
                count = 0;
            }
            _ => return false,
        }
    }

    chars.next().is_none()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidIban;

impl fmt::Display for InvalidIban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid IBAN")
    }
}

impl std::error::Error for InvalidIban {}

/// A validated IBAN, stored in electronic form.
///
/// `Display` renders the print form; serde uses the print form as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iban(String);

impl Iban {
    pub fn parse(text: &str) -> Result<Self, InvalidIban> {
        let compact: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if !STRUCTURE.is_match(&compact) {
            return Err(InvalidIban);
        }

        let format = BBAN_FORMATS
            .iter()
            .find(|(cc, _)| *cc == &compact[..2])
            .map(|(_, format)| *format)
            .ok_or(InvalidIban)?;
        if !bban_matches(format, &compact[4..]) {
            return Err(InvalidIban);
        }

        if mod97(&compact) != 1 {
            return Err(InvalidIban);
        }

        Ok(Iban(compact))
    }

    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// Compact form without separators, e.g. `NL91ABNA0417164300`
    pub fn electronic(&self) -> &str {
        &self.0
    }

    /// Groups of four separated by spaces, e.g. `NL91 ABNA 0417 1643 00`
    pub fn print_format(&self) -> String {
        self.0
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn country(&self) -> &str {
        &self.0[..2]
    }
}

/// ISO 7064 mod 97-10 over the rearranged IBAN (letters expand to 10..35)
fn mod97(compact: &str) -> u32 {
    let rearranged = compact[4..].chars().chain(compact[..4].chars());
    rearranged.fold(0u32, |acc, c| {
        let value = c.to_digit(36).unwrap_or(0);
        if value >= 10 {
            (acc * 100 + value) % 97
        } else {
            (acc * 10 + value) % 97
        }
    })
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print_format())
    }
}

impl FromStr for Iban {
    type Err = InvalidIban;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Iban::parse(s)
    }
}

impl TryFrom<String> for Iban {
    type Error = InvalidIban;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Iban::parse(&value)
    }
}

impl From<Iban> for String {
    fn from(iban: Iban) -> Self {
        iban.print_format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_electronic_and_print_forms() {
        let a = Iban::parse("NL91ABNA0417164300").unwrap();
        let b = Iban::parse("nl91 abna 0417 1643 00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.electronic(), "NL91ABNA0417164300");
        assert_eq!(a.to_string(), "NL91 ABNA 0417 1643 00");
        assert_eq!(a.country(), "NL");
    }

    #[test]
    fn test_rejects_bad_checksum() {
        assert!(!Iban::is_valid("NL11BANK1111111111"));
        assert!(Iban::is_valid("NL48BANK1111111111"));
    }

    #[test]
    fn test_rejects_wrong_length_and_unknown_country() {
        // One digit short for NL
        assert!(!Iban::is_valid("NL91ABNA041716430"));
        assert!(!Iban::is_valid("ZZ91ABNA0417164300"));
        assert!(!Iban::is_valid(""));
        assert!(!Iban::is_valid("not an iban"));
    }

    #[test]
    fn test_rejects_bban_layout_mismatch() {
        // Checksums are valid, but NL is 4 letters then 10 digits
        assert!(!Iban::is_valid("NL6500001234567890"));
        assert!(!Iban::is_valid("NL60TRIO01234567AB"));
    }

    #[test]
    fn test_bban_matches() {
        assert!(bban_matches("4!a10!n", "ABNA0417164300"));
        assert!(!bban_matches("4!a10!n", "ABNA041716430"));
        assert!(!bban_matches("4!a10!n", "ABNA04171643000"));
        assert!(bban_matches("1!a5!n5!n12!c", "X0542811101000000123456"));
        assert!(!bban_matches("3!n", "12A"));
    }

    #[test]
    fn test_other_countries() {
        assert!(Iban::is_valid("DE89 3704 0044 0532 0130 00"));
        assert!(Iban::is_valid("GB29NWBK60161331926819"));
        assert!(Iban::is_valid("BE68539007547034"));
        assert!(Iban::is_valid("IT60 X054 2811 1010 0000 0123 456"));
        assert!(Iban::is_valid("FR14 2004 1010 0505 0001 3M02 606"));
    }

    #[test]
    fn test_serde_uses_print_form() {
        let iban = Iban::parse("NL70TRIO0123456789").unwrap();
        let json = serde_json::to_string(&iban).unwrap();
        assert_eq!(json, "\"NL70 TRIO 0123 4567 89\"");
        let back: Iban = serde_json::from_str(&json).unwrap();
        assert_eq!(back, iban);
        assert!(serde_json::from_str::<Iban>("\"NL00TRIO0123456789\"").is_err());
    }
}
