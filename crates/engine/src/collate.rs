//! Natural, accent-aware string ordering for Spanish-language data.
//!
//! Strings are compared in three passes, the way a collation table would:
//! - primary: character class, then base letter (case and accents folded,
//!   `ñ` after `n`); runs of ASCII digits compare by numeric value
//! - secondary: accents (unaccented first)
//! - tertiary: case (lowercase first)
//!
//! Two strings equal on all three passes fall back to byte order so the
//! result is a total order.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Space,
    Punct,
    Digit,
    Letter,
}

#[derive(Debug, Clone, Copy)]
struct Weight {
    class: Class,
    primary: u32,
    accent: u32,
    upper: bool,
}

enum Token<'a> {
    Number(&'a str),
    Char(char),
}

fn tokens(s: &str) -> impl Iterator<Item = Token<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let c = rest.chars().next()?;
        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            let (digits, tail) = rest.split_at(end);
            rest = tail;
            Some(Token::Number(digits))
        } else {
            rest = &rest[c.len_utf8()..];
            Some(Token::Char(c))
        }
    })
}

/// Base letter for the accented Latin letters that show up in Spanish and
/// Portuguese names. `ñ` is not folded: it is its own letter.
fn fold(c: char) -> (char, bool) {
    let base = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        _ => return (c, false),
    };
    (base, true)
}

fn weight(c: char) -> Weight {
    let upper = c.is_uppercase();
    let lower = c.to_lowercase().next().unwrap_or(c);

    if c.is_whitespace() {
        return Weight {
            class: Class::Space,
            primary: c as u32,
            accent: 0,
            upper: false,
        };
    }
    if !lower.is_alphanumeric() {
        return Weight {
            class: Class::Punct,
            primary: c as u32,
            accent: 0,
            upper: false,
        };
    }
    if lower.is_numeric() {
        return Weight {
            class: Class::Digit,
            primary: c as u32,
            accent: 0,
            upper: false,
        };
    }

    let (base, accented) = fold(lower);
    // Doubled so that ñ slots in between n and o
    let primary = if lower == 'ñ' {
        ('n' as u32) * 2 + 1
    } else {
        (base as u32) * 2
    };
    Weight {
        class: Class::Letter,
        primary,
        accent: if accented { lower as u32 } else { 0 },
        upper,
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_primary(a: &str, b: &str) -> Ordering {
    let mut ta = tokens(a);
    let mut tb = tokens(b);
    loop {
        let ord = match (ta.next(), tb.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Token::Number(x)), Some(Token::Number(y))) => cmp_digits(x, y),
            (Some(Token::Number(_)), Some(Token::Char(c))) => Class::Digit.cmp(&weight(c).class),
            (Some(Token::Char(c)), Some(Token::Number(_))) => weight(c).class.cmp(&Class::Digit),
            (Some(Token::Char(x)), Some(Token::Char(y))) => {
                let (wx, wy) = (weight(x), weight(y));
                wx.class.cmp(&wy.class).then(wx.primary.cmp(&wy.primary))
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn cmp_levels(a: &str, b: &str) -> Ordering {
    let wa = a.chars().map(weight);
    let wb = b.chars().map(weight);
    let accents = wa.clone().map(|w| w.accent).cmp(wb.clone().map(|w| w.accent));
    // Lowercase first: false < true
    accents.then_with(|| wa.map(|w| w.upper).cmp(wb.map(|w| w.upper)))
}

/// Compare two strings in natural order ("item2" < "item10", "árbol" < "beta").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    cmp_primary(a, b)
        .then_with(|| cmp_levels(a, b))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut items: Vec<&str>) -> Vec<&str> {
        items.sort_by(|a, b| natural_cmp(a, b));
        items
    }

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(sorted(vec!["item10", "item2", "item1"]), vec!["item1", "item2", "item10"]);
        assert_eq!(natural_cmp("a007", "a8"), Ordering::Less);
        assert_ne!(natural_cmp("a007", "a7"), Ordering::Equal);
    }

    #[test]
    fn case_and_accents_fold_at_first_level() {
        assert_eq!(sorted(vec!["beta", "Árbol", "alfa"]), vec!["alfa", "Árbol", "beta"]);
        assert_eq!(natural_cmp("a", "A"), Ordering::Less);
        assert_eq!(natural_cmp("B", "a"), Ordering::Greater);
    }

    #[test]
    fn enie_sorts_after_n() {
        assert_eq!(sorted(vec!["oso", "ñu", "nube"]), vec!["nube", "ñu", "oso"]);
    }

    #[test]
    fn digits_before_letters_punctuation_before_digits() {
        assert_eq!(sorted(vec!["b", "2", "-"]), vec!["-", "2", "b"]);
        assert_eq!(sorted(vec!["x", " ", "."]), vec![" ", ".", "x"]);
    }

    #[test]
    fn prefix_is_less() {
        assert_eq!(natural_cmp("abc", "abcd"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }
}
