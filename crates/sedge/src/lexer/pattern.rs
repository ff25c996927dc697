use compact_str::CompactString;
use smallvec::SmallVec;

/// A set of characters, stored as inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    ranges: SmallVec<[(char, char); 4]>,
}

impl CharSet {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ranges: SmallVec::new(),
        }
    }

    /// ASCII digits `0-9`.
    #[must_use]
    pub fn digits() -> Self {
        Self::range('0', '9')
    }

    /// ASCII letters.
    #[must_use]
    pub fn letters() -> Self {
        Self::range('a', 'z').union(&Self::range('A', 'Z'))
    }

    /// Space, tab, carriage return and newline.
    #[must_use]
    pub fn whitespace() -> Self {
        Self::of(" \t\r\n")
    }

    /// A single inclusive range.
    #[must_use]
    pub fn range(start: char, end: char) -> Self {
        Self {
            ranges: SmallVec::from_slice(&[(start, end)]),
        }
    }

    /// The characters of the given string.
    #[must_use]
    pub fn of(chars: &str) -> Self {
        Self {
            ranges: chars.chars().map(|c| (c, c)).collect(),
        }
    }

    #[must_use]
    pub fn union(mut self, other: &Self) -> Self {
        self.ranges.extend_from_slice(&other.ranges);
        self
    }

    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi)
    }
}

/// A lexical pattern attached to a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPattern {
    /// Fixed text.
    Literal(CompactString),
    /// A repeated character class, greedy within `min..=max`.
    Chars {
        set: CharSet,
        min: u32,
        max: Option<u32>,
    },
    /// Patterns matched one after another.
    Seq(Vec<TokenPattern>),
}

impl TokenPattern {
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::Literal(text.into())
    }

    #[must_use]
    pub fn repeat(set: CharSet, min: u32, max: Option<u32>) -> Self {
        Self::Chars { set, min, max }
    }

    #[must_use]
    pub fn seq(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Seq(parts.into_iter().collect())
    }

    /// Byte length matched at the start of `input`, or `None`.
    #[must_use]
    pub fn match_len(&self, input: &str) -> Option<usize> {
        match self {
            Self::Literal(text) => input.starts_with(text.as_str()).then(|| text.len()),
            Self::Chars { set, min, max } => {
                let mut count: u32 = 0;
                let mut len = 0;
                for c in input.chars() {
                    if !set.contains(c) {
                        break;
                    }
                    if let Some(max) = max {
                        if count == *max {
                            break;
                        }
                    }
                    count += 1;
                    len += c.len_utf8();
                }
                (count >= *min).then_some(len)
            }
            Self::Seq(parts) => {
                let mut len = 0;
                for part in parts {
                    len += part.match_len(&input[len..])?;
                }
                Some(len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_membership() {
        let digits = CharSet::digits();
        assert!(digits.contains('0'));
        assert!(digits.contains('9'));
        assert!(!digits.contains('a'));

        let ws = CharSet::whitespace();
        assert!(ws.contains(' '));
        assert!(ws.contains('\n'));
        assert!(!ws.contains('x'));
    }

    #[test]
    fn test_charset_union() {
        let alnum = CharSet::letters().union(&CharSet::digits());
        assert!(alnum.contains('q'));
        assert!(alnum.contains('Z'));
        assert!(alnum.contains('3'));
        assert!(!alnum.contains('+'));
    }

    #[test]
    fn test_literal_match() {
        let p = TokenPattern::literal("pi");
        assert_eq!(p.match_len("pi + 1"), Some(2));
        assert_eq!(p.match_len("po"), None);
    }

    #[test]
    fn test_chars_greedy_match() {
        let p = TokenPattern::repeat(CharSet::digits(), 1, None);
        assert_eq!(p.match_len("1234x"), Some(4));
        assert_eq!(p.match_len("x"), None);

        let capped = TokenPattern::repeat(CharSet::digits(), 1, Some(2));
        assert_eq!(capped.match_len("1234"), Some(2));
    }

    #[test]
    fn test_chars_zero_min_matches_empty() {
        let p = TokenPattern::repeat(CharSet::digits(), 0, None);
        assert_eq!(p.match_len("abc"), Some(0));
    }

    #[test]
    fn test_seq_match() {
        // digits '.' digits — a float literal
        let float = TokenPattern::seq([
            TokenPattern::repeat(CharSet::digits(), 1, None),
            TokenPattern::literal("."),
            TokenPattern::repeat(CharSet::digits(), 1, None),
        ]);
        assert_eq!(float.match_len("12.34 + 1"), Some(5));
        assert_eq!(float.match_len("12"), None);
        assert_eq!(float.match_len("12."), None);
    }
}
