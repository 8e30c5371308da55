use std::cmp::Ordering;
use crate::codec::record_codec::FIELD_SEPARATOR;
use crate::schema::schema::SortKeyType;
use crate::sort::spec::{ResolvedKey, SortPlan};

/// Multi-key line ordering matching `LC_ALL=C sort -s -t<TAB>` with
/// `f` on text keys and `n` on numeric keys.
///
/// Earlier keys take precedence. A descending key flips only its own
/// comparison; lines equal on every key compare `Equal` so a stable sort
/// keeps their input order.
#[derive(Debug, Clone)]
pub struct LineComparator {
    keys: Vec<ResolvedKey>,
}

impl LineComparator {
    pub fn new(plan: &SortPlan) -> Self {
        LineComparator { keys: plan.keys.clone() }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        for key in &self.keys {
            let left = field(a, key.column);
            let right = field(b, key.column);

            let ordering = match key.sort_type {
                SortKeyType::Text => compare_folded(left, right),
                SortKeyType::Numeric => compare_numeric(left, right),
            };
            let ordering = if key.ascending { ordering } else { ordering.reverse() };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// 1-based field of a tab-separated line; missing fields are empty
pub fn field(line: &str, column: usize) -> &str {
    line.split(FIELD_SEPARATOR).nth(column.saturating_sub(1)).unwrap_or("")
}

// Case folding as `sort -f` in the C locale: ASCII lower case folds to upper
fn compare_folded(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_uppercase())
        .cmp(b.bytes().map(|c| c.to_ascii_uppercase()))
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    NumericPrefix::parse(a).cmp(&NumericPrefix::parse(b))
}

/// Numeric prefix as `sort -n` reads it: optional blanks, optional minus,
/// digits and one decimal point. Anything else counts as zero.
///
/// Compared digit by digit, so arbitrarily long values order exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericPrefix<'a> {
    pub negative: bool,
    pub integer: &'a str,    // No leading zeros
    pub fraction: &'a str,   // No trailing zeros
}

impl<'a> NumericPrefix<'a> {
    pub const ZERO: NumericPrefix<'static> = NumericPrefix { negative: false, integer: "", fraction: "" };

    pub fn parse(text: &'a str) -> NumericPrefix<'a> {
        let trimmed = text.trim_start_matches([' ', '\t']);
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let int_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();
        let integer = &unsigned[..int_len];
        let fraction = match unsigned[int_len..].strip_prefix('.') {
            Some(rest) => &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()],
            None => "",
        };

        let integer = integer.trim_start_matches('0');
        let fraction = fraction.trim_end_matches('0');
        if integer.is_empty() && fraction.is_empty() {
            return NumericPrefix::ZERO;
        }
        NumericPrefix { negative, integer, fraction }
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(other.integer))
            .then_with(|| self.fraction.cmp(other.fraction))
    }
}

impl Ord for NumericPrefix<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for NumericPrefix<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparator(keys: &[(usize, SortKeyType, bool)]) -> LineComparator {
        LineComparator::new(&SortPlan {
            keys: keys
                .iter()
                .map(|&(column, sort_type, ascending)| ResolvedKey { column, sort_type, ascending })
                .collect(),
        })
    }

    fn sorted(cmp: &LineComparator, lines: &[&str]) -> Vec<String> {
        let mut lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        lines.sort_by(|a, b| cmp.compare(a, b));
        lines
    }

    #[test]
    fn text_keys_ignore_case() {
        let cmp = comparator(&[(1, SortKeyType::Text, true)]);
        assert_eq!(sorted(&cmp, &["beta", "Alpha", "alpha2", "BETA0"]), vec!["Alpha", "alpha2", "beta", "BETA0"]);
    }

    #[test]
    fn numeric_keys_compare_by_value() {
        let cmp = comparator(&[(2, SortKeyType::Numeric, true)]);
        assert_eq!(
            sorted(&cmp, &["a\t10", "b\t9", "c\t-1.5", "d\t", "e\t0.25"]),
            vec!["c\t-1.5", "d\t", "e\t0.25", "b\t9", "a\t10"]
        );
    }

    #[test]
    fn descending_keeps_ties_in_input_order() {
        let cmp = comparator(&[(1, SortKeyType::Numeric, false)]);
        assert_eq!(
            sorted(&cmp, &["1\tfirst", "2\tx", "1\tsecond"]),
            vec!["2\tx", "1\tfirst", "1\tsecond"]
        );
    }

    #[test]
    fn later_keys_break_ties() {
        let cmp = comparator(&[(1, SortKeyType::Text, true), (2, SortKeyType::Numeric, false)]);
        assert_eq!(
            sorted(&cmp, &["a\t1", "b\t5", "A\t3"]),
            vec!["A\t3", "a\t1", "b\t5"]
        );
    }

    #[test]
    fn numeric_prefix_stops_at_garbage() {
        let parse = NumericPrefix::parse;
        assert_eq!(parse("  42abc"), NumericPrefix { negative: false, integer: "42", fraction: "" });
        assert_eq!(parse("-3.5.1"), NumericPrefix { negative: true, integer: "3", fraction: "5" });
        assert_eq!(parse("007.250"), NumericPrefix { negative: false, integer: "7", fraction: "25" });
        assert_eq!(parse("abc"), NumericPrefix::ZERO);
        assert_eq!(parse("-"), NumericPrefix::ZERO);
        assert_eq!(parse("-0.0"), NumericPrefix::ZERO);
        assert_eq!(parse("-.5"), NumericPrefix { negative: true, integer: "", fraction: "5" });
    }

    #[test]
    fn long_numbers_compare_exactly() {
        let cmp = comparator(&[(1, SortKeyType::Numeric, true)]);
        assert_eq!(
            sorted(&cmp, &[
                "123456789012345678901",
                "123456789012345678900",
                "-123456789012345678901",
                "-123456789012345678900",
                "0.12345678901234567891",
                "0.1234567890123456789",
            ]),
            vec![
                "-123456789012345678901",
                "-123456789012345678900",
                "0.1234567890123456789",
                "0.12345678901234567891",
                "123456789012345678900",
                "123456789012345678901",
            ]
        );
    }

    #[test]
    fn numeric_zero_forms_tie() {
        let cmp = comparator(&[(1, SortKeyType::Numeric, true)]);
        assert_eq!(sorted(&cmp, &["0", "x", "", "-0", "0.00"]), vec!["0", "x", "", "-0", "0.00"]);
    }
}
