//! Doubled-name collapse: a pure predicate applied uniformly at
//! name extraction time, modeled independently of whitespace/case noise.

/// Collapse a doubled Slack display name, e.g. `"Alex MittellAlex Mittell"`
/// or `"Jane Smith Jane Smith"`, down to a single copy. Splits at a
/// candidate midpoint, lowercases and strips whitespace from both halves,
/// and returns the first half (in its original casing/spacing) when they
/// match; otherwise returns the input unchanged.
pub fn collapse_doubled(s: &str) -> String {
    let trimmed = s.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();
    if len < 2 {
        return trimmed.to_string();
    }

    let fold = |s: &str| -> String {
        s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
    };

    let halves_match = |mid: usize| -> bool {
        let first: String = chars[..mid].iter().collect();
        let second: String = chars[mid..].iter().collect();
        !first.trim().is_empty() && fold(&first) == fold(&second)
    };

    if len % 2 == 0 && halves_match(len / 2) {
        return chars[..len / 2].iter().collect::<String>().trim().to_string();
    }
    // Odd total length: the doubled form may be joined by a single space
    // ("Jane Smith Jane Smith"), so try every other candidate midpoint too.
    if let Some(mid) = (1..len).find(|&m| halves_match(m)) {
        return chars[..mid].iter().collect::<String>().trim().to_string();
    }
    trimmed.to_string()
}

pub fn is_doubled(s: &str) -> bool {
    collapse_doubled(s) != s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_back_to_back_doubled_name() {
        assert_eq!(collapse_doubled("Alex MittellAlex Mittell"), "Alex Mittell");
    }

    #[test]
    fn collapses_space_separated_doubled_name() {
        assert_eq!(collapse_doubled("Jane Smith Jane Smith"), "Jane Smith");
    }

    #[test]
    fn single_name_is_unchanged() {
        assert_eq!(collapse_doubled("Jacob Frey"), "Jacob Frey");
    }

    #[test]
    fn short_name_is_unchanged() {
        assert_eq!(collapse_doubled("Al"), "Al");
    }
}
