use wana_kana::ConvertJapanese;

use super::utils::NormalizeAnswer;

/// Brings phonetic text into one writing system so readings typed in romaji,
/// hiragana or katakana compare equal.
pub trait ScriptComparator {
    fn to_canonical_script(&self, text: &str) -> String;

    fn same_reading(&self, left: &str, right: &str) -> bool {
        self.to_canonical_script(&left.normalize_answer())
            == self.to_canonical_script(&right.normalize_answer())
    }
}

/// Canonical script is hiragana. The long vowel mark ー is spelled out as the
/// vowel it extends, the same way `to_hiragana` treats it in katakana.
#[derive(Debug, Default, Clone, Copy)]
pub struct KanaComparator;

impl ScriptComparator for KanaComparator {
    fn to_canonical_script(&self, text: &str) -> String {
        expand_long_vowels(&text.to_hiragana())
    }
}

fn expand_long_vowels(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        let c = if c == 'ー' { previous.and_then(vowel_of).unwrap_or(c) } else { c };
        expanded.push(c);
        previous = Some(c);
    }
    expanded
}

fn vowel_of(kana: char) -> Option<char> {
    match kana.to_string().to_romaji().chars().last()? {
        'a' => Some('あ'),
        'i' => Some('い'),
        'u' => Some('う'),
        'e' => Some('え'),
        'o' => Some('お'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_romaji_and_kana_compare_equal() {
        let comparator = KanaComparator;
        assert!(comparator.same_reading("ka", "か"));
        assert!(comparator.same_reading("カ", "か"));
        assert!(comparator.same_reading("Ichi", "いち"));
        assert!(!comparator.same_reading("ki", "か"));
    }

    #[test]
    fn test_long_vowel_mark_matches_spelled_out_vowel() {
        let comparator = KanaComparator;
        assert!(comparator.same_reading("ラーメン", "らーめん"));
        assert!(comparator.same_reading("らーめん", "raamen"));
        assert!(!comparator.same_reading("らーめん", "ramen"));
    }
}
