use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Two-letter codes the playback voice picker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Bn,
    Hi,
    Zh,
    Ja,
    Ko,
    Ar,
    Ru,
    Th,
    Pl,
    El,
    He,
    Km,
    My,
    Ta,
    Te,
    Gu,
    Pa,
    Or,
    Ml,
    Si,
    Kn,
    Vi,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 23] = [
        LanguageCode::En,
        LanguageCode::Bn,
        LanguageCode::Hi,
        LanguageCode::Zh,
        LanguageCode::Ja,
        LanguageCode::Ko,
        LanguageCode::Ar,
        LanguageCode::Ru,
        LanguageCode::Th,
        LanguageCode::Pl,
        LanguageCode::El,
        LanguageCode::He,
        LanguageCode::Km,
        LanguageCode::My,
        LanguageCode::Ta,
        LanguageCode::Te,
        LanguageCode::Gu,
        LanguageCode::Pa,
        LanguageCode::Or,
        LanguageCode::Ml,
        LanguageCode::Si,
        LanguageCode::Kn,
        LanguageCode::Vi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Bn => "bn",
            LanguageCode::Hi => "hi",
            LanguageCode::Zh => "zh",
            LanguageCode::Ja => "ja",
            LanguageCode::Ko => "ko",
            LanguageCode::Ar => "ar",
            LanguageCode::Ru => "ru",
            LanguageCode::Th => "th",
            LanguageCode::Pl => "pl",
            LanguageCode::El => "el",
            LanguageCode::He => "he",
            LanguageCode::Km => "km",
            LanguageCode::My => "my",
            LanguageCode::Ta => "ta",
            LanguageCode::Te => "te",
            LanguageCode::Gu => "gu",
            LanguageCode::Pa => "pa",
            LanguageCode::Or => "or",
            LanguageCode::Ml => "ml",
            LanguageCode::Si => "si",
            LanguageCode::Kn => "kn",
            LanguageCode::Vi => "vi",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Script classes in lookup order. The first class with any hit wins, so
/// reordering this table changes results for mixed-script text.
const SCRIPT_CLASSES: &[(&str, LanguageCode)] = &[
    (r"[\x{0980}-\x{09FF}]", LanguageCode::Bn),
    (r"[\x{0900}-\x{097F}]", LanguageCode::Hi),
    (r"[\x{4E00}-\x{9FFF}]", LanguageCode::Zh),
    (r"[\x{3040}-\x{30FF}]", LanguageCode::Ja),
    (r"[\x{AC00}-\x{D7AF}]", LanguageCode::Ko),
    (r"[\x{0600}-\x{06FF}]", LanguageCode::Ar),
    (r"[\x{0400}-\x{04FF}]", LanguageCode::Ru),
    (r"[\x{0E00}-\x{0E7F}]", LanguageCode::Th),
    (r"[ąćęłńśźżĄĆĘŁŃŚŹŻ]", LanguageCode::Pl),
    (r"[\x{0370}-\x{03FF}]", LanguageCode::El),
    (r"[\x{0590}-\x{05FF}]", LanguageCode::He),
    (r"[\x{1780}-\x{17FF}]", LanguageCode::Km),
    (r"[\x{1000}-\x{109F}]", LanguageCode::My),
    (r"[\x{0B80}-\x{0BFF}]", LanguageCode::Ta),
    (r"[\x{0C00}-\x{0C7F}]", LanguageCode::Te),
    (r"[\x{0A80}-\x{0AFF}]", LanguageCode::Gu),
    (r"[\x{0A00}-\x{0A7F}]", LanguageCode::Pa),
    (r"[\x{0B00}-\x{0B7F}]", LanguageCode::Or),
    (r"[\x{0D00}-\x{0D7F}]", LanguageCode::Ml),
    (r"[\x{0D80}-\x{0DFF}]", LanguageCode::Si),
    (r"[\x{0C80}-\x{0CFF}]", LanguageCode::Kn),
    // â ê ô also occur in French and Portuguese, which therefore guess `vi`.
    (r"[ăâđêôơưĂÂĐÊÔƠƯ\x{1EA0}-\x{1EF9}]", LanguageCode::Vi),
];

static SCRIPT_PATTERNS: Lazy<Vec<(Regex, LanguageCode)>> = Lazy::new(|| {
    SCRIPT_CLASSES
        .iter()
        .map(|(pattern, code)| (Regex::new(pattern).unwrap(), *code))
        .collect()
});

/// Guess a language from the Unicode scripts present in `text`.
///
/// This is a voice-picking hint, not language identification: Latin text
/// without Polish or Vietnamese letters (and empty text) falls back to English.
pub fn guess_language(text: &str) -> LanguageCode {
    SCRIPT_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, code)| *code)
        .unwrap_or(LanguageCode::En)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn detects_chinese() {
        assert_eq!(guess_language("你好"), LanguageCode::Zh);
    }

    #[test]
    fn latin_text_falls_back_to_english() {
        assert_eq!(guess_language("Hello"), LanguageCode::En);
        assert_eq!(guess_language("Bonjour, ça va ?"), LanguageCode::En);
    }

    #[test]
    fn detects_arabic() {
        assert_eq!(guess_language("مرحبا"), LanguageCode::Ar);
    }

    #[test]
    fn empty_and_blank_text_fall_back_to_english() {
        assert_eq!(guess_language(""), LanguageCode::En);
        assert_eq!(guess_language("   \n\t"), LanguageCode::En);
    }

    #[test]
    fn one_sample_per_script() {
        let samples = [
            ("আমি বাংলায় কথা বলি", LanguageCode::Bn),
            ("नमस्ते दुनिया", LanguageCode::Hi),
            ("こんにちは", LanguageCode::Ja),
            ("안녕하세요", LanguageCode::Ko),
            ("Привет, мир", LanguageCode::Ru),
            ("สวัสดีครับ", LanguageCode::Th),
            ("Dzień dobry, cześć", LanguageCode::Pl),
            ("Καλημέρα", LanguageCode::El),
            ("שלום עולם", LanguageCode::He),
            ("សួស្តី", LanguageCode::Km),
            ("မင်္ဂလာပါ", LanguageCode::My),
            ("வணக்கம்", LanguageCode::Ta),
            ("నమస్కారం", LanguageCode::Te),
            ("નમસ્તે", LanguageCode::Gu),
            ("ਸਤ ਸ੍ਰੀ ਅਕਾਲ", LanguageCode::Pa),
            ("ନମସ୍କାର", LanguageCode::Or),
            ("നമസ്കാരം", LanguageCode::Ml),
            ("ආයුබෝවන්", LanguageCode::Si),
            ("ನಮಸ್ಕಾರ", LanguageCode::Kn),
            ("Xin chào, tôi là người Việt", LanguageCode::Vi),
        ];
        for (text, expected) in samples {
            assert_eq!(guess_language(text), expected, "sample {text:?}");
        }
    }

    #[test]
    fn circumflex_latin_guesses_vietnamese() {
        assert_eq!(guess_language("forêt"), LanguageCode::Vi);
        assert_eq!(guess_language("Você está aqui"), LanguageCode::Vi);
        assert_eq!(guess_language("forest"), LanguageCode::En);
    }

    #[test]
    fn mixed_scripts_resolve_by_table_order() {
        // Bengali is checked before Chinese even when Chinese dominates.
        assert_eq!(guess_language("你好你好你好 আ"), LanguageCode::Bn);
        // Kanji is checked before kana.
        assert_eq!(guess_language("日本語のテキスト"), LanguageCode::Zh);
        assert_eq!(guess_language("Привет שלום"), LanguageCode::Ru);
    }

    #[test]
    fn codes_render_as_two_letters() {
        for code in LanguageCode::ALL {
            assert_eq!(code.as_str().len(), 2);
            assert_eq!(code.to_string(), code.as_str());
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    const BLOCKS: &[(u32, u32, LanguageCode)] = &[
        (0x0980, 0x09FF, LanguageCode::Bn),
        (0x0900, 0x097F, LanguageCode::Hi),
        (0x4E00, 0x9FFF, LanguageCode::Zh),
        (0x3040, 0x30FF, LanguageCode::Ja),
        (0xAC00, 0xD7AF, LanguageCode::Ko),
        (0x0600, 0x06FF, LanguageCode::Ar),
        (0x0400, 0x04FF, LanguageCode::Ru),
        (0x0E00, 0x0E7F, LanguageCode::Th),
        (0x0370, 0x03FF, LanguageCode::El),
        (0x0590, 0x05FF, LanguageCode::He),
        (0x1780, 0x17FF, LanguageCode::Km),
        (0x1000, 0x109F, LanguageCode::My),
        (0x0B80, 0x0BFF, LanguageCode::Ta),
        (0x0C00, 0x0C7F, LanguageCode::Te),
        (0x0A80, 0x0AFF, LanguageCode::Gu),
        (0x0A00, 0x0A7F, LanguageCode::Pa),
        (0x0B00, 0x0B7F, LanguageCode::Or),
        (0x0D00, 0x0D7F, LanguageCode::Ml),
        (0x0D80, 0x0DFF, LanguageCode::Si),
        (0x0C80, 0x0CFF, LanguageCode::Kn),
        (0x1EA0, 0x1EF9, LanguageCode::Vi),
    ];

    fn single_block_text() -> impl Strategy<Value = (String, LanguageCode)> {
        prop::sample::select(BLOCKS).prop_flat_map(|(lo, hi, code)| {
            prop::collection::vec(lo..=hi, 1..12).prop_map(move |points| {
                let text: String = points.into_iter().filter_map(char::from_u32).collect();
                (text, code)
            })
        })
    }

    proptest! {
        #[test]
        fn single_block_text_maps_to_its_code((text, code) in single_block_text()) {
            prop_assert_eq!(guess_language(&text), code);
        }

        #[test]
        fn polish_letters_in_latin_text(text in "[a-z ]{0,8}[ąćęłńśźżĄĆĘŁŃŚŹŻ][a-z ]{0,8}") {
            prop_assert_eq!(guess_language(&text), LanguageCode::Pl);
        }

        #[test]
        fn vietnamese_letters_in_latin_text(text in "[a-z ]{0,8}[ăđơưĂĐƠƯ][a-z ]{0,8}") {
            prop_assert_eq!(guess_language(&text), LanguageCode::Vi);
        }

        #[test]
        fn guess_is_total(text in any::<String>()) {
            let code = guess_language(&text);
            prop_assert!(LanguageCode::ALL.contains(&code));
        }

        #[test]
        fn ascii_never_leaves_english(text in "[ -~]*") {
            prop_assert_eq!(guess_language(&text), LanguageCode::En);
        }
    }
}
