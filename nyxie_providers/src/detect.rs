//! Lightweight language guess from Unicode scripts.
//!
//! Only scripts that identify a language with reasonable confidence are
//! mapped. Latin text is ambiguous across many languages and yields
//! [`Detection::NotDetected`], which leaves a user's stored tag alone.

use nyxie_core::{Detection, LanguageDetector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Cyrillic,
    Greek,
    Hebrew,
    Arabic,
    Devanagari,
    Thai,
    Hangul,
    Kana,
    Han,
}

impl Script {
    const fn of(c: char) -> Option<Self> {
        match c as u32 {
            0x0400..=0x04FF | 0x0500..=0x052F => Some(Self::Cyrillic),
            0x0370..=0x03FF | 0x1F00..=0x1FFF => Some(Self::Greek),
            0x0590..=0x05FF => Some(Self::Hebrew),
            0x0600..=0x06FF | 0x0750..=0x077F => Some(Self::Arabic),
            0x0900..=0x097F => Some(Self::Devanagari),
            0x0E00..=0x0E7F => Some(Self::Thai),
            0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => Some(Self::Hangul),
            0x3040..=0x30FF => Some(Self::Kana),
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => Some(Self::Han),
            _ => None,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Cyrillic => "ru",
            Self::Greek => "el",
            Self::Hebrew => "he",
            Self::Arabic => "ar",
            Self::Devanagari => "hi",
            Self::Thai => "th",
            Self::Hangul => "ko",
            Self::Kana => "ja",
            Self::Han => "zh",
        }
    }
}

/// Detector that picks the dominant non-Latin script of a text.
#[derive(Debug, Clone, Copy)]
pub struct ScriptDetector {
    /// Share of alphabetic characters a script must reach to count.
    min_share: f32,
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self { min_share: 0.3 }
    }
}

impl ScriptDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_min_share(mut self, min_share: f32) -> Self {
        self.min_share = min_share;
        self
    }
}

impl LanguageDetector for ScriptDetector {
    #[expect(clippy::cast_precision_loss, reason = "character counts are small")]
    fn detect(&self, text: &str) -> Detection {
        let mut counts = [0_usize; 9];
        let mut letters = 0_usize;

        for c in text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            if let Some(script) = Script::of(c) {
                counts[script as usize] += 1;
            }
        }

        if letters == 0 {
            return Detection::NotDetected;
        }

        // Japanese mixes kana with Han; any real share of kana means Japanese.
        let kana = counts[Script::Kana as usize];
        if kana > 0 && (kana + counts[Script::Han as usize]) as f32 / letters as f32 >= self.min_share {
            return Detection::Detected(Script::Kana.tag().to_string());
        }

        let dominant = ALL_SCRIPTS
            .iter()
            .copied()
            .max_by_key(|script| counts[*script as usize])
            .filter(|script| counts[*script as usize] as f32 / letters as f32 >= self.min_share);

        dominant.map_or(Detection::NotDetected, |script| {
            Detection::Detected(script.tag().to_string())
        })
    }
}

const ALL_SCRIPTS: [Script; 9] = [
    Script::Cyrillic,
    Script::Greek,
    Script::Hebrew,
    Script::Arabic,
    Script::Devanagari,
    Script::Thai,
    Script::Hangul,
    Script::Kana,
    Script::Han,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<String> {
        ScriptDetector::new().detect(text).tag().map(str::to_string)
    }

    #[test]
    fn test_scripts() {
        assert_eq!(detect("Привет, как дела?").as_deref(), Some("ru"));
        assert_eq!(detect("Καλημέρα").as_deref(), Some("el"));
        assert_eq!(detect("שלום עולם").as_deref(), Some("he"));
        assert_eq!(detect("مرحبا بالعالم").as_deref(), Some("ar"));
        assert_eq!(detect("नमस्ते दुनिया").as_deref(), Some("hi"));
        assert_eq!(detect("สวัสดีครับ").as_deref(), Some("th"));
        assert_eq!(detect("안녕하세요").as_deref(), Some("ko"));
        assert_eq!(detect("こんにちは世界").as_deref(), Some("ja"));
        assert_eq!(detect("你好世界").as_deref(), Some("zh"));
    }

    #[test]
    fn test_latin_and_empty_are_not_detected() {
        assert_eq!(detect("Hello, how are you?"), None);
        assert_eq!(detect("Merhaba, nasılsın?"), None);
        assert_eq!(detect(""), None);
        assert_eq!(detect("12345 !!! 🙂"), None);
    }

    #[test]
    fn test_mostly_latin_with_a_foreign_word() {
        assert_eq!(detect("I learned the word привет today at school"), None);
    }
}
