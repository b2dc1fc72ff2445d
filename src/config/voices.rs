//! Voice catalogue for Kokoro TTS v1.0.
//!
//! Maps every voice name to its speaker id inside `voices.bin` and to the language
//! that decides which lexicon or espeak-ng language the engine is built with.

/// Language family of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    AmericanEnglish,
    BritishEnglish,
    Spanish,
    French,
    Hindi,
    Italian,
    Japanese,
    PortugueseBr,
    MandarinChinese,
}

impl Language {
    /// Every language, in catalogue order.
    pub const ALL: [Language; 9] = [
        Language::AmericanEnglish,
        Language::BritishEnglish,
        Language::Spanish,
        Language::French,
        Language::Hindi,
        Language::Italian,
        Language::Japanese,
        Language::PortugueseBr,
        Language::MandarinChinese,
    ];

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Language::AmericanEnglish => "American English",
            Language::BritishEnglish => "British English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Hindi => "Hindi",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::PortugueseBr => "Portuguese BR",
            Language::MandarinChinese => "Mandarin Chinese",
        }
    }

    /// espeak-ng voice code.
    pub fn espeak_code(&self) -> &'static str {
        match self {
            Language::AmericanEnglish => "en-us",
            Language::BritishEnglish => "en-gb",
            Language::Spanish => "es",
            Language::French => "fr-fr",
            Language::Hindi => "hi",
            Language::Italian => "it",
            Language::Japanese => "ja",
            Language::PortugueseBr => "pt-br",
            Language::MandarinChinese => "cmn",
        }
    }

    /// Lexicon files shipped with the model that cover this language.
    ///
    /// Chinese keeps the American lexicon first as a fallback for embedded English.
    pub fn lexicon_files(&self) -> &'static [&'static str] {
        match self {
            Language::AmericanEnglish => &["lexicon-us-en.txt"],
            Language::BritishEnglish => &["lexicon-gb-en.txt"],
            Language::MandarinChinese => &["lexicon-us-en.txt", "lexicon-zh.txt"],
            _ => &[],
        }
    }

    /// Language code handed to sherpa for voices without a lexicon.
    /// Reference: <https://github.com/k2-fsa/sherpa-onnx/blob/master/sherpa-onnx/csrc/offline-tts-kokoro-model-config.cc>
    pub fn sherpa_lang(&self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Hindi => "hi",
            Language::Italian => "it",
            Language::Japanese => "ja",
            Language::PortugueseBr => "pt-br",
            // Lexicon-backed
            Language::AmericanEnglish | Language::BritishEnglish | Language::MandarinChinese => "",
        }
    }
}

/// A single catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct Voice {
    pub name: &'static str,
    pub speaker_id: i32,
    pub language: Language,
}

const fn voice(name: &'static str, speaker_id: i32, language: Language) -> Voice {
    Voice { name, speaker_id, language }
}

use Language::*;

/// Sorted by name for binary search.
const VOICES: &[Voice] = &[
    voice("af_alloy", 0, AmericanEnglish),
    voice("af_aoede", 1, AmericanEnglish),
    voice("af_bella", 2, AmericanEnglish),
    voice("af_heart", 3, AmericanEnglish),
    voice("af_jessica", 4, AmericanEnglish),
    voice("af_kore", 5, AmericanEnglish),
    voice("af_nicole", 6, AmericanEnglish),
    voice("af_nova", 7, AmericanEnglish),
    voice("af_river", 8, AmericanEnglish),
    voice("af_sarah", 9, AmericanEnglish),
    voice("af_sky", 10, AmericanEnglish),
    voice("am_adam", 11, AmericanEnglish),
    voice("am_echo", 12, AmericanEnglish),
    voice("am_eric", 13, AmericanEnglish),
    voice("am_fenrir", 14, AmericanEnglish),
    voice("am_liam", 15, AmericanEnglish),
    voice("am_michael", 16, AmericanEnglish),
    voice("am_onyx", 17, AmericanEnglish),
    voice("am_puck", 18, AmericanEnglish),
    voice("am_santa", 19, AmericanEnglish),
    voice("bf_alice", 20, BritishEnglish),
    voice("bf_emma", 21, BritishEnglish),
    voice("bf_isabella", 22, BritishEnglish),
    voice("bf_lily", 23, BritishEnglish),
    voice("bm_daniel", 24, BritishEnglish),
    voice("bm_fable", 25, BritishEnglish),
    voice("bm_george", 26, BritishEnglish),
    voice("bm_lewis", 27, BritishEnglish),
    voice("ef_dora", 28, Spanish),
    voice("em_alex", 29, Spanish),
    voice("ff_siwis", 30, French),
    voice("hf_alpha", 31, Hindi),
    voice("hf_beta", 32, Hindi),
    voice("hm_omega", 33, Hindi),
    voice("hm_psi", 34, Hindi),
    voice("if_sara", 35, Italian),
    voice("im_nicola", 36, Italian),
    voice("jf_alpha", 37, Japanese),
    voice("jf_gongitsune", 38, Japanese),
    voice("jf_nezumi", 39, Japanese),
    voice("jf_tebukuro", 40, Japanese),
    voice("jm_kumo", 41, Japanese),
    voice("pf_dora", 42, PortugueseBr),
    voice("pm_alex", 43, PortugueseBr),
    voice("pm_santa", 44, PortugueseBr),
    voice("zf_xiaobei", 45, MandarinChinese),
    voice("zf_xiaoni", 46, MandarinChinese),
    voice("zf_xiaoxiao", 47, MandarinChinese),
    voice("zf_xiaoyi", 48, MandarinChinese),
    voice("zm_yunjian", 49, MandarinChinese),
    voice("zm_yunxi", 50, MandarinChinese),
    voice("zm_yunxia", 51, MandarinChinese),
    voice("zm_yunyang", 52, MandarinChinese),
];

/// Look up a voice by name.
pub fn get_voice(name: &str) -> Option<&'static Voice> {
    VOICES.binary_search_by_key(&name, |v| v.name).ok().map(|idx| &VOICES[idx])
}

/// Print the catalogue grouped by language.
pub fn print_voices() {
    println!("Kokoro TTS v1.0 - {} voices", VOICES.len());

    for language in Language::ALL {
        let voices: Vec<&Voice> = VOICES.iter().filter(|v| v.language == language).collect();

        println!("\n── {} ({} voices) ──", language.label(), voices.len());
        println!("{:<15} {:<4} ESPEAK", "VOICE", "ID");
        println!("{}", "─".repeat(40));

        for voice in voices {
            println!("{:<15} {:<4} {}", voice.name, voice.speaker_id, language.espeak_code());
        }
    }

    println!();
    println!("Usage:");
    println!("  kokoro-tts \"Hello there.\" bf_emma 1.2 hello.wav");
    println!("  kokoro-tts-persistent af_heart 1.3");
}
