//! Language code handling for the upstream's uppercase two-letter codes.

use tracing::debug;

/// Sent when the source language cannot be pinned down; the upstream detects it.
pub const AUTO: &str = "AUTO";

/// Resolve the `(source, target)` pair of a request.
pub fn resolve(
    text: &str,
    source_lang: Option<&str>,
    target_lang: Option<&str>,
    default_target: &str,
) -> (String, String) {
    let source = match non_empty(source_lang) {
        Some(code) => normalize(code),
        None => detect_source_lang(text),
    };
    let target = match non_empty(target_lang) {
        Some(code) => normalize(code),
        None => normalize(default_target),
    };
    (source, target)
}

pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

fn non_empty(code: Option<&str>) -> Option<&str> {
    code.filter(|c| !c.trim().is_empty())
}

/// Detect the language of `text` and return its uppercase ISO 639-1 code.
pub fn detect_source_lang(text: &str) -> String {
    let Some(info) = whatlang::detect(text) else {
        debug!("No language detected, sending {}", AUTO);
        return AUTO.to_string();
    };

    // unreliable guesses are still sent
    match iso639_1(info.lang().code()) {
        Some(code) => {
            debug!(
                reliable = info.is_reliable(),
                "Detected source language {}", code
            );
            code.to_uppercase()
        }
        None => {
            debug!("{} has no two-letter code, sending {}", info.lang().code(), AUTO);
            AUTO.to_string()
        }
    }
}

fn iso639_1(iso639_3: &str) -> Option<&'static str> {
    let code = match iso639_3 {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(code)
}
