//! OCR confusable corrections applied to recognized text before
//! pattern matching.
//!
//! Cyrillic pages read with a mixed rus+eng model come back with
//! predictable substitutions: the № sign as "Ne"/"No", Latin
//! lookalikes at the head of plate numbers, stray box-drawing junk.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMBER_SIGN: Regex = Regex::new(r"\bN[eoо][\s:]").unwrap();
    // Document numbers like 18674/Б often read as /В.
    static ref SLASH_B: Regex = Regex::new(r"(\d+)/[Вв]\b").unwrap();
    // Plate head letter dropped to lowercase or read as Latin.
    static ref PLATE_HEAD_A: Regex =
        Regex::new(r"(^|\s)[aа](\d{3}[АВЕКМНОРСТУХ]{2}\d{2,3})\b").unwrap();
    static ref PLATE_HEAD_O: Regex =
        Regex::new(r"(^|\s)[oо](\d{3}[АВЕКМНОРСТУХ]{2}\d{2,3})\b").unwrap();
    static ref JUNK: Regex = Regex::new(r"[~`@#$%^&*=+\[\]{}|]").unwrap();
    static ref RUNS: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Apply confusable corrections. Line structure is preserved; labeled
/// patterns depend on it.
pub fn apply(text: &str) -> String {
    let text = NUMBER_SIGN.replace_all(text, "№ ");
    let text = SLASH_B.replace_all(&text, "${1}/Б");
    let text = PLATE_HEAD_A.replace_all(&text, "${1}А${2}");
    let text = PLATE_HEAD_O.replace_all(&text, "${1}О${2}");
    let text = JUNK.replace_all(&text, "");
    let text = RUNS.replace_all(&text, " ");
    text.into_owned()
}
