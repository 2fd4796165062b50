//! Compiled regex patterns for ТТН field extraction.
//!
//! Two families per field: labeled patterns anchored to a Russian
//! field label, and standalone patterns matching the bare value
//! shape. Labeled context always scores higher.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // --- Document number ---
    // "ТТН № 18674/Б", "НАКЛАДНАЯ № ТТН-2024-001234"
    pub static ref DOC_NUMBER_SIGN: Regex =
        Regex::new(r"№[\s:]*([0-9А-ЯЁа-яёA-Za-z][0-9А-ЯЁа-яёA-Za-z\-/\\]*)").unwrap();
    pub static ref DOC_NUMBER_TTN: Regex =
        Regex::new(r"(?i)ТТН[\s№:\-]*(\d[\d\-/\\]*[А-ЯЁа-яёA-Za-z]?)").unwrap();
    pub static ref DOC_NUMBER_WORD: Regex =
        Regex::new(r"(?i)номер\s+(?:ттн|накладной|документа)[\s:]*([0-9А-ЯЁа-яёA-Za-z][0-9А-ЯЁа-яёA-Za-z\-/\\]*)").unwrap();
    pub static ref DOC_NUMBER_SHAPE: Regex =
        Regex::new(r"^[0-9А-ЯЁа-яёA-Za-z][0-9А-ЯЁа-яёA-Za-z\-/\\]{2,}$").unwrap();

    // --- Dates ---
    pub static ref DATE_LABELED: Regex =
        Regex::new(r"(?i)\b(?:дата|от)\b[\s:]+(\d{1,2}[./]\d{1,2}[./]\d{2,4}|\d{4}-\d{1,2}-\d{1,2})").unwrap();
    pub static ref DATE_DMY: Regex =
        Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4})\b").unwrap();
    pub static ref DATE_YMD: Regex =
        Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();

    // --- Parties ---
    pub static ref SENDER_LABELED: Regex =
        Regex::new(r"(?i)(?:грузоотправитель|отправитель)[\s:]+([^\n]{3,120})").unwrap();
    pub static ref RECEIVER_LABELED: Regex =
        Regex::new(r"(?i)(?:грузополучатель|получатель)[\s:]+([^\n]{3,120})").unwrap();

    // --- INN ---
    pub static ref INN_LABELED: Regex =
        Regex::new(r"(?i)ИНН[\s:]*(\d{10,12})").unwrap();
    pub static ref INN_STANDALONE: Regex =
        Regex::new(r"\b(\d{10}|\d{12})\b").unwrap();

    // --- Vehicle plate ---
    // Series letters are the twelve Cyrillic letters with Latin
    // glyph twins; Latin lookalikes are accepted and normalized.
    pub static ref VEHICLE_LABELED: Regex =
        Regex::new(r"(?i)(?:транспортное\s+средство|автомобиль|а/м|гос[.\s]*номер|номер\s+тс)[\s:]*([АВЕКМНОРСТУХABEKMHOPCTYX]\s?\d{3}\s?[АВЕКМНОРСТУХABEKMHOPCTYX]{2}\s?\d{2,3})").unwrap();
    pub static ref VEHICLE_STANDALONE: Regex =
        Regex::new(r"\b[АВЕКМНОРСТУХ]\d{3}[АВЕКМНОРСТУХ]{2}\d{2,3}\b").unwrap();
    pub static ref PLATE_SHAPE: Regex =
        Regex::new(r"^[АВЕКМНОРСТУХ]\d{3}[АВЕКМНОРСТУХ]{2}\d{2,3}$").unwrap();

    // --- Driver ---
    pub static ref DRIVER_LABELED: Regex =
        Regex::new(r"(?i)(?:водитель|фио\s+водителя)[\s:]*([А-ЯЁ][а-яё]+(?:\s+[А-ЯЁ][а-яё.]+){1,2})").unwrap();

    // --- Cargo ---
    pub static ref CARGO_LABELED: Regex =
        Regex::new(r"(?i)(?:груз|наименование(?:\s+груза)?)[\s:\-]+([0-9А-ЯЁа-яёA-Za-z][^\n]{4,200})").unwrap();

    // --- Quantities ---
    pub static ref WEIGHT_LABELED: Regex =
        Regex::new(r"(?i)(?:вес|масса)(?:\s+груза)?[\s:]*(\d+(?:[.,]\d+)?)\s*кг").unwrap();
    pub static ref WEIGHT_STANDALONE: Regex =
        Regex::new(r"(\d+(?:[.,]\d+)?)\s*кг").unwrap();
    pub static ref VOLUME_LABELED: Regex =
        Regex::new(r"(?i)объ[её]м(?:\s+груза)?[\s:]*(\d+(?:[.,]\d+)?)\s*(?:м3|м³|куб)?").unwrap();
    pub static ref VOLUME_STANDALONE: Regex =
        Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:м3|м³)").unwrap();
    pub static ref PACKAGES_LABELED: Regex =
        Regex::new(r"(?i)кол(?:[\-.\s]*во|ичество)\s+мест[\s:]*(\d+)").unwrap();
    pub static ref PACKAGES_SHORT: Regex =
        Regex::new(r"(?i)мест[\s:]+(\d+)").unwrap();
    pub static ref PACKAGES_BEFORE: Regex =
        Regex::new(r"(?i)(\d+)\s*мест").unwrap();
}
