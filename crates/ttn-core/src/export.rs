//! Result export: CSV and spreadsheet payloads for the oversight
//! department.
//!
//! CSV is UTF-8 with a byte-order mark so Excel opens Cyrillic headers
//! correctly. The spreadsheet is a SpreadsheetML workbook (XML) with a
//! data sheet and, on request, a summary sheet.

use std::io::Cursor;

use chrono::Utc;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::error::ExportError;
use crate::models::document::{ExtractionResult, FieldName, QualityTier};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";
const SS_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

/// A rendered export file.
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

/// Aggregate statistics over a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub very_low: usize,
    pub mean_confidence: f32,
    pub manual_check_count: usize,
}

impl SummaryStats {
    pub fn compute(results: &[ExtractionResult]) -> Self {
        let mut stats = SummaryStats {
            total: results.len(),
            high: 0,
            medium: 0,
            low: 0,
            very_low: 0,
            mean_confidence: 0.0,
            manual_check_count: 0,
        };
        for result in results {
            match result.quality_tier {
                QualityTier::High => stats.high += 1,
                QualityTier::Medium => stats.medium += 1,
                QualityTier::Low => stats.low += 1,
                QualityTier::VeryLow => stats.very_low += 1,
            }
            if result.requires_manual_check {
                stats.manual_check_count += 1;
            }
            stats.mean_confidence += result.overall_confidence;
        }
        if stats.total > 0 {
            stats.mean_confidence /= stats.total as f32;
        }
        stats
    }

    pub fn manual_check_pct(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.manual_check_count as f32 / self.total as f32
        }
    }
}

/// Renders result sets into download payloads.
pub struct ResultExporter;

impl ResultExporter {
    pub fn new() -> Self {
        ResultExporter
    }

    /// Render a CSV: one row per document, one column per canonical
    /// field, absent fields as empty cells.
    pub fn to_csv(&self, results: &[ExtractionResult]) -> Result<ExportPayload, ExportError> {
        let mut writer = csv::Writer::from_writer(vec![]);

        let mut headers = vec!["Документ".to_string()];
        headers.extend(FieldName::ALL.iter().map(|f| f.label_ru().to_string()));
        headers.extend([
            "Уверенность (%)".to_string(),
            "Класс качества".to_string(),
            "Статус валидации".to_string(),
            "Требует проверки".to_string(),
        ]);
        writer.write_record(&headers)?;

        for result in results {
            writer.write_record(csv_row(result))?;
        }

        let inner = writer
            .into_inner()
            .map_err(|e| ExportError::Io(std::io::Error::other(e.to_string())))?;
        let mut bytes = Vec::with_capacity(inner.len() + UTF8_BOM.len());
        bytes.extend_from_slice(UTF8_BOM);
        bytes.extend_from_slice(&inner);

        Ok(ExportPayload {
            bytes,
            mime: "text/csv; charset=utf-8",
            filename: timestamped_name("csv"),
        })
    }

    /// Render a SpreadsheetML workbook. With `with_summary` a second
    /// sheet carries tier counts and the manual-review share.
    pub fn to_spreadsheet(
        &self,
        results: &[ExtractionResult],
        with_summary: bool,
    ) -> Result<ExportPayload, ExportError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_event(
            &mut writer,
            Event::PI(BytesPI::new("mso-application progid=\"Excel.Sheet\"")),
        )?;

        let mut workbook = BytesStart::new("Workbook");
        workbook.push_attribute(("xmlns", SS_NS));
        workbook.push_attribute(("xmlns:ss", SS_NS));
        write_event(&mut writer, Event::Start(workbook))?;

        self.write_data_sheet(&mut writer, results)?;
        if with_summary {
            self.write_summary_sheet(&mut writer, &SummaryStats::compute(results))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("Workbook")))?;

        Ok(ExportPayload {
            bytes: writer.into_inner().into_inner(),
            mime: "application/vnd.ms-excel",
            filename: timestamped_name("xls"),
        })
    }

    fn write_data_sheet(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        results: &[ExtractionResult],
    ) -> Result<(), ExportError> {
        start_sheet(writer, "Данные")?;

        let mut headers = vec!["Документ"];
        headers.extend(FieldName::ALL.iter().map(|f| f.label_ru()));
        headers.extend(["Уверенность (%)", "Класс качества", "Статус валидации", "Требует проверки"]);
        write_string_row(writer, &headers)?;

        for result in results {
            write_event(writer, Event::Start(BytesStart::new("Row")))?;
            write_cell(writer, "String", &result.document_id)?;
            for name in FieldName::ALL {
                let text = result
                    .field_value(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                write_cell(writer, "String", &text)?;
            }
            write_cell(writer, "Number", &format!("{:.1}", result.overall_confidence))?;
            write_cell(writer, "String", result.quality_tier.label_ru())?;
            write_cell(writer, "String", result.validation_status.label_ru())?;
            write_cell(
                writer,
                "String",
                if result.requires_manual_check { "Да" } else { "Нет" },
            )?;
            write_event(writer, Event::End(BytesEnd::new("Row")))?;
        }

        end_sheet(writer)
    }

    fn write_summary_sheet(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        stats: &SummaryStats,
    ) -> Result<(), ExportError> {
        start_sheet(writer, "Сводка")?;
        write_string_row(writer, &["Показатель", "Значение"])?;

        let rows: Vec<(&str, String)> = vec![
            ("Всего документов", stats.total.to_string()),
            ("Высокое качество (≥80)", stats.high.to_string()),
            ("Среднее качество (60-79)", stats.medium.to_string()),
            ("Низкое качество (40-59)", stats.low.to_string()),
            ("Очень низкое качество (<40)", stats.very_low.to_string()),
            ("Средняя уверенность (%)", format!("{:.1}", stats.mean_confidence)),
            ("Требуют ручной проверки (%)", format!("{:.1}", stats.manual_check_pct())),
        ];
        for (label, value) in rows {
            write_event(writer, Event::Start(BytesStart::new("Row")))?;
            write_cell(writer, "String", label)?;
            write_cell(writer, "String", &value)?;
            write_event(writer, Event::End(BytesEnd::new("Row")))?;
        }

        end_sheet(writer)
    }
}

impl Default for ResultExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_row(result: &ExtractionResult) -> Vec<String> {
    let mut row = vec![result.document_id.clone()];
    for name in FieldName::ALL {
        row.push(
            result
                .field_value(name)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        );
    }
    row.push(format!("{:.1}", result.overall_confidence));
    row.push(result.quality_tier.label_ru().to_string());
    row.push(result.validation_status.label_ru().to_string());
    row.push(if result.requires_manual_check { "Да" } else { "Нет" }.to_string());
    row
}

fn timestamped_name(extension: &str) -> String {
    format!("ttn_export_{}.{}", Utc::now().format("%Y%m%d_%H%M%S"), extension)
}

fn write_event(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    event: Event<'_>,
) -> Result<(), ExportError> {
    writer
        .write_event(event)
        .map_err(|e| ExportError::Spreadsheet(e.to_string()))
}

fn start_sheet(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<(), ExportError> {
    let mut sheet = BytesStart::new("Worksheet");
    sheet.push_attribute(("ss:Name", name));
    write_event(writer, Event::Start(sheet))?;
    write_event(writer, Event::Start(BytesStart::new("Table")))
}

fn end_sheet(writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), ExportError> {
    write_event(writer, Event::End(BytesEnd::new("Table")))?;
    write_event(writer, Event::End(BytesEnd::new("Worksheet")))
}

fn write_string_row(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    values: &[&str],
) -> Result<(), ExportError> {
    write_event(writer, Event::Start(BytesStart::new("Row")))?;
    for value in values {
        write_cell(writer, "String", value)?;
    }
    write_event(writer, Event::End(BytesEnd::new("Row")))
}

fn write_cell(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    cell_type: &str,
    value: &str,
) -> Result<(), ExportError> {
    write_event(writer, Event::Start(BytesStart::new("Cell")))?;
    let mut data = BytesStart::new("Data");
    data.push_attribute(("ss:Type", cell_type));
    write_event(writer, Event::Start(data))?;
    write_event(writer, Event::Text(BytesText::new(value)))?;
    write_event(writer, Event::End(BytesEnd::new("Data")))?;
    write_event(writer, Event::End(BytesEnd::new("Cell")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{
        ExtractedField, FieldValue, QualityTier, RecognitionSource, ValidationStatus,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn result(id: &str, confidence: f32, with_fields: bool) -> ExtractionResult {
        let mut fields = BTreeMap::new();
        if with_fields {
            fields.insert(
                FieldName::SenderName,
                ExtractedField {
                    name: FieldName::SenderName,
                    value: FieldValue::Text("ООО «СтройМатериалы Плюс»".to_string()),
                    confidence: 90.0,
                    valid: true,
                },
            );
            fields.insert(
                FieldName::PackagesCount,
                ExtractedField {
                    name: FieldName::PackagesCount,
                    value: FieldValue::Integer(30),
                    confidence: 95.0,
                    valid: true,
                },
            );
        }
        ExtractionResult {
            document_id: id.to_string(),
            fields,
            overall_confidence: confidence,
            quality_tier: QualityTier::from_confidence(confidence),
            validation_status: if with_fields {
                ValidationStatus::Valid
            } else {
                ValidationStatus::Invalid
            },
            requires_manual_check: confidence < 60.0,
            degraded: false,
            source: RecognitionSource::Engine,
            page_count: 1,
            raw_text: String::new(),
            processing_time_ms: 5,
        }
    }

    #[test]
    fn test_csv_starts_with_bom() {
        let payload = ResultExporter::new().to_csv(&[result("a", 80.0, true)]).unwrap();
        assert!(payload.bytes.starts_with(UTF8_BOM));
        assert_eq!(payload.mime, "text/csv; charset=utf-8");
        assert!(payload.filename.ends_with(".csv"));
    }

    #[test]
    fn test_csv_roundtrip_preserves_cyrillic_and_absent_fields() {
        let results = vec![result("док-1", 85.0, true), result("док-2", 30.0, false)];
        let payload = ResultExporter::new().to_csv(&results).unwrap();

        let body = &payload.bytes[UTF8_BOM.len()..];
        let mut reader = csv::Reader::from_reader(body);
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "Документ");
        assert_eq!(&headers[3], "Отправитель");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "ООО «СтройМатериалы Плюс»");
        // Absent fields render as empty cells, not omissions.
        assert_eq!(&rows[1][3], "");
        assert_eq!(rows[1].len(), headers.len());
        assert_eq!(&rows[1][16], "Да");
    }

    #[test]
    fn test_spreadsheet_contains_sheets() {
        let results = vec![result("a", 85.0, true)];
        let payload = ResultExporter::new().to_spreadsheet(&results, true).unwrap();
        let xml = String::from_utf8(payload.bytes).unwrap();
        assert!(xml.contains("Excel.Sheet"));
        assert!(xml.contains("ss:Name=\"Данные\""));
        assert!(xml.contains("ss:Name=\"Сводка\""));
        assert!(xml.contains("ООО «СтройМатериалы Плюс»"));
        assert_eq!(payload.mime, "application/vnd.ms-excel");
    }

    #[test]
    fn test_spreadsheet_without_summary() {
        let payload = ResultExporter::new()
            .to_spreadsheet(&[result("a", 85.0, true)], false)
            .unwrap();
        let xml = String::from_utf8(payload.bytes).unwrap();
        assert!(!xml.contains("Сводка"));
    }

    #[test]
    fn test_summary_stats() {
        let results = vec![
            result("a", 85.0, true),
            result("b", 70.0, true),
            result("c", 30.0, false),
        ];
        let stats = SummaryStats::compute(&results);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.high, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.very_low, 1);
        assert_eq!(stats.manual_check_count, 1);
        assert!((stats.mean_confidence - 61.666_668).abs() < 0.01);
        assert!((stats.manual_check_pct() - 33.333_332).abs() < 0.01);
    }

    #[test]
    fn test_empty_result_set() {
        let payload = ResultExporter::new().to_csv(&[]).unwrap();
        let body = &payload.bytes[UTF8_BOM.len()..];
        let mut reader = csv::Reader::from_reader(body);
        assert_eq!(reader.records().count(), 0);
        let stats = SummaryStats::compute(&[]);
        assert_eq!(stats.manual_check_pct(), 0.0);
    }
}
