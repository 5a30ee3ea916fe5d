//! PDF rendering of the prediction history.
//!
//! Pagination is computed first as a plain [`PdfLayout`] (top-origin baselines in
//! points), then drawn with `printpdf`. Every page is A4 with one record per line.

use std::io::BufWriter;

use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};

use super::ExportError;
use crate::domain::PredictionRecord;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.0;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 842.0;
/// Vertical distance between two baselines.
pub const LINE_HEIGHT: f32 = 30.0;
/// Baseline of the first line on each page, measured from the top.
pub const FIRST_BASELINE: f32 = 40.0;
/// Left margin, and the bottom margin no line may run into.
pub const MARGIN: f32 = 40.0;

const FONT_SIZE: f32 = 12.0;
const DOCUMENT_TITLE: &str = "PPH Predictions";
const LAYER_NAME: &str = "Layer 1";

/// One text line and its baseline (points from the top edge).
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLine {
    pub baseline: f32,
    pub text: String,
}

/// One page of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// 1-based page number
    pub number: usize,
    pub lines: Vec<PdfLine>,
}

impl PdfPage {
    fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }
}

/// The paginated document before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub pages: Vec<PdfPage>,
}

impl PdfLayout {
    /// Total number of lines across all pages.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// Condensed one-line projection of a record.
#[must_use]
pub fn pdf_line(record: &PredictionRecord) -> String {
    let i = &record.inputs;
    format!(
        "ID:{} Age:{} Parity:{} Hb:{:.1} Result:{}",
        record.id, i.age, i.parity, i.haemoglobin, record.label
    )
}

/// Lay the records out on pages.
///
/// A page is closed once the next line would run past `PAGE_HEIGHT - MARGIN`, or
/// after the last record. A new page is only opened while records remain, so an
/// empty history still produces exactly one (blank) page.
#[must_use]
pub fn paginate(records: &[PredictionRecord]) -> PdfLayout {
    let mut pages = vec![PdfPage::new(1)];
    let mut y = FIRST_BASELINE;

    for (i, record) in records.iter().enumerate() {
        if let Some(page) = pages.last_mut() {
            page.lines.push(PdfLine {
                baseline: y,
                text: pdf_line(record),
            });
        }
        y += LINE_HEIGHT;

        let is_last = i + 1 == records.len();
        if y + LINE_HEIGHT > PAGE_HEIGHT - MARGIN || is_last {
            y = FIRST_BASELINE;
            if !is_last {
                pages.push(PdfPage::new(pages.len() + 1));
            }
        }
    }

    PdfLayout { pages }
}

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

/// Draw a layout into PDF bytes.
///
/// # Errors
/// Returns `ExportError::Pdf` if the document cannot be built or serialized.
pub fn render(layout: &PdfLayout) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(DOCUMENT_TITLE, pt(PAGE_WIDTH), pt(PAGE_HEIGHT), LAYER_NAME);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    for (idx, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(pt(PAGE_WIDTH), pt(PAGE_HEIGHT), LAYER_NAME)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            // PDF coordinates grow upwards from the bottom edge.
            layer.use_text(
                line.text.as_str(),
                FONT_SIZE,
                pt(MARGIN),
                pt(PAGE_HEIGHT - line.baseline),
                &font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
}

/// Paginate and render the records.
///
/// # Errors
/// Returns `ExportError::Pdf` if rendering fails.
pub fn to_pdf(records: &[PredictionRecord]) -> Result<Vec<u8>, ExportError> {
    let layout = paginate(records);
    tracing::debug!(
        "PDF layout: {} lines on {} pages",
        layout.line_count(),
        layout.pages.len()
    );
    render(&layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalInputs, DeliveryMode, RiskLabel};

    fn records(n: usize) -> Vec<PredictionRecord> {
        (0..n)
            .map(|k| PredictionRecord {
                id: (n - k) as i64,
                inputs: ClinicalInputs {
                    age: 25,
                    parity: 1,
                    delivery_mode: DeliveryMode::Vaginal,
                    haemoglobin: 13.0,
                    previous_pph: false,
                    prolonged_labor: false,
                },
                label: RiskLabel::Low,
                score: None,
            })
            .collect()
    }

    #[test]
    fn test_empty_history_is_one_blank_page() {
        let layout = paginate(&[]);
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].lines.is_empty());
    }

    #[test]
    fn test_page_holds_twenty_five_lines() {
        let layout = paginate(&records(25));
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.pages[0].lines.len(), 25);

        let last = layout.pages[0].lines.last().expect("line");
        assert!((last.baseline - (FIRST_BASELINE + 24.0 * LINE_HEIGHT)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_twenty_six_records_roll_onto_second_page() {
        let layout = paginate(&records(26));
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].lines.len(), 25);
        assert_eq!(layout.pages[1].lines.len(), 1);
        assert_eq!(layout.pages[1].number, 2);
        assert!((layout.pages[1].lines[0].baseline - FIRST_BASELINE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_blank_page() {
        let layout = paginate(&records(50));
        assert_eq!(layout.pages.len(), 2);
        assert!(layout.pages.iter().all(|p| p.lines.len() == 25));
        assert_eq!(layout.line_count(), 50);
    }

    #[test]
    fn test_lines_keep_input_order() {
        let recs = records(3);
        let layout = paginate(&recs);
        let texts: Vec<&str> = layout.pages[0].lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "ID:3 Age:25 Parity:1 Hb:13.0 Result:Low Risk of PPH",
                "ID:2 Age:25 Parity:1 Hb:13.0 Result:Low Risk of PPH",
                "ID:1 Age:25 Parity:1 Hb:13.0 Result:Low Risk of PPH",
            ]
        );
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = to_pdf(&records(30)).expect("Should render");
        assert!(bytes.starts_with(b"%PDF"));

        let empty = to_pdf(&[]).expect("Should render empty history");
        assert!(empty.starts_with(b"%PDF"));
    }
}
