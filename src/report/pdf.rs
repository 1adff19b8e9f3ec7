use std::ops::Range;

use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};

use super::ReportError;
use crate::format::{generated_at, truncate};
use crate::models::{FormattedPageVisit, FormattedVideoWatch, ParticipantRow};
use crate::stats::{self, REPORT_PAGE_LABEL, REPORT_VIDEO_LABEL};

pub const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 7.0;
const HEADER_HEIGHT: f32 = 8.0;
/// Space kept free under the table for the page footer
const FOOTER_SPACE: f32 = 12.0;
const TOP_N: usize = 5;

const HEADER_FILL: (u8, u8, u8) = (0, 63, 155);
const STRIPE_FILL: (u8, u8, u8) = (245, 248, 255);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// A4 size in millimetres, `(width, height)`
    fn size(self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (210.0, 297.0),
            Orientation::Landscape => (297.0, 210.0),
        }
    }
}

/// A table column: header text, width in millimetres, longest cell text
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: f32,
    pub max_chars: usize,
}

const fn column(title: &'static str, width: f32, max_chars: usize) -> Column {
    Column { title, width, max_chars }
}

/// Distribution of table rows over pages
///
/// The first page holds fewer rows since the report header sits above the
/// table. Every input row lands on exactly one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pages: Vec<Range<usize>>,
}

impl TableLayout {
    pub fn new(rows: usize, first_page: usize, per_page: usize) -> Self {
        let mut pages = Vec::new();
        let mut start = 0;
        let mut capacity = first_page.max(1);
        while start < rows {
            let end = (start + capacity).min(rows);
            pages.push(start..end);
            start = end;
            capacity = per_page.max(1);
        }
        if pages.is_empty() {
            pages.push(0..0);
        }
        TableLayout { pages }
    }

    pub fn pages(&self) -> &[Range<usize>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|range| range.len()).sum()
    }
}

/// A rendered PDF with the layout of its table
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub layout: TableLayout,
}

/// Top-down writer over a printpdf document
///
/// Keeps a vertical cursor in millimetres from the bottom edge and opens new
/// pages as needed.
pub struct PdfWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    current: (PdfPageIndex, PdfLayerIndex),
    width: f32,
    height: f32,
    y: f32,
}

impl PdfWriter {
    pub fn new(title: &str, orientation: Orientation) -> Result<Self, ReportError> {
        let (width, height) = orientation.size();
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), "Calque 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        Ok(PdfWriter {
            doc,
            regular,
            bold,
            pages: vec![(page, layer)],
            current: (page, layer),
            width,
            height,
            y: height - MARGIN,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.current;
        self.doc.get_page(page).get_layer(layer)
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * MARGIN
    }

    pub fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), "Calque 1");
        self.pages.push((page, layer));
        self.current = (page, layer);
        self.y = self.height - MARGIN;
    }

    /// Starts a new page unless `needed` millimetres remain above the footer
    pub fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < MARGIN + FOOTER_SPACE {
            self.new_page();
        }
    }

    fn put(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer().use_text(text, size, Mm(x), Mm(y), font);
    }

    /// Writes one line at the left margin and moves the cursor below it
    pub fn line(&mut self, text: &str, size: f32, bold: bool) {
        let height = size * 0.3528 * 1.5;
        self.ensure_space(height);
        self.y -= height;
        self.put(text, size, MARGIN, self.y, bold);
    }

    pub fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    /// Horizontal rule across the content width
    pub fn separator(&mut self) {
        self.gap(3.0);
        let layer = self.layer();
        layer.set_outline_color(rgb((180, 180, 180)));
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y)), false),
                (Point::new(Mm(self.width - MARGIN), Mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.gap(5.0);
    }

    fn fill(&self, x: f32, top: f32, width: f32, height: f32, color: (u8, u8, u8)) {
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        layer.add_rect(
            Rect::new(Mm(x), Mm(top - height), Mm(x + width), Mm(top)).with_mode(PaintMode::Fill),
        );
        layer.set_fill_color(rgb((0, 0, 0)));
    }

    fn table_header(&mut self, columns: &[Column], size: f32) {
        let width: f32 = columns.iter().map(|column| column.width).sum();
        self.fill(MARGIN, self.y, width, HEADER_HEIGHT, HEADER_FILL);

        self.layer().set_fill_color(rgb((255, 255, 255)));
        let mut x = MARGIN + 1.5;
        for column in columns {
            self.put(column.title, size, x, self.y - HEADER_HEIGHT + 2.5, true);
            x += column.width;
        }
        self.layer().set_fill_color(rgb((0, 0, 0)));
        self.y -= HEADER_HEIGHT;
    }

    fn capacity(&self, top: f32) -> usize {
        let room = top - MARGIN - FOOTER_SPACE - HEADER_HEIGHT;
        (room / ROW_HEIGHT).floor().max(0.0) as usize
    }

    /// Draws a paginated table and returns how rows were spread over pages
    ///
    /// # Arguments
    /// * `columns` - Column definitions, widths in millimetres
    /// * `rows` - Cell texts, one vector per row, in column order
    /// * `size` - Font size in points
    pub fn table(&mut self, columns: &[Column], rows: &[Vec<String>], size: f32) -> TableLayout {
        if self.capacity(self.y) == 0 {
            self.new_page();
        }
        let layout = TableLayout::new(rows.len(), self.capacity(self.y), self.capacity(self.height - MARGIN));
        let width: f32 = columns.iter().map(|column| column.width).sum();

        for (page, range) in layout.pages().iter().enumerate() {
            if page > 0 {
                self.new_page();
            }
            self.table_header(columns, size);

            for index in range.clone() {
                if index % 2 == 1 {
                    self.fill(MARGIN, self.y, width, ROW_HEIGHT, STRIPE_FILL);
                }
                let mut x = MARGIN + 1.5;
                for (column, cell) in columns.iter().zip(&rows[index]) {
                    self.put(&truncate(cell, column.max_chars), size, x, self.y - ROW_HEIGHT + 2.3, false);
                    x += column.width;
                }
                self.y -= ROW_HEIGHT;
            }
        }

        layout
    }

    /// "Page i / n" centred at the bottom of every page
    pub fn page_footers(&self) {
        let total = self.pages.len();
        for (i, (page, layer)) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(*page).get_layer(*layer);
            layer.use_text(
                format!("Page {} / {}", i + 1, total),
                8.0,
                Mm(self.width / 2.0 - 8.0),
                Mm(MARGIN / 2.0),
                &self.regular,
            );
        }
    }

    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

const PAGE_VISIT_COLUMNS: [Column; 6] = [
    column("ID", 15.0, 8),
    column("Utilisateur", 45.0, 25),
    column("Email", 60.0, 35),
    column("URL de la page", 80.0, 40),
    column("Temps passé", 30.0, 12),
    column("Date de visite", 37.0, 19),
];

/// "Rapport des Visites de Pages", landscape
pub fn page_visits_report(visits: &[FormattedPageVisit], now: DateTime<Utc>) -> Result<Rendered, ReportError> {
    let mut pdf = PdfWriter::new("Rapport des Visites de Pages", Orientation::Landscape)?;
    pdf.line("Rapport des Visites de Pages", 18.0, true);
    pdf.gap(2.0);
    pdf.line(&format!("Généré le : {}", generated_at(now)), 10.0, false);
    pdf.line(&format!("Total de visites : {}", visits.len()), 10.0, false);

    let top = stats::top_pages(visits, TOP_N);
    if !top.is_empty() {
        pdf.gap(2.0);
        pdf.line("Top 5 des pages les plus visitées :", 11.0, true);
        for (i, page) in top.iter().enumerate() {
            pdf.line(
                &format!("{}. {} - {} visite(s)", i + 1, page.label(REPORT_PAGE_LABEL), page.count),
                9.0,
                false,
            );
        }
    }
    pdf.separator();

    let rows: Vec<Vec<String>> = visits
        .iter()
        .map(|visit| {
            vec![
                visit.id.clone(),
                visit.user_name.clone(),
                visit.user_email.clone(),
                visit.page_url.clone(),
                visit.time_spent_formatted.clone(),
                visit.date_visited.clone(),
            ]
        })
        .collect();
    let layout = pdf.table(&PAGE_VISIT_COLUMNS, &rows, 8.0);
    pdf.page_footers();

    Ok(Rendered { bytes: pdf.finish()?, layout })
}

const VIDEO_WATCH_COLUMNS: [Column; 9] = [
    column("ID", 12.0, 6),
    column("Utilisateur", 38.0, 22),
    column("Email", 50.0, 30),
    column("ID Vidéo", 38.0, 20),
    column("Auteur", 30.0, 15),
    column("Durée", 20.0, 10),
    column("Progression", 22.0, 8),
    column("Statut", 22.0, 10),
    column("Date", 35.0, 19),
];

/// "Rapport des Vidéos Regardées", landscape, with the completion rate
pub fn video_watches_report(watches: &[FormattedVideoWatch], now: DateTime<Utc>) -> Result<Rendered, ReportError> {
    let mut pdf = PdfWriter::new("Rapport des Vidéos Regardées", Orientation::Landscape)?;
    pdf.line("Rapport des Vidéos Regardées", 18.0, true);
    pdf.gap(2.0);
    pdf.line(&format!("Généré le : {}", generated_at(now)), 10.0, false);
    pdf.line(&format!("Total de visualisations : {}", watches.len()), 10.0, false);

    let top = stats::top_videos(watches, TOP_N);
    if !top.is_empty() {
        pdf.gap(2.0);
        pdf.line("Top 5 des vidéos les plus regardées :", 11.0, true);
        for (i, video) in top.iter().enumerate() {
            let author = video.author.as_deref().filter(|a| !a.is_empty()).unwrap_or("-");
            pdf.line(
                &format!(
                    "{}. {} ({}) - {} visualisation(s)",
                    i + 1,
                    video.label(REPORT_VIDEO_LABEL),
                    author,
                    video.count
                ),
                9.0,
                false,
            );
        }
    }

    let completion = stats::completion(watches);
    pdf.gap(2.0);
    pdf.line(
        &format!(
            "Taux de complétion : {}% ({}/{})",
            completion.rate_text(),
            completion.completed,
            completion.total
        ),
        10.0,
        false,
    );
    pdf.separator();

    let rows: Vec<Vec<String>> = watches
        .iter()
        .map(|watch| {
            vec![
                watch.id.clone(),
                watch.user_name.clone(),
                watch.user_email.clone(),
                watch.video_id.clone(),
                watch.auteur.clone(),
                watch.duration_formatted.clone(),
                watch.progress_formatted.clone(),
                watch.status.clone(),
                watch.date_visualisation.clone(),
            ]
        })
        .collect();
    let layout = pdf.table(&VIDEO_WATCH_COLUMNS, &rows, 7.5);
    pdf.page_footers();

    Ok(Rendered { bytes: pdf.finish()?, layout })
}

const PARTICIPANT_COLUMNS: [Column; 9] = [
    column("Titre", 12.0, 6),
    column("Nom et prénoms", 30.0, 20),
    column("Email", 34.0, 24),
    column("Téléphone", 20.0, 14),
    column("Pays", 16.0, 10),
    column("Spécialité", 20.0, 13),
    column("Mode", 18.0, 13),
    column("Vidéos", 10.0, 4),
    column("Dernière activité", 20.0, 10),
];

/// Portrait participant list, optionally restricted to a period
///
/// # Arguments
/// * `rows` - Participants already filtered by the caller
/// * `period` - Human text of the applied date filter, if any
/// * `now` - Generation instant printed on the document
pub fn participants_report(
    rows: &[ParticipantRow],
    period: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Rendered, ReportError> {
    let mut pdf = PdfWriter::new("Liste des Participants", Orientation::Portrait)?;
    pdf.line("Forum de Cancérologie de ROCHE", 16.0, true);
    pdf.line("Liste des Participants", 13.0, true);
    pdf.gap(2.0);
    if let Some(period) = period {
        pdf.line(&format!("Période : {period}"), 10.0, false);
    }
    pdf.line(&format!("Document généré le {}", generated_at(now)), 9.0, false);
    pdf.line(&format!("Total participants : {}", rows.len()), 10.0, true);
    pdf.separator();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.title.clone(),
                row.name.clone(),
                row.email.clone(),
                row.phone.clone(),
                row.country.clone(),
                row.specialty.clone(),
                row.mode.clone(),
                row.videos_seen.to_string(),
                // date part only, the column is narrow
                row.last_activity.chars().take(10).collect(),
            ]
        })
        .collect();
    let layout = pdf.table(&PARTICIPANT_COLUMNS, &cells, 6.0);
    pdf.page_footers();

    Ok(Rendered { bytes: pdf.finish()?, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageVisit, VideoWatch, format_page_visits, format_video_watches};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, 10, 30, 0).unwrap()
    }

    #[test]
    fn layout_keeps_every_row() {
        let layout = TableLayout::new(53, 10, 20);
        assert_eq!(layout.page_count(), 4);
        assert_eq!(layout.pages()[0], 0..10);
        assert_eq!(layout.pages()[3], 50..53);
        assert_eq!(layout.row_count(), 53);
    }

    #[test]
    fn empty_table_still_has_a_page() {
        let layout = TableLayout::new(0, 10, 20);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.row_count(), 0);
    }

    #[test]
    fn page_visits_report_lists_all_rows() {
        let raw: Vec<PageVisit> = (0..60)
            .map(|i| {
                serde_json::from_value(json!({"id": i, "pageUrl": format!("/page/{}", i % 4), "timeSpent": i}))
                    .unwrap()
            })
            .collect();
        let visits = format_page_visits(&raw);

        let rendered = page_visits_report(&visits, now()).unwrap();
        assert_eq!(rendered.layout.row_count(), 60);
        assert!(rendered.layout.page_count() > 1);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn video_report_lists_all_rows() {
        let raw: Vec<VideoWatch> = serde_json::from_value(json!([
            {"id": 1, "videoId": "a", "completed": true},
            {"id": 2, "videoId": "b", "completed": false}
        ]))
        .unwrap();
        let rendered = video_watches_report(&format_video_watches(&raw), now()).unwrap();
        assert_eq!(rendered.layout.row_count(), 2);
    }

    #[test]
    fn participants_report_without_rows() {
        let rendered = participants_report(&[], Some("Mois de mars 2025"), now()).unwrap();
        assert_eq!(rendered.layout.row_count(), 0);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }
}
