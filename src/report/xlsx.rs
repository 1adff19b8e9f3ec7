use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::ReportError;
use crate::models::{FormattedPageVisit, FormattedVideoWatch, ParticipantRow};

/// A value written to one spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

/// Builds a single-sheet workbook with a bold header row
///
/// # Arguments
/// * `name` - Worksheet name
/// * `headers` - Column titles with their widths
/// * `rows` - One vector of cells per data row
///
/// # Returns
/// * `Result<Vec<u8>, ReportError>` - XLSX file content as bytes
pub fn sheet(name: &str, headers: &[(&str, f64)], rows: &[Vec<Cell>]) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(name)?;

    let bold = Format::new().set_bold();
    for (col, (title, width)) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let line = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(line, c as u16, text)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(line, c as u16, *value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

const PAGE_VISIT_HEADERS: [(&str, f64); 10] = [
    ("ID Visite", 10.0),
    ("ID Utilisateur", 12.0),
    ("Prénom", 15.0),
    ("Nom", 15.0),
    ("Nom complet", 25.0),
    ("Email", 30.0),
    ("URL de la page", 40.0),
    ("Temps passé (secondes)", 15.0),
    ("Temps passé (formaté)", 15.0),
    ("Date de visite", 20.0),
];

pub fn page_visit_rows(visits: &[FormattedPageVisit]) -> Vec<Vec<Cell>> {
    visits
        .iter()
        .map(|visit| {
            vec![
                visit.id.as_str().into(),
                visit.user_id.as_str().into(),
                visit.first_name.as_str().into(),
                visit.last_name.as_str().into(),
                visit.user_name.as_str().into(),
                visit.user_email.as_str().into(),
                visit.page_url.as_str().into(),
                visit.time_spent.into(),
                visit.time_spent_formatted.as_str().into(),
                visit.date_visited.as_str().into(),
            ]
        })
        .collect()
}

/// "Visites de pages" workbook
pub fn page_visits(visits: &[FormattedPageVisit]) -> Result<Vec<u8>, ReportError> {
    sheet("Visites de pages", &PAGE_VISIT_HEADERS, &page_visit_rows(visits))
}

const VIDEO_WATCH_HEADERS: [(&str, f64); 16] = [
    ("ID", 8.0),
    ("ID Utilisateur", 12.0),
    ("Prénom", 15.0),
    ("Nom", 15.0),
    ("Nom complet", 25.0),
    ("Email", 30.0),
    ("ID Vidéo", 20.0),
    ("Auteur", 20.0),
    ("Durée (secondes)", 15.0),
    ("Durée (formaté)", 15.0),
    ("Progression (%)", 12.0),
    ("Progression (formaté)", 15.0),
    ("Complétée", 10.0),
    ("Statut", 15.0),
    ("Date de visualisation", 20.0),
    ("Heure de début", 20.0),
];

pub fn video_watch_rows(watches: &[FormattedVideoWatch]) -> Vec<Vec<Cell>> {
    watches
        .iter()
        .map(|watch| {
            vec![
                watch.id.as_str().into(),
                watch.user_id.as_str().into(),
                watch.first_name.as_str().into(),
                watch.last_name.as_str().into(),
                watch.user_name.as_str().into(),
                watch.user_email.as_str().into(),
                watch.video_id.as_str().into(),
                watch.auteur.as_str().into(),
                watch.duration.into(),
                watch.duration_formatted.as_str().into(),
                watch.progress.into(),
                watch.progress_formatted.as_str().into(),
                if watch.completed { "Oui" } else { "Non" }.into(),
                watch.status.as_str().into(),
                watch.date_visualisation.as_str().into(),
                watch.start_time.as_str().into(),
            ]
        })
        .collect()
}

/// "Vidéos regardées" workbook
pub fn video_watches(watches: &[FormattedVideoWatch]) -> Result<Vec<u8>, ReportError> {
    sheet("Vidéos regardées", &VIDEO_WATCH_HEADERS, &video_watch_rows(watches))
}

const PARTICIPANT_HEADERS: [(&str, f64); 11] = [
    ("Titre", 10.0),
    ("Nom et prénoms", 30.0),
    ("Email", 30.0),
    ("Téléphone", 18.0),
    ("Pays", 15.0),
    ("Spécialité", 20.0),
    ("Lieu d'exercice", 25.0),
    ("Mode de participation", 20.0),
    ("Vidéos vues", 12.0),
    ("Dernière activité", 20.0),
    ("Date d'inscription", 15.0),
];

pub fn participant_rows(participants: &[ParticipantRow]) -> Vec<Vec<Cell>> {
    participants
        .iter()
        .map(|row| {
            vec![
                row.title.as_str().into(),
                row.name.as_str().into(),
                row.email.as_str().into(),
                row.phone.as_str().into(),
                row.country.as_str().into(),
                row.specialty.as_str().into(),
                row.workplace.as_str().into(),
                row.mode.as_str().into(),
                Cell::Number(row.videos_seen as f64),
                row.last_activity.as_str().into(),
                row.registered.as_str().into(),
            ]
        })
        .collect()
}

/// "Participants" workbook
pub fn participants(participants: &[ParticipantRow]) -> Result<Vec<u8>, ReportError> {
    sheet("Participants", &PARTICIPANT_HEADERS, &participant_rows(participants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageVisit, VideoWatch, format_page_visits, format_video_watches};
    use serde_json::json;

    #[test]
    fn one_row_per_visit() {
        let visits: Vec<PageVisit> = serde_json::from_value(json!([
            {"id": 1, "pageUrl": "/a", "timeSpent": 30},
            {"id": 2, "pageUrl": "/b", "timeSpent": null}
        ]))
        .unwrap();
        let rows = page_visit_rows(&format_page_visits(&visits));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), PAGE_VISIT_HEADERS.len());
        assert_eq!(rows[0][7], Cell::Number(30.0));
        assert_eq!(rows[1][7], Cell::Empty);
    }

    #[test]
    fn video_rows_spell_out_completion() {
        let watches: Vec<VideoWatch> =
            serde_json::from_value(json!([{"id": 1, "videoId": "v", "completed": true}])).unwrap();
        let rows = video_watch_rows(&format_video_watches(&watches));
        assert_eq!(rows[0].len(), VIDEO_WATCH_HEADERS.len());
        assert_eq!(rows[0][12], Cell::Text("Oui".into()));
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let bytes = sheet("Test", &[("A", 10.0)], &[vec![Cell::Text("x".into())]]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
