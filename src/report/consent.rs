use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::pdf::{Orientation, PdfWriter};
use super::{Export, ReportError, file_component};
use crate::format::generated_at;
use crate::models::User;

pub const ARCHIVE_NAME: &str = "fiches_consentement.zip";

pub const CLAUSES: [&str; 4] = [
    "1- Autoriser ROCHE à vous partager des informations sur ses produits, services et des données scientifiques par des canaux digitaux.",
    "2- Recevoir des communications régulières concernant les aires thérapeutiques de roche.",
    "3- L'utilisation de vos informations professionnelles dans le respect des normes éthiques et légales.",
    "4- La possibilité de retirer votre consentement à tout moment, sans conséquence.",
];

/// Characters per line for 10pt Helvetica on a portrait page
const WRAP_WIDTH: usize = 95;

/// Splits `text` on spaces so no line exceeds `width` characters
///
/// A single word longer than `width` is kept whole on its own line.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// `FICHE_CONSENTEMENT_<PRENOM>_<NOM>.pdf`
pub fn file_name(user: &User) -> String {
    format!(
        "FICHE_CONSENTEMENT_{}_{}.pdf",
        file_component(user.first_name.as_deref().unwrap_or("")),
        file_component(user.last_name.as_deref().unwrap_or(""))
    )
}

/// Consent form of one participant
pub fn consent_pdf(user: &User, now: DateTime<Utc>) -> Result<Vec<u8>, ReportError> {
    let row = user.participant_row();
    let mut pdf = PdfWriter::new("Formulaire de consentement", Orientation::Portrait)?;

    pdf.line("Formulaire de consentement", 18.0, true);
    pdf.gap(6.0);
    pdf.line("Informations participant-e :", 12.0, true);
    pdf.gap(2.0);

    let details = [
        ("Titre", row.title),
        ("Nom", row.name),
        ("Spécialité", row.specialty),
        ("Pays", row.country),
        ("Téléphone", row.phone),
        ("Email", row.email),
        ("Mode de participation", row.mode),
        ("Date inscription", row.registered),
    ];
    for (label, value) in details {
        let value = if value.is_empty() { "-".to_string() } else { value };
        pdf.line(&format!("{label} : {value}"), 10.0, false);
    }

    pdf.gap(6.0);
    pdf.line("Vous consentez à :", 12.0, true);
    pdf.gap(2.0);
    for clause in CLAUSES {
        for line in wrap(clause, WRAP_WIDTH) {
            pdf.line(&line, 10.0, false);
        }
        pdf.gap(2.0);
    }

    pdf.gap(10.0);
    pdf.line("Signature :", 12.0, true);
    pdf.gap(25.0);
    pdf.line(&format!("Document généré le {}", generated_at(now)), 8.0, false);

    pdf.finish()
}

/// Consent forms of the selected participants
///
/// One participant gives their PDF; several give a ZIP with one PDF each.
/// Returns `None` when nothing was selected.
pub fn bundle(users: &[User], now: DateTime<Utc>) -> Result<Option<Export>, ReportError> {
    match users {
        [] => Ok(None),
        [user] => Ok(Some(Export::pdf(file_name(user), consent_pdf(user, now)?))),
        _ => {
            let mut archive = zip::ZipWriter::new(Cursor::new(Vec::new()));
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            let mut seen = HashSet::new();

            for user in users {
                let mut name = file_name(user);
                if !seen.insert(name.clone()) {
                    name = name.replace(".pdf", &format!("_{}.pdf", file_component(&user.id)));
                    seen.insert(name.clone());
                }
                archive.start_file(name, options)?;
                archive.write_all(&consent_pdf(user, now)?)?;
            }

            let bytes = archive.finish()?.into_inner();
            Ok(Some(Export::zip(ARCHIVE_NAME.to_string(), bytes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{PDF_MIME, ZIP_MIME};
    use chrono::TimeZone;
    use serde_json::json;

    fn participant(id: u32, first: &str, last: &str) -> User {
        serde_json::from_value(json!({
            "id": id,
            "firstName": first,
            "lastName": last,
            "email": "p@example.com",
            "createdAt": "2025-02-01T10:00:00Z"
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, 10, 30, 0).unwrap()
    }

    #[test]
    fn wraps_on_words() {
        let lines = wrap(CLAUSES[0], 40);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= 40));
        assert_eq!(lines.join(" "), CLAUSES[0]);
    }

    #[test]
    fn file_name_uses_participant_name() {
        assert_eq!(
            file_name(&participant(1, "Aïssatou", "Sow")),
            "FICHE_CONSENTEMENT_AISSATOU_SOW.pdf"
        );
    }

    #[test]
    fn empty_selection_gives_nothing() {
        assert!(bundle(&[], now()).unwrap().is_none());
    }

    #[test]
    fn single_selection_gives_pdf() {
        let export = bundle(&[participant(1, "Awa", "Diop")], now()).unwrap().unwrap();
        assert_eq!(export.content_type, PDF_MIME);
        assert_eq!(export.file_name, "FICHE_CONSENTEMENT_AWA_DIOP.pdf");
        assert!(export.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn several_selections_give_archive() {
        let users = [
            participant(1, "Awa", "Diop"),
            participant(2, "Awa", "Diop"),
            participant(3, "Moussa", "Fall"),
        ];
        let export = bundle(&users, now()).unwrap().unwrap();
        assert_eq!(export.content_type, ZIP_MIME);
        assert_eq!(export.file_name, ARCHIVE_NAME);

        let archive = zip::ZipArchive::new(Cursor::new(export.bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        let names: HashSet<&str> = archive.file_names().collect();
        assert!(names.contains("FICHE_CONSENTEMENT_AWA_DIOP_2.pdf"));
    }
}
