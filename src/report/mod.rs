//! Downloadable documents: Excel sheets, PDF reports and consent forms.
//!
//! Every builder returns the raw bytes; [`Export`] pairs them with a file
//! name and content type so handlers can hand them straight to the browser.

pub mod consent;
pub mod pdf;
pub mod xlsx;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_MIME: &str = "application/zip";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("excel export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("pdf export failed: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("zip archive failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A generated file ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn pdf(file_name: String, bytes: Vec<u8>) -> Self {
        Export { file_name, content_type: PDF_MIME, bytes }
    }

    pub fn xlsx(file_name: String, bytes: Vec<u8>) -> Self {
        Export { file_name, content_type: XLSX_MIME, bytes }
    }

    pub fn zip(file_name: String, bytes: Vec<u8>) -> Self {
        Export { file_name, content_type: ZIP_MIME, bytes }
    }
}

impl IntoResponse for Export {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// `<stem>-YYYY-MM-DD.<extension>`
pub fn dated_name(stem: &str, today: NaiveDate, extension: &str) -> String {
    format!("{stem}-{}.{extension}", today.format("%Y-%m-%d"))
}

/// Upper-cased ASCII form of a name, safe for a `Content-Disposition` header
pub fn file_component(raw: &str) -> String {
    let mut out = String::new();
    for c in raw.trim().chars() {
        let mapped = match c {
            'à' | 'â' | 'ä' | 'á' | 'À' | 'Â' | 'Ä' | 'Á' => 'A',
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'î' | 'ï' | 'í' | 'Î' | 'Ï' | 'Í' => 'I',
            'ô' | 'ö' | 'ó' | 'Ô' | 'Ö' | 'Ó' => 'O',
            'ù' | 'û' | 'ü' | 'ú' | 'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
            'ç' | 'Ç' => 'C',
            'ñ' | 'Ñ' => 'N',
            c if c.is_ascii_alphanumeric() || c == '-' => c.to_ascii_uppercase(),
            _ => '_',
        };
        out.push(mapped);
    }
    out
}
