pub mod pdf;

use crate::cli::{DocumentKind, PdfQuality};
use crate::error::{ProtokolError, Result};
use crate::photos::Photo;
use crate::record::FormRecord;
use crate::render;
use std::path::{Path, PathBuf};

pub fn protocol_file_name(protocol_number: &str) -> String {
    format!("protokol_{}.html", protocol_number)
}

pub fn photos_file_name(protocol_number: &str) -> String {
    format!("fotodokumentace_{}.pdf", protocol_number)
}

/// Write the protocol document into `out_dir`.
pub fn write_protocol_html(record: &FormRecord, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(protocol_file_name(&record.protocol_number));
    std::fs::write(&path, render::render_protocol(record))?;
    Ok(path)
}

/// Write the photos PDF into `out_dir`. Fails when the collection is empty.
pub fn write_photo_pdf(
    record: &FormRecord,
    photos: &[Photo],
    out_dir: &Path,
    quality: PdfQuality,
) -> Result<PathBuf> {
    let path = out_dir.join(photos_file_name(&record.protocol_number));
    pdf::generate_photo_pdf(photos, &path, quality)?;
    Ok(path)
}

/// Produce the requested documents, in protocol-then-photos order.
///
/// Asking explicitly for the photos document without photos is an error;
/// `Both` silently narrows to the protocol alone when no photos were added.
pub fn write_artifacts(
    record: &FormRecord,
    photos: &[Photo],
    kind: DocumentKind,
    out_dir: &Path,
    quality: PdfQuality,
) -> Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();

    match kind {
        DocumentKind::Protocol => {
            artifacts.push(write_protocol_html(record, out_dir)?);
        }
        DocumentKind::Photos => {
            if photos.is_empty() {
                return Err(ProtokolError::NoPhotos);
            }
            artifacts.push(write_photo_pdf(record, photos, out_dir, quality)?);
        }
        DocumentKind::Both => {
            artifacts.push(write_protocol_html(record, out_dir)?);
            if !photos.is_empty() {
                artifacts.push(write_photo_pdf(record, photos, out_dir, quality)?);
            }
        }
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::record::collect;
    use crate::signature::SignaturePad;
    use chrono::NaiveDate;

    fn record() -> FormRecord {
        let mut form = FormState::default();
        form.protocol_number = "2025_0012".into();
        collect(
            &form,
            &SignaturePad::default(),
            &SignaturePad::default(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_artifact_names_carry_protocol_number() {
        assert_eq!(protocol_file_name("2025_0012"), "protokol_2025_0012.html");
        assert_eq!(
            photos_file_name("2025_0012"),
            "fotodokumentace_2025_0012.pdf"
        );
    }

    #[test]
    fn test_protocol_html_written() {
        let dir = tempfile::tempdir().unwrap();
        let paths =
            write_artifacts(&record(), &[], DocumentKind::Both, dir.path(), PdfQuality::Low)
                .unwrap();

        assert_eq!(paths.len(), 1);
        let html = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(html.contains("2025_0012"));
        assert!(html.contains("PROTOKOL O PROVEDENÉ DERATIZACI"));
    }

    #[test]
    fn test_photos_document_requires_photos() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            write_artifacts(&record(), &[], DocumentKind::Photos, dir.path(), PdfQuality::Low)
                .unwrap_err();
        assert!(matches!(err, ProtokolError::NoPhotos));
    }
}
