//! One protocol session: form state, signature pads, photo collection and the
//! submission lifecycle that turns them into dispatched documents.

use crate::cli::{DocumentKind, PdfQuality};
use crate::config::Config;
use crate::dispatch::{self, Attachment, EmailDispatch, SubmissionState};
use crate::error::{ProtokolError, Result};
use crate::export;
use crate::form::FormState;
use crate::photos::PhotoCollection;
use crate::protocol;
use crate::record::{collect, FormRecord};
use crate::render;
use crate::signature::SignaturePad;
use crate::store::CounterStore;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// What a submission should do with the collected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    /// Write the documents into the output directory.
    Render(DocumentKind),
    /// Write self-printing HTML pages instead.
    Print(DocumentKind),
    /// Write the documents and compose the client e-mail around them.
    Email,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub artifacts: Vec<PathBuf>,
    pub email: Option<EmailDispatch>,
}

pub struct ReportSession {
    pub form: FormState,
    pub client_signature: SignaturePad,
    pub survey_signature: SignaturePad,
    pub photos: PhotoCollection,
    state: SubmissionState,
}

impl ReportSession {
    /// Open a fresh session: allocates the next protocol number (persisted
    /// immediately) and seeds the form with it.
    pub fn start(counter_dir: &Path, today: NaiveDate) -> Result<Self> {
        let mut store = CounterStore::load(counter_dir);
        let number = protocol::allocate(&mut store, counter_dir, today)?;
        Ok(Self::with_form(FormState::seeded(&number, today)))
    }

    /// Resume over an already loaded form.
    pub fn with_form(form: FormState) -> Self {
        Self {
            form,
            client_signature: SignaturePad::default(),
            survey_signature: SignaturePad::default(),
            photos: PhotoCollection::new(),
            state: SubmissionState::default(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Reset everything except the issued protocol number.
    pub fn clear(&mut self, today: NaiveDate) {
        let number = std::mem::take(&mut self.form.protocol_number);
        self.form = FormState::default();
        self.form.protocol_number = number;
        self.form.intervention_date = today.format("%Y-%m-%d").to_string();
        self.form.pest_rows.push(Default::default());
        self.client_signature.clear();
        self.survey_signature.clear();
        self.photos.clear();
    }

    /// Run one submission. The state walks Validating, Collecting, Rendering
    /// and Dispatching; any failure drops the attempt and the session returns
    /// to `Idle` with its inputs untouched.
    pub fn submit(
        &mut self,
        action: DispatchAction,
        config: &Config,
        out_dir: &Path,
        quality: PdfQuality,
        today: NaiveDate,
    ) -> Result<SubmitOutcome> {
        self.state = SubmissionState::Validating;
        let outcome = self.run(action, config, out_dir, quality, today);
        self.state = SubmissionState::Idle;
        outcome
    }

    fn run(
        &mut self,
        action: DispatchAction,
        config: &Config,
        out_dir: &Path,
        quality: PdfQuality,
        today: NaiveDate,
    ) -> Result<SubmitOutcome> {
        self.form.validate()?;

        self.state = SubmissionState::Collecting;
        let record = collect(&self.form, &self.client_signature, &self.survey_signature, today)?;

        self.state = SubmissionState::Rendering;
        match action {
            DispatchAction::Render(kind) => {
                let artifacts =
                    export::write_artifacts(&record, self.photos.photos(), kind, out_dir, quality)?;
                Ok(SubmitOutcome {
                    artifacts,
                    email: None,
                })
            }
            DispatchAction::Print(kind) => {
                let artifacts = self.write_print_pages(&record, kind, out_dir)?;
                Ok(SubmitOutcome {
                    artifacts,
                    email: None,
                })
            }
            DispatchAction::Email => {
                let artifacts = export::write_artifacts(
                    &record,
                    self.photos.photos(),
                    DocumentKind::Both,
                    out_dir,
                    quality,
                )?;

                self.state = SubmissionState::Dispatching;
                let mut attachments = Vec::with_capacity(artifacts.len());
                for path in &artifacts {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    attachments.push(Attachment::new(name, &std::fs::read(path)?));
                }

                let email = dispatch::compose_email(&record, config, &attachments);
                Ok(SubmitOutcome {
                    artifacts,
                    email: Some(email),
                })
            }
        }
    }

    fn write_print_pages(
        &self,
        record: &FormRecord,
        kind: DocumentKind,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut artifacts = Vec::new();
        let number = &record.protocol_number;

        let protocol_page = || {
            dispatch::build_print_document(
                &format!("Protokol {}", number),
                render::PROTOCOL_CSS,
                &render::render_protocol_body(record),
            )
        };
        let photo_page = || {
            dispatch::build_print_document(
                &format!("Fotografie {}", number),
                render::PHOTO_SHEET_CSS,
                &render::render_photo_sheet_body(self.photos.photos()),
            )
        };

        match kind {
            DocumentKind::Protocol => {
                let path = out_dir.join(format!("tisk_protokol_{}.html", number));
                std::fs::write(&path, protocol_page())?;
                artifacts.push(path);
            }
            DocumentKind::Photos => {
                if self.photos.is_empty() {
                    return Err(ProtokolError::NoPhotos);
                }
                let path = out_dir.join(format!("tisk_foto_{}.html", number));
                std::fs::write(&path, photo_page())?;
                artifacts.push(path);
            }
            DocumentKind::Both => {
                let path = out_dir.join(format!("tisk_protokol_{}.html", number));
                std::fs::write(&path, protocol_page())?;
                artifacts.push(path);

                if !self.photos.is_empty() {
                    let path = out_dir.join(format!("tisk_foto_{}.html", number));
                    std::fs::write(&path, photo_page())?;
                    artifacts.push(path);
                }
            }
        }

        Ok(artifacts)
    }
}
