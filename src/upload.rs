//! Upload collector: filter candidate files and upload templates one by one.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::Backend;
use crate::session::Session;
use crate::state::UploadedFile;

pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const PPT_MIME: &str = "application/vnd.ms-powerpoint";
const OCTET_STREAM: &str = "application/octet-stream";

/// A user-selected file, read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    /// MIME type reported by the picker, if any.
    pub declared_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            data,
        }
    }

    pub fn with_type(mut self, mime: impl Into<String>) -> Self {
        self.declared_type = Some(mime.into());
        self
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Declared type, else a guess from the extension.
    pub fn content_type(&self) -> &str {
        if let Some(declared) = self.declared_type.as_deref()
            && !declared.is_empty()
        {
            return declared;
        }
        match self.extension().as_deref() {
            Some("pptx") => PPTX_MIME,
            Some("ppt") => PPT_MIME,
            _ => OCTET_STREAM,
        }
    }

    /// Presentation MIME type or a `.ppt`/`.pptx` name.
    pub fn is_presentation(&self) -> bool {
        let by_type = self
            .declared_type
            .as_deref()
            .is_some_and(|t| t == PPT_MIME || t == PPTX_MIME);
        by_type || matches!(self.extension().as_deref(), Some("ppt" | "pptx"))
    }

    pub fn is_pptx(&self) -> bool {
        self.extension().as_deref() == Some("pptx")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub accepted: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl<B: Backend> Session<B> {
    /// Filter `candidates` to presentations and upload them sequentially.
    ///
    /// A failed upload is reported and the loop moves on to the next file.
    pub fn accept_files(&mut self, candidates: Vec<FileHandle>) -> UploadReport {
        let accepted: Vec<FileHandle> = candidates
            .into_iter()
            .filter(FileHandle::is_presentation)
            .collect();

        let mut report = UploadReport {
            accepted: accepted.len(),
            ..UploadReport::default()
        };
        if accepted.is_empty() {
            self.notifier
                .warning("Please select PowerPoint files (.ppt or .pptx)");
            return report;
        }

        for file in &accepted {
            match self.backend.upload_template(file) {
                Ok(resp) => {
                    self.state.add_uploaded_file(UploadedFile {
                        name: file.name.clone(),
                        template_id: resp.template_id,
                        template: resp.template,
                    });
                    report.uploaded += 1;
                    self.notifier
                        .success(format!("Template \"{}\" uploaded successfully", file.name));
                }
                Err(e) => {
                    report.failed += 1;
                    self.notifier
                        .error(format!("Failed to upload \"{}\": {e}", file.name));
                }
            }
        }

        self.upload_summary = self.state.upload_summary();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::fake::{FakeBackend, test_session};
    use crate::notify::NotificationKind;

    #[test]
    fn filters_by_extension_and_type() {
        assert!(FileHandle::new("deck.PPTX", vec![]).is_presentation());
        assert!(FileHandle::new("old.ppt", vec![]).is_presentation());
        assert!(!FileHandle::new("slides.pdf", vec![]).is_presentation());
        assert!(
            FileHandle::new("noext", vec![])
                .with_type(PPTX_MIME)
                .is_presentation()
        );
    }

    #[test]
    fn content_type_guessed_from_extension() {
        assert_eq!(FileHandle::new("a.pptx", vec![]).content_type(), PPTX_MIME);
        assert_eq!(FileHandle::new("a.ppt", vec![]).content_type(), PPT_MIME);
        assert_eq!(FileHandle::new("a.bin", vec![]).content_type(), OCTET_STREAM);
        assert_eq!(
            FileHandle::new("a.pptx", vec![])
                .with_type("application/x-custom")
                .content_type(),
            "application/x-custom"
        );
    }

    #[test]
    fn non_presentations_trigger_warning_without_calls() {
        let mut session = test_session(FakeBackend::default());
        let report = session.accept_files(vec![FileHandle::new("slides.pdf", b"%PDF".to_vec())]);
        assert_eq!(report.accepted, 0);
        assert_eq!(session.backend().calls("upload"), 0);
        assert_eq!(
            session.notifier().last().unwrap().kind,
            NotificationKind::Warning
        );
        assert!(session.state().uploaded_files().is_empty());
    }

    #[test]
    fn mixed_selection_uploads_only_presentations() {
        let mut session = test_session(FakeBackend::default());
        let report = session.accept_files(vec![
            FileHandle::new("deck.pptx", b"PK".to_vec()),
            FileHandle::new("notes.txt", b"hi".to_vec()),
        ]);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.uploaded, 1);
        assert_eq!(session.backend().calls("upload"), 1);
        assert_eq!(session.upload_summary(), "1 template uploaded: deck.pptx");
    }

    #[test]
    fn failed_upload_does_not_stop_the_loop() {
        let backend = FakeBackend::default();
        backend.fail_next("upload", ApiError::Rejected("corrupt file".to_string()));
        let mut session = test_session(backend);
        let report = session.accept_files(vec![
            FileHandle::new("bad.pptx", vec![1]),
            FileHandle::new("good.pptx", vec![2]),
        ]);
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(session.backend().calls("upload"), 2);
        assert_eq!(session.state().uploaded_files()[0].name, "good.pptx");
        assert_eq!(session.upload_summary(), "1 template uploaded: good.pptx");
    }
}
