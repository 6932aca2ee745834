//! Client-side checks run before a request is built.
//!
//! Attachment limits mirror what the service accepts: at most four files,
//! 5 MiB each, 20 MiB combined, images or videos only. The service remains
//! the authority; these checks only spare a round trip.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::ValidationError;

pub const MAX_FILES: usize = 4;
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const MAX_TOTAL_SIZE: u64 = 20 * 1024 * 1024;

/// Upper bound of the rating scale.
pub const MAX_RATING: f32 = 5.0;

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, sniffing its MIME type from content and name.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let data = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = sniff_mime(&data, &name).to_string();
        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_media(&self) -> bool {
        self.mime_type.starts_with("image/") || self.mime_type.starts_with("video/")
    }
}

/// Guess a MIME type from magic bytes, then from the file extension.
pub fn sniff_mime(data: &[u8], name: &str) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.len() >= 8 && &data[4..8] == b"ftyp" {
        return "video/mp4";
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }

    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// The files attached to a testimonial being composed.
///
/// `add_files` is all-or-nothing: a batch that breaks any limit is rejected
/// as a whole and the set is left unchanged.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    files: Vec<Attachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[Attachment] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn can_add_more(&self) -> bool {
        self.files.len() < MAX_FILES
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(Attachment::size).sum()
    }

    /// Validate and append a batch. Returns the number of files added.
    pub fn add_files(&mut self, batch: Vec<Attachment>) -> Result<usize, ValidationError> {
        if self.files.len() + batch.len() > MAX_FILES {
            return Err(ValidationError::TooManyFiles {
                max: MAX_FILES,
                current: self.files.len(),
                adding: batch.len(),
            });
        }
        for file in &batch {
            if !file.is_media() {
                return Err(ValidationError::InvalidFileType {
                    name: file.name.clone(),
                    mime: file.mime_type.clone(),
                });
            }
            if file.size() > MAX_FILE_SIZE {
                return Err(ValidationError::FileTooLarge {
                    name: file.name.clone(),
                    size: file.size(),
                    max: MAX_FILE_SIZE,
                });
            }
        }
        let total = self.total_size() + batch.iter().map(Attachment::size).sum::<u64>();
        if total > MAX_TOTAL_SIZE {
            return Err(ValidationError::TotalTooLarge {
                total,
                max: MAX_TOTAL_SIZE,
            });
        }

        let added = batch.len();
        self.files.extend(batch);
        tracing::debug!(added, total = self.files.len(), "attachments added");
        Ok(added)
    }

    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

/// Trimmed, non-empty moderation feedback.
pub fn validate_feedback(feedback: &str) -> Result<String, ValidationError> {
    let trimmed = feedback.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyFeedback);
    }
    Ok(trimmed.to_string())
}

/// A rating is a decimal string between 0 and `MAX_RATING`.
pub fn validate_rating(rating: &str) -> Result<(), ValidationError> {
    match rating.trim().parse::<f32>() {
        Ok(value) if (0.0..=MAX_RATING).contains(&value) => Ok(()),
        _ => Err(ValidationError::InvalidRating(rating.to_string())),
    }
}
