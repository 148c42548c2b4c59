//! Tool profiles
//!
//! Static descriptors for each supported transformation. The registry is the
//! single source of truth for per-tool input constraints.

use crate::error::{ToolkitError, ValidationError};
use serde::Serialize;
use std::fmt;

/// MIME type of every artifact the toolkit produces
pub const PDF_MIME: &str = "application/pdf";

/// Identity of a supported transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum ToolId {
    ImageToPdf,
    MergePdf,
    RotatePdf,
}

impl ToolId {
    /// Resolve a tool from its URL-style slug (e.g. "merge-pdf")
    pub fn from_slug(slug: &str) -> Result<Self, ToolkitError> {
        TOOL_PROFILES
            .iter()
            .find(|profile| profile.slug == slug)
            .map(|profile| profile.id)
            .ok_or_else(|| ToolkitError::UnknownTool(slug.to_string()))
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lookup(*self) {
            Ok(profile) => f.write_str(profile.slug),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// Input constraints and labels for one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolProfile {
    pub id: ToolId,
    /// Stable identifier used by front ends
    pub slug: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// File-picker filter: a MIME pattern ("image/*") or an extension (".pdf")
    pub accept: &'static str,
    pub allows_multiple: bool,
    /// Filename suggested for the downloaded artifact
    pub output_filename: &'static str,
    /// Shown when several files are dropped on a single-file tool
    pub too_many_files_message: &'static str,
}

static TOOL_PROFILES: &[ToolProfile] = &[
    ToolProfile {
        id: ToolId::ImageToPdf,
        slug: "image-to-pdf",
        display_name: "Image to PDF",
        description: "Convert JPG, PNG, and other image formats into a single PDF document with professional quality.",
        accept: "image/*",
        allows_multiple: false,
        output_filename: "images-to-pdf.pdf",
        too_many_files_message: "You can only select one image file.",
    },
    ToolProfile {
        id: ToolId::MergePdf,
        slug: "merge-pdf",
        display_name: "Merge PDFs",
        description: "Combine multiple PDF files into one comprehensive document while maintaining quality.",
        accept: ".pdf",
        allows_multiple: true,
        output_filename: "merged-pdf.pdf",
        too_many_files_message: "This tool only supports one file.",
    },
    ToolProfile {
        id: ToolId::RotatePdf,
        slug: "rotate-pdf",
        display_name: "Rotate PDF",
        description: "Rotate PDF pages to fixed angles (90°, 180°, 270°, 360°) with precision.",
        accept: ".pdf",
        allows_multiple: false,
        output_filename: "rotated-pdf.pdf",
        too_many_files_message: "You can only select one PDF to rotate.",
    },
];

/// Look up the profile registered for a tool
pub fn lookup(id: ToolId) -> Result<&'static ToolProfile, ToolkitError> {
    TOOL_PROFILES
        .iter()
        .find(|profile| profile.id == id)
        .ok_or_else(|| ToolkitError::UnknownTool(format!("{:?}", id)))
}

/// All registered profiles, in dashboard order
pub fn all_profiles() -> &'static [ToolProfile] {
    TOOL_PROFILES
}

impl ToolProfile {
    /// Non-authoritative check of a file against the accept filter.
    ///
    /// Used for hints only; type errors are reported by the engine.
    pub fn accepts(&self, mime_type: &str, name: &str) -> bool {
        self.accept.split(',').map(str::trim).any(|pattern| {
            if let Some(ext) = pattern.strip_prefix('.') {
                let lower = name.to_ascii_lowercase();
                lower.ends_with(&format!(".{}", ext.to_ascii_lowercase()))
                    || (ext.eq_ignore_ascii_case("pdf") && mime_type == PDF_MIME)
            } else if let Some(family) = pattern.strip_suffix("/*") {
                mime_type
                    .split_once('/')
                    .is_some_and(|(major, _)| major.eq_ignore_ascii_case(family))
            } else {
                mime_type.eq_ignore_ascii_case(pattern)
            }
        })
    }

    pub(crate) fn too_many_files(&self) -> ValidationError {
        ValidationError::TooManyFiles {
            tool: self.slug,
            message: self.too_many_files_message.to_string(),
        }
    }

    /// Title of the upload area
    pub fn upload_title(&self) -> &'static str {
        if self.allows_multiple {
            "Upload your files"
        } else {
            "Upload your file"
        }
    }

    /// Label of the process button for `count` staged files
    pub fn process_label(&self, count: usize) -> String {
        format!(
            "Process {} {}",
            count,
            if count == 1 { "file" } else { "files" }
        )
    }

    /// Message shown once an artifact is ready
    pub fn success_message(&self, rotation: RotationAngle) -> String {
        match self.id {
            ToolId::RotatePdf => format!("PDF rotated {}° successfully.", rotation.degrees()),
            _ => "Processing completed successfully. The file is ready for download.".to_string(),
        }
    }
}

/// Rotation angles offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum RotationAngle {
    #[default]
    Deg90,
    Deg180,
    Deg270,
    Deg360,
}

impl RotationAngle {
    pub const ALL: [RotationAngle; 4] = [
        RotationAngle::Deg90,
        RotationAngle::Deg180,
        RotationAngle::Deg270,
        RotationAngle::Deg360,
    ];

    pub fn degrees(self) -> i32 {
        match self {
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
            RotationAngle::Deg360 => 360,
        }
    }
}

impl TryFrom<i32> for RotationAngle {
    type Error = ValidationError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(RotationAngle::Deg90),
            180 => Ok(RotationAngle::Deg180),
            270 => Ok(RotationAngle::Deg270),
            360 => Ok(RotationAngle::Deg360),
            other => Err(ValidationError::InvalidRotationAngle(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_is_registered() {
        for id in [ToolId::ImageToPdf, ToolId::MergePdf, ToolId::RotatePdf] {
            let profile = lookup(id).unwrap();
            assert_eq!(profile.id, id);
        }
    }

    #[test]
    fn test_from_slug() {
        assert_eq!(ToolId::from_slug("merge-pdf").unwrap(), ToolId::MergePdf);
        assert_eq!(ToolId::from_slug("rotate-pdf").unwrap(), ToolId::RotatePdf);
        assert_eq!(ToolId::from_slug("image-to-pdf").unwrap(), ToolId::ImageToPdf);
    }

    #[test]
    fn test_unknown_slug_is_fatal() {
        let err = ToolId::from_slug("split-pdf").unwrap_err();
        assert_eq!(err, ToolkitError::UnknownTool("split-pdf".into()));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_output_filenames() {
        assert_eq!(lookup(ToolId::MergePdf).unwrap().output_filename, "merged-pdf.pdf");
        assert_eq!(lookup(ToolId::RotatePdf).unwrap().output_filename, "rotated-pdf.pdf");
        assert_eq!(
            lookup(ToolId::ImageToPdf).unwrap().output_filename,
            "images-to-pdf.pdf"
        );
    }

    #[test]
    fn test_accepts_extension_filter() {
        let merge = lookup(ToolId::MergePdf).unwrap();
        assert!(merge.accepts("application/pdf", "a.bin"));
        assert!(merge.accepts("", "Report.PDF"));
        assert!(!merge.accepts("image/png", "scan.png"));
    }

    #[test]
    fn test_accepts_mime_family_filter() {
        let images = lookup(ToolId::ImageToPdf).unwrap();
        assert!(images.accepts("image/png", "a.png"));
        assert!(images.accepts("image/webp", "a.webp"));
        assert!(!images.accepts("application/pdf", "a.pdf"));
    }

    #[test]
    fn test_labels() {
        let merge = lookup(ToolId::MergePdf).unwrap();
        assert_eq!(merge.process_label(1), "Process 1 file");
        assert_eq!(merge.process_label(3), "Process 3 files");
        assert_eq!(merge.upload_title(), "Upload your files");

        let rotate = lookup(ToolId::RotatePdf).unwrap();
        assert_eq!(rotate.upload_title(), "Upload your file");
        assert_eq!(
            rotate.success_message(RotationAngle::Deg180),
            "PDF rotated 180° successfully."
        );
    }

    #[test]
    fn test_rotation_angle_conversion() {
        assert_eq!(RotationAngle::default().degrees(), 90);
        for angle in RotationAngle::ALL {
            assert_eq!(RotationAngle::try_from(angle.degrees()).unwrap(), angle);
        }
        assert_eq!(
            RotationAngle::try_from(45),
            Err(ValidationError::InvalidRotationAngle(45))
        );
    }
}
