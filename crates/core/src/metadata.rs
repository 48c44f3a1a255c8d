use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Exif,
    Document,
    Filesystem,
    Fallback,
}

impl ValueSource {
    /// Badge shown next to a proposal.
    pub fn badge(self) -> &'static str {
        match self {
            ValueSource::Exif => "EXIF",
            ValueSource::Document => "document",
            ValueSource::Filesystem => "filesystem",
            ValueSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    #[default]
    Success,
    Partial,
    Failed,
    Unsupported,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    pub date_taken: Option<DateTime<Utc>>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub iso: Option<u32>,
    pub focal_length: Option<f64>,
    pub gps: Option<GpsCoordinates>,
}

impl ImageMetadata {
    /// `make model`, without repeating the make when the model already
    /// starts with it.
    pub fn camera(&self) -> Option<String> {
        let make = non_blank(self.camera_make.as_deref());
        let model = non_blank(self.camera_model.as_deref());
        match (make, model) {
            (Some(make), Some(model)) => {
                if model.to_lowercase().starts_with(&make.to_lowercase()) {
                    Some(model.to_string())
                } else {
                    Some(format!("{} {}", make, model))
                }
            }
            (Some(make), None) => Some(make.to_string()),
            (None, Some(model)) => Some(model.to_string()),
            (None, None) => None,
        }
    }

    pub fn location(&self) -> Option<String> {
        self.gps
            .map(|gps| format!("{:.4},{:.4}", gps.latitude, gps.longitude))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfMetadata {
    pub author: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeMetadata {
    pub creator: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub application: Option<String>,
    pub page_count: Option<u32>,
    pub word_count: Option<u32>,
}

/// Extracted metadata for one file. At most one of the type-specific blocks
/// is populated.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UnifiedMetadata {
    pub image: Option<ImageMetadata>,
    pub pdf: Option<PdfMetadata>,
    pub office: Option<OfficeMetadata>,
    pub extraction_status: ExtractionStatus,
    pub extraction_error: Option<String>,
}

impl UnifiedMetadata {
    pub fn with_image(image: ImageMetadata) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    pub fn with_pdf(pdf: PdfMetadata) -> Self {
        Self {
            pdf: Some(pdf),
            ..Self::default()
        }
    }

    pub fn with_office(office: OfficeMetadata) -> Self {
        Self {
            office: Some(office),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            extraction_status: ExtractionStatus::Failed,
            extraction_error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Document date: PDF creation date, then Office creation date.
    pub fn document_date(&self) -> Option<DateTime<Utc>> {
        self.pdf
            .as_ref()
            .and_then(|pdf| pdf.creation_date)
            .or_else(|| self.office.as_ref().and_then(|office| office.created))
    }

    pub fn document_author(&self) -> Option<&str> {
        self.pdf
            .as_ref()
            .and_then(|pdf| non_blank(pdf.author.as_deref()))
            .or_else(|| {
                self.office
                    .as_ref()
                    .and_then(|office| non_blank(office.creator.as_deref()))
            })
    }

    pub fn document_title(&self) -> Option<&str> {
        self.pdf
            .as_ref()
            .and_then(|pdf| non_blank(pdf.title.as_deref()))
            .or_else(|| {
                self.office
                    .as_ref()
                    .and_then(|office| non_blank(office.title.as_deref()))
            })
    }

    pub fn document_subject(&self) -> Option<&str> {
        self.pdf
            .as_ref()
            .and_then(|pdf| non_blank(pdf.subject.as_deref()))
            .or_else(|| {
                self.office
                    .as_ref()
                    .and_then(|office| non_blank(office.subject.as_deref()))
            })
    }
}

/// A typed value read from a metadata field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Field paths usable in metadata rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetadataField {
    ImageDateTaken,
    ImageCameraMake,
    ImageCameraModel,
    ImageLensModel,
    ImageWidth,
    ImageHeight,
    ImageIso,
    ImageFocalLength,
    ImageGpsLatitude,
    ImageGpsLongitude,
    PdfAuthor,
    PdfTitle,
    PdfSubject,
    PdfCreator,
    PdfProducer,
    PdfCreationDate,
    PdfPageCount,
    OfficeCreator,
    OfficeTitle,
    OfficeSubject,
    OfficeLastModifiedBy,
    OfficeCreated,
    OfficeModified,
    OfficeApplication,
    OfficePageCount,
    OfficeWordCount,
}

const FIELD_PATHS: &[(MetadataField, &str)] = &[
    (MetadataField::ImageDateTaken, "image.dateTaken"),
    (MetadataField::ImageCameraMake, "image.cameraMake"),
    (MetadataField::ImageCameraModel, "image.cameraModel"),
    (MetadataField::ImageLensModel, "image.lensModel"),
    (MetadataField::ImageWidth, "image.width"),
    (MetadataField::ImageHeight, "image.height"),
    (MetadataField::ImageIso, "image.iso"),
    (MetadataField::ImageFocalLength, "image.focalLength"),
    (MetadataField::ImageGpsLatitude, "image.gpsLatitude"),
    (MetadataField::ImageGpsLongitude, "image.gpsLongitude"),
    (MetadataField::PdfAuthor, "pdf.author"),
    (MetadataField::PdfTitle, "pdf.title"),
    (MetadataField::PdfSubject, "pdf.subject"),
    (MetadataField::PdfCreator, "pdf.creator"),
    (MetadataField::PdfProducer, "pdf.producer"),
    (MetadataField::PdfCreationDate, "pdf.creationDate"),
    (MetadataField::PdfPageCount, "pdf.pageCount"),
    (MetadataField::OfficeCreator, "office.creator"),
    (MetadataField::OfficeTitle, "office.title"),
    (MetadataField::OfficeSubject, "office.subject"),
    (MetadataField::OfficeLastModifiedBy, "office.lastModifiedBy"),
    (MetadataField::OfficeCreated, "office.created"),
    (MetadataField::OfficeModified, "office.modified"),
    (MetadataField::OfficeApplication, "office.application"),
    (MetadataField::OfficePageCount, "office.pageCount"),
    (MetadataField::OfficeWordCount, "office.wordCount"),
];

impl MetadataField {
    pub fn path(self) -> &'static str {
        FIELD_PATHS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, path)| *path)
            .unwrap_or("unknown")
    }

    pub fn all() -> impl Iterator<Item = MetadataField> {
        FIELD_PATHS.iter().map(|(field, _)| *field)
    }

    /// Reads the field. Absent blocks, absent values and blank strings all
    /// yield `None`.
    pub fn lookup(self, metadata: &UnifiedMetadata) -> Option<FieldValue> {
        use MetadataField::*;

        let image = metadata.image.as_ref();
        let pdf = metadata.pdf.as_ref();
        let office = metadata.office.as_ref();

        match self {
            ImageDateTaken => image?.date_taken.map(FieldValue::Date),
            ImageCameraMake => text(image?.camera_make.as_deref()),
            ImageCameraModel => text(image?.camera_model.as_deref()),
            ImageLensModel => text(image?.lens_model.as_deref()),
            ImageWidth => number(image?.width),
            ImageHeight => number(image?.height),
            ImageIso => number(image?.iso),
            ImageFocalLength => image?.focal_length.map(FieldValue::Number),
            ImageGpsLatitude => image?.gps.map(|gps| FieldValue::Number(gps.latitude)),
            ImageGpsLongitude => image?.gps.map(|gps| FieldValue::Number(gps.longitude)),
            PdfAuthor => text(pdf?.author.as_deref()),
            PdfTitle => text(pdf?.title.as_deref()),
            PdfSubject => text(pdf?.subject.as_deref()),
            PdfCreator => text(pdf?.creator.as_deref()),
            PdfProducer => text(pdf?.producer.as_deref()),
            PdfCreationDate => pdf?.creation_date.map(FieldValue::Date),
            PdfPageCount => number(pdf?.page_count),
            OfficeCreator => text(office?.creator.as_deref()),
            OfficeTitle => text(office?.title.as_deref()),
            OfficeSubject => text(office?.subject.as_deref()),
            OfficeLastModifiedBy => text(office?.last_modified_by.as_deref()),
            OfficeCreated => office?.created.map(FieldValue::Date),
            OfficeModified => office?.modified.map(FieldValue::Date),
            OfficeApplication => text(office?.application.as_deref()),
            OfficePageCount => number(office?.page_count),
            OfficeWordCount => number(office?.word_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metadata field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for MetadataField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_PATHS
            .iter()
            .find(|(_, path)| path.eq_ignore_ascii_case(s.trim()))
            .map(|(field, _)| *field)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl TryFrom<String> for MetadataField {
    type Error = UnknownField;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetadataField> for String {
    fn from(field: MetadataField) -> Self {
        field.path().to_string()
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn text(value: Option<&str>) -> Option<FieldValue> {
    non_blank(value).map(|s| FieldValue::Text(s.to_string()))
}

fn number(value: Option<u32>) -> Option<FieldValue> {
    value.map(|n| FieldValue::Number(f64::from(n)))
}
