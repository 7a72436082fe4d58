use chrono::{DateTime, FixedOffset};
use md5::{Digest, Md5};

use crate::error::{PdfError, Result};
use crate::objects::PdfObject;
use crate::writer::text_string;

pub const DEFAULT_PRODUCER: &str = concat!("pdf-engine ", env!("CARGO_PKG_VERSION"));

/// Document information, written to the `/Info` dictionary and, for
/// PDF/A, mirrored into the XMP metadata stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: String,
    pub creation_date: Option<DateTime<FixedOffset>>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        DocumentInfo {
            title: None,
            author: None,
            subject: None,
            creator: None,
            producer: DEFAULT_PRODUCER.to_string(),
            creation_date: None,
        }
    }
}

impl DocumentInfo {
    pub(crate) fn to_dict(&self) -> PdfObject {
        let mut entries = Vec::new();
        let optional = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Creator", &self.creator),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                entries.push((key, text_string(value)));
            }
        }
        entries.push(("Producer", text_string(&self.producer)));
        if let Some(date) = &self.creation_date {
            entries.push(("CreationDate", PdfObject::literal_string(&pdf_date(date))));
        }
        PdfObject::dict(entries)
    }
}

/// Color characterization of the intended output device, required for
/// PDF/A. Written as `/OutputIntents` in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputIntent {
    pub profile: Vec<u8>,
    /// Color components of the profile (1 gray, 3 RGB, 4 CMYK).
    pub components: u8,
    /// Major ICC version from the profile header.
    pub icc_major_version: u8,
    pub identifier: String,
    pub info: Option<String>,
}

impl OutputIntent {
    /// Wrap an ICC profile, reading its color space and version from
    /// the 128-byte profile header.
    pub fn from_icc(profile: Vec<u8>, identifier: impl Into<String>) -> Result<Self> {
        if profile.len() < 128 {
            return Err(PdfError::InvalidArgument(format!(
                "ICC profile too short ({} bytes)",
                profile.len()
            )));
        }
        if &profile[36..40] != b"acsp" {
            return Err(PdfError::InvalidArgument(
                "ICC profile signature 'acsp' not found".to_string(),
            ));
        }
        let components = match &profile[16..20] {
            b"GRAY" => 1,
            b"RGB " => 3,
            b"CMYK" => 4,
            other => {
                return Err(PdfError::InvalidArgument(format!(
                    "unsupported ICC color space '{}'",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        Ok(OutputIntent {
            icc_major_version: profile[8],
            profile,
            components,
            identifier: identifier.into(),
            info: None,
        })
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub(crate) fn alternate_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }

    pub(crate) fn to_dict(&self, profile_ref: PdfObject) -> PdfObject {
        let info = self.info.as_deref().unwrap_or(&self.identifier);
        PdfObject::dict(vec![
            ("Type", PdfObject::name("OutputIntent")),
            ("S", PdfObject::name("GTS_PDFA1")),
            ("OutputConditionIdentifier", text_string(&self.identifier)),
            ("RegistryName", PdfObject::literal_string("http://www.color.org")),
            ("Info", text_string(info)),
            ("DestOutputProfile", profile_ref),
        ])
    }
}

/// `D:YYYYMMDDHHmmSS+HH'mm'`
pub fn pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}

/// ISO 8601 date as used by XMP.
pub fn xmp_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// XMP packet identifying the file as PDF/A-1B and repeating the Info
/// entries, which PDF/A requires to agree.
pub fn build_xmp(info: &DocumentInfo) -> String {
    let mut out = String::new();
    out.push_str("<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
    out.push_str("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n");
    out.push_str("<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n");

    out.push_str("<rdf:Description rdf:about=\"\" xmlns:pdfaid=\"http://www.aiim.org/pdfa/ns/id/\">\n");
    out.push_str("<pdfaid:part>1</pdfaid:part>\n<pdfaid:conformance>B</pdfaid:conformance>\n");
    out.push_str("</rdf:Description>\n");

    out.push_str("<rdf:Description rdf:about=\"\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");
    out.push_str("<dc:format>application/pdf</dc:format>\n");
    if let Some(title) = &info.title {
        out.push_str("<dc:title><rdf:Alt><rdf:li xml:lang=\"x-default\">");
        out.push_str(&escape_xml(title));
        out.push_str("</rdf:li></rdf:Alt></dc:title>\n");
    }
    if let Some(author) = &info.author {
        out.push_str("<dc:creator><rdf:Seq><rdf:li>");
        out.push_str(&escape_xml(author));
        out.push_str("</rdf:li></rdf:Seq></dc:creator>\n");
    }
    if let Some(subject) = &info.subject {
        out.push_str("<dc:description><rdf:Alt><rdf:li xml:lang=\"x-default\">");
        out.push_str(&escape_xml(subject));
        out.push_str("</rdf:li></rdf:Alt></dc:description>\n");
    }
    out.push_str("</rdf:Description>\n");

    out.push_str("<rdf:Description rdf:about=\"\" xmlns:xmp=\"http://ns.adobe.com/xap/1.0/\">\n");
    if let Some(date) = &info.creation_date {
        out.push_str(&format!("<xmp:CreateDate>{}</xmp:CreateDate>\n", xmp_date(date)));
    }
    if let Some(creator) = &info.creator {
        out.push_str(&format!("<xmp:CreatorTool>{}</xmp:CreatorTool>\n", escape_xml(creator)));
    }
    out.push_str("</rdf:Description>\n");

    out.push_str("<rdf:Description rdf:about=\"\" xmlns:pdf=\"http://ns.adobe.com/pdf/1.3/\">\n");
    out.push_str(&format!("<pdf:Producer>{}</pdf:Producer>\n", escape_xml(&info.producer)));
    out.push_str("</rdf:Description>\n");

    out.push_str("</rdf:RDF>\n</x:xmpmeta>\n");
    out.push_str("<?xpacket end=\"w\"?>");
    out
}

/// Deterministic file identifier: MD5 over the metadata and the
/// document body parts supplied by the caller.
pub fn file_identifier<'a, I>(info: &DocumentInfo, body: I) -> [u8; 16]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Md5::new();
    for field in [&info.title, &info.author, &info.subject, &info.creator] {
        hasher.update(field.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(info.producer.as_bytes());
    if let Some(date) = &info.creation_date {
        hasher.update(pdf_date(date).as_bytes());
    }
    for part in body {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut id = [0u8; 16];
    id.copy_from_slice(&digest);
    id
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
