use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A student's document request as handed over by the record store.
///
/// Optional fields use the empty string for "not present"; they are never
/// `Option`, so a missing JSON key and an empty value mean the same thing.
#[derive(Clone, Debug, Deserialize)]
pub struct RequestRecord {
    pub id: String,
    #[serde(default)]
    pub prefix: String,
    pub name: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub id_card: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub father_name: String,
    #[serde(default)]
    pub mother_name: String,
    #[serde(default)]
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

impl RequestRecord {
    /// Prefix and name joined the way the form prints them ("นายสมชาย ใจดี").
    pub fn applicant_name(&self) -> String {
        format!("{}{}", self.prefix, self.name).trim().to_string()
    }

    /// `class/room`, or `None` when both halves are empty.
    pub fn class_room(&self) -> Option<String> {
        let class = self.class.trim();
        let room = self.room.trim();
        if class.is_empty() && room.is_empty() {
            None
        } else {
            Some(format!("{class}/{room}"))
        }
    }

    pub fn has_guardians(&self) -> bool {
        !self.father_name.trim().is_empty() || !self.mother_name.trim().is_empty()
    }
}

/// Names printed under the registrar and director signature lines.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Officials {
    #[serde(default)]
    pub registrar_name: String,
    #[serde(default)]
    pub director_name: String,
}

impl Officials {
    pub fn new(registrar_name: impl Into<String>, director_name: impl Into<String>) -> Self {
        Self {
            registrar_name: registrar_name.into(),
            director_name: director_name.into(),
        }
    }

    /// Stand-in names for a school that has not configured its officials yet.
    pub fn placeholder() -> Self {
        Self::new("นายทะเบียน (ยังไม่ได้กำหนด)", "ผู้อำนวยการ (ยังไม่ได้กำหนด)")
    }
}

/// Page size and margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    /// A4 portrait with the margins of the printed form.
    pub const A4_FORM: PageGeometry = PageGeometry {
        page_width: 210.0,
        page_height: 297.0,
        margin_left: 18.0,
        margin_right: 18.0,
        margin_top: 12.0,
        margin_bottom: 18.0,
    };

    pub fn printable_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Lowest y a block may reach before it spills onto a new page.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4_FORM
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DocumentVariant {
    /// ใบระเบียนแสดงผลการเรียน (รบ.1 / ปพ.1)
    #[default]
    StandardTranscriptRequest,
    /// ใบรับรองผลการศึกษา (ปพ.7)
    CertificateRequest,
}

/// The variant-specific sentences of the form.
#[derive(Clone, Copy, Debug)]
pub struct VariantText {
    pub title: &'static str,
    pub subject: &'static str,
    pub declaration: &'static str,
}

const TRANSCRIPT_TEXT: VariantText = VariantText {
    title: "คำร้องขอใบระเบียนแสดงผลการเรียน(รบ.1/ปพ.1)",
    subject: "เรื่อง    ขอใบระเบียนแสดงผลการเรียน(รบ.1/ปพ.1)",
    declaration: "มีความประสงค์จะขอใบระเบียนแสดงผลการเรียน(รบ.1/ปพ.1) จำนวน 1 ฉบับ",
};

const CERTIFICATE_TEXT: VariantText = VariantText {
    title: "คำร้องขอใบรับรองผลการศึกษา(ปพ.7)",
    subject: "เรื่อง    ขอใบรับรองผลการศึกษา(ปพ.7)",
    declaration: "มีความประสงค์จะขอใบรับรองผลการศึกษา(ปพ.7) จำนวน 1 ฉบับ",
};

impl DocumentVariant {
    pub fn text(self) -> &'static VariantText {
        match self {
            DocumentVariant::StandardTranscriptRequest => &TRANSCRIPT_TEXT,
            DocumentVariant::CertificateRequest => &CERTIFICATE_TEXT,
        }
    }

    /// Canonical document-type label as stored by the request form.
    pub fn label(self) -> &'static str {
        match self {
            DocumentVariant::StandardTranscriptRequest => "ปพ.1",
            DocumentVariant::CertificateRequest => "ปพ.7",
        }
    }
}
