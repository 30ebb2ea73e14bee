//! The request form as data.
//!
//! Every line of the printed form is one [`FormBlock`] with a fixed offset
//! from the top margin. Moving a field means editing its descriptor here;
//! the layout walker in `layout.rs` never hardcodes a coordinate.

use crate::fonts::Weight;
use crate::locale::{self, LocalDate};
use crate::model::{DocumentVariant, Officials, RequestRecord};

pub(crate) const BODY_SIZE: f32 = 14.0;
pub(crate) const TITLE_SIZE: f32 = 16.0;
pub(crate) const LINE_HEIGHT: f32 = 6.0;
pub(crate) const CREST_WIDTH: f32 = 25.0;

/// What a draw operation belongs to. Used for tests and debug output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    Crest,
    Title,
    Address,
    RequestDate,
    Subject,
    Addressee,
    Applicant,
    NationalId,
    ClassRoom,
    StudentId,
    AcademicYear,
    BirthDate,
    Guardians,
    Declaration,
    Purpose,
    Attachments,
    Closing,
    ApplicantSignature,
    SignatureRule,
    CommentHeaders,
    Choices,
    OfficialSignatures,
}

/// Horizontal extent, either absolute or relative to the printable width.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Span {
    Mm(f32),
    Printable(f32),
    /// Up to the right margin (cells only).
    ToMargin,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Align {
    Left,
    Center,
}

/// Values pulled from the request at layout time.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Slot {
    Title,
    Subject,
    Declaration,
    RequestDate,
    Applicant,
    NationalId,
    ClassRoom,
    StudentId,
    AcademicYear,
    BirthDay,
    BirthMonth,
    BirthYear,
    Father,
    Mother,
    Purpose,
    ApplicantParen,
    RegistrarParen,
    DirectorParen,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Content {
    Literal(&'static str),
    Slot(Slot),
    /// A slot that wraps onto continuation lines instead of overflowing.
    Flowing(Slot),
    /// Outline circle at the cell's left edge: an unticked choice.
    ChoiceMark,
}

/// Data a conditional cell depends on. Cells whose condition is false are
/// not drawn at all: no label, no blank rule.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Condition {
    ClassRoom,
    AcademicYear,
    Guardians,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Cell {
    pub(crate) field: FieldId,
    pub(crate) width: Span,
    pub(crate) content: Content,
    pub(crate) align: Align,
    pub(crate) when: Option<Condition>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Row {
    /// Offset of the row's top edge from the top margin.
    pub(crate) top: f32,
    pub(crate) indent: Span,
    pub(crate) height: f32,
    pub(crate) size: f32,
    pub(crate) weight: Weight,
    pub(crate) cells: &'static [Cell],
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum FormBlock {
    /// Crest image centred on the printable width, only when one resolved.
    Crest { top: f32, width: f32 },
    Row(Row),
    /// Full-width horizontal rule.
    Rule { field: FieldId, top: f32, width: f32 },
}

const fn cell(field: FieldId, width: Span, content: Content, align: Align) -> Cell {
    Cell {
        field,
        width,
        content,
        align,
        when: None,
    }
}

const fn label(field: FieldId, width: Span, text: &'static str) -> Cell {
    cell(field, width, Content::Literal(text), Align::Left)
}

const fn only_when(mut c: Cell, condition: Condition) -> Cell {
    c.when = Some(condition);
    c
}

const fn line(top: f32, indent: Span, cells: &'static [Cell]) -> FormBlock {
    FormBlock::Row(Row {
        top,
        indent,
        height: LINE_HEIGHT,
        size: BODY_SIZE,
        weight: Weight::Regular,
        cells,
    })
}

macro_rules! text_line {
    ($field:expr, $top:expr, $indent:expr, $text:expr) => {
        line(
            $top,
            Span::Mm($indent),
            &[label($field, Span::Mm(10.0), $text)],
        )
    };
}

macro_rules! centered_line {
    ($field:expr, $top:expr, $indent:expr, $content:expr) => {
        line(
            $top,
            Span::Mm($indent),
            &[cell($field, Span::Mm(10.0), $content, Align::Center)],
        )
    };
}

use Align::{Center, Left};
use Content::{ChoiceMark, Literal};
use FieldId as F;

const SCHOOL_X: f32 = 130.0;
const SIGN_X: f32 = 120.0;
const HALF: Span = Span::Printable(0.5);

// The identity row splits 45% / 55% of the printable width between the
// name block and the national-id + class block.
const NAME_LABEL: Span = Span::Printable(0.45 * 0.2);
const NAME_VALUE: Span = Span::Printable(0.45 * 0.8);
const ID_LABEL: Span = Span::Printable(0.55 * 0.38);
const ID_VALUE: Span = Span::Printable(0.55 * 0.32);
const CLASS_LABEL: Span = Span::Printable(0.55 * 0.3 * 0.28);
const CLASS_VALUE: Span = Span::Printable(0.55 * 0.3 * 0.72);

/// The form, in draw order.
pub(crate) const FORM: &[FormBlock] = &[
    FormBlock::Crest {
        top: -1.0,
        width: CREST_WIDTH,
    },
    FormBlock::Row(Row {
        top: 18.0,
        indent: Span::Mm(0.0),
        height: 18.0,
        size: TITLE_SIZE,
        weight: Weight::Bold,
        cells: &[cell(F::Title, Span::ToMargin, Content::Slot(Slot::Title), Center)],
    }),
    line(39.0, Span::Mm(SCHOOL_X), &[label(F::Address, Span::Printable(1.0), "โรงเรียนโพนงามพิทยานุกูล")]),
    line(45.0, Span::Mm(SCHOOL_X), &[label(F::Address, Span::Printable(1.0), "ต. โพนงาม  อ. โกสุมพิสัย")]),
    line(51.0, Span::Mm(SCHOOL_X), &[label(F::Address, Span::Printable(1.0), "จ.มหาสารคาม 44140")]),
    line(
        60.0,
        HALF,
        &[cell(F::RequestDate, Span::ToMargin, Content::Slot(Slot::RequestDate), Left)],
    ),
    line(
        68.0,
        Span::Mm(0.0),
        &[cell(F::Subject, Span::Printable(1.0), Content::Slot(Slot::Subject), Left)],
    ),
    line(
        77.0,
        Span::Mm(0.0),
        &[label(F::Addressee, Span::Printable(1.0), "เรียน   ผู้อำนวยการโรงเรียนโพนงามพิทยานุกูล")],
    ),
    line(
        90.0,
        Span::Mm(9.0),
        &[
            label(F::Applicant, NAME_LABEL, "ข้าพเจ้า: _____________________________________"),
            cell(F::Applicant, NAME_VALUE, Content::Slot(Slot::Applicant), Center),
            label(F::NationalId, ID_LABEL, "เลขประจำตัวประชาชน:____________________"),
            cell(F::NationalId, ID_VALUE, Content::Slot(Slot::NationalId), Left),
            only_when(label(F::ClassRoom, CLASS_LABEL, "ชั้น: _______"), Condition::ClassRoom),
            only_when(
                cell(F::ClassRoom, CLASS_VALUE, Content::Slot(Slot::ClassRoom), Left),
                Condition::ClassRoom,
            ),
        ],
    ),
    line(
        100.0,
        Span::Mm(0.0),
        &[
            label(F::StudentId, Span::Mm(15.0), "รหัสนักเรียน:______________"),
            cell(F::StudentId, Span::Mm(30.0), Content::Slot(Slot::StudentId), Center),
            only_when(
                label(F::AcademicYear, Span::Mm(15.0), "ปีการศึกษา: _______________"),
                Condition::AcademicYear,
            ),
            only_when(
                cell(F::AcademicYear, Span::Mm(30.0), Content::Slot(Slot::AcademicYear), Center),
                Condition::AcademicYear,
            ),
            label(F::BirthDate, Span::Mm(13.0), "เกิดวันที่: _____"),
            cell(F::BirthDate, Span::Mm(10.0), Content::Slot(Slot::BirthDay), Center),
            label(F::BirthDate, Span::Mm(13.0), "เดือน: _______________"),
            cell(F::BirthDate, Span::Mm(24.0), Content::Slot(Slot::BirthMonth), Center),
            label(F::BirthDate, Span::Mm(6.0), "พ.ศ.: ________"),
            cell(F::BirthDate, Span::Mm(20.0), Content::Slot(Slot::BirthYear), Center),
        ],
    ),
    line(
        111.0,
        Span::Mm(0.0),
        &[
            only_when(
                label(F::Guardians, Span::Mm(15.0), "บิดาชื่อ: ___________________________________________"),
                Condition::Guardians,
            ),
            only_when(
                cell(F::Guardians, Span::Mm(72.0), Content::Slot(Slot::Father), Center),
                Condition::Guardians,
            ),
            only_when(
                label(F::Guardians, Span::Mm(15.0), "มารดาชื่อ: ________________________________________"),
                Condition::Guardians,
            ),
            only_when(
                cell(F::Guardians, Span::Mm(72.0), Content::Slot(Slot::Mother), Center),
                Condition::Guardians,
            ),
        ],
    ),
    line(
        121.0,
        Span::Mm(0.0),
        &[cell(F::Declaration, Span::Printable(1.0), Content::Slot(Slot::Declaration), Left)],
    ),
    line(
        131.0,
        Span::Mm(0.0),
        &[
            label(
                F::Purpose,
                Span::Mm(10.0),
                "เพื่อ: _______________________________________________________________________________________________",
            ),
            cell(F::Purpose, Span::Mm(160.0), Content::Flowing(Slot::Purpose), Left),
        ],
    ),
    text_line!(F::Attachments, 141.0, 9.0, "ทั้งนี้  ข้าพเจ้าได้แนบเอกสารหลักฐานต่างๆ มาด้วยแล้ว"),
    text_line!(F::Attachments, 148.0, 18.0, "1. รูปถ่ายขนาด 1.5 นิ้ว (ถ่ายไว้ไม่เกิน 6 เดือน)    จำนวน 2 รูป"),
    text_line!(F::Attachments, 155.0, 18.0, "2. สำเนาบัตรประชาชน (กรณีเป็นศิษย์เก่า)"),
    text_line!(F::Attachments, 162.0, 18.0, "3. ใบแจ้งความเอกสารหาย (กรณีหายหรือชำรุด)"),
    text_line!(F::Closing, 172.0, 9.0, "จึงเรียนมาเพื่อโปรดพิจารณา"),
    centered_line!(F::Closing, 179.0, SIGN_X, Literal("ขอแสดงความนับถือ")),
    centered_line!(F::ApplicantSignature, 193.0, SIGN_X, Literal("ลงชื่อ ______________________________")),
    centered_line!(F::ApplicantSignature, 200.0, SIGN_X, Content::Slot(Slot::ApplicantParen)),
    FormBlock::Rule {
        field: F::SignatureRule,
        top: 211.0,
        width: 0.2,
    },
    FormBlock::Row(Row {
        top: 214.0,
        indent: Span::Mm(0.0),
        height: LINE_HEIGHT,
        size: BODY_SIZE,
        weight: Weight::Bold,
        cells: &[
            label(F::CommentHeaders, HALF, "ความเห็นนายทะเบียน"),
            label(F::CommentHeaders, Span::Mm(10.0), "ความเห็นผู้อำนวยการ"),
        ],
    }),
    line(
        224.0,
        Span::Mm(9.0),
        &[
            label(F::Choices, Span::Mm(18.0), "เห็นควร"),
            cell(F::Choices, Span::Mm(5.0), ChoiceMark, Left),
            label(F::Choices, Span::Mm(20.0), "อนุญาต"),
            cell(F::Choices, Span::Mm(5.0), ChoiceMark, Left),
            label(F::Choices, Span::Mm(40.0), "ไม่อนุญาต"),
            label(F::Choices, Span::Mm(18.0), "เห็นควร"),
            cell(F::Choices, Span::Mm(5.0), ChoiceMark, Left),
            label(F::Choices, Span::Mm(20.0), "อนุญาต"),
            cell(F::Choices, Span::Mm(5.0), ChoiceMark, Left),
            label(F::Choices, Span::Mm(10.0), "ไม่อนุญาต"),
        ],
    ),
    line(
        239.0,
        Span::Mm(0.0),
        &[
            cell(F::OfficialSignatures, HALF, Literal("ลงนาม ______________________________"), Center),
            cell(F::OfficialSignatures, HALF, Literal("ลงนาม ______________________________"), Center),
        ],
    ),
    line(
        246.0,
        Span::Mm(0.0),
        &[
            cell(F::OfficialSignatures, HALF, Content::Slot(Slot::RegistrarParen), Center),
            cell(F::OfficialSignatures, HALF, Content::Slot(Slot::DirectorParen), Center),
        ],
    ),
    line(
        253.0,
        Span::Mm(0.0),
        &[
            cell(F::OfficialSignatures, HALF, Literal("___/___/___"), Center),
            cell(F::OfficialSignatures, HALF, Literal("___/___/___"), Center),
        ],
    ),
];

/// Everything the form prints, pre-formatted once per render.
#[derive(Clone, Debug)]
pub struct FormContext {
    pub variant: DocumentVariant,
    pub request_date: String,
    pub applicant: String,
    pub national_id: String,
    pub class_room: Option<String>,
    pub student_id: String,
    pub academic_year: Option<String>,
    pub birth_date: LocalDate,
    pub father_name: String,
    pub mother_name: String,
    pub purpose: String,
    pub registrar: String,
    pub director: String,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl FormContext {
    pub fn new(record: &RequestRecord, officials: &Officials) -> Self {
        Self {
            variant: locale::normalize_document_type(&record.document_type),
            request_date: locale::request_date_line(&record.created_at),
            applicant: record.applicant_name(),
            national_id: record.id_card.trim().to_string(),
            class_room: record.class_room(),
            student_id: record.student_id.trim().to_string(),
            academic_year: non_empty(&record.academic_year),
            birth_date: locale::parse_birth_date(&record.date_of_birth),
            father_name: record.father_name.trim().to_string(),
            mother_name: record.mother_name.trim().to_string(),
            purpose: record.purpose.trim().to_string(),
            registrar: officials.registrar_name.clone(),
            director: officials.director_name.clone(),
        }
    }

    pub(crate) fn holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::ClassRoom => self.class_room.is_some(),
            Condition::AcademicYear => self.academic_year.is_some(),
            Condition::Guardians => !self.father_name.is_empty() || !self.mother_name.is_empty(),
        }
    }

    pub(crate) fn slot(&self, slot: Slot) -> String {
        let text = self.variant.text();
        match slot {
            Slot::Title => text.title.to_string(),
            Slot::Subject => text.subject.to_string(),
            Slot::Declaration => text.declaration.to_string(),
            Slot::RequestDate => self.request_date.clone(),
            Slot::Applicant => self.applicant.clone(),
            Slot::NationalId => self.national_id.clone(),
            Slot::ClassRoom => self.class_room.clone().unwrap_or_default(),
            Slot::StudentId => self.student_id.clone(),
            Slot::AcademicYear => self.academic_year.clone().unwrap_or_default(),
            Slot::BirthDay => self.birth_date.day_text(),
            Slot::BirthMonth => self.birth_date.month_name.to_string(),
            Slot::BirthYear => self.birth_date.year_text(),
            Slot::Father => self.father_name.clone(),
            Slot::Mother => self.mother_name.clone(),
            Slot::Purpose => self.purpose.clone(),
            Slot::ApplicantParen => format!("( {} )", self.applicant),
            Slot::RegistrarParen => format!("( {} )", self.registrar),
            Slot::DirectorParen => format!("( {} )", self.director),
        }
    }
}
