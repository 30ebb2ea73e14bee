#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use school_records_pdf::RequestRecord;
use tempfile::TempDir;

pub const SAMPLE_RECORD: &str = r#"{
    "id": "65f0c1a2b3",
    "prefix": "นางสาว",
    "name": "สมหญิง ใจดี",
    "document_type": "ปพ.1",
    "id_card": "1103700012345",
    "student_id": "24501",
    "date_of_birth": "2008-02-29",
    "class": "6",
    "room": "2",
    "academic_year": "2567",
    "father_name": "นายสมชาย ใจดี",
    "mother_name": "นางสมศรี ใจดี",
    "purpose": "ใช้ศึกษาต่อระดับมหาวิทยาลัย",
    "created_at": "2025-01-15T03:00:00Z"
}"#;

/// The sample record with some string fields replaced.
pub fn sample_record(patch: &[(&str, &str)]) -> RequestRecord {
    let mut value: serde_json::Value = serde_json::from_str(SAMPLE_RECORD).unwrap();
    for (key, v) in patch {
        value[*key] = serde_json::Value::String(v.to_string());
    }
    serde_json::from_value(value).unwrap()
}

/// A regular and, if present, bold TrueType face from the system font dirs.
/// Tests that embed fonts are skipped when none is installed.
pub fn system_ttf() -> Option<(PathBuf, Option<PathBuf>)> {
    let candidates = [
        (
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        ),
        (
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        ),
        (
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ),
    ];
    candidates.iter().find_map(|(regular, bold)| {
        let regular = Path::new(regular);
        let bold = Path::new(bold);
        regular
            .exists()
            .then(|| (regular.to_path_buf(), bold.exists().then(|| bold.to_path_buf())))
    })
}

/// Copy `src` to `dir/relative`, creating parent directories.
pub fn install(dir: &Path, relative: &str, src: &Path) {
    let dest = dir.join(relative);
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    fs::copy(src, dest).unwrap();
}

/// Write raw bytes to `dir/relative`, creating parent directories.
pub fn install_bytes(dir: &Path, relative: &str, data: &[u8]) {
    let dest = dir.join(relative);
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    fs::write(dest, data).unwrap();
}

/// A solid-colour PNG of the given size.
pub fn png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([180, 140, 20, alpha]));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn empty_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Number of page objects in a PDF written by this crate.
pub fn page_count(pdf: &[u8]) -> usize {
    count(pdf, b"/Type /Page") - count(pdf, b"/Type /Pages")
}

/// Width and height of every `/MediaBox`, in points.
pub fn media_boxes(pdf: &[u8]) -> Vec<(f32, f32)> {
    let text = String::from_utf8_lossy(pdf);
    text.match_indices("/MediaBox [")
        .filter_map(|(i, m)| {
            let rest = &text[i + m.len()..];
            let end = rest.find(']')?;
            let nums: Vec<f32> = rest[..end]
                .split_whitespace()
                .filter_map(|s| s.parse().ok())
                .collect();
            (nums.len() == 4).then(|| (nums[2] - nums[0], nums[3] - nums[1]))
        })
        .collect()
}
