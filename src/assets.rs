//! Locating the Thai typeface and the crest image on disk.
//!
//! Both are optional. The search walks a prioritized list of base
//! directories and probes fixed relative filenames in each; regular and bold
//! faces are resolved independently, so they may come from different
//! directories. Nothing here ever fails: missing or unusable files only
//! degrade the output (Helvetica instead of Thai glyphs, no crest).

use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};

use ttf_parser::Face;

pub const REGULAR_FONT_FILE: &str = "fonts/THSarabun.ttf";
pub const BOLD_FONT_FILE: &str = "fonts/THSarabun Bold.ttf";
pub const CREST_FILE: &str = "images/garuda.png";

/// Ordered base directories probed for assets, highest priority first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetSearch {
    dirs: Vec<PathBuf>,
}

impl AssetSearch {
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories next to the running executable first, then the working
    /// directory, so a relocated binary still finds assets shipped with it.
    pub fn default_for_process() -> Self {
        let mut dirs = Vec::new();
        match std::env::current_exe() {
            Ok(exe) => {
                if let Some(exe_dir) = exe.parent() {
                    dirs.push(exe_dir.to_path_buf());
                    dirs.push(exe_dir.join("backend"));
                }
            }
            Err(e) => log::debug!("executable location unavailable: {e}"),
        }
        dirs.push(PathBuf::from("."));
        dirs.push(PathBuf::from("backend"));
        Self { dirs }
    }

    /// Put `dir` ahead of every existing candidate.
    pub fn with_dir_first(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.insert(0, dir.into());
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn candidates<'a>(&'a self, relative: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        self.dirs.iter().map(move |d| d.join(relative))
    }
}

#[derive(Clone, Debug)]
pub struct FontFile {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl FontFile {
    /// PostScript-safe name derived from the file name ("THSarabunBold").
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("EmbeddedFont")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect()
    }
}

#[derive(Clone, Debug)]
pub enum FontAsset {
    /// A regular face was found. Without a bold file, bold text is drawn
    /// with the regular face.
    Resolved {
        regular: FontFile,
        bold: Option<FontFile>,
    },
    /// No usable typeface; the built-in Helvetica pair is used and non-Latin
    /// glyphs are not printed.
    Default,
}

impl FontAsset {
    pub fn is_default(&self) -> bool {
        matches!(self, FontAsset::Default)
    }
}

#[derive(Clone, Debug)]
pub struct CrestImage {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl CrestImage {
    /// Height that keeps the aspect ratio at the given width.
    pub fn height_for_width(&self, width: f32) -> f32 {
        if self.pixel_width == 0 {
            return 0.0;
        }
        width * self.pixel_height as f32 / self.pixel_width as f32
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedAssets {
    pub font: FontAsset,
    pub crest: Option<CrestImage>,
}

impl ResolvedAssets {
    /// Helvetica and no crest, without touching the filesystem.
    pub fn fallback() -> Self {
        Self {
            font: FontAsset::Default,
            crest: None,
        }
    }
}

/// Read `path`, treating "not there" as silent absence and every other
/// failure as absence with a warning.
fn read_optional(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(data) => Some(data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("asset candidate {} not present", path.display());
            None
        }
        Err(e) => {
            log::warn!("asset {} exists but is unreadable: {e}", path.display());
            None
        }
    }
}

fn find_font(search: &AssetSearch, relative: &str) -> Option<FontFile> {
    search.candidates(relative).find_map(|path| {
        let data = read_optional(&path)?;
        if let Err(e) = Face::parse(&data, 0) {
            log::warn!("{} is not a usable font ({e}), skipping", path.display());
            return None;
        }
        Some(FontFile { path, data })
    })
}

fn find_crest(search: &AssetSearch) -> Option<CrestImage> {
    search.candidates(CREST_FILE).find_map(|path| {
        let data = read_optional(&path)?;
        let reader = image::ImageReader::with_format(
            BufReader::new(Cursor::new(&data)),
            image::ImageFormat::Png,
        );
        // A full decode: a valid header over a truncated body must not pass.
        match reader.decode() {
            Ok(decoded) if decoded.width() > 0 && decoded.height() > 0 => Some(CrestImage {
                path,
                pixel_width: decoded.width(),
                pixel_height: decoded.height(),
                data,
            }),
            Ok(_) => {
                log::warn!("{} has no pixels, skipping", path.display());
                None
            }
            Err(e) => {
                log::warn!("{} is not a readable PNG ({e}), skipping", path.display());
                None
            }
        }
    })
}

/// Resolve the typeface and crest for one render.
pub fn resolve(search: &AssetSearch) -> ResolvedAssets {
    let regular = find_font(search, REGULAR_FONT_FILE);
    let bold = find_font(search, BOLD_FONT_FILE);

    let font = match (regular, bold) {
        (Some(regular), bold) => {
            if bold.is_none() {
                log::info!(
                    "no bold face found, drawing bold text with {}",
                    regular.path.display()
                );
            }
            FontAsset::Resolved { regular, bold }
        }
        (None, bold) => {
            if let Some(bold) = bold {
                log::debug!("ignoring {} without a regular face", bold.path.display());
            }
            log::warn!(
                "{REGULAR_FONT_FILE} not found in {} candidate dirs; using Helvetica, Thai text will not print",
                search.dirs().len()
            );
            FontAsset::Default
        }
    };

    let crest = find_crest(search);
    if crest.is_none() {
        log::warn!("{CREST_FILE} not found; rendering without crest");
    }

    ResolvedAssets { font, crest }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_falls_back() {
        let assets = resolve(&AssetSearch::new(Vec::<PathBuf>::new()));
        assert!(assets.font.is_default());
        assert!(assets.crest.is_none());
    }

    #[test]
    fn missing_directories_are_not_errors() {
        let search = AssetSearch::new(["/definitely/not/here", "also-not-here"]);
        let assets = resolve(&search);
        assert!(assets.font.is_default());
        assert!(assets.crest.is_none());
    }

    #[test]
    fn with_dir_first_takes_priority() {
        let search = AssetSearch::new(["b", "c"]).with_dir_first("a");
        assert_eq!(
            search.dirs(),
            &[PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
    }

    #[test]
    fn process_search_ends_with_working_dir_candidates() {
        let search = AssetSearch::default_for_process();
        let dirs = search.dirs();
        assert_eq!(dirs[dirs.len() - 2], PathBuf::from("."));
        assert_eq!(dirs[dirs.len() - 1], PathBuf::from("backend"));
    }

    #[test]
    fn base_name_is_postscript_safe() {
        let f = FontFile {
            path: PathBuf::from("fonts/THSarabun Bold.ttf"),
            data: Vec::new(),
        };
        assert_eq!(f.base_name(), "THSarabunBold");
    }

    #[test]
    fn crest_height_keeps_aspect() {
        let crest = CrestImage {
            path: PathBuf::from(CREST_FILE),
            data: Vec::new(),
            pixel_width: 200,
            pixel_height: 240,
        };
        assert_eq!(crest.height_for_width(25.0), 30.0);
    }
}
