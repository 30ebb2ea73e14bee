mod common;

use school_records_pdf::assets::{BOLD_FONT_FILE, CREST_FILE, REGULAR_FONT_FILE, resolve};
use school_records_pdf::{AssetSearch, FontAsset};

#[test]
fn first_directory_with_a_crest_wins() {
    let first = common::empty_dir();
    let second = common::empty_dir();
    common::install_bytes(first.path(), CREST_FILE, &common::png(20, 30, 255));
    common::install_bytes(second.path(), CREST_FILE, &common::png(50, 50, 255));

    let assets = resolve(&AssetSearch::new([first.path(), second.path()]));
    let crest = assets.crest.unwrap();
    assert_eq!((crest.pixel_width, crest.pixel_height), (20, 30));
    assert!(crest.path.starts_with(first.path()));
}

#[test]
fn unreadable_crest_is_skipped_for_the_next_candidate() {
    let broken = common::empty_dir();
    let good = common::empty_dir();
    common::install_bytes(broken.path(), CREST_FILE, b"\x89PNG truncated");
    common::install_bytes(good.path(), CREST_FILE, &common::png(8, 8, 255));

    let assets = resolve(&AssetSearch::new([broken.path(), good.path()]));
    assert!(assets.crest.unwrap().path.starts_with(good.path()));
}

#[test]
fn crest_with_a_valid_header_but_cut_body_is_skipped() {
    let broken = common::empty_dir();
    let good = common::empty_dir();
    // Signature and IHDR survive; the image data does not.
    let mut cut = common::png(40, 48, 255);
    cut.truncate(8 + 25 + 10);
    common::install_bytes(broken.path(), CREST_FILE, &cut);
    common::install_bytes(good.path(), CREST_FILE, &common::png(8, 8, 255));

    let crest = resolve(&AssetSearch::new([broken.path(), good.path()]))
        .crest
        .unwrap();
    assert!(crest.path.starts_with(good.path()));
    assert_eq!((crest.pixel_width, crest.pixel_height), (8, 8));

    let only_broken = resolve(&AssetSearch::new([broken.path()]));
    assert!(only_broken.crest.is_none());
}

#[test]
fn missing_crest_is_not_an_error() {
    let dir = common::empty_dir();
    let assets = resolve(&AssetSearch::new([dir.path()]));
    assert!(assets.crest.is_none());
    assert!(assets.font.is_default());
}

#[test]
fn regular_and_bold_resolve_independently() {
    let Some((regular, Some(bold))) = common::system_ttf() else {
        println!("  [SKIP] no regular+bold system TrueType pair installed");
        return;
    };
    let bold_dir = common::empty_dir();
    let regular_dir = common::empty_dir();
    common::install(bold_dir.path(), BOLD_FONT_FILE, &bold);
    common::install(regular_dir.path(), REGULAR_FONT_FILE, &regular);

    let assets = resolve(&AssetSearch::new([bold_dir.path(), regular_dir.path()]));
    let FontAsset::Resolved { regular, bold } = assets.font else {
        panic!("expected a resolved font");
    };
    assert!(regular.path.starts_with(regular_dir.path()));
    assert!(bold.unwrap().path.starts_with(bold_dir.path()));
}

#[test]
fn bold_alone_is_not_enough() {
    let Some((_, Some(bold))) = common::system_ttf() else {
        println!("  [SKIP] no bold system TrueType font installed");
        return;
    };
    let dir = common::empty_dir();
    common::install(dir.path(), BOLD_FONT_FILE, &bold);
    assert!(resolve(&AssetSearch::new([dir.path()])).font.is_default());
}

#[test]
fn invalid_font_is_skipped_for_a_later_valid_one() {
    let Some((regular, _)) = common::system_ttf() else {
        println!("  [SKIP] no system TrueType font installed");
        return;
    };
    let junk = common::empty_dir();
    let good = common::empty_dir();
    common::install_bytes(junk.path(), REGULAR_FONT_FILE, b"\0\x01\0\0garbage");
    common::install(good.path(), REGULAR_FONT_FILE, &regular);

    let assets = resolve(&AssetSearch::new([junk.path(), good.path()]));
    match assets.font {
        FontAsset::Resolved { regular, bold } => {
            assert!(regular.path.starts_with(good.path()));
            assert!(bold.is_none());
        }
        FontAsset::Default => panic!("valid font in second directory was not found"),
    }
}

#[test]
fn asset_dir_override_goes_first() {
    let preferred = common::empty_dir();
    let fallback = common::empty_dir();
    common::install_bytes(preferred.path(), CREST_FILE, &common::png(3, 4, 255));
    common::install_bytes(fallback.path(), CREST_FILE, &common::png(9, 9, 255));

    let search = AssetSearch::new([fallback.path()]).with_dir_first(preferred.path());
    let crest = resolve(&search).crest.unwrap();
    assert_eq!(crest.pixel_width, 3);
}
