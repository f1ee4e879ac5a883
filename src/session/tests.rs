use std::fs;
use std::sync::Arc;
use std::thread;

use image::ColorType;

use crate::config::{Config, RenderConfig};
use crate::error::{AppError, ErrorKind};
use crate::fixtures::{FixturePage, build_pdf, unique_temp_path};

use super::{PageDetails, Session};

fn two_page_pdf() -> Vec<u8> {
    build_pdf(&[
        FixturePage::text(200.0, 300.0, "first page"),
        FixturePage::text(200.0, 300.0, "second page"),
    ])
}

#[test]
fn two_page_document_renders_requested_size() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    assert_eq!(session.page_count(&doc).expect("page count"), 2);

    let page = session.open_page(&doc, 0).expect("page should open");
    assert_eq!(
        session.page_details(&page).expect("details"),
        PageDetails {
            width: 200,
            height: 300
        }
    );

    let render = session.render(&page, 100, 150).expect("render should succeed");
    assert_eq!((render.width, render.height), (100, 150));
    assert!(!render.bytes.is_empty());

    let decoded = image::load_from_memory(&render.bytes).expect("output should decode");
    assert_eq!((decoded.width(), decoded.height()), (100, 150));
    assert_eq!(decoded.color(), ColorType::Rgb8);
}

#[test]
fn every_page_reports_positive_details() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(build_pdf(&[
            FixturePage::blank(612.0, 792.0),
            FixturePage::blank(99.6, 0.6),
            FixturePage::blank(842.0, 595.0),
        ]))
        .expect("document should open");

    for index in 0..session.page_count(&doc).expect("page count") {
        let page = session.open_page(&doc, index).expect("page should open");
        let details = session.page_details(&page).expect("details");
        assert!(details.width > 0 && details.height > 0, "page {index}: {details:?}");
    }
}

#[test]
fn render_scales_instead_of_cropping() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(build_pdf(&[FixturePage::blank(200.0, 300.0).with_rect(
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 100.0, 150.0],
        )]))
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    let render = session.render(&page, 80, 40).expect("render should succeed");
    let rgb = image::load_from_memory(&render.bytes)
        .expect("output should decode")
        .to_rgb8();
    assert_eq!(rgb.dimensions(), (80, 40));

    // PDF origin is bottom-left: the black quarter lands bottom-left.
    assert_eq!(rgb.get_pixel(10, 35).0, [0, 0, 0]);
    assert_eq!(rgb.get_pixel(70, 5).0, [255, 255, 255]);
    assert_eq!(rgb.get_pixel(70, 35).0, [255, 255, 255]);
    assert_eq!(rgb.get_pixel(10, 5).0, [255, 255, 255]);
}

#[test]
fn render_preserves_channel_order() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(build_pdf(&[FixturePage::filled(100.0, 100.0, [1.0, 0.0, 0.0])]))
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    let render = session.render(&page, 16, 16).expect("render should succeed");
    let rgb = image::load_from_memory(&render.bytes)
        .expect("output should decode")
        .to_rgb8();
    assert_eq!(rgb.get_pixel(8, 8).0, [255, 0, 0]);
}

#[test]
fn filled_page_covers_last_row_and_column() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(build_pdf(&[
            FixturePage::filled(200.0, 300.0, [0.0, 0.0, 1.0]),
            FixturePage::filled(99.6, 141.3, [0.0, 0.0, 1.0]),
        ]))
        .expect("document should open");

    let is_blue = |[r, g, b]: [u8; 3]| r < 16 && g < 16 && b > 239;
    for index in 0..2 {
        let page = session.open_page(&doc, index).expect("page should open");
        for width in 1..=120 {
            let height = width + 7;
            let render = session
                .render(&page, width, height)
                .expect("render should succeed");
            let rgb = image::load_from_memory(&render.bytes)
                .expect("output should decode")
                .to_rgb8();
            assert_eq!(rgb.dimensions(), (width, height));

            let last_column = rgb.get_pixel(width - 1, height / 2).0;
            let last_row = rgb.get_pixel(width / 2, height - 1).0;
            assert!(
                is_blue(last_column) && is_blue(last_row),
                "page {index} at {width}x{height}: last column {last_column:?}, last row {last_row:?}"
            );
        }
    }
}

#[test]
fn annotation_appearance_is_rendered() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(build_pdf(&[FixturePage::blank(200.0, 200.0)
            .with_square_annotation([1.0, 0.0, 0.0], [50.0, 50.0, 100.0, 100.0])]))
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    let render = session.render(&page, 200, 200).expect("render should succeed");
    let rgb = image::load_from_memory(&render.bytes)
        .expect("output should decode")
        .to_rgb8();
    assert_eq!(rgb.get_pixel(100, 100).0, [255, 0, 0]);
    assert_eq!(rgb.get_pixel(10, 10).0, [255, 255, 255]);
}

#[test]
fn zero_dimensions_fail_with_invalid_input() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    let err = session.render(&page, 0, 150).expect_err("zero width must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = session.render(&page, 100, 0).expect_err("zero height must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn oversized_render_fails_with_resource_exhaustion() {
    let session = Session::new(Config {
        render: RenderConfig {
            max_pixels: 10_000,
            ..RenderConfig::default()
        },
        ..Config::default()
    });
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    let err = session.render(&page, 101, 100).expect_err("render exceeds budget");
    assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
    assert!(session.render(&page, 100, 100).is_ok());
}

#[test]
fn out_of_range_page_is_invalid_not_an_error() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");

    let page = session.open_page(&doc, 99).expect("invalid page still registers");
    assert_eq!(
        session.page_details(&page).expect("sentinel details"),
        PageDetails::default()
    );
    let err = session.render(&page, 10, 10).expect_err("invalid page cannot render");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn corrupt_document_reports_zero_pages() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(b"definitely not a pdf".to_vec())
        .expect("invalid document still registers");

    assert_eq!(session.page_count(&doc).expect("sentinel page count"), 0);
    let page = session.open_page(&doc, 0).expect("invalid page still registers");
    assert!(!session.lookup_page(&page).expect("page is registered").is_valid());
}

#[test]
fn open_from_path_matches_open_from_bytes() {
    let session = Session::default();
    let path = unique_temp_path("session.pdf");
    fs::write(&path, two_page_pdf()).expect("test file should be created");

    let doc = session.open_document_path(&path).expect("document should open");
    assert_eq!(session.page_count(&doc).expect("page count"), 2);

    let missing = session
        .open_document_path(unique_temp_path("absent.pdf"))
        .expect("unreadable path still registers");
    assert_eq!(session.page_count(&missing).expect("sentinel page count"), 0);

    fs::remove_file(&path).expect("test file should be removed");
}

#[test]
fn same_bytes_opened_twice_get_distinct_ids() {
    let session = Session::default();
    let first = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let second = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    assert_ne!(first, second);

    session.close_document(&first).expect("close should succeed");
    assert_eq!(session.page_count(&second).expect("page count"), 2);
    let page = session.open_page(&second, 1).expect("page should open");
    assert!(session.render(&page, 20, 30).is_ok());
}

#[test]
fn ids_are_shared_between_documents_and_pages() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");
    let other = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");

    let ids: Vec<u64> = [&doc, &page, &other]
        .iter()
        .map(|id| id.parse().expect("ids are numeric"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn closing_document_makes_its_pages_stale() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    session.close_document(&doc).expect("close should succeed");

    let err = session.render(&page, 10, 10).expect_err("page should be stale");
    assert!(matches!(err, AppError::StaleHandle(_)));
    let err = session.page_details(&page).expect_err("page should be stale");
    assert_eq!(err.kind(), ErrorKind::StaleHandle);
    session.close_page(&page).expect("stale page can still be closed");
}

#[test]
fn closed_ids_fail_with_stale_handle() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");

    session.close_page(&page).expect("close should succeed");
    assert_eq!(
        session.render(&page, 10, 10).expect_err("page is closed").kind(),
        ErrorKind::StaleHandle
    );
    assert_eq!(
        session.close_page(&page).expect_err("double close").kind(),
        ErrorKind::StaleHandle
    );
    assert_eq!(
        session.close_document(&page).expect_err("page id is not a document").kind(),
        ErrorKind::StaleHandle
    );
    assert_eq!(
        session.open_page("9999", 0).expect_err("unknown document").kind(),
        ErrorKind::StaleHandle
    );

    session.close_document(&doc).expect("close should succeed");
    assert_eq!(
        session.page_count(&doc).expect_err("document is closed").kind(),
        ErrorKind::StaleHandle
    );
}

#[test]
fn engine_restarts_after_last_document_closes() {
    let session = Session::default();
    assert!(!session.engine_running());

    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 0).expect("page should open");
    assert!(session.engine_running());

    session.close_document(&doc).expect("close should succeed");
    assert!(!session.engine_running());
    assert_eq!(session.live_documents(), 0);
    assert_eq!(session.live_pages(), 1);

    let reopened = session
        .open_document_bytes(two_page_pdf())
        .expect("document should reopen");
    assert!(session.engine_running());
    assert_eq!(session.engine_starts(), 2);

    let fresh = session.open_page(&reopened, 1).expect("page should open");
    assert!(session.render(&fresh, 50, 75).is_ok());
    assert_eq!(
        session.render(&page, 50, 75).expect_err("old page stays stale").kind(),
        ErrorKind::StaleHandle
    );
}

#[test]
fn close_all_tears_down_engine() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    session.open_page(&doc, 0).expect("page should open");

    session.close_all();
    assert_eq!(session.live_documents(), 0);
    assert_eq!(session.live_pages(), 0);
    assert!(!session.engine_running());
}

#[test]
fn identical_requests_render_identical_bytes() {
    let session = Session::default();
    let doc = session
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    let page = session.open_page(&doc, 1).expect("page should open");

    let first = session.render(&page, 64, 96).expect("render should succeed");
    let second = session.render(&page, 64, 96).expect("render should succeed");
    assert_eq!(first, second);
}

#[test]
fn concurrent_renders_across_documents_succeed() {
    let session = Arc::new(Session::default());
    let pages: Vec<String> = (0..4)
        .map(|_| {
            let doc = session
                .open_document_bytes(two_page_pdf())
                .expect("document should open");
            session.open_page(&doc, 0).expect("page should open")
        })
        .collect();

    let workers: Vec<_> = pages
        .into_iter()
        .enumerate()
        .map(|(n, page)| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                let width = 40 + n as u32;
                let render = session.render(&page, width, 60).expect("render should succeed");
                let decoded = image::load_from_memory(&render.bytes).expect("output should decode");
                assert_eq!((decoded.width(), decoded.height()), (width, 60));
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker should not panic");
    }

    assert!(session.engine_running());
}

#[test]
fn shared_session_is_one_instance() {
    let first = Session::shared();
    let second = Session::shared();
    assert!(std::ptr::eq(first, second));
    assert!(!first.config().encode.mime_type.is_empty());

    let doc = first
        .open_document_bytes(two_page_pdf())
        .expect("document should open");
    assert_eq!(second.page_count(&doc).expect("page count"), 2);
    second.close_document(&doc).expect("close should succeed");
}
