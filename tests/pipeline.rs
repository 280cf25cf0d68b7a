mod common;

use std::fs;

use common::{TextDecoder, gray_pixels, image_file};
use dicom_windowing::{
    Config, Error, ImageSource, ImagingPipeline, Processor, UploadSessionStore,
};
use tempfile::TempDir;

fn pipeline(processor: Processor) -> ImagingPipeline<TextDecoder> {
    ImagingPipeline::with_decoder(TextDecoder, &Config::default().with_processor(processor))
}

#[test]
fn test_process_one_uses_default_window() {
    let bytes = image_file("AX T1", &[&[-2000, 0], &[1000, 2000]]);
    let processed = pipeline(Processor::Sequential)
        .process_one(ImageSource::Bytes(&bytes))
        .unwrap();

    assert_eq!(processed.metadata.window_width, 4000.0);
    assert_eq!(processed.metadata.window_center, 0.0);
    assert_eq!(processed.metadata.image_width, 2);
    assert_eq!(processed.metadata.image_height, 2);
    assert_eq!(processed.metadata.series_description, "AX T1");
    assert_eq!(processed.metadata.modality, "CT");

    let (width, height, pixels) = gray_pixels(&processed.encoded);
    assert_eq!((width, height), (2, 2));
    assert_eq!(pixels, vec![0, 128, 191, 255]);
}

#[test]
fn test_process_one_from_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("one.dcm");
    fs::write(&path, image_file("", &[&[5, 5, 5]])).unwrap();

    let processed = pipeline(Processor::Sequential)
        .process_one(ImageSource::Path(&path))
        .unwrap();
    assert_eq!(processed.metadata.window_width, 1.0);
    assert_eq!(processed.metadata.window_center, 5.0);
    let (_, _, pixels) = gray_pixels(&processed.encoded);
    assert_eq!(pixels, vec![128, 128, 128]);
}

#[test]
fn test_process_one_empty_grid() {
    let bytes = image_file("empty", &[]);
    let result = pipeline(Processor::Sequential).process_one(ImageSource::Bytes(&bytes));
    assert!(matches!(result, Err(Error::EmptyGrid)));
}

fn populated_session(temp_dir: &TempDir) -> (UploadSessionStore, dicom_windowing::UploadSession) {
    let store =
        UploadSessionStore::new(&Config::default().with_upload_root(temp_dir.path())).unwrap();
    let session = store.create_session().unwrap();
    let files = [
        ("b.dcm", image_file("second", &[&[0, 100]])),
        ("a.dcm", image_file("first", &[&[-50, 50], &[0, 10]])),
        ("c.dcm", image_file("third", &[&[200, 600]])),
        ("notes.txt", b"not an image".to_vec()),
    ];
    store.accept_batch(&session, files).unwrap();
    (store, session)
}

#[test]
fn test_list_series_in_scanner_order() {
    for processor in [Processor::Sequential, Processor::Parallel] {
        let temp_dir = TempDir::new().unwrap();
        let (_store, session) = populated_session(&temp_dir);

        let listing = pipeline(processor).list_series(&session).unwrap();
        let names: Vec<_> = listing
            .files
            .iter()
            .map(|entry| entry.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.dcm", "b.dcm", "c.dcm"], "{processor:?}");

        let descriptions: Vec<_> = listing
            .files
            .iter()
            .map(|entry| entry.series_description.as_str())
            .collect();
        assert_eq!(descriptions, ["first", "second", "third"]);

        let keys: Vec<_> = listing.files.iter().map(|entry| entry.ordering_key).collect();
        assert_eq!(keys, [0.0, 50.0, 400.0]);

        assert_eq!(listing.first_image.metadata.series_description, "first");
        assert_eq!(listing.first_image.metadata.image_height, 2);
        let (width, height, _) = gray_pixels(&listing.first_image.encoded);
        assert_eq!((width, height), (2, 2));
    }
}

#[test]
fn test_list_series_empty_session() {
    let temp_dir = TempDir::new().unwrap();
    let store =
        UploadSessionStore::new(&Config::default().with_upload_root(temp_dir.path())).unwrap();
    let session = store.create_session().unwrap();
    let result = pipeline(Processor::Sequential).list_series(&session);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_list_series_propagates_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let (store, session) = populated_session(&temp_dir);
    store
        .accept_file(&session, "d.dcm", b"broken\n1 two 3\n")
        .unwrap();
    let result = pipeline(Processor::Parallel).list_series(&session);
    assert!(matches!(result, Err(Error::Decode(_))));
}

#[test]
fn test_render_with_caller_window() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ct.dcm");
    fs::write(&path, image_file("", &[&[-160, 40, 240, 1000]])).unwrap();

    let encoded = pipeline(Processor::Sequential)
        .render(&path, 40.0, 400.0)
        .unwrap();
    let (width, height, pixels) = gray_pixels(&encoded);
    assert_eq!((width, height), (4, 1));
    assert_eq!(pixels, vec![0, 128, 255, 255]);
}

#[test]
fn test_render_rejects_zero_width() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ct.dcm");
    fs::write(&path, image_file("", &[&[1, 2]])).unwrap();

    let result = pipeline(Processor::Sequential).render(&path, 40.0, 0.0);
    assert!(matches!(result, Err(Error::InvalidWindow { .. })));
}

#[test]
fn test_render_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result =
        pipeline(Processor::Sequential).render(&temp_dir.path().join("gone.dcm"), 40.0, 400.0);
    assert!(matches!(result, Err(Error::NotFound(_))));
}
