use bytes::Bytes;
use picsee::upload::FileData;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn image_file(name: &str, mime: &str, size: usize) -> FileData {
    FileData {
        name: name.to_string(),
        mime_type: mime.to_string(),
        last_modified: Some(1_700_000_000_000),
        bytes: Bytes::from(vec![0u8; size]),
    }
}
