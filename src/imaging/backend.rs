//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify (read dimensions from a header) and resize (decode,
//! scale, re-encode). Both work on in-memory bytes; archive pages never touch
//! the filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the `MockBackend` below.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` because pages are transcoded on a rayon pool that shares one
/// backend reference.
pub trait ImageBackend: Sync {
    /// Read image dimensions without a full decode where possible.
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resize to exactly `params.width`×`params.height`, and encode.
    fn resize(&self, data: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{OutputFormat, Quality};
    use std::sync::Mutex;
    use std::sync::mpsc::Receiver;

    /// Mock backend that understands a tiny textual "image" format.
    ///
    /// Page bytes look like `img:800x600`. Anything else fails to identify
    /// with a decode error; a payload containing `encode-fail` identifies
    /// fine but fails in `resize`. Encoded output is `out:<fmt>:<w>x<h>`.
    ///
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, every `resize` blocks until a message (or hang-up)
        /// arrives, so tests can observe a run mid-flight.
        pub gate: Option<Mutex<Receiver<()>>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    /// Page bytes the mock backend accepts.
    pub fn mock_image(width: u32, height: u32) -> Vec<u8> {
        format!("img:{width}x{height}").into_bytes()
    }

    /// Parse `out:<fmt>:<w>x<h>` back into dimensions.
    pub fn mock_output_dims(data: &[u8]) -> (u32, u32) {
        let text = std::str::from_utf8(data).unwrap();
        let dims = text.rsplit(':').next().unwrap();
        let (w, h) = dims.split_once('x').unwrap();
        (w.parse().unwrap(), h.parse().unwrap())
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn gated(gate: Receiver<()>) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                gate: Some(Mutex::new(gate)),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn parse(data: &[u8]) -> Result<Dimensions, BackendError> {
            let text = std::str::from_utf8(data)
                .map_err(|_| BackendError::Decode("not utf-8".to_string()))?;
            let dims = text
                .strip_prefix("img:")
                .ok_or_else(|| BackendError::Decode(format!("unrecognized data: {text}")))?;
            let dims = dims.split(':').next().unwrap_or(dims);
            let (w, h) = dims
                .split_once('x')
                .ok_or_else(|| BackendError::Decode(format!("bad dimensions: {dims}")))?;
            Ok(Dimensions {
                width: w.parse().map_err(|_| BackendError::Decode(w.to_string()))?,
                height: h.parse().map_err(|_| BackendError::Decode(h.to_string()))?,
            })
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(String::from_utf8_lossy(data).into_owned()));
            Self::parse(data)
        }

        fn resize(&self, data: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: String::from_utf8_lossy(data).into_owned(),
                width: params.width,
                height: params.height,
                format: params.format,
                quality: params.quality.value(),
            });
            if data.windows(11).any(|w| w == b"encode-fail") {
                return Err(BackendError::Encode("mock encoder refused".to_string()));
            }
            Ok(format!("out:{:?}:{}x{}", params.format, params.width, params.height).into_bytes())
        }
    }

    #[test]
    fn mock_identifies_text_image() {
        let backend = MockBackend::new();
        let dims = backend.identify(&mock_image(800, 600)).unwrap();
        assert_eq!(dims, Dimensions { width: 800, height: 600 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "img:800x600"));
    }

    #[test]
    fn mock_rejects_unknown_bytes() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(b"\x89PNG garbage"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();
        let out = backend
            .resize(
                &mock_image(1600, 1200),
                &ResizeParams {
                    width: 800,
                    height: 600,
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!(mock_output_dims(&out), (800, 600));
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 800,
                height: 600,
                quality: 80,
                ..
            }
        ));
    }

    #[test]
    fn mock_encode_failure() {
        let backend = MockBackend::new();
        let result = backend.resize(
            b"img:10x10:encode-fail",
            &ResizeParams {
                width: 10,
                height: 10,
                format: OutputFormat::Gif,
                quality: Quality::default(),
            },
        );
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
