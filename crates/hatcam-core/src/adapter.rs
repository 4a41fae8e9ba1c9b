//! Face detector adapter: lazy, single-flight engine initialization and a
//! one-shot detection entry point.

use crate::types::{BoundingBox, Frame};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

#[derive(Error, Debug)]
#[error("model load failed: {0}")]
pub struct ModelLoadError(pub String);

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detection assets failed to load: {0}")]
    ModelLoad(#[from] ModelLoadError),
    #[error("frame source invalid: {0}")]
    FrameSource(String),
    #[error("detection engine fault: {0}")]
    Engine(String),
}

/// External single-face detection capability.
///
/// `Ok(None)` means no face in the frame, which is never an error;
/// `Err` means the engine itself faulted.
pub trait FaceEngine: Send + 'static {
    fn detect_single_face(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, DetectionError>;
}

/// Wraps a [`FaceEngine`] behind lazy initialization.
///
/// The loader runs at most once per successful load: concurrent callers
/// before completion await the same in-flight initialization rather than
/// triggering duplicate loads. A load failure surfaces as
/// [`DetectionError::ModelLoad`] to whichever caller hit it first, and the
/// next call retries.
pub struct FaceDetectorAdapter<E: FaceEngine> {
    engine: OnceCell<Arc<Mutex<E>>>,
    loader: Box<dyn Fn() -> Result<E, ModelLoadError> + Send + Sync>,
}

impl<E: FaceEngine> FaceDetectorAdapter<E> {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<E, ModelLoadError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Load detection assets if they are not loaded yet. Idempotent.
    pub async fn initialize(&self) -> Result<(), DetectionError> {
        self.cell().await.map(|_| ())
    }

    /// Run one detection pass over the frame, initializing first if needed.
    ///
    /// The engine call is blocking inference, so it runs on the blocking
    /// pool rather than stalling runtime workers; the engine mutex keeps
    /// at most one pass executing at a time.
    pub async fn detect_once(&self, frame: Frame) -> Result<Option<BoundingBox>, DetectionError> {
        let engine = Arc::clone(self.cell().await?);
        tokio::task::spawn_blocking(move || {
            let mut engine = engine.blocking_lock();
            engine.detect_single_face(&frame)
        })
        .await
        .map_err(|e| DetectionError::Engine(format!("detection task join failed: {e}")))?
    }

    async fn cell(&self) -> Result<&Arc<Mutex<E>>, DetectionError> {
        self.engine
            .get_or_try_init(|| async {
                let engine = (self.loader)()?;
                tracing::info!("detection engine initialized");
                Ok::<_, ModelLoadError>(Arc::new(Mutex::new(engine)))
            })
            .await
            .map_err(DetectionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NullEngine;

    impl FaceEngine for NullEngine {
        fn detect_single_face(
            &mut self,
            _frame: &Frame,
        ) -> Result<Option<BoundingBox>, DetectionError> {
            Ok(None)
        }
    }

    fn frame() -> Frame {
        Frame {
            data: vec![0; 16],
            width: 4,
            height: 4,
        }
    }

    #[tokio::test]
    async fn test_initialize_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let adapter = Arc::new(FaceDetectorAdapter::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(NullEngine)
        }));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let adapter = Arc::clone(&adapter);
            tasks.push(tokio::spawn(async move { adapter.initialize().await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detect_once_initializes_lazily() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let adapter = FaceDetectorAdapter::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(NullEngine)
        });

        assert_eq!(loads.load(Ordering::SeqCst), 0);
        let result = adapter.detect_once(frame()).await.unwrap();
        assert!(result.is_none());
        adapter.detect_once(frame()).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_as_detection_error() {
        let adapter: FaceDetectorAdapter<NullEngine> =
            FaceDetectorAdapter::new(|| Err(ModelLoadError("missing model".into())));

        let err = adapter.detect_once(frame()).await.unwrap_err();
        assert!(matches!(err, DetectionError::ModelLoad(_)));
    }

    #[tokio::test]
    async fn test_load_retries_after_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let adapter = FaceDetectorAdapter::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ModelLoadError("transient".into()))
            } else {
                Ok(NullEngine)
            }
        });

        assert!(adapter.initialize().await.is_err());
        assert!(adapter.initialize().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
