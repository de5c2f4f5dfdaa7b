use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use partsplit_core::{
    BRASS_BAND, BackendError, OcrEngine, OcrMode, OcrTrigger, PageImage, PdfBackend,
    ProgressEvent, SplitError, Splitter, SplitterConfigBuilder, TextItem, UNKNOWN_INSTRUMENT,
    analyze,
};
use tokio_util::sync::CancellationToken;

/// In-memory document: one label (as text runs on a single line) per page.
struct MockBackend {
    pages: Vec<Vec<TextItem>>,
    fail_on: Option<usize>,
    text_calls: AtomicUsize,
    render_calls: AtomicUsize,
}

impl MockBackend {
    fn new(labels: &[&str]) -> Self {
        let pages = labels
            .iter()
            .map(|label| {
                label
                    .split_whitespace()
                    .enumerate()
                    .map(|(i, word)| TextItem::new(word, 40.0 + i as f32 * 60.0, 800.0))
                    .collect()
            })
            .collect();
        Self {
            pages,
            fail_on: None,
            text_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, page: usize) -> Self {
        self.fail_on = Some(page);
        self
    }
}

impl PdfBackend for MockBackend {
    fn page_count(&self) -> Result<usize, BackendError> {
        Ok(self.pages.len())
    }

    fn text_items(&self, page: usize) -> Result<Vec<TextItem>, BackendError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(page) {
            return Err(BackendError::ExtractionError("corrupt content stream".into()));
        }
        self.pages
            .get(page - 1)
            .cloned()
            .ok_or(BackendError::PageOutOfRange {
                page,
                total: self.pages.len(),
            })
    }

    fn render_page(&self, page: usize, _scale: f32) -> Result<PageImage, BackendError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageImage { page, png: Vec::new() })
    }
}

/// OCR engine that "reads" a fixed text per page.
struct MockOcr {
    texts: Vec<String>,
    pages_seen: Mutex<Vec<usize>>,
}

impl MockOcr {
    fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            pages_seen: Mutex::new(Vec::new()),
        }
    }

    fn pages_seen(&self) -> Vec<usize> {
        self.pages_seen.lock().unwrap().clone()
    }
}

impl OcrEngine for MockOcr {
    fn recognize(&self, image: &PageImage) -> Result<String, BackendError> {
        self.pages_seen.lock().unwrap().push(image.page);
        Ok(self.texts.get(image.page - 1).cloned().unwrap_or_default())
    }
}

fn summary(splits: &[partsplit_core::Split]) -> Vec<(String, Vec<usize>)> {
    splits
        .iter()
        .map(|s| (s.instrument.clone(), s.pages.clone()))
        .collect()
}

#[test]
fn test_text_layer_splits() {
    let backend = MockBackend::new(&[
        "Solo Cornet",
        "",
        "2nd Cornet",
        "2nd Cornet",
        "Eb Bass",
    ]);
    let ocr = MockOcr::new(&[]);
    let splits = analyze(&backend, &BRASS_BAND, Some(&ocr)).unwrap();

    assert_eq!(
        summary(&splits),
        vec![
            ("Solo Cornet".to_string(), vec![1, 2]),
            ("2nd Cornet".to_string(), vec![3, 4]),
            ("Eb Bass".to_string(), vec![5]),
        ]
    );
    // page 1 detected from the text layer: OCR never engaged
    assert!(ocr.pages_seen().is_empty());
    assert_eq!(backend.render_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.text_calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_pages_partition_document() {
    let backend = MockBackend::new(&[
        "",
        "Flugel",
        "",
        "Baritone",
        "Flugel",
        "",
        "",
        "Tuba",
    ]);
    let splits = analyze(&backend, &BRASS_BAND, None).unwrap();
    let pages: Vec<usize> = splits.iter().flat_map(|s| s.pages.clone()).collect();
    assert_eq!(pages, (1..=8).collect::<Vec<_>>());
    assert_eq!(splits[0].instrument, UNKNOWN_INSTRUMENT);
    assert_eq!(splits[0].pages, vec![1]);
    // reappearance starts a new split
    assert_eq!(splits.iter().filter(|s| s.instrument == "Flugel").count(), 2);
}

#[test]
fn test_empty_document() {
    let backend = MockBackend::new(&[]);
    let splits = analyze(&backend, &BRASS_BAND, None).unwrap();
    assert!(splits.is_empty());
}

#[test]
fn test_short_first_label_switches_to_ocr() {
    let backend = MockBackend::new(&["", "", "", ""]);
    let ocr = MockOcr::new(&["1st Trombone", "", "Bass Trombone", ""]);
    let events = Mutex::new(Vec::new());

    let splits = Splitter::new(&BRASS_BAND)
        .analyze(&backend, Some(&ocr), |event| {
            events.lock().unwrap().push(event);
        })
        .unwrap();

    assert_eq!(
        summary(&splits),
        vec![
            ("1st Trombone".to_string(), vec![1, 2]),
            ("Bass Trombone".to_string(), vec![3, 4]),
        ]
    );
    // page 1 re-read through OCR, every later page through OCR only
    assert_eq!(ocr.pages_seen(), vec![1, 2, 3, 4]);
    assert_eq!(backend.text_calls.load(Ordering::SeqCst), 1);

    let events = events.into_inner().unwrap();
    assert!(matches!(
        events.first(),
        Some(ProgressEvent::OcrModeEnabled {
            trigger: OcrTrigger::ShortLabel
        })
    ));
}

#[test]
fn test_undetected_first_label_switches_to_ocr() {
    let backend = MockBackend::new(&["Fairfield March", "Allegro"]);
    let ocr = MockOcr::new(&["Solo Horn", "ist Horn"]);
    let events = Mutex::new(Vec::new());

    let splits = Splitter::new(&BRASS_BAND)
        .analyze(&backend, Some(&ocr), |event| {
            if let ProgressEvent::OcrModeEnabled { trigger } = event {
                events.lock().unwrap().push(trigger);
            }
        })
        .unwrap();

    assert_eq!(events.into_inner().unwrap(), vec![OcrTrigger::NoDetection]);
    assert_eq!(
        summary(&splits),
        vec![
            ("Solo Horn".to_string(), vec![1]),
            ("1st Horn".to_string(), vec![2]),
        ]
    );
}

#[test]
fn test_missing_ocr_engine_stays_on_text_layer() {
    let backend = MockBackend::new(&["", "Cornet"]);
    let splits = analyze(&backend, &BRASS_BAND, None).unwrap();
    assert_eq!(
        summary(&splits),
        vec![
            (UNKNOWN_INSTRUMENT.to_string(), vec![1]),
            ("Cornet".to_string(), vec![2]),
        ]
    );
    assert_eq!(backend.render_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_ocr_mode_never() {
    let backend = MockBackend::new(&["", "Timpani"]);
    let ocr = MockOcr::new(&["Drums", "Drums"]);
    let config = SplitterConfigBuilder::new()
        .ocr_mode(OcrMode::Never)
        .build()
        .unwrap();

    let splits = Splitter::with_config(&BRASS_BAND, config)
        .analyze(&backend, Some(&ocr), |_| {})
        .unwrap();

    assert!(ocr.pages_seen().is_empty());
    assert_eq!(splits.last().map(|s| s.instrument.as_str()), Some("Timpani"));
}

#[test]
fn test_ocr_mode_always() {
    let backend = MockBackend::new(&["Solo Cornet", "Solo Cornet"]);
    let ocr = MockOcr::new(&["Tuba", "Tuba"]);
    let config = SplitterConfigBuilder::new()
        .ocr_mode(OcrMode::Always)
        .build()
        .unwrap();

    let splits = Splitter::with_config(&BRASS_BAND, config)
        .analyze(&backend, Some(&ocr), |_| {})
        .unwrap();

    assert_eq!(summary(&splits), vec![("Tuba".to_string(), vec![1, 2])]);
    assert_eq!(backend.text_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ocr.pages_seen(), vec![1, 2]);
}

#[test]
fn test_backend_failure_aborts_analysis() {
    let backend = MockBackend::new(&["Solo Cornet", "Solo Cornet", "Tuba"]).failing_on(2);
    let err = analyze(&backend, &BRASS_BAND, None).unwrap_err();
    assert!(matches!(
        err,
        SplitError::Backend(BackendError::ExtractionError(_))
    ));
    assert_eq!(backend.text_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cancelled_before_start() {
    let backend = MockBackend::new(&["Solo Cornet", "Tuba"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = Splitter::new(&BRASS_BAND)
        .analyze_with_cancel(&backend, None, |_| {}, &cancel)
        .unwrap_err();
    assert!(matches!(err, SplitError::Cancelled { page: 1 }));
    assert_eq!(backend.text_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_from_progress_observer() {
    let backend = MockBackend::new(&["Solo Cornet", "Tuba", "Timpani"]);
    let cancel = CancellationToken::new();

    let err = Splitter::new(&BRASS_BAND)
        .analyze_with_cancel(
            &backend,
            None,
            |event| {
                if let ProgressEvent::Page { current: 2, .. } = event {
                    cancel.cancel();
                }
            },
            &cancel,
        )
        .unwrap_err();
    assert!(matches!(err, SplitError::Cancelled { page: 3 }));
}

#[test]
fn test_observer_does_not_change_result() {
    let labels = ["Percussion", "", "Bass Drum", "Timpani", ""];
    let quiet = analyze(&MockBackend::new(&labels), &BRASS_BAND, None).unwrap();

    let closed = Mutex::new(Vec::new());
    let pages = AtomicUsize::new(0);
    let observed = Splitter::new(&BRASS_BAND)
        .analyze(&MockBackend::new(&labels), None, |event| match event {
            ProgressEvent::Page { current, total, .. } => {
                assert_eq!(total, 5);
                assert_eq!(current, pages.fetch_add(1, Ordering::SeqCst) + 1);
            }
            ProgressEvent::SplitClosed { index, split } => {
                closed.lock().unwrap().push((index, split));
            }
            ProgressEvent::OcrModeEnabled { .. } => panic!("OCR not expected"),
        })
        .unwrap();

    assert_eq!(quiet, observed);
    assert_eq!(pages.load(Ordering::SeqCst), 5);

    let closed = closed.into_inner().unwrap();
    assert_eq!(closed.len(), observed.len());
    for (i, (index, split)) in closed.iter().enumerate() {
        assert_eq!(*index, i);
        assert_eq!(split, &observed[i]);
    }
}

#[test]
fn test_extra_instrument_from_config() {
    let backend = MockBackend::new(&["Solo Cornet", "Cornet Cadenza"]);
    let config = SplitterConfigBuilder::new()
        .add_instrument("Cornet Cadenza".to_string())
        .build()
        .unwrap();
    let splitter = Splitter::with_config(&BRASS_BAND, config);
    assert!(
        splitter
            .instruments()
            .exact_match("cornet cadenza")
            .is_some()
    );

    let splits = splitter.analyze(&backend, None, |_| {}).unwrap();
    assert_eq!(splits.len(), 2);
    assert_eq!(splits[1].instrument, "Cornet Cadenza");
}

#[test]
fn test_unknown_ensemble() {
    let config = SplitterConfigBuilder::new().build().unwrap();
    assert!(matches!(
        Splitter::for_ensemble("string-quartet", config),
        Err(SplitError::UnknownEnsemble(_))
    ));
}
