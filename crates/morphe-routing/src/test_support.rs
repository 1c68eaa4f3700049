//! Mock handlers shared by the unit tests in this crate.
//!
//! The fixture population mirrors the repository's scenario suite: an image
//! encoder (`canvasToBlob`), a png-sonification bridge (`meyda`), and a
//! multi-category media swiss-army knife (`ffmpeg`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use morphe_formats::{
    FileData, FormatCache, FormatDescriptor, Handler, HandlerError, HandlerResult, category,
};

pub(crate) struct MockHandler {
    name: &'static str,
    formats: Vec<FormatDescriptor>,
    ready: AtomicBool,
    fail_init: bool,
    fail_convert_to: Option<String>,
    empty_convert_to: Option<String>,
    pub(crate) init_calls: AtomicUsize,
    pub(crate) convert_calls: AtomicUsize,
}

impl MockHandler {
    pub(crate) fn new(name: &'static str, formats: Vec<FormatDescriptor>) -> Self {
        Self {
            name,
            formats,
            ready: AtomicBool::new(false),
            fail_init: false,
            fail_convert_to: None,
            empty_convert_to: None,
            init_calls: AtomicUsize::new(0),
            convert_calls: AtomicUsize::new(0),
        }
    }

    /// Make `init` fail every time.
    pub(crate) fn with_failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Make `convert` fail when producing the given MIME.
    pub(crate) fn failing_convert_to(mut self, mime: &str) -> Self {
        self.fail_convert_to = Some(mime.to_string());
        self
    }

    /// Make `convert` produce zero-length output for the given MIME.
    pub(crate) fn empty_convert_to(mut self, mime: &str) -> Self {
        self.empty_convert_to = Some(mime.to_string());
        self
    }
}

#[async_trait]
impl Handler for MockHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_formats(&self) -> Vec<FormatDescriptor> {
        self.formats.clone()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn init(&self) -> HandlerResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(HandlerError::Init("mock backend unavailable".to_string()));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn convert(
        &self,
        files: Vec<FileData>,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> HandlerResult<Vec<FileData>> {
        self.convert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_convert_to.as_deref() == Some(output.mime.as_str()) {
            return Err(HandlerError::Conversion(format!(
                "mock refuses to produce {}",
                output.mime
            )));
        }
        if self.empty_convert_to.as_deref() == Some(output.mime.as_str()) {
            return Ok(files
                .into_iter()
                .map(|file| FileData::new(file.name, Vec::<u8>::new()))
                .collect());
        }
        Ok(files
            .into_iter()
            .map(|file| {
                let stem = file.name.split('.').next().unwrap_or(&file.name);
                FileData::new(
                    format!("{stem}.{}", output.extension),
                    format!("{}:{}->{}", self.name, input.format, output.format).into_bytes(),
                )
            })
            .collect())
    }
}

pub(crate) fn png(from: bool, to: bool) -> FormatDescriptor {
    FormatDescriptor::new("Portable Network Graphics", "png", "png", "image/png")
        .with_direction(from, to)
        .with_lossless(true)
        .with_category(category::IMAGE)
}

pub(crate) fn jpeg() -> FormatDescriptor {
    FormatDescriptor::new("JPEG Image", "jpeg", "jpg", "image/jpeg")
        .with_direction(true, true)
        .with_category(category::IMAGE)
}

pub(crate) fn webp() -> FormatDescriptor {
    FormatDescriptor::new("WebP Image", "webp", "webp", "image/webp")
        .with_direction(true, true)
        .with_category(category::IMAGE)
}

pub(crate) fn mp3() -> FormatDescriptor {
    FormatDescriptor::new("MP3 Audio", "mp3", "mp3", "audio/mpeg")
        .with_direction(true, true)
        .with_category(category::AUDIO)
}

pub(crate) fn wav(from: bool, to: bool) -> FormatDescriptor {
    FormatDescriptor::new("Waveform Audio", "wav", "wav", "audio/wav")
        .with_direction(from, to)
        .with_lossless(true)
        .with_category(category::AUDIO)
}

pub(crate) fn ogg() -> FormatDescriptor {
    FormatDescriptor::new("Ogg Vorbis", "ogg", "ogg", "audio/ogg")
        .with_direction(true, true)
        .with_category(category::AUDIO)
}

pub(crate) fn mp4() -> FormatDescriptor {
    FormatDescriptor::new("MPEG-4 Video", "mp4", "mp4", "video/mp4")
        .with_direction(true, true)
        .with_category(category::VIDEO)
}

pub(crate) fn webm() -> FormatDescriptor {
    FormatDescriptor::new("WebM Video", "webm", "webm", "video/webm")
        .with_direction(true, true)
        .with_category(category::VIDEO)
}

pub(crate) fn gif() -> FormatDescriptor {
    FormatDescriptor::new("Animated GIF", "gif", "gif", "image/gif")
        .with_direction(true, true)
        .with_categories(&[category::IMAGE, category::VIDEO])
}

/// Image encoder: reads and writes raster images only.
pub(crate) fn canvas_to_blob() -> Arc<dyn Handler> {
    Arc::new(MockHandler::new(
        "canvasToBlob",
        vec![png(true, true), jpeg(), webp()],
    ))
}

/// Sonification bridge: reads a png, writes a wav rendering of it.
pub(crate) fn meyda() -> Arc<dyn Handler> {
    Arc::new(MockHandler::new(
        "meyda",
        vec![png(true, false), wav(false, true)],
    ))
}

/// Media swiss-army knife: audio, video, animated gif, and stills.
pub(crate) fn ffmpeg() -> Arc<dyn Handler> {
    Arc::new(MockHandler::new(
        "ffmpeg",
        vec![
            mp3(),
            wav(true, true),
            ogg(),
            mp4(),
            webm(),
            gif(),
            png(true, true),
            jpeg(),
        ],
    ))
}

/// Cache pre-populated from the handlers' declared formats, as if every
/// `init()` already ran.
pub(crate) fn populate_cache(handlers: &[Arc<dyn Handler>]) -> FormatCache {
    let cache = FormatCache::new();
    for handler in handlers {
        cache.fill(handler.name(), handler.supported_formats());
    }
    cache
}
