//! Mock handler population shared by the integration suites.
//!
//! Three converters mirroring the repository's scenario fixtures: an image
//! encoder (`canvasToBlob`), a png-sonification bridge (`meyda`), and a
//! multi-category media tool (`ffmpeg`).

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use morphe_formats::{
    FileData, FormatDescriptor, FormatOption, Handler, HandlerResult, category,
};
use morphe_routing::{PathNode, SearchTarget};

pub struct MockConverter {
    name: &'static str,
    formats: Vec<FormatDescriptor>,
    ready: AtomicBool,
}

impl MockConverter {
    pub fn new(name: &'static str, formats: Vec<FormatDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            name,
            formats,
            ready: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Handler for MockConverter {
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
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn convert(
        &self,
        files: Vec<FileData>,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> HandlerResult<Vec<FileData>> {
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

fn image(name: &str, tag: &str, ext: &str, mime: &str, lossless: bool) -> FormatDescriptor {
    FormatDescriptor::new(name, tag, ext, mime)
        .with_direction(true, true)
        .with_lossless(lossless)
        .with_category(category::IMAGE)
}

fn audio(name: &str, tag: &str, ext: &str, mime: &str, lossless: bool) -> FormatDescriptor {
    FormatDescriptor::new(name, tag, ext, mime)
        .with_direction(true, true)
        .with_lossless(lossless)
        .with_category(category::AUDIO)
}

fn video(name: &str, tag: &str, ext: &str, mime: &str) -> FormatDescriptor {
    FormatDescriptor::new(name, tag, ext, mime)
        .with_direction(true, true)
        .with_category(category::VIDEO)
}

/// The scenario population, in fixed declaration order.
pub fn handlers() -> Vec<Arc<dyn Handler>> {
    let canvas_to_blob = MockConverter::new(
        "canvasToBlob",
        vec![
            image("Portable Network Graphics", "png", "png", "image/png", true),
            image("JPEG Image", "jpeg", "jpg", "image/jpeg", false),
            image("WebP Image", "webp", "webp", "image/webp", false),
        ],
    );

    let meyda = MockConverter::new(
        "meyda",
        vec![
            FormatDescriptor::new("Portable Network Graphics", "png", "png", "image/png")
                .with_direction(true, false)
                .with_lossless(true)
                .with_category(category::IMAGE),
            FormatDescriptor::new("Waveform Audio", "wav", "wav", "audio/wav")
                .with_direction(false, true)
                .with_lossless(true)
                .with_category(category::AUDIO),
        ],
    );

    let ffmpeg = MockConverter::new(
        "ffmpeg",
        vec![
            audio("MP3 Audio", "mp3", "mp3", "audio/mpeg", false),
            audio("Waveform Audio", "wav", "wav", "audio/wav", true),
            audio("Ogg Vorbis", "ogg", "ogg", "audio/ogg", false),
            video("MPEG-4 Video", "mp4", "mp4", "video/mp4"),
            video("WebM Video", "webm", "webm", "video/webm"),
            FormatDescriptor::new("Animated GIF", "gif", "gif", "image/gif")
                .with_direction(true, true)
                .with_categories(&[category::IMAGE, category::VIDEO]),
            image("Portable Network Graphics", "png", "png", "image/png", true),
            image("JPEG Image", "jpeg", "jpg", "image/jpeg", false),
        ],
    );

    vec![canvas_to_blob, meyda, ffmpeg]
}

/// The `(handler, format)` option for a declared MIME.
pub fn option(handlers: &[Arc<dyn Handler>], handler: &str, mime: &str) -> FormatOption {
    let handler = handlers
        .iter()
        .find(|h| h.name() == handler)
        .unwrap_or_else(|| panic!("handler {handler} configured"));
    let format = handler
        .supported_formats()
        .into_iter()
        .find(|f| f.mime == mime)
        .unwrap_or_else(|| panic!("{} declares {mime}", handler.name()));
    FormatOption {
        handler: Arc::clone(handler),
        format,
        index: 0,
    }
}

/// Source path node for an option.
pub fn source_node(option: &FormatOption) -> PathNode {
    PathNode::new(Arc::clone(&option.handler), option.format.clone())
}

/// Pinned-handler search target for an option.
pub fn search_target(option: &FormatOption) -> SearchTarget {
    SearchTarget::new(Arc::clone(&option.handler), option.format.clone())
}

/// Handler names along a path, source node first.
pub fn handler_names(path: &[PathNode]) -> Vec<String> {
    path.iter()
        .map(|node| node.handler.name().to_string())
        .collect()
}

/// One representative input file.
pub fn input_files() -> Vec<FileData> {
    vec![FileData::new("photo.png", &b"\x89PNG mock pixels"[..])]
}

/// Route search diagnostics land on stderr when `RUST_LOG` asks for them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
