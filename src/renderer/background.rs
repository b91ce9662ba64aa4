use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::BackgroundSourceConfig;

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no image files in {0}")]
    EmptySequence(PathBuf),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn load(path: &Path) -> Result<Self, FeedError> {
        let image = image::open(path)
            .map_err(|source| FeedError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();

        log::debug!("loaded {}x{} frame from {}", width, height, path.display());

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

pub trait FrameSource: Send + 'static {
    /// Next frame, or `None` when the last one is still current.
    fn capture(&mut self) -> Result<Option<Frame>, FeedError>;
}

pub struct SolidColor {
    color: [u8; 4],
    sent: bool,
}

impl SolidColor {
    pub fn new(color: [u8; 4]) -> Self {
        Self { color, sent: false }
    }
}

impl FrameSource for SolidColor {
    fn capture(&mut self) -> Result<Option<Frame>, FeedError> {
        if self.sent {
            return Ok(None);
        }
        self.sent = true;
        Ok(Some(Frame::solid(1, 1, self.color)))
    }
}

pub struct StillImage {
    frame: Option<Frame>,
}

impl StillImage {
    pub fn open(path: &Path) -> Result<Self, FeedError> {
        Ok(Self {
            frame: Some(Frame::load(path)?),
        })
    }
}

impl FrameSource for StillImage {
    fn capture(&mut self) -> Result<Option<Frame>, FeedError> {
        Ok(self.frame.take())
    }
}

pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

const SEQUENCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self, FeedError> {
        let io_err = |source| FeedError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    SEQUENCE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                });
            if is_image {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(FeedError::EmptySequence(dir.to_path_buf()));
        }
        paths.sort();

        log::info!("image sequence: {} frames from {}", paths.len(), dir.display());

        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequence {
    fn capture(&mut self) -> Result<Option<Frame>, FeedError> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();
        Frame::load(path).map(Some)
    }
}

pub fn source_from_config(
    config: &BackgroundSourceConfig,
) -> Result<Box<dyn FrameSource>, FeedError> {
    Ok(match config {
        BackgroundSourceConfig::Solid { color } => Box::new(SolidColor::new(*color)),
        BackgroundSourceConfig::Image { path } => Box::new(StillImage::open(path)?),
        BackgroundSourceConfig::Sequence { dir } => Box::new(ImageSequence::open(dir)?),
    })
}

enum FeedCommand {
    Stop,
}

pub struct BackgroundFeed {
    tx_cmd: Sender<FeedCommand>,
    rx_frame: Receiver<Frame>,
    last_error: Arc<Mutex<Option<String>>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl BackgroundFeed {
    pub fn spawn(source: Box<dyn FrameSource>, fps: f32) -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<FeedCommand>();
        let (tx_frame, rx_frame) = channel::bounded::<Frame>(1);
        let last_error = Arc::new(Mutex::new(None));
        let last_error_clone = Arc::clone(&last_error);
        let rx_stale = rx_frame.clone();
        let interval = Duration::from_secs_f32(1.0 / fps);

        let thread_handle = thread::Builder::new()
            .name("background-feed".into())
            .spawn(move || {
                feed_thread(source, interval, rx_cmd, tx_frame, rx_stale, last_error_clone)
            })
            .map_err(|e| log::error!("failed to start background feed: {e}"))
            .ok();

        Self {
            tx_cmd,
            rx_frame,
            last_error,
            thread_handle,
        }
    }

    pub fn try_recv_frame(&self) -> Option<Frame> {
        self.rx_frame.try_recv().ok()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn stop(&self) {
        let _ = self.tx_cmd.send(FeedCommand::Stop);
    }
}

impl Drop for BackgroundFeed {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(FeedCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn feed_thread(
    mut source: Box<dyn FrameSource>,
    interval: Duration,
    rx_cmd: Receiver<FeedCommand>,
    tx_frame: Sender<Frame>,
    rx_stale: Receiver<Frame>,
    last_error: Arc<Mutex<Option<String>>>,
) {
    let mut next_tick = Instant::now();

    loop {
        match source.capture() {
            Ok(Some(frame)) => {
                *last_error.lock() = None;
                match tx_frame.try_send(frame) {
                    Ok(()) => {}
                    // replace the unread frame with the newer one
                    Err(TrySendError::Full(frame)) => {
                        let _ = rx_stale.try_recv();
                        let _ = tx_frame.try_send(frame);
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("background feed: {e}");
                *last_error.lock() = Some(e.to_string());
            }
        }

        next_tick += interval;
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx_cmd.recv_timeout(timeout) {
            Ok(FeedCommand::Stop) => return,
            Err(channel::RecvTimeoutError::Disconnected) => return,
            Err(channel::RecvTimeoutError::Timeout) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        remaining: u32,
    }

    impl FrameSource for Counting {
        fn capture(&mut self) -> Result<Option<Frame>, FeedError> {
            if self.remaining == 0 {
                return Err(FeedError::EmptySequence(PathBuf::from("counting")));
            }
            self.remaining -= 1;
            Ok(Some(Frame::solid(2, 1, [self.remaining as u8, 0, 0, 255])))
        }
    }

    fn wait_for<T>(mut poll: impl FnMut() -> Option<T>) -> Option<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(value) = poll() {
                return Some(value);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn solid_frame_repeats_color() {
        let frame = Frame::solid(3, 2, [1, 2, 3, 4]);
        assert_eq!(frame.pixels.len(), 3 * 2 * 4);
        assert!(frame.pixels.chunks(4).all(|px| px == [1, 2, 3, 4]));
    }

    #[test]
    fn solid_source_sends_once() {
        let mut source = SolidColor::new([9, 9, 9, 255]);
        assert!(source.capture().unwrap().is_some());
        assert!(source.capture().unwrap().is_none());
    }

    #[test]
    fn missing_still_image_reports_path() {
        let err = StillImage::open(Path::new("no/such/frame.png")).err().unwrap();
        assert!(matches!(err, FeedError::Image { .. }));
        assert!(err.to_string().contains("frame.png"));
    }

    #[test]
    fn missing_still_image_fails_at_config_time() {
        let config = BackgroundSourceConfig::Image {
            path: PathBuf::from("no/such/frame.png"),
        };
        let err = source_from_config(&config).err().unwrap();
        assert!(matches!(err, FeedError::Image { .. }));
    }

    #[test]
    fn still_image_is_sent_once() {
        let dir = std::env::temp_dir().join(format!("anaglyph-still-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([7, 8, 9, 255]))
            .save(&path)
            .unwrap();

        let mut source = source_from_config(&BackgroundSourceConfig::Image { path }).unwrap();
        let frame = source.capture().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(&frame.pixels[..4], &[7, 8, 9, 255]);
        assert!(source.capture().unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = std::env::temp_dir().join(format!("anaglyph-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let err = ImageSequence::open(&dir).err().unwrap();
        assert!(matches!(err, FeedError::EmptySequence(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn sequence_loops_in_name_order() {
        let dir = std::env::temp_dir().join(format!("anaglyph-seq-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10u8), ("notes.txt", 0u8)] {
            let path = dir.join(name);
            if name.ends_with(".png") {
                image::RgbaImage::from_pixel(1, 1, image::Rgba([shade, 0, 0, 255]))
                    .save(&path)
                    .unwrap();
            } else {
                std::fs::write(&path, "skip me").unwrap();
            }
        }

        let mut sequence = ImageSequence::open(&dir).unwrap();
        assert_eq!(sequence.len(), 2);

        let shades: Vec<u8> = (0..3)
            .map(|_| sequence.capture().unwrap().unwrap().pixels[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 10]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn feed_delivers_frames_and_records_errors() {
        let feed = BackgroundFeed::spawn(Box::new(Counting { remaining: 1 }), 200.0);

        let frame = wait_for(|| feed.try_recv_frame()).expect("frame from feed");
        assert_eq!(frame.width, 2);

        let error = wait_for(|| feed.last_error()).expect("error from feed");
        assert!(error.contains("counting"));

        feed.stop();
    }

    #[test]
    fn unread_frame_is_replaced_by_newer_one() {
        let feed = BackgroundFeed::spawn(Box::new(Counting { remaining: 5 }), 200.0);

        // the error only appears once all five frames have been produced
        wait_for(|| feed.last_error()).expect("error from feed");

        let frame = feed.try_recv_frame().expect("queued frame");
        assert_eq!(frame.pixels[0], 0);
        assert!(feed.try_recv_frame().is_none());

        feed.stop();
    }
}
