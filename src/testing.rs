//! Test doubles for the host collaborators.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use crossbeam_channel::{Receiver, Sender};
use web_time::Instant;

use crate::clock::FrameClock;
use crate::decode::Decoder;
use crate::image_file::{AlphaMode, ColorSpace, Frame, ImageFile};
use crate::probe::{FileProbe, FileStamp};

/// Poll `condition` until it holds; panics after five seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition not reached in time"
        );
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[derive(Debug, Clone)]
enum Script {
    Still {
        width: u32,
        height: u32,
        space: ColorSpace,
    },
    Animated { delays: Vec<Duration> },
    Fail,
    Panic,
}

/// Decoder that produces images from a script instead of files.
///
/// Unknown paths decode as failures. A held path blocks its next decode
/// until the returned [`Release`] is triggered or dropped.
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    scripts: Mutex<HashMap<String, Script>>,
    holds: Mutex<HashMap<String, Receiver<()>>>,
    calls: Mutex<Vec<String>>,
    finished: AtomicUsize,
}

/// Unblocks a held decode.
#[derive(Debug)]
pub struct Release(Sender<()>);

impl Release {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, path: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), script);
    }

    pub fn still(&self, path: &str, width: u32, height: u32) {
        self.still_in(path, width, height, ColorSpace::Srgb);
    }

    /// A still image whose samples are tagged with `space`.
    pub fn still_in(&self, path: &str, width: u32, height: u32, space: ColorSpace) {
        self.script(
            path,
            Script::Still {
                width,
                height,
                space,
            },
        );
    }

    pub fn animated(&self, path: &str, delays_ms: &[u64]) {
        let delays = delays_ms.iter().copied().map(Duration::from_millis).collect();
        self.script(path, Script::Animated { delays });
    }

    pub fn failing(&self, path: &str) {
        self.script(path, Script::Fail);
    }

    pub fn panicking(&self, path: &str) {
        self.script(path, Script::Panic);
    }

    /// Block the next decode of `path` until released.
    pub fn hold(&self, path: &str) -> Release {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.holds.lock().unwrap().insert(path.to_string(), rx);
        Release(tx)
    }

    /// Paths passed to `decode`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Decodes that returned.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, path: &Path, _alpha_mode: AlphaMode) -> ImageFile {
        let key = path.to_string_lossy().into_owned();
        self.calls.lock().unwrap().push(key.clone());

        let hold = self.holds.lock().unwrap().remove(&key);
        if let Some(hold) = hold {
            // Either a release or a dropped sender unblocks
            let _ = hold.recv();
        }

        let script = self.scripts.lock().unwrap().get(&key).cloned();
        let image = match script {
            Some(Script::Still {
                width,
                height,
                space,
            }) => {
                let pixels = vec![255; width as usize * height as usize * 4];
                ImageFile::still(path, width, height, pixels)
                    .unwrap()
                    .with_color_space(space)
            }
            Some(Script::Animated { delays }) => {
                let frames = delays
                    .into_iter()
                    .map(|delay| Frame::new(vec![255; 4], delay))
                    .collect();
                ImageFile::animated(path, 1, 1, frames).unwrap()
            }
            Some(Script::Panic) => panic!("scripted decoder panic"),
            Some(Script::Fail) | None => ImageFile::failed(path),
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        image
    }
}

/// Frame clock moved by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn starting_at(ns: u64) -> Self {
        Self {
            now: AtomicU64::new(ns),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl FrameClock for ManualClock {
    fn frame_time(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// File probe over an in-memory table of modification times.
#[derive(Debug, Default)]
pub struct FakeProbe {
    stamps: Mutex<HashMap<String, SystemTime>>,
    queries: AtomicUsize,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as existing, modified `secs` after the epoch.
    pub fn touch(&self, path: &str, secs: u64) {
        self.stamps
            .lock()
            .unwrap()
            .insert(path.to_string(), stamp(secs));
    }

    pub fn remove(&self, path: &str) {
        self.stamps.lock().unwrap().remove(path);
    }

    /// Number of `modified_time` calls so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl FileProbe for FakeProbe {
    fn modified_time(&self, path: &Path) -> FileStamp {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.stamps
            .lock()
            .unwrap()
            .get(path.to_string_lossy().as_ref())
            .copied()
    }

    fn exists(&self, path: &Path) -> bool {
        self.stamps
            .lock()
            .unwrap()
            .contains_key(path.to_string_lossy().as_ref())
    }
}

/// The modification time `FakeProbe::touch(path, secs)` records.
pub fn stamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}
