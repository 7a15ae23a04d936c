// Background texture loading for timeline tiles
// Decode on worker threads, upload + cache on the GTK main thread

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{gdk, glib, Picture};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Duration;

const TILE_DECODE_THREADS: usize = 2;
const TILE_QUEUE: usize = 256;
const TILE_CACHE_ENTRIES: usize = 512;
const TILE_MAX_EDGE: u32 = 512;

// Placeholder texture - generated once and reused
pub fn placeholder_texture() -> &'static Texture {
    static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let width = 64usize;
        let height = 64usize;
        let mut pixels = vec![0u8; width * height * 4];

        // Dark gray (#1a1a1a) RGBA
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[0] = 0x1a;
            chunk[1] = 0x1a;
            chunk[2] = 0x1a;
            chunk[3] = 0xff;
        }

        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            width as i32,
            height as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            width * 4,
        )
        .upcast()
    })
}

#[derive(Debug)]
struct DecodeRequest {
    path: PathBuf,
}

#[derive(Debug)]
struct DecodeResult {
    path: PathBuf,
    rgba: Option<Vec<u8>>,
    width: u32,
    height: u32,
}

struct LoaderState {
    pending: HashSet<PathBuf>,
    waiters: HashMap<PathBuf, Vec<glib::WeakRef<Picture>>>,
    cache: lru::LruCache<PathBuf, Texture>,
}

struct TileLoader {
    request_tx: flume::Sender<DecodeRequest>,
    result_rx: flume::Receiver<DecodeResult>,
    state: RefCell<LoaderState>,
}

thread_local! {
    static TILE_LOADER: Rc<TileLoader> = TileLoader::new();
}

/// Shows `path` in `picture`: from the cache when possible, otherwise the
/// placeholder now and the decoded texture once a worker delivers it.
/// Pictures dropped before the decode lands are skipped via weak refs, so
/// a strip rebuild cannot resurrect stale tiles.
pub fn request_tile(picture: &Picture, path: &Path) {
    TILE_LOADER.with(|loader| loader.request(picture, path));
}

impl TileLoader {
    fn new() -> Rc<Self> {
        let (request_tx, request_rx) = flume::bounded::<DecodeRequest>(TILE_QUEUE);
        let (result_tx, result_rx) = flume::unbounded::<DecodeResult>();

        for _ in 0..TILE_DECODE_THREADS {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            std::thread::spawn(move || {
                while let Ok(req) = rx.recv() {
                    let decoded = decode_tile(&req.path);
                    let (rgba, width, height) = match decoded {
                        Some((data, w, h)) => (Some(data), w, h),
                        None => (None, 0, 0),
                    };
                    let _ = tx.send(DecodeResult {
                        path: req.path,
                        rgba,
                        width,
                        height,
                    });
                }
            });
        }

        let loader = Rc::new(Self {
            request_tx,
            result_rx,
            state: RefCell::new(LoaderState {
                pending: HashSet::new(),
                waiters: HashMap::new(),
                cache: lru::LruCache::new(NonZeroUsize::new(TILE_CACHE_ENTRIES).unwrap()),
            }),
        });

        let loader_weak = Rc::downgrade(&loader);
        glib::timeout_add_local(Duration::from_millis(16), move || {
            if let Some(loader) = loader_weak.upgrade() {
                loader.process_results();
                glib::ControlFlow::Continue
            } else {
                glib::ControlFlow::Break
            }
        });

        loader
    }

    fn request(&self, picture: &Picture, path: &Path) {
        let mut state = self.state.borrow_mut();

        if let Some(texture) = state.cache.get(path).cloned() {
            picture.set_paintable(Some(&texture));
            return;
        }

        picture.set_paintable(Some(placeholder_texture()));
        state
            .waiters
            .entry(path.to_path_buf())
            .or_default()
            .push(picture.downgrade());

        if state.pending.insert(path.to_path_buf())
            && self
                .request_tx
                .try_send(DecodeRequest {
                    path: path.to_path_buf(),
                })
                .is_err()
        {
            // Queue is full; leave the placeholder and let a later request
            // (scroll, rebuild) retry.
            state.pending.remove(path);
            state.waiters.remove(path);
        }
    }

    fn process_results(&self) {
        while let Ok(result) = self.result_rx.try_recv() {
            let texture: Option<Texture> = result.rgba.and_then(|data| {
                if result.width == 0 || result.height == 0 {
                    return None;
                }
                let stride = result.width as usize * 4;
                let bytes = glib::Bytes::from_owned(data);
                Some(
                    gdk::MemoryTexture::new(
                        result.width as i32,
                        result.height as i32,
                        gdk::MemoryFormat::R8g8b8a8,
                        &bytes,
                        stride,
                    )
                    .upcast(),
                )
            });

            let waiters = {
                let mut state = self.state.borrow_mut();
                state.pending.remove(&result.path);
                let waiters = state.waiters.remove(&result.path).unwrap_or_default();
                if let Some(texture) = texture.as_ref() {
                    state.cache.put(result.path.clone(), texture.clone());
                }
                waiters
            };

            if let Some(texture) = texture {
                for waiter in waiters {
                    if let Some(picture) = waiter.upgrade() {
                        picture.set_paintable(Some(&texture));
                    }
                }
            }
        }
    }
}

fn decode_tile(path: &Path) -> Option<(Vec<u8>, u32, u32)> {
    let img = image::open(path).ok()?;
    let img = img.thumbnail(TILE_MAX_EDGE, TILE_MAX_EDGE);
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some((rgba.into_raw(), width, height))
}
