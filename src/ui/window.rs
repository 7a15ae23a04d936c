// Main window for the memdex timeline browser
// Display pane on top, the cluster timeline strip below, terminal aesthetic CSS

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    glib, Application, ApplicationWindow, Box as GtkBox, CssProvider, Entry, EventControllerKey,
    Label, Orientation, Picture, PropagationPhase, Settings, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::timeline_view::TimelineView;
use crate::feed;
use crate::models::{MediaItem, MediaKind};
use crate::timeline::TagFilter;

/// Environment fallback for the initial tag filter string.
const FILTER_ENV_VAR: &str = "MEMDEX_FILTER";

fn default_library_dir() -> Option<PathBuf> {
    directories::UserDirs::new().and_then(|dirs| {
        dirs.picture_dir()
            .map(Path::to_path_buf)
            .or_else(|| Some(dirs.home_dir().to_path_buf()))
    })
}

fn initial_filter_string() -> String {
    std::env::var(FILTER_ENV_VAR).unwrap_or_default()
}

/// CSS for terminal aesthetic - embedded as fallback
const FALLBACK_CSS: &str = r#"
* {
    border-radius: 0;
    box-shadow: none;
    background-image: none;
}

window {
    background-color: #0a0a0a;
    color: #e0e0e0;
}

.display-pane {
    background-color: #050505;
}

.timeline-strip {
    background-color: #0a0a0a;
}

.cluster {
    background-color: #121212;
    border: 1px solid #333333;
}

.cluster.expanded {
    border-color: #555555;
    background-color: #181818;
}

.tile {
    padding: 0;
    margin: 0;
    background-color: #121212;
    border: 1px solid #222222;
}

.tile:hover {
    border-color: #555555;
}

.tile.selected {
    border-color: #00ff88;
    border-style: dashed;
    border-width: 2px;
}

.filter-entry {
    background-color: #121212;
    border: 1px solid #333333;
    color: #e0e0e0;
}

.dir-label {
    color: #00ff88;
}

.muted {
    color: #888888;
}
"#;

/// Load and apply CSS stylesheet for terminal aesthetic
fn load_css() {
    let provider = CssProvider::new();

    // Try to load from file first, fall back to embedded CSS
    let css_path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/style.css");

    if Path::new(css_path).exists() {
        provider.load_from_path(css_path);
        tracing::info!("Loaded CSS from: {}", css_path);
    } else {
        provider.load_from_data(FALLBACK_CSS);
        tracing::info!("Loaded fallback embedded CSS");
    }

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// Main window: holds the loaded items, the active filter, and the thin
/// selection router that stands in for external history integration. The
/// router keeps the current identity and serves navigate requests.
pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    display: Picture,
    caption: Label,
    timeline: Rc<TimelineView>,
    filter_entry: Entry,
    status_label: Label,
    dir_label: Label,
    library_dir: RefCell<Option<PathBuf>>,
    items: RefCell<Vec<MediaItem>>,
    filter: RefCell<TagFilter>,
    selection: RefCell<Option<String>>,
    load_generation: Cell<u64>,
}

impl MainWindow {
    pub fn new(app: &Application, initial_path: Option<&Path>) -> Rc<Self> {
        // Load CSS before creating widgets
        load_css();
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }

        let window = ApplicationWindow::builder()
            .application(app)
            .title("memdex - Memories Timeline")
            .default_width(1200)
            .default_height(800)
            .build();

        let root = GtkBox::new(Orientation::Vertical, 0);

        // Header: library path + filter entry
        let header = GtkBox::new(Orientation::Horizontal, 8);
        header.set_margin_start(8);
        header.set_margin_end(8);
        header.set_margin_top(4);
        header.set_margin_bottom(4);

        let dir_label = Label::new(Some("> No library"));
        dir_label.set_halign(gtk4::Align::Start);
        dir_label.set_hexpand(true);
        dir_label.add_css_class("dir-label");
        dir_label.set_ellipsize(gtk4::pango::EllipsizeMode::Start);
        header.append(&dir_label);

        let filter_entry = Entry::new();
        filter_entry.set_placeholder_text(Some("tag&-other"));
        filter_entry.set_tooltip_text(Some("Tag filter: bare tag requires, -tag excludes"));
        filter_entry.add_css_class("filter-entry");
        let initial_filter = initial_filter_string();
        if !initial_filter.is_empty() {
            filter_entry.set_text(&initial_filter);
        }
        header.append(&filter_entry);

        // Display pane for the selected item
        let display = Picture::new();
        display.set_vexpand(true);
        display.set_hexpand(true);
        display.set_content_fit(gtk4::ContentFit::Contain);
        display.add_css_class("display-pane");

        let caption = Label::new(None);
        caption.set_halign(gtk4::Align::Center);
        caption.add_css_class("muted");

        // Timeline strip
        let timeline = TimelineView::new();

        // Status bar
        let status_bar = GtkBox::new(Orientation::Horizontal, 8);
        status_bar.set_margin_start(8);
        status_bar.set_margin_end(8);
        status_bar.set_margin_top(4);
        status_bar.set_margin_bottom(4);

        let status_label = Label::new(Some("> Ready"));
        status_label.set_halign(gtk4::Align::Start);
        status_label.set_hexpand(true);
        status_label.add_css_class("muted");
        status_bar.append(&status_label);

        let hints_label = Label::new(Some(
            "[wheel / \u{2190}\u{2192} / hl] Step  [Tab] Focus clusters  [Click] Select  [Enter in filter] Apply",
        ));
        hints_label.set_halign(gtk4::Align::End);
        hints_label.add_css_class("muted");
        status_bar.append(&hints_label);

        root.append(&header);
        root.append(&display);
        root.append(&caption);
        root.append(timeline.widget());
        root.append(&status_bar);
        window.set_child(Some(&root));

        let filter = TagFilter::parse(&initial_filter);

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            display,
            caption,
            timeline,
            filter_entry: filter_entry.clone(),
            status_label,
            dir_label,
            library_dir: RefCell::new(None),
            items: RefCell::new(Vec::new()),
            filter: RefCell::new(filter),
            selection: RefCell::new(None),
            load_generation: Cell::new(0),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        // Timeline emits navigate requests; the router applies them.
        let window_weak = Rc::downgrade(&main_window);
        main_window.timeline.connect_navigate(move |identity| {
            if let Some(window) = window_weak.upgrade() {
                window.navigate_to(Some(identity));
            }
        });

        // Filter entry re-clusters on activate
        let window_weak = Rc::downgrade(&main_window);
        filter_entry.connect_activate(move |entry| {
            if let Some(window) = window_weak.upgrade() {
                window.apply_filter(&entry.text());
            }
        });

        main_window.setup_keybindings();

        let library = initial_path.map(Path::to_path_buf).or_else(default_library_dir);
        if let Some(library) = library {
            main_window.load_library(&library);
        } else {
            main_window.set_status("> No library specified. Use: memdex <path>");
        }

        main_window
    }

    /// Arrow / hl keys step the selection along the flat sequence. Capture
    /// phase, like the grid navigation it replaces, but text entry keeps
    /// its keys.
    fn setup_keybindings(self: &Rc<Self>) {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let window_weak = Rc::downgrade(self);
        controller.connect_key_pressed(move |_, keyval, _, _| {
            let Some(window) = window_weak.upgrade() else {
                return glib::Propagation::Proceed;
            };
            // The filter entry keeps its keys; everything else navigates.
            let entry_widget = window.filter_entry.upcast_ref::<gtk4::Widget>();
            let typing = gtk4::prelude::RootExt::focus(&window.window)
                .is_some_and(|focused| focused == *entry_widget || focused.is_ancestor(entry_widget));
            if typing {
                return glib::Propagation::Proceed;
            }

            match keyval {
                gdk4::Key::Left | gdk4::Key::h => {
                    window.timeline.step(-1);
                    glib::Propagation::Stop
                }
                gdk4::Key::Right | gdk4::Key::l => {
                    window.timeline.step(1);
                    glib::Propagation::Stop
                }
                _ => glib::Propagation::Proceed,
            }
        });

        self.window.add_controller(controller);
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn set_status(&self, text: &str) {
        self.status_label.set_text(text);
    }

    /// Starts a background feed load. A newer load supersedes the results
    /// of any older one still in flight.
    pub fn load_library(&self, library: &Path) {
        let feed_path = feed::resolve_feed_path(library);
        let library_dir = feed_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| library.to_path_buf());

        *self.library_dir.borrow_mut() = Some(library_dir.clone());
        self.timeline.set_library_dir(Some(library_dir.clone()));
        self.dir_label.set_text(&format!("> {}", library_dir.display()));
        self.window
            .set_title(Some(&format!("memdex - {}", library_dir.display())));
        self.set_status(&format!("> Loading {}", feed_path.display()));

        let generation = self.load_generation.get() + 1;
        self.load_generation.set(generation);

        let rx = feed::spawn_load(library.to_path_buf());
        let window_weak = self.self_weak.borrow().clone();
        glib::spawn_future_local(async move {
            let Ok(result) = rx.recv().await else {
                return;
            };
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            if window.load_generation.get() != generation {
                return;
            }
            match result {
                Ok(outcome) => {
                    *window.items.borrow_mut() = outcome.items;
                    window.rebuild_timeline();
                    let stats = outcome.stats;
                    window.set_status(&format!(
                        "> {} items | {} clusters | {} records dropped",
                        window.timeline.item_count(),
                        window.timeline.cluster_count(),
                        stats.dropped_malformed + stats.dropped_extension,
                    ));
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Feed load failed");
                    window.set_status(&format!("> Failed to load feed: {err:#}"));
                }
            }
        });
    }

    /// Recomputes clusters from scratch for the current items + filter.
    /// Selection is handed through by identity; if the filter removed it,
    /// it degrades to nothing-selected inside the engine.
    fn rebuild_timeline(&self) {
        let filter = self.filter.borrow().clone();
        let selected = self.selection.borrow().clone();
        let items = self.items.borrow();
        self.timeline.set_content(&items, &filter, selected);
    }

    fn apply_filter(&self, text: &str) {
        *self.filter.borrow_mut() = TagFilter::parse(text);
        self.rebuild_timeline();

        let filter = self.filter.borrow();
        let label = if filter.is_empty() {
            "no filter".to_string()
        } else {
            format!(
                "require {:?} exclude {:?}",
                filter.required, filter.excluded
            )
        };
        self.set_status(&format!(
            "> {} items | {} clusters | {label}",
            self.timeline.item_count(),
            self.timeline.cluster_count(),
        ));
    }

    /// The router register: stores the new identity, updates the display
    /// pane, and pushes the selection into the timeline engine.
    fn navigate_to(&self, identity: Option<String>) {
        *self.selection.borrow_mut() = identity.clone();
        self.update_display(identity.as_deref());
        self.timeline.select(identity.as_deref());

        if let Some(identity) = identity {
            self.set_status(&format!("> Selected: {identity}"));
        }
    }

    fn update_display(&self, identity: Option<&str>) {
        let Some(identity) = identity else {
            self.display.set_paintable(None::<&gdk4::Paintable>);
            self.caption.set_text("");
            return;
        };

        self.caption.set_text(identity);

        match MediaKind::from_identity(identity) {
            Some(MediaKind::Image) => {
                if let Some(dir) = self.library_dir.borrow().as_ref() {
                    self.display.set_filename(Some(dir.join(identity)));
                }
            }
            // No embedded playback; the strip tile and the caption stand in.
            Some(MediaKind::Video) | None => {
                self.display.set_paintable(None::<&gdk4::Paintable>);
            }
        }
    }
}
