// Timeline strip: a horizontal run of cluster boxes inside a ScrolledWindow.
//
// This is where the headless engine meets GTK. Transitions follow a strict
// order within one visual update: measure the watched cluster off the
// still-current layout, commit the new expand/collapse state to the
// widgets, then in an idle callback (after GTK has re-laid-out the strip)
// measure again, apply the corrective scroll, and only then run focus and
// centering side effects. No other scroll mutation happens in between.

use gtk4::prelude::*;
use gtk4::{
    glib, Box as GtkBox, Button, ContentFit, EventControllerFocus, EventControllerScroll,
    EventControllerScrollFlags, Orientation, Picture, PolicyType, PropagationPhase,
    ScrolledWindow, Viewport,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use tracing::debug;

use super::tile_loader;
use crate::models::{Cluster, MediaItem, MediaKind};
use crate::timeline::compensation::{self, CenterTiming, DeferredCenter, PendingMeasure};
use crate::timeline::navigator;
use crate::timeline::selection::Transition;
use crate::timeline::{cluster_items, SelectionState, TagFilter, TimelineIndex};

const STRIP_HEIGHT: i32 = 176;
const TILE_HEIGHT: i32 = 152;
const COLLAPSED_TILE_WIDTH: i32 = 14;
const EXPANDED_TILE_MIN_WIDTH: i32 = 24;
const EXPANDED_TILE_MAX_WIDTH: i32 = 480;

/// Callback type for selection requests leaving the strip.
pub type NavigateCallback = Box<dyn Fn(String)>;

pub struct TimelineView {
    self_weak: RefCell<Weak<Self>>,
    scroller: ScrolledWindow,
    strip: GtkBox,
    library_dir: RefCell<Option<PathBuf>>,
    clusters: RefCell<Vec<Cluster>>,
    index: RefCell<TimelineIndex>,
    state: RefCell<SelectionState>,
    deferred_center: RefCell<DeferredCenter>,
    pending_settle: RefCell<Option<(Transition, Option<PendingMeasure>)>>,
    cluster_boxes: RefCell<Vec<GtkBox>>,
    tiles: RefCell<Vec<Vec<Button>>>,
    on_navigate: RefCell<Option<NavigateCallback>>,
}

impl TimelineView {
    pub fn new() -> Rc<Self> {
        let strip = GtkBox::new(Orientation::Horizontal, 6);
        strip.add_css_class("timeline-strip");
        strip.set_valign(gtk4::Align::Center);

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Automatic)
            .vscrollbar_policy(PolicyType::Never)
            .kinetic_scrolling(false)
            .child(&strip)
            .build();
        scroller.set_height_request(STRIP_HEIGHT);

        // The viewport must not auto-scroll to the focused tile: the
        // corrective scroll and the centering step are the only writers of
        // the scroll position.
        if let Some(viewport) = scroller.child().and_downcast::<Viewport>() {
            viewport.set_scroll_to_focus(false);
        }

        let view = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            scroller,
            strip,
            library_dir: RefCell::new(None),
            clusters: RefCell::new(Vec::new()),
            index: RefCell::new(TimelineIndex::default()),
            state: RefCell::new(SelectionState::new(None)),
            deferred_center: RefCell::new(DeferredCenter::default()),
            pending_settle: RefCell::new(None),
            cluster_boxes: RefCell::new(Vec::new()),
            tiles: RefCell::new(Vec::new()),
            on_navigate: RefCell::new(None),
        });
        *view.self_weak.borrow_mut() = Rc::downgrade(&view);

        // Un-modified wheel motion steps the selection; chords fall through
        // to the scrolled window's native scrolling.
        let wheel = EventControllerScroll::new(EventControllerScrollFlags::BOTH_AXES);
        wheel.set_propagation_phase(PropagationPhase::Capture);
        let view_weak = Rc::downgrade(&view);
        wheel.connect_scroll(move |controller, _dx, dy| {
            let state = controller.current_event_state();
            if let Some(delta) = navigator::wheel_step(dy, state) {
                if let Some(view) = view_weak.upgrade() {
                    view.step(delta);
                }
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        view.scroller.add_controller(wheel);

        view
    }

    pub fn widget(&self) -> &ScrolledWindow {
        &self.scroller
    }

    pub fn set_library_dir(&self, dir: Option<PathBuf>) {
        *self.library_dir.borrow_mut() = dir;
    }

    pub fn connect_navigate<F>(&self, callback: F)
    where
        F: Fn(String) + 'static,
    {
        *self.on_navigate.borrow_mut() = Some(Box::new(callback));
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.borrow().len()
    }

    pub fn item_count(&self) -> usize {
        self.index.borrow().len()
    }

    /// Recomputes clusters from scratch for new items or a new filter and
    /// rebuilds the strip. Selection is carried over by identity and simply
    /// degrades when the filter removed it; focus never survives a rebuild.
    pub fn set_content(&self, items: &[MediaItem], filter: &TagFilter, selected: Option<String>) {
        let clusters = cluster_items(items, filter);
        let index = TimelineIndex::build(&clusters);
        debug!(
            clusters = clusters.len(),
            items = index.len(),
            "timeline content rebuilt"
        );

        *self.clusters.borrow_mut() = clusters;
        *self.index.borrow_mut() = index;
        *self.state.borrow_mut() = SelectionState::new(selected);
        self.deferred_center.borrow_mut().take();
        // Any unsettled transition addressed the old widget tree.
        self.pending_settle.borrow_mut().take();

        self.rebuild_strip();
        self.apply_expansion_states();
        self.apply_selected_class();

        // First presentation: jump straight to the selected tile, no
        // animation, once the initial layout exists.
        let weak = self.self_weak.borrow().clone();
        glib::idle_add_local_once(move || {
            if let Some(view) = weak.upgrade() {
                view.focus_selected_tile();
                view.center_selected();
            }
        });
    }

    /// External selection change (router-driven).
    pub fn select(&self, identity: Option<&str>) {
        let transition = {
            let index = self.index.borrow();
            self.state.borrow_mut().select(identity, &index)
        };
        self.run_transition(transition);
    }

    /// Step the selection along the flat sequence; out-of-range is a no-op.
    pub fn step(&self, delta: i64) {
        let target = {
            let index = self.index.borrow();
            let state = self.state.borrow();
            navigator::step(&index, state.selected(), delta).map(str::to_owned)
        };
        if let Some(identity) = target {
            self.emit_navigate(identity);
        }
    }

    fn emit_navigate(&self, identity: String) {
        if let Some(ref callback) = *self.on_navigate.borrow() {
            callback(identity);
        }
    }

    fn focus_in(&self, identity: &str) {
        let transition = {
            let index = self.index.borrow();
            self.state.borrow_mut().focus_item(identity, &index)
        };
        if let Some(transition) = transition {
            self.run_transition(transition);
        }
    }

    /// Runs one transition through the two-phase measurement protocol.
    fn run_transition(&self, transition: Transition) {
        // A new transition must never capture pre-sizes while an earlier one
        // is still waiting for its post-layout pass: settle it first, even
        // if its measurement then reads as a zero delta.
        self.flush_pending_settle();

        let pending = {
            let index = self.index.borrow();
            compensation::watched_cluster(&transition, &index).and_then(|cluster| {
                self.measure_cluster(cluster)
                    .map(|width| compensation::begin(cluster, width))
            })
        };

        // Layout commit: the widget tree now reflects the new state, but
        // allocations still hold the previous layout until GTK reflows.
        self.apply_expansion_states();
        self.apply_selected_class();

        *self.pending_settle.borrow_mut() = Some((transition, pending));
        let weak = self.self_weak.borrow().clone();
        glib::idle_add_local_once(move || {
            if let Some(view) = weak.upgrade() {
                view.flush_pending_settle();
            }
        });
    }

    fn flush_pending_settle(&self) {
        let taken = self.pending_settle.borrow_mut().take();
        if let Some((transition, pending)) = taken {
            self.settle(transition, pending);
        }
    }

    /// Post-layout half of the protocol. Runs once GTK has re-laid-out the
    /// strip: corrective scroll first, then any deferred centering from the
    /// previous pass, then this transition's focus and centering effects.
    fn settle(&self, transition: Transition, pending: Option<PendingMeasure>) {
        let mut compensated = false;
        if let Some(pending) = pending {
            if let Some(post) = self.measure_cluster(pending.cluster) {
                let delta = compensation::corrective_delta(pending, post);
                debug!(
                    cluster = pending.cluster,
                    pre = pending.pre_extent,
                    post,
                    delta,
                    "compensating scroll"
                );
                if delta != 0.0 {
                    let hadj = self.scroller.hadjustment();
                    hadj.set_value(hadj.value() + delta);
                }
                compensated = true;
            }
        }

        if self.deferred_center.borrow_mut().take() {
            self.center_selected();
        }

        if transition.selection_changed {
            // Focus follows selection; the focus-in handler may queue a
            // follow-up transition, whose own settle pass runs afterwards.
            self.focus_selected_tile();

            match compensation::centering(&transition, compensated) {
                CenterTiming::Immediate => self.center_selected(),
                CenterTiming::Deferred => {
                    self.deferred_center.borrow_mut().set();
                    // Guarantee the deferral drains even if the focus move
                    // above produced no transition of its own.
                    let weak = self.self_weak.borrow().clone();
                    glib::idle_add_local_once(move || {
                        if let Some(view) = weak.upgrade() {
                            if view.deferred_center.borrow_mut().take() {
                                view.center_selected();
                            }
                        }
                    });
                }
                CenterTiming::NotNeeded => {}
            }
        }
    }

    /// Rendered width of a cluster box. Only real allocations count; an
    /// unrealized strip yields `None` and the transition goes uncompensated
    /// rather than trusting a guessed size.
    fn measure_cluster(&self, cluster: usize) -> Option<f64> {
        let boxes = self.cluster_boxes.borrow();
        let widget = boxes.get(cluster)?;
        let width = widget.width();
        (width > 0).then_some(width as f64)
    }

    fn rebuild_strip(&self) {
        while let Some(child) = self.strip.first_child() {
            self.strip.remove(&child);
        }

        let mut cluster_boxes = Vec::new();
        let mut tiles = Vec::new();

        let clusters = self.clusters.borrow();
        for cluster in clusters.iter() {
            let cluster_box = GtkBox::new(Orientation::Horizontal, 0);
            cluster_box.add_css_class("cluster");

            let mut row = Vec::with_capacity(cluster.len());
            for item in &cluster.items {
                let tile = self.build_tile(item);
                cluster_box.append(&tile);
                row.push(tile);
            }

            self.strip.append(&cluster_box);
            cluster_boxes.push(cluster_box);
            tiles.push(row);
        }

        *self.cluster_boxes.borrow_mut() = cluster_boxes;
        *self.tiles.borrow_mut() = tiles;
    }

    fn build_tile(&self, item: &MediaItem) -> Button {
        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Cover);
        picture.set_can_shrink(true);

        match item.kind {
            MediaKind::Image => {
                if let Some(dir) = self.library_dir.borrow().as_ref() {
                    tile_loader::request_tile(&picture, &dir.join(&item.identity));
                } else {
                    picture.set_paintable(Some(tile_loader::placeholder_texture()));
                }
            }
            MediaKind::Video => {
                picture.set_paintable(Some(tile_loader::placeholder_texture()));
            }
        }

        let tile = Button::new();
        tile.set_child(Some(&picture));
        tile.add_css_class("tile");
        if item.is_video() {
            tile.add_css_class("video");
        }
        tile.set_has_frame(false);

        let identity = item.identity.clone();
        let view_weak = self.self_weak.borrow().clone();
        tile.connect_clicked(move |_| {
            if let Some(view) = view_weak.upgrade() {
                view.emit_navigate(identity.clone());
            }
        });

        let focus = EventControllerFocus::new();
        let identity = item.identity.clone();
        let view_weak = self.self_weak.borrow().clone();
        focus.connect_enter(move |_| {
            if let Some(view) = view_weak.upgrade() {
                view.focus_in(&identity);
            }
        });
        tile.add_controller(focus);

        tile
    }

    /// Pushes the expand predicate into widget geometry: expanded tiles get
    /// their aspect-scaled width, collapsed ones a fixed sliver, so cluster
    /// width stays proportional to item count either way.
    fn apply_expansion_states(&self) {
        let clusters = self.clusters.borrow();
        let index = self.index.borrow();
        let state = self.state.borrow();
        let cluster_boxes = self.cluster_boxes.borrow();
        let tiles = self.tiles.borrow();

        for (ci, cluster_box) in cluster_boxes.iter().enumerate() {
            let expanded = state.is_cluster_expanded(ci, &index);
            if expanded {
                cluster_box.add_css_class("expanded");
            } else {
                cluster_box.remove_css_class("expanded");
            }

            let (Some(cluster), Some(row)) = (clusters.get(ci), tiles.get(ci)) else {
                continue;
            };
            for (item, tile) in cluster.items.iter().zip(row.iter()) {
                let width = if expanded {
                    ((TILE_HEIGHT as f32 * item.aspect_ratio()).round() as i32)
                        .clamp(EXPANDED_TILE_MIN_WIDTH, EXPANDED_TILE_MAX_WIDTH)
                } else {
                    COLLAPSED_TILE_WIDTH
                };
                tile.set_size_request(width, TILE_HEIGHT);
            }
        }
    }

    fn apply_selected_class(&self) {
        let selected = {
            let index = self.index.borrow();
            let state = self.state.borrow();
            state.selected().and_then(|identity| index.lookup(identity))
        };

        let tiles = self.tiles.borrow();
        for (ci, row) in tiles.iter().enumerate() {
            for (ii, tile) in row.iter().enumerate() {
                if selected == Some((ci, ii)) {
                    tile.add_css_class("selected");
                } else {
                    tile.remove_css_class("selected");
                }
            }
        }
    }

    fn selected_tile(&self) -> Option<Button> {
        let (ci, ii) = {
            let index = self.index.borrow();
            let state = self.state.borrow();
            state.selected().and_then(|identity| index.lookup(identity))?
        };
        self.tiles.borrow().get(ci)?.get(ii).cloned()
    }

    fn focus_selected_tile(&self) {
        if let Some(tile) = self.selected_tile() {
            // Focus lands without scrolling (scroll-to-focus is off); the
            // focus-in handler runs synchronously from here.
            tile.grab_focus();
        }
    }

    /// Centers the selected tile in the viewport. The adjustment clamps to
    /// its range, so edge tiles settle as close to center as possible.
    fn center_selected(&self) {
        let Some(tile) = self.selected_tile() else {
            return;
        };
        let Some(bounds) = tile.compute_bounds(&self.strip) else {
            return;
        };

        let hadj = self.scroller.hadjustment();
        let center = bounds.x() as f64 + bounds.width() as f64 / 2.0;
        hadj.set_value(center - hadj.page_size() / 2.0);
    }
}
