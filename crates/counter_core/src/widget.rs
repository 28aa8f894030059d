use std::sync::Arc;

use chrono::Duration;
use persistence::{sanitize_count, CountsShape, KeyValueStore, PersistenceAdapter, StorageKeys};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{SlotIndex, SlotSpec, Theme, UpdateOrigin, WidgetInstanceId, WidgetVariant},
    protocol::{HostRenderArgs, ValueChanged},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    catalog,
    clock::Clock,
    counter_set::{CounterSet, CounterState, Slot, UndoSnapshot, UNDO_WINDOW_SECONDS},
    gesture::{GestureTracker, SWIPE_THRESHOLD_PX},
    host_bridge::HostBridge,
    layout::FrameLayout,
    timer::{UndoExpired, UndoTimer},
};

#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub variant: WidgetVariant,
    /// Overrides the variant's default counts key.
    pub storage_key: Option<String>,
    /// Overrides the variant's slot catalog.
    pub slots: Option<Vec<SlotSpec>>,
    pub undo_window: Duration,
    pub layout: FrameLayout,
    pub swipe_threshold_px: f64,
}

impl WidgetOptions {
    pub fn new(variant: WidgetVariant) -> Self {
        Self {
            variant,
            storage_key: None,
            slots: None,
            undo_window: Duration::seconds(UNDO_WINDOW_SECONDS),
            layout: FrameLayout::default(),
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
        }
    }
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self::new(WidgetVariant::default())
    }
}

/// Everything an input method can ask of the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WidgetCommand {
    Tap { slot: SlotIndex },
    Adjust { slot: SlotIndex, delta: i64 },
    Input { slot: SlotIndex, raw: String },
    Reset,
    Undo,
    DragStart { y: f64 },
    DragEnd { y: f64 },
    SetTheme { theme: Theme },
    ToggleTheme,
    ToggleExtras,
}

impl WidgetCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tap { .. } => "tap",
            Self::Adjust { .. } => "adjust",
            Self::Input { .. } => "input",
            Self::Reset => "reset",
            Self::Undo => "undo",
            Self::DragStart { .. } => "drag_start",
            Self::DragEnd { .. } => "drag_end",
            Self::SetTheme { .. } => "set_theme",
            Self::ToggleTheme => "toggle_theme",
            Self::ToggleExtras => "toggle_extras",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub key: String,
    pub label: String,
    pub color: String,
    pub text_color: String,
    pub value: u64,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        let spec = slot.spec();
        Self {
            key: spec.key.clone(),
            label: spec.label.clone(),
            color: spec.color.clone(),
            text_color: spec.text_color.clone(),
            value: slot.value(),
        }
    }
}

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetView {
    pub variant: WidgetVariant,
    pub label: Option<String>,
    pub caption: Option<String>,
    pub theme: Theme,
    pub extras_visible: bool,
    pub slots: Vec<SlotView>,
    pub total: u64,
    pub undo_available: bool,
}

/// Owns the counters of one embedded widget and drives persistence and host sync.
pub struct CounterWidget {
    instance_id: WidgetInstanceId,
    variant: WidgetVariant,
    state: CounterState,
    persistence: PersistenceAdapter,
    bridge: Arc<dyn HostBridge>,
    clock: Arc<dyn Clock>,
    layout: FrameLayout,
    keys: StorageKeys,
    theme: Theme,
    extras_visible: bool,
    label: Option<String>,
    caption: Option<String>,
    last_host_value: Option<f64>,
    ready: bool,
    pending_origin: Option<UpdateOrigin>,
    gesture: GestureTracker,
    timer: Option<UndoTimer>,
}

impl CounterWidget {
    /// Hydrates the widget from storage. Never fails: unreadable state starts at zero.
    pub async fn initialize(
        options: WidgetOptions,
        store: Arc<dyn KeyValueStore>,
        bridge: Arc<dyn HostBridge>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let variant = options.variant;
        let persistence = PersistenceAdapter::new(store);
        let keys = StorageKeys::derive(
            options
                .storage_key
                .unwrap_or_else(|| variant.default_storage_key().to_string()),
        );
        let specs = options
            .slots
            .unwrap_or_else(|| catalog::slots_for(variant));

        let raw = persistence.load(&keys.counts).await;
        let state = CounterState::hydrate(specs, raw.as_deref(), options.undo_window);

        let (theme, extras_visible) = match variant {
            WidgetVariant::Koyaku => (
                persistence.load_theme(&keys.theme).await.unwrap_or_default(),
                persistence.load_flag(&keys.extras).await,
            ),
            WidgetVariant::Swipe => (Theme::default(), false),
        };

        let instance_id = WidgetInstanceId::generate();
        info!(
            instance_id = %instance_id.0,
            variant = variant.as_str(),
            storage_key = %keys.counts,
            slots = state.counters().len(),
            total = state.counters().total(),
            "hydrated counter widget"
        );

        Self {
            instance_id,
            variant,
            state,
            persistence,
            bridge,
            clock,
            layout: options.layout,
            keys,
            theme,
            extras_visible,
            label: None,
            caption: None,
            last_host_value: None,
            ready: false,
            pending_origin: None,
            gesture: GestureTracker::new(options.swipe_threshold_px),
            timer: None,
        }
    }

    /// Schedules real expiry callbacks in addition to the lazy check done by `undo`.
    /// The receiver must be drained on the widget's event loop.
    pub fn with_undo_timer(mut self) -> (Self, mpsc::UnboundedReceiver<UndoExpired>) {
        let (timer, rx) = UndoTimer::new();
        self.timer = Some(timer);
        (self, rx)
    }

    pub fn instance_id(&self) -> WidgetInstanceId {
        self.instance_id
    }

    pub fn variant(&self) -> WidgetVariant {
        self.variant
    }

    pub fn counters(&self) -> &CounterSet {
        self.state.counters()
    }

    pub fn storage_keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn extras_visible(&self) -> bool {
        self.extras_visible
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_undo(&self) -> Option<&UndoSnapshot> {
        self.state.pending_undo()
    }

    pub fn can_undo(&self) -> bool {
        self.state.can_undo(self.clock.now())
    }

    pub fn undo_timer_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(UndoTimer::is_armed)
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            variant: self.variant,
            label: self.label.clone(),
            caption: self.caption.clone(),
            theme: self.theme,
            extras_visible: self.extras_visible,
            slots: self.visible_slots().map(SlotView::from).collect(),
            total: self.state.counters().total(),
            undo_available: self.can_undo(),
        }
    }

    pub fn frame_height(&self) -> u32 {
        let has_caption = self
            .caption
            .as_deref()
            .is_some_and(|caption| !caption.trim().is_empty());
        self.layout
            .height_for(self.variant, self.visible_slots().count(), has_caption)
    }

    fn visible_slots(&self) -> impl Iterator<Item = &Slot> {
        let extras_visible = self.extras_visible;
        self.state
            .counters()
            .slots()
            .iter()
            .filter(move |slot| extras_visible || !slot.spec().extra)
    }

    /// Signals readiness once, then flushes whatever notification was deferred.
    pub async fn mark_ready(&mut self) {
        if self.ready {
            debug!("ready already signalled");
            return;
        }
        if let Err(err) = self.bridge.signal_ready(self.instance_id).await {
            warn!(error = %err, "failed to signal readiness to host");
        }
        self.ready = true;

        let origin = self.pending_origin.take().unwrap_or(UpdateOrigin::Init);
        self.publish(origin).await;
        self.request_resize().await;
    }

    pub async fn increment(
        &mut self,
        slot: SlotIndex,
        delta: i64,
        origin: UpdateOrigin,
    ) -> &CounterSet {
        self.debug_check_slot(slot);
        if self.state.increment(slot, delta) {
            self.cancel_undo_timer();
            self.commit(origin).await;
        }
        self.state.counters()
    }

    pub async fn set_direct(&mut self, slot: SlotIndex, raw: &str) -> &CounterSet {
        self.debug_check_slot(slot);
        if self.state.set_direct(slot, raw) {
            self.cancel_undo_timer();
            self.commit(UpdateOrigin::Input).await;
        }
        self.state.counters()
    }

    pub async fn reset(&mut self) -> &CounterSet {
        let now = self.clock.now();
        let snapshot = self.state.reset(now);
        let generation = snapshot.generation();
        let window = snapshot.expires_at() - snapshot.created_at();
        self.arm_undo_timer(generation, window);
        self.commit(UpdateOrigin::Reset).await;
        self.state.counters()
    }

    pub async fn undo(&mut self) -> &CounterSet {
        let now = self.clock.now();
        let restored = self.state.undo(now);
        self.cancel_undo_timer();
        if restored {
            self.commit(UpdateOrigin::User).await;
        } else {
            debug!("nothing to undo");
        }
        self.state.counters()
    }

    /// Applies a fired expiry. Stale generations are ignored.
    pub fn expire_undo(&mut self, expired: UndoExpired) -> bool {
        let cleared = self.state.expire_undo(expired.generation);
        if cleared {
            debug!(generation = expired.generation, "undo window elapsed");
        }
        cleared
    }

    pub fn drag_start(&mut self, y: f64) {
        self.gesture.begin(y);
    }

    pub async fn drag_end(&mut self, y: f64) -> &CounterSet {
        if let Some(delta) = self.gesture.finish(y) {
            self.increment(SlotIndex(0), delta, UpdateOrigin::User).await;
        }
        self.state.counters()
    }

    pub async fn set_theme(&mut self, theme: Theme) {
        if self.variant != WidgetVariant::Koyaku {
            debug!(variant = self.variant.as_str(), "theme is fixed for this variant");
            return;
        }
        self.theme = theme;
        self.persistence.save_theme(&self.keys.theme, theme).await;
    }

    pub async fn toggle_theme(&mut self) {
        self.set_theme(self.theme.toggled()).await;
    }

    pub async fn set_extras_visible(&mut self, visible: bool) {
        if self.variant != WidgetVariant::Koyaku {
            debug!(variant = self.variant.as_str(), "variant has no extra slots");
            return;
        }
        if self.extras_visible == visible {
            return;
        }
        self.extras_visible = visible;
        self.persistence.save_flag(&self.keys.extras, visible).await;
        self.request_resize().await;
    }

    pub async fn toggle_extras(&mut self) {
        self.set_extras_visible(!self.extras_visible).await;
    }

    /// Reconciles arguments pushed by the host. Values applied here carry the
    /// `python` origin and are never echoed back.
    pub async fn apply_host_render(&mut self, args: &HostRenderArgs) {
        if let Some(label) = &args.label {
            self.label = Some(label.clone());
        }

        let height_before = self.frame_height();
        if let Some(caption) = &args.caption {
            self.caption = Some(caption.clone());
        }

        if let Some(key) = args.storage_key_override() {
            if key != self.keys.counts {
                self.switch_storage_key(key).await;
            }
        }

        if let Some(value) = args.value {
            if self.last_host_value != Some(value) {
                self.last_host_value = Some(value);
                if self.state.set_value(SlotIndex(0), sanitize_count(value)) {
                    self.cancel_undo_timer();
                    self.commit(UpdateOrigin::Python).await;
                }
            }
        }

        if self.frame_height() != height_before {
            self.request_resize().await;
        }
    }

    async fn switch_storage_key(&mut self, key: &str) {
        info!(from = %self.keys.counts, to = key, "switching widget storage key");
        self.keys = StorageKeys::derive(key);

        let values = self
            .persistence
            .load_counts(&self.keys.counts, self.state.counters().len())
            .await;
        self.state.replace_values(&values);
        self.cancel_undo_timer();

        if self.variant == WidgetVariant::Koyaku {
            if let Some(theme) = self.persistence.load_theme(&self.keys.theme).await {
                self.theme = theme;
            }
            self.extras_visible = self.persistence.load_flag(&self.keys.extras).await;
        }

        self.commit(UpdateOrigin::Storage).await;
    }

    pub async fn dispatch(&mut self, command: WidgetCommand) {
        debug!(command = command.name(), "applying widget command");
        match command {
            WidgetCommand::Tap { slot } => {
                self.increment(slot, 1, UpdateOrigin::User).await;
            }
            WidgetCommand::Adjust { slot, delta } => {
                self.increment(slot, delta, UpdateOrigin::Adjust).await;
            }
            WidgetCommand::Input { slot, raw } => {
                self.set_direct(slot, &raw).await;
            }
            WidgetCommand::Reset => {
                self.reset().await;
            }
            WidgetCommand::Undo => {
                self.undo().await;
            }
            WidgetCommand::DragStart { y } => self.drag_start(y),
            WidgetCommand::DragEnd { y } => {
                self.drag_end(y).await;
            }
            WidgetCommand::SetTheme { theme } => self.set_theme(theme).await,
            WidgetCommand::ToggleTheme => self.toggle_theme().await,
            WidgetCommand::ToggleExtras => self.toggle_extras().await,
        }
    }

    /// Cancels any scheduled callback so nothing fires against a torn-down widget.
    pub fn shutdown(&mut self) {
        self.cancel_undo_timer();
        self.gesture.cancel();
        info!(instance_id = %self.instance_id.0, "counter widget shut down");
    }

    fn payload(&self, origin: UpdateOrigin) -> ValueChanged {
        let counters = self.state.counters();
        ValueChanged {
            primary_count: counters.primary(),
            counts: counters.values(),
            origin: (self.variant == WidgetVariant::Swipe).then_some(origin),
        }
    }

    fn counts_shape(&self) -> CountsShape {
        match self.variant {
            WidgetVariant::Koyaku => CountsShape::Array,
            WidgetVariant::Swipe => CountsShape::Scalar,
        }
    }

    async fn commit(&mut self, origin: UpdateOrigin) {
        self.persistence
            .save_counts(
                &self.keys.counts,
                &self.state.counters().values(),
                self.counts_shape(),
            )
            .await;
        self.publish(origin).await;
        self.request_resize().await;
    }

    async fn publish(&mut self, origin: UpdateOrigin) {
        if origin.is_host_driven() {
            debug!(origin = origin.as_str(), "host-driven update is not echoed");
            return;
        }
        if !self.ready {
            debug!(origin = origin.as_str(), "deferring host notification until ready");
            self.pending_origin = Some(origin);
            return;
        }
        let payload = self.payload(origin);
        if let Err(err) = self.bridge.notify_value(&payload).await {
            warn!(error = %err, origin = origin.as_str(), "failed to notify host of value change");
        }
    }

    async fn request_resize(&self) {
        if !self.ready {
            return;
        }
        let height_px = self.frame_height();
        if let Err(err) = self.bridge.request_resize(height_px).await {
            warn!(error = %err, height_px, "failed to request frame resize");
        }
    }

    fn debug_check_slot(&self, slot: SlotIndex) {
        let len = self.state.counters().len();
        debug_assert!(
            slot.0 < len,
            "slot index {} is out of range for {len} slots",
            slot.0
        );
    }

    fn arm_undo_timer(&mut self, generation: u64, window: Duration) {
        if let Some(timer) = self.timer.as_mut() {
            timer.arm(generation, window.to_std().unwrap_or_default());
        }
    }

    fn cancel_undo_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/widget_tests.rs"]
mod tests;
