//! Region editor session for one channel.
//!
//! Glues the shared frame stream, the drawing machine and the committed
//! region set together. Hosts feed pointer events in surface coordinates,
//! call [`RoiEditor::needs_redraw`] after each dispatch and composite when it
//! reports true.

use kurbo::Size;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;

use crate::drawing::{DrawError, DrawMode, DrawingMachine};
use crate::input::PointerEvent;
use crate::protocol::{ChannelId, StreamMessage, decode_image};
use crate::reference::ReferenceResolution;
use crate::region::{Region, RegionId, RegionSet};
use crate::storage::{RegionStore, StorageError};
use crate::stream::{ConnectionState, HandlerId, OpenCallbackId, StreamManager};
use crate::transform::{SurfaceBounds, SurfaceTransform};

/// Errors surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("Region {0} not found")]
    UnknownRegion(RegionId),
    #[error("Failed to persist regions: {0}")]
    Storage(#[from] StorageError),
}

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Background stream state, for the host's placeholder overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Not attached to a stream.
    Idle,
    /// Attached, no frame for this channel yet or the connection is down.
    Waiting,
    Live,
    /// Reconnect attempts are exhausted; frames will not resume on their own.
    Stalled,
}

/// Most recent decoded frame payload for the editor's channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestFrame {
    /// Increments per accepted frame.
    pub seq: u64,
    /// Encoded image bytes (JPEG/PNG).
    pub bytes: Rc<[u8]>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Default)]
struct FrameSlot {
    latest: Option<LatestFrame>,
    next_seq: u64,
    fresh: bool,
}

impl FrameSlot {
    fn push(&mut self, bytes: Vec<u8>, timestamp: Option<String>) {
        self.next_seq += 1;
        self.latest = Some(LatestFrame {
            seq: self.next_seq,
            bytes: bytes.into(),
            timestamp,
        });
        self.fresh = true;
    }
}

struct StreamSession {
    manager: StreamManager,
    handler: HandlerId,
    open_callback: OpenCallbackId,
}

/// Editing session over one channel's regions.
pub struct RoiEditor {
    channel_id: ChannelId,
    reference: ReferenceResolution,
    bounds: SurfaceBounds,
    transform: SurfaceTransform,
    machine: DrawingMachine,
    regions: RegionSet,
    frames: Rc<RefCell<FrameSlot>>,
    session: Option<StreamSession>,
    notices: VecDeque<Notice>,
    dirty: bool,
}

impl RoiEditor {
    pub fn new(channel_id: ChannelId, reference: ReferenceResolution, bounds: SurfaceBounds) -> Self {
        Self {
            channel_id,
            reference,
            bounds,
            transform: SurfaceTransform::fitted(reference.size(), bounds),
            machine: DrawingMachine::new(),
            regions: RegionSet::new(),
            frames: Rc::new(RefCell::new(FrameSlot::default())),
            session: None,
            notices: VecDeque::new(),
            dirty: true,
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = RegionSet::from_regions(regions);
        self
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn reference(&self) -> ReferenceResolution {
        self.reference
    }

    pub fn transform(&self) -> &SurfaceTransform {
        &self.transform
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn machine(&self) -> &DrawingMachine {
        &self.machine
    }

    pub fn editing_id(&self) -> Option<RegionId> {
        self.machine.editing_id()
    }

    /// Switch reference resolution and re-fit the surface.
    pub fn set_reference(&mut self, reference: ReferenceResolution) {
        self.reference = reference;
        self.relayout(SurfaceTransform::fitted(reference.size(), self.bounds));
    }

    /// The host laid the surface out at a different size.
    pub fn set_surface_size(&mut self, surface: Size) {
        self.relayout(self.transform.resized(surface));
    }

    fn relayout(&mut self, transform: SurfaceTransform) {
        self.machine.rescale(&self.transform, &transform);
        self.transform = transform;
        self.dirty = true;
    }

    // ---- Stream ----

    /// Attach to the shared stream and subscribe to this channel.
    pub fn open(&mut self, manager: &StreamManager) {
        self.close();

        let channel = self.channel_id;
        let slot = Rc::clone(&self.frames);
        let handler = manager.add_message_handler(move |message| {
            let StreamMessage::Frame {
                channel_id,
                image_base64,
                timestamp,
            } = message
            else {
                return;
            };
            if *channel_id != channel {
                return;
            }
            match decode_image(image_base64) {
                Ok(bytes) => slot.borrow_mut().push(bytes, timestamp.clone()),
                Err(e) => log::warn!("Channel {}: undecodable frame payload: {}", channel, e),
            }
        });

        manager.connect(Some(channel));

        let weak = manager.downgrade();
        let open_callback = manager.on_open(move || {
            let Some(manager) = weak.upgrade() else {
                return;
            };
            if manager.subscribed_channel_id() != Some(channel) {
                manager.subscribe_channel(channel);
            }
        });

        log::info!("Region editor attached to channel {}", channel);
        self.session = Some(StreamSession {
            manager: manager.clone(),
            handler,
            open_callback,
        });
        self.dirty = true;
    }

    /// Detach from the stream. The shared connection stays up.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.manager.remove_message_handler(session.handler);
            session.manager.remove_on_open_callback(session.open_callback);
            log::info!("Region editor detached from channel {}", self.channel_id);
        }
        *self.frames.borrow_mut() = FrameSlot::default();
        self.dirty = true;
    }

    pub fn status(&self) -> StreamStatus {
        match self.session {
            None => StreamStatus::Idle,
            Some(ref session) => match session.manager.connection_state() {
                ConnectionState::Stalled => StreamStatus::Stalled,
                _ if session.manager.is_connected() && self.frames.borrow().latest.is_some() => StreamStatus::Live,
                _ => StreamStatus::Waiting,
            },
        }
    }

    pub fn latest_frame(&self) -> Option<LatestFrame> {
        self.frames.borrow().latest.clone()
    }

    // ---- Drawing ----

    pub fn set_mode(&mut self, mode: DrawMode) {
        self.machine.set_mode(mode);
        self.dirty = true;
    }

    /// Start re-drawing a committed region.
    pub fn begin_edit(&mut self, id: RegionId) -> EditorResult<()> {
        let region = self.regions.get(id).ok_or(EditorError::UnknownRegion(id))?;
        self.machine.begin_edit(region, &self.transform);
        self.dirty = true;
        Ok(())
    }

    /// Feed one pointer event. Rejected gestures also queue a warning.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EditorResult<()> {
        let name = self.default_name();
        match self.machine.handle(event, &self.transform, &name) {
            Ok(changed) => {
                self.dirty |= changed;
                Ok(())
            }
            Err(e) => {
                self.notify(NoticeLevel::Warning, e.to_string());
                Err(e.into())
            }
        }
    }

    /// Commit the draft.
    ///
    /// When re-drawing a committed region only its kind and vertices change;
    /// otherwise the draft is appended as a new region.
    pub fn confirm(&mut self) -> EditorResult<RegionId> {
        let region = match self.machine.confirm() {
            Ok(region) => region,
            Err(e) => {
                self.notify(NoticeLevel::Warning, e.to_string());
                return Err(e.into());
            }
        };

        let id = region.id;
        match self.regions.get_mut(id) {
            Some(existing) => {
                existing.kind = region.kind;
                existing.vertices = region.vertices;
                log::debug!("Region {} redrawn", id);
            }
            None => {
                log::debug!("Region {} added as {:?}", id, region.name);
                self.regions.upsert(region);
            }
        }
        self.dirty = true;
        Ok(id)
    }

    pub fn cancel(&mut self) {
        self.machine.cancel();
        self.dirty = true;
    }

    pub fn remove_region(&mut self, id: RegionId) -> EditorResult<Region> {
        let region = self.regions.remove(id).ok_or(EditorError::UnknownRegion(id))?;
        if self.machine.editing_id() == Some(id) {
            self.machine.cancel();
        }
        self.dirty = true;
        Ok(region)
    }

    pub fn set_enabled(&mut self, id: RegionId, enabled: bool) -> EditorResult<()> {
        let region = self.regions.get_mut(id).ok_or(EditorError::UnknownRegion(id))?;
        region.enabled = enabled;
        self.dirty = true;
        Ok(())
    }

    pub fn rename(&mut self, id: RegionId, name: impl Into<String>) -> EditorResult<()> {
        let region = self.regions.get_mut(id).ok_or(EditorError::UnknownRegion(id))?;
        region.name = name.into();
        self.dirty = true;
        Ok(())
    }

    fn default_name(&self) -> String {
        format!("Region {}", self.regions.len() + 1)
    }

    // ---- Persistence ----

    /// Bring every committed region into normalized space for persisting.
    pub fn prepare_save(&mut self) -> Vec<Region> {
        let reference = self.reference.size();
        self.regions = RegionSet::from_regions(self.regions.iter().map(|r| r.renormalized(reference)).collect());
        self.regions.as_slice().to_vec()
    }

    /// Persist the committed regions. Draft state is left as it is.
    pub async fn save(&mut self, store: &dyn RegionStore) -> EditorResult<()> {
        let regions = self.prepare_save();
        match store.save(self.channel_id, &regions).await {
            Ok(()) => {
                log::info!("Saved {} regions for channel {}", regions.len(), self.channel_id);
                self.notify(NoticeLevel::Info, format!("Saved {} regions", regions.len()));
                Ok(())
            }
            Err(e) => {
                log::error!("Saving regions for channel {} failed: {}", self.channel_id, e);
                self.notify(NoticeLevel::Error, format!("Failed to save regions: {}", e));
                Err(e.into())
            }
        }
    }

    /// Replace the committed regions with the stored ones.
    ///
    /// A channel with nothing stored loads as empty.
    pub async fn load(&mut self, store: &dyn RegionStore) -> EditorResult<()> {
        let regions = match store.load(self.channel_id).await {
            Ok(regions) => regions,
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => {
                log::error!("Loading regions for channel {} failed: {}", self.channel_id, e);
                self.notify(NoticeLevel::Error, format!("Failed to load regions: {}", e));
                return Err(e.into());
            }
        };
        self.regions = RegionSet::from_regions(regions);
        self.machine.cancel();
        self.dirty = true;
        Ok(())
    }

    // ---- Redraw bookkeeping ----

    /// Whether anything visible changed since the last [`mark_drawn`](Self::mark_drawn).
    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.frames.borrow().fresh
    }

    pub fn mark_drawn(&mut self) {
        self.dirty = false;
        self.frames.borrow_mut().fresh = false;
    }

    // ---- Notices ----

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push_back(Notice { level, message });
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

impl Drop for RoiEditor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionKind;
    use crate::storage::{BoxFuture, MemoryRegionStore, StorageResult};
    use crate::stream::StreamConfig;
    use crate::transport::mock::MockTransport;
    use crate::stream::DEFAULT_RECONNECT_DELAY_MS;
    use kurbo::Point;
    use std::time::{Duration, Instant};

    fn editor() -> RoiEditor {
        RoiEditor::new(2, ReferenceResolution::new(1920, 1080), SurfaceBounds::default())
    }

    fn stream() -> (StreamManager, MockTransport) {
        let transport = MockTransport::new();
        let manager = StreamManager::with_transport(StreamConfig::default(), Box::new(transport.clone()));
        (manager, transport)
    }

    fn frame_json(channel: ChannelId, bytes: &[u8]) -> String {
        StreamMessage::frame(channel, bytes, Some("2024-01-01 00:00:00".to_string()))
            .to_json()
            .unwrap()
    }

    fn draw_rect(editor: &mut RoiEditor, a: Point, b: Point) {
        editor.set_mode(DrawMode::Rectangle);
        editor.handle_pointer(PointerEvent::Down(a)).unwrap();
        editor.handle_pointer(PointerEvent::Move(b)).unwrap();
        editor.handle_pointer(PointerEvent::Up(b)).unwrap();
    }

    struct FailingStore;

    impl RegionStore for FailingStore {
        fn load(&self, _: ChannelId) -> BoxFuture<'_, StorageResult<Vec<Region>>> {
            Box::pin(async { Err(StorageError::Io("offline".to_string())) })
        }

        fn save(&self, _: ChannelId, _: &[Region]) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("offline".to_string())) })
        }
    }

    #[test]
    fn test_surface_fitted_to_reference() {
        let editor = editor();
        assert_eq!(editor.transform().surface, Size::new(800.0, 450.0));
    }

    #[test]
    fn test_draw_and_confirm_rectangle() {
        let mut editor = editor();
        draw_rect(&mut editor, Point::new(100.0, 100.0), Point::new(300.0, 200.0));
        let id = editor.confirm().unwrap();

        let region = editor.regions().get(id).unwrap();
        assert_eq!(region.name, "Region 1");
        assert_eq!(region.kind, RegionKind::Rectangle);
        assert!((region.vertices[0].x - 0.125).abs() < 1e-3);
        assert!((region.vertices[1].y - 0.4444).abs() < 1e-3);
    }

    #[test]
    fn test_default_names_count_up() {
        let mut editor = editor();
        draw_rect(&mut editor, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        editor.confirm().unwrap();
        draw_rect(&mut editor, Point::new(20.0, 20.0), Point::new(30.0, 30.0));
        let id = editor.confirm().unwrap();
        assert_eq!(editor.regions().get(id).unwrap().name, "Region 2");
    }

    #[test]
    fn test_confirm_without_draft_warns() {
        let mut editor = editor();
        assert_eq!(editor.confirm(), Err(EditorError::Draw(DrawError::NoDraft)));
        let notices = editor.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(editor.regions().is_empty());
    }

    #[test]
    fn test_short_polygon_warns_and_stays_open() {
        let mut editor = editor();
        editor.set_mode(DrawMode::Polygon);
        editor.handle_pointer(PointerEvent::Down(Point::new(0.0, 0.0))).unwrap();
        editor.handle_pointer(PointerEvent::Down(Point::new(50.0, 0.0))).unwrap();
        let result = editor.handle_pointer(PointerEvent::DoubleClick(Point::new(50.0, 0.0)));

        assert_eq!(
            result,
            Err(EditorError::Draw(DrawError::TooFewVertices { count: 2 }))
        );
        assert_eq!(editor.machine().mode(), DrawMode::Polygon);
        assert_eq!(editor.drain_notices()[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_edit_replaces_geometry_only() {
        let mut original = Region::rectangle(10, "Gate", Point::new(0.1, 0.1), Point::new(0.2, 0.2));
        original.enabled = false;
        let mut editor = editor().with_regions(vec![original]);

        editor.begin_edit(10).unwrap();
        assert_eq!(editor.editing_id(), Some(10));
        editor.rename(10, "Gate A").unwrap();

        editor.set_mode(DrawMode::Polygon);
        for p in [(0.0, 0.0), (400.0, 0.0), (400.0, 225.0)] {
            editor.handle_pointer(PointerEvent::Down(Point::new(p.0, p.1))).unwrap();
        }
        editor.handle_pointer(PointerEvent::DoubleClick(Point::new(400.0, 225.0))).unwrap();
        assert_eq!(editor.confirm(), Ok(10));

        assert_eq!(editor.regions().len(), 1);
        let region = editor.regions().get(10).unwrap();
        assert_eq!(region.kind, RegionKind::Polygon);
        assert_eq!(region.name, "Gate A");
        assert!(!region.enabled);
        assert_eq!(region.vertices[2], Point::new(0.5, 0.5));
        assert_eq!(editor.editing_id(), None);
    }

    #[test]
    fn test_begin_edit_unknown() {
        let mut editor = editor();
        assert_eq!(editor.begin_edit(99), Err(EditorError::UnknownRegion(99)));
    }

    #[test]
    fn test_remove_region_being_edited_cancels() {
        let region = Region::rectangle(4, "r", Point::new(0.1, 0.1), Point::new(0.2, 0.2));
        let mut editor = editor().with_regions(vec![region]);
        editor.begin_edit(4).unwrap();
        editor.remove_region(4).unwrap();
        assert_eq!(editor.editing_id(), None);
        assert!(editor.machine().draft().is_none());
    }

    #[test]
    fn test_set_enabled() {
        let region = Region::rectangle(4, "r", Point::new(0.1, 0.1), Point::new(0.2, 0.2));
        let mut editor = editor().with_regions(vec![region]);
        editor.set_enabled(4, false).unwrap();
        assert!(editor.regions().selectable_for_rules().is_empty());
        assert!(editor.set_enabled(5, true).is_err());
    }

    #[test]
    fn test_prepare_save_renormalizes_legacy() {
        let legacy = Region::rectangle(1, "old", Point::new(640.0, 360.0), Point::new(0.9, 0.9));
        let mut editor = editor().with_regions(vec![legacy]);
        let regions = editor.prepare_save();
        assert!((regions[0].vertices[0].x - 0.3333).abs() < 1e-3);
        assert!((regions[0].vertices[0].y - 0.3333).abs() < 1e-3);
        assert_eq!(regions[0].vertices[1], Point::new(0.9, 0.9));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = MemoryRegionStore::new();
        let mut editor = editor();
        draw_rect(&mut editor, Point::new(100.0, 100.0), Point::new(300.0, 200.0));
        editor.confirm().unwrap();
        pollster::block_on(editor.save(&store)).unwrap();
        assert_eq!(editor.drain_notices()[0].level, NoticeLevel::Info);

        let mut other = RoiEditor::new(2, ReferenceResolution::new(1920, 1080), SurfaceBounds::default());
        pollster::block_on(other.load(&store)).unwrap();
        assert_eq!(other.regions(), editor.regions());
    }

    #[test]
    fn test_load_missing_channel_is_empty() {
        let store = MemoryRegionStore::new();
        let mut editor = editor().with_regions(vec![Region::rectangle(
            1,
            "r",
            Point::ZERO,
            Point::new(0.5, 0.5),
        )]);
        pollster::block_on(editor.load(&store)).unwrap();
        assert!(editor.regions().is_empty());
    }

    #[test]
    fn test_save_failure_keeps_draft() {
        let mut editor = editor();
        draw_rect(&mut editor, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        editor.confirm().unwrap();
        draw_rect(&mut editor, Point::new(20.0, 20.0), Point::new(30.0, 30.0));

        let result = pollster::block_on(editor.save(&FailingStore));
        assert!(matches!(result, Err(EditorError::Storage(StorageError::Io(_)))));
        assert!(editor.machine().draft().is_some());
        assert_eq!(editor.regions().len(), 1);
        assert_eq!(editor.drain_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_open_subscribes_and_filters_frames() {
        let (manager, transport) = stream();
        let mut editor = editor();
        editor.open(&manager);
        assert_eq!(editor.status(), StreamStatus::Waiting);

        transport.accept();
        manager.poll();
        assert!(
            transport
                .sent()
                .contains(&r#"{"action":"subscribe","channel_id":2}"#.to_string())
        );

        editor.mark_drawn();
        transport.push_text(&frame_json(7, b"other"));
        manager.poll();
        assert!(editor.latest_frame().is_none());
        assert!(!editor.needs_redraw());

        transport.push_text(&frame_json(2, b"mine"));
        manager.poll();
        let frame = editor.latest_frame().unwrap();
        assert_eq!(&*frame.bytes, b"mine");
        assert_eq!(frame.seq, 1);
        assert_eq!(editor.status(), StreamStatus::Live);
        assert!(editor.needs_redraw());
    }

    #[test]
    fn test_close_removes_only_own_handler() {
        let (manager, transport) = stream();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        manager.add_message_handler(move |_| *counter.borrow_mut() += 1);

        let mut editor = editor();
        editor.open(&manager);
        transport.accept();
        manager.poll();
        editor.close();
        assert_eq!(editor.status(), StreamStatus::Idle);

        transport.push_text(&frame_json(2, b"late"));
        manager.poll();
        assert!(editor.latest_frame().is_none());
        assert_eq!(*seen.borrow(), 1);
        assert!(manager.is_connected());
    }

    #[test]
    fn test_status_waiting_after_drop() {
        let (manager, transport) = stream();
        let mut editor = editor();
        editor.open(&manager);
        transport.accept();
        transport.push_text(&frame_json(2, b"f"));
        manager.poll();
        assert_eq!(editor.status(), StreamStatus::Live);

        transport.drop_connection();
        manager.poll();
        assert_eq!(editor.status(), StreamStatus::Waiting);
    }

    #[test]
    fn test_status_stalled_after_reconnect_ceiling() {
        let (manager, transport) = stream();
        transport.state.borrow_mut().fail_open = true;
        let mut editor = editor();
        editor.open(&manager);

        let mut now = Instant::now();
        manager.poll_at(now);
        for _ in 0..10 {
            now += Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS);
            manager.poll_at(now);
            manager.poll_at(now);
        }
        assert_eq!(editor.status(), StreamStatus::Stalled);
    }

    #[test]
    fn test_resize_mid_polygon_keeps_geometry() {
        let mut editor = editor();
        editor.set_mode(DrawMode::Polygon);
        for p in [(0.0, 0.0), (400.0, 0.0), (400.0, 225.0)] {
            editor.handle_pointer(PointerEvent::Down(Point::new(p.0, p.1))).unwrap();
        }
        editor.set_surface_size(Size::new(400.0, 225.0));
        editor.handle_pointer(PointerEvent::DoubleClick(Point::new(200.0, 112.5))).unwrap();
        let id = editor.confirm().unwrap();

        assert_eq!(
            editor.regions().get(id).unwrap().vertices,
            vec![Point::new(0.0, 0.0), Point::new(0.5, 0.0), Point::new(0.5, 0.5)]
        );
    }

    #[test]
    fn test_reference_change_mid_drag_keeps_geometry() {
        let mut editor = editor();
        editor.set_mode(DrawMode::Rectangle);
        editor.handle_pointer(PointerEvent::Down(Point::new(400.0, 225.0))).unwrap();
        // 4:3 refits to 800x600
        editor.set_reference(ReferenceResolution::new(640, 480));
        editor.handle_pointer(PointerEvent::Up(Point::new(800.0, 600.0))).unwrap();
        let id = editor.confirm().unwrap();

        let vertices = &editor.regions().get(id).unwrap().vertices;
        assert!((vertices[0].x - 0.5).abs() < 1e-9);
        assert!((vertices[0].y - 0.5).abs() < 1e-9);
        assert_eq!(vertices[1], Point::new(1.0, 1.0));
    }

    #[test]
    fn test_loaded_legacy_region_editable_before_save() {
        let store = MemoryRegionStore::new();
        store
            .insert_raw(
                2,
                r#"[{"id":3,"type":"RECTANGLE","name":"old","enabled":true,"points":[{"x":640,"y":360},{"x":960,"y":540}]}]"#,
            )
            .unwrap();
        let mut editor = editor();
        pollster::block_on(editor.load(&store)).unwrap();

        editor.begin_edit(3).unwrap();
        let anchor = editor.machine().anchor().unwrap();
        let hover = editor.machine().hover().unwrap();
        assert!((anchor.x - 800.0 / 3.0).abs() < 1e-9);
        assert!((anchor.y - 150.0).abs() < 1e-9);
        assert!((hover.x - 400.0).abs() < 1e-9);
        assert!((hover.y - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_redraw_flag() {
        let mut editor = editor();
        assert!(editor.needs_redraw());
        editor.mark_drawn();
        assert!(!editor.needs_redraw());
        editor.set_mode(DrawMode::Rectangle);
        assert!(editor.needs_redraw());
        editor.mark_drawn();
        editor.handle_pointer(PointerEvent::Move(Point::new(1.0, 1.0))).unwrap();
        assert!(!editor.needs_redraw());
    }
}
