//! RoiScope Core Library
//!
//! Platform-agnostic model and logic for the RoiScope region editor: the
//! frame channel connection, coordinate transforms, regions and the drawing
//! state machine.

pub mod drawing;
pub mod editor;
pub mod input;
pub mod protocol;
pub mod reference;
pub mod region;
pub mod storage;
pub mod stream;
pub mod transform;
pub mod transport;

pub use drawing::{DrawError, DrawMode, DrawingMachine};
pub use editor::{EditorError, LatestFrame, Notice, NoticeLevel, RoiEditor, StreamStatus};
pub use input::{ClickTracker, PointerEvent};
pub use protocol::{ChannelCommand, ChannelId, ProtocolError, StreamMessage};
pub use reference::ReferenceResolution;
pub use region::{Region, RegionId, RegionKind, RegionSet};
pub use storage::{MemoryRegionStore, RegionStore, StorageError};
pub use stream::{ConnectionState, StreamConfig, StreamManager, WeakStreamManager};
pub use transform::{SurfaceBounds, SurfaceTransform};
pub use transport::{FrameTransport, PlatformTransport, TransportError, TransportEvent};
