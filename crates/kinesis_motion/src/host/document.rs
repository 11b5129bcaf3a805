// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulated document: viewport, scroll, pointer and element layout.
//!
//! Mutators dispatch [`HostEvent`]s to listeners registered with
//! [`Document::listen`]. Listeners run without the document lock held and
//! receive the document itself so they can query layout. A listener that
//! returns [`ControlFlow::Break`] is unregistered immediately, which is how
//! one-shot observers release their observation from inside a callback.

use crate::error::{ConfigurationError, Result};
use crate::host::geometry::{Point, Rect, Size};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Unique identifier for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

/// Category of host event a listener subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Scroll offset changed
    Scroll,
    /// Viewport or document size changed
    Resize,
    /// Pointer moved
    PointerMove,
    /// An element was inserted, moved, resized or removed
    Layout,
}

/// Event delivered to listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// New scroll offset
    Scroll(Point),
    /// New viewport size
    Resize(Size),
    /// New pointer position in viewport coordinates
    PointerMove(Point),
    /// Element inserted or its rect changed
    ElementChanged(ElementId),
    /// Element removed from the document
    ElementRemoved(ElementId),
}

impl HostEvent {
    /// The kind this event is dispatched under
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Scroll(_) => EventKind::Scroll,
            Self::Resize(_) => EventKind::Resize,
            Self::PointerMove(_) => EventKind::PointerMove,
            Self::ElementChanged(_) | Self::ElementRemoved(_) => EventKind::Layout,
        }
    }
}

type ListenerCallback = Box<dyn FnMut(&HostEvent, &Document) -> ControlFlow<()> + Send>;

struct ListenerEntry {
    kinds: Vec<EventKind>,
    /// Taken out while the callback runs
    callback: Option<ListenerCallback>,
}

struct DocumentInner {
    viewport: Size,
    scroll: Point,
    pointer: Option<Point>,
    height: f32,
    elements: IndexMap<ElementId, Rect>,
    listeners: IndexMap<ListenerId, ListenerEntry>,
}

/// Host layout and input notification primitive.
///
/// Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<Mutex<DocumentInner>>,
}

impl Document {
    /// Create a document whose height equals the viewport height
    pub fn new(viewport: Size) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DocumentInner {
                viewport,
                scroll: Point::default(),
                pointer: None,
                height: viewport.height,
                elements: IndexMap::new(),
                listeners: IndexMap::new(),
            })),
        }
    }

    /// Viewport size
    pub fn viewport(&self) -> Size {
        self.inner.lock().viewport
    }

    /// Scroll offset of the viewport's top-left corner
    pub fn scroll(&self) -> Point {
        self.inner.lock().scroll
    }

    /// Last known pointer position, if the pointer ever moved
    pub fn pointer(&self) -> Option<Point> {
        self.inner.lock().pointer
    }

    /// Total scrollable height
    pub fn height(&self) -> f32 {
        self.inner.lock().height
    }

    /// Rect of an element in document coordinates
    pub fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.inner.lock().elements.get(&element).copied()
    }

    /// Whether the element is attached
    pub fn contains(&self, element: ElementId) -> bool {
        self.inner.lock().elements.contains_key(&element)
    }

    /// Rect of an element or [`ConfigurationError::UnknownElement`]
    pub(crate) fn require_element(&self, element: ElementId) -> Result<Rect> {
        self.element_rect(element)
            .ok_or(ConfigurationError::UnknownElement)
    }

    /// Set the scroll offset
    pub fn scroll_to(&self, x: f32, y: f32) {
        let scroll = Point::new(x, y);
        {
            let mut inner = self.inner.lock();
            if inner.scroll == scroll {
                return;
            }
            inner.scroll = scroll;
        }
        self.dispatch(HostEvent::Scroll(scroll));
    }

    /// Scroll vertically by `dy`
    pub fn scroll_by(&self, dy: f32) {
        let scroll = self.scroll();
        self.scroll_to(scroll.x, scroll.y + dy);
    }

    /// Resize the viewport
    pub fn resize_viewport(&self, viewport: Size) {
        {
            let mut inner = self.inner.lock();
            inner.viewport = viewport;
            inner.height = inner.height.max(viewport.height);
        }
        self.dispatch(HostEvent::Resize(viewport));
    }

    /// Set the total document height
    pub fn set_height(&self, height: f32) {
        let viewport = {
            let mut inner = self.inner.lock();
            inner.height = height;
            inner.viewport
        };
        self.dispatch(HostEvent::Resize(viewport));
    }

    /// Move the pointer to a viewport position
    pub fn move_pointer(&self, x: f32, y: f32) {
        let position = Point::new(x, y);
        self.inner.lock().pointer = Some(position);
        self.dispatch(HostEvent::PointerMove(position));
    }

    /// Attach an element and return its ID
    pub fn insert_element(&self, rect: Rect) -> ElementId {
        let id = ElementId::new();
        {
            let mut inner = self.inner.lock();
            inner.elements.insert(id, rect);
            inner.height = inner.height.max(rect.bottom());
        }
        self.dispatch(HostEvent::ElementChanged(id));
        id
    }

    /// Move or resize an attached element; returns false if it is unknown
    pub fn set_element_rect(&self, element: ElementId, rect: Rect) -> bool {
        {
            let mut inner = self.inner.lock();
            let Some(slot) = inner.elements.get_mut(&element) else {
                return false;
            };
            *slot = rect;
            inner.height = inner.height.max(rect.bottom());
        }
        self.dispatch(HostEvent::ElementChanged(element));
        true
    }

    /// Detach an element; returns false if it was not attached
    pub fn remove_element(&self, element: ElementId) -> bool {
        if self.inner.lock().elements.shift_remove(&element).is_none() {
            return false;
        }
        self.dispatch(HostEvent::ElementRemoved(element));
        true
    }

    /// Register a listener for the given event kinds
    pub fn listen(
        &self,
        kinds: &[EventKind],
        callback: impl FnMut(&HostEvent, &Document) -> ControlFlow<()> + Send + 'static,
    ) -> ListenerHandle {
        let id = ListenerId(Uuid::new_v4());
        self.inner.lock().listeners.insert(
            id,
            ListenerEntry {
                kinds: kinds.to_vec(),
                callback: Some(Box::new(callback)),
            },
        );

        ListenerHandle {
            id,
            document: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners
    pub fn live_listeners(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    fn dispatch(&self, event: HostEvent) {
        let kind = event.kind();
        let ids: Vec<ListenerId> = self
            .inner
            .lock()
            .listeners
            .iter()
            .filter(|(_, entry)| entry.kinds.contains(&kind))
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            let callback = self
                .inner
                .lock()
                .listeners
                .get_mut(&id)
                .and_then(|entry| entry.callback.take());
            let Some(mut callback) = callback else {
                continue;
            };

            let flow = callback(&event, self);

            let mut inner = self.inner.lock();
            match flow {
                ControlFlow::Continue(()) => {
                    if let Some(entry) = inner.listeners.get_mut(&id) {
                        entry.callback = Some(callback);
                    }
                }
                ControlFlow::Break(()) => {
                    inner.listeners.shift_remove(&id);
                }
            }
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Document")
            .field("viewport", &inner.viewport)
            .field("scroll", &inner.scroll)
            .field("height", &inner.height)
            .field("elements", &inner.elements.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Owned listener registration.
///
/// [`ListenerHandle::cancel`] is idempotent; dropping the handle cancels.
#[must_use = "dropping a ListenerHandle removes the listener"]
pub struct ListenerHandle {
    id: ListenerId,
    document: Weak<Mutex<DocumentInner>>,
}

impl ListenerHandle {
    /// Registration ID
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener
    pub fn cancel(&mut self) {
        if let Some(inner) = self.document.upgrade() {
            inner.lock().listeners.shift_remove(&self.id);
        }
        self.document = Weak::new();
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.document
            .upgrade()
            .is_some_and(|inner| inner.lock().listeners.contains_key(&self.id))
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}
