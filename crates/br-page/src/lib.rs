//! Page runtime: state, lifecycle signals, and the component driver loop.

use br_core::PageResult;
use br_core::Rect;
use br_dom::Dom;
use br_dom::NodeId;
use br_timer::Clock;
use std::collections::HashMap;
use url::Url;

/// Broadcast signal raised when a fragment finishes loading (real or fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    HeaderLoaded,
    FooterLoaded,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeaderLoaded => "header:loaded",
            Self::FooterLoaded => "footer:loaded",
        }
    }
}

/// User-interaction event routed to every attached component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Click { target: NodeId },
    Submit { target: NodeId },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId },
    /// Host report that an `<img>` failed to load.
    ImageError { target: NodeId },
}

/// Visible window over the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub height: u32,
    pub scroll_y: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            height: 800,
            scroll_y: 0,
        }
    }
}

/// Side effects recorded for the host instead of performed.
///
/// Alerts and opened windows are browser chrome; the runtime appends them
/// here and the embedder decides how (or whether) to surface them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEffects {
    pub alerts: Vec<String>,
    pub opened: Vec<Url>,
}

/// Mutable state shared by every component attached to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub dom: Dom,
    pub location: Url,
    pub clock: Clock,
    pub viewport: Viewport,
    pub reduced_motion: bool,
    pub effects: HostEffects,
    layout: HashMap<NodeId, Rect>,
    signals: Vec<Signal>,
}

impl PageState {
    pub fn new(location: Url) -> Self {
        Self {
            dom: Dom::new(),
            location,
            clock: Clock::new(),
            viewport: Viewport::default(),
            reduced_motion: false,
            effects: HostEffects::default(),
            layout: HashMap::new(),
            signals: Vec::new(),
        }
    }

    /// Records host-computed geometry for an element.
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        self.layout.insert(node, rect);
    }

    pub fn layout_of(&self, node: NodeId) -> Option<Rect> {
        self.layout.get(&node).copied()
    }

    /// Fraction of the element currently inside the viewport; elements
    /// without layout are treated as not visible.
    pub fn visible_ratio(&self, node: NodeId) -> f32 {
        self.layout_of(node)
            .map(|rect| rect.visible_ratio(self.viewport.scroll_y, self.viewport.height))
            .unwrap_or(0.0)
    }

    pub fn is_http(&self) -> bool {
        matches!(self.location.scheme(), "http" | "https")
    }

    pub fn emit_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        self.effects.alerts.push(message.into());
    }

    /// Records a request to open `url` in a new browsing context.
    pub fn open(&mut self, url: Url) {
        self.effects.opened.push(url);
    }
}

/// Lifecycle contract for one page behavior.
///
/// Components own all of their state and touch the page only through the
/// `PageState` handle passed in, so re-initialization after a fragment reload
/// is an explicit `detach`/`attach` pair rather than a global flag.
pub trait Component {
    fn name(&self) -> &'static str;

    fn attach(&mut self, page: &mut PageState) -> PageResult<()>;

    fn detach(&mut self, _page: &mut PageState) {}

    fn on_signal(&mut self, _page: &mut PageState, _signal: Signal) {}

    fn on_scroll(&mut self, _page: &mut PageState) {}

    fn on_frame(&mut self, _page: &mut PageState) {}

    fn on_event(&mut self, _page: &mut PageState, _event: &DomEvent) {}

    /// Timer pump: called after the clock advances.
    fn advance(&mut self, _page: &mut PageState) {}
}

/// Owner of one page's state and its attached components.
pub struct Page {
    pub state: PageState,
    components: Vec<Box<dyn Component>>,
}

impl Page {
    pub fn new(location: Url) -> Self {
        Self {
            state: PageState::new(location),
            components: Vec::new(),
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Attaches a component and fans out any signals its attach raised.
    pub fn attach(&mut self, mut component: Box<dyn Component>) -> PageResult<()> {
        component.attach(&mut self.state)?;
        self.components.push(component);
        self.broadcast_pending();
        Ok(())
    }

    pub fn detach_all(&mut self) {
        let mut components = std::mem::take(&mut self.components);
        for component in &mut components {
            component.detach(&mut self.state);
        }
    }

    /// Moves the viewport and notifies scroll listeners.
    pub fn scroll_to(&mut self, scroll_y: u32) {
        self.state.viewport.scroll_y = scroll_y;
        for component in &mut self.components {
            component.on_scroll(&mut self.state);
        }
        self.broadcast_pending();
    }

    /// Runs one animation frame.
    pub fn run_frame(&mut self) {
        for component in &mut self.components {
            component.on_frame(&mut self.state);
        }
        self.broadcast_pending();
    }

    /// Advances the clock and pumps component timers, then runs a frame.
    pub fn advance(&mut self, ms: u64) {
        self.state.clock.advance(ms);
        for component in &mut self.components {
            component.advance(&mut self.state);
        }
        self.run_frame();
    }

    /// Routes one interaction event to every component.
    pub fn dispatch(&mut self, event: DomEvent) {
        for component in &mut self.components {
            component.on_event(&mut self.state, &event);
        }
        self.broadcast_pending();
    }

    /// Drains queued signals and broadcasts them until none remain.
    ///
    /// A signal handler may emit further signals; each queued signal is
    /// delivered to every component exactly once.
    fn broadcast_pending(&mut self) {
        loop {
            let pending = self.state.drain_signals();
            if pending.is_empty() {
                return;
            }
            for signal in pending {
                for component in &mut self.components {
                    component.on_signal(&mut self.state, signal);
                }
            }
        }
    }
}
