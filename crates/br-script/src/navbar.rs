//! Scroll-reactive navbar: solid background, auto-hide on downward scroll.

use br_core::PageResult;
use br_page::Component;
use br_page::PageState;
use br_page::Signal;
use br_timer::FrameCoalescer;

/// Offset past which the navbar gets its solid background.
const SOLID_THRESHOLD: u32 = 50;
/// Offset past which downward scrolling hides the navbar.
const HIDE_THRESHOLD: u32 = 100;

const CLASS_SCROLLED: &str = "navbar-scrolled";
const CLASS_HIDDEN: &str = "navbar-hidden";
const CLASS_VISIBLE: &str = "navbar-visible";

/// Derives navbar classes from the scroll offset each animation frame.
///
/// Scroll events only mark a frame pending; the class update runs at most
/// once per frame no matter how many scroll events arrive in between.
pub struct NavbarController {
    last_offset: u32,
    frame: FrameCoalescer,
}

impl NavbarController {
    pub fn new() -> Self {
        Self {
            last_offset: 0,
            frame: FrameCoalescer::new(),
        }
    }

    fn update(&mut self, page: &mut PageState) {
        let Some(header) = page.dom.elements_by_tag("header").first().copied() else {
            return;
        };
        let offset = page.viewport.scroll_y;

        if offset > SOLID_THRESHOLD {
            page.dom.add_class(header, CLASS_SCROLLED);
        } else {
            page.dom.remove_class(header, CLASS_SCROLLED);
        }

        if offset > HIDE_THRESHOLD && offset > self.last_offset {
            // Scrolling down past the threshold hides the bar.
            page.dom.add_class(header, CLASS_HIDDEN);
            page.dom.remove_class(header, CLASS_VISIBLE);
        } else {
            page.dom.remove_class(header, CLASS_HIDDEN);
            page.dom.add_class(header, CLASS_VISIBLE);
        }

        self.last_offset = offset;
    }
}

impl Default for NavbarController {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for NavbarController {
    fn name(&self) -> &'static str {
        "navbar"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.update(page);
        Ok(())
    }

    fn on_signal(&mut self, page: &mut PageState, signal: Signal) {
        // The header may not have existed at attach time.
        if signal == Signal::HeaderLoaded {
            self.update(page);
        }
    }

    fn on_scroll(&mut self, _page: &mut PageState) {
        self.frame.request();
    }

    fn on_frame(&mut self, page: &mut PageState) {
        if self.frame.take() {
            self.update(page);
        }
    }
}
