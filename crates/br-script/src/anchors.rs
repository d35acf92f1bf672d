//! In-page anchor navigation: clicks on `#fragment` links move the
//! viewport to the target element's top.

use br_core::PageResult;
use br_page::Component;
use br_page::DomEvent;
use br_page::PageState;

#[derive(Debug, Default)]
pub struct SmoothScroll;

impl SmoothScroll {
    pub fn new() -> Self {
        Self
    }
}

impl Component for SmoothScroll {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn attach(&mut self, _page: &mut PageState) -> PageResult<()> {
        Ok(())
    }

    fn on_event(&mut self, page: &mut PageState, event: &DomEvent) {
        let DomEvent::Click { target } = *event else {
            return;
        };
        if page.dom.tag(target) != Some("a") {
            return;
        }
        let Some(fragment) = page
            .dom
            .attr(target, "href")
            .and_then(|href| href.strip_prefix('#'))
            .map(str::to_owned)
        else {
            return;
        };
        if fragment.is_empty() {
            return;
        }
        let Some(node) = page.dom.element_by_id(&fragment) else {
            return;
        };
        if let Some(rect) = page.layout_of(node) {
            page.viewport.scroll_y = rect.top;
        }
    }
}
