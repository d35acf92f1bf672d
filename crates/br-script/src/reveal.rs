//! Scroll-driven reveal animations and lazy image promotion.

use std::collections::HashSet;

use br_core::PageResult;
use br_dom::NodeId;
use br_page::Component;
use br_page::PageState;

const RATIO_EPSILON: f32 = 0.0005;

/// Which elements are observed and when they count as visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRevealConfig {
    /// Class names whose elements enter the watch list.
    pub observe_classes: Vec<String>,
    /// Class added once the element crosses the threshold.
    pub reveal_class: String,
    /// Fraction of the element that must be inside the viewport.
    pub threshold: f32,
    /// Promote `data-src` on watched `img` elements to `src`.
    pub lazy_images: bool,
}

impl ScrollRevealConfig {
    pub fn portfolio() -> Self {
        Self {
            observe_classes: vec!["fade-in".to_owned(), "about".to_owned()],
            reveal_class: "visible".to_owned(),
            threshold: 0.3,
            lazy_images: false,
        }
    }

    pub fn bakery() -> Self {
        Self {
            observe_classes: vec![
                "product-card".to_owned(),
                "step".to_owned(),
                "testimonial-card".to_owned(),
            ],
            reveal_class: "animate-in".to_owned(),
            threshold: 0.1,
            lazy_images: true,
        }
    }
}

impl Default for ScrollRevealConfig {
    fn default() -> Self {
        Self::portfolio()
    }
}

/// One-shot reveal: once an element has been seen it stays revealed,
/// scrolling back up never removes the class.
pub struct ScrollReveal {
    config: ScrollRevealConfig,
    watched: Vec<NodeId>,
    revealed: HashSet<NodeId>,
}

impl ScrollReveal {
    pub fn new(config: ScrollRevealConfig) -> Self {
        Self {
            config,
            watched: Vec::new(),
            revealed: HashSet::new(),
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    fn collect_watched(&mut self, page: &PageState) {
        self.watched.clear();
        for class in &self.config.observe_classes {
            for node in page.dom.elements_by_class(class) {
                if !self.watched.contains(&node) {
                    self.watched.push(node);
                }
            }
        }
        if self.config.lazy_images {
            for node in page.dom.elements_by_tag("img") {
                if page.dom.attr(node, "data-src").is_some() && !self.watched.contains(&node) {
                    self.watched.push(node);
                }
            }
        }
    }

    fn check(&mut self, page: &mut PageState) {
        for &node in &self.watched {
            if self.revealed.contains(&node) {
                continue;
            }
            if page.visible_ratio(node) + RATIO_EPSILON < self.config.threshold {
                continue;
            }
            page.dom.add_class(node, &self.config.reveal_class);
            if self.config.lazy_images {
                promote_lazy_image(page, node);
            }
            self.revealed.insert(node);
        }
    }
}

fn promote_lazy_image(page: &mut PageState, node: NodeId) {
    if page.dom.tag(node) != Some("img") {
        return;
    }
    if let Some(src) = page.dom.attr(node, "data-src").map(str::to_owned) {
        let _ = page.dom.set_attr(node, "src", &src);
        page.dom.remove_attr(node, "data-src");
    }
}

impl Component for ScrollReveal {
    fn name(&self) -> &'static str {
        "scroll-reveal"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.collect_watched(page);
        // Reduced motion skips the animation entirely: everything shows
        // at once instead of sliding in as the user scrolls.
        if page.reduced_motion {
            let watched = self.watched.clone();
            for node in watched {
                page.dom.add_class(node, &self.config.reveal_class);
                if self.config.lazy_images {
                    promote_lazy_image(page, node);
                }
                self.revealed.insert(node);
            }
            return Ok(());
        }
        self.check(page);
        Ok(())
    }

    fn on_scroll(&mut self, page: &mut PageState) {
        self.check(page);
    }

    fn on_frame(&mut self, page: &mut PageState) {
        self.check(page);
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollReveal;
    use super::ScrollRevealConfig;
    use br_core::Rect;
    use br_dom::NodeId;
    use br_page::Component;
    use br_page::PageState;
    use url::Url;

    fn state() -> PageState {
        let url = Url::parse("https://bakery.test/").unwrap_or_else(|_| unreachable!());
        PageState::new(url)
    }

    fn card(state: &mut PageState, class: &str, top: u32) -> NodeId {
        let root = state.dom.root();
        let div = state.dom.create_element("div");
        state.dom.add_class(div, class);
        assert!(state.dom.append_child(root, div).is_ok());
        state.set_layout(div, Rect { top, height: 200 });
        div
    }

    #[test]
    fn reveals_elements_already_in_view_on_attach() {
        let mut state = state();
        let near = card(&mut state, "product-card", 100);
        let far = card(&mut state, "product-card", 5000);

        let mut reveal = ScrollReveal::new(ScrollRevealConfig::bakery());
        assert!(reveal.attach(&mut state).is_ok());

        assert!(state.dom.has_class(near, "animate-in"));
        assert!(!state.dom.has_class(far, "animate-in"));
        assert_eq!(reveal.revealed_count(), 1);
    }

    #[test]
    fn reveal_is_one_shot() {
        let mut state = state();
        let far = card(&mut state, "step", 2000);

        let mut reveal = ScrollReveal::new(ScrollRevealConfig::bakery());
        assert!(reveal.attach(&mut state).is_ok());
        assert!(!state.dom.has_class(far, "animate-in"));

        state.viewport.scroll_y = 1800;
        reveal.on_scroll(&mut state);
        assert!(state.dom.has_class(far, "animate-in"));

        // Scrolling back up keeps the class.
        state.viewport.scroll_y = 0;
        reveal.on_scroll(&mut state);
        assert!(state.dom.has_class(far, "animate-in"));
    }

    #[test]
    fn threshold_controls_when_the_class_lands() {
        let mut state = state();
        let node = card(&mut state, "fade-in", 940);

        let mut reveal = ScrollReveal::new(ScrollRevealConfig::portfolio());
        assert!(reveal.attach(&mut state).is_ok());
        // 30% of 200px is 60px; none is visible yet.
        assert!(!state.dom.has_class(node, "visible"));

        state.viewport.scroll_y = 200;
        reveal.on_scroll(&mut state);
        assert!(state.dom.has_class(node, "visible"));
    }

    #[test]
    fn lazy_images_promote_data_src_once_visible() {
        let mut state = state();
        let root = state.dom.root();
        let img = state.dom.create_element("img");
        assert!(
            state
                .dom
                .set_attr(img, "data-src", "/assets/img/cake.jpg")
                .is_ok()
        );
        assert!(state.dom.append_child(root, img).is_ok());
        state.set_layout(img, Rect { top: 50, height: 100 });

        let mut reveal = ScrollReveal::new(ScrollRevealConfig::bakery());
        assert!(reveal.attach(&mut state).is_ok());

        assert_eq!(state.dom.attr(img, "src"), Some("/assets/img/cake.jpg"));
        assert_eq!(state.dom.attr(img, "data-src"), None);
    }

    #[test]
    fn reduced_motion_reveals_everything_immediately() {
        let mut state = state();
        state.reduced_motion = true;
        let far = card(&mut state, "testimonial-card", 9000);

        let mut reveal = ScrollReveal::new(ScrollRevealConfig::bakery());
        assert!(reveal.attach(&mut state).is_ok());
        assert!(state.dom.has_class(far, "animate-in"));
    }
}
