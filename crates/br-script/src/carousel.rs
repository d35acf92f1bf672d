//! Testimonial spotlight: one record shown at a time with auto-rotation,
//! prev/next arrows, jump dots, and hover pause.

use br_core::PageResult;
use br_dom::NodeId;
use br_page::Component;
use br_page::DomEvent;
use br_page::PageState;
use br_timer::Interval;
use tracing::debug;

pub const AUTO_ROTATE_MS: u64 = 6000;

const HALF_STAR_EPSILON: f32 = 0.001;

/// One customer review.
#[derive(Debug, Clone, PartialEq)]
pub struct Testimonial {
    pub name: String,
    pub role: String,
    pub date: String,
    pub rating: f32,
    pub image: Option<String>,
    pub quote: String,
}

/// The three reviews shipped with the bakery landing page.
pub fn sample_testimonials() -> Vec<Testimonial> {
    vec![
        Testimonial {
            name: "Josephine K.".to_owned(),
            role: "Thamani Bakery".to_owned(),
            date: "10 Jan 2026".to_owned(),
            rating: 5.0,
            image: Some("/assets/img/testimonials/josephine.jpg".to_owned()),
            quote: "The birthday cake was absolutely stunning and tasted even \
                    better than it looked. Ordering over WhatsApp was effortless."
                .to_owned(),
        },
        Testimonial {
            name: "Kyle".to_owned(),
            role: "Kyle Pharmacy".to_owned(),
            date: "25 Jan 2025".to_owned(),
            rating: 5.0,
            image: None,
            quote: "We order bread and pastries for the staff room every week. \
                    Always fresh, always on time."
                .to_owned(),
        },
        Testimonial {
            name: "Sara M.".to_owned(),
            role: "E-Commerce Client".to_owned(),
            date: "05 Feb 2025".to_owned(),
            rating: 4.9,
            image: Some("/assets/img/testimonials/sara.jpg".to_owned()),
            quote: "The custom wedding cake exceeded every expectation. Guests \
                    are still talking about it."
                .to_owned(),
        },
    ]
}

/// Element ids the carousel binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselSlots {
    pub card: String,
    pub text: String,
    pub name: String,
    pub role: String,
    pub rating: String,
    pub date: String,
    pub avatar: String,
    pub prev: String,
    pub next: String,
    pub dots: String,
}

impl Default for CarouselSlots {
    fn default() -> Self {
        Self {
            card: "testimonial-card".to_owned(),
            text: "testimonial-text".to_owned(),
            name: "testimonial-name".to_owned(),
            role: "testimonial-role".to_owned(),
            rating: "testimonial-rating".to_owned(),
            date: "testimonial-date".to_owned(),
            avatar: "testimonial-avatar".to_owned(),
            prev: "testimonial-prev".to_owned(),
            next: "testimonial-next".to_owned(),
            dots: "testimonial-dots".to_owned(),
        }
    }
}

/// Resolved node ids for the bound slots; absent optional slots stay `None`.
#[derive(Debug, Clone, Copy, Default)]
struct BoundSlots {
    card: Option<NodeId>,
    text: Option<NodeId>,
    name: Option<NodeId>,
    role: Option<NodeId>,
    rating: Option<NodeId>,
    date: Option<NodeId>,
    avatar: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    dots: Option<NodeId>,
}

pub struct TestimonialCarousel {
    records: Vec<Testimonial>,
    slots: CarouselSlots,
    bound: BoundSlots,
    index: usize,
    rotate: Option<Interval>,
    /// Records whose avatar image failed to load; rendered as initials.
    image_failed: Vec<bool>,
    active: bool,
}

impl TestimonialCarousel {
    pub fn new(records: Vec<Testimonial>) -> Self {
        let image_failed = vec![false; records.len()];
        Self {
            records,
            slots: CarouselSlots::default(),
            bound: BoundSlots::default(),
            index: 0,
            rotate: None,
            image_failed,
            active: false,
        }
    }

    pub fn with_slots(mut self, slots: CarouselSlots) -> Self {
        self.slots = slots;
        self
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    fn next(&mut self) {
        self.index = (self.index + 1) % self.records.len();
    }

    fn prev(&mut self) {
        self.index = (self.index + self.records.len() - 1) % self.records.len();
    }

    fn go_to(&mut self, index: usize) {
        self.index = index % self.records.len();
    }

    fn start_rotation(&mut self, page: &PageState) {
        if page.reduced_motion {
            return;
        }
        self.rotate = Some(Interval::start(page.clock.now(), AUTO_ROTATE_MS));
    }

    fn bind(&mut self, page: &PageState) {
        let by_id = |id: &str| page.dom.element_by_id(id);
        self.bound = BoundSlots {
            card: by_id(&self.slots.card),
            text: by_id(&self.slots.text),
            name: by_id(&self.slots.name),
            role: by_id(&self.slots.role),
            rating: by_id(&self.slots.rating),
            date: by_id(&self.slots.date),
            avatar: by_id(&self.slots.avatar),
            prev: by_id(&self.slots.prev),
            next: by_id(&self.slots.next),
            dots: by_id(&self.slots.dots),
        };
    }

    fn build_dots(&self, page: &mut PageState) {
        let Some(dots) = self.bound.dots else {
            return;
        };
        page.dom.clear_children(dots);
        for index in 0..self.records.len() {
            let dot = page.dom.create_element("button");
            let _ = page.dom.set_attr(dot, "type", "button");
            page.dom.add_class(dot, "spotlight-dot");
            let _ = page
                .dom
                .set_attr(dot, "aria-label", &format!("Show testimonial {}", index + 1));
            let _ = page.dom.set_attr(dot, "data-index", &index.to_string());
            let _ = page.dom.append_child(dots, dot);
        }
    }

    fn render(&self, page: &mut PageState) {
        let Some(record) = self.records.get(self.index).cloned() else {
            return;
        };

        if let Some(text) = self.bound.text {
            let _ = page.dom.set_text(text, &record.quote);
        }
        if let Some(name) = self.bound.name {
            let _ = page.dom.set_text(name, &record.name);
        }
        if let Some(role) = self.bound.role {
            let _ = page.dom.set_text(role, &record.role);
        }
        if let Some(date) = self.bound.date {
            let _ = page.dom.set_text(date, &format!("on {}", record.date));
        }
        if let Some(rating) = self.bound.rating {
            render_rating(page, rating, record.rating);
        }
        if let Some(avatar) = self.bound.avatar {
            let failed = self.image_failed.get(self.index).copied().unwrap_or(false);
            render_avatar(page, avatar, &record, failed);
        }
        self.render_dots(page);
    }

    fn render_dots(&self, page: &mut PageState) {
        let Some(dots) = self.bound.dots else {
            return;
        };
        let children = page.dom.children(dots).to_vec();
        for (index, dot) in children.into_iter().enumerate() {
            if index == self.index {
                page.dom.add_class(dot, "active");
            } else {
                page.dom.remove_class(dot, "active");
            }
        }
    }

    fn dot_index(&self, page: &PageState, target: NodeId) -> Option<usize> {
        let dots = self.bound.dots?;
        if !page.dom.is_within(target, dots) || !page.dom.has_class(target, "spotlight-dot") {
            return None;
        }
        page.dom.attr(target, "data-index")?.parse().ok()
    }
}

/// Full stars, then a half star when the fraction warrants one.
fn star_counts(rating: f32) -> (u32, bool) {
    let clamped = rating.clamp(0.0, 5.0);
    let full = clamped.floor() as u32;
    let half = clamped.fract() > HALF_STAR_EPSILON;
    (full, half)
}

fn render_rating(page: &mut PageState, slot: NodeId, rating: f32) {
    page.dom.clear_children(slot);
    let (full, half) = star_counts(rating);
    for _ in 0..full {
        let star = page.dom.create_element("i");
        let _ = page.dom.set_attr(star, "class", "fas fa-star");
        let _ = page.dom.append_child(slot, star);
    }
    if half {
        let star = page.dom.create_element("i");
        let _ = page.dom.set_attr(star, "class", "fas fa-star-half-alt");
        let _ = page.dom.append_child(slot, star);
    }
    let value = page.dom.create_element("span");
    page.dom.add_class(value, "rating-value");
    let _ = page.dom.append_child(slot, value);
    let text = page.dom.create_text(&format!("{rating:.1}"));
    let _ = page.dom.append_child(value, text);
}

fn render_avatar(page: &mut PageState, slot: NodeId, record: &Testimonial, image_failed: bool) {
    page.dom.clear_children(slot);
    match &record.image {
        Some(src) if !image_failed => {
            let img = page.dom.create_element("img");
            let _ = page.dom.set_attr(img, "src", src);
            let _ = page.dom.set_attr(img, "alt", &record.name);
            let _ = page.dom.append_child(slot, img);
        }
        _ => {
            let span = page.dom.create_element("span");
            page.dom.add_class(span, "meta-initials");
            let _ = page.dom.append_child(slot, span);
            let text = page.dom.create_text(&initials(&record.name));
            let _ = page.dom.append_child(span, text);
        }
    }
}

/// First letters of up to two words, uppercased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

impl Component for TestimonialCarousel {
    fn name(&self) -> &'static str {
        "testimonial-carousel"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.bind(page);
        let usable =
            !self.records.is_empty() && self.bound.card.is_some() && self.bound.text.is_some();
        if !usable {
            debug!("testimonial spotlight markup missing, carousel inactive");
            self.active = false;
            return Ok(());
        }

        self.active = true;
        self.index = 0;
        self.build_dots(page);
        self.render(page);
        self.start_rotation(page);
        Ok(())
    }

    fn detach(&mut self, _page: &mut PageState) {
        self.active = false;
        self.rotate = None;
    }

    fn on_event(&mut self, page: &mut PageState, event: &DomEvent) {
        if !self.active {
            return;
        }
        match *event {
            DomEvent::Click { target } => {
                if Some(target) == self.bound.prev {
                    self.prev();
                    self.start_rotation(page);
                    self.render(page);
                } else if Some(target) == self.bound.next {
                    self.next();
                    self.start_rotation(page);
                    self.render(page);
                } else if let Some(index) = self.dot_index(page, target) {
                    self.go_to(index);
                    self.start_rotation(page);
                    self.render(page);
                }
            }
            DomEvent::PointerEnter { target } => {
                if self
                    .bound
                    .card
                    .map(|card| page.dom.is_within(target, card))
                    .unwrap_or(false)
                {
                    self.rotate = None;
                }
            }
            DomEvent::PointerLeave { target } => {
                if self
                    .bound
                    .card
                    .map(|card| page.dom.is_within(target, card))
                    .unwrap_or(false)
                    && self.rotate.is_none()
                {
                    self.start_rotation(page);
                }
            }
            DomEvent::ImageError { target } => {
                let in_avatar = self
                    .bound
                    .avatar
                    .map(|avatar| page.dom.is_within(target, avatar))
                    .unwrap_or(false);
                if in_avatar {
                    if let Some(slot) = self.image_failed.get_mut(self.index) {
                        *slot = true;
                    }
                    self.render(page);
                }
            }
            DomEvent::Submit { .. } => {}
        }
    }

    fn advance(&mut self, page: &mut PageState) {
        if !self.active {
            return;
        }
        let now = page.clock.now();
        let ticks = match &mut self.rotate {
            Some(rotate) => rotate.fire(now),
            None => 0,
        };
        if ticks == 0 {
            return;
        }
        for _ in 0..ticks {
            self.next();
        }
        self.render(page);
    }
}

#[cfg(test)]
mod tests {
    use super::initials;
    use super::sample_testimonials;
    use super::star_counts;
    use super::TestimonialCarousel;
    use br_dom::NodeId;
    use br_page::Component;
    use br_page::DomEvent;
    use br_page::PageState;
    use url::Url;

    struct Fixture {
        state: PageState,
        card: NodeId,
        text: NodeId,
        avatar: NodeId,
        prev: NodeId,
        next: NodeId,
        dots: NodeId,
    }

    fn fixture() -> Fixture {
        let url = Url::parse("https://bakery.test/").unwrap_or_else(|_| unreachable!());
        let mut state = PageState::new(url);
        let root = state.dom.root();
        let make = |state: &mut PageState, parent: NodeId, tag: &str, id: &str| {
            let node = state.dom.create_element(tag);
            assert!(state.dom.set_attr(node, "id", id).is_ok());
            assert!(state.dom.append_child(parent, node).is_ok());
            node
        };
        let card = make(&mut state, root, "article", "testimonial-card");
        let text = make(&mut state, card, "p", "testimonial-text");
        make(&mut state, card, "span", "testimonial-name");
        make(&mut state, card, "span", "testimonial-role");
        make(&mut state, card, "span", "testimonial-rating");
        make(&mut state, card, "span", "testimonial-date");
        let avatar = make(&mut state, card, "div", "testimonial-avatar");
        let prev = make(&mut state, root, "button", "testimonial-prev");
        let next = make(&mut state, root, "button", "testimonial-next");
        let dots = make(&mut state, root, "div", "testimonial-dots");
        Fixture {
            state,
            card,
            text,
            avatar,
            prev,
            next,
            dots,
        }
    }

    fn attached(fixture: &mut Fixture) -> TestimonialCarousel {
        let mut carousel = TestimonialCarousel::new(sample_testimonials());
        assert!(carousel.attach(&mut fixture.state).is_ok());
        carousel
    }

    #[test]
    fn renders_the_first_record_with_dots_on_attach() {
        let mut fx = fixture();
        let carousel = attached(&mut fx);

        assert_eq!(carousel.current_index(), 0);
        assert!(fx
            .state
            .dom
            .text_content(fx.text)
            .starts_with("The birthday cake"));

        let dots = fx.state.dom.children(fx.dots).to_vec();
        assert_eq!(dots.len(), 3);
        assert!(fx.state.dom.has_class(dots[0], "active"));
        assert_eq!(
            fx.state.dom.attr(dots[1], "aria-label"),
            Some("Show testimonial 2")
        );
    }

    #[test]
    fn auto_rotates_every_interval() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        fx.state.clock.advance(5999);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 0);

        fx.state.clock.advance(1);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 1);

        // A long stall catches up one record per elapsed period.
        fx.state.clock.advance(12_000);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn arrows_wrap_and_restart_the_rotation() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        carousel.on_event(&mut fx.state, &DomEvent::Click { target: fx.prev });
        assert_eq!(carousel.current_index(), 2);
        carousel.on_event(&mut fx.state, &DomEvent::Click { target: fx.next });
        assert_eq!(carousel.current_index(), 0);

        // The click reset the timer, so a near-full period later nothing moves.
        fx.state.clock.advance(5999);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn dots_jump_to_their_record() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        let dots = fx.state.dom.children(fx.dots).to_vec();
        carousel.on_event(&mut fx.state, &DomEvent::Click { target: dots[2] });
        assert_eq!(carousel.current_index(), 2);
        assert!(fx.state.dom.has_class(dots[2], "active"));
        assert!(!fx.state.dom.has_class(dots[0], "active"));
    }

    #[test]
    fn hover_pauses_and_resumes_rotation() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        carousel.on_event(&mut fx.state, &DomEvent::PointerEnter { target: fx.card });
        fx.state.clock.advance(20_000);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 0);

        carousel.on_event(&mut fx.state, &DomEvent::PointerLeave { target: fx.card });
        fx.state.clock.advance(6000);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 1);
    }

    #[test]
    fn manual_navigation_during_hover_restarts_rotation() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        carousel.on_event(&mut fx.state, &DomEvent::PointerEnter { target: fx.card });
        carousel.on_event(&mut fx.state, &DomEvent::Click { target: fx.next });
        assert_eq!(carousel.current_index(), 1);

        fx.state.clock.advance(6000);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 2);
    }

    #[test]
    fn reduced_motion_disables_auto_rotation_only() {
        let mut fx = fixture();
        fx.state.reduced_motion = true;
        let mut carousel = attached(&mut fx);

        fx.state.clock.advance(30_000);
        carousel.advance(&mut fx.state);
        assert_eq!(carousel.current_index(), 0);

        carousel.on_event(&mut fx.state, &DomEvent::Click { target: fx.next });
        assert_eq!(carousel.current_index(), 1);
    }

    #[test]
    fn failed_avatar_image_falls_back_to_initials() {
        let mut fx = fixture();
        let mut carousel = attached(&mut fx);

        let img = fx.state.dom.elements_by_tag_in(fx.avatar, "img")[0];
        carousel.on_event(&mut fx.state, &DomEvent::ImageError { target: img });

        assert!(fx.state.dom.elements_by_tag_in(fx.avatar, "img").is_empty());
        let span = fx.state.dom.first_by_class("meta-initials");
        assert!(span.is_some_and(|span| fx.state.dom.text_content(span) == "JK"));
    }

    #[test]
    fn rating_renders_full_and_half_stars() {
        assert_eq!(star_counts(5.0), (5, false));
        assert_eq!(star_counts(4.9), (4, true));
        assert_eq!(star_counts(4.0), (4, false));
        assert_eq!(star_counts(0.0), (0, false));
    }

    #[test]
    fn initials_take_the_first_two_words() {
        assert_eq!(initials("Josephine K."), "JK");
        assert_eq!(initials("Kyle"), "K");
        assert_eq!(initials("sara m jones"), "SM");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn missing_markup_leaves_the_carousel_inactive() {
        let url = Url::parse("https://bakery.test/about.html").unwrap_or_else(|_| unreachable!());
        let mut state = PageState::new(url);
        let mut carousel = TestimonialCarousel::new(sample_testimonials());
        assert!(carousel.attach(&mut state).is_ok());

        state.clock.advance(10_000);
        carousel.advance(&mut state);
        assert_eq!(carousel.current_index(), 0);
    }
}
