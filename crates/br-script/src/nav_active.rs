//! Marks exactly one navigation link active for the current page path.

use br_core::PageResult;
use br_dom::NodeId;
use br_page::Component;
use br_page::PageState;
use br_page::Signal;

/// Attr flag on the link container marking it as already initialized.
///
/// The flag lives on the container element, so a freshly injected header
/// fragment arrives unflagged and gets highlighted again, while repeated runs
/// against the same container stay no-ops.
const INIT_GUARD_ATTR: &str = "data-nav-init";

const CLASS_ACTIVE: &str = "active";

/// Route keywords tried in priority order when no link path matches exactly.
const KEYWORD_FALLBACKS: &[(&str, &str)] = &[
    ("/about", "nav-about"),
    ("/expertise", "nav-expertise"),
    ("/projects", "nav-projects"),
    ("/annotation", "nav-annotation"),
    ("/contact", "nav-contact"),
];

const CLASS_HOME: &str = "nav-home";

pub struct ActiveLinkHighlighter {
    container: Option<NodeId>,
}

impl ActiveLinkHighlighter {
    pub fn new() -> Self {
        Self { container: None }
    }

    fn run(&mut self, page: &mut PageState) {
        let Some(container) = find_nav_list(page) else {
            return;
        };
        if page.dom.attr(container, INIT_GUARD_ATTR) == Some("1") {
            return;
        }
        let _ = page.dom.set_attr(container, INIT_GUARD_ATTR, "1");
        self.container = Some(container);

        let links = page.dom.elements_by_tag_in(container, "a");
        if links.is_empty() {
            return;
        }

        let current = normalize_path(page.location.path());
        let chosen = exact_match(page, &links, &current)
            .or_else(|| keyword_match(page, &links, &current))
            .or_else(|| links.first().copied());

        for link in &links {
            page.dom.remove_class(*link, CLASS_ACTIVE);
        }
        if let Some(link) = chosen {
            page.dom.add_class(link, CLASS_ACTIVE);
        }
    }
}

impl Default for ActiveLinkHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ActiveLinkHighlighter {
    fn name(&self) -> &'static str {
        "nav-active"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.run(page);
        Ok(())
    }

    fn detach(&mut self, page: &mut PageState) {
        let Some(container) = self.container.take() else {
            return;
        };
        page.dom.remove_attr(container, INIT_GUARD_ATTR);
        for link in page.dom.elements_by_tag_in(container, "a") {
            page.dom.remove_class(link, CLASS_ACTIVE);
        }
    }

    fn on_signal(&mut self, page: &mut PageState, signal: Signal) {
        if signal == Signal::HeaderLoaded {
            self.run(page);
        }
    }
}

fn find_nav_list(page: &PageState) -> Option<NodeId> {
    let navbar = page.dom.first_by_class("navbar")?;
    page.dom
        .elements_by_tag_in(navbar, "ul")
        .first()
        .copied()
}

fn exact_match(page: &PageState, links: &[NodeId], current: &str) -> Option<NodeId> {
    for link in links {
        let Some(href) = page.dom.attr(*link, "href") else {
            continue;
        };
        let Ok(resolved) = page.location.join(href) else {
            continue;
        };
        if normalize_path(resolved.path()) == current {
            return Some(*link);
        }
    }
    None
}

fn keyword_match(page: &PageState, links: &[NodeId], current: &str) -> Option<NodeId> {
    let class = KEYWORD_FALLBACKS
        .iter()
        .find(|(keyword, _)| current.contains(keyword))
        .map(|(_, class)| *class)
        .unwrap_or(CLASS_HOME);

    links
        .iter()
        .find(|link| page.dom.has_class(**link, class))
        .copied()
}

/// Lowercases the path and treats a trailing `/index.html` as `/`.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.to_ascii_lowercase();
    if normalized.ends_with("/index.html") {
        normalized.truncate(normalized.len() - "index.html".len());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::ActiveLinkHighlighter;
    use super::normalize_path;
    use br_dom::NodeId;
    use br_page::Component;
    use br_page::PageState;
    use br_page::Signal;
    use url::Url;

    fn state_for(path: &str) -> PageState {
        let mut url = Url::parse("https://bakery.test/").unwrap_or_else(|_| unreachable!());
        url.set_path(path);
        PageState::new(url)
    }

    fn build_nav(state: &mut PageState, links: &[(&str, &str)]) -> Vec<NodeId> {
        let root = state.dom.root();
        let nav = state.dom.create_element("nav");
        state.dom.add_class(nav, "navbar");
        let list = state.dom.create_element("ul");
        assert!(state.dom.append_child(root, nav).is_ok());
        assert!(state.dom.append_child(nav, list).is_ok());

        let mut out = Vec::new();
        for (href, class) in links {
            let item = state.dom.create_element("li");
            let link = state.dom.create_element("a");
            assert!(state.dom.set_attr(link, "href", href).is_ok());
            state.dom.add_class(link, class);
            assert!(state.dom.append_child(list, item).is_ok());
            assert!(state.dom.append_child(item, link).is_ok());
            out.push(link);
        }
        out
    }

    const NAV: &[(&str, &str)] = &[
        ("/index.html", "nav-home"),
        ("/about.html", "nav-about"),
        ("/projects.html", "nav-projects"),
        ("/contact.html", "nav-contact"),
    ];

    #[test]
    fn exact_path_match_wins() {
        let mut state = state_for("/about.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        assert!(state.dom.has_class(links[1], "active"));
        assert!(!state.dom.has_class(links[0], "active"));
    }

    #[test]
    fn root_path_equals_index_html() {
        let mut state = state_for("/");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        assert!(state.dom.has_class(links[0], "active"));
    }

    #[test]
    fn keyword_fallback_picks_section_link() {
        // Path matches no href exactly, but contains "projects".
        let mut state = state_for("/projects/pos-system.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        assert!(state.dom.has_class(links[2], "active"));
    }

    #[test]
    fn keyword_needs_a_path_segment_boundary() {
        // "whereabouts" contains "about", but not "/about".
        let mut state = state_for("/whereabouts.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        assert!(!state.dom.has_class(links[1], "active"));
        assert!(state.dom.has_class(links[0], "active"));
    }

    #[test]
    fn unknown_path_defaults_to_home() {
        let mut state = state_for("/press-kit.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        assert!(state.dom.has_class(links[0], "active"));
    }

    #[test]
    fn second_run_on_same_container_is_a_no_op() {
        let mut state = state_for("/about.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());

        // Simulate outside interference, then re-signal: the guard holds.
        state.dom.remove_class(links[1], "active");
        highlighter.on_signal(&mut state, Signal::HeaderLoaded);
        assert!(!state.dom.has_class(links[1], "active"));
    }

    #[test]
    fn detach_clears_guard_so_reattach_reruns() {
        let mut state = state_for("/about.html");
        let links = build_nav(&mut state, NAV);
        let mut highlighter = ActiveLinkHighlighter::new();
        assert!(highlighter.attach(&mut state).is_ok());
        highlighter.detach(&mut state);
        assert!(!state.dom.has_class(links[1], "active"));

        let mut fresh = ActiveLinkHighlighter::new();
        assert!(fresh.attach(&mut state).is_ok());
        assert!(state.dom.has_class(links[1], "active"));
    }

    #[test]
    fn normalization_folds_index_html_to_slash() {
        assert_eq!(normalize_path("/index.html"), "/");
        assert_eq!(normalize_path("/About/Index.HTML"), "/about/");
        assert_eq!(normalize_path("/about.html"), "/about.html");
        assert_eq!(normalize_path("/"), "/");
    }
}
