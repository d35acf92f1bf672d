//! Header/footer fragment loading with ordered candidates and inline fallback.

use br_core::PageResult;
use br_fetch::FragmentFetcher;
use br_html::parse_fragment;
use br_page::Component;
use br_page::PageState;
use br_page::Signal;
use tracing::debug;
use tracing::warn;
use url::Url;

/// Fallback markup used when no candidate path yields a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackTemplate {
    Header,
    Footer,
    Markup(String),
}

/// One fragment's placeholder, candidate paths, and completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentConfig {
    pub placeholder_id: String,
    pub candidates: Vec<String>,
    pub signal: Signal,
    pub fallback: FallbackTemplate,
}

impl FragmentConfig {
    pub fn header() -> Self {
        Self {
            placeholder_id: "header-placeholder".to_owned(),
            candidates: vec![
                "/assets/includes/header.html".to_owned(),
                "assets/includes/header.html".to_owned(),
                "../assets/includes/header.html".to_owned(),
            ],
            signal: Signal::HeaderLoaded,
            fallback: FallbackTemplate::Header,
        }
    }

    pub fn footer() -> Self {
        Self {
            placeholder_id: "footer-placeholder".to_owned(),
            candidates: vec![
                "/assets/css/includes/footer.html".to_owned(),
                "assets/css/includes/footer.html".to_owned(),
                "../assets/css/includes/footer.html".to_owned(),
            ],
            signal: Signal::FooterLoaded,
            fallback: FallbackTemplate::Footer,
        }
    }
}

/// Loads one fragment into its placeholder on attach.
///
/// Candidates are tried strictly in order; the first 2xx body wins and the
/// rest are skipped. Every failure path ends in the fallback template, so a
/// present placeholder always ends up populated and the completion signal
/// fires exactly once. A missing placeholder is a silent no-op.
pub struct FragmentLoader {
    config: FragmentConfig,
    fetcher: Box<dyn FragmentFetcher>,
}

impl FragmentLoader {
    pub fn new(config: FragmentConfig, fetcher: Box<dyn FragmentFetcher>) -> Self {
        Self { config, fetcher }
    }

    fn load(&mut self, page: &mut PageState) {
        let Some(placeholder) = page.dom.element_by_id(&self.config.placeholder_id) else {
            return;
        };

        let markup = if page.is_http() {
            match self.first_successful_body(&page.location) {
                Some(body) => body,
                None => {
                    warn!(
                        target: "br_script",
                        signal = self.config.signal.as_str(),
                        "all fragment candidates failed; using inline fallback"
                    );
                    self.fallback_markup(page)
                }
            }
        } else {
            debug!(
                target: "br_script",
                signal = self.config.signal.as_str(),
                "non-http page context; using inline fallback"
            );
            self.fallback_markup(page)
        };

        page.dom.clear_children(placeholder);
        parse_fragment(&mut page.dom, placeholder, &markup);
        page.emit_signal(self.config.signal);
    }

    fn first_successful_body(&mut self, base: &Url) -> Option<String> {
        for candidate in &self.config.candidates {
            let url = match base.join(candidate) {
                Ok(url) => url,
                Err(error) => {
                    debug!(target: "br_script", candidate, %error, "unresolvable candidate");
                    continue;
                }
            };

            match self.fetcher.fetch(&url) {
                Ok(response) if response.ok() => return Some(response.body),
                Ok(response) => {
                    debug!(
                        target: "br_script",
                        candidate,
                        status = response.status,
                        "fragment candidate rejected"
                    );
                }
                Err(error) => {
                    debug!(target: "br_script", candidate, %error, "fragment candidate unreachable");
                }
            }
        }

        None
    }

    fn fallback_markup(&self, page: &PageState) -> String {
        match &self.config.fallback {
            FallbackTemplate::Header => header_fallback(page.location.path()),
            FallbackTemplate::Footer => footer_fallback(),
            FallbackTemplate::Markup(markup) => markup.clone(),
        }
    }
}

impl Component for FragmentLoader {
    fn name(&self) -> &'static str {
        match self.config.signal {
            Signal::HeaderLoaded => "header-fragment",
            Signal::FooterLoaded => "footer-fragment",
        }
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.load(page);
        Ok(())
    }
}

/// Inline header identical in structure to the served fragment. Link targets
/// get a `../` prefix when the page sits inside the annotation section.
pub fn header_fallback(path: &str) -> String {
    let prefix = if path.to_ascii_lowercase().contains("/annotation/") {
        "../"
    } else {
        ""
    };

    format!(
        r#"<header>
  <nav class="navbar">
    <a href="{prefix}index.html" class="logo nav-delay-1">Port<span>folio</span></a>
    <ul>
      <li class="nav-delay-2"><a href="{prefix}index.html" class="nav-home">Home</a></li>
      <li class="nav-delay-3"><a href="{prefix}about.html" class="nav-about">About</a></li>
      <li class="nav-delay-4"><a href="{prefix}projects.html" class="nav-projects">Projects</a></li>
      <li class="nav-delay-5"><a href="{prefix}contact.html" class="nav-contact">Contact</a></li>
    </ul>
  </nav>
</header>"#
    )
}

/// Inline footer identical in structure to the served fragment.
pub fn footer_fallback() -> String {
    r#"<footer class="footer-section">
  <div class="container">
    <div class="row">
      <div class="col-lg-4 col-md-6 mb-4">
        <div class="footer-brand">
          <h3 class="footer-logo">Benson Portfolio</h3>
          <p class="footer-tagline">Full-Stack Web Developer</p>
        </div>
      </div>
      <div class="col-lg-4 col-md-6 mb-4">
        <h4 class="footer-title">Quick Links</h4>
        <ul class="footer-links">
          <li><a href="/index.html">Home</a></li>
          <li><a href="/about.html">About</a></li>
          <li><a href="/projects.html">Projects</a></li>
          <li><a href="/contact.html">Contact</a></li>
        </ul>
      </div>
      <div class="col-lg-4 col-md-12 mb-4">
        <h4 class="footer-title">Contact</h4>
        <div class="contact-info">
          <div class="contact-item">
            <a href="mailto:bensonannotations@gmail.com">bensonannotations@gmail.com</a>
          </div>
          <div class="contact-item">
            <a href="tel:+254743052401">+254 743 052 401</a>
          </div>
          <div class="contact-item"><span>Nairobi, Kenya</span></div>
        </div>
      </div>
    </div>
    <div class="footer-bottom">
      <p class="copyright">&copy; 2026 Benson. All rights reserved.</p>
    </div>
  </div>
</footer>"#
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::FallbackTemplate;
    use super::FragmentConfig;
    use super::FragmentLoader;
    use super::header_fallback;
    use br_fetch::FixtureFetcher;
    use br_fetch::FragmentFetcher;
    use br_page::Component;
    use br_page::PageState;
    use br_page::Signal;
    use url::Url;

    fn http_state() -> PageState {
        let url = Url::parse("http://bakery.test/index.html").unwrap_or_else(|_| unreachable!());
        PageState::new(url)
    }

    fn with_placeholder(state: &mut PageState, id: &str) -> br_dom::NodeId {
        let node = state.dom.create_element("div");
        let root = state.dom.root();
        assert!(state.dom.set_attr(node, "id", id).is_ok());
        assert!(state.dom.append_child(root, node).is_ok());
        node
    }

    struct SharedFetcher(std::rc::Rc<std::cell::RefCell<FixtureFetcher>>);

    impl br_fetch::FragmentFetcher for SharedFetcher {
        fn fetch(&mut self, url: &url::Url) -> br_core::PageResult<br_fetch::FetchResponse> {
            self.0.borrow_mut().fetch(url)
        }
    }

    #[test]
    fn first_success_short_circuits_remaining_candidates() {
        let mut state = http_state();
        let placeholder = with_placeholder(&mut state, "header-placeholder");

        let mut config = FragmentConfig::header();
        config.candidates = vec![
            "/missing-a.html".to_owned(),
            "/missing-b.html".to_owned(),
            "/real-header.html".to_owned(),
            "/never-tried.html".to_owned(),
        ];
        let mut fetcher = FixtureFetcher::new();
        fetcher.insert(
            "/real-header.html",
            200,
            "<header><nav class=\"navbar\">X</nav></header>",
        );
        let shared = std::rc::Rc::new(std::cell::RefCell::new(fetcher));
        let mut loader = FragmentLoader::new(config, Box::new(SharedFetcher(shared.clone())));

        assert!(loader.attach(&mut state).is_ok());

        assert_eq!(state.dom.text_content(placeholder), "X");
        assert_eq!(state.drain_signals(), vec![Signal::HeaderLoaded]);
        assert_eq!(
            shared.borrow().requested(),
            ["/missing-a.html", "/missing-b.html", "/real-header.html"]
        );
    }

    #[test]
    fn all_failures_fall_back_and_still_signal_once() {
        let mut state = http_state();
        let placeholder = with_placeholder(&mut state, "footer-placeholder");

        let mut loader = FragmentLoader::new(
            FragmentConfig::footer(),
            Box::new(FixtureFetcher::new()),
        );
        assert!(loader.attach(&mut state).is_ok());

        assert!(state.dom.first_by_class("footer-section").is_some());
        assert!(state
            .dom
            .text_content(placeholder)
            .contains("Benson Portfolio"));
        assert_eq!(state.drain_signals(), vec![Signal::FooterLoaded]);
    }

    #[test]
    fn non_http_context_skips_the_fetcher_entirely() {
        let url = Url::parse("file:///site/index.html").unwrap_or_else(|_| unreachable!());
        let mut state = PageState::new(url);
        with_placeholder(&mut state, "header-placeholder");

        let fetcher = FixtureFetcher::new();
        let mut loader = FragmentLoader::new(FragmentConfig::header(), Box::new(fetcher));
        assert!(loader.attach(&mut state).is_ok());

        assert!(state.dom.first_by_class("navbar").is_some());
        assert_eq!(state.drain_signals(), vec![Signal::HeaderLoaded]);
    }

    #[test]
    fn missing_placeholder_is_a_silent_no_op() {
        let mut state = http_state();
        let mut loader = FragmentLoader::new(
            FragmentConfig::header(),
            Box::new(FixtureFetcher::new()),
        );
        assert!(loader.attach(&mut state).is_ok());
        assert!(state.drain_signals().is_empty());
    }

    #[test]
    fn custom_markup_fallback_is_injected_verbatim() {
        let mut state = http_state();
        let placeholder = with_placeholder(&mut state, "promo-placeholder");

        let config = FragmentConfig {
            placeholder_id: "promo-placeholder".to_owned(),
            candidates: vec!["/promo.html".to_owned()],
            signal: Signal::FooterLoaded,
            fallback: FallbackTemplate::Markup("<aside>seasonal specials</aside>".to_owned()),
        };
        let mut loader = FragmentLoader::new(config, Box::new(FixtureFetcher::new()));
        assert!(loader.attach(&mut state).is_ok());

        assert_eq!(state.dom.text_content(placeholder), "seasonal specials");
    }

    #[test]
    fn header_fallback_prefixes_links_inside_annotation_pages() {
        let nested = header_fallback("/annotation/gallery.html");
        assert!(nested.contains("href=\"../about.html\""));

        let top_level = header_fallback("/index.html");
        assert!(top_level.contains("href=\"about.html\""));
    }
}
