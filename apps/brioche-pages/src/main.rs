//! Headless page runner: loads an HTML file, attaches the page components,
//! and drives a scripted scroll/clock session against them.

use br_core::PageError;
use br_core::PageResult;
use br_core::Rect;
use br_fetch::FetchResponse;
use br_fetch::FragmentFetcher;
use br_page::Page;
use br_script::ActiveLinkHighlighter;
use br_script::FragmentConfig;
use br_script::FragmentLoader;
use br_script::NavbarController;
use br_script::OrderFormConfig;
use br_script::OrderFormRelay;
use br_script::ScrollReveal;
use br_script::ScrollRevealConfig;
use br_script::SmoothScroll;
use br_script::TestimonialCarousel;
use br_script::TypedText;
use br_script::TypedTextConfig;
use br_script::carousel::sample_testimonials;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

const DEFAULT_PAGE_URL: &str = "https://thamanicakes.example/";
const DEFAULT_RUN_MS: u64 = 20_000;
const SCROLL_STEP: u32 = 200;
const STEP_MS: u64 = 100;
/// Rough flow estimate: every element gets one row of this height.
const ROW_HEIGHT: u32 = 120;

const DEMO_TYPED_STRINGS: &[&str] = &[
    "Freshly Baked Every Morning",
    "Custom Cakes For Every Occasion",
    "Order Over WhatsApp In Minutes",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    page: PathBuf,
    root: Option<PathBuf>,
    url: String,
    reduced_motion: bool,
    run_ms: u64,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brioche_pages=info,br_script=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = match options_from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("brioche-pages startup error: {error}");
            eprintln!(
                "usage: brioche-pages --page <file.html> [--root <dir>] [--url <page-url>] \
                 [--reduced-motion] [--run-ms <ms>]"
            );
            std::process::exit(2);
        }
    };

    if let Err(error) = run(&options) {
        eprintln!("brioche-pages error [{}]: {}", error.code, error.message);
        std::process::exit(1);
    }
}

fn options_from_args(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut args = args;
    let mut page = None;
    let mut root = None;
    let mut url = DEFAULT_PAGE_URL.to_owned();
    let mut reduced_motion = false;
    let mut run_ms = DEFAULT_RUN_MS;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--page" => {
                let value = args.next().ok_or_else(|| "missing value after --page".to_owned())?;
                page = Some(PathBuf::from(value));
            }
            "--root" => {
                let value = args.next().ok_or_else(|| "missing value after --root".to_owned())?;
                root = Some(PathBuf::from(value));
            }
            "--url" => {
                url = args.next().ok_or_else(|| "missing value after --url".to_owned())?;
            }
            "--reduced-motion" => {
                reduced_motion = true;
            }
            "--run-ms" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --run-ms".to_owned())?;
                run_ms = value
                    .parse()
                    .map_err(|_| format!("invalid --run-ms value `{value}`"))?;
            }
            other => {
                return Err(format!("unsupported argument `{other}`"));
            }
        }
    }

    let page = page.ok_or_else(|| "missing required --page <file.html>".to_owned())?;
    Ok(Options {
        page,
        root,
        url,
        reduced_motion,
        run_ms,
    })
}

/// Serves fragment candidates from a directory; without one every
/// request misses and the loaders fall back to their inline markup.
struct DiskFetcher {
    root: Option<PathBuf>,
}

impl DiskFetcher {
    fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl FragmentFetcher for DiskFetcher {
    fn fetch(&mut self, url: &Url) -> PageResult<FetchResponse> {
        let Some(root) = &self.root else {
            return Ok(FetchResponse::new(404, ""));
        };
        let relative = url.path().trim_start_matches('/');
        match std::fs::read_to_string(root.join(relative)) {
            Ok(body) => Ok(FetchResponse::new(200, body)),
            Err(_) => Ok(FetchResponse::new(404, "")),
        }
    }
}

fn run(options: &Options) -> PageResult<()> {
    let html = std::fs::read_to_string(&options.page).map_err(|err| {
        PageError::new(
            "app.page.read_failed",
            format!("cannot read {}: {err}", options.page.display()),
        )
    })?;
    let location = Url::parse(&options.url)
        .map_err(|err| PageError::new("app.url.invalid", format!("bad page url: {err}")))?;

    let mut page = Page::new(location);
    page.state.reduced_motion = options.reduced_motion;
    br_html::parse_document(&mut page.state.dom, &html);
    assign_flow_layout(&mut page.state);
    info!(
        nodes = page.state.dom.node_count(),
        reduced_motion = options.reduced_motion,
        "document parsed"
    );

    page.attach(Box::new(FragmentLoader::new(
        FragmentConfig::header(),
        Box::new(DiskFetcher::new(options.root.clone())),
    )))?;
    page.attach(Box::new(FragmentLoader::new(
        FragmentConfig::footer(),
        Box::new(DiskFetcher::new(options.root.clone())),
    )))?;
    page.attach(Box::new(NavbarController::new()))?;
    page.attach(Box::new(ActiveLinkHighlighter::new()))?;
    page.attach(Box::new(TypedText::new(TypedTextConfig::new(
        DEMO_TYPED_STRINGS.iter().map(|s| (*s).to_owned()).collect(),
    ))))?;
    page.attach(Box::new(ScrollReveal::new(ScrollRevealConfig::bakery())))?;
    page.attach(Box::new(TestimonialCarousel::new(sample_testimonials())))?;
    page.attach(Box::new(OrderFormRelay::new(OrderFormConfig::default())))?;
    page.attach(Box::new(SmoothScroll::new()))?;

    // Fragments may have grown the tree; refresh the geometry estimate.
    assign_flow_layout(&mut page.state);

    let page_bottom = flow_bottom(&page.state);
    let mut scroll_y = 0_u32;
    let mut elapsed = 0_u64;
    while elapsed < options.run_ms {
        page.advance(STEP_MS);
        elapsed += STEP_MS;
        if scroll_y < page_bottom {
            scroll_y = scroll_y.saturating_add(SCROLL_STEP).min(page_bottom);
            page.scroll_to(scroll_y);
        }
    }

    report_outcome(&page);
    Ok(())
}

fn report_outcome(page: &Page) {
    let state = &page.state;
    let header_classes = state
        .dom
        .elements_by_tag("header")
        .first()
        .and_then(|header| state.dom.attr(*header, "class"))
        .unwrap_or("")
        .to_owned();
    let active_link = state
        .dom
        .elements_by_tag("a")
        .into_iter()
        .find(|link| state.dom.has_class(*link, "active"))
        .and_then(|link| state.dom.attr(link, "href"))
        .unwrap_or("-")
        .to_owned();
    let active_dot = state
        .dom
        .elements_by_class("spotlight-dot")
        .into_iter()
        .position(|dot| state.dom.has_class(dot, "active"));
    let revealed = state.dom.elements_by_class("animate-in").len();

    info!(
        components = page.component_count(),
        final_scroll = state.viewport.scroll_y,
        header_classes,
        active_link,
        active_dot = ?active_dot,
        revealed,
        alerts = state.effects.alerts.len(),
        opened = state.effects.opened.len(),
        "session complete"
    );
    for opened in &state.effects.opened {
        info!(url = %opened, "window opened");
    }
}

/// Stacks every element into its own row. Crude, but enough geometry for
/// scroll-driven components to run through a whole session.
fn assign_flow_layout(state: &mut br_page::PageState) {
    let elements = state.dom.descendants(state.dom.root());
    for (index, node) in elements.into_iter().enumerate() {
        let top = (index as u32).saturating_mul(ROW_HEIGHT);
        state.set_layout(
            node,
            Rect {
                top,
                height: ROW_HEIGHT,
            },
        );
    }
}

fn flow_bottom(state: &br_page::PageState) -> u32 {
    let count = state.dom.descendants(state.dom.root()).len() as u32;
    count.saturating_mul(ROW_HEIGHT)
}
