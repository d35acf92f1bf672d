//! Page components: fragment loading, navigation, animations, carousel, and
//! the order-form relay.

pub mod anchors;
pub mod carousel;
pub mod fragments;
pub mod nav_active;
pub mod navbar;
pub mod order;
pub mod reveal;
pub mod typed;

pub use anchors::SmoothScroll;
pub use carousel::Testimonial;
pub use carousel::TestimonialCarousel;
pub use fragments::FragmentConfig;
pub use fragments::FragmentLoader;
pub use nav_active::ActiveLinkHighlighter;
pub use navbar::NavbarController;
pub use order::OrderFormConfig;
pub use order::OrderFormRelay;
pub use reveal::ScrollReveal;
pub use reveal::ScrollRevealConfig;
pub use typed::TypedText;
pub use typed::TypedTextConfig;
