//! Character-by-character typed-text loop for the hero heading.

use br_core::PageResult;
use br_dom::NodeId;
use br_page::Component;
use br_page::PageState;
use br_timer::Countdown;

/// Strings, target element class, and per-phase delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedTextConfig {
    pub strings: Vec<String>,
    pub target_class: String,
    pub type_ms: u64,
    pub delete_ms: u64,
    /// Dwell at the fully typed string.
    pub hold_ms: u64,
    /// Dwell between finishing a delete and typing the next string.
    pub rest_ms: u64,
}

impl TypedTextConfig {
    pub fn new(strings: Vec<String>) -> Self {
        Self {
            strings,
            target_class: "typed-text".to_owned(),
            type_ms: 80,
            delete_ms: 40,
            hold_ms: 6000,
            rest_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Typing,
    Holding,
    Deleting,
    Resting,
}

/// Endless type/hold/delete/rest cycle over the configured strings.
///
/// Deadlines accumulate from the previous deadline rather than from the
/// observed clock, so a slow host does not stretch the rhythm.
pub struct TypedText {
    config: TypedTextConfig,
    phase: Phase,
    string_ix: usize,
    chars_shown: usize,
    next: Countdown,
    target: Option<NodeId>,
}

impl TypedText {
    pub fn new(config: TypedTextConfig) -> Self {
        Self {
            config,
            phase: Phase::Typing,
            string_ix: 0,
            chars_shown: 0,
            next: Countdown::after(0, 0),
            target: None,
        }
    }

    /// Currently displayed prefix of the active string.
    pub fn visible_text(&self) -> String {
        self.config
            .strings
            .get(self.string_ix)
            .map(|string| string.chars().take(self.chars_shown).collect())
            .unwrap_or_default()
    }

    fn current_len(&self) -> usize {
        self.config
            .strings
            .get(self.string_ix)
            .map(|string| string.chars().count())
            .unwrap_or(0)
    }

    // Repeating delays never sit at zero, else a catch-up loop spins in place.
    fn type_delay(&self) -> u64 {
        self.config.type_ms.max(1)
    }

    fn delete_delay(&self) -> u64 {
        self.config.delete_ms.max(1)
    }

    fn step(&mut self) {
        let deadline = self.next.deadline();
        match self.phase {
            Phase::Typing => {
                self.chars_shown = self.chars_shown.saturating_add(1).min(self.current_len());
                if self.chars_shown == self.current_len() {
                    self.phase = Phase::Holding;
                    self.next = Countdown::after(deadline, self.config.hold_ms);
                } else {
                    self.next = Countdown::after(deadline, self.type_delay());
                }
            }
            Phase::Holding => {
                self.phase = Phase::Deleting;
                self.chars_shown = self.chars_shown.saturating_sub(1);
                self.next = Countdown::after(deadline, self.delete_delay());
            }
            Phase::Deleting => {
                if self.chars_shown > 0 {
                    self.chars_shown -= 1;
                    self.next = Countdown::after(deadline, self.delete_delay());
                } else {
                    self.string_ix = (self.string_ix + 1) % self.config.strings.len().max(1);
                    self.phase = Phase::Resting;
                    self.next = Countdown::after(deadline, self.config.rest_ms);
                }
            }
            Phase::Resting => {
                self.phase = Phase::Typing;
                self.next = Countdown::after(deadline, self.type_delay());
            }
        }
    }

    fn render(&self, page: &mut PageState) {
        if let Some(target) = self.target {
            let _ = page.dom.set_text(target, &self.visible_text());
        }
    }
}

impl Component for TypedText {
    fn name(&self) -> &'static str {
        "typed-text"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        if self.config.strings.is_empty() {
            return Ok(());
        }
        self.target = page.dom.first_by_class(&self.config.target_class);
        if self.target.is_none() {
            return Ok(());
        }

        self.phase = Phase::Typing;
        self.string_ix = 0;
        self.chars_shown = 0;
        self.next = Countdown::after(page.clock.now(), self.type_delay());
        self.render(page);
        Ok(())
    }

    fn advance(&mut self, page: &mut PageState) {
        if self.target.is_none() || self.config.strings.is_empty() {
            return;
        }

        let now = page.clock.now();
        let mut changed = false;
        while self.next.ready(now) {
            self.step();
            changed = true;
        }
        if changed {
            self.render(page);
        }
    }
}
