use std::time::{Duration, Instant};

pub const IDLE_PROMPT: &str = "Select new image to convert";
pub const PROCESSING_MARKER: &str = "Processing image, please wait";
pub const SUCCESS_MESSAGE: &str = "Image converted and saved successfully!";

/// Ellipsis step of the processing animation.
pub const DOT_INTERVAL: Duration = Duration::from_millis(500);
/// How long the success message stays before the idle prompt returns.
pub const SUCCESS_RESET_DELAY: Duration = Duration::from_secs(4);

const MAX_DOTS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Processing { dots: u8 },
    Success,
    Error { message: String },
}

impl Status {
    pub fn text(&self) -> String {
        match self {
            Self::Idle => IDLE_PROMPT.to_string(),
            Self::Processing { dots } => {
                format!("{PROCESSING_MARKER}{}", ".".repeat(usize::from(*dots)))
            }
            Self::Success => SUCCESS_MESSAGE.to_string(),
            Self::Error { message } => message.clone(),
        }
    }
}

/// Owns the status line and its two timers.
///
/// The ellipsis runs for exactly as long as the state is `Processing`; the
/// success reset only fires if the success it was armed for is still shown.
#[derive(Debug)]
pub struct StatusController {
    status: Status,
    processing_since: Option<Instant>,
    reset_at: Option<Instant>,
}

impl Default for StatusController {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusController {
    pub const fn new() -> Self {
        Self {
            status: Status::Idle,
            processing_since: None,
            reset_at: None,
        }
    }

    pub const fn status(&self) -> &Status {
        &self.status
    }

    pub fn text(&self) -> String {
        self.status.text()
    }

    pub const fn is_processing(&self) -> bool {
        matches!(self.status, Status::Processing { .. })
    }

    pub fn start_processing(&mut self, now: Instant) {
        self.status = Status::Processing { dots: 1 };
        self.processing_since = Some(now);
        self.reset_at = None;
    }

    pub fn succeed(&mut self, now: Instant) {
        self.status = Status::Success;
        self.processing_since = None;
        self.reset_at = Some(now + SUCCESS_RESET_DELAY);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Status::Error {
            message: message.into(),
        };
        self.processing_since = None;
        self.reset_at = None;
    }

    /// Advances the timers to `now`.
    pub fn tick(&mut self, now: Instant) {
        if let Some(since) = self.processing_since {
            let steps = now.saturating_duration_since(since).as_millis() / DOT_INTERVAL.as_millis();
            let dots = (steps % u128::from(MAX_DOTS)) as u8 + 1;
            self.status = Status::Processing { dots };
        }

        if let Some(reset_at) = self.reset_at {
            if now >= reset_at {
                self.reset_at = None;
                if self.status == Status::Success {
                    self.status = Status::Idle;
                }
            }
        }
    }

    /// When the label next needs to change on its own, if ever.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if let Some(since) = self.processing_since {
            let elapsed = now.saturating_duration_since(since).as_millis();
            let interval = DOT_INTERVAL.as_millis();
            let next_step = (elapsed / interval + 1) * interval;
            return Some(since + Duration::from_millis(next_step as u64));
        }
        self.reset_at
    }
}
