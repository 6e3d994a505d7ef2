//! Capture sequence and sequencer configuration types

use std::str::FromStr;
use std::time::Duration;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::illumination::IlluminationPattern;
use crate::capture_pipeline::sequence::capture::CaptureSettings;

/// An ordered list of patterns ending in a designated final pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSequence {
    patterns: Vec<IlluminationPattern>,
    final_pattern: IlluminationPattern,
}

impl CaptureSequence {
    /// Builds a sequence. The final pattern must be the last entry.
    pub fn new(patterns: Vec<IlluminationPattern>, final_pattern: IlluminationPattern) -> Result<Self> {
        match patterns.last() {
            None => Err(CaptureError::InvalidSequence("sequence is empty".to_string())),
            Some(&last) if last != final_pattern => Err(CaptureError::InvalidSequence(format!(
                "final pattern {} is not the last entry (found {})",
                final_pattern, last
            ))),
            Some(_) => Ok(Self {
                patterns,
                final_pattern,
            }),
        }
    }

    /// Builds a sequence from raw pattern ids, using the last id as the final pattern.
    pub fn from_ids(ids: &[i32]) -> Result<Self> {
        let patterns = ids
            .iter()
            .map(|&id| IlluminationPattern::from_id(id))
            .collect::<Result<Vec<_>>>()?;
        let final_pattern = *patterns
            .last()
            .ok_or_else(|| CaptureError::InvalidSequence("sequence is empty".to_string()))?;
        Self::new(patterns, final_pattern)
    }

    pub fn patterns(&self) -> &[IlluminationPattern] {
        &self.patterns
    }

    pub fn final_pattern(&self) -> IlluminationPattern {
        self.final_pattern
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Predefined sequences selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoIlluminationMode {
    /// Half-screen splits followed by both colored quadrant layouts.
    #[default]
    Mode0,
    /// The three white corner squares.
    Mode1,
}

impl AutoIlluminationMode {
    pub fn sequence(self) -> CaptureSequence {
        use IlluminationPattern::*;

        // Both start with a warmup shot: the first capture after the screen
        // changes is not reliably lit.
        let (patterns, final_pattern) = match self {
            AutoIlluminationMode::Mode0 => (
                vec![Warmup, LeftHalf, RightHalf, TopHalf, BottomHalf, QuadrantsA, QuadrantsB, Off],
                Off,
            ),
            AutoIlluminationMode::Mode1 => (
                vec![Warmup, CornerSquareA, CornerSquareB, CornerSquareC],
                CornerSquareC,
            ),
        };
        CaptureSequence {
            patterns,
            final_pattern,
        }
    }
}

impl FromStr for AutoIlluminationMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" | "mode0" => Ok(AutoIlluminationMode::Mode0),
            "1" | "mode1" => Ok(AutoIlluminationMode::Mode1),
            other => Err(CaptureError::InvalidConfig(format!(
                "unknown auto-illumination mode: {other}"
            ))),
        }
    }
}

/// Configuration for a [`CaptureSequencer`](super::CaptureSequencer).
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Number of "photo taken" signals to wait for per pattern
    pub bracket_width: usize,
    /// Bound on the wait for "illumination applied"; `None` waits forever
    pub illumination_timeout: Option<Duration>,
    /// Bound on each "photo taken" wait; `None` waits forever
    pub capture_timeout: Option<Duration>,
    /// Settings forwarded with every capture request
    pub capture_settings: CaptureSettings,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let capture_settings = CaptureSettings::default();
        Self {
            bracket_width: capture_settings.exposure_biases.len(),
            illumination_timeout: Some(Duration::from_secs(10)),
            capture_timeout: Some(Duration::from_secs(10)),
            capture_settings,
        }
    }
}

impl SequencerConfig {
    pub fn builder() -> SequencerConfigBuilder {
        SequencerConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bracket_width == 0 {
            return Err(CaptureError::InvalidConfig(
                "bracket width must be at least 1".to_string(),
            ));
        }
        let biases = self.capture_settings.exposure_biases.len();
        if biases != 0 && biases != self.bracket_width {
            return Err(CaptureError::InvalidConfig(format!(
                "{} exposure biases given for a bracket width of {}",
                biases, self.bracket_width
            )));
        }
        Ok(())
    }
}

/// Builder for SequencerConfig
#[derive(Default)]
pub struct SequencerConfigBuilder {
    bracket_width: Option<usize>,
    illumination_timeout: Option<Option<Duration>>,
    capture_timeout: Option<Option<Duration>>,
    exposure_biases: Option<Vec<f32>>,
    depth_data_delivery: Option<bool>,
}

impl SequencerConfigBuilder {
    pub fn bracket_width(mut self, width: usize) -> Self {
        self.bracket_width = Some(width);
        self
    }

    pub fn illumination_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.illumination_timeout = Some(timeout);
        self
    }

    pub fn capture_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.capture_timeout = Some(timeout);
        self
    }

    /// Sets both timeouts at once.
    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        self.illumination_timeout(timeout).capture_timeout(timeout)
    }

    pub fn exposure_biases(mut self, biases: Vec<f32>) -> Self {
        self.exposure_biases = Some(biases);
        self
    }

    pub fn depth_data_delivery(mut self, enable: bool) -> Self {
        self.depth_data_delivery = Some(enable);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// When only the bracket width is given, the default exposure biases are
    /// kept if they match it; otherwise every exposure gets a 0 EV bias.
    pub fn build(self) -> Result<SequencerConfig> {
        let default = SequencerConfig::default();
        let bracket_width = self.bracket_width.unwrap_or(default.bracket_width);
        let exposure_biases = match self.exposure_biases {
            Some(biases) => biases,
            None if default.capture_settings.exposure_biases.len() == bracket_width => {
                default.capture_settings.exposure_biases.clone()
            }
            None => vec![0.0; bracket_width],
        };

        let config = SequencerConfig {
            bracket_width,
            illumination_timeout: self.illumination_timeout.unwrap_or(default.illumination_timeout),
            capture_timeout: self.capture_timeout.unwrap_or(default.capture_timeout),
            capture_settings: CaptureSettings {
                exposure_biases,
                depth_data_delivery: self
                    .depth_data_delivery
                    .unwrap_or(default.capture_settings.depth_data_delivery),
                ..default.capture_settings
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// How one pattern of a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternStatus {
    Captured,
    IlluminationFailed(String),
    CaptureFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternOutcome {
    pub index: usize,
    pub pattern: IlluminationPattern,
    pub status: PatternStatus,
    /// "Photo taken" signals consumed for this pattern
    pub exposures: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceReport {
    pub outcomes: Vec<PatternOutcome>,
    pub completed: bool,
}

impl SequenceReport {
    pub fn captured(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == PatternStatus::Captured)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.captured()
    }
}
