//! Game and session configuration.
//!
//! Both peers must be constructed with the same [`GameConfig`]. Nothing on
//! the wire carries it; a mismatch surfaces as protocol violations (codes of
//! the wrong length or outside the palette) rather than as silent misplay.

use std::{ops::RangeInclusive, time::Duration};

use codebreak_proto::{Code, Color};

use crate::error::{ConfigError, ValidationError};

/// Time an attempt may stay unanswered before the session gives up.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Board dimensions for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameConfig {
    total_colors: usize,
    total_holes: usize,
    max_attempts: usize,
}

impl GameConfig {
    /// Allowed range for the number of colors in play.
    pub const COLORS: RangeInclusive<usize> = 4..=10;

    /// Allowed range for the code length.
    pub const HOLES: RangeInclusive<usize> = 4..=6;

    /// Allowed range for the attempt limit.
    pub const ATTEMPTS: RangeInclusive<usize> = 5..=10;

    /// Validated configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::OutOfRange` for the first value outside its range
    pub fn new(
        total_colors: usize,
        total_holes: usize,
        max_attempts: usize,
    ) -> Result<Self, ConfigError> {
        check_range("total_colors", total_colors, &Self::COLORS)?;
        check_range("total_holes", total_holes, &Self::HOLES)?;
        check_range("max_attempts", max_attempts, &Self::ATTEMPTS)?;

        Ok(Self { total_colors, total_holes, max_attempts })
    }

    /// Number of palette colors in play.
    #[must_use]
    pub fn total_colors(&self) -> usize {
        self.total_colors
    }

    /// Code length.
    #[must_use]
    pub fn total_holes(&self) -> usize {
        self.total_holes
    }

    /// Attempts the codebreaker gets.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Colors usable in this game.
    #[must_use]
    pub fn palette(&self) -> &'static [Color] {
        Color::palette(self.total_colors)
    }

    /// Check that `code` could be a secret or an attempt in this game.
    ///
    /// # Errors
    ///
    /// - `ValidationError::EmptySelection` if `code` is empty
    /// - `ValidationError::BadLength` if the length is not `total_holes`
    /// - `ValidationError::ColorOutOfPalette` for the first color not in play
    pub fn validate_code(&self, code: &Code) -> Result<(), ValidationError> {
        if code.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        if code.len() != self.total_holes {
            return Err(ValidationError::BadLength {
                expected: self.total_holes,
                actual: code.len(),
            });
        }

        match code.iter().find(|color| color.index() >= self.total_colors) {
            Some(color) => {
                Err(ValidationError::ColorOutOfPalette { color, total_colors: self.total_colors })
            },
            None => Ok(()),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { total_colors: 6, total_holes: 4, max_attempts: 10 }
    }
}

fn check_range(
    field: &'static str,
    value: usize,
    range: &RangeInclusive<usize>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min: *range.start(), max: *range.end() })
    }
}

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Board dimensions, identical on both peers
    pub game: GameConfig,
    /// How long an attempt may go unanswered before the channel is closed
    pub verify_timeout: Duration,
}

impl SessionConfig {
    /// Session settings for `game` with default timeouts.
    #[must_use]
    pub fn new(game: GameConfig) -> Self {
        Self { game, verify_timeout: DEFAULT_VERIFY_TIMEOUT }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(GameConfig::new(4, 4, 5).is_ok());
        assert!(GameConfig::new(10, 6, 10).is_ok());
    }

    #[test]
    fn out_of_range_names_the_field() {
        assert_eq!(
            GameConfig::new(3, 4, 5),
            Err(ConfigError::OutOfRange { field: "total_colors", value: 3, min: 4, max: 10 })
        );
        assert_eq!(
            GameConfig::new(6, 7, 5),
            Err(ConfigError::OutOfRange { field: "total_holes", value: 7, min: 4, max: 6 })
        );
        assert_eq!(
            GameConfig::new(6, 4, 11),
            Err(ConfigError::OutOfRange { field: "max_attempts", value: 11, min: 5, max: 10 })
        );
    }

    #[test]
    fn default_is_valid() {
        let config = GameConfig::default();
        assert_eq!(GameConfig::new(6, 4, 10), Ok(config));
        assert_eq!(config.palette().len(), 6);
    }

    #[test]
    fn validate_code_checks_length_then_palette() {
        let config = GameConfig::default();

        assert_eq!(config.validate_code(&Code::default()), Err(ValidationError::EmptySelection));

        let short = Code::new(vec![Color::Red, Color::Blue]);
        assert_eq!(
            config.validate_code(&short),
            Err(ValidationError::BadLength { expected: 4, actual: 2 })
        );

        let off_palette = Code::new(vec![Color::Red, Color::Cyan, Color::Blue, Color::Green]);
        assert_eq!(
            config.validate_code(&off_palette),
            Err(ValidationError::ColorOutOfPalette { color: Color::Cyan, total_colors: 6 })
        );

        let good = Code::new(vec![Color::Red, Color::Orange, Color::Blue, Color::Green]);
        assert_eq!(config.validate_code(&good), Ok(()));
    }

    #[test]
    fn session_config_defaults_timeout() {
        let config = SessionConfig::default();
        assert_eq!(config.verify_timeout, DEFAULT_VERIFY_TIMEOUT);
        assert_eq!(config.game, GameConfig::default());
    }
}
