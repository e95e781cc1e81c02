//! Game vocabulary: colors, codes, and feedback pegs.
//!
//! A [`Code`] is an ordered sequence of [`Color`]s; the same type is used for
//! the codemaker's secret and for every attempt. A [`Feedback`] holds one
//! [`Peg`] per attempt position, in positional order. Display ordering is a
//! separate concern handled by [`Feedback::sorted`].
//!
//! Length and palette validation against a game configuration is NOT done
//! here; these types only know the full palette.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One code peg color.
///
/// The palette is fixed. A game with `n` colors uses the first `n` entries of
/// [`Color::PALETTE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Red
    Red,
    /// Blue
    Blue,
    /// Green
    Green,
    /// Purple
    Purple,
    /// Yellow
    Yellow,
    /// Orange
    Orange,
    /// White
    White,
    /// Black
    Black,
    /// Pink
    Pink,
    /// Cyan
    Cyan,
}

impl Color {
    /// Every color, in palette order.
    pub const PALETTE: [Self; 10] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Purple,
        Self::Yellow,
        Self::Orange,
        Self::White,
        Self::Black,
        Self::Pink,
        Self::Cyan,
    ];

    /// Position in [`Color::PALETTE`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The first `total_colors` palette entries (clamped to the palette size).
    #[must_use]
    pub fn palette(total_colors: usize) -> &'static [Self] {
        &Self::PALETTE[..total_colors.min(Self::PALETTE.len())]
    }

    /// Lowercase name, identical to the wire representation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::White => "white",
            Self::Black => "black",
            Self::Pink => "pink",
            Self::Cyan => "cyan",
        }
    }

    /// Single-letter abbreviation accepted by [`Color::from_str`].
    ///
    /// Black uses `k` so it does not collide with blue.
    #[must_use]
    pub const fn abbreviation(self) -> char {
        match self {
            Self::Red => 'r',
            Self::Blue => 'b',
            Self::Green => 'g',
            Self::Purple => 'p',
            Self::Yellow => 'y',
            Self::Orange => 'o',
            Self::White => 'w',
            Self::Black => 'k',
            Self::Pink => 'i',
            Self::Cyan => 'c',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a color or code from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCodeError {
    /// Token does not name a palette color
    #[error("unknown color: {0:?}")]
    UnknownColor(String),
}

impl FromStr for Color {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Self::PALETTE
            .into_iter()
            .find(|color| {
                token == color.name()
                    || (token.len() == 1 && token.starts_with(color.abbreviation()))
            })
            .ok_or(ParseCodeError::UnknownColor(token))
    }
}

/// An ordered sequence of colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(Vec<Color>);

impl Code {
    /// Wrap a color sequence.
    #[must_use]
    pub fn new(colors: Vec<Color>) -> Self {
        Self(colors)
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no color has been selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Colors in positional order.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    /// Iterate colors in positional order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Color>> for Code {
    fn from(colors: Vec<Color>) -> Self {
        Self(colors)
    }
}

impl FromIterator<Color> for Code {
    fn from_iter<T: IntoIterator<Item = Color>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses whitespace- or comma-separated color names or abbreviations.
impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(Color::from_str)
            .collect()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, color) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

/// Feedback for one attempt position.
///
/// Variant order is the display order: exact pegs first, misses last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Peg {
    /// Right color, right position
    Exact,
    /// Right color, wrong position
    Partial,
    /// Color not credited
    Miss,
}

impl Peg {
    /// Symbol used when rendering feedback.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Exact => '●',
            Self::Partial => '○',
            Self::Miss => '·',
        }
    }
}

/// Peg tallies for one feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PegCounts {
    /// Number of [`Peg::Exact`]
    pub exact: usize,
    /// Number of [`Peg::Partial`]
    pub partial: usize,
    /// Number of [`Peg::Miss`]
    pub miss: usize,
}

impl PegCounts {
    /// Total pegs counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.exact + self.partial + self.miss
    }
}

/// Pegs for a whole attempt, one per position, in positional order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback(Vec<Peg>);

impl Feedback {
    /// Wrap a positional peg sequence.
    #[must_use]
    pub fn new(pegs: Vec<Peg>) -> Self {
        Self(pegs)
    }

    /// Pegs in positional order (peg `i` belongs to attempt position `i`).
    #[must_use]
    pub fn pegs(&self) -> &[Peg] {
        &self.0
    }

    /// Number of pegs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no pegs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tally pegs by kind.
    #[must_use]
    pub fn counts(&self) -> PegCounts {
        self.0.iter().fold(PegCounts::default(), |mut counts, peg| {
            match peg {
                Peg::Exact => counts.exact += 1,
                Peg::Partial => counts.partial += 1,
                Peg::Miss => counts.miss += 1,
            }
            counts
        })
    }

    /// Pegs in display order: exact, then partial, then miss.
    #[must_use]
    pub fn sorted(&self) -> Vec<Peg> {
        let mut pegs = self.0.clone();
        pegs.sort_unstable();
        pegs
    }
}

impl FromIterator<Peg> for Feedback {
    fn from_iter<T: IntoIterator<Item = Peg>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders pegs in display order, hiding which position earned which peg.
impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for peg in self.sorted() {
            write!(f, "{}", peg.symbol())?;
        }
        Ok(())
    }
}
