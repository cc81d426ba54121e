//! The filter registry: a closed set of named per-pixel colour transforms.
//!
//! Every filter is a pure function over one RGBA pixel. Nothing here knows
//! about images, files or workers; the executor receives an already-resolved
//! [`Transform`] and never looks a name up again.
//!
//! | Name | Effect |
//! |---|---|
//! | `WITHOUT_RED` / `WITHOUT_GREEN` / `WITHOUT_BLUE` | zero that channel |
//! | `ONLY_RED` / `ONLY_GREEN` / `ONLY_BLUE` | zero the other two colour channels |
//! | `WHITE_BLACK` | floor average of r, g, b on all three channels |
//! | `IN_THREE_STEPS` | posterize every channel (alpha included) to 0 / 140 / 255 |
//! | `ORIGINAL` | pass-through, no pixel function |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One RGBA pixel as four channel values.
pub type Rgba = [u8; 4];

/// A pure per-pixel transform.
pub type PixelFn = fn(Rgba) -> Rgba;

/// What the executor does to each pixel of a job's image.
#[derive(Clone, Copy)]
pub enum Transform {
    /// Apply this function to every pixel.
    Pixel(PixelFn),
    /// Copy the image unmodified.
    Passthrough,
}

impl Transform {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Transform::Passthrough)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Pixel(_) => f.write_str("Transform::Pixel(..)"),
            Transform::Passthrough => f.write_str("Transform::Passthrough"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown filter: {0}")]
pub struct UnknownFilter(pub String);

/// A registered filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Filter {
    WithoutRed,
    WithoutGreen,
    WithoutBlue,
    OnlyRed,
    OnlyGreen,
    OnlyBlue,
    WhiteBlack,
    InThreeSteps,
    Original,
}

impl Filter {
    /// Every filter, in registry order.
    pub const ALL: [Filter; 9] = [
        Filter::WithoutRed,
        Filter::WithoutGreen,
        Filter::WithoutBlue,
        Filter::OnlyRed,
        Filter::OnlyGreen,
        Filter::OnlyBlue,
        Filter::WhiteBlack,
        Filter::InThreeSteps,
        Filter::Original,
    ];

    /// Canonical upper-case name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Filter::WithoutRed => "WITHOUT_RED",
            Filter::WithoutGreen => "WITHOUT_GREEN",
            Filter::WithoutBlue => "WITHOUT_BLUE",
            Filter::OnlyRed => "ONLY_RED",
            Filter::OnlyGreen => "ONLY_GREEN",
            Filter::OnlyBlue => "ONLY_BLUE",
            Filter::WhiteBlack => "WHITE_BLACK",
            Filter::InThreeSteps => "IN_THREE_STEPS",
            Filter::Original => "ORIGINAL",
        }
    }

    /// Resolve to the transform the executor runs.
    pub fn transform(self) -> Transform {
        match self {
            Filter::WithoutRed => Transform::Pixel(without_red),
            Filter::WithoutGreen => Transform::Pixel(without_green),
            Filter::WithoutBlue => Transform::Pixel(without_blue),
            Filter::OnlyRed => Transform::Pixel(only_red),
            Filter::OnlyGreen => Transform::Pixel(only_green),
            Filter::OnlyBlue => Transform::Pixel(only_blue),
            Filter::WhiteBlack => Transform::Pixel(white_black),
            Filter::InThreeSteps => Transform::Pixel(in_three_steps),
            Filter::Original => Transform::Passthrough,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = UnknownFilter;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Filter::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| UnknownFilter(s.trim().to_string()))
    }
}

/// Resolve a list of filter names, dropping unknown ones.
///
/// Returns the resolved filters (duplicates removed, first occurrence kept)
/// and the names that did not match anything.
pub fn resolve_names<S: AsRef<str>>(names: &[S]) -> (Vec<Filter>, Vec<String>) {
    let mut selected = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            continue;
        }
        match name.parse::<Filter>() {
            Ok(filter) if !selected.contains(&filter) => selected.push(filter),
            Ok(_) => {}
            Err(UnknownFilter(raw)) => unknown.push(raw),
        }
    }
    (selected, unknown)
}

// ============================================================================
// Pixel functions
// ============================================================================

fn without_red([_, g, b, a]: Rgba) -> Rgba {
    [0, g, b, a]
}

fn without_green([r, _, b, a]: Rgba) -> Rgba {
    [r, 0, b, a]
}

fn without_blue([r, g, _, a]: Rgba) -> Rgba {
    [r, g, 0, a]
}

fn only_red([r, _, _, a]: Rgba) -> Rgba {
    [r, 0, 0, a]
}

fn only_green([_, g, _, a]: Rgba) -> Rgba {
    [0, g, 0, a]
}

fn only_blue([_, _, b, a]: Rgba) -> Rgba {
    [0, 0, b, a]
}

fn white_black([r, g, b, a]: Rgba) -> Rgba {
    let mean = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    [mean, mean, mean, a]
}

fn step(channel: u8) -> u8 {
    match channel {
        0..80 => 0,
        80..160 => 140,
        _ => 255,
    }
}

fn in_three_steps([r, g, b, a]: Rgba) -> Rgba {
    [step(r), step(g), step(b), step(a)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(filter: Filter, px: Rgba) -> Rgba {
        match filter.transform() {
            Transform::Pixel(f) => f(px),
            Transform::Passthrough => px,
        }
    }

    #[test]
    fn channel_removal_filters() {
        let px = [10, 20, 30, 40];
        assert_eq!(apply(Filter::WithoutRed, px), [0, 20, 30, 40]);
        assert_eq!(apply(Filter::WithoutGreen, px), [10, 0, 30, 40]);
        assert_eq!(apply(Filter::WithoutBlue, px), [10, 20, 0, 40]);
    }

    #[test]
    fn single_channel_filters() {
        let px = [10, 20, 30, 40];
        assert_eq!(apply(Filter::OnlyRed, px), [10, 0, 0, 40]);
        assert_eq!(apply(Filter::OnlyGreen, px), [0, 20, 0, 40]);
        assert_eq!(apply(Filter::OnlyBlue, px), [0, 0, 30, 40]);
    }

    #[test]
    fn white_black_floors_the_average() {
        assert_eq!(apply(Filter::WhiteBlack, [200, 10, 10, 255]), [73, 73, 73, 255]);
        assert_eq!(apply(Filter::WhiteBlack, [10, 10, 200, 255]), [73, 73, 73, 255]);
        assert_eq!(apply(Filter::WhiteBlack, [255, 255, 255, 7]), [255, 255, 255, 7]);
    }

    #[test]
    fn in_three_steps_posterizes_every_channel() {
        assert_eq!(apply(Filter::InThreeSteps, [0, 79, 80, 159]), [0, 0, 140, 140]);
        assert_eq!(apply(Filter::InThreeSteps, [160, 255, 100, 200]), [255, 255, 140, 255]);
    }

    #[test]
    fn original_is_passthrough() {
        assert!(Filter::Original.transform().is_passthrough());
        assert!(!Filter::WhiteBlack.transform().is_passthrough());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("white_black".parse::<Filter>(), Ok(Filter::WhiteBlack));
        assert_eq!("Only-Red".parse::<Filter>(), Ok(Filter::OnlyRed));
        assert_eq!(
            "SEPIA".parse::<Filter>(),
            Err(UnknownFilter("SEPIA".to_string()))
        );
    }

    #[test]
    fn names_round_trip_through_parse() {
        for filter in Filter::ALL {
            assert_eq!(filter.name().parse::<Filter>(), Ok(filter));
        }
    }

    #[test]
    fn resolve_names_drops_unknown_and_duplicates() {
        let (selected, unknown) =
            resolve_names(&["ONLY_RED", "nope", "only_red", "", "ORIGINAL"]);
        assert_eq!(selected, vec![Filter::OnlyRed, Filter::Original]);
        assert_eq!(unknown, vec!["nope".to_string()]);
    }
}
