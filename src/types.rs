// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared Siril vocabulary used by the typed command set.
//!
//! Each enum renders to the exact token Siril's command parser expects.

use std::fmt;

/// FITS file extensions Siril recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitsExtension {
    Fit,
    Fits,
    Fts,
}

impl FitsExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Fits => "fits",
            Self::Fts => "fts",
        }
    }
}

impl fmt::Display for FitsExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometric transformation models for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationTransform {
    Shift,
    Similarity,
    Affine,
    Homography,
}

impl fmt::Display for RegistrationTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shift => "shift",
            Self::Similarity => "similarity",
            Self::Affine => "affine",
            Self::Homography => "homography",
        })
    }
}

/// Pixel interpolation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelInterpolation {
    None,
    Nearest,
    Cubic,
    Lanczos4,
    Linear,
    Area,
}

impl fmt::Display for PixelInterpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Nearest => "nearest",
            Self::Cubic => "cubic",
            Self::Lanczos4 => "lanczos4",
            Self::Linear => "linear",
            Self::Area => "area",
        })
    }
}

/// Output framing for registered sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFraming {
    Current,
    Min,
    Max,
    Cog,
}

impl fmt::Display for SequenceFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Min => "min",
            Self::Max => "max",
            Self::Cog => "cog",
        })
    }
}

/// Image-quality metrics a sequence can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFilterKind {
    Fwhm,
    WeightedFwhm,
    Roundness,
    Quality,
    Inclusion,
    Background,
    StarCount,
}

impl SequenceFilterKind {
    /// The option name Siril expects, without the leading dash.
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Fwhm => "filter-fwhm",
            Self::WeightedFwhm => "filter-wfwhm",
            Self::Roundness => "filter-round",
            Self::Quality => "filter-quality",
            Self::Inclusion => "filter-incl",
            Self::Background => "filter-bkg",
            Self::StarCount => "filter-nbstars",
        }
    }
}

/// A filter threshold: either an absolute metric value or a percentile of
/// the sequence. Exactly one applies, which the type enforces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterThreshold {
    Value(f64),
    Percent(f64),
}

impl fmt::Display for FilterThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// A sequence filter, rendered as `-<name>=<threshold>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceFilter {
    pub kind: SequenceFilterKind,
    pub threshold: FilterThreshold,
}

impl SequenceFilter {
    pub fn new(kind: SequenceFilterKind, threshold: FilterThreshold) -> Self {
        Self { kind, threshold }
    }
}

impl fmt::Display for SequenceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}={}", self.kind.option_name(), self.threshold)
    }
}

/// Stacking methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackType {
    Sum,
    Rejection,
    Median,
    Min,
    Max,
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sum => "sum",
            Self::Rejection => "rej",
            Self::Median => "med",
            Self::Min => "min",
            Self::Max => "max",
        })
    }
}

/// Normalization applied before stacking. Rendered as a complete argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackNorm {
    None,
    Additive,
    AdditiveScaled,
    Multiplicative,
    MultiplicativeScaled,
}

impl fmt::Display for StackNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "-nonorm",
            Self::Additive => "-norm=add",
            Self::AdditiveScaled => "-norm=addscale",
            Self::Multiplicative => "-norm=mul",
            Self::MultiplicativeScaled => "-norm=mulscale",
        })
    }
}

/// Pixel rejection algorithms for rejection stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRejection {
    None,
    Percentile,
    Sigma,
    Median,
    Winsorized,
    LinearFit,
    GeneralizedEsd,
    Mad,
}

impl StackRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "n",
            Self::Percentile => "p",
            Self::Sigma => "s",
            Self::Median => "m",
            Self::Winsorized => "w",
            Self::LinearFit => "l",
            Self::GeneralizedEsd => "g",
            Self::Mad => "a",
        }
    }
}

impl fmt::Display for StackRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection map outputs for rejection stacking. Rendered as a complete
/// flag, or nothing at all for `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRejectionMaps {
    None,
    /// Two maps, one each for low and high rejections.
    Split,
    /// A single merged map.
    Merged,
}

impl StackRejectionMaps {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Split => "-rejmaps",
            Self::Merged => "-rejmap",
        }
    }
}

impl fmt::Display for StackRejectionMaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame weighting schemes for stacking. Rendered as a complete flag, or
/// nothing at all for `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackWeighting {
    None,
    FromNoise,
    FromWeightedFwhm,
    FromStarCount,
    FromStackCount,
}

impl StackWeighting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::FromNoise => "-weight_from_noise",
            Self::FromWeightedFwhm => "-weight_from_wfwhm",
            Self::FromStarCount => "-weight_from_nbstars",
            Self::FromStackCount => "-weight_from_nbstack",
        }
    }
}

impl fmt::Display for StackWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
