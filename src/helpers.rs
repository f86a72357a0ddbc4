// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Convenience helpers for common stacking decisions.

use crate::types::StackRejection;

/// Rejection algorithm and sigma pair suited to a stack of a given size.
///
/// Small stacks reject by percentile, mid-sized stacks use winsorized sigma
/// clipping, and large stacks can afford linear fit clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestRejection {
    pub rejection: StackRejection,
    pub low: f64,
    pub high: f64,
}

impl BestRejection {
    pub fn for_frame_count(frames: u32) -> Self {
        if frames <= 6 {
            Self {
                rejection: StackRejection::Percentile,
                low: 0.2,
                high: 0.1,
            }
        } else if frames <= 30 {
            Self {
                rejection: StackRejection::Winsorized,
                low: 3.0,
                high: 3.0,
            }
        } else {
            Self {
                rejection: StackRejection::LinearFit,
                low: 5.0,
                high: 5.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_stack_uses_percentile() {
        let best = BestRejection::for_frame_count(3);
        assert_eq!(best.rejection, StackRejection::Percentile);
        assert_eq!(best.low, 0.2);
        assert_eq!(best.high, 0.1);
        assert_eq!(BestRejection::for_frame_count(6).rejection, StackRejection::Percentile);
    }

    #[test]
    fn test_medium_stack_uses_winsorized() {
        let best = BestRejection::for_frame_count(7);
        assert_eq!(best.rejection, StackRejection::Winsorized);
        assert_eq!(best.low, 3.0);
        assert_eq!(BestRejection::for_frame_count(30).rejection, StackRejection::Winsorized);
    }

    #[test]
    fn test_large_stack_uses_linear_fit() {
        let best = BestRejection::for_frame_count(31);
        assert_eq!(best.rejection, StackRejection::LinearFit);
        assert_eq!(best.high, 5.0);
        assert_eq!(BestRejection::for_frame_count(500).rejection, StackRejection::LinearFit);
    }
}
