#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

//===========================================================================//

/// The sizes every standard icon contains, largest first.
pub const STANDARD_SIZES: [u32; 6] = [256, 128, 64, 48, 32, 16];

/// The largest size an ICO directory entry can describe.
pub const MAX_SIZE: u32 = 256;

//===========================================================================//

/// The ordered list of square sizes to render into an icon.
///
/// A plan is never empty, is strictly descending, and only holds sizes in
/// `1..=256`.  Entries are written to the ICO directory in plan order.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResolutionPlan {
    sizes: Vec<u32>,
}

impl ResolutionPlan {
    /// Returns the standard plan: 256, 128, 64, 48, 32 and 16 pixels.
    pub fn standard() -> ResolutionPlan {
        ResolutionPlan { sizes: STANDARD_SIZES.to_vec() }
    }

    /// Creates a custom plan, checking that `sizes` is non-empty, strictly
    /// descending, and within `1..=256`.
    pub fn new(sizes: Vec<u32>) -> Result<ResolutionPlan, PlanError> {
        if sizes.is_empty() {
            return Err(PlanError::Empty);
        }
        for (index, &size) in sizes.iter().enumerate() {
            if size == 0 || size > MAX_SIZE {
                return Err(PlanError::OutOfRange { size });
            }
            if index > 0 && sizes[index - 1] <= size {
                return Err(PlanError::NotDescending { index });
            }
        }
        Ok(ResolutionPlan { sizes })
    }

    /// Returns the sizes in this plan, largest first.
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the number of sizes in this plan.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Always false; plans can't be empty.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Iterates over the sizes in this plan, largest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.iter().copied()
    }

    /// Returns a `"WxH"` label for each size, e.g. `"256x256"`.
    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|size| format!("{}x{}", size, size)).collect()
    }
}

impl Default for ResolutionPlan {
    fn default() -> ResolutionPlan {
        ResolutionPlan::standard()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ResolutionPlan {
    fn deserialize<D>(deserializer: D) -> Result<ResolutionPlan, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            sizes: Vec<u32>,
        }
        let raw = Raw::deserialize(deserializer)?;
        ResolutionPlan::new(raw.sizes).map_err(serde::de::Error::custom)
    }
}

//===========================================================================//

/// Why a list of sizes isn't a valid [`ResolutionPlan`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// No sizes were given.
    #[error("resolution plan is empty")]
    Empty,
    /// The size at `index` is not smaller than the one before it.
    #[error("sizes must be strictly descending (entry {index} is not)")]
    NotDescending {
        /// Position of the offending size.
        index: usize,
    },
    /// A size is zero or larger than 256.
    #[error("invalid icon size {size} (must be between 1 and 256)")]
    OutOfRange {
        /// The offending size.
        size: u32,
    },
}

impl fmt::Display for ResolutionPlan {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let labels = self.labels();
        write!(formatter, "[{}]", labels.join(", "))
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{PlanError, ResolutionPlan};

    #[test]
    fn standard_plan() {
        let plan = ResolutionPlan::standard();
        assert_eq!(plan.sizes(), &[256, 128, 64, 48, 32, 16]);
        assert_eq!(plan.len(), 6);
        assert_eq!(plan, ResolutionPlan::default());
        assert_eq!(
            plan.labels(),
            vec!["256x256", "128x128", "64x64", "48x48", "32x32", "16x16"]
        );
    }

    #[test]
    fn custom_plan() {
        let plan = ResolutionPlan::new(vec![48, 24, 1]).unwrap();
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec![48, 24, 1]);
        assert_eq!(plan.to_string(), "[48x48, 24x24, 1x1]");
    }

    #[test]
    fn reject_invalid_plans() {
        assert_eq!(ResolutionPlan::new(vec![]), Err(PlanError::Empty));
        assert_eq!(
            ResolutionPlan::new(vec![32, 64]),
            Err(PlanError::NotDescending { index: 1 })
        );
        assert_eq!(
            ResolutionPlan::new(vec![32, 32]),
            Err(PlanError::NotDescending { index: 1 })
        );
        assert_eq!(
            ResolutionPlan::new(vec![512, 256]),
            Err(PlanError::OutOfRange { size: 512 })
        );
        assert_eq!(
            ResolutionPlan::new(vec![16, 0]),
            Err(PlanError::OutOfRange { size: 0 })
        );
    }
}

//===========================================================================//
