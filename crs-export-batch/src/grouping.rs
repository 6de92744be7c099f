//! Shared transformation names for records with equal Helmert parameters.

use std::collections::HashMap;

use crs_export_core::HelmertTransform;

const TRANSLATION_DECIMALS: usize = 9;
const ROTATION_DECIMALS: usize = 12;
const SCALE_DECIMALS: usize = 15;

/// Rounded, comparable form of a seven-parameter Helmert transform.
///
/// Translations are kept to 9 decimal places, rotations (degrees) to 12 and
/// the scale multiplier to 15. Equality is exact on the rounded text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HelmertSignature([String; 7]);

impl HelmertSignature {
    /// Builds the signature of `helmert`.
    #[must_use]
    pub fn new(helmert: &HelmertTransform) -> Self {
        let [dx, dy, dz] = helmert.translations();
        let [rx, ry, rz] = helmert.rotation_degrees();
        Self([
            rounded(dx, TRANSLATION_DECIMALS),
            rounded(dy, TRANSLATION_DECIMALS),
            rounded(dz, TRANSLATION_DECIMALS),
            rounded(rx, ROTATION_DECIMALS),
            rounded(ry, ROTATION_DECIMALS),
            rounded(rz, ROTATION_DECIMALS),
            rounded(helmert.scale_multiplier(), SCALE_DECIMALS),
        ])
    }
}

/// Formats `value` to `decimals` places, folding negative zero into zero.
fn rounded(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|ch| ch == '0' || ch == '.') => {
            magnitude.to_owned()
        }
        _ => text,
    }
}

/// Assigns `Transformation_<n>` names in first-seen order, starting at 1.
#[derive(Debug, Default)]
pub struct TransformationGroups {
    names: HashMap<HelmertSignature, String>,
}

impl TransformationGroups {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the group name for `helmert`, registering a new group if needed.
    pub fn assign(&mut self, helmert: &HelmertTransform) -> &str {
        let next = self.names.len() + 1;
        self.names
            .entry(HelmertSignature::new(helmert))
            .or_insert_with(|| format!("Transformation_{next}"))
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Reports whether no group has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]
mod tests {
    use super::*;
    use rstest::rstest;

    fn helmert(text: &str) -> HelmertTransform {
        HelmertTransform::from_towgs84(text).expect("valid towgs84")
    }

    #[rstest]
    fn identical_tuples_share_a_group() {
        let mut groups = TransformationGroups::new();
        let first = groups
            .assign(&helmert("23.57,-140.95,-79.8,0,0.35,0.79,-0.22"))
            .to_owned();
        let second = groups
            .assign(&helmert("23.57,-140.95,-79.8,0,0.35,0.79,-0.22"))
            .to_owned();
        let third = groups.assign(&helmert("24,-123,-94,0.02,-0.25,-0.13,1.1")).to_owned();

        assert_eq!(first, "Transformation_1");
        assert_eq!(second, first);
        assert_eq!(third, "Transformation_2");
        assert_eq!(groups.len(), 2);
    }

    #[rstest]
    fn differences_below_rounding_merge() {
        let close = HelmertSignature::new(&helmert("1.0000000001,0,0"));
        let exact = HelmertSignature::new(&helmert("1,0,0"));
        assert_eq!(close, exact);
    }

    #[rstest]
    #[case(-0.000_000_000_1, 9, "0.000000000")]
    #[case(-1.5, 1, "-1.5")]
    #[case(2.0, 3, "2.000")]
    fn rounding_folds_negative_zero(
        #[case] value: f64,
        #[case] decimals: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(rounded(value, decimals), expected);
    }
}
