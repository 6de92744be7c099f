//! Lexical classification of exported filenames into directory buckets.

use camino::{Utf8Path, Utf8PathBuf};

/// Zone width sub-bucket of a national grid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneWidth {
    /// Three-degree zones.
    ThreeDegree,
    /// Six-degree zones.
    SixDegree,
}

impl ZoneWidth {
    /// Directory name of the sub-bucket.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::ThreeDegree => "3deg",
            Self::SixDegree => "6deg",
        }
    }

    fn pick(stem: &str, marker: &str, matched: Self) -> Self {
        if stem.ends_with(marker) {
            matched
        } else {
            matched.other()
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::ThreeDegree => Self::SixDegree,
            Self::SixDegree => Self::ThreeDegree,
        }
    }
}

/// Top-level directory bucket for an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// GSK-2011 national grid.
    Gsk2011(ZoneWidth),
    /// Regional MSK grids.
    Msk,
    /// SK-42 national grid.
    Sk42(ZoneWidth),
    /// SK-63 national grid.
    Sk63(ZoneWidth),
    /// SK-95 national grid.
    Sk95(ZoneWidth),
    /// UTM zones.
    Utm,
    /// Everything else.
    Local,
}

const KRASNOYARSK_CITY: &str = "MSK_gKrasnoyarsk";

impl Bucket {
    /// Every leaf directory of the layout.
    pub const ALL: [Self; 11] = [
        Self::Gsk2011(ZoneWidth::ThreeDegree),
        Self::Gsk2011(ZoneWidth::SixDegree),
        Self::Msk,
        Self::Sk42(ZoneWidth::ThreeDegree),
        Self::Sk42(ZoneWidth::SixDegree),
        Self::Sk63(ZoneWidth::ThreeDegree),
        Self::Sk63(ZoneWidth::SixDegree),
        Self::Sk95(ZoneWidth::ThreeDegree),
        Self::Sk95(ZoneWidth::SixDegree),
        Self::Utm,
        Self::Local,
    ];

    /// Classifies `filename` by prefix and stem suffix.
    ///
    /// Rules are tried in a fixed order and unmatched names land in
    /// [`Bucket::Local`].
    ///
    /// # Examples
    ///
    /// ```
    /// use crs_export_batch::{Bucket, ZoneWidth};
    ///
    /// assert_eq!(Bucket::classify("SK42_zone_7.3.prj"), Bucket::Sk42(ZoneWidth::ThreeDegree));
    /// assert_eq!(Bucket::classify("MSK_gKrasnoyarsk.prj"), Bucket::Local);
    /// assert_eq!(Bucket::classify("UTM_zone_01N.prj"), Bucket::Utm);
    /// ```
    #[must_use]
    pub fn classify(filename: &str) -> Self {
        let stem = Utf8Path::new(filename).file_stem().unwrap_or(filename);
        if filename.starts_with("GSK11") {
            Self::Gsk2011(ZoneWidth::pick(stem, ".3", ZoneWidth::ThreeDegree))
        } else if filename.starts_with("MSK") {
            if stem == KRASNOYARSK_CITY {
                Self::Local
            } else {
                Self::Msk
            }
        } else if filename.starts_with("SK42") {
            Self::Sk42(ZoneWidth::pick(stem, ".3", ZoneWidth::ThreeDegree))
        } else if filename.starts_with("SK63") {
            Self::Sk63(ZoneWidth::pick(stem, ".6", ZoneWidth::SixDegree))
        } else if filename.starts_with("SK95") {
            Self::Sk95(ZoneWidth::pick(stem, ".3", ZoneWidth::ThreeDegree))
        } else if filename.starts_with("UTM_zone_") {
            Self::Utm
        } else {
            Self::Local
        }
    }

    /// Path of the bucket relative to a format folder.
    #[must_use]
    pub fn relative_dir(self) -> Utf8PathBuf {
        let (family, width) = match self {
            Self::Gsk2011(width) => ("GSK2011", Some(width)),
            Self::Msk => ("MSK", None),
            Self::Sk42(width) => ("SK42", Some(width)),
            Self::Sk63(width) => ("SK63", Some(width)),
            Self::Sk95(width) => ("SK95", Some(width)),
            Self::Utm => ("UTM", None),
            Self::Local => ("local", None),
        };
        let mut path = Utf8PathBuf::from(family);
        if let Some(zone_width) = width {
            path.push(zone_width.dir_name());
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("GSK11_zone_7.3.prj", "GSK2011/3deg")]
    #[case("GSK11_zone_7.prj", "GSK2011/6deg")]
    #[case("MSK-50_zone_1.prj", "MSK")]
    #[case("MSK_gKrasnoyarsk.prj", "local")]
    #[case("SK42_zone_7.3.prj", "SK42/3deg")]
    #[case("SK42_zone_7.prj", "SK42/6deg")]
    #[case("SK63_C_1.6.prj", "SK63/6deg")]
    #[case("SK63_C_1.prj", "SK63/3deg")]
    #[case("SK95_zone_9.3.xml", "SK95/3deg")]
    #[case("SK95_zone_9.xml", "SK95/6deg")]
    #[case("UTM_zone_37N.prj", "UTM")]
    #[case("USL_Moscow.prj", "local")]
    #[case("Mestnaya_sistema.prj", "local")]
    fn classifies_by_prefix_and_suffix(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(Bucket::classify(filename).relative_dir(), expected);
    }

    #[rstest]
    fn gsk_prefix_wins_over_later_rules() {
        assert!(matches!(Bucket::classify("GSK11_MSK.prj"), Bucket::Gsk2011(_)));
    }

    #[rstest]
    fn all_buckets_have_distinct_directories() {
        let mut dirs: Vec<_> = Bucket::ALL.iter().map(|bucket| bucket.relative_dir()).collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), Bucket::ALL.len());
    }
}
