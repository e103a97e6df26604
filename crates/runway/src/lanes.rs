//! Lane names defined by the project, read without evaluating the lane file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

const LANE_FILE_NAME: &str = "Lanefile";
const LANE_FILE_LOCATIONS: [&str; 2] = ["runway", ""];

/// Lists the lanes available in a working directory.
pub trait LaneLister {
    fn available_lanes(&self, working_dir: &Path) -> BTreeSet<String>;
}

impl<L: LaneLister + ?Sized> LaneLister for Rc<L> {
    fn available_lanes(&self, working_dir: &Path) -> BTreeSet<String> {
        (**self).available_lanes(working_dir)
    }
}

/// Reads lane declarations (`lane :name do`) from the project's lane file.
///
/// The file is read on the first call; later calls return the same set.
#[derive(Debug, Default)]
pub struct LanefileLister {
    lanes: OnceLock<BTreeSet<String>>,
}

impl LanefileLister {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LaneLister for LanefileLister {
    fn available_lanes(&self, working_dir: &Path) -> BTreeSet<String> {
        self.lanes
            .get_or_init(|| read_lanes(working_dir))
            .clone()
    }
}

fn read_lanes(working_dir: &Path) -> BTreeSet<String> {
    let Some(path) = find_lane_file(working_dir) else {
        debug!(dir = %working_dir.display(), "No lane file found");
        return BTreeSet::new();
    };
    match fs::read_to_string(&path) {
        Ok(contents) => parse_lane_names(&contents),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Could not read lane file");
            BTreeSet::new()
        }
    }
}

/// `runway/Lanefile` if present, else `Lanefile`.
pub fn find_lane_file(dir: &Path) -> Option<PathBuf> {
    LANE_FILE_LOCATIONS
        .iter()
        .map(|sub| {
            if sub.is_empty() {
                dir.join(LANE_FILE_NAME)
            } else {
                dir.join(sub).join(LANE_FILE_NAME)
            }
        })
        .find(|candidate| candidate.is_file())
}

pub fn parse_lane_names(contents: &str) -> BTreeSet<String> {
    let pattern = lane_pattern();
    contents
        .lines()
        .filter_map(|line| pattern.captures(line))
        .map(|captures| captures[1].to_string())
        .collect()
}

fn lane_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*lane\s+:(\w+)").expect("lane pattern is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_lane_names() {
        let contents = "platform :ios do\n  \
                        lane :beta do\n    scan\n  end\n\n  \
                        lane :release do |options|\n  end\n  \
                        # lane :commented\n  \
                        private_lane :helper do\n  end\n\
                        end\n";
        let lanes: Vec<_> = parse_lane_names(contents).into_iter().collect();
        assert_eq!(lanes, vec!["beta", "release"]);
    }

    #[test]
    fn test_lane_file_location_preference() {
        let dir = tempdir().expect("tempdir");
        assert!(find_lane_file(dir.path()).is_none());

        fs::write(dir.path().join(LANE_FILE_NAME), "lane :root do\nend\n").unwrap();
        fs::create_dir(dir.path().join("runway")).unwrap();
        fs::write(
            dir.path().join("runway").join(LANE_FILE_NAME),
            "lane :nested do\nend\n",
        )
        .unwrap();

        let lanes = LanefileLister::new().available_lanes(dir.path());
        assert_eq!(lanes.into_iter().collect::<Vec<_>>(), vec!["nested"]);
    }

    #[test]
    fn test_lane_file_is_read_once() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(LANE_FILE_NAME), "lane :beta do\nend\n").unwrap();
        let lister = Rc::new(LanefileLister::new());
        let shared = lister.clone();
        assert_eq!(
            shared.available_lanes(dir.path()).into_iter().collect::<Vec<_>>(),
            vec!["beta"]
        );

        fs::write(dir.path().join(LANE_FILE_NAME), "lane :release do\nend\n").unwrap();
        assert_eq!(
            lister.available_lanes(dir.path()).into_iter().collect::<Vec<_>>(),
            vec!["beta"]
        );
    }

    #[test]
    fn test_missing_lane_file_means_no_lanes() {
        let dir = tempdir().expect("tempdir");
        assert!(LanefileLister::new().available_lanes(dir.path()).is_empty());
    }
}
