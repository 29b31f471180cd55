//! Public path matching.

use core_runtime::config::{ClientConfig, PathMatch};

/// Request paths exempt from credential attachment and auth handling
#[derive(Debug, Clone)]
pub struct PublicPaths {
    fragments: Vec<String>,
    mode: PathMatch,
}

impl PublicPaths {
    pub fn new<I, S>(fragments: I, mode: PathMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.public_paths.iter().cloned(), config.path_match)
    }

    pub fn mode(&self) -> PathMatch {
        self.mode
    }

    /// Whether `path` is public under the configured matching rule.
    ///
    /// With [`PathMatch::Substring`] `/users/password/update-password-preview`
    /// matches `/password/update-password`; [`PathMatch::Segment`] requires
    /// the fragment's segments to appear contiguously as whole segments.
    pub fn is_public(&self, path: &str) -> bool {
        match self.mode {
            PathMatch::Substring => self.fragments.iter().any(|f| path.contains(f.as_str())),
            PathMatch::Segment => {
                let path_segments = segments(path);
                self.fragments.iter().any(|fragment| {
                    let wanted = segments(fragment);
                    !wanted.is_empty()
                        && path_segments
                            .windows(wanted.len())
                            .any(|window| window == wanted.as_slice())
                })
            }
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
