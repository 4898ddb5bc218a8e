use crate::pp::client::IncludeType;
use std::path::{Component, Path, PathBuf};

/// Name of the in-memory configuration pseudo file
pub const CONFIGURATION_FILE: &str = "<configuration>";

/// Where a header was found. Used to resume the search for `#include_next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchLocation {
    /// Absolute path or the configuration file
    Direct,
    /// Directory of the including file
    CurrentDir,
    Local(usize),
    Global(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundHeader {
    pub path: String,
    pub contents: String,
    pub location: SearchLocation,
}

impl FoundHeader {
    /// A local include that was only found through the global paths
    pub fn is_global_fallback(&self, include_type: IncludeType) -> bool {
        include_type == IncludeType::Local && matches!(self.location, SearchLocation::Global(_))
    }
}

/// Collapse `.` and `..` components without touching the file system.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Include search paths and the lookup order between them
#[derive(Debug, Clone, Default)]
pub struct HeaderSearch {
    pub local_paths: Vec<PathBuf>,
    pub global_paths: Vec<PathBuf>,
}

impl HeaderSearch {
    pub fn new(local_paths: Vec<PathBuf>, global_paths: Vec<PathBuf>) -> Self {
        HeaderSearch {
            local_paths,
            global_paths,
        }
    }

    fn candidate(dir: &Path, name: &str) -> String {
        clean_path(&dir.join(name)).to_string_lossy().into_owned()
    }

    /// Resolve `name` included from `current_file`.
    ///
    /// Local includes try the including file's directory, then the local
    /// paths, then the global paths. Global includes only use the global paths.
    pub fn resolve_path(
        &self,
        name: &str,
        include_type: IncludeType,
        current_file: Option<&str>,
        read: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Option<FoundHeader> {
        if name == CONFIGURATION_FILE || Path::new(name).is_absolute() {
            return read(name).map(|contents| FoundHeader {
                path: name.to_string(),
                contents,
                location: SearchLocation::Direct,
            });
        }

        if include_type == IncludeType::Local {
            if let Some(dir) = current_file.and_then(|file| Path::new(file).parent()) {
                let path = Self::candidate(dir, name);
                if let Some(contents) = read(&path) {
                    return Some(FoundHeader {
                        path,
                        contents,
                        location: SearchLocation::CurrentDir,
                    });
                }
            }
            if let Some(found) = self.check_paths(&self.local_paths, 0, name, SearchLocation::Local, read) {
                return Some(found);
            }
        }

        self.check_paths(&self.global_paths, 0, name, SearchLocation::Global, read)
    }

    /// Resolve `name` for `#include_next`, continuing after `after`.
    pub fn resolve_next_path(
        &self,
        name: &str,
        after: SearchLocation,
        read: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Option<FoundHeader> {
        match after {
            SearchLocation::Direct | SearchLocation::CurrentDir => self
                .check_paths(&self.local_paths, 0, name, SearchLocation::Local, read)
                .or_else(|| self.check_paths(&self.global_paths, 0, name, SearchLocation::Global, read)),
            SearchLocation::Local(index) => self
                .check_paths(&self.local_paths, index + 1, name, SearchLocation::Local, read)
                .or_else(|| self.check_paths(&self.global_paths, 0, name, SearchLocation::Global, read)),
            SearchLocation::Global(index) => {
                self.check_paths(&self.global_paths, index + 1, name, SearchLocation::Global, read)
            }
        }
    }

    fn check_paths(
        &self,
        paths: &[PathBuf],
        skip: usize,
        name: &str,
        location: fn(usize) -> SearchLocation,
        read: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Option<FoundHeader> {
        for (index, dir) in paths.iter().enumerate().skip(skip) {
            let path = Self::candidate(dir, name);
            if let Some(contents) = read(&path) {
                return Some(FoundHeader {
                    path,
                    contents,
                    location: location(index),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn files() -> HashMap<String, String> {
        let mut files = HashMap::new();
        files.insert("/src/local.h".to_string(), "local".to_string());
        files.insert("/inc/a/shared.h".to_string(), "first".to_string());
        files.insert("/inc/b/shared.h".to_string(), "second".to_string());
        files.insert("/sys/only_global.h".to_string(), "global".to_string());
        files
    }

    #[test]
    fn test_local_then_global_order() {
        let files = files();
        let mut read = |path: &str| files.get(path).cloned();
        let search = HeaderSearch::new(vec![PathBuf::from("/inc/a")], vec![PathBuf::from("/inc/b"), PathBuf::from("/sys")]);

        let found = search.resolve_path("local.h", IncludeType::Local, Some("/src/main.cpp"), &mut read);
        assert_eq!(found.map(|f| f.location), Some(SearchLocation::CurrentDir));

        let found = search.resolve_path("shared.h", IncludeType::Local, Some("/src/main.cpp"), &mut read);
        assert_eq!(found.map(|f| f.contents), Some("first".to_string()));

        let found = search.resolve_path("shared.h", IncludeType::Global, Some("/src/main.cpp"), &mut read);
        assert_eq!(found.map(|f| f.contents), Some("second".to_string()));

        let found = search.resolve_path("only_global.h", IncludeType::Local, Some("/src/main.cpp"), &mut read);
        assert!(found.is_some_and(|f| f.is_global_fallback(IncludeType::Local)));
    }

    #[test]
    fn test_include_next_resumes_after_location() {
        let files = files();
        let mut read = |path: &str| files.get(path).cloned();
        let search = HeaderSearch::new(Vec::new(), vec![PathBuf::from("/inc/a"), PathBuf::from("/inc/b")]);
        let found = search.resolve_next_path("shared.h", SearchLocation::Global(0), &mut read);
        assert_eq!(found.map(|f| f.path), Some("/inc/b/shared.h".to_string()));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/../c.h")), PathBuf::from("/a/c.h"));
    }
}
