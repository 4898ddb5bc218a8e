//! Shared helpers for the integration tests
//!
//! A [`Project`] is a throwaway directory tree on disk with a `src/` folder
//! for sources, `include/` for the local include path and `sys/` for the
//! global one.

#![allow(dead_code)]

use cxxfront::pp::{CppPreprocessor, FileSystemProvider, PPConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().expect("create temporary directory");
        Project { dir }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Absolute path of `relative` as the driver spells it
    pub fn name(&self, relative: &str) -> String {
        self.path(relative).to_string_lossy().into_owned()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> String {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write source file");
        self.name(relative)
    }

    pub fn driver(&self) -> CppPreprocessor<FileSystemProvider> {
        let config = PPConfig {
            local_include_paths: vec![self.path("include")],
            global_include_paths: vec![self.path("sys")],
            ..Default::default()
        };
        CppPreprocessor::new(config)
    }
}
