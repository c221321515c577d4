use std::path::{Component, Path, PathBuf};

/// Local image folders of one HRM user.
///
/// Images fetched from OMERO land in `source`; results offered for export
/// are read from `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFolders {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl UserFolders {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Joins `name` under `root`, refusing names that could leave it.
/// （將檔名接在根目錄下，拒絕可能跳出根目錄的名稱。）
///
/// Only plain relative names are accepted: no `..`, no root or drive prefix,
/// and at least one normal component.
pub fn confined_join(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let mut has_normal = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    has_normal.then(|| root.join(relative))
}
