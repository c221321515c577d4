use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const SETTINGS_VERSION: u32 = 1;

/// Connector executable shipped with HRM, relative to the HRM install root.
pub const DEFAULT_ADAPTER_PROGRAM: &str = "bin/ome_hrm.py";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("user name '{0}' cannot name a folder under the image root")]
    InvalidUser(String),
}

/// 連接器與使用者資料夾的整體設定。 / Top-level settings for the OMERO connector host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub adapter: AdapterSettings,
    #[serde(default)]
    pub folders: FolderSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            adapter: AdapterSettings::default(),
            folders: FolderSettings::default(),
        }
    }
}

impl Settings {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = SETTINGS_VERSION;
        }
        self.adapter.sanitize();
        self.folders.sanitize();
    }
}

/// 外部連接器程式的啟動方式。 / How the external connector program is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSettings {
    #[serde(default = "default_program")]
    pub program: String,
    /// Directory the connector runs in; relative program paths resolve against it.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// `None` waits for the connector indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_program() -> String {
    DEFAULT_ADAPTER_PROGRAM.to_string()
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            working_dir: None,
            timeout_secs: None,
        }
    }
}

impl AdapterSettings {
    fn sanitize(&mut self) {
        if self.program.trim().is_empty() {
            self.program = default_program();
        }
        if self.timeout_secs == Some(0) {
            self.timeout_secs = None;
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Layout of per-user image folders: `<image_root>/<user>/<source|destination>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSettings {
    #[serde(default = "default_image_root")]
    pub image_root: PathBuf,
    #[serde(default = "default_source_folder")]
    pub source_folder: String,
    #[serde(default = "default_destination_folder")]
    pub destination_folder: String,
}

fn default_image_root() -> PathBuf {
    PathBuf::from("/data/images")
}

fn default_source_folder() -> String {
    "src".to_string()
}

fn default_destination_folder() -> String {
    "dst".to_string()
}

impl Default for FolderSettings {
    fn default() -> Self {
        Self {
            image_root: default_image_root(),
            source_folder: default_source_folder(),
            destination_folder: default_destination_folder(),
        }
    }
}

impl FolderSettings {
    fn sanitize(&mut self) {
        if self.image_root.as_os_str().is_empty() {
            self.image_root = default_image_root();
        }
        if self.source_folder.trim().is_empty() {
            self.source_folder = default_source_folder();
        }
        if self.destination_folder.trim().is_empty() {
            self.destination_folder = default_destination_folder();
        }
    }

    /// Folder that receives images fetched from OMERO.
    pub fn source_for(&self, user: &str) -> Result<PathBuf, SettingsError> {
        Ok(self.user_root(user)?.join(&self.source_folder))
    }

    /// Folder holding deconvolution results offered for export.
    pub fn destination_for(&self, user: &str) -> Result<PathBuf, SettingsError> {
        Ok(self.user_root(user)?.join(&self.destination_folder))
    }

    /// The user name must be a single plain path component.
    fn user_root(&self, user: &str) -> Result<PathBuf, SettingsError> {
        let mut components = Path::new(user).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.image_root.join(name)),
            _ => Err(SettingsError::InvalidUser(user.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    data: Settings,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            data: settings,
        }
    }

    /// 載入設定檔；檔案不存在時回傳預設值。 / Loads settings, falling back to defaults when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Settings::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Settings =
            serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), SettingsError>
    where
        F: FnMut(&mut Settings),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let payload = self.to_json_string().map_err(|source| SettingsError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| SettingsError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
