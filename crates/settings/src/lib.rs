//! Persistent configuration for the OMERO connector host.
//! OMERO 連接器主程式的持久化設定。

pub mod config;

pub use config::{
    AdapterSettings, FolderSettings, Settings, SettingsError, SettingsStore,
    DEFAULT_ADAPTER_PROGRAM,
};
