//! Settings file handling.
//!
//! The file is TOML with one table per [`ConfigSection`]. Every write goes
//! to a temporary file in the same directory that is then renamed over the
//! target, so an interrupted write never leaves a truncated file behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

const FILE_HEADER: &str = "# M4S Merge settings\n# Unknown tables are dropped and missing keys are filled in on startup.\n";

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid TOML: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and the settings read from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// A manager for `path` holding default settings until loaded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory changes are written by `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the file. Keys it does not set keep their defaults.
    pub fn load(&mut self) -> ConfigResult<()> {
        let text = self
            .read()?
            .ok_or_else(|| ConfigError::NotFound(self.path.clone()))?;
        self.settings = toml::from_str(&text)?;
        Ok(())
    }

    /// Read the file, or write one with defaults if there is none.
    ///
    /// A file with unknown tables or missing keys is rewritten so that it
    /// always lists every setting.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        let Some(text) = self.read()? else {
            tracing::info!("Creating default config at {}", self.path.display());
            self.settings = Settings::default();
            return self.save();
        };

        self.settings = toml::from_str(&text)?;
        let on_disk: DocumentMut = text.parse()?;
        if !is_complete(&on_disk, &self.render()?) {
            tracing::info!("Rewriting {} with every setting listed", self.path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create every configured (non-empty) folder.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [paths.output_dir(), paths.temp_root_dir(), paths.logs_dir()]
            .into_iter()
            .flatten()
        {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Write all settings, replacing the file.
    pub fn save(&self) -> ConfigResult<()> {
        let content = format!("{}{}", FILE_HEADER, self.render()?);
        self.write_atomically(&content)
    }

    /// Write one section from memory into the file as it is on disk.
    ///
    /// Other tables, including their comments, are left untouched.
    pub fn update_section(&self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match self.read()? {
            Some(text) => text.parse::<DocumentMut>()?,
            None => DocumentMut::new(),
        };

        let rendered = self.render()?;
        if let Some(table) = rendered.get(section.table_name()) {
            doc[section.table_name()] = table.clone();
        }

        self.write_atomically(&doc.to_string())
    }

    fn read(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The in-memory settings as a commented document.
    fn render(&self) -> ConfigResult<DocumentMut> {
        let mut doc: DocumentMut = toml::to_string_pretty(&self.settings)?.parse()?;
        for section in ConfigSection::all() {
            if let Some(table) = doc
                .get_mut(section.table_name())
                .and_then(Item::as_table_mut)
            {
                table
                    .decor_mut()
                    .set_prefix(format!("\n# {}\n", section_comment(section)));
            }
        }
        Ok(doc)
    }

    fn write_atomically(&self, content: &str) -> ConfigResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn section_comment(section: ConfigSection) -> &'static str {
    match section {
        ConfigSection::Paths => "Output, scratch and log folders (empty = default location)",
        ConfigSection::Ffmpeg => "ffmpeg executable (name on PATH or full path) and time limits in seconds",
        ConfigSection::Logging => "Job log output",
    }
}

/// Whether `on_disk` has only known tables and every key `full` has.
fn is_complete(on_disk: &DocumentMut, full: &DocumentMut) -> bool {
    let known = ConfigSection::all().map(|s| s.table_name());
    if on_disk.iter().any(|(name, _)| !known.contains(&name)) {
        return false;
    }

    full.iter().all(|(name, item)| {
        match (item.as_table(), on_disk.get(name).and_then(Item::as_table)) {
            (Some(expected), Some(present)) => {
                expected.iter().all(|(key, _)| present.contains_key(key))
            }
            (Some(_), None) => false,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_commented_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m4s-merge").join("settings.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# M4S Merge settings"));
        for table in ["[paths]", "[ffmpeg]", "[logging]"] {
            assert!(content.contains(table), "missing {}", table);
        }
        assert!(content.contains("# ffmpeg executable"));

        let mut reloaded = ConfigManager::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().ffmpeg.timeout_secs, 3600);
        assert_eq!(reloaded.settings().ffmpeg.probe_timeout_secs, 5);
    }

    #[test]
    fn partial_file_keeps_values_and_gains_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[ffmpeg]\npath = \"/opt/ffmpeg/bin/ffmpeg\"\n").unwrap();

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().ffmpeg.path, "/opt/ffmpeg/bin/ffmpeg");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("/opt/ffmpeg/bin/ffmpeg"));
        assert!(content.contains("probe_timeout_secs"));
        assert!(content.contains("[logging]"));
    }

    #[test]
    fn complete_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        ConfigManager::new(&path).load_or_create().unwrap();

        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("[ffmpeg]", "# pinned build\n[ffmpeg]");
        fs::write(&path, &edited).unwrap();

        ConfigManager::new(&path).load_or_create().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), edited);
    }

    #[test]
    fn unknown_tables_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[downloader]\nthreads = 4\n").unwrap();

        ConfigManager::new(&path).load_or_create().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("[downloader]"));
        assert!(content.contains("[paths]"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[ffmpeg\npath = ").unwrap();

        let mut manager = ConfigManager::new(&path);
        assert!(matches!(manager.load_or_create(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn update_section_writes_only_that_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        let with_comment = fs::read_to_string(&path)
            .unwrap()
            .replace("[ffmpeg]", "# pinned build\n[ffmpeg]");
        fs::write(&path, with_comment).unwrap();

        manager.settings_mut().logging.compact = false;
        manager.settings_mut().ffmpeg.timeout_secs = 10;
        manager.update_section(ConfigSection::Logging).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("compact = false"));
        assert!(content.contains("timeout_secs = 3600"));
        assert!(content.contains("# pinned build"));
    }

    #[test]
    fn ensure_dirs_creates_configured_folders() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("settings.toml"));
        let temp_root = dir.path().join("scratch");
        let logs = dir.path().join("logs");
        manager.settings_mut().paths.temp_root = temp_root.display().to_string();
        manager.settings_mut().paths.logs_folder = logs.display().to_string();

        manager.ensure_dirs_exist().unwrap();

        assert!(temp_root.is_dir());
        assert!(logs.is_dir());
    }

    #[test]
    fn saving_leaves_only_the_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let manager = ConfigManager::new(&path);
        manager.save().unwrap();
        manager.save().unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("settings.toml")]);
    }
}
