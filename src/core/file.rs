// JSON-backed file handle: load with default recovery, atomic save, and scoped auto-save.
use std::fs;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::atomic::{self, DEFAULT_TMP_SUFFIX};
use crate::core::error::{Error, ErrorKind, Result, map_io_error};
use crate::core::format::SerializationSettings;
use crate::json::{parse, write};
use crate::paths::canonical_path;

const EMPTY_OBJECT: &[u8] = b"{}";

/// Where a handle gets its content when the file is missing or corrupt.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultSource {
    /// Inline document, written with the handle's settings.
    Data(Value),
    /// Read-only template file copied byte-for-byte onto the target.
    Path(PathBuf),
    /// Inline data that failed to convert to JSON; holds the conversion error.
    Invalid(String),
}

#[derive(Clone, Debug)]
pub struct JsonFileOptions {
    default_data: std::result::Result<Value, String>,
    default_path: Option<PathBuf>,
    settings: SerializationSettings,
    strict: bool,
    auto_save: bool,
    load_file: bool,
}

impl JsonFileOptions {
    pub fn new() -> Self {
        Self {
            default_data: Ok(Value::Object(Map::new())),
            default_path: None,
            settings: SerializationSettings::default(),
            strict: false,
            auto_save: true,
            load_file: true,
        }
    }

    /// Uses `data` as the default document. Conversion failures are kept and
    /// reported as `DefaultNotSerializable` when strict, or replaced by `{}` otherwise.
    pub fn default_data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        self.default_data = serde_json::to_value(data).map_err(|err| err.to_string());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_data = Ok(value);
        self
    }

    /// Uses a template file as the default. Takes precedence over inline data.
    pub fn default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    pub fn settings(mut self, settings: SerializationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn load_file(mut self, load_file: bool) -> Self {
        self.load_file = load_file;
        self
    }
}

impl Default for JsonFileOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct JsonFile {
    path: PathBuf,
    /// In-memory document; mutate freely and call `save` to persist.
    pub json: Value,
    /// Settings used by `save` and when writing inline defaults.
    pub settings: SerializationSettings,
    default: DefaultSource,
    strict: bool,
    auto_save: bool,
}

impl JsonFile {
    /// Opens the file at `path` and, unless disabled, loads it.
    ///
    /// Strict handles validate their default up front and refuse to substitute
    /// it for missing or malformed content. Non-strict handles recover silently.
    pub fn open(path: impl AsRef<Path>, options: JsonFileOptions) -> Result<Self> {
        let path = canonical_path(path)?;
        let default = match options.default_path {
            Some(template) => DefaultSource::Path(canonical_path(template)?),
            None => match options.default_data {
                Ok(value) => DefaultSource::Data(value),
                Err(reason) => DefaultSource::Invalid(reason),
            },
        };

        let mut file = Self {
            path,
            json: Value::Null,
            settings: options.settings,
            default,
            strict: options.strict,
            auto_save: options.auto_save,
        };
        if file.strict {
            file.validate_default()?;
        }
        if options.load_file {
            file.load()?;
        }
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_source(&self) -> &DefaultSource {
        &self.default
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Loads the document using the handle's strictness policy.
    pub fn load(&mut self) -> Result<()> {
        if self.strict {
            self.read_document(false)
        } else {
            self.reload(true)
        }
    }

    /// Re-reads the document from disk.
    ///
    /// A missing file is always re-created from the default first. With
    /// `recover` set, malformed content is replaced by the default (or `{}` if
    /// the default is unusable too); without it, the error is returned.
    pub fn reload(&mut self, recover: bool) -> Result<()> {
        let exists = self
            .path
            .try_exists()
            .map_err(|err| map_io_error(err, "failed to stat file", &self.path))?;
        if !exists {
            tracing::debug!(path = %self.path.display(), "file missing; writing default");
            self.reinstantiate_default(recover)?;
        }
        self.read_document(recover)
    }

    pub fn save(&self) -> Result<()> {
        self.write_document(&self.settings, DEFAULT_TMP_SUFFIX)
    }

    /// Saves with one-off settings; the handle's own settings are unchanged.
    pub fn save_with(&self, settings: &SerializationSettings) -> Result<()> {
        self.write_document(settings, DEFAULT_TMP_SUFFIX)
    }

    /// Saves through a temp file named with `tmp_suffix`, renamed over the target.
    pub fn save_atomic(&self, tmp_suffix: &str) -> Result<()> {
        self.write_document(&self.settings, tmp_suffix)
    }

    /// Borrows the handle for a scope; auto-save handles are saved when the guard drops.
    #[must_use = "dropping the guard immediately saves the file"]
    pub fn scoped(&mut self) -> FileGuard<'_> {
        FileGuard {
            file: self,
            finished: false,
        }
    }

    fn write_document(&self, settings: &SerializationSettings, tmp_suffix: &str) -> Result<()> {
        let bytes = write::to_vec(&self.json, settings).map_err(|err| {
            Error::new(ErrorKind::FileAccess)
                .with_message("failed to encode document")
                .with_path(&self.path)
                .with_source(err)
        })?;
        atomic::write_atomic(&self.path, &bytes, tmp_suffix)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|err| map_io_error(err, "failed to read file", &self.path))
    }

    fn read_document(&mut self, recover: bool) -> Result<()> {
        let err = match parse::from_slice(&self.read_bytes()?) {
            Ok(value) => {
                self.json = value;
                return Ok(());
            }
            Err(err) => err,
        };
        if !recover {
            return Err(self.decode_error(err));
        }

        tracing::warn!(
            path = %self.path.display(),
            error = %err,
            "cannot read json from file; using default"
        );
        self.reinstantiate_default(true)?;
        match parse::from_slice(&self.read_bytes()?) {
            Ok(value) => self.json = value,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "default is not valid json either; falling back to empty object"
                );
                atomic::write_atomic(&self.path, EMPTY_OBJECT, DEFAULT_TMP_SUFFIX)?;
                self.json = Value::Object(Map::new());
            }
        }
        Ok(())
    }

    // With a template configured, bad content most likely came from that template.
    fn decode_error(&self, err: serde_json::Error) -> Error {
        match &self.default {
            DefaultSource::Path(template) => Error::new(ErrorKind::DefaultNotSerializable)
                .with_message(format!(
                    "default file '{}' is not valid json",
                    template.display()
                ))
                .with_path(&self.path)
                .with_source(err),
            _ => Error::new(ErrorKind::Deserialization)
                .with_message("cannot read json from file")
                .with_path(&self.path)
                .with_source(err),
        }
    }

    fn validate_default(&self) -> Result<()> {
        match &self.default {
            DefaultSource::Data(_) => Ok(()),
            DefaultSource::Invalid(reason) => Err(invalid_default_error(reason, &self.path)),
            DefaultSource::Path(template) => {
                let bytes = match fs::read(template) {
                    Ok(bytes) => bytes,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        return Err(missing_template_error(template, &self.path));
                    }
                    Err(err) => {
                        return Err(map_io_error(err, "failed to read default file", template));
                    }
                };
                parse::from_slice(&bytes).map(|_| ()).map_err(|err| {
                    Error::new(ErrorKind::DefaultNotSerializable)
                        .with_message(format!(
                            "cannot load default json from '{}'",
                            template.display()
                        ))
                        .with_path(&self.path)
                        .with_source(err)
                })
            }
        }
    }

    fn reinstantiate_default(&self, recover: bool) -> Result<()> {
        match &self.default {
            DefaultSource::Path(template) => {
                let exists = template
                    .try_exists()
                    .map_err(|err| map_io_error(err, "failed to stat default file", template))?;
                if exists {
                    return atomic::copy_atomic(template, &self.path);
                }
                if !recover {
                    return Err(missing_template_error(template, &self.path));
                }
                tracing::warn!(
                    path = %self.path.display(),
                    template = %template.display(),
                    "default file does not exist; writing empty object"
                );
            }
            DefaultSource::Data(value) => {
                let bytes = write::to_vec(value, &self.settings).map_err(|err| {
                    Error::new(ErrorKind::DefaultNotSerializable)
                        .with_message("default data is not serializable")
                        .with_path(&self.path)
                        .with_source(err)
                })?;
                return atomic::write_atomic(&self.path, &bytes, DEFAULT_TMP_SUFFIX);
            }
            DefaultSource::Invalid(reason) => {
                if !recover {
                    return Err(invalid_default_error(reason, &self.path));
                }
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "default data is not serializable; writing empty object"
                );
            }
        }
        atomic::write_atomic(&self.path, EMPTY_OBJECT, DEFAULT_TMP_SUFFIX)
    }
}

fn invalid_default_error(reason: &str, path: &Path) -> Error {
    Error::new(ErrorKind::DefaultNotSerializable)
        .with_message(format!("default data is not json-serializable: {reason}"))
        .with_path(path)
}

fn missing_template_error(template: &Path, path: &Path) -> Error {
    Error::new(ErrorKind::DefaultNotSerializable)
        .with_message(format!(
            "default file '{}' does not exist",
            template.display()
        ))
        .with_path(path)
}

/// Scoped borrow of a `JsonFile` returned by [`JsonFile::scoped`].
///
/// Dropping the guard saves the file when auto-save is enabled, except while
/// unwinding from a panic. Save errors on drop are logged; call
/// [`FileGuard::finish`] to observe them instead.
#[must_use = "dropping the guard ends the scope and saves the file"]
pub struct FileGuard<'a> {
    file: &'a mut JsonFile,
    finished: bool,
}

impl FileGuard<'_> {
    /// Ends the scope now, saving if auto-save is enabled.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        if self.file.auto_save {
            self.file.save()
        } else {
            Ok(())
        }
    }

    /// Ends the scope without saving.
    pub fn discard(mut self) {
        self.finished = true;
    }
}

impl Deref for FileGuard<'_> {
    type Target = JsonFile;

    fn deref(&self) -> &JsonFile {
        &*self.file
    }
}

impl DerefMut for FileGuard<'_> {
    fn deref_mut(&mut self) -> &mut JsonFile {
        &mut *self.file
    }
}

impl Drop for FileGuard<'_> {
    fn drop(&mut self) {
        if self.finished || !self.file.auto_save || std::thread::panicking() {
            return;
        }
        if let Err(err) = self.file.save() {
            tracing::error!(
                path = %self.file.path.display(),
                error = %err,
                "auto-save on scope exit failed"
            );
        }
    }
}
