use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::debug;
use trowel_vfs::{Format, SandboxedFs, VfsError, VfsResult};

/// Where a document lives: a directory and a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    dir: String,
    file_name: String,
}

impl DocumentPath {
    /// Split a `/`-separated path into directory and file name.
    ///
    /// A bare file name lives in `.`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let (dir, file_name) = match trimmed.rsplit_once('/') {
            Some(("", name)) => ("/", name),
            Some((dir, name)) => (dir, name),
            None => (".", trimmed),
        };
        Self {
            dir: dir.to_owned(),
            file_name: file_name.to_owned(),
        }
    }

    /// The containing directory.
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// The file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Directory and file name joined back together.
    #[must_use]
    pub fn joined(&self) -> String {
        match self.dir.as_str() {
            "." => self.file_name.clone(),
            "/" => format!("/{}", self.file_name),
            dir => format!("{dir}/{}", self.file_name),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

/// A typed value stored as a JSON or YAML file.
///
/// The location and storage handle are bookkeeping kept apart from the
/// data; serializing a document (through [`Serialize`], [`Document::to_value`]
/// or [`fmt::Display`]) only ever emits the data.
///
/// Setting a path picks the format from its extension (`.yaml`/`.yml` is
/// YAML, everything else JSON); [`Document::with_format`] overrides it.
#[derive(Debug, Clone)]
pub struct Document<T> {
    location: Option<DocumentPath>,
    format: Format,
    fs: Option<Arc<SandboxedFs>>,
    data: T,
}

impl<T> Document<T> {
    /// A JSON document holding `data`, with no path.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            location: None,
            format: Format::Json,
            fs: None,
            data,
        }
    }

    /// A JSON document holding `data`.
    #[must_use]
    pub fn json(data: T) -> Self {
        Self::new(data).with_format(Format::Json)
    }

    /// A YAML document holding `data`.
    #[must_use]
    pub fn yaml(data: T) -> Self {
        Self::new(data).with_format(Format::Yaml)
    }

    /// Set the path.
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.set_path(path);
        self
    }

    /// Set the format.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Read and write through `fs` instead of the host filesystem.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<SandboxedFs>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Set the path, picking the format from its extension.
    pub fn set_path(&mut self, path: &str) {
        self.format = Format::from_path(path);
        self.location = Some(DocumentPath::parse(path));
    }

    /// The full path, if set.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        self.location.as_ref().map(DocumentPath::joined)
    }

    /// The location, if set.
    #[must_use]
    pub fn location(&self) -> Option<&DocumentPath> {
        self.location.as_ref()
    }

    /// The storage format.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The attached facade, if any.
    #[must_use]
    pub fn fs(&self) -> Option<&Arc<SandboxedFs>> {
        self.fs.as_ref()
    }

    /// The data.
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable access to the data.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Take the data, dropping the bookkeeping.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    fn require_path(&self) -> VfsResult<String> {
        self.path().ok_or(VfsError::NoPath)
    }
}

impl<T: Default> Document<T> {
    /// An empty document bound to `path`.
    #[must_use]
    pub fn at(path: &str) -> Self {
        Self::new(T::default()).with_path(path)
    }
}

impl<T: Default> Default for Document<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: DeserializeOwned> Document<T> {
    /// Replace the data with the parsed content of the file at the path.
    ///
    /// A blank file decodes to nothing and leaves the data as it was.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NoPath`] without a path, [`VfsError::NotFound`]
    /// if the file is missing and [`VfsError::Parse`] if it is malformed.
    pub async fn load(&mut self) -> VfsResult<()> {
        let path = self.require_path()?;
        let text = match &self.fs {
            Some(fs) => fs
                .read_text(&path)
                .await?
                .ok_or_else(|| VfsError::NotFound(path.clone()))?,
            None => match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(VfsError::NotFound(path));
                },
                Err(e) => return Err(e.into()),
            },
        };

        if text.trim().is_empty() {
            debug!(path = %path, "document is blank, keeping data");
            return Ok(());
        }

        self.data = self.format.decode(&text, &path)?;
        debug!(path = %path, format = %self.format, "loaded document");
        Ok(())
    }

    /// Set the path, then [`Document::load`].
    ///
    /// # Errors
    ///
    /// As [`Document::load`].
    pub async fn load_from(&mut self, path: &str) -> VfsResult<()> {
        self.set_path(path);
        self.load().await
    }
}

impl<T: Serialize> Document<T> {
    /// The data as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Encode`] if the data cannot be serialized.
    pub fn to_value(&self) -> VfsResult<serde_json::Value> {
        serde_json::to_value(&self.data).map_err(|e| VfsError::Encode {
            format: Format::Json,
            message: e.to_string(),
        })
    }

    /// The data as canonical text in the document's format.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Encode`] if the data cannot be serialized.
    pub fn to_text(&self) -> VfsResult<String> {
        self.format.encode(&self.data)
    }

    /// Write the data to the path.
    ///
    /// Through a facade an existing file is overwritten and a missing one
    /// created. On the host filesystem parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NoPath`] without a path, otherwise any encoding
    /// or storage error.
    pub async fn save(&self) -> VfsResult<()> {
        let path = self.require_path()?;
        let text = self.to_text()?;

        match &self.fs {
            Some(fs) => {
                if fs.exists(&path).await {
                    fs.overwrite_text(&path, &text).await?;
                } else {
                    fs.create_text(&path, &text).await?;
                }
            },
            None => {
                if let Some(parent) = Path::new(&path).parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, text.as_bytes()).await?;
            },
        }

        debug!(path = %path, format = %self.format, "saved document");
        Ok(())
    }
}

impl<T: Clone> Document<T> {
    /// A copy bound to `path`. Nothing is written and `self` is untouched.
    #[must_use]
    pub fn save_as(&self, path: &str) -> Self {
        self.clone().with_path(path)
    }
}

impl<T> Deref for Document<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Document<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T: Serialize> Serialize for Document<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

/// Renders [`Document::to_text`], or the encoding error when the data has
/// no representation in the document's format.
impl<T: Serialize> fmt::Display for Document<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(&text),
            Err(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        limits: BTreeMap<String, u32>,
    }

    fn sample() -> Settings {
        Settings {
            name: "demo".into(),
            tags: vec!["a".into(), "b".into()],
            limits: BTreeMap::from([("files".into(), 10)]),
        }
    }

    #[test]
    fn test_document_path_parse() {
        let p = DocumentPath::parse("a/b/c.json");
        assert_eq!((p.dir(), p.file_name()), ("a/b", "c.json"));
        assert_eq!(p.joined(), "a/b/c.json");

        let bare = DocumentPath::parse("c.json");
        assert_eq!(bare.dir(), ".");
        assert_eq!(bare.joined(), "c.json");

        let rooted = DocumentPath::parse("/c.json");
        assert_eq!(rooted.dir(), "/");
        assert_eq!(rooted.to_string(), "/c.json");
    }

    #[test]
    fn test_path_sets_format() {
        let doc = Document::<Settings>::at("conf/app.yml");
        assert_eq!(doc.format(), Format::Yaml);
        let doc = doc.with_path("conf/app.json");
        assert_eq!(doc.format(), Format::Json);
        assert_eq!(doc.path().as_deref(), Some("conf/app.json"));
    }

    #[test]
    fn test_serialization_projects_only_data() {
        let doc = Document::new(sample()).with_path("secret/location.json");
        let value = doc.to_value().unwrap();
        assert_eq!(value, json!({"name": "demo", "tags": ["a", "b"], "limits": {"files": 10}}));

        let direct = serde_json::to_string(&doc).unwrap();
        assert!(!direct.contains("secret"));
        assert!(doc.to_string().starts_with("{\n  \"name\": \"demo\""));
    }

    #[test]
    fn test_save_as_leaves_original_untouched() {
        let original = Document::new(sample()).with_path("a.json");
        let mut copy = original.save_as("b/c.yaml");
        copy.name = "changed".into();

        assert_eq!(original.path().as_deref(), Some("a.json"));
        assert_eq!(original.name, "demo");
        assert_eq!(copy.path().as_deref(), Some("b/c.yaml"));
        assert_eq!(copy.format(), Format::Yaml);
    }

    #[tokio::test]
    async fn test_load_and_save_require_a_path() {
        let mut doc = Document::new(sample());
        assert!(matches!(doc.load().await, Err(VfsError::NoPath)));
        assert!(matches!(doc.save().await, Err(VfsError::NoPath)));
    }

    #[tokio::test]
    async fn test_host_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let path = path.to_str().unwrap();

        Document::new(sample()).with_path(path).save().await.unwrap();
        let mut loaded = Document::<Settings>::at(path);
        loaded.load().await.unwrap();
        assert_eq!(loaded.data(), &sample());
    }

    #[tokio::test]
    async fn test_host_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let mut doc = Document::<Settings>::default();
        let err = doc.load_from(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_facade_round_trip_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(SandboxedFs::new(dir.path(), true).unwrap());

        let doc = Document::new(sample()).with_path("conf/app.yaml").with_fs(fs.clone());
        doc.save().await.unwrap();
        doc.save().await.unwrap();

        let text = fs.read_text("conf/app.yaml").await.unwrap().unwrap();
        assert!(text.starts_with("name: demo\n"), "{text}");

        let mut fresh = Document::<Settings>::at("conf/app.yaml").with_fs(fs);
        fresh.load().await.unwrap();
        assert_eq!(fresh.into_data(), sample());
    }

    #[test]
    fn test_display_survives_unencodable_data() {
        let doc = Document::new(BTreeMap::from([(vec![1u8], 1u8)]));
        assert!(matches!(doc.to_text(), Err(VfsError::Encode { .. })));

        let rendered = doc.to_string();
        assert!(rendered.starts_with("Failed to encode JSON"), "{rendered}");
    }

    #[tokio::test]
    async fn test_blank_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(SandboxedFs::new(dir.path(), true).unwrap());
        fs.create_text("empty.json", "").await.unwrap();
        fs.create_text("spaces.yaml", "  \n\t\n").await.unwrap();

        let mut doc = Document::new(sample()).with_path("empty.json").with_fs(fs.clone());
        doc.load().await.unwrap();
        assert_eq!(doc.data(), &sample());

        let mut yaml = Document::<Settings>::at("spaces.yaml").with_fs(fs);
        yaml.load().await.unwrap();
        assert_eq!(yaml.into_data(), Settings::default());

        let host = dir.path().join("empty.json");
        let mut raw = Document::new(sample());
        raw.load_from(host.to_str().unwrap()).await.unwrap();
        assert_eq!(raw.data(), &sample());
    }

    #[tokio::test]
    async fn test_load_replaces_data() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(SandboxedFs::new(dir.path(), true).unwrap());
        fs.create_text("s.json", r#"{"name": "from-disk"}"#).await.unwrap();

        let mut doc = Document::new(sample()).with_path("s.json").with_fs(fs);
        doc.load().await.unwrap();
        assert_eq!(doc.name, "from-disk");
        assert!(doc.tags.is_empty());
    }
}
