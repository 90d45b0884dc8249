use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};

use crate::urlnorm::{self, CanonicalUrl};

const METADATA_HEADER: &str = "url\tpath\tcontent_type\n";
const MAX_NAME_LEN: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Html,
    File,
}

impl Classification {
    fn prefix(self) -> &'static str {
        match self {
            Classification::Html => "html",
            Classification::File => "file",
        }
    }

    fn dir(self) -> &'static str {
        match self {
            Classification::Html => "html",
            Classification::File => "files",
        }
    }
}

/// HTML unless the server said otherwise: a `Content-Type` containing
/// `text/html` (any case) or an absent header classifies as HTML.
pub fn classify(content_type: &str) -> Classification {
    if content_type.is_empty() || content_type.to_ascii_lowercase().contains("text/html") {
        Classification::Html
    } else {
        Classification::File
    }
}

/// Deterministic on-disk name for a fetched URL.
///
/// `ext_tag` is the URL-derived extension without its dot (may be empty).
/// Collisions after truncation are possible and accepted; later writes win.
pub fn artifact_name(classification: Classification, url: &CanonicalUrl, ext_tag: &str) -> String {
    let path = if url.path.is_empty() || url.path == "/" {
        "/index"
    } else {
        url.path.as_str()
    };
    let safe_path = path.replace('/', "_");

    let mut name = format!("{}__{}{}", classification.prefix(), url.host, safe_path);

    let chosen_ext = match classification {
        Classification::Html => ".html".to_string(),
        Classification::File => {
            if ext_tag.is_empty() {
                ".bin".to_string()
            } else {
                format!(".{ext_tag}")
            }
        }
    };
    if !name.contains(&chosen_ext) {
        name.push_str(&chosen_ext);
    }

    let mut sanitized = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            sanitized.push(c);
            in_run = false;
        } else if !in_run {
            sanitized.push('_');
            in_run = true;
        }
    }

    sanitized.truncate(MAX_NAME_LEN);
    sanitized
}

pub struct PersistedArtifact {
    /// Path relative to the output root, always forward-slashed.
    pub relative_path: String,
    pub classification: Classification,
}

/// Filesystem writer plus metadata appender for one output root.
///
/// Layout: `<root>/html/` for pages, `<root>/files/` for everything else,
/// and `<root>/metadata.tsv` with one tab-separated record per successful
/// fetch. The metadata file gets its header only when the sink creates it.
pub struct Sink {
    root: PathBuf,
    metadata: Mutex<fs::File>,
}

impl Sink {
    pub fn new(root: &Path) -> Result<Self> {
        for sub in ["html", "files"] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
        }

        let metadata_path = root.join("metadata.tsv");
        let fresh = !metadata_path.exists();
        let mut metadata = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&metadata_path)
            .with_context(|| format!("failed to open metadata log: {}", metadata_path.display()))?;
        if fresh {
            metadata
                .write_all(METADATA_HEADER.as_bytes())
                .context("failed to write metadata header")?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            metadata: Mutex::new(metadata),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one fetched body and append its metadata record.
    ///
    /// Write failures are fatal for the calling worker; the metadata line is
    /// only appended once the artifact is on disk, so every record points at
    /// an existing file.
    pub fn persist(
        &self,
        url: &CanonicalUrl,
        body: &[u8],
        content_type: &str,
    ) -> Result<PersistedArtifact> {
        let canonical = url.to_string();
        let classification = classify(content_type);
        let name = artifact_name(classification, url, &urlnorm::extension(&canonical));
        let relative_path = format!("{}/{}", classification.dir(), name);

        write_atomic(&self.root.join(classification.dir()).join(&name), body)?;

        let line = format!("{canonical}\t{relative_path}\t{content_type}\n");
        {
            let mut file = self.metadata.lock().unwrap();
            file.write_all(line.as_bytes())
                .context("failed to append metadata record")?;
        }

        Ok(PersistedArtifact {
            relative_path,
            classification,
        })
    }
}

/// Whole-file write via a temp file + rename, so a worker killed mid-write
/// never leaves a torn artifact. Rename overwrites on name collision.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path has no parent: {}", path.display()))?;

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("out.bin");
    let tmp_path = parent.join(format!(".{file_name}.tmp"));

    {
        let mut f = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("failed to write temp file: {}", tmp_path.display()))?;
        f.flush().ok();
    }

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to replace {} with temp file {}",
            path.display(),
            tmp_path.display()
        )
    })?;
    Ok(())
}
