use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cannot reach the release index: {0}\n\n\
             Hint: Check your network connection, or point mrfeature at a mirror:\n\
             MRFEATURE_INDEX_URL=https://example.com/releases mrfeature install <project>")]
    Network(String),

    #[error("Release index could not be parsed: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Malformed package metadata in {path}: {reason}")]
    MalformedMetadata { path: String, reason: String },

    #[error("Malformed version string '{0}'")]
    MalformedVersion(String),

    #[error("Manifest error: {0}\n\n\
             Hint: Open the project once in the Unity editor so that\n\
             Packages/manifest.json is created, then run mrfeature again.")]
    Manifest(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("'{0}' is not a valid Unity project directory\n\n\
             Hint: The project root must contain both an Assets/ and a Packages/ folder.\n\n\
             Example structure:\n\
             MyProject/\n\
             ├── Assets/\n\
             ├── Packages/\n\
             │   └── manifest.json\n\
             └── ProjectSettings/")]
    InvalidProject(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}
