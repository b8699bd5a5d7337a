pub mod config;
pub mod events;
pub mod library;
pub mod listener;
pub mod logging;
pub mod paths;
pub mod rescan;

pub use config::{
    Config, ConfigError, ListenerMethod, LmsSection, LogLevel, LoggingConfig, ServerConfig,
    ValidationError,
};
pub use events::{AlbumImport, EventDispatcher, EventKind, ImportEvent, ImportListener};
pub use library::{relative_album_path, PathResolutionError, RelativePath};
pub use listener::{RescanListener, RescanOutcome};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use rescan::{ClientError, ClientResult, RescanTarget};

pub const APP_NAME: &str = "lms-notify";
pub const APP_AUTHOR: &str = "LmsNotify";
pub const APP_QUALIFIER: &str = "io";
