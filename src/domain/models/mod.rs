pub mod config;
pub mod post;
pub mod profile;

pub use config::{LoggingConfig, PoolConfig, RotationPolicy, ServerConfig, ServiceConfig};
pub use post::{Comment, NewComment, NewPost, Post, PostWithComments};
pub use profile::{Environment, ParseEnvironmentError, ProfileDefaults, SettingsProfile, TEST_DATABASE_URL};
