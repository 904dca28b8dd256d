#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("prize catalog is empty")]
    EmptyCatalog,
    #[error("machine needs at least one reel")]
    NoReels,
    #[error("item height must be non-zero")]
    ZeroItemHeight,
    #[error("base spin duration must be non-zero")]
    ZeroDuration,
    #[error("reel stagger must be strictly increasing (reel {reel}: {prev}ms then {next}ms)")]
    StaggerNotIncreasing { reel: usize, prev: u64, next: u64 },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
