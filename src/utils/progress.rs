//! Progress bar abstraction that becomes no-op when the `progress` feature is disabled

#[cfg(feature = "progress")]
pub use indicatif::ProgressBar;

#[cfg(not(feature = "progress"))]
pub use self::noop::*;

#[cfg(not(feature = "progress"))]
mod noop {
    /// No-op progress bar when `progress` feature is disabled
    #[derive(Clone)]
    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new(_len: u64) -> Self {
            ProgressBar
        }

        pub fn set_message(&self, _msg: impl Into<std::borrow::Cow<'static, str>>) {}
        pub fn inc(&self, _delta: u64) {}
        pub fn finish_and_clear(&self) {}
    }
}
