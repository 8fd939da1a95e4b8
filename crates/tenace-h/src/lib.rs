pub mod cdp;
pub mod driver;
pub mod inject;
pub mod snapshot;

pub use cdp::LaunchOptions;
pub use driver::HeadlessDriver;
pub use snapshot::ScreenshotCapture;
