pub mod browser;
pub mod configurator;
pub mod diagnostics;
pub mod droid;
pub mod enricher;
#[cfg(test)]
pub(crate) mod fixture_browser;
pub mod governor;
pub mod harvester;
pub mod pipeline;
pub mod provider_probe;
pub mod session;

pub use browser::*;
pub use diagnostics::*;
pub use droid::*;
pub use pipeline::*;
pub use provider_probe::*;
