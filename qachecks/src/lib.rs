//! The conditions and checks fontqa ships with.
//!
//! Everything is registered into a [`qaengine::Registry`] by [`register_all`].

pub mod conditions;
pub mod coverage;
pub mod family;
pub mod glyphs;
pub mod metrics;
pub mod names;
pub mod outline;
pub mod tables;
#[cfg(test)]
mod test_util;
pub mod util;
pub mod varfont;

use qaengine::{ConfigError, Registry};

/// Register every built-in condition and check.
pub fn register_all(registry: &mut Registry) -> Result<(), ConfigError> {
    conditions::register(registry)?;
    metrics::register(registry)?;
    family::register(registry)?;
    outline::register(registry)?;
    tables::register(registry)?;
    coverage::register(registry)?;
    names::register(registry)?;
    varfont::register(registry)?;
    registry.validate()
}
