// crates/tally-chain/src/hardfork_property.rs
//
// Hardfork property: the running protocol version and the next scheduled one.

use chrono::{DateTime, Utc};

use tally_core::error::{Result, TallyError};
use tally_core::Version;

use crate::objects::HardforkPropertyObject;
use crate::service::{HardforkProperty, ServiceBase};

pub type HardforkPropertyService = ServiceBase<HardforkProperty>;

impl ServiceBase<HardforkProperty> {
    /// Create the property running `version` with nothing scheduled.
    pub fn create_property(&self, version: Version, now: DateTime<Utc>) -> Result<HardforkPropertyObject> {
        self.create(|| HardforkPropertyObject {
            current_hardfork_version: version,
            next_hardfork: version,
            next_hardfork_time: now,
        })
    }

    /// Schedule `version` to activate at `time`.
    ///
    /// # Errors
    /// `InvalidState` unless `version` is newer than the running one.
    pub fn schedule(&self, version: Version, time: DateTime<Utc>) -> Result<()> {
        self.update(|hf| {
            if version <= hf.current_hardfork_version {
                return Err(TallyError::InvalidState(format!(
                    "Hardfork {} is not newer than {}",
                    version, hf.current_hardfork_version
                )));
            }
            hf.next_hardfork = version;
            hf.next_hardfork_time = time;
            Ok(())
        })?;
        tracing::info!("Hardfork {} scheduled for {}", version, time);
        Ok(())
    }

    /// Activate the scheduled hardfork if its time has come.
    ///
    /// Returns the activated version, if any.
    pub fn activate_due(&self, now: DateTime<Utc>) -> Result<Option<Version>> {
        let activated = self.update(|hf| {
            if hf.next_hardfork > hf.current_hardfork_version && now >= hf.next_hardfork_time {
                hf.current_hardfork_version = hf.next_hardfork;
                Ok(Some(hf.current_hardfork_version))
            } else {
                Ok(None)
            }
        })?;
        if let Some(version) = activated {
            tracing::info!("Hardfork {} activated", version);
        }
        Ok(activated)
    }
}
