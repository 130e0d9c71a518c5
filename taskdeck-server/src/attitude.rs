//! Attitude transitions on the resource ledger.
//!
//! Each (resource, user) pair is in exactly one of `up`, `down`, or `none`
//! at any time; `none` is the absence state. A transition adjusts both
//! affected counters inside a single write-lock critical section, so the
//! counters always equal the number of users currently in each state and
//! an `up -> down` switch never exposes an intermediate `none`.

use taskdeck_core::resource::{Attitude, ResourceId};

use crate::error::EngineError;
use crate::resources::ResourceLedger;

impl ResourceLedger {
    /// Sets a user's attitude toward a resource, returning the previous
    /// state. Repeating the current state is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn set_attitude(
        &self,
        id: ResourceId,
        user: &str,
        target: Attitude,
    ) -> Result<Attitude, EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::ResourceNotFound)?;

        let current = record
            .attitudes
            .get(user)
            .copied()
            .unwrap_or(Attitude::None);
        if current == target {
            return Ok(current);
        }

        match current {
            Attitude::Up => record.up -= 1,
            Attitude::Down => record.down -= 1,
            Attitude::None => {}
        }
        match target {
            Attitude::Up => record.up += 1,
            Attitude::Down => record.down += 1,
            Attitude::None => {}
        }
        if target == Attitude::None {
            record.attitudes.remove(user);
        } else {
            record.attitudes.insert(user.to_string(), target);
        }

        debug_assert_eq!(
            record.up as usize,
            record
                .attitudes
                .values()
                .filter(|a| **a == Attitude::Up)
                .count()
        );
        debug_assert_eq!(
            record.down as usize,
            record
                .attitudes
                .values()
                .filter(|a| **a == Attitude::Down)
                .count()
        );
        drop(records);

        tracing::debug!(resource_id = %id, user = %user, attitude = %target, "attitude set");
        Ok(current)
    }

    /// Returns a user's current attitude toward a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn attitude_of(&self, id: ResourceId, user: &str) -> Result<Attitude, EngineError> {
        let records = self.records.read().await;
        let record = records.get(&id).ok_or(EngineError::ResourceNotFound)?;
        Ok(record
            .attitudes
            .get(user)
            .copied()
            .unwrap_or(Attitude::None))
    }
}
