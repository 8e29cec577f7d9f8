//! Wake-method validation gate for alarm creation.

use std::collections::{BTreeMap, BTreeSet};

use crate::alarm::{MediaRef, WakeMethod};
use crate::error::ValidationError;

/// Check that at least one method is selected and every selected method has
/// media attached.
///
/// Missing methods are reported in canonical order (voice, video, song,
/// puzzle). Media attached to unselected methods is ignored.
pub fn validate(
    selected: &BTreeSet<WakeMethod>,
    media: &BTreeMap<WakeMethod, MediaRef>,
) -> Result<(), ValidationError> {
    if selected.is_empty() {
        return Err(ValidationError::NoMethodSelected);
    }

    let missing: Vec<WakeMethod> = selected
        .iter()
        .filter(|m| !media.contains_key(m))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingMedia(missing))
    }
}
