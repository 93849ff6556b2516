//! JSON container

use super::{FormatError, SourceBank, FIELD_NAMES, FORMAT_VERSION};
use crate::models::SourceSite;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct JsonBankRef<'a> {
    version: u16,
    max_particles: u64,
    seen_count: u64,
    source_bank: &'a [SourceSite],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonBank {
    version: u16,
    max_particles: u64,
    seen_count: u64,
    source_bank: Vec<SourceSite>,
}

/// JSON has no NaN or infinity; serde_json would write them as `null`
fn check_finite(sites: &[SourceSite]) -> Result<(), FormatError> {
    for (index, site) in sites.iter().enumerate() {
        if let Some((field, _)) = FIELD_NAMES
            .iter()
            .copied()
            .zip(site.values())
            .find(|(_, v)| !v.is_finite())
        {
            return Err(FormatError::NonFinite { index, field });
        }
    }
    Ok(())
}

pub(super) fn encode(bank: &SourceBank) -> Result<Vec<u8>, FormatError> {
    check_finite(&bank.sites)?;
    let doc = JsonBankRef {
        version: FORMAT_VERSION,
        max_particles: bank.max_particles,
        seen_count: bank.seen_count,
        source_bank: &bank.sites,
    };
    serde_json::to_vec_pretty(&doc).map_err(|e| FormatError::Json(e.to_string()))
}

pub(super) fn decode(bytes: &[u8]) -> Result<SourceBank, FormatError> {
    let doc: JsonBank =
        serde_json::from_slice(bytes).map_err(|e| FormatError::Json(e.to_string()))?;
    if doc.version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(doc.version));
    }
    Ok(SourceBank {
        max_particles: doc.max_particles,
        seen_count: doc.seen_count,
        sites: doc.source_bank,
    })
}
