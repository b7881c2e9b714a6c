use crate::feature::{Candidate, FeatureVector};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const RECORDS_FILE: &str = "curvatures.bin";

/// One enrolled feature vector of an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub item: String,
    pub features: FeatureVector,
}

/// Identity labels name a single directory directly under the store prefix.
fn identity_store_path(prefix: &Path, identity: &str) -> Result<PathBuf> {
    if identity.is_empty()
        || identity == "."
        || identity == ".."
        || identity.contains(['/', '\\'])
    {
        anyhow::bail!("invalid identity label {:?}", identity);
    }
    let mut p = prefix.to_path_buf();
    p.push(identity);
    Ok(p)
}

pub fn load_records(prefix: &Path, identity: &str) -> Result<Vec<FeatureRecord>> {
    let file = identity_store_path(prefix, identity)?.join(RECORDS_FILE);

    if !file.exists() {
        return Ok(vec![]);
    }

    let data = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    postcard::from_bytes(&data).with_context(|| format!("decoding {}", file.display()))
}

/// Append a record. Item labels are unique across the whole store.
pub fn save_record(prefix: &Path, identity: &str, record: FeatureRecord) -> Result<()> {
    let path = identity_store_path(prefix, identity)?;
    if let Some(existing) = load_candidates(prefix)?
        .into_iter()
        .find(|c| c.item == record.item)
    {
        anyhow::bail!(
            "item {} is already enrolled for {}",
            record.item,
            existing.identity
        );
    }
    std::fs::create_dir_all(&path)?;
    let mut records = load_records(prefix, identity)?;
    records.push(record);
    let file = path.join(RECORDS_FILE);
    let data = postcard::to_allocvec(&records)?;
    std::fs::write(&file, data).with_context(|| format!("writing {}", file.display()))?;
    Ok(())
}

pub fn purge(prefix: &Path, identity: &str) -> Result<()> {
    let path = identity_store_path(prefix, identity)?;
    if path.exists() {
        std::fs::remove_dir_all(&path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}

/// Every enrolled record as a candidate, identities in name order.
pub fn load_candidates(prefix: &Path) -> Result<Vec<Candidate>> {
    if !prefix.exists() {
        return Ok(vec![]);
    }

    let mut identities = Vec::new();
    for entry in std::fs::read_dir(prefix).with_context(|| format!("listing {}", prefix.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            identities.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    identities.sort();

    let mut candidates = Vec::new();
    for identity in identities {
        for record in load_records(prefix, &identity)? {
            candidates.push(Candidate {
                item: record.item,
                identity: identity.clone(),
                features: record.features,
            });
        }
    }
    Ok(candidates)
}
