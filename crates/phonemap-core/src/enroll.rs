//! Enrollment: assign fake numbers to a list of real numbers.
//!
//! Numbers already mapped keep their fake; new ones get a generated fake that
//! collides neither with the store nor with the rest of the batch. New pairs
//! are written with one all-or-nothing batch insert.

use crate::errors::EnrollError;
use crate::generator::FakeNumberSpec;
use crate::phone;
use crate::store::MappingStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollStatus {
    New,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrolledPhone {
    pub real_phone: String,
    pub fake_phone: String,
    pub status: EnrollStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollReport {
    pub total: usize,
    pub new: usize,
    pub existing: usize,
    pub mappings: Vec<EnrolledPhone>,
}

/// Enroll the numbers of a one-per-line file.
pub fn enroll_file(
    store: &MappingStore,
    content: &str,
    spec: &FakeNumberSpec,
    clear_old: bool,
) -> Result<EnrollReport, EnrollError> {
    let phones = phone::parse_phone_list(content);
    enroll(store, &phones, spec, clear_old)
}

/// Enroll canonical real numbers. With `clear_old` the table is emptied first.
pub fn enroll(
    store: &MappingStore,
    real_phones: &[String],
    spec: &FakeNumberSpec,
    clear_old: bool,
) -> Result<EnrollReport, EnrollError> {
    if real_phones.is_empty() {
        return Err(EnrollError::NoValidPhones);
    }

    let mut existing: HashMap<String, String> = HashMap::new();
    let mut known_fakes: HashSet<String> = HashSet::new();
    if clear_old {
        let removed = store.clear_all()?;
        tracing::info!(removed, "cleared mappings before enrollment");
    } else {
        for m in store.list_all()? {
            known_fakes.insert(m.fake_phone.clone());
            existing.insert(m.real_phone, m.fake_phone);
        }
    }

    let mut seen = HashSet::new();
    let mut new_pairs = Vec::new();
    let mut mappings = Vec::with_capacity(real_phones.len());

    for real in real_phones {
        if !seen.insert(real.as_str()) {
            continue;
        }
        if let Some(fake) = existing.get(real) {
            mappings.push(EnrolledPhone {
                real_phone: real.clone(),
                fake_phone: fake.clone(),
                status: EnrollStatus::Existing,
            });
            continue;
        }

        let fake = spec.generate(&known_fakes)?;
        known_fakes.insert(fake.clone());
        new_pairs.push((real.clone(), fake.clone()));
        mappings.push(EnrolledPhone {
            real_phone: real.clone(),
            fake_phone: fake,
            status: EnrollStatus::New,
        });
    }

    if !new_pairs.is_empty() {
        store.insert_batch(&new_pairs)?;
    }

    let new = new_pairs.len();
    let total = mappings.len();
    tracing::info!(total, new, "enrollment finished");

    Ok(EnrollReport {
        total,
        new,
        existing: total - new,
        mappings,
    })
}
