use crate::upload::types::FileData;
use std::collections::HashSet;

/// Intake policy for candidate files.
///
/// All three limits are independent configuration points; the defaults match
/// the hosted widget configuration.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    pub max_file_size: u64,
    pub accepted_types: HashSet<String>,
    pub max_files_per_batch: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        let accepted_types = [
            "image/jpeg",
            "image/jpg",
            "image/png",
            "image/gif",
            "image/webp",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        Self {
            max_file_size: 5 * 1024 * 1024,
            accepted_types,
            max_files_per_batch: 500,
        }
    }
}

impl IntakePolicy {
    fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / (1024.0 * 1024.0)
    }
}

/// Why a candidate was refused at intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    TooLarge,
    InvalidType,
    /// Raw reason passed through the generic message format (used for
    /// batch-count overflow, where the whole batch is refused).
    Other(String),
}

/// A refused candidate and the reason, convertible to the user-facing
/// message shown in the rejection banner.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub file_name: String,
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn message(&self, policy: &IntakePolicy) -> String {
        match &self.reason {
            RejectionReason::TooLarge => format!(
                "{} is too large (max {}MB)",
                self.file_name,
                policy.max_file_size_mb()
            ),
            RejectionReason::InvalidType => {
                format!("{} has an invalid file type", self.file_name)
            }
            RejectionReason::Other(raw) => format!("{}: {}", self.file_name, raw),
        }
    }
}

/// Classify candidates against the policy.
///
/// Accepted files pass through untouched; rejected ones carry a reason. No
/// other state is read or mutated, and the same partition runs whether the
/// candidates came from a drop, a file picker, or a clipboard paste.
pub fn partition(
    candidates: Vec<FileData>,
    policy: &IntakePolicy,
) -> (Vec<FileData>, Vec<Rejection>) {
    if candidates.len() > policy.max_files_per_batch {
        // An oversized batch is refused wholesale, the way the drop zone
        // treats its max-files limit.
        let rejections = candidates
            .into_iter()
            .map(|candidate| Rejection {
                file_name: candidate.name,
                reason: RejectionReason::Other("Too many files".to_string()),
            })
            .collect();
        return (Vec::new(), rejections);
    }

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        if !policy.accepted_types.contains(&candidate.mime_type) {
            rejected.push(Rejection {
                file_name: candidate.name,
                reason: RejectionReason::InvalidType,
            });
        } else if candidate.size() > policy.max_file_size {
            rejected.push(Rejection {
                file_name: candidate.name,
                reason: RejectionReason::TooLarge,
            });
        } else {
            accepted.push(candidate);
        }
    }

    (accepted, rejected)
}
