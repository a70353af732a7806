//! Tracked files compared against the remote.

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::report::DiffReport;
use cairn_core::{fingerprint_file, matches_checksum};

impl SyncEngine {
    /// Compares every tracked path (staged or committed) with the listing.
    ///
    /// Unreadable local files are reported as modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unreachable or the listing fails.
    pub async fn diff(&self) -> SyncResult<DiffReport> {
        self.tracked(async {
            self.ensure_reachable().await?;
            let mut remote = self.remote_index().await?;
            let mut report = DiffReport::default();

            for path in self.repo.tracked_paths() {
                let local = self.repo.context().local_path(&path);
                let object = remote.remove(&path);
                match (local.is_file(), object) {
                    (false, Some(_)) => report.deleted.push(path),
                    (false, None) => {}
                    (true, None) => report.added.push(path),
                    (true, Some(object)) => {
                        let same = match fingerprint_file(&local).await {
                            Ok(hash) => matches_checksum(&hash, object.checksum.as_deref()),
                            Err(err) => {
                                tracing::warn!(path = %path, error = %err, "cannot read file");
                                false
                            }
                        };
                        if !same {
                            report.modified.push(path);
                        }
                    }
                }
            }

            report.remote_only = remote.into_keys().collect();
            report.remote_only.sort();
            Ok(report)
        })
        .await
    }
}
