//! Transactional reordering of test case steps.
//!
//! The sequencer is the only writer of `order_index`. Every reorder runs in
//! one SQLite transaction and either applies completely or not at all; after
//! any successful call no two steps of the case share an index.

use crate::db::Database;
use crate::types::StepPosition;
use crate::{Error, Result};
use rusqlite::params;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use tracing::debug;

/// Default upper bound on waiting for the store lock before a reorder
/// gives up with `StoreTimeout`.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Applies reorder proposals against the shared store
#[derive(Clone)]
pub struct StepSequencer {
    db: Database,
    lock_timeout: Duration,
}

impl StepSequencer {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(db: Database, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }

    /// Apply a proposed ordering to a test case.
    ///
    /// Steps not mentioned keep their index. The resulting assignment must be
    /// duplicate-free or the whole call fails with `DuplicateOrderIndex`;
    /// swaps therefore submit the full set of affected steps.
    pub fn reorder(&self, test_case_id: i64, proposed: &[StepPosition]) -> Result<()> {
        self.apply(None, test_case_id, proposed)
    }

    /// Suite-scoped variant: additionally fails with `TestCaseNotFound` when
    /// the case does not belong to the claimed suite.
    pub fn reorder_in_suite(
        &self,
        suite_id: i64,
        test_case_id: i64,
        proposed: &[StepPosition],
    ) -> Result<()> {
        self.apply(Some(suite_id), test_case_id, proposed)
    }

    fn apply(
        &self,
        suite_id: Option<i64>,
        test_case_id: i64,
        proposed: &[StepPosition],
    ) -> Result<()> {
        validate_proposal(proposed)?;

        let conn = self.db.connection();
        let mut conn = conn
            .try_lock_for(self.lock_timeout)
            .ok_or(Error::StoreTimeout {
                ms: self.lock_timeout.as_millis() as u64,
            })?;
        // Dropping the transaction without commit rolls back, so every early
        // return below leaves the stored order untouched.
        let tx = conn.transaction()?;

        let case_exists: i64 = match suite_id {
            Some(suite_id) => tx.query_row(
                "SELECT COUNT(*) FROM test_cases WHERE id = ?1 AND suite_id = ?2",
                params![test_case_id, suite_id],
                |row| row.get(0),
            )?,
            None => tx.query_row(
                "SELECT COUNT(*) FROM test_cases WHERE id = ?1",
                params![test_case_id],
                |row| row.get(0),
            )?,
        };
        if case_exists == 0 {
            return Err(Error::TestCaseNotFound { id: test_case_id });
        }

        // Current assignment, keyed by step id
        let mut assignment: BTreeMap<i64, i64> = BTreeMap::new();
        {
            let mut stmt =
                tx.prepare("SELECT id, order_index FROM test_steps WHERE test_case_id = ?1")?;
            let rows = stmt.query_map(params![test_case_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (id, index) = row?;
                assignment.insert(id, index);
            }
        }

        // Overlay the proposal; every mentioned step must belong to the case
        for position in proposed {
            if !assignment.contains_key(&position.id) {
                return Err(Error::StepNotFound {
                    id: position.id,
                    test_case_id,
                });
            }
            assignment.insert(position.id, position.order_index);
        }

        // The resulting assignment must be a valid ordering
        let mut seen: BTreeSet<i64> = BTreeSet::new();
        for index in assignment.values() {
            if !seen.insert(*index) {
                return Err(Error::DuplicateOrderIndex {
                    order_index: *index,
                });
            }
        }

        for position in proposed {
            tx.execute(
                "UPDATE test_steps SET order_index = ?1 WHERE id = ?2 AND test_case_id = ?3",
                params![position.order_index, position.id, test_case_id],
            )?;
        }
        tx.commit()?;

        debug!(
            "Reordered {} steps in test case {}",
            proposed.len(),
            test_case_id
        );
        Ok(())
    }
}

/// Parse a reorder payload: a JSON array of `{id, order_index}` objects.
///
/// Rejects non-arrays, malformed entries, and repeated step ids without
/// touching the store.
pub fn parse_reorder_payload(payload: &serde_json::Value) -> Result<Vec<StepPosition>> {
    let entries = payload.as_array().ok_or_else(|| {
        Error::InvalidPayload("expected a JSON array of {id, order_index} objects".to_string())
    })?;

    let mut proposed = Vec::with_capacity(entries.len());
    for entry in entries {
        let position: StepPosition = serde_json::from_value(entry.clone())
            .map_err(|e| Error::InvalidPayload(format!("malformed reorder entry: {}", e)))?;
        proposed.push(position);
    }
    validate_proposal(&proposed)?;
    Ok(proposed)
}

fn validate_proposal(proposed: &[StepPosition]) -> Result<()> {
    let mut seen = HashSet::with_capacity(proposed.len());
    for position in proposed {
        if !seen.insert(position.id) {
            return Err(Error::InvalidPayload(format!(
                "step id {} appears more than once",
                position.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCatalog;
    use crate::types::NewStep;
    use serde_json::json;

    fn db_with_steps(count: usize) -> (Database, i64, Vec<i64>) {
        let db = Database::open_memory().unwrap();
        db.seed_action_types(&ActionCatalog::builtin()).unwrap();
        let suite = db.create_suite("smoke", None).unwrap();
        let case = db.create_case(suite.id, "flow", None).unwrap();

        let mut ids = Vec::new();
        for i in 0..count {
            let step = db
                .create_step(
                    case.id,
                    &NewStep {
                        action: "navigate".to_string(),
                        input_value: Some(format!("https://example.com/{}", i)),
                        ..Default::default()
                    },
                )
                .unwrap();
            ids.push(step.id);
        }
        (db, case.id, ids)
    }

    fn indices(db: &Database, case_id: i64) -> Vec<(i64, i64)> {
        db.list_steps(case_id)
            .unwrap()
            .iter()
            .map(|s| (s.id, s.order_index))
            .collect()
    }

    #[test]
    fn test_full_reverse_reorder() {
        let (db, case_id, ids) = db_with_steps(3);
        let sequencer = StepSequencer::new(db.clone());

        sequencer
            .reorder(
                case_id,
                &[
                    StepPosition { id: ids[0], order_index: 2 },
                    StepPosition { id: ids[1], order_index: 1 },
                    StepPosition { id: ids[2], order_index: 0 },
                ],
            )
            .unwrap();

        assert_eq!(
            indices(&db, case_id),
            vec![(ids[2], 0), (ids[1], 1), (ids[0], 2)]
        );
    }

    #[test]
    fn test_partial_reorder_keeps_unmentioned_steps() {
        let (db, case_id, ids) = db_with_steps(3);
        let sequencer = StepSequencer::new(db.clone());

        // Move the last step to the front without renumbering the others
        sequencer
            .reorder(
                case_id,
                &[
                    StepPosition { id: ids[2], order_index: -1 },
                ],
            )
            .unwrap();

        assert_eq!(
            indices(&db, case_id),
            vec![(ids[2], -1), (ids[0], 0), (ids[1], 1)]
        );
    }

    #[test]
    fn test_partial_reorder_with_collision_is_rejected_atomically() {
        let (db, case_id, ids) = db_with_steps(3);
        let sequencer = StepSequencer::new(db.clone());
        let before = indices(&db, case_id);

        // Overlay {ids[2]:0, ids[0]:1} onto {0,1,2}: ids[1] still holds 1
        let result = sequencer.reorder(
            case_id,
            &[
                StepPosition { id: ids[2], order_index: 0 },
                StepPosition { id: ids[0], order_index: 1 },
            ],
        );
        assert!(matches!(
            result,
            Err(Error::DuplicateOrderIndex { order_index: 0 }) | Err(Error::DuplicateOrderIndex { order_index: 1 })
        ));
        // Nothing written
        assert_eq!(indices(&db, case_id), before);

        // The full-set form of the same intent succeeds
        sequencer
            .reorder(
                case_id,
                &[
                    StepPosition { id: ids[2], order_index: 0 },
                    StepPosition { id: ids[0], order_index: 1 },
                    StepPosition { id: ids[1], order_index: 2 },
                ],
            )
            .unwrap();
        assert_eq!(
            indices(&db, case_id),
            vec![(ids[2], 0), (ids[0], 1), (ids[1], 2)]
        );
    }

    #[test]
    fn test_swap_requires_both_steps() {
        let (db, case_id, ids) = db_with_steps(2);
        let sequencer = StepSequencer::new(db.clone());

        sequencer
            .reorder(
                case_id,
                &[
                    StepPosition { id: ids[0], order_index: 1 },
                    StepPosition { id: ids[1], order_index: 0 },
                ],
            )
            .unwrap();
        assert_eq!(indices(&db, case_id), vec![(ids[1], 0), (ids[0], 1)]);
    }

    #[test]
    fn test_unknown_step_id_rejected_before_any_write() {
        let (db, case_id, ids) = db_with_steps(2);
        let sequencer = StepSequencer::new(db.clone());
        let before = indices(&db, case_id);

        let result = sequencer.reorder(
            case_id,
            &[
                StepPosition { id: ids[0], order_index: 5 },
                StepPosition { id: 424242, order_index: 6 },
            ],
        );
        assert!(matches!(
            result,
            Err(Error::StepNotFound { id: 424242, .. })
        ));
        assert_eq!(indices(&db, case_id), before);
    }

    #[test]
    fn test_case_scoping() {
        let (db, case_id, ids) = db_with_steps(1);
        let sequencer = StepSequencer::new(db.clone());

        assert!(matches!(
            sequencer.reorder(9999, &[StepPosition { id: ids[0], order_index: 0 }]),
            Err(Error::TestCaseNotFound { id: 9999 })
        ));

        // Suite-scoped variant rejects the wrong suite
        let other = db.create_suite("other", None).unwrap();
        assert!(matches!(
            sequencer.reorder_in_suite(other.id, case_id, &[]),
            Err(Error::TestCaseNotFound { .. })
        ));

        let suites = db.list_suites().unwrap();
        let owning = suites.iter().find(|s| s.name == "smoke").unwrap();
        sequencer
            .reorder_in_suite(
                owning.id,
                case_id,
                &[StepPosition { id: ids[0], order_index: 3 }],
            )
            .unwrap();
        assert_eq!(indices(&db, case_id), vec![(ids[0], 3)]);
    }

    #[test]
    fn test_duplicate_payload_ids_rejected_without_store_access() {
        let proposal = vec![
            StepPosition { id: 1, order_index: 0 },
            StepPosition { id: 1, order_index: 1 },
        ];
        assert!(matches!(
            validate_proposal(&proposal),
            Err(Error::InvalidPayload(_))
        ));

        let (db, case_id, _) = db_with_steps(2);
        let sequencer = StepSequencer::new(db.clone());
        let before = indices(&db, case_id);
        assert!(sequencer.reorder(case_id, &proposal).is_err());
        assert_eq!(indices(&db, case_id), before);
    }

    #[test]
    fn test_parse_reorder_payload() {
        let parsed = parse_reorder_payload(&json!([
            {"id": 3, "order_index": 0},
            {"id": 1, "order_index": 1}
        ]))
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                StepPosition { id: 3, order_index: 0 },
                StepPosition { id: 1, order_index: 1 }
            ]
        );

        assert!(matches!(
            parse_reorder_payload(&json!({"id": 1})),
            Err(Error::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_reorder_payload(&json!([{"id": 1}])),
            Err(Error::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_reorder_payload(&json!([
                {"id": 1, "order_index": 0},
                {"id": 1, "order_index": 1}
            ])),
            Err(Error::InvalidPayload(_))
        ));
        assert!(parse_reorder_payload(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_empty_proposal_is_a_no_op() {
        let (db, case_id, _) = db_with_steps(2);
        let sequencer = StepSequencer::new(db.clone());
        let before = indices(&db, case_id);
        sequencer.reorder(case_id, &[]).unwrap();
        assert_eq!(indices(&db, case_id), before);
    }

    #[test]
    fn test_uniqueness_holds_after_many_reorders() {
        let (db, case_id, ids) = db_with_steps(5);
        let sequencer = StepSequencer::new(db.clone());

        let rounds: Vec<Vec<(usize, i64)>> = vec![
            vec![(0, 4), (1, 3), (2, 2), (3, 1), (4, 0)],
            vec![(4, 10), (3, 11)],
            vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)],
        ];
        for round in rounds {
            let proposal: Vec<StepPosition> = round
                .into_iter()
                .map(|(slot, order_index)| StepPosition { id: ids[slot], order_index })
                .collect();
            sequencer.reorder(case_id, &proposal).unwrap();

            let current = indices(&db, case_id);
            let mut unique: Vec<i64> = current.iter().map(|(_, index)| *index).collect();
            unique.dedup();
            assert_eq!(unique.len(), current.len());
        }
    }
}
