//! SQLite store for Stepwright entities

use crate::catalog::ActionCatalog;
use crate::types::{
    ActionType, NewStep, Page, Selector, SelectorBinding, SelectorKind, StepDetails, StepPatch,
    TestCase, TestStep, TestSuite,
};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for entity persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Expose the underlying connection for subsystems that manage their own
    /// transactions against the shared store (the sequencer does).
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Pages of the application under test
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                url_pattern TEXT,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Element locators, scoped to a page
            CREATE TABLE IF NOT EXISTS selectors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'css',
                value TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (page_id, name)
            );
            CREATE INDEX IF NOT EXISTS idx_selectors_page ON selectors(page_id);

            -- Read-only mirror of the built-in action catalog
            CREATE TABLE IF NOT EXISTS action_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                has_selector INTEGER NOT NULL DEFAULT 0,
                has_value INTEGER NOT NULL DEFAULT 0,
                has_assertion INTEGER NOT NULL DEFAULT 0
            );

            -- Test suites group test cases
            CREATE TABLE IF NOT EXISTS test_suites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS test_cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                suite_id INTEGER NOT NULL REFERENCES test_suites(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_cases_suite ON test_cases(suite_id);

            -- Ordered steps of a test case. order_index uniqueness within a
            -- case is the sequencer's protocol invariant, not a schema
            -- constraint: an immediate UNIQUE index would reject legal swaps
            -- mid-transaction.
            CREATE TABLE IF NOT EXISTS test_steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
                action TEXT NOT NULL,
                selector_id INTEGER REFERENCES selectors(id) ON DELETE SET NULL,
                input_value TEXT,
                assertion_value TEXT,
                description TEXT,
                order_index INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_steps_case ON test_steps(test_case_id);
            CREATE INDEX IF NOT EXISTS idx_test_steps_order ON test_steps(test_case_id, order_index);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Mirror the built-in catalog into `action_types` (idempotent upsert)
    pub fn seed_action_types(&self, catalog: &ActionCatalog) -> Result<()> {
        let conn = self.conn.lock();

        for spec in catalog.specs() {
            conn.execute(
                "INSERT INTO action_types (name, description, has_selector, has_value, has_assertion)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(name) DO UPDATE SET
                     description = excluded.description,
                     has_selector = excluded.has_selector,
                     has_value = excluded.has_value,
                     has_assertion = excluded.has_assertion",
                params![
                    spec.kind.as_str(),
                    spec.description,
                    spec.has_selector,
                    spec.has_value,
                    spec.has_assertion,
                ],
            )?;
        }

        info!("Seeded {} action types", catalog.specs().len());
        Ok(())
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub fn create_page(
        &self,
        name: &str,
        url_pattern: Option<&str>,
        description: Option<&str>,
    ) -> Result<Page> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::name_taken(&conn, "pages", name, None)? {
            return Err(Error::AlreadyExists {
                kind: "page",
                name: name.to_string(),
            });
        }

        conn.execute(
            "INSERT INTO pages (name, url_pattern, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, url_pattern, description, now],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Created page '{}' ({})", name, id);
        Self::page_by_id(&conn, id)?.ok_or(Error::NotFound { kind: "page", id })
    }

    pub fn get_page(&self, id: i64) -> Result<Option<Page>> {
        let conn = self.conn.lock();
        Self::page_by_id(&conn, id)
    }

    pub fn list_pages(&self) -> Result<Vec<Page>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, url_pattern, description, created_at, updated_at
             FROM pages ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], Self::map_page)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_page(
        &self,
        id: i64,
        name: &str,
        url_pattern: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Page>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::page_by_id(&conn, id)?.is_none() {
            return Ok(None);
        }
        if Self::name_taken(&conn, "pages", name, Some(id))? {
            return Err(Error::AlreadyExists {
                kind: "page",
                name: name.to_string(),
            });
        }

        conn.execute(
            "UPDATE pages SET name = ?1, url_pattern = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![name, url_pattern, description, now, id],
        )?;
        Self::page_by_id(&conn, id)
    }

    pub fn delete_page(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM pages WHERE id = ?1", params![id])?;
        if rows > 0 {
            debug!("Deleted page {}", id);
        }
        Ok(rows > 0)
    }

    fn page_by_id(conn: &Connection, id: i64) -> Result<Option<Page>> {
        conn.query_row(
            "SELECT id, name, url_pattern, description, created_at, updated_at
             FROM pages WHERE id = ?1",
            params![id],
            Self::map_page,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
        Ok(Page {
            id: row.get(0)?,
            name: row.get(1)?,
            url_pattern: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    pub fn create_selector(
        &self,
        page_id: i64,
        name: &str,
        kind: SelectorKind,
        value: &str,
        description: Option<&str>,
    ) -> Result<Selector> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::page_by_id(&conn, page_id)?.is_none() {
            return Err(Error::NotFound {
                kind: "page",
                id: page_id,
            });
        }
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM selectors WHERE page_id = ?1 AND name = ?2",
            params![page_id, name],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(Error::AlreadyExists {
                kind: "selector",
                name: name.to_string(),
            });
        }

        conn.execute(
            "INSERT INTO selectors (page_id, name, kind, value, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![page_id, name, kind.as_str(), value, description, now],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Created selector '{}' ({}) on page {}", name, id, page_id);
        Self::selector_by_id(&conn, page_id, id)?.ok_or(Error::NotFound {
            kind: "selector",
            id,
        })
    }

    pub fn list_selectors(&self, page_id: i64) -> Result<Vec<Selector>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, page_id, name, kind, value, description, created_at, updated_at
             FROM selectors WHERE page_id = ?1 ORDER BY name ASC",
        )?;
        let rows = stmt.query_map(params![page_id], Self::map_raw_selector)?;
        let mut selectors = Vec::new();
        for row in rows {
            selectors.push(row?.parse()?);
        }
        Ok(selectors)
    }

    pub fn update_selector(
        &self,
        page_id: i64,
        selector_id: i64,
        name: &str,
        kind: SelectorKind,
        value: &str,
        description: Option<&str>,
    ) -> Result<Option<Selector>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::selector_by_id(&conn, page_id, selector_id)?.is_none() {
            return Ok(None);
        }
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM selectors WHERE page_id = ?1 AND name = ?2 AND id != ?3",
            params![page_id, name, selector_id],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(Error::AlreadyExists {
                kind: "selector",
                name: name.to_string(),
            });
        }

        conn.execute(
            "UPDATE selectors SET name = ?1, kind = ?2, value = ?3, description = ?4, updated_at = ?5
             WHERE id = ?6 AND page_id = ?7",
            params![name, kind.as_str(), value, description, now, selector_id, page_id],
        )?;
        Self::selector_by_id(&conn, page_id, selector_id)
    }

    pub fn delete_selector(&self, page_id: i64, selector_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM selectors WHERE id = ?1 AND page_id = ?2",
            params![selector_id, page_id],
        )?;
        Ok(rows > 0)
    }

    fn selector_by_id(conn: &Connection, page_id: i64, id: i64) -> Result<Option<Selector>> {
        let raw = conn
            .query_row(
                "SELECT id, page_id, name, kind, value, description, created_at, updated_at
                 FROM selectors WHERE id = ?1 AND page_id = ?2",
                params![id, page_id],
                Self::map_raw_selector,
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }

    fn map_raw_selector(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSelector> {
        Ok(RawSelector {
            id: row.get(0)?,
            page_id: row.get(1)?,
            name: row.get(2)?,
            kind: row.get(3)?,
            value: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    // ========================================================================
    // Action types
    // ========================================================================

    pub fn list_action_types(&self) -> Result<Vec<ActionType>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, has_selector, has_value, has_assertion
             FROM action_types ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::map_action_type)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn get_action_type(&self, name: &str) -> Result<Option<ActionType>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, name, description, has_selector, has_value, has_assertion
             FROM action_types WHERE name = ?1",
            params![name],
            Self::map_action_type,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_action_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActionType> {
        Ok(ActionType {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            has_selector: row.get(3)?,
            has_value: row.get(4)?,
            has_assertion: row.get(5)?,
        })
    }

    // ========================================================================
    // Test suites
    // ========================================================================

    pub fn create_suite(&self, name: &str, description: Option<&str>) -> Result<TestSuite> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::name_taken(&conn, "test_suites", name, None)? {
            return Err(Error::AlreadyExists {
                kind: "test suite",
                name: name.to_string(),
            });
        }

        conn.execute(
            "INSERT INTO test_suites (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![name, description, now],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Created test suite '{}' ({})", name, id);
        Self::suite_by_id(&conn, id)?.ok_or(Error::NotFound {
            kind: "test suite",
            id,
        })
    }

    pub fn get_suite(&self, id: i64) -> Result<Option<TestSuite>> {
        let conn = self.conn.lock();
        Self::suite_by_id(&conn, id)
    }

    pub fn list_suites(&self) -> Result<Vec<TestSuite>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM test_suites ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], Self::map_suite)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_suite(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<TestSuite>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::suite_by_id(&conn, id)?.is_none() {
            return Ok(None);
        }
        if Self::name_taken(&conn, "test_suites", name, Some(id))? {
            return Err(Error::AlreadyExists {
                kind: "test suite",
                name: name.to_string(),
            });
        }

        conn.execute(
            "UPDATE test_suites SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![name, description, now, id],
        )?;
        Self::suite_by_id(&conn, id)
    }

    pub fn delete_suite(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM test_suites WHERE id = ?1", params![id])?;
        if rows > 0 {
            debug!("Deleted test suite {}", id);
        }
        Ok(rows > 0)
    }

    fn suite_by_id(conn: &Connection, id: i64) -> Result<Option<TestSuite>> {
        conn.query_row(
            "SELECT id, name, description, created_at, updated_at
             FROM test_suites WHERE id = ?1",
            params![id],
            Self::map_suite,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_suite(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestSuite> {
        Ok(TestSuite {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    // ========================================================================
    // Test cases
    // ========================================================================

    pub fn create_case(
        &self,
        suite_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<TestCase> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::suite_by_id(&conn, suite_id)?.is_none() {
            return Err(Error::NotFound {
                kind: "test suite",
                id: suite_id,
            });
        }

        conn.execute(
            "INSERT INTO test_cases (suite_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![suite_id, name, description, now],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Created test case '{}' ({}) in suite {}", name, id, suite_id);
        Self::case_by_id(&conn, id)?.ok_or(Error::NotFound {
            kind: "test case",
            id,
        })
    }

    pub fn get_case(&self, id: i64) -> Result<Option<TestCase>> {
        let conn = self.conn.lock();
        Self::case_by_id(&conn, id)
    }

    pub fn get_case_in_suite(&self, suite_id: i64, case_id: i64) -> Result<Option<TestCase>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, suite_id, name, description, created_at, updated_at
             FROM test_cases WHERE id = ?1 AND suite_id = ?2",
            params![case_id, suite_id],
            Self::map_case,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_cases(&self, suite_id: i64) -> Result<Vec<TestCase>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, suite_id, name, description, created_at, updated_at
             FROM test_cases WHERE suite_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![suite_id], Self::map_case)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_case(
        &self,
        suite_id: i64,
        case_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<TestCase>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        let rows = conn.execute(
            "UPDATE test_cases SET name = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4 AND suite_id = ?5",
            params![name, description, now, case_id, suite_id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Self::case_by_id(&conn, case_id)
    }

    pub fn delete_case(&self, suite_id: i64, case_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM test_cases WHERE id = ?1 AND suite_id = ?2",
            params![case_id, suite_id],
        )?;
        if rows > 0 {
            debug!("Deleted test case {} from suite {}", case_id, suite_id);
        }
        Ok(rows > 0)
    }

    fn case_by_id(conn: &Connection, id: i64) -> Result<Option<TestCase>> {
        conn.query_row(
            "SELECT id, suite_id, name, description, created_at, updated_at
             FROM test_cases WHERE id = ?1",
            params![id],
            Self::map_case,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_case(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestCase> {
        Ok(TestCase {
            id: row.get(0)?,
            suite_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    // ========================================================================
    // Test steps
    // ========================================================================

    pub fn create_step(&self, test_case_id: i64, step: &NewStep) -> Result<TestStep> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::case_by_id(&conn, test_case_id)?.is_none() {
            return Err(Error::TestCaseNotFound { id: test_case_id });
        }
        if let Some(selector_id) = step.selector_id {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM selectors WHERE id = ?1",
                params![selector_id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::NotFound {
                    kind: "selector",
                    id: selector_id,
                });
            }
        }

        let order_index = match step.order_index {
            Some(index) => index,
            None => conn.query_row(
                "SELECT COALESCE(MAX(order_index) + 1, 0) FROM test_steps WHERE test_case_id = ?1",
                params![test_case_id],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            "INSERT INTO test_steps (test_case_id, action, selector_id, input_value,
                                     assertion_value, description, order_index,
                                     created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                test_case_id,
                step.action,
                step.selector_id,
                step.input_value,
                step.assertion_value,
                step.description,
                order_index,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!(
            "Created step {} ('{}') at index {} in case {}",
            id, step.action, order_index, test_case_id
        );
        Self::step_by_id(&conn, test_case_id, id)?.ok_or(Error::StepNotFound {
            id,
            test_case_id,
        })
    }

    pub fn get_step(&self, test_case_id: i64, step_id: i64) -> Result<Option<TestStep>> {
        let conn = self.conn.lock();
        Self::step_by_id(&conn, test_case_id, step_id)
    }

    /// Steps of a case joined with their selector bindings, in presentation
    /// order: `order_index` ascending, id ascending on ties. This is the
    /// ordering contract the compiler relies on.
    pub fn list_steps(&self, test_case_id: i64) -> Result<Vec<StepDetails>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT ts.id, ts.test_case_id, ts.action, ts.selector_id, ts.input_value,
                    ts.assertion_value, ts.description, ts.order_index, ts.created_at,
                    ts.updated_at, s.name, s.kind, s.value, p.name
             FROM test_steps ts
             LEFT JOIN selectors s ON s.id = ts.selector_id
             LEFT JOIN pages p ON p.id = s.page_id
             WHERE ts.test_case_id = ?1
             ORDER BY ts.order_index ASC, ts.id ASC",
        )?;
        let rows = stmt.query_map(params![test_case_id], |row| {
            Ok(RawStepRow {
                id: row.get(0)?,
                test_case_id: row.get(1)?,
                action: row.get(2)?,
                selector_id: row.get(3)?,
                input_value: row.get(4)?,
                assertion_value: row.get(5)?,
                description: row.get(6)?,
                order_index: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
                selector_name: row.get(10)?,
                selector_kind: row.get(11)?,
                selector_value: row.get(12)?,
                page_name: row.get(13)?,
            })
        })?;

        let mut steps = Vec::new();
        for row in rows {
            steps.push(row?.parse()?);
        }
        Ok(steps)
    }

    pub fn update_step(
        &self,
        test_case_id: i64,
        step_id: i64,
        patch: &StepPatch,
    ) -> Result<Option<TestStep>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        if Self::step_by_id(&conn, test_case_id, step_id)?.is_none() {
            return Ok(None);
        }
        if let Some(selector_id) = patch.selector_id {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM selectors WHERE id = ?1",
                params![selector_id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::NotFound {
                    kind: "selector",
                    id: selector_id,
                });
            }
        }

        conn.execute(
            "UPDATE test_steps SET action = ?1, selector_id = ?2, input_value = ?3,
                                   assertion_value = ?4, description = ?5, updated_at = ?6
             WHERE id = ?7 AND test_case_id = ?8",
            params![
                patch.action,
                patch.selector_id,
                patch.input_value,
                patch.assertion_value,
                patch.description,
                now,
                step_id,
                test_case_id,
            ],
        )?;
        Self::step_by_id(&conn, test_case_id, step_id)
    }

    pub fn delete_step(&self, test_case_id: i64, step_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM test_steps WHERE id = ?1 AND test_case_id = ?2",
            params![step_id, test_case_id],
        )?;
        Ok(rows > 0)
    }

    fn step_by_id(conn: &Connection, test_case_id: i64, id: i64) -> Result<Option<TestStep>> {
        conn.query_row(
            "SELECT id, test_case_id, action, selector_id, input_value, assertion_value,
                    description, order_index, created_at, updated_at
             FROM test_steps WHERE id = ?1 AND test_case_id = ?2",
            params![id, test_case_id],
            Self::map_step,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_step(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestStep> {
        Ok(TestStep {
            id: row.get(0)?,
            test_case_id: row.get(1)?,
            action: row.get(2)?,
            selector_id: row.get(3)?,
            input_value: row.get(4)?,
            assertion_value: row.get(5)?,
            description: row.get(6)?,
            order_index: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn name_taken(
        conn: &Connection,
        table: &str,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let count: i64 = match exclude_id {
            Some(id) => conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE name = ?1 AND id != ?2", table),
                params![name, id],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE name = ?1", table),
                params![name],
                |row| row.get(0),
            )?,
        };
        Ok(count > 0)
    }
}

/// Selector row before the kind column is parsed
struct RawSelector {
    id: i64,
    page_id: i64,
    name: String,
    kind: String,
    value: String,
    description: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RawSelector {
    fn parse(self) -> Result<Selector> {
        Ok(Selector {
            id: self.id,
            page_id: self.page_id,
            name: self.name,
            kind: self.kind.parse()?,
            value: self.value,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Step row joined with selector columns, before parsing
struct RawStepRow {
    id: i64,
    test_case_id: i64,
    action: String,
    selector_id: Option<i64>,
    input_value: Option<String>,
    assertion_value: Option<String>,
    description: Option<String>,
    order_index: i64,
    created_at: i64,
    updated_at: i64,
    selector_name: Option<String>,
    selector_kind: Option<String>,
    selector_value: Option<String>,
    page_name: Option<String>,
}

impl RawStepRow {
    fn parse(self) -> Result<StepDetails> {
        let selector = match (
            self.selector_name,
            self.selector_kind,
            self.selector_value,
            self.page_name,
        ) {
            (Some(name), Some(kind), Some(value), Some(page_name)) => Some(SelectorBinding {
                name,
                kind: kind.parse()?,
                value,
                page_name,
            }),
            _ => None,
        };

        Ok(StepDetails {
            id: self.id,
            test_case_id: self.test_case_id,
            action: self.action,
            selector_id: self.selector_id,
            input_value: self.input_value,
            assertion_value: self.assertion_value,
            description: self.description,
            order_index: self.order_index,
            created_at: self.created_at,
            updated_at: self.updated_at,
            selector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> Database {
        let db = Database::open_memory().unwrap();
        db.seed_action_types(&ActionCatalog::builtin()).unwrap();
        db
    }

    #[test]
    fn test_page_crud() {
        let db = seeded_db();

        let page = db
            .create_page("login", Some("https://example.com/login"), None)
            .unwrap();
        assert_eq!(page.name, "login");
        assert_eq!(page.url_pattern.as_deref(), Some("https://example.com/login"));

        assert!(matches!(
            db.create_page("login", None, None),
            Err(Error::AlreadyExists { kind: "page", .. })
        ));

        let fetched = db.get_page(page.id).unwrap().unwrap();
        assert_eq!(fetched.id, page.id);

        let updated = db
            .update_page(page.id, "login v2", None, Some("signin form"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "login v2");
        assert_eq!(updated.url_pattern, None);

        assert_eq!(db.list_pages().unwrap().len(), 1);
        assert!(db.delete_page(page.id).unwrap());
        assert!(!db.delete_page(page.id).unwrap());
        assert!(db.get_page(page.id).unwrap().is_none());
    }

    #[test]
    fn test_selector_crud_and_cascade() {
        let db = seeded_db();
        let page = db.create_page("login", None, None).unwrap();

        let selector = db
            .create_selector(page.id, "email", SelectorKind::Css, "#email", None)
            .unwrap();
        assert_eq!(selector.kind, SelectorKind::Css);

        // Unique within the page
        assert!(matches!(
            db.create_selector(page.id, "email", SelectorKind::Css, "#other", None),
            Err(Error::AlreadyExists { kind: "selector", .. })
        ));
        // Unknown page
        assert!(matches!(
            db.create_selector(9999, "email", SelectorKind::Css, "#email", None),
            Err(Error::NotFound { kind: "page", .. })
        ));

        let updated = db
            .update_selector(page.id, selector.id, "email input", SelectorKind::Xpath, "//input", None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.kind, SelectorKind::Xpath);

        assert_eq!(db.list_selectors(page.id).unwrap().len(), 1);

        // Deleting the page cascades to its selectors
        assert!(db.delete_page(page.id).unwrap());
        assert!(db.list_selectors(page.id).unwrap().is_empty());
    }

    #[test]
    fn test_seed_action_types_is_idempotent() {
        let db = seeded_db();
        let first = db.list_action_types().unwrap();
        db.seed_action_types(&ActionCatalog::builtin()).unwrap();
        let second = db.list_action_types().unwrap();

        assert_eq!(first.len(), ActionCatalog::builtin().specs().len());
        assert_eq!(first.len(), second.len());

        let click = db.get_action_type("click").unwrap().unwrap();
        assert!(click.has_selector);
        assert!(!click.has_value);
        assert!(!click.has_assertion);
    }

    #[test]
    fn test_suite_and_case_cascade() {
        let db = seeded_db();
        let suite = db.create_suite("smoke", Some("smoke tests")).unwrap();
        let case = db.create_case(suite.id, "landing", None).unwrap();

        assert!(matches!(
            db.create_suite("smoke", None),
            Err(Error::AlreadyExists { kind: "test suite", .. })
        ));
        assert!(matches!(
            db.create_case(9999, "orphan", None),
            Err(Error::NotFound { kind: "test suite", .. })
        ));

        db.create_step(
            case.id,
            &NewStep {
                action: "navigate".to_string(),
                input_value: Some("https://example.com".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(db.get_case_in_suite(suite.id, case.id).unwrap().is_some());
        assert!(db.get_case_in_suite(suite.id + 1, case.id).unwrap().is_none());

        // Deleting the suite cascades through cases to steps
        assert!(db.delete_suite(suite.id).unwrap());
        assert!(db.get_case(case.id).unwrap().is_none());
        assert!(db.list_steps(case.id).unwrap().is_empty());
    }

    #[test]
    fn test_step_order_index_defaults_to_append() {
        let db = seeded_db();
        let suite = db.create_suite("smoke", None).unwrap();
        let case = db.create_case(suite.id, "landing", None).unwrap();

        for url in ["https://a", "https://b", "https://c"] {
            db.create_step(
                case.id,
                &NewStep {
                    action: "navigate".to_string(),
                    input_value: Some(url.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let steps = db.list_steps(case.id).unwrap();
        let indices: Vec<i64> = steps.iter().map(|s| s.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_list_steps_orders_and_joins() {
        let db = seeded_db();
        let page = db.create_page("home", None, None).unwrap();
        let selector = db
            .create_selector(page.id, "cta", SelectorKind::Css, "#cta", None)
            .unwrap();
        let suite = db.create_suite("smoke", None).unwrap();
        let case = db.create_case(suite.id, "landing", None).unwrap();

        // Same order_index on purpose: ties break by id ascending
        let first = db
            .create_step(
                case.id,
                &NewStep {
                    action: "click".to_string(),
                    selector_id: Some(selector.id),
                    order_index: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        let second = db
            .create_step(
                case.id,
                &NewStep {
                    action: "wait".to_string(),
                    selector_id: Some(selector.id),
                    order_index: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();

        let steps = db.list_steps(case.id).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, first.id);
        assert_eq!(steps[1].id, second.id);

        let binding = steps[0].selector.as_ref().unwrap();
        assert_eq!(binding.name, "cta");
        assert_eq!(binding.value, "#cta");
        assert_eq!(binding.page_name, "home");
    }

    #[test]
    fn test_create_step_validates_references() {
        let db = seeded_db();
        let suite = db.create_suite("smoke", None).unwrap();
        let case = db.create_case(suite.id, "landing", None).unwrap();

        assert!(matches!(
            db.create_step(9999, &NewStep { action: "reload".to_string(), ..Default::default() }),
            Err(Error::TestCaseNotFound { id: 9999 })
        ));
        assert!(matches!(
            db.create_step(
                case.id,
                &NewStep {
                    action: "click".to_string(),
                    selector_id: Some(12345),
                    ..Default::default()
                },
            ),
            Err(Error::NotFound { kind: "selector", .. })
        ));
    }

    #[test]
    fn test_update_and_delete_step_scoped_to_case() {
        let db = seeded_db();
        let suite = db.create_suite("smoke", None).unwrap();
        let case_a = db.create_case(suite.id, "a", None).unwrap();
        let case_b = db.create_case(suite.id, "b", None).unwrap();

        let step = db
            .create_step(
                case_a.id,
                &NewStep {
                    action: "reload".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        // Wrong case sees nothing
        assert!(db.get_step(case_b.id, step.id).unwrap().is_none());
        assert!(db
            .update_step(
                case_b.id,
                step.id,
                &StepPatch {
                    action: "go_back".to_string(),
                    selector_id: None,
                    input_value: None,
                    assertion_value: None,
                    description: None,
                },
            )
            .unwrap()
            .is_none());
        assert!(!db.delete_step(case_b.id, step.id).unwrap());

        let updated = db
            .update_step(
                case_a.id,
                step.id,
                &StepPatch {
                    action: "go_back".to_string(),
                    selector_id: None,
                    input_value: None,
                    assertion_value: None,
                    description: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.action, "go_back");
        assert_eq!(updated.order_index, step.order_index);

        assert!(db.delete_step(case_a.id, step.id).unwrap());
    }

    #[test]
    fn test_open_creates_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        let db = Database::open(&path).unwrap();
        db.seed_action_types(&ActionCatalog::builtin()).unwrap();
        assert!(path.exists());
        assert!(!db.list_action_types().unwrap().is_empty());
    }
}
