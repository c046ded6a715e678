use std::{collections::HashMap, str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Sqlite, SqlitePool, Transaction,
};
use thiserror::Error;
use tracing::debug;

use tenant_polls_core::types::{
    DomainInput, OptionChange, POLL_CONTENT_FIELD, POLL_OPTION_FIELD,
};
use tenant_polls_core::validation::clean_char_field;
use tenant_polls_core::{Domain, Poll, PollOption, ValidationErrors};

const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = connect_options(database_url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for reading and mutating tenant domains.
    pub fn domains(&self) -> DomainRepository {
        DomainRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for tenant-scoped polls.
    pub fn polls(&self) -> PollRepository {
        PollRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for poll options.
    pub fn poll_options(&self) -> PollOptionRepository {
        PollOptionRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Pragmas are set on the connect options so every pooled connection gets them.
fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(StorageError::Connect)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(5000));
    Ok(options)
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(code),
        _ => false,
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DomainRow {
    id: i64,
    domain: String,
    name: String,
}

impl DomainRow {
    fn into_domain(self) -> Domain {
        Domain {
            id: self.id,
            domain: self.domain,
            name: self.name,
        }
    }
}

/// Repository for the `domains` table.
#[derive(Clone)]
pub struct DomainRepository {
    pool: SqlitePool,
}

impl DomainRepository {
    /// Loads a domain by primary key.
    pub async fn fetch_by_id(&self, id: i64) -> Result<Domain, DomainError> {
        let row = sqlx::query_as::<_, DomainRow>("SELECT id, domain, name FROM domains WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DomainError::NotFound)?;

        Ok(row.into_domain())
    }

    /// Loads the domain whose name equals `host` ignoring ASCII case.
    ///
    /// Uniqueness is case-sensitive, so two rows may differ only by case; that
    /// is reported as [`DomainError::MultipleMatches`] rather than picking one.
    pub async fn fetch_by_host(&self, host: &str) -> Result<Domain, DomainError> {
        let mut rows = sqlx::query_as::<_, DomainRow>(
            "SELECT id, domain, name FROM domains WHERE lower(domain) = lower(?) ORDER BY id LIMIT 2",
        )
        .bind(host)
        .fetch_all(&self.pool)
        .await?;

        debug!(stage = "storage", %host, matches = rows.len(), "domain host lookup");
        match rows.len() {
            0 => Err(DomainError::NotFound),
            1 => Ok(rows.remove(0).into_domain()),
            _ => Err(DomainError::MultipleMatches),
        }
    }

    /// Loads a domain by its exact, case-sensitive name.
    pub async fn fetch_by_natural_key(&self, domain: &str) -> Result<Domain, DomainError> {
        let row =
            sqlx::query_as::<_, DomainRow>("SELECT id, domain, name FROM domains WHERE domain = ?")
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DomainError::NotFound)?;

        Ok(row.into_domain())
    }

    /// Lists every domain ordered by name.
    pub async fn list(&self) -> Result<Vec<Domain>, DomainError> {
        let rows = sqlx::query_as::<_, DomainRow>(
            "SELECT id, domain, name FROM domains ORDER BY domain ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DomainRow::into_domain).collect())
    }

    /// Validates and inserts a new domain.
    pub async fn create(&self, input: &DomainInput) -> Result<Domain, DomainError> {
        input.clean()?;

        let row = sqlx::query_as::<_, DomainRow>(
            "INSERT INTO domains (domain, name) VALUES (?, ?) RETURNING id, domain, name",
        )
        .bind(&input.domain)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_domain_write_error)?;

        Ok(row.into_domain())
    }

    /// Validates and replaces both fields of an existing domain.
    pub async fn update(&self, id: i64, input: &DomainInput) -> Result<Domain, DomainError> {
        input.clean()?;

        let row = sqlx::query_as::<_, DomainRow>(
            "UPDATE domains SET domain = ?, name = ? WHERE id = ? RETURNING id, domain, name",
        )
        .bind(&input.domain)
        .bind(&input.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_domain_write_error)?
        .ok_or(DomainError::NotFound)?;

        Ok(row.into_domain())
    }

    /// Deletes a domain together with its polls and their options.
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}

fn map_domain_write_error(err: sqlx::Error) -> DomainError {
    if has_code(&err, SQLITE_CONSTRAINT_UNIQUE) {
        DomainError::Duplicate
    } else {
        DomainError::Database(err)
    }
}

/// Errors returned by [`DomainRepository`].
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain not found")]
    NotFound,
    #[error("more than one domain matches case-insensitively")]
    MultipleMatches,
    #[error("a domain with that name already exists")]
    Duplicate,
    #[error("invalid domain: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DomainError {
    /// Returns `true` for a clean miss, as opposed to a failing store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PollRow {
    id: i64,
    content: String,
    domain_id: i64,
}

impl PollRow {
    fn into_poll(self) -> Poll {
        Poll {
            id: self.id,
            content: self.content,
            domain_id: self.domain_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PollOptionRow {
    id: i64,
    poll_id: i64,
    value: String,
}

impl PollOptionRow {
    fn into_option(self) -> PollOption {
        PollOption {
            id: self.id,
            poll_id: self.poll_id,
            value: self.value,
        }
    }
}

/// A poll loaded together with its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollWithOptions {
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

/// Repository for polls. Every call is scoped to one owning domain.
#[derive(Clone)]
pub struct PollRepository {
    pool: SqlitePool,
}

impl PollRepository {
    /// Lists the domain's polls, newest first.
    pub async fn list_for_domain(&self, domain_id: i64) -> Result<Vec<Poll>, PollError> {
        let rows = sqlx::query_as::<_, PollRow>(
            "SELECT id, content, domain_id FROM polls WHERE domain_id = ? ORDER BY id DESC",
        )
        .bind(domain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PollRow::into_poll).collect())
    }

    /// Lists the domain's polls with their options, newest poll first.
    pub async fn list_with_options(
        &self,
        domain_id: i64,
    ) -> Result<Vec<PollWithOptions>, PollError> {
        let polls = self.list_for_domain(domain_id).await?;
        let option_rows = sqlx::query_as::<_, PollOptionRow>(
            "SELECT o.id, o.poll_id, o.value \
               FROM poll_options AS o \
               JOIN polls AS p ON p.id = o.poll_id \
              WHERE p.domain_id = ? \
              ORDER BY o.id ASC",
        )
        .bind(domain_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_poll: HashMap<i64, Vec<PollOption>> = HashMap::new();
        for row in option_rows {
            by_poll
                .entry(row.poll_id)
                .or_default()
                .push(row.into_option());
        }

        Ok(polls
            .into_iter()
            .map(|poll| {
                let options = by_poll.remove(&poll.id).unwrap_or_default();
                PollWithOptions { poll, options }
            })
            .collect())
    }

    /// Loads one poll, provided it belongs to `domain_id`.
    pub async fn fetch_for_domain(
        &self,
        domain_id: i64,
        poll_id: i64,
    ) -> Result<PollWithOptions, PollError> {
        let mut conn = self.pool.acquire().await?;
        let poll = fetch_poll(&mut conn, domain_id, poll_id).await?;
        let options = list_options(&mut conn, poll.id).await?;
        Ok(PollWithOptions { poll, options })
    }

    /// Inserts a poll stamped with `domain_id` and its initial options.
    ///
    /// Blank option values are skipped, mirroring unused extra rows of an
    /// inline form.
    pub async fn create(
        &self,
        domain_id: i64,
        content: &str,
        options: &[String],
    ) -> Result<PollWithOptions, PollError> {
        let mut errors = ValidationErrors::default();
        if let Err(err) = clean_char_field(&POLL_CONTENT_FIELD, content) {
            errors.push(err);
        }
        let values: Vec<&str> = options
            .iter()
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .collect();
        for value in &values {
            if let Err(err) = clean_char_field(&POLL_OPTION_FIELD, value) {
                errors.push(err);
            }
        }
        errors.into_result()?;

        let mut tx = self.pool.begin().await?;
        let poll = sqlx::query_as::<_, PollRow>(
            "INSERT INTO polls (content, domain_id) VALUES (?, ?) RETURNING id, content, domain_id",
        )
        .bind(content)
        .bind(domain_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if has_code(&err, SQLITE_CONSTRAINT_FOREIGNKEY) {
                PollError::MissingDomain
            } else {
                PollError::Database(err)
            }
        })?
        .into_poll();

        let mut created = Vec::with_capacity(values.len());
        for value in values {
            created.push(insert_option(&mut tx, poll.id, value).await?);
        }
        tx.commit().await?;

        Ok(PollWithOptions {
            poll,
            options: created,
        })
    }

    /// Replaces the poll's content and applies inline option edits atomically.
    pub async fn update(
        &self,
        domain_id: i64,
        poll_id: i64,
        content: &str,
        changes: &[OptionChange],
    ) -> Result<PollWithOptions, PollError> {
        let mut errors = ValidationErrors::default();
        if let Err(err) = clean_char_field(&POLL_CONTENT_FIELD, content) {
            errors.push(err);
        }
        for change in changes {
            if let Err(err) = change.clean() {
                errors.push(err);
            }
        }
        errors.into_result()?;

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE polls SET content = ? WHERE id = ? AND domain_id = ?",
        )
        .bind(content)
        .bind(poll_id)
        .bind(domain_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(PollError::NotFound);
        }

        for change in changes {
            apply_option_change(&mut tx, poll_id, change).await?;
        }

        let poll = fetch_poll(&mut tx, domain_id, poll_id).await?;
        let options = list_options(&mut tx, poll_id).await?;
        tx.commit().await?;

        Ok(PollWithOptions { poll, options })
    }

    /// Deletes a poll owned by `domain_id`; its options cascade.
    pub async fn delete(&self, domain_id: i64, poll_id: i64) -> Result<(), PollError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = ? AND domain_id = ?")
            .bind(poll_id)
            .bind(domain_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PollError::NotFound);
        }
        Ok(())
    }
}

async fn fetch_poll(
    conn: &mut sqlx::SqliteConnection,
    domain_id: i64,
    poll_id: i64,
) -> Result<Poll, PollError> {
    let row = sqlx::query_as::<_, PollRow>(
        "SELECT id, content, domain_id FROM polls WHERE id = ? AND domain_id = ?",
    )
    .bind(poll_id)
    .bind(domain_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(PollError::NotFound)?;

    Ok(row.into_poll())
}

async fn list_options(
    conn: &mut sqlx::SqliteConnection,
    poll_id: i64,
) -> Result<Vec<PollOption>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PollOptionRow>(
        "SELECT id, poll_id, value FROM poll_options WHERE poll_id = ? ORDER BY id ASC",
    )
    .bind(poll_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(PollOptionRow::into_option).collect())
}

async fn insert_option(
    tx: &mut Transaction<'_, Sqlite>,
    poll_id: i64,
    value: &str,
) -> Result<PollOption, sqlx::Error> {
    let row = sqlx::query_as::<_, PollOptionRow>(
        "INSERT INTO poll_options (poll_id, value) VALUES (?, ?) RETURNING id, poll_id, value",
    )
    .bind(poll_id)
    .bind(value)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into_option())
}

async fn apply_option_change(
    tx: &mut Transaction<'_, Sqlite>,
    poll_id: i64,
    change: &OptionChange,
) -> Result<(), PollError> {
    match change {
        OptionChange::Add { value } => {
            insert_option(tx, poll_id, value).await?;
        }
        OptionChange::Rename { id, value } => {
            let result =
                sqlx::query("UPDATE poll_options SET value = ? WHERE id = ? AND poll_id = ?")
                    .bind(value)
                    .bind(id)
                    .bind(poll_id)
                    .execute(&mut **tx)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(PollError::OptionNotFound(*id));
            }
        }
        OptionChange::Delete { id } => {
            let result = sqlx::query("DELETE FROM poll_options WHERE id = ? AND poll_id = ?")
                .bind(id)
                .bind(poll_id)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(PollError::OptionNotFound(*id));
            }
        }
    }
    Ok(())
}

/// Errors returned by [`PollRepository`] and [`PollOptionRepository`].
#[derive(Debug, Error)]
pub enum PollError {
    #[error("poll not found")]
    NotFound,
    #[error("poll option {0} does not belong to this poll")]
    OptionNotFound(i64),
    #[error("owning domain does not exist")]
    MissingDomain,
    #[error("invalid poll: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to poll options.
#[derive(Clone)]
pub struct PollOptionRepository {
    pool: SqlitePool,
}

impl PollOptionRepository {
    /// Lists the options of one poll in insertion order.
    pub async fn list_for_poll(&self, poll_id: i64) -> Result<Vec<PollOption>, PollError> {
        let mut conn = self.pool.acquire().await?;
        Ok(list_options(&mut conn, poll_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    async fn seed_domain(db: &Database, domain: &str) -> Domain {
        db.domains()
            .create(&DomainInput::new(domain, "Example"))
            .await
            .expect("create domain")
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('domains', 'polls', 'poll_options')",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 3, "expected tenant tables to be created");
    }

    #[tokio::test]
    async fn create_rejects_whitespace_in_domain() {
        let db = setup_db().await;
        let err = db
            .domains()
            .create(&DomainInput::new("bad domain", "x"))
            .await
            .unwrap_err();

        match err {
            DomainError::Validation(errors) => {
                let message = errors.to_string();
                assert!(message.contains("cannot contain any spaces or tabs"), "{message}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_reports_duplicates() {
        let db = setup_db().await;
        seed_domain(&db, "example.com").await;

        let err = db
            .domains()
            .create(&DomainInput::new("example.com", "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Duplicate));
    }

    #[tokio::test]
    async fn host_lookup_ignores_case() {
        let db = setup_db().await;
        let created = seed_domain(&db, "Example.com").await;

        let found = db.domains().fetch_by_host("EXAMPLE.COM").await.expect("lookup");
        assert_eq!(found, created);

        let err = db.domains().fetch_by_host("other.com").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn host_lookup_flags_case_only_duplicates() {
        let db = setup_db().await;
        seed_domain(&db, "example.com").await;
        seed_domain(&db, "EXAMPLE.com").await;

        let err = db.domains().fetch_by_host("example.com").await.unwrap_err();
        assert!(matches!(err, DomainError::MultipleMatches));
    }

    #[tokio::test]
    async fn natural_key_lookup_is_case_sensitive() {
        let db = setup_db().await;
        seed_domain(&db, "example.com").await;

        assert!(db.domains().fetch_by_natural_key("example.com").await.is_ok());
        let err = db
            .domains()
            .fetch_by_natural_key("Example.com")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_orders_by_domain() {
        let db = setup_db().await;
        seed_domain(&db, "zeta.test").await;
        seed_domain(&db, "alpha.test").await;

        let names: Vec<_> = db
            .domains()
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|domain| domain.domain)
            .collect();
        assert_eq!(names, vec!["alpha.test", "zeta.test"]);
    }

    #[tokio::test]
    async fn update_and_delete_missing_domain_are_not_found() {
        let db = setup_db().await;
        let input = DomainInput::new("example.com", "Example");

        assert!(db.domains().update(42, &input).await.unwrap_err().is_not_found());
        assert!(db.domains().delete(42).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn deleting_domain_cascades_to_polls_and_options() {
        let db = setup_db().await;
        let domain = seed_domain(&db, "example.com").await;
        let poll = db
            .polls()
            .create(domain.id, "Tea or coffee?", &["Tea".to_string(), "Coffee".to_string()])
            .await
            .expect("create poll");

        db.domains().delete(domain.id).await.expect("delete domain");

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM poll_options")
            .fetch_one(db.pool())
            .await
            .expect("count options");
        assert_eq!(remaining.0, 0);
        let err = db
            .polls()
            .fetch_for_domain(domain.id, poll.poll.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::NotFound));
    }

    #[tokio::test]
    async fn polls_are_scoped_to_their_domain() {
        let db = setup_db().await;
        let first = seed_domain(&db, "one.test").await;
        let second = seed_domain(&db, "two.test").await;

        let poll = db
            .polls()
            .create(first.id, "Visible to one", &[])
            .await
            .expect("create poll");

        assert!(db
            .polls()
            .list_for_domain(second.id)
            .await
            .expect("list")
            .is_empty());
        assert!(matches!(
            db.polls().fetch_for_domain(second.id, poll.poll.id).await,
            Err(PollError::NotFound)
        ));
        assert!(matches!(
            db.polls().delete(second.id, poll.poll.id).await,
            Err(PollError::NotFound)
        ));
    }

    #[tokio::test]
    async fn create_skips_blank_option_rows() {
        let db = setup_db().await;
        let domain = seed_domain(&db, "example.com").await;

        let poll = db
            .polls()
            .create(domain.id, "Pick one", &["A".to_string(), String::new()])
            .await
            .expect("create poll");
        assert_eq!(poll.options.len(), 1);
        assert_eq!(poll.options[0].value, "A");
    }

    #[tokio::test]
    async fn create_for_unknown_domain_fails() {
        let db = setup_db().await;
        let err = db.polls().create(99, "Orphan", &[]).await.unwrap_err();
        assert!(matches!(err, PollError::MissingDomain));
    }

    #[tokio::test]
    async fn update_applies_inline_option_changes() {
        let db = setup_db().await;
        let domain = seed_domain(&db, "example.com").await;
        let created = db
            .polls()
            .create(domain.id, "Pick one", &["A".to_string(), "B".to_string()])
            .await
            .expect("create poll");
        let (a, b) = (created.options[0].id, created.options[1].id);

        let updated = db
            .polls()
            .update(
                domain.id,
                created.poll.id,
                "Pick exactly one",
                &[
                    OptionChange::Rename {
                        id: a,
                        value: "Alpha".to_string(),
                    },
                    OptionChange::Delete { id: b },
                    OptionChange::Add {
                        value: "Gamma".to_string(),
                    },
                ],
            )
            .await
            .expect("update poll");

        assert_eq!(updated.poll.content, "Pick exactly one");
        let values: Vec<_> = updated.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Alpha", "Gamma"]);

        let listed = db
            .poll_options()
            .list_for_poll(created.poll.id)
            .await
            .expect("list options");
        assert_eq!(listed, updated.options);
    }

    #[tokio::test]
    async fn update_rolls_back_on_foreign_option() {
        let db = setup_db().await;
        let domain = seed_domain(&db, "example.com").await;
        let first = db
            .polls()
            .create(domain.id, "First", &["A".to_string()])
            .await
            .expect("create first");
        let second = db
            .polls()
            .create(domain.id, "Second", &["B".to_string()])
            .await
            .expect("create second");

        let err = db
            .polls()
            .update(
                domain.id,
                first.poll.id,
                "First, renamed",
                &[OptionChange::Delete {
                    id: second.options[0].id,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::OptionNotFound(id) if id == second.options[0].id));

        let reloaded = db
            .polls()
            .fetch_for_domain(domain.id, first.poll.id)
            .await
            .expect("reload");
        assert_eq!(reloaded.poll.content, "First");
    }

    #[tokio::test]
    async fn list_with_options_groups_by_poll() {
        let db = setup_db().await;
        let domain = seed_domain(&db, "example.com").await;
        let older = db
            .polls()
            .create(domain.id, "Older", &["1".to_string()])
            .await
            .expect("older");
        let newer = db
            .polls()
            .create(domain.id, "Newer", &["2".to_string(), "3".to_string()])
            .await
            .expect("newer");

        let listed = db.polls().list_with_options(domain.id).await.expect("list");
        assert_eq!(listed, vec![newer, older]);
    }
}
