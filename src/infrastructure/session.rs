use std::collections::HashMap;
use std::sync::Arc;

use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::member::{LazyTeam, Member, MemberId};
use crate::domain::team::{Team, TeamId};
use crate::error::DataError;
use crate::query::{QueryExpr, Value};

/// Raw member row as stored.
#[derive(Debug, FromRow)]
pub(crate) struct MemberRow {
    pub id: i64,
    pub username: String,
    pub age: i32,
    pub team_id: Option<i64>,
}

/// Member row joined with its team, for fetch-join queries.
#[derive(Debug, FromRow)]
pub(crate) struct MemberWithTeamRow {
    pub id: i64,
    pub username: String,
    pub age: i32,
    pub team_id: i64,
    pub team_name: String,
}

/// Raw team row as stored.
#[derive(Debug, FromRow)]
pub(crate) struct TeamRow {
    pub id: i64,
    pub name: String,
}

/// The entity-manager-like handle: one storage transaction plus the
/// session-scoped entity state.
///
/// A session tracks every entity it has loaded or saved in an identity
/// map, and queues re-save UPDATEs in a pending-write list. Query paths
/// flush pending writes before touching the backend, so reads within the
/// boundary always observe the boundary's own prior writes. Entity-shaped
/// rows resolve through the identity map: a tracked instance wins over a
/// fresher row, which is why bulk operations require an explicit
/// [`clear`](Self::clear) afterwards.
pub struct Session {
    tx: Option<Transaction<'static, Sqlite>>,
    members: HashMap<MemberId, Member>,
    teams: HashMap<TeamId, Team>,
    pending: Vec<QueryExpr>,
}

impl Session {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self {
            tx: Some(tx),
            members: HashMap::new(),
            teams: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Whether the transaction is still open.
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues a write to run on the next flush.
    pub(crate) fn defer(&mut self, expr: QueryExpr) {
        self.pending.push(expr);
    }

    /// Pushes all pending writes to the backend without ending the
    /// transaction.
    pub async fn flush(&mut self) -> Result<(), DataError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        tracing::debug!(writes = pending.len(), "flushing session");
        for expr in pending {
            self.raw_execute(&expr).await?;
        }
        Ok(())
    }

    /// Detaches all tracked entities from the session.
    ///
    /// Unflushed writes are discarded with them; call
    /// [`flush`](Self::flush) first to keep them. Required after a bulk
    /// operation, which bypasses the identity map and would otherwise
    /// leave stale entities behind.
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(
                discarded = self.pending.len(),
                "clearing session with unflushed writes"
            );
        }
        self.members.clear();
        self.teams.clear();
        self.pending.clear();
    }

    /// Flushes pending writes and commits the transaction atomically.
    /// The session is closed afterwards.
    pub async fn commit(&mut self) -> Result<(), DataError> {
        self.flush().await?;
        let tx = self.tx.take().ok_or(DataError::SessionClosed)?;
        tx.commit().await?;
        self.clear();
        Ok(())
    }

    /// Discards every write performed in this boundary and closes the
    /// session.
    pub async fn rollback(&mut self) -> Result<(), DataError> {
        self.pending.clear();
        self.clear();
        let tx = self.tx.take().ok_or(DataError::SessionClosed)?;
        tx.rollback().await?;
        Ok(())
    }

    /// Runs a write expression, flushing queued writes first so statement
    /// order is preserved. Returns the backend's execution result.
    pub(crate) async fn execute(
        &mut self,
        expr: &QueryExpr,
    ) -> Result<SqliteQueryResult, DataError> {
        self.flush().await?;
        self.raw_execute(expr).await
    }

    async fn raw_execute(&mut self, expr: &QueryExpr) -> Result<SqliteQueryResult, DataError> {
        let (sql, values) = expr.compile()?;
        let tx = self.tx.as_mut().ok_or(DataError::SessionClosed)?;
        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_value(query, value);
        }
        Ok(query.execute(&mut **tx).await?)
    }

    pub(crate) async fn fetch_all<T>(&mut self, expr: &QueryExpr) -> Result<Vec<T>, DataError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.flush().await?;
        let (sql, values) = expr.compile()?;
        let tx = self.tx.as_mut().ok_or(DataError::SessionClosed)?;
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in values {
            query = bind_value_as(query, value);
        }
        Ok(query.fetch_all(&mut **tx).await?)
    }

    pub(crate) async fn fetch_optional<T>(
        &mut self,
        expr: &QueryExpr,
    ) -> Result<Option<T>, DataError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.flush().await?;
        let (sql, values) = expr.compile()?;
        let tx = self.tx.as_mut().ok_or(DataError::SessionClosed)?;
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in values {
            query = bind_value_as(query, value);
        }
        Ok(query.fetch_optional(&mut **tx).await?)
    }

    pub(crate) async fn fetch_one<T>(&mut self, expr: &QueryExpr) -> Result<T, DataError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.flush().await?;
        let (sql, values) = expr.compile()?;
        let tx = self.tx.as_mut().ok_or(DataError::SessionClosed)?;
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in values {
            query = bind_value_as(query, value);
        }
        Ok(query.fetch_one(&mut **tx).await?)
    }

    // ===== Identity map =====

    pub(crate) fn cached_member(&self, id: MemberId) -> Option<Member> {
        self.members.get(&id).cloned()
    }

    pub(crate) fn cached_team(&self, id: TeamId) -> Option<Team> {
        self.teams.get(&id).cloned()
    }

    /// Resolves a member row against the identity map: a tracked instance
    /// wins over the row.
    pub(crate) fn resolve_member(&mut self, row: MemberRow) -> Member {
        let id = MemberId::new(row.id);
        if let Some(cached) = self.members.get(&id) {
            return cached.clone();
        }
        let member =
            Member::from_persistence(id, row.username, row.age, row.team_id.map(TeamId::new));
        self.members.insert(id, member.clone());
        member
    }

    /// Resolves a joined member row, tracking the team and handing the
    /// member an already-resolved reference.
    pub(crate) fn resolve_member_with_team(
        &mut self,
        row: MemberWithTeamRow,
    ) -> Result<Member, DataError> {
        let id = MemberId::new(row.id);
        if let Some(cached) = self.members.get(&id) {
            return Ok(cached.clone());
        }
        let team_id = TeamId::new(row.team_id);
        let team = self
            .teams
            .entry(team_id)
            .or_insert_with(|| Team::from_persistence(team_id, row.team_name))
            .clone();
        let member = Member::from_persistence_with_team(
            id,
            row.username,
            row.age,
            LazyTeam::resolved(team)?,
        );
        self.members.insert(id, member.clone());
        Ok(member)
    }

    pub(crate) fn resolve_team(&mut self, row: TeamRow) -> Team {
        let id = TeamId::new(row.id);
        if let Some(cached) = self.teams.get(&id) {
            return cached.clone();
        }
        let team = Team::from_persistence(id, row.name);
        self.teams.insert(id, team.clone());
        team
    }

    pub(crate) fn track_member(&mut self, member: &Member) {
        if let Some(id) = member.id() {
            self.members.insert(id, member.clone());
        }
    }

    pub(crate) fn track_team(&mut self, team: &Team) {
        if let Some(id) = team.id() {
            self.teams.insert(id, team.clone());
        }
    }

    pub(crate) fn evict_member(&mut self, id: MemberId) {
        self.members.remove(&id);
    }

    pub(crate) fn evict_team(&mut self, id: TeamId) {
        self.teams.remove(&id);
    }
}

/// A session shared between the repositories of one transaction boundary.
///
/// The mutex serializes access: no concurrent mutation of the same
/// session is permitted, callers take turns per operation.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Integer(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
        Value::Null => query.bind(None::<i64>),
    }
}

fn bind_value_as<'q, T>(
    query: sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    value: Value,
) -> sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    match value {
        Value::Integer(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
        Value::Null => query.bind(None::<i64>),
    }
}
