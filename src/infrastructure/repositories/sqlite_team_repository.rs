use async_trait::async_trait;

use crate::domain::repositories::TeamRepository;
use crate::domain::team::{Team, TeamId};
use crate::error::DataError;
use crate::infrastructure::session::{SharedSession, TeamRow};
use crate::query::{QueryExpr, Value};

const INSERT: &str = "INSERT INTO teams (name) VALUES (?)";
const UPDATE: &str = "UPDATE teams SET name = ? WHERE id = ?";
const DELETE: &str = "DELETE FROM teams WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT id, name FROM teams WHERE id = ?";
const SELECT_ALL: &str = "SELECT id, name FROM teams";
const COUNT: &str = "SELECT COUNT(*) FROM teams";

/// SQLite implementation of TeamRepository
///
/// Shares the transaction boundary's session with every other repository
/// constructed from it.
pub struct SqliteTeamRepository {
    session: SharedSession,
}

impl SqliteTeamRepository {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn save(&self, team: &Team) -> Result<Team, DataError> {
        let mut session = self.session.lock().await;
        match team.id() {
            None => {
                let expr =
                    QueryExpr::positional(INSERT, vec![Value::from(team.name().to_string())]);
                let result = session.execute(&expr).await?;

                let mut saved = team.clone();
                saved.assign_id(TeamId::new(result.last_insert_rowid()));
                session.track_team(&saved);
                Ok(saved)
            }
            Some(id) => {
                let expr = QueryExpr::positional(
                    UPDATE,
                    vec![Value::from(team.name().to_string()), Value::from(id.value())],
                );
                session.defer(expr);
                session.track_team(team);
                Ok(team.clone())
            }
        }
    }

    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, DataError> {
        let mut session = self.session.lock().await;
        if let Some(cached) = session.cached_team(id) {
            return Ok(Some(cached));
        }
        let expr = QueryExpr::positional(SELECT_BY_ID, vec![Value::from(id.value())]);
        let row: Option<TeamRow> = session.fetch_optional(&expr).await?;
        Ok(row.map(|r| session.resolve_team(r)))
    }

    async fn find_all(&self) -> Result<Vec<Team>, DataError> {
        let mut session = self.session.lock().await;
        let rows: Vec<TeamRow> = session.fetch_all(&QueryExpr::new(SELECT_ALL)).await?;
        Ok(rows.into_iter().map(|r| session.resolve_team(r)).collect())
    }

    async fn count(&self) -> Result<u64, DataError> {
        let mut session = self.session.lock().await;
        let (count,): (i64,) = session.fetch_one(&QueryExpr::new(COUNT)).await?;
        Ok(count as u64)
    }

    async fn delete(&self, team: &Team) -> Result<(), DataError> {
        let Some(id) = team.id() else {
            return Ok(());
        };
        let mut session = self.session.lock().await;
        session.evict_team(id);
        let expr = QueryExpr::positional(DELETE, vec![Value::from(id.value())]);
        session.execute(&expr).await?;
        Ok(())
    }
}
