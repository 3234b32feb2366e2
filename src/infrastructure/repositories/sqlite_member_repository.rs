use async_trait::async_trait;
use sqlx::FromRow;

use crate::domain::member::{Member, MemberDto, MemberId};
use crate::domain::page::{Page, PageRequest};
use crate::domain::repositories::MemberRepository;
use crate::domain::team::TeamId;
use crate::error::DataError;
use crate::infrastructure::session::{MemberRow, MemberWithTeamRow, SharedSession};
use crate::query::{DerivedQuery, Operator, Predicate, QueryExpr, Value};

const TABLE: &str = "members";
const COLUMNS: &[&str] = &["id", "username", "age", "team_id"];

const INSERT: &str = "INSERT INTO members (username, age, team_id) VALUES (?, ?, ?)";
const UPDATE: &str = "UPDATE members SET username = ?, age = ?, team_id = ? WHERE id = ?";
const DELETE: &str = "DELETE FROM members WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT id, username, age, team_id FROM members WHERE id = ?";
const SELECT_ALL: &str = "SELECT id, username, age, team_id FROM members";
const COUNT: &str = "SELECT COUNT(*) FROM members";

const FIND_USER: &str =
    "SELECT id, username, age, team_id FROM members WHERE username = :username AND age = :age";
const FIND_USERNAME_LIST: &str = "SELECT username FROM members";
const FIND_MEMBER_DTO: &str = "\
SELECT m.id, m.username, t.name AS team_name
FROM members m
JOIN teams t ON t.id = m.team_id";
const FIND_BY_NAMES: &str =
    "SELECT id, username, age, team_id FROM members WHERE username IN (:names)";
const FETCH_JOIN: &str = "\
SELECT m.id, m.username, m.age, m.team_id, t.name AS team_name
FROM members m
JOIN teams t ON t.id = m.team_id";
const BULK_AGE_PLUS: &str = "UPDATE members SET age = age + 1 WHERE age >= :age";

/// Projection row for [`MemberDto`] queries.
#[derive(FromRow)]
struct MemberDtoRow {
    id: i64,
    username: String,
    team_name: String,
}

/// The validated derived-query table, built once per repository.
struct MemberQueries {
    by_username_and_age_gt: DerivedQuery,
    by_team: DerivedQuery,
    by_age: DerivedQuery,
}

impl MemberQueries {
    fn build() -> Result<Self, DataError> {
        Ok(Self {
            by_username_and_age_gt: DerivedQuery::new(
                TABLE,
                COLUMNS,
                vec![Predicate::eq("username"), Predicate::gt("age")],
            )?,
            by_team: DerivedQuery::new(TABLE, COLUMNS, vec![Predicate::eq("team_id")])?,
            by_age: DerivedQuery::new(TABLE, COLUMNS, vec![Predicate::new("age", Operator::Eq)])?,
        })
    }
}

/// SQLite implementation of MemberRepository
///
/// Holds the shared session of one transaction boundary plus its derived
/// finder definitions, validated at construction.
pub struct SqliteMemberRepository {
    session: SharedSession,
    queries: MemberQueries,
}

impl SqliteMemberRepository {
    pub fn new(session: SharedSession) -> Result<Self, DataError> {
        Ok(Self {
            session,
            queries: MemberQueries::build()?,
        })
    }

    pub(crate) fn session(&self) -> &SharedSession {
        &self.session
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn save(&self, member: &Member) -> Result<Member, DataError> {
        let mut session = self.session.lock().await;
        let team_id = member.team().map(|t| t.team_id().value());

        match member.id() {
            None => {
                let expr = QueryExpr::positional(
                    INSERT,
                    vec![
                        Value::from(member.username().to_string()),
                        Value::from(member.age()),
                        Value::from(team_id),
                    ],
                );
                let result = session.execute(&expr).await?;

                let mut saved = member.clone();
                saved.assign_id(MemberId::new(result.last_insert_rowid()));
                session.track_member(&saved);
                Ok(saved)
            }
            Some(id) => {
                // Re-save of an identified entity: deferred until the next
                // flush, visible immediately through the identity map.
                let expr = QueryExpr::positional(
                    UPDATE,
                    vec![
                        Value::from(member.username().to_string()),
                        Value::from(member.age()),
                        Value::from(team_id),
                        Value::from(id.value()),
                    ],
                );
                session.defer(expr);
                session.track_member(member);
                Ok(member.clone())
            }
        }
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, DataError> {
        let mut session = self.session.lock().await;
        if let Some(cached) = session.cached_member(id) {
            return Ok(Some(cached));
        }
        let expr = QueryExpr::positional(SELECT_BY_ID, vec![Value::from(id.value())]);
        let row: Option<MemberRow> = session.fetch_optional(&expr).await?;
        Ok(row.map(|r| session.resolve_member(r)))
    }

    async fn find_all(&self) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let rows: Vec<MemberRow> = session.fetch_all(&QueryExpr::new(SELECT_ALL)).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }

    async fn count(&self) -> Result<u64, DataError> {
        let mut session = self.session.lock().await;
        let (count,): (i64,) = session.fetch_one(&QueryExpr::new(COUNT)).await?;
        Ok(count as u64)
    }

    async fn delete(&self, member: &Member) -> Result<(), DataError> {
        let Some(id) = member.id() else {
            return Ok(());
        };
        let mut session = self.session.lock().await;
        session.evict_member(id);
        let expr = QueryExpr::positional(DELETE, vec![Value::from(id.value())]);
        session.execute(&expr).await?;
        Ok(())
    }

    async fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let expr = self
            .queries
            .by_username_and_age_gt
            .select(vec![Value::from(username), Value::from(age)])?;
        let rows: Vec<MemberRow> = session.fetch_all(&expr).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }

    async fn find_by_team(&self, team_id: TeamId) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let expr = self
            .queries
            .by_team
            .select(vec![Value::from(team_id.value())])?;
        let rows: Vec<MemberRow> = session.fetch_all(&expr).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }

    async fn find_by_age(
        &self,
        age: i32,
        page: &PageRequest,
    ) -> Result<Page<Member>, DataError> {
        let mut session = self.session.lock().await;

        let count_expr = self.queries.by_age.count(vec![Value::from(age)])?;
        let (total,): (i64,) = session.fetch_one(&count_expr).await?;

        let page_expr = self.queries.by_age.select_page(vec![Value::from(age)], page)?;
        let rows: Vec<MemberRow> = session.fetch_all(&page_expr).await?;
        let content = rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect();

        Ok(Page::new(content, page, total as u64))
    }

    async fn find_user(&self, username: &str, age: i32) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let expr = QueryExpr::named(FIND_USER)
            .bind("username", username)
            .bind("age", age);
        let rows: Vec<MemberRow> = session.fetch_all(&expr).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }

    async fn find_username_list(&self) -> Result<Vec<String>, DataError> {
        let mut session = self.session.lock().await;
        let rows: Vec<(String,)> = session
            .fetch_all(&QueryExpr::new(FIND_USERNAME_LIST))
            .await?;
        Ok(rows.into_iter().map(|(username,)| username).collect())
    }

    async fn find_member_dto(&self) -> Result<Vec<MemberDto>, DataError> {
        let mut session = self.session.lock().await;
        let rows: Vec<MemberDtoRow> = session
            .fetch_all(&QueryExpr::new(FIND_MEMBER_DTO))
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| MemberDto {
                id: MemberId::new(r.id),
                username: r.username,
                team_name: r.team_name,
            })
            .collect())
    }

    async fn find_by_names(&self, names: &[&str]) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let values = names.iter().map(|n| Value::from(*n)).collect();
        let expr = QueryExpr::named(FIND_BY_NAMES).bind_list("names", values);
        let rows: Vec<MemberRow> = session.fetch_all(&expr).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }

    async fn find_member_fetch_join(&self) -> Result<Vec<Member>, DataError> {
        let mut session = self.session.lock().await;
        let rows: Vec<MemberWithTeamRow> =
            session.fetch_all(&QueryExpr::new(FETCH_JOIN)).await?;
        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            members.push(session.resolve_member_with_team(row)?);
        }
        Ok(members)
    }

    async fn bulk_age_plus(&self, threshold_age: i32) -> Result<u64, DataError> {
        let mut session = self.session.lock().await;
        let expr = QueryExpr::named(BULK_AGE_PLUS).bind("age", threshold_age);
        let result = session.execute(&expr).await?;
        tracing::debug!(rows = result.rows_affected(), "bulk age increment");
        Ok(result.rows_affected())
    }
}
