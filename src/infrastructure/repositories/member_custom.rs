use async_trait::async_trait;

use crate::domain::member::Member;
use crate::domain::repositories::MemberRepositoryCustom;
use crate::error::DataError;
use crate::infrastructure::repositories::sqlite_member_repository::SqliteMemberRepository;
use crate::infrastructure::session::MemberRow;
use crate::query::QueryExpr;

// Hand-written extension composed into the generated facade: same
// concrete type, same session handle, no second transaction.
#[async_trait]
impl MemberRepositoryCustom for SqliteMemberRepository {
    async fn find_member_custom(&self) -> Result<Vec<Member>, DataError> {
        let mut session = self.session().lock().await;
        let expr = QueryExpr::new("SELECT id, username, age, team_id FROM members");
        let rows: Vec<MemberRow> = session.fetch_all(&expr).await?;
        Ok(rows
            .into_iter()
            .map(|r| session.resolve_member(r))
            .collect())
    }
}
