//! Integration tests for the repository layer
//!
//! These tests verify the repository facades against an in-memory SQLite
//! database: generic CRUD, derived and declared queries, paging, bulk
//! updates, lazy association loading, and the custom extension. Each test
//! runs in its own database and transaction boundary.

use roster_data::domain::member::Member;
use roster_data::domain::page::{Direction, PageRequest, Sort};
use roster_data::domain::repositories::{
    MemberRepository, MemberRepositoryCustom, TeamRepository,
};
use roster_data::domain::team::Team;
use roster_data::infrastructure::repositories::{SqliteMemberRepository, SqliteTeamRepository};
use roster_data::infrastructure::{Database, SharedSession};

/// Set up a fresh database with one open session
async fn setup() -> (Database, SharedSession) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::in_memory()
        .await
        .expect("Failed to connect to in-memory database");
    db.migrate().await.expect("Failed to migrate schema");

    let session = db.begin().await.expect("Failed to open session");
    (db, session)
}

fn member_repo(session: &SharedSession) -> SqliteMemberRepository {
    SqliteMemberRepository::new(session.clone()).expect("valid finder definitions")
}

fn team_repo(session: &SharedSession) -> SqliteTeamRepository {
    SqliteTeamRepository::new(session.clone())
}

#[tokio::test]
async fn save_assigns_identity_and_find_by_id_round_trips() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    let member = Member::new("memberA", 0);
    let saved = repo.save(&member).await.expect("Failed to save member");
    let id = saved.id().expect("identity assigned on first save");

    let found = repo
        .find_by_id(id)
        .await
        .expect("Failed to find member by id")
        .expect("member should be found");

    assert_eq!(found.id(), saved.id());
    assert_eq!(found.username(), saved.username());
    assert_eq!(found, saved);
}

#[tokio::test]
async fn basic_crud() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    let member1 = repo.save(&Member::new("member1", 10)).await.expect("save");
    let member2 = repo.save(&Member::new("member2", 20)).await.expect("save");

    // Single lookups
    let found1 = repo
        .find_by_id(member1.id().expect("id"))
        .await
        .expect("find")
        .expect("member1 found");
    let found2 = repo
        .find_by_id(member2.id().expect("id"))
        .await
        .expect("find")
        .expect("member2 found");
    assert_eq!(found1, member1);
    assert_eq!(found2, member2);

    // List lookup
    let all = repo.find_all().await.expect("find_all");
    assert_eq!(all.len(), 2);

    // Count
    assert_eq!(repo.count().await.expect("count"), 2);

    // Delete: count after N saves and M deletes is N - M
    repo.delete(&member1).await.expect("delete");
    repo.delete(&member2).await.expect("delete");
    assert_eq!(repo.count().await.expect("count"), 0);

    // Deleting again is a no-op
    repo.delete(&member1).await.expect("idempotent delete");

    // Update: re-saving an identified member changes its fields
    let mut member3 = repo.save(&Member::new("member3", 30)).await.expect("save");
    member3.set_username("renamed");
    repo.save(&member3).await.expect("re-save");

    let found3 = repo
        .find_by_id(member3.id().expect("id"))
        .await
        .expect("find")
        .expect("member3 found");
    assert_eq!(found3.username(), "renamed");

    // The deferred update is flushed before queries run
    let via_query = repo.find_user("renamed", 30).await.expect("find_user");
    assert_eq!(via_query.len(), 1);
}

#[tokio::test]
async fn derived_finder_applies_and_semantics() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    repo.save(&Member::new("aaa", 10)).await.expect("save");
    repo.save(&Member::new("bbb", 20)).await.expect("save");
    // Fails the age predicate, passes the username predicate
    repo.save(&Member::new("aaa", 3)).await.expect("save");

    let result = repo
        .find_by_username_and_age_greater_than("aaa", 5)
        .await
        .expect("derived finder");

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].username(), "aaa");
    assert_eq!(result[0].age(), 10);
}

#[tokio::test]
async fn declared_query_binds_named_parameters() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    let m1 = repo.save(&Member::new("aaa", 10)).await.expect("save");
    repo.save(&Member::new("bbb", 20)).await.expect("save");

    let result = repo.find_user("aaa", 10).await.expect("find_user");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0], m1);
}

#[tokio::test]
async fn username_list_is_a_scalar_projection() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    repo.save(&Member::new("aaa", 10)).await.expect("save");
    repo.save(&Member::new("bbb", 20)).await.expect("save");

    let mut usernames = repo.find_username_list().await.expect("username list");
    usernames.sort();
    assert_eq!(usernames, vec!["aaa".to_string(), "bbb".to_string()]);
}

#[tokio::test]
async fn member_dto_projects_the_team_name() {
    let (_db, session) = setup().await;
    let members = member_repo(&session);
    let teams = team_repo(&session);

    let team = teams
        .save(&Team::new("teamA").expect("valid team"))
        .await
        .expect("save team");

    let m1 = Member::with_team("aaa", 10, &team).expect("valid member");
    let m2 = Member::with_team("bbb", 20, &team).expect("valid member");
    members.save(&m1).await.expect("save");
    members.save(&m2).await.expect("save");
    // No team, so no projection row
    members.save(&Member::new("ccc", 30)).await.expect("save");

    let dtos = members.find_member_dto().await.expect("dto query");
    assert_eq!(dtos.len(), 2);
    assert!(dtos.iter().all(|dto| dto.team_name == "teamA"));
}

#[tokio::test]
async fn find_by_names_expands_the_list_parameter() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    repo.save(&Member::new("aaa", 10)).await.expect("save");
    repo.save(&Member::new("bbb", 20)).await.expect("save");
    repo.save(&Member::new("ccc", 30)).await.expect("save");

    let result = repo
        .find_by_names(&["aaa", "bbb"])
        .await
        .expect("find_by_names");
    assert_eq!(result.len(), 2);

    // An empty list is a caller bug, not an empty result
    assert!(repo.find_by_names(&[]).await.is_err());
}

#[tokio::test]
async fn paging_returns_content_and_totals() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    for i in 1..=5 {
        repo.save(&Member::new(format!("member{i}"), 10))
            .await
            .expect("save");
    }

    let request = PageRequest::of(0, 3).with_sort(Sort::by(Direction::Desc, "username"));
    let page = repo.find_by_age(10, &request).await.expect("find_by_age");

    assert_eq!(page.content().len(), 3);
    assert_eq!(page.total_elements(), 5);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.size(), 3);
    assert_eq!(page.number(), 0);
    assert!(page.is_first());
    assert!(page.has_next());
    assert_eq!(page.content()[0].username(), "member5");

    let request = PageRequest::of(1, 3).with_sort(Sort::by(Direction::Desc, "username"));
    let last = repo.find_by_age(10, &request).await.expect("find_by_age");
    assert_eq!(last.content().len(), 2);
    assert!(last.is_last());
    assert!(!last.has_next());
}

#[tokio::test]
async fn bulk_update_counts_rows_and_requires_clear_for_fresh_reads() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    for (name, age) in [
        ("member1", 10),
        ("member2", 19),
        ("member3", 20),
        ("member4", 21),
        ("member5", 40),
    ] {
        repo.save(&Member::new(name, age)).await.expect("save");
    }

    let affected = repo.bulk_age_plus(20).await.expect("bulk update");
    assert_eq!(affected, 3);

    // The bulk write bypassed the identity map: the row matches the new
    // age, but the tracked entity still carries the old one.
    let stale = repo.find_user("member5", 41).await.expect("find_user");
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].age(), 40);

    // After detaching everything, reads reflect the bulk write.
    session.lock().await.clear();
    let fresh = repo.find_user("member5", 41).await.expect("find_user");
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].age(), 41);
}

#[tokio::test]
async fn lazy_team_loads_on_demand_after_clear() {
    let (_db, session) = setup().await;
    let members = member_repo(&session);
    let teams = team_repo(&session);

    let team_a = teams
        .save(&Team::new("teamA").expect("valid team"))
        .await
        .expect("save team");
    let team_b = teams
        .save(&Team::new("teamB").expect("valid team"))
        .await
        .expect("save team");

    members
        .save(&Member::with_team("member1", 10, &team_a).expect("valid member"))
        .await
        .expect("save");
    members
        .save(&Member::with_team("member2", 10, &team_b).expect("valid member"))
        .await
        .expect("save");

    {
        let mut s = session.lock().await;
        s.flush().await.expect("flush");
        s.clear();
    }

    let all = members.find_all().await.expect("find_all");
    assert_eq!(all.len(), 2);

    for member in &all {
        let lazy = member.team().expect("team reference");
        // Not resolved yet
        assert!(lazy.get().is_none());

        let team = lazy.load(&teams).await.expect("lazy load");
        let expected = match member.username() {
            "member1" => "teamA",
            _ => "teamB",
        };
        assert_eq!(team.name(), expected);
        // Memoized now
        assert!(lazy.get().is_some());
    }
}

#[tokio::test]
async fn lazy_team_is_loaded_at_most_once() {
    let (_db, session) = setup().await;
    let members = member_repo(&session);
    let teams = team_repo(&session);

    let team = teams
        .save(&Team::new("teamA").expect("valid team"))
        .await
        .expect("save team");
    members
        .save(&Member::with_team("member1", 10, &team).expect("valid member"))
        .await
        .expect("save");

    {
        let mut s = session.lock().await;
        s.flush().await.expect("flush");
        s.clear();
    }

    let member = members
        .find_all()
        .await
        .expect("find_all")
        .pop()
        .expect("member present");
    let lazy = member.team().expect("team reference");

    let first = lazy.load(&teams).await.expect("first load").name().to_string();

    // Rename the team behind the reference; the memoized value must win.
    let mut renamed = team.clone();
    renamed.set_name("renamed");
    teams.save(&renamed).await.expect("re-save team");

    let second = lazy.load(&teams).await.expect("second load");
    assert_eq!(second.name(), first);
}

#[tokio::test]
async fn fetch_join_resolves_the_team_up_front() {
    let (_db, session) = setup().await;
    let members = member_repo(&session);
    let teams = team_repo(&session);

    let team = teams
        .save(&Team::new("teamA").expect("valid team"))
        .await
        .expect("save team");
    members
        .save(&Member::with_team("member1", 10, &team).expect("valid member"))
        .await
        .expect("save");

    {
        let mut s = session.lock().await;
        s.flush().await.expect("flush");
        s.clear();
    }

    let joined = members.find_member_fetch_join().await.expect("fetch join");
    assert_eq!(joined.len(), 1);

    let lazy = joined[0].team().expect("team reference");
    let resolved = lazy.get().expect("resolved without a load");
    assert_eq!(resolved.name(), "teamA");
}

#[tokio::test]
async fn custom_extension_shares_the_session() {
    let (_db, session) = setup().await;
    let repo = member_repo(&session);

    repo.save(&Member::new("member1", 10)).await.expect("save");
    repo.save(&Member::new("member2", 20)).await.expect("save");

    let result = repo.find_member_custom().await.expect("custom query");
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn find_by_team_reads_the_inverse_collection() {
    let (_db, session) = setup().await;
    let members = member_repo(&session);
    let teams = team_repo(&session);

    let team_a = teams
        .save(&Team::new("teamA").expect("valid team"))
        .await
        .expect("save team");
    let team_b = teams
        .save(&Team::new("teamB").expect("valid team"))
        .await
        .expect("save team");

    members
        .save(&Member::with_team("member1", 10, &team_a).expect("valid member"))
        .await
        .expect("save");
    members
        .save(&Member::with_team("member2", 10, &team_a).expect("valid member"))
        .await
        .expect("save");
    members
        .save(&Member::with_team("member3", 10, &team_b).expect("valid member"))
        .await
        .expect("save");

    let of_a = members
        .find_by_team(team_a.id().expect("id"))
        .await
        .expect("find_by_team");
    assert_eq!(of_a.len(), 2);
}
