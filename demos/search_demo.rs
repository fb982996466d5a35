//! # Member Search Demo
//!
//! Runs the member/team search on an in-process roster, then repeats the
//! paginated search against PostgreSQL when a configuration is available
//! (`ROSTER_SEARCH_CONFIG` or `./roster_search.toml`).
//!
//! ```bash
//! RUST_LOG=roster_search=debug cargo run --example search_demo --features debug-logging
//! ```

use roster_search::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn demo_roster() -> Result<Roster, RosterError> {
    let mut roster = Roster::new();
    let team_a = roster.add_team("teamA");
    let team_b = roster.add_team("teamB");

    roster.add_member(Some("member1"), 10, Some(team_a))?;
    roster.add_member(Some("member2"), 20, Some(team_a))?;
    roster.add_member(Some("member3"), 30, Some(team_b))?;
    roster.add_member(Some("member4"), 40, Some(team_b))?;
    roster.add_member(None, 50, None)?;
    Ok(roster)
}

fn print_page(page: &Page<MemberTeamDto>) {
    for member in &page.content {
        println!(
            "   #{} {:<10} age {:>3}  team {}",
            member.member_id,
            member.username.as_deref().unwrap_or("-"),
            member.age,
            member.team_name.as_deref().unwrap_or("-")
        );
    }
    println!(
        "   page {} of {} ({} shown, {} total)",
        page.page + 1,
        page.total_pages(),
        page.number_of_elements(),
        page.total
    );
}

async fn run_searches<E: QueryExecutor>(members: &MemberRepository<E>) -> anyhow::Result<()> {
    println!("\n🔍 Team A, aged 10 or more");
    let condition = MemberSearchCondition::new().team_name("teamA").age_goe(10);
    print_page(&members.search_page(&condition, &PageRequest::first(10)).await?);

    println!("\n📄 Everyone, two per page");
    let mut request = PageRequest::first(2);
    loop {
        let page = members
            .search_page(&MemberSearchCondition::new(), &request)
            .await?;
        print_page(&page);
        if !page.has_next() {
            break;
        }
        request = request.next();
    }

    println!("\n📊 Team statistics");
    for stats in members
        .team_statistics(&MemberSearchCondition::new())
        .await?
    {
        println!(
            "   {:<6} {} members, average age {:.1}",
            stats.team_name,
            stats.member_count,
            stats.average_age.unwrap_or_default()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🚀 roster-search demo");
    println!("=====================");

    println!("\n🧠 In-process roster");
    let members = MemberRepository::new(MemoryExecutor::new(demo_roster()?));
    run_searches(&members).await?;

    println!("\n✏️  Bulk operations");
    let renamed = members
        .bulk_update(
            &MemberSearchCondition::new().age_loe(27),
            UpdateSet::new().set("username", json!("junior")),
        )
        .await?;
    println!("   renamed {} members", renamed);

    let aged = members
        .bulk_update(
            &MemberSearchCondition::new(),
            UpdateSet::new().increment("age", json!(1)),
        )
        .await?;
    println!("   aged {} members by one year", aged);

    let deleted = members
        .bulk_delete(&MemberSearchCondition::new().team_name("teamB"))
        .await?;
    println!("   removed {} members of teamB", deleted);
    print_page(
        &members
            .search_page(&MemberSearchCondition::new(), &PageRequest::first(10))
            .await?,
    );

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            println!("\n⏭️  Skipping PostgreSQL run: {}", error);
            return Ok(());
        }
    };

    println!("\n🐘 PostgreSQL");
    let roster_search = RosterSearch::new(&config).await?;
    roster_search.health_check().await?;
    roster_search.auto_migrate(true).await?;
    roster_search.seed(&demo_roster()?).await?;
    run_searches(&roster_search.repository()).await?;

    println!("\n✅ Done");
    Ok(())
}
