use std::{collections::HashMap, future::Future};

use anyhow::Context;
use sqlx::PgPool;
use tokio::time::Interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{HouseholdSummary, NewHousehold};
use super::repo::{self, Household, MemberRole};

/// Households the user belongs to, with member and open-task counts.
///
/// Memberships first, then the households for that id set, then one pair of
/// count queries per household.
pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<HouseholdSummary>> {
    let memberships = repo::memberships_for_user(db, user_id).await?;
    if memberships.is_empty() {
        return Ok(Vec::new());
    }
    let roles: HashMap<Uuid, MemberRole> = memberships
        .iter()
        .map(|m| (m.household_id, m.role))
        .collect();
    let ids: Vec<Uuid> = roles.keys().copied().collect();

    let households = repo::households_by_ids(db, &ids).await?;
    let mut out = Vec::with_capacity(households.len());
    for household in households {
        let member_count = repo::count_members(db, household.id).await?;
        let open_task_count = repo::count_open_tasks(db, household.id).await?;
        let role = roles.get(&household.id).copied().unwrap_or(MemberRole::Member);
        out.push(HouseholdSummary {
            household,
            role,
            member_count,
            open_task_count,
        });
    }
    debug!(user_id = %user_id, count = out.len(), "listed households");
    Ok(out)
}

/// Creates the household and the creator's admin membership together.
pub async fn create_household(db: &PgPool, user_id: Uuid, input: NewHousehold) -> anyhow::Result<Household> {
    let mut tx = db.begin().await.context("begin tx")?;
    let household =
        repo::insert_household_tx(&mut tx, &input.name, input.description.as_deref(), user_id).await?;
    repo::insert_member_tx(&mut tx, household.id, user_id, MemberRole::Admin)
        .await?
        .context("creator membership already present")?;
    tx.commit().await.context("commit tx")?;

    info!(household_id = %household.id, user_id = %user_id, "household created");
    Ok(household)
}

/// Order-insensitive identity of a household list, used to detect changes.
pub fn fingerprint(list: &[HouseholdSummary]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = list.iter().map(|s| s.household.id).collect();
    ids.sort_unstable();
    ids
}

/// Polls `list` on every tick until its household set differs from `last`.
///
/// The first tick fires at once, so a fresh watcher gets the current list
/// straight away. Failed polls are logged and retried on the next tick.
pub async fn next_change<F, Fut>(
    ticker: &mut Interval,
    last: &mut Option<Vec<Uuid>>,
    mut list: F,
) -> Vec<HouseholdSummary>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<HouseholdSummary>>>,
{
    loop {
        ticker.tick().await;
        let current = match list().await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "household poll failed");
                continue;
            }
        };
        let ids = fingerprint(&current);
        if last.as_ref() != Some(&ids) {
            *last = Some(ids);
            return current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{ready, Ready};
    use std::{collections::VecDeque, time::Duration};
    use time::OffsetDateTime;
    use tokio::time::{interval, Instant};

    fn summary(id: Uuid) -> HouseholdSummary {
        HouseholdSummary {
            household: Household {
                id,
                name: "Home".into(),
                description: None,
                created_by: Uuid::new_v4(),
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            },
            role: MemberRole::Member,
            member_count: 1,
            open_task_count: 0,
        }
    }

    #[test]
    fn fingerprint_ignores_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            fingerprint(&[summary(a), summary(b)]),
            fingerprint(&[summary(b), summary(a)])
        );
    }

    #[test]
    fn fingerprint_changes_when_household_added() {
        let a = Uuid::new_v4();
        let before = fingerprint(&[summary(a)]);
        let after = fingerprint(&[summary(a), summary(Uuid::new_v4())]);
        assert_ne!(before, after);
    }

    type Polls = VecDeque<anyhow::Result<Vec<HouseholdSummary>>>;

    /// Listing that replays `polls` and counts calls.
    fn replay<'a>(
        polls: &'a mut Polls,
        calls: &'a mut usize,
    ) -> impl FnMut() -> Ready<anyhow::Result<Vec<HouseholdSummary>>> + 'a {
        move || {
            *calls += 1;
            ready(polls.pop_front().expect("poll beyond script"))
        }
    }

    fn ticker() -> Interval {
        interval(Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn first_listing_is_sent_immediately() {
        let a = Uuid::new_v4();
        let mut polls: Polls = VecDeque::from([Ok(vec![summary(a)])]);
        let mut calls = 0;
        let mut last = None;
        let start = Instant::now();

        let mut ticker = ticker();
        let got = next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;

        assert_eq!(fingerprint(&got), vec![a]);
        assert_eq!(last, Some(vec![a]));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_listings_are_not_sent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut polls: Polls = VecDeque::from([
            Ok(vec![summary(a)]),
            Ok(vec![summary(a)]),
            Ok(vec![summary(b), summary(a)]),
        ]);
        let mut calls = 0;
        let mut last = None;
        let mut ticker = ticker();

        next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;
        let start = Instant::now();
        let got = next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;

        assert_eq!(got.len(), 2);
        assert_eq!(calls, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_is_skipped() {
        let a = Uuid::new_v4();
        let mut polls: Polls = VecDeque::from([
            Err(anyhow::anyhow!("connection reset")),
            Ok(vec![summary(a)]),
        ]);
        let mut calls = 0;
        let mut last = None;

        let mut ticker = ticker();
        let got = next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;

        assert_eq!(fingerprint(&got), vec![a]);
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_every_household_is_a_change() {
        let a = Uuid::new_v4();
        let mut polls: Polls = VecDeque::from([Ok(vec![summary(a)]), Ok(vec![])]);
        let mut calls = 0;
        let mut last = None;
        let mut ticker = ticker();

        next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;
        let got = next_change(&mut ticker, &mut last, replay(&mut polls, &mut calls)).await;

        assert!(got.is_empty());
        assert_eq!(last, Some(vec![]));
    }
}
