use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use uuid::Uuid;

use super::repo::SharedMembership;

/// Someone the caller shares at least one household with.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Contact {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub shared_households: usize,
    pub household_ids: Vec<Uuid>,
}

impl Contact {
    fn sort_key(&self) -> String {
        self.name.as_deref().unwrap_or(&self.email).to_lowercase()
    }
}

/// Groups membership rows by member, counting distinct shared households.
/// The caller is left out.
pub fn group_contacts(rows: Vec<SharedMembership>, me: Uuid) -> Vec<Contact> {
    let mut by_user: HashMap<Uuid, (SharedMembership, BTreeSet<Uuid>)> = HashMap::new();
    for row in rows.into_iter().filter(|r| r.user_id != me) {
        let household_id = row.household_id;
        by_user
            .entry(row.user_id)
            .or_insert_with(|| (row, BTreeSet::new()))
            .1
            .insert(household_id);
    }

    let mut contacts: Vec<Contact> = by_user
        .into_values()
        .map(|(first, households)| Contact {
            user_id: first.user_id,
            email: first.email,
            name: first.name.or(first.display_name),
            avatar_url: first.avatar_url,
            shared_households: households.len(),
            household_ids: households.into_iter().collect(),
        })
        .collect();

    contacts.sort_by(|a, b| {
        b.shared_households
            .cmp(&a.shared_households)
            .then_with(|| a.sort_key().cmp(&b.sort_key()))
    });
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: Uuid, household_id: Uuid, email: &str, name: Option<&str>) -> SharedMembership {
        SharedMembership {
            user_id,
            household_id,
            email: email.into(),
            name: name.map(String::from),
            display_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn counts_shared_households_across_overlaps() {
        let me = Uuid::new_v4();
        let (ana, ben) = (Uuid::new_v4(), Uuid::new_v4());
        let (h1, h2, h3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let rows = vec![
            row(me, h1, "me@x.io", Some("Me")),
            row(me, h2, "me@x.io", Some("Me")),
            row(me, h3, "me@x.io", Some("Me")),
            row(ana, h1, "ana@x.io", Some("Ana")),
            row(ana, h2, "ana@x.io", Some("Ana")),
            row(ana, h3, "ana@x.io", Some("Ana")),
            row(ben, h2, "ben@x.io", Some("Ben")),
        ];

        let contacts = group_contacts(rows, me);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].user_id, ana);
        assert_eq!(contacts[0].shared_households, 3);
        assert_eq!(contacts[1].user_id, ben);
        assert_eq!(contacts[1].shared_households, 1);
        assert_eq!(contacts[1].household_ids, vec![h2]);
    }

    #[test]
    fn duplicate_rows_do_not_inflate_count() {
        let me = Uuid::new_v4();
        let cat = Uuid::new_v4();
        let h = Uuid::new_v4();
        let rows = vec![row(cat, h, "cat@x.io", None), row(cat, h, "cat@x.io", None)];
        let contacts = group_contacts(rows, me);
        assert_eq!(contacts[0].shared_households, 1);
    }

    #[test]
    fn caller_alone_yields_empty_list() {
        let me = Uuid::new_v4();
        let rows = vec![row(me, Uuid::new_v4(), "me@x.io", None)];
        assert!(group_contacts(rows, me).is_empty());
    }

    #[test]
    fn ties_sort_by_name_then_email() {
        let me = Uuid::new_v4();
        let h = Uuid::new_v4();
        let rows = vec![
            row(Uuid::new_v4(), h, "zed@x.io", Some("zed")),
            row(Uuid::new_v4(), h, "bo@x.io", None),
            row(Uuid::new_v4(), h, "al@x.io", Some("Al")),
        ];
        let names: Vec<String> = group_contacts(rows, me)
            .into_iter()
            .map(|c| c.email)
            .collect();
        assert_eq!(names, ["al@x.io", "bo@x.io", "zed@x.io"]);
    }

    #[test]
    fn membership_display_name_fills_missing_profile_name() {
        let me = Uuid::new_v4();
        let mut r = row(Uuid::new_v4(), Uuid::new_v4(), "dee@x.io", None);
        r.display_name = Some("Dee".into());
        assert_eq!(group_contacts(vec![r], me)[0].name.as_deref(), Some("Dee"));
    }
}
