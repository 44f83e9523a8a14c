//! Member profile operations: listing, lookup and the owner-only lifecycle.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{
    self, DbPool, MemberFilter, MemberProfile, MemberQuery, MemberResponse, MemberWithUser, User,
};
use crate::error::{conflict_on_unique, ServiceError, ServiceResult};
use crate::policy::{authorize, Action};
use crate::validation::{
    check_profile_rules, validate_member_create, validate_member_update, Input,
};

const PROFILE_EXISTS: &str = "User already has a member profile.";
const MAX_EXPIRING_DAYS: i64 = 365;

/// Pagination metadata of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
    /// 1-based index of the first item on the page, absent when the page is empty
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl PageMeta {
    pub fn new(total: i64, per_page: i64, current_page: i64, items: usize) -> Self {
        let last_page = ((total + per_page - 1) / per_page).max(1);
        let offset = (current_page - 1).saturating_mul(per_page);
        let (from, to) = if items == 0 {
            (None, None)
        } else {
            (
                Some(offset.saturating_add(1)),
                Some(offset.saturating_add(items as i64)),
            )
        };
        Self {
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemberPage {
    pub data: Vec<MemberWithUser>,
    pub meta: PageMeta,
}

pub struct MemberService<'a> {
    db: &'a DbPool,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> MemberService<'a> {
    pub fn new(db: &'a DbPool, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self { db, config, clock }
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    /// Render a profile for the wire as of today
    pub fn present(&self, member: MemberWithUser) -> MemberResponse {
        member.into_response(self.clock.today())
    }

    /// One page of non-deleted profiles, sorted by last then first name
    pub async fn list_members(
        &self,
        filter: MemberFilter,
        page: Option<i64>,
        per_page: Option<i64>,
        search: Option<&str>,
    ) -> ServiceResult<MemberPage> {
        let per_page = self.config.members.clamp_per_page(per_page);
        let page = page.unwrap_or(1).max(1);

        let query = MemberQuery::new().filter(filter).search(search);
        let total = query.count(self.db).await?;
        // a page far past the end saturates to an offset that returns nothing
        let offset = (page - 1).saturating_mul(per_page);
        let profiles = query.fetch_page(self.db, per_page, offset).await?;

        let meta = PageMeta::new(total, per_page, page, profiles.len());
        let data = self.attach_users(profiles).await?;

        Ok(MemberPage { data, meta })
    }

    /// Load the owning users of `profiles` in one query
    async fn attach_users(&self, profiles: Vec<MemberProfile>) -> ServiceResult<Vec<MemberWithUser>> {
        let ids: Vec<String> = profiles.iter().map(|p| p.user_id.clone()).collect();
        let users: HashMap<String, User> = db::find_users_by_ids(self.db, &ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(profiles
            .into_iter()
            .map(|profile| {
                let user = users.get(&profile.user_id).cloned();
                MemberWithUser { profile, user }
            })
            .collect())
    }

    /// Look a profile up by id; soft-deleted ones only with `include_trashed`
    pub async fn find_member(&self, id: i64, include_trashed: bool) -> ServiceResult<MemberProfile> {
        db::find_member(self.db, id, include_trashed)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))
    }

    /// A profile the actor is allowed to view, with its user
    pub async fn get_member(&self, actor: &User, id: i64) -> ServiceResult<MemberWithUser> {
        let profile = self.find_member(id, false).await?;
        authorize(actor, Action::View, Some(&profile))?;
        Ok(MemberWithUser {
            profile,
            user: Some(actor.clone()),
        })
    }

    /// Create the actor's profile; a user never has more than one
    pub async fn create_profile(&self, actor: &User, input: &Input) -> ServiceResult<MemberWithUser> {
        authorize(actor, Action::Create, None)?;
        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = db::begin_write(self.db).await?;

        if db::find_member_by_user(&mut *tx, &actor.id, true)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(PROFILE_EXISTS.to_string()));
        }

        let fields = validate_member_create(input, today)?;

        let id = db::insert_member(&mut *tx, &actor.id, &fields, now)
            .await
            .map_err(|e| conflict_on_unique(e, PROFILE_EXISTS))?;

        let profile = db::find_member(&mut *tx, id, false)
            .await?
            .ok_or_else(|| ServiceError::Internal("created profile vanished".to_string()))?;

        tx.commit().await?;

        info!(user_id = %actor.id, member_id = id, "Member profile created");
        Ok(MemberWithUser {
            profile,
            user: Some(actor.clone()),
        })
    }

    /// Apply a partial update to the actor's own profile
    pub async fn update_profile(
        &self,
        actor: &User,
        id: i64,
        input: &Input,
    ) -> ServiceResult<MemberWithUser> {
        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = db::begin_write(self.db).await?;

        let current = db::find_member(&mut *tx, id, false)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))?;
        authorize(actor, Action::Update, Some(&current))?;

        let changes = validate_member_update(input, today)?;
        let merged = changes.apply(&current.fields);
        check_profile_rules(&merged, today)?;

        db::update_member(&mut *tx, id, &merged, now).await?;

        let profile = db::find_member(&mut *tx, id, false)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))?;

        tx.commit().await?;

        info!(user_id = %actor.id, member_id = id, "Member profile updated");
        Ok(MemberWithUser {
            profile,
            user: Some(actor.clone()),
        })
    }

    /// Soft-delete the actor's own profile
    pub async fn delete_profile(&self, actor: &User, id: i64) -> ServiceResult<()> {
        let now = self.clock.now();
        let mut tx = db::begin_write(self.db).await?;

        let current = db::find_member(&mut *tx, id, false)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))?;
        authorize(actor, Action::Delete, Some(&current))?;

        db::set_deleted_at(&mut *tx, id, Some(now), now).await?;
        tx.commit().await?;

        info!(user_id = %actor.id, member_id = id, "Member profile deleted");
        Ok(())
    }

    /// Bring back a soft-deleted profile
    pub async fn restore_profile(&self, actor: &User, id: i64) -> ServiceResult<MemberWithUser> {
        let now = self.clock.now();
        let mut tx = db::begin_write(self.db).await?;

        let current = db::find_member(&mut *tx, id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))?;
        authorize(actor, Action::Restore, Some(&current))?;

        if !current.is_trashed() {
            return Err(ServiceError::Conflict("Member is not deleted.".to_string()));
        }

        db::set_deleted_at(&mut *tx, id, None, now).await?;

        let profile = db::find_member(&mut *tx, id, false)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))?;

        tx.commit().await?;

        info!(user_id = %actor.id, member_id = id, "Member profile restored");
        Ok(MemberWithUser {
            profile,
            user: Some(actor.clone()),
        })
    }

    /// Active profiles whose membership ends within `within_days` of today
    pub async fn list_expiring_memberships(
        &self,
        within_days: Option<i64>,
    ) -> ServiceResult<Vec<MemberWithUser>> {
        let days = within_days
            .unwrap_or(self.config.members.expiring_within_days)
            .clamp(0, MAX_EXPIRING_DAYS);
        let today = self.clock.today();

        let profiles = db::list_expiring(self.db, today, today + Duration::days(days)).await?;
        self.attach_users(profiles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::{init_memory, MembershipStatus, MembershipType, NewUser};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn input(value: Value) -> Input {
        value.as_object().cloned().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at_date(today())
    }

    async fn user(db: &DbPool, id: &str, email: &str) -> User {
        db::insert_user(
            db,
            &NewUser {
                id,
                name: id,
                email,
                password_hash: "x",
                now: clock().now(),
            },
        )
        .await
        .unwrap();
        db::find_user_by_id(db, id).await.unwrap().unwrap()
    }

    fn basic(first: &str, last: &str) -> Input {
        input(json!({"first_name": first, "last_name": last}))
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let created = members
            .create_profile(&owner, &basic("Lim", "Mei Ling"))
            .await
            .unwrap();
        let fields = &created.profile.fields;
        assert_eq!(fields.membership_start_date, today());
        assert_eq!(fields.membership_status, MembershipStatus::Active);
        assert_eq!(fields.membership_type, MembershipType::Basic);

        let fetched = members.get_member(&owner, created.profile.id).await.unwrap();
        assert_eq!(fetched.profile, created.profile);

        let again = members.get_member(&owner, created.profile.id).await.unwrap();
        assert_eq!(again.profile, fetched.profile);
    }

    #[tokio::test]
    async fn test_second_create_conflicts() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        members.create_profile(&owner, &basic("A", "B")).await.unwrap();
        let err = members.create_profile(&owner, &basic("C", "D")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == PROFILE_EXISTS));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_profile() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let first_input = basic("A", "B");
        let second_input = basic("C", "D");
        let (first, second) = tokio::join!(
            members.create_profile(&owner, &first_input),
            members.create_profile(&owner, &second_input),
        );

        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let failure = first.err().or(second.err()).unwrap();
        assert!(matches!(failure, ServiceError::Conflict(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member_profiles")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_racing_creates_on_shared_pool_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.data_dir = dir.path().to_path_buf();
        let db = crate::db::init(&config).await.unwrap();
        let clock = clock();

        let mut owners = Vec::new();
        for i in 0..10 {
            owners.push(user(&db, &format!("u{}", i), &format!("u{}@example.com", i)).await);
        }

        let mut tasks = tokio::task::JoinSet::new();
        for owner in &owners {
            for attempt in 0..4 {
                let (db, config, owner) = (db.clone(), config.clone(), owner.clone());
                tasks.spawn(async move {
                    let members = MemberService::new(&db, &config, &clock);
                    let input = basic("Racer", &format!("Attempt{}", attempt));
                    (owner.id.clone(), members.create_profile(&owner, &input).await)
                });
            }
        }

        let mut created: HashMap<String, usize> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (owner_id, result) = joined.unwrap();
            match result {
                Ok(_) => *created.entry(owner_id).or_default() += 1,
                Err(ServiceError::Conflict(message)) => assert_eq!(message, PROFILE_EXISTS),
                Err(other) => panic!("unexpected error for {}: {:?}", owner_id, other),
            }
        }

        assert_eq!(created.len(), owners.len());
        assert!(created.values().all(|count| *count == 1));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member_profiles")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, owners.len() as i64);
    }

    #[tokio::test]
    async fn test_create_validation_is_reported_after_conflict_check() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let err = members
            .create_profile(&owner, &input(json!({"first_name": "A"})))
            .await
            .unwrap_err();
        match err {
            ServiceError::ValidationFailed(errors) => assert!(errors.has("last_name")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_active_status_end_date_boundary() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let yesterday = input(json!({
            "first_name": "A",
            "last_name": "B",
            "membership_start_date": "2026-01-01",
            "membership_end_date": "2026-10-16",
            "membership_status": "active"
        }));
        let err = members.create_profile(&owner, &yesterday).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(ref e) if e.has("membership_status")));

        let on_today = input(json!({
            "first_name": "A",
            "last_name": "B",
            "membership_start_date": "2026-01-01",
            "membership_end_date": "2026-10-17",
            "membership_status": "active"
        }));
        assert!(members.create_profile(&owner, &on_today).await.is_ok());
    }

    #[tokio::test]
    async fn test_date_of_birth_minimum_age() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let young = user(&db, "u1", "young@example.com").await;
        let adult = user(&db, "u2", "adult@example.com").await;

        let seventeen = input(json!({"first_name": "A", "last_name": "B", "date_of_birth": "2009-10-17"}));
        let err = members.create_profile(&young, &seventeen).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(ref e) if e.has("date_of_birth")));

        let eighteen = input(json!({"first_name": "A", "last_name": "B", "date_of_birth": "2008-10-17"}));
        assert!(members.create_profile(&adult, &eighteen).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_users_are_forbidden() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;
        let other = user(&db, "u2", "other@example.com").await;

        let id = members
            .create_profile(&owner, &basic("A", "B"))
            .await
            .unwrap()
            .profile
            .id;

        assert!(matches!(
            members.get_member(&other, id).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            members
                .update_profile(&other, id, &basic("X", "Y"))
                .await
                .unwrap_err(),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            members.delete_profile(&other, id).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));

        // Authorization is checked before the payload is validated
        assert!(matches!(
            members
                .update_profile(&other, id, &input(json!({"phone": "bad"})))
                .await
                .unwrap_err(),
            ServiceError::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn test_update_merges_and_revalidates() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let created = members
            .create_profile(
                &owner,
                &input(json!({
                    "first_name": "A",
                    "last_name": "B",
                    "phone": "0123456789",
                    "membership_start_date": "2026-01-01",
                    "membership_status": "inactive",
                    "membership_end_date": "2026-10-01"
                })),
            )
            .await
            .unwrap();
        let id = created.profile.id;

        let updated = members
            .update_profile(&owner, id, &input(json!({"phone": null, "city": "Penang"})))
            .await
            .unwrap();
        assert_eq!(updated.profile.fields.phone, None);
        assert_eq!(updated.profile.fields.city.as_deref(), Some("Penang"));
        assert_eq!(updated.profile.fields.first_name, "A");

        // Activating against the stored, already-past end date fails
        let err = members
            .update_profile(&owner, id, &input(json!({"membership_status": "active"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(ref e) if e.has("membership_status")));

        let renewed = members
            .update_profile(
                &owner,
                id,
                &input(json!({"membership_status": "active", "membership_end_date": "2027-10-17"})),
            )
            .await
            .unwrap();
        assert_eq!(renewed.profile.fields.membership_status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);
        let owner = user(&db, "u1", "owner@example.com").await;

        let id = members
            .create_profile(&owner, &basic("A", "B"))
            .await
            .unwrap()
            .profile
            .id;

        members.delete_profile(&owner, id).await.unwrap();
        assert!(matches!(
            members.get_member(&owner, id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(members.find_member(id, true).await.unwrap().is_trashed());

        // The trashed profile still occupies the slot
        assert!(matches!(
            members.create_profile(&owner, &basic("C", "D")).await.unwrap_err(),
            ServiceError::Conflict(_)
        ));

        let restored = members.restore_profile(&owner, id).await.unwrap();
        assert!(!restored.profile.is_trashed());
        assert!(members.get_member(&owner, id).await.is_ok());

        assert!(matches!(
            members.restore_profile(&owner, id).await.unwrap_err(),
            ServiceError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_list_members_paginates_and_clamps() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);

        let names = [
            "Zain", "Yusuf", "Xin", "Wong", "Vijay", "Umar", "Tan", "Siva", "Raj", "Quek",
        ];
        for (i, last) in names.iter().enumerate() {
            let owner = user(&db, &format!("u{}", i), &format!("u{}@example.com", i)).await;
            members.create_profile(&owner, &basic("M", last)).await.unwrap();
        }

        let page = members
            .list_members(MemberFilter::All, Some(2), Some(1), None)
            .await
            .unwrap();
        assert_eq!(page.meta.per_page, 5);
        assert_eq!(page.meta.total, 10);
        assert_eq!(page.meta.last_page, 2);
        assert_eq!(page.meta.from, Some(6));
        assert_eq!(page.meta.to, Some(10));
        let lasts: Vec<_> = page.data.iter().map(|m| m.profile.fields.last_name.as_str()).collect();
        assert_eq!(lasts, vec!["Vijay", "Wong", "Xin", "Yusuf", "Zain"]);
        assert!(page.data.iter().all(|m| m.user.is_some()));

        let huge = members
            .list_members(MemberFilter::All, Some(0), Some(1000), None)
            .await
            .unwrap();
        assert_eq!(huge.meta.per_page, 100);
        assert_eq!(huge.meta.current_page, 1);
        assert_eq!(huge.data.len(), 10);

        let empty = members
            .list_members(MemberFilter::All, Some(9), None, None)
            .await
            .unwrap();
        assert!(empty.data.is_empty());
        assert_eq!(empty.meta.from, None);

        let beyond = members
            .list_members(MemberFilter::All, Some(i64::MAX), Some(100), None)
            .await
            .unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.meta.current_page, i64::MAX);
        assert_eq!(beyond.meta.last_page, 1);
        assert_eq!(beyond.meta.total, 10);
    }

    #[tokio::test]
    async fn test_list_members_search_and_filter() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);

        let a = user(&db, "a", "aminah@example.com").await;
        let b = user(&db, "b", "ben@gym.test").await;
        let c = user(&db, "c", "chong@example.com").await;
        members.create_profile(&a, &basic("Aminah", "Yusof")).await.unwrap();
        members
            .create_profile(
                &b,
                &input(json!({"first_name": "Ben", "last_name": "Lee", "membership_type": "vip"})),
            )
            .await
            .unwrap();
        let suspended = input(json!({
            "first_name": "Chong",
            "last_name": "Wei",
            "membership_status": "suspended"
        }));
        members.create_profile(&c, &suspended).await.unwrap();

        let by_full_name = members
            .list_members(MemberFilter::All, None, None, Some("aminah yus"))
            .await
            .unwrap();
        assert_eq!(by_full_name.meta.total, 1);

        let by_email = members
            .list_members(MemberFilter::All, None, None, Some("gym.test"))
            .await
            .unwrap();
        assert_eq!(by_email.data[0].profile.fields.first_name, "Ben");

        let by_type = members
            .list_members(MemberFilter::All, None, None, Some("vip"))
            .await
            .unwrap();
        assert_eq!(by_type.meta.total, 1);

        let short = members
            .list_members(MemberFilter::All, None, None, Some("e"))
            .await
            .unwrap();
        assert_eq!(short.meta.total, 3);

        let active = members
            .list_members(MemberFilter::Active, None, None, None)
            .await
            .unwrap();
        assert_eq!(active.meta.total, 2);
    }

    #[tokio::test]
    async fn test_list_expiring_memberships() {
        let db = init_memory().await.unwrap();
        let config = Config::default();
        let clock = clock();
        let members = MemberService::new(&db, &config, &clock);

        let cases = [
            ("soon", "2026-10-20", "active"),
            ("today", "2026-10-17", "active"),
            ("later", "2026-12-31", "active"),
            ("frozen", "2026-10-25", "suspended"),
        ];
        for (id, end, status) in cases {
            let owner = user(&db, id, &format!("{}@example.com", id)).await;
            members
                .create_profile(
                    &owner,
                    &input(json!({
                        "first_name": id,
                        "last_name": "Member",
                        "membership_start_date": "2026-01-01",
                        "membership_end_date": end,
                        "membership_status": status
                    })),
                )
                .await
                .unwrap();
        }

        let expiring = members.list_expiring_memberships(None).await.unwrap();
        let names: Vec<_> = expiring
            .iter()
            .map(|m| m.profile.fields.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["today", "soon"]);

        let all = members.list_expiring_memberships(Some(10_000)).await.unwrap();
        assert_eq!(all.len(), 3);

        let only_today = members.list_expiring_memberships(Some(-5)).await.unwrap();
        assert_eq!(only_today.len(), 1);
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::new(0, 15, 1, 0);
        assert_eq!(meta.last_page, 1);
        assert_eq!((meta.from, meta.to), (None, None));

        let meta = PageMeta::new(31, 15, 3, 1);
        assert_eq!(meta.last_page, 3);
        assert_eq!((meta.from, meta.to), (Some(31), Some(31)));

        let meta = PageMeta::new(31, 100, i64::MAX, 1);
        assert_eq!((meta.from, meta.to), (Some(i64::MAX), Some(i64::MAX)));
    }
}
