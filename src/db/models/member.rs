//! Member profile models, computed views and store queries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};

use super::user::{User, UserResponse};

/// Membership state of a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Expired,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 4] = [
        MembershipStatus::Active,
        MembershipStatus::Inactive,
        MembershipStatus::Suspended,
        MembershipStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Suspended => "suspended",
            MembershipStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown membership status: {}", s))
    }
}

/// Membership tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum MembershipType {
    #[default]
    Basic,
    Premium,
    Vip,
}

impl MembershipType {
    pub const ALL: [MembershipType; 3] = [
        MembershipType::Basic,
        MembershipType::Premium,
        MembershipType::Vip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Basic => "basic",
            MembershipType::Premium => "premium",
            MembershipType::Vip => "vip",
        }
    }
}

impl std::fmt::Display for MembershipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for MembershipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown membership type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str() == s)
            .ok_or_else(|| format!("Unknown gender: {}", s))
    }
}

/// The editable business fields of a member profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MemberFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: Option<NaiveDate>,
    pub membership_status: MembershipStatus,
    pub membership_type: MembershipType,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl MemberFields {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The end date has passed but the status was never moved to `expired`
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.membership_end_date, Some(end) if end < today)
            && self.membership_status != MembershipStatus::Expired
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MemberProfile {
    pub id: i64,
    pub user_id: String,
    #[sqlx(flatten)]
    pub fields: MemberFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MemberProfile {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Wire representation of a member profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberResponse {
    pub id: i64,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: Option<NaiveDate>,
    pub membership_status: MembershipStatus,
    pub membership_type: MembershipType,
    pub is_expired: bool,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl MemberResponse {
    pub fn new(profile: MemberProfile, user: Option<User>, today: NaiveDate) -> Self {
        let full_name = profile.fields.full_name();
        let is_expired = profile.fields.is_expired(today);
        let f = profile.fields;
        Self {
            id: profile.id,
            user_id: profile.user_id,
            first_name: f.first_name,
            last_name: f.last_name,
            full_name,
            phone: f.phone,
            date_of_birth: f.date_of_birth,
            gender: f.gender,
            address: f.address,
            city: f.city,
            state: f.state,
            postal_code: f.postal_code,
            membership_start_date: f.membership_start_date,
            membership_end_date: f.membership_end_date,
            membership_status: f.membership_status,
            membership_type: f.membership_type,
            is_expired,
            emergency_contact_name: f.emergency_contact_name,
            emergency_contact_phone: f.emergency_contact_phone,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            deleted_at: profile.deleted_at,
            user: user.map(UserResponse::from),
        }
    }
}

/// A profile together with its owning user
#[derive(Debug, Clone)]
pub struct MemberWithUser {
    pub profile: MemberProfile,
    pub user: Option<User>,
}

impl MemberWithUser {
    pub fn into_response(self, today: NaiveDate) -> MemberResponse {
        MemberResponse::new(self.profile, self.user, today)
    }
}

/// Status filter for member listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberFilter {
    #[default]
    All,
    Active,
}

/// Explicit parameters for a member listing query
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    active_only: bool,
    search: Option<String>,
}

impl MemberQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: MemberFilter) -> Self {
        self.active_only = filter == MemberFilter::Active;
        self
    }

    /// Terms shorter than two characters are ignored
    pub fn search(mut self, term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| t.chars().count() >= 2)
            .map(|t| t.to_string());
        self
    }

    /// Build the WHERE clause (over `member_profiles m JOIN users u`) and its bindings
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = vec!["m.deleted_at IS NULL".to_string()];
        let mut bindings = Vec::new();

        if self.active_only {
            conditions.push("m.membership_status = ?".to_string());
            bindings.push(MembershipStatus::Active.as_str().to_string());
        }

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            conditions.push(
                "(m.first_name LIKE ? ESCAPE '\\' OR m.last_name LIKE ? ESCAPE '\\' \
                 OR (m.first_name || ' ' || m.last_name) LIKE ? ESCAPE '\\' \
                 OR u.email LIKE ? ESCAPE '\\' OR m.membership_type LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            for _ in 0..5 {
                bindings.push(pattern.clone());
            }
        }

        (format!("WHERE {}", conditions.join(" AND ")), bindings)
    }

    pub async fn count<'e, E: SqliteExecutor<'e>>(&self, db: E) -> Result<i64, sqlx::Error> {
        let (where_clause, bindings) = self.where_clause();
        let sql = format!(
            "SELECT COUNT(*) FROM member_profiles m JOIN users u ON u.id = m.user_id {}",
            where_clause
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }
        query.fetch_one(db).await
    }

    /// Fetch one page ordered by last name, then first name
    pub async fn fetch_page<'e, E: SqliteExecutor<'e>>(
        &self,
        db: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MemberProfile>, sqlx::Error> {
        let (where_clause, bindings) = self.where_clause();
        let sql = format!(
            "SELECT m.* FROM member_profiles m JOIN users u ON u.id = m.user_id {} \
             ORDER BY m.last_name ASC, m.first_name ASC, m.id ASC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut query = sqlx::query_as::<_, MemberProfile>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }
        query.bind(limit).bind(offset).fetch_all(db).await
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn find_member<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
    include_trashed: bool,
) -> Result<Option<MemberProfile>, sqlx::Error> {
    let sql = if include_trashed {
        "SELECT * FROM member_profiles WHERE id = ?"
    } else {
        "SELECT * FROM member_profiles WHERE id = ? AND deleted_at IS NULL"
    };
    sqlx::query_as::<_, MemberProfile>(sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_member_by_user<'e, E: SqliteExecutor<'e>>(
    db: E,
    user_id: &str,
    include_trashed: bool,
) -> Result<Option<MemberProfile>, sqlx::Error> {
    let sql = if include_trashed {
        "SELECT * FROM member_profiles WHERE user_id = ?"
    } else {
        "SELECT * FROM member_profiles WHERE user_id = ? AND deleted_at IS NULL"
    };
    sqlx::query_as::<_, MemberProfile>(sql)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Insert a profile and return its id
pub async fn insert_member<'e, E: SqliteExecutor<'e>>(
    db: E,
    user_id: &str,
    fields: &MemberFields,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO member_profiles (
            user_id, first_name, last_name, phone, date_of_birth, gender,
            address, city, state, postal_code,
            membership_start_date, membership_end_date, membership_status, membership_type,
            emergency_contact_name, emergency_contact_phone, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.phone)
    .bind(fields.date_of_birth)
    .bind(fields.gender)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.postal_code)
    .bind(fields.membership_start_date)
    .bind(fields.membership_end_date)
    .bind(fields.membership_status)
    .bind(fields.membership_type)
    .bind(&fields.emergency_contact_name)
    .bind(&fields.emergency_contact_phone)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite every editable column and bump `updated_at`
pub async fn update_member<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
    fields: &MemberFields,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE member_profiles SET
            first_name = ?, last_name = ?, phone = ?, date_of_birth = ?, gender = ?,
            address = ?, city = ?, state = ?, postal_code = ?,
            membership_start_date = ?, membership_end_date = ?,
            membership_status = ?, membership_type = ?,
            emergency_contact_name = ?, emergency_contact_phone = ?,
            updated_at = ?
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.phone)
    .bind(fields.date_of_birth)
    .bind(fields.gender)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.postal_code)
    .bind(fields.membership_start_date)
    .bind(fields.membership_end_date)
    .bind(fields.membership_status)
    .bind(fields.membership_type)
    .bind(&fields.emergency_contact_name)
    .bind(&fields.emergency_contact_phone)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

/// Set or clear the soft-delete marker
pub async fn set_deleted_at<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
    deleted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE member_profiles SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(deleted_at)
            .bind(now)
            .bind(id)
            .execute(db)
            .await?;
    Ok(result.rows_affected())
}

/// Active, non-deleted profiles whose end date falls within `[from, to]`
pub async fn list_expiring<'e, E: SqliteExecutor<'e>>(
    db: E,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<MemberProfile>, sqlx::Error> {
    sqlx::query_as::<_, MemberProfile>(
        r#"
        SELECT * FROM member_profiles
        WHERE deleted_at IS NULL
          AND membership_status = ?
          AND membership_end_date IS NOT NULL
          AND membership_end_date BETWEEN ? AND ?
        ORDER BY membership_end_date ASC, last_name ASC, first_name ASC
        "#,
    )
    .bind(MembershipStatus::Active)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> MemberFields {
        MemberFields {
            first_name: "Aisha".to_string(),
            last_name: "Rahman".to_string(),
            phone: None,
            date_of_birth: None,
            gender: None,
            address: None,
            city: None,
            state: None,
            postal_code: None,
            membership_start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            membership_end_date: None,
            membership_status: MembershipStatus::Active,
            membership_type: MembershipType::Basic,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        }
    }

    #[test]
    fn test_enum_round_trip_strings() {
        for status in MembershipStatus::ALL {
            assert_eq!(status.as_str().parse::<MembershipStatus>().unwrap(), status);
        }
        for kind in MembershipType::ALL {
            assert_eq!(kind.as_str().parse::<MembershipType>().unwrap(), kind);
        }
        assert_eq!("prefer_not_to_say".parse::<Gender>().unwrap(), Gender::PreferNotToSay);
        assert!("Active".parse::<MembershipStatus>().is_err());
        assert!("gold".parse::<MembershipType>().is_err());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(fields().full_name(), "Aisha Rahman");
    }

    #[test]
    fn test_is_expired() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut f = fields();
        assert!(!f.is_expired(today));

        f.membership_end_date = Some(NaiveDate::from_ymd_opt(2026, 5, 31).unwrap());
        assert!(f.is_expired(today));

        f.membership_status = MembershipStatus::Expired;
        assert!(!f.is_expired(today));

        f.membership_status = MembershipStatus::Active;
        f.membership_end_date = Some(today);
        assert!(!f.is_expired(today));
    }

    #[test]
    fn test_search_ignores_short_terms() {
        let (clause, bindings) = MemberQuery::new().search(Some(" a ")).where_clause();
        assert_eq!(clause, "WHERE m.deleted_at IS NULL");
        assert!(bindings.is_empty());

        let (clause, bindings) = MemberQuery::new()
            .filter(MemberFilter::Active)
            .search(Some("ra"))
            .where_clause();
        assert!(clause.contains("m.membership_status = ?"));
        assert!(clause.contains("u.email LIKE ?"));
        assert_eq!(bindings.len(), 6);
        assert_eq!(bindings[0], "active");
        assert_eq!(bindings[1], "%ra%");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
