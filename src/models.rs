use crate::cache::Tag;
use serde::{de::{self, DeserializeOwned}, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A record type served under its own collection path of the care API.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    const PATH: &'static str;
    const NAME: &'static str;
    const TAG: Tag;

    fn id(&self) -> i64;
}

/// One page of a paginated list (`{results, count}`).
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Deserialize)]
struct Paged {
    results: Vec<Value>,
    #[serde(default)]
    count: Option<u64>,
}

/// Accepts `{results, count}` or a bare array. A bad record fails with its
/// index and the field-level serde message.
impl<'de, T: DeserializeOwned> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (items, count) = match Value::deserialize(deserializer)? {
            Value::Array(items) => (items, None),
            value => {
                let paged = Paged::deserialize(value).map_err(<D::Error as de::Error>::custom)?;
                (paged.results, paged.count)
            }
        };
        let results = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                T::deserialize(item).map_err(|err| {
                    <D::Error as de::Error>::custom(format!("results[{index}]: {err}"))
                })
            })
            .collect::<Result<Vec<T>, D::Error>>()?;
        Ok(Page {
            count: count.unwrap_or(results.len() as u64),
            results,
        })
    }
}

/// `null` decodes as the field's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Percent progress from an integer, a float or a numeric string, clamped to 0..=100.
fn progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(0),
        Some(Raw::Number(value)) => value,
        Some(Raw::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| <D::Error as de::Error>::custom(format!("invalid progress `{text}`")))?,
    };
    if !value.is_finite() {
        return Ok(0);
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[default]
    #[serde(other)]
    Other,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
        Severity::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    #[default]
    #[serde(other)]
    Other,
}

impl GoalStatus {
    pub const ALL: [GoalStatus; 5] = [
        GoalStatus::NotStarted,
        GoalStatus::InProgress,
        GoalStatus::Completed,
        GoalStatus::OnHold,
        GoalStatus::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::NotStarted => "not_started",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
            GoalStatus::OnHold => "on_hold",
            GoalStatus::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Other,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Other,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 5] = [
        ActivityStatus::Scheduled,
        ActivityStatus::InProgress,
        ActivityStatus::Completed,
        ActivityStatus::Cancelled,
        ActivityStatus::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Scheduled => "scheduled",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Cancelled => "cancelled",
            ActivityStatus::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub care_level: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Behavior {
    pub id: i64,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub behavior_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub intervention: Option<String>,
    #[serde(default)]
    pub intervention_effective: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: GoalStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default, deserialize_with = "progress")]
    pub progress: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Local calendar date, `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ActivityStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    #[serde(default)]
    pub activity: Option<i64>,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub carer: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: i64,
    #[serde(default)]
    pub carer: Option<i64>,
    #[serde(default)]
    pub carer_name: Option<String>,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_clients: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_clients: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_behaviors: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub critical_behaviors: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_goals: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub todays_activities: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUpload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token pair issued by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "access_token", alias = "token")]
    pub access: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh: Option<String>,
}

macro_rules! entity {
    ($ty:ty, $path:literal, $name:literal, $tag:expr) => {
        impl Entity for $ty {
            const PATH: &'static str = $path;
            const NAME: &'static str = $name;
            const TAG: Tag = $tag;

            fn id(&self) -> i64 {
                self.id
            }
        }
    };
}

entity!(Client, "/clients", "client", Tag::Client);
entity!(User, "/users", "user", Tag::User);
entity!(Behavior, "/behaviors", "behavior", Tag::Behavior);
entity!(Goal, "/goals", "goal", Tag::Goal);
entity!(Activity, "/activities", "activity", Tag::Activity);
entity!(Schedule, "/scheduler/schedules", "schedule", Tag::Schedule);
entity!(Shift, "/shifts", "shift", Tag::Shift);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_accepts_paginated_and_bare_lists() {
        let paged: Page<Client> = serde_json::from_str(
            r#"{"results":[{"id":1,"first_name":"Ada","last_name":"Byron"}],"count":12}"#,
        )
        .unwrap();
        assert_eq!(paged.count, 12);
        assert_eq!(paged.results[0].full_name(), "Ada Byron");

        let bare: Page<Client> = serde_json::from_str(r#"[{"id":1},{"id":2}]"#).unwrap();
        assert_eq!(bare.count, 2);
    }

    #[test]
    fn unknown_enum_values_land_in_other() {
        let behavior: Behavior = serde_json::from_str(
            r#"{"id":3,"severity":"extreme","category":"verbal","ward":"north"}"#,
        )
        .unwrap();
        assert_eq!(behavior.severity, Severity::Other);
        assert_eq!(behavior.extra.get("ward"), Some(&Value::from("north")));
    }

    #[test]
    fn extra_fields_round_trip() {
        let raw = r#"{"id":9,"title":"Walk","date":"2024-03-10","status":"scheduled","room":"B2"}"#;
        let activity: Activity = serde_json::from_str(raw).unwrap();
        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["room"], "B2");
        assert_eq!(back["status"], "scheduled");
    }

    #[test]
    fn null_fields_decode_as_defaults() {
        let page: Page<Goal> = serde_json::from_str(
            r#"{"results":[{"id":1,"title":"Walk","description":null,"progress":null,"status":null}],"count":1}"#,
        )
        .unwrap();
        assert_eq!(page.results[0].description, "");
        assert_eq!(page.results[0].progress, 0);
        assert_eq!(page.results[0].status, GoalStatus::Other);

        let behaviors: Page<Behavior> =
            serde_json::from_str(r#"[{"id":2,"category":null,"severity":null,"description":null}]"#).unwrap();
        assert_eq!(behaviors.results[0].category, "");
        assert_eq!(behaviors.results[0].severity, Severity::Other);
    }

    #[test]
    fn progress_accepts_decimals_and_numeric_strings() {
        let decode = |raw: &str| serde_json::from_str::<Goal>(raw).unwrap().progress;
        assert_eq!(decode(r#"{"id":1,"progress":45}"#), 45);
        assert_eq!(decode(r#"{"id":1,"progress":45.5}"#), 46);
        assert_eq!(decode(r#"{"id":1,"progress":"45.50"}"#), 46);
        assert_eq!(decode(r#"{"id":1,"progress":" 12 "}"#), 12);
        assert_eq!(decode(r#"{"id":1,"progress":250}"#), 100);
        assert_eq!(decode(r#"{"id":1,"progress":-3}"#), 0);
    }

    #[test]
    fn bad_record_error_names_the_field() {
        let err = serde_json::from_str::<Page<Goal>>(
            r#"{"results":[{"id":1},{"id":2,"title":7}],"count":2}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("results[1]"), "{err}");
        assert!(err.contains("invalid type"), "{err}");

        let err = serde_json::from_str::<Page<Goal>>(r#"{"results":[{"title":"no id"}]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("missing field `id`"), "{err}");
    }

    #[test]
    fn session_accepts_token_aliases() {
        let session: Session =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r"}"#).unwrap();
        assert_eq!(session.access, "a");
        assert_eq!(session.refresh.as_deref(), Some("r"));
    }
}
