//! Create/edit forms: field lists for rendering, validation into API payloads.

use crate::models::{
    Activity, ActivityStatus, Behavior, Client, Entity, Goal, GoalStatus, Priority, Severity,
    Shift,
};
use crate::validation::{ValidationErrors, Validator};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Url,
    Password,
    Number,
    Date,
    Time,
    TextArea,
    Select(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, kind: FieldKind, value: &str) -> Self {
        Self {
            name,
            label,
            kind,
            value: value.to_string(),
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A form bound to one entity type.
pub trait EntityForm: DeserializeOwned + Default + Send + Sync + 'static {
    type Entity: Entity;
    /// Page listing the entity; where the form returns after submitting.
    const PAGE: &'static str;
    const TITLE: &'static str;

    fn from_entity(entity: &Self::Entity) -> Self;
    fn fields(&self) -> Vec<FormField>;
    fn validate(&self) -> Result<Value, ValidationErrors>;
}

fn optional(value: &str) -> Value {
    let value = value.trim();
    if value.is_empty() {
        Value::Null
    } else {
        Value::from(value)
    }
}

fn options<T: Copy>(all: &[T], label: impl Fn(T) -> &'static str, skip: impl Fn(T) -> bool) -> Vec<(String, String)> {
    all.iter()
        .copied()
        .filter(|item| !skip(*item))
        .map(|item| {
            let value = label(item);
            (value.to_string(), title_case(value))
        })
        .collect()
}

pub fn title_case(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn end_after_start(validator: &mut Validator, start: Option<chrono::NaiveTime>, end: Option<chrono::NaiveTime>) {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            validator.fail("end_time", "End time must be after start time");
        }
    }
}

fn id_string(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub care_level: String,
    pub status: String,
}

impl EntityForm for ClientForm {
    type Entity = Client;
    const PAGE: &'static str = "/clients";
    const TITLE: &'static str = "Client";

    fn from_entity(client: &Client) -> Self {
        Self {
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
            date_of_birth: client.date_of_birth.clone().unwrap_or_default(),
            care_level: client.care_level.clone().unwrap_or_default(),
            status: client.status.clone().unwrap_or_default(),
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let statuses = vec![
            ("active".to_string(), "Active".to_string()),
            ("inactive".to_string(), "Inactive".to_string()),
        ];
        vec![
            FormField::new("first_name", "First name", FieldKind::Text, &self.first_name).required(),
            FormField::new("last_name", "Last name", FieldKind::Text, &self.last_name).required(),
            FormField::new("email", "Email", FieldKind::Email, &self.email),
            FormField::new("phone", "Phone", FieldKind::Text, &self.phone),
            FormField::new("date_of_birth", "Date of birth", FieldKind::Date, &self.date_of_birth),
            FormField::new("care_level", "Care level", FieldKind::Text, &self.care_level),
            FormField::new("status", "Status", FieldKind::Select(statuses), &self.status),
        ]
    }

    fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let first_name = v.required("first_name", "First name", &self.first_name);
        let last_name = v.required("last_name", "Last name", &self.last_name);
        v.email("email", &self.email);
        v.date("date_of_birth", "Date of birth", &self.date_of_birth);
        let status = match self.status.trim() {
            "" => "active",
            "active" => "active",
            "inactive" => "inactive",
            _ => {
                v.fail("status", "Choose a status");
                ""
            }
        };
        v.finish()?;

        Ok(json!({
            "first_name": first_name,
            "last_name": last_name,
            "email": optional(&self.email),
            "phone": optional(&self.phone),
            "date_of_birth": optional(&self.date_of_birth),
            "care_level": optional(&self.care_level),
            "status": status,
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BehaviorForm {
    pub client: String,
    pub behavior_type: String,
    pub category: String,
    pub severity: String,
    pub description: String,
    pub date: String,
    pub intervention: String,
    pub intervention_effective: String,
}

impl EntityForm for BehaviorForm {
    type Entity = Behavior;
    const PAGE: &'static str = "/behaviors";
    const TITLE: &'static str = "Behavior";

    fn from_entity(behavior: &Behavior) -> Self {
        Self {
            client: id_string(behavior.client),
            behavior_type: behavior.behavior_type.clone(),
            category: behavior.category.clone(),
            severity: match behavior.severity {
                Severity::Other => String::new(),
                severity => severity.as_str().to_string(),
            },
            description: behavior.description.clone(),
            date: behavior
                .date
                .as_deref()
                .map(|date| date.get(..10).unwrap_or(date).to_string())
                .unwrap_or_default(),
            intervention: behavior.intervention.clone().unwrap_or_default(),
            intervention_effective: match behavior.intervention_effective {
                Some(true) => "yes".into(),
                Some(false) => "no".into(),
                None => String::new(),
            },
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let severities = options(&Severity::ALL, Severity::as_str, |s| s == Severity::Other);
        let outcomes = vec![
            (String::new(), "Not recorded".to_string()),
            ("yes".to_string(), "Effective".to_string()),
            ("no".to_string(), "Not effective".to_string()),
        ];
        vec![
            FormField::new("client", "Client ID", FieldKind::Number, &self.client).required(),
            FormField::new("behavior_type", "Behavior", FieldKind::Text, &self.behavior_type).required(),
            FormField::new("category", "Category", FieldKind::Text, &self.category).required(),
            FormField::new("severity", "Severity", FieldKind::Select(severities), &self.severity).required(),
            FormField::new("description", "Description", FieldKind::TextArea, &self.description).required(),
            FormField::new("date", "Date", FieldKind::Date, &self.date).required(),
            FormField::new("intervention", "Intervention", FieldKind::TextArea, &self.intervention),
            FormField::new(
                "intervention_effective",
                "Intervention outcome",
                FieldKind::Select(outcomes),
                &self.intervention_effective,
            ),
        ]
    }

    fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let client = v.required_integer("client", "Client", &self.client);
        let behavior_type = v.required("behavior_type", "Behavior", &self.behavior_type);
        let category = v.required("category", "Category", &self.category);
        let severity = v
            .required("severity", "Severity", &self.severity)
            .and_then(|value| match Severity::parse(value) {
                Some(Severity::Other) | None => {
                    v.fail("severity", "Choose a severity");
                    None
                }
                found => found,
            });
        let description = v.required("description", "Description", &self.description);
        let date = v.required_date("date", "Date", &self.date);
        let effective = match self.intervention_effective.trim() {
            "" => None,
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => {
                v.fail("intervention_effective", "Choose an outcome");
                None
            }
        };
        v.finish()?;

        Ok(json!({
            "client": client,
            "behavior_type": behavior_type,
            "category": category.map(str::to_lowercase),
            "severity": severity.map(Severity::as_str),
            "description": description,
            "date": date.map(|d| d.to_string()),
            "intervention": optional(&self.intervention),
            "intervention_effective": effective,
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoalForm {
    pub client: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub priority: String,
    pub target_date: String,
    pub progress: String,
    pub target_value: String,
}

impl EntityForm for GoalForm {
    type Entity = Goal;
    const PAGE: &'static str = "/goals";
    const TITLE: &'static str = "Goal";

    fn from_entity(goal: &Goal) -> Self {
        Self {
            client: id_string(goal.client),
            title: goal.title.clone(),
            description: goal.description.clone(),
            category: goal.category.clone().unwrap_or_default(),
            status: goal.status.as_str().to_string(),
            priority: goal.priority.as_str().to_string(),
            target_date: goal.target_date.clone().unwrap_or_default(),
            progress: goal.progress.to_string(),
            target_value: goal
                .extra
                .get("target_value")
                .map(|value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default(),
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let statuses = options(&GoalStatus::ALL, GoalStatus::as_str, |s| s == GoalStatus::Other);
        let priorities = options(&Priority::ALL, Priority::as_str, |p| p == Priority::Other);
        vec![
            FormField::new("client", "Client ID", FieldKind::Number, &self.client).required(),
            FormField::new("title", "Title", FieldKind::Text, &self.title).required(),
            FormField::new("description", "Description", FieldKind::TextArea, &self.description),
            FormField::new("category", "Category", FieldKind::Text, &self.category),
            FormField::new("status", "Status", FieldKind::Select(statuses), &self.status),
            FormField::new("priority", "Priority", FieldKind::Select(priorities), &self.priority).required(),
            FormField::new("target_date", "Target date", FieldKind::Date, &self.target_date),
            FormField::new("progress", "Progress (%)", FieldKind::Number, &self.progress),
            FormField::new("target_value", "Target value", FieldKind::Number, &self.target_value),
        ]
    }

    fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let client = v.required_integer("client", "Client", &self.client);
        let title = v.required("title", "Title", &self.title);
        let priority = v
            .required("priority", "Priority", &self.priority)
            .and_then(|value| match Priority::parse(value) {
                Some(Priority::Other) | None => {
                    v.fail("priority", "Choose a priority");
                    None
                }
                found => found,
            });
        let status = if self.status.trim().is_empty() {
            Some(GoalStatus::NotStarted)
        } else {
            match GoalStatus::parse(&self.status) {
                Some(GoalStatus::Other) | None => {
                    v.fail("status", "Choose a status");
                    None
                }
                found => found,
            }
        };
        let target_date = v.date("target_date", "Target date", &self.target_date);
        let progress = v.percentage("progress", "Progress", &self.progress).unwrap_or(0);
        let target_value = v.decimal("target_value", "Target value", &self.target_value);
        v.finish()?;

        Ok(json!({
            "client": client,
            "title": title,
            "description": self.description.trim(),
            "category": optional(&self.category),
            "status": status.map(GoalStatus::as_str),
            "priority": priority.map(Priority::as_str),
            "target_date": target_date.map(|d| d.to_string()),
            "progress": progress,
            "target_value": target_value,
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub client: String,
    pub activity_type: String,
    pub status: String,
    pub resource_url: String,
}

impl EntityForm for ActivityForm {
    type Entity = Activity;
    const PAGE: &'static str = "/scheduler";
    const TITLE: &'static str = "Activity";

    fn from_entity(activity: &Activity) -> Self {
        Self {
            title: activity.title.clone(),
            description: activity.description.clone(),
            date: activity.date.clone(),
            start_time: activity.start_time.clone().unwrap_or_default(),
            end_time: activity.end_time.clone().unwrap_or_default(),
            client: id_string(activity.client),
            activity_type: activity.activity_type.clone().unwrap_or_default(),
            status: activity.status.as_str().to_string(),
            resource_url: activity
                .extra
                .get("resource_url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let statuses = options(&ActivityStatus::ALL, ActivityStatus::as_str, |s| {
            s == ActivityStatus::Other
        });
        vec![
            FormField::new("title", "Title", FieldKind::Text, &self.title).required(),
            FormField::new("date", "Date", FieldKind::Date, &self.date).required(),
            FormField::new("start_time", "Start time", FieldKind::Time, &self.start_time),
            FormField::new("end_time", "End time", FieldKind::Time, &self.end_time),
            FormField::new("client", "Client ID", FieldKind::Number, &self.client),
            FormField::new("activity_type", "Type", FieldKind::Text, &self.activity_type),
            FormField::new("status", "Status", FieldKind::Select(statuses), &self.status),
            FormField::new("description", "Description", FieldKind::TextArea, &self.description),
            FormField::new("resource_url", "Resource link", FieldKind::Url, &self.resource_url),
        ]
    }

    fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let title = v.required("title", "Title", &self.title);
        let date = v.required_date("date", "Date", &self.date);
        let start = v.time("start_time", "Start time", &self.start_time);
        let end = v.time("end_time", "End time", &self.end_time);
        end_after_start(&mut v, start, end);
        let client = v.integer("client", "Client", &self.client);
        let status = if self.status.trim().is_empty() {
            Some(ActivityStatus::Scheduled)
        } else {
            match ActivityStatus::parse(&self.status) {
                Some(ActivityStatus::Other) | None => {
                    v.fail("status", "Choose a status");
                    None
                }
                found => found,
            }
        };
        v.url("resource_url", &self.resource_url);
        v.finish()?;

        Ok(json!({
            "title": title,
            "description": self.description.trim(),
            "date": date.map(|d| d.to_string()),
            "start_time": start.map(|t| t.format("%H:%M").to_string()),
            "end_time": end.map(|t| t.format("%H:%M").to_string()),
            "client": client,
            "activity_type": optional(&self.activity_type),
            "status": status.map(ActivityStatus::as_str),
            "resource_url": optional(&self.resource_url),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShiftForm {
    pub carer: String,
    pub client: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: String,
}

impl EntityForm for ShiftForm {
    type Entity = Shift;
    const PAGE: &'static str = "/shifts";
    const TITLE: &'static str = "Shift";

    fn from_entity(shift: &Shift) -> Self {
        Self {
            carer: id_string(shift.carer),
            client: id_string(shift.client),
            date: shift.date.clone(),
            start_time: shift.start_time.clone(),
            end_time: shift.end_time.clone(),
            status: shift.status.clone(),
            notes: shift.notes.clone(),
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let statuses = ["scheduled", "completed", "cancelled"]
            .iter()
            .map(|status| (status.to_string(), title_case(status)))
            .collect();
        vec![
            FormField::new("carer", "Carer ID", FieldKind::Number, &self.carer).required(),
            FormField::new("client", "Client ID", FieldKind::Number, &self.client),
            FormField::new("date", "Date", FieldKind::Date, &self.date).required(),
            FormField::new("start_time", "Start time", FieldKind::Time, &self.start_time).required(),
            FormField::new("end_time", "End time", FieldKind::Time, &self.end_time).required(),
            FormField::new("status", "Status", FieldKind::Select(statuses), &self.status),
            FormField::new("notes", "Notes", FieldKind::TextArea, &self.notes),
        ]
    }

    fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let carer = v.required_integer("carer", "Carer", &self.carer);
        let client = v.integer("client", "Client", &self.client);
        let date = v.required_date("date", "Date", &self.date);
        let start = v.required_time("start_time", "Start time", &self.start_time);
        let end = v.required_time("end_time", "End time", &self.end_time);
        end_after_start(&mut v, start, end);
        let status = match self.status.trim() {
            "" => "scheduled",
            status @ ("scheduled" | "completed" | "cancelled") => status,
            _ => {
                v.fail("status", "Choose a status");
                ""
            }
        };
        v.finish()?;

        Ok(json!({
            "carer": carer,
            "client": client,
            "date": date.map(|d| d.to_string()),
            "start_time": start.map(|t| t.format("%H:%M").to_string()),
            "end_time": end.map(|t| t.format("%H:%M").to_string()),
            "status": status,
            "notes": self.notes.trim(),
        }))
    }
}

/// Records that a scheduled activity took place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityLogForm {
    pub activity: String,
    pub date: String,
    pub completed: Option<String>,
    pub notes: String,
}

impl ActivityLogForm {
    pub fn validate(&self) -> Result<Value, ValidationErrors> {
        let mut v = Validator::new();
        let activity = v.required_integer("activity", "Activity", &self.activity);
        let date = v.required_date("date", "Date", &self.date);
        v.finish()?;

        Ok(json!({
            "activity": activity,
            "date": date.map(|d| d.to_string()),
            "completed": self.completed.as_deref().is_some_and(|value| !value.is_empty()),
            "notes": self.notes.trim(),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn fields(&self) -> Vec<FormField> {
        vec![
            FormField::new("username", "Username", FieldKind::Text, &self.username).required(),
            FormField::new("password", "Password", FieldKind::Password, "").required(),
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("username", "Username", &self.username);
        if self.password.is_empty() {
            v.fail("password", "Password is required");
        }
        v.finish()
    }
}
