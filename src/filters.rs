use crate::api::Params;
use crate::models::{Behavior, Client, Goal, GoalStatus, Priority, Severity, Shift};
use serde::Deserialize;

/// Case-insensitive substring match over `fields`; a blank term matches
/// everything.
pub fn matches_search<'a>(term: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Client {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }
}

impl Searchable for Behavior {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.behavior_type.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ];
        fields.extend(self.client_name.as_deref());
        fields
    }
}

impl Searchable for Goal {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.client_name.as_deref());
        fields
    }
}

impl Searchable for Shift {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.notes.as_str(), self.status.as_str()];
        fields.extend(self.carer_name.as_deref());
        fields.extend(self.client_name.as_deref());
        fields
    }
}

fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ClientFilter {
    pub fn apply<'a>(&self, clients: &'a [Client]) -> Vec<&'a Client> {
        let status = selected(&self.status);
        clients
            .iter()
            .filter(|client| matches_search(&self.search, client.search_fields()))
            .filter(|client| {
                status.is_none_or(|wanted| {
                    client
                        .status
                        .as_deref()
                        .is_some_and(|actual| actual.eq_ignore_ascii_case(wanted))
                })
            })
            .collect()
    }

    pub fn to_params(&self) -> Params {
        Params::new().with("status", selected(&self.status).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BehaviorFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub client: Option<i64>,
}

impl BehaviorFilter {
    pub fn apply<'a>(&self, behaviors: &'a [Behavior]) -> Vec<&'a Behavior> {
        let category = selected(&self.category);
        let severity = selected(&self.severity).and_then(Severity::parse);
        behaviors
            .iter()
            .filter(|behavior| matches_search(&self.search, behavior.search_fields()))
            .filter(|behavior| category.is_none_or(|c| behavior.category.eq_ignore_ascii_case(c)))
            .filter(|behavior| severity.is_none_or(|s| behavior.severity == s))
            .collect()
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(client) = self.client {
            params.set("client", client);
        }
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub client: Option<i64>,
}

impl GoalFilter {
    pub fn apply<'a>(&self, goals: &'a [Goal]) -> Vec<&'a Goal> {
        let status = selected(&self.status).and_then(GoalStatus::parse);
        let priority = selected(&self.priority).and_then(Priority::parse);
        goals
            .iter()
            .filter(|goal| matches_search(&self.search, goal.search_fields()))
            .filter(|goal| status.is_none_or(|s| goal.status == s))
            .filter(|goal| priority.is_none_or(|p| goal.priority == p))
            .collect()
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(client) = self.client {
            params.set("client", client);
        }
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ShiftFilter {
    pub fn apply<'a>(&self, shifts: &'a [Shift]) -> Vec<&'a Shift> {
        let status = selected(&self.status);
        shifts
            .iter()
            .filter(|shift| matches_search(&self.search, shift.search_fields()))
            .filter(|shift| status.is_none_or(|s| shift.status.eq_ignore_ascii_case(s)))
            .collect()
    }

    pub fn to_params(&self) -> Params {
        Params::new().with("date", selected(&self.date).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn client(id: i64, first: &str, last: &str, email: Option<&str>, status: &str) -> Client {
        Client {
            id,
            first_name: first.into(),
            last_name: last.into(),
            email: email.map(str::to_string),
            phone: None,
            date_of_birth: None,
            care_level: None,
            status: Some(status.into()),
            extra: Map::new(),
        }
    }

    fn goal(id: i64, title: &str, status: GoalStatus, priority: Priority) -> Goal {
        Goal {
            id,
            client: None,
            client_name: None,
            title: title.into(),
            description: String::new(),
            category: None,
            status,
            priority,
            target_date: None,
            progress: 0,
            extra: Map::new(),
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_search("ANN", ["Joanne"]));
        assert!(matches_search("smith", ["Ann", "Goldsmith"]));
        assert!(!matches_search("bob", ["Ann", "Smith"]));
    }

    #[test]
    fn blank_search_matches_everything() {
        assert!(matches_search("", ["anything"]));
        assert!(matches_search("   ", std::iter::empty::<&str>()));
    }

    #[test]
    fn client_filter_combines_search_and_status() {
        let clients = vec![
            client(1, "Ann", "Lee", Some("ann@care.org"), "active"),
            client(2, "Bob", "Annis", None, "inactive"),
            client(3, "Cara", "Diaz", Some("cara@care.org"), "active"),
        ];
        let filter = ClientFilter {
            search: "ann".into(),
            status: Some("Active".into()),
        };
        let ids: Vec<i64> = filter.apply(&clients).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);

        let everyone = ClientFilter {
            search: String::new(),
            status: Some("all".into()),
        };
        assert_eq!(everyone.apply(&clients).len(), 3);
        assert!(everyone.to_params().is_empty());
    }

    #[test]
    fn goal_filter_by_status_and_priority() {
        let goals = vec![
            goal(1, "Walk daily", GoalStatus::InProgress, Priority::High),
            goal(2, "Cook a meal", GoalStatus::Completed, Priority::High),
            goal(3, "Walk to shop", GoalStatus::InProgress, Priority::Low),
        ];
        let filter = GoalFilter {
            search: "walk".into(),
            status: Some("in_progress".into()),
            priority: Some("high".into()),
            client: Some(4),
        };
        let ids: Vec<i64> = filter.apply(&goals).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(filter.to_params().get("client"), Some("4"));
    }
}
