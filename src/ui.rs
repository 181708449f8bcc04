use crate::calendar::CalendarView;
use crate::filters::{BehaviorFilter, ClientFilter, GoalFilter, ShiftFilter};
use crate::forms::{title_case, ActivityForm, EntityForm, FieldKind, FormField};
use crate::models::{
    Activity, ActivityStatus, Behavior, Client, DashboardStats, Entity, Goal, GoalStatus, Priority, Schedule,
    Severity, Shift, User,
};
use crate::stats::{activity_status_count, BehaviorStats, GoalStats};
use crate::validation::ValidationErrors;
use crate::views::{ModalKind, ModalState, Notice};
use std::fmt::Write;

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(
    title: &str,
    user: Option<&User>,
    environment: &str,
    notice: &Notice,
    content: &str,
) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<nav>
      <a href="/">Dashboard</a>
      <a href="/clients">Clients</a>
      <a href="/behaviors">Behaviors</a>
      <a href="/goals">Goals</a>
      <a href="/scheduler">Scheduler</a>
      <a href="/shifts">Shifts</a>
      <span class="spacer"></span>
      <span class="user">{}</span>
      <form method="post" action="/logout"><button type="submit">Sign out</button></form>
    </nav>"#,
            escape(&user.display_name())
        ),
        None => String::new(),
    };

    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{BANNER}}", &render_banner(notice))
        .replace("{{ENV}}", &escape(environment))
        .replace("{{CONTENT}}", content)
}

fn render_banner(notice: &Notice) -> String {
    let mut out = String::new();
    if let Some(message) = notice.notice.as_deref().filter(|m| !m.is_empty()) {
        let _ = write!(out, r#"<div class="toast ok">{}</div>"#, escape(message));
    }
    if let Some(message) = notice.error.as_deref().filter(|m| !m.is_empty()) {
        let _ = write!(out, r#"<div class="toast error">{}</div>"#, escape(message));
    }
    out
}

fn stat_card(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        r#"<div class="card"><div class="label">{}</div><div class="value">{}</div></div>"#,
        escape(label),
        escape(&value.to_string())
    )
}

fn select(name: &str, options: &[(String, String)], current: &str) -> String {
    let mut out = format!(r#"<select name="{}">"#, escape(name));
    for (value, label) in options {
        let selected = if value == current { " selected" } else { "" };
        let _ = write!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            escape(value),
            escape(label)
        );
    }
    out.push_str("</select>");
    out
}

fn filter_options(values: impl IntoIterator<Item = &'static str>) -> Vec<(String, String)> {
    let mut options = vec![(String::new(), "All".to_string())];
    options.extend(
        values
            .into_iter()
            .map(|value| (value.to_string(), title_case(value))),
    );
    options
}

fn render_field(field: &FormField, errors: &ValidationErrors) -> String {
    let name = escape(field.name);
    let value = escape(&field.value);
    let required = if field.required { " required" } else { "" };
    let input = match &field.kind {
        FieldKind::TextArea => {
            format!(r#"<textarea name="{name}"{required}>{value}</textarea>"#)
        }
        FieldKind::Select(options) => select(field.name, options, &field.value),
        kind => {
            let kind = match kind {
                FieldKind::Email => "email",
                FieldKind::Url => "url",
                FieldKind::Password => "password",
                FieldKind::Number => "number",
                FieldKind::Date => "date",
                FieldKind::Time => "time",
                _ => "text",
            };
            format!(r#"<input type="{kind}" name="{name}" value="{value}"{required}>"#)
        }
    };
    let error = errors
        .get(field.name)
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .unwrap_or_default();
    format!(
        r#"<label>{}{}{input}{error}</label>"#,
        escape(field.label),
        if field.required { " *" } else { "" }
    )
}

pub fn render_form(action: &str, submit: &str, fields: &[FormField], errors: &ValidationErrors) -> String {
    let mut out = format!(r#"<form method="post" action="{}" class="form">"#, escape(action));
    for field in fields {
        out.push_str(&render_field(field, errors));
    }
    let _ = write!(out, r#"<button type="submit">{}</button></form>"#, escape(submit));
    out
}

/// The create/edit/delete dialog of `F`'s entity. `submitted` holds the
/// rejected input of a failed submit so it can be shown again.
pub fn render_modal<F: EntityForm>(
    modal: &ModalState<F::Entity>,
    submitted: Option<(&F, &ValidationErrors)>,
) -> String {
    let Some(kind) = modal.kind() else {
        return String::new();
    };
    let empty = ValidationErrors::default();

    match (kind, modal.selected()) {
        (ModalKind::Add, _) => match submitted {
            Some((form, errors)) => render_add_modal(form, errors),
            None => render_add_modal(&F::default(), &empty),
        },
        (ModalKind::Edit, Some(entity)) => match submitted {
            Some((form, errors)) => render_edit_modal(entity.id(), form, errors),
            None => render_edit_modal(entity.id(), &F::from_entity(entity), &empty),
        },
        (ModalKind::Delete, Some(entity)) => dialog(
            &format!("Delete {}", F::TITLE),
            &format!(
                r#"<p>This {} will be permanently removed.</p>
<form method="post" action="{}/{}/delete"><button type="submit" class="danger">Delete</button></form>"#,
                escape(&F::TITLE.to_lowercase()),
                <F::Entity as Entity>::PATH,
                entity.id()
            ),
            F::PAGE,
        ),
        _ => String::new(),
    }
}

pub fn render_add_modal<F: EntityForm>(form: &F, errors: &ValidationErrors) -> String {
    let action = format!("{}/new", <F::Entity as Entity>::PATH);
    dialog(
        &format!("Add {}", F::TITLE),
        &render_form(&action, "Save", &form.fields(), errors),
        F::PAGE,
    )
}

pub fn render_edit_modal<F: EntityForm>(id: i64, form: &F, errors: &ValidationErrors) -> String {
    let action = format!("{}/{id}/edit", <F::Entity as Entity>::PATH);
    dialog(
        &format!("Edit {}", F::TITLE),
        &render_form(&action, "Save changes", &form.fields(), errors),
        F::PAGE,
    )
}

fn dialog(heading: &str, body: &str, close: &str) -> String {
    format!(
        r#"<div class="modal"><div class="modal-body"><h2>{}</h2>{body}<a class="close" href="{}">Cancel</a></div></div>"#,
        escape(heading),
        escape(close)
    )
}

/// Edit dialog of a scheduled activity, with a form logging that it took place.
pub fn render_activity_modal(activity: &Activity) -> String {
    let form = ActivityForm::from_entity(activity);
    let action = format!("{}/{}/edit", Activity::PATH, activity.id);
    let body = format!(
        r#"{}{}<p><a href="/scheduler?date={}&amp;modal=delete&amp;id={}">Delete activity</a></p>"#,
        render_form(&action, "Save changes", &form.fields(), &ValidationErrors::default()),
        render_log_form(activity),
        escape(&activity.date),
        activity.id
    );
    dialog("Edit Activity", &body, ActivityForm::PAGE)
}

fn render_log_form(activity: &Activity) -> String {
    format!(
        r#"<section class="log"><h3>Log this activity</h3>
<form method="post" action="/activities/logs/new" class="form">
  <input type="hidden" name="activity" value="{}">
  <label>Date<input type="date" name="date" value="{}" required></label>
  <label><input type="checkbox" name="completed" checked> Completed</label>
  <label>Notes<textarea name="notes"></textarea></label>
  <button type="submit">Log activity</button>
</form></section>"#,
        activity.id,
        escape(&activity.date)
    )
}

fn row_actions(page: &str, id: i64) -> String {
    format!(
        r#"<a href="{page}?modal=edit&amp;id={id}">Edit</a> <a href="{page}?modal=delete&amp;id={id}">Delete</a>"#
    )
}

pub fn render_login(username: &str, errors: &ValidationErrors) -> String {
    let form = crate::forms::LoginForm {
        username: username.to_string(),
        password: String::new(),
    };
    format!(
        r#"<section class="login"><h1>Sign in</h1>{}</section>"#,
        render_form("/login", "Sign in", &form.fields(), errors)
    )
}

pub fn render_dashboard(
    stats: Option<&DashboardStats>,
    behaviors: Option<&BehaviorStats>,
    goals: Option<&GoalStats>,
    critical: &[Behavior],
    schedule: &[Schedule],
    today: &[&Activity],
) -> String {
    let mut out = String::from("<h1>Dashboard</h1><div class=\"cards\">");
    if let Some(stats) = stats {
        out.push_str(&stat_card("Clients", stats.total_clients));
        out.push_str(&stat_card("Active clients", stats.active_clients));
        out.push_str(&stat_card("Active goals", stats.active_goals));
        out.push_str(&stat_card("Activities today", stats.todays_activities));
    }
    if let Some(behaviors) = behaviors {
        out.push_str(&stat_card("Behaviors this week", behaviors.this_week));
        out.push_str(&stat_card(
            "Intervention effectiveness",
            format!("{:.1}%", behaviors.intervention_effectiveness),
        ));
    }
    if let Some(goals) = goals {
        out.push_str(&stat_card("Goal completion", format!("{:.1}%", goals.completion_rate)));
        out.push_str(&stat_card("Overdue goals", goals.overdue));
    }
    out.push_str("</div>");

    out.push_str("<section><h2>Critical behaviors</h2>");
    if critical.is_empty() {
        out.push_str("<p class=\"empty\">No critical behaviors.</p>");
    } else {
        out.push_str("<ul>");
        for behavior in critical {
            let _ = write!(
                out,
                "<li><strong>{}</strong> {} <span class=\"muted\">{}</span></li>",
                escape(behavior.client_name.as_deref().unwrap_or("Unknown client")),
                escape(&behavior.behavior_type),
                escape(behavior.date.as_deref().unwrap_or(""))
            );
        }
        out.push_str("</ul>");
    }
    out.push_str("</section>");

    out.push_str("<section><h2>Today</h2><ul>");
    for entry in schedule {
        let _ = write!(
            out,
            "<li>{} {}</li>",
            escape(entry.start_time.as_deref().unwrap_or("")),
            escape(&entry.title)
        );
    }
    for activity in today {
        let _ = write!(
            out,
            "<li>{} {}</li>",
            escape(activity.start_time.as_deref().unwrap_or("")),
            escape(&activity.title)
        );
    }
    if schedule.is_empty() && today.is_empty() {
        out.push_str("<li class=\"empty\">Nothing scheduled today.</li>");
    }
    out.push_str("</ul></section>");
    out
}

pub fn render_clients(clients: &[&Client], total: u64, filter: &ClientFilter, modal: &str) -> String {
    let statuses = filter_options(["active", "inactive"]);
    let mut out = format!(
        r#"<h1>Clients</h1>
<form class="filters" method="get" action="/clients">
  <input type="search" name="search" value="{}" placeholder="Search clients">
  {}
  <button type="submit">Filter</button>
</form>
<p class="muted">Showing {} of {}</p>
<a class="button" href="/clients?modal=add">Add client</a>
<table><thead><tr><th>Name</th><th>Email</th><th>Phone</th><th>Care level</th><th>Status</th><th></th></tr></thead><tbody>"#,
        escape(&filter.search),
        select("status", &statuses, filter.status.as_deref().unwrap_or("")),
        clients.len(),
        total
    );
    for client in clients {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&client.full_name()),
            escape(client.email.as_deref().unwrap_or("")),
            escape(client.phone.as_deref().unwrap_or("")),
            escape(client.care_level.as_deref().unwrap_or("")),
            escape(client.status.as_deref().unwrap_or("")),
            row_actions("/clients", client.id)
        );
    }
    out.push_str("</tbody></table>");
    out.push_str(modal);
    out
}

pub fn render_behaviors(
    behaviors: &[&Behavior],
    stats: Option<&BehaviorStats>,
    filter: &BehaviorFilter,
    modal: &str,
) -> String {
    let severities = filter_options(
        Severity::ALL
            .into_iter()
            .filter(|s| *s != Severity::Other)
            .map(Severity::as_str),
    );
    let mut out = String::from("<h1>Behaviors</h1><div class=\"cards\">");
    if let Some(stats) = stats {
        out.push_str(&stat_card("Total", stats.total));
        for severity in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low] {
            let count = stats.by_severity.get(severity.as_str()).copied().unwrap_or(0);
            out.push_str(&stat_card(&title_case(severity.as_str()), count));
        }
    }
    out.push_str("</div>");

    let categories: Vec<(String, String)> = std::iter::once((String::new(), "All".to_string()))
        .chain(stats.into_iter().flat_map(|stats| {
            stats
                .by_category
                .iter()
                .map(|(category, count)| (category.clone(), format!("{} ({count})", title_case(category))))
        }))
        .collect();

    let _ = write!(
        out,
        r#"<form class="filters" method="get" action="/behaviors">
  <input type="search" name="search" value="{}" placeholder="Search behaviors">
  {}
  {}
  <button type="submit">Filter</button>
</form>
<a class="button" href="/behaviors?modal=add">Log behavior</a>
<table><thead><tr><th>Date</th><th>Client</th><th>Behavior</th><th>Category</th><th>Severity</th><th>Intervention</th><th></th></tr></thead><tbody>"#,
        escape(&filter.search),
        select("category", &categories, filter.category.as_deref().unwrap_or("")),
        select("severity", &severities, filter.severity.as_deref().unwrap_or(""))
    );
    for behavior in behaviors {
        let outcome = match behavior.intervention_effective {
            Some(true) => " (effective)",
            Some(false) => " (not effective)",
            None => "",
        };
        let _ = write!(
            out,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="sev-{}">{}</td><td>{}{}</td><td>{}</td></tr>"#,
            escape(behavior.date.as_deref().unwrap_or("")),
            escape(behavior.client_name.as_deref().unwrap_or("")),
            escape(&behavior.behavior_type),
            escape(&behavior.category),
            behavior.severity.as_str(),
            title_case(behavior.severity.as_str()),
            escape(behavior.intervention.as_deref().unwrap_or("")),
            outcome,
            row_actions("/behaviors", behavior.id)
        );
    }
    out.push_str("</tbody></table>");
    out.push_str(modal);
    out
}

pub fn render_goals(goals: &[&Goal], stats: Option<&GoalStats>, filter: &GoalFilter, modal: &str) -> String {
    let statuses = filter_options(
        GoalStatus::ALL
            .into_iter()
            .filter(|s| *s != GoalStatus::Other)
            .map(GoalStatus::as_str),
    );
    let priorities = filter_options(
        Priority::ALL
            .into_iter()
            .filter(|p| *p != Priority::Other)
            .map(Priority::as_str),
    );
    let mut out = String::from("<h1>Goals</h1><div class=\"cards\">");
    if let Some(stats) = stats {
        out.push_str(&stat_card("Total", stats.total));
        out.push_str(&stat_card(
            "In progress",
            stats.by_status.get("in_progress").copied().unwrap_or(0),
        ));
        out.push_str(&stat_card(
            "Completed",
            stats.by_status.get("completed").copied().unwrap_or(0),
        ));
        out.push_str(&stat_card("Overdue", stats.overdue));
        out.push_str(&stat_card("Average progress", format!("{:.1}%", stats.average_progress)));
    }
    out.push_str("</div>");

    let _ = write!(
        out,
        r#"<form class="filters" method="get" action="/goals">
  <input type="search" name="search" value="{}" placeholder="Search goals">
  {}
  {}
  <button type="submit">Filter</button>
</form>
<a class="button" href="/goals?modal=add">Add goal</a>
<table><thead><tr><th>Title</th><th>Client</th><th>Status</th><th>Priority</th><th>Target</th><th>Progress</th><th></th></tr></thead><tbody>"#,
        escape(&filter.search),
        select("status", &statuses, filter.status.as_deref().unwrap_or("")),
        select("priority", &priorities, filter.priority.as_deref().unwrap_or(""))
    );
    for goal in goals {
        let _ = write!(
            out,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><progress max="100" value="{}"></progress> {}%</td><td>{}</td></tr>"#,
            escape(&goal.title),
            escape(goal.client_name.as_deref().unwrap_or("")),
            title_case(goal.status.as_str()),
            title_case(goal.priority.as_str()),
            escape(goal.target_date.as_deref().unwrap_or("")),
            goal.progress,
            goal.progress,
            row_actions("/goals", goal.id)
        );
    }
    out.push_str("</tbody></table>");
    out.push_str(modal);
    out
}

pub fn render_scheduler(view: &CalendarView, modal: &str) -> String {
    let mode = view.mode;
    let other = match mode {
        crate::calendar::ViewMode::Month => "week",
        crate::calendar::ViewMode::Week => "month",
    };
    let mut out = format!(
        r#"<h1>Scheduler</h1>
<div class="calendar-nav">
  <a href="/scheduler?view={m}&amp;date={prev}">&larr; Previous</a>
  <a href="/scheduler?view={m}">Today</a>
  <a href="/scheduler?view={m}&amp;date={next}">Next &rarr;</a>
  <strong>{title}</strong>
  <a href="/scheduler?view={other}&amp;date={anchor}">{other_label} view</a>
  <a class="button" href="/scheduler?view={m}&amp;date={anchor}&amp;modal=add">Add activity</a>
</div>
<table class="calendar"><thead><tr>{headings}</tr></thead><tbody>"#,
        m = mode.as_str(),
        prev = escape(&view.prev),
        next = escape(&view.next),
        title = escape(&view.title),
        anchor = escape(&view.anchor),
        other_label = title_case(other),
        headings = view
            .weeks
            .first()
            .map(|week| week.iter().map(|cell| format!("<th>{}</th>", cell.weekday)).collect::<String>())
            .unwrap_or_default(),
    );
    for week in &view.weeks {
        out.push_str("<tr>");
        for cell in week {
            let mut classes = Vec::new();
            if !cell.in_month {
                classes.push("outside");
            }
            if cell.is_today {
                classes.push("today");
            }
            let _ = write!(
                out,
                r#"<td class="{}" data-date="{}"><div class="day">{}</div>"#,
                classes.join(" "),
                escape(&cell.date),
                cell.day
            );
            for activity in &cell.activities {
                let _ = write!(
                    out,
                    r#"<div class="activity status-{}"><a href="/scheduler?view={}&amp;date={}&amp;modal=edit&amp;id={}">{} {}</a></div>"#,
                    activity.status.as_str(),
                    mode.as_str(),
                    escape(&view.anchor),
                    activity.id,
                    escape(activity.start_time.as_deref().unwrap_or("")),
                    escape(&activity.title)
                );
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");

    let visible: Vec<Activity> = view
        .weeks
        .iter()
        .flatten()
        .filter(|cell| cell.in_month)
        .flat_map(|cell| cell.activities.iter().cloned())
        .collect();
    out.push_str("<div class=\"cards\">");
    for status in [ActivityStatus::Scheduled, ActivityStatus::InProgress, ActivityStatus::Completed, ActivityStatus::Cancelled] {
        out.push_str(&stat_card(&title_case(status.as_str()), activity_status_count(&visible, status)));
    }
    out.push_str("</div>");
    out.push_str(modal);
    out
}

pub fn render_shifts(shifts: &[&Shift], carers: &[User], filter: &ShiftFilter, modal: &str) -> String {
    let statuses = filter_options(["scheduled", "completed", "cancelled"]);
    let mut out = format!(
        r#"<h1>Shifts</h1>
<form class="filters" method="get" action="/shifts">
  <input type="search" name="search" value="{}" placeholder="Search shifts">
  <input type="date" name="date" value="{}">
  {}
  <button type="submit">Filter</button>
</form>
<a class="button" href="/shifts?modal=add">Add shift</a>
<table><thead><tr><th>Date</th><th>Time</th><th>Carer</th><th>Client</th><th>Status</th><th>Notes</th><th></th></tr></thead><tbody>"#,
        escape(&filter.search),
        escape(filter.date.as_deref().unwrap_or("")),
        select("status", &statuses, filter.status.as_deref().unwrap_or(""))
    );
    for shift in shifts {
        let carer = shift
            .carer_name
            .clone()
            .or_else(|| {
                shift
                    .carer
                    .and_then(|id| carers.iter().find(|user| user.id == id))
                    .map(User::display_name)
            })
            .unwrap_or_default();
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{} - {}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&shift.date),
            escape(&shift.start_time),
            escape(&shift.end_time),
            escape(&carer),
            escape(shift.client_name.as_deref().unwrap_or("")),
            escape(&title_case(&shift.status)),
            escape(&shift.notes),
            row_actions("/shifts", shift.id)
        );
    }
    out.push_str("</tbody></table>");
    out.push_str(modal);
    out
}

pub fn render_error(message: &str) -> String {
    format!(
        r#"<section class="failure"><h1>Something went wrong</h1><p>{}</p><p><a href="">Try again</a></p></section>"#,
        escape(message)
    )
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Care Dashboard</title>
  <style>
    :root {
      --ink: #23303b;
      --muted: #6b7782;
      --accent: #2f7d6d;
      --danger: #c0392b;
      --line: #dde3e8;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: #f4f6f8;
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    nav {
      display: flex;
      gap: 18px;
      align-items: center;
      padding: 14px 28px;
      background: var(--ink);
    }

    nav a, nav .user {
      color: #fff;
      text-decoration: none;
    }

    nav .spacer {
      flex: 1;
    }

    main {
      max-width: 1180px;
      margin: 0 auto;
      padding: 28px;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(170px, 1fr));
      gap: 14px;
      margin-bottom: 24px;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 16px;
    }

    .card .label, .muted {
      color: var(--muted);
      font-size: 0.9rem;
    }

    .card .value {
      font-size: 1.7rem;
      font-weight: 600;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      background: var(--card);
    }

    th, td {
      padding: 8px 10px;
      border-bottom: 1px solid var(--line);
      text-align: left;
      vertical-align: top;
    }

    .calendar td {
      height: 96px;
      width: 14.28%;
    }

    .calendar td.outside {
      background: #f0f2f4;
      color: var(--muted);
    }

    .calendar td.today .day {
      color: var(--accent);
      font-weight: 700;
    }

    .activity {
      font-size: 0.85rem;
      margin-top: 4px;
      padding: 2px 6px;
      border-radius: 6px;
      background: #e4f1ee;
    }

    .sev-critical {
      color: var(--danger);
      font-weight: 600;
    }

    .toast {
      padding: 12px 16px;
      border-radius: 10px;
      margin-bottom: 16px;
    }

    .toast.ok {
      background: #e4f1ee;
    }

    .toast.error, .field-error {
      background: #fbe9e7;
      color: var(--danger);
    }

    .modal {
      position: fixed;
      inset: 0;
      background: rgba(35, 48, 59, 0.45);
      display: grid;
      place-items: center;
    }

    .modal-body {
      background: var(--card);
      border-radius: 14px;
      padding: 24px;
      width: min(520px, 92vw);
      max-height: 90vh;
      overflow: auto;
    }

    .form label {
      display: grid;
      gap: 4px;
      margin-bottom: 12px;
    }

    button, .button {
      background: var(--accent);
      color: #fff;
      border: none;
      border-radius: 8px;
      padding: 8px 14px;
      cursor: pointer;
      text-decoration: none;
      display: inline-block;
    }

    button.danger {
      background: var(--danger);
    }

    footer {
      text-align: center;
      color: var(--muted);
      padding: 20px;
      font-size: 0.8rem;
    }
  </style>
</head>
<body>
  {{NAV}}
  <main>
    {{BANNER}}
    {{CONTENT}}
  </main>
  <footer>Care Dashboard · {{ENV}}</footer>
</body>
</html>
"#;
