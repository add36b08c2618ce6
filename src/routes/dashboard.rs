use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

pub struct ProjectSummary {
    pub title: String,
    pub status: String,
    pub funding_goal: i64,
    pub current_funding: i64,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub points: i64,
    pub projects: Vec<ProjectSummary>,
    pub total_points: i64,
    pub member_count: i64,
    pub active_dags: i64,
    pub total_projects: i64,
    pub active_campaigns: i64,
}

/// Member dashboard: active project pipeline plus community treasury totals.
async fn dashboard(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
) -> AppResult<Response> {
    let Some(user) = maybe_user.0 else {
        return Ok(Redirect::to("/login").into_response());
    };

    let conn = state.db.get()?;

    let mut stmt = conn.prepare(
        "SELECT title, status, funding_goal, current_funding
         FROM projects
         WHERE status IN ('wip', 'backlog')
         ORDER BY created_at DESC",
    )?;
    let projects = stmt
        .query_map([], |row| {
            Ok(ProjectSummary {
                title: row.get(0)?,
                status: row.get(1)?,
                funding_goal: row.get(2)?,
                current_funding: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let total_points: i64 =
        conn.query_row("SELECT COALESCE(SUM(points), 0) FROM users", [], |r| r.get(0))?;
    let member_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    let active_dags: i64 = conn.query_row(
        "SELECT COUNT(*) FROM dags WHERE is_active = 1",
        [],
        |r| r.get(0),
    )?;
    let total_projects: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |r| r.get(0))?;
    let active_campaigns: i64 = conn.query_row(
        "SELECT COUNT(*) FROM campaigns WHERE end_date > datetime('now')",
        [],
        |r| r.get(0),
    )?;

    Ok(Html(DashboardTemplate {
        username: user.username,
        points: user.points,
        projects,
        total_points,
        member_count,
        active_dags,
        total_projects,
        active_campaigns,
    })
    .into_response())
}
