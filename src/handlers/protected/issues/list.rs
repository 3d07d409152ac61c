use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use crate::database::models::{Checklist, Issue};
use crate::database::{transactional, FieldValue, Model};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /issues - List issues matching the query string, each with its checklist.
///
/// Query parameters naming an issue field become equality filters (`?status_id=1`);
/// any other parameter is ignored.
pub async fn get(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let issues = transactional(&state.pool, move |conn| {
        Box::pin(async move {
            let stmt = Issue::filter_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
            let issues: Vec<Issue> = stmt.query_as().fetch_all(&mut *conn).await?;

            let mut result = Vec::with_capacity(issues.len());
            for issue in issues {
                let stmt = Checklist::filter([("issue_id", FieldValue::Integer(issue.id))]);
                let items: Vec<Checklist> = stmt.query_as().fetch_all(&mut *conn).await?;

                let mut json = issue.to_json();
                json.insert(
                    "checklist".to_string(),
                    Value::Array(items.iter().map(|c| Value::Object(c.to_json())).collect()),
                );
                result.push(Value::Object(json));
            }

            Ok::<_, ApiError>(result)
        })
    })
    .await?;

    tracing::debug!("Listed {} issues", issues.len());
    Ok(Json(issues))
}
