use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use super::position::PositionAllocator;
use crate::database::models::{Checklist, Issue, User};
use crate::database::{transactional, Model};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /issues - Create an issue and, optionally, its checklist in one transaction.
///
/// The body is parsed as JSON whatever its content type. `author_id` always comes from
/// the authenticated user. Submitted `checklists` are created under the new issue and
/// echoed back under the same key.
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(e.to_string()))?;
    let Value::Object(mut fields) = payload else {
        return Err(ApiError::invalid_json("Expected JSON object"));
    };
    let checklists = take_checklists(&mut fields)?;

    let created = transactional(&state.pool, move |conn| {
        Box::pin(async move {
            let mut issue = Issue::from_map(&fields);
            issue.author_id = Some(user.id);

            let stmt = issue.insert_query();
            let issue: Issue = stmt.query_as().fetch_one(&mut *conn).await?;
            let mut response = issue.to_json();

            let mut positions = PositionAllocator::default();
            let mut created = Vec::with_capacity(checklists.len());
            for (index, entry) in checklists.iter().enumerate() {
                let requested = entry
                    .get("position")
                    .and_then(Value::as_i64)
                    .and_then(|p| i32::try_from(p).ok());

                let mut checklist = Checklist::from_map(entry);
                checklist.issue_id = issue.id;
                checklist.position = Some(positions.assign(index, requested));

                let stmt = checklist.insert_query();
                let checklist: Checklist = stmt.query_as().fetch_one(&mut *conn).await?;
                created.push(Value::Object(checklist.to_json()));
            }

            if !created.is_empty() {
                response.insert("checklists".to_string(), Value::Array(created));
            }

            tracing::info!(
                "Created issue {:?} with {} checklist items for user {}",
                issue.id,
                checklists.len(),
                user.login
            );
            Ok::<_, ApiError>(Value::Object(response))
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove and validate the optional `checklists` array from the issue payload.
fn take_checklists(fields: &mut Map<String, Value>) -> Result<Vec<Map<String, Value>>, ApiError> {
    match fields.remove("checklists") {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(entries)) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::Object(map) => Ok(map),
                _ => Err(ApiError::bad_request("Each checklist must be a JSON object")),
            })
            .collect(),
        Some(_) => Err(ApiError::bad_request("checklists must be an array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_take_checklists_removes_key() {
        let mut fields = object(json!({
            "subject": "Bug A",
            "checklists": [{ "subject": "step 1" }, { "subject": "step 2", "position": 0 }]
        }));
        let checklists = take_checklists(&mut fields).unwrap();

        assert_eq!(checklists.len(), 2);
        assert!(!fields.contains_key("checklists"));
        assert_eq!(checklists[1]["position"], json!(0));
    }

    #[test]
    fn test_take_checklists_absent_or_null() {
        let mut fields = object(json!({ "subject": "Bug A" }));
        assert!(take_checklists(&mut fields).unwrap().is_empty());

        let mut fields = object(json!({ "checklists": null }));
        assert!(take_checklists(&mut fields).unwrap().is_empty());
    }

    #[test]
    fn test_take_checklists_rejects_bad_shapes() {
        let mut fields = object(json!({ "checklists": { "subject": "x" } }));
        assert!(matches!(take_checklists(&mut fields), Err(ApiError::BadRequest(_))));

        let mut fields = object(json!({ "checklists": ["x"] }));
        assert!(matches!(take_checklists(&mut fields), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_client_author_is_replaced() {
        let fields = object(json!({ "subject": "Bug A", "author_id": 99 }));
        let mut issue = Issue::from_map(&fields);
        issue.author_id = Some(7);
        assert_eq!(issue.to_json()["author_id"], json!(7));
    }
}
