use crate::{
    openapi::{
        aide::axum::{routing::get, ApiRouter, IntoApiResponse},
        Json, Path, Query,
    },
    response::ApiResponse,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};

use schemars::JsonSchema;

use serde::Deserialize;

use super::{CreateNote, FindNotesQuery, Note, UpdateNote};

use super::handlers;

#[derive(Debug, Deserialize, JsonSchema)]
struct NoteIdPath {
    /// Uuid v7
    id: String,
}

pub fn router(state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/api/notes",
            get(find_notes).post_with(create_note, |t| t.response::<201, Json<ApiResponse<Note>>>()),
        )
        .api_route("/api/notes/stats", get(note_stats))
        .api_route(
            "/api/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .with_state(state)
}

async fn find_notes(State(state): State<AppState>, Query(query): Query<FindNotesQuery>) -> impl IntoApiResponse {
    handlers::find_notes(&query, state.config.max_list_limit, &state.db)
        .await
        .map(|page| Json(ApiResponse::ok(page.notes).with_counts(page.total, page.total)))
}

async fn note_stats(State(state): State<AppState>) -> impl IntoApiResponse {
    handlers::note_stats(&state.db).await.map(|stats| Json(ApiResponse::ok(stats)))
}

async fn create_note(State(state): State<AppState>, Json(args): Json<CreateNote>) -> impl IntoApiResponse {
    handlers::create_note(args, &state.db).await.map(|note| {
        (
            StatusCode::CREATED,
            Json(ApiResponse::ok(note).with_message("Note created successfully")),
        )
    })
}

async fn get_note(State(state): State<AppState>, Path(NoteIdPath { id }): Path<NoteIdPath>) -> impl IntoApiResponse {
    handlers::get_note(&id, &state.db).await.map(|note| Json(ApiResponse::ok(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(NoteIdPath { id }): Path<NoteIdPath>,
    Json(args): Json<UpdateNote>,
) -> impl IntoApiResponse {
    handlers::update_note(&id, args, &state.db)
        .await
        .map(|note| Json(ApiResponse::ok(note).with_message("Note updated successfully")))
}

async fn delete_note(State(state): State<AppState>, Path(NoteIdPath { id }): Path<NoteIdPath>) -> impl IntoApiResponse {
    handlers::delete_note(&id, &state.db)
        .await
        .map(|deleted| Json(ApiResponse::ok(deleted).with_message("Note deleted successfully")))
}

#[cfg(test)]
mod tests {
    use crate::{
        db::{init_test_db, DB},
        errors::Result,
        notes::{Note, NoteStats},
        response::ApiResponse,
    };
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    async fn test_server(db: DB) -> Result<TestServer> {
        crate::tests::test_server(db, super::router).await
    }

    async fn post_note(server: &TestServer, body: Value) -> Note {
        let response = server.post("/api/notes").json(&body).await;
        assert_eq!(response.status_code(), 201);
        response.json::<ApiResponse<Note>>().data
    }

    #[tokio::test]
    async fn create_note() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server
            .post("/api/notes")
            .json(&json!({
                "title": "API Test Note",
                "content": "Content of the note",
                "category": "WORK",
                "tags": ["One", " two "]
            }))
            .await;

        assert_eq!(response.status_code(), 201);
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Note created successfully");
        assert_eq!(body["data"]["title"], "API Test Note");
        assert_eq!(body["data"]["category"], "work");
        assert_eq!(body["data"]["tags"], json!(["one", "two"]));
        assert_eq!(body["data"]["color"], "#FFFFFF");
        assert!(body["data"]["id"].is_string());
        assert!(body["data"]["createdAt"].is_string());
        assert!(body["data"]["updatedAt"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn create_note_requires_title_and_content() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server.post("/api/notes").json(&json!({ "title": "only" })).await;

        assert_eq!(response.status_code(), 400);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation Error");
        assert_eq!(body["errors"], json!(["Content is required"]));

        let response = server.get("/api/notes").await;
        assert_eq!(response.json::<Value>()["total"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn create_note_rejects_bad_color() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server
            .post("/api/notes")
            .json(&json!({ "title": "t", "content": "c", "color": "red" }))
            .await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(
            response.json::<Value>()["errors"],
            json!(["Color must be a hex color like #FFFFFF"])
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_note_rejects_malformed_json() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server
            .post("/api/notes")
            .content_type("application/json")
            .bytes("{ not json".into())
            .await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(response.json::<Value>()["success"], false);
        Ok(())
    }

    #[tokio::test]
    async fn find_notes() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        post_note(&server, json!({ "title": "first", "content": "Hello world", "category": "Work" })).await;
        post_note(&server, json!({ "title": "second", "content": "2", "tags": ["X"] })).await;
        post_note(&server, json!({ "title": "third", "content": "3", "category": "work", "tags": ["x"] })).await;

        let response = server.get("/api/notes").await;
        assert_eq!(response.status_code(), 200);
        let body = response.json::<ApiResponse<Vec<Note>>>();
        assert!(body.success);
        assert_eq!(body.data.len(), 3);
        assert_eq!(body.data[0].title, "third");
        assert_eq!(body.count, Some(3));
        assert_eq!(body.total, Some(3));

        let body = server
            .get("/api/notes")
            .add_query_param("category", "Work")
            .await
            .json::<ApiResponse<Vec<Note>>>();
        assert_eq!(
            body.data.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            vec!["third", "first"]
        );

        let body = server
            .get("/api/notes")
            .add_query_param("search", "hello")
            .await
            .json::<ApiResponse<Vec<Note>>>();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].title, "first");

        let body = server
            .get("/api/notes")
            .add_query_param("tag", "X")
            .add_query_param("category", "work")
            .await
            .json::<ApiResponse<Vec<Note>>>();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].title, "third");
        Ok(())
    }

    #[tokio::test]
    async fn find_notes_paginates() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        post_note(&server, json!({ "title": "A", "content": "older" })).await;
        post_note(&server, json!({ "title": "B", "content": "newer" })).await;

        let body = server
            .get("/api/notes")
            .add_query_param("limit", "1")
            .add_query_param("skip", "1")
            .await
            .json::<ApiResponse<Vec<Note>>>();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].title, "A");
        assert_eq!(body.count, Some(2));
        assert_eq!(body.total, Some(2));

        let response = server
            .get("/api/notes")
            .add_query_param("limit", "lots")
            .add_query_param("skip", "-1")
            .await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<ApiResponse<Vec<Note>>>().data.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn find_notes_rejects_repeated_params() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server.get("/api/notes?limit=1&limit=2").await;

        assert_eq!(response.status_code(), 400);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation Error");
        Ok(())
    }

    #[tokio::test]
    async fn note_stats() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        post_note(&server, json!({ "title": "1", "content": "c", "tags": ["x"] })).await;
        post_note(&server, json!({ "title": "2", "content": "c", "tags": ["x"], "category": "work" })).await;
        post_note(&server, json!({ "title": "3", "content": "c" })).await;

        let response = server.get("/api/notes/stats").await;

        assert_eq!(response.status_code(), 200);
        let body = response.json::<Value>();
        assert_eq!(body["data"]["totalNotes"], 3);
        assert_eq!(body["data"]["tagCounts"], json!({ "x": 2 }));
        assert_eq!(body["data"]["categoryCounts"], json!({ "general": 2, "work": 1 }));

        let recent = body["data"]["recentActivity"].as_array().unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0]["title"], "3");
        assert!(recent[0]["updatedAt"].is_string());
        assert!(recent[0].get("content").is_none());

        let stats = response.json::<ApiResponse<NoteStats>>().data;
        assert_eq!(stats.category_counts.keys().collect::<Vec<_>>(), vec!["general", "work"]);
        Ok(())
    }

    #[tokio::test]
    async fn get_note() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        let note = post_note(&server, json!({ "title": "X", "content": "Y" })).await;

        let response = server.get(&format!("/api/notes/{}", note.id)).await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<ApiResponse<Note>>().data, note);
        Ok(())
    }

    #[tokio::test]
    async fn get_missing_note() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server.get(&format!("/api/notes/{}", Uuid::now_v7())).await;

        assert_eq!(response.status_code(), 404);
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": false, "message": "Note not found" })
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_note() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        let note = post_note(
            &server,
            json!({ "title": "Old", "content": "Old content", "category": "work", "tags": ["a"], "color": "#000000" }),
        )
        .await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let response = server
            .put(&format!("/api/notes/{}", note.id))
            .json(&json!({ "title": "New" }))
            .await;

        assert_eq!(response.status_code(), 200);
        let body = response.json::<ApiResponse<Note>>();
        assert_eq!(body.message.as_deref(), Some("Note updated successfully"));
        let updated = body.data;
        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, note.content);
        assert_eq!(updated.category, note.category);
        assert_eq!(updated.tags, note.tags);
        assert_eq!(updated.color, note.color);
        assert!(updated.updated_at > note.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn update_note_rejects_invalid_fields() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        let note = post_note(&server, json!({ "title": "Old", "content": "Old content" })).await;

        let response = server
            .put(&format!("/api/notes/{}", note.id))
            .json(&json!({ "title": "" }))
            .await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(response.json::<Value>()["errors"], json!(["Title is required"]));

        let response = server.put(&format!("/api/notes/{}", Uuid::now_v7())).json(&json!({ "title": "x" })).await;
        assert_eq!(response.status_code(), 404);
        Ok(())
    }

    #[tokio::test]
    async fn delete_note() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db.clone()).await?;
        let note = post_note(&server, json!({ "title": "Delete me", "content": "Bye" })).await;

        let response = server.delete(&format!("/api/notes/{}", note.id)).await;

        assert_eq!(response.status_code(), 200);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Note deleted successfully");
        assert_eq!(body["data"]["deletedId"], note.id.to_string());

        let count = db
            .call(|conn| {
                conn.query_row::<u32, _, _>("select count(*) from notes", [], |r| r.get(0))
                    .map_err(|e| e.into())
            })
            .await?;
        assert_eq!(count, 0);

        let response = server.delete(&format!("/api/notes/{}", note.id)).await;
        assert_eq!(response.status_code(), 404);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let responses = [
            server.get("/api/notes/not-an-id").await,
            server.put("/api/notes/not-an-id").json(&json!({ "title": "x" })).await,
            server.delete("/api/notes/not-an-id").await,
        ];

        for response in responses {
            assert_eq!(response.status_code(), 400);
            assert_eq!(
                response.json::<Value>(),
                json!({ "success": false, "message": "Invalid ID format" })
            );
        }
        Ok(())
    }
}
