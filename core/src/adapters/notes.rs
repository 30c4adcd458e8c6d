//! Apple Notes adapter. Notes supports the widest slice of the contract:
//! containers are folders, items are notes.

use super::AdapterError;
use super::AdapterResult;
use super::AppInfo;
use super::CreateParams;
use super::ListParams;
use super::RenderedCall;
use super::ResourceAdapter;
use super::SearchParams;
use super::string_prop;

const INFO: AppInfo = AppInfo {
    name: "notes",
    display_name: "Apple Notes",
    bundle_id: "com.apple.Notes",
};

#[derive(Default)]
pub struct NotesAdapter;

impl ResourceAdapter for NotesAdapter {
    fn info(&self) -> &AppInfo {
        &INFO
    }

    fn list_containers(&self) -> AdapterResult {
        Ok(RenderedCall::new("notes.list_folders"))
    }

    fn list(&self, params: ListParams) -> AdapterResult {
        let mut call = RenderedCall::new("notes.list_notes")
            .with_param("limit", params.limit.unwrap_or(50))
            .with_param("offset", params.offset.unwrap_or(0));
        if let Some(folder_id) = params.container_id {
            call = call.with_param("folderId", folder_id);
        }
        Ok(call)
    }

    fn get(&self, id: &str) -> AdapterResult {
        if id.is_empty() {
            return Err(AdapterError::InvalidParams(
                "notes.get_note requires a note id".to_string(),
            ));
        }
        Ok(RenderedCall::new("notes.get_note").with_param("noteId", id))
    }

    fn search(&self, params: SearchParams) -> AdapterResult {
        if params.query.is_empty() {
            return Err(AdapterError::InvalidParams(
                "notes.search_notes requires a query".to_string(),
            ));
        }
        Ok(RenderedCall::new("notes.search_notes")
            .with_param("query", params.query)
            .with_param("limit", params.limit.unwrap_or(20)))
    }

    fn create(&self, params: CreateParams) -> AdapterResult {
        let title =
            string_prop(&params.properties, "title").unwrap_or_else(|| "Untitled".to_string());
        let body = string_prop(&params.properties, "body").unwrap_or_default();
        let mut call = RenderedCall::new("notes.create_note")
            .with_param("title", title)
            .with_param("body", body);
        if let Some(folder_id) = params.container_id {
            call = call.with_param("folderId", folder_id);
        }
        Ok(call)
    }

    fn delete(&self, id: &str) -> AdapterResult {
        if id.is_empty() {
            return Err(AdapterError::InvalidParams(
                "notes.delete_note requires a note id".to_string(),
            ));
        }
        Ok(RenderedCall::new("notes.delete_note").with_param("noteId", id))
    }
}
