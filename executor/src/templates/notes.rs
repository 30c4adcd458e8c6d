//! AppleScript templates for Apple Notes.

use serde_json::Map;
use serde_json::Value;

use super::required_str;
use super::str_param;
use super::u64_param;
use crate::ExecutorError;
use crate::json_escape::esc;

pub(super) fn build(
    template_id: &str,
    bundle_id: &str,
    parameters: &Map<String, Value>,
) -> Result<String, ExecutorError> {
    match template_id {
        "notes.list_folders" => Ok(list_folders(bundle_id)),
        "notes.list_notes" => Ok(list_notes(bundle_id, parameters)),
        "notes.get_note" => get_note(bundle_id, parameters),
        "notes.search_notes" => search_notes(bundle_id, parameters),
        "notes.create_note" => Ok(create_note(bundle_id, parameters)),
        "notes.delete_note" => delete_note(bundle_id, parameters),
        _ => Err(ExecutorError::InvalidRequest(format!(
            "Unknown notes template: {template_id}"
        ))),
    }
}

fn list_folders(bundle_id: &str) -> String {
    format!(
        r#"tell application id "{bundle_id}"
    set folderList to {{}}
    repeat with f in folders
        set end of folderList to {{folderId:id of f, folderName:name of f, itemCount:(count of notes of f)}}
    end repeat
    set output to "["
    repeat with i from 1 to count of folderList
        set f to item i of folderList
        set output to output & "{{\"id\":\"" & my jsonEsc(folderId of f) & "\",\"name\":\"" & my jsonEsc(folderName of f) & "\",\"type\":\"folder\",\"itemCount\":" & (itemCount of f as text) & "}}"
        if i < (count of folderList) then set output to output & ","
    end repeat
    set output to output & "]"
    return output
end tell"#
    )
}

fn list_notes(bundle_id: &str, parameters: &Map<String, Value>) -> String {
    let folder_id = str_param(parameters, "folderId").unwrap_or("");
    let limit = u64_param(parameters, "limit", 50);
    let offset = u64_param(parameters, "offset", 0);

    let target_clause = if folder_id.is_empty() {
        "notes".to_string()
    } else {
        format!("notes of folder id \"{}\"", esc(folder_id))
    };
    let start_idx = offset + 1;
    let end_idx = offset + limit;

    format!(
        r#"tell application id "{bundle_id}"
    set allNotes to {target_clause}
    set totalCount to count of allNotes
    set startIdx to {start_idx}
    set endIdx to {end_idx}
    if endIdx > totalCount then set endIdx to totalCount
    set output to "{{\"total\":" & (totalCount as text) & ",\"items\":["
    if startIdx ≤ totalCount then
        repeat with i from startIdx to endIdx
            set n to item i of allNotes
            set nDate to modification date of n as «class isot» as string
            set output to output & "{{\"id\":\"" & my jsonEsc(id of n) & "\",\"name\":\"" & my jsonEsc(name of n) & "\",\"type\":\"note\",\"modifiedAt\":\"" & nDate & "\"}}"
            if i < endIdx then set output to output & ","
        end repeat
    end if
    set output to output & "]}}"
    return output
end tell"#
    )
}

fn get_note(bundle_id: &str, parameters: &Map<String, Value>) -> Result<String, ExecutorError> {
    let note_id = esc(required_str(parameters, "noteId", "notes.get_note")?);
    Ok(format!(
        r#"tell application id "{bundle_id}"
    set n to note id "{note_id}"
    set nCreated to creation date of n as «class isot» as string
    set nModified to modification date of n as «class isot» as string
    return "{{\"id\":\"" & my jsonEsc(id of n) & "\",\"name\":\"" & my jsonEsc(name of n) & "\",\"type\":\"note\",\"containerName\":\"" & my jsonEsc(name of container of n) & "\",\"createdAt\":\"" & nCreated & "\",\"modifiedAt\":\"" & nModified & "\",\"properties\":{{\"body\":\"" & my jsonEsc(plaintext of n) & "\"}}}}"
end tell"#
    ))
}

fn search_notes(bundle_id: &str, parameters: &Map<String, Value>) -> Result<String, ExecutorError> {
    let query = esc(required_str(parameters, "query", "notes.search_notes")?);
    let limit = u64_param(parameters, "limit", 20);
    Ok(format!(
        r#"tell application id "{bundle_id}"
    set matchingNotes to notes whose name contains "{query}"
    set resultCount to count of matchingNotes
    if resultCount > {limit} then set resultCount to {limit}
    set output to "["
    repeat with i from 1 to resultCount
        set n to item i of matchingNotes
        set nDate to modification date of n as «class isot» as string
        set output to output & "{{\"id\":\"" & my jsonEsc(id of n) & "\",\"name\":\"" & my jsonEsc(name of n) & "\",\"type\":\"note\",\"modifiedAt\":\"" & nDate & "\"}}"
        if i < resultCount then set output to output & ","
    end repeat
    set output to output & "]"
    return output
end tell"#
    ))
}

fn create_note(bundle_id: &str, parameters: &Map<String, Value>) -> String {
    let title = esc(str_param(parameters, "title").unwrap_or("Untitled"));
    let body = esc(str_param(parameters, "body").unwrap_or(""));
    let folder_id = str_param(parameters, "folderId").unwrap_or("");

    let target_clause = if folder_id.is_empty() {
        String::new()
    } else {
        format!("in folder id \"{}\" ", esc(folder_id))
    };

    format!(
        r#"tell application id "{bundle_id}"
    set newNote to make new note {target_clause}with properties {{name:"{title}", body:"{body}"}}
    return "{{\"id\":\"" & my jsonEsc(id of newNote) & "\",\"name\":\"" & my jsonEsc(name of newNote) & "\",\"type\":\"note\"}}"
end tell"#
    )
}

fn delete_note(bundle_id: &str, parameters: &Map<String, Value>) -> Result<String, ExecutorError> {
    let note_id = esc(required_str(parameters, "noteId", "notes.delete_note")?);
    Ok(format!(
        r#"tell application id "{bundle_id}"
    set n to note id "{note_id}"
    set nName to name of n
    delete n
    return "{{\"deleted\":true,\"name\":\"" & my jsonEsc(nName) & "\"}}"
end tell"#
    ))
}
