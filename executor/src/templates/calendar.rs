//! AppleScript templates for Apple Calendar.

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
        "calendar.list_calendars" => Ok(list_calendars(bundle_id)),
        "calendar.list_events" => Ok(list_events(bundle_id, parameters)),
        "calendar.create_event" => create_event(bundle_id, parameters),
        _ => Err(ExecutorError::InvalidRequest(format!(
            "Unknown calendar template: {template_id}"
        ))),
    }
}

fn list_calendars(bundle_id: &str) -> String {
    format!(
        r#"tell application id "{bundle_id}"
    set calList to {{}}
    repeat with c in calendars
        set end of calList to {{calId:uid of c, calName:name of c}}
    end repeat
    set output to "["
    repeat with i from 1 to count of calList
        set c to item i of calList
        set output to output & "{{\"id\":\"" & my jsonEsc(calId of c) & "\",\"name\":\"" & my jsonEsc(calName of c) & "\",\"type\":\"calendar\"}}"
        if i < (count of calList) then set output to output & ","
    end repeat
    set output to output & "]"
    return output
end tell"#
    )
}

fn list_events(bundle_id: &str, parameters: &Map<String, Value>) -> String {
    let calendar_name = str_param(parameters, "calendarName").unwrap_or("");
    let limit = u64_param(parameters, "limit", 50);

    let target_clause = if calendar_name.is_empty() {
        "events of calendars".to_string()
    } else {
        format!(
            "events of (first calendar whose name is \"{}\")",
            esc(calendar_name)
        )
    };

    format!(
        r#"tell application id "{bundle_id}"
    set allEvents to {target_clause}
    set totalCount to count of allEvents
    set resultCount to totalCount
    if resultCount > {limit} then set resultCount to {limit}
    set output to "{{\"total\":" & (totalCount as text) & ",\"items\":["
    repeat with i from 1 to resultCount
        set e to item i of allEvents
        set eStart to start date of e as «class isot» as string
        set eEnd to end date of e as «class isot» as string
        set output to output & "{{\"id\":\"" & my jsonEsc(uid of e) & "\",\"name\":\"" & my jsonEsc(summary of e) & "\",\"type\":\"event\",\"properties\":{{\"startDate\":\"" & eStart & "\",\"endDate\":\"" & eEnd & "\"}}}}"
        if i < resultCount then set output to output & ","
    end repeat
    set output to output & "]}}"
    return output
end tell"#
    )
}

fn create_event(
    bundle_id: &str,
    parameters: &Map<String, Value>,
) -> Result<String, ExecutorError> {
    let title = esc(required_str(parameters, "title", "calendar.create_event")?);
    let start = esc(required_str(parameters, "start", "calendar.create_event")?);
    let end = esc(required_str(parameters, "end", "calendar.create_event")?);
    let calendar_name = esc(str_param(parameters, "calendarName").unwrap_or("Calendar"));
    let location = esc(str_param(parameters, "location").unwrap_or(""));
    let notes = esc(str_param(parameters, "notes").unwrap_or(""));

    Ok(format!(
        r#"tell application id "{bundle_id}"
    set targetCalendar to first calendar whose name is "{calendar_name}"
    set startDate to date "{start}"
    set endDate to date "{end}"
    set newEvent to make new event at end of events of targetCalendar with properties {{summary:"{title}", start date:startDate, end date:endDate, location:"{location}", description:"{notes}"}}
    return "{{\"id\":\"" & my jsonEsc(uid of newEvent) & "\",\"name\":\"{title}\",\"type\":\"event\"}}"
end tell"#
    ))
}
